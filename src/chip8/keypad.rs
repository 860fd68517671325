use crate::u4;

/// State of the 16-key hexadecimal keypad (true = pressed).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Keypad {
    keys: [bool; 16],
}

impl Keypad {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_down(&self, key: u4) -> bool {
        self.keys[key]
    }

    /// Updates a key and returns true if this was a key-down edge
    /// (the key was up and is now pressed).
    pub fn set(&mut self, key: u4, pressed: bool) -> bool {
        let was_down = std::mem::replace(&mut self.keys[key], pressed);
        pressed && !was_down
    }

    pub fn release_all(&mut self) {
        self.keys = [false; 16];
    }
}
