use super::Chip8Error;

/// Bounded call stack of return addresses.
#[derive(Debug, Clone)]
pub struct Stack {
    entries: Vec<u16>,
    depth: usize,
}

impl Stack {
    pub fn new(depth: usize) -> Self {
        Self {
            entries: Vec::with_capacity(depth),
            depth,
        }
    }

    pub fn push(&mut self, addr: u16) -> Result<(), Chip8Error> {
        if self.entries.len() >= self.depth {
            return Err(Chip8Error::StackOverflow { depth: self.depth });
        }

        self.entries.push(addr);
        Ok(())
    }

    pub fn pop(&mut self) -> Result<u16, Chip8Error> {
        self.entries.pop().ok_or(Chip8Error::StackUnderflow)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries from the bottom of the stack to the top.
    pub fn as_slice(&self) -> &[u16] {
        &self.entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
