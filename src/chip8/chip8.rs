use log::{debug, error, trace};
use rand::{SeedableRng, rngs::StdRng};

use super::{
    Chip8Config, Chip8Error, Chip8Result, Display, FONT, FONT_END_ADDRESS, FONT_START_ADDRESS,
    Keypad, MAX_ROM_SIZE, Memory, Opcode, ROM_START_ADDRESS, Stack,
};
use crate::u4;

/// One interpreter session: memory, registers, timers, display and keypad.
///
/// The host owns the clock. It calls [`Chip8::execute`] at the CPU rate and
/// [`Chip8::decrement_timers`] at 60 Hz.
#[derive(Debug)]
pub struct Chip8 {
    pub(crate) memory: Memory,
    pub(crate) display: Display,

    /// Address of the next instruction
    pub(crate) pc: u16,
    pub(crate) i: u16,
    /// V0-VF; VF doubles as the carry/collision flag
    pub(crate) v: [u8; 16],
    pub(crate) stack: Stack,

    /// Both timers count down to zero at 60 Hz
    pub(crate) delay_timer: u8,
    pub(crate) sound_timer: u8,

    /// Keypad state, written by the host
    pub(crate) keypad: Keypad,
    /// Destination register of a pending Fx0A
    pub(crate) waiting_for_key: Option<u4>,
    /// First fault raised in this session
    pub(crate) fault: Option<Chip8Error>,

    pub(crate) rng: StdRng,
    config: Chip8Config,
    font: [u8; 80],
    rom: Vec<u8>,
}

impl Chip8 {
    pub fn new() -> Self {
        Self::build(Chip8Config::default())
    }

    /// Builds a session with custom settings, rejecting unusable ones.
    pub fn with_config(config: Chip8Config) -> Result<Self, Chip8Error> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: Chip8Config) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let mut chip8 = Chip8 {
            memory: Memory::new(),
            display: Display::new(config.display_width, config.display_height),
            pc: ROM_START_ADDRESS as u16,
            i: 0,
            v: [0; 16],
            stack: Stack::new(config.stack_depth),
            delay_timer: 0,
            sound_timer: 0,
            keypad: Keypad::new(),
            waiting_for_key: None,
            fault: None,
            rng,
            config,
            font: FONT,
            rom: Vec::new(),
        };
        chip8.load_font(&FONT);
        chip8
    }

    /// Copies an 80-byte glyph table to the start of memory.
    pub fn load_font(&mut self, font: &[u8; 80]) {
        self.font = *font;
        self.memory.as_bytes_mut()[FONT_START_ADDRESS..FONT_END_ADDRESS].copy_from_slice(font);
        debug!("Loaded font at {FONT_START_ADDRESS:#05X}");
    }

    /// Loads a ROM into memory at 0x200 and points the program counter at it.
    ///
    /// Nothing is written if the ROM does not fit.
    pub fn load_rom(&mut self, rom: &[u8]) -> Result<(), Chip8Error> {
        if rom.len() > MAX_ROM_SIZE {
            return Err(Chip8Error::RomLoadError {
                size: rom.len(),
                max_size: MAX_ROM_SIZE,
            });
        }

        self.memory
            .slice_mut(ROM_START_ADDRESS, rom.len())?
            .copy_from_slice(rom);
        self.rom = rom.to_vec();
        self.pc = ROM_START_ADDRESS as u16;

        debug!("Loaded {} byte ROM at {ROM_START_ADDRESS:#05X}", rom.len());
        Ok(())
    }

    /// Returns the machine to its power-on state, keeping the loaded font and ROM.
    pub fn reset(&mut self) {
        self.memory.clear();
        self.display.clear();
        self.pc = ROM_START_ADDRESS as u16;
        self.i = 0;
        self.v = [0; 16];
        self.stack.clear();
        self.delay_timer = 0;
        self.sound_timer = 0;
        self.keypad.release_all();
        self.waiting_for_key = None;
        self.fault = None;

        let font = self.font;
        self.load_font(&font);
        // Already size-checked by load_rom
        let rom_end = ROM_START_ADDRESS + self.rom.len();
        self.memory.as_bytes_mut()[ROM_START_ADDRESS..rom_end].copy_from_slice(&self.rom);

        debug!("Reset interpreter");
    }

    /// Fetches, decodes and applies one instruction.
    ///
    /// A fault leaves the machine as it was before the faulting instruction
    /// and is latched: later calls return `Chip8Error::Halted`.
    pub fn execute(&mut self) -> Result<Chip8Result, Chip8Error> {
        if self.fault.is_some() {
            return Err(Chip8Error::Halted);
        }
        if let Some(register) = self.waiting_for_key {
            return Ok(Chip8Result::WaitingForKey { register });
        }

        let pc = self.pc;
        let result = self.fetch().and_then(|opcode| {
            let decoded = Opcode::decode(opcode);
            trace!("{pc:03X}: {opcode:04X} {decoded}");
            self.execute_opcode(decoded)
        });

        if let Err(e) = &result {
            error!("Fault at {pc:#05X}: {e}");
            self.pc = pc;
            self.fault = Some(e.clone());
        }

        result
    }

    /// One 60 Hz tick of both timers.
    pub fn decrement_timers(&mut self) {
        self.delay_timer = self.delay_timer.saturating_sub(1);
        self.sound_timer = self.sound_timer.saturating_sub(1);
    }

    /// The tone is on while the sound timer is non-zero.
    pub fn should_beep(&self) -> bool {
        self.sound_timer > 0
    }

    /// Records a keypad transition from the host.
    ///
    /// A key-down edge completes a pending Fx0A wait.
    pub fn set_key(&mut self, key: u4, pressed: bool) {
        let pressed_now = self.keypad.set(key, pressed);

        if pressed_now && let Some(register) = self.waiting_for_key.take() {
            self.v[register] = key.into();
            trace!("Key {key} resumed wait into V{register}");
        }
    }

    pub fn waiting_for_key(&self) -> Option<u4> {
        self.waiting_for_key
    }

    pub fn fault(&self) -> Option<&Chip8Error> {
        self.fault.as_ref()
    }

    pub fn display(&self) -> &Display {
        &self.display
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn keypad(&self) -> &Keypad {
        &self.keypad
    }

    pub fn config(&self) -> &Chip8Config {
        &self.config
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn i(&self) -> u16 {
        self.i
    }

    pub fn v(&self) -> &[u8; 16] {
        &self.v
    }

    pub fn stack(&self) -> &[u16] {
        self.stack.as_slice()
    }

    pub fn delay_timer(&self) -> u8 {
        self.delay_timer
    }

    pub fn sound_timer(&self) -> u8 {
        self.sound_timer
    }

    /// Fetches the opcode at PC and advances PC past it.
    fn fetch(&mut self) -> Result<u16, Chip8Error> {
        let opcode = self.memory.read_word(self.pc as usize)?;
        self.pc = self.pc.wrapping_add(2);

        Ok(opcode)
    }
}

impl Default for Chip8 {
    fn default() -> Self {
        Self::new()
    }
}
