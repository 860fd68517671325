use std::ops::RangeInclusive;

use crate::u4;

/// Outcome of a single interpreter step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chip8Result {
    /// Continue executing instructions in the current frame.
    Continue,
    /// The display buffer changed (clear or draw).
    /// Hosts may use this to end the frame and present it.
    Drew,
    /// The interpreter is suspended on an Fx0A instruction.
    /// It resumes once a key-down edge is reported through `set_key`.
    WaitingForKey { register: u4 },
}

/// Error types that can occur during CHIP-8 emulation.
///
/// Every variant except `RomLoadError` and `InvalidConfig` is a fault: it is latched and the
/// interpreter refuses to execute further until it is reset.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Chip8Error {
    #[error("ROM is too large ({size} bytes), max size is {max_size} bytes")]
    RomLoadError { size: usize, max_size: usize },

    #[error("Memory access out of bounds at address {address:#06X}")]
    MemoryOutOfBounds { address: usize },

    #[error("Stack underflow: attempted to return from a subroutine with empty call stack")]
    StackUnderflow,

    #[error("Stack overflow: call depth exceeded {depth}")]
    StackOverflow { depth: usize },

    #[error("Unknown opcode: {opcode:#06X}")]
    UnknownOpcode { opcode: u16 },

    #[error("Interpreter halted after a previous fault")]
    Halted,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

/// What to do when the decoder hits an opcode outside the instruction set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownOpcodePolicy {
    /// Latch an `UnknownOpcode` fault.
    #[default]
    Fault,
    /// Log a warning and skip the instruction.
    Ignore,
}

/// Accepted instruction and timer rates, in Hz.
pub const RATE_RANGE: RangeInclusive<f32> = 0.01..=1_000_000.0;

/// Construction-time settings for a `Chip8` session.
#[derive(Debug, Clone, PartialEq)]
pub struct Chip8Config {
    /// Maximum call depth before `StackOverflow`.
    pub stack_depth: usize,
    pub unknown_opcode: UnknownOpcodePolicy,
    pub display_width: usize,
    pub display_height: usize,
    /// Instruction rate used by the runners.
    pub cpu_hz: f32,
    /// Timer decay rate used by the runners.
    pub timer_hz: f32,
    /// Seed for the Cxnn random source. `None` seeds from the OS.
    pub rng_seed: Option<u64>,
}

impl Default for Chip8Config {
    fn default() -> Self {
        Self {
            stack_depth: 16,
            unknown_opcode: UnknownOpcodePolicy::Fault,
            display_width: 64,
            display_height: 32,
            cpu_hz: 700.0,
            timer_hz: 60.0,
            rng_seed: None,
        }
    }
}

impl Chip8Config {
    /// Rejects settings the runners and display cannot work with.
    pub fn validate(&self) -> Result<(), Chip8Error> {
        if self.display_width == 0 || self.display_height == 0 {
            return Err(Chip8Error::InvalidConfig("display must be at least 1x1"));
        }
        if !RATE_RANGE.contains(&self.cpu_hz) {
            return Err(Chip8Error::InvalidConfig("cpu_hz out of range"));
        }
        if !RATE_RANGE.contains(&self.timer_hz) {
            return Err(Chip8Error::InvalidConfig("timer_hz out of range"));
        }
        Ok(())
    }
}
