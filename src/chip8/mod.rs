mod chip8;
mod display;
mod execute;
mod font;
mod keypad;
mod memory;
mod opcode;
mod runner;
mod shared;
mod stack;
mod types;

pub use chip8::*;
pub use display::*;
pub use execute::*;
pub use font::*;
pub use keypad::*;
pub use memory::*;
pub use opcode::*;
pub use runner::*;
pub use shared::*;
pub use stack::*;
pub use types::*;
