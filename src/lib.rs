pub mod chip8;
pub mod cli;
pub mod debugger;
mod nibble;

pub use nibble::*;
