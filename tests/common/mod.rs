#![allow(dead_code)]

use chip8_vm::chip8::{Chip8, Chip8Config, Chip8Result};

/// Encodes instruction words as a big-endian ROM image.
pub fn rom(words: &[u16]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_be_bytes()).collect()
}

pub fn config() -> Chip8Config {
    Chip8Config {
        rng_seed: Some(0xC8),
        ..Chip8Config::default()
    }
}

pub fn machine(words: &[u16]) -> Chip8 {
    machine_with(config(), words)
}

pub fn machine_with(config: Chip8Config, words: &[u16]) -> Chip8 {
    let mut chip8 = Chip8::with_config(config).expect("test config is valid");
    chip8.load_rom(&rom(words)).expect("test ROM fits in memory");
    chip8
}

/// Executes `steps` instructions, panicking on any fault.
pub fn run(chip8: &mut Chip8, steps: usize) -> Chip8Result {
    let mut last = Chip8Result::Continue;
    for _ in 0..steps {
        last = chip8.execute().expect("instruction should not fault");
    }
    last
}

/// Executes every instruction in the program once.
pub fn run_program(words: &[u16]) -> Chip8 {
    let mut chip8 = machine(words);
    run(&mut chip8, words.len());
    chip8
}
