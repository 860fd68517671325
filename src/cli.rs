use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use crate::chip8::{Chip8, Chip8Config, RATE_RANGE, UnknownOpcodePolicy};

fn parse_rate(s: &str) -> Result<f32, String> {
    let hz: f32 = s.parse().map_err(|e| format!("{e}"))?;
    if RATE_RANGE.contains(&hz) {
        Ok(hz)
    } else {
        Err(format!(
            "rate must be between {} and {} Hz",
            RATE_RANGE.start(),
            RATE_RANGE.end()
        ))
    }
}

/// Options shared by the emulator front-ends.
#[derive(Args, Debug, Clone)]
pub struct MachineArgs {
    /// Path to the CHIP-8 ROM file
    pub rom_path: PathBuf,

    /// Instructions executed per second
    #[arg(long, default_value_t = 700.0, value_parser = parse_rate)]
    pub cpu_hz: f32,

    /// Maximum subroutine call depth
    #[arg(long, default_value_t = 16)]
    pub stack_depth: usize,

    /// Skip unknown opcodes instead of halting
    #[arg(long)]
    pub ignore_unknown_opcodes: bool,

    /// Seed for the random number instruction
    #[arg(long)]
    pub seed: Option<u64>,
}

impl MachineArgs {
    pub fn config(&self) -> Chip8Config {
        Chip8Config {
            stack_depth: self.stack_depth,
            unknown_opcode: if self.ignore_unknown_opcodes {
                UnknownOpcodePolicy::Ignore
            } else {
                UnknownOpcodePolicy::Fault
            },
            cpu_hz: self.cpu_hz,
            rng_seed: self.seed,
            ..Chip8Config::default()
        }
    }

    /// Reads the ROM file and builds a machine with it loaded.
    pub fn load_machine(&self) -> anyhow::Result<Chip8> {
        let rom = std::fs::read(&self.rom_path)
            .with_context(|| format!("Failed to read ROM file {}", self.rom_path.display()))?;

        let mut chip8 =
            Chip8::with_config(self.config()).context("Invalid machine configuration")?;
        chip8
            .load_rom(&rom)
            .context("Failed to load ROM into CHIP-8 memory")?;

        Ok(chip8)
    }
}
