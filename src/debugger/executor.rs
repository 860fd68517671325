use std::collections::HashSet;

use super::commands::{BreakpointAction, Command, CommandError, CommandResult, SetTarget};
use crate::chip8::{
    Chip8, Chip8Error, Chip8Result, Chip8Runner, Chip8RunnerResult, MEMORY_SIZE, Opcode,
};

/// Applies debugger commands to a machine and drives it while running.
pub struct Executor {
    runner: Chip8Runner,
    running: bool,
    breakpoints: HashSet<u16>,
}

impl Executor {
    pub fn new(runner: Chip8Runner) -> Self {
        Self {
            runner,
            running: false,
            breakpoints: HashSet::new(),
        }
    }

    /// Advances the machine by `dt` seconds while in running mode.
    ///
    /// A fault or a breakpoint drops back to paused.
    pub fn poll(&mut self, dt: f32) -> Result<Chip8RunnerResult, Chip8Error> {
        if !self.running {
            return Ok(Chip8RunnerResult::Ok);
        }

        let polled = self
            .runner
            .update_with_breakpoints(dt, Some(&self.breakpoints));
        self.running = matches!(
            polled,
            Ok(Chip8RunnerResult::Ok | Chip8RunnerResult::WaitingForKey)
        );

        polled
    }

    pub fn execute(&mut self, command: Command) -> Result<CommandResult, CommandError> {
        match command {
            Command::Run => self.execute_run(),
            Command::Pause => self.execute_pause(),
            Command::Reset => {
                self.execute_pause();
                self.runner.chip8_mut().reset();
            }
            Command::Step { count } => return self.execute_step(count),
            Command::Breakpoint { action } => return Ok(self.handle_breakpoint(action)),
            Command::Set { target, value } => return self.handle_set(target, value),
            Command::Mem { start, len } => return self.handle_mem(start, len),
            Command::Disasm { start, len } => return self.handle_disasm(start, len),
            Command::Quit => return Ok(CommandResult::Quit),
        }

        Ok(CommandResult::Ok)
    }

    pub fn execute_run(&mut self) {
        self.running = true;
    }

    pub fn execute_pause(&mut self) {
        self.running = false;
    }

    /// Steps up to `count` instructions, stopping early on a key wait.
    pub fn execute_step(&mut self, count: u16) -> Result<CommandResult, CommandError> {
        let chip8 = self.runner.chip8_mut();
        for _ in 0..count {
            if let Chip8Result::WaitingForKey { .. } = chip8.execute()? {
                break;
            }
        }
        Ok(CommandResult::Ok)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn chip8(&self) -> &Chip8 {
        self.runner.chip8_ref()
    }

    pub fn runner_mut(&mut self) -> &mut Chip8Runner {
        &mut self.runner
    }

    pub fn breakpoints(&self) -> &HashSet<u16> {
        &self.breakpoints
    }

    fn handle_breakpoint(&mut self, action: BreakpointAction) -> CommandResult {
        match action {
            BreakpointAction::Set { addr } => _ = self.breakpoints.insert(addr),
            BreakpointAction::Clear { addr } => _ = self.breakpoints.remove(&addr),
            BreakpointAction::ClearAll => self.breakpoints.clear(),
            BreakpointAction::List => {
                let mut addrs: Vec<u16> = self.breakpoints.iter().copied().collect();
                addrs.sort_unstable();
                return CommandResult::Breakpoints(addrs);
            }
        }

        CommandResult::Ok
    }

    fn handle_set(&mut self, target: SetTarget, value: u16) -> Result<CommandResult, CommandError> {
        let chip8 = self.runner.chip8_mut();
        let byte = || u8::try_from(value).map_err(|_| CommandError::ValueOutOfRange);

        match target {
            SetTarget::V(reg) => {
                chip8.v[reg] = byte()?;
            }
            SetTarget::DelayTimer => {
                chip8.delay_timer = byte()?;
            }
            SetTarget::SoundTimer => {
                chip8.sound_timer = byte()?;
            }
            SetTarget::I => {
                chip8.i = value;
            }
            SetTarget::Pc => {
                if usize::from(value) >= MEMORY_SIZE {
                    return Err(CommandError::ValueOutOfRange);
                }
                chip8.pc = value;
            }
        }

        Ok(CommandResult::Ok)
    }

    fn handle_mem(&self, start: u16, len: u16) -> Result<CommandResult, CommandError> {
        let start_addr = usize::from(start);
        if start_addr >= MEMORY_SIZE {
            return Err(CommandError::ValueOutOfRange);
        }

        // Clamp the dump to the end of memory
        let len = usize::from(len).min(MEMORY_SIZE - start_addr);
        let data = self.chip8().memory().slice(start_addr, len)?.to_vec();

        Ok(CommandResult::MemDump {
            data,
            offset: start,
        })
    }

    fn handle_disasm(&self, start: Option<u16>, len: u16) -> Result<CommandResult, CommandError> {
        let memory = self.chip8().memory();
        let start = start.unwrap_or(self.chip8().pc());

        let instructions = (0..len)
            .map(|n| start.wrapping_add(n.wrapping_mul(2)))
            .map_while(|addr| {
                let raw = memory.read_word(usize::from(addr)).ok()?;
                Some((addr, raw, Opcode::decode(raw)))
            })
            .collect::<Vec<_>>();

        if instructions.is_empty() && len > 0 {
            return Err(CommandError::ValueOutOfRange);
        }

        Ok(CommandResult::Disasm { instructions })
    }
}
