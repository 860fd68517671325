use std::collections::HashSet;

use super::{Chip8, Chip8Error, Chip8Result};
use crate::u4;

/// Drives a [`Chip8`] from a host's frame clock.
///
/// Instructions and timers run on independent clocks inside a single
/// thread, so no locking is needed.
pub struct Chip8Runner {
    chip8: Chip8,
    cpu_period: f32,
    timer_period: f32,
    /// Elapsed time not yet spent on instructions.
    cpu_backlog: f32,
    /// Elapsed time not yet spent on timer ticks.
    timer_backlog: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chip8RunnerResult {
    /// The frame's time budget was used up, or a draw ended it early.
    Ok,
    /// The interpreter is suspended on Fx0A.
    WaitingForKey,
    /// PC landed on a breakpoint after a step.
    HitBreakpoint,
}

impl Chip8Runner {
    pub fn new(chip8: Chip8) -> Self {
        let cpu_period = chip8.config().cpu_hz.recip();
        let timer_period = chip8.config().timer_hz.recip();

        Self {
            chip8,
            cpu_period,
            timer_period,
            cpu_backlog: 0.0,
            timer_backlog: 0.0,
        }
    }

    /// Spends `dt` seconds of wall time on timer ticks and instructions.
    ///
    /// A draw ends the frame so the host can present it; the unspent
    /// instruction time is dropped rather than replayed next frame.
    pub fn update(&mut self, dt: f32) -> Result<Chip8RunnerResult, Chip8Error> {
        self.update_with_breakpoints(dt, None)
    }

    /// [`update`](Self::update), stopping as soon as PC reaches a breakpoint.
    pub fn update_with_breakpoints(
        &mut self,
        dt: f32,
        breakpoints: Option<&HashSet<u16>>,
    ) -> Result<Chip8RunnerResult, Chip8Error> {
        self.timer_backlog += dt;
        self.cpu_backlog += dt;

        // Timers keep decaying while the CPU is blocked on a key
        while self.timer_backlog >= self.timer_period {
            self.timer_backlog -= self.timer_period;
            self.chip8.decrement_timers();
        }

        while self.cpu_backlog >= self.cpu_period {
            self.cpu_backlog -= self.cpu_period;

            let stepped = self.chip8.execute()?;

            if breakpoints.is_some_and(|set| set.contains(&self.chip8.pc)) {
                self.cpu_backlog = 0.0;
                return Ok(Chip8RunnerResult::HitBreakpoint);
            }

            match stepped {
                Chip8Result::Continue => {}
                Chip8Result::Drew => {
                    self.cpu_backlog = 0.0;
                    break;
                }
                Chip8Result::WaitingForKey { .. } => {
                    self.cpu_backlog = 0.0;
                    return Ok(Chip8RunnerResult::WaitingForKey);
                }
            }
        }

        Ok(Chip8RunnerResult::Ok)
    }

    pub fn should_beep(&self) -> bool {
        self.chip8.should_beep()
    }

    pub fn set_key(&mut self, key: u4, pressed: bool) {
        self.chip8.set_key(key, pressed)
    }

    pub fn chip8_ref(&self) -> &Chip8 {
        &self.chip8
    }

    pub fn chip8_mut(&mut self) -> &mut Chip8 {
        &mut self.chip8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip8::Chip8Config;

    fn runner(rom: &[u8]) -> Chip8Runner {
        let mut chip8 = Chip8::with_config(Chip8Config {
            cpu_hz: 100.0,
            timer_hz: 10.0,
            ..Chip8Config::default()
        })
        .unwrap();
        chip8.load_rom(rom).unwrap();
        Chip8Runner::new(chip8)
    }

    #[test]
    fn runs_cycles_for_elapsed_time() {
        // 6001 7101 1202: V1 counts up forever
        let mut runner = runner(&[0x60, 0x01, 0x71, 0x01, 0x12, 0x02]);
        runner.update(0.105).unwrap();

        // 10 cycles: 6001, then 7101/1202 alternating
        assert_eq!(runner.chip8_ref().v()[1], 5);
    }

    #[test]
    fn timers_decay_independently_of_instructions() {
        // F00A: wait for key forever, with delay timer preloaded
        let mut runner = runner(&[0xF0, 0x0A]);
        runner.chip8_mut().delay_timer = 5;
        runner.chip8_mut().sound_timer = 1;
        assert!(runner.should_beep());

        let result = runner.update(0.31).unwrap();
        assert_eq!(result, Chip8RunnerResult::WaitingForKey);

        runner.update(0.0).unwrap();
        assert_eq!(runner.chip8_ref().delay_timer(), 2);
        assert!(!runner.should_beep());
    }

    #[test]
    fn draw_ends_the_frame() {
        // 00E0 00E0 00E0
        let mut runner = runner(&[0x00, 0xE0, 0x00, 0xE0, 0x00, 0xE0]);
        runner.update(0.05).unwrap();

        assert_eq!(runner.chip8_ref().pc(), 0x202);
    }

    #[test]
    fn stops_on_breakpoint() {
        let mut runner = runner(&[0x60, 0x01, 0x61, 0x02, 0x62, 0x03, 0x12, 0x06]);
        let breakpoints = HashSet::from([0x204]);

        let result = runner
            .update_with_breakpoints(1.0, Some(&breakpoints))
            .unwrap();

        assert_eq!(result, Chip8RunnerResult::HitBreakpoint);
        assert_eq!(runner.chip8_ref().pc(), 0x204);
        assert_eq!(runner.chip8_ref().v()[2], 0);
    }
}
