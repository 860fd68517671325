use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, error};

use super::{Chip8, Chip8Error, Chip8Result};
use crate::u4;

/// A `Chip8` shared between threads.
///
/// All access goes through one mutex, so two instructions never interleave
/// and timer ticks land between instructions. A thread blocked on Fx0A
/// sleeps on a condition variable with the lock released, so the timer
/// thread and key input keep running.
#[derive(Clone)]
pub struct SharedChip8 {
    inner: Arc<Shared>,
}

struct Shared {
    chip8: Mutex<Chip8>,
    key_event: Condvar,
    shutdown: AtomicBool,
}

impl SharedChip8 {
    pub fn new(chip8: Chip8) -> Self {
        Self {
            inner: Arc::new(Shared {
                chip8: Mutex::new(chip8),
                key_event: Condvar::new(),
                shutdown: AtomicBool::new(false),
            }),
        }
    }

    /// Locks the interpreter for inspection (rendering, debugging).
    ///
    /// A panic on another thread cannot leave the machine half-written
    /// since every mutation completes under the lock, so poisoning is ignored.
    pub fn lock(&self) -> MutexGuard<'_, Chip8> {
        self.inner
            .chip8
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Executes exactly one instruction under the lock.
    pub fn execute(&self) -> Result<Chip8Result, Chip8Error> {
        self.lock().execute()
    }

    /// Executes one instruction. If it suspends on Fx0A, blocks until a
    /// key resolves the wait or the session shuts down.
    pub fn execute_blocking(&self) -> Result<Chip8Result, Chip8Error> {
        let mut chip8 = self.lock();
        let result = chip8.execute()?;

        if let Chip8Result::WaitingForKey { register } = result {
            debug!("Blocking until a key is pressed for V{register}");
            while chip8.waiting_for_key().is_some() && !self.is_shut_down() {
                chip8 = self
                    .inner
                    .key_event
                    .wait(chip8)
                    .unwrap_or_else(PoisonError::into_inner);
            }

            if chip8.waiting_for_key().is_some() {
                return Ok(result);
            }
            return Ok(Chip8Result::Continue);
        }

        Ok(result)
    }

    pub fn decrement_timers(&self) {
        self.lock().decrement_timers();
    }

    /// Updates a key and wakes any thread blocked on Fx0A.
    pub fn set_key(&self, key: u4, pressed: bool) {
        self.lock().set_key(key, pressed);
        self.inner.key_event.notify_all();
    }

    pub fn should_beep(&self) -> bool {
        self.lock().should_beep()
    }

    /// Stops every driver thread of this session and wakes blocked waiters.
    pub fn shutdown(&self) {
        self.inner.shutdown.store(true, Ordering::SeqCst);
        // A waiter holds the lock from its flag check until it sleeps
        drop(self.lock());
        self.inner.key_event.notify_all();
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.shutdown.load(Ordering::SeqCst)
    }

    /// Starts a thread calling `decrement_timers` at the configured timer rate.
    pub fn spawn_timer(&self) -> TimerHandle {
        let shared = self.clone();
        let interval = Duration::from_secs_f32(1.0 / self.lock().config().timer_hz);

        let thread = thread::spawn(move || {
            let mut next_tick = Instant::now() + interval;

            while !shared.is_shut_down() {
                let now = Instant::now();
                if now < next_tick {
                    thread::sleep(next_tick - now);
                }
                next_tick += interval;

                shared.decrement_timers();
            }
        });

        TimerHandle {
            shared: self.clone(),
            thread: Some(thread),
        }
    }

    /// Starts a thread executing instructions at the configured CPU rate
    /// until shutdown or a fault.
    pub fn spawn_cpu(&self) -> CpuHandle {
        let shared = self.clone();
        let interval = Duration::from_secs_f32(1.0 / self.lock().config().cpu_hz);

        let thread = thread::spawn(move || {
            let mut next_cycle = Instant::now() + interval;

            while !shared.is_shut_down() {
                let result = shared.execute_blocking().inspect_err(|e| {
                    error!("CPU thread stopped: {e}");
                })?;

                let now = Instant::now();
                if result == Chip8Result::Continue && now > next_cycle + interval {
                    // Resuming after a long block, don't try to catch up
                    next_cycle = now;
                } else if now < next_cycle {
                    thread::sleep(next_cycle - now);
                }
                next_cycle += interval;
            }

            Ok(())
        });

        CpuHandle {
            shared: self.clone(),
            thread: Some(thread),
        }
    }
}

/// Owns the timer thread. Dropping it shuts the session down and joins.
pub struct TimerHandle {
    shared: SharedChip8,
    thread: Option<JoinHandle<()>>,
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.shared.shutdown();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Owns the CPU thread. Dropping it shuts the session down and joins.
pub struct CpuHandle {
    shared: SharedChip8,
    thread: Option<JoinHandle<Result<(), Chip8Error>>>,
}

impl CpuHandle {
    /// True once the CPU thread exited, either on shutdown or a fault.
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().is_none_or(|t| t.is_finished())
    }

    /// Shuts the session down and returns the fault that stopped the CPU, if any.
    pub fn stop(mut self) -> Result<(), Chip8Error> {
        self.shared.shutdown();
        match self.thread.take() {
            Some(thread) => thread.join().unwrap_or(Err(Chip8Error::Halted)),
            None => Ok(()),
        }
    }
}

impl Drop for CpuHandle {
    fn drop(&mut self) {
        self.shared.shutdown();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
