mod common;

use std::{
    thread,
    time::{Duration, Instant},
};

use chip8_vm::{
    chip8::{Chip8, Chip8Config, Chip8Error, SharedChip8},
    u4,
};
use common::{machine_with, rom};

fn fast_config() -> Chip8Config {
    Chip8Config {
        cpu_hz: 2000.0,
        timer_hz: 1000.0,
        ..common::config()
    }
}

/// Polls `done` until it holds or five seconds pass.
fn wait_until(shared: &SharedChip8, done: impl Fn(&Chip8) -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if done(&*shared.lock()) {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    false
}

#[test]
fn cpu_thread_runs_until_stopped() {
    // 7101 1200: V1 counts up forever
    let shared = SharedChip8::new(machine_with(fast_config(), &[0x7101, 0x1200]));
    let cpu = shared.spawn_cpu();

    assert!(wait_until(&shared, |chip8| chip8.v()[1] >= 10));
    assert_eq!(cpu.stop(), Ok(()));
    assert!(shared.is_shut_down());
}

#[test]
fn key_press_resumes_blocked_cpu_thread() {
    // F20A 6301 1204: wait for a key into V2, then set V3 and spin
    let shared = SharedChip8::new(machine_with(fast_config(), &[0xF20A, 0x6301, 0x1204]));
    let cpu = shared.spawn_cpu();

    assert!(wait_until(&shared, |chip8| chip8.waiting_for_key().is_some()));
    shared.set_key(u4::new(0xB), true);

    assert!(wait_until(&shared, |chip8| chip8.v()[3] == 1));
    assert_eq!(shared.lock().v()[2], 0xB);
    assert_eq!(cpu.stop(), Ok(()));
}

#[test]
fn timer_thread_ticks_independently() {
    // 60FF F015 F018 1206: load both timers, then spin
    let shared = SharedChip8::new(machine_with(
        fast_config(),
        &[0x60FF, 0xF015, 0xF018, 0x1206],
    ));
    for _ in 0..3 {
        shared.execute().unwrap();
    }
    assert!(shared.should_beep());

    let timer = shared.spawn_timer();
    assert!(wait_until(&shared, |chip8| chip8.delay_timer() == 0));
    drop(timer);

    assert!(!shared.should_beep());
}

#[test]
fn fault_stops_cpu_thread() {
    let mut chip8 = Chip8::with_config(fast_config()).unwrap();
    chip8.load_rom(&rom(&[0x6001, 0xFFFF])).unwrap();
    let shared = SharedChip8::new(chip8);
    let cpu = shared.spawn_cpu();

    let deadline = Instant::now() + Duration::from_secs(5);
    while !cpu.is_finished() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(2));
    }

    assert_eq!(cpu.stop(), Err(Chip8Error::UnknownOpcode { opcode: 0xFFFF }));
    assert_eq!(shared.execute(), Err(Chip8Error::Halted));
    assert_eq!(shared.lock().pc(), 0x202);
}
