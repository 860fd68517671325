mod common;

use chip8_vm::{
    chip8::{Chip8Result, FONT},
    u4,
};
use common::{machine, run, run_program};

#[test]
fn add_immediate_wraps_without_touching_vf() {
    for x in 0..0xF {
        let set = 0x6000 | (x << 8) | 250;
        let add = 0x7000 | (x << 8) | 10;
        let chip8 = run_program(&[0x6F07, set, add]);

        assert_eq!(chip8.v()[x as usize], 4, "V{x:X}");
        assert_eq!(chip8.v()[0xF], 7, "V{x:X}");
    }
}

#[test]
fn add_registers_sets_carry() {
    let chip8 = run_program(&[0x60C8, 0x6164, 0x8014]);
    assert_eq!((chip8.v()[0], chip8.v()[0xF]), (44, 1));

    let chip8 = run_program(&[0x600A, 0x6114, 0x6FFF, 0x8014]);
    assert_eq!((chip8.v()[0], chip8.v()[0xF]), (30, 0));
}

#[test]
fn sub_registers_sets_not_borrow() {
    let chip8 = run_program(&[0x600A, 0x6114, 0x8015]);
    assert_eq!((chip8.v()[0], chip8.v()[0xF]), (246, 0));

    let chip8 = run_program(&[0x6014, 0x610A, 0x8015]);
    assert_eq!((chip8.v()[0], chip8.v()[0xF]), (10, 1));
}

#[test]
fn reverse_sub_sets_not_borrow() {
    let chip8 = run_program(&[0x600A, 0x6114, 0x8017]);
    assert_eq!((chip8.v()[0], chip8.v()[0xF]), (10, 1));

    let chip8 = run_program(&[0x6014, 0x610A, 0x8017]);
    assert_eq!((chip8.v()[0], chip8.v()[0xF]), (246, 0));
}

#[test]
fn shifts_operate_on_vx() {
    let chip8 = run_program(&[0x6003, 0x61F0, 0x8016]);
    assert_eq!((chip8.v()[0], chip8.v()[0xF]), (0b0000_0001, 1));

    let chip8 = run_program(&[0x6081, 0x61FF, 0x800E]);
    assert_eq!((chip8.v()[0], chip8.v()[0xF]), (0b0000_0010, 1));
}

#[test]
fn flag_overwrites_result_when_destination_is_vf() {
    let chip8 = run_program(&[0x6FFF, 0x6101, 0x8F14]);
    assert_eq!(chip8.v()[0xF], 1);
}

#[test]
fn logic_ops_combine_registers() {
    let chip8 = run_program(&[0x60CC, 0x61AA, 0x6F05, 0x8011]);
    assert_eq!(chip8.v()[0], 0xEE);
    assert_eq!(chip8.v()[0xF], 5);

    let chip8 = run_program(&[0x60CC, 0x61AA, 0x8012]);
    assert_eq!(chip8.v()[0], 0x88);

    let chip8 = run_program(&[0x60CC, 0x61AA, 0x8013]);
    assert_eq!(chip8.v()[0], 0x66);

    let chip8 = run_program(&[0x61AA, 0x8010]);
    assert_eq!(chip8.v()[0], 0xAA);
}

#[test]
fn conditional_skips() {
    // 3xnn taken: 6101 is skipped
    let mut chip8 = machine(&[0x6005, 0x3005, 0x6101, 0x6202]);
    run(&mut chip8, 3);
    assert_eq!(chip8.pc(), 0x208);
    assert_eq!((chip8.v()[1], chip8.v()[2]), (0, 2));

    let mut chip8 = machine(&[0x6005, 0x3006, 0x6101]);
    run(&mut chip8, 3);
    assert_eq!(chip8.v()[1], 1);

    // 4xnn, 5xy0, 9xy0
    let mut chip8 = machine(&[0x6005, 0x4006, 0x0000, 0x6105, 0x5010, 0x0000, 0x9010]);
    run(&mut chip8, 2);
    assert_eq!(chip8.pc(), 0x206);
    run(&mut chip8, 2);
    assert_eq!(chip8.pc(), 0x20C);
    run(&mut chip8, 1);
    assert_eq!(chip8.pc(), 0x20E);
}

#[test]
fn call_and_return() {
    // 200: CALL 206, 202: LD V1 1, 204: JP 204, 206: LD V2 2, 208: RET
    let mut chip8 = machine(&[0x2206, 0x6101, 0x1204, 0x6202, 0x00EE]);

    run(&mut chip8, 1);
    assert_eq!(chip8.pc(), 0x206);
    assert_eq!(chip8.stack(), &[0x202]);

    run(&mut chip8, 3);
    assert_eq!(chip8.pc(), 0x204);
    assert!(chip8.stack().is_empty());
    assert_eq!((chip8.v()[1], chip8.v()[2]), (1, 2));

    run(&mut chip8, 5);
    assert_eq!(chip8.pc(), 0x204);
}

#[test]
fn jumps() {
    let chip8 = run_program(&[0x1300]);
    assert_eq!(chip8.pc(), 0x300);

    let chip8 = run_program(&[0x6004, 0xB300]);
    assert_eq!(chip8.pc(), 0x304);
}

#[test]
fn index_register_ops() {
    let chip8 = run_program(&[0xA300, 0x6105, 0xF11E]);
    assert_eq!(chip8.i(), 0x305);

    let chip8 = run_program(&[0x600A, 0xF029]);
    assert_eq!(chip8.i(), 50);
}

#[test]
fn random_is_masked_and_seeded() {
    let chip8 = run_program(&[0xC00F, 0xC100]);
    assert_eq!(chip8.v()[0] & 0xF0, 0);
    assert_eq!(chip8.v()[1], 0);

    let a = run_program(&[0xC0FF, 0xC1FF, 0xC2FF]);
    let b = run_program(&[0xC0FF, 0xC1FF, 0xC2FF]);
    assert_eq!(a.v(), b.v());
}

#[test]
fn bcd_stores_decimal_digits() {
    let chip8 = run_program(&[0x609D, 0xA300, 0xF033]);
    assert_eq!(chip8.memory().slice(0x300, 3).unwrap(), &[1, 5, 7]);

    let chip8 = run_program(&[0x6009, 0xA300, 0xF033]);
    assert_eq!(chip8.memory().slice(0x300, 3).unwrap(), &[0, 0, 9]);
}

#[test]
fn register_block_store_and_load() {
    let mut chip8 = machine(&[
        0x6001, 0x6102, 0x6203, 0x63FF, 0xA300, 0xF255, // store V0..V2
        0x6000, 0x6100, 0x6200, 0xF265, // load them back
    ]);

    run(&mut chip8, 6);
    assert_eq!(chip8.memory().slice(0x300, 4).unwrap(), &[1, 2, 3, 0]);
    assert_eq!(chip8.i(), 0x300);

    run(&mut chip8, 4);
    assert_eq!(&chip8.v()[..4], &[1, 2, 3, 0xFF]);
    assert_eq!(chip8.i(), 0x300);
}

#[test]
fn timers_load_read_and_decay() {
    let mut chip8 = machine(&[0x6010, 0xF015, 0xF018, 0xF107]);
    run(&mut chip8, 4);
    assert_eq!(chip8.v()[1], 0x10);
    assert_eq!(chip8.sound_timer(), 0x10);
    assert!(chip8.should_beep());

    chip8.decrement_timers();
    assert_eq!((chip8.delay_timer(), chip8.sound_timer()), (0x0F, 0x0F));
}

#[test]
fn timers_stop_at_zero() {
    let mut chip8 = machine(&[]);
    chip8.decrement_timers();
    chip8.decrement_timers();

    assert_eq!((chip8.delay_timer(), chip8.sound_timer()), (0, 0));
    assert!(!chip8.should_beep());
}

#[test]
fn key_skips() {
    let program = [0x6005, 0xE09E, 0x6101, 0xE0A1, 0x6202];

    let mut chip8 = machine(&program);
    chip8.set_key(u4::new(5), true);
    run(&mut chip8, 4);
    assert_eq!((chip8.v()[1], chip8.v()[2]), (0, 2));

    let mut chip8 = machine(&program);
    run(&mut chip8, 4);
    assert_eq!((chip8.v()[1], chip8.v()[2]), (1, 0));
}

#[test]
fn key_skips_ignore_values_past_the_keypad() {
    // V0 = 0x15 names no key, even with key 5 held
    let mut chip8 = machine(&[0x6015, 0xE09E, 0x6101, 0xE0A1, 0x6202]);
    chip8.set_key(u4::new(5), true);
    run(&mut chip8, 4);

    assert_eq!(chip8.pc(), 0x20A);
    assert_eq!((chip8.v()[1], chip8.v()[2]), (1, 0));
}

#[test]
fn key_wait_suspends_until_new_press() {
    let mut chip8 = machine(&[0xF30A, 0x6401]);
    chip8.set_key(u4::new(2), true);

    let register = u4::new(3);
    assert_eq!(run(&mut chip8, 1), Chip8Result::WaitingForKey { register });
    assert_eq!(run(&mut chip8, 1), Chip8Result::WaitingForKey { register });
    assert_eq!(chip8.pc(), 0x202);

    // Still held, not a new press
    chip8.set_key(u4::new(2), true);
    assert_eq!(chip8.waiting_for_key(), Some(register));

    chip8.set_key(u4::new(7), true);
    assert_eq!(chip8.waiting_for_key(), None);
    assert_eq!(chip8.v()[3], 7);

    assert_eq!(run(&mut chip8, 1), Chip8Result::Continue);
    assert_eq!(chip8.v()[4], 1);
}

#[test]
fn timers_decay_during_key_wait() {
    let mut chip8 = machine(&[0x6003, 0xF015, 0xF00A]);
    run(&mut chip8, 3);

    for _ in 0..5 {
        chip8.decrement_timers();
    }
    assert_eq!(chip8.delay_timer(), 0);
    assert!(chip8.waiting_for_key().is_some());
}

#[test]
fn draw_font_glyph_then_erase_it() {
    // I = glyph 0, V0 = V1 = 0, draw 5 rows twice
    let mut chip8 = machine(&[0xA000, 0x6000, 0x6100, 0xD015, 0xD015]);

    assert_eq!(run(&mut chip8, 4), Chip8Result::Drew);
    assert_eq!(chip8.v()[0xF], 0);
    let display = chip8.display();
    for (row, byte) in FONT[..5].iter().enumerate() {
        for col in 0..display.width() {
            let expected = col < 8 && byte & (0x80 >> col) != 0;
            assert_eq!(display.pixel(col, row), expected, "({col}, {row})");
        }
    }
    assert!((5..display.height()).all(|y| (0..display.width()).all(|x| !display.pixel(x, y))));

    assert_eq!(run(&mut chip8, 1), Chip8Result::Drew);
    assert_eq!(chip8.v()[0xF], 1);
    assert!(chip8.display().rows().all(|row| row.iter().all(|p| !p)));
}

#[test]
fn draw_wraps_origin_and_clips_body() {
    // Glyph 8 at (62 + 64, 30 + 32)
    let chip8 = run_program(&[0xA028, 0x607E, 0x613E, 0xD015]);
    let display = chip8.display();

    assert!(display.pixel(62, 30));
    assert!(display.pixel(63, 30));
    assert!(display.pixel(62, 31));
    assert!(!display.pixel(63, 31));
    assert!(!display.pixel(0, 30));
    assert!(!display.pixel(62, 0));
}

#[test]
fn draw_collision_resets_flag_per_draw() {
    let mut chip8 = machine(&[0xA000, 0xD015, 0xD015, 0x6008, 0xD015]);

    run(&mut chip8, 3);
    assert_eq!(chip8.v()[0xF], 1);

    run(&mut chip8, 2);
    assert_eq!(chip8.v()[0xF], 0);
    assert!(chip8.display().pixel(8, 0));
}

#[test]
fn clear_display() {
    let mut chip8 = machine(&[0xA000, 0xD001, 0x00E0]);
    run(&mut chip8, 2);
    assert!(chip8.display().pixel(0, 0));

    assert_eq!(run(&mut chip8, 1), Chip8Result::Drew);
    assert!(!chip8.display().pixel(0, 0));
}
