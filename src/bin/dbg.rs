use std::{
    collections::HashSet,
    time::{Duration, Instant},
};

use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    DefaultTerminal,
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph, Widget},
};

use chip8_vm::{
    chip8::{Chip8, Chip8Runner, Chip8RunnerResult, Opcode},
    cli::MachineArgs,
    debugger::{Cli, Command, CommandResult, Executor},
    u4,
};

/// How long to wait for terminal input before drawing the next frame.
const FRAME_TIME: Duration = Duration::from_millis(16);

/// Terminals on Linux report presses but not releases, so a keypad key
/// counts as held until it has been quiet this long.
const KEY_HOLD: Duration = Duration::from_millis(50);

const SIDEBAR_WIDTH: u16 = 24;

/// Keypad face as printed on the COSMAC VIP.
const KEYPAD_FACE: [[u8; 4]; 4] = [
    [0x1, 0x2, 0x3, 0xC],
    [0x4, 0x5, 0x6, 0xD],
    [0x7, 0x8, 0x9, 0xE],
    [0xA, 0x0, 0xB, 0xF],
];

/// Maps the 1234/QWER/ASDF/ZXCV block onto the hex keypad.
fn keypad_key(c: char) -> Option<u4> {
    let key = match c.to_ascii_lowercase() {
        '1' => 0x1,
        '2' => 0x2,
        '3' => 0x3,
        '4' => 0xC,
        'q' => 0x4,
        'w' => 0x5,
        'e' => 0x6,
        'r' => 0xD,
        'a' => 0x7,
        's' => 0x8,
        'd' => 0x9,
        'f' => 0xE,
        'z' => 0xA,
        'x' => 0x0,
        'c' => 0xB,
        'v' => 0xF,
        _ => return None,
    };
    Some(u4::new(key))
}

#[derive(Default)]
struct HeldKeys {
    pressed_at: [Option<Instant>; 16],
}

impl HeldKeys {
    fn press(&mut self, key: u4, now: Instant) {
        self.pressed_at[key] = Some(now);
    }

    /// Forgets and returns every key that has been quiet for `KEY_HOLD`.
    fn expire(&mut self, now: Instant) -> Vec<u4> {
        u4::all()
            .filter(|&key| {
                let expired = self.pressed_at[key]
                    .is_some_and(|pressed| now.duration_since(pressed) > KEY_HOLD);
                if expired {
                    self.pressed_at[key] = None;
                }
                expired
            })
            .collect()
    }
}

struct App {
    executor: Executor,
    held: HeldKeys,
    input: String,
    output: String,
    /// Re-run when Enter is pressed on an empty prompt.
    last_command: Option<Command>,
    last_tick: Instant,
    quit: bool,
}

impl App {
    fn new(chip8: Chip8) -> Self {
        Self {
            executor: Executor::new(Chip8Runner::new(chip8)),
            held: HeldKeys::default(),
            input: String::new(),
            output: String::from("Type a command, e.g. `step`, `run` or `help`"),
            last_command: None,
            last_tick: Instant::now(),
            quit: false,
        }
    }

    fn run(&mut self, terminal: &mut DefaultTerminal) -> anyhow::Result<()> {
        while !self.quit {
            self.tick();

            terminal.draw(|frame| frame.render_widget(&*self, frame.area()))?;

            for key in self.held.expire(Instant::now()) {
                self.executor.runner_mut().set_key(key, false);
            }

            if event::poll(FRAME_TIME)?
                && let Event::Key(key) = event::read()?
            {
                self.on_key(key);
            }
        }

        Ok(())
    }

    /// Advances a running machine by the wall time since the last tick.
    fn tick(&mut self) {
        let now = Instant::now();
        let dt = now.duration_since(self.last_tick).as_secs_f32();
        self.last_tick = now;

        self.output = match self.executor.poll(dt) {
            Ok(Chip8RunnerResult::Ok) => return,
            Ok(Chip8RunnerResult::HitBreakpoint) => {
                format!("Breakpoint hit at {:03X}", self.executor.chip8().pc())
            }
            Ok(Chip8RunnerResult::WaitingForKey) => "Waiting for key".to_string(),
            Err(e) => e.to_string(),
        };
    }

    fn on_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.quit = true;
            return;
        }
        if key.kind != KeyEventKind::Press {
            return;
        }

        // While running, the keyboard drives the keypad
        if self.executor.is_running() {
            match key.code {
                KeyCode::Esc => {
                    self.executor.execute_pause();
                    self.output = "Paused".to_string();
                }
                KeyCode::Char(c) => {
                    if let Some(pad) = keypad_key(c) {
                        self.executor.runner_mut().set_key(pad, true);
                        self.held.press(pad, Instant::now());
                    }
                }
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Esc => self.quit = true,
            KeyCode::Enter => self.submit(),
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Char(c) => self.input.push(c),
            _ => {}
        }
    }

    fn submit(&mut self) {
        let line = std::mem::take(&mut self.input);

        let command = if line.trim().is_empty() {
            match self.last_command.clone() {
                Some(command) => command,
                None => return,
            }
        } else {
            match Cli::try_parse_from(line.split_whitespace()) {
                Ok(cli) => cli.command,
                Err(e) => {
                    self.output = e.to_string();
                    self.last_command = None;
                    return;
                }
            }
        };

        self.last_command = Some(command.clone());
        self.output = self.run_command(command);
    }

    fn run_command(&mut self, command: Command) -> String {
        match self.executor.execute(command) {
            Ok(CommandResult::Ok) => "OK".to_string(),
            Ok(CommandResult::Quit) => {
                self.quit = true;
                String::new()
            }
            Ok(CommandResult::Breakpoints(addrs)) if addrs.is_empty() => {
                "No breakpoints".to_string()
            }
            Ok(CommandResult::Breakpoints(addrs)) => addrs
                .iter()
                .map(|addr| format!("{addr:03X}"))
                .collect::<Vec<_>>()
                .join(" "),
            Ok(CommandResult::MemDump { data, offset }) => hex_dump(&data, offset),
            Ok(CommandResult::Disasm { instructions }) => instructions
                .iter()
                .map(|(addr, word, opcode)| format!("{addr:03X}  {word:04X}  {opcode}"))
                .collect::<Vec<_>>()
                .join("\n"),
            Err(e) => e.to_string(),
        }
    }
}

fn hex_dump(data: &[u8], offset: u16) -> String {
    data.chunks(16)
        .enumerate()
        .map(|(row, chunk)| {
            let bytes: Vec<String> = chunk.iter().map(|byte| format!("{byte:02X}")).collect();
            format!("{:03X}: {}", usize::from(offset) + row * 16, bytes.join(" "))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chip8 = self.executor.chip8();
        let cols = chip8.display().width() as u16;
        let rows = chip8.display().height() as u16;

        let (min_width, min_height) = (cols + 2 + SIDEBAR_WIDTH, rows + 2 + 3 + 3);
        if area.width < min_width || area.height < min_height {
            Paragraph::new(format!("Terminal too small, need {min_width}x{min_height}"))
                .style(Style::default().fg(Color::Red))
                .alignment(Alignment::Center)
                .block(Block::bordered())
                .render(area.centered(Constraint::Length(45), Constraint::Length(3)), buf);
            return;
        }

        let [main, sidebar] = Layout::horizontal([
            Constraint::Min(cols + 2),
            Constraint::Length(SIDEBAR_WIDTH),
        ])
        .areas(area);

        let [screen, output, prompt] = Layout::vertical([
            Constraint::Length(rows + 2),
            Constraint::Min(3),
            Constraint::Length(3),
        ])
        .areas(main);

        let [status, registers, keypad, stack, code] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Length(12),
            Constraint::Length(6),
            Constraint::Length(6),
            Constraint::Min(3),
        ])
        .areas(sidebar);

        panel(" Display ", screen_lines(chip8))
            .alignment(Alignment::Center)
            .render(screen, buf);
        panel(" Output ", self.output.lines().map(Line::from).collect()).render(output, buf);
        panel(" Command ", vec![Line::from(format!("> {}", self.input))]).render(prompt, buf);

        panel(" State ", vec![self.status_line()])
            .alignment(Alignment::Center)
            .render(status, buf);
        panel(" Registers ", register_lines(chip8)).render(registers, buf);
        panel(" Keypad ", keypad_lines(chip8))
            .alignment(Alignment::Center)
            .render(keypad, buf);
        panel(" Stack ", stack_lines(chip8, inner_height(stack))).render(stack, buf);

        let breakpoints = self.executor.breakpoints();
        panel(" Code ", code_lines(chip8, breakpoints, inner_height(code))).render(code, buf);
    }
}

impl App {
    fn status_line(&self) -> Line<'static> {
        let chip8 = self.executor.chip8();
        let (label, color) = if chip8.fault().is_some() {
            ("HALTED", Color::Red)
        } else if chip8.waiting_for_key().is_some() {
            ("KEY WAIT", Color::Cyan)
        } else if self.executor.is_running() {
            ("RUNNING", Color::Green)
        } else {
            ("PAUSED", Color::Yellow)
        };

        Line::styled(label, Style::default().fg(color))
    }
}

fn panel<'a>(title: &'a str, lines: Vec<Line<'a>>) -> Paragraph<'a> {
    Paragraph::new(lines).block(Block::bordered().title(title))
}

fn inner_height(area: Rect) -> usize {
    usize::from(area.height.saturating_sub(2))
}

fn screen_lines(chip8: &Chip8) -> Vec<Line<'static>> {
    chip8
        .display()
        .rows()
        .map(|row| {
            let text: String = row.iter().map(|&on| if on { '█' } else { ' ' }).collect();
            Line::styled(text, Style::default().fg(Color::Green))
        })
        .collect()
}

fn register_lines(chip8: &Chip8) -> Vec<Line<'static>> {
    let v = chip8.v();

    let mut lines = vec![
        Line::from(format!("PC {:03X}    I {:03X}", chip8.pc(), chip8.i())),
        Line::from(format!(
            "DT {:02X}     ST {:02X}",
            chip8.delay_timer(),
            chip8.sound_timer()
        )),
    ];
    for r in 0..8 {
        let (lo, hi) = (v[r], v[r + 8]);
        lines.push(Line::from(format!("V{r:X} {lo:02X}     V{:X} {hi:02X}", r + 8)));
    }

    lines
}

fn keypad_lines(chip8: &Chip8) -> Vec<Line<'static>> {
    let keypad = chip8.keypad();

    KEYPAD_FACE
        .iter()
        .map(|face| {
            let mut spans = Vec::with_capacity(face.len() * 2);
            for (col, &key) in face.iter().enumerate() {
                if col > 0 {
                    spans.push(Span::raw(" "));
                }
                let style = if keypad.is_down(u4::new(key)) {
                    Style::default().fg(Color::Black).bg(Color::White)
                } else {
                    Style::default()
                };
                spans.push(Span::styled(format!("{key:X}"), style));
            }
            Line::from(spans)
        })
        .collect()
}

/// Innermost frames first.
fn stack_lines(chip8: &Chip8, max: usize) -> Vec<Line<'static>> {
    let stack = chip8.stack();
    if stack.is_empty() {
        return vec![Line::styled("empty", Style::default().fg(Color::DarkGray))];
    }

    stack
        .iter()
        .enumerate()
        .rev()
        .take(max)
        .map(|(depth, addr)| Line::from(format!("{depth:>2}  {addr:03X}")))
        .collect()
}

/// Disassembly from PC onwards, with `*` marking breakpoints.
fn code_lines(chip8: &Chip8, breakpoints: &HashSet<u16>, count: usize) -> Vec<Line<'static>> {
    let pc = chip8.pc();

    (0..count)
        .map_while(|n| {
            let addr = u16::try_from(usize::from(pc) + n * 2).ok()?;
            let word = chip8.memory().read_word(usize::from(addr)).ok()?;
            let marker = if breakpoints.contains(&addr) { '*' } else { ' ' };
            let text = format!("{marker}{addr:03X} {}", Opcode::decode(word));

            Some(if addr == pc {
                Line::styled(text, Style::default().fg(Color::Black).bg(Color::Yellow))
            } else {
                Line::from(text)
            })
        })
        .collect()
}

/// Terminal debugger for CHIP-8 ROMs.
///
/// Commands are typed at the prompt while paused; while running, the
/// 1234/QWER/ASDF/ZXCV block drives the keypad and Escape pauses.
#[derive(Parser)]
#[command(about)]
struct Args {
    #[command(flatten)]
    machine: MachineArgs,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let chip8 = args.machine.load_machine()?;
    let mut app = App::new(chip8);

    let mut terminal = ratatui::init();
    let result = app.run(&mut terminal);
    ratatui::restore();

    result
}
