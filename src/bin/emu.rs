use std::{sync::Arc, time::Instant};

use anyhow::Context;
use clap::Parser;
use log::info;
use pixels::{Pixels, SurfaceTexture};
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use chip8_vm::{
    chip8::{CpuHandle, SharedChip8, TimerHandle},
    cli::MachineArgs,
    u4,
};

/// Brightness lost per second by an unlit pixel.
const PHOSPHOR_DECAY: f32 = 10.0;

/// Maps the 1234/QWER/ASDF/ZXCV block onto the hex keypad by key position,
/// so the layout holds on non-QWERTY keyboards.
fn keypad_key(code: KeyCode) -> Option<u4> {
    let key = match code {
        KeyCode::Digit1 => 0x1,
        KeyCode::Digit2 => 0x2,
        KeyCode::Digit3 => 0x3,
        KeyCode::Digit4 => 0xC,
        KeyCode::KeyQ => 0x4,
        KeyCode::KeyW => 0x5,
        KeyCode::KeyE => 0x6,
        KeyCode::KeyR => 0xD,
        KeyCode::KeyA => 0x7,
        KeyCode::KeyS => 0x8,
        KeyCode::KeyD => 0x9,
        KeyCode::KeyF => 0xE,
        KeyCode::KeyZ => 0xA,
        KeyCode::KeyX => 0x0,
        KeyCode::KeyC => 0xB,
        KeyCode::KeyV => 0xF,
        _ => return None,
    };
    Some(u4::new(key))
}

/// Window and pixel surface, created once the event loop resumes.
struct Surface {
    window: Arc<Window>,
    pixels: Pixels<'static>,
}

impl Surface {
    fn open(
        event_loop: &ActiveEventLoop,
        width: u32,
        height: u32,
        scale: u32,
    ) -> anyhow::Result<Self> {
        let attributes = Window::default_attributes()
            .with_title("chip8-vm")
            .with_inner_size(LogicalSize::new(width * scale, height * scale))
            .with_min_inner_size(LogicalSize::new(width, height));
        let window = Arc::new(
            event_loop
                .create_window(attributes)
                .context("Failed to create window")?,
        );

        let size = window.inner_size();
        let texture = SurfaceTexture::new(size.width, size.height, window.clone());
        let pixels =
            Pixels::new(width, height, texture).context("Failed to create pixels surface")?;

        window.request_redraw();
        Ok(Self { window, pixels })
    }
}

struct App {
    machine: SharedChip8,
    width: usize,
    height: usize,
    scale: u32,

    surface: Option<Surface>,
    /// Per-pixel brightness in 0.0..=1.0, row-major.
    glow: Vec<f32>,
    last_frame: Instant,

    /// Started on the first resume, stopped when the app is dropped.
    cpu: Option<CpuHandle>,
    timer: Option<TimerHandle>,

    /// First error raised inside the event loop.
    error: Option<anyhow::Error>,
}

impl App {
    fn new(machine: SharedChip8, scale: u32) -> Self {
        let (width, height) = {
            let chip8 = machine.lock();
            (chip8.display().width(), chip8.display().height())
        };

        Self {
            machine,
            width,
            height,
            scale,
            surface: None,
            glow: vec![0.0; width * height],
            last_frame: Instant::now(),
            cpu: None,
            timer: None,
            error: None,
        }
    }

    fn surface(&mut self) -> anyhow::Result<&mut Surface> {
        self.surface.as_mut().context("Window surface missing")
    }

    /// Lit pixels jump to full brightness; unlit ones fade out.
    fn update_glow(&mut self, dt: f32) {
        let chip8 = self.machine.lock();
        let display = chip8.display();

        for (idx, glow) in self.glow.iter_mut().enumerate() {
            let (x, y) = (idx % self.width, idx / self.width);
            *glow = if display.pixel(x, y) {
                1.0
            } else {
                (*glow - PHOSPHOR_DECAY * dt).max(0.0)
            };
        }
    }

    fn redraw(&mut self) -> anyhow::Result<()> {
        let now = Instant::now();
        let dt = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;

        // A CPU thread that finished on its own has faulted
        if let Some(cpu) = self.cpu.take_if(|cpu| cpu.is_finished()) {
            cpu.stop().context("Chip8 execution error")?;
        }

        self.update_glow(dt);

        let glow = std::mem::take(&mut self.glow);
        let surface = self.surface()?;
        for (pixel, &level) in surface.pixels.frame_mut().chunks_exact_mut(4).zip(&glow) {
            pixel.copy_from_slice(&[0x00, 0xFF, 0x00, (level * 255.0) as u8]);
        }
        surface.pixels.render().context("Pixels render error")?;
        surface.window.request_redraw();
        self.glow = glow;

        Ok(())
    }

    fn on_resumed(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        self.surface = Some(Surface::open(
            event_loop,
            self.width as u32,
            self.height as u32,
            self.scale,
        )?);

        if self.cpu.is_none() {
            info!("Starting CPU and timer threads");
            self.timer = Some(self.machine.spawn_timer());
            self.cpu = Some(self.machine.spawn_cpu());
        }

        self.last_frame = Instant::now();
        Ok(())
    }

    fn on_window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        event: WindowEvent,
    ) -> anyhow::Result<()> {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),

            WindowEvent::Resized(size) => {
                self.surface()?
                    .pixels
                    .resize_surface(size.width, size.height)
                    .context("Failed to resize pixels surface")?;
            }

            WindowEvent::RedrawRequested => self.redraw()?,

            WindowEvent::KeyboardInput { event, .. } => match event.physical_key {
                PhysicalKey::Code(KeyCode::Escape) => event_loop.exit(),
                PhysicalKey::Code(code) => {
                    if let Some(key) = keypad_key(code) {
                        let pressed = event.state == ElementState::Pressed;
                        self.machine.set_key(key, pressed);
                    }
                }
                PhysicalKey::Unidentified(_) => {}
            },

            _ => {}
        }
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        self.error.get_or_insert(error);
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if let Err(e) = self.on_resumed(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if let Err(e) = self.on_window_event(event_loop, event) {
            self.fail(event_loop, e);
        }
    }
}

/// CHIP-8 emulator window.
///
/// The 1234/QWER/ASDF/ZXCV block is the hex keypad. Escape quits.
#[derive(Parser, Debug)]
#[command(about)]
struct Args {
    #[command(flatten)]
    machine: MachineArgs,

    /// Window pixels per CHIP-8 pixel
    #[arg(long, default_value_t = 10)]
    scale: u32,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let machine = SharedChip8::new(args.machine.load_machine()?);

    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(machine.clone(), args.scale);
    event_loop
        .run_app(&mut app)
        .context("Error occurred during event loop execution")?;

    machine.shutdown();
    if let Some(error) = app.error.take() {
        return Err(error);
    }
    if let Some(cpu) = app.cpu.take() {
        cpu.stop().context("Chip8 execution error")?;
    }

    Ok(())
}
