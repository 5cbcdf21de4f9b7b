use crate::setup::{AppSession, Experiment};
use anyhow::{Context, Result};
use audmem_experiment::{FrameInput, SessionStatus};
use audmem_render::{FontVec, SkiaRenderer, TargetLayout};
use audmem_timing::{HighPrecisionTimer, Timer};
use pixels::{Pixels, SurfaceTexture};
use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    dpi::{PhysicalPosition, PhysicalSize},
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{Key, NamedKey},
    window::{Fullscreen, Window, WindowId},
};

/// Button state between frames. A press released before the next frame is
/// still reported as down for that one frame.
#[derive(Debug, Default, Clone, Copy)]
struct PointerLatch {
    down: bool,
    pressed: bool,
}

impl PointerLatch {
    fn set(&mut self, down: bool) {
        self.down = down;
        self.pressed |= down;
    }

    fn sample(&mut self) -> bool {
        std::mem::take(&mut self.pressed) || self.down
    }
}

pub struct App {
    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    renderer: Option<SkiaRenderer>,
    session: AppSession,
    timer: HighPrecisionTimer,
    layout: TargetLayout,
    font: Option<FontVec>,
    full_screen: bool,
    resolution: (u32, u32),
    current_size: Option<PhysicalSize<u32>>,

    keys: Vec<String>,
    cursor: Option<PhysicalPosition<f64>>,
    pointer: PointerLatch,
    error: Option<anyhow::Error>,
}

impl App {
    pub fn new(experiment: Experiment, font: Option<FontVec>, windowed: bool) -> Self {
        if font.is_none() {
            log::warn!("No font available, feedback is shown as coloured blocks");
        }
        Self {
            window: None,
            pixels: None,
            renderer: None,
            full_screen: experiment.profile.full_screen && !windowed,
            resolution: experiment.profile.screen_resolution,
            session: experiment.session,
            timer: experiment.timer,
            layout: experiment.layout,
            font,
            current_size: None,
            keys: Vec::new(),
            cursor: None,
            pointer: PointerLatch::default(),
            error: None,
        }
    }

    pub fn run(mut self) -> Result<()> {
        let event_loop = EventLoop::new()?;
        log::info!(
            "Platform {} ({}), {} trials scheduled",
            std::env::consts::OS,
            std::env::consts::ARCH,
            self.session.scheduled_trials()
        );

        event_loop.run_app(&mut self)?;

        // window closed without the session ending on its own
        if self.session.status() == SessionStatus::Running {
            self.session.abort().context("Failed to save the interrupted run")?;
        }
        if let Some(e) = self.error.take() {
            return Err(e);
        }

        let results = self.session.results();
        let correct = results
            .iter()
            .filter(|r| r.feedback == audmem_core::Feedback::Correct)
            .count();
        log::info!(
            "Run {:?}: {} of {} trials correct, output in {}",
            self.session.status(),
            correct,
            results.len(),
            self.session.output().dir().display()
        );
        Ok(())
    }

    fn create_window_and_surface(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let monitor = event_loop
            .primary_monitor()
            .or_else(|| event_loop.available_monitors().next())
            .ok_or_else(|| anyhow::anyhow!("No monitor available"))?;

        if let Some(mhz) = monitor.refresh_rate_millihertz() {
            log::info!("Monitor reports {:.1} Hz", mhz as f64 / 1000.0);
        }

        let mut attributes = Window::default_attributes()
            .with_title("Auditory memory")
            .with_resizable(false);
        attributes = if self.full_screen {
            attributes.with_fullscreen(Some(Fullscreen::Borderless(Some(monitor))))
        } else {
            attributes.with_inner_size(PhysicalSize::new(self.resolution.0, self.resolution.1))
        };

        let window = Arc::new(event_loop.create_window(attributes)?);
        let size = window.inner_size();
        self.current_size = Some(size);
        log::info!(
            "Display {}x{} at scale {:.2}",
            size.width,
            size.height,
            window.scale_factor()
        );

        let surface = SurfaceTexture::new(size.width, size.height, window.clone());
        self.pixels = Some(Pixels::new(size.width, size.height, surface)?);
        self.renderer = Some(SkiaRenderer::new(
            size.width,
            size.height,
            self.layout,
            self.font.take(),
        )?);

        window.request_redraw();
        self.window = Some(window);
        Ok(())
    }

    fn frame_input(&mut self) -> FrameInput {
        let pointer = match (self.cursor, self.current_size) {
            (Some(pos), Some(size)) if size.width > 0 && size.height > 0 => Some((
                pos.x / size.width as f64 * 2.0 - 1.0,
                1.0 - pos.y / size.height as f64 * 2.0,
            )),
            _ => None,
        };
        FrameInput {
            keys: std::mem::take(&mut self.keys),
            pointer,
            pointer_down: self.pointer.sample(),
        }
    }

    /// One refresh: advance the session, draw, present, report the flip.
    fn frame(&mut self) -> Result<SessionStatus> {
        let input = self.frame_input();
        let status = self.session.update(&input)?;
        if status != SessionStatus::Running {
            return Ok(status);
        }

        let (Some(pixels), Some(renderer)) = (self.pixels.as_mut(), self.renderer.as_mut()) else {
            return Ok(status);
        };
        let screen = self.session.screen();
        let stats = renderer.render_frame(&screen, pixels.frame_mut())?;
        pixels.render()?;
        self.session.on_flip(self.timer.now());

        if stats.redrawn {
            log::debug!(
                "draw {:.3}ms, copy {:.3}ms",
                stats.draw.as_secs_f64() * 1e3,
                stats.copy.as_secs_f64() * 1e3
            );
        }
        Ok(self.session.status())
    }

    fn handle_key(&mut self, event: &KeyEvent) {
        if event.state != ElementState::Pressed || event.repeat {
            return;
        }
        let name = match &event.logical_key {
            Key::Named(NamedKey::Escape) => "escape".to_string(),
            Key::Named(NamedKey::Space) => "space".to_string(),
            Key::Character(c) => c.to_lowercase(),
            _ => return,
        };
        self.keys.push(name);
    }

    fn handle_resize(&mut self, size: PhysicalSize<u32>) -> Result<()> {
        if size.width == 0 || size.height == 0 {
            return Ok(());
        }
        self.current_size = Some(size);
        if let Some(pixels) = &mut self.pixels {
            pixels.resize_surface(size.width, size.height)?;
            pixels.resize_buffer(size.width, size.height)?;
        }
        if let Some(renderer) = &mut self.renderer {
            renderer.resize(size.width, size.height)?;
        }
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, e: anyhow::Error) {
        log::error!("{e:#}");
        if self.session.status() == SessionStatus::Running {
            if let Err(save) = self.session.abort() {
                log::error!("Saving the interrupted run failed: {save}");
            }
        }
        self.error = Some(e);
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.create_window_and_surface(event_loop) {
                self.fail(event_loop, e.context("Failed to create window and surface"));
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                if let Err(e) = self.session.abort() {
                    log::error!("Saving the interrupted run failed: {e}");
                }
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => match self.frame() {
                Ok(SessionStatus::Running) => {
                    if let Some(window) = &self.window {
                        window.request_redraw();
                    }
                }
                Ok(status) => {
                    log::info!("Session ended: {status:?}");
                    event_loop.exit();
                }
                Err(e) => self.fail(event_loop, e),
            },
            WindowEvent::KeyboardInput { event, .. } => self.handle_key(&event),
            WindowEvent::CursorMoved { position, .. } => self.cursor = Some(position),
            WindowEvent::CursorLeft { .. } => self.cursor = None,
            WindowEvent::MouseInput { state, .. } => self.pointer.set(state.is_pressed()),
            WindowEvent::Resized(size) => {
                if let Err(e) = self.handle_resize(size) {
                    self.fail(event_loop, e);
                }
            }
            _ => {}
        }
    }
}
