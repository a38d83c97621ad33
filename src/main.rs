mod cli;
mod framepace;
mod gpu;
mod host;
mod particle;
mod render;
mod simulation;
mod store;
mod surface;

use std::sync::Arc;

use clap::Parser;
use cli::Theme;
use framepace::FrameStats;
use glam::Vec2;
use gpu::GpuContext;
use host::WindowHost;
use log::{info, warn};
use render::GpuCanvas;
use simulation::{FieldConfig, ParticleField};
use winit::{
    application::ApplicationHandler,
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    // Collect Arguments
    let args = cli::Args::parse();

    // Setup Winit
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app_state = AppState {
        tokio_rt: tokio::runtime::Runtime::new()?,
        gfx: None,
        config: Some(FieldConfig {
            burst: args.burst,
            max_particles: args.max_particles,
            seed: args.seed,
        }),
        stats: FrameStats::new(args.stats_interval),

        theme: args.theme,
        is_paused: false,
    };

    event_loop.run_app(&mut app_state)?;
    Ok(())
}

struct GfxState {
    host: WindowHost,
    field: ParticleField<GpuCanvas>,
}

impl GfxState {
    fn start(&mut self) {
        self.field.start(&mut self.host);
    }

    fn stop(&mut self) {
        self.field.stop(&mut self.host);
    }
}

struct AppState {
    tokio_rt: tokio::runtime::Runtime,
    gfx: Option<GfxState>,
    /// Consumed when the field is mounted on first resume
    config: Option<FieldConfig>,
    stats: FrameStats,

    theme: Theme,
    is_paused: bool,
}

impl AppState {
    fn mount(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let attributes = Window::default_attributes().with_title("Particle Field");
        let window = Arc::new(event_loop.create_window(attributes)?);

        let canvas = match self.tokio_rt.block_on(GpuContext::new(window.clone())) {
            Ok(gpu) => Some(GpuCanvas::new(gpu, self.theme.background())),
            Err(err) => {
                warn!("GPU unavailable: {err:#}");
                None
            }
        };

        let config = self.config.take().unwrap_or_default();
        self.gfx = Some(GfxState {
            host: WindowHost::new(window),
            field: ParticleField::new(canvas, config),
        });
        Ok(())
    }

    fn toggle_pause(&mut self) {
        let Some(gfx) = &mut self.gfx else {
            return;
        };

        self.is_paused = !self.is_paused;
        if self.is_paused {
            gfx.stop();
        } else {
            self.stats.reset();
            gfx.start();
        }
    }

    fn toggle_theme(&mut self) {
        self.theme = self.theme.toggled();
        info!("Theme {:?}", self.theme);

        if let Some(surface) = self.gfx.as_mut().and_then(|gfx| gfx.field.surface_mut()) {
            surface.canvas_mut().set_background(self.theme.background());
        }
    }

    fn teardown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(gfx) = &mut self.gfx {
            gfx.stop();
        }
        event_loop.exit();
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gfx.is_none() {
            if let Err(err) = self.mount(event_loop) {
                warn!("Failed to create window: {err:#}");
                event_loop.exit();
                return;
            }
        }

        if !self.is_paused {
            self.stats.reset();
            if let Some(gfx) = &mut self.gfx {
                gfx.start();
            }
        }
    }

    fn suspended(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gfx) = &mut self.gfx {
            gfx.stop();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.gfx.is_none() {
            return;
        }

        match event {
            WindowEvent::CloseRequested => self.teardown(event_loop),

            WindowEvent::RedrawRequested => {
                let Some(gfx) = &mut self.gfx else {
                    return;
                };
                if let Some(handle) = gfx.host.take_frame() {
                    gfx.field.frame(handle, &mut gfx.host);
                    self.stats.end_frame(gfx.field.store().len());
                }
            }

            WindowEvent::Resized(_) => {
                // Dimensions are re-read from the window
                if let Some(gfx) = &mut self.gfx {
                    gfx.field.viewport_resized(&gfx.host);
                }
            }

            WindowEvent::Occluded(occluded) => {
                if let Some(gfx) = &mut self.gfx {
                    if occluded {
                        gfx.stop();
                    } else if !self.is_paused {
                        self.stats.reset();
                        gfx.start();
                    }
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                if let Some(gfx) = &mut self.gfx {
                    let position = Vec2::new(position.x as f32, position.y as f32);
                    gfx.field.pointer_moved(position);
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed || event.repeat {
                    return;
                }
                match event.physical_key {
                    PhysicalKey::Code(KeyCode::Space) => self.toggle_pause(),
                    PhysicalKey::Code(KeyCode::KeyT) => self.toggle_theme(),
                    PhysicalKey::Code(KeyCode::KeyR) => {
                        if let Some(gfx) = &mut self.gfx {
                            info!("Cleared {} particles", gfx.field.store().len());
                            gfx.field.store_mut().clear();
                        }
                    }
                    PhysicalKey::Code(KeyCode::Escape) => self.teardown(event_loop),
                    _ => (),
                }
            }

            _ => (),
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gfx) = &mut self.gfx {
            gfx.stop();
        }
    }
}
