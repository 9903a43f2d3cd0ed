use anyhow::{Context, Result};
use mapsize_experiment::{CsvExporter, ExperimentEvent, Key, TrialController};
use mapsize_render::{Assets, ScreenText, SkiaRenderer};
use mapsize_timing::{HighPrecisionTimer, Timer};
use pixels::{Pixels, SurfaceTexture};
use rand::rngs::ThreadRng;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{Key as LogicalKey, KeyCode, PhysicalKey},
    window::{Fullscreen, Window, WindowId},
};

use crate::cli::Settings;

type Controller = TrialController<HighPrecisionTimer, ThreadRng, CsvExporter>;

/// Window, surface and controller for one run. Key presses reach the controller only
/// through a live session; dropping it releases the window and stops input handling.
struct Session {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    renderer: SkiaRenderer,
    controller: Controller,
    last_frame_ns: Option<u64>,
}

impl Drop for Session {
    fn drop(&mut self) {
        self.window.set_cursor_visible(true);
        debug!("session released");
    }
}

pub struct App {
    settings: Settings,
    assets: Option<Assets>,
    session: Option<Session>,
    failure: Option<anyhow::Error>,
}

impl App {
    pub fn new(settings: Settings) -> Result<Self> {
        let assets = Assets::load(&settings.map, &settings.font)?;
        info!(
            map = %settings.map.display(),
            width = assets.map.width(),
            height = assets.map.height(),
            "assets loaded"
        );
        Ok(Self {
            settings,
            assets: Some(assets),
            session: None,
            failure: None,
        })
    }

    pub fn run(mut self) -> Result<()> {
        let event_loop = EventLoop::new()?;
        info!(
            platform = std::env::consts::OS,
            arch = std::env::consts::ARCH,
            trials = self.settings.experiment.max_trials,
            "map size experiment starting; ESC aborts"
        );

        event_loop.run_app(&mut self)?;

        match self.failure.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn create_session(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let assets = self
            .assets
            .take()
            .context("assets were already consumed by an earlier session")?;

        let mut window_attributes = Window::default_attributes()
            .with_title("Map Size Judgment")
            .with_resizable(!self.settings.fullscreen);
        if self.settings.fullscreen {
            let monitor = event_loop
                .primary_monitor()
                .or_else(|| event_loop.available_monitors().next())
                .context("no monitor available")?;
            if let Some(mhz) = monitor.refresh_rate_millihertz() {
                info!(refresh_hz = mhz as f64 / 1000.0, "display refresh rate");
            }
            window_attributes =
                window_attributes.with_fullscreen(Some(Fullscreen::Borderless(Some(monitor))));
        }

        let window = Arc::new(event_loop.create_window(window_attributes)?);
        let size = window.inner_size();
        info!(
            width = size.width,
            height = size.height,
            scale = window.scale_factor(),
            "display configured"
        );

        let surface_texture = SurfaceTexture::new(size.width, size.height, window.clone());
        let pixels = Pixels::new(size.width, size.height, surface_texture)?;

        let config = self.settings.experiment.clone();
        let copy = ScreenText::for_keys(config.bigger_key, config.smaller_key);
        let renderer = SkiaRenderer::new(size.width, size.height, assets, copy)?;
        let exporter = CsvExporter::new(&self.settings.output_dir, config.export_file_name());
        let controller =
            TrialController::new(config, HighPrecisionTimer::new(), rand::rng(), exporter);

        window.set_cursor_visible(false);
        window.request_redraw();

        self.session = Some(Session {
            window,
            pixels,
            renderer,
            controller,
            last_frame_ns: None,
        });
        Ok(())
    }

    fn redraw(&mut self) -> Result<()> {
        let Some(session) = &mut self.session else {
            return Ok(());
        };

        for event in session.controller.update() {
            log_event(&event);
        }

        let screen = session.controller.screen();
        let timings = session.renderer.render_frame(
            screen,
            session.pixels.frame_mut(),
            session.controller.timer(),
        )?;
        session.pixels.render()?;

        let now = session.controller.timer().now();
        if let Some(prev) = session.last_frame_ns.replace(now) {
            session
                .controller
                .timer_mut()
                .record_frame(Duration::from_nanos(now.saturating_sub(prev)));
        }
        if timings.redrawn {
            debug!(
                ?screen,
                draw_ms = timings.draw.as_secs_f64() * 1e3,
                copy_ms = timings.copy.as_secs_f64() * 1e3,
                total_ms = timings.total.as_secs_f64() * 1e3,
                "frame redrawn"
            );
        }

        session.window.request_redraw();
        Ok(())
    }

    fn handle_input(&mut self, event: &KeyEvent, event_loop: &ActiveEventLoop) {
        if let PhysicalKey::Code(KeyCode::Escape) = event.physical_key {
            self.close(event_loop);
            return;
        }
        let key = match &event.logical_key {
            LogicalKey::Character(text) => Key::from_text(text),
            _ => Key::Other,
        };

        let Some(session) = &mut self.session else {
            return;
        };
        match session.controller.handle_key(key) {
            Ok(events) => {
                for event in &events {
                    log_event(event);
                }
                if events.contains(&ExperimentEvent::Finished) {
                    if let Some(path) = session.controller.exporter().written() {
                        info!(path = %path.display(), "results saved");
                    }
                }
            }
            Err(err) => {
                error!(%err, "could not save results");
                self.failure = Some(err.into());
                self.close(event_loop);
            }
        }
    }

    fn handle_resize(&mut self, new_size: PhysicalSize<u32>) {
        let Some(session) = &mut self.session else {
            return;
        };
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        if let Err(e) = session
            .pixels
            .resize_surface(new_size.width, new_size.height)
        {
            warn!(%e, "failed to resize surface");
        }
        if let Err(e) = session.pixels.resize_buffer(new_size.width, new_size.height) {
            warn!(%e, "failed to resize buffer");
        }
        if let Err(e) = session.renderer.resize(new_size.width, new_size.height) {
            warn!(%e, "failed to resize canvas");
        }
        info!(width = new_size.width, height = new_size.height, "display resized");
    }

    fn close(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(session) = self.session.take() {
            let controller = &session.controller;
            let stats = controller.timer().frame_stats();
            info!(
                frames = stats.samples,
                mean_ms = stats.average_frame_time_ns / 1e6,
                jitter_ms = stats.jitter_ns / 1e6,
                max_ms = stats.max_frame_time_ns / 1e6,
                fps = stats.effective_fps,
                "frame timing"
            );
            if !controller.is_finished() {
                warn!(
                    completed = controller.completed_trials(),
                    of = controller.config().max_trials,
                    "session aborted; no results written"
                );
            }
        }
        event_loop.exit();
    }
}

fn log_event(event: &ExperimentEvent) {
    match event {
        ExperimentEvent::PhaseChanged(phase) => debug!(?phase, "phase changed"),
        ExperimentEvent::DisplayChanged(screen) => debug!(display = ?screen, "display changed"),
        ExperimentEvent::ResponseRecorded { trial_index, .. } => {
            debug!(trial = trial_index, "trial complete")
        }
        ExperimentEvent::Finished => info!("experiment complete, thank you"),
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.session.is_none() && self.failure.is_none() {
            if let Err(e) = self.create_session(event_loop) {
                error!(%e, "failed to create window and surface");
                self.failure = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.close(event_loop),
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.redraw() {
                    error!(%e, "render failed");
                    self.failure = Some(e);
                    self.close(event_loop);
                }
            }
            WindowEvent::KeyboardInput { event, .. } if event.state.is_pressed() && !event.repeat => {
                self.handle_input(&event, event_loop);
            }
            WindowEvent::Resized(sz) => self.handle_resize(sz),
            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(session) = &self.session {
                    let size = session.window.inner_size();
                    self.handle_resize(size);
                }
            }
            _ => {}
        }
    }
}
