use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use tracing::{debug, error, info};
use winit::application::ApplicationHandler;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::config::SceneSettings;
use crate::rendering::GpuRenderer;
use crate::scene::Scene;
use crate::world::{InputHandle, SceneKey};

/// Window host for a [`Scene`] rendered through [`GpuRenderer`].
pub struct App {
    settings: SceneSettings,
    window: Option<Arc<Window>>,
    scene: Option<Scene<GpuRenderer>>,
    input: Option<InputHandle>,
    cursor: Option<PhysicalPosition<f64>>,
    started: Instant,
    error: Option<anyhow::Error>,
}

impl App {
    pub fn new(settings: SceneSettings) -> Self {
        Self {
            settings,
            window: None,
            scene: None,
            input: None,
            cursor: None,
            started: Instant::now(),
            error: None,
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let viewport = self.settings.viewport;
        let attributes = Window::default_attributes()
            .with_title(format!("{} {}", crate::APP_NAME, crate::VERSION))
            .with_inner_size(PhysicalSize::new(viewport.width, viewport.height));
        let window = Arc::new(event_loop.create_window(attributes).context("Failed to create window")?);

        let renderer = pollster::block_on(GpuRenderer::new(
            window.clone(),
            &self.settings.rendering,
            &self.settings.shading,
        ))
        .context("Failed to initialize renderer")?;

        let mut scene = Scene::new(self.settings.clone())?;
        scene.mount(renderer)?;
        let size = window.inner_size();
        scene.resize(size.width, size.height);

        self.input = Some(scene.input_handle());
        self.scene = Some(scene);
        self.started = Instant::now();
        window.request_redraw();
        self.window = Some(window);
        info!("Scene running");
        Ok(())
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(scene) = self.scene.as_mut() {
            scene.unmount();
        }
        event_loop.exit();
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, event: &KeyEvent) {
        if event.state != ElementState::Pressed || event.repeat {
            return;
        }
        let key = match event.physical_key {
            PhysicalKey::Code(KeyCode::KeyG) => SceneKey::ToggleGravity,
            PhysicalKey::Code(KeyCode::Space) => SceneKey::ForceSpawn,
            PhysicalKey::Code(KeyCode::KeyR) => SceneKey::ResetCamera,
            PhysicalKey::Code(KeyCode::Escape) => {
                self.shutdown(event_loop);
                return;
            }
            _ => return,
        };
        if let Some(input) = &self.input {
            input.key(key);
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(scene) = self.scene.as_mut() else {
            return;
        };
        match scene.frame(self.started.elapsed().as_secs_f64()) {
            Ok(report) => debug!(?report, "frame"),
            Err(e) => error!("Frame failed: {}", e),
        }
        if scene.pending_frame().is_some() {
            if let Some(window) = &self.window {
                window.request_redraw();
            }
        } else if !scene.is_running() {
            info!("Scene disposed, closing window");
            event_loop.exit();
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.scene.is_some() {
            return;
        }
        if let Err(e) = self.start(event_loop) {
            error!("Startup failed: {:#}", e);
            self.error = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        if self.window.as_ref().map_or(true, |w| w.id() != window_id) {
            return;
        }
        match event {
            WindowEvent::CloseRequested => self.shutdown(event_loop),
            WindowEvent::Resized(size) => {
                if let Some(scene) = self.scene.as_mut() {
                    scene.resize(size.width, size.height);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Some(position);
                if let Some(input) = &self.input {
                    input.pointer_moved(position.x as f32, position.y as f32);
                }
            }
            WindowEvent::MouseInput { state: ElementState::Pressed, button: MouseButton::Left, .. } => {
                if let (Some(input), Some(cursor)) = (&self.input, self.cursor) {
                    input.click(cursor.x as f32, cursor.y as f32);
                }
            }
            WindowEvent::KeyboardInput { event, .. } => self.handle_key(event_loop, &event),
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }
}

/// Open a window and run the scene until it is closed.
pub fn run(settings: SceneSettings) -> anyhow::Result<()> {
    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    let mut app = App::new(settings);
    event_loop.run_app(&mut app)?;
    // Drop the scene (and its GPU resources) before the event loop goes away
    app.scene.take();
    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
