pub mod frame_loop;
pub mod interaction;

use glam::Vec2;
use tracing::{debug, error, info, warn};

use crate::assets::AssetCatalog;
use crate::config::{SceneSettings, SimulationConfig, Viewport};
use crate::error::SceneError;
use crate::rendering::{
    Camera, CameraPath, CameraPathController, ProgramId, RenderFrame, RenderSurface, ShaderTimeDriver,
    SyncBridge, VisualProxyRegistry,
};
use crate::world::{InputHandle, InputQueue, ParticleBodyFactory, SimulationWorld, SpawnRequest};

pub use frame_loop::{FrameLoop, FrameRequest, FrameState, FrameTiming};
pub use interaction::{InputEffects, Interaction};

/// Per-frame statistics returned by [`Scene::frame`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameReport {
    pub frame_index: u64,
    pub steps: u32,
    pub spawned: usize,
    /// Spawn requests refused by the body cap or the per-frame limit.
    pub spawns_dropped: usize,
    pub bodies: usize,
    pub awake: usize,
    pub hovered: Option<usize>,
    pub rendered: bool,
}

/// Everything acquired by `mount`, in acquisition order.
struct Session<R: RenderSurface> {
    surface: R,
    world: SimulationWorld,
    proxies: VisualProxyRegistry,
    factory: ParticleBodyFactory,
    sync: SyncBridge,
    camera: CameraPathController,
    shader_time: ShaderTimeDriver,
    surface_program: ProgramId,
    backdrop_program: ProgramId,
    interaction: Interaction,
    viewport: Viewport,
}

/// A physics-driven particle scene bound to a render surface.
///
/// Built from validated [`SceneSettings`], then [`mount`](Scene::mount)ed onto a
/// surface. The host calls [`frame`](Scene::frame) once per display refresh until
/// the scene is unmounted or disposes itself after an invariant violation.
pub struct Scene<R: RenderSurface> {
    settings: SceneSettings,
    input: InputQueue,
    frame_loop: Option<FrameLoop>,
    session: Option<Session<R>>,
}

impl<R: RenderSurface> Scene<R> {
    pub fn new(settings: SceneSettings) -> Result<Self, SceneError> {
        if let Err(e) = settings.validate() {
            error!("Rejected scene configuration: {}", e);
            return Err(e.into());
        }
        Ok(Self { settings, input: InputQueue::new(), frame_loop: None, session: None })
    }

    pub fn settings(&self) -> &SceneSettings {
        &self.settings
    }

    /// Producer side of the input queue, for window event handlers. Handles stop
    /// accepting events once the scene is unmounted; take a new one after mounting again.
    pub fn input_handle(&self) -> InputHandle {
        self.input.handle()
    }

    /// Build the world, ground and initial particles on `surface` and start the frame loop.
    /// A previously disposed scene can be mounted again from scratch.
    pub fn mount(&mut self, mut surface: R) -> Result<(), SceneError> {
        if self.is_running() {
            return Err(SceneError::AlreadyMounted);
        }
        let sim = &self.settings.simulation;
        info!(
            "Mounting scene: {} {:?} particles, viewport {}x{}",
            sim.particle_count, sim.particle_class, self.settings.viewport.width, self.settings.viewport.height
        );

        let (world, proxies, factory) = match populate(&self.settings) {
            Ok(parts) => parts,
            Err(e) => {
                error!("Scene setup failed: {}", e);
                surface.release();
                return Err(e);
            }
        };
        let path = match CameraPath::from_settings(&self.settings.camera) {
            Ok(path) => path,
            Err(e) => {
                surface.release();
                return Err(e.into());
            }
        };

        let mut shader_time = ShaderTimeDriver::new();
        let surface_program = shader_time.register_program("particle_surface", self.settings.shading.surface_time_rate);
        let backdrop_program = shader_time.register_program("backdrop", self.settings.shading.backdrop_time_rate);

        // Stale input from a previous session does not carry over
        let stale = self.input.drain().len();
        if stale > 0 {
            debug!("Discarded {} stale input events", stale);
        }

        self.session = Some(Session {
            surface,
            world,
            proxies,
            factory,
            sync: SyncBridge::new(),
            camera: CameraPathController::new(path, self.settings.viewport.aspect()),
            shader_time,
            surface_program,
            backdrop_program,
            interaction: Interaction::new(),
            viewport: self.settings.viewport,
        });
        self.frame_loop = Some(FrameLoop::start(sim.step_mode, sim.fixed_timestep));
        Ok(())
    }

    /// Advance one display refresh: input, physics, sync, camera, shading, render.
    ///
    /// Invariant violations dispose the scene and are returned. Render failures are
    /// logged and reported through [`FrameReport::rendered`].
    pub fn frame(&mut self, elapsed: f64) -> Result<FrameReport, SceneError> {
        let frame_loop = self.frame_loop.as_mut().ok_or(SceneError::NotMounted)?;
        let timing = frame_loop.begin_frame(elapsed).ok_or(SceneError::Disposed)?;
        let session = self.session.as_mut().ok_or(SceneError::Disposed)?;

        let events = self.input.drain();
        match session.run_frame(&timing, events, &self.settings.simulation) {
            Ok(report) => {
                frame_loop.request_next_frame();
                Ok(report)
            }
            Err(e) if e.is_fatal() => {
                error!("Fatal invariant violation in frame {}: {}", timing.frame_index, e);
                self.dispose();
                Err(e)
            }
            Err(e) => {
                frame_loop.request_next_frame();
                Err(e)
            }
        }
    }

    /// Stop the frame loop and release everything. Safe to call any number of times.
    pub fn unmount(&mut self) {
        if self.dispose() {
            info!("Scene unmounted");
        }
    }

    /// Teardown in reverse order of acquisition. Returns false when nothing was left to release.
    fn dispose(&mut self) -> bool {
        let stopped = self.frame_loop.as_mut().map(|l| l.dispose()).unwrap_or(false);
        let released = match self.session.take() {
            Some(mut session) => {
                let proxies = session.proxies.release();
                let bodies = session.world.len();
                session.world.clear();
                session.surface.release();
                info!("Released {} proxies and {} bodies", proxies, bodies);
                true
            }
            None => false,
        };
        if stopped || released {
            // Dropping the receiver disconnects every handle issued so far
            self.input = InputQueue::new();
        }
        stopped || released
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.settings.viewport = Viewport { width, height };
        if let Some(session) = self.session.as_mut() {
            session.viewport = self.settings.viewport;
            session.camera.set_aspect(self.settings.viewport.aspect());
            session.surface.resize(width, height);
        }
    }

    pub fn is_running(&self) -> bool {
        self.frame_loop.as_ref().is_some_and(FrameLoop::is_running)
    }

    pub fn frame_state(&self) -> Option<FrameState> {
        self.frame_loop.as_ref().map(FrameLoop::state)
    }

    pub fn pending_frame(&self) -> Option<FrameRequest> {
        self.frame_loop.as_ref().and_then(FrameLoop::pending_request)
    }

    pub fn world(&self) -> Option<&SimulationWorld> {
        self.session.as_ref().map(|s| &s.world)
    }

    pub fn proxies(&self) -> Option<&VisualProxyRegistry> {
        self.session.as_ref().map(|s| &s.proxies)
    }

    pub fn camera(&self) -> Option<&Camera> {
        self.session.as_ref().map(|s| s.camera.camera())
    }

    pub fn hovered(&self) -> Option<usize> {
        self.session.as_ref().and_then(|s| s.interaction.hovered())
    }

    pub fn surface(&self) -> Option<&R> {
        self.session.as_ref().map(|s| &s.surface)
    }
}

impl<R: RenderSurface> Drop for Scene<R> {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn populate(
    settings: &SceneSettings,
) -> Result<(SimulationWorld, VisualProxyRegistry, ParticleBodyFactory), SceneError> {
    let sim = &settings.simulation;
    let mut world = SimulationWorld::new(sim);
    let mut proxies = VisualProxyRegistry::with_capacity(sim.particle_count + 1);
    let catalog = AssetCatalog::new(settings.rendering.palette.clone(), settings.rendering.ground_color);
    let mut factory = ParticleBodyFactory::new(sim, catalog);

    if sim.ground.enabled {
        factory.add_ground(&mut world, &mut proxies, &sim.ground)?;
    }
    factory.spawn(&mut world, &mut proxies, sim.particle_count, &sim.spawn_bounds)?;
    Ok((world, proxies, factory))
}

impl<R: RenderSurface> Session<R> {
    fn run_frame(
        &mut self,
        timing: &FrameTiming,
        events: Vec<crate::world::InputEvent>,
        sim: &SimulationConfig,
    ) -> Result<FrameReport, SceneError> {
        let viewport = Vec2::new(self.viewport.width as f32, self.viewport.height as f32);

        // 1. Input
        let effects = self.interaction.interpret(
            events,
            self.camera.camera(),
            viewport,
            sim.ground.height,
            sim.spawn_bounds.min[1],
            sim.burst_count,
        );
        if effects.toggle_gravity {
            let enabled = !self.world.gravity_enabled();
            self.world.set_gravity_enabled(enabled);
            info!("Gravity {}", if enabled { "enabled" } else { "disabled" });
        }
        if effects.reset_camera {
            self.camera.reset();
        }
        let (spawned, spawns_dropped) = self.apply_spawns(&effects.spawns, sim)?;

        // 2. Physics
        for _ in 0..timing.steps {
            self.world.step(sim.fixed_timestep);
        }

        // 3. Sync
        self.sync.sync(&self.world, &mut self.proxies)?;

        // 4. Camera, 5. shading clock
        self.camera.update(timing.local_time);
        self.shader_time.tick(timing.local_time);
        let hovered = self.interaction.update_hover(self.camera.camera(), viewport, &self.world, &self.proxies);

        // 6. Render
        let frame = RenderFrame {
            frame_index: timing.frame_index,
            proxies: self.proxies.as_slice(),
            camera: self.camera.camera(),
            surface_time: self.shader_time.uniform(self.surface_program).unwrap_or_default(),
            backdrop_time: self.shader_time.uniform(self.backdrop_program).unwrap_or_default(),
            hovered,
        };
        let rendered = match self.surface.render(&frame) {
            Ok(()) => true,
            Err(e) => {
                warn!("Frame {} not rendered: {}", timing.frame_index, e);
                false
            }
        };

        Ok(FrameReport {
            frame_index: timing.frame_index,
            steps: timing.steps,
            spawned,
            spawns_dropped,
            bodies: self.world.len(),
            awake: self.world.awake_count(),
            hovered,
            rendered,
        })
    }

    /// Spawn what the body cap and per-frame limit allow; the rest is dropped.
    fn apply_spawns(&mut self, requests: &[SpawnRequest], sim: &SimulationConfig) -> Result<(usize, usize), SceneError> {
        let room = sim.max_bodies.saturating_sub(self.world.len());
        let allowed = requests.len().min(room).min(sim.max_spawns_per_frame);
        for request in &requests[..allowed] {
            match *request {
                SpawnRequest::Random => {
                    self.factory.spawn(&mut self.world, &mut self.proxies, 1, &sim.spawn_bounds)?;
                }
                SpawnRequest::At(position) => {
                    self.factory.spawn_at(&mut self.world, &mut self.proxies, position)?;
                }
            }
        }
        let dropped = requests.len() - allowed;
        if dropped > 0 {
            warn!(
                "Dropped {} spawn requests ({} bodies, cap {}, {} per frame)",
                dropped,
                self.world.len(),
                sim.max_bodies,
                sim.max_spawns_per_frame
            );
        }
        Ok((allowed, dropped))
    }
}
