//! The per-frame loop and the events that feed it

use glam::Vec2;
use log::{info, trace, warn};
use rand::{rngs::StdRng, SeedableRng};

use crate::{
    store::ParticleStore,
    surface::{Canvas, Surface, Viewport},
};

/// Identifies one scheduled frame so a stale delivery can be told apart
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Listener {
    PointerMove,
    Resize,
}

/// What the field needs from whoever hosts it
pub trait Host: Viewport {
    fn request_frame(&mut self) -> FrameHandle;
    fn cancel_frame(&mut self, handle: FrameHandle);
    fn add_listener(&mut self, listener: Listener);
    fn remove_listener(&mut self, listener: Listener);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running { pending: Option<FrameHandle> },
}

pub struct FieldConfig {
    /// Particles spawned per pointer event
    pub burst: usize,
    pub max_particles: Option<usize>,
    pub seed: Option<u64>,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            burst: 3,
            max_particles: None,
            seed: None,
        }
    }
}

pub struct ParticleField<C> {
    /// `None` when no drawing context could be created, the field is then inert
    surface: Option<Surface<C>>,
    store: ParticleStore,
    state: LoopState,
    pointer_listening: bool,
    resize_listening: bool,
    burst: usize,
    rng: StdRng,
}

impl<C: Canvas> ParticleField<C> {
    pub fn new(canvas: Option<C>, config: FieldConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            surface: canvas.map(Surface::new),
            store: ParticleStore::new(config.max_particles),
            state: LoopState::Idle,
            pointer_listening: false,
            resize_listening: false,
            burst: config.burst,
            rng,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, LoopState::Running { .. })
    }

    pub fn store(&self) -> &ParticleStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ParticleStore {
        &mut self.store
    }

    pub fn surface(&self) -> Option<&Surface<C>> {
        self.surface.as_ref()
    }

    pub fn surface_mut(&mut self) -> Option<&mut Surface<C>> {
        self.surface.as_mut()
    }

    pub fn start<H: Host + ?Sized>(&mut self, host: &mut H) {
        if self.is_running() {
            return;
        }
        let Some(surface) = self.surface.as_mut() else {
            warn!("No drawing context available, particle field disabled");
            return;
        };

        surface.resize(&*host);
        host.add_listener(Listener::Resize);
        self.resize_listening = true;
        host.add_listener(Listener::PointerMove);
        self.pointer_listening = true;

        self.state = LoopState::Running {
            pending: Some(host.request_frame()),
        };
        info!(
            "Particle field started at {}x{}",
            surface.width(),
            surface.height()
        );
    }

    pub fn stop<H: Host + ?Sized>(&mut self, host: &mut H) {
        let LoopState::Running { pending } = self.state else {
            return;
        };

        if let Some(handle) = pending {
            host.cancel_frame(handle);
        }
        if self.resize_listening {
            host.remove_listener(Listener::Resize);
            self.resize_listening = false;
        }
        if self.pointer_listening {
            host.remove_listener(Listener::PointerMove);
            self.pointer_listening = false;
        }

        self.state = LoopState::Idle;
        info!("Particle field stopped with {} live particles", self.store.len());
    }

    /// Runs one animation frame. Deliveries for any handle other than the
    /// pending one are dropped.
    pub fn frame<H: Host + ?Sized>(&mut self, handle: FrameHandle, host: &mut H) {
        let LoopState::Running { pending } = self.state else {
            trace!("Dropped frame {:?} while idle", handle);
            return;
        };
        if pending != Some(handle) {
            trace!("Dropped stale frame {:?}", handle);
            return;
        }
        let Some(surface) = self.surface.as_mut() else {
            return;
        };

        surface.clear();
        self.store.tick();
        self.store.for_each_visible(|particle| {
            surface.fill_circle(particle.position, particle.radius, particle.rgba());
        });
        let retired = self.store.compact();
        surface.present();

        if retired > 0 {
            trace!("Retired {} particles, {} live", retired, self.store.len());
        }

        self.state = LoopState::Running {
            pending: Some(host.request_frame()),
        };
    }

    pub fn pointer_moved(&mut self, position: Vec2) {
        if !self.pointer_listening {
            return;
        }

        for _ in 0..self.burst {
            if !self.store.spawn(position, &mut self.rng) {
                trace!("Particle ceiling reached, spawn dropped");
                break;
            }
        }
    }

    pub fn viewport_resized<V: Viewport + ?Sized>(&mut self, viewport: &V) {
        if !self.resize_listening {
            return;
        }
        if let Some(surface) = self.surface.as_mut() {
            surface.resize(viewport);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::{
        particle::Particle,
        surface::tests::{DrawCall, RecordingCanvas},
    };

    #[derive(Default)]
    struct ScriptedHost {
        size: (u32, u32),
        next_frame: u64,
        pending: Option<FrameHandle>,
        requests: usize,
        listeners: HashSet<Listener>,
    }

    impl ScriptedHost {
        fn new(width: u32, height: u32) -> Self {
            Self {
                size: (width, height),
                ..Default::default()
            }
        }

        /// Delivers the pending frame, if any, like the display refresh would
        fn refresh(&mut self, field: &mut ParticleField<RecordingCanvas>) {
            if let Some(handle) = self.pending.take() {
                field.frame(handle, self);
            }
        }
    }

    impl Viewport for ScriptedHost {
        fn inner_size(&self) -> (u32, u32) {
            self.size
        }
    }

    impl Host for ScriptedHost {
        fn request_frame(&mut self) -> FrameHandle {
            self.next_frame += 1;
            self.requests += 1;
            let handle = FrameHandle(self.next_frame);
            self.pending = Some(handle);
            handle
        }

        fn cancel_frame(&mut self, handle: FrameHandle) {
            if self.pending == Some(handle) {
                self.pending = None;
            }
        }

        fn add_listener(&mut self, listener: Listener) {
            self.listeners.insert(listener);
        }

        fn remove_listener(&mut self, listener: Listener) {
            self.listeners.remove(&listener);
        }
    }

    fn field() -> ParticleField<RecordingCanvas> {
        ParticleField::new(
            Some(RecordingCanvas::default()),
            FieldConfig {
                seed: Some(1234),
                ..Default::default()
            },
        )
    }

    fn canvas(field: &ParticleField<RecordingCanvas>) -> &RecordingCanvas {
        field.surface().unwrap().canvas()
    }

    #[test]
    fn start_registers_and_schedules() {
        let mut host = ScriptedHost::new(800, 600);
        let mut field = field();
        field.start(&mut host);

        assert!(field.is_running());
        assert_eq!(host.requests, 1);
        assert!(host.listeners.contains(&Listener::PointerMove));
        assert!(host.listeners.contains(&Listener::Resize));
        let surface = field.surface().unwrap();
        assert_eq!((surface.width(), surface.height()), (800, 600));

        field.start(&mut host);
        assert_eq!(host.requests, 1);
    }

    #[test]
    fn inert_without_canvas() {
        let mut host = ScriptedHost::new(800, 600);
        let mut field: ParticleField<RecordingCanvas> =
            ParticleField::new(None, FieldConfig::default());
        field.start(&mut host);

        assert_eq!(field.state(), LoopState::Idle);
        assert_eq!(host.requests, 0);
        assert!(host.listeners.is_empty());

        field.pointer_moved(Vec2::new(1.0, 1.0));
        assert!(field.store().is_empty());
        field.stop(&mut host);
    }

    #[test]
    fn pointer_event_spawns_burst() {
        let mut host = ScriptedHost::new(800, 600);
        let mut field = field();

        field.pointer_moved(Vec2::new(5.0, 5.0));
        assert!(field.store().is_empty());

        field.start(&mut host);
        field.pointer_moved(Vec2::new(100.0, 200.0));
        assert_eq!(field.store().len(), 3);
        assert!(field
            .store()
            .iter()
            .all(|p| p.position == Vec2::new(100.0, 200.0)));

        // Every particle samples its own velocity, depth and radius
        let burst: Vec<Particle> = field.store().iter().copied().collect();
        for (i, a) in burst.iter().enumerate() {
            for b in &burst[i + 1..] {
                assert_ne!(a.velocity, b.velocity);
                assert_ne!(a.z, b.z);
                assert_ne!(a.radius, b.radius);
            }
        }
    }

    #[test]
    fn resize_ignored_while_stopped() {
        let mut host = ScriptedHost::new(800, 600);
        let mut field = field();
        field.start(&mut host);
        field.stop(&mut host);

        host.size = (1200, 800);
        field.viewport_resized(&host);
        let surface = field.surface().unwrap();
        assert_eq!((surface.width(), surface.height()), (800, 600));

        field.start(&mut host);
        let surface = field.surface().unwrap();
        assert_eq!((surface.width(), surface.height()), (1200, 800));
    }

    #[test]
    fn frame_clears_draws_then_presents() {
        let mut host = ScriptedHost::new(800, 600);
        let mut field = field();
        field.start(&mut host);
        field.pointer_moved(Vec2::new(100.0, 200.0));
        field.surface_mut().unwrap().canvas_mut().calls.clear();

        host.refresh(&mut field);
        let calls = &canvas(&field).calls;
        assert_eq!(calls.len(), 5);
        assert_eq!(calls[0], DrawCall::Clear);
        assert!(calls[1..4]
            .iter()
            .all(|call| matches!(call, DrawCall::Circle(..))));
        assert_eq!(calls[4], DrawCall::Present);

        // Drawn at the decayed state of this frame
        for (call, particle) in calls[1..4].iter().zip(field.store().iter()) {
            let DrawCall::Circle(center, radius, color) = call else {
                unreachable!()
            };
            assert_eq!(*center, particle.position);
            assert_eq!(*radius, particle.radius);
            assert!((color.alpha - 0.985).abs() < 1e-6);
        }
        assert_eq!(host.requests, 2);
    }

    #[test]
    fn store_drains_after_eighty_frames() {
        let mut host = ScriptedHost::new(800, 600);
        let mut field = field();
        field.start(&mut host);
        field.pointer_moved(Vec2::new(100.0, 200.0));

        for _ in 0..80 {
            host.refresh(&mut field);
        }
        assert!(field.store().is_empty());
        assert!(field.is_running());
    }

    #[test]
    fn stop_halts_everything() {
        let mut host = ScriptedHost::new(800, 600);
        let mut field = field();
        field.start(&mut host);
        field.pointer_moved(Vec2::new(100.0, 200.0));
        let stale = host.pending.unwrap();

        field.stop(&mut host);
        assert_eq!(field.state(), LoopState::Idle);
        assert!(host.pending.is_none());
        assert!(host.listeners.is_empty());

        let before: Vec<_> = field.store().iter().copied().collect();
        let draws = canvas(&field).calls.len();
        for _ in 0..10 {
            host.refresh(&mut field);
            field.frame(stale, &mut host);
        }
        field.pointer_moved(Vec2::new(1.0, 1.0));

        let after: Vec<_> = field.store().iter().copied().collect();
        assert_eq!(before, after);
        assert_eq!(canvas(&field).calls.len(), draws);

        field.stop(&mut host);
        assert_eq!(field.state(), LoopState::Idle);
    }

    #[test]
    fn restart_after_stop_resumes_store() {
        let mut host = ScriptedHost::new(800, 600);
        let mut field = field();
        field.start(&mut host);
        field.pointer_moved(Vec2::new(10.0, 10.0));
        field.stop(&mut host);

        field.start(&mut host);
        assert_eq!(field.store().len(), 3);
        host.refresh(&mut field);
        assert_eq!(canvas(&field).circles(), 3);
    }

    #[test]
    fn resize_keeps_particles() {
        let mut host = ScriptedHost::new(800, 600);
        let mut field = field();
        field.start(&mut host);
        field.pointer_moved(Vec2::new(700.0, 500.0));
        host.refresh(&mut field);
        let before: Vec<Vec2> = field.store().iter().map(|p| p.position).collect();

        host.size = (1200, 800);
        field.viewport_resized(&host);

        let surface = field.surface().unwrap();
        assert_eq!((surface.width(), surface.height()), (1200, 800));
        let after: Vec<Vec2> = field.store().iter().map(|p| p.position).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn ceiling_caps_burst() {
        let mut host = ScriptedHost::new(800, 600);
        let mut field = ParticleField::new(
            Some(RecordingCanvas::default()),
            FieldConfig {
                burst: 3,
                max_particles: Some(4),
                seed: Some(5),
            },
        );
        field.start(&mut host);
        field.pointer_moved(Vec2::ZERO);
        field.pointer_moved(Vec2::ZERO);
        assert_eq!(field.store().len(), 4);
    }
}
