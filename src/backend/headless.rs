//! GPU-less reference backend.
//!
//! [`HeadlessBackend`] keeps a table of sphere bodies and reports
//! contact-start pairs whenever two bodies begin to overlap and their
//! collision masks accept each other in both directions. Contacts can also
//! be injected by hand, which is how tests reproduce races between the
//! projectile sweep and the contact feed.
//!
//! Every call is recorded in a journal. The backend itself ends up boxed
//! inside the world, so tests observe it through a [`HeadlessProbe`] that
//! shares the same state.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use glam::Vec3;
use log::{debug, trace};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::backend::{
    AppearanceId, BackendError, BodyDesc, BodyHandle, BodyShape, ContactPair, RenderBackend,
    SceneDescriptor, SceneHandle, Surface,
};
use crate::components::collisionfilter::CollisionFilter;

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    CreateContext(String),
    BuildScene(String, SceneHandle),
    DisposeScene(SceneHandle),
    RunLoop,
    StopLoop,
    ClearSurface,
    Resize(u32, u32),
    CreateBody(BodyHandle),
    DestroyBody(BodyHandle),
    SetFilter(BodyHandle),
    SetAppearance(BodyHandle, AppearanceId),
    Release,
}

#[derive(Debug, Clone, Copy)]
struct HeadlessBody {
    radius: f32,
    position: Vec3,
    filter: CollisionFilter,
    appearance: AppearanceId,
}

#[derive(Default)]
struct HeadlessState {
    journal: Vec<BackendCall>,
    context: Option<Surface>,
    scenes: FxHashSet<SceneHandle>,
    bodies: FxHashMap<BodyHandle, HeadlessBody>,
    touching: FxHashSet<(BodyHandle, BodyHandle)>,
    injected: Vec<ContactPair>,
    running: bool,
    released: bool,
    next_handle: u64,
}

impl HeadlessState {
    fn next_handle(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }
}

fn lock(state: &Mutex<HeadlessState>) -> MutexGuard<'_, HeadlessState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Reference backend without rendering.
pub struct HeadlessBackend {
    state: Arc<Mutex<HeadlessState>>,
    refuse_surfaces: bool,
    detect_overlaps: bool,
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(HeadlessState::default())),
            refuse_surfaces: false,
            detect_overlaps: true,
        }
    }

    /// Make `create_context` fail, as a device without a usable surface would.
    pub fn refusing_surfaces(mut self) -> Self {
        self.refuse_surfaces = true;
        self
    }

    /// Turn automatic sphere-overlap contacts on or off. Injected contacts
    /// are always delivered.
    pub fn with_overlap_detection(mut self, enabled: bool) -> Self {
        self.detect_overlaps = enabled;
        self
    }

    pub fn probe(&self) -> HeadlessProbe {
        HeadlessProbe {
            state: Arc::clone(&self.state),
        }
    }

    fn record(state: &mut HeadlessState, call: BackendCall) {
        trace!("headless: {:?}", call);
        state.journal.push(call);
    }

    fn overlapping_pairs(state: &HeadlessState) -> Vec<(BodyHandle, BodyHandle)> {
        let active: Vec<(BodyHandle, &HeadlessBody)> = state
            .bodies
            .iter()
            .filter(|(_, b)| !b.filter.collide.is_empty())
            .map(|(h, b)| (*h, b))
            .collect();
        let mut pairs = Vec::new();
        for (i, (ha, a)) in active.iter().enumerate() {
            for (hb, b) in active.iter().skip(i + 1) {
                if !a.filter.allows(&b.filter) {
                    continue;
                }
                let reach = a.radius + b.radius;
                if a.position.distance_squared(b.position) <= reach * reach {
                    pairs.push(ordered(*ha, *hb));
                }
            }
        }
        pairs
    }
}

fn ordered(a: BodyHandle, b: BodyHandle) -> (BodyHandle, BodyHandle) {
    if a <= b { (a, b) } else { (b, a) }
}

impl RenderBackend for HeadlessBackend {
    fn create_context(&mut self, surface: &Surface) -> Result<(), BackendError> {
        let mut state = lock(&self.state);
        if state.released {
            return Err(BackendError::Released);
        }
        if self.refuse_surfaces {
            return Err(BackendError::UnsupportedSurface(surface.label.clone()));
        }
        Self::record(&mut state, BackendCall::CreateContext(surface.label.clone()));
        state.context = Some(surface.clone());
        debug!(
            "headless context on '{}' ({}x{})",
            surface.label, surface.width, surface.height
        );
        Ok(())
    }

    fn build_scene_graph(&mut self, desc: &SceneDescriptor) -> Result<SceneHandle, BackendError> {
        let mut state = lock(&self.state);
        if state.released {
            return Err(BackendError::Released);
        }
        if state.context.is_none() {
            return Err(BackendError::NoContext);
        }
        let handle = SceneHandle(state.next_handle());
        state.scenes.insert(handle);
        Self::record(&mut state, BackendCall::BuildScene(desc.key.clone(), handle));
        Ok(handle)
    }

    fn dispose_scene(&mut self, scene: SceneHandle) {
        let mut state = lock(&self.state);
        if state.scenes.remove(&scene) {
            Self::record(&mut state, BackendCall::DisposeScene(scene));
        }
    }

    fn run_loop(&mut self) {
        let mut state = lock(&self.state);
        state.running = true;
        Self::record(&mut state, BackendCall::RunLoop);
    }

    fn stop_loop(&mut self) {
        let mut state = lock(&self.state);
        state.running = false;
        Self::record(&mut state, BackendCall::StopLoop);
    }

    fn clear_surface(&mut self) {
        let mut state = lock(&self.state);
        Self::record(&mut state, BackendCall::ClearSurface);
    }

    fn resize(&mut self, width: u32, height: u32) {
        let mut state = lock(&self.state);
        if let Some(surface) = state.context.as_mut() {
            surface.width = width;
            surface.height = height;
        }
        Self::record(&mut state, BackendCall::Resize(width, height));
    }

    fn create_body(&mut self, desc: &BodyDesc) -> Result<BodyHandle, BackendError> {
        let mut state = lock(&self.state);
        if state.released {
            return Err(BackendError::Released);
        }
        if state.context.is_none() {
            return Err(BackendError::NoContext);
        }
        let handle = BodyHandle(state.next_handle());
        let BodyShape::Sphere { radius } = desc.shape;
        state.bodies.insert(
            handle,
            HeadlessBody {
                radius,
                position: desc.position,
                filter: desc.filter,
                appearance: desc.appearance,
            },
        );
        Self::record(&mut state, BackendCall::CreateBody(handle));
        Ok(handle)
    }

    fn destroy_body(&mut self, body: BodyHandle) {
        let mut state = lock(&self.state);
        if state.bodies.remove(&body).is_some() {
            state.touching.retain(|(a, b)| *a != body && *b != body);
            Self::record(&mut state, BackendCall::DestroyBody(body));
        }
    }

    fn move_body(&mut self, body: BodyHandle, position: Vec3) {
        let mut state = lock(&self.state);
        if let Some(b) = state.bodies.get_mut(&body) {
            b.position = position;
        }
    }

    fn set_body_filter(&mut self, body: BodyHandle, filter: CollisionFilter) {
        let mut state = lock(&self.state);
        if let Some(b) = state.bodies.get_mut(&body) {
            b.filter = filter;
            Self::record(&mut state, BackendCall::SetFilter(body));
        }
    }

    fn set_appearance(&mut self, body: BodyHandle, appearance: AppearanceId) {
        let mut state = lock(&self.state);
        if let Some(b) = state.bodies.get_mut(&body) {
            b.appearance = appearance;
            Self::record(&mut state, BackendCall::SetAppearance(body, appearance));
        }
    }

    fn appearance(&self, body: BodyHandle) -> Option<AppearanceId> {
        lock(&self.state).bodies.get(&body).map(|b| b.appearance)
    }

    fn drain_contacts(&mut self) -> Vec<ContactPair> {
        let mut state = lock(&self.state);
        let mut contacts = std::mem::take(&mut state.injected);
        if self.detect_overlaps {
            let now_touching: FxHashSet<(BodyHandle, BodyHandle)> =
                Self::overlapping_pairs(&state).into_iter().collect();
            for pair in &now_touching {
                if !state.touching.contains(pair) {
                    contacts.push(ContactPair {
                        a: pair.0,
                        b: pair.1,
                    });
                }
            }
            state.touching = now_touching;
        }
        contacts
    }

    fn release(&mut self) {
        let mut state = lock(&self.state);
        state.bodies.clear();
        state.scenes.clear();
        state.touching.clear();
        state.context = None;
        state.running = false;
        state.released = true;
        Self::record(&mut state, BackendCall::Release);
    }
}

/// Read-side view of a [`HeadlessBackend`], shareable with tests.
#[derive(Clone)]
pub struct HeadlessProbe {
    state: Arc<Mutex<HeadlessState>>,
}

impl HeadlessProbe {
    pub fn calls(&self) -> Vec<BackendCall> {
        lock(&self.state).journal.clone()
    }

    pub fn count(&self, pred: impl Fn(&BackendCall) -> bool) -> usize {
        lock(&self.state).journal.iter().filter(|c| pred(c)).count()
    }

    pub fn clear_journal(&self) {
        lock(&self.state).journal.clear();
    }

    pub fn live_bodies(&self) -> usize {
        lock(&self.state).bodies.len()
    }

    pub fn live_scenes(&self) -> usize {
        lock(&self.state).scenes.len()
    }

    pub fn is_running(&self) -> bool {
        lock(&self.state).running
    }

    pub fn body_position(&self, body: BodyHandle) -> Option<Vec3> {
        lock(&self.state).bodies.get(&body).map(|b| b.position)
    }

    pub fn body_filter(&self, body: BodyHandle) -> Option<CollisionFilter> {
        lock(&self.state).bodies.get(&body).map(|b| b.filter)
    }

    /// Queue a contact for the next `drain_contacts`, even for unknown handles.
    pub fn inject_contact(&self, a: BodyHandle, b: BodyHandle) {
        lock(&self.state).injected.push(ContactPair { a, b });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready() -> (HeadlessBackend, HeadlessProbe) {
        let mut backend = HeadlessBackend::new();
        let probe = backend.probe();
        backend
            .create_context(&Surface::new("test", 64, 64))
            .expect("context");
        (backend, probe)
    }

    fn sphere(position: Vec3, filter: CollisionFilter) -> BodyDesc {
        BodyDesc {
            shape: BodyShape::Sphere { radius: 1.0 },
            position,
            filter,
            appearance: AppearanceId::SPHERE,
        }
    }

    #[test]
    fn refusing_backend_reports_unsupported_surface() {
        let mut backend = HeadlessBackend::new().refusing_surfaces();
        let err = backend
            .create_context(&Surface::new("canvas", 1, 1))
            .unwrap_err();
        assert_eq!(err, BackendError::UnsupportedSurface("canvas".into()));
    }

    #[test]
    fn overlap_reports_contact_start_only_once() {
        let (mut backend, _) = ready();
        let a = backend
            .create_body(&sphere(Vec3::ZERO, CollisionFilter::player()))
            .unwrap();
        let b = backend
            .create_body(&sphere(Vec3::new(0.5, 0.0, 0.0), CollisionFilter::enemy_bullet()))
            .unwrap();
        let first = backend.drain_contacts();
        assert_eq!(first.len(), 1);
        assert!(first[0] == ContactPair { a, b } || first[0] == ContactPair { a: b, b: a });
        assert!(backend.drain_contacts().is_empty());
    }

    #[test]
    fn masks_must_accept_each_other() {
        let (mut backend, _) = ready();
        backend
            .create_body(&sphere(Vec3::ZERO, CollisionFilter::player()))
            .unwrap();
        backend
            .create_body(&sphere(Vec3::ZERO, CollisionFilter::player_bullet()))
            .unwrap();
        assert!(backend.drain_contacts().is_empty());
    }

    #[test]
    fn destroyed_bodies_stop_existing() {
        let (mut backend, probe) = ready();
        let a = backend
            .create_body(&sphere(Vec3::ZERO, CollisionFilter::player()))
            .unwrap();
        backend.destroy_body(a);
        backend.destroy_body(a);
        assert_eq!(probe.live_bodies(), 0);
        assert_eq!(probe.count(|c| matches!(c, BackendCall::DestroyBody(_))), 1);
    }

    #[test]
    fn moved_and_suppressed_bodies_stop_touching() {
        let (mut backend, probe) = ready();
        let ship = backend
            .create_body(&sphere(Vec3::ZERO, CollisionFilter::player()))
            .unwrap();
        backend
            .create_body(&sphere(Vec3::new(10.0, 0.0, 0.0), CollisionFilter::enemy_bullet()))
            .unwrap();
        assert!(backend.drain_contacts().is_empty());

        let mut filter = CollisionFilter::player();
        filter.suppress();
        backend.set_body_filter(ship, filter);
        backend.move_body(ship, Vec3::new(10.0, 0.0, 0.0));
        assert_eq!(probe.body_position(ship), Some(Vec3::new(10.0, 0.0, 0.0)));
        assert!(probe.body_filter(ship).is_some_and(|f| f.is_suppressed()));
        assert!(backend.drain_contacts().is_empty());
    }
}
