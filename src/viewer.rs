// viewer.rs — viewer lifecycle and per-frame orbit state
//
// Lifecycle: Unmounted → Loading (decode in flight) → Ready → [Error].
// Ready is the only interactive state. Error is terminal for that mount;
// loading another panorama re-enters Loading.

use crate::camera::OrbitCamera;
use crate::config::{HotspotAnnotation, ViewerConfig};
use crate::device::{DeviceClass, DeviceProbe, GestureBindings};
use crate::error::ViewerError;
use crate::hotspot::Marker;
use crate::mesh::SPHERE_RADIUS;

#[derive(Debug, Clone, PartialEq)]
pub enum ViewerState {
    /// No panorama bound yet.
    Unmounted,
    /// Texture decode in flight; overlay stays interactive, sphere does not
    /// render.
    Loading,
    Ready,
    Error(String),
}

pub struct Viewer {
    pub state: ViewerState,
    pub config: ViewerConfig,
    pub camera: OrbitCamera,
    pub markers: Vec<Marker>,
    pub device_class: DeviceClass,
    probe: DeviceProbe,
    dragging: bool,
    pinching: bool,
    shut_down: bool,
    frames: u64,
    generation: u64,
}

impl Viewer {
    pub fn new(config: ViewerConfig, probe: DeviceProbe) -> Self {
        let device_class = probe().unwrap_or(DeviceClass::Desktop);
        Self {
            state: ViewerState::Unmounted,
            config,
            camera: OrbitCamera::new(),
            markers: Vec::new(),
            device_class,
            probe,
            dragging: false,
            pinching: false,
            shut_down: false,
            frames: 0,
            generation: 0,
        }
    }

    pub fn bindings(&self) -> GestureBindings {
        GestureBindings::for_device(self.device_class, self.config.enable_zoom)
    }

    /// Hotspots and controls respond only while Ready.
    pub fn is_interactive(&self) -> bool {
        self.state == ViewerState::Ready && !self.shut_down
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Identity of the current mount. Decode results quote it back so a
    /// result from a superseded load can be told apart from the live one.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// A new panorama starts decoding; any previous mount is discarded.
    /// Returns the new mount's generation.
    pub fn begin_loading(&mut self, config: ViewerConfig) -> u64 {
        self.generation += 1;
        self.state = ViewerState::Loading;
        self.config = config;
        self.markers.clear();
        self.dragging = false;
        self.pinching = false;
        self.camera.reset();
        self.generation
    }

    /// The texture resolved: place the markers and become interactive.
    /// Markers are recomputed from their annotations on every (re)mount.
    /// Returns `false` (leaving the mount untouched) when the result belongs
    /// to a mount that has since been replaced.
    pub fn texture_ready(&mut self, generation: u64, annotations: &[HotspotAnnotation]) -> bool {
        if generation != self.generation || self.shut_down {
            return false;
        }
        self.markers = annotations
            .iter()
            .cloned()
            .map(|a| Marker::new(a, SPHERE_RADIUS))
            .collect();
        self.state = ViewerState::Ready;
        true
    }

    /// A decode failed. Only the live mount's failure flips the viewer to
    /// the error state; a stale one returns `false` and changes nothing.
    pub fn texture_failed(&mut self, generation: u64, err: &ViewerError) -> bool {
        if generation != self.generation {
            return false;
        }
        self.markers.clear();
        self.state = ViewerState::Error(err.to_string());
        true
    }

    // --- input ---------------------------------------------------------

    pub fn start_drag(&mut self) {
        if self.is_interactive() {
            self.dragging = true;
        }
    }

    pub fn end_drag(&mut self) {
        self.dragging = false;
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn drag_delta(&mut self, dx: f32, dy: f32, width: f32, height: f32) {
        if self.dragging && self.is_interactive() {
            self.camera.rotate_by_drag(dx, dy, width, height);
        }
    }

    pub fn zoom_steps(&mut self, steps: f32) {
        if self.is_interactive() && self.config.enable_zoom {
            self.camera.zoom(steps);
        }
    }

    pub fn start_pinch(&mut self) {
        if self.is_interactive() {
            self.dragging = false;
            self.pinching = true;
        }
    }

    pub fn end_pinch(&mut self) {
        self.pinching = false;
    }

    /// Two-finger update: `dist_delta` is the change of finger spread in
    /// pixels, `(dx, dy)` the centroid movement. What each drives depends on
    /// the gesture bindings; the pan binding has no effect because the
    /// camera cannot translate.
    pub fn pinch_update(&mut self, dist_delta: f32, dx: f32, dy: f32, width: f32, height: f32) {
        if !self.pinching || !self.is_interactive() {
            return;
        }
        let bindings = self.bindings();
        if bindings.two_finger_zoom {
            // ~40 px of spread per zoom step feels close to a wheel notch.
            self.camera.zoom(dist_delta / 40.0);
        }
        if bindings.two_finger_rotate {
            self.camera.rotate_by_drag(dx, dy, width, height);
        }
    }

    /// Hard evidence beats the probe: a real touch event reclassifies the
    /// device immediately.
    pub fn note_touch_event(&mut self) {
        self.device_class = DeviceClass::Touch;
    }

    /// Layout changed: re-run the capability probe. An inconclusive probe
    /// keeps the current class rather than downgrading observed hardware.
    pub fn handle_resize(&mut self) {
        if let Some(class) = (self.probe)() {
            self.device_class = class;
        }
    }

    // --- frame tick ----------------------------------------------------

    /// Advance one frame. Auto-rotate runs only while Ready with no gesture
    /// in progress, and resumes when the gesture ends.
    pub fn update(&mut self, dt: f32) {
        if self.shut_down {
            return;
        }
        self.frames += 1;
        if self.is_interactive()
            && self.config.auto_rotate
            && !self.dragging
            && !self.pinching
        {
            self.camera
                .advance_auto_rotate(self.config.auto_rotate_speed, dt);
        }
    }

    /// Stop all per-frame work. Terminal.
    pub fn shutdown(&mut self) {
        self.shut_down = true;
        self.dragging = false;
        self.pinching = false;
    }
}
