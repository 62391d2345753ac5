// device.rs — device-class detection and gesture bindings

/// Coarse input-device class. Decides what a two-finger gesture means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    Desktop,
    Touch,
}

/// Capability probe injected at viewer construction. `None` means the probe
/// is inconclusive; the viewer then degrades to desktop behavior. The probe
/// is re-run on window resize.
pub type DeviceProbe = Box<dyn Fn() -> Option<DeviceClass>>;

/// Probe for platforms without a portable touch-capability query: always
/// inconclusive. The viewer still upgrades to `Touch` the moment a real
/// touch event arrives.
pub fn inconclusive_probe() -> DeviceProbe {
    Box::new(|| None)
}

/// What the secondary (two-finger / wheel) gesture drives. Pan is listed for
/// completeness but is a structural no-op: the camera can only rotate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureBindings {
    pub two_finger_zoom: bool,
    pub two_finger_pan: bool,
    pub two_finger_rotate: bool,
}

impl GestureBindings {
    pub fn for_device(class: DeviceClass, enable_zoom: bool) -> Self {
        match class {
            // Touch hardware: pinch zooms (when allowed) and the pair of
            // fingers pans, which the fixed camera ignores.
            DeviceClass::Touch => Self {
                two_finger_zoom: enable_zoom,
                two_finger_pan: true,
                two_finger_rotate: false,
            },
            // Pointer hardware: with zoom enabled the wheel / two-pointer
            // gesture zooms and rotates; without it the gesture does nothing
            // (single-pointer drag still orbits).
            DeviceClass::Desktop => Self {
                two_finger_zoom: enable_zoom,
                two_finger_pan: false,
                two_finger_rotate: enable_zoom,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touch_binds_zoom_and_pan() {
        let b = GestureBindings::for_device(DeviceClass::Touch, true);
        assert!(b.two_finger_zoom);
        assert!(b.two_finger_pan);
        assert!(!b.two_finger_rotate);
    }

    #[test]
    fn desktop_binds_zoom_and_rotate() {
        let b = GestureBindings::for_device(DeviceClass::Desktop, true);
        assert!(b.two_finger_zoom);
        assert!(!b.two_finger_pan);
        assert!(b.two_finger_rotate);
    }

    #[test]
    fn zoom_disabled_leaves_desktop_gesture_unbound() {
        let b = GestureBindings::for_device(DeviceClass::Desktop, false);
        assert!(!b.two_finger_zoom);
        assert!(!b.two_finger_rotate);
        assert!(!b.two_finger_pan);
    }

    #[test]
    fn zoom_disabled_keeps_touch_pan() {
        let b = GestureBindings::for_device(DeviceClass::Touch, false);
        assert!(!b.two_finger_zoom);
        assert!(b.two_finger_pan, "pan binding does not depend on enable_zoom");
        assert!(!b.two_finger_rotate);
    }

    #[test]
    fn inconclusive_probe_returns_none() {
        assert_eq!(inconclusive_probe()(), None);
    }
}
