use glam::Vec2;

/// Map a window-space pointer position (pixels, origin top-left, +y down)
/// into normalized device coordinates.
///
/// A zero-sized viewport maps every position to the center.
pub fn normalize_pointer(client: Vec2, viewport: Vec2) -> Vec2 {
    if viewport.x <= 0.0 || viewport.y <= 0.0 {
        return Vec2::ZERO;
    }
    Vec2::new(
        client.x / viewport.x * 2.0 - 1.0,
        -(client.y / viewport.y) * 2.0 + 1.0,
    )
}

/// Tilt angle in radians for a normalized pointer: `-asin(y)`.
///
/// `y` is clamped to [-1, 1] first, so positions just outside the window
/// still give a finite angle.
pub fn pointer_tilt_angle(pointer: Vec2) -> f32 {
    -pointer.y.clamp(-1.0, 1.0).asin()
}

/// Rotate `(x, y)` counter-clockwise by `angle` radians.
pub fn rotate_2d(x: f32, y: f32, angle: f32) -> (f32, f32) {
    let (sin, cos) = angle.sin_cos();
    (x * cos - y * sin, x * sin + y * cos)
}

/// Last known pointer position, normalized.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerState {
    pub position: Vec2,
    /// Set once any pointer event has arrived.
    pub seen: bool,
}

impl PointerState {
    pub fn update(&mut self, client: Vec2, viewport: Vec2) {
        self.position = normalize_pointer(client, viewport);
        self.seen = true;
        tracing::trace!(x = self.position.x, y = self.position.y, "pointer moved");
    }

    pub fn tilt(&self) -> f32 {
        pointer_tilt_angle(self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, FRAC_PI_6};

    #[test]
    fn normalize_corners_and_center() {
        let vp = Vec2::new(800.0, 600.0);
        assert_eq!(normalize_pointer(Vec2::ZERO, vp), Vec2::new(-1.0, 1.0));
        assert_eq!(normalize_pointer(vp, vp), Vec2::new(1.0, -1.0));
        assert_eq!(normalize_pointer(vp / 2.0, vp), Vec2::ZERO);
    }

    #[test]
    fn zero_viewport_is_centered() {
        assert_eq!(normalize_pointer(Vec2::new(5.0, 5.0), Vec2::ZERO), Vec2::ZERO);
    }

    #[test]
    fn tilt_reference_values() {
        assert_eq!(pointer_tilt_angle(Vec2::ZERO), 0.0);
        assert!((pointer_tilt_angle(Vec2::new(0.0, 1.0)) + FRAC_PI_2).abs() < 1e-6);
        assert!((pointer_tilt_angle(Vec2::new(0.3, 0.5)) + FRAC_PI_6).abs() < 1e-6);
    }

    #[test]
    fn tilt_clamps_out_of_range() {
        let angle = pointer_tilt_angle(Vec2::new(0.0, -1.5));
        assert!(angle.is_finite());
        assert!((angle - FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn rotate_quarter_turn() {
        let (x, y) = rotate_2d(1.0, 0.0, FRAC_PI_2);
        assert!(x.abs() < 1e-6);
        assert!((y - 1.0).abs() < 1e-6);
        assert_eq!(rotate_2d(3.0, 4.0, 0.0), (3.0, 4.0));
    }

    #[test]
    fn pointer_state_tracks_last_event() {
        let mut state = PointerState::default();
        assert!(!state.seen);
        state.update(Vec2::new(400.0, 0.0), Vec2::new(800.0, 600.0));
        assert!(state.seen);
        assert_eq!(state.position, Vec2::new(0.0, 1.0));
        assert!((state.tilt() + FRAC_PI_2).abs() < 1e-6);
    }
}
