use glam::Mat4;
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, TAU};

/// Spin animation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpinConfig {
    /// Angular speed in radians per second.
    pub radians_per_second: f64,
}

impl Default for SpinConfig {
    fn default() -> Self {
        Self {
            radians_per_second: FRAC_PI_2,
        }
    }
}

/// Where the frame loop is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FramePhase {
    /// No frame callback has run yet.
    Uninitialized,
    /// The first callback ran; there was nothing to measure elapsed time from.
    FirstFrame,
    /// Every later callback.
    SteadyState,
}

/// Y-axis spin driven by frame timestamps.
///
/// Owns the current angle and the previous callback timestamp. Timestamps are
/// in milliseconds from any monotonic origin. The angle lives in `[0, 2π]`
/// as long as a single frame never advances it by more than `2π`.
#[derive(Debug, Clone)]
pub struct SpinState {
    config: SpinConfig,
    angle: f64,
    last_timestamp: Option<f64>,
    phase: FramePhase,
}

impl Default for SpinState {
    fn default() -> Self {
        Self::new(SpinConfig::default())
    }
}

impl SpinState {
    pub fn new(config: SpinConfig) -> Self {
        Self {
            config,
            angle: 0.0,
            last_timestamp: None,
            phase: FramePhase::Uninitialized,
        }
    }

    /// Start from an arbitrary angle (used to resume or to test wrapping).
    pub fn with_angle(config: SpinConfig, angle: f64) -> Self {
        Self {
            angle,
            ..Self::new(config)
        }
    }

    pub fn angle(&self) -> f64 {
        self.angle
    }

    pub fn phase(&self) -> FramePhase {
        self.phase
    }

    pub fn last_timestamp(&self) -> Option<f64> {
        self.last_timestamp
    }

    /// Advance for one frame callback and return the new angle.
    ///
    /// `now` is `None` when the callback was invoked directly rather than by
    /// the scheduler. The angle only moves when both `now` and the previous
    /// timestamp are known; the previous timestamp is replaced either way.
    pub fn advance(&mut self, now: Option<f64>) -> f64 {
        self.phase = match self.phase {
            FramePhase::Uninitialized => FramePhase::FirstFrame,
            FramePhase::FirstFrame | FramePhase::SteadyState => FramePhase::SteadyState,
        };

        if let (Some(now), Some(last)) = (now, self.last_timestamp) {
            let elapsed_ms = now - last;
            let raw = self.angle + self.config.radians_per_second * elapsed_ms / 1000.0;
            self.angle = wrap_once(raw);
            tracing::trace!(elapsed_ms, angle = self.angle, "spin advanced");
        }
        self.last_timestamp = now;
        self.angle
    }

    /// Model matrix for the current angle.
    pub fn model_matrix(&self) -> Mat4 {
        rotation_y(self.angle)
    }
}

/// Subtract one full turn when `angle` is strictly greater than `2π`.
///
/// Exactly `2π` is left as is, and at most one turn is removed per call.
pub fn wrap_once(angle: f64) -> f64 {
    if angle > TAU { angle - TAU } else { angle }
}

/// Rotation about +Y with column-major layout
/// `[c,0,s,0, 0,1,0,0, -s,0,c,0, 0,0,0,1]`.
pub fn rotation_y(angle: f64) -> Mat4 {
    let (s, c) = (angle as f32).sin_cos();
    #[rustfmt::skip]
    let cols = [
         c,  0.0,  s, 0.0,
        0.0, 1.0, 0.0, 0.0,
        -s,  0.0,  c, 0.0,
        0.0, 0.0, 0.0, 1.0,
    ];
    Mat4::from_cols_array(&cols)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    const EPS: f64 = 1e-9;

    fn steady(angle: f64) -> SpinState {
        let mut spin = SpinState::with_angle(SpinConfig::default(), angle);
        spin.advance(Some(0.0));
        spin
    }

    #[test]
    fn first_callback_leaves_angle_at_zero() {
        let mut spin = SpinState::default();
        assert_eq!(spin.phase(), FramePhase::Uninitialized);
        assert_eq!(spin.advance(Some(1234.0)), 0.0);
        assert_eq!(spin.phase(), FramePhase::FirstFrame);
        assert_eq!(spin.last_timestamp(), Some(1234.0));
    }

    #[test]
    fn direct_invocation_without_timestamp_does_not_advance() {
        let mut spin = SpinState::default();
        spin.advance(None);
        assert_eq!(spin.advance(Some(500.0)), 0.0);
        assert_eq!(spin.phase(), FramePhase::SteadyState);
        // Now both timestamps exist.
        let angle = spin.advance(Some(1500.0));
        assert!((angle - FRAC_PI_2).abs() < EPS);
    }

    #[test]
    fn advances_quarter_turn_per_second() {
        let mut spin = SpinState::default();
        spin.advance(Some(100.0));
        for elapsed in [0.0, 16.0, 250.0, 1000.0] {
            let before = spin.angle();
            let now = spin.last_timestamp().unwrap() + elapsed;
            let after = spin.advance(Some(now));
            let expected = wrap_once(before + FRAC_PI_2 * elapsed / 1000.0);
            assert!((after - expected).abs() < EPS, "elapsed={elapsed}");
        }
        assert_eq!(spin.phase(), FramePhase::SteadyState);
    }

    #[test]
    fn zero_timestamp_counts_as_a_previous_frame() {
        let mut spin = SpinState::default();
        assert_eq!(spin.advance(Some(0.0)), 0.0);
        assert_eq!(spin.last_timestamp(), Some(0.0));
        assert!((spin.advance(Some(1000.0)) - FRAC_PI_2).abs() < EPS);
    }

    #[test]
    fn wrap_subtracts_once_past_full_turn() {
        let mut spin = steady(6.2);
        let angle = spin.advance(Some(1000.0));
        assert!((angle - 1.487_611_019_615_310_6).abs() < 1e-6, "{angle}");
        assert!((angle - 1.4876).abs() < 1e-4);
    }

    #[test]
    fn wrap_from_just_below_full_turn() {
        let start = TAU - 0.001;
        let mut spin = steady(start);
        let angle = spin.advance(Some(100.0));
        let raw = start + FRAC_PI_2 * 0.1;
        assert!(raw > TAU);
        assert!((angle - (raw - TAU)).abs() < EPS);
    }

    #[test]
    fn wrap_boundary_is_strict() {
        assert_eq!(wrap_once(TAU), TAU);
        assert!((wrap_once(TAU + 0.5) - 0.5).abs() < EPS);
        assert_eq!(wrap_once(3.0), 3.0);
    }

    #[test]
    fn never_wraps_more_than_once_per_frame() {
        // Ten seconds is 2.5 turns; only one turn is removed.
        let mut spin = steady(0.0);
        let angle = spin.advance(Some(10_000.0));
        assert!((angle - (5.0 * std::f64::consts::PI - TAU)).abs() < EPS);
        assert!(angle > TAU);
    }

    #[test]
    fn custom_rate_scales_advance() {
        let mut spin = SpinState::new(SpinConfig {
            radians_per_second: 1.0,
        });
        spin.advance(Some(0.0));
        assert!((spin.advance(Some(2000.0)) - 2.0).abs() < EPS);
    }

    #[test]
    fn rotation_at_zero_is_identity() {
        assert_eq!(rotation_y(0.0), Mat4::IDENTITY);
        assert_eq!(SpinState::default().model_matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn rotation_layout_is_column_major() {
        let m = rotation_y(FRAC_PI_2).to_cols_array();
        #[rustfmt::skip]
        let expected = [
            0.0, 0.0, 1.0, 0.0,
            0.0, 1.0, 0.0, 0.0,
            -1.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ];
        for (got, want) in m.iter().zip(expected) {
            assert!((got - want).abs() < 1e-6, "{m:?}");
        }
        // +X swings toward +Z.
        let x = rotation_y(FRAC_PI_2).transform_vector3(Vec3::X);
        assert!(x.abs_diff_eq(Vec3::Z, 1e-6));
    }

    #[test]
    fn rotation_keeps_y_axis_fixed() {
        let m = rotation_y(1.234);
        assert!(m.transform_vector3(Vec3::Y).abs_diff_eq(Vec3::Y, 1e-6));
        assert!((m.determinant() - 1.0).abs() < 1e-6);
    }
}
