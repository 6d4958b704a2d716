use std::ops::RangeInclusive;

use tracing::warn;

/// Slider bounds for one tunable parameter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParamRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl ParamRange {
    pub fn as_f32(&self) -> RangeInclusive<f32> {
        self.min as f32..=self.max as f32
    }

    pub fn as_u32(&self) -> RangeInclusive<u32> {
        self.min as u32..=self.max as u32
    }
}

pub const PLANE_SIZE_RANGE: ParamRange = ParamRange { min: 1.0, max: 25.0, step: 1.0 };
pub const AMPLITUDE_RANGE: ParamRange = ParamRange { min: -2.0, max: 2.0, step: 0.1 };
pub const TIME_SCALE_RANGE: ParamRange = ParamRange { min: -2.0, max: 2.0, step: 0.1 };
pub const RESOLUTION_RANGE: ParamRange = ParamRange { min: 0.0, max: 0.2, step: 0.001 };

/// The four live-tunable values, exposed as sliders in the control panel.
///
/// The panel (or the CLI at startup) is the only writer; the frame driver
/// reads a copy each tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Params {
    /// Plane extent in world units, also the segment count per axis.
    pub plane_size: u32,
    /// Multiplier applied to each noise sample.
    pub amplitude: f32,
    /// Multiplier on the fixed per-tick clock step. Negative runs backwards.
    pub time_scale: f32,
    /// Scale from plane coordinates to noise coordinates.
    pub resolution: f32,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            plane_size: 15,
            amplitude: 1.0,
            time_scale: 1.0,
            resolution: 0.1,
        }
    }
}

impl Params {
    /// Pull every field into its slider range, warning about each one that moved.
    pub fn clamped(self) -> Self {
        let plane_size = clamp_u32("plane_size", self.plane_size, &PLANE_SIZE_RANGE);
        let amplitude = clamp_f32("amplitude", self.amplitude, &AMPLITUDE_RANGE);
        let time_scale = clamp_f32("time_scale", self.time_scale, &TIME_SCALE_RANGE);
        let resolution = clamp_f32("resolution", self.resolution, &RESOLUTION_RANGE);
        Self {
            plane_size,
            amplitude,
            time_scale,
            resolution,
        }
    }

    /// True if every field already lies in its slider range.
    ///
    /// Bounds are compared in each field's own type; `0.2f32` widened to f64
    /// lands just above `0.2`.
    pub fn in_range(&self) -> bool {
        PLANE_SIZE_RANGE.as_u32().contains(&self.plane_size)
            && AMPLITUDE_RANGE.as_f32().contains(&self.amplitude)
            && TIME_SCALE_RANGE.as_f32().contains(&self.time_scale)
            && RESOLUTION_RANGE.as_f32().contains(&self.resolution)
    }
}

fn clamp_f32(name: &str, value: f32, range: &ParamRange) -> f32 {
    let bounds = range.as_f32();
    let (min, max) = (*bounds.start(), *bounds.end());
    // NaN has no sensible place in a slider; fall back to the lower bound.
    let clamped = if value.is_nan() { min } else { value.clamp(min, max) };
    if clamped != value {
        warn!(param = name, value, clamped, min, max, "parameter out of range");
    }
    clamped
}

fn clamp_u32(name: &str, value: u32, range: &ParamRange) -> u32 {
    let bounds = range.as_u32();
    let (min, max) = (*bounds.start(), *bounds.end());
    let clamped = value.clamp(min, max);
    if clamped != value {
        warn!(param = name, value, clamped, min, max, "parameter out of range");
    }
    clamped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let p = Params::default();
        assert_eq!(p.plane_size, 15);
        assert_eq!(p.amplitude, 1.0);
        assert_eq!(p.time_scale, 1.0);
        assert_eq!(p.resolution, 0.1);
        assert!(p.in_range());
    }

    #[test]
    fn test_clamped_pulls_into_range() {
        let p = Params {
            plane_size: 40,
            amplitude: -3.5,
            time_scale: 9.0,
            resolution: 0.5,
        }
        .clamped();
        assert_eq!(p.plane_size, 25);
        assert_eq!(p.amplitude, -2.0);
        assert_eq!(p.time_scale, 2.0);
        assert_eq!(p.resolution, 0.2);
        assert!(p.in_range());
    }

    #[test]
    fn test_clamped_zero_size_becomes_one() {
        let p = Params { plane_size: 0, ..Default::default() }.clamped();
        assert_eq!(p.plane_size, 1);
    }

    #[test]
    fn test_clamped_nan_takes_minimum() {
        let p = Params { resolution: f32::NAN, ..Default::default() }.clamped();
        assert_eq!(p.resolution, 0.0);
    }

    #[test]
    fn test_clamped_leaves_valid_values_alone() {
        let p = Params {
            plane_size: 7,
            amplitude: -0.4,
            time_scale: 0.0,
            resolution: 0.013,
        };
        assert_eq!(p.clamped(), p);
    }

    #[test]
    fn test_slider_bounds_are_in_range() {
        let top = Params {
            plane_size: 25,
            amplitude: 2.0,
            time_scale: 2.0,
            resolution: 0.2,
        };
        assert!(top.in_range());
        assert_eq!(top.clamped(), top);

        let bottom = Params {
            plane_size: 1,
            amplitude: -2.0,
            time_scale: -2.0,
            resolution: 0.0,
        };
        assert!(bottom.in_range());
        assert_eq!(bottom.clamped(), bottom);

        assert!(!Params { resolution: 0.201, ..Default::default() }.in_range());
    }

    #[test]
    fn test_range_conversions() {
        assert_eq!(PLANE_SIZE_RANGE.as_u32(), 1..=25);
        assert_eq!(AMPLITUDE_RANGE.as_f32(), -2.0..=2.0);
        assert!(RESOLUTION_RANGE.as_f32().contains(&0.2));
        assert!(!RESOLUTION_RANGE.as_f32().contains(&0.21));
    }
}
