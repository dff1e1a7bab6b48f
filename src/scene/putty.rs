//! Putty radii from per-atom temperature factors.
//!
//! The subset's mean, population standard deviation and extent feed one
//! of nine transforms. The transformed value is floored at zero, raised to
//! the scale power for the nonlinear transforms, clamped to the scale
//! bounds (a negative bound is ignored) and multiplied by the base radius.

use crate::session::setting_id as id;
use crate::session::SettingsScope;

/// How a temperature factor becomes a scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PuttyTransform {
    /// Z-score, raised to the power.
    NormalizedNonlinear,
    /// Position within the data extent, raised to the power.
    RelativeNonlinear,
    /// Divided by the range, raised to the power.
    ScaledNonlinear,
    /// Unchanged, raised to the power.
    AbsoluteNonlinear,
    /// Z-score.
    NormalizedLinear,
    /// Position within the data extent.
    RelativeLinear,
    /// Divided by the range.
    ScaledLinear,
    /// Unchanged.
    AbsoluteLinear,
    /// `sqrt(B / 8) / pi`.
    ImpliedRms,
}

impl PuttyTransform {
    /// Map the setting value; unknown values leave the factor unchanged.
    #[must_use]
    pub fn from_setting(v: i32) -> Self {
        match v {
            0 => Self::NormalizedNonlinear,
            1 => Self::RelativeNonlinear,
            2 => Self::ScaledNonlinear,
            3 => Self::AbsoluteNonlinear,
            4 => Self::NormalizedLinear,
            5 => Self::RelativeLinear,
            6 => Self::ScaledLinear,
            8 => Self::ImpliedRms,
            _ => Self::AbsoluteLinear,
        }
    }

    /// Whether the power is applied.
    #[must_use]
    pub fn nonlinear(self) -> bool {
        matches!(
            self,
            Self::NormalizedNonlinear
                | Self::RelativeNonlinear
                | Self::ScaledNonlinear
                | Self::AbsoluteNonlinear
        )
    }
}

/// Putty settings of one branch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PuttyParams {
    /// Base radius.
    pub radius: f32,
    /// Range divisor.
    pub range: f32,
    /// Lower clamp; negative disables.
    pub scale_min: f32,
    /// Upper clamp; negative disables.
    pub scale_max: f32,
    /// Exponent for nonlinear transforms.
    pub power: f32,
    /// Transform.
    pub transform: PuttyTransform,
}

impl PuttyParams {
    /// Read the putty settings visible from `scope`.
    #[must_use]
    pub fn from_scope(scope: SettingsScope<'_>) -> Self {
        Self {
            radius: scope.float(id::CARTOON_PUTTY_RADIUS),
            range: scope.float(id::CARTOON_PUTTY_RANGE),
            scale_min: scope.float(id::CARTOON_PUTTY_SCALE_MIN),
            scale_max: scope.float(id::CARTOON_PUTTY_SCALE_MAX),
            power: scope.float(id::CARTOON_PUTTY_SCALE_POWER),
            transform: PuttyTransform::from_setting(scope.int(id::CARTOON_PUTTY_TRANSFORM)),
        }
    }
}

/// Summary of the subset's values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PuttyStats {
    /// Mean.
    pub mean: f32,
    /// Population standard deviation.
    pub stdev: f32,
    /// Smallest value.
    pub min: f32,
    /// Largest value.
    pub max: f32,
}

impl PuttyStats {
    /// Statistics of `values`; `None` when empty.
    #[must_use]
    pub fn of(values: &[f32]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let n = values.len() as f64;
        let sum: f64 = values.iter().map(|&v| f64::from(v)).sum();
        let sumsq: f64 = values.iter().map(|&v| f64::from(v) * f64::from(v)).sum();
        let variance = ((sumsq - sum * sum / n) / n).max(0.0);
        Some(Self {
            mean: (sum / n) as f32,
            stdev: variance.sqrt() as f32,
            min: values.iter().copied().fold(f32::INFINITY, f32::min),
            max: values.iter().copied().fold(f32::NEG_INFINITY, f32::max),
        })
    }
}

/// Transformed value before flooring and clamping. `None` when the
/// transform would divide by zero.
#[must_use]
pub fn transformed(value: f32, params: &PuttyParams, stats: &PuttyStats) -> Option<f32> {
    use PuttyTransform as T;
    let nonzero = |d: f32| (d != 0.0).then_some(d);
    Some(match params.transform {
        T::NormalizedNonlinear | T::NormalizedLinear => {
            1.0 + (value - stats.mean) / nonzero(params.range)? / nonzero(stats.stdev)?
        }
        T::RelativeNonlinear | T::RelativeLinear => {
            (value - stats.min) / nonzero(stats.max - stats.min)? / nonzero(params.range)?
        }
        T::ScaledNonlinear | T::ScaledLinear => value / nonzero(params.range)?,
        T::AbsoluteNonlinear | T::AbsoluteLinear => value,
        T::ImpliedRms => (value.max(0.0) / 8.0).sqrt() / std::f32::consts::PI,
    })
}

/// Final putty radius for one value.
#[must_use]
pub fn putty_radius(value: f32, params: &PuttyParams, stats: &PuttyStats) -> f32 {
    let Some(mut scale) = transformed(value, params, stats) else {
        return value * params.radius;
    };
    scale = scale.max(0.0);
    if params.transform.nonlinear() {
        scale = scale.powf(params.power);
    }
    if params.scale_min >= 0.0 && scale < params.scale_min {
        scale = params.scale_min;
    }
    if params.scale_max >= 0.0 && scale > params.scale_max {
        scale = params.scale_max;
    }
    scale * params.radius
}

/// Radii for a subset of values, in the same order.
#[must_use]
pub fn putty_radii(values: &[f32], params: &PuttyParams) -> Vec<f32> {
    let Some(stats) = PuttyStats::of(values) else {
        return Vec::new();
    };
    values
        .iter()
        .map(|&v| putty_radius(v, params, &stats))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(transform: PuttyTransform) -> PuttyParams {
        PuttyParams {
            radius: 0.4,
            range: 2.0,
            scale_min: -1.0,
            scale_max: -1.0,
            power: 1.5,
            transform,
        }
    }

    const B: [f32; 5] = [10.0, 20.0, 30.0, 40.0, 50.0];

    #[test]
    fn relative_minimum_is_zero_before_clamp() {
        let stats = PuttyStats::of(&B).unwrap();
        for range in [0.5, 1.0, 2.0, 7.0] {
            for t in [PuttyTransform::RelativeLinear, PuttyTransform::RelativeNonlinear] {
                let p = PuttyParams { range, ..params(t) };
                assert_eq!(transformed(10.0, &p, &stats), Some(0.0));
            }
        }
    }

    #[test]
    fn absolute_without_clamp_scales_by_radius() {
        let p = params(PuttyTransform::AbsoluteLinear);
        let r = putty_radii(&B, &p);
        for (v, r) in B.iter().zip(&r) {
            assert!((r - v * 0.4).abs() < 1e-5);
        }
    }

    #[test]
    fn nonlinear_applies_power_and_clamps() {
        let p = PuttyParams {
            scale_min: 0.6,
            scale_max: 4.0,
            ..params(PuttyTransform::ScaledNonlinear)
        };
        let stats = PuttyStats::of(&B).unwrap();
        // 10 / 2 = 5, 5^1.5 > 4 clamps high.
        assert!((putty_radius(10.0, &p, &stats) - 4.0 * 0.4).abs() < 1e-6);
        // Negative input floors at zero, then clamps low.
        assert!((putty_radius(-3.0, &p, &stats) - 0.6 * 0.4).abs() < 1e-6);
    }

    #[test]
    fn normalized_mean_maps_to_one() {
        let stats = PuttyStats::of(&B).unwrap();
        let p = params(PuttyTransform::NormalizedLinear);
        assert!((transformed(30.0, &p, &stats).unwrap() - 1.0).abs() < 1e-6);
        assert!((stats.stdev - 200f32.sqrt()).abs() < 1e-4);
    }

    #[test]
    fn zero_spread_falls_back_to_raw_value() {
        let flat = [25.0; 4];
        let stats = PuttyStats::of(&flat).unwrap();
        for t in [
            PuttyTransform::NormalizedNonlinear,
            PuttyTransform::RelativeLinear,
        ] {
            let r = putty_radius(25.0, &params(t), &stats);
            assert!(r.is_finite());
            assert!((r - 25.0 * 0.4).abs() < 1e-5);
        }
        let zero_range = PuttyParams { range: 0.0, ..params(PuttyTransform::ScaledLinear) };
        assert!((putty_radius(25.0, &zero_range, &stats) - 10.0).abs() < 1e-5);
    }

    #[test]
    fn implied_rms() {
        let stats = PuttyStats::of(&B).unwrap();
        let p = params(PuttyTransform::ImpliedRms);
        let expected = (2.0f32).sqrt() / std::f32::consts::PI * 0.4;
        assert!((putty_radius(16.0, &p, &stats) - expected).abs() < 1e-6);
        assert_eq!(PuttyTransform::from_setting(42), PuttyTransform::AbsoluteLinear);
    }
}
