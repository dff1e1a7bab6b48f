//! Camera reconstruction from the saved view vector, plus the
//! session-wide render settings.

use glam::{Mat3, Vec2, Vec3};

use crate::error::GeometryReconstructionError;
use crate::session::colors::argb_from_rgb;
use crate::session::setting_id as id;
use crate::session::SettingsScope;

/// Length of the normalized view vector.
pub const VIEW_LEN: usize = 18;

/// Saved camera mapped onto a consumer camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewParams {
    /// Model rotation.
    pub rotation: Mat3,
    /// Pan in angstroms, Y pointing up.
    pub translation: Vec2,
    /// Rotation center.
    pub center: Vec3,
    /// Camera to center distance.
    pub distance: f32,
    /// Consumer camera depth in screen widths.
    pub camera_depth: f32,
    /// Zoom for a scene one unit wide.
    pub zoom_percent: f32,
    /// Front clip offset in front of the center.
    pub slab: f32,
    /// Back clip offset behind the center.
    pub depth: f32,
    /// Field of view stored with the view, degrees.
    pub source_fov: f32,
    /// Orthographic projection.
    pub orthographic: bool,
}

/// Narrowest and widest field of view, degrees, the camera accepts.
const FOV_LIMITS: (f32, f32) = (1.0, 170.0);
const FALLBACK_FOV: f32 = 20.0;

/// `target_fov` made usable: finite, positive and within [`FOV_LIMITS`].
fn usable_fov(target_fov: f32) -> f32 {
    if target_fov.is_finite() {
        target_fov.abs().clamp(FOV_LIMITS.0, FOV_LIMITS.1)
    } else {
        FALLBACK_FOV
    }
}

fn camera_depth(aspect_ratio: f32, target_fov: f32) -> f32 {
    let mut fov = usable_fov(target_fov);
    if aspect_ratio > 0.0 && aspect_ratio < 1.0 {
        fov = (fov * aspect_ratio).max(FOV_LIMITS.0);
    }
    0.5 / (fov.to_radians() / 2.0).tan() - 0.5
}

impl ViewParams {
    /// Identity view used when the saved one cannot be used.
    #[must_use]
    pub fn neutral(aspect_ratio: f32, target_fov: f32) -> Self {
        let camera_depth = camera_depth(aspect_ratio, target_fov);
        Self {
            rotation: Mat3::IDENTITY,
            translation: Vec2::ZERO,
            center: Vec3::ZERO,
            distance: 1.0,
            camera_depth,
            zoom_percent: 100.0 * (camera_depth + 0.5),
            slab: 0.0,
            depth: 0.0,
            source_fov: usable_fov(target_fov),
            orthographic: false,
        }
    }

    /// Zoom for a scene `width` units wide.
    #[must_use]
    pub fn zoom_for_width(&self, width: f32) -> f32 {
        self.zoom_percent * width
    }
}

/// Map a stored view onto the normalized 18-value layout: 9 rotation
/// values, x/y pan, negated distance, center, front, back, and the field
/// of view, negative for orthographic projection.
///
/// Stored views carry a 4x4 rotation; the padding column is dropped. A
/// vector that is already normalized is returned unchanged.
#[must_use]
pub fn normalize_view(stored: &[f32], fov: f32, orthographic: bool) -> Vec<f32> {
    if stored.len() < 24 {
        return stored.to_vec();
    }
    let mut v = Vec::with_capacity(VIEW_LEN);
    v.extend_from_slice(&stored[0..3]);
    v.extend_from_slice(&stored[4..7]);
    v.extend_from_slice(&stored[8..11]);
    v.extend_from_slice(&stored[16..24]);
    v.push(if orthographic { -fov.abs() } else { fov.abs() });
    v
}

/// Rebuild the camera from a normalized view vector.
pub fn reconstruct(
    view: &[f32],
    aspect_ratio: f32,
    target_fov: f32,
) -> Result<ViewParams, GeometryReconstructionError> {
    if view.len() < VIEW_LEN {
        return Err(GeometryReconstructionError::TooShort(view.len()));
    }
    let view = &view[..VIEW_LEN];
    if view.iter().any(|f| !f.is_finite()) {
        return Err(GeometryReconstructionError::NonFinite);
    }
    let x_axis = Vec3::from_slice(&view[0..3]);
    let y_axis = Vec3::from_slice(&view[3..6]);
    let z_axis = x_axis.cross(y_axis);
    if z_axis.length_squared() < 1e-8 {
        return Err(GeometryReconstructionError::DegenerateRotation);
    }
    let distance = -view[11];
    if distance <= 0.0 {
        return Err(GeometryReconstructionError::NonPositiveDistance(distance));
    }
    let camera_depth = camera_depth(aspect_ratio, target_fov);
    Ok(ViewParams {
        rotation: Mat3::from_cols(
            x_axis.normalize(),
            y_axis.normalize(),
            z_axis.normalize(),
        )
        .transpose(),
        translation: Vec2::new(view[9], -view[10]),
        center: Vec3::from_slice(&view[12..15]),
        distance,
        camera_depth,
        zoom_percent: 100.0 * (camera_depth + 0.5) / distance,
        slab: distance - view[15],
        depth: view[16] - distance,
        source_fov: view[17].abs(),
        orthographic: view[17] < 0.0,
    })
}

/// [`reconstruct`], falling back to the neutral view with a warning.
#[must_use]
pub fn reconstruct_or_neutral(view: &[f32], aspect_ratio: f32, target_fov: f32) -> ViewParams {
    reconstruct(view, aspect_ratio, target_fov).unwrap_or_else(|e| {
        log::warn!("saved view unusable ({e}), using neutral view");
        ViewParams::neutral(aspect_ratio, target_fov)
    })
}

/// Session-wide display settings.
#[derive(Debug, Clone, Copy, PartialEq)]
#[allow(clippy::struct_excessive_bools)]
pub struct RenderSettings {
    /// Background color.
    pub background: u32,
    /// Perspective projection.
    pub perspective: bool,
    /// Depth shading on.
    pub depth_shading: bool,
    /// Where depth shading starts, 0..1 of the slab.
    pub fog_start: f32,
    /// Helices drawn as cylinders.
    pub cylindrical_helices: bool,
    /// Helix ends rounded.
    pub round_helices: bool,
    /// Helix edges outlined.
    pub fancy_helices: bool,
    /// Animation loops (movie mode).
    pub loop_animation: bool,
}

impl RenderSettings {
    /// Read from the global settings.
    #[must_use]
    pub fn from_scope(scope: SettingsScope<'_>, movie_mode: bool) -> Self {
        Self {
            background: argb_from_rgb(scope.point(id::BG_RGB)),
            perspective: !scope.bool(id::ORTHOSCOPIC),
            depth_shading: scope.bool(id::DEPTH_CUE) && scope.bool(id::FOG),
            fog_start: scope.float(id::FOG_START),
            cylindrical_helices: scope.bool(id::CARTOON_CYLINDRICAL_HELICES),
            round_helices: scope.bool(id::CARTOON_ROUND_HELICES),
            fancy_helices: scope.bool(id::CARTOON_FANCY_HELICES),
            loop_animation: movie_mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::settings::{SettingValue, SettingsTable, UniqueSettings};

    fn view(distance: f32, fov: f32) -> Vec<f32> {
        let mut v = vec![0.0; VIEW_LEN];
        v[0] = 1.0;
        v[4] = 1.0;
        v[8] = 1.0;
        v[9] = 2.0;
        v[10] = 3.0;
        v[11] = -distance;
        v[12..15].copy_from_slice(&[1.0, 2.0, 3.0]);
        v[15] = distance - 10.0;
        v[16] = distance + 20.0;
        v[17] = fov;
        v
    }

    #[test]
    fn rebuilds_camera() {
        let p = reconstruct(&view(50.0, 20.0), 1.0, 20.0).unwrap();
        assert_eq!(p.rotation, Mat3::IDENTITY);
        assert_eq!(p.translation, Vec2::new(2.0, -3.0));
        assert_eq!(p.center, Vec3::new(1.0, 2.0, 3.0));
        assert!((p.slab - 10.0).abs() < 1e-5);
        assert!((p.depth - 20.0).abs() < 1e-5);
        assert!(!p.orthographic);
        let depth = 0.5 / (10f32.to_radians()).tan() - 0.5;
        assert!((p.camera_depth - depth).abs() < 1e-5);
        assert!((p.zoom_percent - 100.0 * (depth + 0.5) / 50.0).abs() < 1e-4);
        assert!((p.zoom_for_width(4.0) - 4.0 * p.zoom_percent).abs() < 1e-4);
    }

    #[test]
    fn negative_fov_is_orthographic_and_third_row_is_derived() {
        let mut v = view(30.0, -15.0);
        // Third row is ignored.
        v[6..9].copy_from_slice(&[9.0, 9.0, 9.0]);
        let p = reconstruct(&v, 1.0, 20.0).unwrap();
        assert!(p.orthographic);
        assert_eq!(p.source_fov, 15.0);
        assert_eq!(p.rotation.row(2), Vec3::Z);
    }

    #[test]
    fn narrow_viewport_narrows_fov() {
        let wide = reconstruct(&view(50.0, 20.0), 1.5, 20.0).unwrap();
        let tall = reconstruct(&view(50.0, 20.0), 0.5, 20.0).unwrap();
        assert!(tall.camera_depth > wide.camera_depth);
    }

    #[test]
    fn degenerate_views_fail() {
        assert_eq!(
            reconstruct(&[0.0; 5], 1.0, 20.0),
            Err(GeometryReconstructionError::TooShort(5))
        );
        assert_eq!(
            reconstruct(&view(0.0, 20.0), 1.0, 20.0),
            Err(GeometryReconstructionError::NonPositiveDistance(-0.0))
        );
        let mut v = view(10.0, 20.0);
        v[2] = f32::NAN;
        assert_eq!(reconstruct(&v, 1.0, 20.0), Err(GeometryReconstructionError::NonFinite));
        let mut v = view(10.0, 20.0);
        v[3..6].copy_from_slice(&[2.0, 0.0, 0.0]);
        assert_eq!(
            reconstruct(&v, 1.0, 20.0),
            Err(GeometryReconstructionError::DegenerateRotation)
        );
        let neutral = reconstruct_or_neutral(&[], 1.0, 20.0);
        assert_eq!(neutral, ViewParams::neutral(1.0, 20.0));
    }

    #[test]
    fn unusable_target_fov_keeps_camera_finite() {
        for fov in [0.0, -0.0, f32::NAN, f32::INFINITY, 1e-30] {
            for aspect in [1.0, 0.0, -2.0, 1e-9] {
                let neutral = ViewParams::neutral(aspect, fov);
                assert!(neutral.camera_depth.is_finite(), "fov {fov} aspect {aspect}");
                assert!(neutral.zoom_percent.is_finite());
                assert!(neutral.source_fov.is_finite());
                let p = reconstruct(&view(50.0, 20.0), aspect, fov).unwrap();
                assert!(p.camera_depth.is_finite() && p.camera_depth > 0.0);
                assert!(p.zoom_percent.is_finite());
            }
        }
        // In-range values are untouched.
        assert_eq!(ViewParams::neutral(1.0, 35.0).source_fov, 35.0);
    }

    #[test]
    fn stored_layout_is_normalized() {
        let stored: Vec<f32> = (0..25).map(|i| i as f32).collect();
        let v = normalize_view(&stored, 20.0, true);
        assert_eq!(v.len(), VIEW_LEN);
        assert_eq!(&v[0..6], &[0.0, 1.0, 2.0, 4.0, 5.0, 6.0]);
        assert_eq!(&v[9..17], &[16.0, 17.0, 18.0, 19.0, 20.0, 21.0, 22.0, 23.0]);
        assert_eq!(v[17], -20.0);
        assert_eq!(normalize_view(&v, 20.0, false), v);
    }

    #[test]
    fn render_settings_from_globals() {
        let mut global = SettingsTable::default();
        global.insert(id::BG_RGB, SettingValue::Float3(Vec3::ONE));
        global.insert(id::ORTHOSCOPIC, SettingValue::Bool(true));
        let unique = UniqueSettings::default();
        let scope = SettingsScope {
            global: &global,
            branch: None,
            unique: &unique,
            version: 1760,
        };
        let r = RenderSettings::from_scope(scope, true);
        assert_eq!(r.background, 0xffff_ffff);
        assert!(!r.perspective);
        assert!(r.depth_shading);
        assert!(r.loop_animation);
    }
}
