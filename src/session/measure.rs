//! Measurement branches: distances, angles and torsions.

use glam::Vec3;

use super::atoms::{Rep, RepMask};
use super::settings::SettingsScope;
use super::setting_id as id;
use crate::error::BranchDecodeError;
use crate::pickle::Value;

/// What a point group measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeasureKind {
    /// Two points.
    Distance,
    /// Three points.
    Angle,
    /// Four points.
    Torsion,
}

impl MeasureKind {
    /// Number of points per measurement.
    #[must_use]
    pub fn points(self) -> usize {
        match self {
            Self::Distance => 2,
            Self::Angle => 3,
            Self::Torsion => 4,
        }
    }

    fn digits_setting(self) -> u32 {
        match self {
            Self::Distance => id::LABEL_DISTANCE_DIGITS,
            Self::Angle => id::LABEL_ANGLE_DIGITS,
            Self::Torsion => id::LABEL_DIHEDRAL_DIGITS,
        }
    }
}

/// One measurement with its display attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    /// Distance, angle or torsion.
    pub kind: MeasureKind,
    /// Absolute point coordinates.
    pub points: Vec<Vec3>,
    /// Label format: `"<n>: %0.<digits>VALUE"`, value part omitted when
    /// labels are off.
    pub format: String,
    /// Label offset block `[mode, dx, dy, dz, ...]`.
    pub label_offset: [f32; 7],
    /// Dash palette color.
    pub color: i32,
    /// Label palette color.
    pub label_color: i32,
    /// Dash radius; a tiny negative radius hides the dashes.
    pub dash_radius: f32,
    /// Label font id.
    pub font_id: i32,
    /// Label font size.
    pub font_size: f32,
}

/// Radius that keeps a measurement but draws no dashes.
pub const HIDDEN_DASH_RADIUS: f32 = -0.0005;

/// Decode the point groups of a measurement branch.
///
/// `data[2]` holds measure sets; within a set the coordinate list sits at
/// position 1, 4 or 6 for two, three or four points, and label offsets at
/// position 8.
pub fn decode_measurements(
    name: &str,
    data: &Value,
    reps: RepMask,
    color: i32,
    scope: SettingsScope<'_>,
) -> Result<Vec<Measurement>, BranchDecodeError> {
    let sets = data
        .seq_at(2)
        .ok_or_else(|| BranchDecodeError::new(name, "missing measure list"))?;
    let draw_label = reps.has(Rep::Labels);
    let draw_dashes = reps.has(Rep::Dashes);
    let mut radius = scope.float(id::DASH_WIDTH) / 20.0;
    if radius == 0.0 {
        radius = 0.05;
    }
    if !draw_dashes {
        radius = HIDDEN_DASH_RADIUS;
    }
    let color = if color < 0 { scope.int(id::DASH_COLOR) } else { color };
    let label_color = match scope.int(id::LABEL_COLOR) {
        c if c < 0 => color,
        c => c,
    };
    let base_offset = scope.point(id::LABEL_POSITION);

    let mut out = Vec::new();
    for set in sets {
        let Some((kind, coords)) = [
            (MeasureKind::Distance, 1),
            (MeasureKind::Angle, 4),
            (MeasureKind::Torsion, 6),
        ]
        .into_iter()
        .find_map(|(kind, at)| set.seq_at(at).map(|c| (kind, c))) else {
            return Err(BranchDecodeError::new(name, "measure set has no coordinates"));
        };
        let n = kind.points();
        if coords.len() % (3 * n) != 0 {
            return Err(BranchDecodeError::new(
                name,
                format!("{} coordinates do not split into {n}-point groups", coords.len()),
            ));
        }
        let xyz: Vec<f32> = coords
            .iter()
            .map(|v| v.as_float().map(|f| f as f32))
            .collect::<Option<_>>()
            .ok_or_else(|| BranchDecodeError::new(name, "non-numeric coordinate"))?;
        let offsets = set.seq_at(8);
        let digits = match scope.int(kind.digits_setting()) {
            d if d < 0 => 1,
            d => d,
        };
        let format = if draw_label {
            format!("{n}: %0.{digits}VALUE")
        } else {
            format!("{n}: ")
        };
        for (index, group) in xyz.chunks_exact(3 * n).enumerate() {
            let points = group.chunks_exact(3).map(Vec3::from_slice).collect();
            let label_offset = offsets
                .and_then(|o| o.get(index))
                .and_then(Value::floats)
                .filter(|f| f.len() >= 7)
                .map_or_else(
                    || [1.0, base_offset.x, base_offset.y, base_offset.z, 0.0, 0.0, 0.0],
                    |f| [f[0], f[1], f[2], f[3], f[4], f[5], f[6]],
                );
            out.push(Measurement {
                kind,
                points,
                format: format.clone(),
                label_offset,
                color,
                label_color,
                dash_radius: radius,
                font_id: scope.int(id::LABEL_FONT_ID),
                font_size: scope.float(id::LABEL_SIZE),
            });
        }
    }
    log::info!("{name}: {} measurements", out.len());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::settings::{SettingValue, SettingsTable, UniqueSettings};

    fn floats(v: &[f64]) -> Value {
        Value::Sequence(v.iter().map(|&f| Value::Float(f)).collect())
    }

    fn measure_data(at: usize, coords: &[f64]) -> Value {
        let mut set = vec![Value::None; 9];
        set[at] = floats(coords);
        Value::Sequence(vec![
            Value::None,
            Value::None,
            Value::Sequence(vec![Value::Sequence(set)]),
        ])
    }

    fn decode(data: &Value, reps: RepMask, global: &SettingsTable) -> Vec<Measurement> {
        let unique = UniqueSettings::default();
        let scope = SettingsScope {
            global,
            branch: None,
            unique: &unique,
            version: 1760,
        };
        decode_measurements("d1", data, reps, 3, scope).unwrap()
    }

    #[test]
    fn distance_groups_and_labels() {
        let data = measure_data(1, &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 3.0, 0.0]);
        let mut reps = RepMask::default();
        reps.set(Rep::Labels);
        reps.set(Rep::Dashes);
        let mut global = SettingsTable::default();
        global.insert(id::LABEL_DISTANCE_DIGITS, SettingValue::Int(2));
        let m = decode(&data, reps, &global);
        assert_eq!(m.len(), 2);
        assert_eq!(m[0].kind, MeasureKind::Distance);
        assert_eq!(m[1].points[1], Vec3::new(0.0, 3.0, 0.0));
        assert_eq!(m[0].format, "2: %0.2VALUE");
        assert_eq!(m[0].dash_radius, 2.5 / 20.0);
    }

    #[test]
    fn angle_without_dashes_hides_them() {
        let data = measure_data(4, &[0.0; 9]);
        let m = decode(&data, RepMask::default(), &SettingsTable::default());
        assert_eq!(m[0].kind, MeasureKind::Angle);
        assert_eq!(m[0].dash_radius, HIDDEN_DASH_RADIUS);
        assert_eq!(m[0].format, "3: ");
    }

    #[test]
    fn torsion_with_negative_digits_uses_one() {
        let data = measure_data(6, &[0.0; 12]);
        let mut reps = RepMask::default();
        reps.set(Rep::Labels);
        let m = decode(&data, reps, &SettingsTable::default());
        assert_eq!(m[0].kind, MeasureKind::Torsion);
        assert_eq!(m[0].format, "4: %0.1VALUE");
    }

    #[test]
    fn ragged_coordinates_fail() {
        let data = measure_data(1, &[0.0; 7]);
        let unique = UniqueSettings::default();
        let global = SettingsTable::default();
        let scope = SettingsScope {
            global: &global,
            branch: None,
            unique: &unique,
            version: 1760,
        };
        assert!(decode_measurements("d", &data, RepMask::default(), 3, scope).is_err());
    }
}
