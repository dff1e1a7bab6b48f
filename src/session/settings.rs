//! Session settings and their resolution chain.
//!
//! A setting value is looked up, in order, in the per-atom unique
//! settings (only where a caller asks for it), the owning branch's
//! overrides, the session's global table, and finally the built-in
//! default for the producer version that wrote the file. A miss is never
//! an error.

use glam::Vec3;
use rustc_hash::FxHashMap;

use super::setting_id as id;
use crate::pickle::Value;

/// Decoded value of one setting.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingValue {
    /// Type tag 1.
    Bool(bool),
    /// Type tag 2.
    Int(i32),
    /// Type tag 3.
    Float(f32),
    /// Type tag 4.
    Float3(Vec3),
    /// Type tag 5: palette index or packed RGB.
    Color(i32),
    /// Type tag 6.
    Text(String),
}

impl SettingValue {
    /// Decode the `(type, value)` pair of a `[id, type, value]` entry.
    /// Unknown type tags are inferred from the value shape.
    fn from_tagged(tag: i32, value: &Value) -> Option<Self> {
        Some(match tag {
            1 => Self::Bool(value.as_float()? != 0.0),
            2 => Self::Int(value.as_int()?),
            3 => Self::Float(value.as_float()? as f32),
            4 => Self::Float3(value.as_point()?),
            5 => match value {
                Value::Sequence(_) | Value::Point3(_) => {
                    Self::Float3(value.as_point()?)
                }
                _ => Self::Color(value.as_int()?),
            },
            6 => Self::Text(value.as_text()?.to_owned()),
            _ => match value {
                Value::Int(i) => Self::Int(*i),
                Value::Float(f) => Self::Float(*f as f32),
                Value::Text(s) => Self::Text(s.clone()),
                _ => Self::Float3(value.as_point()?),
            },
        })
    }

    /// Numeric view; booleans are 0/1, vectors and text are `None`.
    #[must_use]
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Self::Int(i) | Self::Color(i) => Some(*i as f32),
            Self::Float(f) => Some(*f),
            Self::Float3(_) | Self::Text(_) => None,
        }
    }

    /// Vector view.
    #[must_use]
    pub fn as_point(&self) -> Option<Vec3> {
        match self {
            Self::Float3(p) => Some(*p),
            _ => None,
        }
    }
}

/// Setting id to value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsTable {
    entries: FxHashMap<u32, SettingValue>,
}

impl SettingsTable {
    /// Decode a sequence of `[id, type, value]` entries. Entries that are
    /// `None` or malformed are skipped; when an entry lacks its own id the
    /// list position is used.
    #[must_use]
    pub fn from_value(list: &Value) -> Self {
        let mut table = Self::default();
        let Some(items) = list.as_seq() else {
            return table;
        };
        for (pos, entry) in items.iter().enumerate() {
            let Some(fields) = entry.as_seq() else {
                continue;
            };
            let setting = fields
                .first()
                .and_then(Value::as_int)
                .and_then(|i| u32::try_from(i).ok())
                .unwrap_or(pos as u32);
            let tag = entry.int_at(1).unwrap_or(0);
            if let Some(v) =
                fields.get(2).and_then(|v| SettingValue::from_tagged(tag, v))
            {
                let _ = table.entries.insert(setting, v);
            }
        }
        table
    }

    /// Set a value directly.
    pub fn insert(&mut self, setting: u32, value: SettingValue) {
        let _ = self.entries.insert(setting, value);
    }

    /// Value for `setting`, if present.
    #[must_use]
    pub fn get(&self, setting: u32) -> Option<&SettingValue> {
        self.entries.get(&setting)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Per-atom overrides keyed by (unique atom id, setting id).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UniqueSettings {
    entries: FxHashMap<(i32, u32), SettingValue>,
}

impl UniqueSettings {
    /// Decode `[[unique_id, [[id, type, value], ...]], ...]`.
    #[must_use]
    pub fn from_value(list: &Value) -> Self {
        let mut out = Self::default();
        for entry in list.as_seq().unwrap_or_default() {
            let Some(uid) = entry.int_at(0) else {
                continue;
            };
            let Some(settings) = entry.at(1) else {
                continue;
            };
            let table = SettingsTable::from_value(settings);
            for (setting, value) in table.entries {
                let _ = out.entries.insert((uid, setting), value);
            }
        }
        out
    }

    /// Set an override directly.
    pub fn insert(&mut self, unique_id: i32, setting: u32, value: SettingValue) {
        let _ = self.entries.insert((unique_id, setting), value);
    }

    /// Override for one atom, if any. Negative ids never match.
    #[must_use]
    pub fn get(&self, unique_id: i32, setting: u32) -> Option<&SettingValue> {
        if unique_id < 0 {
            return None;
        }
        self.entries.get(&(unique_id, setting))
    }

    /// Number of overrides.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no overrides.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolve `setting` through branch overrides, the global table, and the
/// built-in default for `version`.
#[must_use]
pub fn resolve(
    setting: u32,
    branch: Option<&SettingsTable>,
    global: &SettingsTable,
    version: u32,
) -> SettingValue {
    branch
        .and_then(|t| t.get(setting))
        .or_else(|| global.get(setting))
        .cloned()
        .unwrap_or_else(|| default_setting(setting, version))
}

/// Settings whose default changed between producer releases:
/// `(id, first version, value from that version on, earlier value)`.
const VERSIONED_DEFAULTS: &[(u32, u32, f32, f32)] =
    &[(id::LINE_WIDTH, 1000, 1.49, 1.0)];

/// Built-in default for a setting absent from the session.
#[must_use]
pub fn default_setting(setting: u32, version: u32) -> SettingValue {
    use SettingValue::{Bool, Color, Float, Float3, Int};
    if let Some(&(_, since, new, old)) =
        VERSIONED_DEFAULTS.iter().find(|(s, ..)| *s == setting)
    {
        return Float(if version >= since { new } else { old });
    }
    match setting {
        id::BG_RGB => Float3(Vec3::ZERO),
        id::LABEL_POSITION => Float3(Vec3::new(0.0, 0.0, 1.75)),
        id::SOLVENT_RADIUS => Float(1.4),
        id::RIBBON_SAMPLING | id::STATE | id::FRAME => Int(1),
        id::STICK_RADIUS => Float(0.25),
        id::NONBONDED_SIZE => Float(0.25),
        id::LABEL_COLOR => Color(-6),
        id::SURFACE_COLOR | id::DASH_COLOR => Color(-1),
        id::VALENCE
        | id::DEPTH_CUE
        | id::CARTOON_ROUND_HELICES
        | id::CARTOON_LADDER_MODE => Bool(true),
        id::ORTHOSCOPIC
        | id::ALL_STATES
        | id::CARTOON_FANCY_HELICES
        | id::TWO_SIDED_LIGHTING
        | id::CARTOON_CYLINDRICAL_HELICES => Bool(false),
        id::FOG | id::SPHERE_SCALE => Float(1.0),
        id::LABEL_SIZE => Float(14.0),
        id::CARTOON_LOOP_RADIUS => Float(0.2),
        id::CARTOON_RECT_LENGTH => Float(1.4),
        id::CARTOON_OVAL_LENGTH => Float(1.35),
        id::CARTOON_TUBE_RADIUS => Float(0.5),
        id::RIBBON_WIDTH => Float(3.0),
        id::DASH_WIDTH => Float(2.5),
        id::FIELD_OF_VIEW => Float(20.0),
        id::CARTOON_HELIX_RADIUS => Float(2.25),
        id::FOG_START => Float(0.45),
        id::RAY_PIXEL_SCALE => Float(1.3),
        id::LABEL_FONT_ID => Int(5),
        id::CARTOON_PUTTY_RADIUS => Float(0.4),
        id::CARTOON_PUTTY_RANGE => Float(2.0),
        id::CARTOON_PUTTY_SCALE_MIN => Float(0.6),
        id::CARTOON_PUTTY_SCALE_MAX => Float(4.0),
        id::CARTOON_PUTTY_SCALE_POWER => Float(1.5),
        id::CARTOON_PUTTY_QUALITY => Float(11.0),
        id::LABEL_DISTANCE_DIGITS
        | id::LABEL_ANGLE_DIGITS
        | id::LABEL_DIHEDRAL_DIGITS => Int(-1),
        // Zero for everything else: transparencies, surface mode, radii
        // that default to "derive from another setting", transforms.
        _ => Float(0.0),
    }
}

/// Settings visible from one branch: its overrides over the session's
/// global table, with per-atom unique overrides available on request.
#[derive(Debug, Clone, Copy)]
pub struct SettingsScope<'a> {
    /// Session-wide table.
    pub global: &'a SettingsTable,
    /// Owning branch's overrides, if any.
    pub branch: Option<&'a SettingsTable>,
    /// Per-atom overrides.
    pub unique: &'a UniqueSettings,
    /// Producer version.
    pub version: u32,
}

impl<'a> SettingsScope<'a> {
    /// Scope with the same global/unique tables and different overrides.
    #[must_use]
    pub fn with_branch(self, branch: Option<&'a SettingsTable>) -> Self {
        Self { branch, ..self }
    }

    /// Fully resolved value.
    #[must_use]
    pub fn value(&self, setting: u32) -> SettingValue {
        let v = resolve(setting, self.branch, self.global, self.version);
        log::debug!("setting {setting} resolved to {v:?}");
        v
    }

    /// Numeric value, `0.0` for non-numeric settings.
    #[must_use]
    pub fn float(&self, setting: u32) -> f32 {
        self.value(setting).as_float().unwrap_or(0.0)
    }

    /// Integer value (truncated).
    #[must_use]
    pub fn int(&self, setting: u32) -> i32 {
        self.float(setting) as i32
    }

    /// Boolean value (non-zero).
    #[must_use]
    pub fn bool(&self, setting: u32) -> bool {
        self.float(setting) != 0.0
    }

    /// Vector value, zero when not a vector.
    #[must_use]
    pub fn point(&self, setting: u32) -> Vec3 {
        self.value(setting).as_point().unwrap_or(Vec3::ZERO)
    }

    /// Per-atom numeric override of `setting`, else the scope value.
    #[must_use]
    pub fn unique_float(&self, unique_id: i32, setting: u32) -> f32 {
        self.unique
            .get(unique_id, setting)
            .and_then(SettingValue::as_float)
            .unwrap_or_else(|| self.float(setting))
    }

    /// Per-atom vector override of `setting`, if present.
    #[must_use]
    pub fn unique_point(&self, unique_id: i32, setting: u32) -> Option<Vec3> {
        self.unique
            .get(unique_id, setting)
            .and_then(SettingValue::as_point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(setting: i32, tag: i32, v: Value) -> Value {
        Value::Sequence(vec![Value::Int(setting), Value::Int(tag), v])
    }

    #[test]
    fn decodes_typed_entries() {
        let list = Value::Sequence(vec![
            Value::None,
            entry(id::STICK_RADIUS as i32, 3, Value::Float(0.3)),
            entry(id::VALENCE as i32, 1, Value::Int(0)),
            entry(
                id::BG_RGB as i32,
                4,
                Value::Sequence(vec![
                    Value::Float(1.0),
                    Value::Float(1.0),
                    Value::Float(1.0),
                ]),
            ),
        ]);
        let t = SettingsTable::from_value(&list);
        assert_eq!(t.len(), 3);
        assert_eq!(t.get(id::STICK_RADIUS), Some(&SettingValue::Float(0.3)));
        assert_eq!(t.get(id::VALENCE), Some(&SettingValue::Bool(false)));
        assert_eq!(t.get(id::BG_RGB), Some(&SettingValue::Float3(Vec3::ONE)));
    }

    #[test]
    fn resolution_order() {
        let mut global = SettingsTable::default();
        global.insert(id::STICK_RADIUS, SettingValue::Float(0.3));
        let mut branch = SettingsTable::default();
        branch.insert(id::STICK_RADIUS, SettingValue::Float(0.1));

        assert_eq!(
            resolve(id::STICK_RADIUS, Some(&branch), &global, 1700),
            SettingValue::Float(0.1)
        );
        assert_eq!(
            resolve(id::STICK_RADIUS, None, &global, 1700),
            SettingValue::Float(0.3)
        );
        assert_eq!(
            resolve(id::SPHERE_SCALE, Some(&branch), &global, 1700),
            SettingValue::Float(1.0)
        );
    }

    #[test]
    fn defaults_depend_on_version() {
        assert_eq!(
            default_setting(id::LINE_WIDTH, 1760),
            SettingValue::Float(1.49)
        );
        assert_eq!(default_setting(id::LINE_WIDTH, 990), SettingValue::Float(1.0));
    }

    #[test]
    fn unique_overrides_win_for_their_atom_only() {
        let global = SettingsTable::default();
        let list = Value::Sequence(vec![Value::Sequence(vec![
            Value::Int(7),
            Value::Sequence(vec![entry(
                id::SPHERE_SCALE as i32,
                3,
                Value::Float(0.5),
            )]),
        ])]);
        let unique = UniqueSettings::from_value(&list);
        let scope = SettingsScope {
            global: &global,
            branch: None,
            unique: &unique,
            version: 1700,
        };
        assert_eq!(scope.unique_float(7, id::SPHERE_SCALE), 0.5);
        assert_eq!(scope.unique_float(8, id::SPHERE_SCALE), 1.0);
        assert_eq!(scope.unique_float(-1, id::SPHERE_SCALE), 1.0);
    }
}
