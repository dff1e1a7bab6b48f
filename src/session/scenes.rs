//! Named scene snapshots stored with the session.

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;

use super::atoms::RepMask;
use crate::pickle::{Mapping, Value};

/// A named view plus the per-branch display subset it restores.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneSnapshot {
    /// Scene name.
    pub name: String,
    /// Saved view vector (same layout as the session view).
    pub view: Vec<f32>,
    /// Branch name to visibility.
    pub visibility: FxHashMap<String, bool>,
    /// Branch name to representation mask applied to all its atoms.
    pub reps: FxHashMap<String, RepMask>,
    /// Branch name to palette color applied to all its atoms.
    pub colors: FxHashMap<String, i32>,
    /// Zero-based frame.
    pub frame: Option<usize>,
}

fn int_map(v: Option<&Value>) -> impl Iterator<Item = (&String, i32)> {
    v.and_then(Value::as_map)
        .into_iter()
        .flat_map(|m| m.iter())
        .filter_map(|(k, v)| v.as_int().map(|i| (k, i)))
}

impl SceneSnapshot {
    /// Decode one `[view, visibility, reps, colors, frame]` entry.
    #[must_use]
    pub fn from_value(name: &str, entry: &Value) -> Option<Self> {
        let view = entry.at(0).and_then(Value::floats).unwrap_or_default();
        Some(Self {
            name: name.to_owned(),
            view,
            visibility: int_map(entry.at(1))
                .map(|(k, v)| (k.clone(), v != 0))
                .collect(),
            reps: int_map(entry.at(2))
                .map(|(k, v)| (k.clone(), RepMask(v as u32)))
                .collect(),
            colors: int_map(entry.at(3)).map(|(k, v)| (k.clone(), v)).collect(),
            frame: entry
                .int_at(4)
                .and_then(|f| usize::try_from(f).ok()),
        })
        .filter(|_| entry.is_seq())
    }

    /// Encode back into the session layout.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let map = |it: &mut dyn Iterator<Item = (String, i32)>| {
            Value::Mapping(it.map(|(k, v)| (k, Value::Int(v))).collect::<Mapping>())
        };
        Value::Sequence(vec![
            Value::Sequence(self.view.iter().map(|&f| Value::Float(f64::from(f))).collect()),
            map(&mut self.visibility.iter().map(|(k, &v)| (k.clone(), i32::from(v)))),
            map(&mut self.reps.iter().map(|(k, v)| (k.clone(), v.0 as i32))),
            map(&mut self.colors.iter().map(|(k, &v)| (k.clone(), v))),
            self.frame.map_or(Value::None, |f| Value::Int(f as i32)),
        ])
    }
}

/// Decode the session's `scene_dict`, ordered by `scene_order` when
/// present and by name otherwise.
#[must_use]
pub fn decode_scenes(dict: Option<&Value>, order: Option<&Value>) -> Vec<SceneSnapshot> {
    let Some(dict) = dict.and_then(Value::as_map) else {
        return Vec::new();
    };
    let mut seen = BTreeSet::new();
    let mut names: Vec<&str> = order
        .and_then(Value::as_seq)
        .map(|o| {
            o.iter()
                .filter_map(Value::as_text)
                .filter(|n| seen.insert(*n))
                .collect()
        })
        .unwrap_or_default();
    let mut rest: Vec<&str> = dict
        .keys()
        .map(String::as_str)
        .filter(|k| !seen.contains(k))
        .collect();
    rest.sort_unstable();
    names.extend(rest);
    names
        .into_iter()
        .filter_map(|n| {
            let snap = dict.get(n).and_then(|e| SceneSnapshot::from_value(n, e));
            if snap.is_none() {
                log::warn!("skipping malformed scene '{n}'");
            }
            snap
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(name: &str) -> SceneSnapshot {
        let mut s = SceneSnapshot {
            name: name.to_owned(),
            view: vec![1.0; 18],
            frame: Some(2),
            ..SceneSnapshot::default()
        };
        let _ = s.visibility.insert("m1".to_owned(), false);
        let _ = s.reps.insert("m1".to_owned(), RepMask(0b101));
        let _ = s.colors.insert("m1".to_owned(), 4);
        s
    }

    #[test]
    fn entry_round_trips() {
        let s = snapshot("F1");
        assert_eq!(SceneSnapshot::from_value("F1", &s.to_value()), Some(s));
    }

    #[test]
    fn order_list_then_names() {
        let mut dict = Mapping::default();
        for n in ["b", "a", "c"] {
            let _ = dict.insert(n.to_owned(), snapshot(n).to_value());
        }
        let _ = dict.insert("bad".to_owned(), Value::Int(1));
        let order = Value::Sequence(vec![Value::Text("c".to_owned())]);
        let scenes = decode_scenes(Some(&Value::Mapping(dict)), Some(&order));
        let names: Vec<_> = scenes.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }

    #[test]
    fn repeated_order_entries_yield_one_scene() {
        let mut dict = Mapping::default();
        for n in ["a", "b"] {
            let _ = dict.insert(n.to_owned(), snapshot(n).to_value());
        }
        let order = Value::Sequence(
            ["b", "a", "b", "b"]
                .iter()
                .map(|&n| Value::Text(n.to_owned()))
                .collect(),
        );
        let scenes = decode_scenes(Some(&Value::Mapping(dict)), Some(&order));
        let names: Vec<_> = scenes.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }
}
