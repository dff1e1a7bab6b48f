//! Generic object graph produced by the deserializer.

use glam::Vec3;
use rustc_hash::FxHashMap;

/// String-keyed mapping. Key order carries no meaning.
pub type Mapping = FxHashMap<String, Value>;

/// One node of the decoded object graph.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value.
    None,
    /// Integer (the wire format carries at most 32 bits).
    Int(i32),
    /// Double-precision float.
    Float(f64),
    /// Text.
    Text(String),
    /// Ordered list or tuple.
    Sequence(Vec<Value>),
    /// Dictionary.
    Mapping(Mapping),
    /// Three-float tuple, built directly by the decoder.
    Point3(Vec3),
}

impl Value {
    /// Short name of the variant, for error messages.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Sequence(_) => "sequence",
            Self::Mapping(_) => "mapping",
            Self::Point3(_) => "point3",
        }
    }

    /// Integer value; floats are truncated.
    #[must_use]
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Float(f) if f.is_finite() => Some(*f as i32),
            _ => None,
        }
    }

    /// Float value; ints are widened.
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(f64::from(*i)),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Borrowed text.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Borrowed sequence items.
    #[must_use]
    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Self::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Borrowed mapping.
    #[must_use]
    pub fn as_map(&self) -> Option<&Mapping> {
        match self {
            Self::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// A 3-vector from either a `Point3` or a numeric 3-sequence.
    #[must_use]
    pub fn as_point(&self) -> Option<Vec3> {
        match self {
            Self::Point3(p) => Some(*p),
            Self::Sequence(items) if items.len() == 3 => {
                let x = items[0].as_float()?;
                let y = items[1].as_float()?;
                let z = items[2].as_float()?;
                Some(Vec3::new(x as f32, y as f32, z as f32))
            }
            _ => None,
        }
    }

    /// Whether this is a sequence.
    #[must_use]
    pub fn is_seq(&self) -> bool {
        matches!(self, Self::Sequence(_))
    }

    /// Item `i` of a sequence.
    #[must_use]
    pub fn at(&self, i: usize) -> Option<&Value> {
        self.as_seq().and_then(|items| items.get(i))
    }

    /// Integer item `i` of a sequence.
    #[must_use]
    pub fn int_at(&self, i: usize) -> Option<i32> {
        self.at(i).and_then(Value::as_int)
    }

    /// Float item `i` of a sequence.
    #[must_use]
    pub fn float_at(&self, i: usize) -> Option<f64> {
        self.at(i).and_then(Value::as_float)
    }

    /// Text item `i` of a sequence.
    #[must_use]
    pub fn text_at(&self, i: usize) -> Option<&str> {
        self.at(i).and_then(Value::as_text)
    }

    /// Sequence item `i` of a sequence.
    #[must_use]
    pub fn seq_at(&self, i: usize) -> Option<&[Value]> {
        self.at(i).and_then(Value::as_seq)
    }

    /// Flatten a numeric sequence into `f32`s. Non-numeric items yield
    /// `None`.
    #[must_use]
    pub fn floats(&self) -> Option<Vec<f32>> {
        self.as_seq()?
            .iter()
            .map(|v| v.as_float().map(|f| f as f32))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_coercions() {
        assert_eq!(Value::Int(3).as_float(), Some(3.0));
        assert_eq!(Value::Float(2.9).as_int(), Some(2));
        assert_eq!(Value::Text("a".to_owned()).as_int(), None);
        assert_eq!(Value::Float(f64::NAN).as_int(), None);
    }

    #[test]
    fn sequence_accessors() {
        let v = Value::Sequence(vec![
            Value::Int(1),
            Value::Text("x".to_owned()),
            Value::Sequence(vec![
                Value::Float(1.0),
                Value::Int(2),
                Value::Float(3.0),
            ]),
        ]);
        assert_eq!(v.int_at(0), Some(1));
        assert_eq!(v.text_at(1), Some("x"));
        assert_eq!(v.at(2).and_then(Value::as_point), Some(Vec3::new(1.0, 2.0, 3.0)));
        assert_eq!(v.at(2).and_then(Value::floats), Some(vec![1.0, 2.0, 3.0]));
        assert!(v.at(9).is_none());
        assert!(v.floats().is_none());
    }
}
