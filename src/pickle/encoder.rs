//! Reference encoder for the same opcode subset.
//!
//! Produces streams the decoder accepts; used to build fixtures and to
//! check round trips. Mapping keys are written in sorted order so output
//! is deterministic.

use byteorder::{BigEndian, LittleEndian, WriteBytesExt};

use super::opcode as op;
use super::value::{Mapping, Value};

/// Encode `root` as a complete stream ending in `STOP`.
#[must_use]
pub fn encode(root: &Mapping) -> Vec<u8> {
    let mut out = vec![op::PROTO, 2];
    write_mapping(&mut out, root);
    out.push(op::STOP);
    out
}

/// Encode a single value without the trailing `STOP`.
pub fn write_value(out: &mut Vec<u8>, value: &Value) {
    match value {
        Value::None => out.push(op::NONE),
        Value::Int(i) => write_int(out, *i),
        Value::Float(f) => {
            out.push(op::BINFLOAT);
            // Writes into a Vec cannot fail.
            let _ = out.write_f64::<BigEndian>(*f);
        }
        Value::Text(s) => write_text(out, s),
        Value::Sequence(items) => {
            out.push(op::EMPTY_LIST);
            if !items.is_empty() {
                out.push(op::MARK);
                for item in items {
                    write_value(out, item);
                }
                out.push(op::APPENDS);
            }
        }
        Value::Mapping(map) => write_mapping(out, map),
        Value::Point3(p) => {
            for c in p.to_array() {
                out.push(op::BINFLOAT);
                let _ = out.write_f64::<BigEndian>(f64::from(c));
            }
            out.push(op::TUPLE3);
        }
    }
}

fn write_int(out: &mut Vec<u8>, i: i32) {
    if let Ok(b) = u8::try_from(i) {
        out.extend([op::BININT1, b]);
    } else if let Ok(w) = u16::try_from(i) {
        out.push(op::BININT2);
        let _ = out.write_u16::<LittleEndian>(w);
    } else {
        out.push(op::BININT);
        let _ = out.write_i32::<LittleEndian>(i);
    }
}

fn write_text(out: &mut Vec<u8>, s: &str) {
    let bytes = s.as_bytes();
    if let Ok(len) = u8::try_from(bytes.len()) {
        out.extend([op::SHORT_BINSTRING, len]);
    } else {
        out.push(op::BINUNICODE);
        let _ = out.write_i32::<LittleEndian>(bytes.len() as i32);
    }
    out.extend_from_slice(bytes);
}

fn write_mapping(out: &mut Vec<u8>, map: &Mapping) {
    out.push(op::EMPTY_DICT);
    if map.is_empty() {
        return;
    }
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();
    out.push(op::MARK);
    for key in keys {
        write_text(out, key);
        write_value(out, &map[key]);
    }
    out.push(op::SETITEMS);
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::pickle::decode_bytes;

    #[test]
    fn round_trip_all_variants() {
        let mut inner = Mapping::default();
        let _ = inner.insert("p".to_owned(), Value::Point3(Vec3::new(1.5, -2.0, 0.25)));
        let _ = inner.insert("empty".to_owned(), Value::Mapping(Mapping::default()));
        let mut root = Mapping::default();
        let _ = root.insert("none".to_owned(), Value::None);
        let _ = root.insert(
            "ints".to_owned(),
            Value::Sequence(vec![
                Value::Int(0),
                Value::Int(255),
                Value::Int(256),
                Value::Int(70_000),
                Value::Int(-1),
            ]),
        );
        let _ = root.insert("f".to_owned(), Value::Float(0.1));
        let _ = root.insert("long".to_owned(), Value::Text("é".repeat(200)));
        let _ = root.insert("empty_seq".to_owned(), Value::Sequence(vec![]));
        let _ = root.insert("inner".to_owned(), Value::Mapping(inner));

        let decoded = decode_bytes(&encode(&root)).unwrap();
        assert_eq!(decoded, root);
    }

    #[test]
    fn output_is_deterministic() {
        let mut root = Mapping::default();
        for k in ["z", "a", "m"] {
            let _ = root.insert(k.to_owned(), Value::Int(1));
        }
        assert_eq!(encode(&root), encode(&root.clone()));
    }
}
