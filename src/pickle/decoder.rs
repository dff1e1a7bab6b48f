//! Opcode-driven stack machine.
//!
//! Each call to [`decode`] owns a fresh [`DecodeContext`]: an operand stack
//! and a mark stack recording operand depths. Marks delimit the
//! variable-length runs that `APPENDS`, `SETITEMS`, `LIST`, `DICT`, `TUPLE`
//! and `OBJ` fold into containers. Pops never cross below the innermost
//! mark, so mark depth never exceeds operand depth.

use std::io;

use glam::Vec3;

use super::opcode as op;
use super::source::ByteSource;
use super::value::{Mapping, Value};
use crate::error::{StreamErrorKind, StreamFormatError};

/// Run the opcode stream in `source` to completion and return the root
/// mapping.
pub fn decode<S: ByteSource>(source: S) -> Result<Mapping, StreamFormatError> {
    DecodeContext::new(source).run()
}

/// Convenience wrapper over an in-memory document.
pub fn decode_bytes(bytes: &[u8]) -> Result<Mapping, StreamFormatError> {
    decode(super::source::SliceSource::new(bytes))
}

struct DecodeContext<S> {
    source: S,
    stack: Vec<Value>,
    marks: Vec<usize>,
    /// Offset and byte of the opcode being executed.
    offset: usize,
    opcode: Option<u8>,
}

impl<S: ByteSource> DecodeContext<S> {
    fn new(source: S) -> Self {
        Self {
            source,
            stack: Vec::new(),
            marks: Vec::new(),
            offset: 0,
            opcode: None,
        }
    }

    fn fail(&self, kind: StreamErrorKind) -> StreamFormatError {
        StreamFormatError {
            offset: self.offset,
            opcode: self.opcode,
            kind,
        }
    }

    fn io(&self, e: &io::Error) -> StreamFormatError {
        match e.kind() {
            io::ErrorKind::InvalidData => {
                self.fail(StreamErrorKind::InvalidText)
            }
            _ => self.fail(StreamErrorKind::UnexpectedEof),
        }
    }

    fn run(mut self) -> Result<Mapping, StreamFormatError> {
        loop {
            self.offset = self.source.position();
            self.opcode = None;
            let code = self.source.read_byte().map_err(|e| self.io(&e))?;
            self.opcode = Some(code);
            if code == op::STOP {
                return self.finish();
            }
            self.step(code)?;
        }
    }

    fn step(&mut self, code: u8) -> Result<(), StreamFormatError> {
        match code {
            op::PROTO => {
                let _version = self.byte()?;
            }
            op::MARK => self.marks.push(self.stack.len()),
            op::NONE => self.stack.push(Value::None),
            op::NEWTRUE => self.stack.push(Value::Int(1)),
            op::NEWFALSE => self.stack.push(Value::Int(0)),
            op::BININT => {
                let v = self.int32()?;
                self.stack.push(Value::Int(v));
            }
            op::BININT1 => {
                let v = self.byte()?;
                self.stack.push(Value::Int(i32::from(v)));
            }
            op::BININT2 => {
                let v = self
                    .source
                    .read_u16_le()
                    .map_err(|e| self.io(&e))?;
                self.stack.push(Value::Int(i32::from(v)));
            }
            op::BINFLOAT => {
                let v = self
                    .source
                    .read_f64_be()
                    .map_err(|e| self.io(&e))?;
                self.stack.push(Value::Float(v));
            }
            op::SHORT_BINSTRING => {
                let len = usize::from(self.byte()?);
                let text = self.lossy_text(len)?;
                self.stack.push(Value::Text(text));
            }
            op::BINSTRING => {
                let len = self.length()?;
                let text = self.lossy_text(len)?;
                self.stack.push(Value::Text(text));
            }
            op::BINUNICODE => {
                let len = self.length()?;
                let bytes = self
                    .source
                    .read_bytes(len)
                    .map_err(|e| self.io(&e))?;
                let text = String::from_utf8(bytes)
                    .map_err(|_| self.fail(StreamErrorKind::InvalidText))?;
                self.stack.push(Value::Text(text));
            }
            _ => self.step_structure(code)?,
        }
        Ok(())
    }

    /// Containers, globals and memo bookkeeping.
    fn step_structure(&mut self, code: u8) -> Result<(), StreamFormatError> {
        match code {
            op::EMPTY_LIST | op::EMPTY_TUPLE => {
                self.stack.push(Value::Sequence(Vec::new()));
            }
            op::EMPTY_DICT => self.stack.push(Value::Mapping(Mapping::default())),
            op::LIST | op::TUPLE | op::OBJ => {
                let items = self.pop_mark()?;
                self.stack.push(Value::Sequence(items));
            }
            op::DICT => {
                let items = self.pop_mark()?;
                let mut map = Mapping::default();
                self.insert_pairs(&mut map, items)?;
                self.stack.push(Value::Mapping(map));
            }
            op::TUPLE1 | op::TUPLE2 => {
                let n = if code == op::TUPLE1 { 1 } else { 2 };
                let items = self.pop_n(n)?;
                self.stack.push(Value::Sequence(items));
            }
            op::TUPLE3 => {
                let items = self.pop_n(3)?;
                self.stack.push(tuple3(items));
            }
            op::APPEND => {
                let item = self.pop()?;
                self.top_sequence()?.push(item);
            }
            op::APPENDS => {
                let items = self.pop_mark()?;
                self.top_sequence()?.extend(items);
            }
            op::SETITEM => {
                let value = self.pop()?;
                let key = self.pop()?;
                let key = self.key(key)?;
                let _ = self.top_mapping()?.insert(key, value);
            }
            op::SETITEMS => {
                let items = self.pop_mark()?;
                let mut pairs = Mapping::default();
                self.insert_pairs(&mut pairs, items)?;
                self.top_mapping()?.extend(pairs);
            }
            op::GLOBAL => {
                let module = self.line()?;
                let name = self.line()?;
                self.stack.push(Value::Sequence(vec![
                    Value::Text("global".to_owned()),
                    Value::Text(module),
                    Value::Text(name),
                ]));
            }
            op::BUILD => {
                let _state = self.pop()?;
            }
            op::BINPUT => {
                let _index = self.byte()?;
            }
            op::LONG_BINPUT => {
                let _index = self.int32()?;
            }
            op::BINGET | op::LONG_BINGET => {
                // Memo fetches only ever re-reference objects the session
                // walker ignores; a placeholder keeps the stack shape.
                if code == op::BINGET {
                    let _index = self.byte()?;
                } else {
                    let _index = self.int32()?;
                }
                self.stack.push(Value::None);
            }
            _ => return Err(self.fail(StreamErrorKind::UnknownOpcode)),
        }
        Ok(())
    }

    fn finish(mut self) -> Result<Mapping, StreamFormatError> {
        if self.stack.len() == 1 && self.marks.is_empty() {
            if let Some(Value::Mapping(map)) = self.stack.pop() {
                return Ok(map);
            }
            return Err(self.fail(StreamErrorKind::BadTermination));
        }
        self.fold_unterminated()
    }

    /// Some producers drop the final `SETITEMS` of the outermost mapping,
    /// leaving its key/value run (and possibly its mark) on the stack.
    fn fold_unterminated(mut self) -> Result<Mapping, StreamFormatError> {
        if self.marks.len() > 1 {
            return Err(self.fail(StreamErrorKind::BadTermination));
        }
        let (mut map, run) = match self.stack.first() {
            Some(Value::Mapping(_)) => {
                let run = self.stack.split_off(1);
                match self.stack.pop() {
                    Some(Value::Mapping(m)) => (m, run),
                    _ => return Err(self.fail(StreamErrorKind::BadTermination)),
                }
            }
            _ => (Mapping::default(), std::mem::take(&mut self.stack)),
        };
        if run.is_empty() || run.len() % 2 != 0 {
            return Err(self.fail(StreamErrorKind::BadTermination));
        }
        log::debug!(
            "folding {} unterminated key/value pairs into the root mapping",
            run.len() / 2
        );
        self.insert_pairs(&mut map, run)?;
        self.marks.clear();
        Ok(map)
    }

    fn insert_pairs(
        &self,
        map: &mut Mapping,
        items: Vec<Value>,
    ) -> Result<(), StreamFormatError> {
        if items.len() % 2 != 0 {
            return Err(self.fail(StreamErrorKind::TypeMismatch(
                "key/value pairs",
            )));
        }
        let mut it = items.into_iter();
        while let (Some(k), Some(v)) = (it.next(), it.next()) {
            let key = self.key(k)?;
            let _ = map.insert(key, v);
        }
        Ok(())
    }

    fn key(&self, key: Value) -> Result<String, StreamFormatError> {
        match key {
            Value::Text(s) => Ok(s),
            Value::Int(i) => Ok(i.to_string()),
            _ => Err(self.fail(StreamErrorKind::TypeMismatch("text key"))),
        }
    }

    fn floor(&self) -> usize {
        self.marks.last().copied().unwrap_or(0)
    }

    fn pop(&mut self) -> Result<Value, StreamFormatError> {
        if self.stack.len() <= self.floor() {
            return Err(self.fail(StreamErrorKind::StackUnderflow));
        }
        self.stack
            .pop()
            .ok_or_else(|| self.fail(StreamErrorKind::StackUnderflow))
    }

    fn pop_n(&mut self, n: usize) -> Result<Vec<Value>, StreamFormatError> {
        if self.stack.len() < self.floor() + n {
            return Err(self.fail(StreamErrorKind::StackUnderflow));
        }
        let at = self.stack.len() - n;
        Ok(self.stack.split_off(at))
    }

    fn pop_mark(&mut self) -> Result<Vec<Value>, StreamFormatError> {
        let depth = self
            .marks
            .pop()
            .ok_or_else(|| self.fail(StreamErrorKind::MarkUnderflow))?;
        Ok(self.stack.split_off(depth))
    }

    fn top_sequence(&mut self) -> Result<&mut Vec<Value>, StreamFormatError> {
        let err = self.fail(StreamErrorKind::TypeMismatch("sequence"));
        let floor = self.floor();
        if self.stack.len() <= floor {
            return Err(self.fail(StreamErrorKind::StackUnderflow));
        }
        match self.stack.last_mut() {
            Some(Value::Sequence(items)) => Ok(items),
            _ => Err(err),
        }
    }

    fn top_mapping(&mut self) -> Result<&mut Mapping, StreamFormatError> {
        let err = self.fail(StreamErrorKind::TypeMismatch("mapping"));
        let floor = self.floor();
        if self.stack.len() <= floor {
            return Err(self.fail(StreamErrorKind::StackUnderflow));
        }
        match self.stack.last_mut() {
            Some(Value::Mapping(map)) => Ok(map),
            _ => Err(err),
        }
    }

    fn byte(&mut self) -> Result<u8, StreamFormatError> {
        self.source.read_byte().map_err(|e| self.io(&e))
    }

    fn int32(&mut self) -> Result<i32, StreamFormatError> {
        self.source.read_i32_le().map_err(|e| self.io(&e))
    }

    fn length(&mut self) -> Result<usize, StreamFormatError> {
        let len = self.int32()?;
        usize::try_from(len)
            .map_err(|_| self.fail(StreamErrorKind::InvalidLength))
    }

    fn lossy_text(&mut self, len: usize) -> Result<String, StreamFormatError> {
        let bytes = self.source.read_bytes(len).map_err(|e| self.io(&e))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn line(&mut self) -> Result<String, StreamFormatError> {
        let bytes = self.source.read_line().map_err(|e| self.io(&e))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

fn tuple3(items: Vec<Value>) -> Value {
    let coords: Option<Vec<f64>> = items.iter().map(Value::as_float).collect();
    match coords.as_deref() {
        Some(&[x, y, z]) => Value::Point3(Vec3::new(x as f32, y as f32, z as f32)),
        _ => Value::Sequence(items),
    }
}
