//! Byte source feeding the deserializer.

use std::io::{self, Read};

use byteorder::{BigEndian, LittleEndian, ReadBytesExt};

/// Sequential reads of the primitive encodings the opcode stream uses.
///
/// All reads fail with [`io::ErrorKind::UnexpectedEof`] when the document
/// ends early.
pub trait ByteSource {
    /// Bytes consumed so far.
    fn position(&self) -> usize;
    /// One unsigned byte.
    fn read_byte(&mut self) -> io::Result<u8>;
    /// 2-byte little-endian unsigned int.
    fn read_u16_le(&mut self) -> io::Result<u16>;
    /// 4-byte little-endian signed int.
    fn read_i32_le(&mut self) -> io::Result<i32>;
    /// 8-byte big-endian IEEE-754 double.
    fn read_f64_be(&mut self) -> io::Result<f64>;
    /// Exactly `len` raw bytes.
    fn read_bytes(&mut self, len: usize) -> io::Result<Vec<u8>>;

    /// Bytes up to (not including) the next `\n`, which is consumed.
    fn read_line(&mut self) -> io::Result<Vec<u8>> {
        let mut line = Vec::new();
        loop {
            match self.read_byte()? {
                b'\n' => return Ok(line),
                b => line.push(b),
            }
        }
    }
}

/// [`ByteSource`] over any [`Read`], counting consumed bytes.
#[derive(Debug)]
pub struct ReadSource<R> {
    reader: R,
    position: usize,
}

/// [`ByteSource`] over an in-memory document.
pub type SliceSource<'a> = ReadSource<&'a [u8]>;

impl<R: Read> ReadSource<R> {
    /// Wrap a reader.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            position: 0,
        }
    }
}

impl<R: Read> ByteSource for ReadSource<R> {
    fn position(&self) -> usize {
        self.position
    }

    fn read_byte(&mut self) -> io::Result<u8> {
        let b = self.reader.read_u8()?;
        self.position += 1;
        Ok(b)
    }

    fn read_u16_le(&mut self) -> io::Result<u16> {
        let v = self.reader.read_u16::<LittleEndian>()?;
        self.position += 2;
        Ok(v)
    }

    fn read_i32_le(&mut self) -> io::Result<i32> {
        let v = self.reader.read_i32::<LittleEndian>()?;
        self.position += 4;
        Ok(v)
    }

    fn read_f64_be(&mut self) -> io::Result<f64> {
        let v = self.reader.read_f64::<BigEndian>()?;
        self.position += 8;
        Ok(v)
    }

    fn read_bytes(&mut self, len: usize) -> io::Result<Vec<u8>> {
        // Length prefixes are untrusted; grow with the data actually read.
        let mut buf = Vec::new();
        let _ = (&mut self.reader).take(len as u64).read_to_end(&mut buf)?;
        self.position += buf.len();
        if buf.len() < len {
            return Err(io::Error::from(io::ErrorKind::UnexpectedEof));
        }
        Ok(buf)
    }
}
