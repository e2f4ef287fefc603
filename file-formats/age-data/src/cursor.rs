//! Fixed-endianness binary reader and writer used by all binary drivers.
//!
//! Most formats are little endian; DLP bodies are big endian, so both types
//! are generic over [`byteorder::ByteOrder`].

use std::marker::PhantomData;

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use glam::{Vec2, Vec3, Vec4};

use crate::error::{DataError, Result};

/// Reader over an in-memory byte slice
#[derive(Debug, Clone)]
pub struct BinaryReader<'a, E: ByteOrder = LittleEndian> {
    data: &'a [u8],
    position: usize,
    _order: PhantomData<E>,
}

pub type LeReader<'a> = BinaryReader<'a, LittleEndian>;
pub type BeReader<'a> = BinaryReader<'a, BigEndian>;

impl<'a, E: ByteOrder> BinaryReader<'a, E> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            position: 0,
            _order: PhantomData,
        }
    }

    /// Continue reading the same data with another byte order
    pub fn with_order<O: ByteOrder>(&self) -> BinaryReader<'a, O> {
        BinaryReader {
            data: self.data,
            position: self.position,
            _order: PhantomData,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Take the next `count` bytes
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        if count > self.remaining() {
            return Err(DataError::Truncated {
                offset: self.position,
                requested: count,
                available: self.remaining(),
            });
        }
        let bytes = &self.data[self.position..self.position + count];
        self.position += count;
        Ok(bytes)
    }

    pub fn skip(&mut self, count: usize) -> Result<()> {
        self.read_bytes(count).map(|_| ())
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(E::read_u16(self.read_bytes(2)?))
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(E::read_i16(self.read_bytes(2)?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(E::read_u32(self.read_bytes(4)?))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(E::read_i32(self.read_bytes(4)?))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(E::read_f32(self.read_bytes(4)?))
    }

    pub fn read_vec2(&mut self) -> Result<Vec2> {
        Ok(Vec2::new(self.read_f32()?, self.read_f32()?))
    }

    pub fn read_vec3(&mut self) -> Result<Vec3> {
        Ok(Vec3::new(self.read_f32()?, self.read_f32()?, self.read_f32()?))
    }

    pub fn read_vec4(&mut self) -> Result<Vec4> {
        Ok(Vec4::new(
            self.read_f32()?,
            self.read_f32()?,
            self.read_f32()?,
            self.read_f32()?,
        ))
    }

    pub fn read_u16_array(&mut self, count: usize) -> Result<Vec<u16>> {
        let bytes = self.read_bytes(count.saturating_mul(2))?;
        Ok(bytes.chunks_exact(2).map(E::read_u16).collect())
    }

    pub fn read_u32_array(&mut self, count: usize) -> Result<Vec<u32>> {
        let bytes = self.read_bytes(count.saturating_mul(4))?;
        Ok(bytes.chunks_exact(4).map(E::read_u32).collect())
    }

    /// Fixed-width string field: cut at the first NUL, else the full width
    pub fn read_fixed_str(&mut self, width: usize) -> Result<String> {
        let bytes = self.read_bytes(width)?;
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(width);
        Ok(String::from_utf8_lossy(&bytes[..end]).into_owned())
    }

    /// NUL-terminated string; the terminator is consumed
    pub fn read_cstr(&mut self) -> Result<String> {
        let rest = &self.data[self.position..];
        let end = rest.iter().position(|&b| b == 0).ok_or(DataError::Truncated {
            offset: self.position,
            requested: rest.len() + 1,
            available: rest.len(),
        })?;
        let bytes = self.read_bytes(end + 1)?;
        Ok(String::from_utf8_lossy(&bytes[..end]).into_owned())
    }

    /// String prefixed by a one byte length
    pub fn read_u8_str(&mut self) -> Result<String> {
        let len = self.read_u8()? as usize;
        let bytes = self.read_bytes(len)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}

/// Growable output buffer with the same layout helpers as [`BinaryReader`]
#[derive(Debug, Clone, Default)]
pub struct BinaryWriter<E: ByteOrder = LittleEndian> {
    buffer: Vec<u8>,
    _order: PhantomData<E>,
}

pub type LeWriter = BinaryWriter<LittleEndian>;
pub type BeWriter = BinaryWriter<BigEndian>;

impl<E: ByteOrder> BinaryWriter<E> {
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            _order: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buffer
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    pub fn write_u16(&mut self, value: u16) {
        let mut buf = [0u8; 2];
        E::write_u16(&mut buf, value);
        self.write_bytes(&buf);
    }

    pub fn write_i16(&mut self, value: i16) {
        let mut buf = [0u8; 2];
        E::write_i16(&mut buf, value);
        self.write_bytes(&buf);
    }

    pub fn write_u32(&mut self, value: u32) {
        let mut buf = [0u8; 4];
        E::write_u32(&mut buf, value);
        self.write_bytes(&buf);
    }

    pub fn write_i32(&mut self, value: i32) {
        let mut buf = [0u8; 4];
        E::write_i32(&mut buf, value);
        self.write_bytes(&buf);
    }

    pub fn write_f32(&mut self, value: f32) {
        let mut buf = [0u8; 4];
        E::write_f32(&mut buf, value);
        self.write_bytes(&buf);
    }

    pub fn write_vec2(&mut self, value: Vec2) {
        self.write_f32(value.x);
        self.write_f32(value.y);
    }

    pub fn write_vec3(&mut self, value: Vec3) {
        self.write_f32(value.x);
        self.write_f32(value.y);
        self.write_f32(value.z);
    }

    pub fn write_vec4(&mut self, value: Vec4) {
        for component in value.to_array() {
            self.write_f32(component);
        }
    }

    pub fn write_u16_slice(&mut self, values: &[u16]) {
        for &value in values {
            self.write_u16(value);
        }
    }

    pub fn write_u32_slice(&mut self, values: &[u32]) {
        for &value in values {
            self.write_u32(value);
        }
    }

    /// Truncate to `width` bytes, then zero-pad up to `width`
    pub fn write_fixed_str(&mut self, value: &str, width: usize) {
        let bytes = value.as_bytes();
        let len = bytes.len().min(width);
        self.write_bytes(&bytes[..len]);
        self.buffer.resize(self.buffer.len() + (width - len), 0);
    }

    pub fn write_cstr(&mut self, value: &str) {
        self.write_bytes(value.as_bytes());
        self.write_u8(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn reads_little_and_big_endian() {
        let data = [0x01, 0x02, 0x03, 0x04];
        assert_eq!(LeReader::new(&data).read_u32().unwrap(), 0x0403_0201);
        assert_eq!(BeReader::new(&data).read_u32().unwrap(), 0x0102_0304);
    }

    #[test]
    fn short_reads_report_truncation() {
        let data = [1u8, 2, 3];
        let mut reader = LeReader::new(&data);
        reader.read_u16().unwrap();
        match reader.read_u32() {
            Err(DataError::Truncated {
                offset,
                requested,
                available,
            }) => {
                assert_eq!((offset, requested, available), (2, 4, 1));
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn fixed_strings_stop_at_nul() {
        let mut writer = LeWriter::new();
        writer.write_fixed_str("grass", 8);
        writer.write_fixed_str("much_too_long_name", 4);
        assert_eq!(writer.len(), 12);

        let bytes = writer.into_inner();
        let mut reader = LeReader::new(&bytes);
        assert_eq!(reader.read_fixed_str(8).unwrap(), "grass");
        assert_eq!(reader.read_fixed_str(4).unwrap(), "much");
        assert!(reader.is_empty());
    }

    #[test]
    fn cstr_requires_terminator() {
        let mut reader = LeReader::new(b"abc");
        assert!(matches!(
            reader.read_cstr(),
            Err(DataError::Truncated { .. })
        ));

        let mut reader = LeReader::new(b"abc\0d");
        assert_eq!(reader.read_cstr().unwrap(), "abc");
        assert_eq!(reader.remaining(), 1);
    }

    #[test]
    fn switching_byte_order_keeps_position() {
        let data = [0xAA, 0x00, 0x01];
        let mut reader = LeReader::new(&data);
        reader.read_u8().unwrap();
        let mut be = reader.with_order::<BigEndian>();
        assert_eq!(be.read_u16().unwrap(), 1);
    }
}
