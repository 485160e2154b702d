//! Fixed-layout zip structures emitted ahead of and behind entry payloads.
//!
//! All multi-byte fields are little-endian, per the zip application note.

use crate::errors::{Error, ErrorKind};
use std::io::{self, Write};

pub(crate) const LOCAL_FILE_HEADER_SIGNATURE: u32 = 0x04034b50;
pub(crate) const DATA_DESCRIPTOR_SIGNATURE: u32 = 0x08074b50;

/// General purpose bit 3: crc/sizes follow the payload in a data descriptor.
pub(crate) const FLAG_DATA_DESCRIPTOR: u16 = 0x08;

/// Version needed to extract: 2.0, deflate and directory support.
pub(crate) const VERSION_NEEDED: u16 = 20;

#[inline(always)]
pub(crate) fn le_u32(d: &[u8]) -> u32 {
    u32::from_le_bytes([d[0], d[1], d[2], d[3]])
}

#[inline(always)]
pub(crate) fn le_u16(d: &[u8]) -> u16 {
    u16::from_le_bytes([d[0], d[1]])
}

/// The compression method recorded for an entry.
///
/// Appnote section 4.4.5. Only the two methods this crate can produce get
/// named variants; anything else encountered in a captured record is carried
/// through as `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Store,
    Deflate,
    Unknown(u16),
}

impl CompressionMethod {
    pub fn as_id(&self) -> u16 {
        match self {
            CompressionMethod::Store => 0,
            CompressionMethod::Deflate => 8,
            CompressionMethod::Unknown(id) => *id,
        }
    }
}

impl From<u16> for CompressionMethod {
    fn from(id: u16) -> Self {
        match id {
            0 => CompressionMethod::Store,
            8 => CompressionMethod::Deflate,
            other => CompressionMethod::Unknown(other),
        }
    }
}

/// The fixed-size portion of a local file header. The name bytes follow.
pub struct LocalFileHeaderFixed {
    pub signature: u32,
    pub version_needed: u16,
    pub flags: u16,
    pub compression_method: u16,
    pub last_mod_time: u16,
    pub last_mod_date: u16,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub file_name_len: u16,
    pub extra_field_len: u16,
}

impl LocalFileHeaderFixed {
    pub const SIZE: usize = 30;

    /// Byte offset of the crc32 field, where in-place finalization patches.
    pub(crate) const CRC_OFFSET: u64 = 14;

    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let mut buf = [0u8; Self::SIZE];
        buf[0..4].copy_from_slice(&self.signature.to_le_bytes());
        buf[4..6].copy_from_slice(&self.version_needed.to_le_bytes());
        buf[6..8].copy_from_slice(&self.flags.to_le_bytes());
        buf[8..10].copy_from_slice(&self.compression_method.to_le_bytes());
        buf[10..12].copy_from_slice(&self.last_mod_time.to_le_bytes());
        buf[12..14].copy_from_slice(&self.last_mod_date.to_le_bytes());
        buf[14..18].copy_from_slice(&self.crc32.to_le_bytes());
        buf[18..22].copy_from_slice(&self.compressed_size.to_le_bytes());
        buf[22..26].copy_from_slice(&self.uncompressed_size.to_le_bytes());
        buf[26..28].copy_from_slice(&self.file_name_len.to_le_bytes());
        buf[28..30].copy_from_slice(&self.extra_field_len.to_le_bytes());
        writer.write_all(&buf)
    }

    pub fn parse(data: &[u8]) -> Result<LocalFileHeaderFixed, Error> {
        if data.len() < Self::SIZE {
            return Err(Error::from(ErrorKind::Eof));
        }

        let result = LocalFileHeaderFixed {
            signature: le_u32(&data[0..4]),
            version_needed: le_u16(&data[4..6]),
            flags: le_u16(&data[6..8]),
            compression_method: le_u16(&data[8..10]),
            last_mod_time: le_u16(&data[10..12]),
            last_mod_date: le_u16(&data[12..14]),
            crc32: le_u32(&data[14..18]),
            compressed_size: le_u32(&data[18..22]),
            uncompressed_size: le_u32(&data[22..26]),
            file_name_len: le_u16(&data[26..28]),
            extra_field_len: le_u16(&data[28..30]),
        };

        if result.signature != LOCAL_FILE_HEADER_SIGNATURE {
            return Err(Error::from(ErrorKind::InvalidSignature {
                expected: LOCAL_FILE_HEADER_SIGNATURE,
                actual: result.signature,
            }));
        }

        Ok(result)
    }

    pub fn variable_length(&self) -> usize {
        self.file_name_len as usize + self.extra_field_len as usize
    }
}

/// The trailing record carrying crc/sizes when the header was written with
/// placeholder values (general purpose bit 3 set).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataDescriptor {
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
}

impl DataDescriptor {
    pub const SIZE: usize = 16;

    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let mut buf = [0u8; Self::SIZE];
        buf[0..4].copy_from_slice(&DATA_DESCRIPTOR_SIGNATURE.to_le_bytes());
        buf[4..8].copy_from_slice(&self.crc32.to_le_bytes());
        buf[8..12].copy_from_slice(&self.compressed_size.to_le_bytes());
        buf[12..16].copy_from_slice(&self.uncompressed_size.to_le_bytes());
        writer.write_all(&buf)
    }
}
