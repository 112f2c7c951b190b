//! DBC file header parsing

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

use crate::error::{Error, Result};

/// Magic signature at the start of every DBC file
pub const DBC_MAGIC: &[u8; 4] = b"WDBC";
/// The magic signature read as a little-endian u32
pub const DBC_MAGIC_U32: u32 = 1128416343;
/// Size of the fixed header; records start right after it
pub const HEADER_SIZE: u64 = 20;

const _: () = assert!(u32::from_le_bytes(*DBC_MAGIC) == DBC_MAGIC_U32);
const _: () = assert!(DBC_MAGIC.len() as u64 + 4 * 4 == HEADER_SIZE);

/// DBC file header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbcHeader {
    pub signature: [u8; 4],
    pub record_count: u32,
    pub field_count: u32,
    /// Bytes per record
    pub record_size: u32,
    /// Byte length of the trailing string block
    pub string_block_size: u32,
}

impl DbcHeader {
    /// Header for an empty table with the given layout
    pub fn new(field_count: u32, record_size: u32) -> Self {
        DbcHeader {
            signature: *DBC_MAGIC,
            record_count: 0,
            field_count,
            record_size,
            string_block_size: 1,
        }
    }

    /// Check if data starts with a DBC signature
    pub fn is_dbc(data: &[u8]) -> bool {
        data.len() >= 4 && Self::signature_matches(&[data[0], data[1], data[2], data[3]])
    }

    fn signature_matches(signature: &[u8; 4]) -> bool {
        signature == DBC_MAGIC && u32::from_le_bytes(*signature) == DBC_MAGIC_U32
    }

    /// Parse the header from the start of a stream
    ///
    /// Consumes exactly [`HEADER_SIZE`] bytes on success.
    pub fn parse<R: Read>(reader: &mut R) -> Result<Self> {
        let mut signature = [0u8; 4];
        reader
            .read_exact(&mut signature)
            .map_err(|source| Error::HeaderRead {
                field: "signature",
                source,
            })?;
        if !Self::signature_matches(&signature) {
            return Err(Error::InvalidSignature { found: signature });
        }

        let mut read_field = |field: &'static str| {
            reader
                .read_u32::<LittleEndian>()
                .map_err(|source| Error::HeaderRead { field, source })
        };
        let record_count = read_field("record_count")?;
        let field_count = read_field("field_count")?;
        let record_size = read_field("record_size")?;
        let string_block_size = read_field("string_block_size")?;

        Ok(DbcHeader {
            signature,
            record_count,
            field_count,
            record_size,
            string_block_size,
        })
    }

    /// Write the header. No validation happens here.
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.signature)?;
        writer.write_u32::<LittleEndian>(self.record_count)?;
        writer.write_u32::<LittleEndian>(self.field_count)?;
        writer.write_u32::<LittleEndian>(self.record_size)?;
        writer.write_u32::<LittleEndian>(self.string_block_size)?;
        Ok(())
    }

    /// Byte length of the record area
    pub fn records_len(&self) -> u64 {
        self.record_count as u64 * self.record_size as u64
    }

    /// Expected total file length
    pub fn file_len(&self) -> u64 {
        HEADER_SIZE + self.records_len() + self.string_block_size as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample() -> Vec<u8> {
        let mut data = b"WDBC".to_vec();
        for v in [3u32, 2, 8, 5] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        data
    }

    #[test]
    fn test_parse_header() {
        let mut cursor = Cursor::new(sample());
        let header = DbcHeader::parse(&mut cursor).unwrap();
        assert_eq!(cursor.position(), HEADER_SIZE);
        assert_eq!(header.record_count, 3);
        assert_eq!(header.field_count, 2);
        assert_eq!(header.record_size, 8);
        assert_eq!(header.string_block_size, 5);
        assert_eq!(header.file_len(), 20 + 24 + 5);
    }

    #[test]
    fn test_write_header() {
        let header = DbcHeader::parse(&mut Cursor::new(sample())).unwrap();
        let mut out = Vec::new();
        header.write(&mut out).unwrap();
        assert_eq!(out, sample());
    }

    #[test]
    fn test_invalid_signature() {
        let mut data = sample();
        data[0] = b'X';
        let err = DbcHeader::parse(&mut Cursor::new(data)).unwrap_err();
        assert!(matches!(err, Error::InvalidSignature { found } if &found == b"XDBC"));
    }

    #[test]
    fn test_short_header() {
        let data = sample()[..10].to_vec();
        let err = DbcHeader::parse(&mut Cursor::new(data)).unwrap_err();
        assert!(matches!(err, Error::HeaderRead { field: "field_count", .. }));

        let err = DbcHeader::parse(&mut Cursor::new(b"WD".to_vec())).unwrap_err();
        assert!(matches!(err, Error::HeaderRead { field: "signature", .. }));
    }

    #[test]
    fn test_is_dbc() {
        assert!(DbcHeader::is_dbc(b"WDBC\x00\x00"));
        assert!(!DbcHeader::is_dbc(b"WDB2"));
        assert!(!DbcHeader::is_dbc(b"WD"));
    }
}
