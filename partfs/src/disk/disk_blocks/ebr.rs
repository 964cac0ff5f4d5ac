use super::mbr::{Fit, PARTITION_NAME_LENGTH};
use crate::utils::{read_fixed_str, write_fixed_str};
use crate::{ByteSerializable, PartFsError};
use alloc::{string::String, vec, vec::Vec};
use byteorder::{ByteOrder, LittleEndian};

pub const EBR_SIZE: u64 = 30;

/// Header of a logical partition. The header sits at `start` and the partition's data follows
/// it, so `size` covers both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ebr {
    pub mounted: bool,
    pub fit: Fit,
    pub start: i32,
    /// -1 for the placeholder written when the extended partition is created.
    pub size: i32,
    /// Offset of the next header, -1 for none.
    pub next: i32,
    pub name: String,
}

impl Ebr {
    pub fn placeholder(start: i32, fit: Fit) -> Self {
        return Self {
            mounted: false,
            fit,
            start,
            size: -1,
            next: -1,
            name: String::new(),
        };
    }

    pub fn new(start: i32, size: i32, fit: Fit, name: &str) -> Self {
        return Self {
            mounted: false,
            fit,
            start,
            size,
            next: -1,
            name: String::from(name),
        };
    }

    pub fn is_placeholder(&self) -> bool {
        return self.size == -1;
    }

    /// One past the last byte of the logical partition.
    pub fn end(&self) -> i64 {
        return self.start as i64 + self.size as i64;
    }

    /// The first byte after the header.
    pub fn data_start(&self) -> u64 {
        return self.start as u64 + EBR_SIZE;
    }
}

impl ByteSerializable for Ebr {
    fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = vec![0u8; EBR_SIZE as usize];

        bytes[0] = if self.mounted { b'1' } else { b'0' };
        bytes[1] = self.fit.as_byte();
        LittleEndian::write_i32(&mut bytes[2..], self.start);
        LittleEndian::write_i32(&mut bytes[6..], self.size);
        LittleEndian::write_i32(&mut bytes[10..], self.next);
        write_fixed_str(&mut bytes[14..14 + PARTITION_NAME_LENGTH], &self.name);

        return bytes;
    }

    fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < EBR_SIZE as usize {
            return None;
        }

        let mounted = match bytes[0] {
            b'0' => false,
            b'1' => true,
            _ => return None,
        };

        return Some(Self {
            mounted,
            fit: Fit::from_byte(bytes[1])?,
            start: LittleEndian::read_i32(&bytes[2..]),
            size: LittleEndian::read_i32(&bytes[6..]),
            next: LittleEndian::read_i32(&bytes[10..]),
            name: read_fixed_str(&bytes[14..14 + PARTITION_NAME_LENGTH]),
        });
    }

    fn size() -> u64 {
        return EBR_SIZE;
    }

    fn corruption_error<E>() -> PartFsError<E> {
        return PartFsError::CorruptedEbr;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_round_trip() {
        let ebr = Ebr::placeholder(2048, Fit::WorstFit);
        let decoded = Ebr::from_bytes(&ebr.to_bytes()).unwrap();

        assert!(decoded.is_placeholder());
        assert_eq!(decoded.next, -1);
        assert_eq!(decoded, ebr);
    }

    #[test]
    fn test_linked_round_trip() {
        let mut ebr = Ebr::new(2048, 512, Fit::BestFit, "logical_name_16c");
        ebr.next = 2560;
        ebr.mounted = true;

        let bytes = ebr.to_bytes();

        assert_eq!(bytes.len(), EBR_SIZE as usize);
        assert_eq!(Ebr::from_bytes(&bytes).unwrap(), ebr);
        assert_eq!(ebr.end(), 2560);
        assert_eq!(ebr.data_start(), 2078);
    }

    #[test]
    fn test_zeroed_rejected() {
        assert!(Ebr::from_bytes(&[0u8; EBR_SIZE as usize]).is_none());
    }
}
