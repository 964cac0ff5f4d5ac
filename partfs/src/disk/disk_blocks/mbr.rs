use crate::utils::{read_fixed_str, write_fixed_str};
use crate::{ByteSerializable, PartFsError};
use alloc::{string::String, vec, vec::Vec};
use byteorder::{ByteOrder, LittleEndian};
use core::str::FromStr;

pub const MBR_SIZE: u64 = 157;
pub const PARTITION_SIZE: u64 = 35;
pub const PARTITION_NAME_LENGTH: usize = 16;
pub const MOUNT_ID_LENGTH: usize = 4;
pub const MAX_PARTITIONS: usize = 4;

const UNUSED: u8 = b'N';

/// Placement strategy requested for a partition. It is recorded but allocation is always
/// first-free-slot for table entries and append-only for logical partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fit {
    BestFit,
    FirstFit,
    WorstFit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionType {
    Primary,
    Extended,
    Logical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionStatus {
    Unused,
    Created,
    Mounted,
}

impl Fit {
    pub fn as_byte(&self) -> u8 {
        match self {
            Fit::BestFit => b'B',
            Fit::FirstFit => b'F',
            Fit::WorstFit => b'W',
        }
    }

    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            b'B' => Some(Fit::BestFit),
            b'F' => Some(Fit::FirstFit),
            b'W' => Some(Fit::WorstFit),
            _ => None,
        }
    }
}

impl FromStr for Fit {
    type Err = ();

    /// Parses `BF`, `FF` or `WF`, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("BF") {
            Ok(Fit::BestFit)
        } else if s.eq_ignore_ascii_case("FF") {
            Ok(Fit::FirstFit)
        } else if s.eq_ignore_ascii_case("WF") {
            Ok(Fit::WorstFit)
        } else {
            Err(())
        }
    }
}

impl PartitionType {
    pub fn as_byte(&self) -> u8 {
        match self {
            PartitionType::Primary => b'P',
            PartitionType::Extended => b'E',
            PartitionType::Logical => b'L',
        }
    }

    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            b'P' => Some(PartitionType::Primary),
            b'E' => Some(PartitionType::Extended),
            b'L' => Some(PartitionType::Logical),
            _ => None,
        }
    }
}

impl FromStr for PartitionType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 1 {
            return Err(());
        }

        return PartitionType::from_byte(s.as_bytes()[0].to_ascii_uppercase()).ok_or(());
    }
}

impl PartitionStatus {
    pub fn as_byte(&self) -> u8 {
        match self {
            PartitionStatus::Unused => UNUSED,
            PartitionStatus::Created => b'0',
            PartitionStatus::Mounted => b'1',
        }
    }

    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            UNUSED => Some(PartitionStatus::Unused),
            b'0' => Some(PartitionStatus::Created),
            b'1' => Some(PartitionStatus::Mounted),
            _ => None,
        }
    }
}

/// One of the four MBR table entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub status: PartitionStatus,
    pub kind: PartitionType,
    pub fit: Fit,
    pub start: i32,
    pub size: i32,
    pub name: String,
    pub correlative: i32,
    pub mount_id: String,
}

impl Partition {
    pub fn unused() -> Self {
        return Self {
            status: PartitionStatus::Unused,
            kind: PartitionType::Primary,
            fit: Fit::WorstFit,
            start: -1,
            size: -1,
            name: String::new(),
            correlative: -1,
            mount_id: String::new(),
        };
    }

    pub fn new(kind: PartitionType, fit: Fit, start: i32, size: i32, name: &str) -> Self {
        return Self {
            status: PartitionStatus::Created,
            kind,
            fit,
            start,
            size,
            name: String::from(name),
            correlative: -1,
            mount_id: String::new(),
        };
    }

    pub fn is_used(&self) -> bool {
        return self.status != PartitionStatus::Unused;
    }

    /// One past the last byte of the partition.
    pub fn end(&self) -> i64 {
        return self.start as i64 + self.size as i64;
    }

    fn write_into(&self, bytes: &mut [u8]) {
        if !self.is_used() {
            bytes[0] = UNUSED;
            bytes[1] = UNUSED;
            bytes[2] = UNUSED;
        } else {
            bytes[0] = self.status.as_byte();
            bytes[1] = self.kind.as_byte();
            bytes[2] = self.fit.as_byte();
        }

        LittleEndian::write_i32(&mut bytes[3..], self.start);
        LittleEndian::write_i32(&mut bytes[7..], self.size);
        write_fixed_str(&mut bytes[11..27], &self.name);
        LittleEndian::write_i32(&mut bytes[27..], self.correlative);
        write_fixed_str(&mut bytes[31..35], &self.mount_id);
    }

    fn read_from(bytes: &[u8]) -> Option<Self> {
        let status = PartitionStatus::from_byte(bytes[0])?;

        if status == PartitionStatus::Unused {
            return Some(Self::unused());
        }

        return Some(Self {
            status,
            kind: PartitionType::from_byte(bytes[1])?,
            fit: Fit::from_byte(bytes[2])?,
            start: LittleEndian::read_i32(&bytes[3..]),
            size: LittleEndian::read_i32(&bytes[7..]),
            name: read_fixed_str(&bytes[11..27]),
            correlative: LittleEndian::read_i32(&bytes[27..]),
            mount_id: read_fixed_str(&bytes[31..35]),
        });
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mbr {
    pub size: i32,
    /// Unix seconds.
    pub creation_time: i64,
    pub signature: i32,
    pub fit: Fit,
    pub partitions: [Partition; MAX_PARTITIONS],
}

impl Mbr {
    pub fn new(size: i32, creation_time: i64, signature: i32, fit: Fit) -> Self {
        return Self {
            size,
            creation_time,
            signature,
            fit,
            partitions: [
                Partition::unused(),
                Partition::unused(),
                Partition::unused(),
                Partition::unused(),
            ],
        };
    }

    pub fn used_partitions(&self) -> impl Iterator<Item = &Partition> {
        return self.partitions.iter().filter(|p| p.is_used());
    }

    pub fn extended(&self) -> Option<&Partition> {
        return self
            .used_partitions()
            .find(|p| p.kind == PartitionType::Extended);
    }
}

impl ByteSerializable for Mbr {
    fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = vec![0u8; MBR_SIZE as usize];

        LittleEndian::write_i32(&mut bytes[0..], self.size);
        LittleEndian::write_i64(&mut bytes[4..], self.creation_time);
        LittleEndian::write_i32(&mut bytes[12..], self.signature);
        bytes[16] = self.fit.as_byte();

        for (i, partition) in self.partitions.iter().enumerate() {
            let offset = 17 + i * PARTITION_SIZE as usize;
            partition.write_into(&mut bytes[offset..offset + PARTITION_SIZE as usize]);
        }

        return bytes;
    }

    fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < MBR_SIZE as usize {
            return None;
        }

        let mut mbr = Self::new(
            LittleEndian::read_i32(&bytes[0..]),
            LittleEndian::read_i64(&bytes[4..]),
            LittleEndian::read_i32(&bytes[12..]),
            Fit::from_byte(bytes[16])?,
        );

        for i in 0..MAX_PARTITIONS {
            let offset = 17 + i * PARTITION_SIZE as usize;
            mbr.partitions[i] = Partition::read_from(&bytes[offset..offset + PARTITION_SIZE as usize])?;
        }

        return Some(mbr);
    }

    fn size() -> u64 {
        return MBR_SIZE;
    }

    fn corruption_error<E>() -> PartFsError<E> {
        return PartFsError::CorruptedMbr;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_boundaries() {
        let mut mbr = Mbr::new(i32::MAX, -1, 0x7f, Fit::FirstFit);
        mbr.partitions[0] = Partition::new(PartitionType::Primary, Fit::BestFit, 157, 1024, "sixteen_chars_ok");
        mbr.partitions[2] = Partition::new(PartitionType::Extended, Fit::WorstFit, 1181, 4096, "ext");
        mbr.partitions[2].status = PartitionStatus::Mounted;
        mbr.partitions[2].correlative = 1;
        mbr.partitions[2].mount_id = String::from("781A");

        let bytes = mbr.to_bytes();

        assert_eq!(bytes.len(), MBR_SIZE as usize);
        assert_eq!(Mbr::from_bytes(&bytes).unwrap(), mbr);
    }

    #[test]
    fn test_unused_entry_layout() {
        let mbr = Mbr::new(1024, 0, 1, Fit::FirstFit);
        let bytes = mbr.to_bytes();

        assert_eq!(&bytes[17..20], b"NNN");
        assert_eq!(LittleEndian::read_i32(&bytes[20..]), -1);
        assert_eq!(LittleEndian::read_i32(&bytes[24..]), -1);
    }

    #[test]
    fn test_name_truncated() {
        let mut mbr = Mbr::new(1024, 0, 1, Fit::FirstFit);
        mbr.partitions[0] = Partition::new(PartitionType::Primary, Fit::BestFit, 157, 10, "a_name_longer_than_sixteen");

        let decoded = Mbr::from_bytes(&mbr.to_bytes()).unwrap();

        assert_eq!(decoded.partitions[0].name, "a_name_longer_th");
    }

    #[test]
    fn test_zeroed_bytes_rejected() {
        assert!(Mbr::from_bytes(&[0u8; MBR_SIZE as usize]).is_none());
        assert!(Mbr::from_bytes(&[0u8; 20]).is_none());
    }

    #[test]
    fn test_parse_codes() {
        assert_eq!("bf".parse::<Fit>(), Ok(Fit::BestFit));
        assert_eq!("WF".parse::<Fit>(), Ok(Fit::WorstFit));
        assert!("XF".parse::<Fit>().is_err());
        assert_eq!("l".parse::<PartitionType>(), Ok(PartitionType::Logical));
        assert!("PE".parse::<PartitionType>().is_err());
    }
}
