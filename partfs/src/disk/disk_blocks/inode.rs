use crate::{ByteSerializable, PartFsError, Permission};
use alloc::{vec, vec::Vec};
use byteorder::{ByteOrder, LittleEndian};

pub const INODE_SIZE: u64 = 100;
pub const POINTER_COUNT: usize = 15;
/// Pointers 12, 13 and 14 are the single, double and triple indirect slots. Nothing
/// allocates through them yet.
pub const DIRECT_POINTERS: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InodeType {
    Folder,
    File,
}

impl InodeType {
    pub fn as_byte(&self) -> u8 {
        match self {
            InodeType::Folder => b'0',
            InodeType::File => b'1',
        }
    }

    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            b'0' => Some(InodeType::Folder),
            b'1' => Some(InodeType::File),
            _ => None,
        }
    }
}

/// Metadata for one file or folder. Timestamps are unix seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inode {
    pub uid: i32,
    pub gid: i32,
    pub size: i32,
    pub atime: i64,
    pub ctime: i64,
    pub mtime: i64,
    /// -1 marks an unallocated pointer.
    pub block: [i32; POINTER_COUNT],
    kind: InodeType,
    pub permission: Permission,
}

impl Inode {
    pub fn new(kind: InodeType, uid: i32, gid: i32, permission: Permission, time: i64) -> Self {
        return Self {
            uid,
            gid,
            size: 0,
            atime: time,
            ctime: time,
            mtime: time,
            block: [-1; POINTER_COUNT],
            kind,
            permission,
        };
    }

    /// The type is fixed when the inode is created.
    pub fn kind(&self) -> InodeType {
        return self.kind;
    }

    pub fn is_folder(&self) -> bool {
        return self.kind == InodeType::Folder;
    }

    /// Allocated direct pointers, in order.
    pub fn direct_blocks(&self) -> impl Iterator<Item = u64> + '_ {
        return self.block[..DIRECT_POINTERS]
            .iter()
            .filter(|b| **b >= 0)
            .map(|b| *b as u64);
    }
}

impl ByteSerializable for Inode {
    fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = vec![0u8; INODE_SIZE as usize];

        LittleEndian::write_i32(&mut bytes[0..], self.uid);
        LittleEndian::write_i32(&mut bytes[4..], self.gid);
        LittleEndian::write_i32(&mut bytes[8..], self.size);
        LittleEndian::write_i64(&mut bytes[12..], self.atime);
        LittleEndian::write_i64(&mut bytes[20..], self.ctime);
        LittleEndian::write_i64(&mut bytes[28..], self.mtime);
        LittleEndian::write_i32_into(&self.block, &mut bytes[36..96]);
        bytes[96] = self.kind.as_byte();
        bytes[97..100].copy_from_slice(&self.permission.as_ascii());

        return bytes;
    }

    fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < INODE_SIZE as usize {
            return None;
        }

        let mut block = [0i32; POINTER_COUNT];
        LittleEndian::read_i32_into(&bytes[36..96], &mut block);

        return Some(Self {
            uid: LittleEndian::read_i32(&bytes[0..]),
            gid: LittleEndian::read_i32(&bytes[4..]),
            size: LittleEndian::read_i32(&bytes[8..]),
            atime: LittleEndian::read_i64(&bytes[12..]),
            ctime: LittleEndian::read_i64(&bytes[20..]),
            mtime: LittleEndian::read_i64(&bytes[28..]),
            block,
            kind: InodeType::from_byte(bytes[96])?,
            permission: Permission::from_ascii(&bytes[97..100])?,
        });
    }

    fn size() -> u64 {
        return INODE_SIZE;
    }

    fn corruption_error<E>() -> PartFsError<E> {
        return PartFsError::CorruptedINode;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let mut inode = Inode::new(InodeType::File, 1, 1, Permission::new(7, 7, 7).unwrap(), 1_600_000_000);
        inode.size = 64;
        inode.block[0] = 0;
        inode.block[11] = i32::MAX;

        let bytes = inode.to_bytes();

        assert_eq!(bytes.len(), INODE_SIZE as usize);
        assert_eq!(bytes[96], b'1');
        assert_eq!(&bytes[97..100], b"777");
        assert_eq!(Inode::from_bytes(&bytes).unwrap(), inode);
    }

    #[test]
    fn test_unallocated_pointers() {
        let inode = Inode::new(InodeType::Folder, 2, 3, Permission::new(6, 6, 4).unwrap(), 0);
        let decoded = Inode::from_bytes(&inode.to_bytes()).unwrap();

        assert!(decoded.block.iter().all(|b| *b == -1));
        assert_eq!(decoded.direct_blocks().count(), 0);
        assert!(decoded.is_folder());
    }

    #[test]
    fn test_bad_permission_rejected() {
        let mut bytes = Inode::new(InodeType::File, 1, 1, Permission::new(6, 6, 4).unwrap(), 0).to_bytes();
        bytes[98] = b'9';

        assert!(Inode::from_bytes(&bytes).is_none());
    }
}
