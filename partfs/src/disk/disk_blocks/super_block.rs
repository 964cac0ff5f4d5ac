use super::block::BLOCK_SIZE;
use super::inode::INODE_SIZE;
use crate::{ByteSerializable, PartFsError};
use alloc::{vec, vec::Vec};
use byteorder::{ByteOrder, LittleEndian};

pub const SUPER_BLOCK_SIZE: u64 = 76;
pub const MAGIC: i32 = 0xEF53;
pub const FILESYSTEM_TYPE: i32 = 2;

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct SuperBlock {
    pub filesystem_type: i32,
    pub inodes_count: i32,
    pub blocks_count: i32,
    pub free_inodes_count: i32,
    pub free_blocks_count: i32,
    /// Unix seconds.
    pub mount_time: i64,
    pub unmount_time: i64,
    pub mount_count: i32,
    pub magic: i32,
    pub inode_size: i32,
    pub block_size: i32,
    /// Next free inode index.
    pub first_inode: i32,
    /// Next free block index.
    pub first_block: i32,

    // Absolute disk offsets.
    pub bitmap_inode_start: i32,
    pub bitmap_block_start: i32,
    pub inode_start: i32,
    pub block_start: i32,
}

impl SuperBlock {
    /// Number of inodes that fit in a region of `partition_size` bytes. Each inode is paired
    /// with three blocks plus one bitmap bit for itself and one for each block.
    pub fn inode_count_for(partition_size: u64) -> u64 {
        if partition_size < SUPER_BLOCK_SIZE + 2 {
            return 0;
        }

        let usable = partition_size - SUPER_BLOCK_SIZE;

        return (usable - 2) * 8 / (4 + 8 * (INODE_SIZE + 3 * BLOCK_SIZE));
    }

    /// Lays out a fresh filesystem whose superblock sits at `start`. Offsets are absolute.
    pub fn new(start: u64, inodes: u64, time: i64) -> Self {
        let blocks = inodes * 3;

        let bitmap_inode_start = start + SUPER_BLOCK_SIZE;
        let bitmap_block_start = bitmap_inode_start + bytes_for_bits(inodes);
        let inode_start = bitmap_block_start + bytes_for_bits(blocks);
        let block_start = inode_start + inodes * INODE_SIZE;

        return Self {
            filesystem_type: FILESYSTEM_TYPE,
            inodes_count: inodes as i32,
            blocks_count: blocks as i32,
            free_inodes_count: inodes as i32,
            free_blocks_count: blocks as i32,
            mount_time: time,
            unmount_time: 0,
            mount_count: 0,
            magic: MAGIC,
            inode_size: INODE_SIZE as i32,
            block_size: BLOCK_SIZE as i32,
            first_inode: 0,
            first_block: 0,
            bitmap_inode_start: bitmap_inode_start as i32,
            bitmap_block_start: bitmap_block_start as i32,
            inode_start: inode_start as i32,
            block_start: block_start as i32,
        };
    }

    pub fn inode_offset(&self, index: u64) -> u64 {
        return self.inode_start as u64 + index * self.inode_size as u64;
    }

    pub fn block_offset(&self, index: u64) -> u64 {
        return self.block_start as u64 + index * self.block_size as u64;
    }

    /// One past the last byte used by the filesystem.
    pub fn end(&self) -> u64 {
        return self.block_offset(self.blocks_count as u64);
    }
}

fn bytes_for_bits(bits: u64) -> u64 {
    return (bits + 7) / 8;
}

impl ByteSerializable for SuperBlock {
    fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = vec![0u8; SUPER_BLOCK_SIZE as usize];
        let mut offset = 0;

        macro_rules! put_i32 {
            ($($v:expr),+) => {
                $(
                    LittleEndian::write_i32(&mut bytes[offset..], $v);
                    offset += 4;
                )+
            };
        }

        put_i32!(
            self.filesystem_type,
            self.inodes_count,
            self.blocks_count,
            self.free_inodes_count,
            self.free_blocks_count
        );

        LittleEndian::write_i64(&mut bytes[offset..], self.mount_time);
        offset += 8;
        LittleEndian::write_i64(&mut bytes[offset..], self.unmount_time);
        offset += 8;

        put_i32!(
            self.mount_count,
            self.magic,
            self.inode_size,
            self.block_size,
            self.first_inode,
            self.first_block,
            self.bitmap_inode_start,
            self.bitmap_block_start,
            self.inode_start,
            self.block_start
        );

        debug_assert_eq!(offset as u64, SUPER_BLOCK_SIZE);

        return bytes;
    }

    fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < SUPER_BLOCK_SIZE as usize {
            return None;
        }

        let i32_at = |offset: usize| LittleEndian::read_i32(&bytes[offset..]);

        let res = Self {
            filesystem_type: i32_at(0),
            inodes_count: i32_at(4),
            blocks_count: i32_at(8),
            free_inodes_count: i32_at(12),
            free_blocks_count: i32_at(16),
            mount_time: LittleEndian::read_i64(&bytes[20..]),
            unmount_time: LittleEndian::read_i64(&bytes[28..]),
            mount_count: i32_at(36),
            magic: i32_at(40),
            inode_size: i32_at(44),
            block_size: i32_at(48),
            first_inode: i32_at(52),
            first_block: i32_at(56),
            bitmap_inode_start: i32_at(60),
            bitmap_block_start: i32_at(64),
            inode_start: i32_at(68),
            block_start: i32_at(72),
        };

        if res.magic != MAGIC
            || res.free_inodes_count > res.inodes_count
            || res.free_blocks_count > res.blocks_count
        {
            return None;
        }

        return Some(res);
    }

    fn size() -> u64 {
        return SUPER_BLOCK_SIZE;
    }

    fn corruption_error<E>() -> PartFsError<E> {
        return PartFsError::CorruptedSuperBlock;
    }
}
