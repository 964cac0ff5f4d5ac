use crate::bitmap::BitMap;
use crate::{
    read_structure, write_structure, Block, DiskHandler, FileBlock, FolderBlock, FolderEntry, Inode,
    InodeType, OSManager, PartFsError, PartFsErrorConvertible, PartitionRegion, Permission, SuperBlock,
    UsersStore, BLOCK_SIZE, SUPER_BLOCK_SIZE,
};
use core::str::FromStr;
use log::{debug, info};

pub const ROOT_INODE: u64 = 0;
pub const USERS_INODE: u64 = 1;
pub const USERS_FILE_NAME: &str = "users.txt";

/// Uid and gid owning the root folder and the users file.
const ROOT_ID: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatType {
    /// Zeroes the whole partition before writing the structures.
    Full,
    /// Only writes the structures.
    Fast,
}

impl FromStr for FormatType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("full") {
            Ok(FormatType::Full)
        } else if s.eq_ignore_ascii_case("fast") {
            Ok(FormatType::Fast)
        } else {
            Err(())
        }
    }
}

impl Default for FormatType {
    fn default() -> Self {
        FormatType::Fast
    }
}

/// A filesystem living inside one partition region: superblock, inode bitmap, block bitmap,
/// inode table and block table, laid out back to back.
pub struct FileSystem<'a, 'b, E: PartFsErrorConvertible> {
    handler: &'a mut dyn DiskHandler<E>,
    manager: &'b dyn OSManager,

    region: PartitionRegion,
    super_block: SuperBlock,

    inode_bitmap: BitMap,
    block_bitmap: BitMap,
}

impl<'a, 'b, E: PartFsErrorConvertible> FileSystem<'a, 'b, E> {
    /// Builds a new filesystem over `region`, with the root folder at inode 0 and the users
    /// file at inode 1. The superblock is written last.
    pub fn format(
        handler: &'a mut dyn DiskHandler<E>,
        manager: &'b dyn OSManager,
        region: PartitionRegion,
        format_type: FormatType,
    ) -> Result<Self, PartFsError<E>> {
        let inodes = SuperBlock::inode_count_for(region.size);

        if inodes < 2 {
            return Err(PartFsError::PartitionTooSmall);
        }

        if format_type == FormatType::Full {
            disk_try!(handler.zero_range(region.start, region.end()));
        }

        let now = manager.current_time().timestamp();
        let super_block = SuperBlock::new(region.start, inodes, now);

        let inode_bitmap = BitMap::new(super_block.inodes_count as usize);
        let block_bitmap = BitMap::new(super_block.blocks_count as usize);

        let mut fs = Self {
            handler,
            manager,
            region,
            super_block,
            inode_bitmap,
            block_bitmap,
        };

        let root_index = fs.take_inode()?;
        let root_block = fs.take_block()?;
        let users_index = fs.take_inode()?;
        let users_block = fs.take_block()?;

        let mut root_folder = FolderBlock::with_links(root_index, root_index);
        root_folder.insert(FolderEntry::new(USERS_FILE_NAME, users_index));

        let mut root = Inode::new(InodeType::Folder, ROOT_ID, ROOT_ID, Permission::FULL, now);
        root.block[0] = root_block as i32;

        let users_text = UsersStore::bootstrap().to_text();
        let mut users = Inode::new(InodeType::File, ROOT_ID, ROOT_ID, Permission::OWNER_ONLY, now);
        users.block[0] = users_block as i32;
        users.size = users_text.len() as i32;

        fs.write_block(root_block, &Block::Folder(root_folder))?;
        fs.write_block(users_block, &Block::File(FileBlock::new(users_text.as_bytes())))?;
        fs.write_inode(root_index, &root)?;
        fs.write_inode(users_index, &users)?;

        disk_try!(fs.handler.write_bytes(
            &fs.inode_bitmap.as_bytes(),
            fs.super_block.bitmap_inode_start as u64
        ));
        disk_try!(fs.handler.write_bytes(
            &fs.block_bitmap.as_bytes(),
            fs.super_block.bitmap_block_start as u64
        ));
        fs.write_super_block()?;

        info!(
            "formatted {:?} region at {} with {} inodes and {} blocks",
            format_type, region.start, fs.super_block.inodes_count, fs.super_block.blocks_count
        );

        return Ok(fs);
    }

    /// Loads an existing filesystem from the start of `region`.
    pub fn open(
        handler: &'a mut dyn DiskHandler<E>,
        manager: &'b dyn OSManager,
        region: PartitionRegion,
    ) -> Result<Self, PartFsError<E>> {
        let super_block: SuperBlock = read_structure(&*handler, region.start)?;

        if super_block.bitmap_inode_start as u64 != region.start + SUPER_BLOCK_SIZE
            || super_block.inodes_count < 2
            || super_block.end() > region.end()
        {
            return Err(PartFsError::CorruptedSuperBlock);
        }

        let inodes = super_block.inodes_count as usize;
        let blocks = super_block.blocks_count as usize;

        let inode_bytes = disk_try!(handler.read_bytes(
            super_block.bitmap_inode_start as u64,
            BitMap::bytes_for(inodes) as u64
        ));
        let block_bytes = disk_try!(handler.read_bytes(
            super_block.bitmap_block_start as u64,
            BitMap::bytes_for(blocks) as u64
        ));

        return Ok(Self {
            handler,
            manager,
            region,
            super_block,
            inode_bitmap: BitMap::from_bytes(&inode_bytes, inodes),
            block_bitmap: BitMap::from_bytes(&block_bytes, blocks),
        });
    }

    /// Stamps a mount into the superblock.
    pub fn record_mount(&mut self) -> Result<(), PartFsError<E>> {
        self.super_block.mount_count += 1;
        self.super_block.mount_time = self.manager.current_time().timestamp();

        return self.write_super_block();
    }

    pub fn super_block(&self) -> &SuperBlock {
        return &self.super_block;
    }

    pub fn region(&self) -> PartitionRegion {
        return self.region;
    }

    pub fn inode_bitmap(&self) -> &BitMap {
        return &self.inode_bitmap;
    }

    pub fn block_bitmap(&self) -> &BitMap {
        return &self.block_bitmap;
    }

    pub fn allocate_inode(&mut self) -> Result<u64, PartFsError<E>> {
        let index = self.take_inode()?;

        self.write_bitmap_byte(true, index)?;
        self.write_super_block()?;
        debug!("allocated inode {}", index);

        return Ok(index);
    }

    pub fn allocate_block(&mut self) -> Result<u64, PartFsError<E>> {
        let index = self.take_block()?;

        self.write_bitmap_byte(false, index)?;
        self.write_super_block()?;
        debug!("allocated block {}", index);

        return Ok(index);
    }

    pub fn free_inode(&mut self, index: u64) -> Result<(), PartFsError<E>> {
        if self.inode_bitmap.bit_at(index as usize) != Some(true) {
            return Err(PartFsError::NotAllocated);
        }

        self.inode_bitmap.set_bit(index as usize, false);
        self.super_block.free_inodes_count += 1;
        self.super_block.first_inode = next_free(&self.inode_bitmap);

        self.write_bitmap_byte(true, index)?;
        self.write_super_block()?;
        debug!("freed inode {}", index);

        return Ok(());
    }

    pub fn free_block(&mut self, index: u64) -> Result<(), PartFsError<E>> {
        if self.block_bitmap.bit_at(index as usize) != Some(true) {
            return Err(PartFsError::NotAllocated);
        }

        self.block_bitmap.set_bit(index as usize, false);
        self.super_block.free_blocks_count += 1;
        self.super_block.first_block = next_free(&self.block_bitmap);

        self.write_bitmap_byte(false, index)?;
        self.write_super_block()?;
        debug!("freed block {}", index);

        return Ok(());
    }

    pub fn read_inode(&self, index: u64) -> Result<Inode, PartFsError<E>> {
        if index >= self.super_block.inodes_count as u64 {
            return Err(PartFsError::CorruptedINode);
        }

        return read_structure(&*self.handler, self.super_block.inode_offset(index));
    }

    pub fn write_inode(&mut self, index: u64, inode: &Inode) -> Result<(), PartFsError<E>> {
        if index >= self.super_block.inodes_count as u64 {
            return Err(PartFsError::CorruptedINode);
        }

        let offset = self.super_block.inode_offset(index);

        return write_structure(self.handler, offset, inode);
    }

    /// Reads a block as the variant selected by its owner's type.
    pub fn read_block(&self, index: u64, kind: InodeType) -> Result<Block, PartFsError<E>> {
        if index >= self.super_block.blocks_count as u64 {
            return Err(PartFsError::CorruptedBlock);
        }

        let bytes = disk_try!(self
            .handler
            .read_bytes(self.super_block.block_offset(index), BLOCK_SIZE));

        return Block::decode(kind, &bytes).ok_or(PartFsError::CorruptedBlock);
    }

    pub fn read_folder_block(&self, index: u64) -> Result<FolderBlock, PartFsError<E>> {
        match self.read_block(index, InodeType::Folder)? {
            Block::Folder(block) => Ok(block),
            Block::File(_) => Err(PartFsError::CorruptedBlock),
        }
    }

    pub fn write_block(&mut self, index: u64, block: &Block) -> Result<(), PartFsError<E>> {
        if index >= self.super_block.blocks_count as u64 {
            return Err(PartFsError::CorruptedBlock);
        }

        disk_try!(self
            .handler
            .write_bytes(&block.to_bytes(), self.super_block.block_offset(index)));

        return Ok(());
    }

    pub(super) fn now(&self) -> i64 {
        return self.manager.current_time().timestamp();
    }

    fn take_inode(&mut self) -> Result<u64, PartFsError<E>> {
        let index = match self.inode_bitmap.find_next_0_index() {
            Some(index) => index,
            None => return Err(PartFsError::NoFreeInodes),
        };

        self.inode_bitmap.set_bit(index, true);
        self.super_block.free_inodes_count -= 1;
        self.super_block.first_inode = next_free(&self.inode_bitmap);

        return Ok(index as u64);
    }

    fn take_block(&mut self) -> Result<u64, PartFsError<E>> {
        let index = match self.block_bitmap.find_next_0_index() {
            Some(index) => index,
            None => return Err(PartFsError::NoFreeBlocks),
        };

        self.block_bitmap.set_bit(index, true);
        self.super_block.free_blocks_count -= 1;
        self.super_block.first_block = next_free(&self.block_bitmap);

        return Ok(index as u64);
    }

    // Only the byte holding the changed bit is rewritten.
    fn write_bitmap_byte(&mut self, inodes: bool, index: u64) -> Result<(), PartFsError<E>> {
        let (bitmap, start) = if inodes {
            (&self.inode_bitmap, self.super_block.bitmap_inode_start)
        } else {
            (&self.block_bitmap, self.super_block.bitmap_block_start)
        };

        let byte_index = (index / 8) as usize;
        let byte = bitmap.as_bytes()[byte_index];

        disk_try!(self.handler.write_bytes(&[byte], start as u64 + byte_index as u64));

        return Ok(());
    }

    fn write_super_block(&mut self) -> Result<(), PartFsError<E>> {
        let start = self.region.start;

        return write_structure(self.handler, start, &self.super_block);
    }
}

fn next_free(bitmap: &BitMap) -> i32 {
    return bitmap.find_next_0_index().unwrap_or(bitmap.len()) as i32;
}
