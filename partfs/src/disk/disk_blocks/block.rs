use super::inode::InodeType;
use crate::utils::{read_fixed_str, write_fixed_str};
use crate::ByteSerializable;
use alloc::{string::String, vec, vec::Vec};
use byteorder::{ByteOrder, LittleEndian};

pub const BLOCK_SIZE: u64 = 64;
pub const FOLDER_ENTRIES: usize = 4;
pub const ENTRY_NAME_LENGTH: usize = 12;

const ENTRY_SIZE: usize = ENTRY_NAME_LENGTH + 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderEntry {
    pub name: String,
    /// -1 when the entry is free.
    pub inode: i32,
}

impl FolderEntry {
    pub fn free() -> Self {
        return Self {
            name: String::new(),
            inode: -1,
        };
    }

    pub fn new(name: &str, inode: u64) -> Self {
        return Self {
            name: String::from(name),
            inode: inode as i32,
        };
    }

    pub fn is_free(&self) -> bool {
        return self.inode < 0 || self.name.is_empty();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderBlock {
    pub entries: [FolderEntry; FOLDER_ENTRIES],
}

impl FolderBlock {
    pub fn new() -> Self {
        return Self {
            entries: [
                FolderEntry::free(),
                FolderEntry::free(),
                FolderEntry::free(),
                FolderEntry::free(),
            ],
        };
    }

    /// A block holding the `.` and `..` entries of a new folder.
    pub fn with_links(own: u64, parent: u64) -> Self {
        let mut block = Self::new();
        block.entries[0] = FolderEntry::new(".", own);
        block.entries[1] = FolderEntry::new("..", parent);

        return block;
    }

    pub fn find(&self, name: &str) -> Option<&FolderEntry> {
        return self.entries.iter().find(|e| !e.is_free() && e.name == name);
    }

    /// Stores the entry in the first free slot. Returns false when the block is full.
    pub fn insert(&mut self, entry: FolderEntry) -> bool {
        match self.entries.iter_mut().find(|e| e.is_free()) {
            Some(slot) => {
                *slot = entry;
                true
            }
            None => false,
        }
    }

    pub fn has_space(&self) -> bool {
        return self.entries.iter().any(|e| e.is_free());
    }
}

impl Default for FolderBlock {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteSerializable for FolderBlock {
    fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = vec![0u8; BLOCK_SIZE as usize];

        for (i, entry) in self.entries.iter().enumerate() {
            let offset = i * ENTRY_SIZE;
            write_fixed_str(&mut bytes[offset..offset + ENTRY_NAME_LENGTH], &entry.name);
            LittleEndian::write_i32(&mut bytes[offset + ENTRY_NAME_LENGTH..], entry.inode);
        }

        return bytes;
    }

    fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < BLOCK_SIZE as usize {
            return None;
        }

        let mut block = Self::new();

        for (i, entry) in block.entries.iter_mut().enumerate() {
            let offset = i * ENTRY_SIZE;

            *entry = FolderEntry {
                name: read_fixed_str(&bytes[offset..offset + ENTRY_NAME_LENGTH]),
                inode: LittleEndian::read_i32(&bytes[offset + ENTRY_NAME_LENGTH..]),
            };
        }

        return Some(block);
    }

    fn size() -> u64 {
        return BLOCK_SIZE;
    }
}

/// Raw file content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileBlock {
    pub content: [u8; BLOCK_SIZE as usize],
}

impl FileBlock {
    /// Copies up to one block of `data`, zero padding the rest.
    pub fn new(data: &[u8]) -> Self {
        let mut content = [0u8; BLOCK_SIZE as usize];
        let len = data.len().min(content.len());
        content[..len].copy_from_slice(&data[..len]);

        return Self { content };
    }
}

impl ByteSerializable for FileBlock {
    fn to_bytes(&self) -> Vec<u8> {
        return self.content.to_vec();
    }

    fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < BLOCK_SIZE as usize {
            return None;
        }

        return Some(Self::new(&bytes[..BLOCK_SIZE as usize]));
    }

    fn size() -> u64 {
        return BLOCK_SIZE;
    }
}

/// A data block, interpreted according to the type of the inode that owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    File(FileBlock),
    Folder(FolderBlock),
}

impl Block {
    pub fn decode(kind: InodeType, bytes: &[u8]) -> Option<Self> {
        match kind {
            InodeType::File => FileBlock::from_bytes(bytes).map(Block::File),
            InodeType::Folder => FolderBlock::from_bytes(bytes).map(Block::Folder),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Block::File(b) => b.to_bytes(),
            Block::Folder(b) => b.to_bytes(),
        }
    }
}
