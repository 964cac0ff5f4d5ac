mod block;
mod ebr;
mod inode;
mod mbr;
mod super_block;

pub use block::{Block, FileBlock, FolderBlock, FolderEntry, BLOCK_SIZE, ENTRY_NAME_LENGTH, FOLDER_ENTRIES};
pub use ebr::{Ebr, EBR_SIZE};
pub use inode::{Inode, InodeType, DIRECT_POINTERS, INODE_SIZE, POINTER_COUNT};
pub use mbr::{
    Fit, Mbr, Partition, PartitionStatus, PartitionType, MAX_PARTITIONS, MBR_SIZE, MOUNT_ID_LENGTH,
    PARTITION_NAME_LENGTH,
};
pub use super_block::{SuperBlock, MAGIC, SUPER_BLOCK_SIZE};
