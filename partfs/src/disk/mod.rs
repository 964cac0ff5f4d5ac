// Disk layout:
// MBR at offset 0, then primary/extended partitions. An extended partition holds a chain of
// EBR headers, each followed by its logical partition's data.

mod disk;
mod disk_blocks;
pub mod disk_handler;

pub use disk::{DiskImage, PartitionRegion};
pub use disk_blocks::*;
pub use disk_handler::DiskHandler;
