#![no_std]

#[macro_use]
extern crate alloc;

/// Unwraps a handler result, converting the handler's error into a `PartFsError`.
macro_rules! disk_try {
    ($v:expr) => {
        match $v {
            Ok(val) => val,
            Err(e) => return Err(crate::PartFsErrorConvertible::into_partfs_error(e)),
        }
    };
}

mod bitmap;
mod byte_serializable;
mod disk;
mod fs;
mod manager;
mod mount;
mod partfs_error;
mod permissions;
mod session;
mod users;
mod utils;

pub use bitmap::BitMap;
pub use byte_serializable::{read_structure, write_structure, ByteSerializable};
pub use disk::*;
pub use fs::*;
pub use manager::OSManager;
pub use mount::{MountInfo, MountRegistry, DEFAULT_MOUNT_SUFFIX};
pub use partfs_error::{ErrorKind, PartFsError, PartFsErrorConvertible};
pub use permissions::{access_class, has_execute, has_read, has_write, AccessClass, Permission};
pub use session::{Identity, Session, ROOT_USER};
pub use users::{UserRecord, UsersStore, MAX_USERS_NAME_LENGTH};
