use alloc::string::String;
use core::fmt::{Debug, Display};

macro_rules! enum_variant_stringify {
    ($self:expr, [$($var:ident),+]) => {
        match $self {
            $(
               $var => stringify!($var),
            )+
            _ => "",
        }
    }
}

pub trait PartFsErrorConvertible: Debug {
    /// Wraps a disk handler error so it can travel through the filesystem layers.
    fn into_partfs_error(self) -> PartFsError<Self>
    where
        Self: Sized,
    {
        return PartFsError::DiskError(self);
    }
}

/// Broad classes used by callers to decide how a failure is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Io,
    Auth,
    Permission,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartFsError<E> {
    // Partition table
    TooManyPartitions,
    DuplicateName(String),
    InsufficientSpace,
    AlreadyExtended,
    NoExtended,
    IsExtended(String),
    PartitionNotFound(String),
    InvalidPartitionName,
    InvalidSize,
    CorruptedMbr,
    CorruptedEbr,

    // Mounts
    AlreadyMounted(String),
    NotMounted(String),
    TooManyDisks,

    // Allocator
    PartitionTooSmall,
    NoFreeInodes,
    NoFreeBlocks,
    NotAllocated,
    CorruptedSuperBlock,
    CorruptedINode,
    CorruptedBlock,

    // Paths
    NotFound(String),
    NotADirectory(String),
    IsADirectory(String),
    AlreadyExists(String),
    MissingParent(String),
    InvalidName(String),
    DirectoryFull,
    FileTooLarge,

    // Permissions and identity
    PermissionDenied(String),
    NotLoggedIn,
    AlreadyLoggedIn,
    InvalidCredentials,
    RootOnly,

    // Users store
    GroupExists(String),
    GroupNotFound(String),
    GroupAlreadyDeleted(String),
    UserExists(String),
    UserNotFound(String),
    UserAlreadyDeleted(String),
    CannotRemoveRoot,
    UsersFileFull,
    CorruptedUsersFile,

    DiskError(E),
}

impl<E> PartFsError<E> {
    pub fn kind(&self) -> ErrorKind {
        use PartFsError::*;

        match self {
            DiskError(_) | CorruptedMbr | CorruptedEbr | CorruptedSuperBlock | CorruptedINode
            | CorruptedBlock | CorruptedUsersFile => ErrorKind::Io,
            NotLoggedIn | AlreadyLoggedIn | InvalidCredentials | RootOnly => ErrorKind::Auth,
            PermissionDenied(_) => ErrorKind::Permission,
            _ => ErrorKind::Validation,
        }
    }
}

impl<E: Display> core::fmt::Display for PartFsError<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        use PartFsError::*;

        match self {
            DiskError(e) => write!(f, "Disk error: {}", e),
            DuplicateName(n) => write!(f, "A partition named '{}' already exists", n),
            IsExtended(n) => write!(f, "Partition '{}' is extended and cannot be mounted", n),
            PartitionNotFound(n) => write!(f, "Partition '{}' does not exist", n),
            AlreadyMounted(n) => write!(f, "Partition '{}' is already mounted", n),
            NotMounted(id) => write!(f, "No partition is mounted with id '{}'", id),
            NotFound(p) => write!(f, "'{}' does not exist", p),
            NotADirectory(p) => write!(f, "'{}' is not a folder", p),
            IsADirectory(p) => write!(f, "'{}' is a folder", p),
            AlreadyExists(p) => write!(f, "'{}' already exists", p),
            MissingParent(p) => write!(f, "Parent folder '{}' does not exist", p),
            InvalidName(n) => write!(f, "Invalid name: '{}'", n),
            PermissionDenied(p) => write!(f, "Permission denied on '{}'", p),
            GroupExists(n) => write!(f, "Group '{}' already exists", n),
            GroupNotFound(n) => write!(f, "Group '{}' does not exist", n),
            GroupAlreadyDeleted(n) => write!(f, "Group '{}' was already deleted", n),
            UserExists(n) => write!(f, "User '{}' already exists", n),
            UserNotFound(n) => write!(f, "User '{}' does not exist", n),
            UserAlreadyDeleted(n) => write!(f, "User '{}' was already deleted", n),
            _ => write!(
                f,
                "{}",
                enum_variant_stringify!(
                    self,
                    [
                        TooManyPartitions,
                        InsufficientSpace,
                        AlreadyExtended,
                        NoExtended,
                        InvalidPartitionName,
                        InvalidSize,
                        CorruptedMbr,
                        CorruptedEbr,
                        TooManyDisks,
                        PartitionTooSmall,
                        NoFreeInodes,
                        NoFreeBlocks,
                        NotAllocated,
                        CorruptedSuperBlock,
                        CorruptedINode,
                        CorruptedBlock,
                        DirectoryFull,
                        FileTooLarge,
                        NotLoggedIn,
                        AlreadyLoggedIn,
                        InvalidCredentials,
                        RootOnly,
                        CannotRemoveRoot,
                        UsersFileFull,
                        CorruptedUsersFile
                    ]
                )
            ),
        }
    }
}
