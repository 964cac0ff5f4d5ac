mod directory;
mod file_system;
mod users_file;

pub use directory::{digit_pattern, path_segments, TreeNode};
pub use file_system::{FileSystem, FormatType, ROOT_INODE, USERS_FILE_NAME, USERS_INODE};
