use crate::{DiskImage, PartFsError, PartFsErrorConvertible};
use alloc::{string::String, vec::Vec};
use log::info;

pub const DEFAULT_MOUNT_SUFFIX: &str = "78";

const MAX_DISKS: usize = 26;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountInfo {
    pub id: String,
    pub disk_path: String,
    pub partition_name: String,
    pub drive_letter: char,
    pub correlative: i32,
}

/// Process-lifetime record of mounted partitions. Ids take the form
/// `<suffix><correlative><letter>`: the letter is assigned per disk path in first-seen order and
/// the correlative counts mounts on that disk.
#[derive(Debug, Clone)]
pub struct MountRegistry {
    suffix: String,
    mounts: Vec<MountInfo>,
    // Letters stay assigned to a path even after its disk is removed.
    disks: Vec<String>,
}

impl MountRegistry {
    pub fn new(suffix: &str) -> Self {
        return Self {
            suffix: String::from(suffix),
            mounts: Vec::new(),
            disks: Vec::new(),
        };
    }

    /// Mounts a primary or logical partition of the disk stored at `disk_path`.
    pub fn mount<E: PartFsErrorConvertible>(
        &mut self,
        disk: &mut DiskImage<E>,
        disk_path: &str,
        name: &str,
    ) -> Result<MountInfo, PartFsError<E>> {
        if self
            .mounts
            .iter()
            .any(|m| m.disk_path == disk_path && m.partition_name == name)
        {
            return Err(PartFsError::AlreadyMounted(String::from(name)));
        }

        disk.locate(name)?;

        let (drive_letter, new_disk) = self.letter_for(disk_path)?;
        let correlative = self.mounts.iter().filter(|m| m.disk_path == disk_path).count() as i32 + 1;
        let id = format!("{}{}{}", self.suffix, correlative, drive_letter);

        disk.mark_mounted(name, correlative, &id)?;

        let info = MountInfo {
            id,
            disk_path: String::from(disk_path),
            partition_name: String::from(name),
            drive_letter,
            correlative,
        };

        if new_disk {
            self.disks.push(String::from(disk_path));
        }

        info!("mounted '{}' from {} as {}", name, disk_path, info.id);
        self.mounts.push(info.clone());

        return Ok(info);
    }

    /// Finds a mount by id, ignoring case.
    pub fn lookup<E>(&self, id: &str) -> Result<&MountInfo, PartFsError<E>> {
        return match self.mounts.iter().find(|m| m.id.eq_ignore_ascii_case(id)) {
            Some(m) => Ok(m),
            None => Err(PartFsError::NotMounted(String::from(id))),
        };
    }

    pub fn mounts(&self) -> &[MountInfo] {
        return &self.mounts;
    }

    /// Forgets every mount of a disk that no longer exists.
    pub fn unmount_disk(&mut self, disk_path: &str) -> usize {
        let before = self.mounts.len();
        self.mounts.retain(|m| m.disk_path != disk_path);

        return before - self.mounts.len();
    }

    fn letter_for<E>(&self, disk_path: &str) -> Result<(char, bool), PartFsError<E>> {
        let (index, new_disk) = match self.disks.iter().position(|d| d == disk_path) {
            Some(index) => (index, false),
            None => (self.disks.len(), true),
        };

        if index >= MAX_DISKS {
            return Err(PartFsError::TooManyDisks);
        }

        return Ok(((b'A' + index as u8) as char, new_disk));
    }
}

impl Default for MountRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_MOUNT_SUFFIX)
    }
}
