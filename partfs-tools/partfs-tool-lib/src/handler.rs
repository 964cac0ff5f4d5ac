use crate::error::ImageError;
use log::debug;
use partfs::DiskHandler;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

const ZERO_CHUNK: usize = 1024;

/// A disk image stored in a regular file. The file is opened for each access and closed when
/// the access returns, so every write is visible to the next reader straight away.
#[derive(Debug, Clone)]
pub struct Handler {
    path: PathBuf,
}

impl Handler {
    /// Creates a zero-filled image of `size` bytes, creating missing parent directories.
    pub fn create<P: AsRef<Path>>(path: P, size: u64) -> Result<Self, ImageError> {
        let path = path.as_ref();

        if path.exists() {
            return Err(ImageError::new(&format!("Disk '{}' already exists", path.display())));
        }

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    return Err(ImageError::new(&format!(
                        "Failed to create folder {}. Error: {}",
                        parent.display(),
                        e
                    )));
                }
            }
        }

        let mut file = match File::create(path) {
            Ok(f) => f,
            Err(e) => return Err(ImageError::new(&format!("Failed to create. Error: {}", e))),
        };

        let zeros = vec![0u8; ZERO_CHUNK];
        let mut remaining = size;

        while remaining > 0 {
            let n = remaining.min(ZERO_CHUNK as u64) as usize;

            if let Err(e) = file.write_all(&zeros[..n]) {
                return Err(ImageError::new(&format!("Failed to write null bytes. Error: {}", e)));
            }

            remaining -= n as u64;
        }

        debug!("created image {} of {} bytes", path.display(), size);

        return Ok(Self {
            path: path.to_path_buf(),
        });
    }

    /// Refers to an existing image.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ImageError> {
        let path = path.as_ref();

        if !path.is_file() {
            return Err(ImageError::new(&format!("Disk '{}' does not exist", path.display())));
        }

        return Ok(Self {
            path: path.to_path_buf(),
        });
    }

    /// Deletes an image file.
    pub fn remove<P: AsRef<Path>>(path: P) -> Result<(), ImageError> {
        let path = path.as_ref();

        if !path.is_file() {
            return Err(ImageError::new(&format!("Disk '{}' does not exist", path.display())));
        }

        return match std::fs::remove_file(path) {
            Ok(_) => Ok(()),
            Err(e) => Err(ImageError::new(&format!(
                "Failed to remove {}. Error: {}",
                path.display(),
                e
            ))),
        };
    }

    fn open_at(&self, write: bool, location: u64) -> Result<File, ImageError> {
        let mut file = match OpenOptions::new().read(true).write(write).open(&self.path) {
            Ok(f) => f,
            Err(e) => {
                return Err(ImageError::new(&format!(
                    "Failed to open file {}. Error: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        if let Err(e) = file.seek(SeekFrom::Start(location)) {
            return Err(ImageError::new(&format!(
                "Failed to seek to location: {}. Error: {}",
                location, e
            )));
        }

        return Ok(file);
    }
}

impl DiskHandler<ImageError> for Handler {
    fn write_bytes(&mut self, bytes: &[u8], location: u64) -> Result<(), ImageError> {
        if self.disk_size()? < location + bytes.len() as u64 {
            return Err(ImageError::new(&format!(
                "File is not large enough to write address: {}",
                location + bytes.len() as u64
            )));
        }

        let mut file = self.open_at(true, location)?;

        return match file.write_all(bytes) {
            Ok(_) => Ok(()),
            Err(e) => Err(ImageError::new(&format!("Failed to write bytes. Error: {}", e))),
        };
    }

    fn read_bytes(&self, location: u64, amount: u64) -> Result<Vec<u8>, ImageError> {
        let file = self.open_at(false, location)?;

        let mut result = Vec::with_capacity(amount as usize);

        return match file.take(amount).read_to_end(&mut result) {
            Ok(_) => Ok(result),
            Err(e) => Err(ImageError::new(&format!("Failed to read bytes. Error: {}", e))),
        };
    }

    fn zero_range(&mut self, start: u64, end: u64) -> Result<(), ImageError> {
        let zeros = vec![0u8; ZERO_CHUNK];
        let mut position = start;

        while position < end {
            let n = (end - position).min(ZERO_CHUNK as u64) as usize;
            self.write_bytes(&zeros[..n], position)?;
            position += n as u64;
        }

        return Ok(());
    }

    fn disk_size(&self) -> Result<u64, ImageError> {
        return match std::fs::metadata(&self.path) {
            Ok(m) => Ok(m.len()),
            Err(e) => Err(ImageError::new(&format!(
                "Could not determine file size. Error: {}",
                e
            ))),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        let path = std::env::temp_dir()
            .join(format!("partfs-handler-{}", std::process::id()))
            .join(name);
        let _ = std::fs::remove_file(&path);

        return path;
    }

    #[test]
    fn test_create_read_write() {
        let path = temp_path("rw.dsk");
        let mut handler = Handler::create(&path, 2048).unwrap();

        assert_eq!(handler.disk_size().unwrap(), 2048);

        handler.write_bytes(&[1, 2, 3], 100).unwrap();
        assert_eq!(handler.read_bytes(99, 5).unwrap(), vec![0, 1, 2, 3, 0]);

        handler.zero_range(100, 102).unwrap();
        assert_eq!(handler.read_bytes(100, 3).unwrap(), vec![0, 0, 3]);

        Handler::remove(&path).unwrap();
    }

    #[test]
    fn test_short_read_and_bounds() {
        let path = temp_path("short.dsk");
        let mut handler = Handler::create(&path, 16).unwrap();

        assert_eq!(handler.read_bytes(10, 10).unwrap().len(), 6);
        assert!(handler.write_bytes(&[0; 4], 14).is_err());

        Handler::remove(&path).unwrap();
    }

    #[test]
    fn test_missing_disk() {
        let path = temp_path("missing.dsk");

        assert!(Handler::open(&path).is_err());
        assert!(Handler::remove(&path).is_err());
    }
}
