use crate::PartFsErrorConvertible;
use alloc::vec::Vec;

/// Implementors provide raw access to one disk image. Every call stands alone: an implementation
/// may open the backing storage, perform the access and release it before returning.
/// Locations and amounts are in bytes from the start of the image.
pub trait DiskHandler<E: PartFsErrorConvertible> {
    /// Write a sequence of bytes to a location
    fn write_bytes(&mut self, bytes: &[u8], location: u64) -> Result<(), E>;

    /// Read an amount of bytes from a location. A shorter result is reported as corruption by the caller.
    fn read_bytes(&self, location: u64, amount: u64) -> Result<Vec<u8>, E>;

    /// Zero the range [start, end).
    fn zero_range(&mut self, start: u64, end: u64) -> Result<(), E>;

    /// The raw image size.
    fn disk_size(&self) -> Result<u64, E>;
}
