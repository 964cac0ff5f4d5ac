use crate::{DiskHandler, PartFsError, PartFsErrorConvertible};
use alloc::vec::Vec;

/// A fixed-width on-disk record. Every implementor documents its field order next to its
/// encoder and must always produce exactly `size()` bytes.
pub trait ByteSerializable {
    fn to_bytes(&self) -> Vec<u8>;

    /// Returns None if the bytes are too short or do not describe a valid record.
    fn from_bytes(bytes: &[u8]) -> Option<Self>
    where
        Self: core::marker::Sized;

    /// The width of the record in bytes.
    fn size() -> u64
    where
        Self: core::marker::Sized;

    /// The error reported when a record at some offset fails to decode.
    fn corruption_error<E>() -> PartFsError<E>
    where
        Self: core::marker::Sized,
    {
        return PartFsError::CorruptedBlock;
    }
}

/// Reads and decodes one record at an absolute offset.
pub fn read_structure<T, E>(handler: &dyn crate::DiskHandler<E>, offset: u64) -> Result<T, PartFsError<E>>
where
    T: ByteSerializable,
    E: PartFsErrorConvertible,
{
    let bytes = disk_try!(handler.read_bytes(offset, T::size()));

    if (bytes.len() as u64) < T::size() {
        return Err(T::corruption_error());
    }

    return match T::from_bytes(&bytes) {
        Some(value) => Ok(value),
        None => Err(T::corruption_error()),
    };
}

/// Encodes and writes one record at an absolute offset.
pub fn write_structure<T, E>(
    handler: &mut dyn DiskHandler<E>,
    offset: u64,
    value: &T,
) -> Result<(), PartFsError<E>>
where
    T: ByteSerializable,
    E: PartFsErrorConvertible,
{
    disk_try!(handler.write_bytes(&value.to_bytes(), offset));

    return Ok(());
}
