use super::disk_blocks::{
    Ebr, Fit, Mbr, Partition, PartitionStatus, PartitionType, EBR_SIZE, MAX_PARTITIONS, MBR_SIZE,
    PARTITION_NAME_LENGTH,
};
use super::DiskHandler;
use crate::utils::fits_field;
use crate::{read_structure, write_structure, OSManager, PartFsError, PartFsErrorConvertible};
use alloc::{string::String, vec::Vec};
use log::debug;

/// The byte range a mountable partition offers to a filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionRegion {
    pub start: u64,
    pub size: u64,
    pub kind: PartitionType,
}

impl PartitionRegion {
    pub fn end(&self) -> u64 {
        return self.start + self.size;
    }
}

/// A disk image with an MBR partition table. Nothing is cached: every operation reads the
/// table it needs and writes back what it changes.
pub struct DiskImage<'a, 'b, E: PartFsErrorConvertible> {
    handler: &'a mut dyn DiskHandler<E>,
    manager: &'b dyn OSManager,
}

impl<'a, 'b, E: PartFsErrorConvertible> DiskImage<'a, 'b, E> {
    /// Writes a fresh MBR with four unused entries over the whole image.
    pub fn initialize(
        handler: &'a mut dyn DiskHandler<E>,
        manager: &'b dyn OSManager,
        fit: Fit,
    ) -> Result<Self, PartFsError<E>> {
        let size = disk_try!(handler.disk_size());

        if size <= MBR_SIZE || size > i32::MAX as u64 {
            return Err(PartFsError::InvalidSize);
        }

        let mbr = Mbr::new(
            size as i32,
            manager.current_time().timestamp(),
            manager.disk_signature(),
            fit,
        );

        write_structure(handler, 0, &mbr)?;
        debug!("initialized disk of {} bytes with signature {}", size, mbr.signature);

        return Ok(Self { handler, manager });
    }

    /// Opens an existing image, validating its MBR.
    pub fn open(
        handler: &'a mut dyn DiskHandler<E>,
        manager: &'b dyn OSManager,
    ) -> Result<Self, PartFsError<E>> {
        let disk = Self { handler, manager };
        disk.mbr()?;

        return Ok(disk);
    }

    /// The time source this image was opened with.
    pub fn manager(&self) -> &dyn OSManager {
        return self.manager;
    }

    pub fn mbr(&self) -> Result<Mbr, PartFsError<E>> {
        return read_structure(&*self.handler, 0);
    }

    pub fn create_partition(
        &mut self,
        kind: PartitionType,
        size: u64,
        fit: Fit,
        name: &str,
    ) -> Result<(), PartFsError<E>> {
        match kind {
            PartitionType::Primary => self.create_primary(size, fit, name),
            PartitionType::Extended => self.create_extended(size, fit, name),
            PartitionType::Logical => self.create_logical(size, fit, name),
        }
    }

    pub fn create_primary(&mut self, size: u64, fit: Fit, name: &str) -> Result<(), PartFsError<E>> {
        self.create_table_entry(PartitionType::Primary, size, fit, name)?;

        return Ok(());
    }

    /// Creates the extended partition and seeds its EBR chain with a placeholder.
    pub fn create_extended(&mut self, size: u64, fit: Fit, name: &str) -> Result<(), PartFsError<E>> {
        if size < EBR_SIZE {
            return Err(PartFsError::InvalidSize);
        }

        self.create_table_entry(PartitionType::Extended, size, fit, name)?;

        return Ok(());
    }

    /// Appends a logical partition after the last one in the extended partition's chain.
    pub fn create_logical(&mut self, size: u64, fit: Fit, name: &str) -> Result<(), PartFsError<E>> {
        let mbr = self.mbr()?;
        let size = Self::validate(size, name)?;

        if size <= EBR_SIZE as i32 {
            return Err(PartFsError::InvalidSize);
        }

        let extended = match mbr.extended() {
            Some(p) => p.clone(),
            None => return Err(PartFsError::NoExtended),
        };

        if self.name_taken(&mbr, name)? {
            return Err(PartFsError::DuplicateName(String::from(name)));
        }

        let mut position = extended.start;

        loop {
            let mut current: Ebr = read_structure(&*self.handler, position as u64)?;

            if current.is_placeholder() {
                if position as i64 + size as i64 > extended.end() {
                    return Err(PartFsError::InsufficientSpace);
                }

                let mut ebr = Ebr::new(position, size, fit, name);
                ebr.next = current.next;

                write_structure(self.handler, position as u64, &ebr)?;
                debug!("logical partition '{}' written over the placeholder at {}", name, position);

                return Ok(());
            }

            if current.next == -1 {
                let start = current.end();

                if start + size as i64 > extended.end() {
                    return Err(PartFsError::InsufficientSpace);
                }

                let ebr = Ebr::new(start as i32, size, fit, name);
                write_structure(self.handler, start as u64, &ebr)?;

                current.next = start as i32;
                write_structure(self.handler, position as u64, &current)?;
                debug!("logical partition '{}' appended at {}", name, start);

                return Ok(());
            }

            position = Self::follow(&extended, position, current.next)?;
        }
    }

    /// The table entry with the given name, with its slot index.
    pub fn find_by_name(&self, name: &str) -> Result<Option<(usize, Partition)>, PartFsError<E>> {
        let mbr = self.mbr()?;

        return Ok(mbr
            .partitions
            .iter()
            .enumerate()
            .find(|(_, p)| p.is_used() && p.name == name)
            .map(|(i, p)| (i, p.clone())));
    }

    pub fn find_logical_by_name(&self, name: &str) -> Result<Option<Ebr>, PartFsError<E>> {
        let mbr = self.mbr()?;

        return Ok(self
            .walk_chain(&mbr)?
            .into_iter()
            .find(|ebr| ebr.name == name));
    }

    /// The logical partitions in chain order, placeholder excluded.
    pub fn logical_partitions(&self) -> Result<Vec<Ebr>, PartFsError<E>> {
        let mbr = self.mbr()?;

        return self.walk_chain(&mbr);
    }

    /// Resolves a mountable partition to its usable region.
    pub fn locate(&self, name: &str) -> Result<PartitionRegion, PartFsError<E>> {
        if let Some((_, partition)) = self.find_by_name(name)? {
            if partition.kind == PartitionType::Extended {
                return Err(PartFsError::IsExtended(String::from(name)));
            }

            return Ok(PartitionRegion {
                start: partition.start as u64,
                size: partition.size as u64,
                kind: partition.kind,
            });
        }

        if let Some(ebr) = self.find_logical_by_name(name)? {
            return Ok(PartitionRegion {
                start: ebr.data_start(),
                size: ebr.size as u64 - EBR_SIZE,
                kind: PartitionType::Logical,
            });
        }

        return Err(PartFsError::PartitionNotFound(String::from(name)));
    }

    /// Records a mount in the partition table. Logical partitions keep their mount state in
    /// memory only, so their EBR is left untouched.
    pub fn mark_mounted(&mut self, name: &str, correlative: i32, mount_id: &str) -> Result<(), PartFsError<E>> {
        let mut mbr = self.mbr()?;

        let slot = match mbr.partitions.iter().position(|p| p.is_used() && p.name == name) {
            Some(slot) => slot,
            None => return Ok(()),
        };

        let partition = &mut mbr.partitions[slot];
        partition.status = PartitionStatus::Mounted;
        partition.correlative = correlative;
        partition.mount_id = String::from(mount_id);

        return write_structure(self.handler, 0, &mbr);
    }

    fn create_table_entry(
        &mut self,
        kind: PartitionType,
        size: u64,
        fit: Fit,
        name: &str,
    ) -> Result<usize, PartFsError<E>> {
        let mut mbr = self.mbr()?;
        let size = Self::validate(size, name)?;

        let slot = match mbr.partitions.iter().position(|p| !p.is_used()) {
            Some(slot) => slot,
            None => return Err(PartFsError::TooManyPartitions),
        };

        if kind == PartitionType::Extended && mbr.extended().is_some() {
            return Err(PartFsError::AlreadyExtended);
        }

        if self.name_taken(&mbr, name)? {
            return Err(PartFsError::DuplicateName(String::from(name)));
        }

        let start = mbr
            .used_partitions()
            .map(|p| p.end())
            .max()
            .unwrap_or(MBR_SIZE as i64);

        if start + size as i64 > mbr.size as i64 {
            return Err(PartFsError::InsufficientSpace);
        }

        if kind == PartitionType::Extended {
            write_structure(self.handler, start as u64, &Ebr::placeholder(start as i32, fit))?;
        }

        mbr.partitions[slot] = Partition::new(kind, fit, start as i32, size, name);
        write_structure(self.handler, 0, &mbr)?;

        debug!(
            "partition '{}' ({:?}) created in slot {} of {} at {}",
            name, kind, slot, MAX_PARTITIONS, start
        );

        return Ok(slot);
    }

    fn validate(size: u64, name: &str) -> Result<i32, PartFsError<E>> {
        if !fits_field(name, PARTITION_NAME_LENGTH) {
            return Err(PartFsError::InvalidPartitionName);
        }

        if size == 0 || size > i32::MAX as u64 {
            return Err(PartFsError::InvalidSize);
        }

        return Ok(size as i32);
    }

    fn name_taken(&self, mbr: &Mbr, name: &str) -> Result<bool, PartFsError<E>> {
        if mbr.used_partitions().any(|p| p.name == name) {
            return Ok(true);
        }

        return Ok(self.walk_chain(mbr)?.iter().any(|ebr| ebr.name == name));
    }

    fn walk_chain(&self, mbr: &Mbr) -> Result<Vec<Ebr>, PartFsError<E>> {
        let mut res = Vec::new();

        let extended = match mbr.extended() {
            Some(p) => p,
            None => return Ok(res),
        };

        let mut position = extended.start;

        loop {
            let ebr: Ebr = read_structure(&*self.handler, position as u64)?;
            let next = ebr.next;

            if !ebr.is_placeholder() {
                res.push(ebr);
            }

            if next == -1 {
                return Ok(res);
            }

            position = Self::follow(extended, position, next)?;
        }
    }

    // A link must move forward and stay inside the extended partition, which also rules out cycles.
    fn follow(extended: &Partition, position: i32, next: i32) -> Result<i32, PartFsError<E>> {
        if next <= position || next as i64 + EBR_SIZE as i64 > extended.end() {
            return Err(PartFsError::CorruptedEbr);
        }

        return Ok(next);
    }
}
