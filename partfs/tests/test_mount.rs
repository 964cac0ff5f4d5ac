extern crate partfs;
use partfs::{DiskImage, Fit, MountRegistry, PartFsError, PartitionStatus};

mod common;
use common::*;

fn disk_with_partitions() -> Handler {
    let mut handler = new_disk();
    let manager = Manager::new();
    let mut disk = DiskImage::open(&mut handler, &manager).unwrap();

    disk.create_primary(1000, Fit::WorstFit, "Part1").unwrap();
    disk.create_primary(1000, Fit::WorstFit, "Part2").unwrap();
    disk.create_extended(5000, Fit::WorstFit, "Ext").unwrap();
    disk.create_logical(1000, Fit::WorstFit, "Log1").unwrap();

    return handler;
}

#[test]
fn test_mount_id_format() {
    let mut handler = disk_with_partitions();
    let manager = Manager::new();
    let mut registry = MountRegistry::default();
    let mut disk = DiskImage::open(&mut handler, &manager).unwrap();

    let first = registry.mount(&mut disk, "/tmp/a.dsk", "Part1").unwrap();
    let second = registry.mount(&mut disk, "/tmp/a.dsk", "Part2").unwrap();

    assert_eq!(first.id, "781A");
    assert_eq!(second.id, "782A");
    assert_eq!(first.drive_letter, second.drive_letter);
    assert_eq!(registry.lookup::<Error>("781a").unwrap().partition_name, "Part1");
}

#[test]
fn test_mount_persisted_in_table() {
    let mut handler = disk_with_partitions();
    let manager = Manager::new();
    let mut registry = MountRegistry::new("99");
    let mut disk = DiskImage::open(&mut handler, &manager).unwrap();

    registry.mount(&mut disk, "/tmp/a.dsk", "Part2").unwrap();

    let (_, entry) = disk.find_by_name("Part2").unwrap().unwrap();

    assert_eq!(entry.status, PartitionStatus::Mounted);
    assert_eq!(entry.correlative, 1);
    assert_eq!(entry.mount_id, "991A");
}

#[test]
fn test_logical_mount_kept_in_memory() {
    let mut handler = disk_with_partitions();
    let manager = Manager::new();
    let mut registry = MountRegistry::default();
    let mut disk = DiskImage::open(&mut handler, &manager).unwrap();

    let info = registry.mount(&mut disk, "/tmp/a.dsk", "Log1").unwrap();

    assert_eq!(info.id, "781A");
    assert!(!disk.find_logical_by_name("Log1").unwrap().unwrap().mounted);
}

#[test]
fn test_double_mount_rejected() {
    let mut handler = disk_with_partitions();
    let manager = Manager::new();
    let mut registry = MountRegistry::default();
    let mut disk = DiskImage::open(&mut handler, &manager).unwrap();

    registry.mount(&mut disk, "/tmp/a.dsk", "Part1").unwrap();

    assert_eq!(
        registry.mount(&mut disk, "/tmp/a.dsk", "Part1"),
        Err(PartFsError::AlreadyMounted(String::from("Part1")))
    );
    assert_eq!(registry.mounts().len(), 1);
}

#[test]
fn test_extended_and_unknown_rejected() {
    let mut handler = disk_with_partitions();
    let manager = Manager::new();
    let mut registry = MountRegistry::default();
    let mut disk = DiskImage::open(&mut handler, &manager).unwrap();

    assert_eq!(
        registry.mount(&mut disk, "/tmp/a.dsk", "Ext"),
        Err(PartFsError::IsExtended(String::from("Ext")))
    );
    assert_eq!(
        registry.mount(&mut disk, "/tmp/a.dsk", "Nope"),
        Err(PartFsError::PartitionNotFound(String::from("Nope")))
    );
    assert!(registry.mounts().is_empty());
}

#[test]
fn test_letters_per_disk() {
    let mut first = disk_with_partitions();
    let mut second = disk_with_partitions();
    let manager = Manager::new();
    let mut registry = MountRegistry::default();

    let a = {
        let mut disk = DiskImage::open(&mut first, &manager).unwrap();
        registry.mount(&mut disk, "/tmp/one.dsk", "Part1").unwrap()
    };

    let b = {
        let mut disk = DiskImage::open(&mut second, &manager).unwrap();
        registry.mount(&mut disk, "/tmp/two.dsk", "Part1").unwrap()
    };

    let c = {
        let mut disk = DiskImage::open(&mut first, &manager).unwrap();
        registry.mount(&mut disk, "/tmp/one.dsk", "Part2").unwrap()
    };

    assert_eq!(a.drive_letter, 'A');
    assert_eq!(b.drive_letter, 'B');
    assert_eq!(c.drive_letter, 'A');
    assert_eq!(b.id, "781B");
    assert_eq!(c.id, "782A");
}

#[test]
fn test_unmount_disk_keeps_letter() {
    let mut first = disk_with_partitions();
    let mut second = disk_with_partitions();
    let manager = Manager::new();
    let mut registry = MountRegistry::default();

    {
        let mut disk = DiskImage::open(&mut first, &manager).unwrap();
        registry.mount(&mut disk, "/tmp/one.dsk", "Part1").unwrap();
    }

    assert_eq!(registry.unmount_disk("/tmp/one.dsk"), 1);

    let mut disk = DiskImage::open(&mut second, &manager).unwrap();
    let info = registry.mount(&mut disk, "/tmp/two.dsk", "Part1").unwrap();

    assert_eq!(info.drive_letter, 'B');
}
