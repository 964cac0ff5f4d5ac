#![allow(dead_code)]

extern crate partfs;
use chrono::{DateTime, TimeZone, Utc};
use partfs::{
    DiskHandler, DiskImage, Fit, FileSystem, FormatType, Identity, OSManager, PartFsErrorConvertible,
};

#[derive(Debug, PartialEq, Eq)]
pub struct Error {}

impl PartFsErrorConvertible for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "in-memory disk error")
    }
}

pub struct Handler {
    pub disk: Vec<u8>,
}

impl Handler {
    pub fn new(disk_size: usize) -> Self {
        return Self {
            disk: vec![0u8; disk_size],
        };
    }

    pub fn dump_disk(&self) -> Vec<u8> {
        return self.disk.clone();
    }
}

impl DiskHandler<Error> for Handler {
    fn write_bytes(&mut self, bytes: &[u8], location: u64) -> Result<(), Error> {
        let location = location as usize;

        if location + bytes.len() > self.disk.len() {
            return Err(Error {});
        }

        self.disk[location..location + bytes.len()].copy_from_slice(bytes);

        return Ok(());
    }

    fn read_bytes(&self, location: u64, amount: u64) -> Result<Vec<u8>, Error> {
        let start = (location as usize).min(self.disk.len());
        let end = (location as usize + amount as usize).min(self.disk.len());

        return Ok(self.disk[start..end].to_vec());
    }

    fn zero_range(&mut self, start: u64, end: u64) -> Result<(), Error> {
        for i in start..end {
            self.disk[i as usize] = 0;
        }

        return Ok(());
    }

    fn disk_size(&self) -> Result<u64, Error> {
        return Ok(self.disk.len() as u64);
    }
}

/// A clock stopped at 2020-09-13T12:26:40Z.
#[derive(Debug)]
pub struct Manager {}

impl Manager {
    pub fn new() -> Self {
        return Self {};
    }
}

impl OSManager for Manager {
    fn current_time(&self) -> DateTime<Utc> {
        return Utc.timestamp_opt(1_600_000_000, 0).unwrap();
    }
}

pub const KIB: usize = 1024;

/// A 3000 KiB disk with an initialized MBR.
pub fn new_disk() -> Handler {
    let mut handler = Handler::new(3000 * KIB);
    let manager = Manager::new();

    DiskImage::initialize(&mut handler, &manager, Fit::FirstFit).unwrap();

    return handler;
}

/// A disk holding one formatted 300 KiB primary partition named `Part1`.
pub fn formatted_disk() -> Handler {
    let mut handler = new_disk();
    let manager = Manager::new();

    let region = {
        let mut disk = DiskImage::open(&mut handler, &manager).unwrap();
        disk.create_primary(300 * KIB as u64, Fit::WorstFit, "Part1").unwrap();
        disk.locate("Part1").unwrap()
    };

    FileSystem::format(&mut handler, &manager, region, FormatType::Fast).unwrap();

    return handler;
}

pub fn root() -> Identity {
    return Identity::new("root", 1, 1, "781A");
}

pub fn user(name: &str, uid: i32, gid: i32) -> Identity {
    return Identity::new(name, uid, gid, "781A");
}
