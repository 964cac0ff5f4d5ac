use crate::config::{Config, SizeUnit};
use crate::error::{CommandError, ImageError};
use crate::handler::Handler;
use crate::manager::Manager;
use crate::parser::{parse_script, Command};
use crate::{u64_to_sized_string, unit_size};
use log::{info, warn};
use partfs::{DiskImage, FileSystem, MountRegistry, PartFsError, Session, TreeNode};

pub const NO_COMMANDS: &str = "No commands were executed";

/// Runs commands against disk images, holding the mount registry and the login session for
/// the lifetime of the process.
#[derive(Debug)]
pub struct Engine {
    config: Config,
    manager: Manager,
    registry: MountRegistry,
    session: Session,
}

impl Engine {
    pub fn new(config: Config) -> Self {
        let registry = MountRegistry::new(&config.mount_id_suffix);

        return Self {
            config,
            manager: Manager::new(),
            registry,
            session: Session::new(),
        };
    }

    pub fn config(&self) -> &Config {
        return &self.config;
    }

    pub fn registry(&self) -> &MountRegistry {
        return &self.registry;
    }

    pub fn session(&self) -> &Session {
        return &self.session;
    }

    /// Runs every line of `text`. A failing line is reported as `Error: <message>` and the
    /// following lines still run.
    pub fn run_command_line(&mut self, text: &str) -> String {
        let mut output = Vec::new();

        for parsed in parse_script(text) {
            match parsed.and_then(|command| self.execute(command)) {
                Ok(out) => output.push(out),
                Err(e) => {
                    warn!("command failed: {}", e);
                    output.push(format!("Error: {}", e));
                }
            }
        }

        if output.is_empty() {
            return String::from(NO_COMMANDS);
        }

        return output.join("\n");
    }

    pub fn execute(&mut self, command: Command) -> Result<String, CommandError> {
        match command {
            Command::Mkdisk { size, unit, fit, path } => {
                let bytes = to_bytes(size, unit.unwrap_or(self.config.default_disk_unit))?;

                if bytes > i32::MAX as u64 {
                    return Err(PartFsError::<ImageError>::InvalidSize.into());
                }

                let mut handler = Handler::create(&path, bytes)?;

                if let Err(e) = DiskImage::initialize(&mut handler, &self.manager, fit) {
                    let _ = Handler::remove(&path);
                    return Err(e.into());
                }

                info!("created disk {}", path);

                Ok(format!("Disk {} created ({})", path, u64_to_sized_string(bytes)))
            }
            Command::Rmdisk { path } => {
                Handler::remove(&path)?;
                let dropped = self.registry.unmount_disk(&path);

                info!("removed disk {} and {} mount(s)", path, dropped);

                Ok(format!("Disk {} removed", path))
            }
            Command::Fdisk {
                size,
                unit,
                fit,
                path,
                name,
                kind,
            } => {
                let bytes = to_bytes(size, unit.unwrap_or(self.config.default_partition_unit))?;
                let mut handler = Handler::open(&path)?;
                let mut disk = DiskImage::open(&mut handler, &self.manager)?;

                disk.create_partition(kind, bytes, fit, &name)?;

                Ok(format!(
                    "{:?} partition '{}' created ({})",
                    kind,
                    name,
                    u64_to_sized_string(bytes)
                ))
            }
            Command::Mount { path, name } => {
                let mut handler = Handler::open(&path)?;
                let mut disk = DiskImage::open(&mut handler, &self.manager)?;

                let mount = self.registry.mount(&mut disk, &path, &name)?;
                let region = disk.locate(&name)?;

                // Only a partition that already holds a filesystem records the mount.
                if let Ok(mut fs) = FileSystem::open(&mut handler, &self.manager, region) {
                    fs.record_mount()?;
                }

                Ok(format!("Partition '{}' mounted as {}", name, mount.id))
            }
            Command::Mkfs { id, format } => {
                let mount = self.registry.lookup::<ImageError>(&id)?.clone();
                let mut handler = Handler::open(&mount.disk_path)?;
                let region = DiskImage::open(&mut handler, &self.manager)?.locate(&mount.partition_name)?;

                let fs = FileSystem::format(&mut handler, &self.manager, region, format)?;
                let sb = fs.super_block();

                Ok(format!(
                    "Formatted {} with {} inodes and {} blocks",
                    mount.id, sb.inodes_count, sb.blocks_count
                ))
            }
            Command::Mkdir { path, parents } => {
                let identity = self.session.current::<ImageError>()?.clone();

                self.with_mounted_fs(&identity.mount_id, |fs| {
                    Ok(fs.create_folder(&path, parents, &identity)?)
                })?;

                Ok(format!("Folder {} created", path))
            }
            Command::Mkfile { path, size, parents } => {
                let identity = self.session.current::<ImageError>()?.clone();

                self.with_mounted_fs(&identity.mount_id, |fs| {
                    Ok(fs.create_file(&path, size, parents, &identity)?)
                })?;

                Ok(format!("File {} created ({} bytes)", path, size))
            }
            Command::Cat { files } => {
                let identity = self.session.current::<ImageError>()?.clone();

                self.with_mounted_fs(&identity.mount_id, |fs| {
                    let parts: Vec<String> = files
                        .iter()
                        .map(|file| match fs.read_path(file, &identity) {
                            Ok(bytes) => {
                                let mut text = String::from_utf8_lossy(&bytes).into_owned();

                                if text.ends_with('\n') {
                                    text.pop();
                                }

                                text
                            }
                            Err(e) => format!("Error: {}", e),
                        })
                        .collect();

                    Ok(parts.join("\n"))
                })
            }
            Command::Login { user, pass, id } => {
                self.authenticate(&user, &pass, &id)?;

                Ok(format!("Welcome, {}", user))
            }
            Command::Logout => {
                let identity = self.session.logout::<ImageError>()?;

                Ok(format!("Goodbye, {}", identity.username))
            }
            Command::Mkgrp { name } => {
                let identity = self.session.current::<ImageError>()?.clone();
                let gid = self.with_mounted_fs(&identity.mount_id, |fs| {
                    Ok(fs.create_group(&name, &identity)?)
                })?;

                Ok(format!("Group '{}' created with id {}", name, gid))
            }
            Command::Rmgrp { name } => {
                let identity = self.session.current::<ImageError>()?.clone();

                self.with_mounted_fs(&identity.mount_id, |fs| {
                    Ok(fs.remove_group(&name, &identity)?)
                })?;

                Ok(format!("Group '{}' removed", name))
            }
            Command::Mkusr { user, pass, group } => {
                let identity = self.session.current::<ImageError>()?.clone();
                let uid = self.with_mounted_fs(&identity.mount_id, |fs| {
                    Ok(fs.create_user(&user, &pass, &group, &identity)?)
                })?;

                Ok(format!("User '{}' created with id {}", user, uid))
            }
            Command::Rmusr { user } => {
                let identity = self.session.current::<ImageError>()?.clone();

                self.with_mounted_fs(&identity.mount_id, |fs| {
                    Ok(fs.remove_user(&user, &identity)?)
                })?;

                Ok(format!("User '{}' removed", user))
            }
            Command::Mounted => {
                let mounts = self.registry.mounts();

                if mounts.is_empty() {
                    return Ok(String::from("No partitions are mounted"));
                }

                let lines: Vec<String> = mounts
                    .iter()
                    .map(|m| format!("{} {} {}", m.id, m.partition_name, m.disk_path))
                    .collect();

                Ok(lines.join("\n"))
            }
        }
    }

    /// Logs `user` in on the partition mounted as `mount_id`. Fails without touching the session
    /// when someone is already logged in or the credentials do not match.
    pub fn authenticate(&mut self, user: &str, pass: &str, mount_id: &str) -> Result<(), CommandError> {
        if self.session.is_logged_in() {
            return Err(PartFsError::<ImageError>::AlreadyLoggedIn.into());
        }

        let id = self.registry.lookup::<ImageError>(mount_id)?.id.clone();
        let identity = self.with_mounted_fs(&id, |fs| Ok(fs.authenticate(user, pass, &id)?))?;

        self.session.login::<ImageError>(identity)?;

        return Ok(());
    }

    /// The directory tree of a mounted partition. Nothing is written.
    pub fn snapshot_tree(&self, mount_id: &str) -> Result<TreeNode, CommandError> {
        return self.with_mounted_fs(mount_id, |fs| Ok(fs.snapshot_tree()?));
    }

    fn with_mounted_fs<T, F>(&self, mount_id: &str, action: F) -> Result<T, CommandError>
    where
        F: FnOnce(&mut FileSystem<ImageError>) -> Result<T, CommandError>,
    {
        let mount = self.registry.lookup::<ImageError>(mount_id)?;
        let mut handler = Handler::open(&mount.disk_path)?;
        let region = DiskImage::open(&mut handler, &self.manager)?.locate(&mount.partition_name)?;

        let mut fs = FileSystem::open(&mut handler, &self.manager, region)?;

        return action(&mut fs);
    }
}

fn to_bytes(size: u64, unit: SizeUnit) -> Result<u64, CommandError> {
    return match unit_size(size, unit) {
        Some(bytes) => Ok(bytes),
        None => Err(CommandError::Parse(format!("Size {}{} is too large", size, unit.suffix()))),
    };
}
