use crate::PartFsError;
use alloc::string::String;
use log::info;

pub const ROOT_USER: &str = "root";

/// The authenticated actor that permission checks are made against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
    pub uid: i32,
    pub gid: i32,
    pub mount_id: String,
}

impl Identity {
    pub fn new(username: &str, uid: i32, gid: i32, mount_id: &str) -> Self {
        return Self {
            username: String::from(username),
            uid,
            gid,
            mount_id: String::from(mount_id),
        };
    }

    pub fn is_root(&self) -> bool {
        return self.username.eq_ignore_ascii_case(ROOT_USER);
    }
}

/// Single-slot login register.
#[derive(Debug, Clone, Default)]
pub struct Session {
    current: Option<Identity>,
}

impl Session {
    pub fn new() -> Self {
        return Self { current: None };
    }

    pub fn login<E>(&mut self, identity: Identity) -> Result<(), PartFsError<E>> {
        if self.current.is_some() {
            return Err(PartFsError::AlreadyLoggedIn);
        }

        info!("'{}' logged in on {}", identity.username, identity.mount_id);
        self.current = Some(identity);

        return Ok(());
    }

    pub fn logout<E>(&mut self) -> Result<Identity, PartFsError<E>> {
        return match self.current.take() {
            Some(identity) => {
                info!("'{}' logged out", identity.username);
                Ok(identity)
            }
            None => Err(PartFsError::NotLoggedIn),
        };
    }

    pub fn current<E>(&self) -> Result<&Identity, PartFsError<E>> {
        return self.current.as_ref().ok_or(PartFsError::NotLoggedIn);
    }

    pub fn is_logged_in(&self) -> bool {
        return self.current.is_some();
    }
}
