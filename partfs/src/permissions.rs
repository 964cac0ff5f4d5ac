use crate::{Identity, Inode};
use core::fmt::{Display, Formatter};
use core::str::FromStr;

/// Three permission digits (owner, group, other), each 0-7.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Permission {
    digits: [u8; 3],
}

/// Which digit of a permission applies to an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessClass {
    Owner,
    Group,
    Other,
}

impl Permission {
    pub const FULL: Permission = Permission { digits: [7, 7, 7] };
    pub const OWNER_ONLY: Permission = Permission { digits: [7, 0, 0] };
    /// Given to new files and folders.
    pub const DEFAULT_ENTRY: Permission = Permission { digits: [6, 6, 4] };

    pub fn new(owner: u8, group: u8, other: u8) -> Option<Self> {
        if owner > 7 || group > 7 || other > 7 {
            return None;
        }

        return Some(Self {
            digits: [owner, group, other],
        });
    }

    pub fn digit(&self, class: AccessClass) -> u8 {
        match class {
            AccessClass::Owner => self.digits[0],
            AccessClass::Group => self.digits[1],
            AccessClass::Other => self.digits[2],
        }
    }

    /// The on-disk form: three ASCII digits.
    pub fn as_ascii(&self) -> [u8; 3] {
        return [
            b'0' + self.digits[0],
            b'0' + self.digits[1],
            b'0' + self.digits[2],
        ];
    }

    pub fn from_ascii(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != 3 {
            return None;
        }

        let mut digits = [0u8; 3];

        for (i, b) in bytes.iter().enumerate() {
            if !(b'0'..=b'7').contains(b) {
                return None;
            }

            digits[i] = b - b'0';
        }

        return Some(Self { digits });
    }
}

impl FromStr for Permission {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        return Self::from_ascii(s.as_bytes()).ok_or(());
    }
}

impl Display for Permission {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}{}{}", self.digits[0], self.digits[1], self.digits[2])
    }
}

/// Owner match wins over group match, which wins over other. Only one class ever applies.
pub fn access_class(inode: &Inode, identity: &Identity) -> AccessClass {
    if inode.uid == identity.uid {
        AccessClass::Owner
    } else if inode.gid == identity.gid {
        AccessClass::Group
    } else {
        AccessClass::Other
    }
}

pub fn has_read(inode: &Inode, identity: &Identity) -> bool {
    if identity.is_root() {
        return true;
    }

    return matches!(inode.permission.digit(access_class(inode, identity)), 4 | 6 | 7);
}

pub fn has_write(inode: &Inode, identity: &Identity) -> bool {
    if identity.is_root() {
        return true;
    }

    return matches!(inode.permission.digit(access_class(inode, identity)), 2 | 3 | 6 | 7);
}

pub fn has_execute(inode: &Inode, identity: &Identity) -> bool {
    if identity.is_root() {
        return true;
    }

    return matches!(inode.permission.digit(access_class(inode, identity)), 1 | 3 | 5 | 7);
}
