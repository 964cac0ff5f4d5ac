mod config;
mod engine;
mod error;
mod handler;
mod manager;
mod parser;

pub use config::{Config, SizeUnit, MOUNT_SUFFIX_VAR};
pub use engine::{Engine, NO_COMMANDS};
pub use error::{CommandError, ImageError};
pub use handler::Handler;
pub use manager::Manager;
pub use parser::{parse_line, parse_script, Command};
use byte_unit::Byte;

pub fn sized_string_to_u64(string: &str) -> Option<u64> {
    return match Byte::from_str(string) {
        Ok(b) if b.get_bytes() <= u64::MAX as u128 => Some(b.get_bytes() as u64),
        _ => None,
    };
}

pub fn u64_to_sized_string(n: u64) -> String {
    return Byte::from_bytes(n as u128).get_appropriate_unit(true).to_string();
}

/// Converts a command size and unit to bytes.
pub fn unit_size(n: u64, unit: SizeUnit) -> Option<u64> {
    return sized_string_to_u64(&format!("{}{}", n, unit.suffix()));
}
