use partfs::DEFAULT_MOUNT_SUFFIX;
use std::str::FromStr;

pub const MOUNT_SUFFIX_VAR: &str = "PARTFS_MOUNT_SUFFIX";

/// Unit accepted by `-unit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeUnit {
    Kilobytes,
    Megabytes,
}

impl SizeUnit {
    /// The suffix understood by `byte-unit`.
    pub fn suffix(&self) -> &'static str {
        match self {
            SizeUnit::Kilobytes => "KiB",
            SizeUnit::Megabytes => "MiB",
        }
    }
}

impl FromStr for SizeUnit {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("K") {
            Ok(SizeUnit::Kilobytes)
        } else if s.eq_ignore_ascii_case("M") {
            Ok(SizeUnit::Megabytes)
        } else {
            Err(())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Prefix of every generated mount id.
    pub mount_id_suffix: String,
    pub default_disk_unit: SizeUnit,
    pub default_partition_unit: SizeUnit,
}

impl Default for Config {
    fn default() -> Self {
        return Self {
            mount_id_suffix: String::from(DEFAULT_MOUNT_SUFFIX),
            default_disk_unit: SizeUnit::Megabytes,
            default_partition_unit: SizeUnit::Kilobytes,
        };
    }
}

impl Config {
    /// Defaults, overridden by `PARTFS_MOUNT_SUFFIX` when it is set and not blank.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(suffix) = std::env::var(MOUNT_SUFFIX_VAR) {
            config = config.with_suffix(&suffix);
        }

        return config;
    }

    pub fn with_suffix(mut self, suffix: &str) -> Self {
        let suffix = suffix.trim();

        if !suffix.is_empty() {
            self.mount_id_suffix = String::from(suffix);
        }

        return self;
    }
}
