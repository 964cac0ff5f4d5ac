use chrono::DateTime;
use chrono::Utc;
use core::fmt::Debug;

/// Provide OS specific methods
pub trait OSManager: Debug {
    fn current_time(&self) -> DateTime<Utc>;

    /// The signature stamped into a new MBR. Defaults to the low bits of the current time.
    fn disk_signature(&self) -> i32 {
        return self.current_time().timestamp_subsec_nanos() as i32;
    }
}
