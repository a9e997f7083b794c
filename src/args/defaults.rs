use std::time::Duration;

pub(crate) const DEFAULT_CONCURRENCY: usize = 100;
pub(crate) const DEFAULT_DURATION_SECS: u64 = 30;
pub(crate) const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub(crate) const DEFAULT_DELAY_MIN: Duration = Duration::from_millis(100);
pub(crate) const DEFAULT_DELAY_MAX: Duration = Duration::from_millis(300);
pub(crate) const DEFAULT_BODY_SIZE: usize = 128;
