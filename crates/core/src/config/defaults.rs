//! Default values and functions for configuration

// Default constants
pub const DEFAULT_EVENT_KEY: &str = "mods-changed";
pub const DEFAULT_DISABLED_PREFIX: &str = "DISABLED ";

pub(crate) fn default_event_key() -> String {
    DEFAULT_EVENT_KEY.to_string()
}

pub(crate) fn default_disabled_prefix() -> String {
    DEFAULT_DISABLED_PREFIX.to_string()
}

pub(crate) fn default_one_level() -> bool {
    true
}

pub(crate) fn default_queue_capacity() -> usize {
    1024
}

pub(crate) fn default_max_init_retries() -> u32 {
    3
}

pub(crate) fn default_retry_delay_ms() -> u64 {
    100
}
