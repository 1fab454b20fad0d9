// Centralized environment variable keys to avoid repeated string literals.

pub const ENV_XDG_CONFIG_HOME: &str = "XDG_CONFIG_HOME";
pub const ENV_HOME: &str = "HOME";
pub const ENV_PUSH50_HOST: &str = "PUSH50_HOST";
pub const ENV_PUSH50_LOCAL_PATH: &str = "PUSH50_LOCAL_PATH";
