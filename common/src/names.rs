pub const SECRET_SENSORPUSH_USER: &str = "SENSORPUSH_USER";
pub const SECRET_SENSORPUSH_PASSWORD: &str = "SENSORPUSH_PASSWORD";
pub const SECRET_IFTTT_KEY: &str = "IFTTT_KEY";

pub const DEFAULT_FANS_ON_EVENT: &str = "greenhouse_temp_over_limit";
pub const DEFAULT_FANS_OFF_EVENT: &str = "greenhouse_temp_under_limit";

pub const ENV_SENSOR_ID: &str = "GREENHOUSE_SENSOR_ID";
pub const ENV_SAMPLE_LIMIT: &str = "SAMPLE_LIMIT";
pub const ENV_HIGH_TRIGGER: &str = "TEMPERATURE_HIGH_TRIGGER";
pub const ENV_LOW_TRIGGER: &str = "TEMPERATURE_LOW_TRIGGER";
pub const ENV_FANS_ON_EVENT: &str = "FANS_ON_EVENT";
pub const ENV_FANS_OFF_EVENT: &str = "FANS_OFF_EVENT";
pub const ENV_UPSTREAM_TIMEOUT_SECS: &str = "UPSTREAM_TIMEOUT_SECS";
pub const ENV_TIMEZONE: &str = "TIMEZONE";
pub const ENV_PORT: &str = "PORT";
pub const ENV_SECRETS_DIR: &str = "SECRETS_DIR";
