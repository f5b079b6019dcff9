use thiserror::Error;

/// Infrastructure errors that can occur during startup.
///
/// Display messages never include the Redis URL. The #[source] chain may, so
/// log with Display (%e) rather than Debug (?e).
#[derive(Error, Debug)]
pub enum InfraError {
    #[error("Redis connection failed. Check REDIS_URL and credentials.")]
    RedisConnection(#[source] redis::RedisError),

    #[error("Configuration error: {var} is invalid ({reason})")]
    ConfigInvalid { var: &'static str, reason: String },

    #[error("Cannot open log file {path}")]
    LogFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
