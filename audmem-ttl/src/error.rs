use thiserror::Error;

#[derive(Debug, Error)]
pub enum TtlError {
    #[error("No {device} found on {port}: {source}")]
    DeviceNotFound {
        device: &'static str,
        port: String,
        #[source]
        source: serialport::Error,
    },

    #[error("TTL write failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid port address '{0}'")]
    InvalidAddress(String),

    #[error("Unknown TTL backend '{0}' (expected None, USB, MMB or ParallelPort)")]
    UnknownBackend(String),

    #[error("{0} is not supported on this platform")]
    Unsupported(&'static str),
}
