use std::fmt::{Display, Formatter};
use std::{error, io};

pub type Result<T> = std::result::Result<T, WorkerError>;

#[derive(Debug)]
pub enum WorkerError {
    /// The bounded task queue stayed full for the whole enqueue timeout
    QueueFull,
    /// Submission while the runner is stopping or stopped
    NotRunning,
    InvalidArgument(String),
    Config(config::ConfigError),
    Io(io::Error),
}

impl Display for WorkerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkerError::QueueFull => write!(f, "task queue is full"),
            WorkerError::NotRunning => write!(f, "worker is not running"),
            WorkerError::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
            WorkerError::Config(e) => write!(f, "config error: {}", e),
            WorkerError::Io(e) => write!(f, "io error: {}", e),
        }
    }
}

impl error::Error for WorkerError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            WorkerError::Config(e) => Some(e),
            WorkerError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for WorkerError {
    fn from(err: io::Error) -> Self {
        WorkerError::Io(err)
    }
}

impl From<config::ConfigError> for WorkerError {
    fn from(err: config::ConfigError) -> Self {
        WorkerError::Config(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(WorkerError::QueueFull.to_string(), "task queue is full");
        assert_eq!(WorkerError::NotRunning.to_string(), "worker is not running");
        assert_eq!(
            WorkerError::InvalidArgument("queue_capacity must be > 0".into()).to_string(),
            "invalid argument: queue_capacity must be > 0"
        );
    }

    #[test]
    fn test_io_error_keeps_source() {
        let err: WorkerError = io::Error::new(io::ErrorKind::Other, "spawn failed").into();
        assert!(matches!(err, WorkerError::Io(_)));
        assert!(error::Error::source(&err).is_some());
    }
}
