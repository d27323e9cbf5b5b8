//! Runtime error codes.

use thiserror::Error;

/// Errors reported by the device runtime.
///
/// Every variant is fatal to the operation that produced it; the runtime
/// never retries a launch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    #[error("kernel `{kernel}` failed at launch #{launch}")]
    LaunchFailed { kernel: &'static str, launch: usize },
    #[error("shared memory request of {requested} bytes exceeds the {available} bytes per group")]
    SharedMemoryExceeded { requested: usize, available: usize },
    #[error("invalid launch domain: {0}")]
    InvalidDomain(String),
    #[error("buffer belongs to device #{buffer} but the stream runs on device #{stream}")]
    DeviceMismatch { buffer: u64, stream: u64 },
    #[error("buffer has been released")]
    BufferReleased,
    #[error("scan input has {input} elements but output has {output}")]
    ScanSizeMismatch { input: usize, output: usize },
    #[error("scan temp storage too small: need {required} slots, got {provided}")]
    TempTooSmall { required: usize, provided: usize },
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
