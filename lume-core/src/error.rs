use thiserror::Error;

#[derive(Debug, Error)]
pub enum LumeError {
    #[error("Instance Creation Failed: {0}")]
    InstanceCreationFailed(String),
    #[error("Device Creation Failed: {0}")]
    DeviceCreationFailed(String),
    #[error("Surface Creation Failed: {0}")]
    SurfaceCreationFailed(String),
    #[error("Resource Creation Failed: {0}")]
    ResourceCreationFailed(String),
    #[error("Pipeline Creation Failed: {0}")]
    PipelineCreationFailed(String),
    #[error("Shader Compilation Failed: {0}")]
    ShaderCompilationFailed(String),
    #[error("Submission Failed: {0}")]
    SubmissionFailed(String),
    #[error("Backend Error: {0}")]
    BackendError(String),
    /// The swapchain no longer matches the surface and has to be recreated.
    #[error("Swapchain out of date")]
    SwapchainOutOfDate,
    #[error("Out of Memory")]
    OutOfMemory,
    #[error("Error: {0}")]
    Generic(&'static str),
}

impl LumeError {
    /// Everything except an out-of-date swapchain is fatal for a frame.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, LumeError::SwapchainOutOfDate)
    }
}

pub type LumeResult<T> = Result<T, LumeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_keeps_backend_message() {
        let err = LumeError::BackendError("queue lost".to_string());
        assert_eq!(err.to_string(), "Backend Error: queue lost");
    }

    #[test]
    fn test_only_out_of_date_is_recoverable() {
        assert!(LumeError::SwapchainOutOfDate.is_recoverable());
        assert!(!LumeError::OutOfMemory.is_recoverable());
        assert!(!LumeError::Generic("x").is_recoverable());
    }
}
