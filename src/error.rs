pub type DrivelapseResult<T> = Result<T, DrivelapseError>;

#[derive(thiserror::Error, Debug)]
pub enum DrivelapseError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("track error: {0}")]
    Track(String),

    #[error("provider error: {0}")]
    Provider(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DrivelapseError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn track(msg: impl Into<String>) -> Self {
        Self::Track(msg.into())
    }

    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            DrivelapseError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(DrivelapseError::track("x").to_string().contains("track error:"));
        assert!(
            DrivelapseError::provider("x")
                .to_string()
                .contains("provider error:")
        );
        assert!(
            DrivelapseError::encode("x")
                .to_string()
                .contains("encode error:")
        );
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = DrivelapseError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
