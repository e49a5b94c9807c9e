use thiserror::Error;

/// Errors raised while decoding the policy model.
///
/// Evaluation itself never fails. Configuration errors live with the
/// configuration loader.
#[derive(Debug, Error)]
pub enum VigilError {
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for model operations
pub type Result<T> = std::result::Result<T, VigilError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = VigilError::from(json_err);

        assert!(matches!(err, VigilError::Json(_)));
        assert!(err.to_string().contains("EOF"));
    }
}
