use thiserror::Error;

/// Problems with what the host was asked to work on.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("validation failed: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_formats() {
        assert_eq!(DomainError::NotFound("service 'x'".into()).to_string(), "not found: service 'x'");
        assert_eq!(DomainError::Validation("bad".into()).to_string(), "validation failed: bad");
    }
}
