use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("{0} cannot be empty")]
    EmptyField(&'static str),
}

/// Validate that a required text field is present and non-blank.
pub fn require_field(name: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::MissingField(name));
    }
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField(name));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_non_empty() {
        assert!(require_field("name", "Oscilloscope").is_ok());
    }

    #[test]
    fn rejects_empty() {
        assert!(matches!(
            require_field("name", ""),
            Err(ValidationError::MissingField("name"))
        ));
    }

    #[test]
    fn rejects_whitespace_only() {
        assert!(matches!(
            require_field("role", "   "),
            Err(ValidationError::EmptyField("role"))
        ));
    }
}
