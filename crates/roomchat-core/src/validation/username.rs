use crate::error::DomainError;

pub const USERNAME_MIN_CHARS: usize = 3;
pub const USERNAME_MAX_CHARS: usize = 30;

/// `[a-zA-Z0-9_-]{3,30}`
pub fn validate_username(username: &str) -> Result<(), DomainError> {
    let len = username.chars().count();
    if !(USERNAME_MIN_CHARS..=USERNAME_MAX_CHARS).contains(&len) {
        return Err(DomainError::InvalidUsername(format!(
            "must be {USERNAME_MIN_CHARS}-{USERNAME_MAX_CHARS} characters"
        )));
    }

    if let Some(bad) = username
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
    {
        return Err(DomainError::InvalidUsername(format!(
            "character '{bad}' is not allowed; use letters, digits, '_' or '-'"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_usernames() {
        for name in ["abc", "kim_01", "a-b-c", "ABCdef123", &"x".repeat(30)] {
            assert!(validate_username(name).is_ok(), "{name} should pass");
        }
    }

    #[test]
    fn test_length_bounds() {
        assert!(validate_username("ab").is_err());
        assert!(validate_username(&"x".repeat(31)).is_err());
        assert!(validate_username("").is_err());
    }

    #[test]
    fn test_rejected_characters() {
        for name in ["has space", "dot.name", "émile", "kim!", "한국어이름"] {
            assert!(
                matches!(validate_username(name), Err(DomainError::InvalidUsername(_))),
                "{name} should fail"
            );
        }
    }
}
