use super::ApiError;

pub fn validate_child_id(id: i32) -> Result<i32, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid child ID: {}. ID must be a positive integer",
            id
        )));
    }
    Ok(id)
}

pub fn validate_amount(amount: i32) -> Result<i32, ApiError> {
    if amount <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid amount: {}. Amount must be a positive number of minutes",
            amount
        )));
    }
    Ok(amount)
}

pub fn validate_allowance(minutes: i32) -> Result<i32, ApiError> {
    if minutes <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid daily allowance: {}. Allowance must be a positive number of minutes",
            minutes
        )));
    }
    Ok(minutes)
}

pub fn validate_reason(reason: &str) -> Result<&str, ApiError> {
    let trimmed = reason.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Reason cannot be empty"));
    }
    Ok(trimmed)
}

pub fn validate_name(name: &str) -> Result<&str, ApiError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Name cannot be empty"));
    }
    if trimmed.len() > 100 {
        return Err(ApiError::validation("Name must be 100 characters or less"));
    }
    Ok(trimmed)
}

pub fn validate_username(username: &str) -> Result<&str, ApiError> {
    let trimmed = username.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Username cannot be empty"));
    }

    if trimmed.len() > 50 {
        return Err(ApiError::validation(
            "Username must be 50 characters or less",
        ));
    }

    if !trimmed
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.')
    {
        return Err(ApiError::validation(
            "Username can only contain letters, numbers, hyphens, underscores, and dots",
        ));
    }

    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_child_id() {
        assert!(validate_child_id(1).is_ok());
        assert!(validate_child_id(12345).is_ok());
        assert!(validate_child_id(0).is_err());
        assert!(validate_child_id(-1).is_err());
    }

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount(1).is_ok());
        assert!(validate_amount(180).is_ok());
        assert!(validate_amount(0).is_err());
        assert!(validate_amount(-30).is_err());
    }

    #[test]
    fn test_validate_reason() {
        assert!(validate_reason("Homework done").is_ok());
        assert_eq!(validate_reason("  trimmed  ").unwrap(), "trimmed");
        assert!(validate_reason("").is_err());
        assert!(validate_reason("   ").is_err());
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("alex").is_ok());
        assert!(validate_username("alex_2014").is_ok());
        assert!(validate_username("a.b-c").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username("a".repeat(51).as_str()).is_err());
    }
}
