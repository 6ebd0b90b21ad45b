use super::ApiError;

pub const DEFAULT_PAGE_LIMIT: u64 = 20;

pub fn validate_id(resource: &str, id: i32) -> Result<i32, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid {} ID: {}. ID must be a positive integer",
            resource, id
        )));
    }
    Ok(id)
}

pub fn validate_page(page: u64) -> Result<u64, ApiError> {
    if page == 0 {
        return Err(ApiError::validation("Page must be 1 or greater"));
    }
    Ok(page)
}

pub fn validate_limit(limit: u64) -> Result<u64, ApiError> {
    const MAX_LIMIT: u64 = 100;
    const MIN_LIMIT: u64 = 1;

    if !(MIN_LIMIT..=MAX_LIMIT).contains(&limit) {
        return Err(ApiError::validation(format!(
            "Invalid limit: {}. Limit must be between {} and {}",
            limit, MIN_LIMIT, MAX_LIMIT
        )));
    }
    Ok(limit)
}

/// Parses an optional filter value; absent or `"all"` means no filter.
pub fn parse_choice<T: serde::de::DeserializeOwned>(
    name: &str,
    value: Option<&str>,
) -> Result<Option<T>, ApiError> {
    match value.map(str::trim) {
        None | Some("" | "all") => Ok(None),
        Some(v) => serde_json::from_value(serde_json::Value::String(v.to_string()))
            .map(Some)
            .map_err(|_| ApiError::validation(format!("Invalid {}: {}", name, v))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::collection::{ReadStatus, SortKey};

    #[test]
    fn test_validate_id() {
        assert!(validate_id("manga", 1).is_ok());
        assert!(validate_id("manga", 0).is_err());
        assert!(validate_id("manga", -1).is_err());
    }

    #[test]
    fn test_validate_limit() {
        assert!(validate_limit(1).is_ok());
        assert!(validate_limit(100).is_ok());
        assert!(validate_limit(0).is_err());
        assert!(validate_limit(101).is_err());
        assert!(validate_page(0).is_err());
    }

    #[test]
    fn test_parse_choice() {
        assert_eq!(parse_choice::<ReadStatus>("read", None).unwrap(), None);
        assert_eq!(parse_choice::<ReadStatus>("read", Some("all")).unwrap(), None);
        assert_eq!(
            parse_choice::<ReadStatus>("read", Some("partial")).unwrap(),
            Some(ReadStatus::Partial)
        );
        assert_eq!(
            parse_choice::<SortKey>("sort", Some("tomesCount")).unwrap(),
            Some(SortKey::TomeCount)
        );
        assert!(parse_choice::<ReadStatus>("read", Some("sideways")).is_err());
    }
}
