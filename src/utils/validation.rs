//! Centralized validation of user supplied lookup input.

/// Maximum length of a lookup name, allele strings included (DOS protection)
pub const MAX_LOOKUP_NAME_LENGTH: usize = 8_192;

/// Maximum number of names in a single allele string (DOS protection)
pub const MAX_ALLELE_STRING_PARTS: usize = 1_000;

/// Maximum length of a nomenclature version identifier
pub const MAX_VERSION_LENGTH: usize = 32;

/// Input validation error types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Empty lookup name provided")]
    EmptyLookupName,
    #[error("Lookup name too long: exceeds {MAX_LOOKUP_NAME_LENGTH} characters")]
    LookupNameTooLong,
    #[error("Invalid lookup name '{0}': contains characters not used in HLA names")]
    InvalidLookupName(String),
    #[error("Empty nomenclature version provided")]
    EmptyVersion,
    #[error("Invalid nomenclature version '{0}'")]
    InvalidVersion(String),
}

/// Validate a typing name before it reaches the lookup dispatcher.
///
/// Accepts the characters HLA names are written with (letters, digits, `:`,
/// `/` and a `*` locus separator) and returns the trimmed name.
///
/// # Examples
///
/// ```
/// use hla_dictionary::utils::validation::validate_lookup_name;
///
/// assert_eq!(validate_lookup_name(" 01:01:01 ").unwrap(), "01:01:01");
/// assert!(validate_lookup_name("01:01;DROP").is_err());
/// ```
///
/// # Errors
///
/// Returns `ValidationError::EmptyLookupName` if the name is empty,
/// `ValidationError::LookupNameTooLong` if it exceeds the limit, or
/// `ValidationError::InvalidLookupName` if it contains other characters.
pub fn validate_lookup_name(name: &str) -> Result<&str, ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyLookupName);
    }

    if trimmed.len() > MAX_LOOKUP_NAME_LENGTH {
        return Err(ValidationError::LookupNameTooLong);
    }

    if !trimmed
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, ':' | '/' | '*'))
    {
        return Err(ValidationError::InvalidLookupName(trimmed.to_string()));
    }

    Ok(trimmed)
}

/// Validate a nomenclature version identifier.
///
/// Versions name files on disk (`<dir>/<version>.json`), so path separators
/// and traversal sequences are rejected.
///
/// # Errors
///
/// Returns `ValidationError::EmptyVersion` or `ValidationError::InvalidVersion`.
pub fn validate_version(version: &str) -> Result<(), ValidationError> {
    if version.trim().is_empty() {
        return Err(ValidationError::EmptyVersion);
    }

    let valid = version.len() <= MAX_VERSION_LENGTH
        && !version.contains("..")
        && version
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'));

    if valid {
        Ok(())
    } else {
        Err(ValidationError::InvalidVersion(version.to_string()))
    }
}

/// Check if an allele string has more names than allowed.
///
/// Returns an error message if the count exceeds the limit, None if safe.
#[must_use]
pub fn check_allele_string_limit(count: usize) -> Option<String> {
    if count > MAX_ALLELE_STRING_PARTS {
        Some(format!(
            "Too many names in allele string: {count} exceeds maximum of {MAX_ALLELE_STRING_PARTS}"
        ))
    } else {
        None
    }
}
