//! Resource name rules.

use rand::Rng;

use crate::error::{StoreError, StoreResult};

/// Longest accepted resource name.
pub const MAX_NAME_LENGTH: usize = 253;

/// Length of the random suffix appended to a `generate_name` prefix.
pub const GENERATED_SUFFIX_LENGTH: usize = 5;

const SUFFIX_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Check that `name` is a valid resource name.
///
/// Names are 1 to 253 characters of lowercase ASCII letters, digits, `-`
/// and `.`, and must start and end with a letter or digit.
pub fn validate_name(name: &str) -> StoreResult<()> {
    if name.is_empty() {
        return Err(StoreError::ValidationFailed("name must not be empty".to_string()));
    }
    if name.len() > MAX_NAME_LENGTH {
        return Err(StoreError::ValidationFailed(format!(
            "name must be at most {} characters, got {}",
            MAX_NAME_LENGTH,
            name.len()
        )));
    }

    let is_alnum = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit();
    if let Some(bad) = name.chars().find(|c| !(is_alnum(*c) || *c == '-' || *c == '.')) {
        return Err(StoreError::ValidationFailed(format!(
            "name \"{}\" contains invalid character {:?}",
            name, bad
        )));
    }
    if !name.starts_with(is_alnum) || !name.ends_with(is_alnum) {
        return Err(StoreError::ValidationFailed(format!(
            "name \"{}\" must start and end with a lowercase letter or digit",
            name
        )));
    }
    Ok(())
}

/// Append a random lowercase alphanumeric suffix to `prefix`.
///
/// The prefix is shortened if needed so the result fits in
/// [`MAX_NAME_LENGTH`].
pub fn generate_name(prefix: &str) -> String {
    let keep = prefix.len().min(MAX_NAME_LENGTH - GENERATED_SUFFIX_LENGTH);
    let mut end = keep;
    while !prefix.is_char_boundary(end) {
        end -= 1;
    }

    let mut rng = rand::thread_rng();
    let suffix: String = (0..GENERATED_SUFFIX_LENGTH)
        .map(|_| SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())] as char)
        .collect();
    format!("{}{}", &prefix[..end], suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        for name in ["acme", "a", "acme-corp", "acme.corp", "0rg-1", &"a".repeat(253)] {
            assert!(validate_name(name).is_ok(), "{} should be valid", name);
        }
    }

    #[test]
    fn test_invalid_names() {
        for name in ["", "Acme", "-acme", "acme-", "acme_corp", "ac me", ".acme", &"a".repeat(254)] {
            assert!(
                matches!(validate_name(name), Err(StoreError::ValidationFailed(_))),
                "{:?} should be rejected",
                name
            );
        }
    }

    #[test]
    fn test_generate_name() {
        let name = generate_name("org-");
        assert!(name.starts_with("org-"));
        assert_eq!(name.len(), 4 + GENERATED_SUFFIX_LENGTH);
        assert!(validate_name(&name).is_ok());
        assert_ne!(generate_name("org-"), generate_name("org-"));
    }

    #[test]
    fn test_generate_name_truncates_long_prefix() {
        let name = generate_name(&"a".repeat(300));
        assert_eq!(name.len(), MAX_NAME_LENGTH);
        assert!(validate_name(&name).is_ok());
    }
}
