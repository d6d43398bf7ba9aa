//! Field validators shared by the account forms.

use once_cell::sync::Lazy;
use regex::Regex;

pub const EMAIL_MAX_LENGTH: usize = 254;
pub const USERNAME_MAX_LENGTH: usize = 150;
pub const DISPLAY_NAME_MAX_LENGTH: usize = 150;

pub const INVALID_EMAIL: &str = "Enter a valid email address.";
pub const INVALID_USERNAME: &str = "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.";
pub const NULL_CHARACTERS: &str = "Null characters are not allowed.";

static EMAIL_RE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").ok());
static USERNAME_RE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^[\w.@+-]+$").ok());

/// Reject U+0000, which PostgreSQL `text` cannot store.
///
/// # Errors
/// Returns [`NULL_CHARACTERS`] when the value contains a NUL.
pub fn no_null_characters(value: &str) -> Result<(), String> {
    if value.contains('\0') {
        Err(NULL_CHARACTERS.to_string())
    } else {
        Ok(())
    }
}

/// Reject values longer than `N` characters.
///
/// # Errors
/// Returns the message to show when the value is too long.
pub fn max_length<const N: usize>(value: &str) -> Result<(), String> {
    let length = value.chars().count();
    if length > N {
        Err(format!(
            "Ensure this value has at most {N} characters (it has {length})."
        ))
    } else {
        Ok(())
    }
}

/// Basic email format check.
///
/// # Errors
/// Returns [`INVALID_EMAIL`] when the value is not shaped like an address.
pub fn email(value: &str) -> Result<(), String> {
    if EMAIL_RE.as_ref().is_some_and(|re| re.is_match(value)) {
        Ok(())
    } else {
        Err(INVALID_EMAIL.to_string())
    }
}

/// Letters, digits and `@ . + - _` only.
///
/// # Errors
/// Returns [`INVALID_USERNAME`] for any other character.
pub fn username(value: &str) -> Result<(), String> {
    if USERNAME_RE.as_ref().is_some_and(|re| re.is_match(value)) {
        Ok(())
    } else {
        Err(INVALID_USERNAME.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_accepts_basic_format() {
        assert!(email("a@b.com").is_ok());
        assert!(email("name.surname@example.co").is_ok());
    }

    #[test]
    fn email_rejects_missing_parts() {
        assert_eq!(email("not-an-email"), Err(INVALID_EMAIL.to_string()));
        assert!(email("missing-at.example.com").is_err());
        assert!(email("missing-domain@").is_err());
        assert!(email("spaces in@example.com").is_err());
    }

    #[test]
    fn username_allows_word_characters_and_symbols() {
        assert!(username("ab").is_ok());
        assert!(username("first.last+tag@home-1_x").is_ok());
        assert!(username("ünïcödé").is_ok());
    }

    #[test]
    fn username_rejects_spaces_and_punctuation() {
        assert_eq!(username("a b"), Err(INVALID_USERNAME.to_string()));
        assert!(username("semi;colon").is_err());
        assert!(username("slash/").is_err());
    }

    #[test]
    fn null_characters_are_rejected() {
        assert!(no_null_characters("plain").is_ok());
        assert_eq!(
            no_null_characters("a\0@b.com"),
            Err(NULL_CHARACTERS.to_string())
        );
        assert!(no_null_characters("\0").is_err());
    }

    #[test]
    fn max_length_counts_characters() {
        assert!(max_length::<3>("abc").is_ok());
        assert!(max_length::<3>("äöü").is_ok());
        assert_eq!(
            max_length::<3>("abcd"),
            Err("Ensure this value has at most 3 characters (it has 4).".to_string())
        );
    }
}
