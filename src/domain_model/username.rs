use serde::{Serialize, Serializer};
use std::fmt;

const MIN_LEN: usize = 3;
const MAX_LEN: usize = 32;

#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum UsernameError {
    #[error("username must be between {MIN_LEN} and {MAX_LEN} characters")]
    Length,
    #[error("username contains invalid character {0:?}")]
    InvalidChar(char),
}

/// A validated username.
///
/// Keeps the display form as typed (minus surrounding whitespace). Equality and
/// lookups go through [`Username::key`], which is case-insensitive.
#[derive(Debug, Clone)]
pub struct Username {
    display: String,
    key: String,
}

impl Username {
    pub fn parse(raw: &str) -> Result<Self, UsernameError> {
        let display = raw.trim();

        let len = display.chars().count();
        if !(MIN_LEN..=MAX_LEN).contains(&len) {
            return Err(UsernameError::Length);
        }
        if let Some(c) = display
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')))
        {
            return Err(UsernameError::InvalidChar(c));
        }

        Ok(Self {
            display: display.to_owned(),
            key: display.to_ascii_lowercase(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.display
    }

    /// Canonical form used for uniqueness and resolution.
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl PartialEq for Username {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Username {}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

impl Serialize for Username {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.display)
    }
}
