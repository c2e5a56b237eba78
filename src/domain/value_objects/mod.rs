use std::fmt;

use serde::{Deserialize, Serialize};

/// Recipient address in its canonical form: trimmed and lowercased.
///
/// Two addresses that differ only by surrounding whitespace or letter case are
/// the same recipient.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NormalizedEmail(String);

impl NormalizedEmail {
    /// Returns `None` for blank input.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self(trimmed.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for NormalizedEmail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_lowercases() {
        let email = NormalizedEmail::parse("  Ann.Smith@Example.COM \n").unwrap();
        assert_eq!(email.as_str(), "ann.smith@example.com");
    }

    #[test]
    fn blank_input_is_rejected() {
        assert!(NormalizedEmail::parse("").is_none());
        assert!(NormalizedEmail::parse("   ").is_none());
    }
}
