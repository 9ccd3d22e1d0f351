use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EmailError {
    #[error("email cannot be empty")]
    Empty,

    #[error("email must contain a single '@' with text on both sides")]
    Malformed,
}

/// Normalized (trimmed, lower-cased) email address used as the user key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Parse and normalize an email address.
    ///
    /// # Errors
    ///
    /// Returns `EmailError` for blank input or input without a usable `@`.
    pub fn parse(raw: &str) -> Result<Self, EmailError> {
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(EmailError::Empty);
        }
        match normalized.split_once('@') {
            Some((local, domain))
                if !local.is_empty() && !domain.is_empty() && !domain.contains('@') =>
            {
                Ok(Self(normalized))
            }
            _ => Err(EmailError::Malformed),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Email {
    type Error = EmailError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

/// Stored account record. The password is only ever kept as a digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub name: String,
    pub email: Email,
    pub password_digest: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_normalized() {
        let email = Email::parse("  Student@Example.COM ").unwrap();
        assert_eq!(email.as_str(), "student@example.com");
    }

    #[test]
    fn email_requires_both_sides() {
        assert_eq!(Email::parse("@x.com").unwrap_err(), EmailError::Malformed);
        assert_eq!(Email::parse("nobody").unwrap_err(), EmailError::Malformed);
        assert_eq!(Email::parse("   ").unwrap_err(), EmailError::Empty);
    }

    #[test]
    fn email_deserialization_validates() {
        assert!(serde_json::from_str::<Email>("\"a@b.c\"").is_ok());
        assert!(serde_json::from_str::<Email>("\"broken\"").is_err());
    }
}
