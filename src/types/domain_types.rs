//! Domain-specific newtypes for type safety and validation.

use super::ValidationError;
use crate::constants::{HEADING_LEVEL_MAX, HEADING_LEVEL_MIN, SUPPORTED_CODE_LANGUAGES};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Heading level, always within 1..=9
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct HeadingLevel(u8);

impl HeadingLevel {
    pub fn new(level: u8) -> Result<Self, ValidationError> {
        if !(HEADING_LEVEL_MIN..=HEADING_LEVEL_MAX).contains(&level) {
            return Err(ValidationError::HeadingLevel(level));
        }
        Ok(Self(level))
    }

    pub fn get(&self) -> u8 {
        self.0
    }
}

impl<'de> Deserialize<'de> for HeadingLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let level = u8::deserialize(deserializer)?;
        HeadingLevel::new(level).map_err(serde::de::Error::custom)
    }
}

/// A code block language from the supported set
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CodeLanguage(&'static str);

impl CodeLanguage {
    pub fn new(language: &str) -> Result<Self, ValidationError> {
        let wanted = language.trim().to_ascii_lowercase();
        SUPPORTED_CODE_LANGUAGES
            .iter()
            .find(|supported| **supported == wanted)
            .map(|supported| Self(supported))
            .ok_or_else(|| ValidationError::UnsupportedLanguage(language.to_string()))
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for CodeLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Application identity used for the tenant credential exchange.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct CredentialSecrets {
    pub app_id: String,
    pub app_secret: String,
}

impl CredentialSecrets {
    pub fn new(
        app_id: impl Into<String>,
        app_secret: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let app_id = app_id.into();
        let app_secret = app_secret.into();
        if app_id.trim().is_empty() {
            return Err(ValidationError::EmptyField("app_id"));
        }
        if app_secret.trim().is_empty() {
            return Err(ValidationError::EmptyField("app_secret"));
        }
        Ok(Self { app_id, app_secret })
    }
}

impl fmt::Debug for CredentialSecrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Redact the secret in logs
        f.debug_struct("CredentialSecrets")
            .field("app_id", &self.app_id)
            .field("app_secret", &"***")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_level_bounds() {
        assert!(HeadingLevel::new(0).is_err());
        assert!(HeadingLevel::new(10).is_err());
        for level in 1..=9 {
            assert_eq!(HeadingLevel::new(level).unwrap().get(), level);
        }
    }

    #[test]
    fn test_code_language_membership() {
        assert_eq!(CodeLanguage::new("python").unwrap().as_str(), "python");
        assert_eq!(CodeLanguage::new("Rust").unwrap().as_str(), "rust");
        assert_eq!(
            CodeLanguage::new("nonexistent-lang"),
            Err(ValidationError::UnsupportedLanguage(
                "nonexistent-lang".to_string()
            ))
        );
    }

    #[test]
    fn test_secrets_require_both_parts() {
        assert!(CredentialSecrets::new("cli_a", "s3cret").is_ok());
        assert_eq!(
            CredentialSecrets::new("", "s3cret"),
            Err(ValidationError::EmptyField("app_id"))
        );
        assert_eq!(
            CredentialSecrets::new("cli_a", " "),
            Err(ValidationError::EmptyField("app_secret"))
        );
    }

    #[test]
    fn test_secrets_debug_redacts_secret() {
        let secrets = CredentialSecrets::new("cli_a", "hunter2").unwrap();
        let shown = format!("{:?}", secrets);
        assert!(shown.contains("cli_a"));
        assert!(!shown.contains("hunter2"));
    }
}
