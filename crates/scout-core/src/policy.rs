//! Ethics gate applied before a scan starts.

use crate::config::EthicsConfig;
use crate::entity::{Entity, EntityKind};
use crate::error::{Result, ScoutError};
use once_cell::sync::Lazy;
use regex::Regex;
use std::net::IpAddr;

/// Category of sensitive-looking input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensitivePattern {
    /// Telephone number
    Phone,
    /// Street address
    StreetAddress,
    /// US Social Security Number
    Ssn,
    /// Payment card number
    CreditCard,
}

impl SensitivePattern {
    /// Human-readable description used in rejection messages.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Phone => "a phone number",
            Self::StreetAddress => "a street address",
            Self::Ssn => "a social security number",
            Self::CreditCard => "a payment card number",
        }
    }
}

static SSN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").expect("valid SSN regex"));

static CARD_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:\d{4}[ -]?){3}\d{4}\b").expect("valid card regex"));

static PHONE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\+?\(?\d{1,4}\)?[\s.-]?\(?\d{2,4}\)?[\s.-]?\d{3,4}[\s.-]?\d{3,4}$")
        .expect("valid phone regex")
});

static ADDRESS_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b\d{1,6}\s+(?:[a-z0-9.']+\s+){1,4}(?:street|st|avenue|ave|road|rd|boulevard|blvd|lane|ln|drive|dr|court|ct|way|place|pl|terrace|highway|hwy)\b",
    )
    .expect("valid address regex")
});

/// Rejects targets that look like personal data rather than infrastructure.
#[derive(Debug, Clone, Default)]
pub struct EthicsPolicy {
    config: EthicsConfig,
}

impl EthicsPolicy {
    /// Build a policy from settings.
    #[must_use]
    pub fn new(config: EthicsConfig) -> Self {
        Self { config }
    }

    /// Whether pattern blocking is in force.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.config.ethical_mode && self.config.block_sensitive_patterns
    }

    /// First sensitive pattern `input` resembles, if any.
    ///
    /// IP literals are never classified, their dotted digits would otherwise
    /// read as phone numbers.
    #[must_use]
    pub fn classify(input: &str) -> Option<SensitivePattern> {
        let trimmed = input.trim();
        if trimmed.parse::<IpAddr>().is_ok() {
            return None;
        }

        if SSN_PATTERN.is_match(trimmed) {
            Some(SensitivePattern::Ssn)
        } else if CARD_PATTERN.is_match(trimmed) {
            Some(SensitivePattern::CreditCard)
        } else if PHONE_PATTERN.is_match(trimmed) {
            Some(SensitivePattern::Phone)
        } else if ADDRESS_PATTERN.is_match(trimmed) {
            Some(SensitivePattern::StreetAddress)
        } else {
            None
        }
    }

    /// Gate raw user input before it is parsed.
    ///
    /// # Errors
    /// Returns [`ScoutError::BlockedByPolicy`] when the input resembles personal data.
    pub fn check_input(&self, raw: &str) -> Result<()> {
        if !self.is_active() {
            return Ok(());
        }
        match Self::classify(raw) {
            Some(pattern) => {
                tracing::info!(pattern = ?pattern, "Target rejected by ethics policy");
                Err(ScoutError::BlockedByPolicy(format!(
                    "target resembles {}",
                    pattern.description()
                )))
            }
            None => Ok(()),
        }
    }

    /// Gate a validated entity.
    ///
    /// # Errors
    /// Returns [`ScoutError::BlockedByPolicy`] when the entity resembles personal data.
    pub fn check(&self, entity: &Entity) -> Result<()> {
        if entity.kind() == EntityKind::Ip {
            return Ok(());
        }
        self.check_input(entity.value())
    }
}
