//! Validated scan targets.
//!
//! An [`Entity`] can only be obtained through [`Entity::parse`] or
//! [`Entity::detect`], so every value in circulation has already passed the
//! rule for its kind and is in normalized form.

use crate::error::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

static DOMAIN_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("valid domain regex"));

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}$")
        .expect("valid email regex")
});

static USERNAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.-]{3,32}$").expect("valid username regex"));

/// The kind of a scan target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Registrable domain or hostname
    Domain,
    /// IPv4 or IPv6 address
    Ip,
    /// Email address
    Email,
    /// Online handle
    Username,
}

impl EntityKind {
    /// All kinds, in display order.
    pub const ALL: [EntityKind; 4] = [Self::Domain, Self::Ip, Self::Email, Self::Username];

    /// Machine-readable name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Domain => "domain",
            Self::Ip => "ip",
            Self::Email => "email",
            Self::Username => "username",
        }
    }

    /// Human-readable name.
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Domain => "Domain",
            Self::Ip => "IP address",
            Self::Email => "Email",
            Self::Username => "Username",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "domain" => Ok(Self::Domain),
            "ip" => Ok(Self::Ip),
            "email" | "e-mail" => Ok(Self::Email),
            "username" | "user" => Ok(Self::Username),
            other => Err(ValidationError::UnknownKind(other.to_string())),
        }
    }
}

/// A validated, normalized scan target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawEntity", into = "RawEntity")]
pub struct Entity {
    kind: EntityKind,
    value: String,
}

impl Entity {
    /// Validate `input` as the given kind and build a normalized entity.
    ///
    /// Surrounding whitespace is ignored. Domains and emails are lowercased,
    /// usernames lose inner spaces and are lowercased, IP literals are
    /// rewritten in canonical form.
    ///
    /// # Errors
    /// Returns the [`ValidationError`] naming the rule the input violates.
    pub fn parse(input: &str, kind: EntityKind) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty);
        }

        let value = match kind {
            EntityKind::Domain => {
                if !DOMAIN_REGEX.is_match(trimmed) {
                    return Err(ValidationError::InvalidDomain(trimmed.to_string()));
                }
                trimmed.to_lowercase()
            }
            EntityKind::Ip => trimmed
                .parse::<IpAddr>()
                .map_err(|_| ValidationError::InvalidIp(trimmed.to_string()))?
                .to_string(),
            EntityKind::Email => {
                if !EMAIL_REGEX.is_match(trimmed) {
                    return Err(ValidationError::InvalidEmail(trimmed.to_string()));
                }
                trimmed.to_lowercase()
            }
            EntityKind::Username => {
                let normalized = trimmed.replace(' ', "").to_lowercase();
                if !USERNAME_REGEX.is_match(&normalized) {
                    return Err(ValidationError::InvalidUsername(trimmed.to_string()));
                }
                normalized
            }
        };

        Ok(Self { kind, value })
    }

    /// Infer the kind of `input` and parse it.
    ///
    /// IP literals win first, then anything containing `@` is treated as an
    /// email, then the domain rule, and finally the username rule.
    ///
    /// # Errors
    /// Returns the validation error of the kind the input was inferred as.
    pub fn detect(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty);
        }

        let kind = if trimmed.parse::<IpAddr>().is_ok() {
            EntityKind::Ip
        } else if trimmed.contains('@') {
            EntityKind::Email
        } else if DOMAIN_REGEX.is_match(trimmed) {
            EntityKind::Domain
        } else {
            EntityKind::Username
        };

        Self::parse(trimmed, kind)
    }

    /// The kind of this entity.
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// The normalized value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Domain part of an email entity, `None` for other kinds.
    #[must_use]
    pub fn email_domain(&self) -> Option<&str> {
        match self.kind {
            EntityKind::Email => self.value.rsplit_once('@').map(|(_, domain)| domain),
            _ => None,
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/// Wire shape of an entity; deserialization goes back through validation.
#[derive(Serialize, Deserialize)]
struct RawEntity {
    #[serde(rename = "type")]
    kind: EntityKind,
    value: String,
}

impl TryFrom<RawEntity> for Entity {
    type Error = ValidationError;

    fn try_from(raw: RawEntity) -> Result<Self, Self::Error> {
        Entity::parse(&raw.value, raw.kind)
    }
}

impl From<Entity> for RawEntity {
    fn from(entity: Entity) -> Self {
        Self {
            kind: entity.kind,
            value: entity.value,
        }
    }
}
