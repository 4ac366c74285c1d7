// src/reference.rs

//! Conan package references
//!
//! References identify a package and, optionally, the remote namespace it is
//! published under:
//! `name/version@user/channel`
//!
//! Examples:
//! - `clipper/6.4.2@ultimaker/stable` - published on the internal remote
//! - `boost/1.86.0` - plain ConanCenter reference
//! - `npmpackage/[>=1.0.0]` - version range
//!
//! # Origin qualifier
//!
//! The `@user/channel` suffix is the origin qualifier. Packages qualified with
//! a restricted user only exist on an organization-internal remote; stripping
//! the qualifier yields the public form of the same name and version.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The `@user/channel` part of a reference
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Origin {
    pub user: String,
    pub channel: Option<String>,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.channel {
            Some(channel) => write!(f, "{}/{}", self.user, channel),
            None => write!(f, "{}", self.user),
        }
    }
}

/// A parsed package reference
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    /// Package name
    pub name: String,
    /// Exact version or a bracketed range
    pub version: String,
    /// Origin qualifier, if any
    pub origin: Option<Origin>,
}

impl Reference {
    /// Parse a reference from `name/version[@user[/channel]]`
    pub fn parse(s: &str) -> Result<Self, ReferenceParseError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ReferenceParseError::Empty);
        }

        let (package, origin) = match s.split_once('@') {
            Some((package, origin)) => (package, Some(origin)),
            None => (s, None),
        };

        let (name, version) = package
            .split_once('/')
            .ok_or_else(|| ReferenceParseError::MissingVersion(s.to_string()))?;

        if name.is_empty() {
            return Err(ReferenceParseError::EmptyName(s.to_string()));
        }
        if version.is_empty() {
            return Err(ReferenceParseError::MissingVersion(s.to_string()));
        }

        let valid_chars = |c: char| c.is_alphanumeric() || matches!(c, '.' | '-' | '_' | '+');
        if !name.chars().all(valid_chars) {
            return Err(ReferenceParseError::InvalidName(name.to_string()));
        }

        let is_range = version.starts_with('[') && version.ends_with(']');
        if !is_range && !version.chars().all(valid_chars) {
            return Err(ReferenceParseError::InvalidVersion(version.to_string()));
        }

        let origin = match origin {
            Some(o) => {
                let (user, channel) = match o.split_once('/') {
                    Some((user, channel)) => (user, Some(channel)),
                    None => (o, None),
                };
                if user.is_empty() || channel.is_some_and(str::is_empty) {
                    return Err(ReferenceParseError::InvalidOrigin(o.to_string()));
                }
                Some(Origin {
                    user: user.to_string(),
                    channel: channel.map(str::to_string),
                })
            }
            None => None,
        };

        Ok(Self {
            name: name.to_string(),
            version: version.to_string(),
            origin,
        })
    }

    /// Check whether the reference carries an origin qualifier for `user`
    pub fn is_from(&self, user: &str) -> bool {
        self.origin.as_ref().is_some_and(|o| o.user == user)
    }

    /// The same name and version without the origin qualifier
    pub fn without_origin(&self) -> Self {
        Self {
            name: self.name.clone(),
            version: self.version.clone(),
            origin: None,
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.version)?;
        if let Some(origin) = &self.origin {
            write!(f, "@{}", origin)?;
        }
        Ok(())
    }
}

impl FromStr for Reference {
    type Err = ReferenceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Reference::parse(s)
    }
}

/// Errors that can occur when parsing a reference
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReferenceParseError {
    #[error("Empty package reference")]
    Empty,
    #[error("Missing version in reference: {0}")]
    MissingVersion(String),
    #[error("Empty package name in reference: {0}")]
    EmptyName(String),
    #[error("Invalid package name: {0}")]
    InvalidName(String),
    #[error("Invalid version: {0}")]
    InvalidVersion(String),
    #[error("Invalid origin qualifier: {0}")]
    InvalidOrigin(String),
}

impl From<ReferenceParseError> for crate::error::Error {
    fn from(e: ReferenceParseError) -> Self {
        crate::error::Error::ParseError(e.to_string())
    }
}
