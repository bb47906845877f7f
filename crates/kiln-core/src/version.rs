use std::fmt;
use std::str::FromStr;

use semver::{Version, VersionReq};
use thiserror::Error;

use crate::constants::API_VERSION;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    #[error("Invalid version '{input}': {message}")]
    InvalidVersion { input: String, message: String },
    #[error("Invalid version constraint '{input}': {message}")]
    InvalidConstraint { input: String, message: String },
}

/// Parses a plugin or API version string ("1.2.3").
pub fn parse_version(input: &str) -> Result<Version, VersionError> {
    Version::parse(input.trim()).map_err(|e| VersionError::InvalidVersion {
        input: input.to_string(),
        message: e.to_string(),
    })
}

/// The API version plugins are checked against before scanning.
pub fn api_version() -> Result<Version, VersionError> {
    parse_version(API_VERSION)
}

/// A version requirement range using semver constraints.
#[derive(Debug, Clone)]
pub struct VersionRange {
    /// The constraint as written (e.g., "^0.1", ">=0.1, <0.3")
    constraint: String,
    req: VersionReq,
}

impl VersionRange {
    pub fn from_constraint(constraint: &str) -> Result<Self, VersionError> {
        let req = VersionReq::parse(constraint).map_err(|e| VersionError::InvalidConstraint {
            input: constraint.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            constraint: constraint.to_string(),
            req,
        })
    }

    pub fn includes(&self, version: &Version) -> bool {
        self.req.matches(version)
    }

    pub fn constraint_string(&self) -> &str {
        &self.constraint
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.constraint)
    }
}

impl FromStr for VersionRange {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VersionRange::from_constraint(s)
    }
}

/// True when `ranges` is empty or any range includes `api`.
pub fn is_api_compatible(ranges: &[VersionRange], api: &Version) -> bool {
    ranges.is_empty() || ranges.iter().any(|range| range.includes(api))
}
