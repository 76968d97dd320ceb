use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::errors::DomainError;

/// Storage-assigned identifier of a team
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(pub i64);

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Team name value object
///
/// # Invariants
/// - Must contain at least one non-whitespace character
/// - Is stored exactly as given (no trimming)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TeamName(String);

impl TeamName {
    /// Creates a new TeamName value object
    ///
    /// # Returns
    /// * `Ok(TeamName)` - If the name has visible text
    /// * `Err(DomainError::BlankTeamName)` - Otherwise
    ///
    /// # Example
    /// ```
    /// use member_search_api::domain::team::value_objects::TeamName;
    ///
    /// let name = TeamName::new("teamA").expect("valid name");
    /// assert_eq!(name.as_str(), "teamA");
    /// assert!(TeamName::new("   ").is_err());
    /// ```
    pub fn new(name: impl Into<String>) -> Result<Self, DomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::BlankTeamName);
        }
        Ok(TeamName(name))
    }

    /// Returns the name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TeamName {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        TeamName::new(value)
    }
}

impl From<TeamName> for String {
    fn from(name: TeamName) -> Self {
        name.0
    }
}

impl fmt::Display for TeamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
