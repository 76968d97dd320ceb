use thiserror::Error;

use crate::domain::member::MemberId;
use crate::domain::team::TeamId;

/// Business rule violations raised by the entity model
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("Team name cannot be blank")]
    BlankTeamName,

    #[error("Member {member} belongs to team {actual:?}, not {expected:?}")]
    TeamMismatch {
        member: MemberId,
        expected: Option<TeamId>,
        actual: Option<TeamId>,
    },
}
