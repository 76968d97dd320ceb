use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::team::TeamId;

/// Storage-assigned identifier of a member
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(pub i64);

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Draft of a member that has not been persisted yet
///
/// # Example
/// ```
/// use member_search_api::domain::member::NewMember;
/// use member_search_api::domain::team::TeamId;
///
/// let draft = NewMember::new("member1", 10).with_team(TeamId(1));
/// assert_eq!(draft.username.as_deref(), Some("member1"));
/// assert_eq!(draft.team_id, Some(TeamId(1)));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewMember {
    pub username: Option<String>,
    pub age: i32,
    pub team_id: Option<TeamId>,
}

impl NewMember {
    /// Member with a username and age and no team
    pub fn new(username: impl Into<String>, age: i32) -> Self {
        Self {
            username: Some(username.into()),
            age,
            team_id: None,
        }
    }

    /// Member without a username
    pub fn anonymous(age: i32) -> Self {
        Self {
            username: None,
            age,
            team_id: None,
        }
    }

    /// Sets the team the member joins when inserted
    pub fn with_team(mut self, team_id: TeamId) -> Self {
        self.team_id = Some(team_id);
        self
    }
}

/// Member entity
///
/// `username` and `age` are fixed at construction. `team_id` is a
/// non-owning reference and only changes through
/// [`crate::domain::member::association`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    id: MemberId,
    username: Option<String>,
    age: i32,
    team_id: Option<TeamId>,
}

impl Member {
    /// Builds a member from a draft and the id the store assigned to it.
    ///
    /// The team reference is not copied: joining a team has to go through
    /// `assign_team` so the team's index is updated as well.
    pub fn from_draft(id: MemberId, draft: &NewMember) -> Self {
        Self {
            id,
            username: draft.username.clone(),
            age: draft.age,
            team_id: None,
        }
    }

    pub fn id(&self) -> MemberId {
        self.id
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn age(&self) -> i32 {
        self.age
    }

    pub fn team_id(&self) -> Option<TeamId> {
        self.team_id
    }

    pub(crate) fn set_team(&mut self, team_id: Option<TeamId>) {
        self.team_id = team_id;
    }

    /// Reconstructs a Member from persistence layer data
    pub fn from_persistence(
        id: MemberId,
        username: Option<String>,
        age: i32,
        team_id: Option<TeamId>,
    ) -> Self {
        Self {
            id,
            username,
            age,
            team_id,
        }
    }
}
