use super::value_objects::{TeamId, TeamName};
use crate::domain::errors::DomainError;
use crate::domain::member::MemberId;

/// Draft of a team that has not been persisted yet
///
/// The store assigns the [`TeamId`] when the draft is inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTeam {
    pub name: TeamName,
}

impl NewTeam {
    /// Creates a team draft
    ///
    /// # Example
    /// ```
    /// use member_search_api::domain::team::NewTeam;
    ///
    /// let draft = NewTeam::new("teamA").expect("valid team");
    /// assert_eq!(draft.name.as_str(), "teamA");
    /// ```
    pub fn new(name: impl Into<String>) -> Result<Self, DomainError> {
        Ok(Self {
            name: TeamName::new(name)?,
        })
    }
}

/// Team aggregate
///
/// Holds a derived index of the members whose `team_id` points here. The
/// index is maintained by the association routines in
/// [`crate::domain::member::association`]; the member side is authoritative.
///
/// # Invariants
/// - Name is never blank
/// - `members` holds each member id at most once, in attachment order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    id: TeamId,
    name: TeamName,
    members: Vec<MemberId>,
}

impl Team {
    /// Returns the team's ID
    pub fn id(&self) -> TeamId {
        self.id
    }

    /// Returns the team's name
    pub fn name(&self) -> &TeamName {
        &self.name
    }

    /// Returns the ids of the members attached to this team
    pub fn members(&self) -> &[MemberId] {
        &self.members
    }

    /// Returns true if the member is in this team's index
    pub fn contains(&self, member: MemberId) -> bool {
        self.members.contains(&member)
    }

    /// Replaces the team's name
    pub fn rename(&mut self, name: TeamName) {
        self.name = name;
    }

    /// Adds a member to the index. Returns false if it was already present.
    pub(crate) fn attach(&mut self, member: MemberId) -> bool {
        if self.contains(member) {
            return false;
        }
        self.members.push(member);
        true
    }

    /// Removes a member from the index. Returns false if it was absent.
    pub(crate) fn detach(&mut self, member: MemberId) -> bool {
        let before = self.members.len();
        self.members.retain(|m| *m != member);
        before != self.members.len()
    }

    /// Reconstructs a Team from persistence layer data
    ///
    /// # Note
    /// Only to be used by store implementations. `members` must already be
    /// the index derived from the member rows.
    pub fn from_persistence(id: TeamId, name: TeamName, members: Vec<MemberId>) -> Self {
        Self { id, name, members }
    }
}
