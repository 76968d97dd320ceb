use async_trait::async_trait;
use thiserror::Error;

use crate::domain::errors::DomainError;
use crate::domain::member::{Member, MemberId, NewMember};
use crate::domain::search::{
    MemberQuery, MemberStatistics, MemberTeamDto, Predicate, TeamAgeAverage,
};
use crate::domain::team::{NewTeam, Team, TeamId};

/// Errors surfaced by a store
///
/// Database failures are passed through as-is; the store does not try to
/// interpret them.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Team not found: {0}")]
    UnknownTeam(TeamId),

    #[error("Member not found: {0}")]
    UnknownMember(MemberId),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Source of units of work
///
/// Cloning a store is cheap and every clone talks to the same data.
#[async_trait]
pub trait Store: Clone + Send + Sync + 'static {
    type Session: UnitOfWork;

    /// Opens a unit of work. Dropping the session without calling
    /// [`UnitOfWork::commit`] discards everything it wrote.
    async fn begin(&self) -> StoreResult<Self::Session>;
}

/// Explicit transaction handle passed into each storage operation
///
/// Lookups that find nothing return `Ok(None)`. Member queries evaluate
/// their predicate against the member ⟕ team join, so team fragments see
/// `None` for members without a team.
#[async_trait]
pub trait UnitOfWork: Send {
    /// Inserts a team and returns its assigned id
    async fn insert_team(&mut self, team: NewTeam) -> StoreResult<TeamId>;

    /// Inserts a member and returns its assigned id. A draft naming a team
    /// joins it in the same unit of work.
    async fn insert_member(&mut self, member: NewMember) -> StoreResult<MemberId>;

    /// Loads a team together with its member index
    async fn find_team(&mut self, id: TeamId) -> StoreResult<Option<Team>>;

    async fn find_member(&mut self, id: MemberId) -> StoreResult<Option<Member>>;

    /// Members matching the query, ordered then windowed
    async fn find_members(&mut self, query: &MemberQuery) -> StoreResult<Vec<Member>>;

    /// Same selection as [`UnitOfWork::find_members`], projected onto the
    /// join
    async fn find_member_teams(&mut self, query: &MemberQuery)
        -> StoreResult<Vec<MemberTeamDto>>;

    async fn count_members(&mut self, predicate: &Predicate) -> StoreResult<u64>;

    async fn member_statistics(&mut self) -> StoreResult<MemberStatistics>;

    /// Average age per team name, teams without members omitted, ordered
    /// by team name
    async fn team_average_ages(&mut self) -> StoreResult<Vec<TeamAgeAverage>>;

    /// Moves a member to another team, detaching it from its current one
    async fn change_team(&mut self, member: MemberId, team: TeamId) -> StoreResult<()>;

    async fn commit(self) -> StoreResult<()>;

    async fn rollback(self) -> StoreResult<()>;
}
