use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::member::{assign_team, reassign_team, Member, MemberId, NewMember};
use crate::domain::repositories::{Store, StoreError, StoreResult, UnitOfWork};
use crate::domain::search::order::{apply_page, sort_rows};
use crate::domain::search::{
    MemberQuery, MemberStatistics, MemberTeamDto, Predicate, TeamAgeAverage,
};
use crate::domain::team::{NewTeam, Team, TeamId};

#[derive(Debug, Clone, Default)]
struct StoreState {
    teams: BTreeMap<TeamId, Team>,
    members: BTreeMap<MemberId, Member>,
    last_team_id: i64,
    last_member_id: i64,
}

impl StoreState {
    /// Member ⟕ team rows in insertion order
    fn joined_rows(&self) -> Vec<MemberTeamDto> {
        self.members
            .values()
            .map(|member| {
                let team = member.team_id().and_then(|id| self.teams.get(&id));
                MemberTeamDto::join(member, team)
            })
            .collect()
    }

    fn select(&self, query: &MemberQuery) -> Vec<MemberTeamDto> {
        let mut rows: Vec<_> = self
            .joined_rows()
            .into_iter()
            .filter(|row| query.predicate.matches(row))
            .collect();
        sort_rows(&mut rows, &query.order);
        apply_page(rows, query.page)
    }
}

/// Process-local store
///
/// A session holds the store lock for its whole lifetime. Its first write
/// takes a private copy of the state, which replaces the shared state on
/// commit.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    type Session = InMemorySession;

    async fn begin(&self) -> StoreResult<InMemorySession> {
        let guard = self.state.clone().lock_owned().await;
        Ok(InMemorySession {
            guard,
            working: None,
        })
    }
}

pub struct InMemorySession {
    guard: OwnedMutexGuard<StoreState>,
    working: Option<StoreState>,
}

impl InMemorySession {
    fn state(&self) -> &StoreState {
        self.working.as_ref().unwrap_or(&*self.guard)
    }

    fn state_mut(&mut self) -> &mut StoreState {
        let shared = &self.guard;
        self.working.get_or_insert_with(|| (**shared).clone())
    }
}

#[async_trait]
impl UnitOfWork for InMemorySession {
    async fn insert_team(&mut self, team: NewTeam) -> StoreResult<TeamId> {
        let state = self.state_mut();
        state.last_team_id += 1;
        let id = TeamId(state.last_team_id);
        state
            .teams
            .insert(id, Team::from_persistence(id, team.name, Vec::new()));
        Ok(id)
    }

    async fn insert_member(&mut self, draft: NewMember) -> StoreResult<MemberId> {
        if let Some(team_id) = draft.team_id {
            if !self.state().teams.contains_key(&team_id) {
                return Err(StoreError::UnknownTeam(team_id));
            }
        }

        let state = self.state_mut();
        let team = match draft.team_id {
            Some(team_id) => Some(
                state
                    .teams
                    .get_mut(&team_id)
                    .ok_or(StoreError::UnknownTeam(team_id))?,
            ),
            None => None,
        };

        state.last_member_id += 1;
        let id = MemberId(state.last_member_id);
        let mut member = Member::from_draft(id, &draft);
        assign_team(&mut member, team);

        state.members.insert(id, member);
        Ok(id)
    }

    async fn find_team(&mut self, id: TeamId) -> StoreResult<Option<Team>> {
        Ok(self.state().teams.get(&id).cloned())
    }

    async fn find_member(&mut self, id: MemberId) -> StoreResult<Option<Member>> {
        Ok(self.state().members.get(&id).cloned())
    }

    async fn find_members(&mut self, query: &MemberQuery) -> StoreResult<Vec<Member>> {
        let state = self.state();
        Ok(state
            .select(query)
            .into_iter()
            .filter_map(|row| state.members.get(&row.member_id).cloned())
            .collect())
    }

    async fn find_member_teams(
        &mut self,
        query: &MemberQuery,
    ) -> StoreResult<Vec<MemberTeamDto>> {
        Ok(self.state().select(query))
    }

    async fn count_members(&mut self, predicate: &Predicate) -> StoreResult<u64> {
        let count = self
            .state()
            .joined_rows()
            .iter()
            .filter(|row| predicate.matches(row))
            .count();
        Ok(count as u64)
    }

    async fn member_statistics(&mut self) -> StoreResult<MemberStatistics> {
        Ok(MemberStatistics::from_ages(
            self.state().members.values().map(Member::age),
        ))
    }

    async fn team_average_ages(&mut self) -> StoreResult<Vec<TeamAgeAverage>> {
        // Grouped by name, not id: two teams may share a name.
        let mut groups: BTreeMap<String, (i64, u64)> = BTreeMap::new();
        let state = self.state();
        let team_names: HashMap<TeamId, &str> = state
            .teams
            .values()
            .map(|team| (team.id(), team.name().as_str()))
            .collect();

        for member in state.members.values() {
            let Some(name) = member.team_id().and_then(|id| team_names.get(&id)) else {
                continue;
            };
            let entry = groups.entry(name.to_string()).or_insert((0, 0));
            entry.0 += i64::from(member.age());
            entry.1 += 1;
        }

        Ok(groups
            .into_iter()
            .map(|(team_name, (sum, count))| TeamAgeAverage {
                team_name,
                average_age: sum as f64 / count as f64,
            })
            .collect())
    }

    async fn change_team(&mut self, member_id: MemberId, team_id: TeamId) -> StoreResult<()> {
        if !self.state().teams.contains_key(&team_id) {
            return Err(StoreError::UnknownTeam(team_id));
        }
        if !self.state().members.contains_key(&member_id) {
            return Err(StoreError::UnknownMember(member_id));
        }

        let state = self.state_mut();
        let member = state
            .members
            .get_mut(&member_id)
            .ok_or(StoreError::UnknownMember(member_id))?;

        match member.team_id() {
            Some(current) if current == team_id => {
                assign_team(member, state.teams.get_mut(&team_id));
            }
            current => {
                // Lift the old team out so both teams can be borrowed at once.
                let mut previous = current.and_then(|id| state.teams.remove(&id));
                let result = match state.teams.get_mut(&team_id) {
                    Some(next) => {
                        reassign_team(member, previous.as_mut(), next).map_err(StoreError::from)
                    }
                    None => Err(StoreError::UnknownTeam(team_id)),
                };
                if let (Some(id), Some(team)) = (current, previous) {
                    state.teams.insert(id, team);
                }
                result?;
            }
        }

        tracing::debug!(member = %member_id, team = %team_id, "member changed team");
        Ok(())
    }

    async fn commit(self) -> StoreResult<()> {
        let InMemorySession { mut guard, working } = self;
        if let Some(working) = working {
            *guard = working;
        }
        Ok(())
    }

    async fn rollback(self) -> StoreResult<()> {
        tracing::debug!("discarding in-memory unit of work");
        Ok(())
    }
}
