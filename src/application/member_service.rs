use crate::domain::member::{Member, MemberId, NewMember};
use crate::domain::repositories::{Store, StoreError, StoreResult, UnitOfWork};
use crate::domain::search::predicate::Fragment;
use crate::domain::search::{
    MemberQuery, MemberSearchCondition, MemberStatistics, MemberTeamDto, OrderSpecifier, Page,
    PageRequest, Predicate, SortField, TeamAgeAverage,
};
use crate::domain::team::{NewTeam, Team, TeamId};

/// Runs `op` inside one unit of work.
///
/// Commits when `op` succeeds. On failure the session is rolled back and
/// the original error is returned; a failed rollback is only logged.
async fn in_unit_of_work<S, T, F>(store: &S, op: F) -> StoreResult<T>
where
    S: Store,
    F: for<'s> FnOnce(
        &'s mut S::Session,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = StoreResult<T>> + Send + 's>,
    >,
{
    let mut session = store.begin().await?;

    match op(&mut session).await {
        Ok(value) => {
            session.commit().await?;
            Ok(value)
        }
        Err(err) => {
            tracing::warn!("Unit of work failed: {}, rolling back", err);
            if let Err(rollback_err) = session.rollback().await {
                tracing::error!(
                    "Rollback failed after error (orig: {}, rollback: {})",
                    err,
                    rollback_err
                );
            }
            Err(err)
        }
    }
}

/// Member and team operations, one unit of work each
///
/// # Example
/// ```
/// use member_search_api::application::MemberService;
/// use member_search_api::domain::member::NewMember;
/// use member_search_api::domain::search::MemberSearchCondition;
/// use member_search_api::domain::team::NewTeam;
/// use member_search_api::infrastructure::repositories::InMemoryStore;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let service = MemberService::new(InMemoryStore::new());
/// let team = service.save_team(NewTeam::new("teamB").unwrap()).await.unwrap();
/// service
///     .save_member(NewMember::new("member4", 40).with_team(team.id()))
///     .await
///     .unwrap();
///
/// let rows = service
///     .search_by_where(&MemberSearchCondition::new().team_name("teamB"))
///     .await
///     .unwrap();
/// assert_eq!(rows[0].username.as_deref(), Some("member4"));
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct MemberService<S> {
    store: S,
}

impl<S: Store> MemberService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn save_team(&self, team: NewTeam) -> StoreResult<Team> {
        let team = in_unit_of_work(&self.store, |uow| {
            Box::pin(async move {
                let id = uow.insert_team(team).await?;
                find_team_or_unknown(uow, id).await
            })
        })
        .await?;

        tracing::info!(team = %team.id(), name = %team.name(), "team saved");
        Ok(team)
    }

    pub async fn find_team(&self, id: TeamId) -> StoreResult<Option<Team>> {
        in_unit_of_work(&self.store, |uow| Box::pin(async move { uow.find_team(id).await })).await
    }

    /// Inserts a member; a draft naming a team joins it in the same unit
    /// of work
    pub async fn save_member(&self, member: NewMember) -> StoreResult<Member> {
        let member = in_unit_of_work(&self.store, |uow| {
            Box::pin(async move {
                let id = uow.insert_member(member).await?;
                uow.find_member(id)
                    .await?
                    .ok_or(StoreError::UnknownMember(id))
            })
        })
        .await?;

        tracing::info!(member = %member.id(), team = ?member.team_id(), "member saved");
        Ok(member)
    }

    /// Point lookup. An unknown id is `Ok(None)`.
    pub async fn find_by_id(&self, id: MemberId) -> StoreResult<Option<Member>> {
        in_unit_of_work(&self.store, |uow| Box::pin(async move { uow.find_member(id).await }))
            .await
    }

    pub async fn find_all(&self) -> StoreResult<Vec<Member>> {
        self.find_members(MemberQuery::default()).await
    }

    /// Exact username match, in insertion order
    pub async fn find_by_username(&self, username: &str) -> StoreResult<Vec<Member>> {
        let predicate = Predicate::all_of([Some(Fragment::UsernameEq(username.to_string()))]);
        self.find_members(MemberQuery::filtered(predicate)).await
    }

    /// Members matching an arbitrary query, ordered and windowed
    pub async fn find_members(&self, query: MemberQuery) -> StoreResult<Vec<Member>> {
        tracing::debug!(predicate = %query.predicate, "finding members");
        in_unit_of_work(&self.store, |uow| {
            Box::pin(async move { uow.find_members(&query).await })
        })
        .await
    }

    /// Members for one window of `query` plus the total ignoring the window
    pub async fn find_member_page(
        &self,
        query: MemberQuery,
        page: PageRequest,
    ) -> StoreResult<Page<Member>> {
        let query = query.paged(page);
        in_unit_of_work(&self.store, |uow| {
            Box::pin(async move {
                let total = uow.count_members(&query.predicate).await?;
                let results = uow.find_members(&query).await?;
                Ok(Page {
                    results,
                    total,
                    offset: page.offset,
                    limit: page.limit,
                })
            })
        })
        .await
    }

    /// Member ⟕ team projection using the accumulator-built predicate
    pub async fn search_by_builder(
        &self,
        condition: &MemberSearchCondition,
    ) -> StoreResult<Vec<MemberTeamDto>> {
        self.search(condition.build_predicate()).await
    }

    /// Member ⟕ team projection using the fragment-set predicate
    pub async fn search_by_where(
        &self,
        condition: &MemberSearchCondition,
    ) -> StoreResult<Vec<MemberTeamDto>> {
        self.search(condition.where_predicate()).await
    }

    async fn search(&self, predicate: Predicate) -> StoreResult<Vec<MemberTeamDto>> {
        tracing::debug!(predicate = %predicate, "searching members");
        let query = MemberQuery::filtered(predicate);
        in_unit_of_work(&self.store, |uow| {
            Box::pin(async move { uow.find_member_teams(&query).await })
        })
        .await
    }

    /// One page of the projection. Without an explicit order the rows come
    /// back in member id order.
    pub async fn search_page(
        &self,
        condition: &MemberSearchCondition,
        order: Vec<OrderSpecifier>,
        page: PageRequest,
    ) -> StoreResult<Page<MemberTeamDto>> {
        let mut query = MemberQuery::filtered(condition.where_predicate()).paged(page);
        query.order = if order.is_empty() {
            vec![OrderSpecifier::asc(SortField::Id)]
        } else {
            order
        };
        tracing::debug!(predicate = %query.predicate, "searching member page");

        in_unit_of_work(&self.store, |uow| {
            Box::pin(async move {
                let total = uow.count_members(&query.predicate).await?;
                let results = uow.find_member_teams(&query).await?;
                Ok(Page {
                    results,
                    total,
                    offset: page.offset,
                    limit: page.limit,
                })
            })
        })
        .await
    }

    pub async fn statistics(&self) -> StoreResult<MemberStatistics> {
        in_unit_of_work(&self.store, |uow| {
            Box::pin(async move { uow.member_statistics().await })
        })
        .await
    }

    pub async fn team_average_ages(&self) -> StoreResult<Vec<TeamAgeAverage>> {
        in_unit_of_work(&self.store, |uow| {
            Box::pin(async move { uow.team_average_ages().await })
        })
        .await
    }

    /// Moves a member to `team`, detaching it from its previous team
    pub async fn change_team(&self, member: MemberId, team: TeamId) -> StoreResult<Member> {
        let member = in_unit_of_work(&self.store, |uow| {
            Box::pin(async move {
                uow.change_team(member, team).await?;
                uow.find_member(member)
                    .await?
                    .ok_or(StoreError::UnknownMember(member))
            })
        })
        .await?;

        tracing::info!(member = %member.id(), team = %team, "member reassigned");
        Ok(member)
    }
}

async fn find_team_or_unknown<U: UnitOfWork>(uow: &mut U, id: TeamId) -> StoreResult<Team> {
    uow.find_team(id)
        .await?
        .ok_or(StoreError::UnknownTeam(id))
}
