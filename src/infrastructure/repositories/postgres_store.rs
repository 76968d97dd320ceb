use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use super::sql;
use crate::domain::member::{reassign_team, Member, MemberId, NewMember};
use crate::domain::repositories::{Store, StoreError, StoreResult, UnitOfWork};
use crate::domain::search::{
    MemberQuery, MemberStatistics, MemberTeamDto, Predicate, TeamAgeAverage,
};
use crate::domain::team::{NewTeam, Team, TeamId, TeamName};

/// PostgreSQL implementation of the member/team store
///
/// Each session wraps one database transaction. The team's member index is
/// never stored: it is read back from `members.team_id`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgresStore
    ///
    /// # Arguments
    /// * `pool` - SQLx connection pool for PostgreSQL
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the bundled schema migrations
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl Store for PostgresStore {
    type Session = PostgresSession;

    async fn begin(&self) -> StoreResult<PostgresSession> {
        let tx = self.pool.begin().await?;
        Ok(PostgresSession { tx })
    }
}

/// Unit of work backed by a PostgreSQL transaction. Dropping it rolls the
/// transaction back.
pub struct PostgresSession {
    tx: Transaction<'static, Postgres>,
}

#[derive(Debug, sqlx::FromRow)]
struct MemberRow {
    id: i64,
    username: Option<String>,
    age: i32,
    team_id: Option<i64>,
}

impl From<MemberRow> for Member {
    fn from(row: MemberRow) -> Self {
        Member::from_persistence(
            MemberId(row.id),
            row.username,
            row.age,
            row.team_id.map(TeamId),
        )
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MemberTeamRow {
    member_id: i64,
    username: Option<String>,
    age: i32,
    team_id: Option<i64>,
    team_name: Option<String>,
}

impl From<MemberTeamRow> for MemberTeamDto {
    fn from(row: MemberTeamRow) -> Self {
        MemberTeamDto {
            member_id: MemberId(row.member_id),
            username: row.username,
            age: row.age,
            team_id: row.team_id.map(TeamId),
            team_name: row.team_name,
        }
    }
}

impl PostgresSession {
    async fn team_exists(&mut self, id: TeamId) -> StoreResult<bool> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM teams WHERE id = $1)")
                .bind(id.0)
                .fetch_one(&mut *self.tx)
                .await?;
        Ok(exists)
    }
}

#[async_trait]
impl UnitOfWork for PostgresSession {
    async fn insert_team(&mut self, team: NewTeam) -> StoreResult<TeamId> {
        let id = sqlx::query_scalar::<_, i64>("INSERT INTO teams (name) VALUES ($1) RETURNING id")
            .bind(team.name.as_str())
            .fetch_one(&mut *self.tx)
            .await?;

        Ok(TeamId(id))
    }

    async fn insert_member(&mut self, member: NewMember) -> StoreResult<MemberId> {
        if let Some(team_id) = member.team_id {
            if !self.team_exists(team_id).await? {
                return Err(StoreError::UnknownTeam(team_id));
            }
        }

        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO members (username, age, team_id)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(member.username.as_deref())
        .bind(member.age)
        .bind(member.team_id.map(|t| t.0))
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(MemberId(id))
    }

    async fn find_team(&mut self, id: TeamId) -> StoreResult<Option<Team>> {
        let row = sqlx::query_as::<_, (i64, String)>("SELECT id, name FROM teams WHERE id = $1")
            .bind(id.0)
            .fetch_optional(&mut *self.tx)
            .await?;

        let Some((team_id, name)) = row else {
            return Ok(None);
        };

        let members =
            sqlx::query_scalar::<_, i64>("SELECT id FROM members WHERE team_id = $1 ORDER BY id")
                .bind(team_id)
                .fetch_all(&mut *self.tx)
                .await?;

        Ok(Some(Team::from_persistence(
            TeamId(team_id),
            TeamName::new(name)?,
            members.into_iter().map(MemberId).collect(),
        )))
    }

    async fn find_member(&mut self, id: MemberId) -> StoreResult<Option<Member>> {
        let row = sqlx::query_as::<_, MemberRow>(
            "SELECT id, username, age, team_id FROM members WHERE id = $1",
        )
        .bind(id.0)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.map(Member::from))
    }

    async fn find_members(&mut self, query: &MemberQuery) -> StoreResult<Vec<Member>> {
        let mut builder = sql::select_members(query);
        let rows = builder
            .build_query_as::<MemberRow>()
            .fetch_all(&mut *self.tx)
            .await?;

        Ok(rows.into_iter().map(Member::from).collect())
    }

    async fn find_member_teams(
        &mut self,
        query: &MemberQuery,
    ) -> StoreResult<Vec<MemberTeamDto>> {
        let mut builder = sql::select_member_teams(query);
        let rows = builder
            .build_query_as::<MemberTeamRow>()
            .fetch_all(&mut *self.tx)
            .await?;

        Ok(rows.into_iter().map(MemberTeamDto::from).collect())
    }

    async fn count_members(&mut self, predicate: &Predicate) -> StoreResult<u64> {
        let mut builder = sql::count_members(predicate);
        let count: i64 = builder
            .build_query_scalar::<i64>()
            .fetch_one(&mut *self.tx)
            .await?;

        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn member_statistics(&mut self) -> StoreResult<MemberStatistics> {
        let (count, age_sum, age_avg, age_max, age_min) =
            sqlx::query_as::<_, (i64, i64, Option<f64>, Option<i32>, Option<i32>)>(
                r#"
                SELECT
                    COUNT(*),
                    COALESCE(SUM(age), 0)::BIGINT,
                    AVG(age)::FLOAT8,
                    MAX(age),
                    MIN(age)
                FROM members
                "#,
            )
            .fetch_one(&mut *self.tx)
            .await?;

        Ok(MemberStatistics {
            count: u64::try_from(count).unwrap_or_default(),
            age_sum,
            age_avg,
            age_max,
            age_min,
        })
    }

    async fn team_average_ages(&mut self) -> StoreResult<Vec<TeamAgeAverage>> {
        let rows = sqlx::query_as::<_, (String, f64)>(
            r#"
            SELECT t.name, AVG(m.age)::FLOAT8
            FROM members m
            JOIN teams t ON t.id = m.team_id
            GROUP BY t.name
            ORDER BY t.name
            "#,
        )
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(team_name, average_age)| TeamAgeAverage {
                team_name,
                average_age,
            })
            .collect())
    }

    async fn change_team(&mut self, member_id: MemberId, team_id: TeamId) -> StoreResult<()> {
        let row = sqlx::query_as::<_, MemberRow>(
            "SELECT id, username, age, team_id FROM members WHERE id = $1 FOR UPDATE",
        )
        .bind(member_id.0)
        .fetch_optional(&mut *self.tx)
        .await?;
        let mut member = Member::from(row.ok_or(StoreError::UnknownMember(member_id))?);

        let mut next = self
            .find_team(team_id)
            .await?
            .ok_or(StoreError::UnknownTeam(team_id))?;
        if member.team_id() == Some(team_id) {
            return Ok(());
        }
        let mut previous = match member.team_id() {
            Some(current) => self.find_team(current).await?,
            None => None,
        };

        reassign_team(&mut member, previous.as_mut(), &mut next)?;

        // Only the member side is stored; both indexes follow from it.
        sqlx::query("UPDATE members SET team_id = $1 WHERE id = $2")
            .bind(member.team_id().map(|t| t.0))
            .bind(member.id().0)
            .execute(&mut *self.tx)
            .await?;

        tracing::debug!(member = %member_id, team = %team_id, "member changed team");
        Ok(())
    }

    async fn commit(self) -> StoreResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> StoreResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
