use serde::Serialize;

use crate::domain::member::{Member, MemberId};
use crate::domain::team::{Team, TeamId};

/// Flat row produced by the member ⟕ team join
///
/// Members without a team keep their row; the team columns are `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberTeamDto {
    pub member_id: MemberId,
    pub username: Option<String>,
    pub age: i32,
    pub team_id: Option<TeamId>,
    pub team_name: Option<String>,
}

impl MemberTeamDto {
    /// Joins a member with the team it references, if any
    pub fn join(member: &Member, team: Option<&Team>) -> Self {
        Self {
            member_id: member.id(),
            username: member.username().map(str::to_string),
            age: member.age(),
            team_id: team.map(Team::id),
            team_name: team.map(|t| t.name().as_str().to_string()),
        }
    }
}

/// Aggregates over the whole member table
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberStatistics {
    pub count: u64,
    pub age_sum: i64,
    pub age_avg: Option<f64>,
    pub age_max: Option<i32>,
    pub age_min: Option<i32>,
}

impl MemberStatistics {
    /// Folds member ages into the aggregate row
    pub fn from_ages<I>(ages: I) -> Self
    where
        I: IntoIterator<Item = i32>,
    {
        let mut stats = Self {
            count: 0,
            age_sum: 0,
            age_avg: None,
            age_max: None,
            age_min: None,
        };

        for age in ages {
            stats.count += 1;
            stats.age_sum += i64::from(age);
            stats.age_max = Some(stats.age_max.map_or(age, |max| max.max(age)));
            stats.age_min = Some(stats.age_min.map_or(age, |min| min.min(age)));
        }

        if stats.count > 0 {
            stats.age_avg = Some(stats.age_sum as f64 / stats.count as f64);
        }
        stats
    }
}

/// Average member age of one team (inner join, grouped by team name)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamAgeAverage {
    pub team_name: String,
    pub average_age: f64,
}

/// One page of results plus the unpaged total
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub results: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}
