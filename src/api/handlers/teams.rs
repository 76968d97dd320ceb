use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::errors::ApiError;
use crate::application::MemberService;
use crate::domain::member::MemberId;
use crate::domain::repositories::Store;
use crate::domain::search::TeamAgeAverage;
use crate::domain::team::{NewTeam, Team, TeamId};

/// Request body for creating a team
#[derive(Debug, Deserialize)]
pub struct CreateTeamRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamResponse {
    pub id: TeamId,
    pub name: String,
    pub member_ids: Vec<MemberId>,
}

impl From<&Team> for TeamResponse {
    fn from(team: &Team) -> Self {
        Self {
            id: team.id(),
            name: team.name().to_string(),
            member_ids: team.members().to_vec(),
        }
    }
}

/// Create a new team
///
/// POST /api/teams
pub async fn create_team<S: Store>(
    State(store): State<S>,
    Json(req): Json<CreateTeamRequest>,
) -> Result<(StatusCode, Json<TeamResponse>), ApiError> {
    let draft = NewTeam::new(req.name).map_err(|e| ApiError::bad_request(e.to_string()))?;

    let team = MemberService::new(store).save_team(draft).await?;

    Ok((StatusCode::CREATED, Json(TeamResponse::from(&team))))
}

/// Get a team with its member ids
///
/// GET /api/teams/:id
pub async fn get_team<S: Store>(
    State(store): State<S>,
    Path(id): Path<i64>,
) -> Result<Json<TeamResponse>, ApiError> {
    let team = MemberService::new(store)
        .find_team(TeamId(id))
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Team not found: {}", id)))?;

    Ok(Json(TeamResponse::from(&team)))
}

/// Average member age per team name
///
/// GET /api/stats/teams
pub async fn team_average_ages<S: Store>(
    State(store): State<S>,
) -> Result<Json<Vec<TeamAgeAverage>>, ApiError> {
    let averages = MemberService::new(store).team_average_ages().await?;

    Ok(Json(averages))
}
