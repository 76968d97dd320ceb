use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::errors::ApiError;
use crate::application::MemberService;
use crate::domain::member::{Member, MemberId, NewMember};
use crate::domain::repositories::Store;
use crate::domain::search::condition::blank_as_none;
use crate::domain::search::{
    parse_order, MemberSearchCondition, MemberStatistics, MemberTeamDto, Page, PageRequest,
};
use crate::domain::team::TeamId;

const DEFAULT_PAGE_LIMIT: u64 = 20;

/// Request body for creating a member
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMemberRequest {
    pub username: Option<String>,
    #[serde(default)]
    pub age: i32,
    pub team_id: Option<TeamId>,
}

/// Request body for moving a member to another team
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeTeamRequest {
    pub team_id: TeamId,
}

#[derive(Debug, Deserialize)]
pub struct UsernameQuery {
    pub username: Option<String>,
}

/// Search condition plus window and ordering, e.g.
/// `?teamName=teamB&offset=0&limit=10&sort=age:desc,username`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPageParams {
    pub username: Option<String>,
    pub team_name: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub age_goe: Option<i32>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub age_loe: Option<i32>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub offset: Option<u64>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub limit: Option<u64>,
    pub sort: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberResponse {
    pub id: MemberId,
    pub username: Option<String>,
    pub age: i32,
    pub team_id: Option<TeamId>,
}

impl From<&Member> for MemberResponse {
    fn from(member: &Member) -> Self {
        Self {
            id: member.id(),
            username: member.username().map(str::to_string),
            age: member.age(),
            team_id: member.team_id(),
        }
    }
}

/// Create a new member
///
/// POST /api/members
pub async fn create_member<S: Store>(
    State(store): State<S>,
    Json(req): Json<CreateMemberRequest>,
) -> Result<(StatusCode, Json<MemberResponse>), ApiError> {
    let draft = NewMember {
        username: req.username,
        age: req.age,
        team_id: req.team_id,
    };

    let member = MemberService::new(store).save_member(draft).await?;

    Ok((StatusCode::CREATED, Json(MemberResponse::from(&member))))
}

/// Get a member by ID
///
/// GET /api/members/:id
pub async fn get_member<S: Store>(
    State(store): State<S>,
    Path(id): Path<i64>,
) -> Result<Json<MemberResponse>, ApiError> {
    let member = MemberService::new(store)
        .find_by_id(MemberId(id))
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Member not found: {}", id)))?;

    Ok(Json(MemberResponse::from(&member)))
}

/// List all members, or those with an exact username
///
/// GET /api/members?username=
pub async fn list_members<S: Store>(
    State(store): State<S>,
    query: Result<Query<UsernameQuery>, QueryRejection>,
) -> Result<Json<Vec<MemberResponse>>, ApiError> {
    let Query(query) = query?;
    let service = MemberService::new(store);
    let members = match query.username {
        Some(username) => service.find_by_username(&username).await?,
        None => service.find_all().await?,
    };

    Ok(Json(members.iter().map(MemberResponse::from).collect()))
}

/// Move a member to another team
///
/// PUT /api/members/:id/team
pub async fn change_team<S: Store>(
    State(store): State<S>,
    Path(id): Path<i64>,
    Json(req): Json<ChangeTeamRequest>,
) -> Result<Json<MemberResponse>, ApiError> {
    let member = MemberService::new(store)
        .change_team(MemberId(id), req.team_id)
        .await?;

    Ok(Json(MemberResponse::from(&member)))
}

/// Dynamic member search over the member/team join
///
/// GET /api/search/members?username=&teamName=&ageGoe=&ageLoe=
pub async fn search_members<S: Store>(
    State(store): State<S>,
    condition: Result<Query<MemberSearchCondition>, QueryRejection>,
) -> Result<Json<Vec<MemberTeamDto>>, ApiError> {
    let Query(condition) = condition?;
    let rows = MemberService::new(store).search_by_where(&condition).await?;

    Ok(Json(rows))
}

/// Paged, ordered member search
///
/// GET /api/search/members/page
pub async fn search_members_page<S: Store>(
    State(store): State<S>,
    params: Result<Query<SearchPageParams>, QueryRejection>,
) -> Result<Json<Page<MemberTeamDto>>, ApiError> {
    let Query(params) = params?;
    let order = parse_order(params.sort.as_deref().unwrap_or_default())?;
    let page = PageRequest::new(
        params.offset.unwrap_or(0),
        params.limit.unwrap_or(DEFAULT_PAGE_LIMIT),
    );
    let condition = MemberSearchCondition {
        username: params.username,
        team_name: params.team_name,
        age_goe: params.age_goe,
        age_loe: params.age_loe,
    };

    let page = MemberService::new(store)
        .search_page(&condition, order, page)
        .await?;

    Ok(Json(page))
}

/// Count, sum, average, max and min of member ages
///
/// GET /api/stats/members
pub async fn member_statistics<S: Store>(
    State(store): State<S>,
) -> Result<Json<MemberStatistics>, ApiError> {
    let stats = MemberService::new(store).statistics().await?;

    Ok(Json(stats))
}
