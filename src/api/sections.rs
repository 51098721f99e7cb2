//! Section navigation endpoints.

use axum::extract::{
    rejection::QueryRejection,
    Path, Query, State,
};
use serde::{Deserialize, Serialize};

use super::{parse_roles, success, ApiResult};
use crate::sections::{self, NavigationStep, ProfileSectionId, SectionProgress};
use crate::AppState;

/// Optional role override shared by the section endpoints.
#[derive(Debug, Deserialize)]
pub struct SectionsQuery {
    /// Comma-separated roles; defaults to the roles stored on the profile.
    #[serde(default)]
    pub roles: Option<String>,
}

/// One entry of the displayed section sequence.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionView {
    pub id: ProfileSectionId,
    pub position: usize,
    pub sub_sections: &'static [&'static str],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionsResponse {
    pub roles: Vec<String>,
    pub sections: Vec<SectionView>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Next,
    Previous,
}

#[derive(Debug, Deserialize)]
pub struct NavigationQuery {
    pub current: ProfileSectionId,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default)]
    pub roles: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationResponse {
    pub current: ProfileSectionId,
    /// `null` when going back from the first section.
    pub step: Option<NavigationStep>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<SectionProgress>,
}

/// Roles from the query override, else from the stored profile.
async fn effective_roles(
    state: &AppState,
    user_id: &str,
    query_roles: Option<&str>,
) -> Result<Vec<String>, crate::errors::AppError> {
    if let Some(list) = query_roles {
        return Ok(parse_roles(list));
    }
    let profile = state.repo.get_profile(user_id).await?;
    Ok(profile.map(|p| p.roles).unwrap_or_default())
}

/// GET /api/profiles/:user_id/sections - Displayed section sequence.
pub async fn list_sections(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    params: Result<Query<SectionsQuery>, QueryRejection>,
) -> ApiResult<SectionsResponse> {
    let Query(params) = params?;
    let roles = effective_roles(&state, &user_id, params.roles.as_deref()).await?;

    let sections = sections::displayed_sections(&roles)
        .into_iter()
        .enumerate()
        .map(|(i, id)| SectionView {
            id,
            position: i + 1,
            sub_sections: sections::sub_sections(id),
        })
        .collect();

    success(SectionsResponse { roles, sections })
}

/// GET /api/profiles/:user_id/navigation - Next or previous step from a section.
pub async fn navigate(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    params: Result<Query<NavigationQuery>, QueryRejection>,
) -> ApiResult<NavigationResponse> {
    let Query(params) = params?;
    let roles = effective_roles(&state, &user_id, params.roles.as_deref()).await?;
    let current = params.current;

    let step = match params.direction {
        Direction::Next => Some(sections::next(current, &roles)?),
        Direction::Previous => sections::previous(current, &roles).map(NavigationStep::Section),
    };

    success(NavigationResponse {
        current,
        step,
        progress: sections::section_progress(current, &roles).ok(),
    })
}
