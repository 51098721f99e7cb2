//! Profile API endpoints.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{success, ApiResult};
use crate::completion::{self, CompletionState, Route};
use crate::errors::AppError;
use crate::models::{Profile, ProfileUpdate, UpdateProfileRequest};
use crate::sections::{self, NavigationStep};
use crate::skills;
use crate::AppState;

/// Upper bound for the weekly availability answer.
const MAX_HOURS_PER_WEEK: i32 = 168;

/// A stored profile with its derived completion state.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    pub profile: Profile,
    pub completion: CompletionState,
}

/// Result of submitting a section.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub profile: Profile,
    pub completion: CompletionState,
    /// Present when the request named the submitted section.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<NavigationStep>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<Route>,
}

/// Dashboard landing data.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub completion: CompletionState,
    pub route: Route,
}

/// GET /api/profiles - List all profiles.
pub async fn list_profiles(State(state): State<AppState>) -> ApiResult<Vec<ProfileView>> {
    let required = &state.config.required_fields;
    let views = state
        .repo
        .list_profiles()
        .await?
        .into_iter()
        .map(|profile| ProfileView {
            completion: completion::completion_state(Some(&profile), required),
            profile,
        })
        .collect();

    success(views)
}

/// GET /api/profiles/:user_id - Get a volunteer's profile.
pub async fn get_profile(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<ProfileView> {
    let profile = state
        .repo
        .get_profile(&user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Profile {} not found", user_id)))?;

    success(ProfileView {
        completion: completion::completion_state(Some(&profile), &state.config.required_fields),
        profile,
    })
}

/// PUT /api/profiles/:user_id - Submit one intake section.
///
/// The body is decoded here rather than by the `Json` extractor so malformed
/// skill records come back in the standard error envelope. Extractor
/// rejections (missing content type, invalid JSON) use the envelope too.
pub async fn submit_profile(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> ApiResult<SubmitResponse> {
    let Json(body) = body?;
    let request: UpdateProfileRequest = serde_json::from_value(body)?;
    validate_request(&request)?;

    let existing = state.repo.get_profile(&user_id).await?;
    let Submission {
        update,
        read_version,
        next,
        had_completed_before,
    } = plan_submission(&user_id, existing, &request, Utc::now())?;

    // The merge was computed from `read_version`; any write since then is a conflict.
    let profile = state
        .repo
        .save_profile(&user_id, &update, Some(read_version))
        .await?;

    if next == Some(NavigationStep::Complete) && !had_completed_before {
        tracing::info!("Volunteer {} completed their profile", user_id);
    }

    success(SubmitResponse {
        completion: completion::completion_state(Some(&profile), &state.config.required_fields),
        route: next.map(|step| completion::post_submit_route(step, had_completed_before)),
        next,
        profile,
    })
}

/// GET /api/profiles/:user_id/dashboard - Completion summary and landing route.
pub async fn get_dashboard(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<DashboardResponse> {
    let profile = state.repo.get_profile(&user_id).await?;
    let required = &state.config.required_fields;

    success(DashboardResponse {
        completion: completion::completion_state(profile.as_ref(), required),
        route: completion::dashboard_route(profile.as_ref(), required),
    })
}

/// What one submitted section writes, derived from a single read of the profile.
struct Submission {
    update: ProfileUpdate,
    /// Version of the profile the update was computed from, 0 when absent.
    read_version: i64,
    next: Option<NavigationStep>,
    had_completed_before: bool,
}

fn plan_submission(
    user_id: &str,
    existing: Option<Profile>,
    request: &UpdateProfileRequest,
    now: DateTime<Utc>,
) -> Result<Submission, AppError> {
    let read_version = existing.as_ref().map(|p| p.version).unwrap_or(0);
    if let Some(expected) = request.expected_version {
        if expected != read_version {
            return Err(AppError::Conflict {
                message: format!(
                    "Version mismatch: expected {}, current {}",
                    expected, read_version
                ),
                current_version: read_version,
            });
        }
    }

    let had_completed_before = completion::has_completed_before(existing.as_ref());
    let base = existing.unwrap_or_else(|| Profile::blank(user_id));

    let merged_skills = request
        .skills
        .as_deref()
        .map(|submitted| skills::merge(&base.skills, submitted));
    let mut update = request.to_update(merged_skills);

    // Roles submitted with this section take effect for its navigation.
    let roles: &[String] = request.roles.as_deref().unwrap_or(&base.roles);
    let next = request
        .section
        .map(|section| sections::next(section, roles))
        .transpose()?;

    if next == Some(NavigationStep::Complete) {
        update = update.and(completion::record_completion(&base, now));
    }

    Ok(Submission {
        update,
        read_version,
        next,
        had_completed_before,
    })
}

/// Field checks the type system does not cover. Skill records are already
/// validated by decoding.
fn validate_request(request: &UpdateProfileRequest) -> Result<(), AppError> {
    if let Some(hours) = request.hours_per_week {
        if !(0..=MAX_HOURS_PER_WEEK).contains(&hours) {
            return Err(AppError::Validation(format!(
                "hoursPerWeek must be between 0 and {}",
                MAX_HOURS_PER_WEEK
            )));
        }
    }
    if let Some(roles) = &request.roles {
        if roles.iter().any(|r| r.trim().is_empty()) {
            return Err(AppError::Validation("Roles must not be blank".to_string()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_database, Repository};
    use crate::skills::{SkillCode, SkillLevel, SkillRecord};
    use tempfile::TempDir;

    fn skills_request(code: SkillCode, level: i64) -> UpdateProfileRequest {
        UpdateProfileRequest {
            skills: Some(vec![SkillRecord::new(
                code,
                SkillLevel::try_from(level).unwrap(),
            )]),
            ..Default::default()
        }
    }

    async fn save(
        repo: &Repository,
        existing: Option<Profile>,
        request: &UpdateProfileRequest,
    ) -> Result<Profile, AppError> {
        let submission = plan_submission("vol-1", existing, request, Utc::now())?;
        repo.save_profile("vol-1", &submission.update, Some(submission.read_version))
            .await
    }

    #[tokio::test]
    async fn test_interleaved_skill_merges_conflict_instead_of_dropping() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let pool = init_database(&temp_dir.path().join("test.sqlite"))
            .await
            .expect("Failed to init DB");
        let repo = Repository::new(pool);
        save(&repo, None, &skills_request(SkillCode::React, 2))
            .await
            .unwrap();

        let read_a = repo.get_profile("vol-1").await.unwrap();
        let read_b = repo.get_profile("vol-1").await.unwrap();
        save(&repo, read_b, &skills_request(SkillCode::Sql, 1))
            .await
            .unwrap();

        let err = save(&repo, read_a, &skills_request(SkillCode::Figma, 3))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict { current_version: 2, .. }));

        let mut codes: Vec<SkillCode> = repo
            .get_profile("vol-1")
            .await
            .unwrap()
            .unwrap()
            .skills
            .iter()
            .map(|s| s.code)
            .collect();
        codes.sort();
        assert_eq!(codes, vec![SkillCode::React, SkillCode::Sql]);

        let retry = repo.get_profile("vol-1").await.unwrap();
        let saved = save(&repo, retry, &skills_request(SkillCode::Figma, 3))
            .await
            .unwrap();
        assert_eq!(saved.skills.len(), 3);
    }

    #[test]
    fn test_stale_expected_version_is_rejected_before_merge() {
        let mut existing = Profile::blank("vol-1");
        existing.version = 3;
        let request = UpdateProfileRequest {
            expected_version: Some(2),
            ..skills_request(SkillCode::Ux, 1)
        };

        let result = plan_submission("vol-1", Some(existing), &request, Utc::now());

        assert!(matches!(
            result,
            Err(AppError::Conflict {
                current_version: 3,
                ..
            })
        ));
    }

    #[test]
    fn test_validate_request_hours() {
        let mut request = UpdateProfileRequest {
            hours_per_week: Some(10),
            ..Default::default()
        };
        assert!(validate_request(&request).is_ok());

        request.hours_per_week = Some(169);
        assert!(matches!(
            validate_request(&request),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_request_blank_role() {
        let request = UpdateProfileRequest {
            roles: Some(vec!["developer".to_string(), " ".to_string()]),
            ..Default::default()
        };

        assert!(validate_request(&request).is_err());
    }
}
