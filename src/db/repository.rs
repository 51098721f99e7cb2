//! Profile repository.
//!
//! Writes are last-write-wins unless the caller passes the version it read,
//! in which case a stale write is rejected as a conflict.

use chrono::Utc;
use serde::de::DeserializeOwned;
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::models::{Agreements, Profile, ProfileUpdate, ShirtSize};
use crate::skills::SkillRecord;

const PROFILE_COLUMNS: &str = "user_id, id, first_name, last_name, email, phone, pronouns, \
     shirt_size, hours_per_week, roles, skills, agreed_code_of_conduct, agreed_ethics, \
     agreed_privacy, completion_date, created_at, updated_at, version";

/// Database repository for volunteer profiles.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// List all profiles, ordered by name.
    pub async fn list_profiles(&self) -> Result<Vec<Profile>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM profiles ORDER BY last_name, first_name, user_id",
            PROFILE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(profile_from_row).collect()
    }

    /// Get the profile of a volunteer. `None` for a volunteer who has not saved one yet.
    pub async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM profiles WHERE user_id = ?",
            PROFILE_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(profile_from_row).transpose()
    }

    /// Apply `update` to the stored profile, creating it on first save.
    ///
    /// With `expected_version`, the write only succeeds against that version
    /// (0 meaning "no profile yet").
    pub async fn save_profile(
        &self,
        user_id: &str,
        update: &ProfileUpdate,
        expected_version: Option<i64>,
    ) -> Result<Profile, AppError> {
        let existing = self.get_profile(user_id).await?;
        let current_version = existing.as_ref().map(|p| p.version).unwrap_or(0);

        if let Some(expected) = expected_version {
            if expected != current_version {
                tracing::warn!(
                    "Stale profile write for {}: expected version {}, current {}",
                    user_id,
                    expected,
                    current_version
                );
                return Err(AppError::Conflict {
                    message: format!(
                        "Version mismatch: expected {}, current {}",
                        expected, current_version
                    ),
                    current_version,
                });
            }
        }

        match existing {
            None => self.insert_profile(user_id, update).await,
            // Nothing to write; keep the version unchanged
            Some(existing) if update.is_empty() => Ok(existing),
            Some(existing) => self.update_profile(existing, update).await,
        }
    }

    async fn insert_profile(
        &self,
        user_id: &str,
        update: &ProfileUpdate,
    ) -> Result<Profile, AppError> {
        let mut profile = Profile::blank(user_id);
        profile.apply(update);
        profile.version = 1;

        let roles_json = serde_json::to_string(&profile.roles)?;
        let skills_json = serde_json::to_string(&profile.skills)?;

        let result = sqlx::query(&format!(
            "INSERT INTO profiles ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT(user_id) DO NOTHING",
            PROFILE_COLUMNS
        ))
        .bind(&profile.user_id)
        .bind(&profile.id)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.email)
        .bind(&profile.phone)
        .bind(&profile.pronouns)
        .bind(profile.shirt_size.map(|s| s.as_str()))
        .bind(profile.hours_per_week)
        .bind(&roles_json)
        .bind(&skills_json)
        .bind(profile.agreements.code_of_conduct as i32)
        .bind(profile.agreements.ethics as i32)
        .bind(profile.agreements.privacy as i32)
        .bind(&profile.completion_date)
        .bind(&profile.created_at)
        .bind(&profile.updated_at)
        .bind(profile.version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            // Another request created the profile between our read and write
            let current = self.get_profile(user_id).await?;
            return Err(AppError::Conflict {
                message: "Concurrent profile creation detected".to_string(),
                current_version: current.map(|p| p.version).unwrap_or(0),
            });
        }

        tracing::info!("Created profile for {}", user_id);
        Ok(profile)
    }

    async fn update_profile(
        &self,
        existing: Profile,
        update: &ProfileUpdate,
    ) -> Result<Profile, AppError> {
        let previous_version = existing.version;
        let mut profile = existing;
        profile.apply(update);
        profile.version = previous_version + 1;
        profile.updated_at = Utc::now().to_rfc3339();

        let roles_json = serde_json::to_string(&profile.roles)?;
        let skills_json = serde_json::to_string(&profile.skills)?;

        // Conditional UPDATE on the version we read
        let result = sqlx::query(
            "UPDATE profiles SET first_name = ?, last_name = ?, email = ?, phone = ?, pronouns = ?, \
             shirt_size = ?, hours_per_week = ?, roles = ?, skills = ?, agreed_code_of_conduct = ?, \
             agreed_ethics = ?, agreed_privacy = ?, completion_date = ?, updated_at = ?, version = ? \
             WHERE user_id = ? AND version = ?",
        )
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.email)
        .bind(&profile.phone)
        .bind(&profile.pronouns)
        .bind(profile.shirt_size.map(|s| s.as_str()))
        .bind(profile.hours_per_week)
        .bind(&roles_json)
        .bind(&skills_json)
        .bind(profile.agreements.code_of_conduct as i32)
        .bind(profile.agreements.ethics as i32)
        .bind(profile.agreements.privacy as i32)
        .bind(&profile.completion_date)
        .bind(&profile.updated_at)
        .bind(profile.version)
        .bind(&profile.user_id)
        .bind(previous_version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let current = self.get_profile(&profile.user_id).await?;
            return Err(AppError::Conflict {
                message: "Concurrent modification detected".to_string(),
                current_version: current.map(|p| p.version).unwrap_or(0),
            });
        }

        Ok(profile)
    }
}

fn profile_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Profile, AppError> {
    let shirt_size: Option<String> = row.get("shirt_size");
    let roles: String = row.get("roles");
    let skills: String = row.get("skills");
    let user_id: String = row.get("user_id");
    let code_of_conduct: i32 = row.get("agreed_code_of_conduct");
    let ethics: i32 = row.get("agreed_ethics");
    let privacy: i32 = row.get("agreed_privacy");

    let roles: Vec<String> = decode_json_column(&roles, "roles", &user_id)?;
    let skills: Vec<SkillRecord> = decode_json_column(&skills, "skills", &user_id)?;

    Ok(Profile {
        id: row.get("id"),
        user_id,
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        email: row.get("email"),
        phone: row.get("phone"),
        pronouns: row.get("pronouns"),
        shirt_size: shirt_size.and_then(|s| ShirtSize::from_str(&s)),
        hours_per_week: row.get("hours_per_week"),
        roles,
        skills,
        agreements: Agreements {
            code_of_conduct: code_of_conduct != 0,
            ethics: ethics != 0,
            privacy: privacy != 0,
        },
        completion_date: row.get("completion_date"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        version: row.get("version"),
    })
}

/// Decode a JSON column. Values were validated on the way in, so a failure
/// means a corrupt row.
fn decode_json_column<T: DeserializeOwned>(
    raw: &str,
    column: &str,
    user_id: &str,
) -> Result<T, AppError> {
    serde_json::from_str(raw).map_err(|e| {
        tracing::error!("Corrupt {} column for {}: {}", column, user_id, e);
        AppError::Internal(format!("Stored {} for {} are unreadable", column, user_id))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_database;
    use crate::skills::{SkillCode, SkillLevel};
    use tempfile::TempDir;

    async fn repository() -> (Repository, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let pool = init_database(&temp_dir.path().join("test.sqlite"))
            .await
            .expect("Failed to init DB");
        (Repository::new(pool), temp_dir)
    }

    fn skill(code: SkillCode, level: i64) -> SkillRecord {
        SkillRecord::new(code, SkillLevel::try_from(level).unwrap())
    }

    #[tokio::test]
    async fn test_missing_profile_is_none() {
        let (repo, _dir) = repository().await;

        assert!(repo.get_profile("nobody").await.unwrap().is_none());
        assert!(repo.list_profiles().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_first_save_creates_profile() {
        let (repo, _dir) = repository().await;

        let update = ProfileUpdate {
            first_name: Some("Ada".to_string()),
            shirt_size: Some(ShirtSize::L),
            roles: Some(vec!["developer".to_string()]),
            skills: Some(vec![skill(SkillCode::Sql, 0)]),
            agreements: Some(Agreements {
                ethics: true,
                ..Default::default()
            }),
            ..Default::default()
        };
        let saved = repo.save_profile("user-1", &update, None).await.unwrap();
        assert_eq!(saved.version, 1);

        let loaded = repo.get_profile("user-1").await.unwrap().unwrap();
        assert_eq!(loaded, saved);
        assert_eq!(loaded.skills, vec![skill(SkillCode::Sql, 0)]);
        assert!(loaded.agreements.ethics);
    }

    #[tokio::test]
    async fn test_update_keeps_untouched_fields() {
        let (repo, _dir) = repository().await;

        let first = ProfileUpdate {
            first_name: Some("Ada".to_string()),
            phone: Some("555-0100".to_string()),
            ..Default::default()
        };
        repo.save_profile("user-1", &first, None).await.unwrap();

        let second = ProfileUpdate {
            phone: Some("555-0199".to_string()),
            ..Default::default()
        };
        let saved = repo.save_profile("user-1", &second, Some(1)).await.unwrap();

        assert_eq!(saved.version, 2);
        assert_eq!(saved.first_name.as_deref(), Some("Ada"));
        assert_eq!(saved.phone.as_deref(), Some("555-0199"));
    }

    #[tokio::test]
    async fn test_stale_version_is_conflict() {
        let (repo, _dir) = repository().await;
        repo.save_profile("user-1", &ProfileUpdate::default(), None)
            .await
            .unwrap();

        let err = repo
            .save_profile("user-1", &ProfileUpdate::default(), Some(5))
            .await
            .unwrap_err();

        match err {
            AppError::Conflict {
                current_version, ..
            } => assert_eq!(current_version, 1),
            other => panic!("expected conflict, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_update_does_not_bump_version() {
        let (repo, _dir) = repository().await;
        let update = ProfileUpdate {
            email: Some("ada@example.org".to_string()),
            ..Default::default()
        };
        repo.save_profile("user-1", &update, None).await.unwrap();

        let saved = repo
            .save_profile("user-1", &ProfileUpdate::default(), Some(1))
            .await
            .unwrap();

        assert_eq!(saved.version, 1);
        assert_eq!(saved.email.as_deref(), Some("ada@example.org"));
    }

    #[tokio::test]
    async fn test_list_profiles_ordered_by_last_name() {
        let (repo, _dir) = repository().await;
        for (user_id, last_name) in [("u1", "Turing"), ("u2", "Hopper"), ("u3", "Lovelace")] {
            let update = ProfileUpdate {
                last_name: Some(last_name.to_string()),
                ..Default::default()
            };
            repo.save_profile(user_id, &update, None).await.unwrap();
        }

        let names: Vec<_> = repo
            .list_profiles()
            .await
            .unwrap()
            .into_iter()
            .filter_map(|p| p.last_name)
            .collect();

        assert_eq!(names, vec!["Hopper", "Lovelace", "Turing"]);
    }

    #[tokio::test]
    async fn test_corrupt_json_columns_are_internal_errors() {
        let (repo, _dir) = repository().await;
        let update = ProfileUpdate {
            roles: Some(vec!["developer".to_string()]),
            ..Default::default()
        };
        repo.save_profile("user-1", &update, None).await.unwrap();

        for column in ["roles", "skills"] {
            sqlx::query(&format!(
                "UPDATE profiles SET {} = 'not json' WHERE user_id = 'user-1'",
                column
            ))
            .execute(&repo.pool)
            .await
            .unwrap();

            let err = repo.get_profile("user-1").await.unwrap_err();
            assert!(matches!(err, AppError::Internal(_)), "{}: {:?}", column, err);

            sqlx::query(&format!(
                "UPDATE profiles SET {} = '[]' WHERE user_id = 'user-1'",
                column
            ))
            .execute(&repo.pool)
            .await
            .unwrap();
        }

        assert!(repo.get_profile("user-1").await.unwrap().is_some());
    }
}
