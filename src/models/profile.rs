//! Volunteer profile model.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::ShirtSize;
use crate::sections::ProfileSectionId;
use crate::skills::SkillRecord;

/// Agreements a volunteer signs on the getting-started page.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Agreements {
    #[serde(default)]
    pub code_of_conduct: bool,
    #[serde(default)]
    pub ethics: bool,
    #[serde(default)]
    pub privacy: bool,
}

impl Agreements {
    pub fn any_signed(&self) -> bool {
        self.code_of_conduct || self.ethics || self.privacy
    }
}

/// A volunteer's intake profile, keyed by the identity provider's user id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pronouns: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shirt_size: Option<ShirtSize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hours_per_week: Option<i32>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub skills: Vec<SkillRecord>,
    #[serde(default)]
    pub agreements: Agreements,
    /// Set once, when the volunteer first finishes the intake flow.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_date: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    /// Internal version for optimistic concurrency control
    #[serde(default)]
    pub version: i64,
}

impl Profile {
    /// An unsaved, empty profile for a volunteer who has none yet.
    pub fn blank(user_id: &str) -> Self {
        let now = Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            first_name: None,
            last_name: None,
            email: None,
            phone: None,
            pronouns: None,
            shirt_size: None,
            hours_per_week: None,
            roles: Vec::new(),
            skills: Vec::new(),
            agreements: Agreements::default(),
            completion_date: None,
            created_at: now.clone(),
            updated_at: now,
            version: 0,
        }
    }

    /// True when a non-blank completion date is stored.
    pub fn has_completion_date(&self) -> bool {
        self.completion_date
            .as_deref()
            .is_some_and(|date| !date.trim().is_empty())
    }

    /// Apply a partial update. Fields the update leaves unset keep their value.
    pub fn apply(&mut self, update: &ProfileUpdate) {
        let ProfileUpdate {
            first_name,
            last_name,
            email,
            phone,
            pronouns,
            shirt_size,
            hours_per_week,
            roles,
            skills,
            agreements,
            completion_date,
        } = update;

        self.first_name = first_name.clone().or(self.first_name.take());
        self.last_name = last_name.clone().or(self.last_name.take());
        self.email = email.clone().or(self.email.take());
        self.phone = phone.clone().or(self.phone.take());
        self.pronouns = pronouns.clone().or(self.pronouns.take());
        self.shirt_size = shirt_size.or(self.shirt_size);
        self.hours_per_week = hours_per_week.or(self.hours_per_week);
        if let Some(roles) = roles {
            self.roles = roles.clone();
        }
        if let Some(skills) = skills {
            self.skills = skills.clone();
        }
        if let Some(agreements) = agreements {
            self.agreements = *agreements;
        }
        // Write-once: a stored completion date is never replaced.
        if !self.has_completion_date() {
            self.completion_date = completion_date.clone().or(self.completion_date.take());
        }
    }
}

/// Changes to persist for one profile. Produced by the request handlers and
/// the completion aggregator; consumed by the repository.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub pronouns: Option<String>,
    pub shirt_size: Option<ShirtSize>,
    pub hours_per_week: Option<i32>,
    pub roles: Option<Vec<String>>,
    /// Full, already merged skill list.
    pub skills: Option<Vec<SkillRecord>>,
    pub agreements: Option<Agreements>,
    pub completion_date: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        *self == ProfileUpdate::default()
    }

    /// Combine two updates; fields set in `other` win.
    pub fn and(self, other: ProfileUpdate) -> ProfileUpdate {
        ProfileUpdate {
            first_name: other.first_name.or(self.first_name),
            last_name: other.last_name.or(self.last_name),
            email: other.email.or(self.email),
            phone: other.phone.or(self.phone),
            pronouns: other.pronouns.or(self.pronouns),
            shirt_size: other.shirt_size.or(self.shirt_size),
            hours_per_week: other.hours_per_week.or(self.hours_per_week),
            roles: other.roles.or(self.roles),
            skills: other.skills.or(self.skills),
            agreements: other.agreements.or(self.agreements),
            completion_date: other.completion_date.or(self.completion_date),
        }
    }
}

/// Request body for submitting one intake section.
///
/// `skills` holds only the codes shown on the submitted page; they are merged
/// into the stored skills rather than replacing them.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub pronouns: Option<String>,
    #[serde(default)]
    pub shirt_size: Option<ShirtSize>,
    #[serde(default)]
    pub hours_per_week: Option<i32>,
    #[serde(default)]
    pub roles: Option<Vec<String>>,
    #[serde(default)]
    pub skills: Option<Vec<SkillRecord>>,
    #[serde(default)]
    pub agreements: Option<Agreements>,
    /// Section being submitted; drives the next-step computation.
    #[serde(default)]
    pub section: Option<ProfileSectionId>,
    /// Expected version for optimistic concurrency control
    #[serde(default)]
    pub expected_version: Option<i64>,
}

impl UpdateProfileRequest {
    /// Field changes carried by the request, with `skills` replaced by the
    /// caller-supplied merged list.
    pub fn to_update(&self, merged_skills: Option<Vec<SkillRecord>>) -> ProfileUpdate {
        ProfileUpdate {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            pronouns: self.pronouns.clone(),
            shirt_size: self.shirt_size,
            hours_per_week: self.hours_per_week,
            roles: self.roles.clone(),
            skills: merged_skills,
            agreements: self.agreements,
            completion_date: None,
        }
    }
}
