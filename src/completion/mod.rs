//! Profile completion aggregator.
//!
//! Derives the dashboard's completion percentage and first-time/update
//! classification from a stored profile, and decides where the client goes
//! after a section is submitted.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{Profile, ProfileUpdate};
use crate::sections::{NavigationStep, ProfileSectionId, INITIAL_SECTION};

/// A profile attribute that counts toward completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequiredField {
    FirstName,
    LastName,
    Email,
    Phone,
    ShirtSize,
    Roles,
    Skills,
    Agreements,
    HoursPerWeek,
}

impl RequiredField {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequiredField::FirstName => "firstName",
            RequiredField::LastName => "lastName",
            RequiredField::Email => "email",
            RequiredField::Phone => "phone",
            RequiredField::ShirtSize => "shirtSize",
            RequiredField::Roles => "roles",
            RequiredField::Skills => "skills",
            RequiredField::Agreements => "agreements",
            RequiredField::HoursPerWeek => "hoursPerWeek",
        }
    }

    /// Whether the profile has a non-empty value for this field.
    pub fn is_present(&self, profile: &Profile) -> bool {
        fn filled(value: &Option<String>) -> bool {
            value.as_deref().is_some_and(|s| !s.trim().is_empty())
        }

        match self {
            RequiredField::FirstName => filled(&profile.first_name),
            RequiredField::LastName => filled(&profile.last_name),
            RequiredField::Email => filled(&profile.email),
            RequiredField::Phone => filled(&profile.phone),
            RequiredField::ShirtSize => profile.shirt_size.is_some(),
            RequiredField::Roles => !profile.roles.is_empty(),
            RequiredField::Skills => !profile.skills.is_empty(),
            RequiredField::Agreements => profile.agreements.any_signed(),
            RequiredField::HoursPerWeek => profile.hours_per_week.is_some_and(|h| h > 0),
        }
    }
}

impl fmt::Display for RequiredField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequiredField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "firstName" => Ok(RequiredField::FirstName),
            "lastName" => Ok(RequiredField::LastName),
            "email" => Ok(RequiredField::Email),
            "phone" => Ok(RequiredField::Phone),
            "shirtSize" => Ok(RequiredField::ShirtSize),
            "roles" => Ok(RequiredField::Roles),
            "skills" => Ok(RequiredField::Skills),
            "agreements" => Ok(RequiredField::Agreements),
            "hoursPerWeek" => Ok(RequiredField::HoursPerWeek),
            other => Err(format!("unknown required field: {}", other)),
        }
    }
}

/// Fields required when nothing is configured.
pub const DEFAULT_REQUIRED_FIELDS: &[RequiredField] = &[
    RequiredField::FirstName,
    RequiredField::LastName,
    RequiredField::Email,
    RequiredField::Phone,
    RequiredField::ShirtSize,
    RequiredField::Roles,
    RequiredField::Skills,
    RequiredField::Agreements,
];

/// Share of required fields filled in, 0 to 100.
///
/// An absent profile is 0. A present profile with nothing required is 100.
pub fn percent_complete(profile: Option<&Profile>, required: &[RequiredField]) -> u8 {
    let Some(profile) = profile else {
        return 0;
    };
    if required.is_empty() {
        return 100;
    }

    let total = required.len();
    let present = required.iter().filter(|f| f.is_present(profile)).count();
    // Round half up.
    ((present * 100 + total / 2) / total) as u8
}

/// True once the volunteer has finished the intake flow at least once.
pub fn has_completed_before(profile: Option<&Profile>) -> bool {
    profile.is_some_and(Profile::has_completion_date)
}

/// Stamp the completion date if the profile has none.
///
/// The completion date is write-once: when already set, the returned update
/// is empty and the original timestamp survives later submissions.
pub fn record_completion(profile: &Profile, now: DateTime<Utc>) -> ProfileUpdate {
    if has_completed_before(Some(profile)) {
        return ProfileUpdate::default();
    }
    ProfileUpdate {
        completion_date: Some(now.to_rfc3339()),
        ..Default::default()
    }
}

/// Display-ready completion summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionState {
    pub percent_complete: u8,
    pub has_completed_before: bool,
}

pub fn completion_state(profile: Option<&Profile>, required: &[RequiredField]) -> CompletionState {
    CompletionState {
        percent_complete: percent_complete(profile, required),
        has_completed_before: has_completed_before(profile),
    }
}

/// Where the client should take the volunteer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "route", rename_all = "camelCase")]
pub enum Route {
    /// Render an intake section.
    Intake { section: ProfileSectionId },
    /// Render the dashboard. `first_completion` selects the welcome message
    /// over the "profile updated" one.
    #[serde(rename_all = "camelCase")]
    Dashboard { first_completion: bool },
}

/// Landing decision for the dashboard: a 0% profile goes straight to intake.
pub fn dashboard_route(profile: Option<&Profile>, required: &[RequiredField]) -> Route {
    if percent_complete(profile, required) == 0 {
        Route::Intake {
            section: INITIAL_SECTION,
        }
    } else {
        Route::Dashboard {
            first_completion: false,
        }
    }
}

/// Routing after a section submit, given whether the profile had been
/// completed before this submit.
pub fn post_submit_route(step: NavigationStep, had_completed_before: bool) -> Route {
    match step {
        NavigationStep::Section(section) => Route::Intake { section },
        NavigationStep::Complete => Route::Dashboard {
            first_completion: !had_completed_before,
        },
    }
}
