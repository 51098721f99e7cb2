//! Profile section navigator.
//!
//! The intake wizard walks an ordered list of sections. Which sections a
//! volunteer sees depends on the roles they declared, so the sequence is
//! rebuilt from the current roles on every call and never cached.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

/// Primary sections of the intake wizard, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProfileSectionId {
    GettingStarted,
    DesignSkills,
    TechnicalSkills,
    AdditionalSkills,
}

impl ProfileSectionId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileSectionId::GettingStarted => "getting-started",
            ProfileSectionId::DesignSkills => "design-skills",
            ProfileSectionId::TechnicalSkills => "technical-skills",
            ProfileSectionId::AdditionalSkills => "additional-skills",
        }
    }
}

impl fmt::Display for ProfileSectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// When a section is part of a volunteer's sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inclusion {
    Always,
    /// Shown only when the named role is selected.
    Role(&'static str),
}

/// A row of the section table.
#[derive(Debug, Clone, Copy)]
pub struct SectionRule {
    pub section: ProfileSectionId,
    pub inclusion: Inclusion,
    /// Display-only breakdown used for progress indicators.
    pub sub_sections: &'static [&'static str],
}

/// Canonical section order with inclusion rules.
///
/// Adding a role-gated section is a new row here; the navigation functions
/// below do not change.
pub const SECTION_TABLE: &[SectionRule] = &[
    SectionRule {
        section: ProfileSectionId::GettingStarted,
        inclusion: Inclusion::Always,
        sub_sections: &["basic-info", "roles", "agreements"],
    },
    SectionRule {
        section: ProfileSectionId::DesignSkills,
        inclusion: Inclusion::Role("designer"),
        sub_sections: &["design-tools", "design-experience"],
    },
    SectionRule {
        section: ProfileSectionId::TechnicalSkills,
        inclusion: Inclusion::Role("developer"),
        sub_sections: &["languages", "frameworks", "tooling"],
    },
    SectionRule {
        section: ProfileSectionId::AdditionalSkills,
        inclusion: Inclusion::Always,
        sub_sections: &["other-skills", "availability"],
    },
];

/// First section of every sequence.
pub const INITIAL_SECTION: ProfileSectionId = ProfileSectionId::GettingStarted;

/// Outcome of advancing from a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationStep {
    Section(ProfileSectionId),
    /// The last displayed section was finished.
    Complete,
}

impl NavigationStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            NavigationStep::Section(section) => section.as_str(),
            NavigationStep::Complete => "complete",
        }
    }
}

impl Serialize for NavigationStep {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// The current section is not in the sequence computed from the current roles.
///
/// Callers should send the volunteer back to [`INITIAL_SECTION`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationError {
    pub section: ProfileSectionId,
    pub roles: Vec<String>,
}

impl fmt::Display for NavigationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "section {} is not available for roles [{}]",
            self.section,
            self.roles.join(", ")
        )
    }
}

impl std::error::Error for NavigationError {}

fn is_included<R: AsRef<str>>(inclusion: Inclusion, roles: &[R]) -> bool {
    match inclusion {
        Inclusion::Always => true,
        Inclusion::Role(role) => roles.iter().any(|r| r.as_ref() == role),
    }
}

/// Sections shown to a volunteer with the given roles, in display order.
pub fn displayed_sections<R: AsRef<str>>(roles: &[R]) -> Vec<ProfileSectionId> {
    SECTION_TABLE
        .iter()
        .filter(|rule| is_included(rule.inclusion, roles))
        .map(|rule| rule.section)
        .collect()
}

fn locate<R: AsRef<str>>(
    current: ProfileSectionId,
    roles: &[R],
) -> (Vec<ProfileSectionId>, Option<usize>) {
    let sequence = displayed_sections(roles);
    let index = sequence.iter().position(|s| *s == current);
    (sequence, index)
}

fn navigation_error<R: AsRef<str>>(current: ProfileSectionId, roles: &[R]) -> NavigationError {
    NavigationError {
        section: current,
        roles: roles.iter().map(|r| r.as_ref().to_string()).collect(),
    }
}

/// Step after finishing `current`.
pub fn next<R: AsRef<str>>(
    current: ProfileSectionId,
    roles: &[R],
) -> Result<NavigationStep, NavigationError> {
    let (sequence, index) = locate(current, roles);
    let index = index.ok_or_else(|| navigation_error(current, roles))?;

    Ok(match sequence.get(index + 1) {
        Some(section) => NavigationStep::Section(*section),
        None => NavigationStep::Complete,
    })
}

/// Section before `current`, if any.
///
/// Returns `None` at the first section and also when `current` is no longer
/// displayed; neither case is an error when going back.
pub fn previous<R: AsRef<str>>(current: ProfileSectionId, roles: &[R]) -> Option<ProfileSectionId> {
    let (sequence, index) = locate(current, roles);
    let index = index?;
    index.checked_sub(1).map(|i| sequence[i])
}

/// Display-only sub-sections of a section.
pub fn sub_sections(section: ProfileSectionId) -> &'static [&'static str] {
    SECTION_TABLE
        .iter()
        .find(|rule| rule.section == section)
        .map(|rule| rule.sub_sections)
        .unwrap_or(&[])
}

/// 1-based position of a section within the displayed sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionProgress {
    pub position: usize,
    pub total: usize,
}

pub fn section_progress<R: AsRef<str>>(
    current: ProfileSectionId,
    roles: &[R],
) -> Result<SectionProgress, NavigationError> {
    let (sequence, index) = locate(current, roles);
    let index = index.ok_or_else(|| navigation_error(current, roles))?;
    Ok(SectionProgress {
        position: index + 1,
        total: sequence.len(),
    })
}
