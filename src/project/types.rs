use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::taxonomy::types::TaxonomyEntity;

/// Development status of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DevStatus {
    Planned,
    #[default]
    #[serde(rename = "In Progress", alias = "InProgress")]
    InProgress,
    Completed,
    #[serde(rename = "On Hold", alias = "OnHold")]
    OnHold,
    Abandoned,
}

impl DevStatus {
    pub const ALL: [DevStatus; 5] = [
        DevStatus::Planned,
        DevStatus::InProgress,
        DevStatus::Completed,
        DevStatus::OnHold,
        DevStatus::Abandoned,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DevStatus::Planned => "Planned",
            DevStatus::InProgress => "In Progress",
            DevStatus::Completed => "Completed",
            DevStatus::OnHold => "On Hold",
            DevStatus::Abandoned => "Abandoned",
        }
    }

    /// Parses the stored wire string; `None` for anything unknown.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == s)
    }
}

impl fmt::Display for DevStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryItem {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

impl GalleryItem {
    pub fn new(url: impl Into<String>) -> Self {
        GalleryItem {
            url: url.into(),
            caption: None,
        }
    }
}

/// Gallery as submitted: either comma-separated URLs or ready-made items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GalleryInput {
    Text(String),
    Items(Vec<GalleryItem>),
}

/// Embedded development-phase sub-document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevelopmentPhase {
    pub status: DevStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

/// The flat record handed over by a form submission.
///
/// `technologies`, `tags`, `gallery` and the three dev-phase fields are
/// submission shorthand; none of them is persisted in this form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSubmission {
    #[serde(alias = "pname")]
    pub name: String,
    pub description: String,
    pub thumbnail: Option<String>,
    pub gallery: Option<GalleryInput>,
    pub repo_link: Option<String>,
    pub site_url: Option<String>,
    pub technologies: Option<String>,
    pub tags: Option<String>,
    pub details: Option<String>,
    pub problem_statement: Option<String>,
    #[serde(default)]
    pub dev_status: DevStatus,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Everything a store needs to write one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPayload {
    pub name: String,
    pub slug: String,
    pub description: String,
    pub thumbnail: Option<String>,
    pub gallery: Vec<GalleryItem>,
    pub repo_link: Option<String>,
    pub demo_link: Option<String>,
    pub technologies: Vec<i64>,
    pub tags: Vec<i64>,
    pub details: Option<String>,
    pub problem_statement: Option<String>,
    pub dev_phase: DevelopmentPhase,
}

/// A persisted project with taxonomy references as ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub thumbnail: Option<String>,
    pub gallery: Vec<GalleryItem>,
    pub repo_link: Option<String>,
    pub demo_link: Option<String>,
    pub technologies: Vec<i64>,
    pub tags: Vec<i64>,
    pub details: Option<String>,
    pub problem_statement: Option<String>,
    pub dev_phase: DevelopmentPhase,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn from_payload(
        id: i64,
        payload: ProjectPayload,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Project {
            id,
            name: payload.name,
            slug: payload.slug,
            description: payload.description,
            thumbnail: payload.thumbnail,
            gallery: payload.gallery,
            repo_link: payload.repo_link,
            demo_link: payload.demo_link,
            technologies: payload.technologies,
            tags: payload.tags,
            details: payload.details,
            problem_statement: payload.problem_statement,
            dev_phase: payload.dev_phase,
            created_at,
            updated_at,
        }
    }
}

/// Read model: a project with its technologies and tags populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDetails {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub thumbnail: Option<String>,
    pub gallery: Vec<GalleryItem>,
    pub repo_link: Option<String>,
    pub demo_link: Option<String>,
    pub technologies: Vec<TaxonomyEntity>,
    pub tags: Vec<TaxonomyEntity>,
    pub details: Option<String>,
    pub problem_statement: Option<String>,
    pub dev_phase: DevelopmentPhase,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProjectDetails {
    pub fn new(project: Project, technologies: Vec<TaxonomyEntity>, tags: Vec<TaxonomyEntity>) -> Self {
        ProjectDetails {
            id: project.id,
            name: project.name,
            slug: project.slug,
            description: project.description,
            thumbnail: project.thumbnail,
            gallery: project.gallery,
            repo_link: project.repo_link,
            demo_link: project.demo_link,
            technologies,
            tags,
            details: project.details,
            problem_statement: project.problem_statement,
            dev_phase: project.dev_phase,
            created_at: project.created_at,
            updated_at: project.updated_at,
        }
    }
}

/// Short listing entry used when browsing projects by technology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub thumbnail: Option<String>,
    pub dev_phase: DevelopmentPhase,
}
