use serde::{Deserialize, Serialize};
use std::fmt;

/// The two shared label collections a project can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Taxonomy {
    Technology,
    Tag,
}

impl Taxonomy {
    /// Backing table for this taxonomy's entities.
    pub fn table(&self) -> &'static str {
        match self {
            Taxonomy::Technology => "technologies",
            Taxonomy::Tag => "tags",
        }
    }

    /// Join table linking projects to this taxonomy, and its entity column.
    pub fn link_table(&self) -> (&'static str, &'static str) {
        match self {
            Taxonomy::Technology => ("project_technologies", "technology_id"),
            Taxonomy::Tag => ("project_tags", "tag_id"),
        }
    }

    /// Submission field the labels for this taxonomy arrive in.
    pub fn field(&self) -> &'static str {
        match self {
            Taxonomy::Technology => "technologies",
            Taxonomy::Tag => "tags",
        }
    }
}

impl fmt::Display for Taxonomy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Taxonomy::Technology => write!(f, "technology"),
            Taxonomy::Tag => write!(f, "tag"),
        }
    }
}

/// Technology grouping; lazily created technologies start as `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TechnologyCategory {
    Language,
    Framework,
    Database,
    Tool,
    Library,
    Platform,
    #[default]
    Other,
}

impl fmt::Display for TechnologyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TechnologyCategory::Language => write!(f, "Language"),
            TechnologyCategory::Framework => write!(f, "Framework"),
            TechnologyCategory::Database => write!(f, "Database"),
            TechnologyCategory::Tool => write!(f, "Tool"),
            TechnologyCategory::Library => write!(f, "Library"),
            TechnologyCategory::Platform => write!(f, "Platform"),
            TechnologyCategory::Other => write!(f, "Other"),
        }
    }
}

impl From<&str> for TechnologyCategory {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "language" => TechnologyCategory::Language,
            "framework" => TechnologyCategory::Framework,
            "database" => TechnologyCategory::Database,
            "tool" => TechnologyCategory::Tool,
            "library" => TechnologyCategory::Library,
            "platform" => TechnologyCategory::Platform,
            _ => TechnologyCategory::Other,
        }
    }
}

/// A stored technology or tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxonomyEntity {
    pub id: i64,
    pub taxonomy: Taxonomy,
    pub name: String,
    pub slug: String,

    // Technologies only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<TechnologyCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docs_link: Option<String>,
}

/// Insert values for a find-or-create call. Only used when no entity
/// matches `slug` or `name` yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntity {
    pub name: String,
    pub slug: String,
    pub category: Option<TechnologyCategory>,
}

impl NewEntity {
    /// Defaults for an entity created from a free-text label.
    pub fn from_label(taxonomy: Taxonomy, label: &str, slug: String) -> Self {
        let category = match taxonomy {
            Taxonomy::Technology => Some(TechnologyCategory::Other),
            Taxonomy::Tag => None,
        };

        NewEntity {
            name: label.to_string(),
            slug,
            category,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_defaults_per_taxonomy() {
        let tech = NewEntity::from_label(Taxonomy::Technology, "Next.js", "next-js".to_string());
        assert_eq!(tech.category, Some(TechnologyCategory::Other));
        assert_eq!(tech.name, "Next.js");

        let tag = NewEntity::from_label(Taxonomy::Tag, "web", "web".to_string());
        assert_eq!(tag.category, None);
    }

    #[test]
    fn test_category_round_trips_through_display() {
        for category in [
            TechnologyCategory::Language,
            TechnologyCategory::Framework,
            TechnologyCategory::Database,
            TechnologyCategory::Tool,
            TechnologyCategory::Library,
            TechnologyCategory::Platform,
            TechnologyCategory::Other,
        ] {
            assert_eq!(TechnologyCategory::from(category.to_string().as_str()), category);
        }
        assert_eq!(TechnologyCategory::from("nonsense"), TechnologyCategory::Other);
    }
}
