use chrono::{DateTime, NaiveDate, NaiveDateTime};

use super::types::{
    DevelopmentPhase, GalleryInput, GalleryItem, ProjectPayload, ProjectSubmission,
};
use crate::error::{FieldErrors, PipelineError};
use crate::taxonomy::ResolvedLabels;

/// Turns the submitted gallery into items. Always a full replacement.
pub fn compose_gallery(input: Option<&GalleryInput>) -> Vec<GalleryItem> {
    match input {
        Some(GalleryInput::Text(text)) => text
            .split(',')
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(GalleryItem::new)
            .collect(),
        Some(GalleryInput::Items(items)) => items.clone(),
        None => Vec::new(),
    }
}

/// Parses an optional submitted date. Blank means unset.
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM[:SS]` and RFC 3339 timestamps; only
/// the calendar date is kept.
pub fn parse_date(value: Option<&str>) -> Result<Option<NaiveDate>, String> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(Some(date));
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(Some(timestamp.date_naive()));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(local) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(Some(local.date()));
        }
    }

    Err(format!("'{}' is not a valid date", value))
}

/// Collapses `devStatus`/`startDate`/`endDate` into the embedded phase.
pub fn compose_dev_phase(submission: &ProjectSubmission) -> Result<DevelopmentPhase, PipelineError> {
    let mut errors = FieldErrors::new();

    let start_date = parse_date(submission.start_date.as_deref()).unwrap_or_else(|e| {
        errors.entry("startDate".to_string()).or_default().push(e);
        None
    });
    let end_date = parse_date(submission.end_date.as_deref()).unwrap_or_else(|e| {
        errors.entry("endDate".to_string()).or_default().push(e);
        None
    });

    if !errors.is_empty() {
        return Err(PipelineError::validation(errors));
    }

    Ok(DevelopmentPhase {
        status: submission.dev_status,
        start_date,
        end_date,
    })
}

/// Assembles the persistable payload from a submission and its resolved ids.
///
/// Raw label strings, the flat dev-phase fields and the gallery text have no
/// place in the result; `siteUrl` is carried over as `demo_link`.
pub fn compose_payload(
    submission: &ProjectSubmission,
    slug: String,
    dev_phase: DevelopmentPhase,
    resolved: ResolvedLabels,
) -> ProjectPayload {
    ProjectPayload {
        name: submission.name.trim().to_string(),
        slug,
        description: submission.description.clone(),
        thumbnail: non_blank(submission.thumbnail.as_deref()),
        gallery: compose_gallery(submission.gallery.as_ref()),
        repo_link: non_blank(submission.repo_link.as_deref()),
        demo_link: non_blank(submission.site_url.as_deref()),
        technologies: resolved.technologies,
        tags: resolved.tags,
        details: non_blank(submission.details.as_deref()),
        problem_statement: non_blank(submission.problem_statement.as_deref()),
        dev_phase,
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::types::DevStatus;

    #[test]
    fn test_gallery_text_is_split_into_items() {
        let input = GalleryInput::Text("http://x/1.png, http://x/2.png".to_string());
        assert_eq!(
            compose_gallery(Some(&input)),
            vec![GalleryItem::new("http://x/1.png"), GalleryItem::new("http://x/2.png")]
        );
    }

    #[test]
    fn test_empty_gallery_inputs() {
        assert!(compose_gallery(None).is_empty());
        assert!(compose_gallery(Some(&GalleryInput::Text(String::new()))).is_empty());
        assert!(compose_gallery(Some(&GalleryInput::Text(" , ".to_string()))).is_empty());
        assert!(compose_gallery(Some(&GalleryInput::Items(Vec::new()))).is_empty());
    }

    #[test]
    fn test_structured_gallery_passes_through() {
        let items = vec![GalleryItem {
            url: "http://x/1.png".to_string(),
            caption: Some("Landing page".to_string()),
        }];
        assert_eq!(compose_gallery(Some(&GalleryInput::Items(items.clone()))), items);
    }

    #[test]
    fn test_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 9);
        assert_eq!(parse_date(Some("2024-03-09")).unwrap(), expected);
        assert_eq!(parse_date(Some("2024-03-09T10:30")).unwrap(), expected);
        assert_eq!(parse_date(Some("2024-03-09T10:30:00Z")).unwrap(), expected);
        assert_eq!(parse_date(Some("")).unwrap(), None);
        assert_eq!(parse_date(Some("   ")).unwrap(), None);
        assert_eq!(parse_date(None).unwrap(), None);
        assert!(parse_date(Some("next tuesday")).is_err());
        assert!(parse_date(Some("2024-02-30")).is_err());
    }

    #[test]
    fn test_dev_phase_collects_both_date_errors() {
        let submission = ProjectSubmission {
            start_date: Some("soon".to_string()),
            end_date: Some("later".to_string()),
            ..Default::default()
        };
        let err = compose_dev_phase(&submission).unwrap_err();
        let errors = err.field_errors().unwrap();
        assert!(errors.contains_key("startDate"));
        assert!(errors.contains_key("endDate"));
    }

    #[test]
    fn test_payload_drops_submission_shorthand() {
        let submission = ProjectSubmission {
            name: " Folio ".to_string(),
            description: "Portfolio backend".to_string(),
            site_url: Some("https://folio.example".to_string()),
            repo_link: Some(String::new()),
            technologies: Some("Rust".to_string()),
            dev_status: DevStatus::Completed,
            start_date: Some("2023-05-01".to_string()),
            end_date: Some(String::new()),
            ..Default::default()
        };
        let dev_phase = compose_dev_phase(&submission).unwrap();
        let payload = compose_payload(
            &submission,
            "folio".to_string(),
            dev_phase,
            ResolvedLabels {
                technologies: vec![7],
                tags: Vec::new(),
            },
        );

        assert_eq!(payload.name, "Folio");
        assert_eq!(payload.demo_link.as_deref(), Some("https://folio.example"));
        assert_eq!(payload.repo_link, None);
        assert_eq!(payload.technologies, vec![7]);
        assert_eq!(payload.dev_phase.status, DevStatus::Completed);
        assert_eq!(payload.dev_phase.start_date, NaiveDate::from_ymd_opt(2023, 5, 1));
        assert_eq!(payload.dev_phase.end_date, None);

        let json = serde_json::to_value(&payload).unwrap();
        for transient in ["devStatus", "startDate", "endDate", "siteUrl"] {
            assert!(json.get(transient).is_none(), "{transient} leaked into payload");
        }
        assert_eq!(json["devPhase"]["startDate"], "2023-05-01");
    }
}
