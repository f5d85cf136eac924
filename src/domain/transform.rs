//! Raw record → domain entity mapping.

use crate::domain::{
    entities::{FaqItem, Post, Project, RawRecord, Update},
    error::DomainError,
    schema::EnumLabelMap,
    types::Related,
};

/// Reference fields for bitcoin contributors, newest slug first.
pub const BITCOIN_CONTRIBUTOR_FIELDS: &[&str] = &["bitcoin-contributors-2", "bitcoin-contributors"];
pub const LITECOIN_CONTRIBUTOR_FIELDS: &[&str] =
    &["litecoin-contributors-2", "litecoin-contributors"];
pub const ADVOCATE_FIELDS: &[&str] = &["advocates-2", "advocates"];

pub const STATUS_FIELD: &str = "status";

/// Ids from the first candidate field that holds a non-empty list.
pub fn first_non_empty_ids(record: &RawRecord, candidates: &[&str]) -> Vec<String> {
    candidates
        .iter()
        .map(|slug| record.field_ids(slug))
        .find(|ids| !ids.is_empty())
        .unwrap_or_default()
}

/// Contributor ids a project references, per relation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationIds {
    pub bitcoin_contributors: Vec<String>,
    pub litecoin_contributors: Vec<String>,
    pub advocates: Vec<String>,
}

impl RelationIds {
    pub fn of(record: &RawRecord) -> Self {
        Self {
            bitcoin_contributors: first_non_empty_ids(record, BITCOIN_CONTRIBUTOR_FIELDS),
            litecoin_contributors: first_non_empty_ids(record, LITECOIN_CONTRIBUTOR_FIELDS),
            advocates: first_non_empty_ids(record, ADVOCATE_FIELDS),
        }
    }
}

/// Map a project record, resolving its status through `labels`.
///
/// Relations are left `NotFetched`; the caller folds contributors in.
pub fn to_project(record: &RawRecord, labels: &EnumLabelMap) -> Result<Project, DomainError> {
    let name = record
        .field_string("name")
        .ok_or_else(|| DomainError::missing_field(&record.id, "name"))?;
    let slug = record
        .field_string("slug")
        .ok_or_else(|| DomainError::missing_field(&record.id, "slug"))?;
    let status = record
        .field_str(STATUS_FIELD)
        .map(|id| labels.label(id).to_string())
        .unwrap_or_default();

    Ok(Project {
        id: record.id.clone(),
        name,
        slug,
        summary: record.field_string("summary"),
        content: record.field_string("content"),
        cover_image: record.field_image_url("cover-image"),
        status,
        project_type: record.field_string("project-type"),
        hidden: record.is_hidden(),
        recurring: record.field_bool("recurring"),
        total_paid: record.field_f64("total-paid").unwrap_or(0.0),
        service_fees_collected: record.field_f64("service-fees-collected").unwrap_or(0.0),
        website: record.field_string("website-link"),
        github: record.field_string("github-link"),
        twitter: record.field_string("twitter-link"),
        discord: record.field_string("discord-link"),
        telegram: record.field_string("telegram-link"),
        reddit: record.field_string("reddit-link"),
        facebook: record.field_string("facebook-link"),
        last_published: record.last_published.clone(),
        last_updated: record.last_updated.clone(),
        created_on: record.created_on.clone(),
        bitcoin_contributors: Related::NotFetched,
        litecoin_contributors: Related::NotFetched,
        advocates: Related::NotFetched,
    })
}

/// Replace statuses that are still raw option ids with their labels.
///
/// Returns the input untouched when nothing needs remapping.
pub fn remap_stale_statuses(projects: Vec<Project>, labels: &EnumLabelMap) -> Vec<Project> {
    if !projects
        .iter()
        .any(|project| labels.contains_id(&project.status))
    {
        return projects;
    }

    projects
        .into_iter()
        .map(|project| match labels.get(&project.status) {
            Some(label) => Project {
                status: label.to_string(),
                ..project
            },
            None => project,
        })
        .collect()
}

pub fn to_faq(record: &RawRecord) -> FaqItem {
    FaqItem {
        id: record.id.clone(),
        question: record
            .field_string("question")
            .or_else(|| record.field_string("name")),
        answer: record.field_string("answer"),
        category: record.field_string("category"),
        project: record.field_string("project"),
        order: record.field_i64("order").unwrap_or(0),
    }
}

pub fn to_update(record: &RawRecord) -> Update {
    Update {
        id: record.id.clone(),
        title: record
            .field_string("title")
            .or_else(|| record.field_string("name")),
        summary: record.field_string("summary"),
        content: record.field_string("content"),
        project: record.field_string("project"),
        date: record
            .field_string("date")
            .or_else(|| record.field_string("createdOn"))
            .or_else(|| record.created_on.clone()),
        author_twitter_handle: record.field_string("authorTwitterHandle"),
        tags: record.field_ids("tags"),
    }
}

pub fn to_post(record: &RawRecord) -> Post {
    Post {
        id: record.id.clone(),
        name: record.field_string("name"),
        x_post_link: record.field_string("x-post-link"),
        youtube_link: record.field_string("youtube-link"),
        reddit_link: record.field_string("reddit-link"),
        projects: record.field_ids("projects"),
    }
}

/// Live FAQs for `project_id`, ordered by their `order` field.
pub fn project_faqs(records: &[RawRecord], project_id: &str) -> Vec<FaqItem> {
    let mut faqs: Vec<FaqItem> = records
        .iter()
        .filter(|record| record.is_live() && record.field_str("project") == Some(project_id))
        .map(to_faq)
        .collect();
    faqs.sort_by_key(|faq| faq.order);
    faqs
}

pub fn project_updates(records: &[RawRecord], project_id: &str) -> Vec<Update> {
    records
        .iter()
        .filter(|record| record.is_live() && record.field_str("project") == Some(project_id))
        .map(to_update)
        .collect()
}

pub fn project_posts(records: &[RawRecord], project_id: &str) -> Vec<Post> {
    records
        .iter()
        .filter(|record| {
            record.is_live()
                && record
                    .field_ids("projects")
                    .iter()
                    .any(|id| id == project_id)
        })
        .map(to_post)
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;

    fn record(id: &str, fields: Value) -> RawRecord {
        let Value::Object(fields) = fields else {
            panic!("fields must be an object");
        };
        RawRecord {
            id: id.into(),
            is_draft: false,
            is_archived: false,
            last_published: Some("2024-01-02T00:00:00Z".into()),
            last_updated: None,
            created_on: Some("2023-05-01T00:00:00Z".into()),
            fields,
        }
    }

    fn labels() -> EnumLabelMap {
        [
            ("a1".to_string(), " Open ".to_string()),
            ("b2".to_string(), "Closed".to_string()),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn newer_relation_slug_wins_when_populated() {
        let raw = record(
            "p1",
            json!({
                "bitcoin-contributors-2": ["new"],
                "bitcoin-contributors": ["old"],
                "litecoin-contributors-2": [],
                "litecoin-contributors": ["ltc"],
                "advocates": ["adv"]
            }),
        );
        let ids = RelationIds::of(&raw);
        assert_eq!(ids.bitcoin_contributors, vec!["new"]);
        assert_eq!(ids.litecoin_contributors, vec!["ltc"]);
        assert_eq!(ids.advocates, vec!["adv"]);
        assert!(first_non_empty_ids(&raw, &["nope"]).is_empty());
    }

    #[test]
    fn project_status_resolves_or_echoes() {
        let labels = labels();
        let open = record("p1", json!({ "name": "Core", "slug": "core", "status": "a1" }));
        let unknown = record("p2", json!({ "name": "X", "slug": "x", "status": "zz" }));

        assert_eq!(to_project(&open, &labels).expect("project").status, "Open");
        assert_eq!(to_project(&unknown, &labels).expect("project").status, "zz");
    }

    #[test]
    fn project_copies_scalars() {
        let raw = record(
            "p1",
            json!({
                "name": "Core",
                "slug": "core",
                "summary": "node",
                "cover-image": { "url": "https://cdn/c.png" },
                "project-type": "open-source",
                "recurring": true,
                "total-paid": 1250.5,
                "github-link": "https://github.com/x"
            }),
        );
        let project = to_project(&raw, &labels()).expect("project");
        assert_eq!(project.summary.as_deref(), Some("node"));
        assert_eq!(project.cover_image.as_deref(), Some("https://cdn/c.png"));
        assert_eq!(project.project_type.as_deref(), Some("open-source"));
        assert!(project.recurring);
        assert!(!project.hidden);
        assert_eq!(project.total_paid, 1250.5);
        assert_eq!(project.service_fees_collected, 0.0);
        assert_eq!(project.github.as_deref(), Some("https://github.com/x"));
        assert_eq!(project.created_on.as_deref(), Some("2023-05-01T00:00:00Z"));
        assert_eq!(project.advocates, Related::NotFetched);
    }

    #[test]
    fn project_without_slug_is_rejected() {
        let raw = record("p1", json!({ "name": "Core" }));
        let err = to_project(&raw, &labels()).expect_err("slug required");
        assert_eq!(err, DomainError::missing_field("p1", "slug"));
    }

    #[test]
    fn transform_is_idempotent() {
        let raw = record("p1", json!({ "name": "Core", "slug": "core", "status": "b2" }));
        let labels = labels();
        assert_eq!(
            to_project(&raw, &labels).expect("first"),
            to_project(&raw, &labels).expect("second")
        );
    }

    #[test]
    fn stale_statuses_are_remapped_by_copy() {
        let labels = labels();
        let mut stale = to_project(
            &record("p1", json!({ "name": "A", "slug": "a" })),
            &labels,
        )
        .expect("project");
        stale.status = "b2".into();
        let mut fresh = stale.clone();
        fresh.id = "p2".into();
        fresh.status = "Open".into();

        let remapped = remap_stale_statuses(vec![stale, fresh], &labels);
        assert_eq!(remapped[0].status, "Closed");
        assert_eq!(remapped[1].status, "Open");
    }

    #[test]
    fn faqs_are_filtered_and_ordered() {
        let mut draft = record("f0", json!({ "project": "p1", "order": 0 }));
        draft.is_draft = true;
        let records = vec![
            record("f3", json!({ "project": "p1", "order": 3, "question": "Q3" })),
            record("f1", json!({ "project": "p1", "name": "Q1" })),
            record("fx", json!({ "project": "p2", "order": 1 })),
            record("f2", json!({ "project": "p1", "order": 2 })),
            draft,
        ];

        let faqs = project_faqs(&records, "p1");
        let ids: Vec<_> = faqs.iter().map(|faq| faq.id.as_str()).collect();
        assert_eq!(ids, vec!["f1", "f2", "f3"]);
        assert_eq!(faqs[0].question.as_deref(), Some("Q1"));
    }

    #[test]
    fn updates_fall_back_to_record_creation_date() {
        let records = vec![
            record("u1", json!({ "project": "p1", "name": "Launch" })),
            record("u2", json!({ "project": "p2" })),
        ];
        let updates = project_updates(&records, "p1");
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].title.as_deref(), Some("Launch"));
        assert_eq!(updates[0].date.as_deref(), Some("2023-05-01T00:00:00Z"));
    }

    #[test]
    fn posts_match_on_project_membership() {
        let mut archived = record("x3", json!({ "projects": ["p1"] }));
        archived.is_archived = true;
        let records = vec![
            record("x1", json!({ "projects": ["p0", "p1"], "x-post-link": "https://x.com/1" })),
            record("x2", json!({ "projects": ["p2"] })),
            record("x4", json!({ "projects": "p1" })),
            archived,
        ];
        let posts = project_posts(&records, "p1");
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].x_post_link.as_deref(), Some("https://x.com/1"));
    }
}
