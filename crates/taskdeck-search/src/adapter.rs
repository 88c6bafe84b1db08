//! Adapters from upstream entities to indexable records
//!
//! Adapters never fail a batch: an entity that cannot be mapped is logged and
//! skipped, and the remaining entities are still indexed.

use taskdeck_core::{EntityKind, Member, Page, Task, Workspace, WorkspaceSnapshot};
use tracing::warn;

use crate::error::AdapterError;
use crate::record::{IndexableRecord, RecordMetadata};

/// Map a batch of tasks to records
pub fn task_records(tasks: &[Task], workspace: &Workspace) -> Vec<IndexableRecord> {
    adapt_all(tasks, workspace, task_record)
}

/// Map a batch of pages to records
pub fn page_records(pages: &[Page], workspace: &Workspace) -> Vec<IndexableRecord> {
    adapt_all(pages, workspace, page_record)
}

/// Map a batch of members to records
pub fn member_records(members: &[Member], workspace: &Workspace) -> Vec<IndexableRecord> {
    adapt_all(members, workspace, member_record)
}

/// Map every entity of a workspace snapshot to records
pub fn snapshot_records(snapshot: &WorkspaceSnapshot) -> Vec<IndexableRecord> {
    let workspace = &snapshot.workspace;
    let mut records = Vec::with_capacity(snapshot.entity_count());
    records.extend(task_records(&snapshot.tasks, workspace));
    records.extend(page_records(&snapshot.pages, workspace));
    records.extend(member_records(&snapshot.members, workspace));
    records
}

pub fn task_record(task: &Task, workspace: &Workspace) -> Result<IndexableRecord, AdapterError> {
    let id = required_id(task.id.as_deref(), EntityKind::Task, &task.title)?;
    Ok(IndexableRecord {
        id,
        kind: EntityKind::Task,
        workspace_id: workspace.id.clone(),
        workspace_name: workspace.name.clone(),
        title: task.title.clone(),
        content: task.description.clone().unwrap_or_default(),
        metadata: RecordMetadata::Task {
            status: task.status,
            priority: task.priority,
            assignee: task.assignee.clone(),
            page_id: task.page_id.clone(),
        },
        updated_at: task.updated_at,
    })
}

pub fn page_record(page: &Page, workspace: &Workspace) -> Result<IndexableRecord, AdapterError> {
    let id = required_id(page.id.as_deref(), EntityKind::Page, &page.title)?;
    Ok(IndexableRecord {
        id,
        kind: EntityKind::Page,
        workspace_id: workspace.id.clone(),
        workspace_name: workspace.name.clone(),
        title: page.title.clone(),
        content: page.description.clone().unwrap_or_default(),
        metadata: RecordMetadata::Page {
            category: page.category.clone(),
            color: page.color.clone(),
            url: page.url.clone(),
        },
        updated_at: page.updated_at,
    })
}

pub fn member_record(member: &Member, workspace: &Workspace) -> Result<IndexableRecord, AdapterError> {
    // Members without a display name are shown (and found) by email
    let title = member
        .display_name
        .as_deref()
        .filter(|name| !name.trim().is_empty())
        .or(member.email.as_deref())
        .unwrap_or_default()
        .to_string();

    let id = required_id(member.id.as_deref(), EntityKind::Member, &title)?;
    Ok(IndexableRecord {
        id,
        kind: EntityKind::Member,
        workspace_id: workspace.id.clone(),
        workspace_name: workspace.name.clone(),
        title,
        content: String::new(),
        metadata: RecordMetadata::Member {
            role: member.role,
            email: member.email.clone(),
            avatar_url: member.avatar_url.clone(),
        },
        updated_at: member.updated_at,
    })
}

fn required_id(id: Option<&str>, kind: EntityKind, label: &str) -> Result<String, AdapterError> {
    match id.map(str::trim) {
        Some(id) if !id.is_empty() => Ok(id.to_string()),
        _ => Err(AdapterError::MissingId {
            kind,
            label: label.to_string(),
        }),
    }
}

fn adapt_all<T>(
    entities: &[T],
    workspace: &Workspace,
    adapt: impl Fn(&T, &Workspace) -> Result<IndexableRecord, AdapterError>,
) -> Vec<IndexableRecord> {
    entities
        .iter()
        .enumerate()
        .filter_map(|(position, entity)| match adapt(entity, workspace) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(
                    "Skipping entity #{} in workspace {}: {}",
                    position, workspace.id, e
                );
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskdeck_core::{MemberRole, TaskPriority, TaskStatus};

    fn workspace() -> Workspace {
        Workspace::with_id("ws-1", "Acme")
    }

    #[test]
    fn test_task_record_fields() {
        let task = Task::new("t1", "Deploy pipeline")
            .with_description("Roll out the new CI")
            .with_status(TaskStatus::InProgress)
            .with_priority(TaskPriority::High)
            .with_assignee("u1")
            .with_page("p1");

        let record = task_record(&task, &workspace()).unwrap();
        assert_eq!(record.id, "t1");
        assert_eq!(record.kind, EntityKind::Task);
        assert_eq!(record.workspace_name, "Acme");
        assert_eq!(record.content, "Roll out the new CI");
        assert_eq!(
            record.metadata,
            RecordMetadata::Task {
                status: TaskStatus::InProgress,
                priority: TaskPriority::High,
                assignee: Some("u1".to_string()),
                page_id: Some("p1".to_string()),
            }
        );
    }

    #[test]
    fn test_task_without_description_has_empty_content() {
        let record = task_record(&Task::new("t1", "Plain"), &workspace()).unwrap();
        assert_eq!(record.content, "");
    }

    #[test]
    fn test_member_falls_back_to_email() {
        let member = Member::new("u1")
            .with_email("ana@acme.test")
            .with_role(MemberRole::Admin);
        let record = member_record(&member, &workspace()).unwrap();
        assert_eq!(record.title, "ana@acme.test");
        assert_eq!(record.content, "");

        let blank_name = Member::new("u2")
            .with_display_name("   ")
            .with_email("bo@acme.test");
        assert_eq!(member_record(&blank_name, &workspace()).unwrap().title, "bo@acme.test");

        let named = Member::new("u3")
            .with_display_name("Cleo")
            .with_email("cleo@acme.test");
        assert_eq!(member_record(&named, &workspace()).unwrap().title, "Cleo");
    }

    #[test]
    fn test_malformed_entities_are_skipped() {
        let mut missing = Task::new("x", "Lost task");
        missing.id = None;
        let mut blank = Task::new("  ", "Blank id");
        blank.description = Some("ignored".into());

        let tasks = vec![Task::new("t1", "First"), missing, blank, Task::new("t2", "Second")];
        let records = task_records(&tasks, &workspace());

        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "t2"]);
    }

    #[test]
    fn test_missing_id_error() {
        let mut page = Page::new("p", "Roadmap");
        page.id = None;
        let err = page_record(&page, &workspace()).unwrap_err();
        assert_eq!(
            err,
            AdapterError::MissingId {
                kind: EntityKind::Page,
                label: "Roadmap".to_string()
            }
        );
    }

    #[test]
    fn test_snapshot_records_covers_all_kinds() {
        let snapshot = WorkspaceSnapshot::new(workspace())
            .with_tasks(vec![Task::new("t1", "Task")])
            .with_pages(vec![Page::new("p1", "Page").with_category("eng")])
            .with_members(vec![Member::new("u1").with_display_name("Ana")]);

        let records = snapshot_records(&snapshot);
        let kinds: Vec<_> = records.iter().map(|r| r.kind).collect();
        assert_eq!(kinds, vec![EntityKind::Task, EntityKind::Page, EntityKind::Member]);
        assert!(records.iter().all(|r| r.workspace_id.as_str() == "ws-1"));
    }
}
