#[cfg(test)]
mod model_tests {
    use crate::models::{
        BoardFilter, BoardStats, ColumnKey, LifecycleStatus, NewTask, Priority, Project,
        ProjectGroups, Task, TaskId, TaskPatch, TaskStatus, ViewMode, UNASSIGNED,
    };

    fn create_test_task(id: u64, status: TaskStatus, assignee: &str) -> Task {
        let mut task = Task::new(id, format!("Task {id}"));
        task.status = status;
        task.assigned_to = assignee.to_string();
        task.sequence = Some(id as i64);
        task
    }

    #[test]
    fn test_status_normalization_table() {
        assert_eq!(TaskStatus::normalize("todo"), TaskStatus::Todo);
        assert_eq!(TaskStatus::normalize("to-do"), TaskStatus::Todo);
        assert_eq!(TaskStatus::normalize("To Do"), TaskStatus::Todo);
        assert_eq!(TaskStatus::normalize("progress"), TaskStatus::InProgress);
        assert_eq!(TaskStatus::normalize("In Progress"), TaskStatus::InProgress);
        assert_eq!(TaskStatus::normalize("in_progress"), TaskStatus::InProgress);
        assert_eq!(TaskStatus::normalize("completed"), TaskStatus::Done);
        assert_eq!(TaskStatus::normalize("blocked"), TaskStatus::Todo);
        assert_eq!(TaskStatus::normalize(""), TaskStatus::Todo);
    }

    #[test]
    fn test_status_strict_parse() {
        assert_eq!("in-progress".parse::<TaskStatus>(), Ok(TaskStatus::InProgress));
        assert!("progress".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn test_malformed_remote_task_is_normalized() {
        let mut task: Task = serde_json::from_str(
            r#"{"id": 7, "title": "Wire up login", "status": "progress", "assignedTo": null,
                "priority": "high", "task_type": "Backend", "due": ""}"#,
        )
        .expect("task should deserialize");
        task.normalize();

        assert_eq!(task.id, TaskId::from(7));
        assert_eq!(task.status, TaskStatus::InProgress);
        assert_eq!(task.assigned_to, UNASSIGNED);
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.task_type.as_deref(), Some("Backend"));
    }

    #[test]
    fn test_unknown_status_becomes_todo() {
        let task: Task =
            serde_json::from_str(r#"{"id": "abc", "title": "x", "status": "archived"}"#)
                .expect("task should deserialize");
        assert_eq!(task.status, TaskStatus::Todo);
    }

    #[test]
    fn test_null_fields_are_normalized() {
        let mut task: Task = serde_json::from_str(
            r#"{"id": 1, "title": null, "status": null, "priority": null, "assignedTo": null}"#,
        )
        .expect("task with null fields should deserialize");
        task.normalize();

        assert_eq!(task.status, TaskStatus::Todo);
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.assigned_to, UNASSIGNED);
        assert_eq!(task.title, "Untitled Task");

        let project: Project = serde_json::from_str(
            r#"{"id": "p1", "title": "Site", "status": null,
                "tasks": [{"id": 1, "title": "A", "status": null}]}"#,
        )
        .expect("project with null statuses should deserialize");
        assert_eq!(project.lifecycle_status, LifecycleStatus::Completed);
        assert_eq!(project.tasks[0].status, TaskStatus::Todo);
    }

    #[test]
    fn test_status_serializes_kebab_case() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"in-progress\"");
    }

    #[test]
    fn test_unparseable_updated_at_is_dropped() {
        let task: Task = serde_json::from_str(
            r#"{"id": 1, "title": "x", "updatedAt": "Tue, 01 Oct 2024 10:00:00 GMT"}"#,
        )
        .expect("task should deserialize");
        assert!(task.updated_at.is_none());

        let task: Task = serde_json::from_str(
            r#"{"id": 1, "title": "x", "updatedAt": "2024-10-01T10:00:00Z"}"#,
        )
        .expect("task should deserialize");
        assert!(task.updated_at.is_some());
    }

    #[test]
    fn test_task_id_numeric_ordering() {
        assert!(TaskId::from(7) < TaskId::from(10));
        assert!(TaskId::from("abc") < TaskId::from("abd"));
        assert!(TaskId::from(99) < TaskId::from("abc"));
        assert!(TaskId::temporary().is_temporary());
        assert!(!TaskId::from(3).is_temporary());
    }

    #[test]
    fn test_board_order_puts_unsequenced_last() {
        let mut a = create_test_task(5, TaskStatus::Todo, "alice");
        let mut b = create_test_task(2, TaskStatus::Todo, "alice");
        b.sequence = None;
        a.sequence = Some(100);
        assert!(a.board_order(&b).is_lt());

        let mut c = create_test_task(1, TaskStatus::Todo, "bob");
        c.sequence = None;
        // Both unsequenced: ascending id
        assert!(c.board_order(&b).is_lt());
    }

    #[test]
    fn test_column_key_round_trip_with_hyphenated_assignee() {
        let key = ColumnKey::assignee_status("mary-jane", TaskStatus::InProgress);
        let encoded = key.encode();
        assert_eq!(encoded, "mary-jane-in-progress");
        assert_eq!(
            ColumnKey::decode(ViewMode::UserStatus, &encoded).unwrap(),
            key
        );
    }

    #[test]
    fn test_column_key_decode_per_mode() {
        assert_eq!(
            ColumnKey::decode(ViewMode::UserStatus, "alice-in-progress").unwrap(),
            ColumnKey::assignee_status("alice", TaskStatus::InProgress)
        );
        assert_eq!(
            ColumnKey::decode(ViewMode::Status, "done").unwrap(),
            ColumnKey::status(TaskStatus::Done)
        );
        assert_eq!(
            ColumnKey::decode(ViewMode::User, "bob").unwrap(),
            ColumnKey::assignee("bob")
        );
        assert!(ColumnKey::decode(ViewMode::User, "todo").is_err());
        assert!(ColumnKey::decode(ViewMode::UserStatus, "-todo").is_err());
        assert!(ColumnKey::decode(ViewMode::UserStatus, "alice").is_err());
        assert!(ColumnKey::decode(ViewMode::Status, "progress").is_err());
    }

    #[test]
    fn test_column_key_excludes_status_sentinel_assignees() {
        let task = create_test_task(1, TaskStatus::Todo, "done");
        assert_eq!(ColumnKey::for_task(&task, ViewMode::User), None);
        assert_eq!(ColumnKey::for_task(&task, ViewMode::UserStatus), None);
        assert_eq!(
            ColumnKey::for_task(&task, ViewMode::Status),
            Some(ColumnKey::status(TaskStatus::Todo))
        );
    }

    #[test]
    fn test_filter_search_is_case_insensitive() {
        let mut task = create_test_task(1, TaskStatus::Todo, "alice");
        task.description = Some("Implement the LOGIN flow".to_string());
        assert!(BoardFilter::search("login").matches(&task));
        assert!(BoardFilter::search("ALICE").matches(&task));
        assert!(!BoardFilter::search("billing").matches(&task));
        assert!(BoardFilter::search("   ").matches(&task));
    }

    #[test]
    fn test_filter_is_conjunctive() {
        let task = create_test_task(1, TaskStatus::Done, "alice");
        let filter = BoardFilter {
            search: Some("task".to_string()),
            status: Some(TaskStatus::Done),
            assignee: Some("bob".to_string()),
        };
        assert!(!filter.matches(&task));

        let filter = BoardFilter {
            assignee: Some("alice".to_string()),
            ..filter
        };
        assert!(filter.matches(&task));
    }

    #[test]
    fn test_patch_validation_rejects_blank_title() {
        let patch = TaskPatch {
            title: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(patch.validate().unwrap_err().is_validation());
    }

    #[test]
    fn test_patch_apply_and_diff() {
        let before = create_test_task(3, TaskStatus::Todo, UNASSIGNED);
        let patch = TaskPatch {
            status: Some(TaskStatus::Done),
            assigned_to: Some("  ".to_string()),
            title: Some(" Renamed ".to_string()),
            ..Default::default()
        };
        let mut after = before.clone();
        patch.apply_to(&mut after);

        assert_eq!(after.title, "Renamed");
        assert_eq!(after.status, TaskStatus::Done);
        assert_eq!(after.assigned_to, UNASSIGNED);

        let diff = TaskPatch::diff(&before, &after);
        assert_eq!(diff.status, Some(TaskStatus::Done));
        assert_eq!(diff.title.as_deref(), Some("Renamed"));
        assert_eq!(diff.assigned_to, None);
        assert!(TaskPatch::diff(&after, &after).is_empty());
    }

    #[test]
    fn test_new_task_defaults() {
        let new_task = NewTask::new("Write docs");
        new_task.validate().unwrap();
        let task = new_task.into_task(TaskId::from("t1"), Some(4));
        assert_eq!(task.assigned_to, UNASSIGNED);
        assert_eq!(task.task_type.as_deref(), Some("Feature"));
        assert_eq!(task.sequence, Some(4));

        assert!(NewTask::new("").validate().is_err());
    }

    #[test]
    fn test_project_defaults_to_completed() {
        let project: Project =
            serde_json::from_str(r#"{"id": "p1", "title": "Site", "userId": "u1"}"#).unwrap();
        assert_eq!(project.lifecycle_status, LifecycleStatus::Completed);
        assert_eq!(project.owner_id.as_deref(), Some("u1"));
        assert!(!project.is_group());
    }

    #[test]
    fn test_project_groups_split() {
        let individual: Project = serde_json::from_str(r#"{"id": "p1"}"#).unwrap();
        let group: Project = serde_json::from_str(r#"{"id": "p2", "groupId": "g1"}"#).unwrap();
        let groups = ProjectGroups::split(vec![individual, group]);
        assert_eq!(groups.individual.len(), 1);
        assert_eq!(groups.group.len(), 1);
        assert_eq!(groups.group[0].id.as_str(), "p2");
    }

    #[test]
    fn test_board_stats() {
        let tasks = vec![
            create_test_task(1, TaskStatus::Todo, "a"),
            create_test_task(2, TaskStatus::Done, "a"),
            create_test_task(3, TaskStatus::Done, "b"),
        ];
        let stats = BoardStats::from_tasks(&tasks);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.done, 2);
        assert_eq!(stats.done_percent(), 67);
        assert_eq!(BoardStats::default().done_percent(), 0);
    }
}
