use std::sync::Arc;

use taskboard_core::{gateway::InMemoryGateway, Board, BoardBuilder, Project};
use tempfile::TempDir;

/// Helper function to create a test board backed by an on-disk cache
pub async fn create_test_board(gateway: Arc<InMemoryGateway>) -> (TempDir, Board) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let cache_path = temp_dir.path().join("test_cache.db");
    let board = BoardBuilder::new()
        .with_cache_path(Some(&cache_path))
        .with_gateway(gateway)
        .with_owner("alice")
        .build()
        .await
        .expect("Failed to create board");
    (temp_dir, board)
}

/// A completed project as the remote API serves it, with the usual
/// inconsistencies: numeric and string ids, status spellings, blank
/// assignees.
pub fn remote_project() -> Project {
    serde_json::from_str(
        r#"{
            "id": "site",
            "title": "Company website",
            "description": "Marketing site relaunch",
            "userId": "alice",
            "status": "completed",
            "tasks": [
                {"id": 1, "sequence": 1, "title": "Design", "status": "in-progress", "assignedTo": "alice", "priority": "High"},
                {"id": "2", "sequence": 2, "title": "Login page", "status": "To Do", "assignedTo": "bob"},
                {"id": 7, "sequence": 3, "title": "Write copy", "status": "todo", "assignedTo": null},
                {"id": 4, "sequence": 4, "title": "Build pages", "status": "progress", "assignedTo": "alice"},
                {"id": 5, "sequence": 5, "title": "Launch", "status": "done", "assignedTo": "alice"}
            ]
        }"#,
    )
    .expect("Failed to parse remote project")
}
