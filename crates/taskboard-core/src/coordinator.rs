//! Background polling of a [`Board`].
//!
//! Two timers drive the loop: the refresh interval re-lists projects and
//! reconciles the active project, and the generation interval polls the
//! active project while it is `generating`. Each tick looks at the project
//! that is active at that moment, so switching projects stops polling of the
//! previous one.

use std::time::Duration;

use log::{debug, info, warn};
use tokio::{
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::{
    board::{Board, ReconcileOutcome},
    error::BoardError,
    models::LifecycleStatus,
};

/// Cancellable background poller for one board.
pub struct Coordinator {
    board: Board,
    running: Option<(CancellationToken, JoinHandle<()>)>,
}

impl Coordinator {
    pub fn new(board: Board) -> Self {
        Self {
            board,
            running: None,
        }
    }

    /// Spawns the polling loop. Calling it while running does nothing.
    pub fn start(&mut self) {
        if self.is_running() {
            return;
        }
        let cancel = CancellationToken::new();
        let config = self.board.config().clone();
        let handle = tokio::spawn(run(
            self.board.clone(),
            config.refresh_interval,
            config.generation_poll_interval,
            cancel.clone(),
        ));
        info!("Coordinator started");
        self.running = Some((cancel, handle));
    }

    /// Cancels the loop and waits for it to finish.
    pub async fn stop(&mut self) {
        if let Some((cancel, handle)) = self.running.take() {
            cancel.cancel();
            if let Err(e) = handle.await {
                warn!("Coordinator task ended abnormally: {e}");
            }
            info!("Coordinator stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|(_, handle)| !handle.is_finished())
    }
}

impl Drop for Coordinator {
    fn drop(&mut self) {
        if let Some((cancel, _)) = self.running.take() {
            cancel.cancel();
        }
    }
}

async fn run(
    board: Board,
    refresh_every: Duration,
    poll_every: Duration,
    cancel: CancellationToken,
) {
    let mut refresh = time::interval(refresh_every);
    let mut poll = time::interval(poll_every);
    refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);
    poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            _ = refresh.tick() => refresh_cycle(&board).await,
            _ = poll.tick() => generation_cycle(&board).await,
        }
    }
}

fn active_lifecycle(board: &Board) -> Option<LifecycleStatus> {
    board.active_project().map(|p| p.lifecycle_status)
}

async fn refresh_cycle(board: &Board) {
    if let Err(e) = board.refresh_projects(true).await {
        warn!("Project refresh failed: {e}");
    }
    if active_lifecycle(board) != Some(LifecycleStatus::Completed) {
        return;
    }
    match board.reconcile().await {
        Ok(ReconcileOutcome::Deferred) => debug!("Reconcile deferred to next cycle"),
        Ok(_) => {}
        Err(e) => warn!("Reconcile failed: {e}"),
    }
}

async fn generation_cycle(board: &Board) {
    if active_lifecycle(board) != Some(LifecycleStatus::Generating) {
        return;
    }
    match board.poll_generation().await {
        Ok(status) => debug!("Generation status: {}", status.as_str()),
        Err(BoardError::GenerationFailed { project_id, reason }) => {
            warn!("Generation of {project_id} failed: {reason}");
        }
        Err(e) => warn!("Generation poll failed: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        board::{BoardBuilder, BoardConfig, BoardEvent},
        gateway::InMemoryGateway,
        models::{Project, ProjectId, ProjectStatus, Task},
    };

    fn fast_config() -> BoardConfig {
        BoardConfig {
            refresh_interval: Duration::from_millis(20),
            generation_poll_interval: Duration::from_millis(5),
            ..Default::default()
        }
    }

    fn generating_project() -> Project {
        let mut project: Project = serde_json::from_str(
            r#"{"id": "p1", "title": "Site", "userId": "alice", "status": "generating"}"#,
        )
        .unwrap();
        project.tasks = vec![Task::new(1, "Design"), Task::new(2, "Build")];
        project
    }

    async fn board(gateway: Arc<InMemoryGateway>) -> Board {
        BoardBuilder::new()
            .with_in_memory_cache()
            .with_gateway(gateway)
            .with_owner("alice")
            .with_config(fast_config())
            .build()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_polls_generating_project_to_completion() {
        let gateway = Arc::new(InMemoryGateway::new().with_project(generating_project()));
        let id = ProjectId::new("p1");
        gateway.script_statuses(
            &id,
            vec![
                ProjectStatus {
                    status: LifecycleStatus::Generating,
                    error: None,
                },
                ProjectStatus {
                    status: LifecycleStatus::Completed,
                    error: None,
                },
            ],
        );
        let board = board(gateway.clone()).await;
        board.select_project(&id).await.unwrap();
        assert!(board.tasks().is_empty());

        let mut events = board.subscribe();
        let mut coordinator = Coordinator::new(board.clone());
        coordinator.start();
        assert!(coordinator.is_running());

        let completed = time::timeout(Duration::from_secs(5), async {
            loop {
                if let Ok(BoardEvent::LifecycleChanged {
                    status: LifecycleStatus::Completed,
                    ..
                }) = events.recv().await
                {
                    break;
                }
            }
        })
        .await;
        coordinator.stop().await;

        assert!(completed.is_ok(), "generation never completed");
        assert!(!coordinator.is_running());
        assert_eq!(board.tasks().len(), 2);
    }

    #[tokio::test]
    async fn test_stop_ends_polling() {
        let gateway = Arc::new(InMemoryGateway::new().with_project(generating_project()));
        let board = board(gateway.clone()).await;
        board.select_project(&ProjectId::new("p1")).await.unwrap();

        let mut coordinator = Coordinator::new(board);
        coordinator.start();
        time::sleep(Duration::from_millis(30)).await;
        coordinator.stop().await;

        let calls = gateway.calls().len();
        time::sleep(Duration::from_millis(30)).await;
        assert_eq!(gateway.calls().len(), calls);
    }

    #[tokio::test]
    async fn test_failed_generation_stops_status_polls() {
        let gateway = Arc::new(InMemoryGateway::new().with_project(generating_project()));
        let id = ProjectId::new("p1");
        gateway.script_statuses(
            &id,
            vec![ProjectStatus {
                status: LifecycleStatus::Failed,
                error: Some("model timeout".to_string()),
            }],
        );
        let board = board(gateway.clone()).await;
        board.select_project(&id).await.unwrap();

        let mut coordinator = Coordinator::new(board.clone());
        coordinator.start();
        time::sleep(Duration::from_millis(60)).await;
        coordinator.stop().await;

        let project = board.active_project().unwrap();
        assert_eq!(project.lifecycle_status, LifecycleStatus::Failed);
        assert_eq!(project.error.as_deref(), Some("model timeout"));
        let status_polls = gateway
            .calls()
            .iter()
            .filter(|c| c.starts_with("get_project_status"))
            .count();
        assert_eq!(status_polls, 1);
    }
}
