// src/core/tasks.rs
use actix_web::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::utils::error::{AggregatorError, Result};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TaskState {
    Running,
    Completed,
    Failed,
}

/// Asynchronous unit of work handed back to the caller. Created before the
/// handshake begins, mutated exactly once on terminal success or failure.
/// Garbage collection is an external task-service policy, not ours.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub task_id: Uuid,
    pub owner: String,
    pub state: TaskState,
    pub percent_complete: u8,
    /// HTTP-style status of the terminal outcome; 202 while running.
    pub status_code: u16,
    pub messages: Vec<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
}

/// Records task creation, progress and completion for callers polling the
/// task endpoint while onboarding runs in the background.
pub struct TaskService {
    tasks: RwLock<HashMap<Uuid, Task>>,
}

impl TaskService {
    pub fn new() -> Self {
        Self {
            tasks: RwLock::new(HashMap::new()),
        }
    }

    pub async fn create_task(&self, owner: &str) -> Uuid {
        let task_id = Uuid::new_v4();
        let task = Task {
            task_id,
            owner: owner.to_string(),
            state: TaskState::Running,
            percent_complete: 0,
            status_code: StatusCode::ACCEPTED.as_u16(),
            messages: Vec::new(),
            start_time: Utc::now(),
            end_time: None,
        };

        self.tasks.write().await.insert(task_id, task);
        info!("Created task {} for {}", task_id, owner);
        task_id
    }

    pub async fn update_task(&self, task_id: Uuid, percent: u8, message: &str) -> Result<()> {
        let mut tasks = self.tasks.write().await;
        let task = tasks
            .get_mut(&task_id)
            .ok_or_else(|| AggregatorError::Task(format!("unknown task {}", task_id)))?;

        task.percent_complete = percent;
        task.messages.push(message.to_string());
        Ok(())
    }

    pub async fn complete_task(&self, task_id: Uuid, message: &str) {
        self.finish(task_id, TaskState::Completed, StatusCode::OK, message)
            .await;
    }

    pub async fn fail_task(&self, task_id: Uuid, status: StatusCode, cause: &str) {
        self.finish(task_id, TaskState::Failed, status, cause).await;
    }

    async fn finish(&self, task_id: Uuid, state: TaskState, status: StatusCode, message: &str) {
        let mut tasks = self.tasks.write().await;
        if let Some(task) = tasks.get_mut(&task_id) {
            task.state = state;
            task.status_code = status.as_u16();
            task.percent_complete = 100;
            task.messages.push(message.to_string());
            task.end_time = Some(Utc::now());
            info!("Task {} finished: {:?} ({})", task_id, state, status);
        }
    }

    pub async fn get_task(&self, task_id: Uuid) -> Option<Task> {
        self.tasks.read().await.get(&task_id).cloned()
    }
}

impl Default for TaskService {
    fn default() -> Self {
        Self::new()
    }
}
