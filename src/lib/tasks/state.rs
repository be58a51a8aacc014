use chrono::Utc;

use super::types::{Task, TaskError, TaskStatus};

/// Whether a task may move from `src` to `dst`. `Failed` is terminal.
pub fn valid_state_transition(src: TaskStatus, dst: TaskStatus) -> bool {
    match src {
        TaskStatus::Running => true,
        TaskStatus::Stopped => matches!(dst, TaskStatus::Running | TaskStatus::Stopped),
        TaskStatus::Failed => dst == TaskStatus::Failed,
    }
}

impl Task {
    /// Moves the task to `status`, stamping start and finish times.
    pub fn transition(&mut self, status: TaskStatus) -> Result<(), TaskError> {
        if !valid_state_transition(self.status, status) {
            return Err(TaskError::InvalidTransition {
                task: self.id,
                from: self.status,
                to: status,
            });
        }

        if status != self.status {
            match status {
                TaskStatus::Running => {
                    self.started_at = Some(Utc::now());
                    self.finished_at = None;
                }
                TaskStatus::Stopped | TaskStatus::Failed => self.finished_at = Some(Utc::now()),
            }
        }
        self.status = status;
        Ok(())
    }

    /// Records the id of the container backing this task.
    pub fn bind_container(&mut self, container_id: &str) {
        self.container_id = Some(container_id.to_string());
        self.started_at.get_or_insert_with(Utc::now);
    }
}
