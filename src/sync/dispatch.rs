use log::debug;

use crate::backend::{Backend, BackendError};
use crate::queue::ActionPayload;

/// Replays one queued action against the remote service.
pub(crate) async fn replay(backend: &dyn Backend, payload: &ActionPayload) -> Result<(), BackendError> {
    match payload {
        ActionPayload::CreateTask(args) => {
            let task = backend.create_task(args.clone()).await?;
            debug!("Created task {} ({})", task.id, task.title);
        }
        ActionPayload::UpdateTask { task_id, changes } => {
            backend.update_task(*task_id, changes.clone()).await?;
            debug!("Updated task {task_id}");
        }
        ActionPayload::SubmitTask { task_id } => {
            let task = backend.submit_task(*task_id).await?;
            debug!("Submitted task {task_id}, now {}", task.status);
        }
        ActionPayload::UpdateRequirement {
            requirement_id,
            completed,
        } => {
            backend
                .set_requirement_completion(*requirement_id, *completed)
                .await?;
            debug!("Set requirement {requirement_id} completed={completed}");
        }
        ActionPayload::CreateCompletion(args) => {
            let completion = backend.create_completion(args.clone()).await?;
            debug!("Created completion {} for task {}", completion.id, completion.task_id);
        }
    }
    Ok(())
}
