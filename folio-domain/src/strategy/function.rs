/// Remote-function creation strategy
///
/// Posts the draft to the `create-task-with-ai` serverless function, which
/// creates the row server-side and enriches it (auto-labeling) before
/// returning the full task record. Requires the functions gateway to be
/// configured and a signed-in user whose bearer token the function can act
/// on; otherwise it reports it cannot handle the draft and the chain moves
/// on.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

use folio_backend::client::BackendClient;
use folio_backend::error::BackendError;

use crate::error::ServiceError;
use crate::models::Task;
use crate::strategy::{CreatedTask, CreationSource, TaskCreationStrategy, TaskDraft};

/// Name of the serverless creation function
pub const CREATE_TASK_FUNCTION: &str = "create-task-with-ai";

/// Remote-function strategy
pub struct FunctionTaskCreation {
    client: Arc<BackendClient>,
    function: String,
}

impl FunctionTaskCreation {
    /// Creates the strategy against the default function
    pub fn new(client: Arc<BackendClient>) -> Self {
        FunctionTaskCreation {
            client,
            function: CREATE_TASK_FUNCTION.to_string(),
        }
    }
}

#[async_trait]
impl TaskCreationStrategy for FunctionTaskCreation {
    fn name(&self) -> &str {
        "function"
    }

    async fn can_handle(&self, _draft: &TaskDraft) -> bool {
        self.client.functions_configured() && self.client.session().await.is_some()
    }

    async fn create(&self, draft: &TaskDraft) -> Result<CreatedTask, ServiceError> {
        let body = json!({
            "title": draft.title,
            "description": draft.description,
            "portfolio_id": draft.portfolio_id,
        });

        let value = self.client.functions().invoke(&self.function, &body).await?;
        let task: Task = serde_json::from_value(value)
            .map_err(|err| ServiceError::Backend(BackendError::Decode(err.to_string())))?;

        tracing::debug!(task_id = %task.id, "task created by remote function");

        Ok(CreatedTask {
            task,
            source: CreationSource::Remote,
        })
    }
}
