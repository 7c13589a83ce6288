//! TaskMutationGateway - タスクへの書き込み操作
//!
//! 1 操作 = 1 リクエスト。リトライしない。
//! 成功したら `ReloadSignal` を送るだけで、一覧の状態には触らない。
//! 失敗はステータス付きの `ClientError` のまま呼び出し側に返す
//! （通知文言の出し分けは `ClientError::notice` で行う）。

use std::sync::Arc;

use crate::domain::{ClientError, Task, TaskFields, TaskId};
use crate::ports::TaskApi;

use super::reload::ReloadSignal;

#[derive(Clone)]
pub struct TaskMutationGateway {
    api: Arc<dyn TaskApi>,
    reload: ReloadSignal,
}

impl TaskMutationGateway {
    pub fn new(api: Arc<dyn TaskApi>, reload: ReloadSignal) -> Self {
        Self { api, reload }
    }

    pub async fn create(&self, fields: &TaskFields) -> Result<Task, ClientError> {
        let task = self.api.create(fields).await?;
        tracing::info!(task_id = %task.id, "task created");
        self.reload.request();
        Ok(task)
    }

    pub async fn edit(&self, id: TaskId, fields: &TaskFields) -> Result<Task, ClientError> {
        let task = self.api.edit(id, fields).await?;
        tracing::info!(task_id = %id, "task updated");
        self.reload.request();
        Ok(task)
    }

    pub async fn change_status(&self, id: TaskId, status: bool) -> Result<(), ClientError> {
        self.api.change_status(id, status).await?;
        tracing::info!(task_id = %id, status, "task status changed");
        self.reload.request();
        Ok(())
    }

    /// ハード削除（取り消し不可）。確認は呼び出し側の責務
    pub async fn delete(&self, id: TaskId) -> Result<(), ClientError> {
        self.api.delete(id).await?;
        tracing::info!(task_id = %id, "task deleted");
        self.reload.request();
        Ok(())
    }

    pub async fn request_delete(&self, id: TaskId) -> Result<(), ClientError> {
        self.api.request_delete(id).await?;
        tracing::info!(task_id = %id, "delete requested");
        self.reload.request();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Credentials, UserId};
    use crate::impls::{InMemoryBackend, InjectedFailure};
    use crate::ports::AuthApi;
    use crate::app::reload::ReloadListener;

    async fn setup() -> (Arc<InMemoryBackend>, TaskMutationGateway, ReloadListener, UserId) {
        let backend = Arc::new(InMemoryBackend::new());
        let alice = backend.add_user("alice", "Alice", "Liddell", "Secret1!", false).await;
        backend
            .login(&Credentials {
                email: "alice@example.com".into(),
                password: "Secret1!".into(),
            })
            .await
            .unwrap();
        let (signal, listener) = ReloadSignal::new();
        let gateway = TaskMutationGateway::new(backend.clone(), signal);
        (backend, gateway, listener, alice)
    }

    #[tokio::test]
    async fn success_requests_reload() {
        let (backend, gateway, mut listener, alice) = setup().await;
        let task = gateway
            .create(&TaskFields {
                title: "water plants".into(),
                ..TaskFields::default()
            })
            .await
            .unwrap();
        assert_eq!(task.owner_id, alice);
        assert!(listener.take_pending());

        gateway.change_status(task.id, true).await.unwrap();
        assert!(listener.take_pending());
        assert!(backend.task(task.id).await.unwrap().status);
    }

    #[tokio::test]
    async fn failure_surfaces_status_without_reload() {
        let (backend, gateway, mut listener, alice) = setup().await;
        let id = backend
            .seed_task(
                alice,
                TaskFields {
                    title: "x".into(),
                    ..TaskFields::default()
                },
            )
            .await;

        backend
            .fail_next(InjectedFailure::Status(422, "due_date: must be in the future".into()))
            .await;
        let err = gateway
            .edit(id, &TaskFields::default())
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(422));
        assert_eq!(
            err.notice("update").text,
            "Due date must be greater than the current date."
        );
        assert!(!listener.take_pending());

        let err = gateway.delete(id).await.unwrap_err();
        assert_eq!(err.status(), Some(403));
        assert!(!listener.take_pending());
    }
}
