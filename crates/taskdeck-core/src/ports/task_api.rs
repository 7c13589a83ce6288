//! TaskApi port - タスク系エンドポイント
//!
//! 一覧（plain / search / filter / 削除申請）と 5 つの書き込み操作。
//! 実装は `impls::http::HttpBackend`（本番）と `impls::memory::InMemoryBackend`（テスト・デモ）。

use async_trait::async_trait;

use crate::domain::{
    ClientError, ListMode, ListQuery, ListSource, Task, TaskFields, TaskId, TaskPage,
};

/// 一覧の 1 リクエスト分のパラメータ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRequest {
    pub source: ListSource,
    pub mode: ListMode,
    pub skip: u64,
    pub limit: u64,
}

impl From<&ListQuery> for ListRequest {
    fn from(query: &ListQuery) -> Self {
        Self {
            source: query.source,
            mode: query.mode.clone(),
            skip: query.skip,
            limit: query.limit,
        }
    }
}

/// TaskApi はタスクの読み書き
///
/// # 約束事
/// - リトライしない
/// - non-2xx は `ClientError::Rejected { status, detail }` で返す
/// - 呼び出し側の一覧状態には触らない
#[async_trait]
pub trait TaskApi: Send + Sync {
    async fn list(&self, request: &ListRequest) -> Result<TaskPage, ClientError>;

    async fn create(&self, fields: &TaskFields) -> Result<Task, ClientError>;

    async fn edit(&self, id: TaskId, fields: &TaskFields) -> Result<Task, ClientError>;

    async fn change_status(&self, id: TaskId, status: bool) -> Result<(), ClientError>;

    async fn delete(&self, id: TaskId) -> Result<(), ClientError>;

    async fn request_delete(&self, id: TaskId) -> Result<(), ClientError>;
}
