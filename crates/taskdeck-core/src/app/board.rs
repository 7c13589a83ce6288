//! TaskBoard - 一覧ページ（Home / Delete requests）の組み立て
//!
//! ListQueryController の結果を CardGrid に流し込み、CardGrid の操作が成功して
//! reload が合図されたら一覧を取り直す。
//!
//! エラーはここで 1 回だけ `Notifier` に流し、呼び出し側にもそのまま返す。
//! 一覧やページングの状態は失敗で変わらない。

use std::sync::Arc;

use chrono::NaiveDate;

use crate::domain::{
    CardDraft, CardError, ClientError, Filters, ListMode, ListSource, Notice, PageInfo, Task,
    TaskId,
};
use crate::ports::Notifier;

use super::card_grid::{CardActionError, CardGrid, CardView, DeleteOutcome};
use super::list_controller::{FetchOutcome, ListQueryController};
use super::reload::ReloadListener;

/// 描画に必要なものをまとめたもの
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardView {
    pub source: ListSource,
    pub mode: ListMode,
    pub cards: Vec<CardView>,
    pub page: PageInfo,
}

impl BoardView {
    /// 「タスクなし」を出すべきか（取得済みで 0 件のときだけ）
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

pub struct TaskBoard {
    list: ListQueryController,
    grid: CardGrid,
    reload: ReloadListener,
    notifier: Arc<dyn Notifier>,
}

/// 一覧取得の失敗通知
pub fn list_failed(err: &ClientError) -> Notice {
    match err {
        ClientError::Validation(v) => Notice::warning(v.title(), v.to_string()),
        ClientError::Rejected { status: 401, .. } => {
            Notice::error("Unauthorized", "Please log in again.")
        }
        ClientError::Rejected { status: 403, .. } => {
            Notice::error("Forbidden", "You are not allowed to view these tasks.")
        }
        _ => Notice::error("Oops...", "Failed to load tasks. Please try again later."),
    }
}

impl TaskBoard {
    pub fn new(
        list: ListQueryController,
        grid: CardGrid,
        reload: ReloadListener,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            list,
            grid,
            reload,
            notifier,
        }
    }

    pub async fn view(&self) -> BoardView {
        let query = self.list.query().await;
        BoardView {
            source: query.source,
            mode: query.mode.clone(),
            cards: self.grid.cards(),
            page: query.page_info(),
        }
    }

    pub fn grid(&self) -> &CardGrid {
        &self.grid
    }

    pub fn list(&self) -> &ListQueryController {
        &self.list
    }

    // ---- 一覧の操作 ----

    /// 最初の表示（現在のモード・ページで取得）
    pub async fn load(&mut self) -> Result<FetchOutcome, ClientError> {
        let outcome = self.list.reload().await;
        self.settle(outcome).await
    }

    pub async fn page(&mut self, skip: u64, limit: u64) -> Result<FetchOutcome, ClientError> {
        let outcome = self.list.page(skip, limit).await;
        self.settle(outcome).await
    }

    pub async fn search(&mut self, query: &str) -> Result<FetchOutcome, ClientError> {
        let outcome = self.list.search(query).await;
        self.settle(outcome).await
    }

    pub async fn filter(&mut self, filters: Filters) -> Result<FetchOutcome, ClientError> {
        let outcome = self.list.filter(filters).await;
        self.settle(outcome).await
    }

    pub async fn clear_search(&mut self) -> Result<FetchOutcome, ClientError> {
        let outcome = self.list.clear_search().await;
        self.settle(outcome).await
    }

    pub async fn clear_filter(&mut self) -> Result<FetchOutcome, ClientError> {
        let outcome = self.list.clear_filter().await;
        self.settle(outcome).await
    }

    pub async fn next(&mut self) -> Result<FetchOutcome, ClientError> {
        let outcome = self.list.next().await;
        self.settle(outcome).await
    }

    pub async fn prev(&mut self) -> Result<FetchOutcome, ClientError> {
        let outcome = self.list.prev().await;
        self.settle(outcome).await
    }

    /// 合図が溜まっていれば取り直す
    pub async fn apply_pending_reload(&mut self) -> Result<FetchOutcome, ClientError> {
        if !self.reload.take_pending() {
            return Ok(FetchOutcome::Unchanged);
        }
        let outcome = self.list.reload().await;
        self.settle(outcome).await
    }

    // ---- カードの操作 ----

    pub fn open(&mut self, id: TaskId) -> Result<(), CardError> {
        self.grid.open(id)
    }

    pub fn begin_edit(&mut self) -> Result<(), CardError> {
        let result = self.grid.begin_edit();
        if let Err(err) = &result {
            self.notifier
                .notify(CardActionError::Card(err.clone()).notice("edit"));
        }
        result
    }

    pub fn edit_draft(&mut self, f: impl FnOnce(&mut CardDraft)) -> Result<(), CardError> {
        self.grid.edit_draft(f)
    }

    pub fn set_draft_due_date(&mut self, due_date: Option<NaiveDate>) -> Result<(), CardError> {
        let result = self.grid.set_draft_due_date(due_date);
        if let Err(err) = &result {
            self.notifier
                .notify(CardActionError::Card(err.clone()).notice("update"));
        }
        result
    }

    pub fn close(&mut self) {
        self.grid.close();
    }

    pub async fn submit_edit(&mut self) -> Result<Task, CardActionError> {
        let result = self.grid.submit_edit().await;
        self.after_action(result, "update", |_| {
            Some(Notice::success("Task Updated Successfully!", ""))
        })
        .await
    }

    pub async fn delete(&mut self, id: TaskId) -> Result<DeleteOutcome, CardActionError> {
        let result = self.grid.delete(id).await;
        self.after_action(result, "delete", |outcome| match outcome {
            DeleteOutcome::Deleted => Some(Notice::success("Deleted!", "Your task has been deleted.")),
            DeleteOutcome::Requested => Some(Notice::success(
                "Delete request sent!",
                "An admin will review your request.",
            )),
            DeleteOutcome::Cancelled => None,
        })
        .await
    }

    pub async fn complete(&mut self, id: TaskId) -> Result<(), CardActionError> {
        let result = self.grid.complete(id).await;
        self.after_action(result, "complete", |_| {
            Some(Notice::success("Task Completed!", ""))
        })
        .await
    }

    async fn after_action<T>(
        &mut self,
        result: Result<T, CardActionError>,
        action: &str,
        success: impl FnOnce(&T) -> Option<Notice>,
    ) -> Result<T, CardActionError> {
        match result {
            Ok(value) => {
                if let Some(notice) = success(&value) {
                    self.notifier.notify(notice);
                }
                // reload の失敗は settle で通知済み。操作自体は成功している
                let _ = self.apply_pending_reload().await;
                Ok(value)
            }
            Err(err) => {
                self.notifier.notify(err.notice(action));
                Err(err)
            }
        }
    }

    /// 一覧の結果を確定させる（成功したらカードに流す、失敗したら通知）
    async fn settle(
        &mut self,
        outcome: Result<FetchOutcome, ClientError>,
    ) -> Result<FetchOutcome, ClientError> {
        match outcome {
            Ok(FetchOutcome::Applied) => {
                let tasks = self.list.tasks().await;
                if let Err(err) = self.grid.set_tasks(tasks).await {
                    self.notifier.notify(Notice::warning(
                        "Owners unavailable",
                        format!("Could not load task owners: {err}"),
                    ));
                }
                Ok(FetchOutcome::Applied)
            }
            Ok(other) => Ok(other),
            Err(err) => {
                self.notifier.notify(list_failed(&err));
                Err(err)
            }
        }
    }
}
