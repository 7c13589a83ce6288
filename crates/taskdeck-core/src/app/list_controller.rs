//! ListQueryController - ページング・検索・フィルタ付き一覧のコントローラー
//!
//! Home と Delete requests の両方が同じコントローラーを `ListSource` 違いで使う。
//!
//! # 流れ
//! 1. 操作ごとに候補の `ListQuery` を作る（現在の状態はまだ変えない）
//! 2. シーケンス番号を発行して fetch
//! 3. 応答が最新のシーケンス番号なら、tasks / ページング / モードをまとめて確定
//!
//! 失敗した場合は何も変えない（一覧が空に見える「ちらつき」を起こさない）。
//! 古い応答は `FetchOutcome::Superseded` として捨てる。
//!
//! # 学習ポイント
//! - ロックは fetch の await をまたがない（発行時と確定時に 1 回ずつ取る）
//! - 「最後に発行したもの勝ち」を到着順ではなくシーケンス番号で決める

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::{
    ClientError, Filters, ListMode, ListQuery, ListSource, PageInfo, Task, ValidationError,
};
use crate::ports::{ListRequest, TaskApi};

/// fetch の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// 応答を反映した
    Applied,
    /// より新しいリクエストが発行済みだったので捨てた
    Superseded,
    /// 境界にいたので何もしなかった（fetch なし）
    Unchanged,
}

/// 一覧の表示用スナップショット
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListSnapshot {
    pub query: ListQuery,
    pub tasks: Vec<Task>,
    pub page: PageInfo,
}

struct ListState {
    query: ListQuery,
    tasks: Vec<Task>,
    /// 最後に発行したシーケンス番号
    issued: u64,
}

pub struct ListQueryController {
    api: Arc<dyn TaskApi>,
    default_limit: u64,
    state: Mutex<ListState>,
}

impl ListQueryController {
    pub fn new(api: Arc<dyn TaskApi>, source: ListSource, default_limit: u64) -> Self {
        let default_limit = default_limit.max(1);
        Self {
            api,
            default_limit,
            state: Mutex::new(ListState {
                query: ListQuery::new(source, default_limit),
                tasks: Vec::new(),
                issued: 0,
            }),
        }
    }

    pub async fn snapshot(&self) -> ListSnapshot {
        let state = self.state.lock().await;
        ListSnapshot {
            query: state.query.clone(),
            tasks: state.tasks.clone(),
            page: state.query.page_info(),
        }
    }

    pub async fn tasks(&self) -> Vec<Task> {
        self.state.lock().await.tasks.clone()
    }

    pub async fn query(&self) -> ListQuery {
        self.state.lock().await.query.clone()
    }

    pub async fn page_info(&self) -> PageInfo {
        self.state.lock().await.query.page_info()
    }

    /// 現在のモードのまま、指定した skip / limit のページを取る
    ///
    /// skip は limit の倍数に切り下げる。
    pub async fn page(&self, skip: u64, limit: u64) -> Result<FetchOutcome, ClientError> {
        let limit = limit.max(1);
        let mut candidate = self.query().await;
        candidate.limit = limit;
        candidate.skip = skip / limit * limit;
        self.run(candidate).await
    }

    /// 検索モードに入る（フィルタは解除される）
    pub async fn search(&self, query: &str) -> Result<FetchOutcome, ClientError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ValidationError::EmptySearch.into());
        }
        let candidate = self.query().await.with_mode(ListMode::Searching {
            query: query.to_string(),
        });
        self.run(candidate).await
    }

    /// フィルタモードに入る（検索は解除される）
    pub async fn filter(&self, filters: Filters) -> Result<FetchOutcome, ClientError> {
        let current = self.query().await;
        if !current.source.supports_filter() {
            return Err(ValidationError::Unsupported("filtering").into());
        }
        self.run(current.with_mode(ListMode::Filtering { filters }))
            .await
    }

    pub async fn clear_search(&self) -> Result<FetchOutcome, ClientError> {
        self.reset_to_plain().await
    }

    pub async fn clear_filter(&self) -> Result<FetchOutcome, ClientError> {
        self.reset_to_plain().await
    }

    /// 次のページ。最終ページなら fetch しない
    pub async fn next(&self) -> Result<FetchOutcome, ClientError> {
        let current = self.query().await;
        match current.next_skip() {
            Some(skip) => self.run(current.with_skip(skip)).await,
            None => Ok(FetchOutcome::Unchanged),
        }
    }

    /// 前のページ。先頭なら fetch しない
    pub async fn prev(&self) -> Result<FetchOutcome, ClientError> {
        let current = self.query().await;
        match current.prev_skip() {
            Some(skip) => self.run(current.with_skip(skip)).await,
            None => Ok(FetchOutcome::Unchanged),
        }
    }

    /// 現在のモード・skip・limit のまま取り直す
    pub async fn reload(&self) -> Result<FetchOutcome, ClientError> {
        let current = self.query().await;
        self.run(current).await
    }

    async fn reset_to_plain(&self) -> Result<FetchOutcome, ClientError> {
        let source = self.query().await.source;
        self.run(ListQuery::new(source, self.default_limit)).await
    }

    async fn run(&self, mut candidate: ListQuery) -> Result<FetchOutcome, ClientError> {
        let mut snapped = false;
        loop {
            let seq = {
                let mut state = self.state.lock().await;
                state.issued += 1;
                state.issued
            };

            let request = ListRequest::from(&candidate);
            let result = self.api.list(&request).await;

            let mut state = self.state.lock().await;
            if seq != state.issued {
                tracing::debug!(seq, latest = state.issued, mode = ?candidate.mode, "discarding stale list response");
                return Ok(FetchOutcome::Superseded);
            }

            let page = match result {
                Ok(page) => page,
                Err(err) => {
                    tracing::warn!(error = %err, source = ?candidate.source, mode = ?candidate.mode, "failed to fetch tasks");
                    return Err(err);
                }
            };

            let mut adopted = candidate.clone();
            let total = page
                .total
                .unwrap_or(candidate.skip + page.tasks.len() as u64);
            adopted.adopt(page.skip, page.limit, total);

            // 削除などで最終ページより後ろに出てしまったら、最終ページを 1 回だけ取り直す
            if page.tasks.is_empty() && adopted.skip < candidate.skip && !snapped {
                snapped = true;
                drop(state);
                tracing::debug!(from = candidate.skip, to = adopted.skip, "snapping to last page");
                candidate = adopted;
                continue;
            }

            tracing::debug!(
                skip = adopted.skip,
                limit = adopted.limit,
                total,
                count = page.tasks.len(),
                "list applied"
            );
            state.query = adopted;
            state.tasks = page.tasks;
            return Ok(FetchOutcome::Applied);
        }
    }
}
