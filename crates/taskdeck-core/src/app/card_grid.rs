//! CardGrid - タスクカードの一覧と詳細モーダル
//!
//! # 責務
//! - 表示中のタスクからカードのビューモデルを作る（バッジ・オーナー名・ボタン）
//! - オーナー名をページごとにまとめて解決する
//! - 1 枚の選択中カードの閲覧 / 編集状態（`SelectedCardState`）を持つ
//! - ユーザー操作を `TaskMutationGateway` に渡す
//!
//! 一覧そのもの（ページング・モード）は持たない。変更が成功すると gateway が
//! reload を合図し、ページ側が一覧を取り直して `set_tasks` し直す。

use std::sync::Arc;

use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::card::can_complete;
use crate::domain::{
    CardBadge, CardDraft, CardError, CardMode, Category, ClientError, DeleteAffordance, Notice,
    SelectedCardState, SessionStore, Task, TaskId,
};
use crate::ports::{Clock, Confirm, ConfirmPrompt, UserApi};

use super::mutation_gateway::TaskMutationGateway;
use super::owner_directory::{OwnerDirectory, distinct_owners, resolve_owners};

/// カード操作のエラー
#[derive(Debug, Error)]
pub enum CardActionError {
    #[error(transparent)]
    Card(#[from] CardError),

    #[error(transparent)]
    Client(#[from] ClientError),
}

impl CardActionError {
    pub fn notice(&self, action: &str) -> Notice {
        match self {
            CardActionError::Card(CardError::Invalid(v)) => Notice::error(v.title(), v.to_string()),
            CardActionError::Card(e) => Notice::warning("Not Allowed", e.to_string()),
            CardActionError::Client(e) => e.notice(action),
        }
    }
}

/// 削除ボタンを押した結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// admin がハード削除した
    Deleted,
    /// 削除申請を出した
    Requested,
    /// 確認ダイアログでキャンセルした（リクエストなし）
    Cancelled,
}

/// 1 枚のカードの表示内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardView {
    pub id: TaskId,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub category: Category,
    pub badge: CardBadge,
    pub owner_name: String,
    pub can_complete: bool,
    pub delete: DeleteAffordance,
    pub can_edit: bool,
}

pub struct CardGrid {
    gateway: TaskMutationGateway,
    users: Arc<dyn UserApi>,
    clock: Arc<dyn Clock>,
    confirm: Arc<dyn Confirm>,
    session: SessionStore,
    tasks: Vec<Task>,
    owners: OwnerDirectory,
    selected: SelectedCardState,
}

impl CardGrid {
    pub fn new(
        gateway: TaskMutationGateway,
        users: Arc<dyn UserApi>,
        clock: Arc<dyn Clock>,
        confirm: Arc<dyn Confirm>,
        session: SessionStore,
    ) -> Self {
        Self {
            gateway,
            users,
            clock,
            confirm,
            session,
            tasks: Vec::new(),
            owners: OwnerDirectory::default(),
            selected: SelectedCardState::default(),
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn owners(&self) -> &OwnerDirectory {
        &self.owners
    }

    pub fn selected(&self) -> &SelectedCardState {
        &self.selected
    }

    /// 表示するタスクを差し替えて、オーナー名を解決し直す
    ///
    /// オーナー名の取得に失敗してもタスクは差し替える。
    /// 前のディレクトリが新しいページの owner を全員含むときだけ残し、
    /// そうでなければ空にして全カードを id 表示にそろえる。
    pub async fn set_tasks(&mut self, tasks: Vec<Task>) -> Result<(), ClientError> {
        self.tasks = tasks;
        match resolve_owners(&self.users, &self.tasks).await {
            Ok(owners) => {
                self.owners = owners;
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to resolve task owners");
                if !self.owners.covers(&distinct_owners(&self.tasks)) {
                    self.owners = OwnerDirectory::default();
                }
                Err(err)
            }
        }
    }

    pub fn cards(&self) -> Vec<CardView> {
        let today = self.clock.today();
        let session = self.session.current();
        self.tasks
            .iter()
            .map(|task| CardView {
                id: task.id,
                title: task.title.clone(),
                description: task.description.clone(),
                due_date: task.due_date,
                category: task.category,
                badge: CardBadge::for_task(task, today),
                owner_name: self.owners.display_name(task.owner_id),
                can_complete: can_complete(task, today),
                delete: session
                    .map(|s| DeleteAffordance::for_task(task, &s))
                    .unwrap_or(DeleteAffordance::Hidden),
                can_edit: session.is_some_and(|s| s.can_edit(task.owner_id)),
            })
            .collect()
    }

    /// カードをクリック → viewing
    pub fn open(&mut self, id: TaskId) -> Result<(), CardError> {
        let task = self.find(id)?.clone();
        self.selected.open(task)
    }

    /// 編集アイコン → editing
    pub fn begin_edit(&mut self) -> Result<(), CardError> {
        let Some(session) = self.session.current() else {
            let id = self.selected.expect_open()?.id;
            return Err(CardError::NotPermitted(id));
        };
        self.selected.begin_edit(&session)
    }

    pub fn edit_draft(&mut self, f: impl FnOnce(&mut CardDraft)) -> Result<(), CardError> {
        self.selected.edit_draft(f)
    }

    /// 日付ピッカーの変更（過去日は拒否）
    pub fn set_draft_due_date(&mut self, due_date: Option<NaiveDate>) -> Result<(), CardError> {
        let today = self.clock.today();
        self.selected.set_draft_due_date(due_date, today)
    }

    /// 編集を保存する
    ///
    /// 検証に通らなければネットワークに出ない。成功したら閉じる。
    /// 失敗したら editing のまま（下書きも残る）。
    pub async fn submit_edit(&mut self) -> Result<Task, CardActionError> {
        let (id, fields) = self.selected.validated_submission(self.clock.today())?;
        let task = self.gateway.edit(id, &fields).await?;
        self.selected.close();
        Ok(task)
    }

    pub fn close(&mut self) {
        self.selected.close();
    }

    /// 削除ボタン
    ///
    /// - admin: 確認ダイアログのあとハード削除
    /// - それ以外: 削除申請（申請済みならボタン自体が無い）
    pub async fn delete(&mut self, id: TaskId) -> Result<DeleteOutcome, CardActionError> {
        let session = self.session.current().ok_or(CardError::NotPermitted(id))?;
        let task = self.find(id)?;
        match DeleteAffordance::for_task(task, &session) {
            DeleteAffordance::HardDelete => {
                if !self.confirm.confirm(&ConfirmPrompt::hard_delete()).await {
                    tracing::debug!(task_id = %id, "hard delete cancelled");
                    return Ok(DeleteOutcome::Cancelled);
                }
                self.gateway.delete(id).await?;
                self.close_if_selected(id);
                Ok(DeleteOutcome::Deleted)
            }
            DeleteAffordance::RequestDelete => {
                self.gateway.request_delete(id).await?;
                self.close_if_selected(id);
                Ok(DeleteOutcome::Requested)
            }
            DeleteAffordance::Hidden => Err(CardError::Unavailable(id).into()),
        }
    }

    /// 完了ボタン（未完了かつ期限切れでないときだけ）
    pub async fn complete(&mut self, id: TaskId) -> Result<(), CardActionError> {
        let task = self.find(id)?;
        if !can_complete(task, self.clock.today()) {
            return Err(CardError::Unavailable(id).into());
        }
        self.gateway.change_status(id, true).await?;
        self.close_if_selected(id);
        Ok(())
    }

    fn find(&self, id: TaskId) -> Result<&Task, CardError> {
        self.tasks
            .iter()
            .find(|t| t.id == id)
            .ok_or(CardError::Unavailable(id))
    }

    fn close_if_selected(&mut self, id: TaskId) {
        if self.selected.card().is_some_and(|t| t.id == id) && self.selected.mode() != CardMode::Closed {
            self.selected.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::reload::{ReloadListener, ReloadSignal};
    use crate::domain::{Credentials, TaskFields, UserId, ValidationError};
    use crate::impls::{InMemoryBackend, InjectedFailure};
    use crate::ports::{AuthApi, FixedAnswer, FixedClock};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    struct Fixture {
        backend: Arc<InMemoryBackend>,
        grid: CardGrid,
        reload: ReloadListener,
        alice: UserId,
        bob: UserId,
    }

    async fn fixture(as_admin: bool, confirm: bool) -> Fixture {
        let backend = Arc::new(InMemoryBackend::new());
        let alice = backend.add_user("alice", "Alice", "Liddell", "Secret1!", false).await;
        let bob = backend.add_user("bob", "Bob", "Builder", "Secret1!", as_admin).await;
        let session = backend
            .login(&Credentials {
                email: "bob@example.com".into(),
                password: "Secret1!".into(),
            })
            .await
            .unwrap();

        let (signal, reload) = ReloadSignal::new();
        let grid = CardGrid::new(
            TaskMutationGateway::new(backend.clone(), signal),
            backend.clone(),
            Arc::new(FixedClock::new(today())),
            Arc::new(FixedAnswer(confirm)),
            SessionStore::signed_in(session),
        );
        Fixture {
            backend,
            grid,
            reload,
            alice,
            bob,
        }
    }

    async fn seed(f: &Fixture, owner: UserId, title: &str, due: Option<NaiveDate>) -> Task {
        let id = f
            .backend
            .seed_task(
                owner,
                TaskFields {
                    title: title.into(),
                    due_date: due,
                    ..TaskFields::default()
                },
            )
            .await;
        f.backend.task(id).await.unwrap()
    }

    #[tokio::test]
    async fn cards_show_badges_and_owner_names() {
        let mut f = fixture(false, true).await;
        let overdue = seed(&f, f.bob, "late", today().pred_opt()).await;
        let pending = seed(&f, f.alice, "soon", today().succ_opt()).await;
        f.grid.set_tasks(vec![overdue, pending]).await.unwrap();

        let cards = f.grid.cards();
        assert_eq!(cards[0].badge, CardBadge::Overdue);
        assert!(!cards[0].can_complete);
        assert_eq!(cards[0].owner_name, "Bob Builder");
        assert!(cards[0].can_edit);

        assert_eq!(cards[1].badge, CardBadge::Pending);
        assert!(cards[1].can_complete);
        assert_eq!(cards[1].owner_name, "Alice Liddell");
        assert!(!cards[1].can_edit);
    }

    #[tokio::test]
    async fn failed_owner_lookup_never_mixes_names_and_ids() {
        let mut f = fixture(false, true).await;
        let carol = f.backend.add_user("carol", "Carol", "Danvers", "Secret1!", false).await;
        let a = seed(&f, f.alice, "a", None).await;
        let b = seed(&f, f.bob, "b", None).await;
        let c = seed(&f, carol, "c", None).await;
        f.grid.set_tasks(vec![a.clone(), b.clone()]).await.unwrap();

        // 次のページには前のページにいない owner がいる
        f.backend.fail_next(InjectedFailure::Network).await;
        assert!(f.grid.set_tasks(vec![b.clone(), b.clone(), c]).await.is_err());
        let names: Vec<String> = f.grid.cards().into_iter().map(|c| c.owner_name).collect();
        assert_eq!(names, vec![f.bob.to_string(), f.bob.to_string(), carol.to_string()]);
        assert!(f.grid.owners().is_empty());

        // 前のディレクトリで全員引けるなら残す
        f.grid.set_tasks(vec![a.clone(), b.clone()]).await.unwrap();
        f.backend.fail_next(InjectedFailure::Network).await;
        assert!(f.grid.set_tasks(vec![b, a]).await.is_err());
        let names: Vec<String> = f.grid.cards().into_iter().map(|c| c.owner_name).collect();
        assert_eq!(names, vec!["Bob Builder", "Alice Liddell"]);
    }

    #[tokio::test]
    async fn past_due_date_submit_makes_no_request() {
        let mut f = fixture(false, true).await;
        let task = seed(&f, f.bob, "mine", Some(today())).await;
        f.grid.set_tasks(vec![task.clone()]).await.unwrap();

        f.grid.open(task.id).unwrap();
        f.grid.begin_edit().unwrap();
        f.grid.edit_draft(|d| d.due_date = today().pred_opt()).unwrap();
        f.backend.clear_calls().await;

        let err = f.grid.submit_edit().await.unwrap_err();
        assert!(matches!(
            err,
            CardActionError::Card(CardError::Invalid(ValidationError::PastDueDate))
        ));
        assert!(f.backend.calls().await.is_empty());
        assert_eq!(f.grid.selected().mode(), CardMode::Editing);
        assert_eq!(err.notice("update").title, "Invalid Due Date");
    }

    #[tokio::test]
    async fn successful_edit_closes_and_requests_reload() {
        let mut f = fixture(false, true).await;
        let task = seed(&f, f.bob, "mine", None).await;
        f.grid.set_tasks(vec![task.clone()]).await.unwrap();

        f.grid.open(task.id).unwrap();
        f.grid.begin_edit().unwrap();
        f.grid.edit_draft(|d| d.title = "renamed".into()).unwrap();
        let saved = f.grid.submit_edit().await.unwrap();

        assert_eq!(saved.title, "renamed");
        assert_eq!(f.grid.selected().mode(), CardMode::Closed);
        assert!(f.reload.take_pending());
    }

    #[tokio::test]
    async fn non_admin_delete_on_foreign_task_requests_deletion() {
        let mut f = fixture(false, true).await;
        let foreign = seed(&f, f.alice, "not mine", None).await;
        f.grid.set_tasks(vec![foreign.clone()]).await.unwrap();
        f.backend.clear_calls().await;

        let outcome = f.grid.delete(foreign.id).await.unwrap();
        assert_eq!(outcome, DeleteOutcome::Requested);
        let calls = f.backend.calls().await;
        assert_eq!(calls.len(), 1);
        assert!(calls[0].starts_with("PUT /task/task-delete-request/"));
        assert!(f.reload.take_pending());

        let reloaded = f.backend.task(foreign.id).await.unwrap();
        assert!(reloaded.delete_request);
        f.grid.set_tasks(vec![reloaded]).await.unwrap();
        assert_eq!(f.grid.cards()[0].delete, DeleteAffordance::Hidden);
        assert!(matches!(
            f.grid.delete(foreign.id).await,
            Err(CardActionError::Card(CardError::Unavailable(_)))
        ));
    }

    #[tokio::test]
    async fn admin_delete_needs_confirmation() {
        let mut f = fixture(true, false).await;
        let task = seed(&f, f.alice, "doomed", None).await;
        f.grid.set_tasks(vec![task.clone()]).await.unwrap();
        f.backend.clear_calls().await;

        assert_eq!(f.grid.delete(task.id).await.unwrap(), DeleteOutcome::Cancelled);
        assert!(f.backend.calls().await.is_empty());
        assert!(f.backend.task(task.id).await.is_some());

        let mut f = fixture(true, true).await;
        let task = seed(&f, f.alice, "doomed", None).await;
        f.grid.set_tasks(vec![task.clone()]).await.unwrap();
        assert_eq!(f.grid.delete(task.id).await.unwrap(), DeleteOutcome::Deleted);
        assert!(f.backend.task(task.id).await.is_none());
    }

    #[tokio::test]
    async fn overdue_task_cannot_be_completed() {
        let mut f = fixture(false, true).await;
        let late = seed(&f, f.bob, "late", today().pred_opt()).await;
        let open = seed(&f, f.bob, "open", None).await;
        f.grid.set_tasks(vec![late.clone(), open.clone()]).await.unwrap();

        assert!(matches!(
            f.grid.complete(late.id).await,
            Err(CardActionError::Card(CardError::Unavailable(_)))
        ));
        f.grid.complete(open.id).await.unwrap();
        assert!(f.backend.task(open.id).await.unwrap().status);
    }

    #[tokio::test]
    async fn signed_out_grid_hides_actions() {
        let backend = Arc::new(InMemoryBackend::new());
        let owner = backend.add_user("carol", "Carol", "C", "Secret1!", false).await;
        let id = backend
            .seed_task(
                owner,
                TaskFields {
                    title: "t".into(),
                    ..TaskFields::default()
                },
            )
            .await;
        let (signal, _reload) = ReloadSignal::new();
        let mut grid = CardGrid::new(
            TaskMutationGateway::new(backend.clone(), signal),
            backend.clone(),
            Arc::new(FixedClock::new(today())),
            Arc::new(FixedAnswer(true)),
            SessionStore::new(),
        );
        grid.set_tasks(vec![backend.task(id).await.unwrap()]).await.unwrap();

        assert_eq!(grid.cards()[0].delete, DeleteAffordance::Hidden);
        grid.open(id).unwrap();
        assert_eq!(grid.begin_edit(), Err(CardError::NotPermitted(id)));
    }
}
