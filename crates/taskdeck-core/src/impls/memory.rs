//! InMemoryBackend - 開発・テスト用のバックエンド
//!
//! HTTP 契約（ステータスコード、ページング、権限）をメモリ上で再現する。
//! サーバー実装ではなく、クライアント側のロジックを検証するためのテストダブル。
//!
//! # 学習ポイント
//! - `Arc<Mutex<State>>` に状態を集約（ロックは await をまたがない）
//! - 3 つの port trait を 1 つの構造体で実装する
//! - 失敗注入と呼び出し記録で「ネットワークに出たか」を検証できる

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    ClientError, Credentials, ListMode, ListSource, PasswordChange, PasswordReset, ProfileUpdate,
    SessionContext, SignupRequest, Task, TaskFields, TaskId, TaskPage, UserId, UserProfile,
    ValidationError,
};
use crate::ports::{AuthApi, ListRequest, TaskApi, UserApi};

/// 注入する失敗
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InjectedFailure {
    Status(u16, String),
    Network,
}

impl InjectedFailure {
    fn into_error(self) -> ClientError {
        match self {
            InjectedFailure::Status(status, detail) => ClientError::rejected(status, detail),
            InjectedFailure::Network => ClientError::Network("connection refused".into()),
        }
    }
}

struct Account {
    profile: UserProfile,
    password: String,
    is_admin: bool,
}

/// In-memory state.
struct InMemoryState {
    /// All tasks ordered by id (single source of truth).
    tasks: BTreeMap<i64, Task>,

    accounts: HashMap<UserId, Account>,

    /// Cookie 相当：ログイン中のユーザー
    session: Option<SessionContext>,

    /// Reset tokens issued by forget-password (email -> token).
    reset_tokens: HashMap<String, String>,

    next_task_id: i64,
    next_user_id: i64,

    /// 次の呼び出しで返す失敗
    failures: VecDeque<InjectedFailure>,

    /// "METHOD path" の記録
    calls: Vec<String>,
}

impl InMemoryState {
    fn new() -> Self {
        Self {
            tasks: BTreeMap::new(),
            accounts: HashMap::new(),
            session: None,
            reset_tokens: HashMap::new(),
            next_task_id: 1,
            next_user_id: 1,
            failures: VecDeque::new(),
            calls: Vec::new(),
        }
    }

    fn record(&mut self, call: String) -> Result<(), ClientError> {
        self.calls.push(call);
        match self.failures.pop_front() {
            Some(failure) => Err(failure.into_error()),
            None => Ok(()),
        }
    }

    fn session(&self) -> Result<SessionContext, ClientError> {
        self.session
            .ok_or_else(|| ClientError::rejected(401, "Not authenticated"))
    }

    fn task_mut(&mut self, id: TaskId) -> Result<&mut Task, ClientError> {
        self.tasks
            .get_mut(&id.get())
            .ok_or_else(|| ClientError::rejected(404, "Task not found"))
    }

    fn owner_matches(&self, task: &Task, query: &str) -> bool {
        self.accounts.get(&task.owner_id).is_some_and(|account| {
            let p = &account.profile;
            [&p.username, &p.first_name, &p.last_name, &p.email]
                .into_iter()
                .flatten()
                .any(|v| v.to_lowercase().contains(query))
        })
    }

    fn visible(&self, session: &SessionContext, request: &ListRequest) -> Result<Vec<Task>, ClientError> {
        let tasks = self.tasks.values();
        let scoped: Vec<&Task> = match request.source {
            ListSource::Tasks => tasks
                .filter(|t| session.is_admin || t.owner_id == session.subject)
                .collect(),
            ListSource::DeleteRequests => {
                if !session.is_admin {
                    return Err(ClientError::rejected(403, "Admin privileges required"));
                }
                tasks.filter(|t| t.delete_request).collect()
            }
        };

        let selected = match (&request.mode, request.source) {
            (ListMode::Plain, _) => scoped,
            (ListMode::Searching { query }, ListSource::Tasks) => {
                let q = query.to_lowercase();
                scoped
                    .into_iter()
                    .filter(|t| {
                        t.title.to_lowercase().contains(&q)
                            || t.description
                                .as_deref()
                                .is_some_and(|d| d.to_lowercase().contains(&q))
                    })
                    .collect()
            }
            (ListMode::Searching { query }, ListSource::DeleteRequests) => {
                let q = query.to_lowercase();
                scoped
                    .into_iter()
                    .filter(|t| self.owner_matches(t, &q))
                    .collect()
            }
            (ListMode::Filtering { filters }, ListSource::Tasks) => scoped
                .into_iter()
                .filter(|t| filters.status.is_none_or(|s| t.status == s))
                .filter(|t| filters.category.is_none_or(|c| t.category == c))
                .filter(|t| filters.due_date.is_none_or(|d| t.due_date == Some(d)))
                .collect(),
            (ListMode::Filtering { .. }, ListSource::DeleteRequests) => {
                return Err(ValidationError::Unsupported("filtering").into());
            }
        };
        Ok(selected.into_iter().cloned().collect())
    }
}

/// InMemoryBackend は TaskApi / UserApi / AuthApi をまとめて実装する
///
/// # 使用例
/// ```ignore
/// let backend = Arc::new(InMemoryBackend::new());
/// let alice = backend.add_user("alice", "Alice", "Liddell", "Secret1!", false).await;
/// backend
///     .seed_task(alice, TaskFields { title: "write report".into(), ..TaskFields::default() })
///     .await;
/// ```
#[derive(Clone)]
pub struct InMemoryBackend {
    state: Arc<Mutex<InMemoryState>>,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(InMemoryState::new())),
        }
    }

    /// アカウントを作る。email は `{username}@example.com`
    pub async fn add_user(
        &self,
        username: &str,
        first_name: &str,
        last_name: &str,
        password: &str,
        is_admin: bool,
    ) -> UserId {
        let mut state = self.state.lock().await;
        let id = UserId::new(state.next_user_id);
        state.next_user_id += 1;
        let profile = UserProfile {
            id,
            username: Some(username.to_string()),
            email: Some(format!("{username}@example.com")),
            first_name: Some(first_name.to_string()),
            last_name: Some(last_name.to_string()),
            contact_number: None,
            gender: None,
            created_at: None,
            is_active: Some(true),
        };
        state.accounts.insert(
            id,
            Account {
                profile,
                password: password.to_string(),
                is_admin,
            },
        );
        id
    }

    /// ログインを経由せずにタスクを置く
    pub async fn seed_task(&self, owner: UserId, fields: TaskFields) -> TaskId {
        let mut state = self.state.lock().await;
        let id = TaskId::new(state.next_task_id);
        state.next_task_id += 1;
        state.tasks.insert(
            id.get(),
            Task {
                id,
                title: fields.title,
                description: fields.description,
                due_date: fields.due_date,
                category: fields.category,
                status: false,
                owner_id: owner,
                delete_request: false,
            },
        );
        id
    }

    pub async fn task(&self, id: TaskId) -> Option<Task> {
        self.state.lock().await.tasks.get(&id.get()).cloned()
    }

    /// 次の呼び出しを失敗させる（複数積むと順番に消費される）
    pub async fn fail_next(&self, failure: InjectedFailure) {
        self.state.lock().await.failures.push_back(failure);
    }

    /// これまでの呼び出し（"METHOD path"）
    pub async fn calls(&self) -> Vec<String> {
        self.state.lock().await.calls.clone()
    }

    pub async fn clear_calls(&self) {
        self.state.lock().await.calls.clear();
    }

    /// 発行済みのリセットトークン
    pub async fn reset_token(&self, email: &str) -> Option<String> {
        self.state.lock().await.reset_tokens.get(email).cloned()
    }
}

#[async_trait]
impl TaskApi for InMemoryBackend {
    async fn list(&self, request: &ListRequest) -> Result<TaskPage, ClientError> {
        let mut state = self.state.lock().await;
        state.record(format!("GET {:?}/{:?}", request.source, request.mode))?;
        let session = state.session()?;
        let matching = state.visible(&session, request)?;
        let total = matching.len() as u64;
        let tasks = matching
            .into_iter()
            .skip(request.skip as usize)
            .take(request.limit as usize)
            .collect();
        Ok(TaskPage {
            tasks,
            total: Some(total),
            skip: Some(request.skip),
            limit: Some(request.limit),
        })
    }

    async fn create(&self, fields: &TaskFields) -> Result<Task, ClientError> {
        let mut state = self.state.lock().await;
        state.record("POST /task/tasks/".into())?;
        let session = state.session()?;
        if fields.title.trim().is_empty() {
            return Err(ClientError::rejected(422, "title: field required"));
        }
        let id = TaskId::new(state.next_task_id);
        state.next_task_id += 1;
        let task = Task {
            id,
            title: fields.title.clone(),
            description: fields.description.clone(),
            due_date: fields.due_date,
            category: fields.category,
            status: false,
            owner_id: session.subject,
            delete_request: false,
        };
        state.tasks.insert(id.get(), task.clone());
        Ok(task)
    }

    async fn edit(&self, id: TaskId, fields: &TaskFields) -> Result<Task, ClientError> {
        let mut state = self.state.lock().await;
        state.record(format!("PUT /task/tasks/{}", id.get()))?;
        let session = state.session()?;
        let task = state.task_mut(id)?;
        if !session.can_edit(task.owner_id) {
            return Err(ClientError::rejected(403, "You are not allowed to update this task"));
        }
        task.title = fields.title.clone();
        task.description = fields.description.clone();
        task.due_date = fields.due_date;
        task.category = fields.category;
        Ok(task.clone())
    }

    async fn change_status(&self, id: TaskId, status: bool) -> Result<(), ClientError> {
        let mut state = self.state.lock().await;
        state.record(format!("PUT /task/change-status/{}", id.get()))?;
        let session = state.session()?;
        let task = state.task_mut(id)?;
        if !session.can_edit(task.owner_id) {
            return Err(ClientError::rejected(403, "You are not allowed to update this task"));
        }
        task.status = status;
        Ok(())
    }

    async fn delete(&self, id: TaskId) -> Result<(), ClientError> {
        let mut state = self.state.lock().await;
        state.record(format!("DELETE /task/tasks/{}", id.get()))?;
        let session = state.session()?;
        if !session.is_admin {
            return Err(ClientError::rejected(403, "You don't have permission to delete this task"));
        }
        state
            .tasks
            .remove(&id.get())
            .map(|_| ())
            .ok_or_else(|| ClientError::rejected(404, "Task not found"))
    }

    async fn request_delete(&self, id: TaskId) -> Result<(), ClientError> {
        let mut state = self.state.lock().await;
        state.record(format!("PUT /task/task-delete-request/{}", id.get()))?;
        state.session()?;
        state.task_mut(id)?.delete_request = true;
        Ok(())
    }
}

#[async_trait]
impl UserApi for InMemoryBackend {
    async fn get_user(&self, id: UserId) -> Result<UserProfile, ClientError> {
        let mut state = self.state.lock().await;
        state.record(format!("GET /user/user/{}", id.get()))?;
        state
            .accounts
            .get(&id)
            .map(|a| a.profile.clone())
            .ok_or_else(|| ClientError::rejected(404, "User not found"))
    }

    async fn update_user(&self, id: UserId, update: &ProfileUpdate) -> Result<(), ClientError> {
        let mut state = self.state.lock().await;
        state.record(format!("PUT /user/user/{}", id.get()))?;
        let session = state.session()?;
        if session.subject != id && !session.is_admin {
            return Err(ClientError::rejected(401, "Unauthorized attempt"));
        }
        let account = state
            .accounts
            .get_mut(&id)
            .ok_or_else(|| ClientError::rejected(404, "User not found"))?;
        account.profile.username = Some(update.username.clone());
        account.profile.first_name = Some(update.first_name.clone());
        account.profile.last_name = Some(update.last_name.clone());
        account.profile.contact_number = Some(update.contact_number.clone());
        Ok(())
    }
}

#[async_trait]
impl AuthApi for InMemoryBackend {
    async fn signup(&self, request: &SignupRequest) -> Result<(), ClientError> {
        let mut state = self.state.lock().await;
        state.record("POST /auth/create-user/".into())?;
        let taken = state
            .accounts
            .values()
            .any(|a| a.profile.email.as_deref() == Some(request.email.as_str()));
        if taken {
            return Err(ClientError::rejected(400, "Email already registered"));
        }
        let id = UserId::new(state.next_user_id);
        state.next_user_id += 1;
        let profile = UserProfile {
            id,
            username: Some(request.username.clone()),
            email: Some(request.email.clone()),
            first_name: Some(request.first_name.clone()),
            last_name: Some(request.last_name.clone()),
            contact_number: Some(request.contact_number.clone()),
            gender: Some(request.gender.clone()),
            created_at: None,
            is_active: Some(true),
        };
        state.accounts.insert(
            id,
            Account {
                profile,
                password: request.password.clone(),
                is_admin: request.role == "admin",
            },
        );
        Ok(())
    }

    async fn login(&self, credentials: &Credentials) -> Result<SessionContext, ClientError> {
        let mut state = self.state.lock().await;
        state.record("POST /auth/login/".into())?;
        let account = state
            .accounts
            .values()
            .find(|a| a.profile.email.as_deref() == Some(credentials.email.as_str()))
            .ok_or_else(|| ClientError::rejected(404, "User not found"))?;
        if account.password != credentials.password {
            return Err(ClientError::rejected(403, "Invalid Credentials"));
        }
        let session = SessionContext::new(account.profile.id, account.is_admin);
        state.session = Some(session);
        Ok(session)
    }

    async fn logout(&self) -> Result<(), ClientError> {
        let mut state = self.state.lock().await;
        state.record("POST /auth/logout/".into())?;
        state.session = None;
        Ok(())
    }

    async fn forget_password(&self, email: &str) -> Result<(), ClientError> {
        let mut state = self.state.lock().await;
        state.record("POST /auth/forget-password".into())?;
        let known = state
            .accounts
            .values()
            .any(|a| a.profile.email.as_deref() == Some(email));
        if !known {
            return Err(ClientError::rejected(404, "User not found"));
        }
        let token = format!("reset-{}", state.reset_tokens.len() + 1);
        state.reset_tokens.insert(email.to_string(), token);
        Ok(())
    }

    async fn reset_password(&self, reset: &PasswordReset) -> Result<(), ClientError> {
        let mut state = self.state.lock().await;
        state.record("POST /auth/reset-password/".into())?;
        if state.reset_tokens.get(&reset.email) != Some(&reset.token) {
            return Err(ClientError::rejected(400, "Invalid reset token"));
        }
        state.reset_tokens.remove(&reset.email);
        let account = state
            .accounts
            .values_mut()
            .find(|a| a.profile.email.as_deref() == Some(reset.email.as_str()))
            .ok_or_else(|| ClientError::rejected(404, "User not found"))?;
        account.password = reset.password.clone();
        Ok(())
    }

    async fn change_password(&self, change: &PasswordChange) -> Result<(), ClientError> {
        let mut state = self.state.lock().await;
        state.record("POST /auth/change-password/".into())?;
        let session = state.session()?;
        let account = state
            .accounts
            .get_mut(&session.subject)
            .ok_or_else(|| ClientError::rejected(404, "User not found"))?;
        if account.password != change.old_password {
            return Err(ClientError::rejected(403, "Invalid old password"));
        }
        account.password = change.new_password.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Category, Filters};

    async fn backend_with_alice() -> (InMemoryBackend, UserId) {
        let backend = InMemoryBackend::new();
        let alice = backend.add_user("alice", "Alice", "Liddell", "Secret1!", false).await;
        backend
            .login(&Credentials {
                email: "alice@example.com".into(),
                password: "Secret1!".into(),
            })
            .await
            .unwrap();
        (backend, alice)
    }

    fn fields(title: &str) -> TaskFields {
        TaskFields {
            title: title.into(),
            ..TaskFields::default()
        }
    }

    fn plain(skip: u64, limit: u64) -> ListRequest {
        ListRequest {
            source: ListSource::Tasks,
            mode: ListMode::Plain,
            skip,
            limit,
        }
    }

    #[tokio::test]
    async fn list_paginates_and_reports_total() {
        let (backend, alice) = backend_with_alice().await;
        for i in 0..9 {
            backend.seed_task(alice, fields(&format!("task {i}"))).await;
        }

        let page = backend.list(&plain(8, 8)).await.unwrap();
        assert_eq!(page.tasks.len(), 1);
        assert_eq!(page.total, Some(9));
        assert_eq!(page.skip, Some(8));
    }

    #[tokio::test]
    async fn list_requires_session() {
        let backend = InMemoryBackend::new();
        let err = backend.list(&plain(0, 8)).await.unwrap_err();
        assert_eq!(err.status(), Some(401));
    }

    #[tokio::test]
    async fn filter_combines_predicates() {
        let (backend, alice) = backend_with_alice().await;
        backend
            .seed_task(
                alice,
                TaskFields {
                    category: Category::High,
                    ..fields("urgent")
                },
            )
            .await;
        let done = backend.seed_task(alice, fields("done")).await;
        backend.change_status(done, true).await.unwrap();

        let request = ListRequest {
            mode: ListMode::Filtering {
                filters: Filters {
                    status: Some(false),
                    category: Some(Category::High),
                    due_date: None,
                },
            },
            ..plain(0, 8)
        };
        let page = backend.list(&request).await.unwrap();
        assert_eq!(page.tasks.len(), 1);
        assert_eq!(page.tasks[0].title, "urgent");
    }

    #[tokio::test]
    async fn injected_failure_is_consumed_once() {
        let (backend, _) = backend_with_alice().await;
        backend
            .fail_next(InjectedFailure::Status(500, "boom".into()))
            .await;

        assert_eq!(backend.list(&plain(0, 8)).await.unwrap_err().status(), Some(500));
        assert!(backend.list(&plain(0, 8)).await.is_ok());
    }

    #[tokio::test]
    async fn non_admin_cannot_hard_delete() {
        let (backend, alice) = backend_with_alice().await;
        let id = backend.seed_task(alice, fields("mine")).await;

        assert_eq!(backend.delete(id).await.unwrap_err().status(), Some(403));
        backend.request_delete(id).await.unwrap();
        assert!(backend.task(id).await.unwrap().delete_request);
    }
}
