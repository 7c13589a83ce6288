//! AppBuilder - クライアントの構築とワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）
//! - 開発体験の改善（明確なエラーメッセージ）

use std::sync::Arc;

use crate::config::ClientConfig;
use crate::domain::{ListSource, SessionStore};
use crate::impls::HttpBackend;
use crate::ports::{
    AuthApi, Clock, Confirm, FixedAnswer, Notifier, SystemClock, TaskApi, TracingNotifier, UserApi,
};

use super::auth_forms::AuthForms;
use super::board::TaskBoard;
use super::card_grid::CardGrid;
use super::create_task::CreateTaskForm;
use super::list_controller::ListQueryController;
use super::mutation_gateway::TaskMutationGateway;
use super::profile::ProfileEditor;
use super::reload::{ReloadListener, ReloadSignal};

/// AppBuilder はクライアントを構築
///
/// # 使用例
/// ```ignore
/// let backend = Arc::new(InMemoryBackend::new());
/// let app = AppBuilder::new()
///     .backend(backend)
///     .clock(Arc::new(FixedClock::new(today)))
///     .build()?;
/// ```
///
/// # Fail-fast 設計
/// - TaskApi / UserApi / AuthApi はどれも必須
/// - build() 時に足りないものを全部まとめて BuildError で返す
/// - Clock / Confirm / Notifier は省略するとデフォルト実装を使う
#[derive(Default)]
pub struct AppBuilder {
    config: Option<ClientConfig>,
    tasks: Option<Arc<dyn TaskApi>>,
    users: Option<Arc<dyn UserApi>>,
    auth: Option<Arc<dyn AuthApi>>,
    clock: Option<Arc<dyn Clock>>,
    confirm: Option<Arc<dyn Confirm>>,
    notifier: Option<Arc<dyn Notifier>>,
}

/// BuildError はクライアント構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Missing ports: {0:?}. These collaborators must be provided before build().")]
    MissingPorts(Vec<&'static str>),

    #[error("failed to create HTTP client: {0}")]
    Http(#[from] crate::domain::ClientError),
}

impl AppBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// 3 つの API をまとめて実装しているバックエンドを設定
    pub fn backend<B>(mut self, backend: Arc<B>) -> Self
    where
        B: TaskApi + UserApi + AuthApi + 'static,
    {
        self.tasks = Some(backend.clone());
        self.users = Some(backend.clone());
        self.auth = Some(backend);
        self
    }

    /// 設定から HttpBackend を作って使う
    pub fn http(self, config: ClientConfig) -> Result<Self, BuildError> {
        let backend = Arc::new(HttpBackend::new(config.clone())?);
        Ok(self.config(config).backend(backend))
    }

    pub fn task_api(mut self, api: Arc<dyn TaskApi>) -> Self {
        self.tasks = Some(api);
        self
    }

    pub fn user_api(mut self, api: Arc<dyn UserApi>) -> Self {
        self.users = Some(api);
        self
    }

    pub fn auth_api(mut self, api: Arc<dyn AuthApi>) -> Self {
        self.auth = Some(api);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn confirm(mut self, confirm: Arc<dyn Confirm>) -> Self {
        self.confirm = Some(confirm);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// # 検証
    /// - TaskApi / UserApi / AuthApi が全て設定されているかチェック
    /// - 不足があれば BuildError::MissingPorts を返す
    pub fn build(self) -> Result<App, BuildError> {
        let mut missing = Vec::new();
        if self.tasks.is_none() {
            missing.push("TaskApi");
        }
        if self.users.is_none() {
            missing.push("UserApi");
        }
        if self.auth.is_none() {
            missing.push("AuthApi");
        }
        let (Some(tasks), Some(users), Some(auth)) = (self.tasks, self.users, self.auth) else {
            return Err(BuildError::MissingPorts(missing));
        };

        let (reload, _) = ReloadSignal::new();
        Ok(App {
            config: self.config.unwrap_or_default(),
            session: SessionStore::new(),
            tasks,
            users,
            auth,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            // 確認 UI が無い環境では、ハード削除は常にキャンセル扱い
            confirm: self.confirm.unwrap_or_else(|| Arc::new(FixedAnswer(false))),
            notifier: self.notifier.unwrap_or_else(|| Arc::new(TracingNotifier)),
            reload,
        })
    }
}

/// App は組み立て済みのクライアント
///
/// セッションと reload の合図はここで 1 つだけ持ち、各画面に配る。
pub struct App {
    config: ClientConfig,
    session: SessionStore,
    tasks: Arc<dyn TaskApi>,
    users: Arc<dyn UserApi>,
    auth: Arc<dyn AuthApi>,
    clock: Arc<dyn Clock>,
    confirm: Arc<dyn Confirm>,
    notifier: Arc<dyn Notifier>,
    reload: ReloadSignal,
}

impl App {
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn notifier(&self) -> Arc<dyn Notifier> {
        Arc::clone(&self.notifier)
    }

    pub fn gateway(&self) -> TaskMutationGateway {
        TaskMutationGateway::new(Arc::clone(&self.tasks), self.reload.clone())
    }

    pub fn subscribe_reload(&self) -> ReloadListener {
        self.reload.subscribe()
    }

    pub fn auth_forms(&self) -> AuthForms {
        AuthForms::new(Arc::clone(&self.auth), self.session.clone())
    }

    pub fn profile_editor(&self) -> ProfileEditor {
        ProfileEditor::new(Arc::clone(&self.users), self.session.clone())
    }

    pub fn create_task_form(&self) -> CreateTaskForm {
        CreateTaskForm::new(self.gateway(), Arc::clone(&self.clock))
    }

    /// Home 画面
    pub fn home_board(&self) -> TaskBoard {
        self.board(ListSource::Tasks)
    }

    /// Delete requests 画面（admin 用）
    pub fn delete_requests_board(&self) -> TaskBoard {
        self.board(ListSource::DeleteRequests)
    }

    fn board(&self, source: ListSource) -> TaskBoard {
        let list = ListQueryController::new(Arc::clone(&self.tasks), source, self.config.page_limit);
        let grid = CardGrid::new(
            self.gateway(),
            Arc::clone(&self.users),
            Arc::clone(&self.clock),
            Arc::clone(&self.confirm),
            self.session.clone(),
        );
        TaskBoard::new(list, grid, self.subscribe_reload(), self.notifier())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::InMemoryBackend;

    #[test]
    fn test_build_success() {
        let app = AppBuilder::new()
            .backend(Arc::new(InMemoryBackend::new()))
            .build();
        assert!(app.is_ok());
    }

    #[test]
    fn test_build_missing_ports() {
        let app = AppBuilder::new()
            .user_api(Arc::new(InMemoryBackend::new()))
            .build();
        assert!(matches!(
            app,
            Err(BuildError::MissingPorts(missing)) if missing == vec!["TaskApi", "AuthApi"]
        ));
    }

    #[tokio::test]
    async fn test_http_builder_uses_config() {
        let config = ClientConfig::default().with_page_limit(4);
        let app = AppBuilder::new().http(config).unwrap().build().unwrap();
        assert_eq!(app.config().page_limit, 4);
        assert_eq!(app.home_board().list().query().await.limit, 4);
    }

    #[tokio::test]
    async fn test_boards_share_session_and_reload() {
        let backend = Arc::new(InMemoryBackend::new());
        backend.add_user("alice", "Alice", "L", "Secret1!", false).await;
        let app = AppBuilder::new().backend(backend).build().unwrap();

        app.auth_forms()
            .login("alice@example.com", "Secret1!")
            .await
            .unwrap();
        assert!(app.session().is_signed_in());

        let mut listener = app.subscribe_reload();
        app.create_task_form()
            .submit(&crate::app::create_task::NewTask::titled("shared"))
            .await
            .unwrap();
        assert!(listener.take_pending());
    }
}
