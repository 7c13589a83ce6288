//! App - アプリケーション層
//!
//! このモジュールは、ports を組み合わせて画面ごとのロジックを実装します。
//!
//! # 主要コンポーネント
//! - **AppBuilder**: クライアントの構築とワイヤリング
//! - **ListQueryController**: ページング・検索・フィルタ付きの一覧
//! - **CardGrid**: カード表示と詳細 / 編集モーダルの状態機械
//! - **TaskMutationGateway**: タスクへの書き込み操作（成功したら reload を合図）
//! - **TaskBoard**: Home / Delete requests 画面の組み立て
//! - **AuthForms / ProfileEditor / CreateTaskForm**: フォーム
//! - **Route**: 画面とアクセス制御

pub mod auth_forms;
pub mod board;
pub mod builder;
pub mod card_grid;
pub mod create_task;
pub mod list_controller;
pub mod mutation_gateway;
pub mod owner_directory;
pub mod profile;
pub mod reload;
pub mod routes;

// 主要な型を再エクスポート
pub use self::auth_forms::{AuthForms, ChangePasswordForm, ResetPasswordForm, SignupForm};
pub use self::board::{BoardView, TaskBoard};
pub use self::builder::{App, AppBuilder, BuildError};
pub use self::card_grid::{CardActionError, CardGrid, CardView, DeleteOutcome};
pub use self::create_task::{CreateTaskForm, NewTask};
pub use self::list_controller::{FetchOutcome, ListQueryController, ListSnapshot};
pub use self::mutation_gateway::TaskMutationGateway;
pub use self::owner_directory::OwnerDirectory;
pub use self::profile::ProfileEditor;
pub use self::reload::{ReloadListener, ReloadSignal};
pub use self::routes::Route;
