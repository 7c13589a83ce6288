//! taskdeck-core
//!
//! タスク管理 REST API のクライアント側ロジック（表示層を持たない）。
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, task, user, session, list_query, card, validation, errors）
//! - **ports**: 抽象化レイヤー（TaskApi, UserApi, AuthApi, Clock, Confirm, Notifier）
//! - **app**: アプリケーションロジック（一覧コントローラー、カード状態機械、gateway、フォーム）
//! - **impls**: 実装（HttpBackend, InMemoryBackend）
//! - **config**: 接続先・タイムアウト・ページ件数

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod ports;

pub use app::{App, AppBuilder, BuildError};
pub use config::{ClientConfig, ConfigError};
