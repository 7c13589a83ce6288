//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! 各 trait は外部システム（REST API、時計、確認ダイアログ、通知表示）への
//! インターフェースを提供し、実装の詳細を隠蔽します。
//!
//! # 設計原則
//! - サーバーが正本（source of truth）。クライアントは表示用の状態だけを持つ
//! - I/O を伴うものは async trait（`Send + Sync` で Arc 共有できる）
//! - テストでは InMemoryBackend / FixedClock / FixedAnswer に差し替える

pub mod auth_api;
pub mod clock;
pub mod confirm;
pub mod notifier;
pub mod task_api;
pub mod user_api;

// 主要な trait を再エクスポート
pub use self::auth_api::AuthApi;
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::confirm::{Confirm, ConfirmPrompt, FixedAnswer};
pub use self::notifier::{Notifier, RecordingNotifier, TracingNotifier};
pub use self::task_api::{ListRequest, TaskApi};
pub use self::user_api::UserApi;
