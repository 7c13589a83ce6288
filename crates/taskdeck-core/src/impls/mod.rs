//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **HttpBackend**: reqwest で REST API を叩く本番用実装
//! - **InMemoryBackend**: HTTP 契約をメモリ上で再現するテスト・デモ用実装

pub mod http;
pub mod memory;

// 主要な型を再エクスポート
pub use self::http::HttpBackend;
pub use self::memory::{InMemoryBackend, InjectedFailure};
