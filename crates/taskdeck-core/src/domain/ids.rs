//! Domain identifiers (strongly-typed IDs).
//!
//! バックエンドは整数の主キーをそのまま返すので、ID の実体は `i64` です。
//! Phantom type パターンで TaskId と UserId を別の型として扱い、
//! 「owner_id を task id として渡す」ような取り違えをコンパイル時に防ぎます。
//!
//! ## Phantom Type パターン
//! `Id<T>` というジェネリック型で共通実装を提供しつつ、
//! `T` は実行時には使わない（PhantomData）マーカー型として扱います。
//! JSON 上は素の数値（`12`）として読み書きします。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

/// IdMarker は各 ID 型のマーカー trait
///
/// Display で使うプレフィックス（"task-", "user-"）を提供します。
pub trait IdMarker: Send + Sync + 'static {
    /// Display で使うプレフィックス（例: "task-"）
    fn prefix() -> &'static str;
}

/// ジェネリック ID 型
///
/// # 例
/// ```ignore
/// let task_id = TaskId::new(12);
/// let owner_id = UserId::new(3);
/// // task_id と owner_id は異なる型なので、混同できない
/// ```
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id<T: IdMarker> {
    value: i64,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    pub const fn new(value: i64) -> Self {
        Self {
            value,
            _marker: PhantomData,
        }
    }

    /// URL パスやクエリに埋め込む生の値
    pub fn get(&self) -> i64 {
        self.value
    }
}

impl<T: IdMarker> From<i64> for Id<T> {
    fn from(value: i64) -> Self {
        Self::new(value)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.value)
    }
}

// ========================================
// マーカー型の定義
// ========================================

/// Task のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Task {}

impl IdMarker for Task {
    fn prefix() -> &'static str {
        "task-"
    }
}

/// User のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum User {}

impl IdMarker for User {
    fn prefix() -> &'static str {
        "user-"
    }
}

/// Identifier of a task card.
pub type TaskId = Id<Task>;

/// Identifier of an account (task owner, session subject).
pub type UserId = Id<User>;
