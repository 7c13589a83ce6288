//! Session - ログイン中の subject と admin フラグ
//!
//! 元のブラウザ版は cookie (`id`, `is_admin`) をどこからでも読み書きしていたが、
//! ここでは `SessionStore` をビューに明示的に渡す。
//! 書き込むのは login / logout / change-password だけ。

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Deserializer, Serialize};

use super::ids::UserId;

/// ログイン中のユーザー
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    #[serde(rename = "id")]
    pub subject: UserId,
    #[serde(deserialize_with = "flag_from_int")]
    pub is_admin: bool,
}

impl SessionContext {
    pub fn new(subject: UserId, is_admin: bool) -> Self {
        Self { subject, is_admin }
    }

    /// 編集できるのはオーナーか admin
    pub fn can_edit(&self, owner: UserId) -> bool {
        self.is_admin || self.subject == owner
    }
}

/// login レスポンスは `is_admin: 1 | 0`。bool で来ても受け付ける。
fn flag_from_int<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }
    Ok(match Flag::deserialize(d)? {
        Flag::Bool(b) => b,
        Flag::Int(i) => i == 1,
    })
}

/// SessionStore はセッションの唯一の置き場所
///
/// clone すると同じ中身を共有する（Arc）。
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<Option<SessionContext>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<SessionContext> {
        match self.inner.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.current().is_some()
    }

    pub(crate) fn establish(&self, session: SessionContext) {
        match self.inner.write() {
            Ok(mut guard) => *guard = Some(session),
            Err(poisoned) => *poisoned.into_inner() = Some(session),
        }
    }

    pub(crate) fn invalidate(&self) {
        match self.inner.write() {
            Ok(mut guard) => *guard = None,
            Err(poisoned) => *poisoned.into_inner() = None,
        }
    }
}

#[cfg(test)]
impl SessionStore {
    pub fn signed_in(session: SessionContext) -> Self {
        let store = Self::new();
        store.establish(session);
        store
    }
}
