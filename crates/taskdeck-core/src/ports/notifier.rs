//! Notifier port - ワンショット通知の出口
//!
//! toast / alert の描画は外部の責務。ここには「出す」ことだけを渡す。

use std::sync::Mutex;

use crate::domain::{Notice, NoticeLevel};

pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// tracing に流すだけの Notifier
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Error => tracing::error!(title = %notice.title, "{}", notice.text),
            NoticeLevel::Warning => tracing::warn!(title = %notice.title, "{}", notice.text),
            NoticeLevel::Success => tracing::info!(title = %notice.title, "{}", notice.text),
        }
    }
}

/// 受け取った通知を溜めておく Notifier（テストと CLI の出力用）
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// 溜まった通知を取り出して空にする
    pub fn drain(&self) -> Vec<Notice> {
        match self.notices.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        match self.notices.lock() {
            Ok(mut guard) => guard.push(notice),
            Err(poisoned) => poisoned.into_inner().push(notice),
        }
    }
}
