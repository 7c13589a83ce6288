//! Notice - ワンショットの通知（toast / alert 相当）
//!
//! 表示そのものは外部の責務。ここでは「何を出すか」だけを値として返す。

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub text: String,
}

impl Notice {
    pub fn success(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            title: title.into(),
            text: text.into(),
        }
    }

    pub fn error(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: title.into(),
            text: text.into(),
        }
    }

    pub fn warning(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            title: title.into(),
            text: text.into(),
        }
    }
}
