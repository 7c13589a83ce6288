//! Errors - エラー型と分類
//!
//! # 分類
//! - Validation: クライアント側の検証エラー（ネットワークに出る前に止める）
//! - Rejected: non-2xx + `detail`（ステータスごとにメッセージを出し分け）
//! - Network: fetch 自体が失敗（接続不可など）
//! - Timeout: クライアント側のタイムアウト
//! - UnexpectedShape: レスポンスに期待したフィールドが無い
//!
//! どのエラーも呼び出し側で捕まえて 1 回だけ通知する。
//! 一覧やページングの状態は変更しない。

use thiserror::Error;

use super::notice::Notice;

/// ValidationError はフォーム内で完結するエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: &'static str },

    #[error("Invalid email format")]
    InvalidEmail,

    #[error("Password must be at least {min} characters long")]
    PasswordTooShort { min: usize },

    #[error(
        "Password must be at least 8 characters long and include an uppercase letter, a lowercase letter, a number, and a special character"
    )]
    WeakPassword,

    #[error("Password and Confirm Password do not match")]
    PasswordMismatch,

    #[error("Please enter a valid Bangladeshi phone number")]
    InvalidPhoneNumber,

    #[error("Due date cannot be a past date. Please select a valid date.")]
    PastDueDate,

    #[error("search query is empty")]
    EmptySearch,

    #[error("{0} is not available for this list")]
    Unsupported(&'static str),
}

impl ValidationError {
    pub fn title(&self) -> &'static str {
        match self {
            ValidationError::InvalidEmail => "Invalid Email",
            ValidationError::PasswordTooShort { .. }
            | ValidationError::WeakPassword
            | ValidationError::PasswordMismatch => "Invalid Password",
            ValidationError::InvalidPhoneNumber => "Invalid Phone Number",
            ValidationError::PastDueDate => "Invalid Due Date",
            _ => "Invalid Input",
        }
    }
}

/// ClientError は API 呼び出しの結果として起こりうるエラー
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("request rejected with status {status}: {detail}")]
    Rejected { status: u16, detail: String },

    #[error("network failure: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("unexpected response shape: {0}")]
    UnexpectedShape(String),
}

impl ClientError {
    pub fn rejected(status: u16, detail: impl Into<String>) -> Self {
        ClientError::Rejected {
            status,
            detail: detail.into(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn detail(&self) -> Option<&str> {
        match self {
            ClientError::Rejected { detail, .. } => Some(detail.as_str()),
            _ => None,
        }
    }

    /// タスク操作の失敗をユーザー向けの通知に変換
    ///
    /// `action` は汎用メッセージに埋め込む動詞（"edit", "delete" など）
    pub fn notice(&self, action: &str) -> Notice {
        let generic = format!("Failed to {action} the task. Please try again later.");
        match self {
            ClientError::Validation(v) => Notice::error(v.title(), v.to_string()),
            ClientError::Rejected { status: 422, detail } => Notice::error(
                "Validation Error",
                if detail.contains("due_date") {
                    "Due date must be greater than the current date."
                } else {
                    "Invalid data. Please check your input and try again."
                },
            ),
            ClientError::Rejected { status: 404, .. } => {
                Notice::error("Not Found", "Task not found.")
            }
            ClientError::Rejected { status: 401, .. } => Notice::error(
                "Unauthorized",
                "You do not have permission to update this resource.",
            ),
            ClientError::Rejected { status: 403, detail } => Notice::error(
                "Forbidden",
                if detail.is_empty() {
                    "You are not allowed to do that.".to_string()
                } else {
                    detail.clone()
                },
            ),
            ClientError::Rejected { status: 304, .. } => Notice::error(
                "Not Modified",
                "Task could not be updated. Please try again later.",
            ),
            _ => Notice::error("Oops...", generic),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ClientError::Timeout
        } else if e.is_decode() {
            ClientError::UnexpectedShape(e.to_string())
        } else {
            ClientError::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::UnexpectedShape(e.to_string())
    }
}
