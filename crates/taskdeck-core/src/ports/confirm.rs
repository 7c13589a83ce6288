//! Confirm port - 取り消せない操作の前の確認ダイアログ

use async_trait::async_trait;

/// 確認ダイアログの文言
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmPrompt {
    pub title: String,
    pub text: String,
    pub confirm_label: String,
}

impl ConfirmPrompt {
    pub fn hard_delete() -> Self {
        Self {
            title: "Are you sure?".into(),
            text: "Once deleted, you will not be able to recover this task!".into(),
            confirm_label: "Yes, delete it!".into(),
        }
    }
}

/// Confirm はユーザーに yes / no を尋ねる
#[async_trait]
pub trait Confirm: Send + Sync {
    async fn confirm(&self, prompt: &ConfirmPrompt) -> bool;
}

/// 常に同じ答えを返す（非対話モードとテスト用）
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

#[async_trait]
impl Confirm for FixedAnswer {
    async fn confirm(&self, _prompt: &ConfirmPrompt) -> bool {
        self.0
    }
}
