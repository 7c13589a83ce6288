//! ProfileEditor - ログイン中のユーザーのプロフィール編集

use std::sync::Arc;

use crate::domain::{ClientError, Notice, ProfileUpdate, SessionStore, UserProfile};
use crate::ports::UserApi;

pub struct ProfileEditor {
    api: Arc<dyn UserApi>,
    session: SessionStore,
    profile: Option<UserProfile>,
    draft: Option<ProfileUpdate>,
}

impl ProfileEditor {
    pub fn new(api: Arc<dyn UserApi>, session: SessionStore) -> Self {
        Self {
            api,
            session,
            profile: None,
            draft: None,
        }
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    pub fn draft(&self) -> Option<&ProfileUpdate> {
        self.draft.as_ref()
    }

    /// 現在のユーザーのプロフィールを読み込む
    pub async fn load(&mut self) -> Result<&UserProfile, ClientError> {
        let session = self
            .session
            .current()
            .ok_or_else(|| ClientError::rejected(401, "Unauthorized attempt"))?;
        let profile = self.api.get_user(session.subject).await?;
        Ok(self.profile.insert(profile))
    }

    /// 編集モーダルを開く（表示中のプロフィールから下書きを作る）
    pub fn begin_edit(&mut self) -> Option<&mut ProfileUpdate> {
        let draft = ProfileUpdate::from(self.profile.as_ref()?);
        Some(self.draft.insert(draft))
    }

    pub fn cancel_edit(&mut self) {
        self.draft = None;
    }

    /// 下書きを送信し、成功したら読み込み直す
    ///
    /// 成功・失敗どちらでもモーダルは閉じる（下書きは捨てる）。
    pub async fn submit(&mut self) -> Result<(), ClientError> {
        let Some(draft) = self.draft.take() else {
            return Ok(());
        };
        let session = self
            .session
            .current()
            .ok_or_else(|| ClientError::rejected(401, "Unauthorized attempt"))?;
        self.api.update_user(session.subject, &draft).await?;
        tracing::info!(subject = %session.subject, "profile updated");
        self.load().await?;
        Ok(())
    }
}

pub fn update_succeeded() -> Notice {
    Notice::success("Successfully updated the user details!", "")
}

/// 失敗通知。サーバーの detail があればそれを優先する
pub fn update_failed(err: &ClientError) -> Notice {
    let text = match err {
        ClientError::Rejected { detail, .. } if !detail.is_empty() => detail.clone(),
        ClientError::Rejected { status: 404, .. } => "User not found".to_string(),
        ClientError::Rejected { status: 401, .. } => "Unauthorized attempt".to_string(),
        ClientError::Rejected { status: 500, .. } => "Internal server error".to_string(),
        ClientError::Rejected { .. } => "Something went wrong!".to_string(),
        _ => "An unexpected error occurred.".to_string(),
    };
    Notice::error("Update Failed", text)
}
