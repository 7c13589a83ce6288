//! UserApi port - プロフィールの取得と更新

use async_trait::async_trait;

use crate::domain::{ClientError, ProfileUpdate, UserId, UserProfile};

#[async_trait]
pub trait UserApi: Send + Sync {
    /// `GET /user/user/{id}`（カードのオーナー名解決にも使う）
    async fn get_user(&self, id: UserId) -> Result<UserProfile, ClientError>;

    /// `PUT /user/user/{id}`
    async fn update_user(&self, id: UserId, update: &ProfileUpdate) -> Result<(), ClientError>;
}
