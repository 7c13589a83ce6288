//! AuthApi port - アカウント作成・ログイン・パスワード系

use async_trait::async_trait;

use crate::domain::{
    ClientError, Credentials, PasswordChange, PasswordReset, SessionContext, SignupRequest,
};

#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn signup(&self, request: &SignupRequest) -> Result<(), ClientError>;

    /// 成功すると `{id, is_admin}` が返り、トークン cookie がセットされる
    async fn login(&self, credentials: &Credentials) -> Result<SessionContext, ClientError>;

    async fn logout(&self) -> Result<(), ClientError>;

    async fn forget_password(&self, email: &str) -> Result<(), ClientError>;

    async fn reset_password(&self, reset: &PasswordReset) -> Result<(), ClientError>;

    async fn change_password(&self, change: &PasswordChange) -> Result<(), ClientError>;
}
