//! AuthForms - ログイン・登録・パスワード系のフォーム
//!
//! どのフォームも「クライアント側の検証 → 1 リクエスト」。
//! 検証エラーは `ClientError::Validation` としてネットワークに出る前に返す。
//!
//! セッションを書き換えるのはここだけ:
//! - login 成功 → `SessionStore` に保存
//! - logout / change-password 成功 → 破棄（再ログインが必要）

use std::sync::Arc;

use crate::domain::validation;
use crate::domain::{
    ClientError, Credentials, Notice, PasswordChange, PasswordReset, SessionContext, SessionStore,
    SignupRequest,
};
use crate::ports::AuthApi;

/// 登録フォームの入力
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignupForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub contact_number: String,
    pub gender: String,
}

/// リセットリンクから開くフォーム（email と token は URL から来る）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResetPasswordForm {
    pub email: String,
    pub token: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangePasswordForm {
    pub old_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

pub struct AuthForms {
    api: Arc<dyn AuthApi>,
    session: SessionStore,
}

impl AuthForms {
    pub fn new(api: Arc<dyn AuthApi>, session: SessionStore) -> Self {
        Self { api, session }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<SessionContext, ClientError> {
        validation::email(email)?;
        validation::password_min("Password", password)?;

        let session = self
            .api
            .login(&Credentials {
                email: email.to_string(),
                password: password.to_string(),
            })
            .await?;
        self.session.establish(session);
        tracing::info!(subject = %session.subject, is_admin = session.is_admin, "signed in");
        Ok(session)
    }

    /// 新規登録。role は常に "user"
    pub async fn signup(&self, form: &SignupForm) -> Result<(), ClientError> {
        validation::require("Username", &form.username)?;
        validation::email(&form.email)?;
        validation::strong_password(&form.password)?;
        validation::bangladeshi_phone(&form.contact_number)?;

        let request = SignupRequest {
            email: form.email.clone(),
            password: form.password.clone(),
            role: "user".to_string(),
            username: form.username.clone(),
            first_name: form.first_name.clone(),
            last_name: form.last_name.clone(),
            contact_number: form.contact_number.clone(),
            gender: form.gender.clone(),
        };
        self.api.signup(&request).await
    }

    pub async fn forget_password(&self, email: &str) -> Result<(), ClientError> {
        validation::email(email)?;
        self.api.forget_password(email).await
    }

    pub async fn reset_password(&self, form: &ResetPasswordForm) -> Result<(), ClientError> {
        validation::strong_password(&form.password)?;
        validation::confirmation(&form.password, &form.confirm_password)?;

        self.api
            .reset_password(&PasswordReset {
                email: form.email.clone(),
                password: form.password.clone(),
                token: form.token.clone(),
            })
            .await
    }

    /// 成功したらセッションを破棄する
    pub async fn change_password(&self, form: &ChangePasswordForm) -> Result<(), ClientError> {
        validation::password_min("Password", &form.old_password)?;
        validation::password_min("Password", &form.new_password)?;
        validation::confirmation(&form.new_password, &form.confirm_password)?;

        self.api
            .change_password(&PasswordChange {
                old_password: form.old_password.clone(),
                new_password: form.new_password.clone(),
            })
            .await?;
        self.session.invalidate();
        tracing::info!("password changed, session cleared");
        Ok(())
    }

    /// リクエストが失敗してもローカルのセッションは破棄する
    pub async fn logout(&self) -> Result<(), ClientError> {
        let result = self.api.logout().await;
        self.session.invalidate();
        if let Err(err) = &result {
            tracing::warn!(error = %err, "logout request failed");
        }
        result
    }
}

/// フォームごとの成功通知
pub mod notices {
    use super::*;

    pub fn login_succeeded() -> Notice {
        Notice::success("Login successful!", "")
    }

    pub fn signup_succeeded() -> Notice {
        Notice::success("Please Verify your account via the email!", "")
    }

    pub fn reset_link_sent() -> Notice {
        Notice::success("Reset link has been sent to this email!", "")
    }

    pub fn password_reset() -> Notice {
        Notice::success("successfully reset the password!", "")
    }

    pub fn password_changed() -> Notice {
        Notice::success("Successfully changed the password!", "")
    }

    /// フォーム系の失敗通知（サーバーの detail をそのまま見せる）
    pub fn failed(title: &str, err: &ClientError) -> Notice {
        match err {
            ClientError::Validation(v) => Notice::error(v.title(), v.to_string()),
            ClientError::Rejected { status: 403, .. } if title == "Change Password Failed" => {
                Notice::error(title, "Invalid old password")
            }
            ClientError::Rejected { detail, .. } if !detail.is_empty() => {
                Notice::error(title, detail.clone())
            }
            _ => Notice::error(title, "Something went wrong!"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ValidationError;
    use crate::impls::InMemoryBackend;
    use rstest::rstest;

    async fn forms() -> (Arc<InMemoryBackend>, AuthForms) {
        let backend = Arc::new(InMemoryBackend::new());
        backend.add_user("alice", "Alice", "Liddell", "Secret1!", false).await;
        let forms = AuthForms::new(backend.clone(), SessionStore::new());
        (backend, forms)
    }

    #[rstest]
    #[case::blank_email("", "Secret1!", ValidationError::Required { field: "Email Address" })]
    #[case::bad_email("alice", "Secret1!", ValidationError::InvalidEmail)]
    #[case::blank_password("a@b.co", "   ", ValidationError::Required { field: "Password" })]
    #[case::short_password("a@b.co", " abc ", ValidationError::PasswordTooShort { min: 4 })]
    #[tokio::test]
    async fn login_validates_before_request(
        #[case] email: &str,
        #[case] password: &str,
        #[case] expected: ValidationError,
    ) {
        let (backend, forms) = forms().await;
        let err = forms.login(email, password).await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(v) if v == expected));
        assert!(backend.calls().await.is_empty());
    }

    #[tokio::test]
    async fn login_establishes_session_and_logout_clears_it() {
        let (backend, forms) = forms().await;
        let session = forms.login("alice@example.com", "Secret1!").await.unwrap();
        assert_eq!(forms.session().current(), Some(session));

        backend
            .fail_next(crate::impls::InjectedFailure::Network)
            .await;
        assert!(forms.logout().await.is_err());
        assert!(!forms.session().is_signed_in());
    }

    #[tokio::test]
    async fn wrong_password_is_rejected_by_server() {
        let (_, forms) = forms().await;
        let err = forms.login("alice@example.com", "nope!").await.unwrap_err();
        assert_eq!(err.status(), Some(403));
        assert!(!forms.session().is_signed_in());
    }

    #[tokio::test]
    async fn signup_enforces_strong_password_and_phone() {
        let (backend, forms) = forms().await;
        let mut form = SignupForm {
            username: "bob".into(),
            email: "bob@example.com".into(),
            password: "weak".into(),
            first_name: "Bob".into(),
            last_name: "B".into(),
            contact_number: "01712345678".into(),
            gender: "male".into(),
        };
        assert!(matches!(
            forms.signup(&form).await,
            Err(ClientError::Validation(ValidationError::WeakPassword))
        ));

        form.password = "Str0ng!pw".into();
        form.contact_number = "12345".into();
        assert!(matches!(
            forms.signup(&form).await,
            Err(ClientError::Validation(ValidationError::InvalidPhoneNumber))
        ));
        assert!(backend.calls().await.is_empty());

        form.contact_number = "+8801712345678".into();
        forms.signup(&form).await.unwrap();
        forms.login("bob@example.com", "Str0ng!pw").await.unwrap();
        assert!(!forms.session().current().unwrap().is_admin);
    }

    #[tokio::test]
    async fn reset_flow_uses_issued_token() {
        let (backend, forms) = forms().await;
        forms.forget_password("alice@example.com").await.unwrap();
        let token = backend.reset_token("alice@example.com").await.unwrap();

        let mut form = ResetPasswordForm {
            email: "alice@example.com".into(),
            token,
            password: "N3w!passw".into(),
            confirm_password: "N3w!passx".into(),
        };
        assert!(matches!(
            forms.reset_password(&form).await,
            Err(ClientError::Validation(ValidationError::PasswordMismatch))
        ));

        form.confirm_password = form.password.clone();
        forms.reset_password(&form).await.unwrap();
        forms.login("alice@example.com", "N3w!passw").await.unwrap();
    }

    #[tokio::test]
    async fn change_password_signs_out() {
        let (_, forms) = forms().await;
        forms.login("alice@example.com", "Secret1!").await.unwrap();

        let form = ChangePasswordForm {
            old_password: "wrong".into(),
            new_password: "fresh".into(),
            confirm_password: "fresh".into(),
        };
        let err = forms.change_password(&form).await.unwrap_err();
        assert_eq!(
            notices::failed("Change Password Failed", &err).text,
            "Invalid old password"
        );
        assert!(forms.session().is_signed_in());

        let form = ChangePasswordForm {
            old_password: "Secret1!".into(),
            ..form
        };
        forms.change_password(&form).await.unwrap();
        assert!(!forms.session().is_signed_in());
    }
}
