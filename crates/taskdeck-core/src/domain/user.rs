//! Account / profile shapes used by the auth and user endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::UserId;

/// `GET /user/user/{id}` のレスポンス
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub contact_number: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl UserProfile {
    /// カードに表示するオーナー名
    ///
    /// "first last" → username → email の順にフォールバック
    pub fn display_name(&self) -> String {
        let full = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if !full.is_empty() {
            return full;
        }
        self.username
            .clone()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| self.email.clone())
            .unwrap_or_else(|| self.id.to_string())
    }
}

/// `PUT /user/user/{id}` のボディ
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub contact_number: String,
}

impl From<&UserProfile> for ProfileUpdate {
    fn from(profile: &UserProfile) -> Self {
        Self {
            username: profile.username.clone().unwrap_or_default(),
            first_name: profile.first_name.clone().unwrap_or_default(),
            last_name: profile.last_name.clone().unwrap_or_default(),
            contact_number: profile.contact_number.clone().unwrap_or_default(),
        }
    }
}

/// `POST /auth/create-user/` のボディ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub role: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub contact_number: String,
    pub gender: String,
}

/// `POST /auth/login/` のフォームフィールド
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// `POST /auth/reset-password/` のボディ
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PasswordReset {
    pub email: String,
    pub password: String,
    pub token: String,
}

/// `POST /auth/change-password/` のボディ
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PasswordChange {
    pub old_password: String,
    pub new_password: String,
}
