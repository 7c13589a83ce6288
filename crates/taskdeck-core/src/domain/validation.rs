//! Client-side form rules.
//!
//! どれもネットワークに出る前に評価する純粋関数。

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use super::errors::ValidationError;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\S+@\S+\.\S+").expect("static regex"));

static BD_PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\+?88|0088)?01[3-9]\d{8}$").expect("static regex"));

const SPECIAL_CHARS: &str = "!@#$%^&*(),.?\":{}|<>";

/// ログイン・パスワード変更で使う最小長（trim 後）
pub const MIN_PASSWORD_LEN: usize = 4;

/// 強いパスワードの最小長
pub const STRONG_PASSWORD_LEN: usize = 8;

pub fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required { field });
    }
    Ok(())
}

pub fn email(value: &str) -> Result<(), ValidationError> {
    require("Email Address", value)?;
    if !EMAIL.is_match(value) {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(())
}

pub fn password_min(field: &'static str, value: &str) -> Result<(), ValidationError> {
    require(field, value)?;
    if value.trim().chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort {
            min: MIN_PASSWORD_LEN,
        });
    }
    Ok(())
}

/// 8 文字以上、大文字・小文字・数字・記号をそれぞれ 1 つ以上
pub fn strong_password(value: &str) -> Result<(), ValidationError> {
    let long_enough = value.chars().count() >= STRONG_PASSWORD_LEN;
    let upper = value.chars().any(|c| c.is_ascii_uppercase());
    let lower = value.chars().any(|c| c.is_ascii_lowercase());
    let digit = value.chars().any(|c| c.is_ascii_digit());
    let special = value.chars().any(|c| SPECIAL_CHARS.contains(c));
    if long_enough && upper && lower && digit && special {
        Ok(())
    } else {
        Err(ValidationError::WeakPassword)
    }
}

pub fn confirmation(password: &str, confirm: &str) -> Result<(), ValidationError> {
    if password != confirm {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(())
}

pub fn bangladeshi_phone(value: &str) -> Result<(), ValidationError> {
    if !BD_PHONE.is_match(value) {
        return Err(ValidationError::InvalidPhoneNumber);
    }
    Ok(())
}

/// 期限日は今日以降（ローカル日付で比較、時刻は見ない）
pub fn due_date(value: Option<NaiveDate>, today: NaiveDate) -> Result<(), ValidationError> {
    match value {
        Some(date) if date < today => Err(ValidationError::PastDueDate),
        _ => Ok(()),
    }
}
