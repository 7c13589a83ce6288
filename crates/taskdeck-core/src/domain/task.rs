//! Task model as exchanged with the task API.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::ids::{TaskId, UserId};

/// 優先度（フロントでは "Priority" と表示）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    #[serde(alias = "Low", alias = "LOW")]
    Low,
    #[serde(alias = "Medium", alias = "MEDIUM")]
    Medium,
    #[serde(alias = "High", alias = "HIGH")]
    High,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Low => "low",
            Category::Medium => "medium",
            Category::High => "high",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Category::Low),
            "medium" => Ok(Category::Medium),
            "high" => Ok(Category::High),
            other => Err(format!("unknown category: {other}")),
        }
    }
}

/// Task は一覧・詳細で扱うタスク 1 件
///
/// - `status`: true = complete
/// - `delete_request`: 一般ユーザーが削除申請済みかどうか（admin が処理する）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, with = "due_date")]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub status: bool,
    pub owner_id: UserId,
    #[serde(default)]
    pub delete_request: bool,
}

/// 作成・編集フォームから送るフィールド
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFields {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, with = "due_date")]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<UserId>,
}

/// 一覧系エンドポイントのレスポンス `{tasks, total, skip, limit}`
///
/// `tasks` が無いボディは UnexpectedShape として扱う（deserialize 失敗）。
/// total/skip/limit はリビジョンによって欠けることがあるので Option。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPage {
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub skip: Option<u64>,
    #[serde(default)]
    pub limit: Option<u64>,
}

/// due_date の (de)serialize
///
/// バックエンドは `datetime` を返すリビジョンと `date` を返すリビジョンがあるので、
/// どちらも受け付けて日付部分だけを保持する。出力は常に `YYYY-MM-DD`。
pub mod due_date {
    use chrono::{DateTime, NaiveDate, NaiveDateTime};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn parse(raw: &str) -> Option<NaiveDate> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return Some(date);
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.date_naive());
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
            return Some(dt.date());
        }
        None
    }

    pub fn serialize<S: Serializer>(value: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(date) => s.serialize_str(&date.format("%Y-%m-%d").to_string()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        match raw {
            None => Ok(None),
            Some(raw) if raw.trim().is_empty() => Ok(None),
            Some(raw) => parse(&raw)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid due_date: {raw}"))),
        }
    }
}
