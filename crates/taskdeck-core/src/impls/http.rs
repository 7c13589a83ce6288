//! HttpBackend - reqwest による REST API クライアント
//!
//! セッションは cookie（サーバーが login で発行するトークン）で運ぶので、
//! `cookie_store(true)` の Client を 1 つだけ作って使い回す。
//!
//! # エラーの扱い
//! - non-2xx → `ClientError::Rejected`（`detail` を取り出す）
//! - タイムアウト → `ClientError::Timeout`
//! - 期待したフィールドが無い → `ClientError::UnexpectedShape`
//!
//! リトライはしない。

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::config::ClientConfig;
use crate::domain::{
    ClientError, Credentials, ListMode, ListSource, PasswordChange, PasswordReset, ProfileUpdate,
    SessionContext, SignupRequest, Task, TaskFields, TaskId, TaskPage, UserId, UserProfile,
    ValidationError,
};
use crate::ports::{AuthApi, ListRequest, TaskApi, UserApi};

#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    config: ClientConfig,
}

impl HttpBackend {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, self.config.api_url(path))
    }

    /// 送信して 2xx 以外を Rejected に変換する
    async fn send(&self, builder: RequestBuilder) -> Result<Response, ClientError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let detail = extract_detail(&body).unwrap_or_else(|| reason(status));
        tracing::debug!(status = status.as_u16(), %detail, "request rejected");
        Err(ClientError::rejected(status.as_u16(), detail))
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        let response = self.send(builder).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn send_unit(&self, builder: RequestBuilder) -> Result<(), ClientError> {
        self.send(builder).await.map(|_| ())
    }
}

/// 一覧リクエストのパスとクエリ
pub(crate) fn list_route(request: &ListRequest) -> Result<(&'static str, Vec<(&'static str, String)>), ClientError> {
    let mut params = Vec::new();
    let path = match (&request.mode, request.source) {
        (ListMode::Plain, ListSource::Tasks) => "/task/tasks/",
        (ListMode::Plain, ListSource::DeleteRequests) => "/task/delete-requested-tasks/",
        (ListMode::Searching { query }, source) => {
            params.push(("query", query.clone()));
            match source {
                ListSource::Tasks => "/task/search/",
                ListSource::DeleteRequests => "/task/search-delete-requested-tasks/",
            }
        }
        (ListMode::Filtering { filters }, ListSource::Tasks) => {
            if let Some(status) = filters.status {
                params.push(("task_status", status.to_string()));
            }
            if let Some(category) = filters.category {
                params.push(("category", category.as_str().to_string()));
            }
            if let Some(due) = filters.due_date {
                params.push(("due_date", due.format("%Y-%m-%d").to_string()));
            }
            "/task/filter/"
        }
        (ListMode::Filtering { .. }, ListSource::DeleteRequests) => {
            return Err(ValidationError::Unsupported("filtering").into());
        }
    };
    params.push(("skip", request.skip.to_string()));
    params.push(("limit", request.limit.to_string()));
    Ok((path, params))
}

/// エラーボディから表示用の detail を取り出す
///
/// - `{"detail": "..."}` → そのまま
/// - `{"detail": [{"msg": "..."}, ...]}`（422）→ msg を空白で連結
pub(crate) fn extract_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => {
            let msgs: Vec<String> = items
                .iter()
                .filter_map(|item| {
                    let msg = item.get("msg")?.as_str()?;
                    let field = item
                        .get("loc")
                        .and_then(Value::as_array)
                        .and_then(|loc| loc.last())
                        .and_then(Value::as_str);
                    Some(match field {
                        Some(field) => format!("{field}: {msg}"),
                        None => msg.to_string(),
                    })
                })
                .collect();
            (!msgs.is_empty()).then(|| msgs.join(" "))
        }
        other => Some(other.to_string()),
    }
}

fn reason(status: StatusCode) -> String {
    status
        .canonical_reason()
        .unwrap_or("Request failed")
        .to_string()
}

#[async_trait]
impl TaskApi for HttpBackend {
    async fn list(&self, request: &ListRequest) -> Result<TaskPage, ClientError> {
        let (path, params) = list_route(request)?;
        self.send_json(self.request(Method::GET, path).query(&params))
            .await
    }

    async fn create(&self, fields: &TaskFields) -> Result<Task, ClientError> {
        self.send_json(self.request(Method::POST, "/task/tasks/").json(fields))
            .await
    }

    async fn edit(&self, id: TaskId, fields: &TaskFields) -> Result<Task, ClientError> {
        let path = format!("/task/tasks/{}", id.get());
        self.send_json(self.request(Method::PUT, &path).json(fields))
            .await
    }

    async fn change_status(&self, id: TaskId, status: bool) -> Result<(), ClientError> {
        let path = format!("/task/change-status/{}", id.get());
        self.send_unit(self.request(Method::PUT, &path).json(&json!({ "status": status })))
            .await
    }

    async fn delete(&self, id: TaskId) -> Result<(), ClientError> {
        let path = format!("/task/tasks/{}", id.get());
        self.send_unit(self.request(Method::DELETE, &path)).await
    }

    async fn request_delete(&self, id: TaskId) -> Result<(), ClientError> {
        let path = format!("/task/task-delete-request/{}", id.get());
        self.send_unit(self.request(Method::PUT, &path)).await
    }
}

#[async_trait]
impl UserApi for HttpBackend {
    async fn get_user(&self, id: UserId) -> Result<UserProfile, ClientError> {
        let path = format!("/user/user/{}", id.get());
        self.send_json(self.request(Method::GET, &path)).await
    }

    async fn update_user(&self, id: UserId, update: &ProfileUpdate) -> Result<(), ClientError> {
        let path = format!("/user/user/{}", id.get());
        self.send_unit(self.request(Method::PUT, &path).json(update))
            .await
    }
}

#[async_trait]
impl AuthApi for HttpBackend {
    async fn signup(&self, request: &SignupRequest) -> Result<(), ClientError> {
        self.send_unit(self.request(Method::POST, "/auth/create-user/").json(request))
            .await
    }

    /// login だけ form で送る。他は JSON
    async fn login(&self, credentials: &Credentials) -> Result<SessionContext, ClientError> {
        self.send_json(self.request(Method::POST, "/auth/login/").form(credentials))
            .await
    }

    async fn logout(&self) -> Result<(), ClientError> {
        self.send_unit(self.request(Method::POST, "/auth/logout/"))
            .await
    }

    async fn forget_password(&self, email: &str) -> Result<(), ClientError> {
        self.send_unit(
            self.request(Method::POST, "/auth/forget-password")
                .json(&json!({ "email": email })),
        )
        .await
    }

    async fn reset_password(&self, reset: &PasswordReset) -> Result<(), ClientError> {
        self.send_unit(self.request(Method::POST, "/auth/reset-password/").json(reset))
            .await
    }

    async fn change_password(&self, change: &PasswordChange) -> Result<(), ClientError> {
        self.send_unit(self.request(Method::POST, "/auth/change-password/").json(change))
            .await
    }
}
