//! CreateTaskForm - 新規タスクの作成フォーム

use std::sync::Arc;

use chrono::NaiveDate;

use crate::domain::validation;
use crate::domain::{Category, ClientError, Notice, Task, TaskFields};
use crate::ports::Clock;

use super::mutation_gateway::TaskMutationGateway;

/// フォームの入力値（category の既定は Low）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub due_date: Option<NaiveDate>,
    pub category: Category,
}

impl NewTask {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    fn to_fields(&self) -> TaskFields {
        TaskFields {
            title: self.title.trim().to_string(),
            description: Some(self.description.trim().to_string()).filter(|d| !d.is_empty()),
            due_date: self.due_date,
            category: self.category,
            owner_id: None,
        }
    }
}

pub struct CreateTaskForm {
    gateway: TaskMutationGateway,
    clock: Arc<dyn Clock>,
}

impl CreateTaskForm {
    pub fn new(gateway: TaskMutationGateway, clock: Arc<dyn Clock>) -> Self {
        Self { gateway, clock }
    }

    /// 検証してから作成する。成功すると一覧の reload が合図される
    pub async fn submit(&self, input: &NewTask) -> Result<Task, ClientError> {
        validation::require("Title", &input.title)?;
        validation::due_date(input.due_date, self.clock.today())?;
        self.gateway.create(&input.to_fields()).await
    }
}

pub fn created(task: &Task) -> Notice {
    Notice::success("Task Created Successfully!", format!("Task ID: {}", task.id.get()))
}
