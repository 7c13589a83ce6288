//! OwnerDirectory - 表示中のタスクのオーナー名を引く
//!
//! ページが変わるたびに、そのページに出てくる owner_id の集合だけを並列に取り直す。
//! 1 件でも失敗したらバッチ全体を捨てて、前の内容を残す（名前が半分だけ出る状態を作らない）。
//! キーは「リクエストした id」。レスポンスの id は信用しない。

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use futures::future::try_join_all;

use crate::domain::{ClientError, Task, UserId, UserProfile};
use crate::ports::UserApi;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnerDirectory {
    owners: HashMap<UserId, UserProfile>,
}

impl OwnerDirectory {
    pub fn get(&self, id: UserId) -> Option<&UserProfile> {
        self.owners.get(&id)
    }

    /// 見つからなければ id をそのまま表示名にする
    pub fn display_name(&self, id: UserId) -> String {
        self.get(id)
            .map(UserProfile::display_name)
            .unwrap_or_else(|| id.to_string())
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    /// 指定した owner を全員引けるか
    pub fn covers(&self, ids: &BTreeSet<UserId>) -> bool {
        ids.iter().all(|id| self.owners.contains_key(id))
    }
}

/// タスク一覧に出てくる owner_id（重複なし）
pub fn distinct_owners(tasks: &[Task]) -> BTreeSet<UserId> {
    tasks.iter().map(|t| t.owner_id).collect()
}

/// distinct な owner ごとに 1 回ずつ、並列に取得する
///
/// 全件そろったときだけ新しい `OwnerDirectory` を返す。
pub async fn resolve_owners(
    users: &Arc<dyn UserApi>,
    tasks: &[Task],
) -> Result<OwnerDirectory, ClientError> {
    let ids = distinct_owners(tasks);
    let lookups = ids.iter().map(|&id| {
        let users = Arc::clone(users);
        async move { users.get_user(id).await.map(|profile| (id, profile)) }
    });

    let owners = try_join_all(lookups).await?.into_iter().collect();
    Ok(OwnerDirectory { owners })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Category, TaskId};
    use crate::impls::{InMemoryBackend, InjectedFailure};
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn task(id: i64, owner: i64) -> Task {
        Task {
            id: TaskId::new(id),
            title: format!("t{id}"),
            description: None,
            due_date: None,
            category: Category::Low,
            status: false,
            owner_id: UserId::new(owner),
            delete_request: false,
        }
    }

    /// 呼ばれた id を記録し、わざと別の id のプロフィールを返す
    #[derive(Default)]
    struct MislabeledUsers {
        requested: Mutex<Vec<UserId>>,
    }

    #[async_trait]
    impl UserApi for MislabeledUsers {
        async fn get_user(&self, id: UserId) -> Result<UserProfile, ClientError> {
            self.requested.lock().unwrap().push(id);
            Ok(UserProfile {
                id: UserId::new(id.get() + 100),
                username: Some(format!("u{}", id.get())),
                email: None,
                first_name: None,
                last_name: None,
                contact_number: None,
                gender: None,
                created_at: None,
                is_active: None,
            })
        }

        async fn update_user(&self, _: UserId, _: &crate::domain::ProfileUpdate) -> Result<(), ClientError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn each_owner_is_fetched_once_and_keyed_by_request() {
        let api = Arc::new(MislabeledUsers::default());
        let users: Arc<dyn UserApi> = api.clone();
        let tasks = vec![task(1, 1), task(2, 2), task(3, 1), task(4, 3), task(5, 2)];

        let directory = resolve_owners(&users, &tasks).await.unwrap();

        let mut requested = api.requested.lock().unwrap().clone();
        requested.sort();
        assert_eq!(requested, vec![UserId::new(1), UserId::new(2), UserId::new(3)]);
        assert_eq!(directory.len(), 3);
        assert_eq!(directory.display_name(UserId::new(2)), "u2");
        assert!(directory.get(UserId::new(102)).is_none());
    }

    #[tokio::test]
    async fn one_failure_discards_the_batch() {
        let backend = InMemoryBackend::new();
        let a = backend.add_user("a", "Ann", "A", "Secret1!", false).await;
        let b = backend.add_user("b", "Bob", "B", "Secret1!", false).await;
        backend
            .fail_next(InjectedFailure::Status(500, "boom".into()))
            .await;
        let users: Arc<dyn UserApi> = Arc::new(backend);

        let tasks = vec![task(1, a.get()), task(2, b.get())];
        assert!(resolve_owners(&users, &tasks).await.is_err());

        let directory = resolve_owners(&users, &tasks).await.unwrap();
        assert_eq!(directory.display_name(a), "Ann A");
        assert_eq!(directory.display_name(b), "Bob B");
    }

    #[tokio::test]
    async fn empty_page_needs_no_requests() {
        let users: Arc<dyn UserApi> = Arc::new(MislabeledUsers::default());
        let directory = resolve_owners(&users, &[]).await.unwrap();
        assert!(directory.is_empty());
    }
}
