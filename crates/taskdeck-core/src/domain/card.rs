//! Card - タスクカードの表示状態と詳細モーダルの状態機械
//!
//! # 状態遷移
//! ```text
//! closed --open--> viewing --begin_edit--> editing
//!    ^                |                       |
//!    +-----close------+-------close/save------+
//! ```
//! - viewing に入るときに draft をタスクから作っておく（editing への遷移は追加コストなし）
//! - close はどの状態からでも draft を捨てる
//!
//! バッジは (status, due_date, today) だけで決まる純粋関数。保存しない。

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::errors::ValidationError;
use super::ids::TaskId;
use super::session::SessionContext;
use super::task::{Category, Task, TaskFields};
use super::validation;

/// カードのバッジ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardBadge {
    Complete,
    Overdue,
    Pending,
}

impl CardBadge {
    pub fn of(status: bool, due_date: Option<NaiveDate>, today: NaiveDate) -> Self {
        if status {
            return CardBadge::Complete;
        }
        match due_date {
            Some(due) if due < today => CardBadge::Overdue,
            _ => CardBadge::Pending,
        }
    }

    pub fn for_task(task: &Task, today: NaiveDate) -> Self {
        Self::of(task.status, task.due_date, today)
    }
}

/// 詳細モーダルのモード
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardMode {
    #[default]
    Closed,
    Viewing,
    Editing,
}

/// 削除ボタンが何をするか
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteAffordance {
    /// admin: 確認ダイアログ付きのハード削除
    HardDelete,
    /// 一般ユーザー: 削除申請
    RequestDelete,
    /// 申請済みなので出さない
    Hidden,
}

impl DeleteAffordance {
    pub fn for_task(task: &Task, session: &SessionContext) -> Self {
        if session.is_admin {
            DeleteAffordance::HardDelete
        } else if task.delete_request {
            DeleteAffordance::Hidden
        } else {
            DeleteAffordance::RequestDelete
        }
    }
}

/// 完了ボタンを出すかどうか
///
/// 未完了で、期限が今日以降（期限なしも完了できる）
pub fn can_complete(task: &Task, today: NaiveDate) -> bool {
    !task.status && task.due_date.is_none_or(|due| due >= today)
}

/// 編集中の下書き
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardDraft {
    pub title: String,
    pub description: String,
    pub due_date: Option<NaiveDate>,
    pub category: Category,
}

impl CardDraft {
    pub fn from_task(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone().unwrap_or_default(),
            due_date: task.due_date,
            category: task.category,
        }
    }

    pub fn to_fields(&self, task: &Task) -> TaskFields {
        TaskFields {
            title: self.title.clone(),
            description: Some(self.description.clone()).filter(|d| !d.is_empty()),
            due_date: self.due_date,
            category: self.category,
            owner_id: Some(task.owner_id),
        }
    }
}

/// CardError は状態機械の不正な操作
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CardError {
    #[error("no card is selected")]
    NothingSelected,

    #[error("card is {actual:?}, expected {expected:?}")]
    WrongMode { expected: CardMode, actual: CardMode },

    #[error("only the owner or an admin can edit {0}")]
    NotPermitted(TaskId),

    #[error("this action is not available for {0}")]
    Unavailable(TaskId),

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// SelectedCardState は 1 枚のカードの詳細 / 編集状態
///
/// 遷移はメソッド経由のみ（フィールドは読み取り専用で公開）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectedCardState {
    card: Option<Task>,
    mode: CardMode,
    draft: Option<CardDraft>,
}

impl SelectedCardState {
    pub fn card(&self) -> Option<&Task> {
        self.card.as_ref()
    }

    pub fn mode(&self) -> CardMode {
        self.mode
    }

    /// editing 中だけ意味を持つ
    pub fn draft(&self) -> Option<&CardDraft> {
        match self.mode {
            CardMode::Editing => self.draft.as_ref(),
            _ => None,
        }
    }

    /// closed / viewing → viewing（別カードのクリックは選択し直し）
    pub fn open(&mut self, task: Task) -> Result<(), CardError> {
        if self.mode == CardMode::Editing {
            return Err(CardError::WrongMode {
                expected: CardMode::Viewing,
                actual: self.mode,
            });
        }
        self.draft = Some(CardDraft::from_task(&task));
        self.card = Some(task);
        self.mode = CardMode::Viewing;
        Ok(())
    }

    /// viewing → editing（オーナーか admin のみ）
    pub fn begin_edit(&mut self, session: &SessionContext) -> Result<(), CardError> {
        let card = self.expect_mode(CardMode::Viewing)?;
        if !session.can_edit(card.owner_id) {
            return Err(CardError::NotPermitted(card.id));
        }
        self.mode = CardMode::Editing;
        Ok(())
    }

    /// 下書きを編集する
    pub fn edit_draft(&mut self, f: impl FnOnce(&mut CardDraft)) -> Result<(), CardError> {
        self.expect_mode(CardMode::Editing)?;
        let draft = self.draft.as_mut().ok_or(CardError::NothingSelected)?;
        f(draft);
        Ok(())
    }

    /// 日付ピッカーの変更。過去日は拒否して前の値を保つ
    pub fn set_draft_due_date(
        &mut self,
        due_date: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Result<(), CardError> {
        validation::due_date(due_date, today)?;
        self.edit_draft(|d| d.due_date = due_date)
    }

    /// 送信前の検証。OK なら (task id, 送信するフィールド)
    pub fn validated_submission(&self, today: NaiveDate) -> Result<(TaskId, TaskFields), CardError> {
        let card = self.expect_mode(CardMode::Editing)?;
        let draft = self.draft.as_ref().ok_or(CardError::NothingSelected)?;
        validation::require("Title", &draft.title)?;
        validation::due_date(draft.due_date, today)?;
        Ok((card.id, draft.to_fields(card)))
    }

    /// どこからでも closed へ。draft は捨てる
    pub fn close(&mut self) {
        self.card = None;
        self.draft = None;
        self.mode = CardMode::Closed;
    }

    /// open 中のカードに対応するタスク（viewing / editing）
    pub fn expect_open(&self) -> Result<&Task, CardError> {
        match (&self.card, self.mode) {
            (Some(card), CardMode::Viewing | CardMode::Editing) => Ok(card),
            _ => Err(CardError::NothingSelected),
        }
    }

    fn expect_mode(&self, expected: CardMode) -> Result<&Task, CardError> {
        let card = self.card.as_ref().ok_or(CardError::NothingSelected)?;
        if self.mode != expected {
            return Err(CardError::WrongMode {
                expected,
                actual: self.mode,
            });
        }
        Ok(card)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::UserId;
    use rstest::rstest;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    fn task(owner: i64) -> Task {
        Task {
            id: TaskId::new(1),
            title: "pay rent".into(),
            description: Some("before friday".into()),
            due_date: Some(today()),
            category: Category::High,
            status: false,
            owner_id: UserId::new(owner),
            delete_request: false,
        }
    }

    #[rstest]
    #[case::complete(true, Some(-3), CardBadge::Complete)]
    #[case::complete_no_date(true, None, CardBadge::Complete)]
    #[case::overdue(false, Some(-1), CardBadge::Overdue)]
    #[case::due_today(false, Some(0), CardBadge::Pending)]
    #[case::future(false, Some(5), CardBadge::Pending)]
    #[case::no_date(false, None, CardBadge::Pending)]
    fn badge_is_pure(#[case] status: bool, #[case] offset: Option<i64>, #[case] expected: CardBadge) {
        let due = offset.map(|d| today() + chrono::Duration::days(d));
        assert_eq!(CardBadge::of(status, due, today()), expected);
    }

    #[test]
    fn open_seeds_draft_and_edit_exposes_it() {
        let mut state = SelectedCardState::default();
        state.open(task(1)).unwrap();
        assert_eq!(state.mode(), CardMode::Viewing);
        assert!(state.draft().is_none());

        state.begin_edit(&SessionContext::new(UserId::new(1), false)).unwrap();
        assert_eq!(state.mode(), CardMode::Editing);
        assert_eq!(state.draft().unwrap().title, "pay rent");
    }

    #[test]
    fn non_owner_cannot_edit_but_admin_can() {
        let mut state = SelectedCardState::default();
        state.open(task(1)).unwrap();

        let stranger = SessionContext::new(UserId::new(2), false);
        assert_eq!(
            state.begin_edit(&stranger),
            Err(CardError::NotPermitted(TaskId::new(1)))
        );
        assert_eq!(state.mode(), CardMode::Viewing);

        let admin = SessionContext::new(UserId::new(2), true);
        assert!(state.begin_edit(&admin).is_ok());
    }

    #[test]
    fn edit_requires_viewing_first() {
        let mut state = SelectedCardState::default();
        let owner = SessionContext::new(UserId::new(1), false);
        assert_eq!(state.begin_edit(&owner), Err(CardError::NothingSelected));
    }

    #[test]
    fn close_discards_draft() {
        let mut state = SelectedCardState::default();
        state.open(task(1)).unwrap();
        state.begin_edit(&SessionContext::new(UserId::new(1), false)).unwrap();
        state.edit_draft(|d| d.title = "changed".into()).unwrap();

        state.close();
        assert_eq!(state.mode(), CardMode::Closed);
        assert!(state.card().is_none());

        state.open(task(1)).unwrap();
        state.begin_edit(&SessionContext::new(UserId::new(1), false)).unwrap();
        assert_eq!(state.draft().unwrap().title, "pay rent");
    }

    #[test]
    fn past_due_date_is_rejected_before_submit() {
        let mut state = SelectedCardState::default();
        state.open(task(1)).unwrap();
        state.begin_edit(&SessionContext::new(UserId::new(1), false)).unwrap();

        let yesterday = today().pred_opt();
        assert_eq!(
            state.set_draft_due_date(yesterday, today()),
            Err(CardError::Invalid(ValidationError::PastDueDate))
        );
        assert_eq!(state.draft().unwrap().due_date, Some(today()));

        state.edit_draft(|d| d.due_date = yesterday).unwrap();
        assert_eq!(
            state.validated_submission(today()),
            Err(CardError::Invalid(ValidationError::PastDueDate))
        );
    }

    #[test]
    fn delete_affordance_depends_on_role_and_request() {
        let user = SessionContext::new(UserId::new(5), false);
        let admin = SessionContext::new(UserId::new(6), true);
        let mut t = task(1);

        assert_eq!(DeleteAffordance::for_task(&t, &user), DeleteAffordance::RequestDelete);
        t.delete_request = true;
        assert_eq!(DeleteAffordance::for_task(&t, &user), DeleteAffordance::Hidden);
        assert_eq!(DeleteAffordance::for_task(&t, &admin), DeleteAffordance::HardDelete);
    }

    #[test]
    fn completion_needs_open_deadline() {
        let mut t = task(1);
        assert!(can_complete(&t, today()));

        t.due_date = today().pred_opt();
        assert!(!can_complete(&t, today()));

        t.due_date = None;
        assert!(can_complete(&t, today()));

        t.status = true;
        assert!(!can_complete(&t, today()));
    }
}
