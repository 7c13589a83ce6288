//! ListQuery - 一覧の問い合わせ状態（ページング + モード）
//!
//! # 学習ポイント
//! - 排他的な search / filter を bool 2 つではなく enum で表す
//! - ページング計算を純粋関数に閉じ込めてテストしやすくする
//!
//! # 不変条件
//! - `skip` は常に `limit` の倍数で、`[0, last_page_start]` の範囲にある
//! - モードを切り替えると `skip = 0`、`total = None`（未取得）に戻る

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::task::Category;

/// 既定の 1 ページあたり件数
pub const DEFAULT_LIMIT: u64 = 8;

/// どのエンドポイント群を使うか
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListSource {
    /// Home: `/task/tasks/`, `/task/search/`, `/task/filter/`
    Tasks,
    /// Delete requests (admin): `/task/delete-requested-tasks/`, `/task/search-delete-requested-tasks/`
    DeleteRequests,
}

impl ListSource {
    pub fn supports_filter(&self) -> bool {
        matches!(self, ListSource::Tasks)
    }
}

/// フィルタ条件。None は「All」
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filters {
    pub status: Option<bool>,
    pub category: Option<Category>,
    pub due_date: Option<NaiveDate>,
}

impl Filters {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.category.is_none() && self.due_date.is_none()
    }
}

/// 現在の問い合わせ戦略
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ListMode {
    #[default]
    Plain,
    Searching { query: String },
    Filtering { filters: Filters },
}

impl ListMode {
    pub fn is_plain(&self) -> bool {
        matches!(self, ListMode::Plain)
    }
}

/// ListQuery は 1 つのビューが持つ問い合わせ状態
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub source: ListSource,
    pub mode: ListMode,
    pub skip: u64,
    pub limit: u64,
    /// None = 未取得（センチネル）
    pub total: Option<u64>,
}

impl ListQuery {
    pub fn new(source: ListSource, limit: u64) -> Self {
        Self {
            source,
            mode: ListMode::Plain,
            skip: 0,
            limit: limit.max(1),
            total: None,
        }
    }

    /// モードを切り替えた新しい問い合わせ（skip と total はリセット）
    pub fn with_mode(&self, mode: ListMode) -> Self {
        Self {
            source: self.source,
            mode,
            skip: 0,
            limit: self.limit,
            total: None,
        }
    }

    pub fn with_skip(&self, skip: u64) -> Self {
        Self {
            skip,
            ..self.clone()
        }
    }

    /// 最終ページの先頭 offset
    pub fn last_page_start(&self) -> u64 {
        last_page_start(self.total.unwrap_or(0), self.limit)
    }

    /// 次ページの skip。すでに最終ページなら None
    pub fn next_skip(&self) -> Option<u64> {
        let total = self.total?;
        let candidate = self.skip + self.limit;
        (candidate < total).then_some(candidate)
    }

    /// 前ページの skip。先頭なら None
    pub fn prev_skip(&self) -> Option<u64> {
        if self.skip == 0 {
            return None;
        }
        Some(align_down(self.skip.saturating_sub(self.limit), self.limit))
    }

    /// サーバーが返した skip/limit/total を取り込む
    ///
    /// search / filter ではサーバーがページングの正本。
    /// 値が欠けていれば要求した値を使い、最後に不変条件へ丸める。
    pub fn adopt(&mut self, skip: Option<u64>, limit: Option<u64>, total: u64) {
        if let Some(limit) = limit.filter(|l| *l > 0) {
            self.limit = limit;
        }
        if let Some(skip) = skip {
            self.skip = skip;
        }
        self.total = Some(total);
        self.skip = align_down(self.skip, self.limit).min(self.last_page_start());
    }

    pub fn page_info(&self) -> PageInfo {
        let Some(total) = self.total else {
            return PageInfo {
                current: 1,
                total_pages: 1,
                has_prev: false,
                has_next: false,
                visible: false,
            };
        };
        let total_pages = total.div_ceil(self.limit).max(1);
        PageInfo {
            current: (self.skip / self.limit + 1).min(total_pages),
            total_pages,
            has_prev: self.skip > 0,
            has_next: self.skip + self.limit < total,
            visible: total > self.limit,
        }
    }
}

/// ページング表示用の派生値
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub current: u64,
    pub total_pages: u64,
    pub has_prev: bool,
    pub has_next: bool,
    /// total が 1 ページに収まるならコントロールを出さない
    pub visible: bool,
}

impl std::fmt::Display for PageInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Page {} of {}", self.current, self.total_pages)
    }
}

pub fn last_page_start(total: u64, limit: u64) -> u64 {
    if total == 0 || limit == 0 {
        return 0;
    }
    (total - 1) / limit * limit
}

fn align_down(skip: u64, limit: u64) -> u64 {
    if limit == 0 { 0 } else { skip / limit * limit }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn loaded(skip: u64, limit: u64, total: u64) -> ListQuery {
        let mut q = ListQuery::new(ListSource::Tasks, limit);
        q.skip = skip;
        q.total = Some(total);
        q
    }

    #[test]
    fn nine_tasks_make_two_pages() {
        let q = loaded(0, 8, 9);
        assert_eq!(q.page_info().to_string(), "Page 1 of 2");
        assert!(q.page_info().visible);

        let q = q.with_skip(q.next_skip().unwrap());
        assert_eq!(q.skip, 8);
        assert_eq!(q.page_info().to_string(), "Page 2 of 2");
        assert_eq!(q.next_skip(), None);
    }

    #[rstest]
    #[case(8, 9)]
    #[case(8, 16)]
    #[case(8, 17)]
    #[case(3, 10)]
    #[case(1, 4)]
    #[case(5, 0)]
    fn prev_then_next_returns_to_origin(#[case] limit: u64, #[case] total: u64) {
        let last = last_page_start(total, limit);
        let mut skip = 0;
        while skip <= last {
            let q = loaded(skip, limit, total);
            if let Some(prev) = q.prev_skip() {
                let back = q.with_skip(prev).next_skip();
                assert_eq!(back, Some(skip), "prev/next from skip={skip}");
            }
            if let Some(next) = q.next_skip() {
                assert!(next <= last);
                assert_eq!(next % limit, 0);
                assert_eq!(q.with_skip(next).prev_skip(), Some(skip));
            }
            skip += limit;
        }
    }

    #[test]
    fn edges_are_idempotent() {
        assert_eq!(loaded(0, 8, 20).prev_skip(), None);
        assert_eq!(loaded(16, 8, 20).next_skip(), None);
        assert_eq!(loaded(0, 8, 8).next_skip(), None);
    }

    #[test]
    fn unknown_total_has_no_next_page() {
        let q = ListQuery::new(ListSource::Tasks, 8);
        assert_eq!(q.next_skip(), None);
        assert_eq!(q.page_info().to_string(), "Page 1 of 1");
    }

    #[test]
    fn switching_mode_resets_pagination() {
        let q = loaded(16, 8, 40);
        let searching = q.with_mode(ListMode::Searching {
            query: "report".into(),
        });
        assert_eq!(searching.skip, 0);
        assert_eq!(searching.total, None);

        let filtering = searching.with_mode(ListMode::Filtering {
            filters: Filters::default(),
        });
        assert_eq!(filtering.skip, 0);
        assert!(matches!(filtering.mode, ListMode::Filtering { .. }));
    }

    #[test]
    fn adopt_clamps_to_last_page() {
        let mut q = loaded(24, 8, 40);
        q.adopt(Some(24), Some(8), 20);
        assert_eq!(q.skip, 16);
        assert_eq!(q.total, Some(20));

        let mut q = loaded(0, 8, 0);
        q.adopt(Some(5), None, 30);
        assert_eq!(q.skip, 0);
    }
}
