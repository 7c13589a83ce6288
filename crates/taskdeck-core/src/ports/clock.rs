//! Clock port - 「今日」の抽象化
//!
//! 期限切れ判定や期限日の検証はローカル日付で行う（時刻は見ない）。
//! テストでは FixedClock で日付を固定する。

use chrono::{Local, NaiveDate};

/// Clock は今日の日付を提供
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// SystemClock はローカルタイムゾーンの今日
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// FixedClock は常に同じ日付を返す（テスト用）
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    today: NaiveDate,
}

impl FixedClock {
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.today
    }
}
