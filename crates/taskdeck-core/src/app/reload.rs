//! ReloadSignal - 「一覧を取り直して」の合図
//!
//! mutation gateway は一覧の状態に触らず、成功したらこの合図を送るだけ。
//! 一覧側は `ReloadListener` で合図を受け取り、現在のモードで fetch し直す。
//!
//! # 学習ポイント
//! - `tokio::sync::watch` は「最新値だけ」を配る。連続した合図は 1 回の reload にまとまる
//! - Sender を Arc で共有して clone 可能にする

use std::sync::Arc;

use tokio::sync::watch;

/// 送信側（clone して gateway やフォームに配る）
#[derive(Debug, Clone)]
pub struct ReloadSignal {
    tx: Arc<watch::Sender<u64>>,
}

/// 受信側
#[derive(Debug, Clone)]
pub struct ReloadListener {
    rx: watch::Receiver<u64>,
}

impl ReloadSignal {
    pub fn new() -> (Self, ReloadListener) {
        let (tx, rx) = watch::channel(0);
        (Self { tx: Arc::new(tx) }, ReloadListener { rx })
    }

    /// 合図を送る（受信側がいなくても失敗しない）
    pub fn request(&self) {
        self.tx.send_modify(|generation| *generation += 1);
        tracing::trace!(generation = *self.tx.borrow(), "reload requested");
    }

    pub fn subscribe(&self) -> ReloadListener {
        ReloadListener {
            rx: self.tx.subscribe(),
        }
    }
}

impl ReloadListener {
    /// 未処理の合図があれば消費して true
    pub fn take_pending(&mut self) -> bool {
        match self.rx.has_changed() {
            Ok(true) => {
                self.rx.borrow_and_update();
                true
            }
            _ => false,
        }
    }

    /// 次の合図を待つ。送信側がすべて drop されたら false
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_coalesce_until_taken() {
        let (signal, mut listener) = ReloadSignal::new();
        assert!(!listener.take_pending());

        signal.request();
        signal.clone().request();
        assert!(listener.take_pending());
        assert!(!listener.take_pending());
    }

    #[tokio::test]
    async fn changed_wakes_on_request() {
        let (signal, mut listener) = ReloadSignal::new();
        let handle = tokio::spawn(async move { listener.changed().await });
        signal.request();
        assert!(handle.await.unwrap());
    }

    #[tokio::test]
    async fn changed_reports_closed_sender() {
        let (signal, mut listener) = ReloadSignal::new();
        drop(signal);
        assert!(!listener.changed().await);
    }
}
