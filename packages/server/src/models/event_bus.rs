use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Weak};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::Mutex;

use super::player::PlayerId;

pub const DEFAULT_CAPACITY: usize = 16;

/// 受信が追いつかない購読者への配送方針
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlowSubscriberPolicy {
    /// キューに空きができるまで待つ。配送は逐次なので後続の購読者も待たされる
    #[default]
    Wait,
    /// キューが満杯ならその購読者への通知を捨てる
    Drop,
}

impl FromStr for SlowSubscriberPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wait" => Ok(SlowSubscriberPolicy::Wait),
            "drop" => Ok(SlowSubscriberPolicy::Drop),
            other => Err(format!("unknown slow subscriber policy: {}", other)),
        }
    }
}

/// 購読者側のハンドル。同じプレイヤーが再購読すると同じキューを共有する
pub struct Subscription<T> {
    player_id: PlayerId,
    receiver: Arc<Mutex<mpsc::Receiver<T>>>,
}

impl<T> Clone for Subscription<T> {
    fn clone(&self) -> Self {
        Self {
            player_id: self.player_id,
            receiver: self.receiver.clone(),
        }
    }
}

impl<T> Subscription<T> {
    pub fn player_id(&self) -> PlayerId {
        self.player_id
    }

    /// 次の通知を待つ。購読が閉じられキューが空になると `None`
    pub async fn recv(&self) -> Option<T> {
        self.receiver.lock().await.recv().await
    }
}

struct Entry<T> {
    sender: mpsc::Sender<T>,
    // 購読者がハンドルを手放したらキューごと破棄されるよう弱参照で持つ
    receiver: Weak<Mutex<mpsc::Receiver<T>>>,
}

struct Subscribers<T> {
    closed: bool,
    entries: HashMap<PlayerId, Entry<T>>,
}

/// ゲームごとの通知バス（プレイヤーID → キュー）
pub struct EventBus<T> {
    capacity: usize,
    policy: SlowSubscriberPolicy,
    subscribers: Mutex<Subscribers<T>>,
}

impl<T: Clone + Send> Default for EventBus<T> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, SlowSubscriberPolicy::default())
    }
}

impl<T: Clone + Send> EventBus<T> {
    pub fn new(capacity: usize, policy: SlowSubscriberPolicy) -> Self {
        Self {
            capacity: capacity.max(1),
            policy,
            subscribers: Mutex::new(Subscribers {
                closed: false,
                entries: HashMap::new(),
            }),
        }
    }

    pub async fn subscribe(&self, player_id: PlayerId) -> Subscription<T> {
        let mut subscribers = self.subscribers.lock().await;

        if let Some(receiver) = subscribers
            .entries
            .get(&player_id)
            .and_then(|entry| entry.receiver.upgrade())
        {
            return Subscription {
                player_id,
                receiver,
            };
        }

        let (sender, receiver) = mpsc::channel(self.capacity);
        let receiver = Arc::new(Mutex::new(receiver));

        // 閉鎖後の購読は送信側をすぐに捨て、閉じたキューを返す
        if !subscribers.closed {
            subscribers.entries.insert(
                player_id,
                Entry {
                    sender,
                    receiver: Arc::downgrade(&receiver),
                },
            );
        }

        Subscription {
            player_id,
            receiver,
        }
    }

    /// 指定プレイヤーのキューを閉じる。購読していなければ `false`
    pub async fn unsubscribe(&self, player_id: PlayerId) -> bool {
        self.subscribers
            .lock()
            .await
            .entries
            .remove(&player_id)
            .is_some()
    }

    pub async fn is_subscribed(&self, player_id: PlayerId) -> bool {
        self.subscribers
            .lock()
            .await
            .entries
            .get(&player_id)
            .map_or(false, |entry| entry.receiver.strong_count() > 0)
    }

    pub async fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .await
            .entries
            .values()
            .filter(|entry| entry.receiver.strong_count() > 0)
            .count()
    }

    /// 残っているキューをすべて閉じる。何度呼んでもよい
    pub async fn close_all(&self) {
        let mut subscribers = self.subscribers.lock().await;
        subscribers.closed = true;
        subscribers.entries.clear();
    }

    pub async fn is_closed(&self) -> bool {
        self.subscribers.lock().await.closed
    }

    /// 現在の購読者全員へ通知し、配送できた件数を返す。
    /// 配送はロックを離してから順に行う
    pub async fn publish(&self, event: T) -> usize {
        let targets: Vec<(PlayerId, mpsc::Sender<T>)> = {
            let subscribers = self.subscribers.lock().await;
            subscribers
                .entries
                .iter()
                .map(|(id, entry)| (*id, entry.sender.clone()))
                .collect()
        };

        let mut delivered = 0;
        let mut stale = false;

        for (player_id, sender) in targets {
            let result = match self.policy {
                SlowSubscriberPolicy::Wait => sender.send(event.clone()).await.map_err(|_| ()),
                SlowSubscriberPolicy::Drop => match sender.try_send(event.clone()) {
                    Ok(()) => Ok(()),
                    Err(TrySendError::Full(_)) => {
                        warn!("購読者{}のキューが満杯のため通知を破棄しました", player_id);
                        continue;
                    }
                    Err(TrySendError::Closed(_)) => Err(()),
                },
            };

            match result {
                Ok(()) => delivered += 1,
                Err(()) => {
                    debug!("購読者{}は既に切断されています", player_id);
                    stale = true;
                }
            }
        }

        if stale {
            self.subscribers
                .lock()
                .await
                .entries
                .retain(|_, entry| entry.receiver.strong_count() > 0);
        }

        delivered
    }
}
