//! 匹配队列
//!
//! 等待配对的匿名玩家先进先出排队。入队后队列达到两人即弹出最早的
//! 两位交给会话层配对（先到者执虎，后到者执羊）。配对前断线的连接
//! 从队列中删除。

use std::collections::VecDeque;

use tokio::sync::{mpsc, Mutex};

use protocol::PlayerId;

use crate::broadcast::{ConnId, Outbound};

/// 等待匹配的玩家连接
#[derive(Debug, Clone)]
pub struct QueueEntry {
    pub conn_id: ConnId,
    pub player: PlayerId,
    pub tx: mpsc::Sender<Outbound>,
}

/// 先进先出匹配队列
pub struct MatchQueue {
    waiting: Mutex<VecDeque<QueueEntry>>,
}

impl MatchQueue {
    pub fn new() -> Self {
        Self {
            waiting: Mutex::new(VecDeque::new()),
        }
    }

    /// 入队；凑满两人时返回最早的两位（按等待时长排序）
    pub async fn enqueue(&self, entry: QueueEntry) -> Option<(QueueEntry, QueueEntry)> {
        let mut waiting = self.waiting.lock().await;
        waiting.push_back(entry);

        if waiting.len() >= 2 {
            if let (Some(first), Some(second)) = (waiting.pop_front(), waiting.pop_front()) {
                return Some((first, second));
            }
        }
        None
    }

    /// 移除尚未配对的连接（断线时调用）
    pub async fn remove(&self, conn_id: ConnId) -> bool {
        let mut waiting = self.waiting.lock().await;
        let before = waiting.len();
        waiting.retain(|e| e.conn_id != conn_id);
        waiting.len() != before
    }

    /// 当前等待人数
    pub async fn waiting_count(&self) -> usize {
        self.waiting.lock().await.len()
    }
}

impl Default for MatchQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(conn_id: ConnId, player: PlayerId) -> QueueEntry {
        let (tx, _rx) = mpsc::channel(1);
        QueueEntry {
            conn_id,
            player,
            tx,
        }
    }

    #[tokio::test]
    async fn test_pairs_two_oldest() {
        let queue = MatchQueue::new();

        assert!(queue.enqueue(entry(1, 10)).await.is_none());
        let (first, second) = queue.enqueue(entry(2, 11)).await.unwrap();

        assert_eq!(first.player, 10);
        assert_eq!(second.player, 11);
        assert_eq!(queue.waiting_count().await, 0);
    }

    #[tokio::test]
    async fn test_fifo_order() {
        let queue = MatchQueue::new();

        queue.enqueue(entry(1, 10)).await;
        let (first, _) = queue.enqueue(entry(2, 11)).await.unwrap();
        assert_eq!(first.player, 10);

        queue.enqueue(entry(3, 12)).await;
        let (first, second) = queue.enqueue(entry(4, 13)).await.unwrap();
        assert_eq!(first.player, 12);
        assert_eq!(second.player, 13);
    }

    #[tokio::test]
    async fn test_remove_on_disconnect() {
        let queue = MatchQueue::new();

        queue.enqueue(entry(1, 10)).await;
        assert!(queue.remove(1).await);
        assert_eq!(queue.waiting_count().await, 0);

        // 掉线者已出队，下一位入队不触发配对
        assert!(queue.enqueue(entry(2, 11)).await.is_none());
        assert!(!queue.remove(99).await);
    }
}
