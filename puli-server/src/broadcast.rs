//! 连接广播器
//!
//! 维护对局 ID 到当前附着连接集合的映射，把全量状态快照推送给
//! 对局的所有连接。推送是尽力送达：单条连接失败（视为已死）不阻塞
//! 其余连接，也不视为广播操作的失败。

use std::collections::HashMap;

use tokio::sync::{mpsc, Mutex};
use tracing::debug;

use protocol::{MatchId, PlayerId, ServerMessage, StateSnapshot};

/// 连接编号
pub type ConnId = u64;

/// 会话出站事件
#[derive(Debug, Clone)]
pub enum Outbound {
    /// 推送一条消息
    Message(ServerMessage),
    /// 要求会话关闭连接
    Close,
}

/// 附着在对局上的一条连接
#[derive(Debug, Clone)]
pub struct ConnectionEntry {
    pub conn_id: ConnId,
    /// 打开连接的身份（观战者可为空）
    pub player: Option<PlayerId>,
    pub tx: mpsc::Sender<Outbound>,
}

/// 连接广播器
pub struct Broadcaster {
    conns: Mutex<HashMap<MatchId, Vec<ConnectionEntry>>>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self {
            conns: Mutex::new(HashMap::new()),
        }
    }

    /// 把连接附着到对局
    pub async fn attach(&self, match_id: MatchId, entry: ConnectionEntry) {
        let mut conns = self.conns.lock().await;
        conns.entry(match_id).or_default().push(entry);
    }

    /// 把连接从对局上移除
    pub async fn detach(&self, match_id: MatchId, conn_id: ConnId) {
        let mut conns = self.conns.lock().await;
        if let Some(entries) = conns.get_mut(&match_id) {
            entries.retain(|e| e.conn_id != conn_id);
            if entries.is_empty() {
                conns.remove(&match_id);
            }
        }
    }

    /// 指定身份当前是否附着在对局上（看门狗到期复查用）
    pub async fn is_attached(&self, match_id: MatchId, player: PlayerId) -> bool {
        let conns = self.conns.lock().await;
        conns
            .get(&match_id)
            .map(|entries| entries.iter().any(|e| e.player == Some(player)))
            .unwrap_or(false)
    }

    /// 对局当前的连接数
    pub async fn attached_count(&self, match_id: MatchId) -> usize {
        let conns = self.conns.lock().await;
        conns.get(&match_id).map(Vec::len).unwrap_or(0)
    }

    /// 向对局的所有连接推送快照
    pub async fn broadcast(&self, match_id: MatchId, snapshot: StateSnapshot) {
        // 先拷出目标列表再逐个发送，不在持锁状态下等待通道
        let targets: Vec<ConnectionEntry> = {
            let conns = self.conns.lock().await;
            match conns.get(&match_id) {
                Some(entries) => entries.clone(),
                None => return,
            }
        };

        for entry in targets {
            let msg = ServerMessage::Snapshot {
                snapshot: snapshot.clone(),
            };
            if entry.tx.send(Outbound::Message(msg)).await.is_err() {
                debug!(
                    match_id,
                    conn_id = entry.conn_id,
                    "skipping dead connection during broadcast"
                );
            }
        }
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::GameState;

    fn entry(conn_id: ConnId, player: Option<PlayerId>) -> (ConnectionEntry, mpsc::Receiver<Outbound>) {
        let (tx, rx) = mpsc::channel(8);
        (
            ConnectionEntry {
                conn_id,
                player,
                tx,
            },
            rx,
        )
    }

    #[tokio::test]
    async fn test_broadcast_reaches_all() {
        let broadcaster = Broadcaster::new();
        let (e1, mut rx1) = entry(1, Some(10));
        let (e2, mut rx2) = entry(2, None);
        broadcaster.attach(7, e1).await;
        broadcaster.attach(7, e2).await;

        let snapshot = StateSnapshot::from_state(&GameState::initial(7));
        broadcaster.broadcast(7, snapshot.clone()).await;

        for rx in [&mut rx1, &mut rx2] {
            match rx.recv().await.unwrap() {
                Outbound::Message(ServerMessage::Snapshot { snapshot: s }) => {
                    assert_eq!(s, snapshot)
                }
                other => panic!("unexpected event: {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_broadcast_survives_dead_connection() {
        let broadcaster = Broadcaster::new();
        let (e1, rx1) = entry(1, Some(10));
        let (e2, mut rx2) = entry(2, Some(11));
        broadcaster.attach(7, e1).await;
        broadcaster.attach(7, e2).await;
        drop(rx1);

        let snapshot = StateSnapshot::from_state(&GameState::initial(7));
        broadcaster.broadcast(7, snapshot).await;

        // 死连接被跳过，存活连接仍收到快照
        assert!(matches!(
            rx2.recv().await.unwrap(),
            Outbound::Message(ServerMessage::Snapshot { .. })
        ));
    }

    #[tokio::test]
    async fn test_attachment_queries() {
        let broadcaster = Broadcaster::new();
        let (e1, _rx1) = entry(1, Some(10));
        broadcaster.attach(7, e1).await;

        assert!(broadcaster.is_attached(7, 10).await);
        assert!(!broadcaster.is_attached(7, 11).await);
        assert_eq!(broadcaster.attached_count(7).await, 1);

        broadcaster.detach(7, 1).await;
        assert!(!broadcaster.is_attached(7, 10).await);
        assert_eq!(broadcaster.attached_count(7).await, 0);
    }
}
