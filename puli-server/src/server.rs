//! 服务器主逻辑
//!
//! 每条连接一个读任务加一个写任务。同一对局的走法应用、终局判定与
//! 广播在该对局的互斥锁内作为一个整体完成，并发提交的走法不会交错
//! 读改写共享状态；互不相关的对局各自持锁，互不阻塞。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use protocol::{
    ClientMessage, Connection, ErrorCode, GameError, GameState, Listener, MatchId, Move, OpponentKind, Phase,
    PlayerId, ProtocolError, ServerMessage, Side, StateSnapshot, TcpConnection, TcpListener,
    COMPUTER_PLAYER_ID, FORFEIT_GRACE, HEARTBEAT_TIMEOUT,
};

use crate::broadcast::{Broadcaster, ConnId, ConnectionEntry, Outbound};
use crate::matchmaking::{MatchQueue, QueueEntry};
use crate::player::{LoginError, PlayerManager};
use crate::registry::{MatchEntry, MatchRegistry};
use crate::stats::{Outcome, StatsStore};
use crate::watchdog;

/// 服务器状态
pub struct ServerState {
    pub players: Mutex<PlayerManager>,
    pub registry: MatchRegistry,
    pub broadcaster: Broadcaster,
    pub queue: MatchQueue,
    /// 战绩存储（可缺省，缺省时登记跳过、查询返回空）
    pub stats: Option<Box<dyn StatsStore>>,
    /// 断线判负宽限期
    pub forfeit_grace: Duration,
    next_conn_id: AtomicU64,
}

impl ServerState {
    pub fn new(stats: Option<Box<dyn StatsStore>>) -> Self {
        Self {
            players: Mutex::new(PlayerManager::new()),
            registry: MatchRegistry::new(),
            broadcaster: Broadcaster::new(),
            queue: MatchQueue::new(),
            stats,
            forfeit_grace: FORFEIT_GRACE,
            next_conn_id: AtomicU64::new(1),
        }
    }

    /// 覆盖断线宽限期（测试用）
    pub fn with_forfeit_grace(mut self, grace: Duration) -> Self {
        self.forfeit_grace = grace;
        self
    }

    pub fn allocate_conn_id(&self) -> ConnId {
        self.next_conn_id.fetch_add(1, Ordering::SeqCst)
    }

    /// 对局分出胜负后登记双方战绩（电脑一方跳过）
    pub fn record_outcome(&self, state: &GameState) {
        let Some(store) = &self.stats else { return };
        let Some(winner) = state.winner else { return };

        for side in [Side::Tiger, Side::Goat] {
            let Some(player) = state.player_for(side) else {
                continue;
            };
            if player == COMPUTER_PLAYER_ID {
                continue;
            }
            let outcome = if side == winner {
                Outcome::Win
            } else {
                Outcome::Loss
            };
            if let Err(e) = store.record(player, side, outcome) {
                warn!(player, error = %e, "failed to record match outcome");
            }
        }
    }
}

/// 一条连接的会话状态
pub struct Session {
    pub conn_id: ConnId,
    pub player: Option<PlayerId>,
    /// 附着的对局
    pub attached: Option<MatchId>,
    pub tx: mpsc::Sender<Outbound>,
}

impl Session {
    async fn push(&self, msg: ServerMessage) {
        let _ = self.tx.send(Outbound::Message(msg)).await;
    }
}

/// 消息处理器
pub struct MessageHandler;

impl MessageHandler {
    /// 处理一条客户端消息，返回需要直接回复的消息
    pub async fn handle(
        state: &Arc<ServerState>,
        session: &mut Session,
        msg: ClientMessage,
    ) -> Option<ServerMessage> {
        match msg {
            ClientMessage::Login { nickname } => Self::handle_login(state, session, nickname).await,
            ClientMessage::CreateMatch {
                opponent,
                preferred_side,
            } => Self::handle_create(state, session, opponent, preferred_side).await,
            ClientMessage::JoinMatch { match_id } => {
                Self::handle_join(state, session, match_id).await
            }
            ClientMessage::MakeMove { side, from, to } => {
                Self::handle_move(state, session, Move { side, from, to }).await
            }
            ClientMessage::FindMatch => Self::handle_find(state, session).await,
            ClientMessage::CancelFind => {
                state.queue.remove(session.conn_id).await;
                None
            }
            ClientMessage::FetchStats => Self::handle_stats(state, session).await,
            ClientMessage::Ping => Some(ServerMessage::Pong),
        }
    }

    /// 处理登录
    async fn handle_login(
        state: &Arc<ServerState>,
        session: &mut Session,
        nickname: String,
    ) -> Option<ServerMessage> {
        let mut players = state.players.lock().await;
        match players.login(nickname) {
            Ok(player_id) => {
                session.player = Some(player_id);
                Some(ServerMessage::LoginSuccess { player_id })
            }
            Err(e) => {
                let code = match e {
                    LoginError::Occupied => ErrorCode::NicknameOccupied,
                    LoginError::Empty | LoginError::TooLong => ErrorCode::InvalidNickname,
                };
                Some(error_msg(code, &e.to_string()))
            }
        }
    }

    /// 处理创建对局
    async fn handle_create(
        state: &Arc<ServerState>,
        session: &mut Session,
        opponent: OpponentKind,
        preferred_side: Option<Side>,
    ) -> Option<ServerMessage> {
        let Some(player) = session.player else {
            return Some(not_logged_in());
        };

        let ai_seed = rand::random();
        let (match_id, your_side) = state
            .registry
            .create(player, opponent, preferred_side, ai_seed)
            .await;
        info!(match_id, player, ?your_side, "match created");

        session.attached = Some(match_id);
        state
            .broadcaster
            .attach(
                match_id,
                ConnectionEntry {
                    conn_id: session.conn_id,
                    player: Some(player),
                    tx: session.tx.clone(),
                },
            )
            .await;

        session
            .push(ServerMessage::MatchCreated {
                match_id,
                your_side,
            })
            .await;

        // 入座完成的快照；若先手是电脑，立即触发搜索并再次广播
        if let Some(entry) = state.registry.get(match_id).await {
            let mut entry = entry.lock().await;
            let snapshot = StateSnapshot::from_state(entry.engine.state());
            state.broadcaster.broadcast(match_id, snapshot).await;
            Self::drive_computer(state, match_id, &mut entry).await;
        }

        None
    }

    /// 处理加入对局：本人已入座则回座，有空位则入座，否则观战
    async fn handle_join(
        state: &Arc<ServerState>,
        session: &mut Session,
        match_id: MatchId,
    ) -> Option<ServerMessage> {
        let Some(player) = session.player else {
            return Some(not_logged_in());
        };

        let Some(entry) = state.registry.get(match_id).await else {
            return Some(error_msg(ErrorCode::MatchNotFound, "match not found"));
        };

        let mut entry = entry.lock().await;
        let (your_side, assigned_now) = {
            let st = entry.engine.state();
            match st.side_of(player) {
                Some(side) => (Some(side), false),
                None if st.tiger_player.is_none() => (Some(Side::Tiger), true),
                None if st.goat_player.is_none() => (Some(Side::Goat), true),
                None => (None, false),
            }
        };
        if let (Some(side), true) = (your_side, assigned_now) {
            entry.engine.assign_player(side, player);
            info!(match_id, player, ?side, "player seated");
        }

        session.attached = Some(match_id);
        state
            .broadcaster
            .attach(
                match_id,
                ConnectionEntry {
                    conn_id: session.conn_id,
                    player: Some(player),
                    tx: session.tx.clone(),
                },
            )
            .await;

        session
            .push(ServerMessage::MatchJoined {
                match_id,
                your_side,
            })
            .await;

        let snapshot = StateSnapshot::from_state(entry.engine.state());
        if assigned_now {
            // 角色分配是一次状态变化，同步给对局的全部连接
            state.broadcaster.broadcast(match_id, snapshot).await;
        } else {
            session.push(ServerMessage::Snapshot { snapshot }).await;
        }

        None
    }

    /// 处理走法提交
    async fn handle_move(
        state: &Arc<ServerState>,
        session: &mut Session,
        mv: Move,
    ) -> Option<ServerMessage> {
        let Some(player) = session.player else {
            return Some(not_logged_in());
        };
        let Some(match_id) = session.attached else {
            return Some(error_msg(ErrorCode::NotInMatch, "join a match first"));
        };
        let Some(entry) = state.registry.get(match_id).await else {
            return Some(error_msg(ErrorCode::MatchNotFound, "match not found"));
        };

        let mut entry = entry.lock().await;

        // 鉴权：阵营已有归属且不是提交者本人则拒绝，空缺阵营放行
        if let Some(owner) = entry.engine.state().player_for(mv.side) {
            if owner != player {
                return Some(error_msg(
                    ErrorCode::Unauthorized,
                    "that side belongs to another player",
                ));
            }
        }

        if let Err(e) = entry.engine.apply_move(&mv) {
            return Some(game_error_msg(e));
        }
        debug!(match_id, %mv, "move applied");

        if entry.engine.state().winner.is_some() {
            state.record_outcome(entry.engine.state());
        }
        let snapshot = StateSnapshot::from_state(entry.engine.state());
        state.broadcaster.broadcast(match_id, snapshot).await;

        // 人类走法之后轮到电脑时，同步搜索并进行第二次广播
        Self::drive_computer(state, match_id, &mut entry).await;

        None
    }

    /// 轮到电脑时推进一步
    async fn drive_computer(state: &Arc<ServerState>, match_id: MatchId, entry: &mut MatchEntry) {
        let game_state = entry.engine.state();
        if game_state.phase == Phase::GameOver {
            return;
        }
        let active = game_state.active_side;
        if !game_state.is_computer(active) {
            return;
        }
        let Some(ai) = entry.ai.as_mut() else {
            return;
        };

        let chosen = ai.choose_move(entry.engine.state(), active);
        let Some(mv) = chosen else {
            // 电脑无子可动按困毙处理，不视为错误；老虎被困时
            // 终局判定已在上一步走法后生效，不会走到这里
            warn!(match_id, ?active, "computer has no legal move, passing");
            return;
        };

        match entry.engine.apply_move(&mv) {
            Ok(()) => {
                debug!(match_id, %mv, "computer move applied");
                if entry.engine.state().winner.is_some() {
                    state.record_outcome(entry.engine.state());
                }
                let snapshot = StateSnapshot::from_state(entry.engine.state());
                state.broadcaster.broadcast(match_id, snapshot).await;
            }
            Err(e) => {
                // 搜索引擎只下自己生成的合法走法，被拒说明引擎状态异常，判电脑负
                warn!(match_id, %mv, error = %e, "computer move rejected, forfeiting");
                entry.engine.forfeit(active);
                state.record_outcome(entry.engine.state());
                let snapshot = StateSnapshot::from_state(entry.engine.state());
                state.broadcaster.broadcast(match_id, snapshot).await;
            }
        }
    }

    /// 处理匹配请求
    async fn handle_find(state: &Arc<ServerState>, session: &mut Session) -> Option<ServerMessage> {
        let Some(player) = session.player else {
            return Some(not_logged_in());
        };

        let entry = QueueEntry {
            conn_id: session.conn_id,
            player,
            tx: session.tx.clone(),
        };

        if let Some((first, second)) = state.queue.enqueue(entry).await {
            let match_id = state.registry.create_paired(first.player, second.player).await;
            info!(
                match_id,
                tiger = first.player,
                goat = second.player,
                "matchmaking paired two players"
            );

            // 通知双方并关闭两条匹配连接，等待它们按对局通道重连
            for (waiting, side) in [(first, Side::Tiger), (second, Side::Goat)] {
                let _ = waiting
                    .tx
                    .send(Outbound::Message(ServerMessage::MatchFound {
                        match_id,
                        your_side: side,
                    }))
                    .await;
                let _ = waiting.tx.send(Outbound::Close).await;
            }
        }

        None
    }

    /// 处理战绩查询
    async fn handle_stats(
        state: &Arc<ServerState>,
        session: &mut Session,
    ) -> Option<ServerMessage> {
        let Some(player) = session.player else {
            return Some(not_logged_in());
        };

        let stats = match &state.stats {
            Some(store) => store.fetch(player).unwrap_or_else(|e| {
                warn!(player, error = %e, "failed to fetch stats");
                None
            }),
            None => None,
        };
        Some(ServerMessage::Stats { stats })
    }
}

/// 会话结束时的清理：出队、解除附着，已入座玩家掉线则启动判负看门狗
pub async fn cleanup_session(state: &Arc<ServerState>, session: &Session) {
    state.queue.remove(session.conn_id).await;

    let Some(match_id) = session.attached else {
        return;
    };
    state.broadcaster.detach(match_id, session.conn_id).await;

    let Some(player) = session.player else {
        return;
    };
    let side = {
        let Some(entry) = state.registry.get(match_id).await else {
            return;
        };
        let entry = entry.lock().await;
        entry.engine.state().side_of(player)
    };
    if let Some(side) = side {
        debug!(match_id, player, "seated player disconnected, starting grace period");
        watchdog::spawn(state.clone(), match_id, player, side, state.forfeit_grace);
    }
}

fn error_msg(code: ErrorCode, message: &str) -> ServerMessage {
    ServerMessage::Error {
        code,
        message: message.to_string(),
    }
}

fn not_logged_in() -> ServerMessage {
    error_msg(ErrorCode::NotLoggedIn, "login first")
}

/// 规则错误映射为错误码
fn game_error_msg(e: GameError) -> ServerMessage {
    let code = match e {
        GameError::GameOver => ErrorCode::GameAlreadyOver,
        GameError::WrongTurn => ErrorCode::WrongTurn,
        _ => ErrorCode::IllegalMove,
    };
    error_msg(code, &e.to_string())
}

/// 运行服务器主循环
pub async fn run(addr: &str, stats: Option<Box<dyn StatsStore>>) -> anyhow::Result<()> {
    let state = Arc::new(ServerState::new(stats));
    run_with_state(addr, state).await
}

/// 用外部构造的状态运行（测试与嵌入用）
pub async fn run_with_state(addr: &str, state: Arc<ServerState>) -> anyhow::Result<()> {
    let mut listener = TcpListener::bind(addr).await?;
    info!(
        addr = %listener.local_addr().unwrap_or_default(),
        "puli server listening"
    );

    loop {
        match listener.accept().await {
            Ok(conn) => {
                let state = state.clone();
                tokio::spawn(async move {
                    handle_connection(state, conn).await;
                });
            }
            Err(e) => {
                warn!(error = %e, "failed to accept connection");
            }
        }
    }
}

/// 驱动一条连接：读循环 + 写任务
async fn handle_connection(state: Arc<ServerState>, conn: TcpConnection) {
    let peer = conn.peer_addr().unwrap_or_else(|| "unknown".to_string());
    let (mut reader, mut writer) = conn.split();
    let (tx, mut rx) = mpsc::channel::<Outbound>(32);

    let writer_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                Outbound::Message(msg) => {
                    if writer.write_frame(&msg).await.is_err() {
                        break;
                    }
                }
                Outbound::Close => break,
            }
        }
    });

    let mut session = Session {
        conn_id: state.allocate_conn_id(),
        player: None,
        attached: None,
        tx,
    };
    debug!(%peer, conn_id = session.conn_id, "connection established");

    loop {
        let msg = match timeout(HEARTBEAT_TIMEOUT, reader.read_frame::<ClientMessage>()).await {
            Ok(Ok(msg)) => msg,
            Ok(Err(ProtocolError::ConnectionClosed)) => {
                debug!(%peer, "connection closed by peer");
                break;
            }
            Ok(Err(e)) => {
                debug!(%peer, error = %e, "read error, dropping connection");
                break;
            }
            Err(_) => {
                debug!(%peer, "heartbeat timeout, dropping connection");
                break;
            }
        };

        if let Some(reply) = MessageHandler::handle(&state, &mut session, msg).await {
            if session.tx.send(Outbound::Message(reply)).await.is_err() {
                break;
            }
        }
    }

    cleanup_session(&state, &session).await;
    drop(session);
    let _ = writer_task.await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::Difficulty;

    fn test_state() -> Arc<ServerState> {
        Arc::new(ServerState::new(None).with_forfeit_grace(Duration::from_millis(50)))
    }

    fn new_session(state: &Arc<ServerState>) -> (Session, mpsc::Receiver<Outbound>) {
        let (tx, rx) = mpsc::channel(32);
        (
            Session {
                conn_id: state.allocate_conn_id(),
                player: None,
                attached: None,
                tx,
            },
            rx,
        )
    }

    async fn login(state: &Arc<ServerState>, session: &mut Session, nickname: &str) -> PlayerId {
        match MessageHandler::handle(
            state,
            session,
            ClientMessage::Login {
                nickname: nickname.to_string(),
            },
        )
        .await
        {
            Some(ServerMessage::LoginSuccess { player_id }) => player_id,
            other => panic!("login failed: {:?}", other),
        }
    }

    async fn next_snapshot(rx: &mut mpsc::Receiver<Outbound>) -> StateSnapshot {
        loop {
            match rx.recv().await.expect("channel closed") {
                Outbound::Message(ServerMessage::Snapshot { snapshot }) => return snapshot,
                Outbound::Message(_) => continue,
                Outbound::Close => panic!("unexpected close"),
            }
        }
    }

    #[tokio::test]
    async fn test_login_required() {
        let state = test_state();
        let (mut session, _rx) = new_session(&state);

        let reply = MessageHandler::handle(&state, &mut session, ClientMessage::FindMatch).await;
        assert!(matches!(
            reply,
            Some(ServerMessage::Error {
                code: ErrorCode::NotLoggedIn,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_create_human_match_broadcasts_snapshot() {
        let state = test_state();
        let (mut session, mut rx) = new_session(&state);
        login(&state, &mut session, "alice").await;

        MessageHandler::handle(
            &state,
            &mut session,
            ClientMessage::CreateMatch {
                opponent: OpponentKind::Human,
                preferred_side: None,
            },
        )
        .await;

        match rx.recv().await.unwrap() {
            Outbound::Message(ServerMessage::MatchCreated { your_side, .. }) => {
                assert_eq!(your_side, Side::Goat)
            }
            other => panic!("unexpected event: {:?}", other),
        }
        let snapshot = next_snapshot(&mut rx).await;
        assert_eq!(snapshot.turn_index, 0);
        assert!(snapshot.goat_player.is_some());
        assert!(snapshot.tiger_player.is_none());
    }

    #[tokio::test]
    async fn test_computer_replies_after_human_move() {
        let state = test_state();
        let (mut session, mut rx) = new_session(&state);
        login(&state, &mut session, "alice").await;

        MessageHandler::handle(
            &state,
            &mut session,
            ClientMessage::CreateMatch {
                opponent: OpponentKind::Computer(Difficulty::Medium),
                preferred_side: None,
            },
        )
        .await;

        // MatchCreated + 初始快照（山羊先行，电脑执虎不先动）
        rx.recv().await.unwrap();
        let snapshot = next_snapshot(&mut rx).await;
        assert_eq!(snapshot.turn_index, 0);
        assert_eq!(snapshot.tiger_player, Some(COMPUTER_PLAYER_ID));

        MessageHandler::handle(
            &state,
            &mut session,
            ClientMessage::MakeMove {
                side: Side::Goat,
                from: None,
                to: 10,
            },
        )
        .await;

        // 人类走法与电脑回应各广播一次
        let after_human = next_snapshot(&mut rx).await;
        assert_eq!(after_human.turn_index, 1);
        assert_eq!(after_human.active_side, Side::Tiger);

        let after_computer = next_snapshot(&mut rx).await;
        assert_eq!(after_computer.turn_index, 2);
        assert_eq!(after_computer.active_side, Side::Goat);
    }

    #[tokio::test]
    async fn test_computer_moves_first_when_tiger_human() {
        let state = test_state();
        let (mut session, mut rx) = new_session(&state);
        login(&state, &mut session, "alice").await;

        MessageHandler::handle(
            &state,
            &mut session,
            ClientMessage::CreateMatch {
                opponent: OpponentKind::Computer(Difficulty::Easy),
                preferred_side: Some(Side::Tiger),
            },
        )
        .await;

        rx.recv().await.unwrap();
        let initial = next_snapshot(&mut rx).await;
        assert_eq!(initial.turn_index, 0);

        // 电脑执羊先行，创建后立即补一步
        let after_computer = next_snapshot(&mut rx).await;
        assert_eq!(after_computer.turn_index, 1);
        assert_eq!(after_computer.active_side, Side::Tiger);
        assert_eq!(after_computer.goats_in_hand, 14);
    }

    #[tokio::test]
    async fn test_unauthorized_side() {
        let state = test_state();
        let (mut alice, mut alice_rx) = new_session(&state);
        login(&state, &mut alice, "alice").await;

        MessageHandler::handle(
            &state,
            &mut alice,
            ClientMessage::CreateMatch {
                opponent: OpponentKind::Human,
                preferred_side: None,
            },
        )
        .await;
        let match_id = match alice_rx.recv().await.unwrap() {
            Outbound::Message(ServerMessage::MatchCreated { match_id, .. }) => match_id,
            other => panic!("unexpected event: {:?}", other),
        };

        let (mut bob, mut bob_rx) = new_session(&state);
        login(&state, &mut bob, "bob").await;
        MessageHandler::handle(&state, &mut bob, ClientMessage::JoinMatch { match_id }).await;
        match bob_rx.recv().await.unwrap() {
            Outbound::Message(ServerMessage::MatchJoined { your_side, .. }) => {
                assert_eq!(your_side, Some(Side::Tiger))
            }
            other => panic!("unexpected event: {:?}", other),
        }

        // bob 执虎，不能替山羊走子
        let reply = MessageHandler::handle(
            &state,
            &mut bob,
            ClientMessage::MakeMove {
                side: Side::Goat,
                from: None,
                to: 10,
            },
        )
        .await;
        assert!(matches!(
            reply,
            Some(ServerMessage::Error {
                code: ErrorCode::Unauthorized,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_rule_errors_map_to_codes() {
        let state = test_state();
        let (mut session, mut rx) = new_session(&state);
        login(&state, &mut session, "alice").await;

        MessageHandler::handle(
            &state,
            &mut session,
            ClientMessage::CreateMatch {
                opponent: OpponentKind::Human,
                preferred_side: None,
            },
        )
        .await;
        rx.recv().await.unwrap();

        // 放到老虎占用的节点
        let reply = MessageHandler::handle(
            &state,
            &mut session,
            ClientMessage::MakeMove {
                side: Side::Goat,
                from: None,
                to: 0,
            },
        )
        .await;
        assert!(matches!(
            reply,
            Some(ServerMessage::Error {
                code: ErrorCode::IllegalMove,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_matchmaking_pairs_and_closes() {
        let state = test_state();
        let (mut alice, mut alice_rx) = new_session(&state);
        let (mut bob, mut bob_rx) = new_session(&state);
        let alice_id = login(&state, &mut alice, "alice").await;
        let bob_id = login(&state, &mut bob, "bob").await;

        MessageHandler::handle(&state, &mut alice, ClientMessage::FindMatch).await;
        assert_eq!(state.queue.waiting_count().await, 1);

        MessageHandler::handle(&state, &mut bob, ClientMessage::FindMatch).await;
        assert_eq!(state.queue.waiting_count().await, 0);

        // 先到者执虎，后到者执羊，随后双方连接关闭
        let match_id = match alice_rx.recv().await.unwrap() {
            Outbound::Message(ServerMessage::MatchFound {
                match_id,
                your_side,
            }) => {
                assert_eq!(your_side, Side::Tiger);
                match_id
            }
            other => panic!("unexpected event: {:?}", other),
        };
        assert!(matches!(alice_rx.recv().await.unwrap(), Outbound::Close));

        match bob_rx.recv().await.unwrap() {
            Outbound::Message(ServerMessage::MatchFound { your_side, .. }) => {
                assert_eq!(your_side, Side::Goat)
            }
            other => panic!("unexpected event: {:?}", other),
        }
        assert!(matches!(bob_rx.recv().await.unwrap(), Outbound::Close));

        let entry = state.registry.get(match_id).await.unwrap();
        let entry = entry.lock().await;
        assert_eq!(entry.engine.state().tiger_player, Some(alice_id));
        assert_eq!(entry.engine.state().goat_player, Some(bob_id));
    }

    #[tokio::test]
    async fn test_cancel_find_removes_entry() {
        let state = test_state();
        let (mut session, _rx) = new_session(&state);
        login(&state, &mut session, "alice").await;

        MessageHandler::handle(&state, &mut session, ClientMessage::FindMatch).await;
        assert_eq!(state.queue.waiting_count().await, 1);

        MessageHandler::handle(&state, &mut session, ClientMessage::CancelFind).await;
        assert_eq!(state.queue.waiting_count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_forfeit_after_grace_period() {
        let state = test_state();
        let (mut alice, mut alice_rx) = new_session(&state);
        login(&state, &mut alice, "alice").await;

        MessageHandler::handle(
            &state,
            &mut alice,
            ClientMessage::CreateMatch {
                opponent: OpponentKind::Human,
                preferred_side: None,
            },
        )
        .await;
        let match_id = match alice_rx.recv().await.unwrap() {
            Outbound::Message(ServerMessage::MatchCreated { match_id, .. }) => match_id,
            other => panic!("unexpected event: {:?}", other),
        };
        next_snapshot(&mut alice_rx).await;

        let (mut bob, mut bob_rx) = new_session(&state);
        login(&state, &mut bob, "bob").await;
        MessageHandler::handle(&state, &mut bob, ClientMessage::JoinMatch { match_id }).await;
        bob_rx.recv().await.unwrap();
        next_snapshot(&mut alice_rx).await;

        // bob 掉线且宽限期内未归，alice 按 Forfeit 获胜
        cleanup_session(&state, &bob).await;
        drop(bob);
        tokio::time::sleep(Duration::from_millis(100)).await;

        let snapshot = next_snapshot(&mut alice_rx).await;
        assert_eq!(snapshot.winner, Some(Side::Goat));
        assert_eq!(snapshot.win_reason, Some(protocol::WinReason::Forfeit));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnect_within_grace_avoids_forfeit() {
        let state = test_state();
        let (mut alice, mut alice_rx) = new_session(&state);
        login(&state, &mut alice, "alice").await;

        MessageHandler::handle(
            &state,
            &mut alice,
            ClientMessage::CreateMatch {
                opponent: OpponentKind::Human,
                preferred_side: None,
            },
        )
        .await;
        let match_id = match alice_rx.recv().await.unwrap() {
            Outbound::Message(ServerMessage::MatchCreated { match_id, .. }) => match_id,
            other => panic!("unexpected event: {:?}", other),
        };

        let (mut bob, mut bob_rx) = new_session(&state);
        let bob_id = login(&state, &mut bob, "bob").await;
        MessageHandler::handle(&state, &mut bob, ClientMessage::JoinMatch { match_id }).await;
        bob_rx.recv().await.unwrap();

        // bob 掉线后在宽限期内重连
        cleanup_session(&state, &bob).await;
        drop(bob);
        tokio::time::sleep(Duration::from_millis(10)).await;

        let (mut bob2, mut bob2_rx) = new_session(&state);
        bob2.player = Some(bob_id);
        MessageHandler::handle(&state, &mut bob2, ClientMessage::JoinMatch { match_id }).await;
        match bob2_rx.recv().await.unwrap() {
            Outbound::Message(ServerMessage::MatchJoined { your_side, .. }) => {
                assert_eq!(your_side, Some(Side::Tiger))
            }
            other => panic!("unexpected event: {:?}", other),
        }

        tokio::time::sleep(Duration::from_millis(100)).await;

        // 宽限期过后没有判负
        let entry = state.registry.get(match_id).await.unwrap();
        let entry = entry.lock().await;
        assert!(entry.engine.state().winner.is_none());
    }

    #[tokio::test]
    async fn test_spectator_receives_snapshot() {
        let state = test_state();
        let (mut alice, mut alice_rx) = new_session(&state);
        login(&state, &mut alice, "alice").await;
        MessageHandler::handle(
            &state,
            &mut alice,
            ClientMessage::CreateMatch {
                opponent: OpponentKind::Human,
                preferred_side: None,
            },
        )
        .await;
        let match_id = match alice_rx.recv().await.unwrap() {
            Outbound::Message(ServerMessage::MatchCreated { match_id, .. }) => match_id,
            other => panic!("unexpected event: {:?}", other),
        };

        let (mut bob, mut bob_rx) = new_session(&state);
        login(&state, &mut bob, "bob").await;
        MessageHandler::handle(&state, &mut bob, ClientMessage::JoinMatch { match_id }).await;
        bob_rx.recv().await.unwrap();

        // 第三人加入时两个座位已满，成为观战者，仍收到快照
        let (mut carol, mut carol_rx) = new_session(&state);
        login(&state, &mut carol, "carol").await;
        MessageHandler::handle(&state, &mut carol, ClientMessage::JoinMatch { match_id }).await;

        match carol_rx.recv().await.unwrap() {
            Outbound::Message(ServerMessage::MatchJoined { your_side, .. }) => {
                assert_eq!(your_side, None)
            }
            other => panic!("unexpected event: {:?}", other),
        }
        let snapshot = next_snapshot(&mut carol_rx).await;
        assert_eq!(snapshot.match_id, match_id);
    }

    #[tokio::test]
    async fn test_stats_without_store() {
        let state = test_state();
        let (mut session, _rx) = new_session(&state);
        login(&state, &mut session, "alice").await;

        let reply =
            MessageHandler::handle(&state, &mut session, ClientMessage::FetchStats).await;
        assert!(matches!(
            reply,
            Some(ServerMessage::Stats { stats: None })
        ));
    }
}
