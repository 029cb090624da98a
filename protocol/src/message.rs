//! 消息类型定义

use serde::{Deserialize, Serialize};

use crate::board::{Board, GameState};
use crate::piece::{NodeId, Phase, Side, WinReason};

/// 玩家 ID
pub type PlayerId = u64;

/// 对局 ID
pub type MatchId = u64;

/// 对手类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpponentKind {
    /// 等待真人加入
    Human,
    /// 电脑对手
    Computer(Difficulty),
}

/// 电脑难度（搜索深度档位）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    /// 简单：depth=1
    Easy,
    /// 中等：depth=2（参考默认值）
    Medium,
    /// 困难：depth=4
    Hard,
}

/// 玩家战绩（按身份与执方累计）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub total_wins: u32,
    pub total_losses: u32,
    pub total_draws: u32,
    pub tiger_wins: u32,
    pub tiger_losses: u32,
    pub tiger_draws: u32,
    pub goat_wins: u32,
    pub goat_losses: u32,
    pub goat_draws: u32,
}

/// 全量状态快照，每次状态变化推送给对局的所有连接
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub match_id: MatchId,
    pub variant: String,
    pub turn_index: u32,
    pub active_side: Side,
    pub phase: Phase,
    pub board: Board,
    pub goats_in_hand: u8,
    pub goats_killed: u8,
    /// 走法历史（紧凑文本记法）
    pub history: Vec<String>,
    /// 局面指纹（不透明十六进制串）
    pub fingerprint: String,
    pub winner: Option<Side>,
    pub win_reason: Option<WinReason>,
    pub tiger_player: Option<PlayerId>,
    pub goat_player: Option<PlayerId>,
}

impl StateSnapshot {
    /// 从对局状态构建
    pub fn from_state(state: &GameState) -> Self {
        Self {
            match_id: state.match_id,
            variant: state.variant.clone(),
            turn_index: state.turn_index,
            active_side: state.active_side,
            phase: state.phase,
            board: state.board.clone(),
            goats_in_hand: state.goats_in_hand,
            goats_killed: state.goats_killed,
            history: state.history.iter().map(|m| m.text()).collect(),
            fingerprint: format!("{:016x}", state.fingerprint),
            winner: state.winner,
            win_reason: state.win_reason,
            tiger_player: state.tiger_player,
            goat_player: state.goat_player,
        }
    }
}

/// 客户端发送给服务端的消息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ClientMessage {
    // === 身份 ===
    /// 匿名登录
    Login { nickname: String },

    // === 对局操作 ===
    /// 创建对局（默认执山羊）
    CreateMatch {
        opponent: OpponentKind,
        preferred_side: Option<Side>,
    },
    /// 加入对局：有空位则入座，否则观战
    JoinMatch { match_id: MatchId },
    /// 提交走法
    MakeMove {
        side: Side,
        from: Option<NodeId>,
        to: NodeId,
    },

    // === 匹配队列 ===
    /// 进入匹配队列
    FindMatch,
    /// 离开匹配队列
    CancelFind,

    // === 战绩 ===
    /// 查询自己的战绩
    FetchStats,

    // === 心跳 ===
    /// 心跳请求
    Ping,
}

/// 服务端发送给客户端的消息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ServerMessage {
    // === 身份 ===
    /// 登录成功
    LoginSuccess { player_id: PlayerId },

    // === 对局事件 ===
    /// 对局创建成功
    MatchCreated { match_id: MatchId, your_side: Side },
    /// 加入成功（`your_side` 为空表示观战）
    MatchJoined {
        match_id: MatchId,
        your_side: Option<Side>,
    },
    /// 全量状态快照
    Snapshot { snapshot: StateSnapshot },

    // === 匹配队列 ===
    /// 匹配成功，随后本连接关闭，客户端应重新连接加入对局
    MatchFound { match_id: MatchId, your_side: Side },

    // === 战绩 ===
    /// 战绩查询结果（无存储后端时为空）
    Stats { stats: Option<PlayerStats> },

    // === 心跳 ===
    /// 心跳响应
    Pong,

    // === 错误 ===
    /// 错误消息
    Error { code: ErrorCode, message: String },
}

/// 错误码定义
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u16)]
pub enum ErrorCode {
    // === 对局相关 (1xx) ===
    /// 对局不存在
    MatchNotFound = 100,
    /// 不在对局中
    NotInMatch = 101,

    // === 走法相关 (2xx) ===
    /// 不是该方回合
    WrongTurn = 200,
    /// 非法走法
    IllegalMove = 201,
    /// 对局已结束
    GameAlreadyOver = 202,
    /// 该阵营已由其他玩家执掌
    Unauthorized = 203,

    // === 玩家相关 (3xx) ===
    /// 无效昵称
    InvalidNickname = 300,
    /// 昵称已被占用
    NicknameOccupied = 301,
    /// 未登录
    NotLoggedIn = 302,

    // === 系统相关 (5xx) ===
    /// 内部错误
    InternalError = 500,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}
