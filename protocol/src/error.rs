//! 错误类型定义

use thiserror::Error;

/// 规则错误
///
/// 所有校验在任何状态修改之前完成：返回错误时对局状态保持不变。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    /// 对局已结束
    #[error("Game is already over")]
    GameOver,

    /// 不是该方的回合
    #[error("Not your turn")]
    WrongTurn,

    /// 目标节点非空
    #[error("Target node is not empty")]
    NotEmpty,

    /// 起点棋子与走子方不符
    #[error("Source node does not hold your piece")]
    WrongPiece,

    /// 行棋走法缺少起点
    #[error("Source node required for movement")]
    NoSource,

    /// 跳吃必须越过一只山羊
    #[error("Must jump over a goat")]
    MustJumpOverGoat,

    /// 既不相邻也没有匹配的跳吃线
    #[error("Illegal move")]
    IllegalMove,

    /// 节点编号越界
    #[error("Invalid node index: {0}")]
    InvalidNode(u8),

    /// 无效的局面描述文本
    #[error("Invalid layout string: {reason}")]
    InvalidLayout { reason: String },
}

/// 协议错误类型
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// IO 错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 序列化错误（bincode）
    #[error("Bincode serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    /// JSON 序列化错误
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// 协议版本不匹配
    #[error("Protocol version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: u8, actual: u8 },

    /// 帧大小超限
    #[error("Frame too large: {size} bytes (max: {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// 连接超时
    #[error("Connection timeout")]
    ConnectionTimeout,

    /// 连接已关闭
    #[error("Connection closed")]
    ConnectionClosed,

    /// 规则错误
    #[error("Game error: {0}")]
    Game(#[from] GameError),
}

/// 协议操作结果类型
pub type Result<T> = std::result::Result<T, ProtocolError>;
