//! 老虎棋（Aadu Puli Aattam，3T-15G-23N 变体）共享协议库
//!
//! 包含:
//! - 棋盘拓扑、格子、走法等核心数据结构
//! - 规则引擎与回合状态机
//! - 局面指纹 (Zobrist 哈希)
//! - 消息类型定义 (ClientMessage, ServerMessage)
//! - 传输层抽象 (Connector, Connection, Listener traits) 与帧编解码
//! - 局面描述文本（测试用）

mod board;
mod constants;
mod engine;
mod error;
mod layout;
mod message;
mod moves;
mod piece;
mod topology;
mod transport;
mod zobrist;

pub use board::{Board, GameState};
pub use constants::*;
pub use engine::GameEngine;
pub use error::{GameError, ProtocolError, Result};
pub use layout::Layout;
pub use message::{
    ClientMessage, Difficulty, ErrorCode, MatchId, OpponentKind, PlayerId, PlayerStats,
    ServerMessage, StateSnapshot,
};
pub use moves::Move;
pub use piece::{Cell, NodeId, Phase, Side, WinReason};
pub use topology::{CaptureTriple, Topology};
pub use transport::{
    Connection, Connector, FrameReader, FrameWriter, Listener, TcpConnection, TcpConnector,
    TcpListener,
};
pub use zobrist::ZobristTable;
