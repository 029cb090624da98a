//! 协议常量定义

use std::time::Duration;

/// 协议版本号
pub const PROTOCOL_VERSION: u8 = 1;

/// 棋盘节点数
pub const NODE_COUNT: usize = 23;

/// 老虎数量（始终全部在棋盘上）
pub const TIGER_COUNT: usize = 3;

/// 山羊总数（手中 + 棋盘上 + 被吃之和恒定）
pub const GOAT_COUNT: u8 = 15;

/// 老虎获胜所需吃羊数
pub const CAPTURE_LIMIT: u8 = 5;

/// 棋盘变体标识
pub const VARIANT_TAG: &str = "3T-15G-23N";

/// 昵称最大长度
pub const MAX_NICKNAME_LEN: usize = 20;

/// 消息帧最大大小
pub const MAX_FRAME_SIZE: usize = 65536;

/// 客户端心跳间隔（秒）
pub const HEARTBEAT_INTERVAL_SECS: u64 = 10;

/// 服务端心跳超时（秒）- 超过此时间无消息则断开
pub const HEARTBEAT_TIMEOUT_SECS: u64 = 30;

/// 连接超时（秒）
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// 断线判负宽限期（秒）
pub const FORFEIT_GRACE_SECS: u64 = 15;

/// 电脑玩家 ID（使用最大值避免与真实玩家 ID 冲突）
pub const COMPUTER_PLAYER_ID: u64 = u64::MAX;

/// 心跳间隔 Duration
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(HEARTBEAT_INTERVAL_SECS);

/// 心跳超时 Duration
pub const HEARTBEAT_TIMEOUT: Duration = Duration::from_secs(HEARTBEAT_TIMEOUT_SECS);

/// 连接超时 Duration
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(CONNECT_TIMEOUT_SECS);

/// 断线判负宽限期 Duration
pub const FORFEIT_GRACE: Duration = Duration::from_secs(FORFEIT_GRACE_SECS);
