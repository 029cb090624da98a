//! 老虎棋服务端
//!
//! 包含:
//! - 对局注册表（每局独立串行化点）
//! - 连接广播器
//! - 先进先出匹配队列
//! - 断线判负看门狗
//! - 玩家管理
//! - 战绩存储边界

pub mod broadcast;
pub mod matchmaking;
pub mod player;
pub mod registry;
pub mod server;
pub mod stats;
pub mod watchdog;

pub use broadcast::{Broadcaster, ConnectionEntry};
pub use matchmaking::{MatchQueue, QueueEntry};
pub use player::{Player, PlayerManager};
pub use registry::{MatchEntry, MatchRegistry};
pub use server::{MessageHandler, ServerState};
pub use stats::{FileStatsStore, Outcome, StatsStore};
