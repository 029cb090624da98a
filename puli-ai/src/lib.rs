//! 老虎棋 AI 引擎
//!
//! 包含:
//! - 局面评估函数（子力 + 老虎机动性）
//! - 固定深度 Minimax 搜索，随机种子可注入以复现结果

mod evaluate;
mod search;

pub use evaluate::Evaluator;
pub use search::{AiConfig, AiEngine, Difficulty};
