//! 局面评估函数

use protocol::{GameEngine, GameState, Side};

/// 决出胜负的局面分值
const WIN_SCORE: i32 = 10_000;

/// 每只被吃山羊的分值
const CAPTURE_WEIGHT: i32 = 100;

/// 老虎每个合法走法的分值
const MOBILITY_WEIGHT: i32 = 10;

/// 评估器
pub struct Evaluator;

impl Evaluator {
    /// 从搜索方视角评估局面（正值对搜索方有利）
    ///
    /// 子力权重压过机动性：每只被吃山羊 100 分，老虎每个合法走法 10 分，
    /// 搜索方执山羊时整体取负。
    pub fn evaluate(state: &GameState, ai_side: Side) -> i32 {
        if let Some(winner) = state.winner {
            return if winner == ai_side {
                WIN_SCORE
            } else {
                -WIN_SCORE
            };
        }

        let engine = GameEngine::from_state(state.clone());
        let tiger_moves = engine.legal_moves(Side::Tiger).len() as i32;

        let tiger_score =
            state.goats_killed as i32 * CAPTURE_WEIGHT + tiger_moves * MOBILITY_WEIGHT;

        match ai_side {
            Side::Tiger => tiger_score,
            Side::Goat => -tiger_score,
        }
    }
}
