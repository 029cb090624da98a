//! 搜索引擎
//!
//! 固定深度 Minimax。根节点候选走法用可注入种子的随机洗牌打乱，
//! 同分时保留先被评估的候选，因此固定种子即可复现结果。
//! 每个分支在独立的状态副本上推演，调用方的状态不受影响。

use protocol::{GameEngine, GameState, Move, Phase, Side};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::evaluate::Evaluator;

// 重导出 Difficulty 以便外部使用
pub use protocol::Difficulty;

/// AI 配置
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AiConfig {
    /// 搜索深度（步数，2 = 自己一步加对方最佳回应）
    pub depth: u8,
}

impl AiConfig {
    pub fn from_difficulty(difficulty: Difficulty) -> Self {
        match difficulty {
            Difficulty::Easy => Self { depth: 1 },
            Difficulty::Medium => Self { depth: 2 },
            Difficulty::Hard => Self { depth: 4 },
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self::from_difficulty(Difficulty::Medium)
    }
}

/// AI 引擎
pub struct AiEngine {
    config: AiConfig,
    rng: ChaCha8Rng,
}

impl AiEngine {
    /// 创建引擎（显式种子，固定种子可复现）
    pub fn seeded(config: AiConfig, seed: u64) -> Self {
        Self {
            config,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// 从难度创建
    pub fn from_difficulty(difficulty: Difficulty, seed: u64) -> Self {
        Self::seeded(AiConfig::from_difficulty(difficulty), seed)
    }

    /// 为指定阵营搜索一步走法
    ///
    /// 返回 `None` 表示该方当前无合法走法，调用方按困毙处理而非错误。
    pub fn choose_move(&mut self, state: &GameState, side: Side) -> Option<Move> {
        let engine = GameEngine::from_state(state.clone());
        let mut moves = engine.legal_moves(side);
        if moves.is_empty() {
            return None;
        }

        moves.shuffle(&mut self.rng);

        let mut best_move = None;
        let mut best_score = i32::MIN;

        for mv in &moves {
            let mut branch = GameEngine::from_state(state.clone());
            // 引擎生成的走法不应被拒绝，万一被拒绝则丢弃该分支
            if let Err(e) = branch.apply_move(mv) {
                debug!(%mv, error = %e, "discarding rejected search branch");
                continue;
            }

            let score = self.minimax(
                branch.state(),
                self.config.depth.saturating_sub(1),
                false,
                side,
            );
            if score > best_score {
                best_score = score;
                best_move = Some(*mv);
            }
        }

        best_move
    }

    /// 固定深度 Minimax（深度有界保证终止，无额外剪枝）
    fn minimax(&self, state: &GameState, depth: u8, maximizing: bool, ai_side: Side) -> i32 {
        if depth == 0 || state.phase == Phase::GameOver {
            return Evaluator::evaluate(state, ai_side);
        }

        let engine = GameEngine::from_state(state.clone());
        let moves = engine.legal_moves(state.active_side);
        // 无子可动的非终局节点按叶子评估，不再向下展开
        if moves.is_empty() {
            return Evaluator::evaluate(state, ai_side);
        }

        let mut best = if maximizing { i32::MIN } else { i32::MAX };
        for mv in &moves {
            let mut branch = GameEngine::from_state(state.clone());
            if branch.apply_move(mv).is_err() {
                continue;
            }
            let score = self.minimax(branch.state(), depth - 1, !maximizing, ai_side);
            best = if maximizing {
                best.max(score)
            } else {
                best.min(score)
            };
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::Layout;

    #[test]
    fn test_no_legal_moves_returns_none() {
        // 老虎被完全困住的局面
        let state = Layout::parse("TTTGGGEGGGGGEGGEEEEEEEE t 5 0").unwrap();
        let mut engine = AiEngine::seeded(AiConfig::default(), 42);

        assert_eq!(engine.choose_move(&state, Side::Tiger), None);
    }

    #[test]
    fn test_search_returns_legal_move() {
        let state = GameState::initial(1);
        let mut engine = AiEngine::seeded(AiConfig::default(), 42);

        let mv = engine.choose_move(&state, Side::Goat).unwrap();
        let mut sim = GameEngine::from_state(state);
        sim.apply_move(&mv).unwrap();
    }

    #[test]
    fn test_deterministic_with_fixed_seed() {
        let mut game = GameEngine::new(1);
        game.apply_move(&Move::placement(Side::Goat, 10)).unwrap();

        let mut a = AiEngine::seeded(AiConfig::default(), 7);
        let mut b = AiEngine::seeded(AiConfig::default(), 7);

        assert_eq!(
            a.choose_move(game.state(), Side::Tiger),
            b.choose_move(game.state(), Side::Tiger),
        );
    }

    #[test]
    fn test_tiger_takes_capture() {
        // 山羊刚放在 3，老虎应选择跳吃
        let mut game = GameEngine::new(1);
        game.apply_move(&Move::placement(Side::Goat, 3)).unwrap();

        let mut engine = AiEngine::seeded(AiConfig::default(), 42);
        let mv = engine.choose_move(game.state(), Side::Tiger).unwrap();

        game.apply_move(&mv).unwrap();
        assert_eq!(game.state().goats_killed, 1);
    }

    #[test]
    fn test_untouched_caller_state() {
        let state = GameState::initial(1);
        let before = state.clone();
        let mut engine = AiEngine::seeded(AiConfig::default(), 42);

        engine.choose_move(&state, Side::Goat).unwrap();
        assert_eq!(state, before);
    }

    #[test]
    fn test_difficulty_config() {
        assert_eq!(AiConfig::from_difficulty(Difficulty::Easy).depth, 1);
        assert_eq!(AiConfig::from_difficulty(Difficulty::Medium).depth, 2);
        assert_eq!(AiConfig::from_difficulty(Difficulty::Hard).depth, 4);
    }
}
