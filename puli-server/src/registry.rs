//! 对局注册表
//!
//! 对局 ID 到活动对局的映射。每个对局入口有独立的互斥锁，作为该对局
//! 全部读改写的串行化点：同一对局的并发走法请求互斥，互不相关的对局
//! 并行推进。注册表本身不回收对局，回收策略在核心之外。

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;

use protocol::{GameEngine, MatchId, OpponentKind, PlayerId, Side, COMPUTER_PLAYER_ID};
use puli_ai::AiEngine;

/// 一局对局：规则引擎 + 人机对局的电脑引擎
pub struct MatchEntry {
    pub engine: GameEngine,
    /// 电脑对手（仅人机对局）
    pub ai: Option<AiEngine>,
}

impl MatchEntry {
    /// 电脑执的阵营（如果有）
    pub fn computer_side(&self) -> Option<Side> {
        [Side::Tiger, Side::Goat]
            .into_iter()
            .find(|&side| self.engine.state().is_computer(side))
    }
}

/// 对局注册表
pub struct MatchRegistry {
    matches: Mutex<HashMap<MatchId, Arc<Mutex<MatchEntry>>>>,
    next_id: AtomicU64,
}

impl MatchRegistry {
    pub fn new() -> Self {
        Self {
            matches: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    fn generate_id(&self) -> MatchId {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// 创建对局
    ///
    /// 创建者入座偏好阵营（默认山羊）；人机对局时对面由电脑执掌，
    /// 电脑引擎使用调用方提供的种子。
    pub async fn create(
        &self,
        creator: PlayerId,
        opponent: OpponentKind,
        preferred_side: Option<Side>,
        ai_seed: u64,
    ) -> (MatchId, Side) {
        let match_id = self.generate_id();
        let your_side = preferred_side.unwrap_or(Side::Goat);

        let mut engine = GameEngine::new(match_id);
        engine.assign_player(your_side, creator);

        let ai = match opponent {
            OpponentKind::Human => None,
            OpponentKind::Computer(difficulty) => {
                engine.assign_player(your_side.opponent(), COMPUTER_PLAYER_ID);
                Some(AiEngine::from_difficulty(difficulty, ai_seed))
            }
        };

        let entry = Arc::new(Mutex::new(MatchEntry { engine, ai }));
        self.matches.lock().await.insert(match_id, entry);

        (match_id, your_side)
    }

    /// 为匹配队列创建双人对局（第一位执虎，第二位执羊）
    pub async fn create_paired(&self, tiger: PlayerId, goat: PlayerId) -> MatchId {
        let match_id = self.generate_id();

        let mut engine = GameEngine::new(match_id);
        engine.assign_player(Side::Tiger, tiger);
        engine.assign_player(Side::Goat, goat);

        let entry = Arc::new(Mutex::new(MatchEntry { engine, ai: None }));
        self.matches.lock().await.insert(match_id, entry);

        match_id
    }

    /// 查找对局
    pub async fn get(&self, match_id: MatchId) -> Option<Arc<Mutex<MatchEntry>>> {
        self.matches.lock().await.get(&match_id).cloned()
    }

    /// 当前对局数量
    pub async fn count(&self) -> usize {
        self.matches.lock().await.len()
    }
}

impl Default for MatchRegistry {
    fn default() -> Self {
        Self::new()
    }
}
