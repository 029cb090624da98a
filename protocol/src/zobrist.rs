//! Zobrist 哈希
//!
//! 为局面（棋盘 + 走子方）生成固定宽度指纹，支持 O(1) 增量更新，
//! 用于局面相等比较与重复局面计数。碰撞按生日界概率容忍，不做消除。

use std::sync::OnceLock;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::board::Board;
use crate::constants::NODE_COUNT;
use crate::piece::{Cell, NodeId, Side};

/// Zobrist 哈希表
///
/// 为每个 (节点, 棋子) 组合分配固定随机值，外加一项"轮到老虎走子"。
/// 局面指纹为所有占用格子随机值与走子方项的异或。
pub struct ZobristTable {
    /// 棋子哈希值 [occupant][node]，occupant: 0=Tiger, 1=Goat
    pieces: [[u64; NODE_COUNT]; 2],
    /// 轮到老虎走子的哈希项
    tiger_to_move: u64,
}

impl ZobristTable {
    /// 获取全局共享表
    pub fn shared() -> &'static ZobristTable {
        static TABLE: OnceLock<ZobristTable> = OnceLock::new();
        TABLE.get_or_init(ZobristTable::new)
    }

    /// 创建新表（固定种子保证跨进程确定性）
    pub fn new() -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(0x00AD_0B0A_1A23_0003);

        let mut pieces = [[0u64; NODE_COUNT]; 2];
        for occupant in pieces.iter_mut() {
            for value in occupant.iter_mut() {
                *value = rng.gen();
            }
        }

        Self {
            pieces,
            tiger_to_move: rng.gen(),
        }
    }

    /// 计算局面的完整指纹
    pub fn hash(&self, board: &Board, to_move: Side) -> u64 {
        let mut hash = 0u64;

        for node in 0..NODE_COUNT as NodeId {
            match board.get(node) {
                Cell::Tiger => hash ^= self.piece_hash(Side::Tiger, node),
                Cell::Goat => hash ^= self.piece_hash(Side::Goat, node),
                Cell::Empty => {}
            }
        }

        if to_move == Side::Tiger {
            hash ^= self.tiger_to_move;
        }

        hash
    }

    /// 获取 (阵营棋子, 节点) 的哈希项
    #[inline]
    pub fn piece_hash(&self, side: Side, node: NodeId) -> u64 {
        let occupant = match side {
            Side::Tiger => 0,
            Side::Goat => 1,
        };
        self.pieces[occupant][node as usize]
    }

    /// 获取走子方切换的哈希项
    #[inline]
    pub fn side_hash(&self) -> u64 {
        self.tiger_to_move
    }
}

impl Default for ZobristTable {
    fn default() -> Self {
        Self::new()
    }
}
