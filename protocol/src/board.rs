//! 棋盘与对局状态

use serde::{Deserialize, Serialize};

use crate::constants::{COMPUTER_PLAYER_ID, GOAT_COUNT, NODE_COUNT, VARIANT_TAG};
use crate::message::{MatchId, PlayerId};
use crate::moves::Move;
use crate::piece::{Cell, NodeId, Phase, Side, WinReason};
use crate::zobrist::ZobristTable;

/// 棋盘：23 个节点的格子状态
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    cells: [Cell; NODE_COUNT],
}

impl Board {
    /// 创建空棋盘
    pub fn empty() -> Self {
        Self {
            cells: [Cell::Empty; NODE_COUNT],
        }
    }

    /// 创建初始棋盘（3 只老虎位于顶部三角 0/1/2）
    pub fn initial() -> Self {
        let mut board = Self::empty();
        board.cells[0] = Cell::Tiger;
        board.cells[1] = Cell::Tiger;
        board.cells[2] = Cell::Tiger;
        board
    }

    /// 获取指定节点的格子状态
    pub fn get(&self, node: NodeId) -> Cell {
        self.cells[node as usize]
    }

    /// 设置指定节点的格子状态
    pub fn set(&mut self, node: NodeId, cell: Cell) {
        self.cells[node as usize] = cell;
    }

    /// 统计指定格子状态的数量
    pub fn count(&self, cell: Cell) -> usize {
        self.cells.iter().filter(|&&c| c == cell).count()
    }

    /// 指定阵营的全部棋子位置
    pub fn positions(&self, side: Side) -> Vec<NodeId> {
        let target = side.cell();
        (0..NODE_COUNT as NodeId)
            .filter(|&node| self.cells[node as usize] == target)
            .collect()
    }

    /// 全部格子
    pub fn cells(&self) -> &[Cell; NODE_COUNT] {
        &self.cells
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::initial()
    }
}

/// 完整对局状态（由规则引擎独占持有与修改）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    /// 对局 ID
    pub match_id: MatchId,
    /// 变体标识
    pub variant: String,
    /// 已应用走法计数（单调递增）
    pub turn_index: u32,
    /// 当前走子方
    pub active_side: Side,
    /// 对局阶段
    pub phase: Phase,
    /// 棋盘
    pub board: Board,
    /// 手中待放山羊数
    pub goats_in_hand: u8,
    /// 被吃山羊数
    pub goats_killed: u8,
    /// 已应用走法历史
    pub history: Vec<Move>,
    /// 当前局面指纹
    pub fingerprint: u64,
    /// 每步之后的指纹历史（含初始局面），用于重复局面计数
    pub fingerprint_history: Vec<u64>,
    /// 胜方
    pub winner: Option<Side>,
    /// 胜因
    pub win_reason: Option<WinReason>,
    /// 老虎方玩家（COMPUTER_PLAYER_ID 表示电脑）
    pub tiger_player: Option<PlayerId>,
    /// 山羊方玩家
    pub goat_player: Option<PlayerId>,
}

impl GameState {
    /// 创建初始状态：3 只老虎在顶部三角，15 只山羊在手，山羊先行
    pub fn initial(match_id: MatchId) -> Self {
        let board = Board::initial();
        let fingerprint = ZobristTable::shared().hash(&board, Side::Goat);
        Self {
            match_id,
            variant: VARIANT_TAG.to_string(),
            turn_index: 0,
            active_side: Side::Goat,
            phase: Phase::Placement,
            board,
            goats_in_hand: GOAT_COUNT,
            goats_killed: 0,
            history: Vec::new(),
            fingerprint,
            fingerprint_history: vec![fingerprint],
            winner: None,
            win_reason: None,
            tiger_player: None,
            goat_player: None,
        }
    }

    /// 指定阵营的已分配玩家
    pub fn player_for(&self, side: Side) -> Option<PlayerId> {
        match side {
            Side::Tiger => self.tiger_player,
            Side::Goat => self.goat_player,
        }
    }

    /// 分配指定阵营的玩家
    pub fn set_player(&mut self, side: Side, player: PlayerId) {
        match side {
            Side::Tiger => self.tiger_player = Some(player),
            Side::Goat => self.goat_player = Some(player),
        }
    }

    /// 指定阵营是否由电脑控制
    pub fn is_computer(&self, side: Side) -> bool {
        self.player_for(side) == Some(COMPUTER_PLAYER_ID)
    }

    /// 查找某个玩家执的阵营
    pub fn side_of(&self, player: PlayerId) -> Option<Side> {
        if self.tiger_player == Some(player) {
            Some(Side::Tiger)
        } else if self.goat_player == Some(player) {
            Some(Side::Goat)
        } else {
            None
        }
    }
}
