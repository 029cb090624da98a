//! 棋子与对局基础类型

use serde::{Deserialize, Serialize};

/// 节点编号 (0..23)
pub type NodeId = u8;

/// 阵营
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// 老虎方（3 枚，可跳吃）
    Tiger,
    /// 山羊方（15 枚，先手放子）
    Goat,
}

impl Side {
    /// 获取对方阵营
    pub fn opponent(&self) -> Side {
        match self {
            Side::Tiger => Side::Goat,
            Side::Goat => Side::Tiger,
        }
    }

    /// 该阵营棋子对应的格子状态
    pub fn cell(&self) -> Cell {
        match self {
            Side::Tiger => Cell::Tiger,
            Side::Goat => Cell::Goat,
        }
    }

    /// 记法字符
    pub fn to_char(&self) -> char {
        match self {
            Side::Tiger => 'T',
            Side::Goat => 'G',
        }
    }
}

/// 格子状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cell {
    Tiger,
    Goat,
    Empty,
}

impl Cell {
    /// 局面文本字符
    pub fn to_char(&self) -> char {
        match self {
            Cell::Tiger => 'T',
            Cell::Goat => 'G',
            Cell::Empty => 'E',
        }
    }

    /// 从局面文本字符解析
    pub fn from_char(c: char) -> Option<Cell> {
        match c {
            'T' => Some(Cell::Tiger),
            'G' => Some(Cell::Goat),
            'E' => Some(Cell::Empty),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }
}

/// 对局阶段（单向推进：放子 → 行棋 → 结束）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// 放子阶段：山羊只能向空格放子，老虎已可移动/跳吃
    Placement,
    /// 行棋阶段：所有山羊放置完毕，双方移动已有棋子
    Movement,
    /// 对局结束（终态）
    GameOver,
}

/// 胜利原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WinReason {
    /// 老虎吃满山羊
    CaptureLimit,
    /// 老虎无子可动
    Stalemate,
    /// 重复局面（保留字段，阈值未定义，引擎不会主动判出）
    Repetition,
    /// 对方断线弃权
    Forfeit,
}
