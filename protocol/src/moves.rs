//! 走法定义

use serde::{Deserialize, Serialize};

use crate::piece::{NodeId, Side};
use crate::topology::Topology;

/// 走法
///
/// `from` 为空表示放子（仅山羊放子阶段）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    /// 走子方
    pub side: Side,
    /// 起点
    pub from: Option<NodeId>,
    /// 终点
    pub to: NodeId,
}

impl Move {
    /// 创建放子走法
    pub fn placement(side: Side, to: NodeId) -> Self {
        Self {
            side,
            from: None,
            to,
        }
    }

    /// 创建移动/跳吃走法
    pub fn step(side: Side, from: NodeId, to: NodeId) -> Self {
        Self {
            side,
            from: Some(from),
            to,
        }
    }

    /// 紧凑文本记法
    ///
    /// 放子 `G+9`，移动 `T0-4`，跳吃 `T0x9`（非相邻即为跳吃）。
    pub fn text(&self) -> String {
        match self.from {
            None => format!("{}+{}", self.side.to_char(), self.to),
            Some(from) => {
                let sep = if Topology::shared().is_adjacent(from, self.to) {
                    '-'
                } else {
                    'x'
                };
                format!("{}{}{}{}", self.side.to_char(), from, sep, self.to)
            }
        }
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placement_text() {
        let mv = Move::placement(Side::Goat, 9);
        assert_eq!(mv.text(), "G+9");
    }

    #[test]
    fn test_step_text() {
        // 0 与 4 相邻
        let mv = Move::step(Side::Tiger, 0, 4);
        assert_eq!(mv.text(), "T0-4");
    }

    #[test]
    fn test_jump_text() {
        // 0 与 9 不相邻，沿扇形线跳吃
        let mv = Move::step(Side::Tiger, 0, 9);
        assert_eq!(mv.text(), "T0x9");
    }

    #[test]
    fn test_move_serialize() {
        let mv = Move::step(Side::Goat, 14, 19);
        let bytes = bincode::serialize(&mv).unwrap();
        let decoded: Move = bincode::deserialize(&bytes).unwrap();
        assert_eq!(decoded, mv);
    }
}
