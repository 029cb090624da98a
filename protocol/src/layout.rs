//! 局面描述文本
//!
//! 形如 `"TTTGEEEEEEEEEEEEEEEEEEE t 10 4"`：23 个格子字符（T/G/E）、
//! 走子方（t/g）、手中山羊数、被吃山羊数。用于在测试中直接构造
//! 任意中盘局面，并校验棋子数量守恒。

use crate::board::{Board, GameState};
use crate::constants::{CAPTURE_LIMIT, GOAT_COUNT, NODE_COUNT, TIGER_COUNT, VARIANT_TAG};
use crate::error::GameError;
use crate::piece::{Cell, NodeId, Phase, Side};
use crate::zobrist::ZobristTable;

/// 局面描述的解析与格式化
pub struct Layout;

impl Layout {
    /// 解析局面描述文本
    pub fn parse(text: &str) -> Result<GameState, GameError> {
        let mut parts = text.split_whitespace();

        let cells = parts.next().ok_or_else(|| invalid("missing board field"))?;
        let side = parts.next().ok_or_else(|| invalid("missing side field"))?;
        let in_hand = parts
            .next()
            .ok_or_else(|| invalid("missing goats-in-hand field"))?;
        let killed = parts
            .next()
            .ok_or_else(|| invalid("missing goats-killed field"))?;
        if parts.next().is_some() {
            return Err(invalid("trailing fields"));
        }

        if cells.chars().count() != NODE_COUNT {
            return Err(invalid("board field must have 23 cells"));
        }
        let mut board = Board::empty();
        for (i, c) in cells.chars().enumerate() {
            let cell = Cell::from_char(c)
                .ok_or_else(|| invalid(&format!("unknown cell char '{}'", c)))?;
            board.set(i as NodeId, cell);
        }

        let active_side = match side {
            "t" | "T" => Side::Tiger,
            "g" | "G" => Side::Goat,
            _ => return Err(invalid("side must be 't' or 'g'")),
        };

        let goats_in_hand: u8 = in_hand
            .parse()
            .map_err(|_| invalid("goats-in-hand must be a number"))?;
        let goats_killed: u8 = killed
            .parse()
            .map_err(|_| invalid("goats-killed must be a number"))?;

        if board.count(Cell::Tiger) != TIGER_COUNT {
            return Err(invalid("board must hold exactly 3 tigers"));
        }
        if board.count(Cell::Goat) as u8 + goats_in_hand + goats_killed != GOAT_COUNT {
            return Err(invalid("goat accounting must sum to 15"));
        }
        if goats_killed > CAPTURE_LIMIT {
            return Err(invalid("goats-killed exceeds the capture limit"));
        }

        let phase = if goats_in_hand > 0 {
            Phase::Placement
        } else {
            Phase::Movement
        };
        let fingerprint = ZobristTable::shared().hash(&board, active_side);

        Ok(GameState {
            match_id: 0,
            variant: VARIANT_TAG.to_string(),
            turn_index: 0,
            active_side,
            phase,
            board,
            goats_in_hand,
            goats_killed,
            history: Vec::new(),
            fingerprint,
            fingerprint_history: vec![fingerprint],
            winner: None,
            win_reason: None,
            tiger_player: None,
            goat_player: None,
        })
    }

    /// 格式化为局面描述文本
    pub fn format(state: &GameState) -> String {
        let cells: String = state.board.cells().iter().map(Cell::to_char).collect();
        let side = match state.active_side {
            Side::Tiger => 't',
            Side::Goat => 'g',
        };
        format!(
            "{} {} {} {}",
            cells, side, state.goats_in_hand, state.goats_killed
        )
    }
}

fn invalid(reason: &str) -> GameError {
    GameError::InvalidLayout {
        reason: reason.to_string(),
    }
}
