//! 规则引擎与回合状态机
//!
//! 每局对局由一个 `GameEngine` 独占持有状态：校验并应用走法、
//! 生成合法走法、判定终局、增量维护局面指纹。
//! 阶段单向推进：放子 → 行棋 → 结束。

use crate::board::GameState;
use crate::constants::{CAPTURE_LIMIT, NODE_COUNT};
use crate::error::GameError;
use crate::message::{MatchId, PlayerId};
use crate::moves::Move;
use crate::piece::{Cell, NodeId, Phase, Side, WinReason};
use crate::topology::Topology;
use crate::zobrist::ZobristTable;

/// 规则引擎
#[derive(Debug, Clone)]
pub struct GameEngine {
    state: GameState,
}

impl GameEngine {
    /// 创建新对局
    pub fn new(match_id: MatchId) -> Self {
        Self {
            state: GameState::initial(match_id),
        }
    }

    /// 从已有状态恢复（搜索模拟、测试布局用）
    pub fn from_state(state: GameState) -> Self {
        Self { state }
    }

    /// 当前对局状态
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// 分配指定阵营的玩家
    pub fn assign_player(&mut self, side: Side, player: PlayerId) {
        self.state.set_player(side, player);
    }

    /// 校验并应用一步走法
    ///
    /// 所有校验在任何修改之前完成：返回错误时状态完全不变。
    /// 成功后依次：更新棋盘与指纹、记录历史、判定终局；
    /// 若未分出胜负，手中山羊清零的瞬间切换到行棋阶段，随后正常换边。
    pub fn apply_move(&mut self, mv: &Move) -> Result<(), GameError> {
        if self.state.phase == Phase::GameOver {
            return Err(GameError::GameOver);
        }
        if mv.side != self.state.active_side {
            return Err(GameError::WrongTurn);
        }
        if !Topology::contains(mv.to) {
            return Err(GameError::InvalidNode(mv.to));
        }
        if let Some(from) = mv.from {
            if !Topology::contains(from) {
                return Err(GameError::InvalidNode(from));
            }
        }

        match (self.state.phase, mv.side) {
            (Phase::Placement, Side::Goat) => self.place_goat(mv)?,
            // 老虎在放子阶段即可移动/跳吃
            _ => self.move_piece(mv)?,
        }

        self.state.history.push(*mv);
        self.check_terminal();

        if self.state.winner.is_none() {
            if self.state.phase == Phase::Placement && self.state.goats_in_hand == 0 {
                self.state.phase = Phase::Movement;
            }
            self.toggle_side();
        }
        self.state.turn_index += 1;
        self.state.fingerprint_history.push(self.state.fingerprint);

        Ok(())
    }

    /// 放子阶段的山羊走法
    fn place_goat(&mut self, mv: &Move) -> Result<(), GameError> {
        if mv.from.is_some() {
            // 放子阶段山羊只能放子，不能移动
            return Err(GameError::IllegalMove);
        }
        if self.state.board.get(mv.to) != Cell::Empty {
            return Err(GameError::NotEmpty);
        }

        self.state.board.set(mv.to, Cell::Goat);
        self.state.fingerprint ^= ZobristTable::shared().piece_hash(Side::Goat, mv.to);
        self.state.goats_in_hand -= 1;
        Ok(())
    }

    /// 移动或跳吃
    fn move_piece(&mut self, mv: &Move) -> Result<(), GameError> {
        let from = mv.from.ok_or(GameError::NoSource)?;
        let side = mv.side;

        if self.state.board.get(from) != side.cell() {
            return Err(GameError::WrongPiece);
        }
        if self.state.board.get(mv.to) != Cell::Empty {
            return Err(GameError::NotEmpty);
        }

        let topo = Topology::shared();
        let zobrist = ZobristTable::shared();

        if topo.is_adjacent(from, mv.to) {
            self.state.board.set(from, Cell::Empty);
            self.state.board.set(mv.to, side.cell());
            self.state.fingerprint ^=
                zobrist.piece_hash(side, from) ^ zobrist.piece_hash(side, mv.to);
            return Ok(());
        }

        if side == Side::Tiger {
            if let Some(triple) = topo.jumps_from(from).iter().find(|t| t.landing == mv.to) {
                if self.state.board.get(triple.over) != Cell::Goat {
                    return Err(GameError::MustJumpOverGoat);
                }
                self.state.board.set(from, Cell::Empty);
                self.state.board.set(triple.over, Cell::Empty);
                self.state.board.set(mv.to, Cell::Tiger);
                self.state.fingerprint ^= zobrist.piece_hash(Side::Tiger, from)
                    ^ zobrist.piece_hash(Side::Tiger, mv.to)
                    ^ zobrist.piece_hash(Side::Goat, triple.over);
                self.state.goats_killed += 1;
                return Ok(());
            }
        }

        // 山羊不能跳吃，非相邻移动一律非法
        Err(GameError::IllegalMove)
    }

    /// 切换走子方并翻转指纹中的走子方项
    fn toggle_side(&mut self) {
        self.state.active_side = self.state.active_side.opponent();
        self.state.fingerprint ^= ZobristTable::shared().side_hash();
    }

    /// 终局判定，每步成功走法之后调用
    ///
    /// 优先级：吃满山羊 > 老虎无子可动。
    fn check_terminal(&mut self) {
        if self.state.goats_killed >= CAPTURE_LIMIT {
            self.finish(Side::Tiger, WinReason::CaptureLimit);
            return;
        }
        if !self.any_tiger_can_move() {
            self.finish(Side::Goat, WinReason::Stalemate);
        }
    }

    /// 是否存在至少一只可动的老虎（相邻空格或可跳吃）
    fn any_tiger_can_move(&self) -> bool {
        let topo = Topology::shared();
        for node in self.state.board.positions(Side::Tiger) {
            if topo
                .neighbors(node)
                .iter()
                .any(|&n| self.state.board.get(n) == Cell::Empty)
            {
                return true;
            }
            if topo.jumps_from(node).iter().any(|t| {
                self.state.board.get(t.over) == Cell::Goat
                    && self.state.board.get(t.landing) == Cell::Empty
            }) {
                return true;
            }
        }
        false
    }

    fn finish(&mut self, winner: Side, reason: WinReason) {
        self.state.winner = Some(winner);
        self.state.win_reason = Some(reason);
        self.state.phase = Phase::GameOver;
    }

    /// 断线弃权判负：败方为 `loser`，对方获胜
    ///
    /// 对局已结束时不做任何修改。
    pub fn forfeit(&mut self, loser: Side) {
        if self.state.phase != Phase::GameOver {
            self.finish(loser.opponent(), WinReason::Forfeit);
        }
    }

    /// 生成指定阵营当前的全部合法走法
    ///
    /// 放子阶段的山羊：每个空格一个放子走法；
    /// 其余情况：每对 (棋子, 相邻空格) 一个移动走法，
    /// 老虎另加每条可用跳吃线一个跳吃走法。
    pub fn legal_moves(&self, side: Side) -> Vec<Move> {
        if self.state.phase == Phase::GameOver {
            return Vec::new();
        }

        let mut moves = Vec::new();

        if self.state.phase == Phase::Placement && side == Side::Goat {
            for node in 0..NODE_COUNT as NodeId {
                if self.state.board.get(node) == Cell::Empty {
                    moves.push(Move::placement(side, node));
                }
            }
            return moves;
        }

        let topo = Topology::shared();
        for from in self.state.board.positions(side) {
            for &to in topo.neighbors(from) {
                if self.state.board.get(to) == Cell::Empty {
                    moves.push(Move::step(side, from, to));
                }
            }
            if side == Side::Tiger {
                for t in topo.jumps_from(from) {
                    if self.state.board.get(t.over) == Cell::Goat
                        && self.state.board.get(t.landing) == Cell::Empty
                    {
                        moves.push(Move::step(side, from, t.landing));
                    }
                }
            }
        }
        moves
    }

    /// 当前指纹在整局历史中出现的次数（含当前局面）
    pub fn repetition_count(&self) -> usize {
        let fp = self.state.fingerprint;
        self.state
            .fingerprint_history
            .iter()
            .filter(|&&h| h == fp)
            .count()
    }
}
