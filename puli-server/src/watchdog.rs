//! 断线看门狗
//!
//! 已入座的玩家连接掉线后，等待宽限期再复查连接成员：到期时该身份
//! 仍未附着且对局未分出胜负，则判对面获胜（Forfeit）并广播终局快照。
//! 不维护可取消的定时器，宽限期内重连只是让到期复查扑空，本身不产生
//! 任何状态变化。

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use protocol::{MatchId, PlayerId, Side, StateSnapshot};

use crate::server::ServerState;

/// 为 (对局, 身份) 启动一次判负看门狗
pub fn spawn(
    state: Arc<ServerState>,
    match_id: MatchId,
    player: PlayerId,
    side: Side,
    grace: Duration,
) {
    tokio::spawn(async move {
        tokio::time::sleep(grace).await;
        expire(&state, match_id, player, side).await;
    });
}

/// 宽限期到期时的复查
pub async fn expire(state: &ServerState, match_id: MatchId, player: PlayerId, side: Side) {
    if state.broadcaster.is_attached(match_id, player).await {
        debug!(match_id, player, "player reconnected within grace period");
        return;
    }

    let Some(entry) = state.registry.get(match_id).await else {
        return;
    };

    let snapshot = {
        let mut entry = entry.lock().await;
        if entry.engine.state().winner.is_some() {
            return;
        }
        entry.engine.forfeit(side);
        info!(
            match_id,
            player, "forfeit declared after disconnect grace period"
        );
        state.record_outcome(entry.engine.state());
        StateSnapshot::from_state(entry.engine.state())
    };

    state.broadcaster.broadcast(match_id, snapshot).await;
}
