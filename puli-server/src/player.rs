//! 玩家管理
//!
//! 匿名玩家只需一个昵称即可登录，服务端分配数字 ID 作为身份。

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;

use protocol::{PlayerId, MAX_NICKNAME_LEN};

/// 登录失败原因
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginError {
    /// 昵称为空
    #[error("Nickname is empty")]
    Empty,

    /// 昵称过长
    #[error("Nickname too long (max: {MAX_NICKNAME_LEN})")]
    TooLong,

    /// 昵称已被占用
    #[error("Nickname is already occupied")]
    Occupied,
}

/// 玩家信息
#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub nickname: String,
}

/// 玩家管理器
pub struct PlayerManager {
    /// 玩家 ID -> 玩家信息
    players: HashMap<PlayerId, Player>,
    /// 昵称 -> 玩家 ID（用于昵称唯一性检查）
    nickname_to_id: HashMap<String, PlayerId>,
    /// ID 生成器
    next_id: AtomicU64,
}

impl PlayerManager {
    pub fn new() -> Self {
        Self {
            players: HashMap::new(),
            nickname_to_id: HashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    fn generate_id(&self) -> PlayerId {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// 验证昵称
    pub fn validate_nickname(nickname: &str) -> Result<(), LoginError> {
        if nickname.is_empty() {
            return Err(LoginError::Empty);
        }
        if nickname.chars().count() > MAX_NICKNAME_LEN {
            return Err(LoginError::TooLong);
        }
        Ok(())
    }

    /// 登录玩家
    pub fn login(&mut self, nickname: String) -> Result<PlayerId, LoginError> {
        Self::validate_nickname(&nickname)?;

        if self.nickname_to_id.contains_key(&nickname) {
            return Err(LoginError::Occupied);
        }

        let id = self.generate_id();
        self.nickname_to_id.insert(nickname.clone(), id);
        self.players.insert(id, Player { id, nickname });

        Ok(id)
    }

    /// 移除玩家（彻底离线）
    pub fn remove(&mut self, player_id: PlayerId) -> Option<Player> {
        let player = self.players.remove(&player_id)?;
        self.nickname_to_id.remove(&player.nickname);
        Some(player)
    }

    /// 获取玩家昵称
    pub fn get_nickname(&self, player_id: PlayerId) -> Option<&str> {
        self.players.get(&player_id).map(|p| p.nickname.as_str())
    }

    /// 检查玩家是否存在
    pub fn exists(&self, player_id: PlayerId) -> bool {
        self.players.contains_key(&player_id)
    }

    /// 在线玩家数量
    pub fn online_count(&self) -> usize {
        self.players.len()
    }
}

impl Default for PlayerManager {
    fn default() -> Self {
        Self::new()
    }
}
