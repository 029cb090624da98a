//! 战绩存储
//!
//! 长期胜负记录（按身份与执方累计）的外部存储边界。核心逻辑不依赖
//! 存储可用：无后端时服务器全功能运行，登记悄悄跳过，查询返回空。

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use protocol::{PlayerId, PlayerStats, Side};

/// 单局结果（单个玩家视角）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Win,
    Loss,
    Draw,
}

/// 战绩存储接口
pub trait StatsStore: Send + Sync {
    /// 登记一局结果
    fn record(&self, player: PlayerId, role: Side, outcome: Outcome) -> Result<()>;

    /// 查询战绩，没有记录时返回 None
    fn fetch(&self, player: PlayerId) -> Result<Option<PlayerStats>>;
}

/// 存档文件内容
#[derive(Debug, Default, Serialize, Deserialize)]
struct StatsFile {
    players: HashMap<PlayerId, StoredStats>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct StoredStats {
    #[serde(flatten)]
    stats: PlayerStats,
    updated_at: Option<DateTime<Utc>>,
}

/// JSON 文件实现
pub struct FileStatsStore {
    path: PathBuf,
    /// 读改写需要整体互斥
    lock: Mutex<()>,
}

impl FileStatsStore {
    /// 使用平台数据目录下的默认位置
    pub fn open_default() -> Result<Self> {
        let dir = dirs::data_dir()
            .context("no platform data directory")?
            .join("puli-server");
        Self::open(dir)
    }

    /// 使用指定目录
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("cannot create stats directory: {:?}", dir))?;

        Ok(Self {
            path: dir.join("stats.json"),
            lock: Mutex::new(()),
        })
    }

    fn load(&self) -> Result<StatsFile> {
        if !self.path.exists() {
            return Ok(StatsFile::default());
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("cannot read stats file: {:?}", self.path))?;
        serde_json::from_str(&content).context("stats file is corrupted")
    }

    fn save(&self, file: &StatsFile) -> Result<()> {
        let content = serde_json::to_string_pretty(file).context("cannot serialize stats")?;
        fs::write(&self.path, content)
            .with_context(|| format!("cannot write stats file: {:?}", self.path))
    }
}

impl StatsStore for FileStatsStore {
    fn record(&self, player: PlayerId, role: Side, outcome: Outcome) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut file = self.load()?;
        let entry = file.players.entry(player).or_default();
        apply_outcome(&mut entry.stats, role, outcome);
        entry.updated_at = Some(Utc::now());

        self.save(&file)
    }

    fn fetch(&self, player: PlayerId) -> Result<Option<PlayerStats>> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        let file = self.load()?;
        Ok(file.players.get(&player).map(|s| s.stats.clone()))
    }
}

/// 总计数与执方计数各累加一次
fn apply_outcome(stats: &mut PlayerStats, role: Side, outcome: Outcome) {
    match outcome {
        Outcome::Win => stats.total_wins += 1,
        Outcome::Loss => stats.total_losses += 1,
        Outcome::Draw => stats.total_draws += 1,
    }
    match (role, outcome) {
        (Side::Tiger, Outcome::Win) => stats.tiger_wins += 1,
        (Side::Tiger, Outcome::Loss) => stats.tiger_losses += 1,
        (Side::Tiger, Outcome::Draw) => stats.tiger_draws += 1,
        (Side::Goat, Outcome::Win) => stats.goat_wins += 1,
        (Side::Goat, Outcome::Loss) => stats.goat_losses += 1,
        (Side::Goat, Outcome::Draw) => stats.goat_draws += 1,
    }
}
