use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use puli_server::stats::{FileStatsStore, StatsStore};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("puli_server=debug".parse()?),
        )
        .init();

    let addr = std::env::var("PULI_LISTEN").unwrap_or_else(|_| "127.0.0.1:8523".to_string());

    // 战绩存储不可用时仅告警，服务器照常运行
    let stats: Option<Box<dyn StatsStore>> = match FileStatsStore::open_default() {
        Ok(store) => Some(Box::new(store)),
        Err(e) => {
            warn!(error = %e, "stats store unavailable, continuing without it");
            None
        }
    };

    info!("老虎棋服务端启动中...");
    puli_server::server::run(&addr, stats).await
}
