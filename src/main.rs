//! IronVault 离线恢复工具
//!
//! 用法：`ironvault <request.json>`
//!
//! 读取恢复请求，校验 user / backup / custodian 密钥和目标地址，
//! 把扩展公钥摘要以 JSON 输出到 stdout。全程不访问网络。

use anyhow::{Context, Result};
use ironvault::{
    config::Config,
    domain::{CoinEngine, RecoveryRequest},
    infrastructure::{log_redact::SensitiveRedact, logging},
    CoreError,
};
use zeroize::Zeroizing;

fn main() -> Result<()> {
    // 1. 加载环境变量
    dotenvy::dotenv().ok();

    // 2. 加载配置（存在 CONFIG_PATH 时文件优先）
    let config = Config::from_env_and_file(std::env::var("CONFIG_PATH").ok())
        .context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    // 3. 初始化日志
    if let Err(e) = logging::init_logging(&config.logging) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    // 4. 读取恢复请求
    let path = std::env::args()
        .nth(1)
        .context("usage: ironvault <request.json>")?;
    let content = Zeroizing::new(
        std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read recovery request: {}", path))?,
    );
    let mut request: RecoveryRequest =
        serde_json::from_str(&content).context("Failed to parse recovery request")?;

    if request.passphrase.is_empty() {
        if let Ok(passphrase) = std::env::var("RECOVERY_PASSPHRASE") {
            request.passphrase = passphrase;
        }
    }

    let coin = request
        .coin
        .clone()
        .unwrap_or_else(|| config.recovery.default_coin.clone());
    tracing::info!(coin = %coin, request = %request.redact(), "loaded recovery request");

    // 5. 执行恢复校验
    let engine = CoinEngine::for_coin(&coin)
        .map_err(describe)?
        .with_vault(config.vault.to_vault());
    let summary = engine
        .initiate_recovery(&request)
        .map(|keys| keys.public_summary())
        .map_err(describe)?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

/// 在错误信息前加上稳定错误码
fn describe(err: CoreError) -> anyhow::Error {
    let code = err.code();
    anyhow::Error::new(err).context(format!("recovery failed [{}]", code))
}
