//! 配置管理模块
//! 支持从环境变量和配置文件加载配置

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::coin_config;
use crate::infrastructure::encryption::PassphraseVault;
use crate::infrastructure::pbkdf2::{DEFAULT_ITERATIONS, MAX_ITERATIONS};

/// 应用配置结构体
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub vault: VaultConfig,
    #[serde(default)]
    pub recovery: RecoveryConfig,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "text"
}

/// 口令加密配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultConfig {
    /// 新加密密钥使用的 PBKDF2 迭代次数
    pub pbkdf2_iterations: u32,
    /// 解密时接受的最大迭代次数
    pub max_pbkdf2_iterations: u32,
}

/// 恢复流程配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryConfig {
    /// 请求里没有写币种时使用
    pub default_coin: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            format: std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".into()),
        }
    }
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            pbkdf2_iterations: std::env::var("VAULT_PBKDF2_ITERATIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_ITERATIONS),
            max_pbkdf2_iterations: std::env::var("VAULT_MAX_PBKDF2_ITERATIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(MAX_ITERATIONS),
        }
    }
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            default_coin: std::env::var("RECOVERY_DEFAULT_COIN").unwrap_or_else(|_| "btc".into()),
        }
    }
}

impl VaultConfig {
    pub fn to_vault(&self) -> PassphraseVault {
        PassphraseVault::new(self.pbkdf2_iterations, self.max_pbkdf2_iterations)
    }
}

impl Config {
    /// 从环境变量加载配置
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            logging: LoggingConfig::default(),
            vault: VaultConfig::default(),
            recovery: RecoveryConfig::default(),
        })
    }

    /// 从配置文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: Config =
            toml::from_str(&content).with_context(|| "Failed to parse config file as TOML")?;

        Ok(config)
    }

    /// 从环境变量和配置文件合并加载（配置文件优先级更高）
    pub fn from_env_and_file<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        let mut config = Self::from_env()?;

        if let Some(path) = path {
            if path.as_ref().exists() {
                // 文件中缺省的段落仍然取环境变量
                config = Self::from_file(path)?;
            }
        }

        Ok(config)
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<()> {
        // 验证日志级别
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            anyhow::bail!("LOG_LEVEL must be one of: {:?}", valid_levels);
        }

        // 验证日志格式
        if self.logging.format != "json" && self.logging.format != "text" {
            anyhow::bail!("LOG_FORMAT must be 'json' or 'text'");
        }

        // 验证迭代次数
        if self.vault.pbkdf2_iterations == 0 {
            anyhow::bail!("VAULT_PBKDF2_ITERATIONS must be greater than 0");
        }
        if self.vault.pbkdf2_iterations > self.vault.max_pbkdf2_iterations {
            anyhow::bail!(
                "VAULT_PBKDF2_ITERATIONS ({}) exceeds VAULT_MAX_PBKDF2_ITERATIONS ({})",
                self.vault.pbkdf2_iterations,
                self.vault.max_pbkdf2_iterations
            );
        }

        // 验证默认币种
        coin_config::resolve(&self.recovery.default_coin).with_context(|| {
            format!(
                "RECOVERY_DEFAULT_COIN is not a supported coin: {}",
                self.recovery.default_coin
            )
        })?;

        Ok(())
    }
}
