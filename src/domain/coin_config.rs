//! 币种配置模块
//!
//! 定义所有支持的币种描述符，以及进程级只初始化一次的注册表

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::domain::extended_key::KeyVersions;
use crate::domain::family::FamilyRules;
use crate::error::CoreError;
use crate::utils::coin_normalizer;

/// 币种家族
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoinFamily {
    /// UTXO (Bitcoin)
    Btc,
    /// UTXO (Bitcoin Cash)
    Bch,
    /// UTXO (Litecoin)
    Ltc,
    /// 账户模型 (Ethereum)
    Eth,
    /// Prova 账本原生多签
    Rmg,
    /// 账户模型 (Ripple)
    Xrp,
}

impl CoinFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Btc => "btc",
            Self::Bch => "bch",
            Self::Ltc => "ltc",
            Self::Eth => "eth",
            Self::Rmg => "rmg",
            Self::Xrp => "xrp",
        }
    }
}

impl fmt::Display for CoinFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 主网 / 测试网
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkKind {
    Mainnet,
    Testnet,
}

/// 币种描述符
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoinDescriptor {
    /// 币种标识 (btc, teth, rmg ...)，注册表内唯一
    pub identifier: &'static str,
    /// 全称
    pub full_name: &'static str,
    /// 家族
    pub family: CoinFamily,
    /// 网络
    pub network: NetworkKind,
    /// 最小单位精度，base factor = 10^decimals
    pub decimals: u32,
    /// 扩展密钥版本字节
    pub key_versions: KeyVersions,
}

impl CoinDescriptor {
    /// 最小单位与显示单位的换算因子 (satoshi→BTC 为 1e8)
    pub fn base_unit_scale(&self) -> u128 {
        10u128.pow(self.decimals)
    }

    /// 家族规则
    pub fn rules(&self) -> &'static dyn FamilyRules {
        self.family.rules()
    }

    /// 地址格式检查，从不报错
    pub fn validate_address(&self, address: &str) -> bool {
        self.rules().is_valid_address(address, self.network)
    }

    pub fn is_testnet(&self) -> bool {
        self.network == NetworkKind::Testnet
    }
}

/// 币种注册表
#[derive(Debug, Default)]
pub struct CoinRegistry {
    coins: HashMap<&'static str, CoinDescriptor>,
}

/// 进程级注册表，首次访问时构建，之后只读
static COIN_REGISTRY: Lazy<CoinRegistry> = Lazy::new(|| {
    let registry = CoinRegistry::with_default_coins();
    tracing::debug!(coins = registry.len(), "coin registry initialized");
    registry
});

/// 解析币种标识（支持别名），不存在时返回 `UnsupportedCoin`
pub fn resolve(identifier: &str) -> Result<&'static CoinDescriptor, CoreError> {
    COIN_REGISTRY
        .lookup(identifier)
        .ok_or_else(|| CoreError::UnsupportedCoin(identifier.trim().to_string()))
}

/// 全局注册表
pub fn registry() -> &'static CoinRegistry {
    &COIN_REGISTRY
}

impl CoinRegistry {
    /// 空注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建预配置的注册表
    pub fn with_default_coins() -> Self {
        let mut registry = Self::new();
        registry.register_default_coins();
        registry
    }

    /// 注册默认支持的币种
    fn register_default_coins(&mut self) {
        use CoinFamily::*;
        use NetworkKind::*;

        // identifier, full_name, family, network, decimals
        let table: [(&'static str, &'static str, CoinFamily, NetworkKind, u32); 12] = [
            // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
            // UTXO 系列
            // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
            ("btc", "Bitcoin", Btc, Mainnet, 8),
            ("tbtc", "Testnet Bitcoin", Btc, Testnet, 8),
            ("bch", "Bitcoin Cash", Bch, Mainnet, 8),
            ("tbch", "Testnet Bitcoin Cash", Bch, Testnet, 8),
            ("ltc", "Litecoin", Ltc, Mainnet, 8),
            ("tltc", "Testnet Litecoin", Ltc, Testnet, 8),
            // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
            // 账户模型 / 账本原生
            // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
            ("eth", "Ethereum", Eth, Mainnet, 18),
            ("teth", "Testnet Ethereum", Eth, Testnet, 18),
            ("rmg", "Royal Mint Gold", Rmg, Mainnet, 6),
            ("trmg", "Testnet Royal Mint Gold", Rmg, Testnet, 6),
            ("xrp", "Ripple", Xrp, Mainnet, 6),
            ("txrp", "Testnet Ripple", Xrp, Testnet, 6),
        ];

        for (identifier, full_name, family, network, decimals) in table {
            // 所有币种的 HD 密钥都使用 xprv / xpub 编码
            let descriptor = CoinDescriptor {
                identifier,
                full_name,
                family,
                network,
                decimals,
                key_versions: KeyVersions::BIP32_MAINNET,
            };
            if let Err(e) = self.register(descriptor) {
                tracing::error!("failed to register default coin: {}", e);
            }
        }
    }

    /// 注册币种，标识重复时拒绝
    pub fn register(&mut self, descriptor: CoinDescriptor) -> Result<(), CoreError> {
        if self.coins.contains_key(descriptor.identifier) {
            return Err(CoreError::DuplicateCoin(descriptor.identifier.to_string()));
        }
        self.coins.insert(descriptor.identifier, descriptor);
        Ok(())
    }

    /// 通过标识获取描述符（不做别名处理）
    pub fn get(&self, identifier: &str) -> Option<&CoinDescriptor> {
        self.coins.get(identifier)
    }

    /// 先查别名表，别名表里没有时按小写标识直接查注册表
    pub fn lookup(&self, identifier: &str) -> Option<&CoinDescriptor> {
        match coin_normalizer::normalize_coin_identifier(identifier) {
            Some(canonical) => self.get(canonical),
            None => self.get(&identifier.trim().to_lowercase()),
        }
    }

    /// 按家族获取所有币种
    pub fn get_by_family(&self, family: CoinFamily) -> Vec<&CoinDescriptor> {
        self.coins.values().filter(|c| c.family == family).collect()
    }

    /// 列出所有支持的币种（按标识排序）
    pub fn list_all(&self) -> Vec<&CoinDescriptor> {
        let mut all: Vec<_> = self.coins.values().collect();
        all.sort_by_key(|c| c.identifier);
        all
    }

    pub fn len(&self) -> usize {
        self.coins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coins.is_empty()
    }

    /// 验证币种配置完整性
    pub fn validate_configs(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        for (key, config) in &self.coins {
            if config.identifier.is_empty() {
                errors.push(format!("Coin {} has empty identifier", config.full_name));
            }
            if *key != config.identifier {
                errors.push(format!(
                    "Coin {} registered under mismatching key {}",
                    config.identifier, key
                ));
            }
            if config.full_name.is_empty() {
                errors.push(format!("Coin {} has empty name", config.identifier));
            }

            // 精度必须在 rust_decimal 可表示的范围内
            if config.decimals == 0 || config.decimals > 28 {
                errors.push(format!(
                    "Coin {} has invalid decimals: {}",
                    config.identifier, config.decimals
                ));
            }

            // 测试网币种以 t 开头
            if config.is_testnet() != config.identifier.starts_with('t') {
                errors.push(format!(
                    "Coin {} has inconsistent network {:?}",
                    config.identifier, config.network
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
