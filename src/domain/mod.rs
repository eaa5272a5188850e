//! Domain 模块
//!
//! 币种注册表、家族规则、扩展密钥、币种引擎和离线恢复

pub mod coin_config;
pub mod coin_engine;
pub mod extended_key;
pub mod family;
pub mod recovery;

// 重新导出常用类型
pub use coin_config::{resolve, CoinDescriptor, CoinFamily, CoinRegistry, NetworkKind};
pub use coin_engine::{CoinEngine, DerivedKeyResult};
pub use extended_key::{ChildNumber, DerivationPath, ExtendedKey, KeyCodecError, KeyVersions};
pub use family::{FamilyRules, WalletParams};
pub use recovery::{
    KeyMaterial, RecoveryKeySet, RecoveryProgress, RecoveryRequest, RecoveryStage,
    RecoverySummary, RecoveryValidator,
};
