//! IronVault - 多币种托管钱包的币种抽象与离线恢复
//!
//! 离线运行：不访问网络，不持久化任何密钥材料

pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod utils;

// 重新导出常用类型
pub use error::{CoreError, KeyRole};

// 统一模块导出
pub mod prelude {
    pub use crate::{
        domain::{
            resolve, CoinDescriptor, CoinEngine, CoinFamily, ExtendedKey, RecoveryKeySet,
            RecoveryRequest, RecoveryValidator,
        },
        error::{CoreError, KeyRole},
        infrastructure::encryption::PassphraseVault,
    };
}
