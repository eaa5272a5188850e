//! 币种家族规则
//!
//! 每个家族提供一组能力（地址格式、custodian 密钥是否可选、钱包创建前的检查），
//! 通过 [`CoinFamily::rules`] 按家族穷举分发。

use serde::{Deserialize, Serialize};

use crate::domain::coin_config::{CoinFamily, NetworkKind};
use crate::utils::address_validator::AddressValidator;

/// 钱包创建参数（在交给远端服务之前由家族规则检查 / 补充）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletParams {
    pub label: Option<String>,
    pub enterprise: Option<String>,
}

/// 家族规则 trait
pub trait FamilyRules: Send + Sync {
    fn family(&self) -> CoinFamily;

    /// 验证地址格式
    fn is_valid_address(&self, address: &str, network: NetworkKind) -> bool;

    /// 恢复时 custodian 公钥是否可以缺省
    fn custodian_key_optional(&self) -> bool {
        false
    }

    /// 添加 custodian 密钥前的额外检查，默认直接放行
    fn pre_create_additional_checks(&self, params: WalletParams) -> Result<WalletParams, String> {
        Ok(params)
    }

    /// 钱包生成前补充参数，默认直接放行
    fn supplement_generate_wallet(&self, params: WalletParams) -> Result<WalletParams, String> {
        Ok(params)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// UTXO 家族
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct BtcRules;

impl FamilyRules for BtcRules {
    fn family(&self) -> CoinFamily {
        CoinFamily::Btc
    }

    fn is_valid_address(&self, address: &str, network: NetworkKind) -> bool {
        AddressValidator::validate_bitcoin_address(address, network)
    }
}

pub struct BchRules;

impl FamilyRules for BchRules {
    fn family(&self) -> CoinFamily {
        CoinFamily::Bch
    }

    fn is_valid_address(&self, address: &str, network: NetworkKind) -> bool {
        AddressValidator::validate_bitcoin_cash_address(address, network)
    }
}

pub struct LtcRules;

impl FamilyRules for LtcRules {
    fn family(&self) -> CoinFamily {
        CoinFamily::Ltc
    }

    fn is_valid_address(&self, address: &str, network: NetworkKind) -> bool {
        AddressValidator::validate_litecoin_address(address, network)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// 账户模型 / 账本原生
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct EthRules;

impl FamilyRules for EthRules {
    fn family(&self) -> CoinFamily {
        CoinFamily::Eth
    }

    fn is_valid_address(&self, address: &str, _network: NetworkKind) -> bool {
        AddressValidator::validate_evm_address(address)
    }

    /// ETH 钱包合约归属于 enterprise，没有 enterprise 不能添加 custodian 密钥
    fn pre_create_additional_checks(&self, params: WalletParams) -> Result<WalletParams, String> {
        match params.enterprise.as_deref() {
            Some(enterprise) if !enterprise.trim().is_empty() => Ok(params),
            _ => Err("expecting enterprise when adding the custodian key".to_string()),
        }
    }
}

pub struct RmgRules;

impl FamilyRules for RmgRules {
    fn family(&self) -> CoinFamily {
        CoinFamily::Rmg
    }

    fn is_valid_address(&self, address: &str, network: NetworkKind) -> bool {
        AddressValidator::validate_rmg_address(address, network)
    }
}

pub struct XrpRules;

impl FamilyRules for XrpRules {
    fn family(&self) -> CoinFamily {
        CoinFamily::Xrp
    }

    fn is_valid_address(&self, address: &str, _network: NetworkKind) -> bool {
        AddressValidator::validate_xrp_address(address)
    }

    /// XRP 恢复只需要 user + backup 两把密钥
    fn custodian_key_optional(&self) -> bool {
        true
    }
}

impl CoinFamily {
    /// 根据家族选择规则实现
    pub fn rules(&self) -> &'static dyn FamilyRules {
        match self {
            CoinFamily::Btc => &BtcRules,
            CoinFamily::Bch => &BchRules,
            CoinFamily::Ltc => &LtcRules,
            CoinFamily::Eth => &EthRules,
            CoinFamily::Rmg => &RmgRules,
            CoinFamily::Xrp => &XrpRules,
        }
    }
}
