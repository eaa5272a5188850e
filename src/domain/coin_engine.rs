//! 通用币种引擎
//!
//! 绑定到一个 [`CoinDescriptor`] 之后只通过描述符工作：单位换算、
//! 种子派生、地址检查和恢复流程都不再关心具体币种名。

use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::domain::coin_config::{self, CoinDescriptor, CoinFamily};
use crate::domain::extended_key::{DerivationPath, ExtendedKey};
use crate::domain::family::WalletParams;
use crate::domain::recovery::{RecoveryKeySet, RecoveryRequest, RecoveryValidator};
use crate::error::{CoreError, KeyRole};
use crate::infrastructure::encryption::PassphraseVault;

/// 种子派生路径的固定首段
const SEED_PATH_ROOT: u32 = 999_999;
/// 每个路径段取摘要的 7 个十六进制字符
const SEED_WINDOW: usize = 7;

/// 种子派生结果
#[derive(Clone, PartialEq, Eq, Serialize, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKeyResult {
    /// 派生出的扩展密钥（父密钥是 xprv 时为 xprv）
    pub key: String,
    /// `m/999999/<a>/<b>`
    #[zeroize(skip)]
    pub derivation_path: String,
}

impl fmt::Debug for DerivedKeyResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedKeyResult")
            .field("key", &"<redacted>")
            .field("derivation_path", &self.derivation_path)
            .finish()
    }
}

/// 币种引擎
#[derive(Debug, Clone)]
pub struct CoinEngine {
    descriptor: &'static CoinDescriptor,
    vault: PassphraseVault,
}

impl CoinEngine {
    /// 通过币种标识（或别名）创建引擎
    pub fn for_coin(identifier: &str) -> Result<Self, CoreError> {
        coin_config::resolve(identifier).map(Self::new)
    }

    pub fn new(descriptor: &'static CoinDescriptor) -> Self {
        Self {
            descriptor,
            vault: PassphraseVault::default(),
        }
    }

    /// 替换解密恢复密钥时使用的保险箱参数
    pub fn with_vault(mut self, vault: PassphraseVault) -> Self {
        self.vault = vault;
        self
    }

    pub fn descriptor(&self) -> &'static CoinDescriptor {
        self.descriptor
    }

    pub fn coin_type(&self) -> &'static str {
        self.descriptor.identifier
    }

    pub fn family(&self) -> CoinFamily {
        self.descriptor.family
    }

    pub fn full_name(&self) -> &'static str {
        self.descriptor.full_name
    }

    /// 最小单位到显示单位的换算因子
    pub fn base_factor(&self) -> u128 {
        self.descriptor.base_unit_scale()
    }

    /// 最小单位 → 显示单位
    ///
    /// 精确十进制除法，去掉尾随零，整数部分按千分位分组：
    /// `123456789012` sat → `"1,234.56789012"`。
    pub fn base_units_to_display_units(&self, amount: i128) -> Result<String, CoreError> {
        let value = Decimal::try_from_i128_with_scale(amount, self.descriptor.decimals)
            .map_err(|e| {
                CoreError::InvalidAmount(format!(
                    "{} base units out of range for {}: {}",
                    amount, self.descriptor.identifier, e
                ))
            })?
            .normalize();

        Ok(group_thousands(&value.to_string()))
    }

    /// 用种子确定性地派生子密钥
    ///
    /// 路径为 `m/999999/<a>/<b>`，`a` 和 `b` 分别取 `sha256(sha256(seed))`
    /// 十六进制摘要的 [0,7) 和 [7,14) 位。全部是普通（非 hardened）索引，
    /// 所以 xpub 父密钥同样可用。
    pub fn derive_key_with_seed(
        &self,
        key: &str,
        seed: impl AsRef<[u8]>,
    ) -> Result<DerivedKeyResult, CoreError> {
        let parent = ExtendedKey::decode(key, &self.descriptor.key_versions)
            .map_err(|e| CoreError::key_parse(self.coin_type(), KeyRole::Parent, e))?;

        let path = seed_derivation_path(seed.as_ref());
        let derivation_path: DerivationPath =
            path.parse().map_err(CoreError::InvalidDerivation)?;
        let child = parent
            .derive_path(&derivation_path)
            .map_err(CoreError::InvalidDerivation)?;

        tracing::debug!(
            coin = self.coin_type(),
            derivation_path = %path,
            private = child.is_private(),
            "derived key with seed"
        );

        Ok(DerivedKeyResult {
            key: child.encode(),
            derivation_path: path,
        })
    }

    /// 地址格式检查，从不报错
    pub fn validate_address(&self, address: &str) -> bool {
        self.descriptor.validate_address(address)
    }

    /// 添加 custodian 密钥前的家族检查
    pub fn pre_create_additional_checks(
        &self,
        params: WalletParams,
    ) -> Result<WalletParams, CoreError> {
        self.descriptor
            .rules()
            .pre_create_additional_checks(params)
            .map_err(|reason| CoreError::PreconditionFailed {
                coin: self.coin_type().to_string(),
                reason,
            })
    }

    /// 钱包生成前的家族补充
    pub fn supplement_generate_wallet(
        &self,
        params: WalletParams,
    ) -> Result<WalletParams, CoreError> {
        self.descriptor
            .rules()
            .supplement_generate_wallet(params)
            .map_err(|reason| CoreError::PreconditionFailed {
                coin: self.coin_type().to_string(),
                reason,
            })
    }

    /// 离线恢复：校验三把（或两把）密钥和目标地址
    pub fn initiate_recovery(&self, request: &RecoveryRequest) -> Result<RecoveryKeySet, CoreError> {
        self.recovery_validator().validate(request)
    }

    pub fn recovery_validator(&self) -> RecoveryValidator {
        RecoveryValidator::new(self.descriptor, self.vault)
    }
}

/// 由种子计算派生路径字符串
pub fn seed_derivation_path(seed: &[u8]) -> String {
    let digest = hex::encode(Sha256::digest(Sha256::digest(seed)));
    // 7 个十六进制字符最大 0x0fffffff，小于 2^31，不会是 hardened 索引
    let first = u32::from_str_radix(&digest[..SEED_WINDOW], 16).unwrap_or_default();
    let second =
        u32::from_str_radix(&digest[SEED_WINDOW..SEED_WINDOW * 2], 16).unwrap_or_default();
    format!("m/{}/{}/{}", SEED_PATH_ROOT, first, second)
}

/// 整数部分加千分位逗号，保留符号和小数部分
fn group_thousands(plain: &str) -> String {
    let (sign, unsigned) = match plain.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", plain),
    };
    let (integer, fraction) = match unsigned.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(plain.len() + integer.len() / 3);
    for (i, ch) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match fraction {
        Some(fraction) => format!("{}{}.{}", sign, grouped, fraction),
        None => format!("{}{}", sign, grouped),
    }
}
