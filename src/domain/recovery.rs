//! 离线恢复密钥校验
//!
//! 按固定顺序执行，第一个失败即终止：
//!
//! 1. user key：不是明文 xprv 时先用口令解密，再解码
//! 2. backup key：同上，使用同一个口令
//! 3. custodian key：直接按扩展公钥解码；XRP 家族解码失败时允许缺省
//! 4. 目标地址：交给描述符的地址检查
//!
//! 整个流程不访问网络，也不持久化任何密钥材料。

use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::domain::coin_config::CoinDescriptor;
use crate::domain::extended_key::{ExtendedKey, KeyCodecError, KeyVersions};
use crate::error::{CoreError, KeyRole};
use crate::infrastructure::encryption::PassphraseVault;
use crate::infrastructure::log_redact::redact_address;

/// 密钥材料分类：明文扩展私钥或加密信封
///
/// 只看前缀，不尝试解码。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMaterial<'a> {
    Plain(&'a str),
    Encrypted(&'a str),
}

impl<'a> KeyMaterial<'a> {
    pub fn classify(material: &'a str, versions: &KeyVersions) -> Self {
        let trimmed = material.trim();
        if trimmed.starts_with(versions.private_prefix) {
            KeyMaterial::Plain(trimmed)
        } else {
            KeyMaterial::Encrypted(trimmed)
        }
    }

    pub fn is_encrypted(&self) -> bool {
        matches!(self, KeyMaterial::Encrypted(_))
    }
}

/// 恢复请求
///
/// 同时接受 snake_case 字段和旧客户端的 camelCase 字段名。
#[derive(Clone, Default, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct RecoveryRequest {
    /// 币种标识（可选，缺省时由调用方决定）
    #[serde(default)]
    #[zeroize(skip)]
    pub coin: Option<String>,
    #[serde(alias = "userKey")]
    pub user_key: String,
    #[serde(alias = "backupKey")]
    pub backup_key: String,
    #[serde(default, alias = "bitgoKey", alias = "custodianKey")]
    pub custodian_key: String,
    #[serde(default, alias = "walletPassphrase")]
    pub passphrase: String,
    #[serde(alias = "recoveryDestination")]
    #[zeroize(skip)]
    pub destination_address: String,
}

impl RecoveryRequest {
    pub fn new(
        user_key: impl Into<String>,
        backup_key: impl Into<String>,
        custodian_key: impl Into<String>,
        passphrase: impl Into<String>,
        destination_address: impl Into<String>,
    ) -> Self {
        Self {
            coin: None,
            user_key: user_key.into(),
            backup_key: backup_key.into(),
            custodian_key: custodian_key.into(),
            passphrase: passphrase.into(),
            destination_address: destination_address.into(),
        }
    }
}

impl fmt::Debug for RecoveryRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecoveryRequest")
            .field("coin", &self.coin)
            .field("user_key", &"<redacted>")
            .field("backup_key", &"<redacted>")
            .field("custodian_key", &"<redacted>")
            .field("passphrase", &"<redacted>")
            .field(
                "destination_address",
                &redact_address(&self.destination_address),
            )
            .finish()
    }
}

/// 校验通过的恢复密钥
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryKeySet {
    pub coin: &'static str,
    pub user_key: ExtendedKey,
    pub backup_key: ExtendedKey,
    /// 仅 custodian 可选的家族才可能为 `None`
    pub custodian_key: Option<ExtendedKey>,
}

/// 可展示的恢复结果，只含扩展公钥
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecoverySummary {
    pub coin: String,
    pub user_xpub: String,
    pub backup_xpub: String,
    pub custodian_xpub: Option<String>,
}

impl RecoveryKeySet {
    pub fn public_summary(&self) -> RecoverySummary {
        RecoverySummary {
            coin: self.coin.to_string(),
            user_xpub: self.user_key.neuter().encode(),
            backup_xpub: self.backup_key.neuter().encode(),
            custodian_xpub: self.custodian_key.as_ref().map(|key| key.neuter().encode()),
        }
    }
}

/// 恢复阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryStage {
    UserKey,
    BackupKey,
    CustodianKey,
    Address,
}

impl RecoveryStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecoveryStage::UserKey => "user_key",
            RecoveryStage::BackupKey => "backup_key",
            RecoveryStage::CustodianKey => "custodian_key",
            RecoveryStage::Address => "address",
        }
    }
}

/// 已完成的阶段记录
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryProgress {
    completed: Vec<RecoveryStage>,
    custodian_skipped: bool,
}

impl RecoveryProgress {
    pub fn completed(&self) -> &[RecoveryStage] {
        &self.completed
    }

    pub fn has_completed(&self, stage: RecoveryStage) -> bool {
        self.completed.contains(&stage)
    }

    pub fn last_completed(&self) -> Option<RecoveryStage> {
        self.completed.last().copied()
    }

    /// custodian key 解码失败但因家族规则被跳过
    pub fn custodian_skipped(&self) -> bool {
        self.custodian_skipped
    }

    fn complete(&mut self, coin: &str, stage: RecoveryStage) {
        tracing::debug!(coin, stage = stage.as_str(), "recovery stage completed");
        self.completed.push(stage);
    }
}

/// 恢复校验器，绑定到一个币种描述符
#[derive(Debug, Clone, Copy)]
pub struct RecoveryValidator {
    descriptor: &'static CoinDescriptor,
    vault: PassphraseVault,
}

impl RecoveryValidator {
    pub fn new(descriptor: &'static CoinDescriptor, vault: PassphraseVault) -> Self {
        Self { descriptor, vault }
    }

    pub fn validate(&self, request: &RecoveryRequest) -> Result<RecoveryKeySet, CoreError> {
        let mut progress = RecoveryProgress::default();
        self.validate_with_progress(request, &mut progress)
    }

    /// 与 [`validate`](Self::validate) 相同，额外记录已完成的阶段
    pub fn validate_with_progress(
        &self,
        request: &RecoveryRequest,
        progress: &mut RecoveryProgress,
    ) -> Result<RecoveryKeySet, CoreError> {
        let coin = self.descriptor.identifier;
        tracing::info!(coin, "starting key recovery validation");

        let result = self.run_stages(request, progress);
        match &result {
            Ok(keys) => tracing::info!(
                coin,
                custodian_key = keys.custodian_key.is_some(),
                "recovery keys validated"
            ),
            Err(e) => tracing::warn!(
                coin,
                code = e.code(),
                last_completed_stage = progress.last_completed().map(|s| s.as_str()),
                "recovery validation failed"
            ),
        }
        result
    }

    fn run_stages(
        &self,
        request: &RecoveryRequest,
        progress: &mut RecoveryProgress,
    ) -> Result<RecoveryKeySet, CoreError> {
        let coin = self.descriptor.identifier;

        // 1. user key
        let user_key = self.load_key(&request.user_key, &request.passphrase, KeyRole::User)?;
        progress.complete(coin, RecoveryStage::UserKey);

        // 2. backup key
        let backup_key =
            self.load_key(&request.backup_key, &request.passphrase, KeyRole::Backup)?;
        progress.complete(coin, RecoveryStage::BackupKey);

        // 3. custodian key
        let custodian_key = match self.decode_custodian_key(&request.custodian_key) {
            Ok(key) => Some(key),
            Err(e) if self.descriptor.rules().custodian_key_optional() => {
                tracing::debug!(coin, error = %e, "custodian key absent, continuing with two keys");
                progress.custodian_skipped = true;
                None
            }
            Err(e) => return Err(CoreError::key_parse(coin, KeyRole::Custodian, e)),
        };
        progress.complete(coin, RecoveryStage::CustodianKey);

        // 4. 目标地址
        if !self.descriptor.validate_address(&request.destination_address) {
            return Err(CoreError::InvalidAddress {
                coin: coin.to_string(),
                address: redact_address(&request.destination_address),
            });
        }
        progress.complete(coin, RecoveryStage::Address);

        Ok(RecoveryKeySet {
            coin,
            user_key,
            backup_key,
            custodian_key,
        })
    }

    /// 解密（如需要）并解码 user / backup key
    fn load_key(
        &self,
        material: &str,
        passphrase: &str,
        role: KeyRole,
    ) -> Result<ExtendedKey, CoreError> {
        let coin = self.descriptor.identifier;
        let versions = &self.descriptor.key_versions;

        let plaintext: Zeroizing<String> = match KeyMaterial::classify(material, versions) {
            KeyMaterial::Plain(key) => Zeroizing::new(key.to_string()),
            KeyMaterial::Encrypted(blob) => {
                let bytes = self
                    .vault
                    .decrypt(blob, passphrase)
                    .map_err(|e| CoreError::decryption(coin, role, e))?;
                // 口令正确但明文不是文本：属于密钥格式问题
                let text = std::str::from_utf8(&bytes)
                    .map_err(|_| CoreError::key_parse(coin, role, KeyCodecError::InvalidUtf8))?;
                Zeroizing::new(text.to_string())
            }
        };

        ExtendedKey::decode(&plaintext, versions).map_err(|e| CoreError::key_parse(coin, role, e))
    }

    /// custodian key 只能是扩展公钥
    fn decode_custodian_key(&self, material: &str) -> Result<ExtendedKey, KeyCodecError> {
        let key = ExtendedKey::decode(material, &self.descriptor.key_versions)?;
        if key.is_private() {
            return Err(KeyCodecError::ExpectedPublicKey);
        }
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::coin_config::resolve;
    use crate::infrastructure::encryption::VaultError;
    use crate::infrastructure::pbkdf2::MAX_ITERATIONS;

    const USER_XPRV: &str = "xprv9s21ZrQH143K3QTDL4LXw2F7HEK3wJUD2nW2nRk4stbPy6cq3jPPqjiChkVvvNKmPGJxWUtg6LnF5kejMRNNU3TGtRBeJgk33yuGBxrMPHi";
    const USER_XPUB: &str = "xpub661MyMwAqRbcFtXgS5sYJABqqG9YLmC4Q1Rdap9gSE8NqtwybGhePY2gZ29ESFjqJoCu1Rupje8YtGqsefD265TMg7usUDFdp6W1EGMcet8";
    const BACKUP_XPRV: &str = "xprv9s21ZrQH143K3gsPpNTy4CCR7JV6hdzTmJfgSkLfYXjkACsdnS1gEV8iVsXxEvrtsdunA3dfS9u1eahUoki51CS4UB1SXvmfpyuw3UaG183";
    const BACKUP_XPUB: &str = "xpub661MyMwAqRbcGAwrvPzyRL99fLKb76iK8XbHF8kH6sGj31CnKyKvnHTCMARnmuNmMSXRp335kbG7Aacr7S9GHE4nR8dB9NforXYmZA835PG";
    const CUSTODIAN_XPUB: &str = "xpub661MyMwAqRbcGsy1KtPNmYnnaXuppCpWigbxgRAbYM8qn5GMxixCzx54MNaRzpWUye4wDCmajoLhzh2z8U7jJSMew49mfVdqxBDSLiKXAKw";
    const BTC_ADDRESS: &str = "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa";
    const XRP_ADDRESS: &str = "rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh";
    const PASSPHRASE: &str = "correct horse battery staple";

    fn vault() -> PassphraseVault {
        PassphraseVault::new(1_000, MAX_ITERATIONS)
    }

    fn validator(coin: &str) -> RecoveryValidator {
        RecoveryValidator::new(resolve(coin).unwrap(), vault())
    }

    fn encrypted_request(custodian: &str, destination: &str) -> RecoveryRequest {
        let vault = vault();
        RecoveryRequest::new(
            vault.encrypt(USER_XPRV, PASSPHRASE).unwrap(),
            vault.encrypt(BACKUP_XPRV, PASSPHRASE).unwrap(),
            custodian,
            PASSPHRASE,
            destination,
        )
    }

    #[test]
    fn test_classify_key_material() {
        let versions = &KeyVersions::BIP32_MAINNET;
        assert_eq!(
            KeyMaterial::classify(USER_XPRV, versions),
            KeyMaterial::Plain(USER_XPRV)
        );
        let padded = format!("  {}\n", USER_XPRV);
        assert_eq!(
            KeyMaterial::classify(&padded, versions),
            KeyMaterial::Plain(USER_XPRV)
        );
        assert!(KeyMaterial::classify(r#"{"v":1,"iv":"..."}"#, versions).is_encrypted());
        // 扩展公钥不是明文私钥
        assert!(KeyMaterial::classify(USER_XPUB, versions).is_encrypted());
        assert!(KeyMaterial::classify("", versions).is_encrypted());
    }

    #[test]
    fn test_plain_keys_succeed() {
        let request =
            RecoveryRequest::new(USER_XPRV, BACKUP_XPRV, CUSTODIAN_XPUB, "", BTC_ADDRESS);
        let mut progress = RecoveryProgress::default();
        let keys = validator("btc")
            .validate_with_progress(&request, &mut progress)
            .unwrap();

        assert_eq!(keys.coin, "btc");
        assert!(keys.user_key.is_private());
        assert!(keys.backup_key.is_private());
        assert_eq!(keys.custodian_key.as_ref().unwrap().encode(), CUSTODIAN_XPUB);
        assert_eq!(
            progress.completed(),
            &[
                RecoveryStage::UserKey,
                RecoveryStage::BackupKey,
                RecoveryStage::CustodianKey,
                RecoveryStage::Address
            ]
        );
        assert!(!progress.custodian_skipped());
    }

    #[test]
    fn test_encrypted_keys_succeed() {
        let request = encrypted_request(CUSTODIAN_XPUB, BTC_ADDRESS);
        let keys = validator("btc").validate(&request).unwrap();
        assert_eq!(keys.user_key.encode(), USER_XPRV);
        assert_eq!(keys.backup_key.encode(), BACKUP_XPRV);
    }

    #[test]
    fn test_public_summary_contains_only_xpubs() {
        let request = encrypted_request(CUSTODIAN_XPUB, BTC_ADDRESS);
        let summary = validator("btc")
            .validate(&request)
            .unwrap()
            .public_summary();

        assert_eq!(summary.coin, "btc");
        assert_eq!(summary.user_xpub, USER_XPUB);
        assert_eq!(summary.backup_xpub, BACKUP_XPUB);
        assert_eq!(summary.custodian_xpub.as_deref(), Some(CUSTODIAN_XPUB));
        let json = serde_json::to_string(&summary).unwrap();
        assert!(!json.contains("xprv"));
    }

    #[test]
    fn test_user_decryption_failure_wins_over_invalid_address() {
        let mut request = encrypted_request(CUSTODIAN_XPUB, "not-an-address");
        request.passphrase = "wrong passphrase".to_string();

        let mut progress = RecoveryProgress::default();
        let err = validator("btc")
            .validate_with_progress(&request, &mut progress)
            .unwrap_err();

        assert_eq!(
            err,
            CoreError::Decryption {
                coin: "btc".to_string(),
                role: KeyRole::User,
                source: VaultError::Authentication,
            }
        );
        assert!(progress.completed().is_empty());
    }

    #[test]
    fn test_backup_failures_are_tagged() {
        let vault = vault();
        let request = RecoveryRequest::new(
            USER_XPRV,
            vault.encrypt(BACKUP_XPRV, "another passphrase").unwrap(),
            CUSTODIAN_XPUB,
            PASSPHRASE,
            BTC_ADDRESS,
        );
        let err = validator("btc").validate(&request).unwrap_err();
        assert_eq!(err.code(), "decryption_error");
        assert_eq!(err.key_role(), Some(KeyRole::Backup));

        // 解密成功但内容不是扩展密钥
        let request = RecoveryRequest::new(
            USER_XPRV,
            vault.encrypt("definitely not a key", PASSPHRASE).unwrap(),
            CUSTODIAN_XPUB,
            PASSPHRASE,
            BTC_ADDRESS,
        );
        let err = validator("btc").validate(&request).unwrap_err();
        assert_eq!(err.code(), "key_parse_error");
        assert_eq!(err.key_role(), Some(KeyRole::Backup));
    }

    #[test]
    fn test_non_utf8_plaintext_is_a_parse_error() {
        let request = RecoveryRequest::new(
            vault().encrypt([0xff, 0xfe, 0x00], "pw").unwrap(),
            BACKUP_XPRV,
            CUSTODIAN_XPUB,
            "pw",
            BTC_ADDRESS,
        );
        let err = validator("btc").validate(&request).unwrap_err();
        assert_eq!(
            err,
            CoreError::KeyParse {
                coin: "btc".to_string(),
                role: KeyRole::User,
                source: KeyCodecError::InvalidUtf8,
            }
        );
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_plain_user_key_with_bad_checksum() {
        let mut corrupted = USER_XPRV.to_string();
        corrupted.pop();
        corrupted.push('j');
        let request =
            RecoveryRequest::new(corrupted, BACKUP_XPRV, CUSTODIAN_XPUB, "", BTC_ADDRESS);

        let err = validator("btc").validate(&request).unwrap_err();
        assert_eq!(
            err,
            CoreError::KeyParse {
                coin: "btc".to_string(),
                role: KeyRole::User,
                source: KeyCodecError::InvalidChecksum,
            }
        );
    }

    #[test]
    fn test_custodian_key_optional_only_for_xrp() {
        let request = encrypted_request("garbage", XRP_ADDRESS);
        let mut progress = RecoveryProgress::default();
        let keys = validator("xrp")
            .validate_with_progress(&request, &mut progress)
            .unwrap();
        assert!(keys.custodian_key.is_none());
        assert!(progress.custodian_skipped());
        assert!(progress.has_completed(RecoveryStage::Address));
        assert_eq!(keys.public_summary().custodian_xpub, None);

        let request = encrypted_request("garbage", BTC_ADDRESS);
        let err = validator("btc").validate(&request).unwrap_err();
        assert_eq!(err.code(), "key_parse_error");
        assert_eq!(err.key_role(), Some(KeyRole::Custodian));
    }

    #[test]
    fn test_private_custodian_key_rejected() {
        let request = encrypted_request(BACKUP_XPRV, BTC_ADDRESS);
        let err = validator("btc").validate(&request).unwrap_err();
        assert_eq!(
            err,
            CoreError::KeyParse {
                coin: "btc".to_string(),
                role: KeyRole::Custodian,
                source: KeyCodecError::ExpectedPublicKey,
            }
        );
    }

    #[test]
    fn test_invalid_address_after_keys_parsed() {
        let request = encrypted_request(CUSTODIAN_XPUB, "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNb");
        let mut progress = RecoveryProgress::default();
        let err = validator("btc")
            .validate_with_progress(&request, &mut progress)
            .unwrap_err();

        assert_eq!(err.code(), "invalid_address");
        assert_eq!(
            progress.completed(),
            &[
                RecoveryStage::UserKey,
                RecoveryStage::BackupKey,
                RecoveryStage::CustodianKey
            ]
        );
        assert_eq!(progress.last_completed(), Some(RecoveryStage::CustodianKey));
        assert!(!err.to_string().contains("1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNb"));
    }

    #[test]
    fn test_request_accepts_legacy_field_names() {
        let json = format!(
            r#"{{"coin":"btc","userKey":"{}","backupKey":"{}","bitgoKey":"{}","walletPassphrase":"pw","recoveryDestination":"{}"}}"#,
            USER_XPRV, BACKUP_XPRV, CUSTODIAN_XPUB, BTC_ADDRESS
        );
        let request: RecoveryRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(request.coin.as_deref(), Some("btc"));
        assert_eq!(request.user_key, USER_XPRV);
        assert_eq!(request.custodian_key, CUSTODIAN_XPUB);
        assert_eq!(request.passphrase, "pw");

        let json = format!(
            r#"{{"user_key":"{}","backup_key":"{}","destination_address":"{}"}}"#,
            USER_XPRV, BACKUP_XPRV, XRP_ADDRESS
        );
        let request: RecoveryRequest = serde_json::from_str(&json).unwrap();
        assert!(request.custodian_key.is_empty());
        assert!(validator("xrp").validate(&request).is_ok());
    }

    #[test]
    fn test_request_debug_is_redacted() {
        let request = RecoveryRequest::new(
            USER_XPRV,
            BACKUP_XPRV,
            CUSTODIAN_XPUB,
            PASSPHRASE,
            BTC_ADDRESS,
        );
        let debug = format!("{:?}", request);
        assert!(!debug.contains(USER_XPRV));
        assert!(!debug.contains(PASSPHRASE));
        assert!(!debug.contains(BTC_ADDRESS));
    }

    #[test]
    fn test_parallel_validations_are_independent() {
        let handles: Vec<_> = ["btc", "xrp"]
            .into_iter()
            .map(|coin| {
                std::thread::spawn(move || {
                    let address = if coin == "btc" { BTC_ADDRESS } else { XRP_ADDRESS };
                    let request =
                        RecoveryRequest::new(USER_XPRV, BACKUP_XPRV, CUSTODIAN_XPUB, "", address);
                    validator(coin).validate(&request).map(|keys| keys.coin)
                })
            })
            .collect();

        let coins: Vec<_> = handles
            .into_iter()
            .map(|h| h.join().unwrap().unwrap())
            .collect();
        assert_eq!(coins, vec!["btc", "xrp"]);
    }
}
