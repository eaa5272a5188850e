use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::domain::extended_key::KeyCodecError;
use crate::infrastructure::encryption::VaultError;

/// 密钥角色，用于错误信息定位是哪一把密钥
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyRole {
    User,
    Backup,
    Custodian,
    /// 种子派生时的父密钥
    Parent,
}

impl KeyRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyRole::User => "user key",
            KeyRole::Backup => "backup key",
            KeyRole::Custodian => "custodian key",
            KeyRole::Parent => "parent key",
        }
    }
}

impl fmt::Display for KeyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 核心错误
///
/// 所有错误都是同步、终止性的，携带足够的上下文（哪个币种、哪把密钥）
/// 供客户端展示。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("unsupported coin: {0}")]
    UnsupportedCoin(String),

    #[error("{coin}: failed to parse {role}: {source}")]
    KeyParse {
        coin: String,
        role: KeyRole,
        #[source]
        source: KeyCodecError,
    },

    #[error("{coin}: failed to decrypt {role}: {source}")]
    Decryption {
        coin: String,
        role: KeyRole,
        #[source]
        source: VaultError,
    },

    #[error("invalid derivation: {0}")]
    InvalidDerivation(KeyCodecError),

    #[error("{coin}: invalid recovery destination address {address}")]
    InvalidAddress { coin: String, address: String },

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("{coin}: {reason}")]
    PreconditionFailed { coin: String, reason: String },

    #[error("coin already registered: {0}")]
    DuplicateCoin(String),
}

impl CoreError {
    /// 稳定的错误码（snake_case），供上层映射
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::UnsupportedCoin(_) => "unsupported_coin",
            CoreError::KeyParse { .. } => "key_parse_error",
            CoreError::Decryption { .. } => "decryption_error",
            CoreError::InvalidDerivation(_) => "invalid_derivation",
            CoreError::InvalidAddress { .. } => "invalid_address",
            CoreError::InvalidAmount(_) => "invalid_amount",
            CoreError::PreconditionFailed { .. } => "precondition_failed",
            CoreError::DuplicateCoin(_) => "duplicate_coin",
        }
    }

    /// 出错的密钥（仅 KeyParse / Decryption）
    pub fn key_role(&self) -> Option<KeyRole> {
        match self {
            CoreError::KeyParse { role, .. } | CoreError::Decryption { role, .. } => Some(*role),
            _ => None,
        }
    }

    /// 核心内没有瞬时错误，重试由上层（重新输入口令等）决定
    pub fn is_retryable(&self) -> bool {
        false
    }

    pub(crate) fn key_parse(coin: &str, role: KeyRole, source: KeyCodecError) -> Self {
        CoreError::KeyParse {
            coin: coin.to_string(),
            role,
            source,
        }
    }

    pub(crate) fn decryption(coin: &str, role: KeyRole, source: VaultError) -> Self {
        CoreError::Decryption {
            coin: coin.to_string(),
            role,
            source,
        }
    }
}
