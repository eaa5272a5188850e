//! BIP32 扩展密钥编解码与子密钥派生
//!
//! 编码格式：78 字节载荷 + base58check
//! `version(4) | depth(1) | parent_fingerprint(4) | child_number(4) | chain_code(32) | key(33)`
//!
//! 序列化和 CKD 由 `bitcoin::bip32` 完成；这里负责按币种描述符的
//! 版本字节做检查（见 [`KeyVersions`]），并把错误归一到 [`KeyCodecError`]。

use std::fmt;
use std::str::FromStr;

use bitcoin::bip32::{self, ChainCode, Xpriv, Xpub};
use bitcoin::secp256k1::{All, Secp256k1};
use once_cell::sync::Lazy;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

pub use bitcoin::bip32::ChildNumber;

/// 扩展密钥载荷长度（不含 checksum）
pub const EXTENDED_KEY_LEN: usize = 78;

static SECP: Lazy<Secp256k1<All>> = Lazy::new(Secp256k1::new);

fn secp() -> &'static Secp256k1<All> {
    &SECP
}

/// 编解码 / 派生错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyCodecError {
    #[error("invalid base58 encoding")]
    InvalidBase58,
    #[error("checksum mismatch")]
    InvalidChecksum,
    #[error("invalid payload length: expected {EXTENDED_KEY_LEN} bytes, got {0}")]
    InvalidLength(usize),
    #[error("unknown version bytes: {0}")]
    UnknownVersion(String),
    #[error("invalid key material: {0}")]
    InvalidKeyMaterial(&'static str),
    #[error("key material is not valid UTF-8")]
    InvalidUtf8,
    #[error("expected an extended public key")]
    ExpectedPublicKey,
    #[error("cannot derive hardened child {0} from a public key")]
    HardenedFromPublic(u32),
    #[error("invalid derivation path: {0}")]
    InvalidPath(String),
    #[error("derived child key is invalid at index {0}")]
    InvalidChild(u32),
    #[error("maximum derivation depth exceeded")]
    DepthOverflow,
}

impl From<bip32::Error> for KeyCodecError {
    fn from(err: bip32::Error) -> Self {
        match err {
            bip32::Error::WrongExtendedKeyLength(len) => KeyCodecError::InvalidLength(len),
            bip32::Error::UnknownVersion(version) => {
                KeyCodecError::UnknownVersion(hex::encode(version))
            }
            bip32::Error::Secp256k1(_) => {
                KeyCodecError::InvalidKeyMaterial("not a valid secp256k1 key")
            }
            other => KeyCodecError::InvalidPath(other.to_string()),
        }
    }
}

/// BIP32 版本字节
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyVersions {
    pub private: [u8; 4],
    pub public: [u8; 4],
    /// 私钥编码后的字面前缀，用于明文/密文的结构判断
    pub private_prefix: &'static str,
    pub public_prefix: &'static str,
}

impl KeyVersions {
    /// BIP32 主网 xprv / xpub
    pub const BIP32_MAINNET: Self = Self {
        private: [0x04, 0x88, 0xAD, 0xE4],
        public: [0x04, 0x88, 0xB2, 0x1E],
        private_prefix: "xprv",
        public_prefix: "xpub",
    };

    /// BIP32 测试网 tprv / tpub
    pub const BIP32_TESTNET: Self = Self {
        private: [0x04, 0x35, 0x83, 0x94],
        public: [0x04, 0x35, 0x87, 0xCF],
        private_prefix: "tprv",
        public_prefix: "tpub",
    };
}

/// 派生路径，例如 `m/999999/12/34` 或 `m/44'/0'/0'`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivationPath(bip32::DerivationPath);

impl DerivationPath {
    pub fn children(&self) -> &[ChildNumber] {
        self.0.as_ref()
    }
}

impl From<Vec<ChildNumber>> for DerivationPath {
    fn from(children: Vec<ChildNumber>) -> Self {
        Self(bip32::DerivationPath::from(children))
    }
}

impl FromStr for DerivationPath {
    type Err = KeyCodecError;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        bip32::DerivationPath::from_str(path.trim())
            .map(Self)
            .map_err(|e| KeyCodecError::InvalidPath(format!("{}: {}", path.trim(), e)))
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("m")?;
        for child in self.children() {
            match child {
                ChildNumber::Normal { index } => write!(f, "/{}", index)?,
                ChildNumber::Hardened { index } => write!(f, "/{}'", index)?,
            }
        }
        Ok(())
    }
}

#[derive(Clone, PartialEq, Eq)]
enum KeyKind {
    Private(Xpriv),
    Public(Xpub),
}

/// BIP32 扩展密钥（公钥或私钥）
///
/// 释放时清除私钥标量和链码。
#[derive(Clone, PartialEq, Eq)]
pub struct ExtendedKey {
    versions: KeyVersions,
    kind: KeyKind,
}

impl ExtendedKey {
    /// 解码 base58check 字符串
    ///
    /// 校验和错误、长度错误、不属于 `versions` 的版本字节以及非法的曲线数据都会被拒绝。
    pub fn decode(serialized: &str, versions: &KeyVersions) -> Result<Self, KeyCodecError> {
        let payload = Zeroizing::new(
            bs58::decode(serialized.trim())
                .with_check(None)
                .into_vec()
                .map_err(|e| match e {
                    bs58::decode::Error::InvalidChecksum { .. } => KeyCodecError::InvalidChecksum,
                    _ => KeyCodecError::InvalidBase58,
                })?,
        );

        if payload.len() != EXTENDED_KEY_LEN {
            return Err(KeyCodecError::InvalidLength(payload.len()));
        }

        let version = &payload[0..4];
        let is_private = if version == versions.private {
            true
        } else if version == versions.public {
            false
        } else {
            return Err(KeyCodecError::UnknownVersion(hex::encode(version)));
        };

        if payload[4] == 0 && payload[5..13].iter().any(|b| *b != 0) {
            return Err(KeyCodecError::InvalidKeyMaterial(
                "master key with non-zero parent fingerprint or child number",
            ));
        }

        let kind = if is_private {
            if payload[45] != 0x00 {
                return Err(KeyCodecError::InvalidKeyMaterial(
                    "private key must be prefixed with 0x00",
                ));
            }
            KeyKind::Private(Xpriv::decode(&payload)?)
        } else {
            KeyKind::Public(Xpub::decode(&payload)?)
        };

        Ok(Self {
            versions: *versions,
            kind,
        })
    }

    /// 编码为 base58check 字符串，`decode` 的逆运算
    pub fn encode(&self) -> String {
        let (mut payload, version) = match &self.kind {
            KeyKind::Private(xpriv) => (Zeroizing::new(xpriv.encode()), self.versions.private),
            KeyKind::Public(xpub) => (Zeroizing::new(xpub.encode()), self.versions.public),
        };
        payload[0..4].copy_from_slice(&version);

        bs58::encode(payload.as_slice()).with_check().into_string()
    }

    pub fn is_private(&self) -> bool {
        matches!(self.kind, KeyKind::Private(_))
    }

    pub fn depth(&self) -> u8 {
        match &self.kind {
            KeyKind::Private(xpriv) => xpriv.depth,
            KeyKind::Public(xpub) => xpub.depth,
        }
    }

    pub fn parent_fingerprint(&self) -> [u8; 4] {
        match &self.kind {
            KeyKind::Private(xpriv) => xpriv.parent_fingerprint.to_bytes(),
            KeyKind::Public(xpub) => xpub.parent_fingerprint.to_bytes(),
        }
    }

    pub fn child_number(&self) -> u32 {
        match &self.kind {
            KeyKind::Private(xpriv) => u32::from(xpriv.child_number),
            KeyKind::Public(xpub) => u32::from(xpub.child_number),
        }
    }

    pub fn chain_code(&self) -> &[u8; 32] {
        match &self.kind {
            KeyKind::Private(xpriv) => xpriv.chain_code.as_bytes(),
            KeyKind::Public(xpub) => xpub.chain_code.as_bytes(),
        }
    }

    pub fn versions(&self) -> &KeyVersions {
        &self.versions
    }

    /// HASH160(公钥) 的前 4 字节
    pub fn fingerprint(&self) -> [u8; 4] {
        match &self.kind {
            KeyKind::Private(xpriv) => xpriv.fingerprint(secp()).to_bytes(),
            KeyKind::Public(xpub) => xpub.fingerprint().to_bytes(),
        }
    }

    /// 对应的扩展公钥；公钥调用时返回自身副本
    pub fn neuter(&self) -> Self {
        let kind = match &self.kind {
            KeyKind::Private(xpriv) => KeyKind::Public(Xpub::from_priv(secp(), xpriv)),
            KeyKind::Public(xpub) => KeyKind::Public(*xpub),
        };
        Self {
            versions: self.versions,
            kind,
        }
    }

    /// CKD：私钥派生私钥，公钥派生公钥；公钥不能做硬化派生
    pub fn derive_child(&self, child: ChildNumber) -> Result<Self, KeyCodecError> {
        if self.depth() == u8::MAX {
            return Err(KeyCodecError::DepthOverflow);
        }
        let index = u32::from(child);

        let kind = match &self.kind {
            KeyKind::Private(xpriv) => KeyKind::Private(
                xpriv
                    .derive_priv(secp(), &[child])
                    .map_err(|_| KeyCodecError::InvalidChild(index))?,
            ),
            KeyKind::Public(xpub) => {
                if let ChildNumber::Hardened { index } = child {
                    return Err(KeyCodecError::HardenedFromPublic(index));
                }
                KeyKind::Public(
                    xpub.ckd_pub(secp(), child)
                        .map_err(|_| KeyCodecError::InvalidChild(index))?,
                )
            }
        };

        Ok(Self {
            versions: self.versions,
            kind,
        })
    }

    /// 按路径逐级派生
    pub fn derive_path(&self, path: &DerivationPath) -> Result<Self, KeyCodecError> {
        let mut current = self.clone();
        for child in path.children() {
            current = current.derive_child(*child)?;
        }
        Ok(current)
    }
}

impl Zeroize for ExtendedKey {
    fn zeroize(&mut self) {
        if let KeyKind::Private(xpriv) = &mut self.kind {
            xpriv.private_key.non_secure_erase();
            xpriv.chain_code = ChainCode::from([0u8; 32]);
        }
    }
}

impl Drop for ExtendedKey {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl ZeroizeOnDrop for ExtendedKey {}

impl fmt::Debug for ExtendedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtendedKey")
            .field("is_private", &self.is_private())
            .field("depth", &self.depth())
            .field("parent_fingerprint", &hex::encode(self.parent_fingerprint()))
            .field("child_number", &self.child_number())
            .field("key_material", &"<redacted>")
            .finish()
    }
}
