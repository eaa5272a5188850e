//! 口令加密模块 (Passphrase Vault)
//!
//! 用钱包口令加密/解密密钥材料：PBKDF2-HMAC-SHA256 派生密钥 + AES-256-GCM。
//! 密文是一个 JSON 信封，字段沿用 SJCL 的命名：
//!
//! ```text
//! {"v":1,"cipher":"aes","mode":"gcm","ks":256,"iter":10000,"salt":"..","iv":"..","ct":".."}
//! ```
//!
//! 口令错误或密文被篡改时 GCM 标签校验失败，不会返回任何明文。

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::Zeroizing;

use crate::infrastructure::pbkdf2::{self, DEFAULT_ITERATIONS, MAX_ITERATIONS, SALT_LENGTH};

const ENVELOPE_VERSION: u8 = 1;
const NONCE_LENGTH: usize = 12;
const KEY_SIZE_BITS: u32 = 256;

/// 加解密错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VaultError {
    #[error("malformed ciphertext: {0}")]
    Malformed(String),
    #[error("unsupported ciphertext parameters: {0}")]
    Unsupported(String),
    #[error("authentication failed (wrong passphrase or tampered ciphertext)")]
    Authentication,
    #[error("encryption failed: {0}")]
    Encryption(String),
}

/// 密文信封
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Envelope {
    v: u8,
    cipher: String,
    mode: String,
    ks: u32,
    iter: u32,
    salt: String,
    iv: String,
    ct: String,
}

/// 口令保险箱
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassphraseVault {
    iterations: u32,
    max_iterations: u32,
}

impl Default for PassphraseVault {
    fn default() -> Self {
        Self::new(DEFAULT_ITERATIONS, MAX_ITERATIONS)
    }
}

impl PassphraseVault {
    /// # Arguments
    /// * `iterations` - 新密文使用的 PBKDF2 迭代次数
    /// * `max_iterations` - 解密时允许的最大迭代次数，不低于 `iterations`
    pub fn new(iterations: u32, max_iterations: u32) -> Self {
        let iterations = iterations.max(1);
        Self {
            iterations,
            max_iterations: max_iterations.max(iterations),
        }
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    /// 加密明文，每次调用使用新的盐值和 nonce
    pub fn encrypt(
        &self,
        plaintext: impl AsRef<[u8]>,
        passphrase: &str,
    ) -> Result<String, VaultError> {
        let salt = pbkdf2::generate_salt();
        let key = pbkdf2::derive_key_with_salt(passphrase, &salt, self.iterations);

        let cipher = Aes256Gcm::new_from_slice(key.as_slice())
            .map_err(|e| VaultError::Encryption(format!("invalid key: {}", e)))?;
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = cipher
            .encrypt(&nonce, plaintext.as_ref())
            .map_err(|e| VaultError::Encryption(e.to_string()))?;

        let envelope = Envelope {
            v: ENVELOPE_VERSION,
            cipher: "aes".to_string(),
            mode: "gcm".to_string(),
            ks: KEY_SIZE_BITS,
            iter: self.iterations,
            salt: STANDARD.encode(salt),
            iv: STANDARD.encode(nonce),
            ct: STANDARD.encode(ciphertext),
        };

        serde_json::to_string(&envelope).map_err(|e| VaultError::Encryption(e.to_string()))
    }

    /// 解密，失败时不返回任何部分明文
    ///
    /// 返回原始字节；明文的格式由调用方解释。
    pub fn decrypt(
        &self,
        ciphertext: &str,
        passphrase: &str,
    ) -> Result<Zeroizing<Vec<u8>>, VaultError> {
        let envelope: Envelope = serde_json::from_str(ciphertext.trim())
            .map_err(|e| VaultError::Malformed(format!("not a ciphertext envelope: {}", e)))?;
        self.check_parameters(&envelope)?;

        let salt = decode_field("salt", &envelope.salt, Some(SALT_LENGTH))?;
        let iv = decode_field("iv", &envelope.iv, Some(NONCE_LENGTH))?;
        let ct = decode_field("ct", &envelope.ct, None)?;

        let key = pbkdf2::derive_key_with_salt(passphrase, &salt, envelope.iter);
        let cipher = Aes256Gcm::new_from_slice(key.as_slice())
            .map_err(|e| VaultError::Malformed(format!("invalid key: {}", e)))?;

        cipher
            .decrypt(Nonce::from_slice(&iv), ct.as_slice())
            .map(Zeroizing::new)
            .map_err(|_| VaultError::Authentication)
    }

    fn check_parameters(&self, envelope: &Envelope) -> Result<(), VaultError> {
        if envelope.v != ENVELOPE_VERSION {
            return Err(VaultError::Unsupported(format!("version {}", envelope.v)));
        }
        if envelope.cipher != "aes" || envelope.mode != "gcm" {
            return Err(VaultError::Unsupported(format!(
                "{}-{}",
                envelope.cipher, envelope.mode
            )));
        }
        if envelope.ks != KEY_SIZE_BITS {
            return Err(VaultError::Unsupported(format!("key size {}", envelope.ks)));
        }
        if envelope.iter == 0 || envelope.iter > self.max_iterations {
            return Err(VaultError::Unsupported(format!(
                "iteration count {}",
                envelope.iter
            )));
        }
        Ok(())
    }
}

fn decode_field(
    name: &str,
    value: &str,
    expected_len: Option<usize>,
) -> Result<Vec<u8>, VaultError> {
    let bytes = STANDARD
        .decode(value)
        .map_err(|_| VaultError::Malformed(format!("{} is not valid base64", name)))?;
    match expected_len {
        Some(len) if bytes.len() != len => Err(VaultError::Malformed(format!(
            "{} must be {} bytes, got {}",
            name,
            len,
            bytes.len()
        ))),
        _ => Ok(bytes),
    }
}
