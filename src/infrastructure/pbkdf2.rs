//! PBKDF2 密钥派生模块
//! 用于从钱包口令派生 AES-256 密钥

use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;
use zeroize::Zeroizing;

/// 默认迭代次数（新加密的密钥使用，解密时以密文中记录的值为准）
pub const DEFAULT_ITERATIONS: u32 = 10_000;
/// 解密时接受的迭代次数上限，防止构造的密文拖垮进程
pub const MAX_ITERATIONS: u32 = 10_000_000;
pub const SALT_LENGTH: usize = 16; // 16字节盐值
pub const KEY_LENGTH: usize = 32; // 32字节密钥（AES-256）

/// 生成随机盐值
pub fn generate_salt() -> [u8; SALT_LENGTH] {
    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}

/// 从口令和盐值派生密钥
///
/// # Arguments
/// * `passphrase` - 钱包口令
/// * `salt` - 盐值
/// * `iterations` - PBKDF2 迭代次数
pub fn derive_key_with_salt(
    passphrase: &str,
    salt: &[u8],
    iterations: u32,
) -> Zeroizing<[u8; KEY_LENGTH]> {
    let mut key = Zeroizing::new([0u8; KEY_LENGTH]);
    pbkdf2_hmac::<Sha256>(passphrase.as_bytes(), salt, iterations, &mut key[..]);
    key
}
