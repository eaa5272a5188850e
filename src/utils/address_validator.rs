//! 地址验证模块
//!
//! 各币种家族的地址格式检查。所有函数只返回 `true` / `false`，从不报错。

use std::str::FromStr;

use bech32::Hrp;
use bitcoin::{address::NetworkUnchecked, Address, Network};

use crate::domain::coin_config::NetworkKind;

/// RMG 地址载荷：version(1) + hash160(20) + 两个 keyID(4+4)
const RMG_PAYLOAD_LEN: usize = 29;
/// 标准 base58check 地址载荷：version(1) + hash160(20)
const HASH160_PAYLOAD_LEN: usize = 21;

/// 地址验证器
pub struct AddressValidator;

impl AddressValidator {
    /// Bitcoin：交给 `bitcoin` crate 解析，覆盖 P2PKH / P2SH / segwit v0 / taproot
    pub fn validate_bitcoin_address(address: &str, network: NetworkKind) -> bool {
        let network = match network {
            NetworkKind::Mainnet => Network::Bitcoin,
            NetworkKind::Testnet => Network::Testnet,
        };
        Address::<NetworkUnchecked>::from_str(address)
            .map(|addr| addr.is_valid_for_network(network))
            .unwrap_or(false)
    }

    /// Bitcoin Cash：legacy base58 地址
    pub fn validate_bitcoin_cash_address(address: &str, network: NetworkKind) -> bool {
        let versions: &[u8] = match network {
            NetworkKind::Mainnet => &[0x00, 0x05],
            NetworkKind::Testnet => &[0x6f, 0xc4],
        };
        Self::validate_base58check(address, bs58::Alphabet::BITCOIN, versions, HASH160_PAYLOAD_LEN)
    }

    /// Litecoin：base58 (L/M/3 或 m/n/Q/2) 或 bech32 (ltc1 / tltc1)
    pub fn validate_litecoin_address(address: &str, network: NetworkKind) -> bool {
        let (versions, hrp): (&[u8], Hrp) = match network {
            NetworkKind::Mainnet => (&[0x30, 0x32, 0x05], Hrp::parse_unchecked("ltc")),
            NetworkKind::Testnet => (&[0x6f, 0x3a, 0xc4], Hrp::parse_unchecked("tltc")),
        };

        if Self::validate_base58check(address, bs58::Alphabet::BITCOIN, versions, HASH160_PAYLOAD_LEN)
        {
            return true;
        }

        match bech32::segwit::decode(address) {
            Ok((decoded_hrp, _version, _program)) => decoded_hrp == hrp,
            Err(_) => false,
        }
    }

    /// EVM 地址（支持 EIP-55 Checksum）
    pub fn validate_evm_address(address: &str) -> bool {
        // 1. 基本格式检查
        let Some(hex_part) = address.strip_prefix("0x") else {
            return false;
        };
        if hex_part.len() != 40 {
            return false;
        }

        // 2. 验证hex字符
        if !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
            return false;
        }

        // 3. 全小写 / 全大写不带 checksum；混合大小写必须满足 EIP-55
        let has_lower = hex_part.chars().any(|c| c.is_ascii_lowercase());
        let has_upper = hex_part.chars().any(|c| c.is_ascii_uppercase());
        if has_lower && has_upper {
            return Self::verify_eip55_checksum(hex_part);
        }

        true
    }

    /// 验证EIP-55 Checksum
    /// https://eips.ethereum.org/EIPS/eip-55
    fn verify_eip55_checksum(hex_part: &str) -> bool {
        use sha3::{Digest, Keccak256};

        let hash = Keccak256::digest(hex_part.to_lowercase().as_bytes());

        hex_part.chars().enumerate().all(|(i, ch)| {
            if !ch.is_ascii_alphabetic() {
                return true;
            }
            let hash_byte = hash[i / 2];
            let hash_nibble = if i % 2 == 0 {
                hash_byte >> 4
            } else {
                hash_byte & 0x0f
            };
            ch.is_ascii_uppercase() == (hash_nibble >= 8)
        })
    }

    /// RMG (Prova) 地址：base58check，29 字节载荷
    pub fn validate_rmg_address(address: &str, network: NetworkKind) -> bool {
        let version = match network {
            NetworkKind::Mainnet => 0x33,
            NetworkKind::Testnet => 0x58,
        };
        Self::validate_base58check(address, bs58::Alphabet::BITCOIN, &[version], RMG_PAYLOAD_LEN)
    }

    /// XRP 地址：Ripple 字母表 base58check，可带 `?dt=<u32>` 目标标签
    pub fn validate_xrp_address(address: &str) -> bool {
        let (account, query) = match address.split_once('?') {
            Some((account, query)) => (account, Some(query)),
            None => (address, None),
        };

        if let Some(query) = query {
            let Some(tag) = query.strip_prefix("dt=") else {
                return false;
            };
            if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_digit()) {
                return false;
            }
            if tag.parse::<u32>().is_err() {
                return false;
            }
        }

        Self::validate_base58check(account, bs58::Alphabet::RIPPLE, &[0x00], HASH160_PAYLOAD_LEN)
    }

    /// 通用 base58check：校验和、版本字节、载荷长度
    fn validate_base58check(
        address: &str,
        alphabet: &bs58::Alphabet,
        versions: &[u8],
        payload_len: usize,
    ) -> bool {
        if address.is_empty() || address.len() > 64 {
            return false;
        }
        match bs58::decode(address)
            .with_alphabet(alphabet)
            .with_check(None)
            .into_vec()
        {
            Ok(payload) => payload.len() == payload_len && versions.contains(&payload[0]),
            Err(_) => false,
        }
    }
}
