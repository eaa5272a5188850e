//! 测试辅助模块
//! 提供固定的密钥、地址和请求构造函数

#![allow(dead_code)]

use ironvault::domain::RecoveryRequest;
use ironvault::infrastructure::encryption::PassphraseVault;

/// BIP32 测试向量 1 主私钥（user key）
pub const USER_XPRV: &str = "xprv9s21ZrQH143K3QTDL4LXw2F7HEK3wJUD2nW2nRk4stbPy6cq3jPPqjiChkVvvNKmPGJxWUtg6LnF5kejMRNNU3TGtRBeJgk33yuGBxrMPHi";
pub const USER_XPUB: &str = "xpub661MyMwAqRbcFtXgS5sYJABqqG9YLmC4Q1Rdap9gSE8NqtwybGhePY2gZ29ESFjqJoCu1Rupje8YtGqsefD265TMg7usUDFdp6W1EGMcet8";

/// 种子 0x10..0x2f 的主私钥（backup key）
pub const BACKUP_XPRV: &str = "xprv9s21ZrQH143K3gsPpNTy4CCR7JV6hdzTmJfgSkLfYXjkACsdnS1gEV8iVsXxEvrtsdunA3dfS9u1eahUoki51CS4UB1SXvmfpyuw3UaG183";
pub const BACKUP_XPUB: &str = "xpub661MyMwAqRbcGAwrvPzyRL99fLKb76iK8XbHF8kH6sGj31CnKyKvnHTCMARnmuNmMSXRp335kbG7Aacr7S9GHE4nR8dB9NforXYmZA835PG";

/// 种子 0x30..0x4f 的主公钥（custodian key）
pub const CUSTODIAN_XPUB: &str = "xpub661MyMwAqRbcGsy1KtPNmYnnaXuppCpWigbxgRAbYM8qn5GMxixCzx54MNaRzpWUye4wDCmajoLhzh2z8U7jJSMew49mfVdqxBDSLiKXAKw";

pub const PASSPHRASE: &str = "correct horse battery staple";

pub const BTC_ADDRESS: &str = "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa";
pub const TBTC_ADDRESS: &str = "mipcBbFg9gMiCh81Kj8tqqdgoZub1ZJRfn";
pub const LTC_ADDRESS: &str = "ltc1qekym4u75mezz5l29vgy0hea0xmq6dsdjya0cy3";
pub const ETH_ADDRESS: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
pub const RMG_ADDRESS: &str = "GJt9DMq4LMvPPVpum1ehujcnd5QJUzq46CC4uQgTDAyUP";
pub const XRP_ADDRESS: &str = "rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh";

/// 种子派生回归向量：bytes 0x00..0x1f
pub fn regression_seed() -> Vec<u8> {
    (0u8..32).collect()
}

pub const REGRESSION_PATH: &str = "m/999999/49448884/222120208";

/// 低迭代次数的保险箱，测试用
pub fn test_vault() -> PassphraseVault {
    PassphraseVault::new(1_000, 100_000)
}

/// user / backup 都加密的恢复请求
pub fn encrypted_request(custodian: &str, destination: &str) -> RecoveryRequest {
    let vault = test_vault();
    RecoveryRequest::new(
        vault
            .encrypt(USER_XPRV, PASSPHRASE)
            .expect("encrypt user key"),
        vault
            .encrypt(BACKUP_XPRV, PASSPHRASE)
            .expect("encrypt backup key"),
        custodian,
        PASSPHRASE,
        destination,
    )
}
