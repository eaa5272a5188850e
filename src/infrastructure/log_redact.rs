//! 统一日志脱敏
//!
//! 地址、扩展密钥等敏感数据写入日志或错误信息前先经过这里

use serde::Serialize;

use crate::domain::recovery::RecoveryRequest;

/// 可脱敏trait
pub trait SensitiveRedact {
    fn redact(&self) -> String;
}

/// 脱敏十六进制字符串（显示前缀和后缀）
pub fn redact_hex_string(hex: &str, show_chars: usize) -> String {
    if hex.len() <= show_chars * 2 || !hex.is_ascii() {
        return "*".repeat(hex.chars().count());
    }

    let prefix = &hex[..show_chars];
    let suffix = &hex[hex.len() - show_chars..];
    format!("{}...{}", prefix, suffix)
}

/// 脱敏地址（显示前6位和后4位）
pub fn redact_address(address: &str) -> String {
    if address.len() < 10 || !address.is_ascii() {
        return "*".repeat(address.chars().count());
    }

    let prefix = &address[..6];
    let suffix = &address[address.len() - 4..];
    format!("{}...{}", prefix, suffix)
}

/// 脱敏扩展密钥：只保留版本前缀，私钥和加密信封完全隐藏
pub fn redact_extended_key(key: &str) -> String {
    let trimmed = key.trim();
    match trimmed.get(..4) {
        Some("xpub" | "tpub") => redact_hex_string(trimmed, 8),
        Some(prefix @ ("xprv" | "tprv")) => format!("{}<redacted>", prefix),
        _ if trimmed.is_empty() => "<empty>".to_string(),
        _ => "<encrypted>".to_string(),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// 为请求类型实现脱敏
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// 恢复请求脱敏
#[derive(Debug, Serialize)]
pub struct RedactedRecoveryRequest {
    pub coin: Option<String>,
    pub user_key: String,
    pub backup_key: String,
    pub custodian_key: String,
    pub destination_address: String,
    // ❌ 不包含：passphrase
}

impl SensitiveRedact for RecoveryRequest {
    fn redact(&self) -> String {
        serde_json::to_string(&RedactedRecoveryRequest {
            coin: self.coin.clone(),
            user_key: redact_extended_key(&self.user_key),
            backup_key: redact_extended_key(&self.backup_key),
            custodian_key: redact_extended_key(&self.custodian_key),
            destination_address: redact_address(&self.destination_address),
        })
        .unwrap_or_else(|_| "{ redacted }".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_hex_string() {
        let hex = "0x1234567890abcdef1234567890abcdef12345678";
        let redacted = redact_hex_string(hex, 10);
        assert_eq!(redacted, "0x12345678...ef12345678");
        assert_eq!(redact_hex_string("abcd", 4), "****");
    }

    #[test]
    fn test_redact_address() {
        assert_eq!(
            redact_address("0x742d35Cc6634C0532925a3b844Bc9e7595f0bFd2"),
            "0x742d...bFd2"
        );
        assert_eq!(
            redact_address("1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa"),
            "1A1zP1...vfNa"
        );
        assert_eq!(redact_address("short"), "*****");
        // 非 ASCII 输入不能按字节切片
        assert_eq!(redact_address("地址地址地址地址地址"), "**********");
    }

    #[test]
    fn test_redact_extended_key() {
        let xpub = "xpub661MyMwAqRbcFtXgS5sYJABqqG9YLmC4Q1Rdap9gSE8NqtwybGhePY2gZ29ESFjqJoCu1Rupje8YtGqsefD265TMg7usUDFdp6W1EGMcet8";
        assert_eq!(redact_extended_key(xpub), "xpub661M...1EGMcet8");
        assert_eq!(
            redact_extended_key("xprv9s21ZrQH143K3QTDL4LXw2F7HEK3wJUD2nW2nRk4stbPy6cq3jPPqjiChkVvvNKmPGJxWUtg6LnF5kejMRNNU3TGtRBeJgk33yuGBxrMPHi"),
            "xprv<redacted>"
        );
        assert_eq!(redact_extended_key(r#"{"v":1,"ct":"..."}"#), "<encrypted>");
        assert_eq!(redact_extended_key(""), "<empty>");
    }

    #[test]
    fn test_redact_recovery_request() {
        let request = RecoveryRequest::new(
            "xprv9s21ZrQH143K3QTDL4LXw2F7HEK3wJUD2nW2nRk4stbPy6cq3jPPqjiChkVvvNKmPGJxWUtg6LnF5kejMRNNU3TGtRBeJgk33yuGBxrMPHi",
            r#"{"v":1,"ct":"..."}"#,
            "",
            "hunter2",
            "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa",
        );
        let redacted = request.redact();
        assert!(redacted.contains("xprv<redacted>"));
        assert!(redacted.contains("<encrypted>"));
        assert!(redacted.contains("1A1zP1...vfNa"));
        assert!(!redacted.contains("hunter2"));
    }
}
