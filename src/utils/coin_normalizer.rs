//! 币种标识符标准化模块
//!
//! 统一所有币种标识符的处理逻辑：大小写、空白、常用别名

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// 币种别名配置
struct CoinAlias {
    /// 规范标识（小写，注册表的键）
    canonical: &'static str,
    /// 别名列表（小写）
    aliases: &'static [&'static str],
}

/// 别名注册表（静态初始化）
static ALIAS_REGISTRY: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let coins = [
        CoinAlias {
            canonical: "btc",
            aliases: &["bitcoin", "xbt"],
        },
        CoinAlias {
            canonical: "tbtc",
            aliases: &["testnet bitcoin", "bitcoin testnet"],
        },
        CoinAlias {
            canonical: "bch",
            aliases: &["bitcoin cash", "bitcoincash", "bcc"],
        },
        CoinAlias {
            canonical: "tbch",
            aliases: &["testnet bitcoin cash", "bitcoin cash testnet"],
        },
        CoinAlias {
            canonical: "ltc",
            aliases: &["litecoin"],
        },
        CoinAlias {
            canonical: "tltc",
            aliases: &["testnet litecoin", "litecoin testnet"],
        },
        CoinAlias {
            canonical: "eth",
            aliases: &["ethereum", "ether"],
        },
        CoinAlias {
            canonical: "teth",
            aliases: &["testnet ethereum", "ethereum testnet"],
        },
        CoinAlias {
            canonical: "rmg",
            aliases: &["royal mint gold", "prova"],
        },
        CoinAlias {
            canonical: "trmg",
            aliases: &["testnet royal mint gold", "prova testnet"],
        },
        CoinAlias {
            canonical: "xrp",
            aliases: &["ripple"],
        },
        CoinAlias {
            canonical: "txrp",
            aliases: &["testnet ripple", "ripple testnet"],
        },
    ];

    let mut registry = HashMap::new();
    for coin in coins {
        // 注册规范名称
        registry.insert(coin.canonical, coin.canonical);

        // 注册所有别名
        for alias in coin.aliases {
            registry.insert(*alias, coin.canonical);
        }
    }

    registry
});

/// 标准化币种标识符
///
/// 接受规范标识或别名（不区分大小写，忽略首尾空白），返回规范标识；
/// 不认识的标识返回 `None`。
///
/// ```rust
/// # use ironvault::utils::coin_normalizer::normalize_coin_identifier;
/// assert_eq!(normalize_coin_identifier("BTC"), Some("btc"));
/// assert_eq!(normalize_coin_identifier(" Ripple "), Some("xrp"));
/// assert_eq!(normalize_coin_identifier("doge"), None);
/// ```
pub fn normalize_coin_identifier(input: &str) -> Option<&'static str> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    ALIAS_REGISTRY
        .get(trimmed.to_ascii_lowercase().as_str())
        .copied()
}

/// 判断是否为测试网币种
pub fn is_testnet_coin(input: &str) -> bool {
    normalize_coin_identifier(input).is_some_and(|canonical| canonical.starts_with('t'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_canonical() {
        for id in [
            "btc", "tbtc", "bch", "tbch", "ltc", "tltc", "eth", "teth", "rmg", "trmg", "xrp",
            "txrp",
        ] {
            assert_eq!(normalize_coin_identifier(id), Some(id));
        }
    }

    #[test]
    fn test_normalize_aliases() {
        assert_eq!(normalize_coin_identifier("BTC"), Some("btc"));
        assert_eq!(normalize_coin_identifier("Bitcoin"), Some("btc"));
        assert_eq!(normalize_coin_identifier("Bitcoin Cash"), Some("bch"));
        assert_eq!(normalize_coin_identifier("ETHEREUM"), Some("eth"));
        assert_eq!(normalize_coin_identifier("ripple"), Some("xrp"));
        assert_eq!(normalize_coin_identifier("  tXRP\n"), Some("txrp"));
    }

    #[test]
    fn test_is_testnet_coin() {
        assert!(is_testnet_coin("tbtc"));
        assert!(is_testnet_coin("Testnet Ripple"));
        assert!(!is_testnet_coin("btc"));
        assert!(!is_testnet_coin("unknown"));
    }

    #[test]
    fn test_invalid_coin() {
        assert_eq!(normalize_coin_identifier("invalid_coin"), None);
        assert_eq!(normalize_coin_identifier(""), None);
        assert_eq!(normalize_coin_identifier("   "), None);
    }
}
