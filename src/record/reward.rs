//! Reward text parsing
//!
//! Listings show rewards as a percentage of the purchase amount, a point
//! count, or a fixed currency amount. Point counts are converted to currency
//! only when an exchange rate is configured, since every site values its
//! points differently.

use regex::Regex;
use std::sync::LazyLock;

use super::types::{RewardUnit, RewardValue};
use crate::utils::string_utils::fold_width;

static PERCENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:\.\d+)?)\s*(?:%|パーセント)").expect("PERCENT_RE: hardcoded regex is valid")
});

static POINTS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(?:ポイント|points?|pts?|p)(?:[^a-z]|$)")
        .expect("POINTS_RE: hardcoded regex is valid")
});

static CURRENCY_SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(円|yen|jpy|usd|ドル)")
        .expect("CURRENCY_SUFFIX_RE: hardcoded regex is valid")
});

static CURRENCY_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(¥|\$|jpy|usd)\s*(\d+(?:\.\d+)?)")
        .expect("CURRENCY_PREFIX_RE: hardcoded regex is valid")
});

fn currency_label(token: &str, default_currency: &str) -> String {
    match token.to_lowercase().as_str() {
        "円" | "yen" | "jpy" | "¥" => "JPY".to_string(),
        "usd" | "$" | "ドル" => "USD".to_string(),
        _ => default_currency.to_string(),
    }
}

/// Parse displayed reward text into an amount and unit.
///
/// `exchange_rate` is points per one unit of `currency`. Without it point
/// rewards keep `RewardUnit::Points`. Text that matches nothing is returned
/// as `RewardUnit::Unknown` with the raw text preserved.
#[must_use]
pub fn parse_reward(text: &str, exchange_rate: Option<f64>, currency: &str) -> RewardValue {
    let raw = text.trim().to_string();
    let folded = fold_width(&raw).replace([',', '，'], "");

    if let Some(caps) = PERCENT_RE.captures(&folded)
        && let Ok(amount) = caps[1].parse::<f64>()
    {
        return RewardValue {
            raw,
            amount: Some(amount),
            unit: RewardUnit::Percent,
            currency: None,
        };
    }

    if let Some(caps) = POINTS_RE.captures(&folded)
        && let Ok(points) = caps[1].parse::<f64>()
    {
        return match exchange_rate {
            Some(rate) if rate > 0.0 => RewardValue {
                raw,
                amount: Some((points / rate).floor()),
                unit: RewardUnit::Currency,
                currency: Some(currency.to_string()),
            },
            _ => RewardValue {
                raw,
                amount: Some(points),
                unit: RewardUnit::Points,
                currency: None,
            },
        };
    }

    let fixed = CURRENCY_SUFFIX_RE
        .captures(&folded)
        .map(|caps| (caps[1].to_string(), caps[2].to_string()))
        .or_else(|| {
            CURRENCY_PREFIX_RE
                .captures(&folded)
                .map(|caps| (caps[2].to_string(), caps[1].to_string()))
        });

    if let Some((number, token)) = fixed
        && let Ok(amount) = number.parse::<f64>()
    {
        return RewardValue {
            raw,
            amount: Some(amount),
            unit: RewardUnit::Currency,
            currency: Some(currency_label(&token, currency)),
        };
    }

    RewardValue::unknown(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentages() {
        let r = parse_reward("購入金額の１．５％", None, "JPY");
        // full-width period is folded too
        assert_eq!(r.unit, RewardUnit::Percent);
        assert_eq!(r.amount, Some(1.5));

        let r = parse_reward("最大 5% 還元", Some(10.0), "JPY");
        assert_eq!(r.amount, Some(5.0));
    }

    #[test]
    fn points_without_rate_stay_points() {
        let r = parse_reward("1,200pt", None, "JPY");
        assert_eq!(r.unit, RewardUnit::Points);
        assert_eq!(r.amount, Some(1200.0));

        let r = parse_reward("５００ポイント", None, "JPY");
        assert_eq!(r.amount, Some(500.0));
    }

    #[test]
    fn points_with_rate_become_currency() {
        let r = parse_reward("1,205pt", Some(10.0), "JPY");
        assert_eq!(r.unit, RewardUnit::Currency);
        assert_eq!(r.amount, Some(120.0));
        assert_eq!(r.currency.as_deref(), Some("JPY"));
    }

    #[test]
    fn fixed_amounts() {
        let r = parse_reward("1,000円", None, "JPY");
        assert_eq!(r.unit, RewardUnit::Currency);
        assert_eq!(r.amount, Some(1000.0));

        let r = parse_reward("¥300", None, "JPY");
        assert_eq!(r.amount, Some(300.0));

        let r = parse_reward("$15 cashback", None, "JPY");
        assert_eq!(r.currency.as_deref(), Some("USD"));
    }

    #[test]
    fn unparseable_text_is_unknown_not_rejected() {
        let r = parse_reward("  条件達成で還元  ", None, "JPY");
        assert_eq!(r.unit, RewardUnit::Unknown);
        assert_eq!(r.amount, None);
        assert_eq!(r.raw, "条件達成で還元");
    }

    #[test]
    fn point_suffix_does_not_match_words() {
        let r = parse_reward("3 people", None, "JPY");
        assert_eq!(r.unit, RewardUnit::Unknown);
    }
}
