//! Deterministic fallback parser for plain-text inputs.
//!
//! Used when no model credential is configured, or when the model call (or
//! its response) is unusable. It only reacts to explicit currency tokens;
//! contextual inference (place names, payment apps) is the model's job.

use engine::{Currency, Money};

use crate::{DEFAULT_CATEGORY, ExpenseFields, ExtractError};

const HKD_TOKENS: &[&str] = &["hkd", "港币", "港元", "港幣", "港纸", "蚊"];
const USDT_TOKENS: &[&str] = &["usdt", "tether", "泰达币"];
const CNY_TOKENS: &[&str] = &["cny", "人民币", "rmb"];
// Generic money-unit words imply the mainland ledger.
const CNY_UNIT_WORDS: &[&str] = &["块", "元"];

const RECHARGE_KEYWORDS: &[&str] = &["充值", "会员"];
const FOOD_KEYWORDS: &[&str] = &["餐", "饭", "早餐", "午饭", "晚餐", "买菜", "超市"];
const TRANSPORT_KEYWORDS: &[&str] = &["打车", "出租", "交通", "地铁", "公交", "的士", "巴士", "mtr"];

pub(crate) fn parse_text(text: &str) -> Result<ExpenseFields, ExtractError> {
    let lower = text.to_lowercase();

    // Checks are applied in sequence; a later explicit token overrides an
    // earlier one, and unit words force CNY last.
    let mut currency = Currency::Cny;
    if HKD_TOKENS.iter().any(|tok| lower.contains(tok)) {
        currency = Currency::Hkd;
    }
    if USDT_TOKENS.iter().any(|tok| lower.contains(tok)) {
        currency = Currency::Usdt;
    }
    if CNY_TOKENS.iter().any(|tok| lower.contains(tok)) {
        currency = Currency::Cny;
    }
    if CNY_UNIT_WORDS.iter().any(|tok| text.contains(tok)) {
        currency = Currency::Cny;
    }

    let number = first_number(text).ok_or(ExtractError::NoAmountFound)?;
    let amount =
        Money::from_major_f64(number, currency).map_err(|_| ExtractError::NoAmountFound)?;
    if !amount.is_positive() {
        return Err(ExtractError::NoAmountFound);
    }

    Ok(ExpenseFields {
        amount_minor: amount.minor(),
        currency,
        category: classify(text, &lower).to_string(),
        item: text.trim().to_string(),
        created_at: None,
    })
}

fn classify(text: &str, lower: &str) -> &'static str {
    if RECHARGE_KEYWORDS.iter().any(|kw| text.contains(kw)) {
        DEFAULT_CATEGORY
    } else if FOOD_KEYWORDS.iter().any(|kw| text.contains(kw)) {
        "餐饮"
    } else if TRANSPORT_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        "交通"
    } else {
        DEFAULT_CATEGORY
    }
}

/// Returns the first numeric substring (digits with at most one embedded
/// decimal point) as a float.
fn first_number(text: &str) -> Option<f64> {
    let mut run = String::new();
    let mut seen_dot = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c.is_ascii_digit() {
            run.push(c);
        } else if c == '.'
            && !run.is_empty()
            && !seen_dot
            && chars.peek().is_some_and(char::is_ascii_digit)
        {
            run.push(c);
            seen_dot = true;
        } else if !run.is_empty() {
            break;
        }
    }

    if run.is_empty() {
        return None;
    }
    run.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groceries_default_to_cny_food() {
        let fields = parse_text("买菜 200").unwrap();
        assert_eq!(fields.amount_minor, 20_000);
        assert_eq!(fields.currency, Currency::Cny);
        assert_eq!(fields.category, "餐饮");
        assert_eq!(fields.item, "买菜 200");
    }

    #[test]
    fn taxi_without_currency_token_stays_cny() {
        let fields = parse_text("打车 50").unwrap();
        assert_eq!(fields.currency, Currency::Cny);
        assert_eq!(fields.category, "交通");
        assert_eq!(fields.amount_minor, 5000);
    }

    #[test]
    fn context_words_alone_do_not_switch_currency() {
        // 旺角 implies Hong Kong, but only the model path does contextual
        // inference; the fallback needs an explicit token.
        let fields = parse_text("打车去旺角 80").unwrap();
        assert_eq!(fields.currency, Currency::Cny);
        assert_eq!(fields.category, "交通");
    }

    #[test]
    fn explicit_hkd_token_wins() {
        let fields = parse_text("午饭 500 港币").unwrap();
        assert_eq!(fields.currency, Currency::Hkd);
        assert_eq!(fields.category, "餐饮");
        assert_eq!(fields.amount_minor, 50_000);
    }

    #[test]
    fn usdt_token_is_case_insensitive() {
        let fields = parse_text("gas fee 10 USDT").unwrap();
        assert_eq!(fields.currency, Currency::Usdt);
        assert_eq!(fields.amount_minor, 1000);
    }

    #[test]
    fn unit_words_force_cny() {
        let fields = parse_text("买水 10块").unwrap();
        assert_eq!(fields.currency, Currency::Cny);
    }

    #[test]
    fn recharge_maps_to_other() {
        let fields = parse_text("会员充值 100").unwrap();
        assert_eq!(fields.category, "其他");
    }

    #[test]
    fn no_number_means_no_expense() {
        assert!(matches!(
            parse_text("你好"),
            Err(ExtractError::NoAmountFound)
        ));
    }

    #[test]
    fn decimal_amounts_parse() {
        let fields = parse_text("咖啡 12.5").unwrap();
        assert_eq!(fields.amount_minor, 1250);
    }
}
