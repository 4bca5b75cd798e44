//! Extraction adapter: turns free text or a receipt photo into structured
//! expense fields.
//!
//! The adapter wraps an OpenAI-compatible model call behind a normalized
//! result contract. When no credential is configured, or the call fails, the
//! text path falls back to a deterministic keyword parser; the image path
//! has no fallback and reports an explicit failure instead. Transport errors
//! never reach the caller as panics and nothing here retries.

use std::path::Path;
use std::time::Duration;

use base64::Engine as _;
use chrono::{DateTime, NaiveDate, Utc};
use engine::{Currency, Money};
use serde_json::Value;
use thiserror::Error;

pub use provider::ProviderConfig;

mod fallback;
mod provider;

/// Placeholder item used when neither the model nor the user supplied one.
pub const DEFAULT_ITEM: &str = "消费";

const DEFAULT_CATEGORY: &str = "其他";
const IMAGE_DEFAULT_ITEM: &str = "未知商品";
const ITEM_FROM_TEXT_MAX_CHARS: usize = 20;

/// Structured fields of an extracted expense.
///
/// Invariant: amount and currency are always present; the adapter back-fills
/// defaults when the model omits them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpenseFields {
    pub amount_minor: i64,
    pub currency: Currency,
    pub category: String,
    pub item: String,
    /// A receipt may carry its own date; `None` means "use commit time".
    pub created_at: Option<DateTime<Utc>>,
}

/// Why an input could not be turned into expense fields.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The model (or fallback parser) judged the input non-financial.
    #[error("input does not describe an expense")]
    NotAnExpense,
    /// No model credential is configured and the requested path needs one.
    #[error("no model credential configured")]
    NoApiKey,
    /// No numeric amount could be found in the text.
    #[error("no amount found")]
    NoAmountFound,
    /// The vision response was malformed or not expense-shaped.
    #[error("unusable vision response: {0}")]
    VisionParse(String),
    /// The model call itself failed (transport or provider error).
    #[error("model call failed: {0}")]
    ModelCall(String),
}

pub struct Extractor {
    provider: Option<ProviderConfig>,
    client: reqwest::Client,
}

impl Extractor {
    /// Builds an adapter around an optional provider. With `None` the text
    /// path runs the fallback parser only and images are rejected.
    pub fn new(provider: Option<ProviderConfig>) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|err| format!("failed to build http client: {err}"))?;

        Ok(Self { provider, client })
    }

    /// Extracts expense fields from a free-text message.
    pub async fn extract_from_text(&self, text: &str) -> Result<ExpenseFields, ExtractError> {
        let Some(provider) = &self.provider else {
            return fallback::parse_text(text);
        };

        let content = match provider::complete_text(&self.client, provider, text).await {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("text model call failed, using fallback parser: {err}");
                return fallback::parse_text(text);
            }
        };

        match fields_from_text_response(&content, text) {
            Ok(fields) => Ok(fields),
            // "Not an expense" is a verdict, not a parse failure.
            Err(ExtractError::NotAnExpense) => Err(ExtractError::NotAnExpense),
            Err(err) => {
                tracing::warn!("unusable model response ({err}), using fallback parser");
                fallback::parse_text(text)
            }
        }
    }

    /// Extracts expense fields from a receipt photo on disk.
    pub async fn extract_from_image(&self, path: &Path) -> Result<ExpenseFields, ExtractError> {
        let Some(provider) = &self.provider else {
            return Err(ExtractError::NoApiKey);
        };

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|err| ExtractError::ModelCall(format!("failed to read image: {err}")))?;
        let encoded = base64::prelude::BASE64_STANDARD.encode(bytes);

        let content = provider::complete_image(&self.client, provider, &encoded).await?;
        fields_from_image_response(&content)
    }
}

fn fields_from_text_response(content: &str, source_text: &str) -> Result<ExpenseFields, ExtractError> {
    let value: Value = serde_json::from_str(content)
        .map_err(|err| ExtractError::ModelCall(format!("malformed model response: {err}")))?;
    let Some(object) = value.as_object() else {
        return Err(ExtractError::ModelCall(
            "model response is not an object".to_string(),
        ));
    };

    if !is_expense(object) {
        return Err(ExtractError::NotAnExpense);
    }

    let currency = currency_from(object);
    let amount_minor = match amount_minor_from(object, currency) {
        Some(minor) => minor,
        // The model answered but dropped the amount; the fallback parser can
        // usually still find it in the source text.
        None => fallback::parse_text(source_text)?.amount_minor,
    };

    Ok(ExpenseFields {
        amount_minor,
        currency,
        category: string_from(object, "category").unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
        item: string_from(object, "item").unwrap_or_else(|| truncated_item(source_text)),
        created_at: None,
    })
}

fn fields_from_image_response(content: &str) -> Result<ExpenseFields, ExtractError> {
    let value: Value = serde_json::from_str(content)
        .map_err(|err| ExtractError::VisionParse(format!("malformed response: {err}")))?;
    let Some(object) = value.as_object() else {
        return Err(ExtractError::VisionParse(
            "response is not an object".to_string(),
        ));
    };

    if !is_expense(object) {
        return Err(ExtractError::NotAnExpense);
    }

    let currency = currency_from(object);
    let amount_minor = amount_minor_from(object, currency).ok_or(ExtractError::NoAmountFound)?;

    Ok(ExpenseFields {
        amount_minor,
        currency,
        category: string_from(object, "category").unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
        item: string_from(object, "item").unwrap_or_else(|| IMAGE_DEFAULT_ITEM.to_string()),
        created_at: object
            .get("created_at")
            .and_then(Value::as_str)
            .and_then(parse_receipt_date),
    })
}

fn is_expense(object: &serde_json::Map<String, Value>) -> bool {
    // Absent means yes: the model only sets the flag to reject.
    object
        .get("is_expense")
        .and_then(Value::as_bool)
        .unwrap_or(true)
}

fn currency_from(object: &serde_json::Map<String, Value>) -> Currency {
    object
        .get("currency")
        .and_then(Value::as_str)
        .and_then(|code| Currency::try_from(code).ok())
        .unwrap_or_default()
}

fn amount_minor_from(object: &serde_json::Map<String, Value>, currency: Currency) -> Option<i64> {
    let amount = object.get("amount")?.as_f64()?;
    Money::from_major_f64(amount, currency)
        .ok()
        .filter(|m| m.is_positive())
        .map(Money::minor)
}

fn string_from(object: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    object
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn truncated_item(text: &str) -> String {
    text.trim().chars().take(ITEM_FROM_TEXT_MAX_CHARS).collect()
}

fn parse_receipt_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_response_backfills_currency_and_item() {
        let fields =
            fields_from_text_response(r#"{"amount": 200, "category": "餐饮"}"#, "买菜 200")
                .unwrap();
        assert_eq!(fields.amount_minor, 20_000);
        assert_eq!(fields.currency, Currency::Cny);
        assert_eq!(fields.item, "买菜 200");
    }

    #[test]
    fn text_response_merges_amount_from_fallback() {
        let fields = fields_from_text_response(
            r#"{"currency": "HKD", "category": "交通", "item": "打车"}"#,
            "打车 80",
        )
        .unwrap();
        assert_eq!(fields.amount_minor, 8000);
        assert_eq!(fields.currency, Currency::Hkd);
    }

    #[test]
    fn not_an_expense_is_a_verdict() {
        let err = fields_from_text_response(r#"{"is_expense": false}"#, "你好").unwrap_err();
        assert!(matches!(err, ExtractError::NotAnExpense));
    }

    #[test]
    fn image_response_requires_amount() {
        let err = fields_from_image_response(r#"{"currency": "CNY"}"#).unwrap_err();
        assert!(matches!(err, ExtractError::NoAmountFound));
    }

    #[test]
    fn image_response_accepts_receipt_date() {
        let fields = fields_from_image_response(
            r#"{"amount": 31.5, "currency": "HKD", "category": "餐饮", "item": "茶餐厅", "created_at": "2026-05-01"}"#,
        )
        .unwrap();
        assert_eq!(fields.amount_minor, 3150);
        assert_eq!(
            fields.created_at.map(|dt| dt.date_naive().to_string()),
            Some("2026-05-01".to_string())
        );
    }

    #[test]
    fn unknown_model_currency_defaults_to_cny() {
        let fields =
            fields_from_text_response(r#"{"amount": 10, "currency": "JPY"}"#, "午饭 10").unwrap();
        assert_eq!(fields.currency, Currency::Cny);
    }

    #[test]
    fn item_truncation_counts_chars_not_bytes() {
        let long = "很".repeat(40);
        assert_eq!(truncated_item(&long).chars().count(), 20);
    }
}
