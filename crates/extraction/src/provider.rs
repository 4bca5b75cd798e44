//! OpenAI-compatible chat-completions provider.
//!
//! Both supported upstreams (DashScope and OpenAI) speak the same wire
//! format, so one client covers both; only credentials, base url and model
//! names differ.

use serde::{Deserialize, Serialize};

use crate::ExtractError;

const DASHSCOPE_BASE_URL: &str = "https://dashscope.aliyuncs.com/compatible-mode/v1";
const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

const IMAGE_USER_PROMPT: &str = "这是我的消费小票，请识别其中的金额、币种、类别和商品名称。";
const IMAGE_MAX_TOKENS: u32 = 300;

const SYSTEM_PROMPT: &str = r#"You are a smart expense tracking assistant for a family living in both Mainland China and Hong Kong.
Your task is to extract expense details from the user's natural language input or receipt images.

The user maintains three ledgers: CNY (default for the Mainland or when unspecified), HKD (Hong Kong), USDT (crypto/Tether).

Extract the following fields in JSON format:
- amount: (number) the numerical value.
- currency: (string) "CNY", "HKD" or "USDT".
- category: (string) a short category in Simplified Chinese (e.g. "餐饮", "交通", "购物", "居住", "娱乐", "医疗", "其他").
- item: (string) a brief description in Simplified Chinese; translate if the input is in another language.

Currency inference rules:
1. Explicit tokens always win: "港币"/"HKD"/"HK$"/"港纸" -> HKD; "USDT"/"Tether"/"泰达币"/"U"/"u" -> USDT; "人民币"/"RMB"/"CNY"/"元" -> CNY.
2. Contextual cues: Hong Kong places or services ("MTR", "旺角", "茶餐厅", "八达通", English HK receipts) -> HKD; crypto terms ("Gas fee", "TRX", "ETH", "Binance") -> USDT; Mainland services ("微信支付", "支付宝", "淘宝", "美团", "滴滴") -> CNY.
3. Default to CNY when nothing applies.

Examples:
- "买菜 200" -> {"amount": 200, "currency": "CNY", "category": "餐饮", "item": "买菜"}
- "打车去旺角 80" -> {"amount": 80, "currency": "HKD", "category": "交通", "item": "打车去旺角"}
- "午饭 500 港币" -> {"amount": 500, "currency": "HKD", "category": "餐饮", "item": "午饭"}
- "Gas fee 10 U" -> {"amount": 10, "currency": "USDT", "category": "其他", "item": "Gas fee"}

Rules:
- If the input is not an expense, return {"is_expense": false}.
- Return JSON only.
- ALWAYS return 'item' and 'category' in Simplified Chinese."#;

/// Resolved provider: credential, endpoint and model names.
///
/// Constructed once at process start and injected into the adapter, so tests
/// can run without touching process-global state.
#[derive(Clone, Debug)]
pub struct ProviderConfig {
    api_key: String,
    base_url: String,
    text_model: String,
    vision_model: String,
}

impl ProviderConfig {
    /// Selects a provider from the configured credentials. DashScope wins
    /// when both are present; `None` when neither is set.
    pub fn select(
        dashscope_api_key: Option<String>,
        openai_api_key: Option<String>,
        openai_base_url: Option<String>,
    ) -> Option<Self> {
        if let Some(key) = dashscope_api_key.filter(|k| !k.trim().is_empty()) {
            tracing::info!("using DashScope models for extraction");
            return Some(Self {
                api_key: key,
                base_url: DASHSCOPE_BASE_URL.to_string(),
                text_model: "qwen-plus".to_string(),
                vision_model: "qwen-vl-max".to_string(),
            });
        }

        let key = openai_api_key.filter(|k| !k.trim().is_empty())?;
        tracing::info!("using OpenAI models for extraction");
        Some(Self {
            api_key: key,
            base_url: openai_base_url.unwrap_or_else(|| OPENAI_BASE_URL.to_string()),
            text_model: "gpt-4o-mini".to_string(),
            vision_model: "gpt-4o".to_string(),
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    response_format: ResponseFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: MessageContent<'a>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum MessageContent<'a> {
    Text(&'a str),
    Parts(Vec<ContentPart<'a>>),
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
    detail: &'static str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

/// Asks the text model for a JSON-only extraction of `text`.
pub(crate) async fn complete_text(
    client: &reqwest::Client,
    config: &ProviderConfig,
    text: &str,
) -> Result<String, ExtractError> {
    let request = ChatRequest {
        model: &config.text_model,
        messages: vec![
            ChatMessage {
                role: "system",
                content: MessageContent::Text(SYSTEM_PROMPT),
            },
            ChatMessage {
                role: "user",
                content: MessageContent::Text(text),
            },
        ],
        response_format: ResponseFormat {
            kind: "json_object",
        },
        max_tokens: None,
    };

    send(client, config, &request).await
}

/// Asks the vision model for a JSON-only extraction of a base64 JPEG.
pub(crate) async fn complete_image(
    client: &reqwest::Client,
    config: &ProviderConfig,
    image_base64: &str,
) -> Result<String, ExtractError> {
    let request = ChatRequest {
        model: &config.vision_model,
        messages: vec![
            ChatMessage {
                role: "system",
                content: MessageContent::Text(SYSTEM_PROMPT),
            },
            ChatMessage {
                role: "user",
                content: MessageContent::Parts(vec![
                    ContentPart::Text {
                        text: IMAGE_USER_PROMPT,
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: format!("data:image/jpeg;base64,{image_base64}"),
                            detail: "high",
                        },
                    },
                ]),
            },
        ],
        response_format: ResponseFormat {
            kind: "json_object",
        },
        max_tokens: Some(IMAGE_MAX_TOKENS),
    };

    send(client, config, &request).await
}

async fn send(
    client: &reqwest::Client,
    config: &ProviderConfig,
    request: &ChatRequest<'_>,
) -> Result<String, ExtractError> {
    let response = client
        .post(config.completions_url())
        .bearer_auth(&config.api_key)
        .json(request)
        .send()
        .await
        .map_err(|err| ExtractError::ModelCall(err.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let detail = provider_error_message(&body).unwrap_or(body);
        return Err(ExtractError::ModelCall(format!("{status}: {detail}")));
    }

    let parsed: ChatResponse = response
        .json()
        .await
        .map_err(|err| ExtractError::ModelCall(format!("malformed response body: {err}")))?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| ExtractError::ModelCall("response contained no content".to_string()))
}

/// Pulls `error.message` out of a provider error body, if it is JSON-shaped.
fn provider_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("error")?
        .get("message")?
        .as_str()
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dashscope_wins_over_openai() {
        let config = ProviderConfig::select(
            Some("ds-key".to_string()),
            Some("oa-key".to_string()),
            None,
        )
        .unwrap();
        assert!(config.base_url.contains("dashscope"));
        assert_eq!(config.text_model, "qwen-plus");
    }

    #[test]
    fn openai_base_url_is_overridable() {
        let config = ProviderConfig::select(
            None,
            Some("oa-key".to_string()),
            Some("https://proxy.example/v1".to_string()),
        )
        .unwrap();
        assert_eq!(
            config.completions_url(),
            "https://proxy.example/v1/chat/completions"
        );
    }

    #[test]
    fn blank_credentials_mean_no_provider() {
        assert!(ProviderConfig::select(Some("  ".to_string()), None, None).is_none());
        assert!(ProviderConfig::select(None, None, None).is_none());
    }

    #[test]
    fn provider_errors_surface_their_message() {
        let body = r#"{"error": {"message": "invalid api key"}}"#;
        assert_eq!(
            provider_error_message(body).as_deref(),
            Some("invalid api key")
        );
        assert!(provider_error_message("not json").is_none());
    }
}
