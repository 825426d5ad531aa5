//! OpenAI text generation over both the Chat Completions and Responses APIs.

use serde_json::{json, Value};

use crate::error::{ServiceError, ServiceResult};

const API_BASE: &str = "https://api.openai.com/v1";

/// Which endpoint shape a request goes through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiStyle {
    #[default]
    ChatCompletions,
    Responses,
}

/// Sampling and length controls. Unset fields are left out of the body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationControls {
    pub max_output_tokens: Option<u32>,
    pub temperature: Option<f32>,
    /// Responses API only: `minimal`, `low`, `medium` or `high`
    pub reasoning_effort: Option<String>,
    /// Responses API only: `low`, `medium` or `high`
    pub verbosity: Option<String>,
}

impl ApiStyle {
    /// GPT-5 family models go through the Responses API.
    pub fn for_model(model: &str) -> Self {
        if model.starts_with("gpt-5") {
            ApiStyle::Responses
        } else {
            ApiStyle::ChatCompletions
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub model: String,
    pub system: Option<String>,
    pub prompt: String,
    pub controls: GenerationControls,
    pub api: ApiStyle,
}

impl GenerationRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system: None,
            prompt: prompt.into(),
            controls: GenerationControls::default(),
            api: ApiStyle::default(),
        }
    }

    /// A request with a length budget and creativity level expressed the way
    /// the model's API takes them: temperature for chat models, minimal
    /// reasoning and low verbosity for Responses models.
    pub fn tuned(
        model: impl Into<String>,
        prompt: impl Into<String>,
        max_output_tokens: u32,
        temperature: f32,
    ) -> Self {
        let model = model.into();
        let api = ApiStyle::for_model(&model);
        let request = Self::new(model, prompt)
            .max_output_tokens(max_output_tokens)
            .api(api);

        match api {
            ApiStyle::ChatCompletions => request.temperature(temperature),
            ApiStyle::Responses => request.reasoning_effort("minimal").verbosity("low"),
        }
    }

    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn max_output_tokens(mut self, tokens: u32) -> Self {
        self.controls.max_output_tokens = Some(tokens);
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.controls.temperature = Some(temperature);
        self
    }

    pub fn reasoning_effort(mut self, effort: impl Into<String>) -> Self {
        self.controls.reasoning_effort = Some(effort.into());
        self
    }

    pub fn verbosity(mut self, verbosity: impl Into<String>) -> Self {
        self.controls.verbosity = Some(verbosity.into());
        self
    }

    pub fn api(mut self, api: ApiStyle) -> Self {
        self.api = api;
        self
    }

    fn chat_body(&self) -> Value {
        let mut messages = Vec::new();
        if let Some(ref system) = self.system {
            messages.push(json!({ "role": "system", "content": system }));
        }
        messages.push(json!({ "role": "user", "content": self.prompt }));

        let mut body = json!({ "model": self.model, "messages": messages });
        if let Some(tokens) = self.controls.max_output_tokens {
            body["max_completion_tokens"] = json!(tokens);
        }
        if let Some(temperature) = self.controls.temperature {
            body["temperature"] = json!(temperature);
        }
        body
    }

    fn responses_body(&self) -> Value {
        // The Responses API takes one input string; fold the system text in front.
        let input = match self.system {
            Some(ref system) => format!("{}\n\n{}", system, self.prompt),
            None => self.prompt.clone(),
        };

        let mut body = json!({ "model": self.model, "input": input });
        if let Some(tokens) = self.controls.max_output_tokens {
            body["max_output_tokens"] = json!(tokens);
        }
        if let Some(temperature) = self.controls.temperature {
            body["temperature"] = json!(temperature);
        }
        if let Some(ref effort) = self.controls.reasoning_effort {
            body["reasoning"] = json!({ "effort": effort });
        }
        if let Some(ref verbosity) = self.controls.verbosity {
            body["text"] = json!({ "verbosity": verbosity });
        }
        body
    }

    /// Endpoint path and JSON body for this request.
    pub fn to_body(&self) -> (&'static str, Value) {
        match self.api {
            ApiStyle::ChatCompletions => ("/chat/completions", self.chat_body()),
            ApiStyle::Responses => ("/responses", self.responses_body()),
        }
    }
}

/// `choices[0].message.content`
fn chat_text(body: &Value) -> Option<String> {
    body.pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// All `output_text` parts of all `message` outputs, concatenated.
fn responses_text(body: &Value) -> Option<String> {
    if let Some(text) = body.get("output_text").and_then(Value::as_str) {
        return Some(text.to_string());
    }

    let parts: Vec<&str> = body
        .get("output")?
        .as_array()?
        .iter()
        .filter_map(|item| item.get("content").and_then(Value::as_array))
        .flatten()
        .filter(|part| part.get("type").and_then(Value::as_str) == Some("output_text"))
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.concat())
    }
}

/// Pull the generated text out of a response body.
pub fn extract_text(api: ApiStyle, body: &Value) -> ServiceResult<String> {
    let text = match api {
        ApiStyle::ChatCompletions => chat_text(body),
        ApiStyle::Responses => responses_text(body),
    };

    text.ok_or_else(|| ServiceError::unexpected("OpenAI", "response carried no text"))
}

/// Anything that turns a prompt into text.
#[allow(async_fn_in_trait)]
pub trait TextGenerator {
    async fn generate(&self, request: &GenerationRequest) -> ServiceResult<String>;
}

pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
}

impl OpenAiClient {
    pub fn new(http: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            http,
            api_key: api_key.into(),
        }
    }
}

impl TextGenerator for OpenAiClient {
    async fn generate(&self, request: &GenerationRequest) -> ServiceResult<String> {
        let (path, body) = request.to_body();

        let response = self
            .http
            .post(format!("{}{}", API_BASE, path))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ServiceError::from_response("OpenAI", response).await);
        }

        let payload: Value = response.json().await?;
        extract_text(request.api, &payload)
    }
}
