use tokio::sync::OnceCell;

use crate::config::{resolve_api_key, LlmConfig, AUTO_MODEL};
use crate::error::GenerationError;

type Result<T> = std::result::Result<T, GenerationError>;

/// Used when Gemini model discovery fails or finds nothing usable.
pub const GEMINI_FALLBACK_MODEL: &str = "gemini-1.5-flash";

/// LLM text generation service over Gemini, OpenAI, Anthropic, and Ollama.
///
/// [`generate_json`](Self::generate_json) asks each provider for its JSON
/// output mode where one exists; the caller still validates the document.
pub struct LlmService {
    provider: LlmProvider,
    config: LlmConfig,
    api_key: Option<String>,
    client: reqwest::Client,
    /// Gemini model picked on first use when `model = "auto"`.
    discovered_model: OnceCell<String>,
}

impl std::fmt::Debug for LlmService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmService")
            .field("provider", &self.provider)
            .field("model", &self.model())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LlmProvider {
    Ollama,
    OpenAI,
    Gemini,
    Anthropic,
}

impl LlmProvider {
    fn name(self) -> &'static str {
        match self {
            Self::Ollama => "ollama",
            Self::OpenAI => "openai",
            Self::Gemini => "gemini",
            Self::Anthropic => "anthropic",
        }
    }

    fn default_env_var(self) -> Option<&'static str> {
        match self {
            Self::Ollama => None,
            Self::OpenAI => Some("OPENAI_API_KEY"),
            Self::Gemini => Some("GEMINI_API_KEY"),
            Self::Anthropic => Some("ANTHROPIC_API_KEY"),
        }
    }

    /// Model used for `model = "auto"`. Gemini has none: it is discovered.
    fn default_model(self) -> Option<&'static str> {
        match self {
            Self::Ollama => Some("llama3.2"),
            Self::OpenAI => Some("gpt-4o-mini"),
            Self::Gemini => None,
            Self::Anthropic => Some("claude-sonnet-4-5"),
        }
    }
}

fn is_auto(model: &str) -> bool {
    let model = model.trim();
    model.is_empty() || model.eq_ignore_ascii_case(AUTO_MODEL)
}

/// Pick a model from a Gemini `models.list` response: the first flash model
/// that supports `generateContent`, else the first such gemini model.
pub fn pick_gemini_model(listing: &serde_json::Value) -> Option<String> {
    let models = listing["models"].as_array()?;
    let usable = |m: &&serde_json::Value| {
        m["supportedGenerationMethods"]
            .as_array()
            .is_some_and(|methods| methods.iter().any(|x| x == "generateContent"))
    };
    let name_of = |m: &serde_json::Value| m["name"].as_str().map(str::to_string);

    let flash = models
        .iter()
        .filter(usable)
        .find(|m| m["name"].as_str().is_some_and(|n| n.contains("flash")));
    let chosen = flash.or_else(|| {
        models
            .iter()
            .filter(usable)
            .find(|m| m["name"].as_str().is_some_and(|n| n.contains("gemini")))
    })?;
    name_of(chosen).map(|n| n.trim_start_matches("models/").to_string())
}

impl LlmService {
    /// Create an LLM service from configuration. Fails when the provider is
    /// unknown or needs a key that cannot be resolved.
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let provider = match config.provider.as_str() {
            "ollama" => LlmProvider::Ollama,
            "openai" => LlmProvider::OpenAI,
            "gemini" => LlmProvider::Gemini,
            "anthropic" | "claude" => LlmProvider::Anthropic,
            other => {
                return Err(GenerationError::Config(format!(
                    "unknown LLM provider: '{other}' (expected 'gemini', 'openai', 'anthropic', or 'ollama')"
                )));
            }
        };

        let api_key = match provider.default_env_var() {
            Some(env_var) => Some(
                resolve_api_key(config, env_var)
                    .map_err(|e| GenerationError::Config(e.to_string()))?,
            ),
            None => None,
        };

        let mut config = config.clone();
        if is_auto(&config.model) {
            if let Some(model) = provider.default_model() {
                config.model = model.to_string();
            }
        }

        let timeout = std::time::Duration::from_secs(config.timeout_secs);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GenerationError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            provider,
            config,
            api_key,
            client,
            discovered_model: OnceCell::new(),
        })
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// The configured model, or the discovered one once known.
    pub fn model(&self) -> &str {
        self.discovered_model
            .get()
            .map(String::as_str)
            .unwrap_or(&self.config.model)
    }

    /// Generate a JSON document from a prompt with an optional system message.
    pub async fn generate_json(&self, prompt: &str, system: Option<&str>) -> Result<String> {
        tracing::debug!(
            provider = self.provider.name(),
            model = %self.model(),
            prompt_len = prompt.len(),
            "LLM request"
        );
        let text = match self.provider {
            LlmProvider::Ollama => self.generate_ollama(prompt, system).await,
            LlmProvider::OpenAI => self.generate_openai(prompt, system).await,
            LlmProvider::Gemini => self.generate_gemini(prompt, system).await,
            LlmProvider::Anthropic => self.generate_anthropic(prompt, system).await,
        }?;
        tracing::debug!(provider = self.provider.name(), response_len = text.len(), "LLM response");
        Ok(text)
    }

    fn key(&self) -> &str {
        self.api_key.as_deref().unwrap_or_default()
    }

    fn base_url<'a>(&'a self, default: &'a str) -> &'a str {
        self.config
            .base_url
            .as_deref()
            .unwrap_or(default)
            .trim_end_matches('/')
    }

    /// Send the request and return the JSON body, classifying HTTP failures.
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<serde_json::Value> {
        let name = self.provider.name();
        let resp = request
            .send()
            .await
            .map_err(|e| GenerationError::Transport(format!("{name} request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let text = resp.text().await.unwrap_or_default();
            tracing::warn!(provider = name, status, "LLM request rejected");
            return Err(GenerationError::from_status(name, status, &text));
        }

        resp.json().await.map_err(|e| {
            GenerationError::MalformedResponse(format!("{name} response parse error: {e}"))
        })
    }

    /// Ollama: POST {base_url}/api/generate
    async fn generate_ollama(&self, prompt: &str, system: Option<&str>) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url("http://localhost:11434"));

        let mut body = serde_json::json!({
            "model": self.config.model,
            "prompt": prompt,
            "stream": false,
            "format": "json",
            "options": {
                "num_predict": self.config.max_tokens,
                "temperature": self.config.temperature,
            }
        });

        if let Some(sys) = system {
            body["system"] = serde_json::Value::String(sys.to_string());
        }

        let json = self.send(self.client.post(&url).json(&body)).await?;

        json["response"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| {
                GenerationError::MalformedResponse(
                    "Ollama response missing 'response' field".into(),
                )
            })
    }

    /// OpenAI: POST {base_url}/v1/chat/completions
    async fn generate_openai(&self, prompt: &str, system: Option<&str>) -> Result<String> {
        let url = format!(
            "{}/v1/chat/completions",
            self.base_url("https://api.openai.com")
        );

        let mut messages = Vec::new();
        if let Some(sys) = system {
            messages.push(serde_json::json!({"role": "system", "content": sys}));
        }
        messages.push(serde_json::json!({"role": "user", "content": prompt}));

        let body = serde_json::json!({
            "model": self.config.model,
            "messages": messages,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "response_format": {"type": "json_object"},
        });

        let request = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.key()))
            .json(&body);
        let json = self.send(request).await?;

        json["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| {
                GenerationError::MalformedResponse("OpenAI response missing content".into())
            })
    }

    /// Anthropic: POST {base_url}/v1/messages
    async fn generate_anthropic(&self, prompt: &str, system: Option<&str>) -> Result<String> {
        let url = format!("{}/v1/messages", self.base_url("https://api.anthropic.com"));

        let mut body = serde_json::json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "messages": [{"role": "user", "content": prompt}],
        });

        if let Some(sys) = system {
            body["system"] = serde_json::Value::String(sys.to_string());
        }

        let request = self
            .client
            .post(&url)
            .header("x-api-key", self.key())
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&body);
        let json = self.send(request).await?;

        // Anthropic response: {"content": [{"type": "text", "text": "..."}]}
        json["content"][0]["text"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| {
                GenerationError::MalformedResponse(
                    "Anthropic response missing text content".into(),
                )
            })
    }

    /// The Gemini model to call. With `model = "auto"` the first call lists the
    /// available models and the choice is kept for the life of the service.
    async fn gemini_model(&self) -> &str {
        if !is_auto(&self.config.model) {
            return &self.config.model;
        }
        self.discovered_model
            .get_or_init(|| async {
                match self.discover_gemini_model().await {
                    Ok(Some(model)) => {
                        tracing::info!(model = %model, "selected Gemini model");
                        model
                    }
                    Ok(None) => {
                        tracing::warn!("no usable Gemini model listed, using {GEMINI_FALLBACK_MODEL}");
                        GEMINI_FALLBACK_MODEL.to_string()
                    }
                    Err(e) => {
                        tracing::warn!("failed to list Gemini models, using {GEMINI_FALLBACK_MODEL}: {e}");
                        GEMINI_FALLBACK_MODEL.to_string()
                    }
                }
            })
            .await
    }

    /// GET generativelanguage.googleapis.com/v1beta/models
    async fn discover_gemini_model(&self) -> Result<Option<String>> {
        let url = format!(
            "{}/v1beta/models",
            self.base_url("https://generativelanguage.googleapis.com")
        );
        let request = self.client.get(&url).header("x-goog-api-key", self.key());
        let listing = self.send(request).await?;
        Ok(pick_gemini_model(&listing))
    }

    /// Gemini: POST generativelanguage.googleapis.com/v1beta/models/{model}:generateContent
    async fn generate_gemini(&self, prompt: &str, system: Option<&str>) -> Result<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url("https://generativelanguage.googleapis.com"),
            self.gemini_model().await,
        );

        let mut body = serde_json::json!({
            "contents": [{"parts": [{"text": prompt}]}],
            "generationConfig": {
                "maxOutputTokens": self.config.max_tokens,
                "temperature": self.config.temperature,
                "responseMimeType": "application/json",
            }
        });

        if let Some(sys) = system {
            body["systemInstruction"] = serde_json::json!({"parts": [{"text": sys}]});
        }

        let request = self
            .client
            .post(&url)
            .header("x-goog-api-key", self.key())
            .json(&body);
        let json = self.send(request).await?;

        if let Some(reason) = json["promptFeedback"]["blockReason"].as_str() {
            return Err(GenerationError::MalformedResponse(format!(
                "Gemini blocked the prompt: {reason}"
            )));
        }

        json["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| {
                GenerationError::MalformedResponse("Gemini response missing text".into())
            })
    }
}
