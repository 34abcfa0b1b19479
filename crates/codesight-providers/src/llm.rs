use crate::error::ProviderError;

/// System prompt shared across every LLM backend so answer quality
/// expectations don't drift between them.
pub const SYSTEM_PROMPT: &str = "You are a helpful document assistant. Answer questions based ONLY on the \
provided source documents. If the answer is not in the sources, say so. \
Always cite which source(s) your answer comes from using [Source N] notation.";

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Contract every answer-synthesis backend satisfies.
pub trait LlmProvider: Send + Sync {
    fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String, ProviderError>;
    fn model_id(&self) -> String;
}

fn http_client() -> Result<reqwest::blocking::Client, ProviderError> {
    reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .map_err(|e| ProviderError::RequestFailed(e.to_string()))
}

/// Anthropic Messages API.
pub struct ClaudeBackend {
    client: reqwest::blocking::Client,
    api_key: String,
    model: String,
}

impl ClaudeBackend {
    pub fn new(model: Option<String>) -> Result<Self, ProviderError> {
        let api_key = std::env::var("ANTHROPIC_API_KEY").map_err(|_| {
            ProviderError::ConfigFailure(
                "ANTHROPIC_API_KEY environment variable is required for the Claude backend. \
                 Set it or switch to a different backend: CODESIGHT_LLM_BACKEND=ollama"
                    .to_string(),
            )
        })?;
        Ok(Self {
            client: http_client()?,
            api_key,
            model: model.unwrap_or_else(|| "claude-sonnet-4-20250514".to_string()),
        })
    }
}

#[derive(serde::Serialize)]
struct ClaudeMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(serde::Serialize)]
struct ClaudeRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<ClaudeMessage<'a>>,
}

#[derive(serde::Deserialize)]
struct ClaudeResponse {
    content: Vec<ClaudeContentBlock>,
}

#[derive(serde::Deserialize)]
struct ClaudeContentBlock {
    text: String,
}

impl LlmProvider for ClaudeBackend {
    fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String, ProviderError> {
        let body = ClaudeRequest {
            model: &self.model,
            max_tokens: 1024,
            system: system_prompt,
            messages: vec![ClaudeMessage {
                role: "user",
                content: user_prompt,
            }],
        };
        let response = self
            .client
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&body)
            .send()
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;
        if !response.status().is_success() {
            return Err(ProviderError::RequestFailed(format!("Claude API returned {}", response.status())));
        }
        let parsed: ClaudeResponse = response
            .json()
            .map_err(|e| ProviderError::RequestFailed(format!("invalid Claude response: {e}")))?;
        parsed
            .content
            .into_iter()
            .next()
            .map(|b| b.text)
            .ok_or_else(|| ProviderError::RequestFailed("Claude response had no content blocks".to_string()))
    }

    fn model_id(&self) -> String {
        format!("claude:{}", self.model)
    }
}

/// Azure OpenAI — data stays in the caller's Azure tenant.
pub struct AzureOpenAiBackend {
    client: reqwest::blocking::Client,
    endpoint: String,
    api_key: String,
    deployment: String,
    api_version: String,
}

impl AzureOpenAiBackend {
    pub fn new() -> Result<Self, ProviderError> {
        let endpoint = std::env::var("AZURE_OPENAI_ENDPOINT").map_err(|_| {
            ProviderError::ConfigFailure(
                "AZURE_OPENAI_ENDPOINT environment variable is required for the Azure backend. \
                 Example: https://mycompany.openai.azure.com/"
                    .to_string(),
            )
        })?;
        let api_key = std::env::var("AZURE_OPENAI_API_KEY")
            .map_err(|_| ProviderError::ConfigFailure("AZURE_OPENAI_API_KEY environment variable is required for the Azure backend.".to_string()))?;
        let deployment = std::env::var("AZURE_OPENAI_DEPLOYMENT").unwrap_or_else(|_| "gpt-4o".to_string());
        let api_version = std::env::var("AZURE_OPENAI_API_VERSION").unwrap_or_else(|_| "2024-10-21".to_string());
        Ok(Self {
            client: http_client()?,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
            deployment,
            api_version,
        })
    }
}

#[derive(serde::Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(serde::Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(serde::Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(serde::Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(serde::Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

impl LlmProvider for AzureOpenAiBackend {
    fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String, ProviderError> {
        let url = format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint, self.deployment, self.api_version
        );
        let body = ChatCompletionRequest {
            model: &self.deployment,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            max_tokens: 1024,
        };
        let response = self
            .client
            .post(&url)
            .header("api-key", &self.api_key)
            .json(&body)
            .send()
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;
        if !response.status().is_success() {
            return Err(ProviderError::RequestFailed(format!("Azure OpenAI returned {}", response.status())));
        }
        let parsed: ChatCompletionResponse = response
            .json()
            .map_err(|e| ProviderError::RequestFailed(format!("invalid Azure OpenAI response: {e}")))?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ProviderError::RequestFailed("Azure OpenAI response had no choices".to_string()))
    }

    fn model_id(&self) -> String {
        format!("azure:{}", self.deployment)
    }
}

/// OpenAI chat completions API.
pub struct OpenAiBackend {
    client: reqwest::blocking::Client,
    api_key: String,
    model: String,
}

impl OpenAiBackend {
    pub fn new(model: Option<String>) -> Result<Self, ProviderError> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| ProviderError::ConfigFailure("OPENAI_API_KEY environment variable is required for the OpenAI backend.".to_string()))?;
        Ok(Self {
            client: http_client()?,
            api_key,
            model: model.unwrap_or_else(|| "gpt-4o".to_string()),
        })
    }
}

impl LlmProvider for OpenAiBackend {
    fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String, ProviderError> {
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            max_tokens: 1024,
        };
        let response = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;
        if !response.status().is_success() {
            return Err(ProviderError::RequestFailed(format!("OpenAI API returned {}", response.status())));
        }
        let parsed: ChatCompletionResponse = response
            .json()
            .map_err(|e| ProviderError::RequestFailed(format!("invalid OpenAI response: {e}")))?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ProviderError::RequestFailed("OpenAI response had no choices".to_string()))
    }

    fn model_id(&self) -> String {
        format!("openai:{}", self.model)
    }
}

/// Local inference via Ollama — zero network, data never leaves the machine.
pub struct OllamaBackend {
    client: reqwest::blocking::Client,
    model: String,
    base_url: String,
}

impl OllamaBackend {
    pub fn new(model: Option<String>, base_url: Option<String>) -> Result<Self, ProviderError> {
        let model = model
            .or_else(|| std::env::var("OLLAMA_MODEL").ok())
            .unwrap_or_else(|| "llama3.1".to_string());
        let base_url = base_url
            .or_else(|| std::env::var("OLLAMA_BASE_URL").ok())
            .unwrap_or_else(|| "http://localhost:11434".to_string());
        Ok(Self {
            client: reqwest::blocking::Client::builder()
                .timeout(std::time::Duration::from_secs(60))
                .build()
                .map_err(|e| ProviderError::RequestFailed(e.to_string()))?,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[derive(serde::Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
}

#[derive(serde::Deserialize)]
struct OllamaResponse {
    message: ChatChoiceMessage,
}

impl LlmProvider for OllamaBackend {
    fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String, ProviderError> {
        let url = format!("{}/api/chat", self.base_url);
        let body = OllamaRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            stream: false,
        };
        let response = self.client.post(&url).json(&body).send().map_err(|e| {
            ProviderError::RequestFailed(format!(
                "Ollama server not found at {}. Start it with: ollama serve ({e})",
                self.base_url
            ))
        })?;
        if response.status().as_u16() == 404 {
            return Err(ProviderError::RequestFailed(format!(
                "Model '{}' not found in Ollama. Download it with: ollama pull {}",
                self.model, self.model
            )));
        }
        if !response.status().is_success() {
            return Err(ProviderError::RequestFailed(format!("Ollama returned {}", response.status())));
        }
        let parsed: OllamaResponse = response
            .json()
            .map_err(|e| ProviderError::RequestFailed(format!("invalid Ollama response: {e}")))?;
        Ok(parsed.message.content)
    }

    fn model_id(&self) -> String {
        format!("ollama:{}", self.model)
    }
}

/// Build an LLM backend by name. `model` is backend-specific: the Anthropic
/// or OpenAI model id for `claude`/`openai`, ignored for `azure` (its
/// deployment name comes from `AZURE_OPENAI_DEPLOYMENT`), the Ollama model
/// tag for `ollama`.
pub fn get_backend(backend_name: &str, model: Option<String>) -> Result<Box<dyn LlmProvider>, ProviderError> {
    match backend_name {
        "claude" => Ok(Box::new(ClaudeBackend::new(model)?)),
        "azure" => Ok(Box::new(AzureOpenAiBackend::new()?)),
        "openai" => Ok(Box::new(OpenAiBackend::new(model)?)),
        "ollama" => Ok(Box::new(OllamaBackend::new(model, None)?)),
        other => Err(ProviderError::UnknownBackend {
            name: other.to_string(),
            valid: "claude, azure, openai, ollama",
        }),
    }
}
