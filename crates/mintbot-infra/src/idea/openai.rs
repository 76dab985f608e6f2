//! OpenAI-compatible chat completion backend for idea enhancement.

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::chat::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
    ChatCompletionRequestSystemMessageContent, ChatCompletionRequestUserMessage,
    ChatCompletionRequestUserMessageContent, CreateChatCompletionRequest,
};
use secrecy::{ExposeSecret, SecretString};

use mintbot_core::ports::{IdeaEnhancer, IdeaPrompt};
use mintbot_types::config::IdeaConfig;
use mintbot_types::error::IdeaError;

const TEMPERATURE: f32 = 0.9;
const MAX_COMPLETION_TOKENS: u32 = 200;

/// Does not derive Debug: the client holds the API key.
pub struct OpenAiEnhancer {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiEnhancer {
    pub fn new(api_key: &SecretString, base_url: &str, model: &str) -> Self {
        let config = OpenAIConfig::new()
            .with_api_key(api_key.expose_secret())
            .with_api_base(base_url);

        Self {
            client: Client::with_config(config),
            model: model.to_string(),
        }
    }

    /// `None` when no API key is configured; ideas then use the template.
    pub fn from_config(config: &IdeaConfig) -> Option<Self> {
        config
            .openai_api_key
            .as_ref()
            .map(|key| Self::new(key, &config.openai_base_url, &config.model))
    }

    fn build_request(&self, prompt: &IdeaPrompt) -> CreateChatCompletionRequest {
        let messages = vec![
            ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
                content: ChatCompletionRequestSystemMessageContent::Text(prompt.system.clone()),
                name: None,
            }),
            ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
                content: ChatCompletionRequestUserMessageContent::Text(prompt.user.clone()),
                name: None,
            }),
        ];

        CreateChatCompletionRequest {
            model: self.model.clone(),
            messages,
            max_completion_tokens: Some(MAX_COMPLETION_TOKENS),
            temperature: Some(TEMPERATURE),
            ..Default::default()
        }
    }
}

impl IdeaEnhancer for OpenAiEnhancer {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &IdeaPrompt) -> Result<String, IdeaError> {
        let response = self
            .client
            .chat()
            .create(self.build_request(prompt))
            .await
            .map_err(|e| IdeaError::Unavailable(e.to_string()))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| IdeaError::Parse("empty completion".to_string()))
    }
}
