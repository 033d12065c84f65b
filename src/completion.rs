use std::time::Duration;

use anyhow::{anyhow, Result};
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use tracing::{debug, warn};

use crate::AppConfig;

const MAX_ATTEMPTS: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_secs(2);

/// Client for the external chat-completion service. The service is an opaque
/// collaborator reachable over the OpenAI chat-completions contract; transient
/// failures are retried a bounded number of times with a fixed backoff, and
/// every attempt runs under a timeout.
#[derive(Clone)]
pub struct CompletionClient {
    client: Client<OpenAIConfig>,
    model: String,
    timeout: Duration,
}

impl CompletionClient {
    pub fn new(config: &AppConfig) -> Self {
        let oai_config = OpenAIConfig::new()
            .with_api_base(&config.completion_api_base)
            .with_api_key(&config.completion_api_key);

        CompletionClient {
            client: Client::with_config(oai_config),
            model: config.completion_model.clone(),
            timeout: config.completion_timeout,
        }
    }

    pub async fn complete(
        &self,
        messages: Vec<ChatCompletionRequestMessage>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(temperature)
            .max_tokens(max_tokens)
            .build()?;

        let mut last_error = anyhow!("completion request was never attempted");
        for attempt in 1..=MAX_ATTEMPTS {
            debug!("Calling completion service (attempt {attempt}/{MAX_ATTEMPTS})");
            match tokio::time::timeout(self.timeout, self.client.chat().create(request.clone()))
                .await
            {
                Ok(Ok(response)) => {
                    let content = response
                        .choices
                        .first()
                        .and_then(|choice| choice.message.content.clone())
                        .ok_or_else(|| anyhow!("completion response contained no content"))?;
                    return Ok(content.trim().to_string());
                }
                Ok(Err(e)) => {
                    warn!("Completion attempt {attempt}/{MAX_ATTEMPTS} failed: {e}");
                    last_error = anyhow!(e);
                }
                Err(_) => {
                    warn!(
                        "Completion attempt {attempt}/{MAX_ATTEMPTS} timed out after {:?}",
                        self.timeout
                    );
                    last_error = anyhow!("completion request timed out after {:?}", self.timeout);
                }
            }
            if attempt < MAX_ATTEMPTS {
                tokio::time::sleep(RETRY_DELAY).await;
            }
        }
        Err(last_error)
    }
}

pub fn system_message(text: &str) -> Result<ChatCompletionRequestMessage> {
    Ok(ChatCompletionRequestSystemMessageArgs::default()
        .content(text)
        .build()?
        .into())
}

pub fn user_message(text: &str) -> Result<ChatCompletionRequestMessage> {
    Ok(ChatCompletionRequestUserMessageArgs::default()
        .content(text)
        .build()?
        .into())
}
