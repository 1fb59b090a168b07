//! LLM agent module for structured summarization.
//!
//! Uses rstructor for the Gemini client. The reply is validated by
//! [`SummaryDocument::from_json_str`], never trusted as-is.

use crate::config::Config;
use crate::document::{strip_code_fence, DocumentError, SummaryDocument, SummaryPayload};
use rstructor::{GeminiClient, GeminiModel, LLMClient};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("LLM request failed: {0}")]
    RequestFailed(String),
    #[error("failed to parse response: {0}")]
    ParseError(#[from] DocumentError),
    #[error("LLM returned an empty response")]
    EmptyResponse,
    #[error("configuration error: {0}")]
    ConfigError(#[from] crate::config::ConfigError),
}

/// Run the summarization agent on the provided text
pub async fn summarize(text: &str, config: &Config) -> Result<SummaryDocument, AgentError> {
    let prompt = document_prompt(text, config);
    let reply = complete(&prompt, config).await?;
    let document = SummaryDocument::from_json_str(&reply)?;

    tracing::info!(
        title = document.title(),
        sections = document.sections().len(),
        keywords = document.keywords().len(),
        "summarised text"
    );
    Ok(document)
}

/// One-line summary of a single item, such as a video transcript
pub async fn summarize_item(text: &str, config: &Config) -> Result<String, AgentError> {
    let prompt = format!(
        r#"{}

Summarise the core content of the following material in one or two plain sentences.
Do not use markdown, lists or quotes.

---

{}"#,
        config.agent.persona, text
    );

    let reply = complete(&prompt, config).await?;
    let line = strip_code_fence(&reply)
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    if line.is_empty() {
        return Err(AgentError::EmptyResponse);
    }
    Ok(line)
}

/// Build the prompt including persona, schema, and text
fn document_prompt(text: &str, config: &Config) -> String {
    let schema = serde_json::to_string_pretty(&schemars::schema_for!(SummaryPayload))
        .unwrap_or_default();

    format!(
        r###"{}

{}

You MUST respond with valid JSON matching this schema:
{}

Rules:
- "keywords" lists the most important terms, most important first.
- Every "summary" item is a markdown block that starts with a top-level header line ("# " followed by a heading).
- Use "##" or deeper for headers inside a summary item, never "# ".
- "insights" is markdown with anything worth special attention.

Do not include any markdown formatting, code blocks, or explanations around the JSON. Only output the raw JSON object.

---

{}"###,
        config.agent.persona, config.agent.prompt, schema, text
    )
}

async fn complete(prompt: &str, config: &Config) -> Result<String, AgentError> {
    let api_key = config.api_key()?;

    // Parse the model from config
    let model = parse_gemini_model(&config.agent.model);

    // Build the client
    let client = GeminiClient::new(api_key)
        .map_err(|e| AgentError::RequestFailed(e.to_string()))?
        .model(model);

    tracing::debug!(model = %config.agent.model, prompt_chars = prompt.len(), "sending prompt");

    let result = client
        .generate_with_metadata(prompt)
        .await
        .map_err(|e| AgentError::RequestFailed(e.to_string()))?;

    tracing::trace!(response = %result.text, "raw LLM response");
    Ok(result.text)
}

/// Parse a model string into a GeminiModel
fn parse_gemini_model(model: &str) -> GeminiModel {
    match model {
        "gemini-2.0-flash" => GeminiModel::Gemini20Flash,
        "gemini-2.5-flash" => GeminiModel::Gemini25Flash,
        "gemini-2.5-pro" => GeminiModel::Gemini25Pro,
        other => {
            tracing::warn!(model = other, "unknown model, using gemini-2.0-flash");
            GeminiModel::Gemini20Flash
        }
    }
}
