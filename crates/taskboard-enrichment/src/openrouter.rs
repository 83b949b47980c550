//! Chat-completions classifier (OpenRouter-compatible).
//!
//! The model is asked for a strict JSON object; the object arrives as a string
//! in `choices[0].message.content` and is parsed a second time. Any transport
//! error, non-success status or shape mismatch is a classification failure.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use taskboard_core::{ClassifierConfig, TaskboardError, TaskboardResult};
use taskboard_domain::{Analysis, CardDigest, CardId, GroupSuggestion, Priority};

use crate::classifier::Classifier;

const ANALYZE_INSTRUCTION: &str = "You are a task analysis assistant. Analyze the task and respond with JSON in the format {\"priority\": \"Low|Medium|High\", \"group\": \"<1-2 word category>\"} where 'group' is a short 1-2 word category that best describes the task type/domain.";

const GROUPING_INSTRUCTION: &str = "You are a task organization assistant. Analyze the list of tasks and suggest logical groupings. Return your response as JSON in the format {\"groups\": [{\"name\": \"<1-2 word group name>\", \"taskIds\": [id1, id2, ...]}]}. Each group name should be 1-2 words maximum. Only group tasks that are clearly related.";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage; 2],
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnalysisPayload {
    priority: String,
    group: String,
}

#[derive(Debug, Deserialize)]
struct GroupsPayload {
    groups: Vec<GroupPayload>,
}

#[derive(Debug, Deserialize)]
struct GroupPayload {
    name: String,
    #[serde(rename = "taskIds")]
    task_ids: Vec<i64>,
}

pub struct OpenRouterClassifier {
    http_client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
    site_url: String,
    site_name: String,
}

impl OpenRouterClassifier {
    /// Builds a classifier from configuration. Fails when no API key is set.
    pub fn from_config(config: &ClassifierConfig) -> TaskboardResult<Self> {
        let api_key = config
            .effective_api_key()
            .ok_or_else(|| TaskboardError::Config("classifier API key is not set".to_string()))?
            .to_string();

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| TaskboardError::Config(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key,
            site_url: config.site_url.clone(),
            site_name: config.site_name.clone(),
        })
    }

    async fn complete<T: DeserializeOwned>(
        &self,
        instruction: &str,
        prompt: String,
    ) -> TaskboardResult<T> {
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: instruction.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        tracing::debug!(model = %self.model, "Calling classifier");

        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", &self.site_url)
            .header("X-Title", &self.site_name)
            .json(&request)
            .send()
            .await
            .map_err(|e| TaskboardError::Classification(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TaskboardError::Classification(format!(
                "HTTP {}: {}",
                status.as_u16(),
                body
            )));
        }

        let envelope: ChatResponse = response
            .json()
            .await
            .map_err(|e| TaskboardError::Classification(format!("bad response envelope: {}", e)))?;

        let content = envelope
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| TaskboardError::Classification("response has no choices".to_string()))?;

        parse_content(&content)
    }
}

fn parse_content<T: DeserializeOwned>(content: &str) -> TaskboardResult<T> {
    serde_json::from_str(content)
        .map_err(|e| TaskboardError::Classification(format!("bad response content: {}", e)))
}

/// Unknown priority names map to `Medium`.
fn normalize_analysis(payload: AnalysisPayload) -> Analysis {
    let priority = payload.priority.parse().unwrap_or(Priority::Medium);
    Analysis::new(priority, Some(payload.group.as_str()))
}

fn normalize_groups(payload: GroupsPayload) -> Vec<GroupSuggestion> {
    payload
        .groups
        .into_iter()
        .filter(|g| !g.task_ids.is_empty())
        .map(|g| GroupSuggestion {
            name: g.name,
            card_ids: g.task_ids.into_iter().map(CardId).collect(),
        })
        .collect()
}

fn analyze_prompt(title: &str, description: Option<&str>) -> String {
    let mut content = title.to_string();
    if let Some(description) = description.filter(|d| !d.is_empty()) {
        content.push_str(&format!("\nDescription: {}", description));
    }
    format!(
        "Analyze this task and determine its priority and group: '{}'",
        content
    )
}

fn grouping_prompt(cards: &[CardDigest]) -> String {
    let lines: Vec<String> = cards
        .iter()
        .map(|card| match card.description.as_deref().filter(|d| !d.is_empty()) {
            Some(description) => format!(
                "ID:{} | Title: {} | Description: {}",
                card.id, card.title, description
            ),
            None => format!("ID:{} | Title: {}", card.id, card.title),
        })
        .collect();
    format!(
        "Analyze these tasks and suggest logical groupings:\n{}",
        lines.join("\n")
    )
}

#[async_trait]
impl Classifier for OpenRouterClassifier {
    async fn analyze(&self, title: &str, description: Option<&str>) -> TaskboardResult<Analysis> {
        let payload: AnalysisPayload = self
            .complete(ANALYZE_INSTRUCTION, analyze_prompt(title, description))
            .await?;
        Ok(normalize_analysis(payload))
    }

    async fn suggest_groups(&self, cards: &[CardDigest]) -> TaskboardResult<Vec<GroupSuggestion>> {
        let payload: GroupsPayload = self
            .complete(GROUPING_INSTRUCTION, grouping_prompt(cards))
            .await?;
        Ok(normalize_groups(payload))
    }
}
