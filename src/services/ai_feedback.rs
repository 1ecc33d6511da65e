use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::{json, Value};

use crate::core::config::Settings;
use crate::schemas::rubric::MAX_TOTAL_SCORE;

pub const EMPTY_REPLY_FALLBACK: &str = "Great job!";
pub const FAILURE_FALLBACK: &str = "Your work is wonderful. Keep it up!";

/// Praise text from the generative-text API. Cosmetic only: every failure
/// turns into a fixed encouraging sentence.
#[derive(Debug, Clone)]
pub struct AiFeedbackService {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl AiFeedbackService {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let timeout = Duration::from_secs(settings.ai().request_timeout);
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(timeout)
            .build()
            .context("Failed to build AI HTTP client")?;

        Ok(Self {
            client,
            api_key: settings.ai().api_key.clone(),
            base_url: settings.ai().base_url.trim_end_matches('/').to_string(),
            model: settings.ai().model.clone(),
        })
    }

    pub async fn generate(&self, student_name: &str, total_score: i32) -> String {
        if self.api_key.is_empty() {
            tracing::debug!("AI key not configured; using fallback comment");
            return FAILURE_FALLBACK.to_string();
        }

        match self.request(&compose_prompt(student_name, total_score)).await {
            Ok(Some(text)) => text,
            Ok(None) => EMPTY_REPLY_FALLBACK.to_string(),
            Err(err) => {
                tracing::warn!(error = %err, "AI comment generation failed; using fallback");
                FAILURE_FALLBACK.to_string()
            }
        }
    }

    async fn request(&self, prompt: &str) -> Result<Option<String>> {
        let timer = Instant::now();
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let payload = json!({
            "contents": [
                {"parts": [{"text": prompt}]}
            ]
        });

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send()
            .await
            .context("Failed to call generative-text API")?;

        let status = response.status();
        let body: Value = response.json().await.context("Failed to read generative-text reply")?;
        if !status.is_success() {
            anyhow::bail!("generative-text API error (status {status}): {body}");
        }

        tracing::info!(
            model = %self.model,
            duration_seconds = timer.elapsed().as_secs_f64(),
            "AI comment generated"
        );

        Ok(extract_text(&body))
    }
}

pub(crate) fn compose_prompt(student_name: &str, total_score: i32) -> String {
    format!(
        "You are a very kind primary-school teacher writing praise and advice for a student named \"{student_name}\", \
who scored {total_score}/{MAX_TOTAL_SCORE} in the school sports day activity. \
Write 2-3 short sentences that make the student feel encouraged and proud of themselves."
    )
}

fn extract_text(body: &Value) -> Option<String> {
    let parts = body
        .get("candidates")
        .and_then(|candidates| candidates.get(0))
        .and_then(|candidate| candidate.get("content"))
        .and_then(|content| content.get("parts"))
        .and_then(Value::as_array)?;

    let text = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect::<Vec<_>>()
        .join("");
    let text = text.trim();

    (!text.is_empty()).then(|| text.to_string())
}
