//! Reqwest-based client for the Gemini generateContent API.
//!
//! One blocking request per user turn: the seed conversation plus the prompt
//! goes up, the model's free text comes back. No streaming, no retry.

use std::io::{self, BufRead, Write};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use is_terminal::IsTerminal;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::role::{self, Speaker};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    pub role: String, // "user" or "model"
    pub parts: Vec<Part>,
}

impl Content {
    pub fn new(speaker: Speaker, text: String) -> Self {
        let role = match speaker {
            Speaker::User => "user",
            Speaker::Model => "model",
        };
        Self { role: role.to_string(), parts: vec![Part { text }] }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
}

#[derive(Debug, Clone, Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
    safety_settings: Vec<SafetySetting>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn from_config(cfg: &mut Config) -> Result<Self> {
        let timeout = cfg
            .get("REQUEST_TIMEOUT")
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(60);
        let api_base_url = cfg.get("API_BASE_URL").unwrap_or_else(|| "default".into());
        let base_url = if api_base_url == "default" {
            "https://generativelanguage.googleapis.com/v1beta".to_string()
        } else {
            api_base_url.trim_end_matches('/').to_string()
        };
        let model = cfg.get("DEFAULT_MODEL").unwrap_or_else(|| "gemini-pro".into());
        let api_key = resolve_api_key(cfg)?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout))
            .build()?;

        Ok(Self { http, base_url, model, api_key })
    }

    /// Send one prompt, seeded with the standing instructions and worked
    /// examples, and return the model's free text.
    pub async fn generate(&self, cfg: &Config, prompt: &str) -> Result<String> {
        let mut contents: Vec<Content> = role::seed_history(cfg)
            .into_iter()
            .map(|(speaker, text)| Content::new(speaker, text))
            .collect();
        contents.push(Content::new(Speaker::User, prompt.to_string()));

        let body = GenerateRequest {
            contents,
            generation_config: GenerationConfig {
                temperature: 0.9,
                top_p: 1.0,
                top_k: 1,
                max_output_tokens: 2048,
            },
            safety_settings: safety_settings(),
        };

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let resp = self
            .http
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .context("failed to send generate request")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let detail = resp.text().await.unwrap_or_default();
            bail!("model request failed: {} {}", status, detail);
        }

        let parsed: GenerateResponse = resp
            .json()
            .await
            .context("failed to decode generate response")?;

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .ok_or_else(|| anyhow!("model returned no candidates"))?;
        Ok(text)
    }
}

fn safety_settings() -> Vec<SafetySetting> {
    const CATEGORIES: &[&str] = &[
        "HARM_CATEGORY_HARASSMENT",
        "HARM_CATEGORY_HATE_SPEECH",
        "HARM_CATEGORY_SEXUALLY_EXPLICIT",
        "HARM_CATEGORY_DANGEROUS_CONTENT",
    ];
    CATEGORIES
        .iter()
        .map(|c| SafetySetting { category: c, threshold: "BLOCK_MEDIUM_AND_ABOVE" })
        .collect()
}

/// Config value first (the load overlay already gives the environment
/// precedence); on a terminal, prompt until a non-empty key is entered and
/// persist it to the rc file.
fn resolve_api_key(cfg: &mut Config) -> Result<String> {
    if let Some(key) = cfg.get("GOOGLE_API_KEY") {
        if !key.trim().is_empty() {
            return Ok(key);
        }
    }

    if !io::stdin().is_terminal() {
        bail!("GOOGLE_API_KEY not found; set it in the environment or in {}", cfg.config_path.display());
    }

    loop {
        println!("GOOGLE_API_KEY not found. ");
        print!("Enter API Key: ");
        io::stdout().flush().ok();
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        let key = line.trim().to_string();
        if key.is_empty() {
            continue;
        }
        cfg.set("GOOGLE_API_KEY", &key)?;
        return Ok(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_uses_wire_casing() {
        let body = GenerateRequest {
            contents: vec![Content::new(Speaker::User, "hi".into())],
            generation_config: GenerationConfig {
                temperature: 0.9,
                top_p: 1.0,
                top_k: 1,
                max_output_tokens: 2048,
            },
            safety_settings: safety_settings(),
        };
        let v = serde_json::to_value(&body).unwrap();
        assert!(v.get("generationConfig").is_some());
        assert_eq!(v["generationConfig"]["maxOutputTokens"], 2048);
        assert_eq!(v["contents"][0]["role"], "user");
        assert_eq!(v["safetySettings"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn response_text_concatenates_parts() {
        let raw = r#"{"candidates":[{"content":{"parts":[{"text":"a"},{"text":"b"}]}}]}"#;
        let parsed: GenerateResponse = serde_json::from_str(raw).unwrap();
        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap();
        assert_eq!(text, "ab");
    }
}
