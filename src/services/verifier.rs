// src/services/verifier.rs

//! Independent judgement of generated candidates.

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::{Candidate, GeneratorConfig, Verdict};
use crate::services::Verifier;
use crate::services::openai::ChatClient;

/// Verifies candidates with a separate, differently prompted model call.
pub struct OpenAiVerifier {
    chat: ChatClient,
    language: String,
}

impl OpenAiVerifier {
    pub fn new(config: &GeneratorConfig) -> Result<Self> {
        Ok(Self::with_client(ChatClient::new(config)?, &config.language))
    }

    pub fn with_client(chat: ChatClient, language: &str) -> Self {
        Self {
            chat,
            language: language.to_string(),
        }
    }

    fn system_prompt(&self) -> String {
        let language = &self.language;
        format!(
            "You are a strict linguist who checks {language} words for correctness.\n\n\
             You receive a word, an explanation and an example sentence. Check:\n\
             1. Is this a real word that is used in {language}?\n\
             2. Is the explanation accurate?\n\
             3. Is the example sentence grammatically correct, and is the word used properly?\n\n\
             Answer in JSON format: {{ \"valid\": true/false, \"reason\": \"...\" }}"
        )
    }
}

#[async_trait]
impl Verifier for OpenAiVerifier {
    async fn verify(&self, candidate: &Candidate) -> Result<Verdict> {
        let user = serde_json::to_string(candidate)?;
        self.chat
            .complete_json(&self.system_prompt(), &user)
            .await
            .map_err(AppError::verification)
    }
}

/// Verifier for the manual path: the operator typed the entry, so it is
/// accepted as is.
#[derive(Debug, Default, Clone, Copy)]
pub struct TrustOperator;

#[async_trait]
impl Verifier for TrustOperator {
    async fn verify(&self, _candidate: &Candidate) -> Result<Verdict> {
        Ok(Verdict::accept("entered by operator"))
    }
}
