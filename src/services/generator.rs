// src/services/generator.rs

//! Candidate sources: the AI generator and the manual console prompt.

use std::io::{BufRead, BufReader, Stdin, Stdout, Write};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::{Candidate, GeneratorConfig, normalize_word};
use crate::services::Generator;
use crate::services::openai::{ChatClient, parse_json_reply};

/// Generates candidates with a chat completion model.
pub struct OpenAiGenerator {
    chat: ChatClient,
    language: String,
}

#[derive(Debug, Deserialize)]
struct BatchReply {
    words: Vec<Candidate>,
}

impl OpenAiGenerator {
    pub fn new(config: &GeneratorConfig) -> Result<Self> {
        Ok(Self::with_client(ChatClient::new(config)?, &config.language))
    }

    pub fn with_client(chat: ChatClient, language: &str) -> Self {
        Self {
            chat,
            language: language.to_string(),
        }
    }

    fn system_prompt(&self, existing_words: &[String], count: usize) -> String {
        let language = &self.language;
        let ask = if count == 1 {
            format!("one interesting, lesser-known but usable {language} word")
        } else {
            format!("{count} different interesting, lesser-known but usable {language} words")
        };
        let shape = if count == 1 {
            r#"{ "word": "...", "explanation": "...", "example": "..." }"#.to_string()
        } else {
            format!(
                r#"{{ "words": [ {{ "word": "...", "explanation": "...", "example": "..." }} ] }} with exactly {count} entries"#
            )
        };

        format!(
            "You are an expert in the {language} language. Generate {ask}, each with an \
             explanation and an example sentence. Every word must really exist, sound \
             beautiful, and enrich someone's vocabulary.\n\n\
             Avoid these words, they are already in the list: {blocklist}\n\n\
             Answer in JSON format: {shape}\n\
             - \"explanation\": a clear explanation of the word, written in {language}\n\
             - \"example\": an example sentence in {language} that uses the word correctly",
            blocklist = existing_words.join(", "),
        )
    }
}

#[async_trait]
impl Generator for OpenAiGenerator {
    async fn generate(&self, existing_words: &[String], count: usize) -> Result<Vec<Candidate>> {
        let count = count.max(1);
        let system = self.system_prompt(existing_words, count);
        let user = if count == 1 {
            format!("Generate a beautiful {} word.", self.language)
        } else {
            format!("Generate {count} beautiful {} words.", self.language)
        };

        let content = self
            .chat
            .complete_text(&system, &user)
            .await
            .map_err(AppError::generation)?;
        parse_candidates(&content, count)
    }
}

/// Decode a generator reply: one candidate object when `count` is 1,
/// otherwise `{"words": [...]}` truncated to `count`.
///
/// A reply missing any expected field is a generation error.
pub fn parse_candidates(content: &str, count: usize) -> Result<Vec<Candidate>> {
    if count <= 1 {
        let candidate: Candidate = parse_json_reply(content).map_err(AppError::generation)?;
        return Ok(vec![candidate]);
    }

    let reply: BatchReply = parse_json_reply(content).map_err(AppError::generation)?;
    let mut candidates = reply.words;
    if candidates.len() > count {
        log::debug!(
            "Generator returned {} candidates, keeping {}",
            candidates.len(),
            count
        );
        candidates.truncate(count);
    }
    Ok(candidates)
}

struct PromptIo<R, W> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> PromptIo<R, W> {
    /// Ask one question; end of input reads as an empty answer.
    fn ask(&mut self, question: &str) -> std::io::Result<String> {
        write!(self.writer, "{question}")?;
        self.writer.flush()?;
        let mut line = String::new();
        self.reader.read_line(&mut line)?;
        Ok(line.trim().to_string())
    }
}

/// Manual candidate source: asks an operator for each field.
pub struct ConsolePrompt<R, W> {
    io: Mutex<PromptIo<R, W>>,
}

impl ConsolePrompt<BufReader<Stdin>, Stdout> {
    /// Prompt on the process's stdin/stdout.
    pub fn stdio() -> Self {
        Self::new(BufReader::new(std::io::stdin()), std::io::stdout())
    }
}

impl<R, W> ConsolePrompt<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            io: Mutex::new(PromptIo { reader, writer }),
        }
    }
}

impl<R: BufRead, W: Write> PromptIo<R, W> {
    fn read_candidate(&mut self, existing_words: &[String]) -> std::io::Result<Option<Candidate>> {
        let word = self.ask("  Word: ")?;
        if word.is_empty() {
            return Ok(None);
        }

        // Left for the pipeline to reject without asking for the rest.
        let key = normalize_word(&word);
        if existing_words.iter().any(|w| normalize_word(w) == key) {
            writeln!(self.writer, "  \"{word}\" is already in the store.")?;
            return Ok(Some(Candidate::new(word, "", "")));
        }

        let explanation = self.ask("  Explanation: ")?;
        let example = self.ask("  Example: ")?;
        Ok(Some(Candidate::new(word, explanation, example)))
    }
}

#[async_trait]
impl<R, W> Generator for ConsolePrompt<R, W>
where
    R: BufRead + Send,
    W: Write + Send,
{
    /// Returns no candidate when the operator leaves the word empty.
    async fn generate(&self, existing_words: &[String], _count: usize) -> Result<Vec<Candidate>> {
        tokio::task::block_in_place(|| {
            let mut io = self
                .io
                .lock()
                .map_err(|_| AppError::generation("console prompt is unavailable"))?;
            Ok(io.read_candidate(existing_words)?.into_iter().collect())
        })
    }
}
