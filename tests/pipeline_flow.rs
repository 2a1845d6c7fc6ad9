//! End-to-end runs of the generation pipeline against a store on disk.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;
use tempfile::TempDir;

use wordfeed::error::{AppError, Result};
use wordfeed::models::{Candidate, PipelineConfig, Verdict};
use wordfeed::pipeline::{DateOutcome, GenerationMode, GenerationPipeline, RunRequest};
use wordfeed::services::{Generator, Verifier, WordLookup};
use wordfeed::storage::{LocalStorage, WordStorage};
use wordfeed::utils::date::parse_date;

fn d(s: &str) -> NaiveDate {
    parse_date(s).unwrap()
}

struct ScriptedGenerator(Mutex<VecDeque<Result<Vec<Candidate>>>>);

impl ScriptedGenerator {
    fn new(replies: Vec<Result<Vec<Candidate>>>) -> Self {
        Self(Mutex::new(replies.into()))
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(&self, _existing: &[String], _count: usize) -> Result<Vec<Candidate>> {
        self.0
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AppError::generation("script exhausted")))
    }
}

struct CountingVerifier(Mutex<usize>);

#[async_trait]
impl Verifier for CountingVerifier {
    async fn verify(&self, _candidate: &Candidate) -> Result<Verdict> {
        *self.0.lock().unwrap() += 1;
        Ok(Verdict::accept("ok"))
    }
}

fn word(w: &str) -> Result<Vec<Candidate>> {
    Ok(vec![Candidate::new(
        w,
        format!("betekenis van {w}"),
        format!("Een zin met {w}."),
    )])
}

const SEED: &str = r#"[
  {
    "date": "2024-01-01",
    "word": "elan",
    "explanation": "geestdrift",
    "example": "Hij begon met veel elan."
  }
]
"#;

#[tokio::test]
async fn test_duplicate_is_retried_and_fresh_word_persisted() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("words.json");
    std::fs::write(&path, SEED).unwrap();
    let storage = LocalStorage::new(&path);

    let generator = ScriptedGenerator::new(vec![word("elan"), word("vigeur")]);
    let verifier = CountingVerifier(Mutex::new(0));

    let report = GenerationPipeline::new(PipelineConfig::default(), &storage, &generator, &verifier)
        .run(RunRequest {
            days: 1,
            mode: GenerationMode::Single,
            today: d("2024-01-01"),
        })
        .await
        .unwrap();

    assert_eq!(*verifier.0.lock().unwrap(), 1);
    assert_eq!(report.duplicates, 1);
    assert_eq!(report.committed()[0].date, d("2024-01-02"));

    let json = std::fs::read_to_string(&path).unwrap();
    assert!(json.ends_with("}\n]\n"));
    let elan = json.find("\"elan\"").unwrap();
    let vigeur = json.find("\"vigeur\"").unwrap();
    assert!(elan < vigeur);

    let records = LocalStorage::new(&path).load().await.unwrap();
    assert_eq!(records.len(), 2);

    let lookup = WordLookup::new(&records, d("2024-01-02"));
    assert_eq!(lookup.today_word().unwrap().word, "vigeur");
    assert_eq!(lookup.previous_date(d("2024-01-02")), Some(d("2024-01-01")));

    let yesterday = WordLookup::new(&records, d("2024-01-01"));
    assert!(yesterday.word_for_date(d("2024-01-02")).is_none());
}

#[tokio::test]
async fn test_commits_survive_a_later_fatal_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data").join("words.json");
    let storage = LocalStorage::new(&path);

    let generator = ScriptedGenerator::new(vec![
        word("een"),
        word("twee"),
        Err(AppError::Io(std::io::Error::other("operator terminal closed"))),
    ]);
    let verifier = CountingVerifier(Mutex::new(0));

    let result = GenerationPipeline::new(PipelineConfig::default(), &storage, &generator, &verifier)
        .run(RunRequest {
            days: 5,
            mode: GenerationMode::Single,
            today: d("2024-06-10"),
        })
        .await;
    assert!(matches!(result, Err(AppError::Io(_))));

    let records = storage.load().await.unwrap();
    let words: Vec<_> = records.entries().iter().map(|e| e.word.as_str()).collect();
    assert_eq!(words, vec!["een", "twee"]);
    assert_eq!(records.first_date(), Some(d("2024-06-10")));
    assert_eq!(records.last_date(), Some(d("2024-06-11")));
    assert!(!path.with_extension("json.tmp").exists());
}

#[tokio::test]
async fn test_next_run_continues_after_last_date() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("words.json");
    std::fs::write(&path, SEED).unwrap();
    let storage = LocalStorage::new(&path);
    let verifier = CountingVerifier(Mutex::new(0));

    // today is long after the last entry; the sequence still continues from it
    let generator = ScriptedGenerator::new(vec![word("vigeur"), word("zwier")]);
    let report = GenerationPipeline::new(PipelineConfig::default(), &storage, &generator, &verifier)
        .run(RunRequest {
            days: 2,
            mode: GenerationMode::Single,
            today: d("2024-03-01"),
        })
        .await
        .unwrap();

    let dates: Vec<_> = report.outcomes.iter().map(DateOutcome::date).collect();
    assert_eq!(dates, vec![d("2024-01-02"), d("2024-01-03")]);
}

#[tokio::test]
async fn test_corrupt_store_is_fatal_and_untouched() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("words.json");
    std::fs::write(&path, "[{\"date\": \"2024-1-1\"}]").unwrap();
    let storage = LocalStorage::new(&path);

    let generator = ScriptedGenerator::new(vec![word("vigeur")]);
    let verifier = CountingVerifier(Mutex::new(0));
    let result = GenerationPipeline::new(PipelineConfig::default(), &storage, &generator, &verifier)
        .run(RunRequest {
            days: 1,
            mode: GenerationMode::Single,
            today: d("2024-01-01"),
        })
        .await;

    assert!(matches!(result, Err(AppError::CorruptStore { .. })));
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "[{\"date\": \"2024-1-1\"}]"
    );
}
