// src/services/approval.rs

//! Human approval gate.

use std::io::{BufRead, BufReader, Stdin, Stdout, Write};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::{AppError, Result};
use crate::models::Candidate;
use crate::services::Approver;
use crate::utils::date::format_date;

/// Reviewer decision on a verified candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Commit the candidate
    Approve,
    /// Drop the candidate
    Reject,
    /// Drop the candidate and generate another one for the same date
    RequestNew,
}

/// Approves everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoApprove;

#[async_trait]
impl Approver for AutoApprove {
    async fn approve(&self, _: &Candidate, _: NaiveDate, _: bool) -> Result<Decision> {
        Ok(Decision::Approve)
    }
}

struct ReviewIo<R, W> {
    reader: R,
    writer: W,
}

/// Interactive reviewer on a terminal.
///
/// Answers: `y` approve, `n` reject, `r` request a new word (only offered
/// when the pipeline allows it). Anything else repeats the question; end of
/// input rejects.
pub struct ConsoleApprover<R, W> {
    io: Mutex<ReviewIo<R, W>>,
}

impl ConsoleApprover<BufReader<Stdin>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(BufReader::new(std::io::stdin()), std::io::stdout())
    }
}

impl<R, W> ConsoleApprover<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            io: Mutex::new(ReviewIo { reader, writer }),
        }
    }
}

impl<R: BufRead, W: Write> ReviewIo<R, W> {
    fn review(
        &mut self,
        candidate: &Candidate,
        date: NaiveDate,
        allow_new: bool,
    ) -> std::io::Result<Decision> {
        writeln!(self.writer, "\n  Date:        {}", format_date(date))?;
        writeln!(self.writer, "  Word:        {}", candidate.word)?;
        writeln!(self.writer, "  Explanation: {}", candidate.explanation)?;
        writeln!(self.writer, "  Example:     {}", candidate.example)?;

        let question = if allow_new {
            "  Add this word? (y/n/r): "
        } else {
            "  Add this word? (y/n): "
        };

        loop {
            write!(self.writer, "{question}")?;
            self.writer.flush()?;

            let mut line = String::new();
            if self.reader.read_line(&mut line)? == 0 {
                return Ok(Decision::Reject);
            }
            match line.trim().to_lowercase().as_str() {
                "y" | "yes" => return Ok(Decision::Approve),
                "n" | "no" => return Ok(Decision::Reject),
                "r" if allow_new => return Ok(Decision::RequestNew),
                _ => continue,
            }
        }
    }
}

#[async_trait]
impl<R, W> Approver for ConsoleApprover<R, W>
where
    R: BufRead + Send,
    W: Write + Send,
{
    async fn approve(
        &self,
        candidate: &Candidate,
        date: NaiveDate,
        allow_new: bool,
    ) -> Result<Decision> {
        tokio::task::block_in_place(|| {
            let mut io = self
                .io
                .lock()
                .map_err(|_| AppError::Io(std::io::Error::other("review prompt is unavailable")))?;
            Ok(io.review(candidate, date, allow_new)?)
        })
    }
}
