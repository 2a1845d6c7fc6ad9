// src/services/lookup.rs

//! Read-only date queries over the word store.
//!
//! Word and forward queries hide entries dated after `today`: a word
//! becomes visible on its own date and never earlier. `previous_date`
//! walks back over every stored date.

use chrono::NaiveDate;

use crate::models::Entry;
use crate::storage::RecordSet;

/// Date-indexed view of a record set as of a given day.
#[derive(Debug, Clone, Copy)]
pub struct WordLookup<'a> {
    records: &'a RecordSet,
    today: NaiveDate,
}

impl<'a> WordLookup<'a> {
    pub fn new(records: &'a RecordSet, today: NaiveDate) -> Self {
        Self { records, today }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Entries dated on or before today, ascending.
    fn visible(&self) -> &'a [Entry] {
        let entries = self.records.entries();
        let end = entries.partition_point(|e| e.date <= self.today);
        &entries[..end]
    }

    /// Word for an exact date; `None` if absent or still in the future.
    pub fn word_for_date(&self, date: NaiveDate) -> Option<&'a Entry> {
        if self.is_future(date) {
            return None;
        }
        self.records.get(date)
    }

    /// Today's word, if one exists.
    pub fn today_word(&self) -> Option<&'a Entry> {
        self.word_for_date(self.today)
    }

    /// Up to `n` most recent visible entries, newest first.
    pub fn recent_words(&self, n: usize) -> Vec<&'a Entry> {
        self.visible().iter().rev().take(n).collect()
    }

    /// Latest stored date strictly before `date`.
    pub fn previous_date(&self, date: NaiveDate) -> Option<NaiveDate> {
        let entries = self.records.entries();
        let end = entries.partition_point(|e| e.date < date);
        entries[..end].last().map(|e| e.date)
    }

    /// Earliest visible date strictly after `date`.
    pub fn next_date(&self, date: NaiveDate) -> Option<NaiveDate> {
        let visible = self.visible();
        let start = visible.partition_point(|e| e.date <= date);
        visible.get(start).map(|e| e.date)
    }

    pub fn is_future(&self, date: NaiveDate) -> bool {
        date > self.today
    }

    pub fn is_today(&self, date: NaiveDate) -> bool {
        date == self.today
    }
}
