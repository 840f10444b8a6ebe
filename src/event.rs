//! # Calendar event model
//! The value type produced by the parser plus the flat record shape the
//! Supabase REST endpoint expects.

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::dates;

/// A single row scraped from the calendar table. Immutable once built.
///
/// `date` is kept verbatim as rendered on the page (e.g. `"MonDec 9"`);
/// downstream consumers match on the exact string. The absolute calendar
/// date is derived on demand via [`EconomicEvent::event_date`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EconomicEvent {
    pub date: String,
    pub time: String,
    pub currency: String,
    pub impact: Impact,
    pub name: String,
    pub actual: String,
    pub forecast: String,
    pub previous: String,
    #[serde(rename = "detail_url")]
    pub detail_url: String,
}

/// Severity the page assigns to an event via its indicator icon.
/// Total: malformed or missing markup maps to `Unknown`, never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Impact {
    High,
    Medium,
    Low,
    Unknown,
}

impl Impact {
    pub fn as_str(&self) -> &'static str {
        match self {
            Impact::High => "High",
            Impact::Medium => "Medium",
            Impact::Low => "Low",
            Impact::Unknown => "Unknown",
        }
    }
}

impl EconomicEvent {
    /// In-process identity only. `date` carries no year, so this must not
    /// be used as storage identity; the upsert key is
    /// (event_date, time, name, currency).
    pub fn id(&self) -> String {
        format!(
            "{}-{}-{}-{}",
            self.date, self.time, self.currency, self.name
        )
    }

    /// Absolute ISO date resolved against the current wall clock. Never
    /// stored: two calls that straddle a year boundary can disagree.
    pub fn event_date(&self) -> String {
        self.event_date_on(Local::now().date_naive())
    }

    /// Deterministic variant of [`event_date`](Self::event_date).
    pub fn event_date_on(&self, today: NaiveDate) -> String {
        dates::resolve_event_date(&self.date, today)
    }

    /// Flat record for the upsert call. Empty `actual`/`forecast`/
    /// `previous` become explicit nulls so "not yet published" stays
    /// distinguishable from a published value downstream.
    pub fn to_record(&self) -> EventRecord<'_> {
        fn published(s: &str) -> Option<&str> {
            if s.is_empty() {
                None
            } else {
                Some(s)
            }
        }
        EventRecord {
            date: &self.date,
            time: &self.time,
            currency: &self.currency,
            impact: self.impact.as_str(),
            name: &self.name,
            actual: published(&self.actual),
            forecast: published(&self.forecast),
            previous: published(&self.previous),
            detail_url: &self.detail_url,
            event_date: self.event_date(),
        }
    }
}

/// Detail page URL derived from the event name: lowercase, spaces to
/// hyphens, `/ % ( )` stripped.
pub fn detail_url(name: &str) -> String {
    let slug: String = name
        .to_lowercase()
        .chars()
        .filter_map(|c| match c {
            ' ' => Some('-'),
            '/' | '%' | '(' | ')' => None,
            other => Some(other),
        })
        .collect();
    format!("https://www.forexfactory.com/calendar/{slug}")
}

/// Row shape posted to the Supabase REST endpoint (snake_case columns).
#[derive(Debug, Serialize)]
pub struct EventRecord<'a> {
    pub date: &'a str,
    pub time: &'a str,
    pub currency: &'a str,
    pub impact: &'a str,
    pub name: &'a str,
    pub actual: Option<&'a str>,
    pub forecast: Option<&'a str>,
    pub previous: Option<&'a str>,
    pub detail_url: &'a str,
    pub event_date: String,
}
