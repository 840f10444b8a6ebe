//! # Calendar table parser
//! Heuristic row walk over the one known ForexFactory table layout. Dates
//! and times are only stamped on the first row of their group, so the
//! walk carries both forward across rows. If the table marker itself is
//! missing the parse fails fast — that means the markup changed and an
//! empty result would hide it.

use chrono::{Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

use crate::dates;
use crate::error::ScrapeError;
use crate::event::{self, EconomicEvent, Impact};

/// Which slice of the scraped page the caller wants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Today,
    #[default]
    Week,
}

static TABLE: Lazy<Selector> = Lazy::new(|| sel("table.calendar__table"));
static ROW: Lazy<Selector> = Lazy::new(|| sel("tr.calendar__row"));
static DATE: Lazy<Selector> = Lazy::new(|| sel("td.calendar__cell.calendar__date"));
static TIME: Lazy<Selector> = Lazy::new(|| sel("td.calendar__cell.calendar__time"));
static CURRENCY: Lazy<Selector> = Lazy::new(|| sel("td.calendar__cell.calendar__currency"));
static IMPACT: Lazy<Selector> = Lazy::new(|| sel("td.calendar__cell.calendar__impact"));
static EVENT: Lazy<Selector> = Lazy::new(|| sel("td.calendar__cell.calendar__event"));
static ACTUAL: Lazy<Selector> = Lazy::new(|| sel("td.calendar__cell.calendar__actual"));
static FORECAST: Lazy<Selector> = Lazy::new(|| sel("td.calendar__cell.calendar__forecast"));
static PREVIOUS: Lazy<Selector> = Lazy::new(|| sel("td.calendar__cell.calendar__previous"));
static SPAN: Lazy<Selector> = Lazy::new(|| sel("span"));

fn sel(s: &str) -> Selector {
    Selector::parse(s).expect("static selector")
}

/// Parse the calendar page into ordered events, filtered by `period`
/// against the current date.
pub fn parse_calendar(html: &str, period: Period) -> Result<Vec<EconomicEvent>, ScrapeError> {
    parse_calendar_on(html, period, Local::now().date_naive())
}

/// Deterministic core of [`parse_calendar`]; `today` only matters for
/// [`Period::Today`] filtering.
pub fn parse_calendar_on(
    html: &str,
    period: Period,
    today: NaiveDate,
) -> Result<Vec<EconomicEvent>, ScrapeError> {
    let doc = Html::parse_document(html);
    let table = doc
        .select(&TABLE)
        .next()
        .ok_or_else(|| ScrapeError::Parse("calendar table not found".to_string()))?;

    let mut events = Vec::new();
    let mut current_date: Option<String> = None;
    let mut current_time = String::new();

    for row in table.select(&ROW) {
        // The date is only stamped on the first row of a new day. A fresh
        // date invalidates any inherited time.
        if let Some(cell) = row.select(&DATE).next() {
            let text = cell_text(cell);
            if !text.is_empty() {
                let date = cell.select(&SPAN).next().map(cell_text).unwrap_or(text);
                current_date = Some(date);
                current_time.clear();
            }
        }
        let Some(date) = current_date.clone().filter(|d| !d.is_empty()) else {
            // Rows before the first dated row are not real events.
            continue;
        };

        // Consecutive events at the same time share one visible stamp.
        let time_text = row.select(&TIME).next().map(cell_text).unwrap_or_default();
        if !time_text.is_empty() {
            current_time = time_text;
        }
        if current_time.is_empty() {
            continue;
        }

        let currency = row
            .select(&CURRENCY)
            .next()
            .map(cell_text)
            .unwrap_or_default();
        let impact = parse_impact(row.select(&IMPACT).next());
        let name = row.select(&EVENT).next().map(cell_text).unwrap_or_default();
        let actual = row
            .select(&ACTUAL)
            .next()
            .map(cell_text)
            .unwrap_or_default();
        let forecast = row
            .select(&FORECAST)
            .next()
            .map(cell_text)
            .unwrap_or_default();
        let previous = row
            .select(&PREVIOUS)
            .next()
            .map(cell_text)
            .unwrap_or_default();

        if name.is_empty() || currency.is_empty() {
            continue;
        }

        let detail_url = event::detail_url(&name);
        events.push(EconomicEvent {
            date,
            time: current_time.clone(),
            currency,
            impact,
            name,
            actual,
            forecast,
            previous,
            detail_url,
        });
    }

    if period == Period::Today {
        // Exact-match on the raw token, both page renderings accepted.
        let (spaced, compact) = dates::today_tokens(today);
        events.retain(|e| e.date == spaced || e.date == compact);
    }

    tracing::debug!(target: "scrape", events = events.len(), ?period, "parsed calendar table");
    Ok(events)
}

/// Flatten an element's text nodes, collapse whitespace and trim.
fn cell_text(el: ElementRef<'_>) -> String {
    static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));
    let joined: String = el.text().collect();
    RE_WS.replace_all(&joined, " ").trim().to_string()
}

/// Map the indicator span's class list to an impact level. Total by
/// construction; anything unrecognized is `Unknown`.
fn parse_impact(cell: Option<ElementRef<'_>>) -> Impact {
    let Some(cell) = cell else {
        return Impact::Unknown;
    };
    let Some(span) = cell.select(&SPAN).next() else {
        return Impact::Unknown;
    };
    for class in span.value().classes() {
        match class {
            "icon--ff-impact-red" => return Impact::High,
            "icon--ff-impact-ora" => return Impact::Medium,
            "icon--ff-impact-yel" => return Impact::Low,
            _ => {}
        }
    }
    Impact::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_table_is_a_parse_error() {
        let err = parse_calendar("<html><body><p>maintenance</p></body></html>", Period::Week)
            .unwrap_err();
        assert!(matches!(err, ScrapeError::Parse(_)));
    }

    #[test]
    fn cell_text_collapses_whitespace() {
        let html = Html::parse_fragment("<span>  8:30\n   am </span>");
        let span = html.select(&SPAN).next().unwrap();
        assert_eq!(cell_text(span), "8:30 am");
    }
}
