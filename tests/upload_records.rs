// tests/upload_records.rs
// Shape of the rows handed to the Supabase upsert endpoint.

use chrono::NaiveDate;

use econ_calendar_sync::parser::{parse_calendar, Period};

const PAGE: &str = include_str!("fixtures/calendar_page.html");

#[test]
fn records_carry_nulls_for_unpublished_results() {
    let events = parse_calendar(PAGE, Period::Week).unwrap();

    let retail = serde_json::to_value(events[0].to_record()).unwrap();
    assert_eq!(retail["actual"], "0.7%");
    assert_eq!(retail["currency"], "USD");
    assert_eq!(retail["impact"], "High");

    // CPI row has no actual yet: explicit null, not "".
    let cpi = serde_json::to_value(events[1].to_record()).unwrap();
    assert!(cpi["actual"].is_null());
    assert_eq!(cpi["forecast"], "2.2%");
}

#[test]
fn records_resolve_the_event_date_to_iso() {
    let events = parse_calendar(PAGE, Period::Week).unwrap();
    let today = NaiveDate::from_ymd_opt(2024, 12, 9).unwrap();

    // "MonDec 9" seen in December resolves to the current year.
    assert_eq!(events[0].event_date_on(today), "2024-12-09");
    assert_eq!(events[4].event_date_on(today), "2024-12-10");

    let record = serde_json::to_value(events[0].to_record()).unwrap();
    let iso = record["event_date"].as_str().unwrap();
    assert_eq!(iso.len(), 10);
    assert_eq!(&iso[4..5], "-");
}
