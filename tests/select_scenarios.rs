use recsift::{Clock, FixedClock, Query, QueryError, Record, SelectConfig, Value, select, select_par};
use std::sync::{Arc, Mutex};
use time::OffsetDateTime;
use time::macros::datetime;

fn john() -> Record {
    [
        ("first", Value::from("John")),
        ("last", Value::from("Cleese")),
        ("age", Value::from(83.0)),
        ("birthday", Value::Date(datetime!(1939-10-27 0:00 UTC))),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

fn graham() -> Record {
    [
        ("first", Value::from("Graham")),
        ("last", Value::from("Chapman")),
        ("age", Value::from(48.0)),
        ("birthday", Value::Date(datetime!(1941-01-08 0:00 UTC))),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

fn people() -> Vec<Record> {
    vec![john(), graham()]
}

fn config() -> SelectConfig {
    SelectConfig::default()
        .with_prefer_regex(true)
        .with_date_key("birthday")
}

fn first_names(selected: &[&Record]) -> Vec<String> {
    selected
        .iter()
        .map(|r| r.get("first").map(|v| v.to_string()).unwrap_or_default())
        .collect()
}

fn run(query: &str) -> Vec<String> {
    let records = people();
    first_names(&select(query, &records, &config()).unwrap())
}

#[test]
fn equality_via_key_selection() {
    assert_eq!(run("age:83"), vec!["John"]);
}

#[test]
fn supports_lt() {
    assert_eq!(run("age<83"), vec!["Graham"]);
}

#[test]
fn supports_lte() {
    assert_eq!(run("age<=83"), vec!["John", "Graham"]);
}

#[test]
fn supports_gt() {
    assert_eq!(run("age>48"), vec!["John"]);
}

#[test]
fn supports_gte() {
    assert_eq!(run("age>=48"), vec!["John", "Graham"]);
}

#[test]
fn implicit_and_with_regex() {
    assert_eq!(run("last:/^C/ age:83"), vec!["John"]);
    assert_eq!(run("last:/^C/ age:83"), run("last:/^C/ AND age:83"));
}

#[test]
fn supports_grouping() {
    assert_eq!(run("last:/^C/ (age:83 OR age:48)"), vec!["John", "Graham"]);
    assert_eq!(run("(age:83)"), vec!["John"]);
    assert_eq!(run("(age:83 OR age:48)"), vec!["John", "Graham"]);
}

#[test]
fn equals_sign_is_not_a_comparator() {
    // `=` is skipped, leaving two bare values that no field equals.
    assert!(run("age=83").is_empty());
}

#[test]
fn case_folding() {
    let records = people();
    let config = SelectConfig::default();
    assert_eq!(
        first_names(&select("\"JOHN\"", &records, &config).unwrap()),
        vec!["John"]
    );
    let strict = config.with_case_sensitive(true);
    assert!(select("\"JOHN\"", &records, &strict).unwrap().is_empty());
}

#[test]
fn negation_is_per_selection() {
    assert_eq!(run("-first:john OR age:83"), vec!["John", "Graham"]);
    assert_eq!(run("-first:john age<100"), vec!["Graham"]);
}

#[test]
fn dates() {
    assert_eq!(run("before:1940-01-01"), vec!["John"]);
    assert_eq!(run("after:\"10/27/1939\""), vec!["Graham"]);

    let records = people();
    let query = Query::with_clock(
        "after:yesterday",
        &config(),
        Arc::new(FixedClock(datetime!(1941-01-08 12:00 UTC))),
    )
    .unwrap();
    assert_eq!(first_names(&query.filter(&records)), vec!["Graham"]);
}

#[derive(Debug)]
struct MovableClock(Mutex<OffsetDateTime>);

impl Clock for MovableClock {
    fn now(&self) -> OffsetDateTime {
        *self.0.lock().unwrap()
    }
}

#[test]
fn yesterday_follows_the_clock_after_compiling() {
    let records = people();
    let clock = Arc::new(MovableClock(Mutex::new(datetime!(1941-01-08 12:00 UTC))));
    let query = Query::with_clock("after:yesterday", &config(), clock.clone()).unwrap();
    assert_eq!(first_names(&query.filter(&records)), vec!["Graham"]);

    *clock.0.lock().unwrap() = datetime!(1941-01-20 12:00 UTC);
    assert!(query.filter(&records).is_empty());

    *clock.0.lock().unwrap() = datetime!(1939-10-20 12:00 UTC);
    assert_eq!(first_names(&query.par_filter(&records)), vec!["John", "Graham"]);
}

#[test]
fn result_is_ordered_subsequence() {
    let records: Vec<Record> = (0..50)
        .map(|i| if i % 3 == 0 { john() } else { graham() })
        .collect();
    let selected = select_par("first:john OR age<40", &records, &config()).unwrap();
    assert_eq!(selected.len(), 17);
    for pair in selected.windows(2) {
        let a = pair[0] as *const Record;
        let b = pair[1] as *const Record;
        assert!(a < b);
    }
}

#[test]
fn idempotent() {
    let records = people();
    let query = Query::compile("last:/an$/ OR first:john", &config()).unwrap();
    assert_eq!(query.filter(&records), query.filter(&records));
}

#[test]
fn errors_are_reported() {
    let records = people();
    let err = select("age<", &records, &config()).unwrap_err();
    assert!(matches!(err, QueryError::Parse(_)));
    assert!(err.to_string().contains("expected a number"));

    let err = select("last:/^C", &records, &config()).unwrap_err();
    assert!(matches!(err, QueryError::Lex(_)));
    assert!(err.to_string().contains("column 5"));
}
