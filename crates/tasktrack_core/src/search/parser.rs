//! Free-text query parser.
//!
//! # Responsibility
//! - Turn one command-line style query string into a `TaskFilter`.
//! - Resolve tag/project names against the current store.
//!
//! # Invariants
//! - Parsing never fails. Malformed prefixed tokens become free text.
//! - Unknown tag/project names drop that constraint silently.
//! - `-word` tokens exclude tasks mentioning `word`.
//!
//! Grammar (whitespace separated, any order):
//! `status:todo,doing` `priority:1,2` `tag:home` `+home` `project:Work`
//! `due:today|tomorrow|week|month|YYYY-MM-DD|+Nd` `sort:field[:asc|desc]`
//! `-word`, anything else is free text.

use super::filter::{SortSpec, TaskFilter};
use crate::model::{Priority, TaskStatus};
use crate::store::EntityStore;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

static RELATIVE_DAYS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+(\d{1,4})d$").expect("valid relative days regex"));

const WEEK_DAYS: i64 = 7;
const MONTH_DAYS: i64 = 30;

/// Parses `input` into a filter, resolving names through `store` and dates from `now`.
pub fn parse_query(input: &str, store: &EntityStore, now: DateTime<Utc>) -> TaskFilter {
    let mut filter = TaskFilter::new();
    let mut text_terms: Vec<&str> = Vec::new();
    let mut excluded: Vec<String> = Vec::new();
    let mut statuses: BTreeSet<TaskStatus> = BTreeSet::new();
    let mut priorities: BTreeSet<Priority> = BTreeSet::new();
    let mut tag_ids = BTreeSet::new();
    let mut ignored_names = 0usize;

    for token in input.split_whitespace() {
        if let Some(name) = token.strip_prefix('+').filter(|name| !name.is_empty()) {
            match store.find_tag_by_name(name) {
                Some(tag) => {
                    tag_ids.insert(tag.id);
                }
                None => ignored_names += 1,
            }
            continue;
        }

        if let Some(term) = token.strip_prefix('-').filter(|term| !term.is_empty()) {
            excluded.push(term.to_string());
            continue;
        }

        let Some((key, value)) = token.split_once(':') else {
            text_terms.push(token);
            continue;
        };

        let recognized = match key.to_ascii_lowercase().as_str() {
            "status" => match parse_list(value, TaskStatus::parse) {
                Some(parsed) => {
                    statuses.extend(parsed);
                    true
                }
                None => false,
            },
            "priority" => match parse_list(value, parse_priority) {
                Some(parsed) => {
                    priorities.extend(parsed);
                    true
                }
                None => false,
            },
            "tag" => {
                for name in value.split(',').filter(|name| !name.is_empty()) {
                    match store.find_tag_by_name(name) {
                        Some(tag) => {
                            tag_ids.insert(tag.id);
                        }
                        None => ignored_names += 1,
                    }
                }
                true
            }
            "project" => {
                match store.find_project_by_name(value) {
                    Some(project) => filter.project_id = Some(project.id),
                    None => ignored_names += 1,
                }
                true
            }
            "due" => match parse_due_cutoff(value, now) {
                Some(cutoff) => {
                    filter.due_before = Some(cutoff);
                    true
                }
                None => false,
            },
            "sort" => match SortSpec::parse(value) {
                Some(sort) => {
                    filter.sort = Some(sort);
                    true
                }
                None => false,
            },
            _ => false,
        };

        if !recognized {
            text_terms.push(token);
        }
    }

    if !statuses.is_empty() {
        filter.statuses = Some(statuses);
    }
    if !priorities.is_empty() {
        filter.priorities = Some(priorities);
    }
    if !tag_ids.is_empty() {
        filter.tags = Some(tag_ids);
    }
    if !excluded.is_empty() {
        filter.exclude_text = Some(excluded);
    }
    if !text_terms.is_empty() {
        filter.text = Some(text_terms.join(" "));
    }

    debug!(
        "event=query_parse module=search status=ok tokens={} ignored_names={} has_text={}",
        input.split_whitespace().count(),
        ignored_names,
        filter.text.is_some()
    );
    filter
}

/// Resolves a `due:` value to an inclusive cutoff at the end of the named UTC day.
pub fn parse_due_cutoff(value: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let today = now.date_naive();
    let day = match value.to_ascii_lowercase().as_str() {
        "today" => today,
        "tomorrow" => today + Duration::days(1),
        "week" => today + Duration::days(WEEK_DAYS),
        "month" => today + Duration::days(MONTH_DAYS),
        other => {
            if let Some(captures) = RELATIVE_DAYS_RE.captures(other) {
                let days = captures[1].parse::<i64>().ok()?;
                today + Duration::days(days)
            } else {
                NaiveDate::parse_from_str(other, "%Y-%m-%d").ok()?
            }
        }
    };
    end_of_day(day)
}

fn end_of_day(day: NaiveDate) -> Option<DateTime<Utc>> {
    let last_instant = NaiveTime::from_hms_milli_opt(23, 59, 59, 999)?;
    Some(day.and_time(last_instant).and_utc())
}

fn parse_priority(value: &str) -> Option<Priority> {
    value
        .trim()
        .parse::<u8>()
        .ok()
        .and_then(|level| Priority::new(level).ok())
}

/// Parses a comma list where every element must be valid.
fn parse_list<T>(value: &str, parse: impl Fn(&str) -> Option<T>) -> Option<Vec<T>> {
    let parts = value
        .split(',')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>();
    if parts.is_empty() {
        return None;
    }
    parts.into_iter().map(parse).collect()
}
