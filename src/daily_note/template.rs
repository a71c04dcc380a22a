use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use time::{Date, Duration, Month, Weekday};

use crate::error::{SyncError, SyncResult};
use crate::paths::normalize_vault_path;
use crate::utils::is_markdown_path;

const DEFAULT_DATE_FORMAT: &str = "YYYY-MM-DD";

// Longest tokens first so `YYYY` wins over `YY`.
const TOKENS: [&str; 12] = [
    "YYYY", "gggg", "dddd", "ddd", "YY", "MM", "DD", "ww", "Q", "M", "D", "w",
];

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{date(?::([^}]*))?\}").expect("placeholder regex is valid"))
}

fn week_start_of(date: Date, week_start: Weekday) -> Date {
    let back = (date.weekday().number_days_from_sunday() + 7 - week_start.number_days_from_sunday()) % 7;
    date - Duration::days(i64::from(back))
}

/// Week-year and week number. Week 1 is the week containing January 1st.
pub fn week_of_year(date: Date, week_start: Weekday) -> (i32, u8) {
    let start = week_start_of(date, week_start);
    let week_year = (start + Duration::days(6)).year();
    let first = Date::from_calendar_date(week_year, Month::January, 1)
        .map(|jan1| week_start_of(jan1, week_start))
        .unwrap_or(start);
    let week = (start - first).whole_days() / 7 + 1;
    (week_year, week as u8)
}

/// Formats `date` with a dayjs-style format string. Text in `[...]` is
/// copied verbatim.
pub fn format_date(format: &str, date: Date, week_start: Weekday) -> String {
    let mut out = String::with_capacity(format.len() + 8);
    let mut rest = format;
    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix('[') {
            if let Some(end) = after.find(']') {
                out.push_str(&after[..end]);
                rest = &after[end + 1..];
                continue;
            }
        }

        if let Some(token) = TOKENS.iter().find(|t| rest.starts_with(**t)) {
            push_token(&mut out, token, date, week_start);
            rest = &rest[token.len()..];
            continue;
        }

        let ch = rest.chars().next().unwrap_or_default();
        out.push(ch);
        rest = &rest[ch.len_utf8()..];
    }
    out
}

fn push_token(out: &mut String, token: &str, date: Date, week_start: Weekday) {
    let month = u8::from(date.month());
    match token {
        "YYYY" => out.push_str(&format!("{:04}", date.year())),
        "YY" => out.push_str(&format!("{:02}", date.year().rem_euclid(100))),
        "Q" => out.push_str(&((month - 1) / 3 + 1).to_string()),
        "MM" => out.push_str(&format!("{month:02}")),
        "M" => out.push_str(&month.to_string()),
        "DD" => out.push_str(&format!("{:02}", date.day())),
        "D" => out.push_str(&date.day().to_string()),
        "ww" => out.push_str(&format!("{:02}", week_of_year(date, week_start).1)),
        "w" => out.push_str(&week_of_year(date, week_start).1.to_string()),
        "gggg" => out.push_str(&format!("{:04}", week_of_year(date, week_start).0)),
        "dddd" => out.push_str(&date.weekday().to_string()),
        "ddd" => out.push_str(&date.weekday().to_string()[..3]),
        _ => out.push_str(token),
    }
}

/// Resolves the vault-relative daily note path for `date`.
///
/// Templates containing `{date}` or `{date:FORMAT}` only have those
/// placeholders substituted. A template without braces is treated as one
/// dayjs format string, as older settings files store it that way.
pub fn format_note_path(template: &str, date: Date, week_start: Weekday) -> SyncResult<String> {
    let rendered = if template.contains('{') {
        placeholder_re()
            .replace_all(template, |caps: &regex::Captures<'_>| {
                let format = caps
                    .get(1)
                    .map(|m| m.as_str())
                    .filter(|f| !f.trim().is_empty())
                    .unwrap_or(DEFAULT_DATE_FORMAT);
                format_date(format, date, week_start)
            })
            .into_owned()
    } else {
        format_date(template, date, week_start)
    };

    let mut path = normalize_vault_path(&rendered);
    if path.is_empty() {
        return Err(SyncError::Config(format!(
            "dailyNotePath '{template}' resolves to an empty path"
        )));
    }
    if !is_markdown_path(Path::new(&path)) {
        path.push_str(".md");
    }
    Ok(path)
}
