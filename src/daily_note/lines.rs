use std::collections::HashSet;

use time::{macros::format_description, OffsetDateTime, UtcOffset};
use url::Url;

use crate::record::{DailyRecord, Resource};

/// Everything needed to turn records into section lines.
#[derive(Debug, Clone)]
pub struct LineStyle {
    pub offset: UtcOffset,
    /// Origin of the memo service, used for resources without an external link.
    pub resource_origin: Option<Url>,
}

fn clock(ts: i64, offset: UtcOffset) -> String {
    OffsetDateTime::from_unix_timestamp(ts)
        .ok()
        .and_then(|t| t.to_offset(offset).format(format_description!("[hour]:[minute]")).ok())
        .unwrap_or_else(|| "00:00".to_string())
}

/// Collapses line breaks so one record can never span several lines.
pub fn flatten(content: &str) -> String {
    content
        .trim()
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\n', "<br>")
}

fn resource_link(resource: &Resource, origin: Option<&Url>) -> Option<String> {
    if let Some(link) = resource.external_link.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
        return Some(link.to_string());
    }
    let mut url = origin?.clone();
    {
        let mut segments = url.path_segments_mut().ok()?;
        segments.clear();
        segments.push("o");
        segments.push("r");
        segments.push(resource.uid.as_deref().filter(|u| !u.is_empty()).unwrap_or(&resource.id));
        segments.push(&resource.filename);
    }
    Some(url.to_string())
}

fn render_resource(resource: &Resource, origin: Option<&Url>) -> Option<String> {
    let link = resource_link(resource, origin)?;
    let name = resource.display_name().replace(['[', ']'], "");
    if resource.is_image() {
        Some(format!("![{name}]({link})"))
    } else {
        Some(format!("[{name}]({link})"))
    }
}

/// Renders one record as a single list line: `- HH:mm text`, or
/// `- [ ] HH:mm text` when the memo is itself a task.
pub fn render_record_line(record: &DailyRecord, style: &LineStyle) -> String {
    let time = clock(record.created_ts, style.offset);
    let content = flatten(&record.content);

    let task = ["- [ ] ", "- [x] ", "- [X] "]
        .into_iter()
        .find_map(|marker: &'static str| {
            content.strip_prefix(marker).map(|rest| (&marker[..5], rest))
        });

    let mut line = match task {
        Some((marker, rest)) => format!("{} {time} {rest}", marker.to_ascii_lowercase()),
        None if content.is_empty() => format!("- {time}"),
        None => format!("- {time} {content}"),
    };

    for rendered in record
        .resources()
        .iter()
        .filter_map(|r| render_resource(r, style.resource_origin.as_ref()))
    {
        line.push(' ');
        line.push_str(&rendered);
    }
    line
}

/// Section lines in fetch order. Archived records are left out and a record
/// appearing twice is rendered once.
pub fn render_lines(records: &[DailyRecord], style: &LineStyle) -> Vec<String> {
    let mut seen = HashSet::new();
    records
        .iter()
        .filter(|r| !r.is_archived())
        .filter(|r| seen.insert(r.key()))
        .map(|r| render_record_line(r, style))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RowStatus;

    fn record(id: &str, ts: i64, content: &str) -> DailyRecord {
        DailyRecord {
            id: id.to_string(),
            row_status: RowStatus::Normal,
            created_ts: ts,
            updated_ts: ts,
            created_at: None,
            updated_at: None,
            content: content.to_string(),
            resource_list: None,
        }
    }

    fn utc() -> LineStyle {
        LineStyle {
            offset: UtcOffset::UTC,
            resource_origin: Url::parse("https://memos.example.com").ok(),
        }
    }

    #[test]
    fn multi_line_content_stays_on_one_line() {
        let line = render_record_line(&record("1", 3600, "first\n## not a header\r\nthird"), &utc());
        assert_eq!(line, "- 01:00 first<br>## not a header<br>third");
        assert!(!line.contains('\n'));
    }

    #[test]
    fn task_memos_keep_checkbox_first() {
        let line = render_record_line(&record("1", 0, "- [X] call mom"), &utc());
        assert_eq!(line, "- [x] 00:00 call mom");
    }

    #[test]
    fn uses_configured_offset() {
        let style = LineStyle {
            offset: UtcOffset::from_hms(8, 0, 0).expect("offset"),
            resource_origin: None,
        };
        assert_eq!(render_record_line(&record("1", 0, "tea"), &style), "- 08:00 tea");
    }

    #[test]
    fn resources_render_inline() {
        let mut r = record("1", 0, "photo");
        r.resource_list = Some(vec![
            Resource {
                id: "9".to_string(),
                filename: "cat.png".to_string(),
                name: None,
                external_link: None,
                mime_type: Some("image/png".to_string()),
                uid: None,
            },
            Resource {
                id: "10".to_string(),
                filename: "doc.pdf".to_string(),
                name: Some("Doc".to_string()),
                external_link: Some("https://files.example.com/doc.pdf".to_string()),
                mime_type: None,
                uid: None,
            },
        ]);
        assert_eq!(
            render_record_line(&r, &utc()),
            "- 00:00 photo ![cat.png](https://memos.example.com/o/r/9/cat.png) [Doc](https://files.example.com/doc.pdf)"
        );
    }

    #[test]
    fn skips_archived_and_duplicate_records() {
        let mut archived = record("2", 60, "old");
        archived.row_status = RowStatus::Archived;
        let records = vec![record("1", 0, "a"), archived, record("1", 0, "a"), record("3", 120, "c")];
        assert_eq!(render_lines(&records, &utc()), vec!["- 00:00 a", "- 00:02 c"]);
    }
}
