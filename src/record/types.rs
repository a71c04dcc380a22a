use serde::{Deserialize, Deserializer, Serialize};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::error::{SyncError, SyncResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RowStatus {
    Archived,
    Active,
    Normal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub filename: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub external_link: Option<String>,
    #[serde(default, rename = "type")]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub uid: Option<String>,
}

impl Resource {
    pub fn is_image(&self) -> bool {
        if let Some(mime) = self.mime_type.as_deref() {
            return mime.starts_with("image/");
        }
        let ext = self
            .filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        matches!(ext.as_str(), "png" | "jpg" | "jpeg" | "gif" | "webp" | "svg")
    }

    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.filename)
    }
}

/// A memo fetched from the remote service. Timestamps are epoch seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub row_status: RowStatus,
    pub created_ts: i64,
    pub updated_ts: i64,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub resource_list: Option<Vec<Resource>>,
}

/// Identity of a record across fetches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordKey {
    pub id: String,
    pub created_ts: i64,
}

impl DailyRecord {
    pub fn key(&self) -> RecordKey {
        RecordKey {
            id: self.id.clone(),
            created_ts: self.created_ts,
        }
    }

    pub fn is_archived(&self) -> bool {
        self.row_status == RowStatus::Archived
    }

    pub fn resources(&self) -> &[Resource] {
        self.resource_list.as_deref().unwrap_or(&[])
    }

    /// Checks that the ISO timestamps, when present, name the same instant
    /// as the numeric ones.
    pub fn check_timestamps(&self) -> SyncResult<()> {
        check_iso(&self.id, "createdAt", self.created_at.as_deref(), self.created_ts)?;
        check_iso(&self.id, "updatedAt", self.updated_at.as_deref(), self.updated_ts)
    }
}

fn check_iso(id: &str, field: &str, iso: Option<&str>, ts: i64) -> SyncResult<()> {
    let Some(iso) = iso.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(());
    };
    let parsed = OffsetDateTime::parse(iso, &Rfc3339)
        .map_err(|e| SyncError::Parse(format!("record {id}: bad {field} '{iso}': {e}")))?;
    if parsed.unix_timestamp() != ts {
        return Err(SyncError::Parse(format!(
            "record {id}: {field} '{iso}' disagrees with timestamp {ts}"
        )));
    }
    Ok(())
}

/// Error body returned by the memo service. `message`, `msg` and `error`
/// are used interchangeably by different server versions.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FetchErrorBody {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl FetchErrorBody {
    pub fn text(&self) -> Option<&str> {
        [&self.message, &self.msg, &self.error]
            .into_iter()
            .filter_map(|v| v.as_deref())
            .map(str::trim)
            .find(|v| !v.is_empty())
    }
}

/// Older servers wrap the list in `{ "data": [...] }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RecordPayload {
    Bare(Vec<DailyRecord>),
    Wrapped { data: Vec<DailyRecord> },
}

impl RecordPayload {
    pub fn into_records(self) -> Vec<DailyRecord> {
        match self {
            Self::Bare(records) | Self::Wrapped { data: records } => records,
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Int(i64),
    }
    Ok(match Raw::deserialize(deserializer)? {
        Raw::Str(s) => s,
        Raw::Int(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_payload_shapes_and_numeric_ids() {
        let bare = r#"[{"id":7,"rowStatus":"NORMAL","createdTs":100,"updatedTs":100,"content":"a"}]"#;
        let wrapped = r#"{"data":[{"id":"7","rowStatus":"NORMAL","createdTs":100,"updatedTs":100,"content":"a"}]}"#;
        let a = serde_json::from_str::<RecordPayload>(bare).expect("bare").into_records();
        let b = serde_json::from_str::<RecordPayload>(wrapped).expect("wrapped").into_records();
        assert_eq!(a, b);
        assert_eq!(a[0].id, "7");
    }

    #[test]
    fn error_body_aliases_are_equivalent() {
        for body in [
            r#"{"code":401,"message":"bad token"}"#,
            r#"{"code":401,"message":"","msg":"bad token"}"#,
            r#"{"code":401,"error":"bad token"}"#,
        ] {
            let parsed: FetchErrorBody = serde_json::from_str(body).expect("error body");
            assert_eq!(parsed.text(), Some("bad token"));
        }
    }

    #[test]
    fn rejects_disagreeing_iso_timestamp() {
        let mut record: DailyRecord = serde_json::from_str(
            r#"{"id":"1","rowStatus":"ACTIVE","createdTs":0,"updatedTs":0,
                "createdAt":"1970-01-01T00:00:00Z","updatedAt":"1970-01-01T00:00:00Z",
                "content":"x"}"#,
        )
        .expect("record");
        record.check_timestamps().expect("timestamps agree");

        record.updated_at = Some("1970-01-01T00:01:00Z".to_string());
        assert!(matches!(record.check_timestamps(), Err(SyncError::Parse(_))));
    }

    #[test]
    fn resource_image_detection_prefers_mime_type() {
        let resource = Resource {
            id: "1".to_string(),
            filename: "scan.pdf".to_string(),
            name: None,
            external_link: None,
            mime_type: Some("image/png".to_string()),
            uid: None,
        };
        assert!(resource.is_image());
        assert_eq!(resource.display_name(), "scan.pdf");
    }
}
