use std::sync::Arc;

use time::{Date, Weekday};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::{SyncError, SyncResult};
use crate::record::DailyRecord;
use crate::vault::Vault;

use super::lines::{render_lines, LineStyle};
use super::section::{upsert_section, HeaderMatcher};
use super::template::format_note_path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    Updated { path: String, lines: usize },
    Unchanged { path: String },
    /// Teardown started before the write.
    Cancelled { path: String },
}

/// Rewrites the record section of daily notes.
pub struct DailyNoteMerger {
    vault: Arc<dyn Vault>,
    path_template: String,
    week_start: Weekday,
    style: LineStyle,
    shutdown: CancellationToken,
}

impl DailyNoteMerger {
    pub fn new(
        vault: Arc<dyn Vault>,
        path_template: impl Into<String>,
        week_start: Weekday,
        style: LineStyle,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            vault,
            path_template: path_template.into(),
            week_start,
            style,
            shutdown,
        }
    }

    pub fn note_path(&self, date: Date) -> SyncResult<String> {
        format_note_path(&self.path_template, date, self.week_start)
    }

    pub fn lines_for(&self, records: &[DailyRecord]) -> Vec<String> {
        render_lines(records, &self.style)
    }

    /// Upserts `records` into the `section_header` section of the note for
    /// `date`. A missing note is `NoteNotFound` and is never created.
    pub async fn merge(
        &self,
        date: Date,
        records: &[DailyRecord],
        section_header: &str,
    ) -> SyncResult<MergeOutcome> {
        let path = self.note_path(date)?;
        let lines = self.lines_for(records);
        let matcher = HeaderMatcher::parse(section_header);
        let vault = Arc::clone(&self.vault);
        let shutdown = self.shutdown.clone();

        tokio::task::spawn_blocking(move || merge_note(vault.as_ref(), &path, &matcher, &lines, &shutdown))
            .await
            .map_err(|e| SyncError::Io(std::io::Error::other(e.to_string())))?
    }
}

fn merge_note(
    vault: &dyn Vault,
    path: &str,
    matcher: &HeaderMatcher,
    lines: &[String],
    shutdown: &CancellationToken,
) -> SyncResult<MergeOutcome> {
    if !vault.exists(path)? {
        return Err(SyncError::NoteNotFound(path.to_string()));
    }
    let current = vault.read(path)?;
    let next = match upsert_section(&current, matcher, lines) {
        Some(next) if next != current => next,
        _ => {
            debug!(path, "daily record section unchanged");
            return Ok(MergeOutcome::Unchanged {
                path: path.to_string(),
            });
        }
    };

    if shutdown.is_cancelled() {
        return Ok(MergeOutcome::Cancelled {
            path: path.to_string(),
        });
    }
    vault.write(path, &next)?;
    info!(path, lines = lines.len(), "daily record section updated");
    Ok(MergeOutcome::Updated {
        path: path.to_string(),
        lines: lines.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RowStatus;
    use crate::vault::FsVault;
    use std::path::PathBuf;
    use time::{macros::date, UtcOffset};

    struct TempVault {
        root: PathBuf,
    }

    impl TempVault {
        fn new() -> Self {
            let root = std::env::temp_dir().join(format!("pp-merge-test-{}", uuid::Uuid::new_v4()));
            std::fs::create_dir_all(&root).expect("temp vault should be created");
            Self { root }
        }
    }

    impl Drop for TempVault {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.root);
        }
    }

    fn record(id: &str, ts: i64, content: &str, status: RowStatus) -> DailyRecord {
        DailyRecord {
            id: id.to_string(),
            row_status: status,
            created_ts: ts,
            updated_ts: ts,
            created_at: None,
            updated_at: None,
            content: content.to_string(),
            resource_list: None,
        }
    }

    fn merger(root: &std::path::Path, shutdown: CancellationToken) -> DailyNoteMerger {
        DailyNoteMerger::new(
            Arc::new(FsVault::new(root)),
            "Journal/{date}.md",
            Weekday::Monday,
            LineStyle {
                offset: UtcOffset::UTC,
                resource_origin: None,
            },
            shutdown,
        )
    }

    // 2024-01-02T08:00:00Z
    const MORNING: i64 = 1_704_182_400;

    #[tokio::test]
    async fn merging_twice_is_byte_identical() {
        let temp = TempVault::new();
        let note = temp.root.join("Journal/2024-01-02.md");
        std::fs::create_dir_all(note.parent().expect("parent")).expect("dir");
        std::fs::write(&note, "# Tuesday\n\n## Daily Record\n\n## Tasks\n- [ ] laundry\n").expect("seed");

        let merger = merger(&temp.root, CancellationToken::new());
        let records = vec![record("1", MORNING, "Bought milk", RowStatus::Active)];

        let first = merger
            .merge(date!(2024 - 01 - 02), &records, "Daily Record")
            .await
            .expect("first merge");
        assert_eq!(
            first,
            MergeOutcome::Updated {
                path: "Journal/2024-01-02.md".to_string(),
                lines: 1
            }
        );
        let after_first = std::fs::read_to_string(&note).expect("read");
        assert_eq!(
            after_first,
            "# Tuesday\n\n## Daily Record\n- 08:00 Bought milk\n\n## Tasks\n- [ ] laundry\n"
        );

        let second = merger
            .merge(date!(2024 - 01 - 02), &records, "Daily Record")
            .await
            .expect("second merge");
        assert!(matches!(second, MergeOutcome::Unchanged { .. }));
        assert_eq!(std::fs::read_to_string(&note).expect("read"), after_first);
    }

    #[tokio::test]
    async fn archived_records_vanish_on_next_merge() {
        let temp = TempVault::new();
        let merger = merger(&temp.root, CancellationToken::new());
        std::fs::create_dir_all(temp.root.join("Journal")).expect("dir");
        std::fs::write(temp.root.join("Journal/2024-01-02.md"), "").expect("seed");

        let a = record("1", MORNING, "keep", RowStatus::Normal);
        let b = record("2", MORNING + 60, "drop", RowStatus::Normal);
        merger
            .merge(date!(2024 - 01 - 02), &[a.clone(), b.clone()], "Daily Record")
            .await
            .expect("merge");

        let mut archived = b;
        archived.row_status = RowStatus::Archived;
        merger
            .merge(date!(2024 - 01 - 02), &[a, archived], "Daily Record")
            .await
            .expect("merge");

        let text = std::fs::read_to_string(temp.root.join("Journal/2024-01-02.md")).expect("read");
        assert_eq!(text, "## Daily Record\n- 08:00 keep\n");
    }

    #[tokio::test]
    async fn missing_note_is_not_created() {
        let temp = TempVault::new();
        let merger = merger(&temp.root, CancellationToken::new());
        let err = merger
            .merge(date!(2024 - 01 - 02), &[record("1", MORNING, "x", RowStatus::Normal)], "Daily Record")
            .await
            .expect_err("missing note");
        assert!(matches!(err, SyncError::NoteNotFound(ref p) if p == "Journal/2024-01-02.md"));
        assert!(!temp.root.join("Journal/2024-01-02.md").exists());
    }

    #[tokio::test]
    async fn no_write_after_shutdown() {
        let temp = TempVault::new();
        std::fs::create_dir_all(temp.root.join("Journal")).expect("dir");
        std::fs::write(temp.root.join("Journal/2024-01-02.md"), "# Day\n").expect("seed");
        let shutdown = CancellationToken::new();
        let merger = merger(&temp.root, shutdown.clone());
        shutdown.cancel();

        let outcome = merger
            .merge(date!(2024 - 01 - 02), &[record("1", MORNING, "x", RowStatus::Normal)], "Daily Record")
            .await
            .expect("merge");
        assert!(matches!(outcome, MergeOutcome::Cancelled { .. }));
        assert_eq!(
            std::fs::read_to_string(temp.root.join("Journal/2024-01-02.md")).expect("read"),
            "# Day\n"
        );
    }
}
