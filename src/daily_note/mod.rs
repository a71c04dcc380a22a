mod lines;
mod merge;
mod section;
mod template;

pub use lines::{flatten, render_lines, render_record_line, LineStyle};
pub use merge::{DailyNoteMerger, MergeOutcome};
pub use section::{find_section, headings, upsert_section, HeaderMatcher, Heading, SectionSpan};
pub use template::{format_date, format_note_path, week_of_year};
