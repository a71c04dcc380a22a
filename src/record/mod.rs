mod fetch;
mod helpers;
mod types;

pub use fetch::{HttpRecordFetcher, RecordSource};
pub use types::{DailyRecord, RecordKey, Resource, RowStatus};
