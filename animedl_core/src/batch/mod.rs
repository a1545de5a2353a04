pub mod coordinator;
pub mod report;
pub mod series_list;

pub use coordinator::{BatchCoordinator, PreparedSeries};
pub use report::{BatchReport, SeriesFailure, TaskFailure};
pub use series_list::{clear_series_list, parse_series_list, read_series_list};
