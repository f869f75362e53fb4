pub mod scenario;
pub mod util;

pub use util::{fingerprint, report_timestamp, split_csv};
