//! FieldLink Location
//!
//! Location sources (serving-cell LBS, GNSS GGA, and a GNSS-then-LBS
//! fallback), the reporting loop that publishes their fixes through the
//! shared delivery channel, and the trigger for on-demand reports.

pub mod gnss;
pub mod lbs;
pub mod reporter;
pub mod request;
pub mod source;

pub use gnss::{
    find_gga_line, is_valid_gga, parse_gga, GgaError, GgaFix, GnssSource, NmeaProvider, GNSS_READ_ATTEMPTS,
    GNSS_RETRY_PAUSE,
};
pub use lbs::{format_lbs, CellInfo, CellInfoProvider, LbsSource};
pub use reporter::{LocationReporter, LocationSettings, ReportOutcome};
pub use request::{report_channel, LocationHandle, PendingReport, ReportRequest, ReportRequests, TriggerError};
pub use source::{FallbackSource, LocationSource};
