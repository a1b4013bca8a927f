//! Cell-based (LBS) location
//!
//! Without a satellite fix the platform can still place the node from the
//! identifiers of its serving cell.

use crate::source::LocationSource;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Identifiers of the serving cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellInfo {
    pub cell_id: u32,
    pub mcc: u16,
    pub mnc: u16,
    /// Tracking area code
    pub tac: u32,
    /// Received signal level as reported by the modem
    pub signal: i32,
}

/// Modem capability reporting the serving cell.
pub trait CellInfoProvider: Send {
    fn serving_cell(&mut self) -> Option<CellInfo>;
}

/// Platform LBS sentence for `cell`.
pub fn format_lbs(cell: &CellInfo) -> String {
    format!(
        "$LBS,{},{},{},{},{},0*69;",
        cell.mcc, cell.mnc, cell.tac, cell.cell_id, cell.signal
    )
}

/// [`LocationSource`] over a [`CellInfoProvider`].
#[derive(Debug)]
pub struct LbsSource<P> {
    provider: P,
}

impl<P: CellInfoProvider> LbsSource<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

impl<P: CellInfoProvider> LocationSource for LbsSource<P> {
    fn get_fix(&mut self) -> Option<String> {
        match self.provider.serving_cell() {
            Some(cell) => Some(format_lbs(&cell)),
            None => {
                debug!("No serving cell");
                None
            }
        }
    }

    fn name(&self) -> &'static str {
        "lbs"
    }
}
