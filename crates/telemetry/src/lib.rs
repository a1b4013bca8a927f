//! FieldLink Telemetry
//!
//! The periodic half of the node: the change filter that decides which
//! readings are worth a cellular round-trip, the frame assembler, the
//! sampling loop that drives them, and the on-demand property read service
//! the loop answers between cycles.

pub mod assembler;
pub mod filter;
pub mod request;
pub mod sampler;

pub use assembler::{snapshot_frame, FrameAssembler};
pub use filter::{should_report, ChangeFilter, Verdict};
pub use request::{
    channels_from_ids, read_channel, PendingRead, ReadHandle, ReadRequest, ReadRequests, RequestError,
    DEFAULT_QUEUE_CAPACITY,
};
pub use sampler::{CycleReport, SamplingLoop, SamplingSettings, TELEMETRY_FRAME_MODE};
