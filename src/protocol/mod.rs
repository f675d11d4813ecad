//! Wire protocol shared by the front-end and the worker dispatcher
//!
//! This module contains:
//! - The length-prefixed frame codec
//! - The job and result payloads carried inside frames

mod frame;
mod messages;

pub use frame::{read_exact, FrameCodec, FrameError, DEFAULT_MAX_FRAME_BYTES, HEADER_LEN};
pub use messages::{
    EnrichmentReport, EnrichmentResult, Failure, FailureStatus, Job, Performance,
};
