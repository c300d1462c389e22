//! Upload sequencing
//!
//! Strictly sequential: one item in flight, enqueue order preserved, failed
//! items end in `FAILED` with no automatic retry.

mod worker;

pub(crate) use worker::is_halted_at_tail;
pub use worker::UploadSequencer;
