//! Export tracking: status polling, artifact fetching and payload decoding

mod artifact;
mod decode;
mod poller;

pub use artifact::{ArtifactFetcher, FetchReport};
pub use decode::{decode_payload, Artifact};
pub use poller::ExportPoller;
