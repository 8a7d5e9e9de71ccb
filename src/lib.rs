#![forbid(unsafe_code)]

pub mod assemble;
pub mod config;
pub mod encode_ffmpeg;
pub mod error;
pub mod fetch;
pub mod geo;
pub mod pipeline;
pub mod provider;
pub mod track;

pub use assemble::VideoSink;
pub use config::PipelineConfig;
pub use error::{DrivelapseError, DrivelapseResult};
pub use fetch::{FetchOutcome, FetchSummary, FrameRecord};
pub use pipeline::RunSummary;
pub use provider::{
    ImageryProvider, PanoStatus, PanoramaMetadata, PanoramaQuery, StreetViewProvider,
};
pub use track::TrackPoint;
