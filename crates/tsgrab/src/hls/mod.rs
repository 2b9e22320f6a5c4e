// Segment retrieval and reassembly for flat HLS media playlists.

pub mod assembler;
pub mod error;
pub mod fetcher;
pub mod playlist;
pub mod scheduler;

// Re-exports for easier access
pub use assembler::{AssembledContainer, AssemblyError, SegmentAssembler};
pub use error::FetchError;
pub use fetcher::{HttpFetcher, ResourceFetcher};
pub use playlist::{Manifest, ManifestError, ManifestParser, SegmentRef, parse_manifest};
pub use scheduler::{RetrievedSegment, ScheduleError, SegmentProgress, SegmentScheduler};
