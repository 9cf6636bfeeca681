pub mod file_source;
pub mod http_source;
pub mod registry;

pub use file_source::FileSource;
pub use http_source::HttpSource;
pub use registry::{SourceSpec, SourceTarget, build_sources};
