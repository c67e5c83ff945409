pub mod errors;
pub mod models;
pub mod resolver;
pub mod stream_selector;
pub mod url_parser;
pub mod ytdlp;

pub use errors::ResolutionError;
pub use models::{PlaylistInfo, ResolvedStream, StreamInfo, UrlType, VideoQuality};
pub use resolver::StreamResolver;
pub use url_parser::UrlParser;
pub use ytdlp::YtDlpResolver;
