//! Media access
//!
//! ffprobe metadata, ffmpeg frame/audio extraction and the per-request
//! temp workspace. Everything here shells out to the ffmpeg tools; no
//! in-process demuxing.

pub mod extract;
pub mod probe;
pub mod workspace;

pub use probe::{FfprobeProber, MediaInfo, MediaProber};
pub use workspace::RequestWorkspace;
