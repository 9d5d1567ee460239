//! Camera capture: a device opens a stream of frames for one session.

pub mod device;
#[cfg(feature = "media-ffmpeg")]
pub mod ffmpeg;
pub mod still;
