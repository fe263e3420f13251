//! Test support.


pub(crate) use context::TestContext;
pub(crate) use media_host::{RecordingMediaHost, image_file};
