//! Host environment
//!
//! Bundles the document, media surface and audio platform the engine runs
//! against. Owned by the embedder and handed to the engine by `&mut` on
//! every call, so tests can inspect or mutate it between pumps.

use tempo_dom::Document;
use tempo_media::{AudioHost, MediaHost};

/// Everything the engine touches in the host page.
#[derive(Debug, Default)]
pub struct Host {
    pub doc: Document,
    pub media: MediaHost,
    pub audio: AudioHost,
}

impl Host {
    pub fn new() -> Self {
        Self::default()
    }
}
