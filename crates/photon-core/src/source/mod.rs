//! Packet sources feeding the analysis pipeline.
//!
//! A source yields link-layer frames with their capture timestamp. File
//! access is confined here so decoders stay pure.

mod pcap;

pub use pcap::PcapFileSource;

use pcap_parser::Linktype;
use thiserror::Error;

/// One captured link-layer frame.
#[derive(Debug, Clone)]
pub struct PacketEvent {
    /// Capture time in seconds since the Unix epoch, when known.
    pub ts: Option<f64>,
    pub linktype: Linktype,
    pub data: Vec<u8>,
}

/// Pull-based stream of captured frames.
pub trait PacketSource {
    /// Next frame, or `Ok(None)` at the end of the capture.
    fn next_packet(&mut self) -> Result<Option<PacketEvent>, SourceError>;
}

impl<S: PacketSource + ?Sized> PacketSource for Box<S> {
    fn next_packet(&mut self) -> Result<Option<PacketEvent>, SourceError> {
        (**self).next_packet()
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("capture parse error ({context}): {message}")]
    Pcap {
        context: &'static str,
        message: String,
    },
}
