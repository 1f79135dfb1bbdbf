use pcap_parser::Linktype;
use thiserror::Error;

/// Why a captured frame yielded no UDP datagram.
#[derive(Debug, Error)]
pub enum UdpError {
    #[error("cannot slice {linktype:?} frame: {message}")]
    Slice { linktype: Linktype, message: String },
    #[error("frame has a transport layer but no IP header")]
    MissingNetworkLayer,
}
