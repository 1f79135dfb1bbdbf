//! UDP extraction from link-layer frames.

pub mod error;
pub mod parser;

pub use parser::{UdpDatagram, parse_udp_packet};
