//! PCAP/PCAPNG file source.
//!
//! The container format is detected from the leading magic bytes. Link types
//! are tracked per interface so Ethernet and raw-IP captures both work.

pub mod layout;
pub mod parser;
pub mod reader;

pub use parser::PcapFileSource;
