use std::io::{Read, Seek, SeekFrom};

use pcap_parser::Linktype;

use super::layout;
use crate::source::SourceError;

/// Read the four magic bytes and rewind to the start of the stream.
///
/// # Errors
/// Returns `SourceError::Io` when the stream is shorter than four bytes
/// or cannot be rewound.
pub fn read_magic_and_rewind<R: Read + Seek>(reader: &mut R) -> Result<[u8; 4], SourceError> {
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    reader.seek(SeekFrom::Start(0))?;
    Ok(magic)
}

pub fn is_pcapng_magic(magic: &[u8; 4]) -> bool {
    magic == &layout::PCAPNG_MAGIC
}

/// Link type and clock of one PCAPNG interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterfaceInfo {
    pub linktype: Linktype,
    /// Timestamp units per second (`if_tsresol`).
    pub ts_units: u64,
    /// Seconds added to every timestamp (`if_tsoffset`).
    pub ts_offset: i64,
}

impl Default for InterfaceInfo {
    fn default() -> Self {
        Self {
            linktype: Linktype::ETHERNET,
            ts_units: layout::DEFAULT_TS_UNITS,
            ts_offset: 0,
        }
    }
}

/// Interface a PCAPNG packet was captured on.
///
/// Unknown interfaces fall back to Ethernet with microsecond timestamps.
pub fn interface_for(interfaces: &[InterfaceInfo], if_id: u32) -> InterfaceInfo {
    usize::try_from(if_id)
        .ok()
        .and_then(|index| interfaces.get(index))
        .copied()
        .unwrap_or_default()
}

/// Convert a PCAPNG high/low timestamp in `interface` units to seconds.
pub fn pcapng_ts_to_seconds(ts_high: u32, ts_low: u32, interface: &InterfaceInfo) -> f64 {
    let ts = (u64::from(ts_high) << 32) | u64::from(ts_low);
    let units = interface.ts_units.max(1);
    interface.ts_offset as f64 + (ts / units) as f64 + (ts % units) as f64 / units as f64
}

/// Convert a legacy PCAP timestamp; the fraction is nanoseconds for
/// nanosecond-magic files and microseconds otherwise.
pub fn legacy_ts_to_seconds(ts_sec: u32, ts_fraction: u32, nanosecond: bool) -> f64 {
    let scale = if nanosecond { 1e-9 } else { 1e-6 };
    f64::from(ts_sec) + f64::from(ts_fraction) * scale
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn detects_pcapng_magic() {
        assert!(is_pcapng_magic(&layout::PCAPNG_MAGIC));
        assert!(!is_pcapng_magic(&[0xd4, 0xc3, 0xb2, 0xa1]));
    }

    #[test]
    fn magic_read_rewinds() {
        let mut cursor = Cursor::new([0x0a, 0x0d, 0x0d, 0x0a, 0x01]);
        let magic = read_magic_and_rewind(&mut cursor).unwrap();
        assert_eq!(magic, layout::PCAPNG_MAGIC);
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn short_stream_is_an_io_error() {
        let mut cursor = Cursor::new([0x0a, 0x0d, 0x0d]);
        let err = read_magic_and_rewind(&mut cursor).unwrap_err();
        assert!(matches!(err, SourceError::Io(_)));
    }

    #[test]
    fn unknown_interface_defaults_to_ethernet() {
        let interfaces = [InterfaceInfo {
            linktype: Linktype::RAW,
            ..InterfaceInfo::default()
        }];
        assert_eq!(interface_for(&interfaces, 0).linktype, Linktype::RAW);
        assert_eq!(interface_for(&interfaces, 1), InterfaceInfo::default());
    }

    #[test]
    fn converts_timestamps_to_seconds() {
        let micros = InterfaceInfo::default();
        assert!((pcapng_ts_to_seconds(0, 1_500_000, &micros) - 1.5).abs() < 1e-9);
        assert!((legacy_ts_to_seconds(2, 250_000, false) - 2.25).abs() < 1e-9);
        assert!((legacy_ts_to_seconds(2, 250_000_000, true) - 2.25).abs() < 1e-9);
    }

    #[test]
    fn honors_interface_resolution_and_offset() {
        let nanos = InterfaceInfo {
            ts_units: 1_000_000_000,
            ts_offset: 10,
            ..InterfaceInfo::default()
        };
        assert!((pcapng_ts_to_seconds(0, 1_500_000_000, &nanos) - 11.5).abs() < 1e-9);
    }
}
