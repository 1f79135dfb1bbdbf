use std::fs::File;
use std::io::Read;
use std::path::Path;

use pcap_parser::traits::PcapReaderIterator;
use pcap_parser::{Block, LegacyPcapReader, Linktype, PcapBlockOwned, PcapError, PcapNGReader};
use tracing::trace;

use crate::source::{PacketEvent, PacketSource, SourceError};

use super::layout;
use super::reader::{
    InterfaceInfo, interface_for, is_pcapng_magic, legacy_ts_to_seconds, pcapng_ts_to_seconds,
    read_magic_and_rewind,
};

/// Packet source over a `.pcap` or `.pcapng` file.
pub struct PcapFileSource {
    inner: CaptureReader<File>,
}

enum CaptureReader<R: Read> {
    Legacy {
        reader: LegacyPcapReader<R>,
        linktype: Linktype,
        nanosecond: bool,
    },
    Ng {
        reader: PcapNGReader<R>,
        interfaces: Vec<InterfaceInfo>,
    },
}

impl PcapFileSource {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let mut file = File::open(path)?;
        let magic = read_magic_and_rewind(&mut file)?;
        let inner = if is_pcapng_magic(&magic) {
            let reader = PcapNGReader::new(layout::PCAP_READER_BUFFER_SIZE, file)
                .map_err(|e| pcap_error("pcapng reader init", e))?;
            CaptureReader::Ng {
                reader,
                interfaces: Vec::new(),
            }
        } else {
            let reader = LegacyPcapReader::new(layout::PCAP_READER_BUFFER_SIZE, file)
                .map_err(|e| pcap_error("pcap reader init", e))?;
            CaptureReader::Legacy {
                reader,
                linktype: Linktype::ETHERNET,
                nanosecond: false,
            }
        };
        trace!(path = %path.display(), "opened capture");
        Ok(Self { inner })
    }
}

impl PacketSource for PcapFileSource {
    fn next_packet(&mut self) -> Result<Option<PacketEvent>, SourceError> {
        let event = match &mut self.inner {
            CaptureReader::Legacy {
                reader,
                linktype,
                nanosecond,
            } => {
                next_event(reader, &LEGACY, |block| match block {
                    PcapBlockOwned::LegacyHeader(header) => {
                        *linktype = header.network;
                        *nanosecond = header.is_nanosecond_precision();
                        None
                    }
                    PcapBlockOwned::Legacy(packet) => Some(PacketEvent {
                        ts: Some(legacy_ts_to_seconds(
                            packet.ts_sec,
                            packet.ts_usec,
                            *nanosecond,
                        )),
                        linktype: *linktype,
                        data: packet.data.to_vec(),
                    }),
                    _ => None,
                })?
            }
            CaptureReader::Ng { reader, interfaces } => {
                next_event(reader, &NG, |block| match block {
                    PcapBlockOwned::NG(Block::SectionHeader(_)) => {
                        interfaces.clear();
                        None
                    }
                    PcapBlockOwned::NG(Block::InterfaceDescription(intf)) => {
                        interfaces.push(InterfaceInfo {
                            linktype: intf.linktype,
                            ts_units: intf.ts_resolution().unwrap_or(layout::DEFAULT_TS_UNITS),
                            ts_offset: intf.ts_offset(),
                        });
                        None
                    }
                    PcapBlockOwned::NG(Block::EnhancedPacket(packet)) => {
                        let interface = interface_for(interfaces, packet.if_id);
                        Some(PacketEvent {
                            ts: Some(pcapng_ts_to_seconds(
                                packet.ts_high,
                                packet.ts_low,
                                &interface,
                            )),
                            linktype: interface.linktype,
                            data: packet.data.to_vec(),
                        })
                    }
                    PcapBlockOwned::NG(Block::SimplePacket(packet)) => Some(PacketEvent {
                        ts: None,
                        linktype: interface_for(interfaces, 0).linktype,
                        data: packet.data.to_vec(),
                    }),
                    _ => None,
                })?
            }
        };
        Ok(event)
    }
}

struct Contexts {
    refill: &'static str,
    next: &'static str,
}

const LEGACY: Contexts = Contexts {
    refill: "pcap reader refill",
    next: "pcap reader next",
};

const NG: Contexts = Contexts {
    refill: "pcapng reader refill",
    next: "pcapng reader next",
};

/// Advance `reader` until `on_block` yields an event or the file ends.
fn next_event<R, F>(
    reader: &mut R,
    contexts: &Contexts,
    mut on_block: F,
) -> Result<Option<PacketEvent>, SourceError>
where
    R: PcapReaderIterator,
    F: FnMut(PcapBlockOwned<'_>) -> Option<PacketEvent>,
{
    loop {
        match reader.next() {
            Ok((offset, block)) => {
                let event = on_block(block);
                reader.consume(offset);
                if event.is_some() {
                    return Ok(event);
                }
            }
            Err(PcapError::Eof) => return Ok(None),
            Err(PcapError::Incomplete(_)) => {
                reader
                    .refill()
                    .map_err(|e| pcap_error(contexts.refill, e))?;
            }
            Err(e) => return Err(pcap_error(contexts.next, e)),
        }
    }
}

fn pcap_error(context: &'static str, err: impl std::fmt::Display) -> SourceError {
    SourceError::Pcap {
        context,
        message: err.to_string(),
    }
}
