//! Capture builders shared by integration tests.
//!
//! Captures are generated into temporary files so the tests carry no binary
//! fixtures.
#![allow(dead_code)]

use std::fs;
use std::path::Path;

use etherparse::PacketBuilder;

pub const SERVER: [u8; 4] = [10, 0, 0, 1];
pub const CLIENT: [u8; 4] = [10, 0, 0, 2];
pub const SERVER_PORT: u16 = 5056;
pub const CLIENT_PORT: u16 = 50000;

const PCAPNG_SECTION_HEADER: u32 = 0x0A0D_0D0A;
const PCAPNG_INTERFACE_DESCRIPTION: u32 = 1;
const PCAPNG_ENHANCED_PACKET: u32 = 6;
const LINKTYPE_ETHERNET: u16 = 1;

/// One Ethernet frame with its capture time in microseconds.
pub struct CapturedPacket {
    pub ts_us: u64,
    pub data: Vec<u8>,
}

/// Ethernet/IPv4/UDP frame from `src` to `dst`.
pub fn udp_packet(
    ts_us: u64,
    src: ([u8; 4], u16),
    dst: ([u8; 4], u16),
    payload: &[u8],
) -> CapturedPacket {
    let builder = PacketBuilder::ethernet2([0x02, 0, 0, 0, 0, 0x01], [0x02, 0, 0, 0, 0, 0x02])
        .ipv4(src.0, dst.0, 64)
        .udp(src.1, dst.1);
    let mut data = Vec::with_capacity(builder.size(payload.len()));
    builder
        .write(&mut data, payload)
        .expect("write udp packet");
    CapturedPacket { ts_us, data }
}

/// Server-to-client datagram.
pub fn from_server(ts_us: u64, payload: &[u8]) -> CapturedPacket {
    udp_packet(ts_us, (SERVER, SERVER_PORT), (CLIENT, CLIENT_PORT), payload)
}

/// Photon datagram: 12-byte session header followed by `commands`.
pub fn photon_frame(commands: &[Vec<u8>]) -> Vec<u8> {
    let mut frame = Vec::new();
    frame.extend_from_slice(&1u16.to_be_bytes());
    frame.push(0);
    frame.push(commands.len() as u8);
    frame.extend_from_slice(&0x0102_0304u32.to_be_bytes());
    frame.extend_from_slice(&0i32.to_be_bytes());
    for command in commands {
        frame.extend_from_slice(command);
    }
    frame
}

/// Command with a 12-byte header whose length covers `body`.
pub fn command(type_tag: u8, sequence: i32, body: &[u8]) -> Vec<u8> {
    let mut out = vec![type_tag, 0, 0, 0];
    out.extend_from_slice(&(body.len() as i32 + 12).to_be_bytes());
    out.extend_from_slice(&sequence.to_be_bytes());
    out.extend_from_slice(body);
    out
}

/// Event message body with the given parameter triples already encoded.
pub fn event(code: u8, parameter_count: i16, parameters: &[u8]) -> Vec<u8> {
    let mut body = vec![0xf3, 0x04, code];
    body.extend_from_slice(&parameter_count.to_be_bytes());
    body.extend_from_slice(parameters);
    body
}

/// Operation request body with the given parameter triples already encoded.
pub fn request(code: u8, parameter_count: i16, parameters: &[u8]) -> Vec<u8> {
    let mut body = vec![0xf3, 0x02, code];
    body.extend_from_slice(&parameter_count.to_be_bytes());
    body.extend_from_slice(parameters);
    body
}

/// SendReliableFragment commands carrying `message` split into `parts`.
pub fn fragments(sequence: i32, message: &[u8], parts: usize) -> Vec<Vec<u8>> {
    let chunk = message.len().div_ceil(parts).max(1);
    let count = message.chunks(chunk).count() as i32;
    message
        .chunks(chunk)
        .enumerate()
        .map(|(number, data)| {
            let mut body = Vec::new();
            body.extend_from_slice(&sequence.to_be_bytes());
            body.extend_from_slice(&count.to_be_bytes());
            body.extend_from_slice(&(number as i32).to_be_bytes());
            body.extend_from_slice(&(message.len() as i32).to_be_bytes());
            body.extend_from_slice(&((number * chunk) as i32).to_be_bytes());
            body.extend_from_slice(data);
            command(8, sequence + number as i32, &body)
        })
        .collect()
}

pub fn write_pcapng(path: &Path, packets: &[CapturedPacket]) {
    write_pcapng_with_resolution(path, packets, None);
}

/// PCAPNG whose interface declares `if_tsresol = 10^-digits`; packet
/// timestamps are scaled to match.
pub fn write_pcapng_with_resolution(
    path: &Path,
    packets: &[CapturedPacket],
    digits: Option<u8>,
) {
    let units_per_us = 10u64.pow(u32::from(digits.unwrap_or(6)).saturating_sub(6));
    let mut output = Vec::new();
    output.extend_from_slice(&pcapng_block(PCAPNG_SECTION_HEADER, &section_header_body()));
    output.extend_from_slice(&pcapng_block(
        PCAPNG_INTERFACE_DESCRIPTION,
        &interface_desc_body(digits),
    ));
    for packet in packets {
        output.extend_from_slice(&pcapng_block(
            PCAPNG_ENHANCED_PACKET,
            &enhanced_packet_body(packet.ts_us * units_per_us, &packet.data),
        ));
    }
    fs::write(path, output).expect("write pcapng");
}

/// Classic little-endian `.pcap` with microsecond timestamps.
pub fn write_legacy_pcap(path: &Path, packets: &[CapturedPacket]) {
    write_legacy(path, packets, false);
}

/// Little-endian `.pcap` using the nanosecond magic.
pub fn write_legacy_pcap_nanos(path: &Path, packets: &[CapturedPacket]) {
    write_legacy(path, packets, true);
}

fn write_legacy(path: &Path, packets: &[CapturedPacket], nanosecond: bool) {
    let (magic, fraction_scale) = if nanosecond {
        (0xa1b2_3c4du32, 1_000)
    } else {
        (0xa1b2_c3d4u32, 1)
    };
    let mut output = Vec::new();
    output.extend_from_slice(&magic.to_le_bytes());
    output.extend_from_slice(&2u16.to_le_bytes());
    output.extend_from_slice(&4u16.to_le_bytes());
    output.extend_from_slice(&0i32.to_le_bytes());
    output.extend_from_slice(&0u32.to_le_bytes());
    output.extend_from_slice(&65535u32.to_le_bytes());
    output.extend_from_slice(&u32::from(LINKTYPE_ETHERNET).to_le_bytes());
    for packet in packets {
        let len = packet.data.len() as u32;
        output.extend_from_slice(&((packet.ts_us / 1_000_000) as u32).to_le_bytes());
        output.extend_from_slice(
            &((packet.ts_us % 1_000_000) as u32 * fraction_scale).to_le_bytes(),
        );
        output.extend_from_slice(&len.to_le_bytes());
        output.extend_from_slice(&len.to_le_bytes());
        output.extend_from_slice(&packet.data);
    }
    fs::write(path, output).expect("write pcap");
}

fn pcapng_block(block_type: u32, body: &[u8]) -> Vec<u8> {
    let total_len = (8 + body.len() + 4) as u32;
    let mut block = Vec::with_capacity(total_len as usize);
    block.extend_from_slice(&block_type.to_be_bytes());
    block.extend_from_slice(&total_len.to_be_bytes());
    block.extend_from_slice(body);
    block.extend_from_slice(&total_len.to_be_bytes());
    block
}

fn section_header_body() -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&0x1A2B_3C4Du32.to_be_bytes());
    body.extend_from_slice(&1u16.to_be_bytes());
    body.extend_from_slice(&0u16.to_be_bytes());
    body.extend_from_slice(&(-1i64).to_be_bytes());
    body
}

fn interface_desc_body(tsresol: Option<u8>) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&LINKTYPE_ETHERNET.to_be_bytes());
    body.extend_from_slice(&0u16.to_be_bytes());
    body.extend_from_slice(&65535u32.to_be_bytes());
    if let Some(tsresol) = tsresol {
        // if_tsresol, padded to 32 bits, then opt_endofopt
        body.extend_from_slice(&9u16.to_be_bytes());
        body.extend_from_slice(&1u16.to_be_bytes());
        body.extend_from_slice(&[tsresol, 0, 0, 0]);
        body.extend_from_slice(&0u16.to_be_bytes());
        body.extend_from_slice(&0u16.to_be_bytes());
    }
    body
}

fn enhanced_packet_body(ts: u64, data: &[u8]) -> Vec<u8> {
    let ts_high = (ts >> 32) as u32;
    let ts_low = ts as u32;
    let cap_len = data.len() as u32;
    let mut body = Vec::new();
    body.extend_from_slice(&0u32.to_be_bytes());
    body.extend_from_slice(&ts_high.to_be_bytes());
    body.extend_from_slice(&ts_low.to_be_bytes());
    body.extend_from_slice(&cap_len.to_be_bytes());
    body.extend_from_slice(&cap_len.to_be_bytes());
    body.extend_from_slice(data);
    let pad_len = (4 - (data.len() % 4)) % 4;
    body.extend(std::iter::repeat_n(0u8, pad_len));
    body
}
