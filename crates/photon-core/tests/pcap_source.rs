use std::fs;

use pcap_parser::Linktype;
use photon_core::{PacketSource, PcapFileSource, SourceError};

mod support;

use support::{
    from_server, photon_frame, write_legacy_pcap, write_legacy_pcap_nanos, write_pcapng,
    write_pcapng_with_resolution,
};

fn drain(source: &mut PcapFileSource) -> Vec<photon_core::PacketEvent> {
    let mut events = Vec::new();
    while let Some(event) = source.next_packet().unwrap() {
        events.push(event);
    }
    events
}

fn assert_ts(ts: Option<f64>, expected: f64) {
    let ts = ts.expect("timestamp");
    assert!((ts - expected).abs() < 1e-9, "ts {ts} != {expected}");
}

#[test]
fn pcapng_source_yields_every_packet() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("capture.pcapng");
    let payload = photon_frame(&[]);
    write_pcapng(
        &path,
        &[from_server(1_000_000, &payload), from_server(2_500_000, &payload)],
    );

    let mut source = PcapFileSource::open(&path).unwrap();
    let events = drain(&mut source);

    assert_eq!(events.len(), 2);
    assert_eq!(events[0].linktype, Linktype::ETHERNET);
    assert_ts(events[0].ts, 1.0);
    assert_ts(events[1].ts, 2.5);
}

#[test]
fn legacy_pcap_source_yields_every_packet() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("capture.pcap");
    let payload = photon_frame(&[]);
    write_legacy_pcap(&path, &[from_server(3_250_000, &payload)]);

    let mut source = PcapFileSource::open(&path).unwrap();
    let events = drain(&mut source);

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].linktype, Linktype::ETHERNET);
    assert_ts(events[0].ts, 3.25);
}

#[test]
fn nanosecond_legacy_pcap_keeps_fraction() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nanos.pcap");
    write_legacy_pcap_nanos(&path, &[from_server(3_250_000, &photon_frame(&[]))]);

    let mut source = PcapFileSource::open(&path).unwrap();
    let events = drain(&mut source);

    assert_eq!(events.len(), 1);
    assert_ts(events[0].ts, 3.25);
}

#[test]
fn pcapng_honors_interface_resolution() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nanos.pcapng");
    write_pcapng_with_resolution(
        &path,
        &[from_server(1_500_000, &photon_frame(&[]))],
        Some(9),
    );

    let mut source = PcapFileSource::open(&path).unwrap();
    let events = drain(&mut source);

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].linktype, Linktype::ETHERNET);
    assert_ts(events[0].ts, 1.5);
}

#[test]
fn pcap_source_rejects_truncated_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("truncated.pcapng");
    fs::write(&path, [0x0a, 0x0d, 0x0d]).unwrap();

    let err = match PcapFileSource::open(&path) {
        Ok(_) => panic!("expected truncated file to be rejected"),
        Err(err) => err,
    };
    assert!(matches!(err, SourceError::Io(_)));
}

#[test]
fn pcap_source_rejects_garbage() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("garbage.pcap");
    fs::write(&path, [0u8; 64]).unwrap();

    let err = match PcapFileSource::open(&path) {
        Ok(_) => panic!("expected garbage to be rejected"),
        Err(err) => err,
    };
    assert!(matches!(err, SourceError::Pcap { .. }));
}
