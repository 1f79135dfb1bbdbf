use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::{debug, info};

use crate::protocols::photon::{DialectKind, layout};
use crate::source::{PacketEvent, PacketSource, PcapFileSource, SourceError};
use crate::{CaptureSummary, DEFAULT_GENERATED_AT, Report, make_stub_report};

mod flows;
mod issues;
mod messages;
mod photon;
mod udp;

use flows::{FlowKey, FlowStats, add_flow_stats, build_flow_summaries};
use photon::{DatagramContext, PhotonDecoder};
use udp::parse_udp_packet;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Source error: {0}")]
    Source(#[from] SourceError),
}

/// Knobs for a capture analysis run.
///
/// # Examples
/// ```
/// use photon_core::{AnalysisConfig, DialectKind};
///
/// let config = AnalysisConfig {
///     dialect: DialectKind::Albion,
///     ..AnalysisConfig::default()
/// };
/// assert_eq!(config.ports, vec![5055, 5056]);
/// assert_eq!(config.fragment_capacity, 128);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// UDP ports treated as Photon traffic (source or destination).
    pub ports: Vec<u16>,
    /// Type-tag table used for parameter and debug payload decoding.
    pub dialect: DialectKind,
    /// Incomplete fragment sequences kept per flow before eviction.
    pub fragment_capacity: usize,
    /// Decode parameter tables and emit one record per message.
    pub include_parameters: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            ports: layout::DEFAULT_PORTS.to_vec(),
            dialect: DialectKind::default(),
            fragment_capacity: layout::DEFAULT_FRAGMENT_CAPACITY,
            include_parameters: false,
        }
    }
}

pub fn analyze_pcap_file(path: &Path, config: &AnalysisConfig) -> Result<Report, AnalysisError> {
    let source = PcapFileSource::open(path)?;
    analyze_source(path, source, config)
}

/// Run the Photon pipeline over every packet of `source`.
///
/// Malformed Photon traffic never aborts the run; it is counted and reported
/// as issues. Only source errors are returned.
pub fn analyze_source<S: PacketSource>(
    path: &Path,
    mut source: S,
    config: &AnalysisConfig,
) -> Result<Report, AnalysisError> {
    let mut packets_total = 0u64;
    let mut udp_packets = 0u64;
    let mut first_ts = None;
    let mut last_ts = None;
    let mut flow_stats: HashMap<FlowKey, FlowStats> = HashMap::new();
    let mut decoder = PhotonDecoder::new(config);

    while let Some(PacketEvent { ts, linktype, data }) = source.next_packet()? {
        packets_total += 1;
        update_ts_bounds(&mut first_ts, &mut last_ts, ts);
        let datagram = match parse_udp_packet(linktype, &data) {
            Ok(Some(datagram)) => datagram,
            Ok(None) => continue,
            Err(err) => {
                debug!(packet = packets_total, error = %err, "skipping undecodable packet");
                continue;
            }
        };
        udp_packets += 1;
        if !datagram.touches_any_port(&config.ports) {
            continue;
        }

        let ctx = DatagramContext {
            flow: FlowKey::of(&datagram),
            ts,
        };
        decoder.decode_datagram(&ctx, datagram.payload);
        add_flow_stats(&mut flow_stats, &datagram, ts);
    }

    let mut report = make_stub_report(&path.display().to_string(), path.metadata()?.len());
    report.capture_summary = Some(CaptureSummary {
        packets_total,
        udp_packets,
        time_start: ts_to_rfc3339(first_ts),
        time_end: ts_to_rfc3339(last_ts),
    });
    report.generated_at = report
        .capture_summary
        .as_ref()
        .and_then(|summary| summary.time_end.clone().or(summary.time_start.clone()))
        .unwrap_or_else(|| DEFAULT_GENERATED_AT.to_string());

    let outcome = decoder.finish();
    info!(
        packets = packets_total,
        datagrams = outcome.summary.datagrams,
        frames = outcome.summary.frames,
        "capture analyzed"
    );
    report.photon = outcome.summary;
    report.messages = outcome.messages;
    report.records = outcome.records;
    report.issues = outcome.issues.into_issues();
    report.flows = build_flow_summaries(flow_stats);
    Ok(report)
}

fn update_ts_bounds(first: &mut Option<f64>, last: &mut Option<f64>, ts: Option<f64>) {
    let Some(ts) = ts else {
        return;
    };
    if first.is_none_or(|existing| ts < existing) {
        *first = Some(ts);
    }
    if last.is_none_or(|existing| ts > existing) {
        *last = Some(ts);
    }
}

pub(crate) fn ts_to_rfc3339(ts: Option<f64>) -> Option<String> {
    let ts = ts?;
    let nanos = (ts * 1_000_000_000.0) as i128;
    OffsetDateTime::from_unix_timestamp_nanos(nanos)
        .ok()
        .and_then(|dt| dt.format(&Rfc3339).ok())
}
