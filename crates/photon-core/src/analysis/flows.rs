use std::collections::HashMap;
use std::net::SocketAddr;

use crate::FlowSummary;

use super::udp::UdpDatagram;

/// One direction of a UDP conversation.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub(crate) struct FlowKey {
    pub src: SocketAddr,
    pub dst: SocketAddr,
}

impl FlowKey {
    pub(crate) fn of(datagram: &UdpDatagram<'_>) -> Self {
        Self {
            src: datagram.src,
            dst: datagram.dst,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub(crate) struct FlowStats {
    pub packets: u64,
    pub bytes: u64,
    pub first_ts: Option<f64>,
    pub last_ts: Option<f64>,
}

pub(crate) fn add_flow_stats(
    stats: &mut HashMap<FlowKey, FlowStats>,
    datagram: &UdpDatagram<'_>,
    ts: Option<f64>,
) {
    let entry = stats.entry(FlowKey::of(datagram)).or_default();
    entry.packets += 1;
    entry.bytes += datagram.payload.len() as u64;
    if let Some(ts) = ts {
        entry.first_ts = Some(entry.first_ts.map_or(ts, |first| first.min(ts)));
        entry.last_ts = Some(entry.last_ts.map_or(ts, |last| last.max(ts)));
    }
}

/// Flow summaries sorted by source then destination.
///
/// Rates are averaged over the flow's own active interval and omitted when
/// that interval is empty.
pub(crate) fn build_flow_summaries(stats: HashMap<FlowKey, FlowStats>) -> Vec<FlowSummary> {
    let mut flows: Vec<(FlowKey, FlowSummary)> = stats
        .into_iter()
        .map(|(key, stats)| {
            let (pps, bps) = match (stats.first_ts, stats.last_ts) {
                (Some(start), Some(end)) if end > start => {
                    let duration = end - start;
                    (
                        Some(stats.packets as f64 / duration),
                        Some(stats.bytes as f64 / duration),
                    )
                }
                _ => (None, None),
            };

            let summary = FlowSummary {
                app_proto: "photon".to_string(),
                src: key.src.to_string(),
                dst: key.dst.to_string(),
                packets: stats.packets,
                bytes: stats.bytes,
                pps,
                bps,
            };
            (key, summary)
        })
        .collect();

    flows.sort_by(|(a, _), (b, _)| a.src.cmp(&b.src).then_with(|| a.dst.cmp(&b.dst)));
    flows.into_iter().map(|(_, summary)| summary).collect()
}

#[cfg(test)]
mod tests {
    use super::{FlowKey, FlowStats, build_flow_summaries};
    use std::collections::HashMap;
    use std::net::SocketAddr;

    fn key(src: &str, dst: &str) -> FlowKey {
        FlowKey {
            src: src.parse::<SocketAddr>().unwrap(),
            dst: dst.parse::<SocketAddr>().unwrap(),
        }
    }

    #[test]
    fn summaries_are_sorted_and_no_duration_means_none_rates() {
        let mut stats = HashMap::new();
        stats.insert(
            key("10.0.0.2:1000", "10.0.0.3:5056"),
            FlowStats {
                packets: 10,
                bytes: 100,
                ..FlowStats::default()
            },
        );
        stats.insert(
            key("10.0.0.1:1000", "10.0.0.3:5056"),
            FlowStats {
                packets: 5,
                bytes: 50,
                first_ts: Some(1.0),
                last_ts: Some(1.0),
            },
        );

        let summaries = build_flow_summaries(stats);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].src, "10.0.0.1:1000");
        assert_eq!(summaries[1].src, "10.0.0.2:1000");
        assert!(summaries.iter().all(|flow| flow.pps.is_none() && flow.bps.is_none()));
        assert_eq!(summaries[1].packets, 10);
    }

    #[test]
    fn summaries_compute_rates_over_the_active_interval() {
        let mut stats = HashMap::new();
        stats.insert(
            key("10.0.0.1:5055", "10.0.0.2:40000"),
            FlowStats {
                packets: 10,
                bytes: 100,
                first_ts: Some(3.0),
                last_ts: Some(5.0),
            },
        );

        let summaries = build_flow_summaries(stats);
        let summary = &summaries[0];
        assert_eq!(summary.app_proto, "photon");
        assert_eq!(summary.pps, Some(5.0));
        assert_eq!(summary.bps, Some(50.0));
    }

    #[test]
    fn ipv6_endpoints_are_bracketed() {
        let mut stats = HashMap::new();
        stats.insert(key("[::1]:5055", "[::2]:40000"), FlowStats::default());
        let summaries = build_flow_summaries(stats);
        assert_eq!(summaries[0].src, "[::1]:5055");
    }
}
