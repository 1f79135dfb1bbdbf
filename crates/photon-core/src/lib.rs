//! Photon protocol decoding and offline capture analysis.
//!
//! The decoders in this crate turn captured Photon UDP payloads into
//! structured data: session frames and raw commands, reliable-message and
//! fragment headers, and the recursive typed-value grammar used for
//! parameter tables. A bounded cache reassembles fragmented messages.
//!
//! On top of the decoders sits an offline pipeline: packet sources feed the
//! analysis layer, which extracts UDP datagrams on the configured ports,
//! drives the decoders and aggregates the results into a deterministic
//! [`Report`]. Decoders are byte-oriented and side-effect free; all file
//! access lives in the `source` module.
//!
//! Invariants:
//! - No decoder reads past the end of its input or panics on malformed data.
//! - Report outputs are deterministic and stable across runs.
//! - Each UDP flow direction owns its own fragment cache.
//!
//! # Examples
//! ```no_run
//! use std::path::Path;
//!
//! use photon_core::{AnalysisConfig, analyze_pcap_file};
//!
//! let report = analyze_pcap_file(Path::new("capture.pcapng"), &AnalysisConfig::default())?;
//! println!("photon frames: {}", report.photon.frames);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Decoding a single value:
//! ```
//! use photon_core::{TypedValue, decode_value};
//!
//! let (value, rest) = decode_value(105, &[0x00, 0x00, 0x00, 0x80]).unwrap();
//! assert_eq!(value, TypedValue::Int32(128));
//! assert!(rest.is_empty());
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

mod analysis;
mod protocols;
mod source;

pub use analysis::{AnalysisConfig, AnalysisError, analyze_pcap_file, analyze_source};
pub use protocols::photon::{
    CommandError, CommandType, DecodedFrame, Dialect, DialectKind, FragmentBuffer, FrameError,
    MessageKind, PHOTON, ParameterError, ParameterTable, RawCommand, RawString,
    ReliableFragment, ReliableMessage, SessionFrame, TypedValue, ValueError, ValueRule,
    as_reliable_fragment, as_reliable_message, as_reliable_message_with, decode_parameters,
    decode_parameters_with, decode_value, decode_value_with, parse_session_frame,
};
pub use source::{PacketEvent, PacketSource, PcapFileSource, SourceError};

/// Current report schema version.
pub const REPORT_VERSION: u32 = 1;
/// Default timestamp used when no capture time is available.
pub const DEFAULT_GENERATED_AT: &str = "1970-01-01T00:00:00Z";

/// Aggregated analysis report with deterministic ordering.
///
/// # Examples
/// ```
/// use photon_core::make_stub_report;
///
/// let report = make_stub_report("capture.pcapng", 123);
/// assert_eq!(report.report_version, photon_core::REPORT_VERSION);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Report schema version (not the binary version).
    pub report_version: u32,
    pub tool: ToolInfo,
    /// RFC3339 timestamp; the last capture time when known.
    pub generated_at: String,
    pub input: InputInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capture_summary: Option<CaptureSummary>,
    pub photon: PhotonSummary,
    /// Message counts sorted by kind then code.
    pub messages: Vec<MessageSummary>,
    /// Photon flows sorted by source then destination.
    pub flows: Vec<FlowSummary>,
    /// Decode issues, errors first then by id.
    pub issues: Vec<Issue>,
    /// Per-message records in capture order; only filled on request.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub records: Vec<MessageRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputInfo {
    /// Input path as provided to the analyzer.
    pub path: String,
    /// Input size in bytes.
    pub bytes: u64,
}

/// Basic capture summary (timestamps may be absent).
///
/// # Examples
/// ```
/// use photon_core::CaptureSummary;
///
/// let summary = CaptureSummary {
///     packets_total: 10,
///     udp_packets: 8,
///     time_start: None,
///     time_end: None,
/// };
/// assert_eq!(summary.packets_total, 10);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureSummary {
    /// Total packet count observed in the capture.
    pub packets_total: u64,
    /// Packets that carried a UDP datagram, on any port.
    pub udp_packets: u64,
    /// RFC3339 timestamp of the first packet (if known).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_start: Option<String>,
    /// RFC3339 timestamp of the last packet (if known).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_end: Option<String>,
}

/// Photon-layer counters for a capture.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PhotonSummary {
    /// Dialect used for value decoding (`photon` or `albion`).
    pub dialect: String,
    /// Ports treated as Photon traffic.
    pub ports: Vec<u16>,
    /// UDP datagrams on Photon ports.
    pub datagrams: u64,
    /// Datagrams that framed successfully.
    pub frames: u64,
    pub malformed_frames: u64,
    /// Command counts keyed by command type name.
    pub commands: BTreeMap<String, u64>,
    pub unknown_commands: u64,
    pub fragments: FragmentSummary,
}

/// Fragment reassembly counters, summed over all flows.
///
/// # Examples
/// ```
/// use photon_core::FragmentSummary;
///
/// let fragments = FragmentSummary { received: 3, reassembled: 1, ..FragmentSummary::default() };
/// assert_eq!(fragments.pending, 0);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FragmentSummary {
    pub received: u64,
    /// Complete messages rebuilt from fragments.
    pub reassembled: u64,
    /// Fragments dropped because they could never complete.
    pub rejected: u64,
    /// Incomplete sequences dropped when a cache was full.
    pub evicted: u64,
    /// Incomplete sequences still cached at the end of the capture.
    pub pending: u64,
}

/// Counts for one message kind and code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageSummary {
    /// `operation_request`, `operation_response` or `event_data`.
    pub kind: String,
    /// Operation code, or event code for events.
    pub code: u8,
    pub count: u64,
    /// How many of `count` were rebuilt from fragments.
    pub reassembled: u64,
    /// Total size of the undecoded parameter tables.
    pub parameter_bytes: u64,
}

/// Flow-level summary for a UDP endpoint pair.
///
/// # Examples
/// ```
/// use photon_core::FlowSummary;
///
/// let flow = FlowSummary {
///     app_proto: "photon".to_string(),
///     src: "192.168.0.1:5056".to_string(),
///     dst: "192.168.0.2:50000".to_string(),
///     packets: 2,
///     bytes: 64,
///     pps: None,
///     bps: None,
/// };
/// assert_eq!(flow.app_proto, "photon");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowSummary {
    pub app_proto: String,
    /// Source endpoint in `ip:port` form.
    pub src: String,
    /// Destination endpoint in `ip:port` form.
    pub dst: String,
    pub packets: u64,
    /// UDP payload bytes.
    pub bytes: u64,
    /// Packets per second over the flow's active interval.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pps: Option<f64>,
    /// Bytes per second over the flow's active interval.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bps: Option<f64>,
}

/// Aggregated decode issue.
///
/// # Examples
/// ```
/// use photon_core::Issue;
///
/// let issue = Issue {
///     id: "PHOTON-FRAME-MALFORMED".to_string(),
///     severity: "error".to_string(),
///     message: "Datagram could not be framed as a Photon session".to_string(),
///     count: 1,
///     examples: vec!["10.0.0.1:5055 -> 10.0.0.2:50000 @ 1970-01-01T00:00:00Z".to_string()],
/// };
/// assert_eq!(issue.count, 1);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    /// Stable identifier (e.g., `PHOTON-FRAGMENT-EVICTED`).
    pub id: String,
    /// `error` or `warning`.
    pub severity: String,
    pub message: String,
    pub count: u64,
    /// At most three examples, formatted as `src -> dst @ ts: detail`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
}

/// One decoded reliable message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ts: Option<String>,
    pub src: String,
    pub dst: String,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_code: Option<u16>,
    /// Debug payload of operation responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_message: Option<TypedValue>,
    pub reassembled: bool,
    /// Decoded parameters; partial when `parameter_error` is set.
    pub parameters: ParameterTable,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter_error: Option<String>,
}

/// Build a stub report with base fields filled and empty aggregates.
///
/// # Examples
/// ```
/// use photon_core::make_stub_report;
///
/// let report = make_stub_report("capture.pcapng", 123);
/// assert_eq!(report.input.bytes, 123);
/// assert!(report.messages.is_empty());
/// ```
pub fn make_stub_report(input_path: &str, input_bytes: u64) -> Report {
    Report {
        report_version: REPORT_VERSION,
        tool: ToolInfo {
            name: "photon-spectator".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        generated_at: DEFAULT_GENERATED_AT.to_string(),
        input: InputInfo {
            path: input_path.to_string(),
            bytes: input_bytes,
        },
        capture_summary: None,
        photon: PhotonSummary::default(),
        messages: vec![],
        flows: vec![],
        issues: vec![],
        records: vec![],
    }
}
