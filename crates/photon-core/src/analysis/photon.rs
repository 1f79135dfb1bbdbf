use std::collections::{BTreeMap, HashMap};
use std::fmt;

use tracing::{debug, trace};

use crate::protocols::photon::{
    CommandType, Dialect, DialectKind, FragmentBuffer, RawCommand, as_reliable_fragment,
    as_reliable_message_with, parse_session_frame,
};
use crate::{FragmentSummary, MessageRecord, MessageSummary, PhotonSummary};

use super::flows::FlowKey;
use super::issues::{self, IssueLog};
use super::messages::MessageStats;
use super::{AnalysisConfig, ts_to_rfc3339};

/// Where a datagram was seen; used for issue examples and records.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DatagramContext {
    pub flow: FlowKey,
    pub ts: Option<f64>,
}

impl fmt::Display for DatagramContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.flow.src, self.flow.dst)?;
        if let Some(ts) = ts_to_rfc3339(self.ts) {
            write!(f, " @ {ts}")?;
        }
        Ok(())
    }
}

/// Everything the Photon layer contributes to a report.
pub(crate) struct PhotonOutcome {
    pub summary: PhotonSummary,
    pub messages: Vec<MessageSummary>,
    pub records: Vec<MessageRecord>,
    pub issues: IssueLog,
}

/// Stateful decoder for the Photon datagrams of one capture.
///
/// Each flow direction owns its own fragment cache.
pub(crate) struct PhotonDecoder {
    dialect_kind: DialectKind,
    ports: Vec<u16>,
    dialect: Dialect,
    include_parameters: bool,
    fragment_capacity: usize,
    buffers: HashMap<FlowKey, FragmentBuffer>,
    datagrams: u64,
    frames: u64,
    malformed_frames: u64,
    commands: BTreeMap<CommandType, u64>,
    unknown_commands: u64,
    fragments_received: u64,
    fragments_reassembled: u64,
    messages: MessageStats,
    records: Vec<MessageRecord>,
    issues: IssueLog,
}

impl PhotonDecoder {
    pub(crate) fn new(config: &AnalysisConfig) -> Self {
        Self {
            dialect_kind: config.dialect,
            ports: config.ports.clone(),
            dialect: config.dialect.dialect(),
            include_parameters: config.include_parameters,
            fragment_capacity: config.fragment_capacity,
            buffers: HashMap::new(),
            datagrams: 0,
            frames: 0,
            malformed_frames: 0,
            commands: BTreeMap::new(),
            unknown_commands: 0,
            fragments_received: 0,
            fragments_reassembled: 0,
            messages: MessageStats::default(),
            records: Vec::new(),
            issues: IssueLog::default(),
        }
    }

    pub(crate) fn decode_datagram(&mut self, ctx: &DatagramContext, payload: &[u8]) {
        self.datagrams += 1;
        let decoded = match parse_session_frame(payload) {
            Ok(decoded) => decoded,
            Err(err) => {
                self.malformed_frames += 1;
                debug!(context = %ctx, error = %err, "malformed photon frame");
                self.issues
                    .record(issues::FRAME_MALFORMED, || format!("{ctx}: {err}"));
                return;
            }
        };

        self.frames += 1;
        trace!(
            context = %ctx,
            peer_id = decoded.frame.peer_id,
            commands = decoded.frame.commands.len(),
            "decoded photon frame"
        );
        for command in &decoded.frame.commands {
            self.decode_command(ctx, command);
        }
    }

    fn decode_command(&mut self, ctx: &DatagramContext, command: &RawCommand) {
        let Some(command_type) = command.command_type() else {
            self.unknown_commands += 1;
            self.issues.record(issues::COMMAND_UNKNOWN, || {
                format!("{ctx}: type tag {}", command.type_tag)
            });
            return;
        };

        *self.commands.entry(command_type).or_default() += 1;
        match command_type {
            CommandType::SendReliable => self.decode_message(ctx, command, false),
            CommandType::SendReliableFragment => self.decode_fragment(ctx, command),
            _ => {}
        }
    }

    fn decode_fragment(&mut self, ctx: &DatagramContext, command: &RawCommand) {
        let fragment = match as_reliable_fragment(command) {
            Ok(fragment) => fragment,
            Err(err) => {
                debug!(context = %ctx, error = %err, "malformed photon fragment");
                self.issues
                    .record(issues::FRAGMENT_MALFORMED, || format!("{ctx}: {err}"));
                return;
            }
        };
        self.fragments_received += 1;

        let sequence = fragment.sequence_number;
        let number = fragment.fragment_number;
        let count = fragment.fragment_count;
        let capacity = self.fragment_capacity;
        let buffer = self
            .buffers
            .entry(ctx.flow)
            .or_insert_with(|| FragmentBuffer::with_capacity(capacity));
        let (rejected, evicted) = (buffer.rejected(), buffer.evicted());
        let assembled = buffer.offer(fragment);

        if buffer.rejected() > rejected {
            self.issues.record(issues::FRAGMENT_REJECTED, || {
                format!("{ctx}: sequence {sequence} fragment {number} of {count}")
            });
        }
        if buffer.evicted() > evicted {
            self.issues
                .record(issues::FRAGMENT_EVICTED, || format!("{ctx}: cache full"));
        }

        if let Some(command) = assembled {
            self.fragments_reassembled += 1;
            trace!(context = %ctx, sequence, bytes = command.data.len(), "reassembled message");
            self.decode_message(ctx, &command, true);
        }
    }

    fn decode_message(&mut self, ctx: &DatagramContext, command: &RawCommand, reassembled: bool) {
        let message = match as_reliable_message_with(command, &self.dialect) {
            Ok(message) => message,
            Err(err) => {
                debug!(context = %ctx, error = %err, "malformed photon message");
                self.issues
                    .record(issues::MESSAGE_MALFORMED, || format!("{ctx}: {err}"));
                return;
            }
        };
        self.messages.add(&message, reassembled);

        if !self.include_parameters {
            return;
        }

        let (parameters, parameter_error) = match message.parameters_with(&self.dialect) {
            Ok(parameters) => (parameters, None),
            Err(err) => {
                self.issues.record(issues::PARAMETERS_MALFORMED, || {
                    format!("{ctx}: {}", err.source)
                });
                let reason = err.to_string();
                (err.decoded, Some(reason))
            }
        };

        self.records.push(MessageRecord {
            ts: ts_to_rfc3339(ctx.ts),
            src: ctx.flow.src.to_string(),
            dst: ctx.flow.dst.to_string(),
            kind: message.message_kind.name().to_string(),
            code: message.code(),
            response_code: message.response_code,
            debug_message: message.debug_payload,
            reassembled,
            parameters,
            parameter_error,
        });
    }

    pub(crate) fn finish(self) -> PhotonOutcome {
        let mut fragments = FragmentSummary {
            received: self.fragments_received,
            reassembled: self.fragments_reassembled,
            ..FragmentSummary::default()
        };
        for buffer in self.buffers.values() {
            fragments.rejected += buffer.rejected();
            fragments.evicted += buffer.evicted();
            fragments.pending += buffer.len() as u64;
        }

        let summary = PhotonSummary {
            dialect: self.dialect_kind.name().to_string(),
            ports: self.ports,
            datagrams: self.datagrams,
            frames: self.frames,
            malformed_frames: self.malformed_frames,
            commands: self
                .commands
                .into_iter()
                .map(|(command_type, count)| (command_type.name().to_string(), count))
                .collect(),
            unknown_commands: self.unknown_commands,
            fragments,
        };

        PhotonOutcome {
            summary,
            messages: self.messages.into_summaries(),
            records: self.records,
            issues: self.issues,
        }
    }
}
