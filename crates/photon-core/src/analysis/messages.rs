use std::collections::HashMap;

use crate::MessageSummary;
use crate::protocols::photon::{MessageKind, ReliableMessage};

#[derive(Debug, Default, Clone)]
pub(crate) struct MessageCounters {
    pub count: u64,
    pub reassembled: u64,
    pub parameter_bytes: u64,
}

/// Message counts keyed by kind and operation/event code.
#[derive(Debug, Default)]
pub(crate) struct MessageStats {
    entries: HashMap<(MessageKind, u8), MessageCounters>,
}

impl MessageStats {
    pub(crate) fn add(&mut self, message: &ReliableMessage, reassembled: bool) {
        let Some(code) = message.code() else {
            return;
        };
        let entry = self
            .entries
            .entry((message.message_kind, code))
            .or_default();
        entry.count += 1;
        entry.parameter_bytes += message.parameter_data.len() as u64;
        if reassembled {
            entry.reassembled += 1;
        }
    }

    pub(crate) fn into_summaries(self) -> Vec<MessageSummary> {
        let mut entries: Vec<_> = self.entries.into_iter().collect();
        entries.sort_by_key(|((kind, code), _)| (*kind, *code));
        entries
            .into_iter()
            .map(|((kind, code), counters)| MessageSummary {
                kind: kind.name().to_string(),
                code,
                count: counters.count,
                reassembled: counters.reassembled,
                parameter_bytes: counters.parameter_bytes,
            })
            .collect()
    }
}
