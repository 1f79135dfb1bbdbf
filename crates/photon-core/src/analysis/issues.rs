use std::collections::HashMap;

use crate::Issue;

/// Examples kept per issue id.
const MAX_EXAMPLES: usize = 3;

pub(crate) const FRAME_MALFORMED: IssueKind = IssueKind {
    id: "PHOTON-FRAME-MALFORMED",
    severity: Severity::Error,
    message: "Datagram could not be framed as a Photon session",
};

pub(crate) const COMMAND_UNKNOWN: IssueKind = IssueKind {
    id: "PHOTON-COMMAND-UNKNOWN",
    severity: Severity::Warning,
    message: "Command carries an unknown type tag",
};

pub(crate) const MESSAGE_MALFORMED: IssueKind = IssueKind {
    id: "PHOTON-MESSAGE-MALFORMED",
    severity: Severity::Error,
    message: "Reliable message header could not be decoded",
};

pub(crate) const FRAGMENT_MALFORMED: IssueKind = IssueKind {
    id: "PHOTON-FRAGMENT-MALFORMED",
    severity: Severity::Error,
    message: "Reliable fragment header could not be decoded",
};

pub(crate) const FRAGMENT_REJECTED: IssueKind = IssueKind {
    id: "PHOTON-FRAGMENT-REJECTED",
    severity: Severity::Warning,
    message: "Fragment number lies outside its declared fragment count",
};

pub(crate) const FRAGMENT_EVICTED: IssueKind = IssueKind {
    id: "PHOTON-FRAGMENT-EVICTED",
    severity: Severity::Warning,
    message: "Incomplete fragment sequence evicted from the reassembly cache",
};

pub(crate) const PARAMETERS_MALFORMED: IssueKind = IssueKind {
    id: "PHOTON-PARAMETERS-MALFORMED",
    severity: Severity::Error,
    message: "Parameter table could not be fully decoded",
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Severity {
    Error,
    Warning,
}

impl Severity {
    fn label(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct IssueKind {
    pub id: &'static str,
    pub severity: Severity,
    pub message: &'static str,
}

#[derive(Debug)]
struct IssueStats {
    kind: IssueKind,
    count: u64,
    examples: Vec<String>,
}

/// Decode problems aggregated by id.
#[derive(Debug, Default)]
pub(crate) struct IssueLog {
    entries: HashMap<&'static str, IssueStats>,
}

impl IssueLog {
    pub(crate) fn record(&mut self, kind: IssueKind, example: impl FnOnce() -> String) {
        let entry = self.entries.entry(kind.id).or_insert_with(|| IssueStats {
            kind,
            count: 0,
            examples: Vec::new(),
        });
        entry.count += 1;
        if entry.examples.len() < MAX_EXAMPLES {
            entry.examples.push(example());
        }
    }

    /// Issues ordered by severity (errors first) then id.
    pub(crate) fn into_issues(self) -> Vec<Issue> {
        let mut entries: Vec<IssueStats> = self.entries.into_values().collect();
        entries.sort_by(|a, b| {
            a.kind
                .severity
                .cmp(&b.kind.severity)
                .then_with(|| a.kind.id.cmp(b.kind.id))
        });
        entries
            .into_iter()
            .map(|stats| Issue {
                id: stats.kind.id.to_string(),
                severity: stats.kind.severity.label().to_string(),
                message: stats.kind.message.to_string(),
                count: stats.count,
                examples: stats.examples,
            })
            .collect()
    }
}
