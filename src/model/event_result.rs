use serde::{Deserialize, Serialize};

use crate::model::directive::DirectiveKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ApplyOutcome {
    Applied,
    Rejected { reason: String },
    Deferred { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectiveResult {
    pub kind: DirectiveKind,
    pub outcome: ApplyOutcome,
}

/// One result per directive, in the order the directives were applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplyReport {
    pub results: Vec<DirectiveResult>,
}

impl ApplyReport {
    pub fn push(&mut self, kind: DirectiveKind, outcome: ApplyOutcome) {
        self.results.push(DirectiveResult { kind, outcome });
    }

    pub fn applied(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.outcome == ApplyOutcome::Applied)
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.results.len() - self.applied()
    }
}
