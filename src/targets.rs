//! Process-lifetime record of analysed targets.

use crate::http::TargetId;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

/// Lifecycle of a target in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetState {
    /// Claimed by a scan that has not finished yet.
    InFlight,
    /// Fully analysed.
    Done,
}

/// Thread-safe set of targets that have been (or are being) analysed.
///
/// Entries are never evicted. Claiming is atomic per target, so exactly one caller
/// wins the right to analyse a given target.
#[derive(Debug, Clone, Default)]
pub struct ProcessedTargets {
    targets: Arc<DashMap<TargetId, TargetState>>,
}

impl ProcessedTargets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `target` for analysis. Returns `false` when it was already claimed.
    pub fn claim(&self, target: &TargetId) -> bool {
        match self.targets.entry(target.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(TargetState::InFlight);
                true
            }
        }
    }

    /// Mark `target` as fully analysed. Idempotent.
    pub fn complete(&self, target: &TargetId) {
        self.targets.insert(target.clone(), TargetState::Done);
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Number of targets whose analysis has finished.
    pub fn completed(&self) -> usize {
        self.targets
            .iter()
            .filter(|entry| *entry.value() == TargetState::Done)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn target(url: &str) -> TargetId {
        TargetId::from_url(&Url::parse(url).unwrap())
    }

    #[test]
    fn test_claim_once() {
        let targets = ProcessedTargets::new();
        let t = target("https://example.com/app.js");

        assert!(targets.claim(&t));
        assert!(!targets.claim(&t));
        assert!(!targets.claim(&target("https://example.com/app.js?cache=bust")));
        assert_eq!(targets.len(), 1);
        assert_eq!(targets.completed(), 0);
    }

    #[test]
    fn test_complete_is_idempotent() {
        let targets = ProcessedTargets::new();
        let t = target("https://example.com/app.js");

        targets.claim(&t);
        targets.complete(&t);
        targets.complete(&t);

        assert_eq!(targets.len(), 1);
        assert_eq!(targets.completed(), 1);
        assert!(!targets.claim(&t));
    }

    #[test]
    fn test_clones_share_state() {
        let targets = ProcessedTargets::new();
        let other = targets.clone();
        assert!(targets.claim(&target("https://a.test/x.js")));
        assert!(!other.claim(&target("https://a.test/x.js")));
        assert!(!other.is_empty());
    }

    #[test]
    fn test_concurrent_claims_have_one_winner() {
        let targets = ProcessedTargets::new();
        let t = target("https://example.com/race.js");

        let winners: usize = std::thread::scope(|s| {
            let handles: Vec<_> = (0..16)
                .map(|_| s.spawn(|| targets.claim(&t) as usize))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).sum()
        });

        assert_eq!(winners, 1);
    }
}
