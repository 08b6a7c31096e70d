//! Peer matching across representations
//!
//! Two collections describing the same interface may disagree on public keys
//! (a re-keyed peer), on names (the merged config carries none), or on the
//! formatting of allowed IPs. The [`Matcher`] pairs records that represent the
//! same peer by trying an ordered list of [`MatchStrategy`] tiers.
//!
//! Tiers are the outer loop and candidates the inner one: a public-key match
//! on a late candidate beats a name match on an early one.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::model::PeerView;
use crate::normalize::normalize_allowed_ips;

static AUTO_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^peer\d+$").expect("Invalid auto-name regex"));

/// True for placeholder names like `peer3`, which carry no identity.
pub fn is_auto_generated_name(name: &str) -> bool {
    AUTO_NAME.is_match(name)
}

/// Which rule paired two records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    PublicKey,
    Name,
    AllowedIps,
}

/// One matching rule.
pub trait MatchStrategy: Send + Sync {
    fn tier(&self) -> MatchTier;

    /// Whether `candidate` represents the same peer as `target` under this rule.
    fn matches(&self, target: &dyn PeerView, candidate: &dyn PeerView) -> bool;
}

/// Exact, case-sensitive public key equality. Empty keys never match.
#[derive(Debug, Default)]
pub struct PublicKeyStrategy;

impl MatchStrategy for PublicKeyStrategy {
    fn tier(&self) -> MatchTier {
        MatchTier::PublicKey
    }

    fn matches(&self, target: &dyn PeerView, candidate: &dyn PeerView) -> bool {
        !target.public_key().is_empty() && target.public_key() == candidate.public_key()
    }
}

/// Exact name equality, ignoring absent, empty and auto-generated names.
#[derive(Debug, Default)]
pub struct NameStrategy;

impl MatchStrategy for NameStrategy {
    fn tier(&self) -> MatchTier {
        MatchTier::Name
    }

    fn matches(&self, target: &dyn PeerView, candidate: &dyn PeerView) -> bool {
        match (target.name(), candidate.name()) {
            (Some(a), Some(b)) => {
                !a.is_empty() && a == b && !is_auto_generated_name(a) && !is_auto_generated_name(b)
            }
            _ => false,
        }
    }
}

/// Equality of normalized allowed-IP sets. An empty target set never matches.
#[derive(Debug, Default)]
pub struct AllowedIpsStrategy;

impl MatchStrategy for AllowedIpsStrategy {
    fn tier(&self) -> MatchTier {
        MatchTier::AllowedIps
    }

    fn matches(&self, target: &dyn PeerView, candidate: &dyn PeerView) -> bool {
        let wanted = normalize_allowed_ips(target.allowed_ips());
        !wanted.is_empty() && wanted == normalize_allowed_ips(candidate.allowed_ips())
    }
}

/// A record from the target side paired with a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchedPair {
    pub target: usize,
    pub candidate: usize,
    pub tier: MatchTier,
}

/// Result of a full 1:1 pairing pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pairing {
    /// Candidate index (and tier) for each target, in target order.
    pub by_target: Vec<Option<(usize, MatchTier)>>,
    /// Candidates no target consumed, in candidate order.
    pub unmatched_candidates: Vec<usize>,
}

impl Pairing {
    pub fn pairs(&self) -> impl Iterator<Item = MatchedPair> + '_ {
        self.by_target.iter().enumerate().filter_map(|(target, found)| {
            found.map(|(candidate, tier)| MatchedPair {
                target,
                candidate,
                tier,
            })
        })
    }
}

/// Ordered list of matching tiers.
pub struct Matcher {
    strategies: Vec<Box<dyn MatchStrategy>>,
}

impl Default for Matcher {
    /// Public key, then name, then allowed IPs.
    fn default() -> Self {
        Self::new(vec![
            Box::new(PublicKeyStrategy),
            Box::new(NameStrategy),
            Box::new(AllowedIpsStrategy),
        ])
    }
}

impl std::fmt::Debug for Matcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tiers: Vec<_> = self.strategies.iter().map(|s| s.tier()).collect();
        f.debug_struct("Matcher").field("tiers", &tiers).finish()
    }
}

impl Matcher {
    pub fn new(strategies: Vec<Box<dyn MatchStrategy>>) -> Self {
        Self { strategies }
    }

    /// Find the first unconsumed candidate matching `target`.
    ///
    /// `consumed` is indexed like `candidates`; entries set to `true` are skipped.
    pub fn find_match<T, C>(
        &self,
        target: &T,
        candidates: &[C],
        consumed: &[bool],
    ) -> Option<(usize, MatchTier)>
    where
        T: PeerView,
        C: PeerView,
    {
        for strategy in &self.strategies {
            for (index, candidate) in candidates.iter().enumerate() {
                if consumed.get(index).copied().unwrap_or(false) {
                    continue;
                }
                if strategy.matches(target, candidate) {
                    return Some((index, strategy.tier()));
                }
            }
        }
        None
    }

    /// Pair every target with at most one candidate, each candidate used once.
    pub fn pair<T, C>(&self, targets: &[T], candidates: &[C]) -> Pairing
    where
        T: PeerView,
        C: PeerView,
    {
        let mut consumed = vec![false; candidates.len()];
        let by_target = targets
            .iter()
            .map(|target| {
                let found = self.find_match(target, candidates, &consumed);
                if let Some((index, _)) = found {
                    consumed[index] = true;
                }
                found
            })
            .collect();

        let unmatched_candidates = consumed
            .iter()
            .enumerate()
            .filter(|(_, used)| !**used)
            .map(|(index, _)| index)
            .collect();

        Pairing {
            by_target,
            unmatched_candidates,
        }
    }
}
