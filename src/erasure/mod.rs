//! Erasure coding implementations
//!
//! This module provides the two schemes being compared, flat Reed-Solomon
//! and Local Reconstruction Codes, together with the pieces they are built
//! from: the fragmenter, XOR local parity groups, the global parity codec
//! and the repair planner that decides how a given erasure pattern is
//! repaired.

pub mod flat_rs;
pub mod fragmenter;
pub mod global_parity;
pub mod local_parity;
pub mod lrc;
pub mod planner;

#[cfg(test)]
mod proptest;

pub use flat_rs::FlatRs;
pub use global_parity::{GlobalParityCodec, LinearErasureCode, ReedSolomonCode};
pub use local_parity::LocalParityGroup;
pub use lrc::Lrc;
pub use planner::{RepairPlan, RepairPlanner, RepairStrategy};

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::ops::Range;

/// Role of a fragment inside the encoded layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FragmentKind {
    /// A slice of the original payload
    Data,
    /// XOR parity over one group of data fragments
    LocalParity { group: usize },
    /// Parity produced by the linear code over all data fragments
    GlobalParity,
}

impl std::fmt::Display for FragmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FragmentKind::Data => write!(f, "data"),
            FragmentKind::LocalParity { group } => write!(f, "local parity (group {})", group),
            FragmentKind::GlobalParity => write!(f, "global parity"),
        }
    }
}

/// One unit of encoded output.
///
/// Every fragment produced by a single `encode` call has the same length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    /// Position in the scheme layout, also the node it is stored on
    pub index: usize,
    pub kind: FragmentKind,
    pub bytes: Vec<u8>,
}

impl Fragment {
    pub fn new(index: usize, kind: FragmentKind, bytes: Vec<u8>) -> Self {
        Self { index, kind, bytes }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Which of the two compared schemes a configuration describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchemeKind {
    FlatRs,
    Lrc,
}

impl std::fmt::Display for SchemeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemeKind::FlatRs => write!(f, "Reed-Solomon (RS)"),
            SchemeKind::Lrc => write!(f, "Local Reconstruction Code (LRC)"),
        }
    }
}

/// Parameters of one erasure scheme.
///
/// Layout of the encoded fragments:
/// `[data(0..k) | local_parity(0..num_groups) | global_parity(0..global_parity_count)]`.
/// Flat RS has no groups, so its layout is `[data | parity]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemeConfig {
    pub kind: SchemeKind,
    /// Number of data fragments
    pub k: usize,
    /// Data fragments per local group (0 for flat RS)
    pub group_size: usize,
    /// Local parity fragments per group (0 for flat RS)
    pub local_parity_count: usize,
    /// Fragments produced by the linear code over all data
    pub global_parity_count: usize,
}

impl SchemeConfig {
    /// Flat Reed-Solomon with `k` data and `r` parity fragments
    pub fn flat_rs(k: usize, r: usize) -> Self {
        Self {
            kind: SchemeKind::FlatRs,
            k,
            group_size: 0,
            local_parity_count: 0,
            global_parity_count: r,
        }
    }

    /// Local Reconstruction Code
    pub fn lrc(
        k: usize,
        group_size: usize,
        local_parity_count: usize,
        global_parity_count: usize,
    ) -> Self {
        Self {
            kind: SchemeKind::Lrc,
            k,
            group_size,
            local_parity_count,
            global_parity_count,
        }
    }

    pub fn num_groups(&self) -> usize {
        match self.kind {
            SchemeKind::FlatRs => 0,
            SchemeKind::Lrc if self.group_size == 0 => 0,
            SchemeKind::Lrc => self.k.div_ceil(self.group_size),
        }
    }

    pub fn local_parity_total(&self) -> usize {
        self.num_groups() * self.local_parity_count
    }

    pub fn total_fragments(&self) -> usize {
        self.k + self.local_parity_total() + self.global_parity_count
    }

    /// Group that data fragment `index` belongs to
    pub fn group_of(&self, index: usize) -> Option<usize> {
        if self.kind != SchemeKind::Lrc || self.group_size == 0 || index >= self.k {
            return None;
        }
        Some(index / self.group_size)
    }

    /// Data indices covered by `group`; the last group may be short
    pub fn group_members(&self, group: usize) -> Range<usize> {
        let start = (group * self.group_size).min(self.k);
        let end = (start + self.group_size).min(self.k);
        start..end
    }

    /// Layout position of the local parity for `group`
    pub fn local_parity_index(&self, group: usize) -> usize {
        self.k + group * self.local_parity_count
    }

    /// Layout positions of the global parity fragments
    pub fn global_parity_range(&self) -> Range<usize> {
        let start = self.k + self.local_parity_total();
        start..start + self.global_parity_count
    }

    /// Kind of the fragment stored at layout position `index`
    pub fn kind_of(&self, index: usize) -> Option<FragmentKind> {
        if index < self.k {
            Some(FragmentKind::Data)
        } else if index < self.k + self.local_parity_total() {
            let group = (index - self.k) / self.local_parity_count.max(1);
            Some(FragmentKind::LocalParity { group })
        } else if self.global_parity_range().contains(&index) {
            Some(FragmentKind::GlobalParity)
        } else {
            None
        }
    }

    /// Check the scheme can be encoded and placed on `num_nodes` nodes.
    pub fn validate(&self, num_nodes: usize) -> Result<()> {
        if self.k == 0 {
            return Err(Error::Configuration(
                "data fragment count must be greater than 0".into(),
            ));
        }
        if self.global_parity_count == 0 {
            return Err(Error::Configuration(format!(
                "{} needs at least one global parity fragment",
                self.kind
            )));
        }
        if self.kind == SchemeKind::Lrc {
            if self.group_size == 0 {
                return Err(Error::Configuration(
                    "LRC group size must be greater than 0".into(),
                ));
            }
            // Local groups carry a single XOR parity.
            if self.local_parity_count != 1 {
                return Err(Error::Configuration(format!(
                    "LRC supports exactly one local parity per group, got {}",
                    self.local_parity_count
                )));
            }
        }
        if self.k + self.global_parity_count > global_parity::MAX_SHARDS {
            return Err(Error::Configuration(format!(
                "{} data + {} global parity exceeds the GF(256) limit of {} shards",
                self.k,
                self.global_parity_count,
                global_parity::MAX_SHARDS
            )));
        }
        let total = self.total_fragments();
        if total > num_nodes {
            return Err(Error::Configuration(format!(
                "{} requires {} fragments but only {} nodes are available",
                self.kind, total, num_nodes
            )));
        }
        Ok(())
    }
}

impl std::fmt::Display for SchemeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            SchemeKind::FlatRs => write!(f, "RS({}, {})", self.k, self.global_parity_count),
            SchemeKind::Lrc => write!(
                f,
                "LRC(k={}, groups={}x{}, local={}, global={})",
                self.k,
                self.num_groups(),
                self.group_size,
                self.local_parity_count,
                self.global_parity_count
            ),
        }
    }
}

/// Data fragments rebuilt by a scheme, along with the plan that produced them
#[derive(Debug, Clone)]
pub struct Reconstruction {
    /// The `k` data fragments, padding included
    pub data: Vec<Vec<u8>>,
    pub plan: RepairPlan,
}

/// Trait for erasure coding schemes
pub trait ErasureScheme: Send + Sync {
    /// Parameters this scheme was built with
    fn config(&self) -> &SchemeConfig;

    /// Split `payload` into data fragments and append the parity fragments
    fn encode(&self, payload: &[u8]) -> Result<Vec<Fragment>>;

    /// Rebuild the data fragments from the surviving ones.
    ///
    /// `fragments` is indexed by layout position; `None` marks an erasure.
    fn reconstruct(&self, fragments: &[Option<Fragment>]) -> Result<Reconstruction>;

    fn name(&self) -> String {
        self.config().kind.to_string()
    }

    fn total_fragments(&self) -> usize {
        self.config().total_fragments()
    }

    /// Repair decision for an erasure pattern, without touching any bytes
    fn plan(&self, erased: &BTreeSet<usize>) -> RepairPlan {
        RepairPlanner::new(self.config()).plan(erased)
    }

    /// Reconstruct the payload, stripping trailing zero padding
    fn decode(&self, fragments: &[Option<Fragment>]) -> Result<Vec<u8>> {
        let reconstruction = self.reconstruct(fragments)?;
        Ok(fragmenter::join(&reconstruction.data))
    }

    /// Reconstruct the payload using a caller-carried payload length, which
    /// keeps trailing zero bytes that `decode` would strip
    fn decode_exact(&self, fragments: &[Option<Fragment>], payload_len: usize) -> Result<Vec<u8>> {
        let reconstruction = self.reconstruct(fragments)?;
        fragmenter::join_exact(&reconstruction.data, payload_len)
    }
}

/// Build the scheme described by `config`, backed by Reed-Solomon over GF(256)
pub fn create_scheme(config: &SchemeConfig) -> Result<Box<dyn ErasureScheme>> {
    match config.kind {
        SchemeKind::FlatRs => Ok(Box::new(FlatRs::new(*config)?)),
        SchemeKind::Lrc => Ok(Box::new(Lrc::new(*config)?)),
    }
}

/// Indices of erased positions in a fragment slice
pub fn erasure_pattern(fragments: &[Option<Fragment>]) -> BTreeSet<usize> {
    fragments
        .iter()
        .enumerate()
        .filter(|(_, f)| f.is_none())
        .map(|(i, _)| i)
        .collect()
}

/// Check a fragment slice matches the layout of `config` and return the
/// common fragment size, `None` when every slot is erased
pub(crate) fn check_layout(
    config: &SchemeConfig,
    fragments: &[Option<Fragment>],
) -> Result<Option<usize>> {
    let total = config.total_fragments();
    if fragments.len() != total {
        return Err(Error::Configuration(format!(
            "expected {} fragment slots for {}, got {}",
            total,
            config,
            fragments.len()
        )));
    }

    let mut size = None;
    for (position, fragment) in fragments.iter().enumerate() {
        let Some(fragment) = fragment else { continue };
        if fragment.index != position {
            return Err(Error::Configuration(format!(
                "fragment {} found in slot {}",
                fragment.index, position
            )));
        }
        match config.kind_of(position) {
            Some(kind) if kind == fragment.kind => {}
            expected => {
                return Err(Error::Configuration(format!(
                    "fragment {} is labelled {} but {} expects {}",
                    position,
                    fragment.kind,
                    config,
                    expected.map_or_else(|| "no fragment".to_string(), |k| k.to_string())
                )))
            }
        }
        match size {
            None => size = Some(fragment.len()),
            Some(s) if s != fragment.len() => {
                return Err(Error::Configuration(format!(
                    "fragment {} is {} bytes, expected {}",
                    position,
                    fragment.len(),
                    s
                )))
            }
            Some(_) => {}
        }
    }

    Ok(size)
}

/// Turn data and parity buffers into fragments following the layout
pub(crate) fn assemble(config: &SchemeConfig, buffers: Vec<Vec<u8>>) -> Vec<Fragment> {
    buffers
        .into_iter()
        .enumerate()
        .map(|(index, bytes)| {
            let kind = config.kind_of(index).unwrap_or(FragmentKind::GlobalParity);
            Fragment::new(index, kind, bytes)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lrc_derived_counts() {
        let config = SchemeConfig::lrc(6, 3, 1, 2);
        assert_eq!(config.num_groups(), 2);
        assert_eq!(config.total_fragments(), 10);
        assert_eq!(config.local_parity_index(0), 6);
        assert_eq!(config.local_parity_index(1), 7);
        assert_eq!(config.global_parity_range(), 8..10);
    }

    #[test]
    fn test_lrc_uneven_groups() {
        let config = SchemeConfig::lrc(7, 3, 1, 2);
        assert_eq!(config.num_groups(), 3);
        assert_eq!(config.group_members(2), 6..7);
        assert_eq!(config.group_of(6), Some(2));
        assert_eq!(config.total_fragments(), 12);
    }

    #[test]
    fn test_flat_rs_has_no_groups() {
        let config = SchemeConfig::flat_rs(6, 3);
        assert_eq!(config.num_groups(), 0);
        assert_eq!(config.total_fragments(), 9);
        assert_eq!(config.group_of(0), None);
        assert_eq!(config.global_parity_range(), 6..9);
    }

    #[test]
    fn test_kind_of_layout() {
        let config = SchemeConfig::lrc(6, 3, 1, 2);
        assert_eq!(config.kind_of(0), Some(FragmentKind::Data));
        assert_eq!(config.kind_of(7), Some(FragmentKind::LocalParity { group: 1 }));
        assert_eq!(config.kind_of(9), Some(FragmentKind::GlobalParity));
        assert_eq!(config.kind_of(10), None);
    }

    #[test]
    fn test_validate_rejects_too_few_nodes() {
        let config = SchemeConfig::lrc(6, 3, 1, 2);
        assert!(config.validate(10).is_ok());
        assert!(matches!(config.validate(9), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_validate_rejects_bad_parameters() {
        assert!(SchemeConfig::flat_rs(0, 2).validate(10).is_err());
        assert!(SchemeConfig::flat_rs(4, 0).validate(10).is_err());
        assert!(SchemeConfig::lrc(6, 0, 1, 2).validate(10).is_err());
        assert!(SchemeConfig::lrc(6, 3, 2, 2).validate(20).is_err());
        assert!(SchemeConfig::flat_rs(250, 10).validate(300).is_err());
    }

    #[test]
    fn test_check_layout_rejects_wrong_slot_count() {
        let config = SchemeConfig::flat_rs(2, 1);
        let fragments = vec![Some(Fragment::new(0, FragmentKind::Data, vec![1]))];
        assert!(matches!(
            check_layout(&config, &fragments),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_check_layout_rejects_mismatched_sizes() {
        let config = SchemeConfig::flat_rs(2, 1);
        let fragments = vec![
            Some(Fragment::new(0, FragmentKind::Data, vec![1, 2])),
            Some(Fragment::new(1, FragmentKind::Data, vec![1])),
            None,
        ];
        assert!(check_layout(&config, &fragments).is_err());
    }

    #[test]
    fn test_check_layout_rejects_relabelled_kind() {
        let config = SchemeConfig::lrc(2, 2, 1, 1);
        let mut fragments = vec![
            Some(Fragment::new(0, FragmentKind::Data, vec![1])),
            Some(Fragment::new(1, FragmentKind::Data, vec![2])),
            Some(Fragment::new(2, FragmentKind::LocalParity { group: 0 }, vec![3])),
            Some(Fragment::new(3, FragmentKind::GlobalParity, vec![4])),
        ];
        assert_eq!(check_layout(&config, &fragments).unwrap(), Some(1));

        fragments[2] = Some(Fragment::new(2, FragmentKind::GlobalParity, vec![3]));
        assert!(matches!(
            check_layout(&config, &fragments),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_erasure_pattern() {
        let fragments = vec![
            None,
            Some(Fragment::new(1, FragmentKind::Data, vec![0])),
            None,
        ];
        let pattern = erasure_pattern(&fragments);
        assert_eq!(pattern.into_iter().collect::<Vec<_>>(), vec![0, 2]);
    }
}
