//! Property-based tests for the erasure schemes
//!
//! # Test Properties
//!
//! 1. **Roundtrip**: decode(encode(payload)) = payload for zero-free suffixes
//! 2. **Layout**: encode yields `total_fragments` fragments of equal size
//! 3. **Fault tolerance**: RS survives any `r` losses
//! 4. **Locality**: an LRC single data loss is repaired inside its group,
//!    and one loss per group needs no global parity at all

#![cfg(test)]

use proptest::prelude::*;
use std::collections::BTreeSet;

use super::{create_scheme, fragmenter, Fragment, RepairStrategy, SchemeConfig};

// =============================================================================
// Property Strategies
// =============================================================================

/// Payloads that do not end in a zero byte, so padding stripping is exact
fn payload_strategy() -> impl Strategy<Value = Vec<u8>> {
    (prop::collection::vec(any::<u8>(), 0..512), 1u8..=255).prop_map(|(mut v, last)| {
        v.push(last);
        v
    })
}

/// Flat RS: k 2-8, r 1-4
fn rs_config_strategy() -> impl Strategy<Value = SchemeConfig> {
    (2usize..=8, 1usize..=4).prop_map(|(k, r)| SchemeConfig::flat_rs(k, r))
}

/// LRC: k 2-9, group size 1-k, global parity 1-3
fn lrc_config_strategy() -> impl Strategy<Value = SchemeConfig> {
    (2usize..=9, 1usize..=3)
        .prop_flat_map(|(k, g)| (Just(k), 1usize..=k, Just(g)))
        .prop_map(|(k, group_size, g)| SchemeConfig::lrc(k, group_size, 1, g))
}

fn erase(fragments: Vec<Fragment>, lost: &BTreeSet<usize>) -> Vec<Option<Fragment>> {
    fragments
        .into_iter()
        .map(|f| (!lost.contains(&f.index)).then_some(f))
        .collect()
}

// =============================================================================
// Layout Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: every scheme emits total_fragments fragments of ceil(len / k) bytes.
    #[test]
    fn prop_fragment_count_and_size(
        config in prop_oneof![rs_config_strategy(), lrc_config_strategy()],
        len in 1usize..2048,
    ) {
        let scheme = create_scheme(&config)?;
        let fragments = scheme.encode(&vec![0xA5; len])?;

        prop_assert_eq!(fragments.len(), config.total_fragments());
        let size = fragmenter::fragment_size(len, config.k);
        prop_assert!(fragments.iter().all(|f| f.len() == size));
        for (i, f) in fragments.iter().enumerate() {
            prop_assert_eq!(f.index, i);
        }
    }
}

// =============================================================================
// Roundtrip Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: decoding without losses returns the original payload.
    #[test]
    fn prop_roundtrip_no_loss(
        config in prop_oneof![rs_config_strategy(), lrc_config_strategy()],
        payload in payload_strategy(),
    ) {
        let scheme = create_scheme(&config)?;
        let fragments = erase(scheme.encode(&payload)?, &BTreeSet::new());

        let reconstruction = scheme.reconstruct(&fragments)?;
        prop_assert_eq!(reconstruction.plan.strategy, RepairStrategy::Direct);
        prop_assert_eq!(scheme.decode(&fragments)?, payload);
    }

    /// Property: decode_exact returns the payload byte for byte, zero suffix included.
    #[test]
    fn prop_decode_exact(
        config in prop_oneof![rs_config_strategy(), lrc_config_strategy()],
        payload in prop::collection::vec(any::<u8>(), 1..256),
    ) {
        let scheme = create_scheme(&config)?;
        let fragments = erase(scheme.encode(&payload)?, &BTreeSet::new());
        prop_assert_eq!(scheme.decode_exact(&fragments, payload.len())?, payload);
    }

    /// Property: flat RS recovers from any r erasures.
    #[test]
    fn prop_rs_tolerates_r_losses(
        config in rs_config_strategy(),
        payload in payload_strategy(),
        seed in any::<u64>(),
    ) {
        let scheme = create_scheme(&config)?;
        let total = config.total_fragments();

        // Deterministic subset of size r derived from the seed
        let mut lost = BTreeSet::new();
        let mut state = seed;
        while lost.len() < config.global_parity_count {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            lost.insert((state >> 33) as usize % total);
        }

        let fragments = erase(scheme.encode(&payload)?, &lost);
        prop_assert_eq!(scheme.decode(&fragments)?, payload, "lost {:?}", lost);
    }
}

// =============================================================================
// Locality Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: one lost LRC data fragment is repaired locally, reading
    /// only the rest of its group and the group's parity.
    #[test]
    fn prop_lrc_single_failure_is_local(
        config in lrc_config_strategy(),
        payload in payload_strategy(),
        lost in any::<prop::sample::Index>(),
    ) {
        let scheme = create_scheme(&config)?;
        let lost = lost.index(config.k);
        let fragments = erase(scheme.encode(&payload)?, &BTreeSet::from([lost]));

        let reconstruction = scheme.reconstruct(&fragments)?;
        let group = config.group_of(lost).unwrap();

        prop_assert_eq!(reconstruction.plan.strategy, RepairStrategy::Local);
        prop_assert_eq!(reconstruction.plan.local_group, Some(group));
        prop_assert_eq!(reconstruction.plan.reads(), config.group_members(group).len());
        let parity = config.local_parity_index(group);
        prop_assert!(reconstruction.plan.fragments_to_read.contains(&parity));
        prop_assert_eq!(scheme.decode(&fragments)?, payload);
    }

    /// Property: LRC recovers from any g data losses through the global code.
    #[test]
    fn prop_lrc_tolerates_g_data_losses(
        config in lrc_config_strategy(),
        payload in payload_strategy(),
        picks in prop::collection::vec(any::<prop::sample::Index>(), 3),
    ) {
        let scheme = create_scheme(&config)?;
        let lost: BTreeSet<usize> = picks
            .iter()
            .take(config.global_parity_count)
            .map(|p| p.index(config.k))
            .collect();

        let fragments = erase(scheme.encode(&payload)?, &lost);
        prop_assert_eq!(scheme.decode(&fragments)?, payload, "lost {:?}", lost);
    }

    /// Property: one data loss in every group, with every global parity
    /// fragment lost too, is rebuilt from the local parities alone.
    #[test]
    fn prop_lrc_one_loss_per_group_survives_global_loss(
        config in lrc_config_strategy(),
        payload in payload_strategy(),
        picks in prop::collection::vec(any::<prop::sample::Index>(), 9),
    ) {
        let scheme = create_scheme(&config)?;
        let mut lost: BTreeSet<usize> = config.global_parity_range().collect();
        for (group, pick) in (0..config.num_groups()).zip(&picks) {
            let members = config.group_members(group);
            lost.insert(members.start + pick.index(members.len()));
        }

        let fragments = erase(scheme.encode(&payload)?, &lost);
        let reconstruction = scheme.reconstruct(&fragments)?;

        prop_assert_eq!(reconstruction.plan.codeword_erasures, 0);
        prop_assert_eq!(reconstruction.plan.xor_groups.len(), config.num_groups());
        prop_assert_eq!(scheme.decode(&fragments)?, payload, "lost {:?}", lost);
    }
}
