//! Local Reconstruction Codes
//!
//! Data fragments are partitioned into contiguous groups, each protected by
//! one XOR local parity, and the whole data set is additionally protected by
//! global parity from the linear code. A single lost data fragment is
//! rebuilt from its group alone. Otherwise every group that can still be
//! repaired by XOR is, and the global codeword `[data | global parity]`
//! corrects whatever remains.

use crate::erasure::{
    assemble, check_layout, erasure_pattern, fragmenter, local_parity::LocalRepair, ErasureScheme,
    Fragment, GlobalParityCodec, LocalParityGroup, Reconstruction, RepairPlan, RepairStrategy,
    SchemeConfig, SchemeKind,
};
use crate::{Error, Result};
use tracing::{debug, instrument, warn};

/// Local Reconstruction Code scheme
pub struct Lrc {
    config: SchemeConfig,
    groups: Vec<LocalParityGroup>,
    codec: GlobalParityCodec,
}

impl Lrc {
    /// Create a scheme whose global parity is Reed-Solomon over GF(256)
    pub fn new(config: SchemeConfig) -> Result<Self> {
        let codec = GlobalParityCodec::reed_solomon(config.k, config.global_parity_count)?;
        Self::with_codec(config, codec)
    }

    /// Create a scheme backed by a caller-provided global codec
    pub fn with_codec(config: SchemeConfig, codec: GlobalParityCodec) -> Result<Self> {
        if config.kind != SchemeKind::Lrc {
            return Err(Error::Configuration(format!(
                "{} is not an LRC configuration",
                config
            )));
        }
        config.validate(config.total_fragments())?;
        if codec.data_fragments() != config.k
            || codec.parity_fragments() != config.global_parity_count
        {
            return Err(Error::Configuration(format!(
                "codec shape {:?} does not match {}",
                codec, config
            )));
        }

        let groups = (0..config.num_groups())
            .map(|id| LocalParityGroup::new(id, config.group_members(id)))
            .collect();

        Ok(Self {
            config,
            groups,
            codec,
        })
    }

    pub fn groups(&self) -> &[LocalParityGroup] {
        &self.groups
    }

    /// XOR-rebuild the single missing data fragment of `group`
    fn xor_repair(&self, fragments: &[Option<Fragment>], group: usize) -> Result<LocalRepair> {
        let group = self.groups.get(group).ok_or_else(|| {
            Error::Configuration(format!("local group {} does not exist", group))
        })?;

        let view: Vec<Option<&[u8]>> = fragments[..self.config.k]
            .iter()
            .map(|f| f.as_ref().map(|f| f.bytes.as_slice()))
            .collect();
        let parity = fragments[self.config.local_parity_index(group.id)]
            .as_ref()
            .map(|f| f.bytes.as_slice());

        let repair = group.repair(&view, parity).ok_or_else(|| {
            Error::Codec(format!("group {} is not recoverable locally", group.id))
        })?;
        debug!(
            group = group.id,
            index = repair.index,
            xor_passes = repair.xor_passes,
            "local repair"
        );
        Ok(repair)
    }

    /// Rebuild the data through the XOR groups of `plan`, then run the global
    /// code over `[data | global parity]` if anything is still missing
    fn repair(&self, fragments: &[Option<Fragment>], plan: &RepairPlan) -> Result<Vec<Vec<u8>>> {
        let k = self.config.k;
        let mut data: Vec<Option<Vec<u8>>> = fragments[..k]
            .iter()
            .map(|f| f.as_ref().map(|f| f.bytes.clone()))
            .collect();

        let groups = plan.local_group.into_iter().chain(plan.xor_groups.iter().copied());
        for group in groups {
            let repair = self.xor_repair(fragments, group)?;
            data[repair.index] = Some(repair.bytes);
        }

        if data.iter().all(Option::is_some) {
            return Ok(data.into_iter().flatten().collect());
        }
        if plan.strategy != RepairStrategy::Global {
            return Err(Error::Codec(format!(
                "{} plan left data fragments missing",
                plan.strategy
            )));
        }

        let global = fragments[self.config.global_parity_range()]
            .iter()
            .map(|f| f.as_ref().map(|f| f.bytes.clone()));
        self.codec.decode(data.into_iter().chain(global).collect())
    }
}

impl ErasureScheme for Lrc {
    fn config(&self) -> &SchemeConfig {
        &self.config
    }

    #[instrument(skip(self, payload), fields(payload_len = payload.len()))]
    fn encode(&self, payload: &[u8]) -> Result<Vec<Fragment>> {
        let mut buffers = fragmenter::split(payload, self.config.k)?;

        let local: Vec<Vec<u8>> = self.groups.iter().map(|g| g.parity(&buffers)).collect();
        let global = self.codec.encode(&buffers)?;
        buffers.extend(local);
        buffers.extend(global);

        debug!(
            fragments = buffers.len(),
            groups = self.groups.len(),
            fragment_size = buffers[0].len(),
            "encoded payload with {}",
            self.config
        );
        Ok(assemble(&self.config, buffers))
    }

    #[instrument(skip(self, fragments))]
    fn reconstruct(&self, fragments: &[Option<Fragment>]) -> Result<Reconstruction> {
        check_layout(&self.config, fragments)?;

        let available = fragments.iter().filter(|f| f.is_some()).count();
        if available < self.config.k {
            return Err(Error::InsufficientFragments {
                available,
                required: self.config.k,
            });
        }

        let plan = self.plan(&erasure_pattern(fragments));
        let data = match plan.strategy {
            RepairStrategy::Direct => fragments[..self.config.k]
                .iter()
                .flatten()
                .map(|f| f.bytes.clone())
                .collect(),
            RepairStrategy::Local => self.repair(fragments, &plan)?,
            RepairStrategy::Global => {
                if !plan.is_recoverable() {
                    warn!(
                        erasures = plan.codeword_erasures,
                        capacity = plan.capacity,
                        "global repair exceeds codec capacity"
                    );
                    return Err(Error::UncorrectableErasure {
                        erasures: plan.codeword_erasures,
                        capacity: plan.capacity,
                    });
                }
                self.repair(fragments, &plan)?
            }
        };

        debug!(strategy = %plan.strategy, reads = plan.reads(), "reconstructed LRC stripe");
        Ok(Reconstruction { data, plan })
    }
}
