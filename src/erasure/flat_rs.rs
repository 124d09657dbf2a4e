//! Flat Reed-Solomon
//!
//! `k` data fragments plus `r` parity fragments from the global codec. Any
//! `k` of the `k + r` fragments rebuild the payload, and every repair goes
//! through the full codeword.

use crate::erasure::{
    assemble, check_layout, erasure_pattern, fragmenter, ErasureScheme, Fragment,
    GlobalParityCodec, Reconstruction, RepairStrategy, SchemeConfig, SchemeKind,
};
use crate::{Error, Result};
use tracing::{debug, instrument};

/// Flat Reed-Solomon scheme
pub struct FlatRs {
    config: SchemeConfig,
    codec: GlobalParityCodec,
}

impl FlatRs {
    /// Create a scheme backed by Reed-Solomon over GF(256)
    pub fn new(config: SchemeConfig) -> Result<Self> {
        let codec = GlobalParityCodec::reed_solomon(config.k, config.global_parity_count)?;
        Self::with_codec(config, codec)
    }

    /// Create a scheme backed by a caller-provided codec
    pub fn with_codec(config: SchemeConfig, codec: GlobalParityCodec) -> Result<Self> {
        if config.kind != SchemeKind::FlatRs {
            return Err(Error::Configuration(format!(
                "{} is not a flat Reed-Solomon configuration",
                config
            )));
        }
        if codec.data_fragments() != config.k
            || codec.parity_fragments() != config.global_parity_count
        {
            return Err(Error::Configuration(format!(
                "codec shape {:?} does not match {}",
                codec, config
            )));
        }
        Ok(Self { config, codec })
    }
}

impl ErasureScheme for FlatRs {
    fn config(&self) -> &SchemeConfig {
        &self.config
    }

    #[instrument(skip(self, payload), fields(payload_len = payload.len()))]
    fn encode(&self, payload: &[u8]) -> Result<Vec<Fragment>> {
        let mut buffers = fragmenter::split(payload, self.config.k)?;
        let parity = self.codec.encode(&buffers)?;
        buffers.extend(parity);

        debug!(
            fragments = buffers.len(),
            fragment_size = buffers[0].len(),
            "encoded payload with {}",
            self.config
        );
        Ok(assemble(&self.config, buffers))
    }

    #[instrument(skip(self, fragments))]
    fn reconstruct(&self, fragments: &[Option<Fragment>]) -> Result<Reconstruction> {
        check_layout(&self.config, fragments)?;

        let plan = self.plan(&erasure_pattern(fragments));
        if !plan.is_recoverable() {
            return Err(Error::UncorrectableErasure {
                erasures: plan.codeword_erasures,
                capacity: plan.capacity,
            });
        }

        let data = match plan.strategy {
            RepairStrategy::Direct => fragments[..self.config.k]
                .iter()
                .flatten()
                .map(|f| f.bytes.clone())
                .collect(),
            RepairStrategy::Local | RepairStrategy::Global => {
                let codeword = fragments.iter().map(|f| f.as_ref().map(|f| f.bytes.clone()));
                self.codec.decode(codeword.collect())?
            }
        };

        debug!(strategy = %plan.strategy, reads = plan.reads(), "reconstructed RS stripe");
        Ok(Reconstruction { data, plan })
    }
}
