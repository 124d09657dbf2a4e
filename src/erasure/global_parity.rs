//! Global parity over the full data fragment set
//!
//! The field arithmetic is delegated to a [`LinearErasureCode`]. The default
//! backing code is systematic Reed-Solomon over GF(256) from the
//! `reed-solomon-erasure` crate. Each fragment is one shard of the codeword,
//! so a lost fragment erases every symbol in that shard.

use crate::{Error, Result};
use reed_solomon_erasure::galois_8::ReedSolomon;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Largest codeword length (data + parity shards) GF(256) supports
pub const MAX_SHARDS: usize = 256;

/// A systematic linear block code that works on whole shards
pub trait LinearErasureCode: Send + Sync {
    /// Number of data shards in a codeword
    fn data_shards(&self) -> usize;

    /// Number of parity shards in a codeword; also the number of shard
    /// erasures the code can correct
    fn parity_shards(&self) -> usize;

    /// Compute the parity shards for `data`
    fn encode_parity(&self, data: &[Vec<u8>]) -> Result<Vec<Vec<u8>>>;

    /// Fill every missing data shard of `codeword` in place.
    ///
    /// `codeword` holds the data shards followed by the parity shards.
    fn reconstruct_data(&self, codeword: &mut [Option<Vec<u8>>]) -> Result<()>;
}

/// Reed-Solomon over GF(256)
pub struct ReedSolomonCode {
    rs: ReedSolomon,
    data_shards: usize,
    parity_shards: usize,
}

impl ReedSolomonCode {
    pub fn new(data_shards: usize, parity_shards: usize) -> Result<Self> {
        if data_shards == 0 || parity_shards == 0 {
            return Err(Error::Configuration(format!(
                "Reed-Solomon needs data and parity shards, got {}+{}",
                data_shards, parity_shards
            )));
        }

        let rs = ReedSolomon::new(data_shards, parity_shards).map_err(|e| {
            Error::Configuration(format!("Failed to create Reed-Solomon codec: {:?}", e))
        })?;

        Ok(Self {
            rs,
            data_shards,
            parity_shards,
        })
    }
}

impl LinearErasureCode for ReedSolomonCode {
    fn data_shards(&self) -> usize {
        self.data_shards
    }

    fn parity_shards(&self) -> usize {
        self.parity_shards
    }

    fn encode_parity(&self, data: &[Vec<u8>]) -> Result<Vec<Vec<u8>>> {
        let shard_size = data.first().map(Vec::len).unwrap_or(0);

        let mut shards: Vec<Vec<u8>> = Vec::with_capacity(self.data_shards + self.parity_shards);
        shards.extend(data.iter().cloned());
        for _ in 0..self.parity_shards {
            shards.push(vec![0u8; shard_size]);
        }

        self.rs
            .encode(&mut shards)
            .map_err(|e| Error::Codec(format!("Reed-Solomon encoding failed: {:?}", e)))?;

        Ok(shards.split_off(self.data_shards))
    }

    fn reconstruct_data(&self, codeword: &mut [Option<Vec<u8>>]) -> Result<()> {
        self.rs
            .reconstruct_data(codeword)
            .map_err(|e| Error::Codec(format!("Reed-Solomon reconstruction failed: {:?}", e)))
    }
}

/// Produces global parity fragments and corrects erasures in the
/// `[data | global parity]` codeword
#[derive(Clone)]
pub struct GlobalParityCodec {
    code: Arc<dyn LinearErasureCode>,
}

impl GlobalParityCodec {
    /// Wrap an arbitrary linear code
    pub fn new(code: Arc<dyn LinearErasureCode>) -> Self {
        Self { code }
    }

    /// Codec backed by Reed-Solomon over GF(256)
    pub fn reed_solomon(data_fragments: usize, parity_fragments: usize) -> Result<Self> {
        Ok(Self::new(Arc::new(ReedSolomonCode::new(
            data_fragments,
            parity_fragments,
        )?)))
    }

    pub fn data_fragments(&self) -> usize {
        self.code.data_shards()
    }

    pub fn parity_fragments(&self) -> usize {
        self.code.parity_shards()
    }

    /// Maximum number of erased codeword positions that can be corrected
    pub fn capacity(&self) -> usize {
        self.code.parity_shards()
    }

    pub fn codeword_len(&self) -> usize {
        self.code.data_shards() + self.code.parity_shards()
    }

    /// Global parity fragments for the full data fragment set
    #[instrument(skip(self, data), fields(fragments = data.len()))]
    pub fn encode(&self, data: &[Vec<u8>]) -> Result<Vec<Vec<u8>>> {
        if data.len() != self.data_fragments() {
            return Err(Error::Configuration(format!(
                "global parity expects {} data fragments, got {}",
                self.data_fragments(),
                data.len()
            )));
        }

        let parity = self.code.encode_parity(data)?;
        debug!(
            parity = parity.len(),
            fragment_size = data.first().map(Vec::len).unwrap_or(0),
            "computed global parity"
        );
        Ok(parity)
    }

    /// Correct the erased positions of `codeword` and return the data
    /// fragments.
    ///
    /// Fails with `UncorrectableErasure` when more positions are erased than
    /// the code corrects.
    #[instrument(skip(self, codeword))]
    pub fn decode(&self, mut codeword: Vec<Option<Vec<u8>>>) -> Result<Vec<Vec<u8>>> {
        if codeword.len() != self.codeword_len() {
            return Err(Error::Configuration(format!(
                "codeword must have {} positions, got {}",
                self.codeword_len(),
                codeword.len()
            )));
        }

        let erasures = codeword.iter().filter(|s| s.is_none()).count();
        if erasures > self.capacity() {
            return Err(Error::UncorrectableErasure {
                erasures,
                capacity: self.capacity(),
            });
        }

        let k = self.data_fragments();
        if codeword[..k].iter().any(Option::is_none) {
            self.code.reconstruct_data(&mut codeword)?;
            debug!(erasures, "corrected codeword erasures");
        }

        codeword
            .into_iter()
            .take(k)
            .enumerate()
            .map(|(i, shard)| {
                shard.ok_or_else(|| Error::Codec(format!("data fragment {} was not rebuilt", i)))
            })
            .collect()
    }
}

impl std::fmt::Debug for GlobalParityCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlobalParityCodec")
            .field("data_fragments", &self.data_fragments())
            .field("parity_fragments", &self.parity_fragments())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data() -> Vec<Vec<u8>> {
        vec![
            b"abcd".to_vec(),
            b"efgh".to_vec(),
            b"ijkl".to_vec(),
            b"mnop".to_vec(),
        ]
    }

    fn codeword(codec: &GlobalParityCodec, data: &[Vec<u8>]) -> Vec<Option<Vec<u8>>> {
        let parity = codec.encode(data).unwrap();
        data.iter().cloned().chain(parity).map(Some).collect()
    }

    #[test]
    fn test_encode_parity_shape() {
        let codec = GlobalParityCodec::reed_solomon(4, 2).unwrap();
        let parity = codec.encode(&data()).unwrap();
        assert_eq!(parity.len(), 2);
        assert!(parity.iter().all(|p| p.len() == 4));
    }

    #[test]
    fn test_invalid_codec() {
        assert!(GlobalParityCodec::reed_solomon(0, 2).is_err());
        assert!(GlobalParityCodec::reed_solomon(4, 0).is_err());
    }

    #[test]
    fn test_decode_up_to_capacity() {
        let codec = GlobalParityCodec::reed_solomon(4, 2).unwrap();
        let original = data();

        for (a, b) in [(0, 1), (0, 4), (2, 5), (3, 4)] {
            let mut word = codeword(&codec, &original);
            word[a] = None;
            word[b] = None;
            assert_eq!(codec.decode(word).unwrap(), original);
        }
    }

    #[test]
    fn test_decode_parity_only_erasure() {
        let codec = GlobalParityCodec::reed_solomon(4, 2).unwrap();
        let mut word = codeword(&codec, &data());
        word[5] = None;
        assert_eq!(codec.decode(word).unwrap(), data());
    }

    #[test]
    fn test_decode_over_capacity() {
        let codec = GlobalParityCodec::reed_solomon(4, 2).unwrap();
        let mut word = codeword(&codec, &data());
        word[0] = None;
        word[1] = None;
        word[4] = None;

        assert!(matches!(
            codec.decode(word),
            Err(Error::UncorrectableErasure {
                erasures: 3,
                capacity: 2
            })
        ));
    }

    #[test]
    fn test_decode_rejects_wrong_length() {
        let codec = GlobalParityCodec::reed_solomon(4, 2).unwrap();
        assert!(matches!(
            codec.decode(vec![None; 3]),
            Err(Error::Configuration(_))
        ));
    }

    /// Single XOR parity: a linear code correcting one erasure
    struct XorCode {
        k: usize,
    }

    impl LinearErasureCode for XorCode {
        fn data_shards(&self) -> usize {
            self.k
        }

        fn parity_shards(&self) -> usize {
            1
        }

        fn encode_parity(&self, data: &[Vec<u8>]) -> Result<Vec<Vec<u8>>> {
            Ok(vec![crate::erasure::local_parity::xor_parity(
                data.iter().map(Vec::as_slice),
            )])
        }

        fn reconstruct_data(&self, codeword: &mut [Option<Vec<u8>>]) -> Result<()> {
            let missing = codeword.iter().position(Option::is_none);
            if let Some(missing) = missing {
                let rebuilt = crate::erasure::local_parity::xor_parity(
                    codeword.iter().flatten().map(Vec::as_slice),
                );
                codeword[missing] = Some(rebuilt);
            }
            Ok(())
        }
    }

    #[test]
    fn test_injected_code() {
        let codec = GlobalParityCodec::new(Arc::new(XorCode { k: 4 }));
        assert_eq!(codec.capacity(), 1);

        let mut word = codeword(&codec, &data());
        word[2] = None;
        assert_eq!(codec.decode(word).unwrap(), data());

        let mut word = codeword(&codec, &data());
        word[1] = None;
        word[2] = None;
        assert!(codec.decode(word).is_err());
    }
}
