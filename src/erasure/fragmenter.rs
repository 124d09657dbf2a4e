//! Payload splitting and reassembly
//!
//! A payload is cut into `k` contiguous slices of `ceil(len / k)` bytes.
//! Slices that run past the end of the payload are right-padded with zeros.

use crate::{Error, Result};

/// Size of every fragment produced for a payload of `payload_len` bytes
pub fn fragment_size(payload_len: usize, k: usize) -> usize {
    if k == 0 {
        return 0;
    }
    payload_len.div_ceil(k)
}

/// Split `payload` into `k` equal-size, zero-padded data fragments
pub fn split(payload: &[u8], k: usize) -> Result<Vec<Vec<u8>>> {
    if k == 0 {
        return Err(Error::Configuration(
            "cannot split a payload into 0 fragments".into(),
        ));
    }
    if payload.is_empty() {
        return Err(Error::EmptyPayload);
    }

    let size = fragment_size(payload.len(), k);
    let mut fragments = Vec::with_capacity(k);

    for i in 0..k {
        let start = (i * size).min(payload.len());
        let end = (start + size).min(payload.len());

        let mut fragment = payload[start..end].to_vec();
        fragment.resize(size, 0);
        fragments.push(fragment);
    }

    Ok(fragments)
}

/// Concatenate data fragments and strip trailing zero padding.
///
/// Payloads that themselves end in zero bytes lose those bytes here; use
/// [`join_exact`] when the payload length is known.
pub fn join(data: &[Vec<u8>]) -> Vec<u8> {
    let mut payload = concat(data);
    while payload.last() == Some(&0) {
        payload.pop();
    }
    payload
}

/// Concatenate data fragments and cut the result to `payload_len` bytes
pub fn join_exact(data: &[Vec<u8>], payload_len: usize) -> Result<Vec<u8>> {
    let mut payload = concat(data);
    if payload_len > payload.len() {
        return Err(Error::Configuration(format!(
            "payload length {} exceeds the {} bytes carried by the data fragments",
            payload_len,
            payload.len()
        )));
    }
    payload.truncate(payload_len);
    Ok(payload)
}

fn concat(data: &[Vec<u8>]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(data.iter().map(Vec::len).sum());
    for fragment in data {
        payload.extend_from_slice(fragment);
    }
    payload
}
