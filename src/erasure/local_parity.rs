//! XOR parity over a contiguous group of data fragments
//!
//! A local group repairs exactly one missing member from the others plus
//! the group's parity, without touching the rest of the stripe and without
//! any field multiplication.

use std::ops::Range;

/// Bytewise XOR of equally sized buffers
pub fn xor_parity<'a, I>(fragments: I) -> Vec<u8>
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let mut iter = fragments.into_iter();
    let Some(first) = iter.next() else {
        return Vec::new();
    };

    let mut parity = first.to_vec();
    for fragment in iter {
        xor_into(&mut parity, fragment);
    }
    parity
}

fn xor_into(acc: &mut [u8], fragment: &[u8]) {
    for (a, b) in acc.iter_mut().zip(fragment) {
        *a ^= b;
    }
}

/// A contiguous run of data fragments protected by one XOR parity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalParityGroup {
    /// Group number, also the offset of its parity in the local parity block
    pub id: usize,
    /// Data fragment indices covered by this group
    pub members: Range<usize>,
}

/// Fragment rebuilt by a local repair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalRepair {
    /// Data index of the rebuilt fragment
    pub index: usize,
    pub bytes: Vec<u8>,
    /// XOR passes applied (fragments folded into the result)
    pub xor_passes: usize,
}

impl LocalParityGroup {
    pub fn new(id: usize, members: Range<usize>) -> Self {
        Self { id, members }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.members.contains(&index)
    }

    /// Parity over this group's members, taken from the full data set
    pub fn parity(&self, data: &[Vec<u8>]) -> Vec<u8> {
        xor_parity(data[self.members.clone()].iter().map(Vec::as_slice))
    }

    /// Rebuild the single missing member of this group.
    ///
    /// `data` holds every data fragment of the stripe indexed by data
    /// position. Returns `None` (not recoverable locally) when the parity
    /// is missing or when anything other than exactly one member is missing.
    pub fn repair(&self, data: &[Option<&[u8]>], parity: Option<&[u8]>) -> Option<LocalRepair> {
        let parity = parity?;
        let members = data.get(self.members.clone())?;

        let mut missing = members
            .iter()
            .enumerate()
            .filter(|(_, f)| f.is_none())
            .map(|(offset, _)| self.members.start + offset);
        let index = missing.next()?;
        if missing.next().is_some() {
            return None;
        }

        let mut bytes = parity.to_vec();
        let mut xor_passes = 0;
        for fragment in members.iter().flatten() {
            xor_into(&mut bytes, fragment);
            xor_passes += 1;
        }

        Some(LocalRepair {
            index,
            bytes,
            xor_passes,
        })
    }
}
