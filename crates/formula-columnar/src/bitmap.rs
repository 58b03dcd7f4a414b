#![forbid(unsafe_code)]

/// Packed validity mask. A set bit marks a valid (non-null) row.
///
/// Bits are stored little-endian within each `u64` word: bit 0 is the LSB of word 0. Bits past
/// `len` in the last word are always zero, which keeps `count_ones` and equality exact.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BitVec {
    words: Vec<u64>,
    len: usize,
    ones: usize,
}

#[inline]
fn words_for(bits: usize) -> usize {
    bits.div_ceil(64)
}

#[inline]
fn tail_mask(len: usize) -> u64 {
    match len % 64 {
        0 => u64::MAX,
        rem => (1u64 << rem) - 1,
    }
}

impl BitVec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity_bits(bits: usize) -> Self {
        Self {
            words: Vec::with_capacity(words_for(bits)),
            len: 0,
            ones: 0,
        }
    }

    pub fn with_len_all_true(bits: usize) -> Self {
        let mut words = vec![u64::MAX; words_for(bits)];
        if let Some(last) = words.last_mut() {
            *last &= tail_mask(bits);
        }
        Self {
            words,
            len: bits,
            ones: bits,
        }
    }

    pub fn from_bools(bits: &[bool]) -> Self {
        let mut out = Self::with_capacity_bits(bits.len());
        for &b in bits {
            out.push(b);
        }
        out
    }

    /// Adopt packed words, e.g. filled by several writers that each own whole words. Bits past
    /// `len` are cleared.
    pub fn from_words(mut words: Vec<u64>, len: usize) -> Self {
        words.resize(words_for(len), 0);
        if let Some(last) = words.last_mut() {
            *last &= tail_mask(len);
        }
        let ones = words.iter().map(|w| w.count_ones() as usize).sum();
        Self { words, len, ones }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn push(&mut self, value: bool) {
        let bit = self.len % 64;
        if bit == 0 {
            self.words.push(0);
        }
        if value {
            self.words[self.len / 64] |= 1u64 << bit;
            self.ones += 1;
        }
        self.len += 1;
    }

    pub fn get(&self, index: usize) -> bool {
        debug_assert!(index < self.len, "BitVec index out of bounds");
        (self.words[index / 64] >> (index % 64)) & 1 == 1
    }

    pub fn set(&mut self, index: usize, value: bool) {
        debug_assert!(index < self.len, "BitVec index out of bounds");
        let word = &mut self.words[index / 64];
        let mask = 1u64 << (index % 64);
        let was_set = *word & mask != 0;
        if was_set == value {
            return;
        }
        if value {
            *word |= mask;
            self.ones += 1;
        } else {
            *word &= !mask;
            self.ones -= 1;
        }
    }

    pub fn count_ones(&self) -> usize {
        self.ones
    }

    pub fn count_zeros(&self) -> usize {
        self.len - self.ones
    }

    pub fn all_true(&self) -> bool {
        self.ones == self.len
    }

    pub fn as_words(&self) -> &[u64] {
        &self.words
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len).map(move |i| self.get(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_get_and_counts_track_each_other() {
        let mut bits = BitVec::new();
        for i in 0..130 {
            bits.push(i % 3 != 0);
        }
        assert_eq!(bits.len(), 130);
        assert_eq!(bits.count_ones(), (0..130).filter(|i| i % 3 != 0).count());
        assert!(!bits.get(0));
        assert!(bits.get(1));
        assert!(bits.get(128));

        bits.set(0, true);
        bits.set(1, false);
        assert!(bits.get(0));
        assert!(!bits.get(1));
        assert_eq!(bits.count_ones() + bits.count_zeros(), 130);
    }

    #[test]
    fn all_true_mask_keeps_tail_bits_clear() {
        let bits = BitVec::with_len_all_true(70);
        assert!(bits.all_true());
        assert_eq!(bits.as_words()[1], (1u64 << 6) - 1);
        assert_eq!(bits, BitVec::from_bools(&[true; 70]));
    }

    #[test]
    fn from_words_matches_pushed_bits_and_clears_the_tail() {
        let raw: Vec<bool> = (0..130).map(|i| i % 7 < 3).collect();
        let pushed = BitVec::from_bools(&raw);
        let mut words = pushed.as_words().to_vec();
        words[2] |= !0b11;
        let adopted = BitVec::from_words(words, raw.len());
        assert_eq!(adopted, pushed);
        assert_eq!(adopted.count_ones(), raw.iter().filter(|&&b| b).count());
        assert_eq!(adopted.iter().collect::<Vec<_>>(), raw);
    }
}
