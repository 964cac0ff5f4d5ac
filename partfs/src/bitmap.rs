use crate::utils::rightmost_unset_bit;
use alloc::{vec, vec::Vec};

/// A bit-packed allocation map. Bit `i` lives in byte `i / 8` at position `i % 8`, which is
/// also the layout written to disk.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct BitMap {
    vc: Vec<u64>,
    len: usize,
}

impl BitMap {
    /// Constructs a new bitmap holding `size` bits, defaulted to all 0's
    pub fn new(size: usize) -> Self {
        let vec_length = {
            if size % 64 != 0 {
                size / 64 + 1
            } else {
                size / 64
            }
        };

        return Self {
            vc: vec![0; vec_length],
            len: size,
        };
    }

    /// Constructs a bitmap of `size` bits from its on-disk bytes. Missing bytes read as 0.
    pub fn from_bytes(bytes: &[u8], size: usize) -> Self {
        let mut m = Self::new(size);

        for (i, byte) in bytes.iter().enumerate().take(Self::bytes_for(size)) {
            m.vc[i / 8] |= (*byte as u64) << ((i % 8) * 8);
        }

        m.clear_tail();

        return m;
    }

    /// The number of bytes needed to store `size` bits.
    pub fn bytes_for(size: usize) -> usize {
        if size % 8 != 0 {
            size / 8 + 1
        } else {
            size / 8
        }
    }

    /// Find the first free bit and return the index
    pub fn find_next_0_index(&self) -> Option<usize> {
        for (i, val) in self.vc.iter().enumerate() {
            if *val < u64::MAX {
                let index = i * 64 + rightmost_unset_bit(*val);

                if index < self.len {
                    return Some(index);
                }

                return None;
            }
        }

        return None;
    }

    /// Tries to set a bit at index and returns false if the index is out of range
    pub fn set_bit(&mut self, index: usize, value: bool) -> bool {
        if index >= self.len {
            return false;
        }

        let (array_index, bit) = (index / 64, index % 64);

        if value {
            self.vc[array_index] |= 1 << bit;
        } else {
            self.vc[array_index] &= !(1 << bit);
        }

        return true;
    }

    /// Returns whether a bit at a specified index was set.
    pub fn bit_at(&self, index: usize) -> Option<bool> {
        if index >= self.len {
            return None;
        }

        let (array_index, bit) = (index / 64, index % 64);

        return Some(((self.vc[array_index] >> bit) & 1) == 1);
    }

    pub fn len(&self) -> usize {
        return self.len;
    }

    pub fn is_empty(&self) -> bool {
        return self.len == 0;
    }

    /// Returns the bitmap as a sequence of booleans
    pub fn flatten_bool(&self) -> Vec<bool> {
        let mut res = Vec::with_capacity(self.len);

        for i in 0..self.len {
            res.push(((self.vc[i / 64] >> (i % 64)) & 1) == 1);
        }

        return res;
    }

    /// Returns the bitmap as its on-disk bytes, `bytes_for(len)` long.
    pub fn as_bytes(&self) -> Vec<u8> {
        let mut res = Vec::with_capacity(Self::bytes_for(self.len));

        for i in 0..Self::bytes_for(self.len) {
            res.push((self.vc[i / 8] >> ((i % 8) * 8)) as u8);
        }

        return res;
    }

    pub fn count_ones(&self) -> usize {
        let mut sum: usize = 0;

        for n in &self.vc {
            sum += n.count_ones() as usize;
        }

        return sum;
    }

    pub fn count_zeros(&self) -> usize {
        return self.len - self.count_ones();
    }

    // Bits past `len` are kept at 0 so counts and searches ignore them.
    fn clear_tail(&mut self) {
        let tail = self.len % 64;

        if tail != 0 {
            if let Some(last) = self.vc.last_mut() {
                *last &= (1u64 << tail) - 1;
            }
        }
    }
}

impl core::iter::IntoIterator for BitMap {
    type Item = bool;
    type IntoIter = alloc::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        return self.flatten_bool().into_iter();
    }
}
