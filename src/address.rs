/// Cache geometry in (C, B, S) form: 2^C bytes total, 2^B-byte blocks,
/// 2^S blocks per set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub c: u32,
    pub b: u32,
    pub s: u32,
}

impl Geometry {
    pub const fn new(c: u32, b: u32, s: u32) -> Self {
        Self { c, b, s }
    }

    pub fn index_bits(&self) -> u32 {
        self.c.saturating_sub(self.b + self.s)
    }

    pub fn tag_bits(&self) -> u32 {
        u64::BITS.saturating_sub(self.c.saturating_sub(self.s))
    }

    pub fn num_sets(&self) -> usize {
        1usize << self.index_bits()
    }

    pub fn ways(&self) -> usize {
        1usize << self.s
    }

    pub fn block_size(&self) -> u64 {
        1u64 << self.b
    }

    /// Split an address into (tag, set index). The block offset is dropped.
    pub fn decompose(&self, address: u64) -> (u64, usize) {
        let index_mask = (1u64 << self.index_bits()) - 1;
        let index = (address >> self.b) & index_mask;
        let tag = address.checked_shr(self.b + self.index_bits()).unwrap_or(0);
        (tag, index as usize)
    }

    /// Rebuild the block-aligned address of (tag, index); offset bits are zero.
    pub fn recompose(&self, tag: u64, index: usize) -> u64 {
        let high = tag.checked_shl(self.b + self.index_bits()).unwrap_or(0);
        high | ((index as u64) << self.b)
    }

    pub fn block_address(&self, address: u64) -> u64 {
        address & !(self.block_size() - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_default_l1_geometry() {
        // 1KB, 64B blocks, 2-way: 8 sets, 3 index bits
        let geometry = Geometry::new(10, 6, 1);
        assert_eq!(geometry.num_sets(), 8);
        assert_eq!(geometry.ways(), 2);
        assert_eq!(geometry.tag_bits(), 55);

        let (tag, index) = geometry.decompose(0x1234_5678);
        assert_eq!(index, (0x1234_5678 >> 6) & 0x7);
        assert_eq!(tag, 0x1234_5678 >> 9);
    }

    #[test]
    fn recompose_zero_fills_offset() {
        let geometry = Geometry::new(15, 6, 3);
        let address = 0xdead_beef_u64;
        let (tag, index) = geometry.decompose(address);
        assert_eq!(geometry.recompose(tag, index), address & !0x3f);
    }

    #[test]
    fn fully_associative_has_single_set() {
        let geometry = Geometry::new(10, 6, 4);
        assert_eq!(geometry.num_sets(), 1);
        let (tag, index) = geometry.decompose(0xffff_ffff_ffff_ffc0);
        assert_eq!(index, 0);
        assert_eq!(tag, 0xffff_ffff_ffff_ffc0 >> 6);
        assert_eq!(geometry.recompose(tag, index), 0xffff_ffff_ffff_ffc0);
    }

    #[test]
    fn block_address_masks_offset() {
        let geometry = Geometry::new(10, 4, 0);
        assert_eq!(geometry.block_address(0x10f), 0x100);
        assert_eq!(geometry.block_size(), 16);
    }
}
