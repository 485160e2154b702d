const fn gen_crc_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let poly = 0xEDB88320; // CRC-32 (IEEE) polynomial, reflected

    let mut i = 0;
    while i < 256 {
        let mut crc = i as u32;
        let mut j = 0;
        while j < 8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ poly;
            } else {
                crc >>= 1;
            }
            j += 1;
        }

        table[i] = crc;
        i += 1;
    }

    table
}

// Prefer static over const so the table is computed once, not per use site.
static CRC_TABLE: [u32; 256] = gen_crc_table();

/// Compute the CRC-32 (IEEE) of a byte slice held entirely in memory.
///
/// For data that arrives incrementally, fold chunks into a [`Crc32`]
/// accumulator instead.
pub fn crc32(data: &[u8]) -> u32 {
    let mut hasher = Crc32::new();
    hasher.update(data);
    hasher.finalize()
}

/// Streaming CRC-32 accumulator.
///
/// Seeded with all ones, complemented on finalization, matching the checksum
/// zip stores in local headers and data descriptors.
#[derive(Debug, Clone)]
pub struct Crc32 {
    state: u32,
}

impl Crc32 {
    pub fn new() -> Self {
        Crc32 { state: !0 }
    }

    #[inline]
    pub fn update(&mut self, data: &[u8]) {
        self.state = data.iter().fold(self.state, |crc, &x| {
            (crc >> 8) ^ CRC_TABLE[(u32::from(x) ^ (crc & 0xFF)) as usize]
        });
    }

    pub fn finalize(&self) -> u32 {
        !self.state
    }
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}
