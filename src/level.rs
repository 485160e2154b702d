use crate::format::CompressionMethod;

/// Requested compression for an entry.
///
/// Maps the conventional integer levels onto a codec configuration: 0 stores
/// the bytes verbatim, -1 deflates at the codec's default effort, and 1-9
/// deflate at that explicit effort. The policy only selects the codec; the
/// entry writer runs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionLevel {
    /// Store the bytes uncompressed (level 0).
    Store,
    /// Deflate at the codec's default effort (level -1).
    Default,
    /// Deflate at an explicit effort from 1 (fastest) to 9 (best).
    Precise(u32),
}

impl CompressionLevel {
    /// Interprets a conventional integer level: 0, -1, or 1 through 9.
    ///
    /// Returns `None` for anything else.
    pub fn from_integer(level: i32) -> Option<Self> {
        match level {
            0 => Some(CompressionLevel::Store),
            -1 => Some(CompressionLevel::Default),
            1..=9 => Some(CompressionLevel::Precise(level as u32)),
            _ => None,
        }
    }

    /// Interprets the legacy two-level form: compressed or not.
    pub fn from_flag(compress: bool) -> Self {
        if compress {
            CompressionLevel::Default
        } else {
            CompressionLevel::Store
        }
    }

    /// Returns true when the deflate codec is applied at all.
    pub fn is_compressed(&self) -> bool {
        !matches!(self, CompressionLevel::Store)
    }

    /// The method id recorded in headers for this level.
    pub fn method(&self) -> CompressionMethod {
        match self {
            CompressionLevel::Store => CompressionMethod::Store,
            _ => CompressionMethod::Deflate,
        }
    }

    /// The codec effort parameter, absent in store mode.
    ///
    /// Deflate of zero-length content still produces a well-formed empty
    /// deflate stream; store mode is never silently substituted.
    pub(crate) fn effort(&self) -> Option<flate2::Compression> {
        match self {
            CompressionLevel::Store => None,
            CompressionLevel::Default => Some(flate2::Compression::default()),
            CompressionLevel::Precise(level) => Some(flate2::Compression::new(*level)),
        }
    }
}

impl Default for CompressionLevel {
    fn default() -> Self {
        CompressionLevel::Default
    }
}
