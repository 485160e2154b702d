/// Unix file mode attached to a zip entry.
///
/// Carries the file type and permission bits. A zero value means the mode is
/// unknown: the entry is newly created or did not originate on a Unix system.
/// The mode travels out-of-band to the central directory's external file
/// attributes; the local header never stores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryMode(u32);

impl EntryMode {
    /// Creates a mode from raw `mode_t` bits, e.g. `0o100644`.
    ///
    /// Plain permission bits without a file type (e.g. `0o644`) are accepted;
    /// the writer treats such values as regular files.
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// A mode of all zeroes, meaning unknown or non-unix.
    pub const fn unknown() -> Self {
        Self(0)
    }

    /// Returns the raw mode value.
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Returns true when no mode information is present.
    pub fn is_unknown(&self) -> bool {
        self.0 == 0
    }

    /// Returns true if the file type bits mark a directory.
    pub fn is_dir(&self) -> bool {
        self.0 & S_IFMT == S_IFDIR
    }

    /// Returns true if the file type bits mark a symbolic link.
    pub fn is_symlink(&self) -> bool {
        self.0 & S_IFMT == S_IFLNK
    }

    /// Returns the permission bits (e.g. `0o755`), without type bits.
    pub fn permissions(&self) -> u32 {
        self.0 & 0o777
    }

    /// Normalizes the raw value into a full mode with file type bits set,
    /// defaulting to a regular file when the caller supplied bare
    /// permissions.
    pub(crate) fn normalized(&self, directory: bool) -> u32 {
        let mut mode = self.0 & 0o7777; // permissions + SUID/SGID/sticky
        match self.0 & S_IFMT {
            0 if directory => mode |= S_IFDIR,
            0 => mode |= S_IFREG,
            file_type => mode |= file_type,
        }
        mode
    }
}

impl From<u32> for EntryMode {
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

/// Unix file type and permission constants
const S_IFMT: u32 = 0o170000; // File type mask
const S_IFLNK: u32 = 0o120000; // Symbolic link
const S_IFREG: u32 = 0o100000; // Regular file
const S_IFDIR: u32 = 0o040000; // Directory
