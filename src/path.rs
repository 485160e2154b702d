use crate::errors::Error;

/// A validated name for a zip entry.
///
/// Zip names use forward slashes as separators and mark directories with a
/// trailing `/`. Only the portable ASCII subset is guaranteed to round-trip
/// through every zip reader; names outside it are accepted here but
/// unsupported at the encoding boundary, since this crate writes name bytes
/// verbatim with no encoding flag. Check [`EntryName::is_portable`] before
/// relying on interoperability.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryName(String);

impl EntryName {
    /// Creates a file entry name.
    ///
    /// Rejects empty names and names too long for the header's 16-bit name
    /// length field. A trailing `/` is rejected as it would mark a directory.
    pub fn file(name: impl Into<String>) -> Result<Self, Error> {
        let name = Self::validated(name.into())?;
        if name.ends_with('/') {
            return Err(Error::invalid_name("file name ends with '/'"));
        }
        Ok(EntryName(name))
    }

    /// Creates a directory entry name, appending the trailing `/` when the
    /// caller left it off.
    pub fn directory(name: impl Into<String>) -> Result<Self, Error> {
        let mut name = Self::validated(name.into())?;
        if !name.ends_with('/') {
            name.push('/');
        }
        Ok(EntryName(name))
    }

    fn validated(name: String) -> Result<String, Error> {
        if name.is_empty() {
            return Err(Error::invalid_name("name is empty"));
        }

        // Leave room for the directory slash that may still be appended.
        if name.len() >= u16::MAX as usize {
            return Err(Error::invalid_name("name too long"));
        }

        Ok(name)
    }

    /// Returns true when the name marks a directory.
    pub fn is_dir(&self) -> bool {
        self.0.ends_with('/')
    }

    /// Returns true when every byte is in the portable ASCII subset
    /// (printable, no backslashes).
    pub fn is_portable(&self) -> bool {
        self.0
            .bytes()
            .all(|b| (0x20..0x7f).contains(&b) && b != b'\\')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for EntryName {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EntryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
