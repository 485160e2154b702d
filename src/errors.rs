/// Error raised while constructing or serializing a zip entry.
#[derive(Debug)]
pub struct Error {
    inner: ErrorInner,
}

impl Error {
    pub(crate) fn producer(err: std::io::Error) -> Error {
        Error::from(ErrorKind::Producer(err))
    }

    pub(crate) fn sink(err: std::io::Error) -> Error {
        Error::from(ErrorKind::Sink(err))
    }

    pub(crate) fn codec(err: std::io::Error) -> Error {
        Error::from(ErrorKind::Codec(err))
    }

    pub(crate) fn invalid_name(msg: impl Into<String>) -> Error {
        Error::from(ErrorKind::InvalidName { msg: msg.into() })
    }

    pub(crate) fn invalid_input(msg: impl Into<String>) -> Error {
        Error::from(ErrorKind::InvalidInput { msg: msg.into() })
    }

    /// Returns the kind of error that occurred.
    pub fn kind(&self) -> &ErrorKind {
        &self.inner.kind
    }
}

#[derive(Debug)]
struct ErrorInner {
    kind: ErrorKind,
}

/// Categories of failures surfaced while building or writing an entry.
///
/// None of these are retried internally; retry policy, if any, belongs to
/// whoever drives the archive write.
#[derive(Debug)]
pub enum ErrorKind {
    /// The entry name is empty or otherwise unusable where one is required.
    InvalidName { msg: String },
    /// The caller combined constructor arguments in an unsupported way.
    InvalidInput { msg: String },
    /// The data source raised while supplying uncompressed bytes.
    Producer(std::io::Error),
    /// The compressor rejected its input or could not finalize its stream.
    Codec(std::io::Error),
    /// The destination could not accept further bytes.
    Sink(std::io::Error),
    /// A captured local record did not start with the expected signature.
    InvalidSignature { expected: u32, actual: u32 },
    /// A captured local record was truncated.
    Eof,
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.inner.kind {
            ErrorKind::Producer(err) | ErrorKind::Codec(err) | ErrorKind::Sink(err) => Some(err),
            _ => None,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.inner.kind)?;
        Ok(())
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            ErrorKind::InvalidName { ref msg } => {
                write!(f, "Invalid entry name: {}", msg)
            }
            ErrorKind::InvalidInput { ref msg } => {
                write!(f, "Invalid input: {}", msg)
            }
            ErrorKind::Producer(ref err) => {
                write!(f, "Data source failed: {}", err)
            }
            ErrorKind::Codec(ref err) => {
                write!(f, "Compressor failed: {}", err)
            }
            ErrorKind::Sink(ref err) => {
                write!(f, "Destination failed: {}", err)
            }
            ErrorKind::InvalidSignature { expected, actual } => {
                write!(
                    f,
                    "Invalid signature: expected 0x{:08x}, got 0x{:08x}",
                    expected, actual
                )
            }
            ErrorKind::Eof => {
                write!(f, "Unexpected end of local record")
            }
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error {
            inner: ErrorInner { kind },
        }
    }
}
