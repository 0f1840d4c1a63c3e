use std::error::Error;
use std::fmt;
use std::io;

use crate::hresult::HRESULT;

pub type ClrResult<T> = Result<T, ClrError>;

#[derive(Debug)]
pub enum ClrError {
    /// A native call returned a failure status.
    NativeCall { operation: &'static str, hr: HRESULT },
    /// The runtime does not offer an interface we asked it for.
    InterfaceNotSupported { interface: &'static str, hr: HRESULT },
    Marshaling(MarshalingError),
    /// Lookup finished without locating the target.
    NotFound(String),
    Library(libloading::Error),
    Io(io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarshalingError {
    EmptyBuffer,
    NullHandle(&'static str),
    UnexpectedDimensions(u32),
    ElementType { expected: u16, found: u16 },
    ElementSize { expected: u32, found: u32 },
    Destroyed,
    InvalidUtf16,
    InteriorNul,
}

impl fmt::Display for ClrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClrError::NativeCall { operation, hr } => write!(f, "{} returned {}", operation, hr),
            ClrError::InterfaceNotSupported { interface, hr } => {
                write!(f, "interface {} is not supported by this runtime ({})", interface, hr)
            }
            ClrError::Marshaling(e) => write!(f, "marshaling failed: {}", e),
            ClrError::NotFound(what) => write!(f, "could not find {}", what),
            ClrError::Library(e) => write!(f, "{}", e),
            ClrError::Io(e) => write!(f, "{}", e),
        }
    }
}

impl fmt::Display for MarshalingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarshalingError::EmptyBuffer => write!(f, "cannot build a SAFEARRAY from an empty buffer"),
            MarshalingError::NullHandle(what) => write!(f, "{} returned a null handle", what),
            MarshalingError::UnexpectedDimensions(d) => write!(f, "expected dimension of 1, got {}", d),
            MarshalingError::ElementType { expected, found } => {
                write!(f, "expected element type 0x{:04x}, got 0x{:04x}", expected, found)
            }
            MarshalingError::ElementSize { expected, found } => {
                write!(f, "expected element size {}, got {}", expected, found)
            }
            MarshalingError::Destroyed => write!(f, "SAFEARRAY used after it was destroyed"),
            MarshalingError::InvalidUtf16 => write!(f, "string is not valid UTF-16"),
            MarshalingError::InteriorNul => write!(f, "string contains an interior nul"),
        }
    }
}

impl Error for ClrError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ClrError::Library(e) => Some(e),
            ClrError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl Error for MarshalingError {}

impl From<MarshalingError> for ClrError {
    fn from(e: MarshalingError) -> ClrError {
        ClrError::Marshaling(e)
    }
}

impl From<io::Error> for ClrError {
    fn from(e: io::Error) -> ClrError {
        ClrError::Io(e)
    }
}

impl From<libloading::Error> for ClrError {
    fn from(e: libloading::Error) -> ClrError {
        ClrError::Library(e)
    }
}
