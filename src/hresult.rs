use std::fmt;

use crate::error::{ClrError, ClrResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HRESULT {
    Ok,
    False,
    NotImpl,
    NoInterface,
    Pointer,
    InvalidArg,
    OutOfMemory,
    BadIndex,
    ClassNotAvailable,
    ClassNotRegistered,
    FileNotFound,
    CorETypeLoad,
    CorEEntryPointNotFound,
    CorEDLLNotFound,
    Unknown(u32),
}

impl HRESULT {
    pub fn code(&self) -> u32 {
        match *self {
            HRESULT::Ok => 0,
            HRESULT::False => 1,
            HRESULT::NotImpl => 0x80004001,
            HRESULT::NoInterface => 0x80004002,
            HRESULT::Pointer => 0x80004003,
            HRESULT::InvalidArg => 0x80070057,
            HRESULT::OutOfMemory => 0x8007000E,
            HRESULT::BadIndex => 0x8002000B,
            HRESULT::ClassNotAvailable => 0x80040111,
            HRESULT::ClassNotRegistered => 0x80040154,
            HRESULT::FileNotFound => 0x80070002,
            HRESULT::CorETypeLoad => 0x80131522,
            HRESULT::CorEEntryPointNotFound => 0x80131523,
            HRESULT::CorEDLLNotFound => 0x80131524,
            HRESULT::Unknown(hr) => hr,
        }
    }

    pub fn succeeded(&self) -> bool {
        (self.code() as i32) >= 0
    }

    pub fn failed(&self) -> bool {
        !self.succeeded()
    }

    /// Turns a failed status into [`ClrError::NativeCall`] tagged with `operation`.
    pub fn check(self, operation: &'static str) -> ClrResult<()> {
        if self.failed() {
            return Err(ClrError::NativeCall { operation, hr: self });
        }
        return Ok(());
    }

    /// Like [`HRESULT::check`], but statuses that mean "this runtime does not
    /// offer that interface" become [`ClrError::InterfaceNotSupported`].
    pub fn check_interface(self, operation: &'static str, interface: &'static str) -> ClrResult<()> {
        match self {
            HRESULT::NoInterface | HRESULT::ClassNotAvailable | HRESULT::ClassNotRegistered => {
                Err(ClrError::InterfaceNotSupported { interface, hr: self })
            }
            hr => hr.check(operation),
        }
    }
}

impl From<u32> for HRESULT {
    fn from(hr: u32) -> HRESULT {
        match hr {
            0 => HRESULT::Ok,
            1 => HRESULT::False,
            0x80004001 => HRESULT::NotImpl,
            0x80004002 => HRESULT::NoInterface,
            0x80004003 => HRESULT::Pointer,
            0x80070057 => HRESULT::InvalidArg,
            0x8007000E => HRESULT::OutOfMemory,
            0x8002000B => HRESULT::BadIndex,
            0x80040111 => HRESULT::ClassNotAvailable,
            0x80040154 => HRESULT::ClassNotRegistered,
            0x80070002 => HRESULT::FileNotFound,
            0x80131522 => HRESULT::CorETypeLoad,
            0x80131523 => HRESULT::CorEEntryPointNotFound,
            0x80131524 => HRESULT::CorEDLLNotFound,
            _ => HRESULT::Unknown(hr),
        }
    }
}

impl fmt::Display for HRESULT {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.code())
    }
}
