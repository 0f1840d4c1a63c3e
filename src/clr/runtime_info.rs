use std::ffi::c_void;
use std::ptr;

use log::debug;

use crate::com::{ComPtr, Interface};
use crate::error::{ClrResult, MarshalingError};
use crate::guid::{Guid, IID_ICLR_RUNTIME_INFO};

crate::vtable! {
    /// `ICLRRuntimeInfo` (metahost.h).
    pub enum RuntimeInfoSlot {
        GetVersionString,
        GetRuntimeDirectory,
        IsLoaded,
        LoadErrorString,
        LoadLibrary,
        GetProcAddress,
        GetInterface,
        IsLoadable,
        SetDefaultStartupFlags,
        GetDefaultStartupFlags,
        BindAsLegacyV2Runtime,
        IsStarted,
    }
}

pub enum IClrRuntimeInfo {}

impl Interface for IClrRuntimeInfo {
    type Slot = RuntimeInfoSlot;
    const NAME: &'static str = "ICLRRuntimeInfo";
    const IID: Guid = IID_ICLR_RUNTIME_INFO;
}

pub type RuntimeInfo = ComPtr<IClrRuntimeInfo>;

/// `HRESULT_FROM_WIN32(ERROR_INSUFFICIENT_BUFFER)`
const INSUFFICIENT_BUFFER: u32 = 0x8007007A;

impl ComPtr<IClrRuntimeInfo> {
    pub fn is_loadable(&self) -> ClrResult<bool> {
        let mut loadable: i32 = 0;
        unsafe { self.call1(RuntimeInfoSlot::IsLoadable, &mut loadable as *mut i32 as usize) }
            .check("ICLRRuntimeInfo.IsLoadable")?;
        Ok(loadable != 0)
    }

    /// Binds this runtime as the one legacy activation paths (such as
    /// `ICorRuntimeHost`) resolve to.
    pub fn bind_as_legacy_runtime(&self) -> ClrResult<()> {
        unsafe { self.call0(RuntimeInfoSlot::BindAsLegacyV2Runtime) }.check("ICLRRuntimeInfo.BindAsLegacyV2Runtime")
    }

    /// Instantiates `clsid` inside this runtime and asks it for `I`.
    pub fn get_interface<I: Interface>(&self, clsid: &Guid) -> ClrResult<ComPtr<I>> {
        let mut out: *mut c_void = ptr::null_mut();
        let hr = unsafe {
            self.call3(
                RuntimeInfoSlot::GetInterface,
                clsid as *const Guid as usize,
                &I::IID as *const Guid as usize,
                &mut out as *mut *mut c_void as usize,
            )
        };
        hr.check_interface("ICLRRuntimeInfo.GetInterface", I::NAME)?;
        let itf = unsafe { ComPtr::from_raw(out) }
            .ok_or(MarshalingError::NullHandle("ICLRRuntimeInfo.GetInterface"))?;
        debug!("got {:?} from {:?}", itf, clsid);
        Ok(itf)
    }

    pub fn version_string(&self) -> ClrResult<String> {
        let mut len: u32 = 0;
        let hr = unsafe {
            self.call2(RuntimeInfoSlot::GetVersionString, 0, &mut len as *mut u32 as usize)
        };
        if hr.code() != INSUFFICIENT_BUFFER {
            hr.check("ICLRRuntimeInfo.GetVersionString")?;
        }

        let mut buf = vec![0u16; len as usize];
        unsafe {
            self.call2(
                RuntimeInfoSlot::GetVersionString,
                buf.as_mut_ptr() as usize,
                &mut len as *mut u32 as usize,
            )
        }
        .check("ICLRRuntimeInfo.GetVersionString")?;

        // the reported length counts the terminator
        let end = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
        String::from_utf16(&buf[..end]).map_err(|_| MarshalingError::InvalidUtf16.into())
    }
}
