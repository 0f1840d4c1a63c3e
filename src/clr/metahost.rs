use std::ffi::c_void;
use std::ptr;

use log::debug;

use crate::bstr::WideCString;
use crate::clr::runtime_info::{IClrRuntimeInfo, RuntimeInfo};
use crate::com::{ComPtr, Interface};
use crate::error::{ClrResult, MarshalingError};
use crate::guid::{Guid, CLSID_CLR_META_HOST, IID_ICLR_META_HOST};
use crate::native::Mscoree;

crate::vtable! {
    /// `ICLRMetaHost` (metahost.h).
    pub enum MetaHostSlot {
        GetRuntime,
        GetVersionFromFile,
        EnumerateInstalledRuntimes,
        EnumerateLoadedRuntimes,
        RequestRuntimeLoadedNotification,
        QueryLegacyV2RuntimeBinding,
        ExitProcess,
    }
}

pub enum IClrMetaHost {}

impl Interface for IClrMetaHost {
    type Slot = MetaHostSlot;
    const NAME: &'static str = "ICLRMetaHost";
    const IID: Guid = IID_ICLR_META_HOST;
}

pub type MetaHost = ComPtr<IClrMetaHost>;

impl ComPtr<IClrMetaHost> {
    pub fn create(mscoree: &Mscoree) -> ClrResult<MetaHost> {
        let host = mscoree.create_instance::<IClrMetaHost>(&CLSID_CLR_META_HOST)?;
        debug!("created {:?}", host);
        Ok(host)
    }

    /// The runtime registered under `version`, e.g. `v4.0.30319`.
    pub fn runtime(&self, version: &str) -> ClrResult<RuntimeInfo> {
        let version_w = WideCString::new(version)?;
        let mut out: *mut c_void = ptr::null_mut();
        let hr = unsafe {
            self.call3(
                MetaHostSlot::GetRuntime,
                version_w.as_ptr() as usize,
                &IClrRuntimeInfo::IID as *const Guid as usize,
                &mut out as *mut *mut c_void as usize,
            )
        };
        hr.check_interface("ICLRMetaHost.GetRuntime", IClrRuntimeInfo::NAME)?;
        unsafe { ComPtr::from_raw(out) }.ok_or_else(|| MarshalingError::NullHandle("ICLRMetaHost.GetRuntime").into())
    }
}
