//! Entry points exported by `OleAut32.dll` and `mscoree.dll`.
//!
//! Each library is opened once and its symbols are resolved eagerly into a
//! table of plain function pointers. The table lives as long as the owning
//! value; dropping it unloads the library.

extern crate libloading as lib;

use std::ffi::c_void;
use std::ptr;

use log::debug;

use crate::com::{ComPtr, Interface};
use crate::error::{ClrError, ClrResult, MarshalingError};
use crate::guid::Guid;
use crate::hresult::HRESULT;
use crate::safearray::{RawSafeArray, SafeArrayBound};
use crate::variant::{VarType, Variant};

/// Address of the first character of a length-prefixed wide string.
pub type BstrPtr = *mut u16;

pub type SafeArrayCreateFn =
    unsafe extern "system" fn(vt: VarType, c_dims: u32, bounds: *const SafeArrayBound) -> *mut RawSafeArray;
pub type SafeArrayDestroyFn = unsafe extern "system" fn(psa: *mut RawSafeArray) -> u32;
pub type SafeArrayPutElementFn =
    unsafe extern "system" fn(psa: *mut RawSafeArray, indices: *const i32, pv: *const c_void) -> u32;
pub type SafeArrayGetElementFn =
    unsafe extern "system" fn(psa: *mut RawSafeArray, indices: *const i32, pv: *mut c_void) -> u32;
pub type SafeArrayGetDimFn = unsafe extern "system" fn(psa: *mut RawSafeArray) -> u32;
pub type SafeArrayGetBoundFn = unsafe extern "system" fn(psa: *mut RawSafeArray, n_dim: u32, bound: *mut i32) -> u32;
pub type SafeArrayGetElemsizeFn = unsafe extern "system" fn(psa: *mut RawSafeArray) -> u32;
pub type SafeArrayGetVartypeFn = unsafe extern "system" fn(psa: *mut RawSafeArray, vt: *mut VarType) -> u32;
pub type SysAllocStringLenFn = unsafe extern "system" fn(chars: *const u16, len: u32) -> BstrPtr;
pub type SysStringLenFn = unsafe extern "system" fn(bstr: BstrPtr) -> u32;
pub type SysFreeStringFn = unsafe extern "system" fn(bstr: BstrPtr);
pub type VariantClearFn = unsafe extern "system" fn(var: *mut Variant) -> u32;

pub type ClrCreateInstanceFn =
    unsafe extern "system" fn(clsid: *const Guid, riid: *const Guid, out: *mut *mut c_void) -> u32;

#[derive(Clone, Copy)]
pub struct OleAutTable {
    pub safe_array_create: SafeArrayCreateFn,
    pub safe_array_destroy: SafeArrayDestroyFn,
    pub safe_array_put_element: SafeArrayPutElementFn,
    pub safe_array_get_element: SafeArrayGetElementFn,
    pub safe_array_get_dim: SafeArrayGetDimFn,
    pub safe_array_get_lbound: SafeArrayGetBoundFn,
    pub safe_array_get_ubound: SafeArrayGetBoundFn,
    pub safe_array_get_elemsize: SafeArrayGetElemsizeFn,
    pub safe_array_get_vartype: SafeArrayGetVartypeFn,
    pub sys_alloc_string_len: SysAllocStringLenFn,
    pub sys_string_len: SysStringLenFn,
    pub sys_free_string: SysFreeStringFn,
    pub variant_clear: VariantClearFn,
}

impl OleAutTable {
    fn resolve(library: &lib::Library) -> ClrResult<Self> {
        unsafe {
            Ok(Self {
                safe_array_create: *library.get(b"SafeArrayCreate\0")?,
                safe_array_destroy: *library.get(b"SafeArrayDestroy\0")?,
                safe_array_put_element: *library.get(b"SafeArrayPutElement\0")?,
                safe_array_get_element: *library.get(b"SafeArrayGetElement\0")?,
                safe_array_get_dim: *library.get(b"SafeArrayGetDim\0")?,
                safe_array_get_lbound: *library.get(b"SafeArrayGetLBound\0")?,
                safe_array_get_ubound: *library.get(b"SafeArrayGetUBound\0")?,
                safe_array_get_elemsize: *library.get(b"SafeArrayGetElemsize\0")?,
                safe_array_get_vartype: *library.get(b"SafeArrayGetVartype\0")?,
                sys_alloc_string_len: *library.get(b"SysAllocStringLen\0")?,
                sys_string_len: *library.get(b"SysStringLen\0")?,
                sys_free_string: *library.get(b"SysFreeString\0")?,
                variant_clear: *library.get(b"VariantClear\0")?,
            })
        }
    }
}

/// The OLE Automation allocator family: SAFEARRAYs, BSTRs and VARIANTs.
pub struct OleAutomation {
    api: OleAutTable,
    _library: Option<lib::Library>,
}

impl OleAutomation {
    pub fn load() -> ClrResult<Self> {
        let library = load_library("OleAut32.dll")?;
        let api = OleAutTable::resolve(&library)?;
        debug!("resolved OleAut32.dll");
        Ok(Self { api, _library: Some(library) })
    }

    /// Uses an already resolved table, e.g. one pointing into this process.
    pub fn from_table(api: OleAutTable) -> Self {
        Self { api, _library: None }
    }

    pub fn api(&self) -> &OleAutTable {
        &self.api
    }
}

/// The CLR shim, source of the `ICLRMetaHost` root object.
pub struct Mscoree {
    clr_create_instance: ClrCreateInstanceFn,
    _library: Option<lib::Library>,
}

impl Mscoree {
    pub fn load() -> ClrResult<Self> {
        let library = load_library("mscoree.dll")?;
        let clr_create_instance = unsafe { *library.get::<ClrCreateInstanceFn>(b"CLRCreateInstance\0")? };
        debug!("resolved mscoree.dll");
        Ok(Self { clr_create_instance, _library: Some(library) })
    }

    pub fn from_fn(clr_create_instance: ClrCreateInstanceFn) -> Self {
        Self { clr_create_instance, _library: None }
    }

    /// `CLRCreateInstance(clsid, I::IID, &out)`.
    pub fn create_instance<I: Interface>(&self, clsid: &Guid) -> ClrResult<ComPtr<I>> {
        let mut out: *mut c_void = ptr::null_mut();
        let hr = HRESULT::from(unsafe { (self.clr_create_instance)(clsid, &I::IID, &mut out) });
        hr.check_interface("CLRCreateInstance", I::NAME)?;
        unsafe { ComPtr::from_raw(out) }.ok_or_else(|| MarshalingError::NullHandle("CLRCreateInstance").into())
    }
}

/// Element and character counts cross the boundary as `u32`; larger ones are
/// refused the way the allocator would refuse them.
pub(crate) fn native_len(len: usize, operation: &'static str) -> ClrResult<u32> {
    u32::try_from(len).map_err(|_| ClrError::NativeCall { operation, hr: HRESULT::OutOfMemory })
}

fn load_library(name: &str) -> ClrResult<lib::Library> {
    let library = unsafe { lib::Library::new(name)? };
    debug!("loaded {}", name);
    Ok(library)
}
