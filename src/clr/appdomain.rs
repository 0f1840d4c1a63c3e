use std::ffi::c_void;
use std::ptr;

use log::debug;

use crate::bstr::{take_bstr, Bstr};
use crate::clr::assembly::{Assembly, IAssembly};
use crate::com::{ComPtr, Interface};
use crate::error::{ClrResult, MarshalingError};
use crate::guid::{Guid, IID_APP_DOMAIN};
use crate::native::{BstrPtr, OleAutomation};
use crate::safearray::{RawSafeArray, SafeArray};

crate::vtable! {
    /// `System._AppDomain` (mscorlib.tlb). Dual interface, so the four
    /// `IDispatch` slots come first.
    pub enum AppDomainSlot {
        GetTypeInfoCount,
        GetTypeInfo,
        GetIDsOfNames,
        Invoke,
        get_ToString,
        Equals,
        GetHashCode,
        GetType,
        InitializeLifetimeService,
        GetLifetimeService,
        get_Evidence,
        add_DomainUnload,
        remove_DomainUnload,
        add_AssemblyLoad,
        remove_AssemblyLoad,
        add_ProcessExit,
        remove_ProcessExit,
        add_TypeResolve,
        remove_TypeResolve,
        add_ResourceResolve,
        remove_ResourceResolve,
        add_AssemblyResolve,
        remove_AssemblyResolve,
        add_UnhandledException,
        remove_UnhandledException,
        DefineDynamicAssembly,
        DefineDynamicAssembly_2,
        DefineDynamicAssembly_3,
        DefineDynamicAssembly_4,
        DefineDynamicAssembly_5,
        DefineDynamicAssembly_6,
        DefineDynamicAssembly_7,
        DefineDynamicAssembly_8,
        DefineDynamicAssembly_9,
        CreateInstance,
        CreateInstanceFrom,
        CreateInstance_2,
        CreateInstanceFrom_2,
        CreateInstance_3,
        CreateInstanceFrom_3,
        Load,
        Load_2,
        Load_3,
        Load_4,
        Load_5,
        Load_6,
        Load_7,
        ExecuteAssembly,
        ExecuteAssembly_2,
        ExecuteAssembly_3,
        get_FriendlyName,
        get_BaseDirectory,
        get_RelativeSearchPath,
        get_ShadowCopyFiles,
        GetAssemblies,
        AppendPrivatePath,
        ClearPrivatePath,
        SetShadowCopyPath,
        ClearShadowCopyPath,
        SetCachePath,
        SetData,
        GetData,
        SetAppDomainPolicy,
        SetThreadPrincipal,
        SetPrincipalPolicy,
        DoCallBack,
        get_DynamicDirectory,
    }
}

pub enum IAppDomain {}

impl Interface for IAppDomain {
    type Slot = AppDomainSlot;
    const NAME: &'static str = "_AppDomain";
    const IID: Guid = IID_APP_DOMAIN;
}

pub type AppDomain = ComPtr<IAppDomain>;

fn adopt_assembly(raw: *mut c_void, operation: &'static str) -> ClrResult<Assembly> {
    unsafe { ComPtr::from_raw(raw) }.ok_or_else(|| MarshalingError::NullHandle(operation).into())
}

impl ComPtr<IAppDomain> {
    pub fn friendly_name(&self, ole: &OleAutomation) -> ClrResult<String> {
        let mut name: BstrPtr = ptr::null_mut();
        unsafe { self.call1(AppDomainSlot::get_FriendlyName, &mut name as *mut BstrPtr as usize) }
            .check("AppDomain.get_FriendlyName")?;
        unsafe { take_bstr(ole, name) }
    }

    /// `Load(byte[])`; the runtime copies the image, `raw_assembly` stays ours.
    pub fn load_from_bytes(&self, raw_assembly: &SafeArray<'_>) -> ClrResult<Assembly> {
        let psa = raw_assembly.as_raw()?;
        let mut assembly: *mut c_void = ptr::null_mut();
        unsafe {
            self.call2(AppDomainSlot::Load_3, psa as usize, &mut assembly as *mut *mut c_void as usize)
        }
        .check("AppDomain.Load_3")?;
        debug!("loaded in-memory assembly at {:p}", assembly);
        adopt_assembly(assembly, "AppDomain.Load_3")
    }

    /// `Load(string)` by display name.
    pub fn load_by_name(&self, ole: &OleAutomation, assembly_name: &str) -> ClrResult<Assembly> {
        let name = Bstr::new(ole, assembly_name)?;
        let mut assembly: *mut c_void = ptr::null_mut();
        unsafe {
            self.call2(AppDomainSlot::Load_2, name.as_ptr() as usize, &mut assembly as *mut *mut c_void as usize)
        }
        .check("AppDomain.Load_2")?;
        adopt_assembly(assembly, "AppDomain.Load_2")
    }

    /// Full names of every assembly loaded into this domain.
    pub fn list_assemblies(&self, ole: &OleAutomation) -> ClrResult<Vec<String>> {
        let mut psa: *mut RawSafeArray = ptr::null_mut();
        unsafe { self.call1(AppDomainSlot::GetAssemblies, &mut psa as *mut *mut RawSafeArray as usize) }
            .check("AppDomain.GetAssemblies")?;
        let assemblies = unsafe { SafeArray::from_raw(ole, psa)? };

        let indices = assemblies.indices()?;
        let mut names = Vec::with_capacity(assemblies.len()?);
        for i in indices {
            // elements stay owned by the array; the names are copies
            let assembly = unsafe { assemblies.borrow_interface::<IAssembly>(i)? };
            names.push(assembly.full_name(ole)?);
        }
        Ok(names)
    }
}
