use std::ffi::c_void;
use std::ptr;

use crate::bstr::take_bstr;
use crate::clr::method_info::MethodInfo;
use crate::com::{ComPtr, Interface};
use crate::error::ClrResult;
use crate::guid::{Guid, IID_ASSEMBLY};
use crate::native::{BstrPtr, OleAutomation};

crate::vtable! {
    /// `System.Reflection._Assembly` (mscorlib.tlb).
    pub enum AssemblySlot {
        GetTypeInfoCount,
        GetTypeInfo,
        GetIDsOfNames,
        Invoke,
        get_ToString,
        Equals,
        GetHashCode,
        GetType,
        get_CodeBase,
        get_EscapedCodeBase,
        GetName,
        GetName_2,
        get_FullName,
        get_EntryPoint,
        GetType_2,
        GetType_3,
        GetExportedTypes,
        GetTypes,
        GetManifestResourceStream,
        GetManifestResourceStream_2,
        GetFile,
        GetFiles,
        GetFiles_2,
        GetManifestResourceNames,
        GetManifestResourceInfo,
        get_Location,
        get_Evidence,
        GetCustomAttributes,
        GetCustomAttributes_2,
        IsDefined,
        GetObjectData,
        add_ModuleResolve,
        remove_ModuleResolve,
        GetType_4,
        GetSatelliteAssembly,
        GetSatelliteAssembly_2,
        LoadModule,
        LoadModule_2,
        CreateInstance,
        CreateInstance_2,
        CreateInstance_3,
        GetLoadedModules,
        GetLoadedModules_2,
        GetModules,
        GetModules_2,
        GetModule,
        GetReferencedAssemblies,
        get_GlobalAssemblyCache,
    }
}

pub enum IAssembly {}

impl Interface for IAssembly {
    type Slot = AssemblySlot;
    const NAME: &'static str = "_Assembly";
    const IID: Guid = IID_ASSEMBLY;
}

pub type Assembly = ComPtr<IAssembly>;

impl ComPtr<IAssembly> {
    /// `None` for libraries, which have no entry point.
    pub fn entry_point(&self) -> ClrResult<Option<MethodInfo>> {
        let mut method: *mut c_void = ptr::null_mut();
        unsafe { self.call1(AssemblySlot::get_EntryPoint, &mut method as *mut *mut c_void as usize) }
            .check("Assembly.get_EntryPoint")?;
        Ok(unsafe { ComPtr::from_raw(method) })
    }

    pub fn full_name(&self, ole: &OleAutomation) -> ClrResult<String> {
        let mut name: BstrPtr = ptr::null_mut();
        unsafe { self.call1(AssemblySlot::get_FullName, &mut name as *mut BstrPtr as usize) }
            .check("Assembly.get_FullName")?;
        unsafe { take_bstr(ole, name) }
    }
}
