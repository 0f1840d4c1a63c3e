use std::ffi::c_void;
use std::ptr;

use log::debug;

use crate::bstr::take_bstr;
use crate::com::{ComPtr, Interface};
use crate::error::ClrResult;
use crate::guid::{Guid, IID_METHOD_INFO};
use crate::hresult::HRESULT;
use crate::native::{BstrPtr, OleAutomation};
use crate::safearray::{RawSafeArray, SafeArray};
use crate::variant::Variant;

crate::vtable! {
    /// `System.Reflection._MethodInfo` (mscorlib.tlb).
    pub enum MethodInfoSlot {
        GetTypeInfoCount,
        GetTypeInfo,
        GetIDsOfNames,
        Invoke,
        get_ToString,
        Equals,
        GetHashCode,
        GetType,
        get_MemberType,
        get_name,
        get_DeclaringType,
        get_ReflectedType,
        GetCustomAttributes,
        GetCustomAttributes_2,
        IsDefined,
        GetParameters,
        GetMethodImplementationFlags,
        get_MethodHandle,
        get_Attributes,
        get_CallingConvention,
        Invoke_2,
        get_IsPublic,
        get_IsPrivate,
        get_IsFamily,
        get_IsAssembly,
        get_IsFamilyAndAssembly,
        get_IsFamilyOrAssembly,
        get_IsStatic,
        get_IsFinal,
        get_IsVirtual,
        get_IsHideBySig,
        get_IsAbstract,
        get_IsSpecialName,
        get_IsConstructor,
        Invoke_3,
        get_returnType,
        get_ReturnTypeCustomAttributes,
        GetBaseDefinition,
    }
}

pub enum IMethodInfo {}

impl Interface for IMethodInfo {
    type Slot = MethodInfoSlot;
    const NAME: &'static str = "_MethodInfo";
    const IID: Guid = IID_METHOD_INFO;
}

pub type MethodInfo = ComPtr<IMethodInfo>;

/// `Invoke_3(VARIANT obj, SAFEARRAY* parameters, VARIANT* pRetVal)`; the
/// target is passed by value.
type Invoke3Fn = unsafe extern "system" fn(*mut c_void, Variant, *mut RawSafeArray, *mut Variant) -> u32;

impl ComPtr<IMethodInfo> {
    /// The method's `ToString()`, e.g. `Void Main(System.String[])`.
    pub fn signature(&self, ole: &OleAutomation) -> ClrResult<String> {
        let mut text: BstrPtr = ptr::null_mut();
        unsafe { self.call1(MethodInfoSlot::get_ToString, &mut text as *mut BstrPtr as usize) }
            .check("MethodInfo.get_ToString")?;
        unsafe { take_bstr(ole, text) }
    }

    /// Whether the parameter list is non-empty, e.g. `Main(System.String[])`
    /// as opposed to `Main()` with any return type.
    pub fn takes_arguments(&self, ole: &OleAutomation) -> ClrResult<bool> {
        Ok(!self.signature(ole)?.trim_end().ends_with("()"))
    }

    /// Calls the method on `target` (null for static methods) with `args`
    /// (a `VT_VARIANT` array, or none) and returns the `Int32` it produced.
    /// Methods returning `void` yield 0.
    pub fn invoke(&self, ole: &OleAutomation, target: Option<&Variant>, args: Option<&SafeArray<'_>>) -> ClrResult<i32> {
        let target = target.copied().unwrap_or_else(Variant::null);
        let params = match args {
            Some(args) => args.as_raw()?,
            None => ptr::null_mut(),
        };

        let mut ret = Variant::empty();
        let hr = unsafe {
            let invoke: Invoke3Fn = self.method(MethodInfoSlot::Invoke_3);
            HRESULT::from(invoke(self.as_raw(), target, params, &mut ret))
        };
        let code = ret.as_i4().unwrap_or(0);
        unsafe { (ole.api().variant_clear)(&mut ret) };
        hr.check("MethodInfo.Invoke_3")?;

        debug!("entry point returned {}", code);
        Ok(code)
    }
}
