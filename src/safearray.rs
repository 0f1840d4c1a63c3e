//! One-dimensional SAFEARRAYs: building them from host data and reading them
//! back.

use std::ffi::c_void;
use std::mem;
use std::ops::RangeInclusive;
use std::ptr;

use log::{debug, trace, warn};

use crate::bstr::{take_bstr, Bstr};
use crate::com::{ComPtr, ComRef, IUnknown, Interface};
use crate::error::{ClrError, ClrResult, MarshalingError};
use crate::hresult::HRESULT;
use crate::native::{native_len, BstrPtr, OleAutomation};
use crate::variant::{VarType, Variant, VT_ARRAY, VT_BSTR, VT_DISPATCH, VT_I4, VT_UI1, VT_UNKNOWN, VT_VARIANT};

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SafeArrayBound {
    pub c_elements: u32,
    pub l_lbound: i32,
}

/// Header of a SAFEARRAY as laid out by OleAut32. Multi-dimensional arrays
/// carry further bounds past the end of this struct.
#[repr(C)]
#[derive(Debug)]
pub struct RawSafeArray {
    pub c_dims: u16,
    pub f_features: u16,
    pub cb_elements: u32,
    pub c_locks: u32,
    pub pv_data: *mut c_void,
    pub rgsabound: [SafeArrayBound; 1],
}

/// Plain values that are stored in a SAFEARRAY by copy.
///
/// # Safety
/// `VAR_TYPE` must describe a type with the size and layout of `Self`.
pub unsafe trait Element: Copy + Default {
    const VAR_TYPE: VarType;
}

unsafe impl Element for u8 {
    const VAR_TYPE: VarType = VT_UI1;
}

unsafe impl Element for i32 {
    const VAR_TYPE: VarType = VT_I4;
}

/// An owned SAFEARRAY descriptor.
///
/// Destroying is explicit through [`SafeArray::destroy`] or happens on drop.
/// Every operation on a destroyed array fails with
/// [`MarshalingError::Destroyed`].
pub struct SafeArray<'ole> {
    ole: &'ole OleAutomation,
    raw: *mut RawSafeArray,
}

impl<'ole> SafeArray<'ole> {
    /// A one-dimensional array of `count` elements of type `vt`, lower bound 0.
    pub fn create(ole: &'ole OleAutomation, vt: VarType, count: u32) -> ClrResult<Self> {
        let bound = SafeArrayBound { c_elements: count, l_lbound: 0 };
        let raw = unsafe { (ole.api().safe_array_create)(vt, 1, &bound) };
        if raw.is_null() {
            return Err(MarshalingError::NullHandle("SafeArrayCreate").into());
        }
        trace!("SafeArrayCreate(vt=0x{:04x}, count={}) -> {:p}", vt, count, raw);
        Ok(Self { ole, raw })
    }

    /// A `VT_UI1` array holding a copy of `bytes`.
    pub fn from_bytes(ole: &'ole OleAutomation, bytes: &[u8]) -> ClrResult<Self> {
        if bytes.is_empty() {
            return Err(MarshalingError::EmptyBuffer.into());
        }
        let count = native_len(bytes.len(), "SafeArrayCreate")?;
        let array = Self::create(ole, VT_UI1, count)?;
        unsafe {
            let data = (*array.raw).pv_data as *mut u8;
            if data.is_null() {
                return Err(MarshalingError::NullHandle("SafeArrayCreate.pvData").into());
            }
            ptr::copy_nonoverlapping(bytes.as_ptr(), data, bytes.len());
        }
        debug!("copied {} bytes into SAFEARRAY {:p}", bytes.len(), array.raw);
        Ok(array)
    }

    /// A `VT_BSTR` array; each string is copied in by `SafeArrayPutElement`.
    pub fn from_strings<S: AsRef<str>>(ole: &'ole OleAutomation, strings: &[S]) -> ClrResult<Self> {
        let mut array = Self::create(ole, VT_BSTR, native_len(strings.len(), "SafeArrayCreate")?)?;
        for (i, s) in strings.iter().enumerate() {
            array.put_string(i as i32, s.as_ref())?;
        }
        Ok(array)
    }

    /// The parameter array for `static void Main(string[] args)`: one
    /// `VT_VARIANT` whose value is a `VT_ARRAY | VT_BSTR` of `args`.
    pub fn entry_point_arguments<S: AsRef<str>>(ole: &'ole OleAutomation, args: &[S]) -> ClrResult<Self> {
        let strings = Self::from_strings(ole, args)?;
        let argv = Variant::from_pointer(VT_ARRAY | VT_BSTR, strings.as_raw()? as *mut c_void);

        let mut params = Self::create(ole, VT_VARIANT, 1)?;
        // the put deep-copies the variant, `strings` is still ours to destroy
        params.put_variant(0, &argv)?;
        Ok(params)
    }

    /// Adopts an array produced by a native call.
    ///
    /// # Safety
    /// `raw` must be null or a SAFEARRAY allocated by `ole` that nobody else
    /// will destroy.
    pub unsafe fn from_raw(ole: &'ole OleAutomation, raw: *mut RawSafeArray) -> ClrResult<Self> {
        if raw.is_null() {
            return Err(MarshalingError::NullHandle("SAFEARRAY").into());
        }
        Ok(Self { ole, raw })
    }

    pub fn as_raw(&self) -> ClrResult<*mut RawSafeArray> {
        if self.raw.is_null() {
            return Err(MarshalingError::Destroyed.into());
        }
        Ok(self.raw)
    }

    /// Hands the descriptor on; the caller becomes responsible for destroying it.
    pub fn into_raw(mut self) -> *mut RawSafeArray {
        mem::replace(&mut self.raw, ptr::null_mut())
    }

    pub fn dimensions(&self) -> ClrResult<u32> {
        let raw = self.as_raw()?;
        Ok(unsafe { (self.ole.api().safe_array_get_dim)(raw) })
    }

    pub fn lower_bound(&self, dim: u32) -> ClrResult<i32> {
        let raw = self.as_raw()?;
        let mut bound = 0i32;
        HRESULT::from(unsafe { (self.ole.api().safe_array_get_lbound)(raw, dim, &mut bound) })
            .check("SafeArrayGetLBound")?;
        Ok(bound)
    }

    pub fn upper_bound(&self, dim: u32) -> ClrResult<i32> {
        let raw = self.as_raw()?;
        let mut bound = 0i32;
        HRESULT::from(unsafe { (self.ole.api().safe_array_get_ubound)(raw, dim, &mut bound) })
            .check("SafeArrayGetUBound")?;
        Ok(bound)
    }

    /// Valid indices of a one-dimensional array. Both bounds are inclusive.
    pub fn indices(&self) -> ClrResult<RangeInclusive<i32>> {
        let dims = self.dimensions()?;
        if dims != 1 {
            return Err(MarshalingError::UnexpectedDimensions(dims).into());
        }
        Ok(self.lower_bound(1)?..=self.upper_bound(1)?)
    }

    pub fn len(&self) -> ClrResult<usize> {
        let indices = self.indices()?;
        Ok((i64::from(*indices.end()) - i64::from(*indices.start()) + 1).max(0) as usize)
    }

    pub fn is_empty(&self) -> ClrResult<bool> {
        Ok(self.len()? == 0)
    }

    pub fn element_size(&self) -> ClrResult<u32> {
        let raw = self.as_raw()?;
        Ok(unsafe { (self.ole.api().safe_array_get_elemsize)(raw) })
    }

    pub fn element_type(&self) -> ClrResult<VarType> {
        let raw = self.as_raw()?;
        let mut vt: VarType = 0;
        HRESULT::from(unsafe { (self.ole.api().safe_array_get_vartype)(raw, &mut vt) }).check("SafeArrayGetVartype")?;
        Ok(vt)
    }

    fn expect_type(&self, expected: VarType) -> ClrResult<()> {
        let found = self.element_type()?;
        if found != expected {
            return Err(MarshalingError::ElementType { expected, found }.into());
        }
        Ok(())
    }

    fn expect_interfaces(&self) -> ClrResult<()> {
        match self.element_type()? {
            VT_UNKNOWN | VT_DISPATCH => Ok(()),
            found => Err(MarshalingError::ElementType { expected: VT_UNKNOWN, found }.into()),
        }
    }

    fn expect_plain<T: Element>(&self) -> ClrResult<()> {
        self.expect_type(T::VAR_TYPE)?;
        let found = self.element_size()?;
        let expected = mem::size_of::<T>() as u32;
        if found != expected {
            return Err(MarshalingError::ElementSize { expected, found }.into());
        }
        Ok(())
    }

    /// `index` is absolute; arrays with a nonzero lower bound are not shifted.
    pub fn put_element<T: Element>(&mut self, index: i32, value: T) -> ClrResult<()> {
        self.expect_plain::<T>()?;
        self.put_raw(index, &value as *const T as *const c_void)
    }

    /// Stores a copy of `text`; the temporary BSTR is freed afterwards.
    pub fn put_string(&mut self, index: i32, text: &str) -> ClrResult<()> {
        self.expect_type(VT_BSTR)?;
        let bstr = Bstr::new(self.ole, text)?;
        self.put_raw(index, bstr.as_ptr() as *const c_void)
    }

    /// Stores a deep copy of `value` into a `VT_VARIANT` array.
    pub fn put_variant(&mut self, index: i32, value: &Variant) -> ClrResult<()> {
        self.expect_type(VT_VARIANT)?;
        self.put_raw(index, value as *const Variant as *const c_void)
    }

    fn put_raw(&mut self, index: i32, value: *const c_void) -> ClrResult<()> {
        let raw = self.as_raw()?;
        trace!("SafeArrayPutElement({:p}, {})", raw, index);
        HRESULT::from(unsafe { (self.ole.api().safe_array_put_element)(raw, &index, value) }).check("SafeArrayPutElement")
    }

    fn get_raw(&self, index: i32, out: *mut c_void) -> ClrResult<()> {
        let raw = self.as_raw()?;
        HRESULT::from(unsafe { (self.ole.api().safe_array_get_element)(raw, &index, out) }).check("SafeArrayGetElement")
    }

    pub fn get_element<T: Element>(&self, index: i32) -> ClrResult<T> {
        self.expect_plain::<T>()?;
        let mut value = T::default();
        self.get_raw(index, &mut value as *mut T as *mut c_void)?;
        Ok(value)
    }

    /// Reads a `VT_BSTR` element. OleAut hands out a copy, which is freed
    /// once decoded.
    pub fn get_string(&self, index: i32) -> ClrResult<String> {
        self.expect_type(VT_BSTR)?;
        let mut bstr: BstrPtr = ptr::null_mut();
        self.get_raw(index, &mut bstr as *mut BstrPtr as *mut c_void)?;
        unsafe { take_bstr(self.ole, bstr) }
    }

    /// Reads an interface element. OleAut adds a reference for the copy, so
    /// the result is owned.
    pub fn get_interface(&self, index: i32) -> ClrResult<ComPtr<IUnknown>> {
        self.expect_interfaces()?;
        let mut out: *mut c_void = ptr::null_mut();
        self.get_raw(index, &mut out as *mut *mut c_void as *mut c_void)?;
        unsafe { ComPtr::from_raw(out) }.ok_or_else(|| MarshalingError::NullHandle("SafeArrayGetElement").into())
    }

    /// Views an interface element in place, without taking a reference. The
    /// view cannot outlive the array.
    ///
    /// # Safety
    /// The element must implement `I` at the stored address.
    pub unsafe fn borrow_interface<I: Interface>(&self, index: i32) -> ClrResult<ComRef<'_, I>> {
        self.expect_interfaces()?;
        let indices = self.indices()?;
        if !indices.contains(&index) {
            return Err(ClrError::NativeCall { operation: "SAFEARRAY element", hr: HRESULT::BadIndex });
        }
        let raw = self.as_raw()?;
        let data = (*raw).pv_data as *const *mut c_void;
        if data.is_null() {
            return Err(MarshalingError::NullHandle("SAFEARRAY.pvData").into());
        }
        let element = *data.add((index - *indices.start()) as usize);
        ComRef::from_raw(element).ok_or_else(|| MarshalingError::NullHandle("SAFEARRAY element").into())
    }

    /// All bytes of a `VT_UI1` array, read element by element.
    pub fn to_bytes(&self) -> ClrResult<Vec<u8>> {
        let indices = self.indices()?;
        let mut bytes = Vec::with_capacity(self.len()?);
        for i in indices {
            bytes.push(self.get_element::<u8>(i)?);
        }
        Ok(bytes)
    }

    /// Destroys the descriptor and its data, releasing contained interfaces
    /// and freeing contained strings.
    pub fn destroy(&mut self) -> ClrResult<()> {
        let raw = self.as_raw()?;
        trace!("SafeArrayDestroy({:p})", raw);
        HRESULT::from(unsafe { (self.ole.api().safe_array_destroy)(raw) }).check("SafeArrayDestroy")?;
        // a failed destroy leaves the array live for a retry or for drop
        self.raw = ptr::null_mut();
        Ok(())
    }
}

impl<'ole> Drop for SafeArray<'ole> {
    fn drop(&mut self) {
        if self.raw.is_null() {
            return;
        }
        if let Err(e) = self.destroy() {
            warn!("{}", e);
        }
    }
}
