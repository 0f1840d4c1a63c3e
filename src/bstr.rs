use std::ptr;
use std::slice;

use crate::error::{ClrResult, MarshalingError};
use crate::native::{native_len, BstrPtr, OleAutomation};

/// An owned BSTR: UTF-16 characters preceded by a 4-byte byte-length.
/// Freed with `SysFreeString` on drop. Never mutated once built.
pub struct Bstr<'ole> {
    ole: &'ole OleAutomation,
    raw: BstrPtr,
}

impl<'ole> Bstr<'ole> {
    pub fn new(ole: &'ole OleAutomation, text: &str) -> ClrResult<Self> {
        let wide: Vec<u16> = text.encode_utf16().collect();
        let chars = if wide.is_empty() { ptr::null() } else { wide.as_ptr() };
        let len = native_len(wide.len(), "SysAllocStringLen")?;
        let raw = unsafe { (ole.api().sys_alloc_string_len)(chars, len) };
        if raw.is_null() {
            return Err(MarshalingError::NullHandle("SysAllocStringLen").into());
        }
        Ok(Self { ole, raw })
    }

    /// Takes ownership of a BSTR handed out by a native call. Null is
    /// accepted and reads as the empty string.
    ///
    /// # Safety
    /// `raw` must be null or a BSTR allocated by `ole` that nobody else frees.
    pub unsafe fn from_raw(ole: &'ole OleAutomation, raw: BstrPtr) -> Self {
        Self { ole, raw }
    }

    pub fn as_ptr(&self) -> BstrPtr {
        self.raw
    }

    pub fn into_raw(mut self) -> BstrPtr {
        std::mem::replace(&mut self.raw, ptr::null_mut())
    }

    /// Length in UTF-16 code units, taken from the prefix.
    pub fn len(&self) -> usize {
        if self.raw.is_null() {
            return 0;
        }
        unsafe { (self.ole.api().sys_string_len)(self.raw) as usize }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn decode(&self) -> ClrResult<String> {
        if self.raw.is_null() {
            return Ok(String::new());
        }
        let chars = unsafe { slice::from_raw_parts(self.raw as *const u16, self.len()) };
        String::from_utf16(chars).map_err(|_| MarshalingError::InvalidUtf16.into())
    }
}

impl<'ole> Drop for Bstr<'ole> {
    fn drop(&mut self) {
        if !self.raw.is_null() {
            unsafe { (self.ole.api().sys_free_string)(self.raw) };
        }
    }
}

/// Decodes a BSTR without taking ownership of it.
///
/// # Safety
/// `raw` must be null or a live BSTR allocated by `ole`.
pub unsafe fn read_bstr(ole: &OleAutomation, raw: BstrPtr) -> ClrResult<String> {
    let borrowed = std::mem::ManuallyDrop::new(Bstr::from_raw(ole, raw));
    borrowed.decode()
}

/// Decodes a BSTR received from a native call and frees it.
///
/// # Safety
/// Same as [`Bstr::from_raw`].
pub unsafe fn take_bstr(ole: &OleAutomation, raw: BstrPtr) -> ClrResult<String> {
    Bstr::from_raw(ole, raw).decode()
}

/// A nul-terminated UTF-16 string for `LPCWSTR` parameters.
pub struct WideCString(Vec<u16>);

impl WideCString {
    pub fn new(text: &str) -> ClrResult<Self> {
        let mut wide: Vec<u16> = text.encode_utf16().collect();
        if wide.contains(&0) {
            return Err(MarshalingError::InteriorNul.into());
        }
        wide.push(0);
        Ok(WideCString(wide))
    }

    pub fn as_ptr(&self) -> *const u16 {
        self.0.as_ptr()
    }
}
