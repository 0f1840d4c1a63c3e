use std::ffi::c_void;

pub type VarType = u16;

pub const VT_EMPTY: VarType = 0;
pub const VT_NULL: VarType = 1;
pub const VT_I4: VarType = 3;
pub const VT_BSTR: VarType = 8;
pub const VT_DISPATCH: VarType = 9;
pub const VT_VARIANT: VarType = 12;
pub const VT_UNKNOWN: VarType = 13;
pub const VT_UI1: VarType = 0x11;
pub const VT_ARRAY: VarType = 0x2000;

/// Binary layout of an OLE `VARIANT`: a type tag, three reserved words and a
/// union that is two pointers wide.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct Variant {
    pub vt: VarType,
    reserved: [u16; 3],
    pub val: usize,
    record: usize,
}

impl Variant {
    pub const fn empty() -> Variant {
        Variant { vt: VT_EMPTY, reserved: [0; 3], val: 0, record: 0 }
    }

    pub const fn null() -> Variant {
        Variant { vt: VT_NULL, ..Variant::empty() }
    }

    pub const fn from_i4(value: i32) -> Variant {
        Variant { vt: VT_I4, val: value as u32 as usize, ..Variant::empty() }
    }

    pub fn from_pointer(vt: VarType, ptr: *mut c_void) -> Variant {
        Variant { vt, val: ptr as usize, ..Variant::empty() }
    }

    pub fn as_i4(&self) -> Option<i32> {
        if self.vt == VT_I4 {
            Some(self.val as u32 as i32)
        } else {
            None
        }
    }

    pub fn as_pointer(&self) -> *mut c_void {
        self.val as *mut c_void
    }
}

impl Default for Variant {
    fn default() -> Self {
        Variant::empty()
    }
}
