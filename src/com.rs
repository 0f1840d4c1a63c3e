//! Calling into COM objects through their vtables.
//!
//! An interface pointer is the address of an object whose first machine word
//! points at an array of function pointers. The order of that array is the
//! ABI contract of the interface; it is described once per interface with
//! [`vtable!`](crate::vtable) and every call site names a slot from that list
//! instead of an index literal.

use std::ffi::c_void;
use std::fmt;
use std::marker::PhantomData;
use std::mem::{self, ManuallyDrop};
use std::ops::Deref;
use std::ptr::{self, NonNull};

use log::trace;

use crate::error::{ClrResult, MarshalingError};
use crate::guid::{Guid, IID_IUNKNOWN};
use crate::hresult::HRESULT;

/// One entry of an interface's vtable.
pub trait VtableSlot: Copy + fmt::Debug {
    /// Number of slots in the vtable, inherited ones included.
    const COUNT: usize;

    fn index(self) -> usize;
}

/// A COM interface described by its identifier and ordered slot list.
pub trait Interface {
    type Slot: VtableSlot;
    const NAME: &'static str;
    const IID: Guid;
}

/// Declares the slot list of an interface. `QueryInterface`, `AddRef` and
/// `Release` are always slots 0 to 2 and are prepended automatically.
#[macro_export]
macro_rules! vtable {
    ($(#[$meta:meta])* $vis:vis enum $name:ident { $($slot:ident),* $(,)? }) => {
        $(#[$meta])*
        #[repr(usize)]
        #[allow(non_camel_case_types)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        $vis enum $name {
            QueryInterface,
            AddRef,
            Release,
            $($slot),*
        }

        impl $crate::com::VtableSlot for $name {
            const COUNT: usize = 3 + <[&str]>::len(&[$(stringify!($slot)),*]);

            fn index(self) -> usize {
                self as usize
            }
        }
    };
}

vtable! {
    pub enum UnknownSlot {}
}

pub enum IUnknown {}

impl Interface for IUnknown {
    type Slot = UnknownSlot;
    const NAME: &'static str = "IUnknown";
    const IID: Guid = IID_IUNKNOWN;
}

type QueryInterfaceFn = unsafe extern "system" fn(*mut c_void, *const Guid, *mut *mut c_void) -> u32;
type RefCountFn = unsafe extern "system" fn(*mut c_void) -> u32;

type Call0 = unsafe extern "system" fn(*mut c_void) -> u32;
type Call1 = unsafe extern "system" fn(*mut c_void, usize) -> u32;
type Call2 = unsafe extern "system" fn(*mut c_void, usize, usize) -> u32;
type Call3 = unsafe extern "system" fn(*mut c_void, usize, usize, usize) -> u32;

/// Owns one reference to a COM object implementing `I`.
///
/// Dropping releases the reference. [`ComPtr::into_raw`] hands the reference
/// on without releasing it, [`ComPtr::borrow`] gives a view that never
/// releases.
#[repr(transparent)]
pub struct ComPtr<I: Interface> {
    raw: NonNull<c_void>,
    _marker: PhantomData<I>,
}

impl<I: Interface> ComPtr<I> {
    /// Adopts a reference produced by a native call. Returns `None` for null.
    ///
    /// # Safety
    /// `raw` must be null or a live pointer to an object implementing `I`,
    /// and the caller must own the reference it transfers.
    pub unsafe fn from_raw(raw: *mut c_void) -> Option<Self> {
        NonNull::new(raw).map(|raw| ComPtr { raw, _marker: PhantomData })
    }

    pub fn as_raw(&self) -> *mut c_void {
        self.raw.as_ptr()
    }

    /// Detaches the pointer; the caller now owns its reference.
    pub fn into_raw(self) -> *mut c_void {
        let raw = self.raw.as_ptr();
        mem::forget(self);
        raw
    }

    pub fn borrow(&self) -> ComRef<'_, I> {
        ComRef {
            inner: ManuallyDrop::new(ComPtr { raw: self.raw, _marker: PhantomData }),
            _lifetime: PhantomData,
        }
    }

    unsafe fn slot_at<F: Copy>(&self, index: usize) -> F {
        debug_assert_eq!(mem::size_of::<F>(), mem::size_of::<*const c_void>());
        let vtbl = *(self.raw.as_ptr() as *const *const *const c_void);
        let entry = *vtbl.add(index);
        mem::transmute_copy(&entry)
    }

    /// Reads `slot` from the vtable as a function pointer of type `F`.
    ///
    /// # Safety
    /// `F` must be the exact signature of that slot, with the interface
    /// pointer as first parameter.
    pub unsafe fn method<F: Copy>(&self, slot: I::Slot) -> F {
        trace!("{}::{:?} (slot {})", I::NAME, slot, slot.index());
        self.slot_at(slot.index())
    }

    /// # Safety
    /// The slot must take no arguments besides the interface pointer.
    pub unsafe fn call0(&self, slot: I::Slot) -> HRESULT {
        let f: Call0 = self.method(slot);
        HRESULT::from(f(self.as_raw()))
    }

    /// # Safety
    /// The slot must take exactly one machine word after the interface pointer.
    pub unsafe fn call1(&self, slot: I::Slot, a: usize) -> HRESULT {
        let f: Call1 = self.method(slot);
        HRESULT::from(f(self.as_raw(), a))
    }

    /// # Safety
    /// The slot must take exactly two machine words after the interface pointer.
    pub unsafe fn call2(&self, slot: I::Slot, a: usize, b: usize) -> HRESULT {
        let f: Call2 = self.method(slot);
        HRESULT::from(f(self.as_raw(), a, b))
    }

    /// # Safety
    /// The slot must take exactly three machine words after the interface pointer.
    pub unsafe fn call3(&self, slot: I::Slot, a: usize, b: usize, c: usize) -> HRESULT {
        let f: Call3 = self.method(slot);
        HRESULT::from(f(self.as_raw(), a, b, c))
    }

    /// Asks the object for interface `J`.
    pub fn query<J: Interface>(&self) -> ClrResult<ComPtr<J>> {
        let mut out: *mut c_void = ptr::null_mut();
        let hr = unsafe {
            let f: QueryInterfaceFn = self.slot_at(UnknownSlot::QueryInterface.index());
            HRESULT::from(f(self.as_raw(), &J::IID, &mut out))
        };
        hr.check_interface("IUnknown.QueryInterface", J::NAME)?;
        unsafe { ComPtr::from_raw(out) }.ok_or_else(|| MarshalingError::NullHandle("IUnknown.QueryInterface").into())
    }

    /// Reinterprets the pointer as another interface of the same object.
    ///
    /// # Safety
    /// The object must lay out its vtable as `J` at this very address.
    pub unsafe fn cast<J: Interface>(self) -> ComPtr<J> {
        ComPtr { raw: NonNull::new_unchecked(self.into_raw()), _marker: PhantomData }
    }

    fn add_ref(&self) -> u32 {
        unsafe {
            let f: RefCountFn = self.slot_at(UnknownSlot::AddRef.index());
            f(self.as_raw())
        }
    }
}

impl<I: Interface> Clone for ComPtr<I> {
    fn clone(&self) -> Self {
        self.add_ref();
        ComPtr { raw: self.raw, _marker: PhantomData }
    }
}

impl<I: Interface> Drop for ComPtr<I> {
    fn drop(&mut self) {
        unsafe {
            let f: RefCountFn = self.slot_at(UnknownSlot::Release.index());
            f(self.as_raw());
        }
    }
}

impl<I: Interface> fmt::Debug for ComPtr<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:p})", I::NAME, self.raw)
    }
}

/// A non-owning view of an interface pointer. Never releases.
pub struct ComRef<'a, I: Interface> {
    inner: ManuallyDrop<ComPtr<I>>,
    _lifetime: PhantomData<&'a ()>,
}

impl<'a, I: Interface> ComRef<'a, I> {
    /// # Safety
    /// `raw` must be null or point to an object implementing `I` that stays
    /// alive for `'a`.
    pub unsafe fn from_raw(raw: *mut c_void) -> Option<Self> {
        ComPtr::from_raw(raw).map(|ptr| ComRef { inner: ManuallyDrop::new(ptr), _lifetime: PhantomData })
    }

    /// Takes a reference of our own so the object can outlive the view.
    pub fn to_owned(&self) -> ComPtr<I> {
        (*self.inner).clone()
    }
}

impl<'a, I: Interface> Deref for ComRef<'a, I> {
    type Target = ComPtr<I>;

    fn deref(&self) -> &ComPtr<I> {
        &self.inner
    }
}
