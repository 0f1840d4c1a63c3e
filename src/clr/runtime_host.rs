use std::ffi::c_void;
use std::ptr;

use log::{debug, warn};

use crate::bstr::WideCString;
use crate::clr::appdomain::{AppDomain, IAppDomain};
use crate::com::{ComPtr, IUnknown, Interface};
use crate::error::{ClrError, ClrResult, MarshalingError};
use crate::guid::{Guid, IID_ICOR_RUNTIME_HOST};
use crate::hresult::HRESULT;
use crate::native::OleAutomation;

crate::vtable! {
    /// `ICorRuntimeHost` (mscoree.h), the legacy hosting interface that still
    /// exposes application domains.
    pub enum RuntimeHostSlot {
        CreateLogicalThreadState,
        DeleteLogicalThreadState,
        SwitchInLogicalThreadState,
        SwitchOutLogicalThreadState,
        LocksHeldByLogicalThread,
        MapFile,
        GetConfiguration,
        Start,
        Stop,
        CreateDomain,
        GetDefaultDomain,
        EnumDomains,
        NextDomain,
        CloseEnum,
        CreateDomainEx,
        CreateDomainSetup,
        CreateEvidence,
        UnloadDomain,
        CurrentDomain,
    }
}

pub enum ICorRuntimeHost {}

impl Interface for ICorRuntimeHost {
    type Slot = RuntimeHostSlot;
    const NAME: &'static str = "ICorRuntimeHost";
    const IID: Guid = IID_ICOR_RUNTIME_HOST;
}

pub type RuntimeHost = ComPtr<ICorRuntimeHost>;

/// The domain-returning calls hand out `IUnknown`; the facade wants `_AppDomain`.
fn adopt_domain(unknown: *mut c_void, operation: &'static str) -> ClrResult<AppDomain> {
    let unknown = unsafe { ComPtr::<IUnknown>::from_raw(unknown) }.ok_or(MarshalingError::NullHandle(operation))?;
    unknown.query::<IAppDomain>()
}

impl ComPtr<ICorRuntimeHost> {
    pub fn start(&self) -> ClrResult<()> {
        unsafe { self.call0(RuntimeHostSlot::Start) }.check("ICorRuntimeHost.Start")?;
        debug!("runtime host started");
        Ok(())
    }

    pub fn default_domain(&self) -> ClrResult<AppDomain> {
        let mut unknown: *mut c_void = ptr::null_mut();
        unsafe { self.call1(RuntimeHostSlot::GetDefaultDomain, &mut unknown as *mut *mut c_void as usize) }
            .check("ICorRuntimeHost.GetDefaultDomain")?;
        adopt_domain(unknown, "ICorRuntimeHost.GetDefaultDomain")
    }

    /// Starts enumerating the domains of this host. The enumeration is closed
    /// when the returned value goes away.
    pub fn domains(&self) -> ClrResult<DomainEnum<'_>> {
        let mut handle: *mut c_void = ptr::null_mut();
        unsafe { self.call1(RuntimeHostSlot::EnumDomains, &mut handle as *mut *mut c_void as usize) }
            .check("ICorRuntimeHost.EnumDomains")?;
        Ok(DomainEnum { host: self, handle, open: true })
    }

    pub fn create_domain(&self, friendly_name: &str) -> ClrResult<AppDomain> {
        let name_w = WideCString::new(friendly_name)?;
        let mut unknown: *mut c_void = ptr::null_mut();
        unsafe {
            self.call3(
                RuntimeHostSlot::CreateDomain,
                name_w.as_ptr() as usize,
                0,
                &mut unknown as *mut *mut c_void as usize,
            )
        }
        .check("ICorRuntimeHost.CreateDomain")?;
        debug!("created domain {:?}", friendly_name);
        adopt_domain(unknown, "ICorRuntimeHost.CreateDomain")
    }

    /// The domain called `friendly_name`, created if no domain has that name
    /// yet. Repeated calls with the same name yield the same domain.
    pub fn find_or_create_domain(&self, ole: &OleAutomation, friendly_name: &str) -> ClrResult<AppDomain> {
        let mut domains = self.domains()?;
        while let Some(domain) = domains.next_domain()? {
            let name = domain.friendly_name(ole)?;
            if !name.is_empty() && name == friendly_name {
                domains.close()?;
                debug!("reusing domain {:?}", friendly_name);
                return Ok(domain);
            }
        }
        domains.close()?;
        self.create_domain(friendly_name)
    }

    /// The first domain able to load `assembly_name`.
    pub fn find_domain_with_assembly(&self, ole: &OleAutomation, assembly_name: &str) -> ClrResult<AppDomain> {
        let mut domains = self.domains()?;
        while let Some(domain) = domains.next_domain()? {
            match domain.load_by_name(ole, assembly_name) {
                Ok(_) => {
                    domains.close()?;
                    return Ok(domain);
                }
                Err(ClrError::NativeCall { hr: HRESULT::FileNotFound, .. }) => continue,
                Err(e) => return Err(e),
            }
        }
        Err(ClrError::NotFound(format!("a domain that loads {}", assembly_name)))
    }
}

/// An open `HDOMAINENUM`.
pub struct DomainEnum<'h> {
    host: &'h RuntimeHost,
    handle: *mut c_void,
    open: bool,
}

impl<'h> DomainEnum<'h> {
    /// The next domain, or `None` once the host signals the end with `S_FALSE`.
    pub fn next_domain(&mut self) -> ClrResult<Option<AppDomain>> {
        let mut unknown: *mut c_void = ptr::null_mut();
        let hr = unsafe {
            self.host.call2(
                RuntimeHostSlot::NextDomain,
                self.handle as usize,
                &mut unknown as *mut *mut c_void as usize,
            )
        };
        match hr {
            HRESULT::Ok => adopt_domain(unknown, "ICorRuntimeHost.NextDomain").map(Some),
            HRESULT::False => Ok(None),
            hr => {
                hr.check("ICorRuntimeHost.NextDomain")?;
                // other success codes carry no domain either
                Ok(None)
            }
        }
    }

    pub fn close(mut self) -> ClrResult<()> {
        self.close_handle()
    }

    fn close_handle(&mut self) -> ClrResult<()> {
        if !self.open {
            return Ok(());
        }
        self.open = false;
        unsafe { self.host.call1(RuntimeHostSlot::CloseEnum, self.handle as usize) }.check("ICorRuntimeHost.CloseEnum")
    }
}

impl<'h> Iterator for DomainEnum<'h> {
    type Item = ClrResult<AppDomain>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_domain().transpose()
    }
}

impl<'h> Drop for DomainEnum<'h> {
    fn drop(&mut self) {
        if let Err(e) = self.close_handle() {
            warn!("{}", e);
        }
    }
}
