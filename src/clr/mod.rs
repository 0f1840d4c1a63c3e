//! Facades over the CLR hosting interfaces.
//!
//! Each facade is a [`ComPtr`](crate::com::ComPtr) parameterized by the
//! interface's slot table, with operations named after what they do.

mod appdomain;
mod assembly;
mod metahost;
mod method_info;
mod runtime_host;
mod runtime_info;

pub use appdomain::{AppDomain, AppDomainSlot, IAppDomain};
pub use assembly::{Assembly, AssemblySlot, IAssembly};
pub use metahost::{IClrMetaHost, MetaHost, MetaHostSlot};
pub use method_info::{IMethodInfo, MethodInfo, MethodInfoSlot};
pub use runtime_host::{DomainEnum, ICorRuntimeHost, RuntimeHost, RuntimeHostSlot};
pub use runtime_info::{IClrRuntimeInfo, RuntimeInfo, RuntimeInfoSlot};
