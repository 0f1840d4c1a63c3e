//! Hosting the .NET Framework runtime in-process and running assemblies
//! straight from memory.
//!
//! The runtime is reached through `mscoree.dll` (the shim that activates
//! `ICLRMetaHost`) and talks in OLE Automation types allocated by
//! `OleAut32.dll`. Both libraries are opened at runtime; see [`native`].

pub mod bstr;
pub mod clr;
pub mod com;
pub mod error;
pub mod guid;
pub mod hresult;
pub mod native;
pub mod safearray;
pub mod variant;


pub use error::{ClrError, ClrResult, MarshalingError};
pub use hresult::HRESULT;
