//! Loads OpenGL at runtime and creates rendering contexts for it.
//!
//! Nothing links against the system's GL client library. Instead the `Loader` opens it on demand,
//! creates contexts through the window system binding (WGL on Windows, GLX on Linux) and resolves
//! every entry point from OpenGL 1.1 through 4.6 into a `FunctionTable`:
//!
//! ```no_run
//! use dynamic_gl::{ContextCreationRequest, Loader, Profile, Symbol};
//! # fn window() -> dynamic_gl::platform::SurfaceOf<dynamic_gl::platform::NativeLibrary> { unimplemented!() }
//!
//! let loader = Loader::new();
//! let request = ContextCreationRequest::modern(3, 3, Profile::Core);
//! let context = loader.create_context(window(), &request)?;
//! if let Some(degradation) = context.degradation() {
//!     println!("Got a legacy context instead: {}", degradation);
//! }
//!
//! loader.load_functions();
//! let clear: Option<extern "system" fn(u32)> = unsafe { loader.functions().get_as(Symbol::glClear) };
//! # Ok::<(), dynamic_gl::Error>(())
//! ```
//!
//! Requesting a modern context never fails just because the driver can't provide one, the legacy
//! context is used instead and the reason is reported through `RenderingContext::degradation()`.

#[macro_use]
mod macros;

pub mod config;
pub mod error;
pub mod loader;
pub mod negotiate;
pub mod platform;
pub mod resolver;
pub mod symbols;
pub mod table;
pub mod types;

#[cfg(test)]
mod test;

pub use crate::config::{set_default_context_creation_parameters, ContextCreationRequest, LoaderConfig};
pub use crate::error::{Error, LastError};
pub use crate::loader::{Loader, RenderingContext};
pub use crate::negotiate::{ContextKind, Degradation};
pub use crate::platform::{ProcAddress, Surface};
pub use crate::symbols::{Symbol, SymbolInfo};
pub use crate::table::FunctionTable;
pub use crate::types::{Profile, Version};
