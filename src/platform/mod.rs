//! The boundary between the loader and the native window system GL bindings.
//!
//! A `Platform` knows which client library names to probe and how to open one of them. Opening a
//! library resolves its bootstrap symbols and yields a `Library`, which wraps every native call the
//! loader makes: device context handling, pixel format selection, context creation and symbol
//! lookup. The native backend is selected at build time and exported as `NativePlatform`; tests
//! plug in a simulated one.

use std::ffi::CStr;
use std::fmt::{self, Debug, Formatter};
use std::mem;
use std::os::raw::c_void;
use std::ptr::NonNull;

use crate::error::Error;

#[cfg(target_os = "windows")]
pub mod windows;

#[cfg(target_os = "windows")]
pub use self::windows::{Wgl as NativeLibrary, WglPlatform as NativePlatform};

#[cfg(target_os = "linux")]
pub mod linux;

#[cfg(target_os = "linux")]
pub use self::linux::{Glx as NativeLibrary, GlxPlatform as NativePlatform};

#[cfg(not(any(target_os = "windows", target_os = "linux")))]
pub mod unsupported;

#[cfg(not(any(target_os = "windows", target_os = "linux")))]
pub use self::unsupported::{Unsupported as NativeLibrary, UnsupportedPlatform as NativePlatform};

/// Non-null address of a resolved GL or window system function.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProcAddress(NonNull<c_void>);

impl ProcAddress {
    /// Wraps `ptr`, returning `None` if it is null.
    pub fn new(ptr: *const c_void) -> Option<ProcAddress> {
        NonNull::new(ptr as *mut c_void).map(ProcAddress)
    }

    pub fn as_ptr(self) -> *const c_void {
        self.0.as_ptr() as *const c_void
    }

    /// Reinterprets the address as a function pointer of type `F`.
    ///
    /// # Safety
    ///
    /// `F` must be an `extern "system"` function pointer type matching the signature of the
    /// function this address was resolved for.
    pub unsafe fn cast<F: Copy>(self) -> F {
        debug_assert_eq!(
            mem::size_of::<F>(),
            mem::size_of::<*const c_void>(),
            "ProcAddress can only be cast to a pointer-sized type");
        mem::transmute_copy(&self.0)
    }
}

impl Debug for ProcAddress {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "ProcAddress({:p})", self.0)
    }
}

/// The drawable a context is created for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface<W, D> {
    /// A window. Its device context is acquired for the new context and released again when the
    /// context is destroyed.
    Window(W),

    /// A device context owned by the caller. It is never released by the loader.
    DeviceContext(D),
}

/// The `Surface` type accepted by a given `Library`.
pub type SurfaceOf<L> = Surface<<L as Library>::Window, <L as Library>::DeviceContext>;

/// Opens the GL client library of a platform.
pub trait Platform {
    type Library: Library;

    /// Library names probed when the configuration doesn't name any, in probe order.
    fn default_library_names(&self) -> &'static [&'static str];

    /// Opens the library `name` and resolves the bootstrap symbols from it.
    ///
    /// Returns `Error::LibraryNotFound` if the library can't be opened, in which case the next
    /// candidate is tried, and `Error::SymbolMissing` if it opened but lacks a required symbol.
    /// On any error nothing stays open.
    fn open(&self, name: &str) -> Result<Self::Library, Error>;
}

/// Extended context creation entry points, resolved through a current legacy context.
pub trait Extensions: Debug + Clone {
    /// Versioned, profile-scoped context creation (`*_ARB_create_context`).
    fn supports_create_context_attribs(&self) -> bool;

    /// Attribute-based pixel format selection (`WGL_ARB_pixel_format`).
    fn supports_pixel_format_attribs(&self) -> bool;

    /// Swap interval control (`*_EXT_swap_control`).
    fn supports_swap_interval(&self) -> bool;
}

/// An opened GL client library with its bootstrap symbols resolved.
///
/// Dropping the library closes it. All native handles passed in were handed out by this library
/// or constructed by the caller through the backend's `unsafe` handle constructors.
pub trait Library {
    /// Window handle as handed out by the window system.
    type Window: Copy + Debug;

    /// Handle of a drawable's rendering target.
    type DeviceContext: Copy + Debug;

    /// A committed pixel format, kept alive until the context is created.
    type PixelFormat;

    /// Native rendering context handle.
    type Context: Copy + Debug + PartialEq;

    type Extensions: Extensions;

    /// Name the library was opened with.
    fn name(&self) -> &str;

    /// Acquires the device context of `window`, `None` if the window system won't provide one.
    fn acquire_device_context(&self, window: Self::Window) -> Option<Self::DeviceContext>;

    fn release_device_context(&self, window: Self::Window, device_context: Self::DeviceContext);

    /// Chooses a double buffered RGBA pixel format with depth and commits it to `device_context`.
    fn choose_pixel_format(&self, device_context: Self::DeviceContext) -> Result<Self::PixelFormat, Error>;

    fn release_pixel_format(&self, device_context: Self::DeviceContext, pixel_format: Self::PixelFormat);

    /// Creates a legacy (unversioned) context. Does not make it current.
    fn create_context(
        &self,
        device_context: Self::DeviceContext,
        pixel_format: &Self::PixelFormat,
    ) -> Option<Self::Context>;

    /// Makes `context` current on `device_context`, or makes no context current if `None`.
    fn make_current(&self, device_context: Self::DeviceContext, context: Option<Self::Context>) -> bool;

    fn delete_context(&self, device_context: Self::DeviceContext, context: Self::Context);

    /// Resolves the extended entry points. Only meaningful while a context is current.
    fn load_extensions(&self, device_context: Self::DeviceContext) -> Self::Extensions;

    /// Creates a context from a zero-terminated attribute list. Does not make it current.
    fn create_context_attribs(
        &self,
        extensions: &Self::Extensions,
        device_context: Self::DeviceContext,
        pixel_format: &Self::PixelFormat,
        attributes: &[i32],
    ) -> Option<Self::Context>;

    /// Sets the swap interval for the current context, returns `false` if unsupported.
    fn set_swap_interval(
        &self,
        extensions: &Self::Extensions,
        device_context: Self::DeviceContext,
        interval: i32,
    ) -> bool;

    fn swap_buffers(&self, device_context: Self::DeviceContext);

    /// Looks `name` up in the library's export table.
    fn export_symbol(&self, name: &CStr) -> Option<ProcAddress>;

    /// Looks `name` up through the platform's "get proc address" function.
    fn proc_address(&self, name: &CStr) -> Option<ProcAddress>;
}
