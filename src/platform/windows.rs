//! WGL backend.
//!
//! `opengl32.dll` is opened at runtime. GDI and user32 calls go through the regular import
//! libraries since they are present on every Windows system.

use std::ffi::CStr;
use std::fmt::{self, Debug, Formatter};
use std::mem;
use std::os::raw::{c_char, c_int, c_void};
use std::ptr::{self, NonNull};

use log::{debug, warn};
use winapi::*;

use crate::error::Error;
use crate::platform::{Extensions, Library, Platform, ProcAddress};
use crate::resolver::{export, open_module, require};

type GetProcAddressFn = unsafe extern "system" fn(*const c_char) -> *const c_void;
type CreateContextFn = unsafe extern "system" fn(HDC) -> HGLRC;
type DeleteContextFn = unsafe extern "system" fn(HGLRC) -> BOOL;
type MakeCurrentFn = unsafe extern "system" fn(HDC, HGLRC) -> BOOL;
type CreateContextAttribsFn = unsafe extern "system" fn(HDC, HGLRC, *const c_int) -> HGLRC;
type SwapIntervalFn = unsafe extern "system" fn(c_int) -> BOOL;

/// A window handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowHandle(HWND);

impl WindowHandle {
    /// # Safety
    ///
    /// `hwnd` must be a valid window that outlives every context created for it.
    pub unsafe fn from_raw(hwnd: *mut c_void) -> WindowHandle {
        WindowHandle(hwnd as HWND)
    }

    pub fn as_raw(self) -> *mut c_void {
        self.0 as *mut c_void
    }
}

/// A GDI device context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceContextHandle(HDC);

impl DeviceContextHandle {
    /// # Safety
    ///
    /// `hdc` must be a valid device context of a window that hasn't had a pixel format set yet, or
    /// already has a double buffered OpenGL compatible one. It must outlive every context created
    /// for it.
    pub unsafe fn from_raw(hdc: *mut c_void) -> DeviceContextHandle {
        DeviceContextHandle(hdc as HDC)
    }

    pub fn as_raw(self) -> *mut c_void {
        self.0 as *mut c_void
    }
}

/// A pixel format committed to a device context with `SetPixelFormat()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelFormat {
    index: c_int,
}

impl PixelFormat {
    /// One-based index of the format in the device's format list.
    pub fn index(&self) -> i32 {
        self.index
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub struct WglContext(NonNull<c_void>);

impl WglContext {
    fn new(render_context: HGLRC) -> Option<WglContext> {
        NonNull::new(render_context as *mut c_void).map(WglContext)
    }

    pub fn as_raw(self) -> *mut c_void {
        self.0.as_ptr()
    }

    fn as_hglrc(self) -> HGLRC {
        self.0.as_ptr() as HGLRC
    }
}

impl Debug for WglContext {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "WglContext({:p})", self.0)
    }
}

#[derive(Clone)]
pub struct WglExtensions {
    create_context_attribs: Option<CreateContextAttribsFn>,
    choose_pixel_format: Option<ProcAddress>,
    swap_interval: Option<SwapIntervalFn>,
}

impl Debug for WglExtensions {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("WglExtensions")
            .field("wglCreateContextAttribsARB", &self.create_context_attribs.is_some())
            .field("wglChoosePixelFormatARB", &self.choose_pixel_format.is_some())
            .field("wglSwapIntervalEXT", &self.swap_interval.is_some())
            .finish()
    }
}

impl Extensions for WglExtensions {
    fn supports_create_context_attribs(&self) -> bool {
        self.create_context_attribs.is_some()
    }

    fn supports_pixel_format_attribs(&self) -> bool {
        self.choose_pixel_format.is_some()
    }

    fn supports_swap_interval(&self) -> bool {
        self.swap_interval.is_some()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WglPlatform;

impl Platform for WglPlatform {
    type Library = Wgl;

    fn default_library_names(&self) -> &'static [&'static str] {
        &["opengl32.dll"]
    }

    fn open(&self, name: &str) -> Result<Wgl, Error> {
        let module = open_module(name)?;

        unsafe {
            Ok(Wgl {
                name: name.into(),
                get_proc_address: require(&module, name, b"wglGetProcAddress\0")?,
                create_context: require(&module, name, b"wglCreateContext\0")?,
                delete_context: require(&module, name, b"wglDeleteContext\0")?,
                make_current: require(&module, name, b"wglMakeCurrent\0")?,
                module: module,
            })
        }
    }
}

/// `opengl32.dll` with its WGL entry points resolved.
pub struct Wgl {
    name: String,

    get_proc_address: GetProcAddressFn,
    create_context: CreateContextFn,
    delete_context: DeleteContextFn,
    make_current: MakeCurrentFn,

    // Declared last so the function pointers above never outlive the module.
    module: libloading::Library,
}

impl Debug for Wgl {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("Wgl").field("name", &self.name).finish()
    }
}

/// `wglGetProcAddress()` may return small integers instead of null for functions it doesn't know.
fn filter_sentinel(ptr: *const c_void) -> Option<ProcAddress> {
    match ptr as isize {
        1 | 2 | 3 | -1 => None,
        _ => ProcAddress::new(ptr),
    }
}

fn last_error() -> DWORD {
    unsafe { kernel32::GetLastError() }
}

fn pixel_format_descriptor() -> PIXELFORMATDESCRIPTOR {
    PIXELFORMATDESCRIPTOR {
        nSize: mem::size_of::<PIXELFORMATDESCRIPTOR>() as WORD,
        nVersion: 1,
        dwFlags: PFD_DRAW_TO_WINDOW | PFD_SUPPORT_OPENGL | PFD_DOUBLEBUFFER,
        iPixelType: PFD_TYPE_RGBA,
        cColorBits: 32,
        cRedBits: 0,
        cRedShift: 0,
        cGreenBits: 0,
        cGreenShift: 0,
        cBlueBits: 0,
        cBlueShift: 0,
        cAlphaBits: 8,
        cAlphaShift: 0,
        cAccumBits: 0,
        cAccumRedBits: 0,
        cAccumGreenBits: 0,
        cAccumBlueBits: 0,
        cAccumAlphaBits: 0,
        cDepthBits: 24,
        cStencilBits: 8,
        cAuxBuffers: 0,
        iLayerType: PFD_MAIN_PLANE,
        bReserved: 0,
        dwLayerMask: 0,
        dwVisibleMask: 0,
        dwDamageMask: 0,
    }
}

impl Wgl {
    fn get_proc_address(&self, name: &CStr) -> Option<ProcAddress> {
        filter_sentinel(unsafe { (self.get_proc_address)(name.as_ptr()) })
    }
}

impl Library for Wgl {
    type Window = WindowHandle;
    type DeviceContext = DeviceContextHandle;
    type PixelFormat = PixelFormat;
    type Context = WglContext;
    type Extensions = WglExtensions;

    fn name(&self) -> &str {
        &self.name
    }

    fn acquire_device_context(&self, window: WindowHandle) -> Option<DeviceContextHandle> {
        device_context_for(window, |hwnd| unsafe { user32::GetDC(hwnd) })
    }

    fn release_device_context(&self, window: WindowHandle, device_context: DeviceContextHandle) {
        unsafe { user32::ReleaseDC(window.0, device_context.0); }
    }

    fn choose_pixel_format(&self, device_context: DeviceContextHandle) -> Result<PixelFormat, Error> {
        let mut descriptor = pixel_format_descriptor();

        let index = unsafe {
            let index = gdi32::ChoosePixelFormat(device_context.0, &descriptor);
            if index == 0 {
                return Err(Error::PixelFormatNegotiationFailed(
                    format!("ChoosePixelFormat() failed, last error: {:#x}", last_error())));
            }

            let described = gdi32::DescribePixelFormat(
                device_context.0,
                index,
                mem::size_of::<PIXELFORMATDESCRIPTOR>() as UINT,
                &mut descriptor);
            if described == 0 {
                return Err(Error::PixelFormatNegotiationFailed(
                    format!("DescribePixelFormat() failed for format {}, last error: {:#x}", index, last_error())));
            }

            if gdi32::SetPixelFormat(device_context.0, index, &descriptor) == FALSE {
                return Err(Error::PixelFormatNegotiationFailed(
                    format!("SetPixelFormat() failed for format {}, last error: {:#x}", index, last_error())));
            }

            index
        };

        debug!(
            "Chose pixel format {}: {} bit color, {} bit alpha, {} bit depth, {} bit stencil",
            index,
            descriptor.cColorBits,
            descriptor.cAlphaBits,
            descriptor.cDepthBits,
            descriptor.cStencilBits);

        Ok(PixelFormat { index: index })
    }

    fn release_pixel_format(&self, _device_context: DeviceContextHandle, _pixel_format: PixelFormat) {}

    fn create_context(&self, device_context: DeviceContextHandle, _pixel_format: &PixelFormat) -> Option<WglContext> {
        let render_context = unsafe { (self.create_context)(device_context.0) };
        let context = WglContext::new(render_context);
        if context.is_none() {
            debug!("wglCreateContext() failed, last error: {:#x}", last_error());
        }
        context
    }

    fn make_current(&self, device_context: DeviceContextHandle, context: Option<WglContext>) -> bool {
        let result = unsafe {
            match context {
                Some(context) => (self.make_current)(device_context.0, context.as_hglrc()),
                None => (self.make_current)(ptr::null_mut(), ptr::null_mut()),
            }
        };

        if result == FALSE {
            debug!(
                "wglMakeCurrent() failed for {:?} and {:?}, last error: {:#x}",
                device_context,
                context,
                last_error());
        }
        result != FALSE
    }

    fn delete_context(&self, _device_context: DeviceContextHandle, context: WglContext) {
        if unsafe { (self.delete_context)(context.as_hglrc()) } == FALSE {
            warn!("wglDeleteContext() failed for {:?}, last error: {:#x}", context, last_error());
        }
    }

    fn load_extensions(&self, _device_context: DeviceContextHandle) -> WglExtensions {
        unsafe {
            WglExtensions {
                create_context_attribs: self.get_proc_address(c"wglCreateContextAttribsARB")
                    .map(|address| address.cast()),
                choose_pixel_format: self.get_proc_address(c"wglChoosePixelFormatARB"),
                swap_interval: self.get_proc_address(c"wglSwapIntervalEXT")
                    .map(|address| address.cast()),
            }
        }
    }

    fn create_context_attribs(
        &self,
        extensions: &WglExtensions,
        device_context: DeviceContextHandle,
        _pixel_format: &PixelFormat,
        attributes: &[i32],
    ) -> Option<WglContext> {
        let create_context_attribs = extensions.create_context_attribs?;
        let render_context = unsafe {
            create_context_attribs(device_context.0, ptr::null_mut(), attributes.as_ptr())
        };

        let context = WglContext::new(render_context);
        if context.is_none() {
            debug!("wglCreateContextAttribsARB() failed, last error: {:#x}", last_error());
        }
        context
    }

    fn set_swap_interval(&self, extensions: &WglExtensions, _device_context: DeviceContextHandle, interval: i32) -> bool {
        match extensions.swap_interval {
            Some(swap_interval) => unsafe { swap_interval(interval) != FALSE },
            None => false,
        }
    }

    fn swap_buffers(&self, device_context: DeviceContextHandle) {
        if unsafe { gdi32::SwapBuffers(device_context.0) } == FALSE {
            warn!("SwapBuffers() failed for {:?}, last error: {:#x}", device_context, last_error());
        }
    }

    fn export_symbol(&self, name: &CStr) -> Option<ProcAddress> {
        export(&self.module, name)
    }

    fn proc_address(&self, name: &CStr) -> Option<ProcAddress> {
        self.get_proc_address(name)
    }
}

/// `GetDC(NULL)` returns the DC of the whole screen, so a null window never reaches `get_dc`.
fn device_context_for<F>(window: WindowHandle, get_dc: F) -> Option<DeviceContextHandle>
    where F: FnOnce(HWND) -> HDC
{
    if window.0.is_null() {
        return None;
    }

    let hdc = get_dc(window.0);
    if hdc.is_null() {
        None
    } else {
        Some(DeviceContextHandle(hdc))
    }
}
