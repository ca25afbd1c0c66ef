//! GLX backend.
//!
//! Both `libGL` and `libX11` are opened at runtime, nothing links against them. Only the handful of
//! Xlib types GLX calls need are declared here, all of them as opaque pointers or XIDs.

use std::borrow::Cow;
use std::cell::Cell;
use std::ffi::CStr;
use std::fmt::{self, Debug, Formatter};
use std::os::raw::{c_char, c_int, c_uchar, c_ulong, c_void};
use std::ptr::{self, NonNull};

use log::{debug, warn};

use crate::error::Error;
use crate::platform::{Extensions, Library, Platform, ProcAddress};
use crate::resolver::{export, open_module, optional, require};

/// Opaque Xlib `Display`.
pub enum XDisplay {}

type Bool = c_int;
type XID = c_ulong;
type GLXDrawable = XID;
type GLXFBConfig = *mut c_void;
type GLXContext = *mut c_void;

const TRUE: Bool = 1;
const FALSE: Bool = 0;

const GLX_DOUBLEBUFFER: c_int = 5;
const GLX_RED_SIZE: c_int = 8;
const GLX_GREEN_SIZE: c_int = 9;
const GLX_BLUE_SIZE: c_int = 10;
const GLX_ALPHA_SIZE: c_int = 11;
const GLX_DEPTH_SIZE: c_int = 12;
const GLX_STENCIL_SIZE: c_int = 13;
const GLX_DRAWABLE_TYPE: c_int = 0x8010;
const GLX_RENDER_TYPE: c_int = 0x8011;
const GLX_X_RENDERABLE: c_int = 0x8012;
const GLX_WINDOW_BIT: c_int = 0x0001;
const GLX_RGBA_BIT: c_int = 0x0001;
const GLX_RGBA_TYPE: c_int = 0x8014;

/// 32 bit color with 8 bit alpha, 24 bit depth and 8 bit stencil, double buffered.
const FRAMEBUFFER_ATTRIBUTES: [c_int; 21] = [
    GLX_X_RENDERABLE, TRUE,
    GLX_DRAWABLE_TYPE, GLX_WINDOW_BIT,
    GLX_RENDER_TYPE, GLX_RGBA_BIT,
    GLX_DOUBLEBUFFER, TRUE,
    GLX_RED_SIZE, 8,
    GLX_GREEN_SIZE, 8,
    GLX_BLUE_SIZE, 8,
    GLX_ALPHA_SIZE, 8,
    GLX_DEPTH_SIZE, 24,
    GLX_STENCIL_SIZE, 8,
    0,
];

const X11_LIBRARY_NAMES: &[&str] = &["libX11.so.6", "libX11.so"];

type GetProcAddressFn = unsafe extern "C" fn(*const c_uchar) -> *const c_void;
type ChooseFbConfigFn = unsafe extern "C" fn(*mut XDisplay, c_int, *const c_int, *mut c_int) -> *mut GLXFBConfig;
type CreateNewContextFn = unsafe extern "C" fn(*mut XDisplay, GLXFBConfig, c_int, GLXContext, Bool) -> GLXContext;
type DestroyContextFn = unsafe extern "C" fn(*mut XDisplay, GLXContext);
type MakeCurrentFn = unsafe extern "C" fn(*mut XDisplay, GLXDrawable, GLXContext) -> Bool;
type SwapBuffersFn = unsafe extern "C" fn(*mut XDisplay, GLXDrawable);
type CreateContextAttribsFn =
    unsafe extern "C" fn(*mut XDisplay, GLXFBConfig, GLXContext, Bool, *const c_int) -> GLXContext;
type SwapIntervalFn = unsafe extern "C" fn(*mut XDisplay, GLXDrawable, c_int);
type QueryExtensionsStringFn = unsafe extern "C" fn(*mut XDisplay, c_int) -> *const c_char;
type XFreeFn = unsafe extern "C" fn(*mut c_void) -> c_int;
type XErrorHandlerFn = unsafe extern "C" fn(*mut XDisplay, *mut c_void) -> c_int;
type XSetErrorHandlerFn = unsafe extern "C" fn(Option<XErrorHandlerFn>) -> Option<XErrorHandlerFn>;
type XSyncFn = unsafe extern "C" fn(*mut XDisplay, Bool) -> c_int;

thread_local! {
    static X_ERROR_TRAPPED: Cell<bool> = Cell::new(false);
}

/// Installed by `XErrorTrap::run()`. Xlib's default handler exits the process.
unsafe extern "C" fn trap_x_error(_display: *mut XDisplay, _event: *mut c_void) -> c_int {
    X_ERROR_TRAPPED.with(|trapped| trapped.set(true));
    0
}

/// Catches the X errors raised by a GLX call instead of letting them terminate the process.
#[derive(Clone, Copy)]
struct XErrorTrap {
    set_error_handler: XSetErrorHandlerFn,
    sync: XSyncFn,
}

impl XErrorTrap {
    /// Runs `func` with `trap_x_error()` installed, returning its result and whether an X error
    /// was raised. Errors are delivered by `XSync()` before the previous handler is restored.
    unsafe fn run<T, F>(&self, display: *mut XDisplay, func: F) -> (T, bool)
        where F: FnOnce() -> T
    {
        (self.sync)(display, FALSE);
        X_ERROR_TRAPPED.with(|trapped| trapped.set(false));

        let previous = (self.set_error_handler)(Some(trap_x_error as XErrorHandlerFn));
        let result = func();
        (self.sync)(display, FALSE);
        (self.set_error_handler)(previous);

        (result, X_ERROR_TRAPPED.with(|trapped| trapped.replace(false)))
    }
}

/// Whether the space separated extension list contains `name`.
fn has_extension(extensions: &str, name: &str) -> bool {
    extensions.split_whitespace().any(|extension| extension == name)
}

/// An X11 window, which doubles as its own drawable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XlibWindow {
    display: *mut XDisplay,
    window: XID,
    screen: c_int,
}

impl XlibWindow {
    /// # Safety
    ///
    /// `display` must be an open Xlib display connection and `window` a window on `screen` of that
    /// display, created with a visual compatible with a double buffered RGBA framebuffer config.
    /// Both must outlive every context created for the window.
    pub unsafe fn from_raw(display: *mut c_void, window: c_ulong, screen: i32) -> XlibWindow {
        XlibWindow {
            display: display as *mut XDisplay,
            window: window,
            screen: screen,
        }
    }

    pub fn display(&self) -> *mut c_void {
        self.display as *mut c_void
    }

    pub fn window(&self) -> c_ulong {
        self.window
    }
}

/// Framebuffer configs returned by `glXChooseFBConfig()`, best match first.
pub struct FramebufferConfigs {
    configs: NonNull<GLXFBConfig>,
    count: usize,
}

impl FramebufferConfigs {
    fn best(&self) -> GLXFBConfig {
        // `count` is at least one, see `choose_pixel_format()`.
        unsafe { *self.configs.as_ptr() }
    }
}

impl Debug for FramebufferConfigs {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "FramebufferConfigs({} configs at {:p})", self.count, self.configs)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub struct GlxContext(NonNull<c_void>);

impl GlxContext {
    pub fn as_raw(self) -> *mut c_void {
        self.0.as_ptr()
    }
}

impl Debug for GlxContext {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "GlxContext({:p})", self.0)
    }
}

#[derive(Clone)]
pub struct GlxExtensions {
    create_context_attribs: Option<CreateContextAttribsFn>,
    swap_interval: Option<SwapIntervalFn>,
}

impl Debug for GlxExtensions {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("GlxExtensions")
            .field("glXCreateContextAttribsARB", &self.create_context_attribs.is_some())
            .field("glXSwapIntervalEXT", &self.swap_interval.is_some())
            .finish()
    }
}

impl Extensions for GlxExtensions {
    fn supports_create_context_attribs(&self) -> bool {
        self.create_context_attribs.is_some()
    }

    // Framebuffer configs are always chosen by attribute on GLX 1.3+.
    fn supports_pixel_format_attribs(&self) -> bool {
        true
    }

    fn supports_swap_interval(&self) -> bool {
        self.swap_interval.is_some()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GlxPlatform;

impl Platform for GlxPlatform {
    type Library = Glx;

    fn default_library_names(&self) -> &'static [&'static str] {
        &["libGL.so.1", "libGL.so"]
    }

    fn open(&self, name: &str) -> Result<Glx, Error> {
        let module = open_module(name)?;
        let (x11_name, x11) = open_x11()?;

        unsafe {
            let get_proc_address = optional::<GetProcAddressFn>(&module, b"glXGetProcAddressARB\0")
                .or_else(|| optional(&module, b"glXGetProcAddress\0"))
                .ok_or_else(|| Error::SymbolMissing {
                    library: name.into(),
                    symbol: "glXGetProcAddressARB".into(),
                })?;

            Ok(Glx {
                name: name.into(),
                get_proc_address: get_proc_address,
                choose_fb_config: require(&module, name, b"glXChooseFBConfig\0")?,
                create_new_context: require(&module, name, b"glXCreateNewContext\0")?,
                destroy_context: require(&module, name, b"glXDestroyContext\0")?,
                make_current: require(&module, name, b"glXMakeCurrent\0")?,
                swap_buffers: require(&module, name, b"glXSwapBuffers\0")?,
                query_extensions_string: require(&module, name, b"glXQueryExtensionsString\0")?,
                x_free: require(&x11, &x11_name, b"XFree\0")?,
                x_error_trap: XErrorTrap {
                    set_error_handler: require(&x11, &x11_name, b"XSetErrorHandler\0")?,
                    sync: require(&x11, &x11_name, b"XSync\0")?,
                },
                x11_name: x11_name,
                x11: x11,
                module: module,
            })
        }
    }
}

/// Opens `libX11`, which GLX hands its allocations out of.
fn open_x11() -> Result<(String, libloading::Library), Error> {
    for &name in X11_LIBRARY_NAMES {
        if let Ok(module) = open_module(name) {
            debug!("Loaded '{}'", name);
            return Ok((name.into(), module));
        }
    }

    Err(Error::SymbolMissing {
        library: X11_LIBRARY_NAMES[0].into(),
        symbol: "XFree".into(),
    })
}

/// `libGL` with its GLX entry points resolved.
pub struct Glx {
    name: String,

    get_proc_address: GetProcAddressFn,
    choose_fb_config: ChooseFbConfigFn,
    create_new_context: CreateNewContextFn,
    destroy_context: DestroyContextFn,
    make_current: MakeCurrentFn,
    swap_buffers: SwapBuffersFn,
    query_extensions_string: QueryExtensionsStringFn,
    x_free: XFreeFn,
    x_error_trap: XErrorTrap,

    // Declared last so the function pointers above never outlive the modules.
    x11_name: String,
    x11: libloading::Library,
    module: libloading::Library,
}

impl Debug for Glx {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("Glx")
            .field("name", &self.name)
            .field("x11", &self.x11_name)
            .finish()
    }
}

impl Glx {
    fn get_proc_address(&self, name: &CStr) -> Option<ProcAddress> {
        ProcAddress::new(unsafe { (self.get_proc_address)(name.as_ptr() as *const c_uchar) })
    }
}

impl Library for Glx {
    type Window = XlibWindow;
    type DeviceContext = XlibWindow;
    type PixelFormat = FramebufferConfigs;
    type Context = GlxContext;
    type Extensions = GlxExtensions;

    fn name(&self) -> &str {
        &self.name
    }

    fn acquire_device_context(&self, window: XlibWindow) -> Option<XlibWindow> {
        if window.display.is_null() || window.window == 0 {
            None
        } else {
            Some(window)
        }
    }

    fn release_device_context(&self, _window: XlibWindow, _device_context: XlibWindow) {}

    fn choose_pixel_format(&self, window: XlibWindow) -> Result<FramebufferConfigs, Error> {
        let mut count = 0;
        let configs = unsafe {
            (self.choose_fb_config)(window.display, window.screen, FRAMEBUFFER_ATTRIBUTES.as_ptr(), &mut count)
        };

        match NonNull::new(configs) {
            Some(configs) if count > 0 => {
                debug!("glXChooseFBConfig() returned {} matching configs", count);
                Ok(FramebufferConfigs {
                    configs: configs,
                    count: count as usize,
                })
            }

            Some(configs) => {
                unsafe { (self.x_free)(configs.as_ptr() as *mut c_void); }
                Err(Error::PixelFormatNegotiationFailed(
                    format!("no framebuffer config matches on screen {}", window.screen)))
            }

            None => Err(Error::PixelFormatNegotiationFailed(
                format!("glXChooseFBConfig() failed on screen {}", window.screen))),
        }
    }

    fn release_pixel_format(&self, _window: XlibWindow, configs: FramebufferConfigs) {
        unsafe { (self.x_free)(configs.configs.as_ptr() as *mut c_void); }
    }

    fn create_context(&self, window: XlibWindow, configs: &FramebufferConfigs) -> Option<GlxContext> {
        let context = unsafe {
            (self.create_new_context)(window.display, configs.best(), GLX_RGBA_TYPE, ptr::null_mut(), TRUE)
        };
        NonNull::new(context).map(GlxContext)
    }

    fn make_current(&self, window: XlibWindow, context: Option<GlxContext>) -> bool {
        let result = unsafe {
            match context {
                Some(context) => (self.make_current)(window.display, window.window, context.as_raw()),
                None => (self.make_current)(window.display, 0, ptr::null_mut()),
            }
        };
        result == TRUE
    }

    fn delete_context(&self, window: XlibWindow, context: GlxContext) {
        unsafe { (self.destroy_context)(window.display, context.as_raw()); }
    }

    // glXGetProcAddress() hands out a stub for any name, so only entry points of advertised
    // extensions are resolved.
    fn load_extensions(&self, window: XlibWindow) -> GlxExtensions {
        let extensions = unsafe {
            let extensions = (self.query_extensions_string)(window.display, window.screen);
            if extensions.is_null() {
                Cow::Borrowed("")
            } else {
                CStr::from_ptr(extensions).to_string_lossy()
            }
        };
        debug!("GLX extensions on screen {}: {}", window.screen, extensions);

        let resolve = |extension: &str, name: &CStr| {
            if has_extension(&extensions, extension) {
                self.get_proc_address(name)
            } else {
                debug!("{} is not supported", extension);
                None
            }
        };

        unsafe {
            GlxExtensions {
                create_context_attribs: resolve("GLX_ARB_create_context", c"glXCreateContextAttribsARB")
                    .map(|address| address.cast()),
                swap_interval: resolve("GLX_EXT_swap_control", c"glXSwapIntervalEXT")
                    .map(|address| address.cast()),
            }
        }
    }

    fn create_context_attribs(
        &self,
        extensions: &GlxExtensions,
        window: XlibWindow,
        configs: &FramebufferConfigs,
        attributes: &[i32],
    ) -> Option<GlxContext> {
        let create_context_attribs = extensions.create_context_attribs?;
        let (context, failed) = unsafe {
            self.x_error_trap.run(window.display, || {
                create_context_attribs(window.display, configs.best(), ptr::null_mut(), TRUE, attributes.as_ptr())
            })
        };

        let context = NonNull::new(context).map(GlxContext);
        if failed {
            warn!("glXCreateContextAttribsARB() raised an X error");
            if let Some(context) = context {
                self.delete_context(window, context);
            }
            return None;
        }

        context
    }

    fn set_swap_interval(&self, extensions: &GlxExtensions, window: XlibWindow, interval: i32) -> bool {
        match extensions.swap_interval {
            Some(swap_interval) => {
                unsafe { swap_interval(window.display, window.window, interval); }
                true
            }
            None => {
                warn!("glXSwapIntervalEXT() is not available");
                false
            }
        }
    }

    fn swap_buffers(&self, window: XlibWindow) {
        unsafe { (self.swap_buffers)(window.display, window.window); }
    }

    fn export_symbol(&self, name: &CStr) -> Option<ProcAddress> {
        export(&self.module, name)
    }

    fn proc_address(&self, name: &CStr) -> Option<ProcAddress> {
        self.get_proc_address(name)
    }
}
