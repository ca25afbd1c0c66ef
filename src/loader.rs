//! The loader state and its public operations.

use std::cell::{Ref, RefCell};
use std::ffi::CString;
use std::fmt::{self, Debug, Formatter};

use log::{debug, info, warn};

use crate::config::{ContextCreationRequest, LoaderConfig};
use crate::error::{Error, LastError};
use crate::negotiate::{self, ContextKind, Degradation, Negotiated};
use crate::platform::{Library, NativePlatform, Platform, ProcAddress, SurfaceOf};
use crate::resolver;
use crate::table::FunctionTable;

type LibraryOf<P> = <P as Platform>::Library;

/// Owns the loaded GL client library and the function table.
///
/// A loader is meant to be created once by the application and shared by reference. It can't be
/// shared between threads: GL contexts are thread-affine and nothing here synchronizes access.
///
/// Contexts borrow the loader they were created from, so the library can't be unloaded while a
/// context still exists:
///
/// ```no_run
/// # use dynamic_gl::{Loader, ContextCreationRequest};
/// # fn window() -> dynamic_gl::platform::SurfaceOf<dynamic_gl::platform::NativeLibrary> { unimplemented!() }
/// let mut loader = Loader::new();
/// loader.load(false)?;
///
/// let context = loader.create_context(window(), &ContextCreationRequest::default())?;
/// loader.load_functions();
/// // ...
/// drop(context);
///
/// loader.unload();
/// # Ok::<(), dynamic_gl::Error>(())
/// ```
pub struct Loader<P: Platform = NativePlatform> {
    platform: P,
    config: LoaderConfig,
    library: RefCell<Option<LibraryOf<P>>>,
    functions: RefCell<FunctionTable>,
    last_error: RefCell<LastError>,
}

impl Loader<NativePlatform> {
    /// Creates a loader for the native platform, configured from the environment.
    ///
    /// Nothing is loaded until `load()` or `create_context()` is called.
    pub fn new() -> Loader<NativePlatform> {
        Loader::with_config(LoaderConfig::from_env())
    }

    pub fn with_config(config: LoaderConfig) -> Loader<NativePlatform> {
        Loader::with_platform(NativePlatform::default(), config)
    }
}

impl Default for Loader<NativePlatform> {
    fn default() -> Loader<NativePlatform> {
        Loader::new()
    }
}

impl<P: Platform> Loader<P> {
    pub fn with_platform(platform: P, config: LoaderConfig) -> Loader<P> {
        Loader {
            platform: platform,
            config: config,
            library: RefCell::new(None),
            functions: RefCell::new(FunctionTable::new()),
            last_error: RefCell::new(LastError::new()),
        }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Opens the GL client library and resolves its bootstrap symbols.
    ///
    /// Does nothing if the library is already loaded. If `load_functions_now` is set the function
    /// table is populated right away, which requires a context to already be current (e.g. one
    /// created by some other system).
    pub fn load(&self, load_functions_now: bool) -> Result<(), Error> {
        if self.is_loaded() {
            debug!("OpenGL library is already loaded");
        } else {
            let candidates = self.config.candidates(self.platform.default_library_names());
            match resolver::open_first(&self.platform, &candidates) {
                Ok(library) => *self.library.borrow_mut() = Some(library),
                Err(err) => return self.fail(err),
            }
        }

        if load_functions_now {
            self.load_functions();
        }

        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.library.borrow().is_some()
    }

    /// Name of the loaded library, as it was probed.
    pub fn library_name(&self) -> Option<String> {
        self.library.borrow().as_ref().map(|library| library.name().into())
    }

    /// Creates a rendering context for `surface` and makes it current, loading the library first
    /// if necessary.
    ///
    /// If a modern context is requested but can't be created the legacy context is returned
    /// instead. That case is reported through `RenderingContext::degradation()` and a warning
    /// in `last_error()`, not as an error.
    pub fn create_context(
        &self,
        surface: SurfaceOf<LibraryOf<P>>,
        request: &ContextCreationRequest,
    ) -> Result<RenderingContext<'_, P>, Error> {
        self.load(false)?;

        let result = {
            let library = self.library.borrow();
            match *library {
                Some(ref library) => negotiate::negotiate(library, surface, request),
                None => Err(Error::InvalidRequest("no OpenGL library is loaded".into())),
            }
        };

        let negotiated = match result {
            Ok(negotiated) => negotiated,
            Err(err) => return self.fail(err),
        };

        if let Some(degradation) = negotiated.degradation {
            self.last_error.borrow_mut().set(format_args!(
                "Warning: Failed creating modern OpenGL {} {:?} context ({}), fell back to legacy context",
                request.version,
                request.profile,
                degradation));
        }

        Ok(RenderingContext {
            loader: self,
            kind: negotiated.kind,
            degradation: negotiated.degradation,
            handle: Some(negotiated),
        })
    }

    /// Creates a context with the configured default request.
    pub fn create_default_context(&self, surface: SurfaceOf<LibraryOf<P>>) -> Result<RenderingContext<'_, P>, Error> {
        let request = self.config.default_request;
        self.create_context(surface, &request)
    }

    /// Same as `RenderingContext::destroy()`.
    pub fn destroy_context(&self, context: &mut RenderingContext<P>) {
        debug_assert!(::std::ptr::eq(self, context.loader), "Context belongs to a different loader");
        context.destroy();
    }

    /// Same as `RenderingContext::present()`.
    pub fn present(&self, context: &RenderingContext<P>) {
        context.present();
    }

    /// Resolves every known entry point into the function table. Does nothing if the library isn't
    /// loaded.
    ///
    /// Must be called while a context is current. Can be called again after switching contexts.
    /// Nothing is loaded while a table returned by `functions()` is still alive; `last_error()`
    /// reports it.
    pub fn load_functions(&self) {
        let loaded = self.library.borrow();
        let library = match *loaded {
            Some(ref library) => library,
            None => {
                debug!("OpenGL library isn't loaded, not loading functions");
                return;
            }
        };

        match self.functions.try_borrow_mut() {
            Ok(mut functions) => {
                functions.populate(library);
            }
            Err(_) => {
                warn!("Function table is still borrowed, not loading functions");
                self.last_error.borrow_mut().set("Function table is still borrowed, not loading functions");
            }
        }
    }

    /// The function table, empty until `load_functions()` has been called.
    ///
    /// `load_functions()` does nothing while the returned table is held.
    pub fn functions(&self) -> Ref<'_, FunctionTable> {
        self.functions.borrow()
    }

    /// Resolves an arbitrary entry point, e.g. a vendor extension the function table doesn't know.
    ///
    /// Like `load_functions()`, this needs a current context.
    pub fn get_proc_address(&self, name: &str) -> Option<ProcAddress> {
        let name = CString::new(name).ok()?;
        let library = self.library.borrow();
        library.as_ref().and_then(|library| resolver::lookup(library, &name))
    }

    /// Clears the function table and closes the library. Does nothing if it isn't loaded.
    pub fn unload(&mut self) {
        self.functions.get_mut().clear();
        if let Some(library) = self.library.get_mut().take() {
            info!("Unloading OpenGL library '{}'", library.name());
        }
    }

    /// The most recent diagnostic message. Successful calls don't clear it.
    pub fn last_error(&self) -> String {
        self.last_error.borrow().as_str().into()
    }

    fn fail<T>(&self, err: Error) -> Result<T, Error> {
        self.last_error.borrow_mut().set(&err);
        Err(err)
    }
}

impl<P: Platform> Debug for Loader<P> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let library = self.library.borrow();
        let functions = self.functions.try_borrow().map(|functions| functions.loaded_count()).ok();
        f.debug_struct("Loader")
            .field("library", &library.as_ref().map(|library| library.name()))
            .field("functions", &functions)
            .field("last_error", &self.last_error.borrow().as_str())
            .finish()
    }
}

/// A rendering context created by a `Loader`.
///
/// The context is destroyed when dropped, or earlier through `destroy()`. A destroyed context is
/// invalid and every operation on it is a no-op.
pub struct RenderingContext<'a, P: Platform = NativePlatform> {
    loader: &'a Loader<P>,
    kind: ContextKind,
    degradation: Option<Degradation>,
    handle: Option<Negotiated<LibraryOf<P>>>,
}

impl<'a, P: Platform> RenderingContext<'a, P> {
    /// Whether the context still holds a native handle.
    pub fn is_valid(&self) -> bool {
        self.handle.is_some()
    }

    /// The kind of context that was actually created.
    pub fn kind(&self) -> ContextKind {
        self.kind
    }

    /// Why the context is a legacy one even though a modern one was requested, if it is.
    pub fn degradation(&self) -> Option<Degradation> {
        self.degradation
    }

    /// Whether the device context was acquired for this context and gets released with it.
    pub fn owns_device_context(&self) -> bool {
        self.handle.as_ref().map_or(false, |handle| handle.window.is_some())
    }

    pub fn native_handle(&self) -> Option<<LibraryOf<P> as Library>::Context> {
        self.handle.as_ref().map(|handle| handle.context)
    }

    pub fn device_context(&self) -> Option<<LibraryOf<P> as Library>::DeviceContext> {
        self.handle.as_ref().map(|handle| handle.device_context)
    }

    /// Makes this context current again, e.g. after another context was used.
    pub fn make_current(&self) -> bool {
        self.with_library(|library, handle| library.make_current(handle.device_context, Some(handle.context)))
            .unwrap_or(false)
    }

    /// Swaps the front and back buffers of the context's drawable.
    pub fn present(&self) {
        self.with_library(|library, handle| library.swap_buffers(handle.device_context));
    }

    /// Sets the swap interval of the context, which must be current. Returns whether the platform
    /// supports swap control.
    pub fn set_swap_interval(&self, interval: i32) -> bool {
        self.with_library(|library, handle| {
            library.set_swap_interval(&handle.extensions, handle.device_context, interval)
        })
        .unwrap_or(false)
    }

    /// Releases the native context, and the device context if it was acquired for it.
    pub fn destroy(&mut self) {
        let handle = match self.handle.take() {
            Some(handle) => handle,
            None => return,
        };

        let library = self.loader.library.borrow();
        if let Some(ref library) = *library {
            library.make_current(handle.device_context, None);
            library.delete_context(handle.device_context, handle.context);
            if let Some(window) = handle.window {
                library.release_device_context(window, handle.device_context);
            }
            info!("Destroyed OpenGL context {:?}", handle.context);
        }
    }

    fn with_library<T, F>(&self, func: F) -> Option<T>
        where F: FnOnce(&LibraryOf<P>, &Negotiated<LibraryOf<P>>) -> T
    {
        let handle = self.handle.as_ref()?;
        let library = self.loader.library.borrow();
        library.as_ref().map(|library| func(library, handle))
    }
}

impl<'a, P: Platform> Drop for RenderingContext<'a, P> {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl<'a, P: Platform> Debug for RenderingContext<'a, P> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("RenderingContext")
            .field("kind", &self.kind)
            .field("degradation", &self.degradation)
            .field("context", &self.native_handle())
            .field("device_context", &self.device_context())
            .field("owns_device_context", &self.owns_device_context())
            .finish()
    }
}
