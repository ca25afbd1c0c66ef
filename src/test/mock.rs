//! Simulated window system binding.
//!
//! Every native call is recorded as an `Event`, and `MockConfig` decides which of them succeed.
//! Baseline (1.1) functions are exported by the library, later ones only resolve through "get proc
//! address" while a context is current, up to the configured driver version.

use std::cell::{Cell, RefCell};
use std::ffi::CStr;
use std::os::raw::c_void;
use std::rc::Rc;

use crate::error::Error;
use crate::platform::{Extensions, Library, Platform, ProcAddress};
use crate::symbols::Symbol;
use crate::types::Version;

/// Vendor entry point that isn't part of the function table.
pub const VENDOR_FUNCTION: &str = "glVendorSpecialEXT";

#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Library names that can be opened.
    pub libraries: Vec<&'static str>,
    pub bootstrap_symbols: bool,
    pub pixel_format: bool,
    pub legacy_context: bool,
    pub legacy_activation: bool,
    pub create_context_attribs: bool,
    pub pixel_format_attribs: bool,
    pub modern_creation: bool,
    pub modern_activation: bool,
    pub swap_interval: bool,

    /// Highest version the simulated driver hands out functions for.
    pub driver_version: Version,
}

impl Default for MockConfig {
    fn default() -> MockConfig {
        MockConfig {
            libraries: vec!["libmockgl.so"],
            bootstrap_symbols: true,
            pixel_format: true,
            legacy_context: true,
            legacy_activation: true,
            create_context_attribs: true,
            pixel_format_attribs: true,
            modern_creation: true,
            modern_activation: true,
            swap_interval: true,
            driver_version: Version::V4_6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockWindow(pub u32);

/// Window `0` is treated as a null handle.
pub const NULL_WINDOW: MockWindow = MockWindow(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockDeviceContext(pub u32);

#[derive(Debug, PartialEq, Eq)]
pub struct MockPixelFormat(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockContext {
    pub id: usize,
    pub modern: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Opened(String),
    Closed(String),
    AcquiredDeviceContext(MockWindow, MockDeviceContext),
    ReleasedDeviceContext(MockWindow, MockDeviceContext),
    ChosePixelFormat(MockDeviceContext),
    ReleasedPixelFormat(MockDeviceContext),
    CreatedContext(MockContext),
    CreatedContextAttribs(MockContext, Vec<i32>),
    MadeCurrent(Option<MockContext>),
    DeletedContext(MockContext),
    SetSwapInterval(i32),
    SwappedBuffers(MockDeviceContext),
}

pub type EventLog = Rc<RefCell<Vec<Event>>>;

#[derive(Debug)]
pub struct MockPlatform {
    config: MockConfig,
    events: EventLog,
}

impl MockPlatform {
    pub fn new(config: MockConfig) -> MockPlatform {
        MockPlatform {
            config: config,
            events: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn events(&self) -> EventLog {
        self.events.clone()
    }
}

impl Platform for MockPlatform {
    type Library = MockLibrary;

    fn default_library_names(&self) -> &'static [&'static str] {
        &["libmockgl.so.1", "libmockgl.so"]
    }

    fn open(&self, name: &str) -> Result<MockLibrary, Error> {
        if !self.config.libraries.contains(&name) {
            return Err(Error::LibraryNotFound { candidates: vec![name.into()] });
        }

        if !self.config.bootstrap_symbols {
            return Err(Error::SymbolMissing {
                library: name.into(),
                symbol: "mockGetProcAddress".into(),
            });
        }

        self.events.borrow_mut().push(Event::Opened(name.into()));
        Ok(MockLibrary {
            name: name.into(),
            config: self.config.clone(),
            events: self.events.clone(),
            next_handle: Cell::new(1),
            current: Cell::new(None),
        })
    }
}

#[derive(Debug, Clone)]
pub struct MockExtensions {
    create_context_attribs: bool,
    pixel_format_attribs: bool,
    swap_interval: bool,
}

impl Extensions for MockExtensions {
    fn supports_create_context_attribs(&self) -> bool {
        self.create_context_attribs
    }

    fn supports_pixel_format_attribs(&self) -> bool {
        self.pixel_format_attribs
    }

    fn supports_swap_interval(&self) -> bool {
        self.swap_interval
    }
}

#[derive(Debug)]
pub struct MockLibrary {
    name: String,
    config: MockConfig,
    events: EventLog,
    next_handle: Cell<usize>,
    current: Cell<Option<MockContext>>,
}

impl MockLibrary {
    fn push(&self, event: Event) {
        self.events.borrow_mut().push(event);
    }

    fn next_handle(&self) -> usize {
        let handle = self.next_handle.get();
        self.next_handle.set(handle + 1);
        handle
    }

    fn fake_address(symbol: Symbol) -> Option<ProcAddress> {
        ProcAddress::new(((symbol as usize + 1) * 16) as *const c_void)
    }
}

impl Drop for MockLibrary {
    fn drop(&mut self) {
        self.push(Event::Closed(self.name.clone()));
    }
}

impl Library for MockLibrary {
    type Window = MockWindow;
    type DeviceContext = MockDeviceContext;
    type PixelFormat = MockPixelFormat;
    type Context = MockContext;
    type Extensions = MockExtensions;

    fn name(&self) -> &str {
        &self.name
    }

    fn acquire_device_context(&self, window: MockWindow) -> Option<MockDeviceContext> {
        if window == NULL_WINDOW {
            return None;
        }

        let device_context = MockDeviceContext(window.0 + 100);
        self.push(Event::AcquiredDeviceContext(window, device_context));
        Some(device_context)
    }

    fn release_device_context(&self, window: MockWindow, device_context: MockDeviceContext) {
        self.push(Event::ReleasedDeviceContext(window, device_context));
    }

    fn choose_pixel_format(&self, device_context: MockDeviceContext) -> Result<MockPixelFormat, Error> {
        if !self.config.pixel_format {
            return Err(Error::PixelFormatNegotiationFailed("no matching pixel format".into()));
        }

        self.push(Event::ChosePixelFormat(device_context));
        Ok(MockPixelFormat(7))
    }

    fn release_pixel_format(&self, device_context: MockDeviceContext, _pixel_format: MockPixelFormat) {
        self.push(Event::ReleasedPixelFormat(device_context));
    }

    fn create_context(&self, _device_context: MockDeviceContext, _pixel_format: &MockPixelFormat) -> Option<MockContext> {
        if !self.config.legacy_context {
            return None;
        }

        let context = MockContext { id: self.next_handle(), modern: false };
        self.push(Event::CreatedContext(context));
        Some(context)
    }

    fn make_current(&self, _device_context: MockDeviceContext, context: Option<MockContext>) -> bool {
        let allowed = match context {
            Some(MockContext { modern: true, .. }) => self.config.modern_activation,
            Some(MockContext { modern: false, .. }) => self.config.legacy_activation,
            None => true,
        };

        if allowed {
            self.push(Event::MadeCurrent(context));
            self.current.set(context);
        }
        allowed
    }

    fn delete_context(&self, _device_context: MockDeviceContext, context: MockContext) {
        if self.current.get() == Some(context) {
            self.current.set(None);
        }
        self.push(Event::DeletedContext(context));
    }

    fn load_extensions(&self, _device_context: MockDeviceContext) -> MockExtensions {
        let current = self.current.get().is_some();
        MockExtensions {
            create_context_attribs: current && self.config.create_context_attribs,
            pixel_format_attribs: current && self.config.pixel_format_attribs,
            swap_interval: current && self.config.swap_interval,
        }
    }

    fn create_context_attribs(
        &self,
        extensions: &MockExtensions,
        _device_context: MockDeviceContext,
        _pixel_format: &MockPixelFormat,
        attributes: &[i32],
    ) -> Option<MockContext> {
        if !extensions.create_context_attribs || !self.config.modern_creation {
            return None;
        }

        let context = MockContext { id: self.next_handle(), modern: true };
        self.push(Event::CreatedContextAttribs(context, attributes.to_vec()));
        Some(context)
    }

    fn set_swap_interval(&self, extensions: &MockExtensions, _device_context: MockDeviceContext, interval: i32) -> bool {
        if !extensions.swap_interval {
            return false;
        }

        self.push(Event::SetSwapInterval(interval));
        true
    }

    fn swap_buffers(&self, device_context: MockDeviceContext) {
        self.push(Event::SwappedBuffers(device_context));
    }

    fn export_symbol(&self, name: &CStr) -> Option<ProcAddress> {
        let symbol = Symbol::from_name(name.to_str().ok()?)?;
        if symbol.version() == Version::V1_1 {
            MockLibrary::fake_address(symbol)
        } else {
            None
        }
    }

    fn proc_address(&self, name: &CStr) -> Option<ProcAddress> {
        self.current.get()?;

        let name = name.to_str().ok()?;
        if name == VENDOR_FUNCTION {
            return ProcAddress::new(0xdead0 as *const c_void);
        }

        let symbol = Symbol::from_name(name)?;
        let version = symbol.version();
        if version > Version::V1_1 && version <= self.config.driver_version {
            MockLibrary::fake_address(symbol)
        } else {
            None
        }
    }
}
