//! Stand-in for targets without a GL backend. Every load fails with `Error::UnsupportedPlatform`.

use std::ffi::CStr;

use crate::error::Error;
use crate::platform::{Extensions, Library, Platform, ProcAddress};

#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedPlatform;

impl Platform for UnsupportedPlatform {
    type Library = Unsupported;

    fn default_library_names(&self) -> &'static [&'static str] {
        &[]
    }

    fn open(&self, _name: &str) -> Result<Unsupported, Error> {
        Err(Error::UnsupportedPlatform)
    }
}

/// Can't be constructed.
#[derive(Debug)]
pub enum Unsupported {}

#[derive(Debug, Clone, Copy)]
pub enum NoExtensions {}

impl Extensions for NoExtensions {
    fn supports_create_context_attribs(&self) -> bool { match *self {} }
    fn supports_pixel_format_attribs(&self) -> bool { match *self {} }
    fn supports_swap_interval(&self) -> bool { match *self {} }
}

impl Library for Unsupported {
    type Window = ();
    type DeviceContext = ();
    type PixelFormat = ();
    type Context = ();
    type Extensions = NoExtensions;

    fn name(&self) -> &str { match *self {} }
    fn acquire_device_context(&self, _: ()) -> Option<()> { match *self {} }
    fn release_device_context(&self, _: (), _: ()) { match *self {} }
    fn choose_pixel_format(&self, _: ()) -> Result<(), Error> { match *self {} }
    fn release_pixel_format(&self, _: (), _: ()) { match *self {} }
    fn create_context(&self, _: (), _: &()) -> Option<()> { match *self {} }
    fn make_current(&self, _: (), _: Option<()>) -> bool { match *self {} }
    fn delete_context(&self, _: (), _: ()) { match *self {} }
    fn load_extensions(&self, _: ()) -> NoExtensions { match *self {} }
    fn create_context_attribs(&self, _: &NoExtensions, _: (), _: &(), _: &[i32]) -> Option<()> { match *self {} }
    fn set_swap_interval(&self, _: &NoExtensions, _: (), _: i32) -> bool { match *self {} }
    fn swap_buffers(&self, _: ()) { match *self {} }
    fn export_symbol(&self, _: &CStr) -> Option<ProcAddress> { match *self {} }
    fn proc_address(&self, _: &CStr) -> Option<ProcAddress> { match *self {} }
}
