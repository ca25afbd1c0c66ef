//! Locating the GL client library and resolving symbols from it.

use std::ffi::CStr;

use log::{debug, error, info};

use crate::error::Error;
use crate::platform::{Library, Platform, ProcAddress};

/// Opens the first of `candidates` that the platform can open.
///
/// A candidate that can't be opened is skipped. A candidate that opens but is missing a
/// bootstrap symbol aborts the probe, the platform has already released it.
pub fn open_first<P: Platform>(platform: &P, candidates: &[String]) -> Result<P::Library, Error> {
    for name in candidates {
        debug!("Probing OpenGL library '{}'", name);

        match platform.open(name) {
            Ok(library) => {
                info!("Loaded OpenGL library '{}'", name);
                return Ok(library);
            }

            Err(Error::LibraryNotFound { .. }) => {
                debug!("OpenGL library '{}' is not available", name);
            }

            Err(err) => {
                error!("Failed loading OpenGL library '{}': {}", name, err);
                return Err(err);
            }
        }
    }

    let err = Error::LibraryNotFound {
        candidates: candidates.to_vec(),
    };
    error!("{}", err);
    Err(err)
}

/// Resolves `name` for use with a current context.
///
/// The library's export table is tried first, since some platforms only hand out the baseline
/// functions that way, then the platform's "get proc address" function, which covers everything
/// else.
pub fn lookup<L: Library>(library: &L, name: &CStr) -> Option<ProcAddress> {
    library.export_symbol(name).or_else(|| library.proc_address(name))
}

/// Opens a native dynamic library.
#[cfg_attr(not(any(target_os = "windows", target_os = "linux")), allow(dead_code))]
pub(crate) fn open_module(name: &str) -> Result<libloading::Library, Error> {
    match unsafe { libloading::Library::new(name) } {
        Ok(module) => Ok(module),
        Err(err) => {
            debug!("Unable to open '{}': {}", name, err);
            Err(Error::LibraryNotFound {
                candidates: vec![name.into()],
            })
        }
    }
}

/// Resolves a required symbol from `module`.
///
/// `symbol` must be nul-terminated.
///
/// # Safety
///
/// `T` must be a function pointer type matching the symbol's actual signature.
#[cfg_attr(not(any(target_os = "windows", target_os = "linux")), allow(dead_code))]
pub(crate) unsafe fn require<T: Copy>(
    module: &libloading::Library,
    library_name: &str,
    symbol: &[u8],
) -> Result<T, Error> {
    optional(module, symbol).ok_or_else(|| Error::SymbolMissing {
        library: library_name.into(),
        symbol: String::from_utf8_lossy(symbol.strip_suffix(b"\0").unwrap_or(symbol)).into_owned(),
    })
}

/// Resolves a symbol from `module`, `None` if it isn't exported.
///
/// # Safety
///
/// Same as `require()`.
#[cfg_attr(not(any(target_os = "windows", target_os = "linux")), allow(dead_code))]
pub(crate) unsafe fn optional<T: Copy>(module: &libloading::Library, symbol: &[u8]) -> Option<T> {
    module.get::<T>(symbol).ok().map(|symbol| *symbol)
}

/// Looks `name` up in `module`'s export table.
#[cfg_attr(not(any(target_os = "windows", target_os = "linux")), allow(dead_code))]
pub(crate) fn export(module: &libloading::Library, name: &CStr) -> Option<ProcAddress> {
    unsafe {
        module
            .get::<*const ::std::os::raw::c_void>(name.to_bytes_with_nul())
            .ok()
            .and_then(|symbol| ProcAddress::new(*symbol))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_module_is_library_not_found() {
        let result = open_module("libdefinitely-not-a-gl-library.so.42");
        assert_eq!(
            Err(Error::LibraryNotFound { candidates: vec!["libdefinitely-not-a-gl-library.so.42".into()] }),
            result.map(|_| ()));
    }
}
