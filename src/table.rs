//! The table of resolved GL entry points.

use std::mem;

use log::{debug, info, trace};

use crate::platform::{Library, ProcAddress};
use crate::resolver;
use crate::symbols::{Symbol, SYMBOLS};
use crate::types::Version;

/// One slot per `Symbol`, `None` for entry points that didn't resolve.
///
/// A table only holds addresses between `populate()` and `clear()`. The addresses are only valid
/// while the library they came from stays loaded, which the `Loader` guarantees by clearing the
/// table before unloading.
#[derive(Debug, Clone)]
pub struct FunctionTable {
    slots: Vec<Option<ProcAddress>>,
}

impl FunctionTable {
    pub fn new() -> FunctionTable {
        FunctionTable {
            slots: vec![None; SYMBOLS.len()],
        }
    }

    /// Resolves every known entry point through `library`.
    ///
    /// Must be called while a context is current, since some platforms only hand out addresses
    /// for the current context. Previously resolved slots are overwritten. Returns the number of
    /// resolved entry points.
    pub fn populate<L: Library>(&mut self, library: &L) -> usize {
        let mut loaded = 0;
        for info in SYMBOLS {
            let address = resolver::lookup(library, info.c_name());
            match address {
                Some(_) => loaded += 1,
                None => trace!("{} ({}) did not resolve", info.name(), info.version),
            }
            self.slots[info.symbol as usize] = address;
        }

        info!("Loaded {} of {} OpenGL functions from '{}'", loaded, SYMBOLS.len(), library.name());
        match self.highest_complete_version() {
            Some(version) => debug!("All OpenGL {} functions are available", version),
            None => debug!("OpenGL 1.1 is incomplete"),
        }

        loaded
    }

    /// Resets every slot to `None`.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
    }

    pub fn get(&self, symbol: Symbol) -> Option<ProcAddress> {
        self.slots[symbol as usize]
    }

    /// Looks an entry point up by its GL name, e.g. `"glClear"`.
    pub fn get_by_name(&self, name: &str) -> Option<ProcAddress> {
        Symbol::from_name(name).and_then(|symbol| self.get(symbol))
    }

    /// Returns the entry point as a function pointer of type `F`.
    ///
    /// # Safety
    ///
    /// `F` must be an `extern "system"` function pointer type matching the entry point's
    /// signature. The pointer must not be called after the loader is unloaded.
    pub unsafe fn get_as<F: Copy>(&self, symbol: Symbol) -> Option<F> {
        debug_assert_eq!(mem::size_of::<F>(), mem::size_of::<usize>());
        self.get(symbol).map(|address| address.cast())
    }

    pub fn is_loaded(&self, symbol: Symbol) -> bool {
        self.get(symbol).is_some()
    }

    pub fn loaded_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Whether every entry point introduced by `version` or any earlier version resolved.
    pub fn supports(&self, version: Version) -> bool {
        SYMBOLS.iter()
            .filter(|info| info.version <= version)
            .all(|info| self.is_loaded(info.symbol))
    }

    /// The highest version whose entry points all resolved, along with every earlier version's.
    pub fn highest_complete_version(&self) -> Option<Version> {
        Version::ALL.iter()
            .take_while(|&&version| self.supports_exactly(version))
            .last()
            .cloned()
    }

    fn supports_exactly(&self, version: Version) -> bool {
        SYMBOLS.iter()
            .filter(|info| info.version == version)
            .all(|info| self.is_loaded(info.symbol))
    }
}

impl Default for FunctionTable {
    fn default() -> FunctionTable {
        FunctionTable::new()
    }
}
