//! Rendering context negotiation.
//!
//! A context is always created in two steps: first a legacy context, which is required because the
//! extended creation entry points can only be resolved while some context is current, then (if the
//! caller asked for one) a versioned, profile-scoped context through those entry points. Failing to
//! get the legacy context is fatal; failing anywhere on the way to the modern context falls back to
//! the legacy one.

use std::fmt::{self, Display, Formatter};

use log::{debug, error, info, warn};

use crate::config::ContextCreationRequest;
use crate::error::Error;
use crate::platform::{Extensions, Library, Surface, SurfaceOf};
use crate::types::{
    Profile, Version,
    CONTEXT_DEBUG_BIT, CONTEXT_FLAGS, CONTEXT_FORWARD_COMPATIBLE_BIT, CONTEXT_MAJOR_VERSION,
    CONTEXT_MINOR_VERSION, CONTEXT_PROFILE_MASK,
};

/// Upper bound on the attribute list: four key/value pairs and the terminator.
const MAX_CONTEXT_ATTRIBUTES: usize = 9;

/// The kind of context a negotiation produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextKind {
    /// A context created without version or profile.
    Legacy,

    /// A context created through the extended entry point with the given version and profile.
    Modern {
        version: Version,
        profile: Profile,
    },
}

/// Why a requested modern context was replaced by the legacy one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Degradation {
    /// Versioned contexts need at least version 3.0.
    VersionTooLow(Version),

    /// The extended context creation entry point didn't resolve.
    ExtensionUnavailable,

    /// The driver refused to create the versioned context.
    CreationFailed,

    /// The versioned context was created but couldn't be made current.
    ActivationFailed,
}

impl Display for Degradation {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match *self {
            Degradation::VersionTooLow(version) => {
                write!(f, "version {} is too low for a modern context, 3.0 is required", version)
            }
            Degradation::ExtensionUnavailable => {
                f.write_str("the extended context creation entry point is not available")
            }
            Degradation::CreationFailed => f.write_str("creating the modern context failed"),
            Degradation::ActivationFailed => f.write_str("activating the modern context failed"),
        }
    }
}

/// Negotiation progress, see the module docs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Stage {
    Unstarted,
    DeviceContextAcquired,
    LegacyContextCreated,
    LegacyContextCurrent,
    ExtendedEntryPointsProbed,
    ModernContextAttempted,
    ModernContextCurrent,
    ModernContextFailed,
    Done,
}

/// Result of a successful negotiation. The context is current.
#[derive(Debug)]
pub(crate) struct Negotiated<L: Library> {
    pub device_context: L::DeviceContext,

    /// The window the device context was acquired from, `None` if the caller supplied it.
    pub window: Option<L::Window>,

    pub context: L::Context,
    pub kind: ContextKind,
    pub degradation: Option<Degradation>,
    pub extensions: L::Extensions,
}

/// Builds the zero-terminated attribute list for a versioned context.
pub fn context_attributes(request: &ContextCreationRequest) -> Vec<i32> {
    let mut attributes = Vec::with_capacity(MAX_CONTEXT_ATTRIBUTES);

    attributes.push(CONTEXT_MAJOR_VERSION);
    attributes.push(request.version.major as i32);
    attributes.push(CONTEXT_MINOR_VERSION);
    attributes.push(request.version.minor as i32);

    if let Some(profile_mask) = request.profile.profile_mask() {
        attributes.push(CONTEXT_PROFILE_MASK);
        attributes.push(profile_mask);
    }

    let mut flags = 0;
    if request.forward_compatible {
        flags |= CONTEXT_FORWARD_COMPATIBLE_BIT;
    }
    if request.debug {
        flags |= CONTEXT_DEBUG_BIT;
    }
    if flags != 0 {
        attributes.push(CONTEXT_FLAGS);
        attributes.push(flags);
    }

    attributes.push(0);

    debug_assert!(attributes.len() <= MAX_CONTEXT_ATTRIBUTES, "too many context attributes: {:?}", attributes);
    attributes
}

/// Creates a context for `surface` and leaves it current.
pub(crate) fn negotiate<L: Library>(
    library: &L,
    surface: SurfaceOf<L>,
    request: &ContextCreationRequest,
) -> Result<Negotiated<L>, Error> {
    if request.profile.is_modern() && request.version.major == 0 {
        let err = Error::InvalidRequest(format!("profile {:?} requires a version", request.profile));
        error!("{}", err);
        return Err(err);
    }

    let mut negotiation = Negotiation::new(library);
    negotiation.acquire_device_context(surface)?;
    negotiation.choose_pixel_format()?;
    negotiation.create_legacy_context()?;
    let extensions = negotiation.probe_extensions()?;

    let (kind, degradation) = if request.profile.is_modern() {
        negotiation.upgrade(request, &extensions)?
    } else {
        (ContextKind::Legacy, None)
    };

    if let Some(interval) = request.swap_interval {
        negotiation.set_swap_interval(&extensions, interval);
    }

    negotiation.finish(kind, degradation, extensions)
}

/// Resources acquired so far. Anything still held when this is dropped gets released in reverse
/// acquisition order.
struct Negotiation<'a, L: Library> {
    library: &'a L,
    stage: Stage,

    device_context: Option<L::DeviceContext>,
    window: Option<L::Window>,
    pixel_format: Option<L::PixelFormat>,

    /// The legacy context, or the modern one once it replaced it.
    context: Option<L::Context>,
}

impl<'a, L: Library> Negotiation<'a, L> {
    fn new(library: &'a L) -> Negotiation<'a, L> {
        Negotiation {
            library: library,
            stage: Stage::Unstarted,
            device_context: None,
            window: None,
            pixel_format: None,
            context: None,
        }
    }

    fn advance(&mut self, stage: Stage) {
        debug!("Context negotiation: {:?} -> {:?}", self.stage, stage);
        self.stage = stage;
    }

    fn acquire_device_context(&mut self, surface: SurfaceOf<L>) -> Result<(), Error> {
        let device_context = match surface {
            Surface::DeviceContext(device_context) => device_context,
            Surface::Window(window) => {
                let device_context = self.library.acquire_device_context(window).ok_or_else(|| {
                    error!("Failed getting device context for window {:?}", window);
                    Error::DeviceContextUnavailable
                })?;
                self.window = Some(window);
                device_context
            }
        };

        self.device_context = Some(device_context);
        self.advance(Stage::DeviceContextAcquired);
        Ok(())
    }

    fn device_context(&self) -> Result<L::DeviceContext, Error> {
        self.device_context.ok_or(Error::DeviceContextUnavailable)
    }

    fn choose_pixel_format(&mut self) -> Result<(), Error> {
        let device_context = self.device_context()?;
        let pixel_format = self.library.choose_pixel_format(device_context).map_err(|err| {
            error!("{}", err);
            err
        })?;
        self.pixel_format = Some(pixel_format);
        Ok(())
    }

    fn create_legacy_context(&mut self) -> Result<(), Error> {
        let device_context = self.device_context()?;
        let context = match self.pixel_format {
            Some(ref pixel_format) => self.library.create_context(device_context, pixel_format),
            None => None,
        };

        let context = context.ok_or_else(|| {
            let err = Error::LegacyContextCreationFailed(
                format!("the platform refused to create a context for {:?}", device_context));
            error!("{}", err);
            err
        })?;
        self.context = Some(context);
        self.advance(Stage::LegacyContextCreated);

        if !self.library.make_current(device_context, Some(context)) {
            let err = Error::LegacyContextCreationFailed(
                format!("failed activating context {:?} for {:?}", context, device_context));
            error!("{}", err);
            return Err(err);
        }
        self.advance(Stage::LegacyContextCurrent);

        Ok(())
    }

    fn probe_extensions(&mut self) -> Result<L::Extensions, Error> {
        let extensions = self.library.load_extensions(self.device_context()?);
        debug!("Extended entry points: {:?}", extensions);
        self.advance(Stage::ExtendedEntryPointsProbed);
        Ok(extensions)
    }

    /// Replaces the legacy context with a modern one, or keeps the legacy context current if that
    /// isn't possible.
    fn upgrade(
        &mut self,
        request: &ContextCreationRequest,
        extensions: &L::Extensions,
    ) -> Result<(ContextKind, Option<Degradation>), Error> {
        let device_context = self.device_context()?;

        match self.create_modern_context(request, extensions) {
            Ok(modern) => {
                if let Some(legacy) = self.context.replace(modern) {
                    self.library.delete_context(device_context, legacy);
                }
                self.advance(Stage::ModernContextCurrent);

                Ok((ContextKind::Modern { version: request.version, profile: request.profile }, None))
            }

            Err(degradation) => {
                self.advance(Stage::ModernContextFailed);
                warn!(
                    "Failed creating modern OpenGL {} {:?} context ({}), falling back to legacy context",
                    request.version,
                    request.profile,
                    degradation);

                if !self.library.make_current(device_context, self.context) {
                    let err = Error::LegacyContextCreationFailed(
                        format!("failed re-activating legacy context {:?}", self.context));
                    error!("{}", err);
                    return Err(err);
                }
                self.advance(Stage::LegacyContextCurrent);

                Ok((ContextKind::Legacy, Some(degradation)))
            }
        }
    }

    fn create_modern_context(
        &mut self,
        request: &ContextCreationRequest,
        extensions: &L::Extensions,
    ) -> Result<L::Context, Degradation> {
        if !request.version.supports_profiles() {
            return Err(Degradation::VersionTooLow(request.version));
        }

        if !extensions.supports_create_context_attribs() {
            return Err(Degradation::ExtensionUnavailable);
        }

        if !extensions.supports_pixel_format_attribs() {
            debug!("Attribute based pixel format selection is not available, keeping the legacy pixel format");
        }

        let attributes = context_attributes(request);
        self.advance(Stage::ModernContextAttempted);

        let (device_context, pixel_format) = match (self.device_context, self.pixel_format.as_ref()) {
            (Some(device_context), Some(pixel_format)) => (device_context, pixel_format),
            _ => return Err(Degradation::CreationFailed),
        };

        let modern = self.library
            .create_context_attribs(extensions, device_context, pixel_format, &attributes)
            .ok_or(Degradation::CreationFailed)?;

        if !self.library.make_current(device_context, Some(modern)) {
            self.library.delete_context(device_context, modern);
            return Err(Degradation::ActivationFailed);
        }

        Ok(modern)
    }

    fn set_swap_interval(&mut self, extensions: &L::Extensions, interval: i32) {
        let device_context = match self.device_context {
            Some(device_context) => device_context,
            None => return,
        };

        if !extensions.supports_swap_interval() {
            debug!("Swap interval control is not available, ignoring swap interval {}", interval);
        } else if !self.library.set_swap_interval(extensions, device_context, interval) {
            warn!("Failed setting swap interval {}", interval);
        }
    }

    fn finish(
        mut self,
        kind: ContextKind,
        degradation: Option<Degradation>,
        extensions: L::Extensions,
    ) -> Result<Negotiated<L>, Error> {
        // Everything taken here is handed over to the caller, the rest is released on drop.
        let device_context = self.device_context()?;
        let context = self.context.take().ok_or_else(|| {
            Error::LegacyContextCreationFailed("negotiation finished without a context".into())
        })?;
        let window = self.window.take();
        self.advance(Stage::Done);

        info!("Created {:?} OpenGL context {:?} for {:?}", kind, context, device_context);

        Ok(Negotiated {
            device_context: device_context,
            window: window,
            context: context,
            kind: kind,
            degradation: degradation,
            extensions: extensions,
        })
    }
}

impl<'a, L: Library> Drop for Negotiation<'a, L> {
    fn drop(&mut self) {
        let device_context = match self.device_context {
            Some(device_context) => device_context,
            None => return,
        };

        if let Some(context) = self.context.take() {
            if self.stage >= Stage::LegacyContextCurrent {
                self.library.make_current(device_context, None);
            }
            self.library.delete_context(device_context, context);
        }

        if let Some(pixel_format) = self.pixel_format.take() {
            self.library.release_pixel_format(device_context, pixel_format);
        }

        if let Some(window) = self.window.take() {
            self.library.release_device_context(window, device_context);
        }
    }
}
