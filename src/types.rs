use std::fmt::{self, Display, Formatter};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// ======================
// OPENGL PRIMITIVE TYPES
// ======================

pub type Boolean = u8;
pub type Byte = i8;
pub type UByte = u8;
pub type Short = i16;
pub type UShort = u16;
pub type Int = i32;
pub type UInt = u32;
pub type Fixed = i32;
pub type Int64 = i64;
pub type UInt64 = u64;
pub type SizeI = i32;
pub type Enum = u32;
pub type IntPtr = isize;
pub type SizeIPtr = isize;
pub type Sync = *const ();
pub type BitField = u32;
pub type Half = u16;
pub type Float = f32;
pub type ClampF = f32;
pub type Double = f64;
pub type ClampD = f64;
pub type Char = i8;

// =========================
// CONTEXT CREATION ATTRIBUTES
// =========================

// WGL_ARB_create_context and GLX_ARB_create_context share their values.
pub const CONTEXT_MAJOR_VERSION: i32 = 0x2091;
pub const CONTEXT_MINOR_VERSION: i32 = 0x2092;
pub const CONTEXT_FLAGS: i32 = 0x2094;
pub const CONTEXT_PROFILE_MASK: i32 = 0x9126;

pub const CONTEXT_DEBUG_BIT: i32 = 0x0001;
pub const CONTEXT_FORWARD_COMPATIBLE_BIT: i32 = 0x0002;

pub const CONTEXT_CORE_PROFILE_BIT: i32 = 0x0001;
pub const CONTEXT_COMPATIBILITY_PROFILE_BIT: i32 = 0x0002;

/// An OpenGL API version, e.g. `Version::new(3, 3)`.
///
/// Ordering is by major version, then minor version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Version {
    pub major: u32,
    pub minor: u32,
}

impl Version {
    pub const V1_1: Version = Version::new(1, 1);
    pub const V1_2: Version = Version::new(1, 2);
    pub const V1_3: Version = Version::new(1, 3);
    pub const V1_4: Version = Version::new(1, 4);
    pub const V1_5: Version = Version::new(1, 5);
    pub const V2_0: Version = Version::new(2, 0);
    pub const V2_1: Version = Version::new(2, 1);
    pub const V3_0: Version = Version::new(3, 0);
    pub const V3_1: Version = Version::new(3, 1);
    pub const V3_2: Version = Version::new(3, 2);
    pub const V3_3: Version = Version::new(3, 3);
    pub const V4_0: Version = Version::new(4, 0);
    pub const V4_1: Version = Version::new(4, 1);
    pub const V4_2: Version = Version::new(4, 2);
    pub const V4_3: Version = Version::new(4, 3);
    pub const V4_4: Version = Version::new(4, 4);
    pub const V4_5: Version = Version::new(4, 5);
    pub const V4_6: Version = Version::new(4, 6);

    /// Every API version block the function table knows about, oldest first.
    pub const ALL: [Version; 18] = [
        Version::V1_1, Version::V1_2, Version::V1_3, Version::V1_4, Version::V1_5,
        Version::V2_0, Version::V2_1,
        Version::V3_0, Version::V3_1, Version::V3_2, Version::V3_3,
        Version::V4_0, Version::V4_1, Version::V4_2, Version::V4_3, Version::V4_4, Version::V4_5,
        Version::V4_6,
    ];

    pub const fn new(major: u32, minor: u32) -> Version {
        Version { major, minor }
    }

    /// Modern (versioned, profile-scoped) contexts only exist from 3.0 onwards.
    pub fn supports_profiles(self) -> bool {
        self >= Version::V3_0
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// The context profile requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Profile {
    /// Whatever the platform hands out from its plain context creation call.
    Legacy,

    /// Versioned context without deprecated functionality.
    Core,

    /// Versioned context with deprecated functionality retained.
    Compatibility,
}

impl Profile {
    pub fn is_modern(self) -> bool {
        self != Profile::Legacy
    }

    /// Value for `CONTEXT_PROFILE_MASK`, `None` for legacy contexts.
    pub fn profile_mask(self) -> Option<i32> {
        match self {
            Profile::Legacy => None,
            Profile::Core => Some(CONTEXT_CORE_PROFILE_BIT),
            Profile::Compatibility => Some(CONTEXT_COMPATIBILITY_PROFILE_BIT),
        }
    }
}

impl Default for Profile {
    fn default() -> Profile {
        Profile::Legacy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_ordering() {
        assert!(Version::new(2, 1) < Version::V3_0);
        assert!(Version::new(3, 10) > Version::V3_3);
        assert!(Version::V4_0 > Version::new(3, 10));
        assert!(!Version::new(2, 1).supports_profiles());
        assert!(Version::V3_0.supports_profiles());

        let mut sorted = Version::ALL;
        sorted.sort();
        assert_eq!(Version::ALL, sorted);
    }

    #[test]
    fn profile_masks() {
        assert_eq!(None, Profile::Legacy.profile_mask());
        assert_eq!(Some(0x1), Profile::Core.profile_mask());
        assert_eq!(Some(0x2), Profile::Compatibility.profile_mask());
        assert_eq!(Profile::Legacy, Profile::default());
    }
}
