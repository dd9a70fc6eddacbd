//! Bit-flag sets from `spec.md` §6: the command-line model's `flags`
//! bitset and the per-entry `stat_flags` consulted by `-xtype`.
//!
//! Plain `bitflags`-style `const` bit constants over a `u16`/`u8`, matching
//! the "tagged variant instead of a C union" design direction in `spec.md`
//! §9, without pulling in a separate `bitflags` crate dependency for a
//! handful of flags.

use std::ops::{BitAnd, BitOr};

macro_rules! bitset {
    ($name:ident : $repr:ty { $($flag:ident = $value:expr),+ $(,)? }) => {
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
        pub struct $name(pub $repr);

        impl $name {
            $(pub const $flag: $name = $name($value);)+

            pub const fn empty() -> Self {
                $name(0)
            }

            pub const fn contains(self, other: $name) -> bool {
                (self.0 & other.0) == other.0
            }
        }

        impl BitOr for $name {
            type Output = $name;
            fn bitor(self, rhs: $name) -> $name {
                $name(self.0 | rhs.0)
            }
        }

        impl BitAnd for $name {
            type Output = $name;
            fn bitand(self, rhs: $name) -> $name {
                $name(self.0 & rhs.0)
            }
        }
    };
}

bitset!(Flags: u16 {
    STAT = 1 << 0,
    RECOVER = 1 << 1,
    DEPTH = 1 << 2,
    COMFOLLOW = 1 << 3,
    LOGICAL = 1 << 4,
    DETECT_CYCLES = 1 << 5,
    MOUNT = 1 << 6,
    XDEV = 1 << 7,
});

bitset!(StatFlags: u8 {
    NOFOLLOW = 1 << 0,
    TRYFOLLOW = 1 << 1,
});

impl StatFlags {
    /// `spec.md` §4.2/§9: `-xtype`'s "opposite follow policy" toggle XORs
    /// both the `NOFOLLOW` and `TRYFOLLOW` bits.
    pub fn opposite(self) -> StatFlags {
        StatFlags(self.0 ^ (StatFlags::NOFOLLOW.0 | StatFlags::TRYFOLLOW.0))
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Strategy {
    Bfs,
    Dfs,
    Ids,
}

bitset!(DebugFlags: u8 {
    RATES = 1 << 0,
    STAT = 1 << 1,
    SEARCH = 1 << 2,
});
