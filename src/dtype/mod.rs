//! Element types
//!
//! A split never looks at element values, only at their width, so a dtype
//! here is little more than a name and a byte count. [`Element`] ties the
//! host types that can be uploaded to their dtype.

mod element;

pub use element::Element;

use std::fmt;

macro_rules! dtypes {
    ($($(#[$doc:meta])* $variant:ident = $code:literal, $name:literal, $bytes:literal;)+) => {
        /// Element type of a tensor
        ///
        /// Discriminants are stable and grouped by kind: floats 0..10,
        /// signed integers 10..20, unsigned integers 20..30, bool 30.
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
        #[non_exhaustive]
        #[repr(u8)]
        pub enum DType {
            $($(#[$doc])* $variant = $code,)+
        }

        impl DType {
            /// Every dtype, in discriminant order
            pub const ALL: &'static [DType] = &[$(Self::$variant),+];

            /// Width of one element in bytes
            #[inline]
            pub const fn size_in_bytes(self) -> usize {
                match self {
                    $(Self::$variant => $bytes,)+
                }
            }

            /// Lower-case name, also the suffix of per-dtype kernel symbols
            pub const fn short_name(self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)+
                }
            }
        }
    };
}

dtypes! {
    /// IEEE 754 binary64
    F64 = 0, "f64", 8;
    /// IEEE 754 binary32
    F32 = 1, "f32", 4;
    /// IEEE 754 binary16
    F16 = 2, "f16", 2;
    /// bfloat16
    BF16 = 3, "bf16", 2;
    /// Signed 64-bit
    I64 = 10, "i64", 8;
    /// Signed 32-bit
    I32 = 11, "i32", 4;
    /// Signed 16-bit
    I16 = 12, "i16", 2;
    /// Signed 8-bit
    I8 = 13, "i8", 1;
    /// Unsigned 64-bit
    U64 = 20, "u64", 8;
    /// Unsigned 32-bit
    U32 = 21, "u32", 4;
    /// Unsigned 16-bit
    U16 = 22, "u16", 2;
    /// Unsigned 8-bit
    U8 = 23, "u8", 1;
    /// One byte per element, 0 or 1
    Bool = 30, "bool", 1;
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}
