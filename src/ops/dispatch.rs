//! Runtime dtype to element type dispatch
//!
//! `dispatch_dtype!(dtype, T => { .. }, "op")` runs the block with `T` bound
//! to a host type of the same width as `dtype`:
//!
//! | dtype            | `T`                   |
//! |------------------|-----------------------|
//! | `F64`, `F32`     | `f64`, `f32`          |
//! | `F16`, `BF16`    | `u16`                 |
//! | `I64`..`I8`      | `i64`..`i8`           |
//! | `U64`..`U8`      | `u64`..`u8`           |
//! | `Bool`           | `u8`                  |
//!
//! Half types and `Bool` run as their raw bit pattern, which is all a copy
//! needs and does not depend on the `f16` feature. The block runs inside the
//! caller's function, which must return [`crate::error::Result`]; dtypes
//! added later return `UnsupportedDType` tagged with `"op"`.
//!
//! ```ignore
//! fn width(dtype: DType) -> Result<usize> {
//!     dispatch_dtype!(dtype, T => { return Ok(std::mem::size_of::<T>()); }, "width");
//! }
//! ```

/// One arm of [`dispatch_dtype!`]: alias `$T` and run the body.
#[macro_export]
#[doc(hidden)]
macro_rules! __dispatch_bind {
    ($T:ident = $ty:ty, $body:block) => {{
        type $T = $ty;
        $body
    }};
}

/// Run `$body` with `$T` bound to the element type of `$dtype`.
///
/// `Bool` runs as `u8`, `F16`/`BF16` as `u16`.
#[macro_export]
macro_rules! dispatch_dtype {
    ($dtype:expr, $T:ident => $body:block, $error_op:expr) => {{
        use $crate::dtype::DType as __DType;
        match $dtype {
            __DType::F64 => $crate::__dispatch_bind!($T = f64, $body),
            __DType::F32 => $crate::__dispatch_bind!($T = f32, $body),
            __DType::F16 | __DType::BF16 => $crate::__dispatch_bind!($T = u16, $body),
            __DType::I64 => $crate::__dispatch_bind!($T = i64, $body),
            __DType::I32 => $crate::__dispatch_bind!($T = i32, $body),
            __DType::I16 => $crate::__dispatch_bind!($T = i16, $body),
            __DType::I8 => $crate::__dispatch_bind!($T = i8, $body),
            __DType::U64 => $crate::__dispatch_bind!($T = u64, $body),
            __DType::U32 => $crate::__dispatch_bind!($T = u32, $body),
            __DType::U16 => $crate::__dispatch_bind!($T = u16, $body),
            __DType::U8 | __DType::Bool => $crate::__dispatch_bind!($T = u8, $body),
            #[allow(unreachable_patterns)]
            other => {
                return Err($crate::error::Error::UnsupportedDType {
                    dtype: other,
                    op: $error_op,
                });
            }
        }
    }};
}
