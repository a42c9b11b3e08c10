//! Runtime dtype to compile-time element type dispatch.
//!
//! The inverse of [`Dtype::of`](crate::dtype::Dtype::of): given a dtype only
//! known at runtime, run a generic body with the matching Rust type.

/// Run `body` with `T` bound to the element type of a runtime dtype.
///
/// Evaluates to `Result<R, GuardError>`, where `R` is the type of `body`.
/// `Undefined`, `Object` and non-canonical dtypes yield
/// [`GuardError::UnsupportedDtype`](crate::GuardError::UnsupportedDtype).
///
/// ```
/// use dtguard_core::dispatch_dtype;
/// use dtguard_core::dtype::INT16;
///
/// let width = dispatch_dtype!(INT16, |T| std::mem::size_of::<T>()).unwrap();
/// assert_eq!(width, 2);
/// ```
#[macro_export]
macro_rules! dispatch_dtype {
    ($dtype:expr, |$t:ident| $body:expr) => {{
        let dtype: $crate::dtype::Dtype = $dtype;
        match dtype {
            $crate::dtype::Dtype::FLOAT32 => {
                type $t = f32;
                ::std::result::Result::Ok::<_, $crate::GuardError>($body)
            }
            $crate::dtype::Dtype::FLOAT64 => {
                type $t = f64;
                ::std::result::Result::Ok($body)
            }
            $crate::dtype::Dtype::INT8 => {
                type $t = i8;
                ::std::result::Result::Ok($body)
            }
            $crate::dtype::Dtype::INT16 => {
                type $t = i16;
                ::std::result::Result::Ok($body)
            }
            $crate::dtype::Dtype::INT32 => {
                type $t = i32;
                ::std::result::Result::Ok($body)
            }
            $crate::dtype::Dtype::INT64 => {
                type $t = i64;
                ::std::result::Result::Ok($body)
            }
            $crate::dtype::Dtype::UINT8 => {
                type $t = u8;
                ::std::result::Result::Ok($body)
            }
            $crate::dtype::Dtype::UINT16 => {
                type $t = u16;
                ::std::result::Result::Ok($body)
            }
            $crate::dtype::Dtype::UINT32 => {
                type $t = u32;
                ::std::result::Result::Ok($body)
            }
            $crate::dtype::Dtype::UINT64 => {
                type $t = u64;
                ::std::result::Result::Ok($body)
            }
            $crate::dtype::Dtype::BOOL => {
                type $t = bool;
                ::std::result::Result::Ok($body)
            }
            other => ::std::result::Result::Err($crate::GuardError::UnsupportedDtype {
                op: "dispatch_dtype",
                dtype: other,
            }),
        }
    }};
}
