//! Tensor property checks.
//!
//! Each check compares one property of a tensor with an expectation and
//! returns `Ok(())` or a [`GuardError::PreconditionViolated`] that names the
//! actual value, the expected value and the caller's [`CallSite`].
//!
//! Call them through the `assert_tensor_*!` macros so the call site is
//! captured where the check is written:
//!
//! ```
//! use dtguard_core::prelude::*;
//! use dtguard_core::dtype::FLOAT32;
//!
//! fn normalize(points: &Tensor) -> Result<()> {
//!     assert_tensor_dtype!(points, FLOAT32)?;
//!     assert_tensor_shape_compatible!(points, shape_pattern![_, 3])?;
//!     Ok(())
//! }
//!
//! let points = Tensor::empty(&[128, 3], FLOAT32, Device::Cpu);
//! assert!(normalize(&points).is_ok());
//! ```
//!
//! The passing path only compares values. Messages are built in cold
//! helpers, only once a check has already failed.

use std::fmt;

use crate::device::Device;
use crate::dtype::Dtype;
use crate::error::GuardError;
use crate::shape::{Shape, ShapePattern};
use crate::site::CallSite;
use crate::tensor::TensorProps;
use crate::Result;

/// Fail unless `tensor.dtype() == expected`.
#[inline]
pub fn assert_tensor_dtype<T>(tensor: &T, expected: Dtype, site: CallSite) -> Result<()>
where
    T: TensorProps + ?Sized,
{
    let actual = tensor.dtype();
    if actual == expected {
        return Ok(());
    }
    Err(violation(
        site,
        format_args!("Tensor has dtype {actual}, but is expected to be {expected}."),
    ))
}

/// Fail unless the tensor's dtype is one of `expected`.
#[inline]
pub fn assert_tensor_dtypes<T>(tensor: &T, expected: &[Dtype], site: CallSite) -> Result<()>
where
    T: TensorProps + ?Sized,
{
    let actual = tensor.dtype();
    if expected.contains(&actual) {
        return Ok(());
    }
    Err(violation(
        site,
        format_args!(
            "Tensor has dtype {actual}, but is expected to have dtype among {{{}}}.",
            Joined(expected)
        ),
    ))
}

/// Fail unless `tensor.device() == expected`.
#[inline]
pub fn assert_tensor_device<T>(tensor: &T, expected: Device, site: CallSite) -> Result<()>
where
    T: TensorProps + ?Sized,
{
    let actual = tensor.device();
    if actual == expected {
        return Ok(());
    }
    Err(violation(
        site,
        format_args!("Tensor has device {actual}, but is expected to be {expected}."),
    ))
}

/// Fail unless the tensor's shape equals `expected` exactly.
#[inline]
pub fn assert_tensor_shape<T>(tensor: &T, expected: &Shape, site: CallSite) -> Result<()>
where
    T: TensorProps + ?Sized,
{
    let actual = tensor.shape();
    if actual == expected {
        return Ok(());
    }
    Err(violation(
        site,
        format_args!("Tensor has shape {actual}, but is expected to be {expected}."),
    ))
}

/// Fail unless the tensor's shape matches `expected`, where wildcard
/// dimensions accept any size. Ranks must be equal.
#[inline]
pub fn assert_tensor_shape_compatible<T>(
    tensor: &T,
    expected: &ShapePattern,
    site: CallSite,
) -> Result<()>
where
    T: TensorProps + ?Sized,
{
    let actual = tensor.shape();
    if expected.matches(actual) {
        return Ok(());
    }
    Err(incompatible_shape(actual, expected, site))
}

/// Fail unless the tensor is row-major contiguous.
#[inline]
pub fn assert_tensor_contiguous<T>(tensor: &T, site: CallSite) -> Result<()>
where
    T: TensorProps + ?Sized,
{
    if tensor.is_contiguous() {
        return Ok(());
    }
    Err(violation(
        site,
        format_args!(
            "Tensor with shape {} and strides {:?} is not contiguous, but is expected to be contiguous.",
            tensor.shape(),
            tensor.strides()
        ),
    ))
}

#[cold]
#[inline(never)]
fn incompatible_shape(actual: &Shape, expected: &ShapePattern, site: CallSite) -> GuardError {
    if actual.ndim() != expected.ndim() {
        return violation(
            site,
            format_args!(
                "Tensor has shape {actual}, but is expected to be {expected}. Rank {} does not match expected rank {}.",
                actual.ndim(),
                expected.ndim()
            ),
        );
    }
    let axes = expected.mismatched_dims(actual);
    violation(
        site,
        format_args!(
            "Tensor has shape {actual}, but is expected to be {expected}. Mismatched dimension(s): {}.",
            Joined(&axes)
        ),
    )
}

#[cold]
#[inline(never)]
fn violation(site: CallSite, message: fmt::Arguments<'_>) -> GuardError {
    let message = message.to_string();
    tracing::debug!(
        file = site.file(),
        line = site.line(),
        function = site.function(),
        "precondition violated: {message}"
    );
    GuardError::PreconditionViolated { message, site }
}

/// Comma-separated `Display` of a slice.
struct Joined<'a, T>(&'a [T]);

impl<T: fmt::Display> fmt::Display for Joined<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, item) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{item}")?;
        }
        Ok(())
    }
}

/// Check a tensor's dtype, reporting the caller's location on failure.
///
/// `assert_tensor_dtype!(tensor, dtype)` evaluates to `Result<()>`.
#[macro_export]
macro_rules! assert_tensor_dtype {
    ($tensor:expr, $dtype:expr $(,)?) => {
        $crate::check::assert_tensor_dtype(&$tensor, $dtype, $crate::call_site!())
    };
}

/// Check that a tensor's dtype is one of several.
///
/// `assert_tensor_dtypes!(tensor, [FLOAT32, FLOAT64])`
#[macro_export]
macro_rules! assert_tensor_dtypes {
    ($tensor:expr, $dtypes:expr $(,)?) => {
        $crate::check::assert_tensor_dtypes(&$tensor, &$dtypes, $crate::call_site!())
    };
}

/// Check a tensor's device, reporting the caller's location on failure.
#[macro_export]
macro_rules! assert_tensor_device {
    ($tensor:expr, $device:expr $(,)?) => {
        $crate::check::assert_tensor_device(&$tensor, $device, $crate::call_site!())
    };
}

/// Check a tensor's exact shape. `$shape` is a [`Shape`](crate::Shape).
#[macro_export]
macro_rules! assert_tensor_shape {
    ($tensor:expr, $shape:expr $(,)?) => {
        $crate::check::assert_tensor_shape(&$tensor, &$shape, $crate::call_site!())
    };
}

/// Check a tensor's shape against a [`ShapePattern`](crate::ShapePattern).
#[macro_export]
macro_rules! assert_tensor_shape_compatible {
    ($tensor:expr, $pattern:expr $(,)?) => {
        $crate::check::assert_tensor_shape_compatible(&$tensor, &$pattern, $crate::call_site!())
    };
}

/// Check that a tensor is contiguous.
#[macro_export]
macro_rules! assert_tensor_contiguous {
    ($tensor:expr $(,)?) => {
        $crate::check::assert_tensor_contiguous(&$tensor, $crate::call_site!())
    };
}
