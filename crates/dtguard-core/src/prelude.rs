//! Convenience re-exports for common dtguard-core types and checks.
//!
//! ```rust
//! use dtguard_core::prelude::*;
//! ```

pub use crate::{CallSite, Device, Dtype, DtypeKind, Element, GuardError, Result};
pub use crate::{Shape, ShapePattern, Storage, Tensor, TensorProps};
pub use crate::{
    assert_tensor_contiguous, assert_tensor_device, assert_tensor_dtype, assert_tensor_dtypes,
    assert_tensor_shape, assert_tensor_shape_compatible, call_site, dispatch_dtype, shape_pattern,
};
