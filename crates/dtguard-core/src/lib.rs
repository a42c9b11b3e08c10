//! # dtguard-core
//!
//! Runtime dtype and device descriptors plus call-site-aware tensor checks.
//!
//! Provides:
//! - `Dtype`, a small `Copy` tag for the twelve canonical element types
//! - compile-time (`Element`) and runtime (`Dtype::from_type`) type mapping
//! - `Device`, `Shape` and `ShapePattern` value types
//! - `assert_tensor_*!` checks that report the caller's file, line and function
//! - a minimal host-side `Tensor` that implements `TensorProps`

pub mod dtype;
pub mod dispatch;
pub mod device;
pub mod shape;
pub mod site;
pub mod error;
pub mod storage;
pub mod tensor;
pub mod check;
pub mod prelude;

pub use dtype::{Dtype, DtypeKind, Element};
pub use device::Device;
pub use shape::{Shape, ShapePattern};
pub use site::CallSite;
pub use error::GuardError;
pub use storage::Storage;
pub use tensor::{Tensor, TensorProps};

pub type Result<T> = std::result::Result<T, GuardError>;
