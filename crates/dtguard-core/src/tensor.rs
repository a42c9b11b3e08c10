use std::fmt;

use smallvec::SmallVec;

use crate::device::Device;
use crate::dtype::{Dtype, Element};
use crate::error::GuardError;
use crate::shape::Shape;
use crate::storage::Storage;
use crate::Result;

/// Properties the checks read off a tensor.
///
/// Any tensor-like container can be validated by implementing this.
pub trait TensorProps {
    fn dtype(&self) -> Dtype;

    fn device(&self) -> Device;

    fn shape(&self) -> &Shape;

    /// Strides in elements, one per dimension.
    fn strides(&self) -> &[usize];

    /// Whether the layout is row-major contiguous.
    ///
    /// Size-1 dimensions may carry any stride.
    fn is_contiguous(&self) -> bool {
        let dims = self.shape().dims();
        let strides = self.strides();
        if dims.len() != strides.len() {
            return false;
        }
        let mut expected = 1usize;
        for (&size, &stride) in dims.iter().zip(strides).rev() {
            if size == 1 {
                continue;
            }
            if stride != expected {
                return false;
            }
            expected *= size;
        }
        true
    }
}

impl<T: TensorProps + ?Sized> TensorProps for &T {
    fn dtype(&self) -> Dtype {
        (**self).dtype()
    }

    fn device(&self) -> Device {
        (**self).device()
    }

    fn shape(&self) -> &Shape {
        (**self).shape()
    }

    fn strides(&self) -> &[usize] {
        (**self).strides()
    }

    fn is_contiguous(&self) -> bool {
        (**self).is_contiguous()
    }
}

/// Minimal host-side tensor: shape and strides over tagged storage.
///
/// Enough of a container to carry a dtype and a device through the checks;
/// it does no arithmetic.
///
/// ```
/// use dtguard_core::{assert_tensor_dtype, Device, Tensor};
/// use dtguard_core::dtype::{FLOAT32, INT32};
///
/// let t = Tensor::empty(&[2, 3], FLOAT32, Device::Cpu);
/// assert!(assert_tensor_dtype!(t, FLOAT32).is_ok());
/// assert!(assert_tensor_dtype!(t, INT32).is_err());
/// ```
#[derive(Clone)]
pub struct Tensor {
    storage: Storage,
    shape: Shape,
    strides: SmallVec<[usize; 4]>,
}

impl Tensor {
    // =========================================================================
    // Constructors
    // =========================================================================

    /// Allocate a tensor of the given shape, dtype and device.
    ///
    /// Contents are zeroed; callers should not rely on that.
    ///
    /// # Panics
    /// Panics if the element or byte count overflows `usize`; use
    /// [`Tensor::try_zeros`] to get an error instead.
    pub fn empty(shape: &[usize], dtype: Dtype, device: Device) -> Self {
        Self::zeros(shape, dtype, device)
    }

    /// Create a tensor of zeros with the given shape, dtype and device.
    ///
    /// # Panics
    /// Panics if the element or byte count overflows `usize`.
    pub fn zeros(shape: &[usize], dtype: Dtype, device: Device) -> Self {
        match Self::try_zeros(shape, dtype, device) {
            Ok(t) => t,
            Err(e) => panic!("{e}"),
        }
    }

    /// Fallible [`Tensor::zeros`].
    pub fn try_zeros(shape: &[usize], dtype: Dtype, device: Device) -> Result<Self> {
        let s = Shape::new(shape);
        let numel = checked_numel(&s)?;
        let storage = Storage::try_zeros(dtype, numel, device)?;
        Ok(Self::from_storage(storage, s))
    }

    /// Create a CPU tensor from element data with the given shape.
    pub fn from_slice<T: Element>(data: &[T], shape: &[usize]) -> Result<Self> {
        let s = Shape::new(shape);
        let numel = checked_numel(&s)?;
        if numel != data.len() {
            return Err(GuardError::StorageError(format!(
                "Shape {} requires {} elements, got {}",
                s,
                numel,
                data.len()
            )));
        }
        Ok(Self::from_storage(Storage::from_slice(data), s))
    }

    /// Create a 0-dimensional CPU tensor holding one value.
    pub fn scalar<T: Element>(value: T) -> Self {
        Self::from_storage(Storage::from_slice(&[value]), Shape::scalar())
    }

    fn from_storage(storage: Storage, shape: Shape) -> Self {
        let strides = shape.contiguous_strides();
        Self {
            storage,
            shape,
            strides,
        }
    }

    /// Get a reference to the underlying storage.
    pub fn storage_ref(&self) -> &Storage {
        &self.storage
    }

    // =========================================================================
    // Properties
    // =========================================================================

    /// Shape of the tensor.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Number of dimensions.
    pub fn ndim(&self) -> usize {
        self.shape.ndim()
    }

    /// Total number of elements.
    pub fn numel(&self) -> usize {
        self.shape.numel()
    }

    /// Data type.
    pub fn dtype(&self) -> Dtype {
        self.storage.dtype()
    }

    /// Device.
    pub fn device(&self) -> Device {
        self.storage.device()
    }

    /// Strides (in elements, not bytes).
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Whether this tensor is contiguous in memory (row-major).
    pub fn is_contiguous(&self) -> bool {
        TensorProps::is_contiguous(self)
    }

    // =========================================================================
    // Data access
    // =========================================================================

    /// Get a single element by flat (row-major logical) index.
    ///
    /// `None` if `T` does not match the dtype or the index is out of range.
    pub fn get<T: Element>(&self, flat_index: usize) -> Option<T> {
        let physical = self.flat_to_physical(flat_index)?;
        self.storage.get(physical)
    }

    /// Copy all elements out in row-major order.
    ///
    /// Fails with a precondition error if `T` does not match the dtype.
    pub fn to_vec<T: Element>(&self) -> Result<Vec<T>> {
        crate::assert_tensor_dtype!(self, T::DTYPE)?;
        (0..self.numel())
            .map(|i| self.get(i).ok_or_else(|| missing_element(i)))
            .collect()
    }

    /// Raw bytes of the elements, in storage order.
    ///
    /// Fails with a precondition error unless the tensor is contiguous.
    pub fn as_bytes(&self) -> Result<&[u8]> {
        crate::assert_tensor_contiguous!(self)?;
        Ok(self.storage.as_bytes())
    }

    /// Convert multi-dimensional index to physical storage index.
    fn flat_to_physical(&self, flat_index: usize) -> Option<usize> {
        if self.shape.is_scalar() {
            return if flat_index == 0 {
                Some(0)
            } else {
                None
            };
        }

        if flat_index >= self.numel() {
            return None;
        }

        let mut remaining = flat_index;
        let mut physical = 0;
        let contiguous_strides = self.shape.contiguous_strides();

        for (i, &cs) in contiguous_strides.iter().enumerate() {
            let idx = remaining / cs;
            remaining %= cs;
            physical += idx * self.strides[i];
        }

        Some(physical)
    }

    // =========================================================================
    // Views and placement
    // =========================================================================

    /// Transpose the last two dimensions (zero-copy view).
    ///
    /// `None` for tensors with fewer than two dimensions.
    pub fn transpose(&self) -> Option<Tensor> {
        let shape = self.shape.transpose()?;
        let ndim = self.ndim();
        let mut strides = self.strides.clone();
        strides.swap(ndim - 2, ndim - 1);
        Some(Tensor {
            storage: self.storage.clone(),
            shape,
            strides,
        })
    }

    /// Return a contiguous copy of this tensor if it isn't already contiguous.
    pub fn contiguous(&self) -> Result<Tensor> {
        if self.is_contiguous() {
            return Ok(self.clone());
        }
        let width = self.dtype().byte_size();
        let src = self.storage.as_bytes();
        let mut bytes = Vec::with_capacity(self.numel() * width);
        for i in 0..self.numel() {
            let p = self.flat_to_physical(i).ok_or_else(|| missing_element(i))?;
            let element = src
                .get(p * width..(p + 1) * width)
                .ok_or_else(|| missing_element(i))?;
            bytes.extend_from_slice(element);
        }
        let storage = Storage::from_bytes(self.dtype(), self.numel(), self.device(), bytes)?;
        Ok(Self::from_storage(storage, self.shape.clone()))
    }

    /// Same data, tagged with another device.
    pub fn to_device(&self, device: Device) -> Tensor {
        if self.device() == device {
            return self.clone();
        }
        Tensor {
            storage: self.storage.with_device(device),
            shape: self.shape.clone(),
            strides: self.strides.clone(),
        }
    }
}

fn checked_numel(shape: &Shape) -> Result<usize> {
    shape.checked_numel().ok_or_else(|| {
        GuardError::StorageError(format!("Shape {shape} has more elements than fit in usize"))
    })
}

#[cold]
fn missing_element(index: usize) -> GuardError {
    GuardError::StorageError(format!("element {index} lies outside the tensor's storage"))
}

impl TensorProps for Tensor {
    fn dtype(&self) -> Dtype {
        Tensor::dtype(self)
    }

    fn device(&self) -> Device {
        Tensor::device(self)
    }

    fn shape(&self) -> &Shape {
        Tensor::shape(self)
    }

    fn strides(&self) -> &[usize] {
        Tensor::strides(self)
    }
}

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Tensor(shape={}, dtype={}, device={}, contiguous={})",
            self.shape,
            self.dtype(),
            self.device(),
            self.is_contiguous(),
        )
    }
}
