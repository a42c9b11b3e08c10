use std::sync::Arc;

use crate::dtype::{Dtype, Element};
use crate::{Device, GuardError, Result};

/// Shared, reference-counted tensor storage.
///
/// Holds host bytes tagged with a dtype and a device. The device is a
/// placement tag only; bytes always live in host memory here.
/// Storage is `Arc`-shared so views (e.g. transpose) reuse the same data.
#[derive(Debug, Clone)]
pub struct Storage {
    data: Arc<Vec<u8>>,
    dtype: Dtype,
    device: Device,
    /// Number of logical elements (not bytes).
    numel: usize,
}

impl Storage {
    /// Allocate zeroed storage for `numel` elements of the given dtype.
    ///
    /// Fails if the byte size does not fit in `usize`.
    pub fn try_zeros(dtype: Dtype, numel: usize, device: Device) -> Result<Self> {
        let nbytes = checked_nbytes(dtype, numel)?;
        Ok(Self {
            data: Arc::new(vec![0u8; nbytes]),
            dtype,
            device,
            numel,
        })
    }

    /// Create storage from raw native-endian bytes.
    pub fn from_bytes(dtype: Dtype, numel: usize, device: Device, bytes: Vec<u8>) -> Result<Self> {
        let expected = checked_nbytes(dtype, numel)?;
        if bytes.len() != expected {
            return Err(GuardError::StorageError(format!(
                "Expected {} bytes for {} elements of {}, got {}",
                expected,
                numel,
                dtype,
                bytes.len()
            )));
        }
        Ok(Self {
            data: Arc::new(bytes),
            dtype,
            device,
            numel,
        })
    }

    /// Create CPU storage from a slice of supported elements.
    pub fn from_slice<T: Element>(data: &[T]) -> Self {
        let mut bytes = Vec::with_capacity(T::DTYPE.storage_bytes(data.len()));
        for v in data {
            v.write_ne_bytes(&mut bytes);
        }
        Self {
            data: Arc::new(bytes),
            dtype: T::DTYPE,
            device: Device::Cpu,
            numel: data.len(),
        }
    }

    /// Get the dtype of this storage.
    pub fn dtype(&self) -> Dtype {
        self.dtype
    }

    /// Get the device of this storage.
    pub fn device(&self) -> Device {
        self.device
    }

    /// Number of logical elements.
    pub fn numel(&self) -> usize {
        self.numel
    }

    /// Size in bytes.
    pub fn nbytes(&self) -> usize {
        self.data.len()
    }

    /// Read-only view of the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Read the element at storage index `index`.
    ///
    /// Returns `None` if `T` does not match the storage dtype or the index is
    /// out of range.
    pub fn get<T: Element>(&self, index: usize) -> Option<T> {
        if self.dtype != T::DTYPE || index >= self.numel {
            return None;
        }
        let width = self.dtype.byte_size();
        let start = index * width;
        self.data.get(start..start + width).map(T::read_ne_bytes)
    }

    /// Same bytes, re-tagged with another device.
    pub fn with_device(&self, device: Device) -> Self {
        Self {
            device,
            ..self.clone()
        }
    }

    /// Whether two storages share the same underlying bytes.
    pub fn shares_bytes_with(&self, other: &Storage) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

fn checked_nbytes(dtype: Dtype, numel: usize) -> Result<usize> {
    dtype.checked_storage_bytes(numel).ok_or_else(|| {
        GuardError::StorageError(format!(
            "{} elements of {} overflow the addressable byte size",
            numel, dtype
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtype::{BOOL, FLOAT32, FLOAT64};

    #[test]
    fn test_zeros() {
        let s = Storage::try_zeros(FLOAT32, 10, Device::Cpu).unwrap();
        assert_eq!(s.dtype(), FLOAT32);
        assert_eq!(s.device(), Device::Cpu);
        assert_eq!(s.numel(), 10);
        assert_eq!(s.nbytes(), 40);
        assert!(s.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_zeros_keeps_device_tag() {
        let s = Storage::try_zeros(BOOL, 3, Device::Cuda(1)).unwrap();
        assert_eq!(s.device(), Device::Cuda(1));
        assert_eq!(s.nbytes(), 3);
    }

    #[test]
    fn test_from_slice() {
        let s = Storage::from_slice(&[1.0f32, 2.0, 3.0]);
        assert_eq!(s.numel(), 3);
        assert_eq!(s.dtype(), FLOAT32);
        assert_eq!(s.get::<f32>(1), Some(2.0));
        assert_eq!(s.get::<f32>(3), None);
        assert_eq!(s.get::<i32>(0), None);

        let s = Storage::from_slice(&[true, false]);
        assert_eq!(s.dtype(), BOOL);
        assert_eq!(s.get::<bool>(0), Some(true));
    }

    #[test]
    fn test_clone_shares_bytes() {
        let s1 = Storage::from_slice(&[1i16, 2, 3]);
        let s2 = s1.clone();
        assert!(s1.shares_bytes_with(&s2));
        assert_eq!(s1.as_bytes().as_ptr(), s2.as_bytes().as_ptr());

        let other = Storage::from_slice(&[1i16, 2, 3]);
        assert!(!s1.shares_bytes_with(&other));
    }

    #[test]
    fn test_from_bytes_validation() {
        let result = Storage::from_bytes(FLOAT32, 3, Device::Cpu, vec![0u8; 11]);
        assert!(matches!(result, Err(GuardError::StorageError(_))));

        let result = Storage::from_bytes(FLOAT32, 3, Device::Cpu, vec![0u8; 12]);
        assert!(result.is_ok());
    }

    #[test]
    fn test_byte_size_overflow_is_an_error() {
        let err = Storage::from_bytes(FLOAT64, usize::MAX, Device::Cpu, Vec::new()).unwrap_err();
        assert!(matches!(err, GuardError::StorageError(_)));
        assert!(err.to_string().contains("overflow"));

        let err = Storage::try_zeros(FLOAT32, usize::MAX / 2, Device::Cpu).unwrap_err();
        assert!(matches!(err, GuardError::StorageError(_)));
    }

    #[test]
    fn test_with_device_shares_bytes() {
        let s = Storage::from_slice(&[1u8, 2]);
        let moved = s.with_device(Device::Sycl(0));
        assert_eq!(moved.device(), Device::Sycl(0));
        assert!(moved.shares_bytes_with(&s));
        assert_eq!(moved.get::<u8>(1), Some(2));
    }
}
