use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;

use crate::error::GuardError;
use crate::Result;

/// Capacity of the inline name buffer of a [`Dtype`], in bytes.
pub const MAX_NAME_LEN: usize = 16;

/// Category of a [`Dtype`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DtypeKind {
    #[default]
    Undefined,
    /// Kept apart from `UInt` so a 1-byte bool never dispatches or prints as `u8`.
    Bool,
    Int,
    UInt,
    Float,
    /// Opaque, non-numeric element types.
    Object,
}

/// Runtime data type tag of a tensor element.
///
/// A small `Copy` value: kind, byte width and a display name held in a
/// fixed inline buffer, so it can be embedded anywhere and sent across
/// threads without touching the heap. Two dtypes are equal iff all three
/// fields match.
///
/// Ordinary code uses the canonical constants ([`Dtype::FLOAT32`], ...) or
/// [`Dtype::of`] rather than building dtypes by hand.
///
/// ```
/// use dtguard_core::dtype::{Dtype, FLOAT32};
///
/// assert_eq!(Dtype::of::<f32>(), FLOAT32);
/// assert_eq!(FLOAT32.byte_size(), 4);
/// assert_eq!(FLOAT32.to_string(), "Float32");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dtype {
    kind: DtypeKind,
    byte_size: usize,
    name: [u8; MAX_NAME_LEN],
    name_len: u8,
}

impl Dtype {
    pub const UNDEFINED: Dtype = Dtype::new(DtypeKind::Undefined, 1, "Undefined");
    pub const FLOAT32: Dtype = Dtype::new(DtypeKind::Float, 4, "Float32");
    pub const FLOAT64: Dtype = Dtype::new(DtypeKind::Float, 8, "Float64");
    pub const INT8: Dtype = Dtype::new(DtypeKind::Int, 1, "Int8");
    pub const INT16: Dtype = Dtype::new(DtypeKind::Int, 2, "Int16");
    pub const INT32: Dtype = Dtype::new(DtypeKind::Int, 4, "Int32");
    pub const INT64: Dtype = Dtype::new(DtypeKind::Int, 8, "Int64");
    pub const UINT8: Dtype = Dtype::new(DtypeKind::UInt, 1, "UInt8");
    pub const UINT16: Dtype = Dtype::new(DtypeKind::UInt, 2, "UInt16");
    pub const UINT32: Dtype = Dtype::new(DtypeKind::UInt, 4, "UInt32");
    pub const UINT64: Dtype = Dtype::new(DtypeKind::UInt, 8, "UInt64");
    pub const BOOL: Dtype = Dtype::new(DtypeKind::Bool, 1, "Bool");
}

static CANONICAL: [Dtype; 12] = [
    Dtype::UNDEFINED,
    Dtype::FLOAT32,
    Dtype::FLOAT64,
    Dtype::INT8,
    Dtype::INT16,
    Dtype::INT32,
    Dtype::INT64,
    Dtype::UINT8,
    Dtype::UINT16,
    Dtype::UINT32,
    Dtype::UINT64,
    Dtype::BOOL,
];

impl Dtype {
    /// Build a dtype.
    ///
    /// # Panics
    /// Panics if `name` is longer than [`MAX_NAME_LEN`] bytes. In a `const`
    /// context this is a compile error.
    pub const fn new(kind: DtypeKind, byte_size: usize, name: &str) -> Self {
        let bytes = name.as_bytes();
        assert!(bytes.len() <= MAX_NAME_LEN, "dtype name longer than 16 bytes");
        let mut buf = [0u8; MAX_NAME_LEN];
        let mut i = 0;
        while i < bytes.len() {
            buf[i] = bytes[i];
            i += 1;
        }
        Self {
            kind,
            byte_size,
            name: buf,
            name_len: bytes.len() as u8,
        }
    }

    /// Fallible [`Dtype::new`] for names that are not known up front.
    pub fn try_new(kind: DtypeKind, byte_size: usize, name: &str) -> Result<Self> {
        if name.len() > MAX_NAME_LEN {
            return Err(GuardError::DtypeNameTooLong {
                name: name.to_string(),
                len: name.len(),
                max: MAX_NAME_LEN,
            });
        }
        Ok(Self::new(kind, byte_size, name))
    }

    /// Dtype of a supported element type, resolved at compile time.
    ///
    /// Types outside the supported set do not implement [`Element`] and
    /// fail to compile.
    pub const fn of<T: Element>() -> Dtype {
        T::DTYPE
    }

    /// Dtype of an arbitrary type, resolved at runtime through a `TypeId`
    /// table built on first use.
    ///
    /// Returns [`GuardError::UnsupportedType`] for anything outside the
    /// supported set; there is no `Undefined` fallback.
    pub fn from_type<T: ?Sized + 'static>() -> Result<Dtype> {
        if let Some(dtype) = TYPE_TABLE.get(&TypeId::of::<T>()) {
            return Ok(*dtype);
        }
        let type_name = std::any::type_name::<T>();
        tracing::error!(type_name, "unsupported type passed to Dtype::from_type");
        Err(GuardError::UnsupportedType {
            op: "Dtype::from_type",
            type_name,
        })
    }

    /// Look up a canonical dtype by its display name, e.g. `"Int32"`.
    pub fn from_name(name: &str) -> Result<Dtype> {
        CANONICAL
            .iter()
            .find(|d| d.name() == name)
            .copied()
            .ok_or_else(|| GuardError::InvalidDtypeName(name.to_string()))
    }

    /// The twelve canonical dtypes, `Undefined` first.
    pub fn canonical() -> &'static [Dtype] {
        &CANONICAL
    }

    /// Whether this dtype is one of the canonical constants.
    pub fn is_canonical(&self) -> bool {
        CANONICAL.contains(self)
    }

    /// Size in bytes of one element.
    pub fn byte_size(&self) -> usize {
        self.byte_size
    }

    pub fn kind(&self) -> DtypeKind {
        self.kind
    }

    /// Display name, e.g. `"Float32"`.
    pub fn name(&self) -> &str {
        std::str::from_utf8(&self.name[..self.name_len as usize]).unwrap_or("")
    }

    /// Number of bytes needed to store `n` elements of this dtype.
    ///
    /// # Panics
    /// Panics if the result overflows `usize`; see
    /// [`Dtype::checked_storage_bytes`].
    pub fn storage_bytes(&self, n: usize) -> usize {
        match self.checked_storage_bytes(n) {
            Some(bytes) => bytes,
            None => panic!("{n} elements of {self} overflow usize bytes"),
        }
    }

    /// [`Dtype::storage_bytes`], or `None` on overflow.
    pub fn checked_storage_bytes(&self, n: usize) -> Option<usize> {
        self.byte_size.checked_mul(n)
    }

    pub fn is_object(&self) -> bool {
        self.kind == DtypeKind::Object
    }

    pub fn is_undefined(&self) -> bool {
        self.kind == DtypeKind::Undefined
    }

    pub fn is_bool(&self) -> bool {
        self.kind == DtypeKind::Bool
    }

    pub fn is_float(&self) -> bool {
        self.kind == DtypeKind::Float
    }

    /// Signed integer.
    pub fn is_int(&self) -> bool {
        self.kind == DtypeKind::Int
    }

    /// Unsigned integer. `Bool` is not one.
    pub fn is_uint(&self) -> bool {
        self.kind == DtypeKind::UInt
    }

    /// Signed or unsigned integer.
    pub fn is_integer(&self) -> bool {
        self.is_int() || self.is_uint()
    }
}

impl Default for Dtype {
    fn default() -> Self {
        Dtype::UNDEFINED
    }
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Debug for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dtype")
            .field("kind", &self.kind)
            .field("byte_size", &self.byte_size)
            .field("name", &self.name())
            .finish()
    }
}

impl FromStr for Dtype {
    type Err = GuardError;

    fn from_str(s: &str) -> Result<Self> {
        Dtype::from_name(s)
    }
}

pub const UNDEFINED: Dtype = Dtype::UNDEFINED;
pub const FLOAT32: Dtype = Dtype::FLOAT32;
pub const FLOAT64: Dtype = Dtype::FLOAT64;
pub const INT8: Dtype = Dtype::INT8;
pub const INT16: Dtype = Dtype::INT16;
pub const INT32: Dtype = Dtype::INT32;
pub const INT64: Dtype = Dtype::INT64;
pub const UINT8: Dtype = Dtype::UINT8;
pub const UINT16: Dtype = Dtype::UINT16;
pub const UINT32: Dtype = Dtype::UINT32;
pub const UINT64: Dtype = Dtype::UINT64;
pub const BOOL: Dtype = Dtype::BOOL;

mod sealed {
    pub trait Sealed {}
}

/// Native scalar types with a canonical [`Dtype`].
///
/// Implemented for `f32`, `f64`, `i8`..`i64`, `u8`..`u64` and `bool` only;
/// the trait is sealed.
pub trait Element: sealed::Sealed + Copy + Send + Sync + 'static {
    const DTYPE: Dtype;

    /// Append the native-endian bytes of `self` to `out`.
    fn write_ne_bytes(self, out: &mut Vec<u8>);

    /// Read one value from exactly `DTYPE.byte_size()` native-endian bytes.
    ///
    /// # Panics
    /// Panics if `bytes.len()` differs from `DTYPE.byte_size()` (for `bool`,
    /// if `bytes` is empty).
    fn read_ne_bytes(bytes: &[u8]) -> Self;
}

macro_rules! impl_element {
    ($($t:ty => $dtype:ident),* $(,)?) => {
        $(
            impl sealed::Sealed for $t {}

            impl Element for $t {
                const DTYPE: Dtype = Dtype::$dtype;

                fn write_ne_bytes(self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_ne_bytes());
                }

                fn read_ne_bytes(bytes: &[u8]) -> Self {
                    let mut buf = [0u8; std::mem::size_of::<$t>()];
                    buf.copy_from_slice(bytes);
                    <$t>::from_ne_bytes(buf)
                }
            }
        )*

        static TYPE_TABLE: Lazy<HashMap<TypeId, Dtype>> = Lazy::new(|| {
            let mut table = HashMap::new();
            $(table.insert(TypeId::of::<$t>(), Dtype::$dtype);)*
            table.insert(TypeId::of::<bool>(), Dtype::BOOL);
            table
        });
    };
}

impl_element!(
    f32 => FLOAT32,
    f64 => FLOAT64,
    i8 => INT8,
    i16 => INT16,
    i32 => INT32,
    i64 => INT64,
    u8 => UINT8,
    u16 => UINT16,
    u32 => UINT32,
    u64 => UINT64,
);

impl sealed::Sealed for bool {}

impl Element for bool {
    const DTYPE: Dtype = Dtype::BOOL;

    fn write_ne_bytes(self, out: &mut Vec<u8>) {
        out.push(u8::from(self));
    }

    fn read_ne_bytes(bytes: &[u8]) -> Self {
        bytes[0] != 0
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Dtype {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Dtype {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Dtype::from_name(&name).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_sizes() {
        assert_eq!(FLOAT32.byte_size(), 4);
        assert_eq!(FLOAT64.byte_size(), 8);
        assert_eq!(INT8.byte_size(), 1);
        assert_eq!(INT16.byte_size(), 2);
        assert_eq!(INT32.byte_size(), 4);
        assert_eq!(INT64.byte_size(), 8);
        assert_eq!(UINT8.byte_size(), 1);
        assert_eq!(UINT16.byte_size(), 2);
        assert_eq!(UINT32.byte_size(), 4);
        assert_eq!(UINT64.byte_size(), 8);
        assert_eq!(BOOL.byte_size(), 1);
        assert_eq!(UNDEFINED.byte_size(), 1);
    }

    #[test]
    fn test_of_matches_canonical() {
        assert_eq!(Dtype::of::<f32>(), FLOAT32);
        assert_eq!(Dtype::of::<f64>(), FLOAT64);
        assert_eq!(Dtype::of::<i8>(), INT8);
        assert_eq!(Dtype::of::<i16>(), INT16);
        assert_eq!(Dtype::of::<i32>(), INT32);
        assert_eq!(Dtype::of::<i64>(), INT64);
        assert_eq!(Dtype::of::<u8>(), UINT8);
        assert_eq!(Dtype::of::<u16>(), UINT16);
        assert_eq!(Dtype::of::<u32>(), UINT32);
        assert_eq!(Dtype::of::<u64>(), UINT64);
        assert_eq!(Dtype::of::<bool>(), BOOL);
    }

    #[test]
    fn test_from_type_matches_of() {
        assert_eq!(Dtype::from_type::<f32>().unwrap(), FLOAT32);
        assert_eq!(Dtype::from_type::<u16>().unwrap(), UINT16);
        assert_eq!(Dtype::from_type::<bool>().unwrap(), BOOL);
        assert_eq!(Dtype::from_type::<i64>().unwrap(), Dtype::of::<i64>());
    }

    #[test]
    fn test_from_type_rejects_unsupported() {
        let err = Dtype::from_type::<String>().unwrap_err();
        assert!(matches!(
            err,
            GuardError::UnsupportedType { op: "Dtype::from_type", .. }
        ));
        assert!(err.to_string().contains("String"));

        assert!(Dtype::from_type::<usize>().is_err());
        assert!(Dtype::from_type::<str>().is_err());
        assert!(Dtype::from_type::<[f32]>().is_err());
    }

    #[test]
    fn test_bool_is_not_uint8() {
        assert_ne!(BOOL, UINT8);
        assert_eq!(BOOL.byte_size(), UINT8.byte_size());
        assert!(BOOL.is_bool());
        assert!(!BOOL.is_uint());
        assert!(!BOOL.is_integer());
    }

    #[test]
    fn test_equality_uses_every_field() {
        assert_ne!(INT8, UINT8);
        assert_ne!(INT32, FLOAT32);
        let renamed = Dtype::new(DtypeKind::Float, 4, "Fixed32");
        assert_ne!(renamed, FLOAT32);
        let resized = Dtype::new(DtypeKind::Float, 2, "Float32");
        assert_ne!(resized, FLOAT32);
        let rebuilt = Dtype::new(DtypeKind::Float, 4, "Float32");
        assert_eq!(rebuilt, FLOAT32);
    }

    #[test]
    fn test_kind_alone_breaks_equality() {
        let signed = Dtype::new(DtypeKind::Int, 1, "X");
        let unsigned = Dtype::new(DtypeKind::UInt, 1, "X");
        assert_eq!(signed.name(), unsigned.name());
        assert_eq!(signed.byte_size(), unsigned.byte_size());
        assert_ne!(signed, unsigned);

        let relabelled = Dtype::new(DtypeKind::Object, 1, "Bool");
        assert_ne!(relabelled, BOOL);
    }

    #[test]
    fn test_categories() {
        assert!(FLOAT32.is_float());
        assert!(!FLOAT32.is_integer());
        assert!(INT16.is_int());
        assert!(INT16.is_integer());
        assert!(UINT64.is_uint());
        assert!(UNDEFINED.is_undefined());
        assert_eq!(INT64.kind(), DtypeKind::Int);
        for dtype in Dtype::canonical() {
            assert!(!dtype.is_object());
        }
        let object = Dtype::new(DtypeKind::Object, 24, "Object");
        assert!(object.is_object());
        assert!(!object.is_canonical());
    }

    #[test]
    fn test_display_and_parse() {
        assert_eq!(format!("{}", FLOAT32), "Float32");
        assert_eq!(format!("{}", UINT16), "UInt16");
        assert_eq!(format!("{}", UNDEFINED), "Undefined");
        for dtype in Dtype::canonical() {
            assert_eq!(dtype.to_string().parse::<Dtype>().unwrap(), *dtype);
        }
        assert!(matches!(
            "float32".parse::<Dtype>(),
            Err(GuardError::InvalidDtypeName(_))
        ));
    }

    #[test]
    fn test_default_is_undefined() {
        assert_eq!(Dtype::default(), UNDEFINED);
    }

    #[test]
    fn test_name_capacity() {
        let full = Dtype::try_new(DtypeKind::Object, 8, "SixteenByteName!").unwrap();
        assert_eq!(full.name(), "SixteenByteName!");
        let err = Dtype::try_new(DtypeKind::Object, 8, "SeventeenByteName").unwrap_err();
        assert!(matches!(err, GuardError::DtypeNameTooLong { len: 17, max: 16, .. }));
    }

    #[test]
    fn test_storage_bytes() {
        assert_eq!(FLOAT32.storage_bytes(10), 40);
        assert_eq!(BOOL.storage_bytes(3), 3);
        assert_eq!(INT64.storage_bytes(0), 0);
        assert_eq!(FLOAT64.checked_storage_bytes(4), Some(32));
        assert_eq!(FLOAT64.checked_storage_bytes(usize::MAX), None);
        assert_eq!(BOOL.checked_storage_bytes(usize::MAX), Some(usize::MAX));
    }

    #[test]
    #[should_panic(expected = "overflow")]
    fn test_storage_bytes_panics_on_overflow() {
        INT32.storage_bytes(usize::MAX);
    }

    #[test]
    fn test_element_bytes() {
        let mut out = Vec::new();
        1.5f32.write_ne_bytes(&mut out);
        true.write_ne_bytes(&mut out);
        (-2i16).write_ne_bytes(&mut out);
        assert_eq!(out.len(), 4 + 1 + 2);
        assert_eq!(f32::read_ne_bytes(&out[0..4]), 1.5);
        assert!(bool::read_ne_bytes(&out[4..5]));
        assert_eq!(i16::read_ne_bytes(&out[5..7]), -2);
    }

    #[test]
    fn test_usable_in_patterns() {
        let label = match INT32 {
            Dtype::FLOAT32 => "f32",
            Dtype::INT32 => "i32",
            _ => "other",
        };
        assert_eq!(label, "i32");
    }
}
