use smallvec::SmallVec;
use std::fmt;

/// Tensor shape with stack-allocated storage for ≤4 dimensions.
///
/// Most tensors are 0D-4D, so the common case never touches the heap.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Shape {
    dims: SmallVec<[usize; 4]>,
}

impl Shape {
    /// Create a new shape from dimensions.
    pub fn new(dims: &[usize]) -> Self {
        Self {
            dims: SmallVec::from_slice(dims),
        }
    }

    /// Scalar shape (0 dimensions).
    pub fn scalar() -> Self {
        Self {
            dims: SmallVec::new(),
        }
    }

    /// Number of dimensions (rank).
    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    /// Total number of elements.
    ///
    /// # Panics
    /// Panics if the product of the dims overflows `usize`; see
    /// [`Shape::checked_numel`].
    pub fn numel(&self) -> usize {
        match self.checked_numel() {
            Some(n) => n,
            None => panic!("element count of shape {self} overflows usize"),
        }
    }

    /// Total number of elements, or `None` on overflow. Scalars have one.
    pub fn checked_numel(&self) -> Option<usize> {
        self.dims.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
    }

    /// Get dimension sizes as a slice.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Get size of a specific dimension.
    pub fn dim(&self, axis: usize) -> Option<usize> {
        self.dims.get(axis).copied()
    }

    /// Whether this is a scalar (0-dimensional).
    pub fn is_scalar(&self) -> bool {
        self.dims.is_empty()
    }

    /// Compute default strides for a contiguous row-major layout.
    pub fn contiguous_strides(&self) -> SmallVec<[usize; 4]> {
        let ndim = self.dims.len();
        if ndim == 0 {
            return SmallVec::new();
        }
        let mut strides = SmallVec::from_elem(0usize, ndim);
        strides[ndim - 1] = 1;
        for i in (0..ndim - 1).rev() {
            strides[i] = strides[i + 1] * self.dims[i + 1];
        }
        strides
    }

    /// Compute the transposed shape (swap last two dimensions).
    pub fn transpose(&self) -> Option<Shape> {
        if self.ndim() < 2 {
            return None;
        }
        let mut dims = self.dims.clone();
        let n = dims.len();
        dims.swap(n - 2, n - 1);
        Some(Shape { dims })
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Shape({:?})", self.dims.as_slice())
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_dims(f, self.dims.iter().map(|d| Some(*d)))
    }
}

impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Shape::new(dims)
    }
}

impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Shape {
            dims: SmallVec::from_vec(dims),
        }
    }
}

macro_rules! impl_shape_from_array {
    ($($n:expr),*) => {
        $(
            impl From<[usize; $n]> for Shape {
                fn from(dims: [usize; $n]) -> Self {
                    Shape::new(&dims)
                }
            }
        )*
    };
}

impl_shape_from_array!(0, 1, 2, 3, 4, 5, 6);

#[cfg(feature = "serde")]
impl serde::Serialize for Shape {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.dims.iter())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Shape {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<usize>::deserialize(deserializer).map(Shape::from)
    }
}

/// Expected shape in which some dimensions may be wildcards.
///
/// A `None` dimension accepts any size at that position. Ranks must still
/// match exactly; there is no broadcasting.
///
/// ```
/// use dtguard_core::{shape_pattern, Shape};
///
/// let pattern = shape_pattern![_, 3];
/// assert!(pattern.matches(&Shape::new(&[8, 3])));
/// assert!(!pattern.matches(&Shape::new(&[8, 4])));
/// assert_eq!(pattern.to_string(), "[*, 3]");
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ShapePattern {
    dims: SmallVec<[Option<usize>; 4]>,
}

impl ShapePattern {
    pub fn new(dims: &[Option<usize>]) -> Self {
        Self {
            dims: SmallVec::from_slice(dims),
        }
    }

    /// Number of dimensions (rank).
    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    pub fn dims(&self) -> &[Option<usize>] {
        &self.dims
    }

    /// Whether any dimension is a wildcard.
    pub fn has_wildcard(&self) -> bool {
        self.dims.iter().any(Option::is_none)
    }

    /// Whether `shape` has the same rank and agrees on every fixed dimension.
    pub fn matches(&self, shape: &Shape) -> bool {
        self.ndim() == shape.ndim()
            && self
                .dims
                .iter()
                .zip(shape.dims())
                .all(|(expected, actual)| expected.map_or(true, |e| e == *actual))
    }

    /// Axes at which a fixed dimension disagrees with `shape`.
    ///
    /// Only meaningful when ranks match; extra trailing axes are ignored.
    pub fn mismatched_dims(&self, shape: &Shape) -> SmallVec<[usize; 4]> {
        self.dims
            .iter()
            .zip(shape.dims())
            .enumerate()
            .filter(|(_, (expected, actual))| expected.map_or(false, |e| e != **actual))
            .map(|(axis, _)| axis)
            .collect()
    }
}

impl fmt::Debug for ShapePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ShapePattern({})", self)
    }
}

impl fmt::Display for ShapePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_dims(f, self.dims.iter().copied())
    }
}

impl From<&Shape> for ShapePattern {
    fn from(shape: &Shape) -> Self {
        Self {
            dims: shape.dims().iter().map(|d| Some(*d)).collect(),
        }
    }
}

impl From<Shape> for ShapePattern {
    fn from(shape: Shape) -> Self {
        ShapePattern::from(&shape)
    }
}

impl From<Vec<Option<usize>>> for ShapePattern {
    fn from(dims: Vec<Option<usize>>) -> Self {
        Self {
            dims: SmallVec::from_vec(dims),
        }
    }
}

fn write_dims(f: &mut fmt::Formatter<'_>, dims: impl Iterator<Item = Option<usize>>) -> fmt::Result {
    write!(f, "[")?;
    for (i, d) in dims.enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        match d {
            Some(d) => write!(f, "{d}")?,
            None => write!(f, "*")?,
        }
    }
    write!(f, "]")
}

/// Build a [`ShapePattern`]; `_` marks a wildcard dimension.
///
/// `shape_pattern![2, _, n]` is `ShapePattern::new(&[Some(2), None, Some(n)])`.
#[macro_export]
macro_rules! shape_pattern {
    (@dim _) => {
        ::std::option::Option::None
    };
    (@dim $d:expr) => {
        ::std::option::Option::Some($d)
    };
    ($($d:tt),* $(,)?) => {
        $crate::shape::ShapePattern::new(&[$($crate::shape_pattern!(@dim $d)),*])
    };
}
