use ndarray::{Array1, Array2, Array3, Array4, ArrayView3, ArrayView4};

pub type Matrix<T> = Array2<T>;
pub type Vector<T> = Array1<T>;

#[cfg(not(feature = "f64"))]
pub type Float = f32;
#[cfg(feature = "f64")]
pub type Float = f64;

/// `[n, height, width, channels]`
pub type Batch = Array4<Float>;
pub type BatchView<'a> = ArrayView4<'a, Float>;
/// `[height, width, channels]`
pub type Image = Array3<Float>;
pub type ImageView<'a> = ArrayView3<'a, Float>;
