use serde::{Deserialize, Serialize};

/// Row-major matrix.
///
/// A vector is represented as a column, i.e., a matrix of shape `[n, 1]`.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Mat {
    pub data: Vec<f32>,
    pub shape: Vec<i32>,
}

impl Mat {
    /// Constructs a matrix. `data.len()` must be the product of `shape`.
    pub fn new(data: Vec<f32>, shape: Vec<i32>) -> Self {
        debug_assert_eq!(data.len() as i32, shape.iter().product::<i32>());
        Self { data, shape }
    }

    /// Matrix of zeros.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self::new(vec![0.0; rows * cols], vec![rows as _, cols as _])
    }

    /// Shape of the matrix.
    pub fn shape(&self) -> &[i32] {
        &self.shape
    }

    /// Matrix product `self * x`.
    ///
    /// Panics if the inner dimensions differ.
    pub fn matmul(&self, x: &Mat) -> Self {
        let (m, l, n) = (
            self.shape[0] as usize,
            self.shape[1] as usize,
            x.shape[1] as usize,
        );
        if l != x.shape[0] as usize {
            panic!(
                "Trying to multiply matrices of incompatible sizes: {:?}",
                (&self.shape, &x.shape)
            );
        }

        let mut data = vec![0.0f32; m * n];
        for i in 0..m {
            for j in 0..n {
                let kk = i * n + j;
                for k in 0..l {
                    data[kk] += self.data[i * l + k] * x.data[k * n + j];
                }
            }
        }

        Self {
            shape: vec![m as _, n as _],
            data,
        }
    }

    /// Element-wise sum. Panics if the shapes differ.
    pub fn add(&self, x: &Mat) -> Self {
        if self.shape[0] != x.shape[0] || self.shape[1] != x.shape[1] {
            panic!(
                "Trying to add matrices of different sizes: {:?}",
                (&self.shape, &x.shape)
            );
        }

        let data = self
            .data
            .iter()
            .zip(x.data.iter())
            .map(|(a, b)| *a + *b)
            .collect();

        Mat {
            data,
            shape: self.shape.clone(),
        }
    }

    fn map(&self, f: impl Fn(f32) -> f32) -> Self {
        Self {
            data: self.data.iter().map(|a| f(*a)).collect(),
            shape: self.shape.clone(),
        }
    }

    /// Element-wise ReLU.
    pub fn relu(&self) -> Self {
        self.map(|a| match a < 0. {
            true => 0.,
            false => a,
        })
    }

    /// Element-wise tanh.
    pub fn tanh(&self) -> Self {
        self.map(f32::tanh)
    }

    /// Returns `true` if the matrix is a column vector of `n` elements.
    pub fn is_column(&self, n: usize) -> bool {
        self.shape.len() == 2 && self.shape[0] as usize == n && self.shape[1] == 1
    }

    /// Multiplies all elements by `s`.
    pub fn scale(&self, s: f32) -> Self {
        self.map(|a| a * s)
    }

    /// Index of the largest element, the first one on ties.
    ///
    /// Returns `None` for an empty matrix.
    pub fn argmax(&self) -> Option<usize> {
        self.data
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, f32)>, (i, a)| match best {
                Some((_, b)) if b >= *a => best,
                _ => Some((i, *a)),
            })
            .map(|(i, _)| i)
    }
}

impl From<Vec<f32>> for Mat {
    fn from(x: Vec<f32>) -> Self {
        let shape = vec![x.len() as i32, 1];
        Self { shape, data: x }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_matmul() {
        let x = Mat::new(vec![1., 2., 3., 4., 5., 6.], vec![2, 3]);
        let y: Mat = vec![7., 8., 9.].into();
        let z = x.matmul(&y);
        assert_eq!(z, Mat::new(vec![50., 122.], vec![2, 1]));
    }

    #[test]
    fn test_elementwise() {
        let x: Mat = vec![-1., 0., 2.].into();
        assert_eq!(x.relu().data, vec![0., 0., 2.]);
        assert_eq!(x.add(&x).data, vec![-2., 0., 4.]);
        assert_eq!(x.scale(0.5).data, vec![-0.5, 0., 1.]);
        assert_eq!(x.tanh().data[1], 0.);
    }

    #[test]
    fn test_is_column() {
        let x: Mat = vec![1., 2., 3.].into();
        assert!(x.is_column(3));
        assert!(!x.is_column(4));
        assert!(!Mat::zeros(1, 3).is_column(3));
    }

    #[test]
    fn test_argmax() {
        let x: Mat = vec![0.1, 0.7, 0.7, -3.0].into();
        assert_eq!(x.argmax(), Some(1));
        assert_eq!(Mat::from(vec![]).argmax(), None);
    }

    #[test]
    #[should_panic]
    fn test_add_mismatch() {
        let x: Mat = vec![1., 2.].into();
        let y: Mat = vec![1., 2., 3.].into();
        let _ = x.add(&y);
    }
}
