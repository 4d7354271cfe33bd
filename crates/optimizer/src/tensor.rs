//! Dense float tensor owned by a layer
//!
//! Weight tensors in this tool are one-dimensional on disk (the weights
//! stream flattens every tensor to `w * h * c` values), so the shape here is
//! mostly bookkeeping. All current passes operate on float32 data; other
//! element types exist only as precision tags at the format layer.

/// Dense `(c, h, w)` float32 array. Any dimension may be 1.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tensor {
    data: Vec<f32>,
    w: usize,
    h: usize,
    c: usize,
}

impl Tensor {
    /// Create a 1-D tensor from raw values.
    pub fn from_vec(data: Vec<f32>) -> Self {
        let w = data.len();
        Self { data, w, h: 1, c: 1 }
    }

    /// Create a 1-D tensor of `w` copies of `value`.
    pub fn filled(w: usize, value: f32) -> Self {
        Self {
            data: vec![value; w],
            w,
            h: 1,
            c: 1,
        }
    }

    /// Total element count (`w * h * c`).
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Shape as `(c, h, w)`.
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.c, self.h, self.w)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filled_tensor() {
        let t = Tensor::filled(3, 0.5);
        assert_eq!(t.len(), 3);
        assert_eq!(t.shape(), (1, 1, 3));
        assert_eq!(t.as_slice(), &[0.5, 0.5, 0.5]);
    }

    #[test]
    fn empty_tensor() {
        let t = Tensor::default();
        assert!(t.is_empty());
        assert_eq!(t.len(), 0);
    }
}
