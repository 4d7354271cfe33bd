//! Weights stream access
//!
//! The weights file is a flat concatenation of tensors in layer-visit order.
//! A tensor is optionally preceded by a 4-byte little-endian precision tag;
//! tag 0 means raw float32 data follows. Non-zero tags select reduced
//! precision encodings that the optimizer does not rewrite, so they are
//! rejected at load time.

use std::io::{Read, Write};

use crate::error::{OptimizeError, Result};
use crate::tensor::Tensor;

/// Raw float32, no conversion.
pub const TAG_FLOAT32: i32 = 0;

/// Reads tensors from a weights stream.
pub struct WeightReader<R> {
    inner: R,
}

impl<R: Read> WeightReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Read the 4-byte precision tag preceding a tagged tensor.
    pub fn read_tag(&mut self, layer: &str) -> Result<i32> {
        let mut buf = [0u8; 4];
        self.inner
            .read_exact(&mut buf)
            .map_err(|_| OptimizeError::TruncatedWeights {
                layer: layer.to_string(),
                expected: 1,
            })?;
        Ok(i32::from_le_bytes(buf))
    }

    /// Read `count` raw float32 values.
    pub fn read_tensor(&mut self, count: usize, layer: &str) -> Result<Tensor> {
        let mut bytes = vec![0u8; count * 4];
        self.inner
            .read_exact(&mut bytes)
            .map_err(|_| OptimizeError::TruncatedWeights {
                layer: layer.to_string(),
                expected: count,
            })?;
        let data = bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Ok(Tensor::from_vec(data))
    }

    /// Read a precision tag and the tensor it announces.
    pub fn read_tagged_tensor(&mut self, count: usize, layer: &str) -> Result<Tensor> {
        let tag = self.read_tag(layer)?;
        if tag != TAG_FLOAT32 {
            return Err(OptimizeError::UnsupportedWeightTag {
                layer: layer.to_string(),
                tag,
            });
        }
        self.read_tensor(count, layer)
    }
}

/// Writes tensors to a weights stream.
pub struct WeightWriter<W> {
    inner: W,
}

impl<W: Write> WeightWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn write_tag(&mut self, tag: i32) -> std::io::Result<()> {
        self.inner.write_all(&tag.to_le_bytes())
    }

    /// Write the flattened tensor data, no tag.
    pub fn write_tensor(&mut self, tensor: &Tensor) -> std::io::Result<()> {
        for v in tensor.as_slice() {
            self.inner.write_all(&v.to_le_bytes())?;
        }
        Ok(())
    }
}
