//! IR Type System
//!
//! Defines the tensor-oriented type system for the graph IR, together with the
//! literal payloads carried by constant instructions. Quantized element types
//! keep their quantization parameters inline so that cloning a constant or a
//! dequantize reproduces them exactly.

use serde::{Deserialize, Serialize};
use std::fmt;

/// IR type representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IrType {
    /// Boolean type
    Bool,

    /// Integer types
    I8,
    I16,
    I32,
    I64,

    /// Unsigned integer types
    U8,

    /// Floating point types
    F16,
    F32,
    F64,

    /// Ranked tensor. A dimension of `-1` is dynamic.
    Tensor {
        element: Box<IrType>,
        shape: Vec<i64>,
    },

    /// Quantized element type
    Quantized {
        /// Storage type of the raw values (e.g. i8, u8)
        storage: Box<IrType>,
        /// Type the values represent once dequantized (e.g. f32)
        expressed: Box<IrType>,
        params: QuantParams,
    },

    /// Type of instructions that produce no usable value
    None,
}

/// Quantization parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QuantParams {
    PerTensor {
        scale: f64,
        zero_point: i64,
    },
    PerAxis {
        axis: i32,
        scales: Vec<f64>,
        zero_points: Vec<i64>,
    },
}

impl IrType {
    /// Create a ranked tensor type
    pub fn tensor(element: IrType, shape: Vec<i64>) -> Self {
        IrType::Tensor {
            element: Box::new(element),
            shape,
        }
    }

    /// Create a per-tensor quantized element type
    pub fn quantized(storage: IrType, expressed: IrType, scale: f64, zero_point: i64) -> Self {
        IrType::Quantized {
            storage: Box::new(storage),
            expressed: Box::new(expressed),
            params: QuantParams::PerTensor { scale, zero_point },
        }
    }

    /// Element type of a tensor, or the type itself for scalars
    pub fn element_type(&self) -> &IrType {
        match self {
            IrType::Tensor { element, .. } => element,
            other => other,
        }
    }

    /// Tensor shape if this is a tensor
    pub fn shape(&self) -> Option<&[i64]> {
        match self {
            IrType::Tensor { shape, .. } => Some(shape),
            _ => None,
        }
    }

    /// Number of elements for a statically shaped tensor (1 for scalars)
    pub fn num_elements(&self) -> Option<usize> {
        match self {
            IrType::Tensor { shape, .. } => shape.iter().try_fold(1usize, |acc, &dim| {
                usize::try_from(dim).ok().map(|d| acc * d)
            }),
            IrType::None => Some(0),
            _ => Some(1),
        }
    }

    /// Size of one element in bytes
    pub fn element_size(&self) -> usize {
        match self.element_type() {
            IrType::Bool | IrType::I8 | IrType::U8 => 1,
            IrType::I16 | IrType::F16 => 2,
            IrType::I32 | IrType::F32 => 4,
            IrType::I64 | IrType::F64 => 8,
            IrType::Quantized { storage, .. } => storage.element_size(),
            IrType::Tensor { .. } | IrType::None => 0,
        }
    }

    /// Check if the element type is quantized
    pub fn is_quantized(&self) -> bool {
        matches!(self.element_type(), IrType::Quantized { .. })
    }

    /// Check if this is a floating point element type
    pub fn is_float(&self) -> bool {
        matches!(self.element_type(), IrType::F16 | IrType::F32 | IrType::F64)
    }
}

impl fmt::Display for IrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrType::Bool => write!(f, "i1"),
            IrType::I8 => write!(f, "i8"),
            IrType::I16 => write!(f, "i16"),
            IrType::I32 => write!(f, "i32"),
            IrType::I64 => write!(f, "i64"),
            IrType::U8 => write!(f, "ui8"),
            IrType::F16 => write!(f, "f16"),
            IrType::F32 => write!(f, "f32"),
            IrType::F64 => write!(f, "f64"),
            IrType::Tensor { element, shape } => {
                write!(f, "tensor<")?;
                for dim in shape {
                    if *dim < 0 {
                        write!(f, "?x")?;
                    } else {
                        write!(f, "{}x", dim)?;
                    }
                }
                write!(f, "{}>", element)
            }
            IrType::Quantized {
                storage,
                expressed,
                params,
            } => write!(f, "!quant<{}:{}, {}>", storage, expressed, params),
            IrType::None => write!(f, "none"),
        }
    }
}

impl fmt::Display for QuantParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuantParams::PerTensor { scale, zero_point } => write!(f, "{}:{}", scale, zero_point),
            QuantParams::PerAxis {
                axis,
                scales,
                zero_points,
            } => {
                write!(f, "axis {}, {{", axis)?;
                for (i, (scale, zp)) in scales.iter().zip(zero_points).enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}:{}", scale, zp)?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// Literal payload of a constant instruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IrValue {
    /// Boolean value
    Bool(bool),
    /// Integer values
    I8(i8),
    I32(i32),
    I64(i64),
    U8(u8),
    /// Floating point values
    F32(f32),
    F64(f64),
    /// Dense tensor contents as raw little-endian element bytes
    Dense { shape: Vec<i64>, data: Vec<u8> },
    /// Every element of a tensor set to the same scalar
    Splat { shape: Vec<i64>, value: Box<IrValue> },
}

impl IrValue {
    /// Dense f32 tensor literal
    pub fn dense_f32(shape: Vec<i64>, values: &[f32]) -> Self {
        let data = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        IrValue::Dense { shape, data }
    }

    /// Dense i8 tensor literal
    pub fn dense_i8(shape: Vec<i64>, values: &[i8]) -> Self {
        let data = values.iter().map(|v| *v as u8).collect();
        IrValue::Dense { shape, data }
    }

    /// Tensor of the given shape filled with `value`
    pub fn splat(shape: Vec<i64>, value: IrValue) -> Self {
        IrValue::Splat {
            shape,
            value: Box::new(value),
        }
    }

    /// Raw bytes of the literal, as they would be written to a model buffer
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            IrValue::Bool(v) => vec![*v as u8],
            IrValue::I8(v) => v.to_le_bytes().to_vec(),
            IrValue::I32(v) => v.to_le_bytes().to_vec(),
            IrValue::I64(v) => v.to_le_bytes().to_vec(),
            IrValue::U8(v) => vec![*v],
            IrValue::F32(v) => v.to_le_bytes().to_vec(),
            IrValue::F64(v) => v.to_le_bytes().to_vec(),
            IrValue::Dense { data, .. } => data.clone(),
            IrValue::Splat { shape, value } => {
                let count: i64 = shape.iter().product();
                value.to_bytes().repeat(count.max(0) as usize)
            }
        }
    }
}

impl fmt::Display for IrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrValue::Bool(v) => write!(f, "{}", v),
            IrValue::I8(v) => write!(f, "{}", v),
            IrValue::I32(v) => write!(f, "{}", v),
            IrValue::I64(v) => write!(f, "{}", v),
            IrValue::U8(v) => write!(f, "{}", v),
            IrValue::F32(v) => write!(f, "{:?}", v),
            IrValue::F64(v) => write!(f, "{:?}", v),
            IrValue::Dense { data, .. } => {
                write!(f, "dense<0x")?;
                for byte in data.iter().take(16) {
                    write!(f, "{:02X}", byte)?;
                }
                if data.len() > 16 {
                    write!(f, "...")?;
                }
                write!(f, ">")
            }
            IrValue::Splat { value, .. } => write!(f, "splat<{}>", value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_display() {
        assert_eq!(format!("{}", IrType::F32), "f32");
        assert_eq!(
            format!("{}", IrType::tensor(IrType::F32, vec![1, -1, 4])),
            "tensor<1x?x4xf32>"
        );
        let q = IrType::quantized(IrType::I8, IrType::F32, 0.5, -3);
        assert_eq!(format!("{}", q), "!quant<i8:f32, 0.5:-3>");
    }

    #[test]
    fn test_tensor_properties() {
        let t = IrType::tensor(IrType::F16, vec![2, 3]);
        assert_eq!(t.num_elements(), Some(6));
        assert_eq!(t.element_size(), 2);
        assert!(t.is_float());
        assert!(!t.is_quantized());

        let dynamic = IrType::tensor(IrType::F32, vec![-1, 3]);
        assert_eq!(dynamic.num_elements(), None);

        let qt = IrType::tensor(IrType::quantized(IrType::I8, IrType::F32, 0.1, 0), vec![4]);
        assert!(qt.is_quantized());
        assert_eq!(qt.element_size(), 1);
    }

    #[test]
    fn test_literal_bytes() {
        let dense = IrValue::dense_f32(vec![2], &[1.0, -2.5]);
        assert_eq!(dense.to_bytes().len(), 8);
        assert_eq!(&dense.to_bytes()[..4], &1.0f32.to_le_bytes());

        let splat = IrValue::splat(vec![2, 2], IrValue::I8(-1));
        assert_eq!(splat.to_bytes(), vec![0xFF; 4]);
    }
}
