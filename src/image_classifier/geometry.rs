use crate::error::InferenceError;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dim {
    Fixed(usize),
    Dynamic,
}

impl From<Option<usize>> for Dim {
    fn from(value: Option<usize>) -> Self {
        match value {
            Some(size) => Dim::Fixed(size),
            None => Dim::Dynamic,
        }
    }
}

impl fmt::Display for Dim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dim::Fixed(size) => write!(f, "{}", size),
            Dim::Dynamic => write!(f, "?"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// NHWC, what Keras models expect.
    ChannelsLast,
    /// NCHW, typical for ONNX exports of PyTorch models.
    ChannelsFirst,
}

/// Shape of one input example, resolved once when the model is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputGeometry {
    Flattened {
        length: usize,
    },
    Spatial {
        height: Dim,
        width: Dim,
        channels: Dim,
        layout: Layout,
    },
}

impl InputGeometry {
    /// Builds the geometry from a full input shape including the batch axis.
    /// `None` marks a dimension the model leaves symbolic.
    pub fn from_dims(dims: &[Option<usize>]) -> Result<Self, InferenceError> {
        match dims {
            [batch, ..] if !matches!(batch, None | Some(1)) => {
                Err(InferenceError::UnsupportedGeometry(format!(
                    "batch dimension must be 1 or dynamic, got {}",
                    Dim::from(*batch)
                )))
            }
            [_, Some(length)] => Ok(InputGeometry::Flattened { length: *length }),
            [_, None] => Err(InferenceError::UnsupportedGeometry(
                "flattened input length is dynamic".to_string(),
            )),
            [_, Some(3), height, width] if *width != Some(3) => Ok(InputGeometry::Spatial {
                height: Dim::from(*height),
                width: Dim::from(*width),
                channels: Dim::Fixed(3),
                layout: Layout::ChannelsFirst,
            }),
            [_, height, width, channels] => Ok(InputGeometry::Spatial {
                height: Dim::from(*height),
                width: Dim::from(*width),
                channels: Dim::from(*channels),
                layout: Layout::ChannelsLast,
            }),
            _ => Err(InferenceError::UnsupportedGeometry(format!(
                "expected a rank 2 or rank 4 input, got rank {}",
                dims.len()
            ))),
        }
    }
}

impl fmt::Display for InputGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputGeometry::Flattened { length } => write!(f, "flattened[{}]", length),
            InputGeometry::Spatial {
                height,
                width,
                channels,
                layout: Layout::ChannelsLast,
            } => write!(f, "nhwc[{}x{}x{}]", height, width, channels),
            InputGeometry::Spatial {
                height,
                width,
                channels,
                layout: Layout::ChannelsFirst,
            } => write!(f, "nchw[{}x{}x{}]", channels, height, width),
        }
    }
}
