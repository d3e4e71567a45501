use crate::error::InferenceError;
use crate::image_classifier::geometry::{Dim, InputGeometry, Layout};
use image::{imageops, imageops::FilterType, DynamicImage, RgbImage};

pub const DEFAULT_INPUT_SIZE: (u32, u32) = (224, 224);

const RGB_CHANNELS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreprocessPolicy {
    /// (height, width) used when the model leaves its spatial size dynamic.
    /// `None` makes dynamic spatial inputs an error.
    pub dynamic_default: Option<(u32, u32)>,
    /// (height, width) used when no model geometry is known at all.
    pub fallback_size: (u32, u32),
    pub filter: FilterType,
}

impl Default for PreprocessPolicy {
    fn default() -> Self {
        Self {
            dynamic_default: Some(DEFAULT_INPUT_SIZE),
            fallback_size: DEFAULT_INPUT_SIZE,
            filter: FilterType::CatmullRom,
        }
    }
}

/// Pixel data scaled to `[0, 1]` with a leading batch axis of size 1.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTensor {
    shape: Vec<usize>,
    data: Vec<f32>,
}

impl NormalizedTensor {
    pub fn new(shape: Vec<usize>, data: Vec<f32>) -> Result<Self, InferenceError> {
        let expected: usize = shape.iter().product();
        if expected != data.len() || shape.first() != Some(&1) {
            return Err(InferenceError::ShapeMismatch {
                shape,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { shape, data })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }
}

/// Side length of the square RGB image a dense input of `length` values encodes.
pub fn flattened_side(length: usize) -> Result<u32, InferenceError> {
    if length == 0 || length % RGB_CHANNELS != 0 {
        return Err(InferenceError::UnsupportedGeometry(format!(
            "flattened length {} is not a whole number of RGB pixels",
            length
        )));
    }

    let pixels = length / RGB_CHANNELS;
    let side = (pixels as f64).sqrt() as usize;
    // Float sqrt can land one off for large values.
    let side = (side.saturating_sub(1)..=side + 1)
        .find(|s| s * s == pixels)
        .ok_or_else(|| {
            InferenceError::UnsupportedGeometry(format!(
                "flattened length {} does not encode a square RGB image",
                length
            ))
        })?;

    u32::try_from(side).map_err(|_| {
        InferenceError::UnsupportedGeometry(format!("flattened side {} is too large", side))
    })
}

pub fn normalize(
    image: &DynamicImage,
    geometry: Option<&InputGeometry>,
    policy: &PreprocessPolicy,
) -> Result<NormalizedTensor, InferenceError> {
    let rgb = image.to_rgb8();

    match geometry {
        Some(InputGeometry::Flattened { length }) => {
            let side = flattened_side(*length)?;
            let resized = resize_exact(rgb, side, side, policy.filter);
            NormalizedTensor::new(vec![1, *length], channels_last(&resized))
        }
        Some(InputGeometry::Spatial {
            height,
            width,
            channels,
            layout,
        }) => {
            if !matches!(channels, Dim::Fixed(RGB_CHANNELS) | Dim::Dynamic) {
                return Err(InferenceError::UnsupportedGeometry(format!(
                    "model expects {} channels, only RGB input is supported",
                    channels
                )));
            }

            let (height, width) = spatial_size(*height, *width, policy)?;
            let resized = resize_exact(rgb, width, height, policy.filter);
            let (h, w) = (height as usize, width as usize);

            match layout {
                Layout::ChannelsLast => {
                    NormalizedTensor::new(vec![1, h, w, RGB_CHANNELS], channels_last(&resized))
                }
                Layout::ChannelsFirst => {
                    NormalizedTensor::new(vec![1, RGB_CHANNELS, h, w], channels_first(&resized))
                }
            }
        }
        None => {
            let (height, width) = policy.fallback_size;
            let resized = resize_exact(rgb, width, height, policy.filter);
            NormalizedTensor::new(
                vec![1, height as usize, width as usize, RGB_CHANNELS],
                channels_last(&resized),
            )
        }
    }
}

fn spatial_size(
    height: Dim,
    width: Dim,
    policy: &PreprocessPolicy,
) -> Result<(u32, u32), InferenceError> {
    match (height, width) {
        (Dim::Fixed(h), Dim::Fixed(w)) => {
            let h = u32::try_from(h).map_err(|_| too_large(h))?;
            let w = u32::try_from(w).map_err(|_| too_large(w))?;
            if h == 0 || w == 0 {
                return Err(InferenceError::UnsupportedGeometry(format!(
                    "model expects an empty {}x{} image",
                    h, w
                )));
            }
            Ok((h, w))
        }
        _ => policy.dynamic_default.ok_or_else(|| {
            InferenceError::UnsupportedGeometry(format!(
                "spatial size {}x{} is dynamic and no default size is configured",
                height, width
            ))
        }),
    }
}

fn too_large(size: usize) -> InferenceError {
    InferenceError::UnsupportedGeometry(format!("dimension {} is too large", size))
}

/// Stretches to exactly `width`x`height`; aspect ratio is not preserved.
fn resize_exact(rgb: RgbImage, width: u32, height: u32, filter: FilterType) -> RgbImage {
    if rgb.dimensions() == (width, height) {
        return rgb;
    }
    imageops::resize(&rgb, width, height, filter)
}

fn channels_last(rgb: &RgbImage) -> Vec<f32> {
    rgb.as_raw().iter().map(|&v| v as f32 / 255.0).collect()
}

fn channels_first(rgb: &RgbImage) -> Vec<f32> {
    let plane = (rgb.width() * rgb.height()) as usize;
    let mut data = vec![0.0f32; RGB_CHANNELS * plane];

    for (index, pixel) in rgb.pixels().enumerate() {
        for c in 0..RGB_CHANNELS {
            data[c * plane + index] = pixel[c] as f32 / 255.0;
        }
    }

    data
}
