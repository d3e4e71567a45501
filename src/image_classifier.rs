pub mod bulk;
pub mod geometry;
#[cfg(test)]
pub mod impl_fake;
pub mod impl_serialized;
pub mod impl_tract_onnx;
pub mod interface;
pub mod interpret;
pub mod pipeline;
pub mod preprocess;
