//! Service-local models

pub mod image;

pub use image::ImageInput;
