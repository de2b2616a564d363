// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Raster image loading.
//!
//! Image sources are addressed by URL: a filesystem path, a `file://` URL or
//! a base64 `data:` URL. Orientation correction happens before an image
//! reaches this module; here we only need pixels and natural dimensions.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::{DynamicImage, ImageFormat, RgbaImage};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading or re-encoding a raster.
#[derive(Error, Debug)]
pub enum MediaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Invalid data URL: {0}")]
    DataUrl(String),

    #[error("Image has no pixels: {url}")]
    Empty { url: String },

    #[error("Crop region {x},{y} {width}x{height} is outside the image")]
    InvalidCrop {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
}

/// Decoded raster with its natural size.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: RgbaImage,
}

/// Source of raster images for surfaces and export.
pub trait RasterLoader {
    /// Decode the full raster.
    fn load(&self, url: &str) -> Result<LoadedImage, MediaError>;

    /// Natural size without keeping pixels around.
    fn dimensions(&self, url: &str) -> Result<(u32, u32), MediaError> {
        let img = self.load(url)?;
        Ok((img.width, img.height))
    }
}

/// Loader backed by the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageLoader;

impl RasterLoader for ImageLoader {
    fn load(&self, url: &str) -> Result<LoadedImage, MediaError> {
        let img = match parse_data_url(url) {
            Some(bytes) => image::load_from_memory(&bytes?)?,
            None => image::open(url_to_path(url))?,
        };
        to_loaded(img, url)
    }

    fn dimensions(&self, url: &str) -> Result<(u32, u32), MediaError> {
        match parse_data_url(url) {
            Some(bytes) => {
                let img = image::load_from_memory(&bytes?)?;
                Ok((img.width(), img.height()))
            }
            None => Ok(image::image_dimensions(url_to_path(url))?),
        }
    }
}

/// Load an image file from disk.
pub fn load_image(path: &Path) -> Result<LoadedImage, MediaError> {
    ImageLoader.load(&path.to_string_lossy())
}

fn to_loaded(img: DynamicImage, url: &str) -> Result<LoadedImage, MediaError> {
    let pixels = img.to_rgba8();
    let (width, height) = pixels.dimensions();
    if width == 0 || height == 0 {
        return Err(MediaError::Empty {
            url: url.chars().take(64).collect(),
        });
    }
    Ok(LoadedImage {
        width,
        height,
        pixels,
    })
}

fn url_to_path(url: &str) -> PathBuf {
    PathBuf::from(url.strip_prefix("file://").unwrap_or(url))
}

/// Decode the payload of a base64 `data:` URL; `None` if `url` is not one.
fn parse_data_url(url: &str) -> Option<Result<Vec<u8>, MediaError>> {
    let rest = url.strip_prefix("data:")?;
    let Some((header, payload)) = rest.split_once(',') else {
        return Some(Err(MediaError::DataUrl("missing payload".to_string())));
    };
    if !header.ends_with(";base64") {
        return Some(Err(MediaError::DataUrl(format!(
            "unsupported encoding '{}'",
            header
        ))));
    }
    Some(
        BASE64
            .decode(payload.trim())
            .map_err(|e| MediaError::DataUrl(e.to_string())),
    )
}

/// Encode a raster as a PNG `data:` URL.
pub fn to_png_data_url(pixels: &RgbaImage) -> Result<String, MediaError> {
    let mut bytes = Vec::new();
    pixels.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(format!("data:image/png;base64,{}", BASE64.encode(bytes)))
}

/// Crop a raster to a native-pixel region and return it as a PNG data URL.
pub fn crop_to_data_url(
    loader: &dyn RasterLoader,
    url: &str,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
) -> Result<(String, u32, u32), MediaError> {
    let img = loader.load(url)?;
    let fits = width > 0
        && height > 0
        && x.checked_add(width).is_some_and(|r| r <= img.width)
        && y.checked_add(height).is_some_and(|b| b <= img.height);
    if !fits {
        return Err(MediaError::InvalidCrop {
            x,
            y,
            width,
            height,
        });
    }
    let cropped = image::imageops::crop_imm(&img.pixels, x, y, width, height).to_image();
    Ok((to_png_data_url(&cropped)?, width, height))
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::HashMap;

    /// In-memory loader: solid gray rasters of fixed sizes, keyed by URL.
    #[derive(Debug, Default)]
    pub struct MemoryLoader {
        sizes: HashMap<String, (u32, u32)>,
    }

    impl MemoryLoader {
        pub fn with(mut self, url: &str, w: u32, h: u32) -> Self {
            self.sizes.insert(url.to_string(), (w, h));
            self
        }
    }

    impl RasterLoader for MemoryLoader {
        fn load(&self, url: &str) -> Result<LoadedImage, MediaError> {
            if let Some(&(w, h)) = self.sizes.get(url) {
                return Ok(LoadedImage {
                    width: w,
                    height: h,
                    pixels: RgbaImage::from_pixel(w, h, image::Rgba([90, 90, 90, 255])),
                });
            }
            ImageLoader.load(url)
        }
    }
}
