use std::fmt;

use anyhow::Context as _;
use image::{ImageFormat, RgbaImage, imageops::FilterType, load_from_memory_with_format};

/// Pixel layout of decoded texture data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Rgba8,
    /// 8-bit RGBA with sRGB-encoded colour channels.
    Rgba8Srgb,
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PixelFormat::Rgba8 => f.write_str("RGBA8"),
            PixelFormat::Rgba8Srgb => f.write_str("RGBA8 (sRGB)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureImportOptions {
    pub generate_mipmaps: bool,
    /// Treat colour channels as sRGB encoded (albedo maps); off for data maps.
    pub srgb: bool,
}

impl Default for TextureImportOptions {
    fn default() -> Self {
        Self {
            generate_mipmaps: false,
            srgb: true,
        }
    }
}

/// CPU-side texture: the base image plus any generated mip levels.
#[derive(Debug, Clone)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    /// Level 0 is the full resolution image.
    pub mips: Vec<RgbaImage>,
}

/// Summary of an imported texture, as reported after import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureProperties {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    /// Number of mip levels below the base level.
    pub num_mipmaps: u32,
}

impl TextureData {
    /// Decode an image file.
    ///
    /// `extension` is an optional format hint (e.g. "png"); without it the
    /// format is guessed from the content.
    pub fn from_bytes(
        bytes: &[u8],
        extension: Option<&str>,
        options: &TextureImportOptions,
    ) -> anyhow::Result<Self> {
        let img = match extension.and_then(ImageFormat::from_extension) {
            Some(format) => load_from_memory_with_format(bytes, format)?,
            None => image::load_from_memory(bytes).context("unrecognised image format")?,
        };
        Ok(Self::from_image(img.to_rgba8(), options))
    }

    pub fn from_image(base: RgbaImage, options: &TextureImportOptions) -> Self {
        let (width, height) = base.dimensions();
        let mips = if options.generate_mipmaps {
            mip_chain(base)
        } else {
            vec![base]
        };
        let format = if options.srgb {
            PixelFormat::Rgba8Srgb
        } else {
            PixelFormat::Rgba8
        };
        Self {
            width,
            height,
            format,
            mips,
        }
    }

    /// A 1x1 texture of one colour.
    pub fn solid(rgba: [u8; 4]) -> Self {
        let img = RgbaImage::from_pixel(1, 1, image::Rgba(rgba));
        Self::from_image(img, &TextureImportOptions::default())
    }

    /// A two-tone checkerboard of `cells` x `cells` squares.
    pub fn checkerboard(size: u32, cells: u32) -> Self {
        let cell = (size / cells.max(1)).max(1);
        let img = RgbaImage::from_fn(size, size, |x, y| {
            if ((x / cell) + (y / cell)) % 2 == 0 {
                image::Rgba([230, 230, 230, 255])
            } else {
                image::Rgba([60, 60, 60, 255])
            }
        });
        Self::from_image(
            img,
            &TextureImportOptions {
                generate_mipmaps: true,
                srgb: true,
            },
        )
    }

    pub fn properties(&self) -> TextureProperties {
        TextureProperties {
            width: self.width,
            height: self.height,
            format: self.format,
            num_mipmaps: self.mips.len().saturating_sub(1) as u32,
        }
    }
}

/// Halve the image until both sides reach one pixel.
fn mip_chain(base: RgbaImage) -> Vec<RgbaImage> {
    let mut mips = vec![base];
    loop {
        let Some(prev) = mips.last() else { break };
        let (width, height) = prev.dimensions();
        if width == 1 && height == 1 {
            break;
        }
        let next = image::imageops::resize(
            prev,
            (width / 2).max(1),
            (height / 2).max(1),
            FilterType::Triangle,
        );
        mips.push(next);
    }
    mips
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mip_chain_reaches_one_pixel() {
        let data = TextureData::from_image(
            RgbaImage::new(8, 2),
            &TextureImportOptions {
                generate_mipmaps: true,
                srgb: false,
            },
        );
        let sizes: Vec<_> = data.mips.iter().map(|m| m.dimensions()).collect();
        assert_eq!(sizes, vec![(8, 2), (4, 1), (2, 1), (1, 1)]);

        let props = data.properties();
        assert_eq!(props.num_mipmaps, 3);
        assert_eq!(props.format, PixelFormat::Rgba8);
    }

    #[test]
    fn no_mips_unless_requested() {
        let data = TextureData::from_image(RgbaImage::new(16, 16), &Default::default());
        assert_eq!(data.mips.len(), 1);
        assert_eq!(data.properties().num_mipmaps, 0);
        assert_eq!(data.format, PixelFormat::Rgba8Srgb);
    }
}
