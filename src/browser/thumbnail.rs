//! 缩略图

use std::{io::Cursor, path::Path};

use image::{
    codecs::jpeg::JpegEncoder, imageops::FilterType, DynamicImage, ImageFormat, ImageReader,
};

use crate::error::Error;

pub const CONTENT_TYPE_PNG: &str = "image/png";
pub const CONTENT_TYPE_JPEG: &str = "image/jpeg";

/// 缩略图数据
#[derive(Debug, Clone, PartialEq)]
pub struct Thumbnail {
    pub content_type: &'static str,
    pub data: Vec<u8>,
}

/// 生成缩略图
///
/// 有透明通道时输出 RGBA PNG, 否则输出 RGB JPEG; 等比缩放到 max_edge 内, 不放大
pub fn render_thumbnail(path: &Path, max_edge: u32, jpeg_quality: u8) -> Result<Thumbnail, Error> {
    let img = ImageReader::open(path)?.with_guessed_format()?.decode()?;
    let has_alpha = img.color().has_alpha();
    let img = fit_within(img, max_edge);

    let mut data = Vec::new();
    if has_alpha {
        DynamicImage::ImageRgba8(img.to_rgba8())
            .write_to(&mut Cursor::new(&mut data), ImageFormat::Png)?;
        Ok(Thumbnail {
            content_type: CONTENT_TYPE_PNG,
            data,
        })
    } else {
        DynamicImage::ImageRgb8(img.to_rgb8())
            .write_with_encoder(JpegEncoder::new_with_quality(&mut data, jpeg_quality))?;
        Ok(Thumbnail {
            content_type: CONTENT_TYPE_JPEG,
            data,
        })
    }
}

/// 等比缩放, 不放大
fn fit_within(img: DynamicImage, max_edge: u32) -> DynamicImage {
    if img.width() <= max_edge && img.height() <= max_edge {
        return img;
    }
    img.resize(max_edge, max_edge, FilterType::Lanczos3)
}

#[cfg(test)]
mod tests {
    use image::{GenericImageView, Rgb, RgbImage, Rgba, RgbaImage};

    use super::*;

    #[test]
    fn test_jpeg_thumbnail() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("wide.png");
        RgbImage::from_pixel(640, 320, Rgb([200, 100, 50])).save(&path)?;

        let thumb = render_thumbnail(&path, 320, 90)?;
        assert_eq!(thumb.content_type, CONTENT_TYPE_JPEG);

        let decoded = image::load_from_memory(&thumb.data)?;
        assert_eq!(decoded.dimensions(), (320, 160));
        Ok(())
    }

    #[test]
    fn test_png_thumbnail_keeps_alpha() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("alpha.png");
        RgbaImage::from_pixel(100, 400, Rgba([0, 0, 0, 128])).save(&path)?;

        let thumb = render_thumbnail(&path, 320, 90)?;
        assert_eq!(thumb.content_type, CONTENT_TYPE_PNG);

        let decoded = image::load_from_memory(&thumb.data)?;
        assert_eq!(decoded.dimensions(), (80, 320));
        assert!(decoded.color().has_alpha());
        Ok(())
    }

    #[test]
    fn test_small_image_not_upscaled() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("small.jpg");
        RgbImage::from_pixel(40, 30, Rgb([1, 2, 3])).save(&path)?;

        let thumb = render_thumbnail(&path, 320, 90)?;
        assert_eq!(image::load_from_memory(&thumb.data)?.dimensions(), (40, 30));
        Ok(())
    }

    #[test]
    fn test_not_an_image() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("fake.png");
        std::fs::write(&path, b"plain text")?;
        assert!(render_thumbnail(&path, 320, 90).is_err());
        Ok(())
    }
}
