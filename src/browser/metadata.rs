//! 图片加载与元数据
//!
//! PNG 文本块中的 `prompt` 与 `workflow` 按 JSON 解析, 解析失败时保留原始字符串

use std::{collections::BTreeMap, fs::File, io::BufReader, path::Path};

use image::{ColorType, DynamicImage, ImageReader};
use log::debug;
use serde::Serialize;
use serde_json::Value;

use crate::{error::Error, wrapper::torch::TensorWrapper};

/// 图片信息
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageInfo {
    pub filename: String,
    pub width: u32,
    pub height: u32,
    pub mode: String,
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow: Option<Value>,
}

impl ImageInfo {
    /// 4 空格缩进的 JSON
    pub fn to_pretty_json(&self) -> Result<String, Error> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)?;
        String::from_utf8(buf).map_err(|e| Error::TypeConversion(e.to_string()))
    }
}

/// 空图片, 形状为 [1, 1, 1, 4]
pub fn empty_image() -> TensorWrapper {
    TensorWrapper::zeros(vec![1, 1, 1, 4])
}

/// 加载图片
///
/// 有透明通道时输出 RGBA, 否则输出 RGB; 张量形状为 [1, H, W, C], 取值范围 0..1
pub fn load_image(path: &Path) -> Result<(TensorWrapper, ImageInfo), Error> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.display().to_string()));
    }

    let reader = ImageReader::open(path)?.with_guessed_format()?;
    let format = reader.format();
    let img = reader.decode()?;

    let mut info = ImageInfo {
        filename: path
            .file_name()
            .map(|v| v.to_string_lossy().to_string())
            .unwrap_or_default(),
        width: img.width(),
        height: img.height(),
        mode: color_mode(img.color()).to_string(),
        format: format.map(|v| format!("{v:?}").to_uppercase()),
        parameters: None,
        prompt: None,
        workflow: None,
    };

    if format == Some(image::ImageFormat::Png) {
        let mut chunks = png_text_chunks(path)?;
        info.parameters = chunks.remove("parameters");
        info.prompt = chunks.remove("prompt").map(parse_json_text);
        info.workflow = chunks.remove("workflow").map(parse_json_text);
    }

    Ok((image_to_tensor(&img)?, info))
}

/// 转换为 [1, H, W, C] 张量
pub fn image_to_tensor(img: &DynamicImage) -> Result<TensorWrapper, Error> {
    let (width, height) = (img.width() as usize, img.height() as usize);

    let (raw, channels) = if img.color().has_alpha() {
        (img.to_rgba8().into_raw(), 4)
    } else {
        (img.to_rgb8().into_raw(), 3)
    };
    let data = raw.into_iter().map(|v| v as f32 / 255.0).collect();

    TensorWrapper::new(data, vec![1, height, width, channels])
}

/// 颜色模式名称
fn color_mode(color: ColorType) -> &'static str {
    match color {
        ColorType::L8 => "L",
        ColorType::La8 => "LA",
        ColorType::L16 => "I;16",
        ColorType::La16 => "LA",
        ColorType::Rgb8 | ColorType::Rgb16 | ColorType::Rgb32F => "RGB",
        ColorType::Rgba8 | ColorType::Rgba16 | ColorType::Rgba32F => "RGBA",
        _ => "RGB",
    }
}

/// 读取 PNG 文本块: tEXt, zTXt, iTXt
pub fn png_text_chunks(path: &Path) -> Result<BTreeMap<String, String>, Error> {
    let decoder = png::Decoder::new(BufReader::new(File::open(path)?));
    let reader = decoder.read_info()?;
    let info = reader.info();

    let mut chunks = BTreeMap::new();
    for chunk in &info.uncompressed_latin1_text {
        chunks.insert(chunk.keyword.clone(), chunk.text.clone());
    }
    for chunk in &info.compressed_latin1_text {
        match chunk.get_text() {
            Ok(text) => {
                chunks.insert(chunk.keyword.clone(), text);
            }
            Err(e) => debug!("skip zTXt chunk {}, {e}", chunk.keyword),
        }
    }
    for chunk in &info.utf8_text {
        match chunk.get_text() {
            Ok(text) => {
                chunks.insert(chunk.keyword.clone(), text);
            }
            Err(e) => debug!("skip iTXt chunk {}, {e}", chunk.keyword),
        }
    }
    Ok(chunks)
}

fn parse_json_text(text: String) -> Value {
    serde_json::from_str(&text).unwrap_or(Value::String(text))
}

#[cfg(test)]
mod tests {
    use std::io::BufWriter;

    use image::{Rgb, RgbImage, Rgba, RgbaImage};
    use serde_json::json;

    use super::*;

    fn write_png_with_text(path: &Path, chunks: &[(&str, &str)]) -> anyhow::Result<()> {
        let file = File::create(path)?;
        let mut encoder = png::Encoder::new(BufWriter::new(file), 2, 1);
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);
        for (keyword, text) in chunks {
            encoder.add_text_chunk(keyword.to_string(), text.to_string())?;
        }
        let mut writer = encoder.write_header()?;
        writer.write_image_data(&[255, 0, 0, 0, 0, 255])?;
        Ok(())
    }

    #[test]
    fn test_load_rgb_png_with_metadata() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("gen.png");
        write_png_with_text(
            &path,
            &[
                ("parameters", "a cat, Steps: 20"),
                ("prompt", r#"{"3": {"class_type": "KSampler"}}"#),
                ("workflow", "not json"),
            ],
        )?;

        let (tensor, info) = load_image(&path)?;
        assert_eq!(tensor.dims(), &[1, 1, 2, 3]);
        assert_eq!(&tensor.data()[..3], &[1.0, 0.0, 0.0]);

        assert_eq!(info.filename, "gen.png");
        assert_eq!((info.width, info.height), (2, 1));
        assert_eq!(info.mode, "RGB");
        assert_eq!(info.format.as_deref(), Some("PNG"));
        assert_eq!(info.parameters.as_deref(), Some("a cat, Steps: 20"));
        assert_eq!(info.prompt, Some(json!({"3": {"class_type": "KSampler"}})));
        assert_eq!(info.workflow, Some(Value::String("not json".to_string())));

        let text = info.to_pretty_json()?;
        assert!(text.starts_with("{\n    \"filename\": \"gen.png\""));
        Ok(())
    }

    #[test]
    fn test_load_rgba_keeps_alpha() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("alpha.png");
        RgbaImage::from_pixel(3, 2, Rgba([0, 0, 255, 0])).save(&path)?;

        let (tensor, info) = load_image(&path)?;
        assert_eq!(tensor.dims(), &[1, 2, 3, 4]);
        assert_eq!(info.mode, "RGBA");
        assert!(info.prompt.is_none());
        Ok(())
    }

    #[test]
    fn test_load_jpeg() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("photo.jpg");
        RgbImage::from_pixel(4, 4, Rgb([10, 20, 30])).save(&path)?;

        let (tensor, info) = load_image(&path)?;
        assert_eq!(tensor.dims(), &[1, 4, 4, 3]);
        assert_eq!(info.format.as_deref(), Some("JPEG"));
        assert!(!info.to_pretty_json()?.contains("parameters"));
        Ok(())
    }

    #[test]
    fn test_missing_file() {
        let result = load_image(Path::new("/nonexistent/kiko.png"));
        assert!(matches!(result, Err(Error::FileNotFound(_))));
    }

    #[test]
    fn test_empty_image() {
        assert_eq!(empty_image().dims(), &[1, 1, 1, 4]);
    }
}
