//! 分辨率预设
//!
//! 预设按模型分组:
//! - SDXL: 约 1MP 的训练分辨率
//! - FLUX: 1~2.8MP 的高分辨率
//! - Ultra-Wide: 超宽/超高的横幅比例
//! - Qwen: Qwen-Image 推荐分辨率
//!
//! 名称格式为 `{width}×{height}`, 特殊名称 `custom` 表示使用自定义宽高。

use lazy_static::lazy_static;
use serde::Serialize;

/// 自定义尺寸的预设名称
pub const PRESET_CUSTOM: &str = "custom";

/// 预设尺寸的边界
pub const PRESET_MIN_DIMENSION: u32 = 64;
pub const PRESET_MAX_DIMENSION: u32 = 8192;

/// 分辨率预设元数据
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PresetMetadata {
    pub name: &'static str,
    pub width: u32,
    pub height: u32,
    pub aspect_ratio: &'static str,
    pub aspect_decimal: f64,
    pub megapixels: f64,
    pub model_group: &'static str,
    pub category: &'static str,
    pub description: &'static str,
}

/// 自定义尺寸的元数据
pub const CUSTOM_METADATA: PresetMetadata = PresetMetadata {
    name: PRESET_CUSTOM,
    width: 0,
    height: 0,
    aspect_ratio: "1:1",
    aspect_decimal: 1.0,
    megapixels: 0.0,
    model_group: "Custom",
    category: "Custom",
    description: "Custom dimensions",
};

/// (模型分组, 分类), 按下拉列表的分组顺序
const CATEGORY_GROUPS: [(&str, &str); 17] = [
    ("SDXL", "Square"),
    ("SDXL", "Portrait"),
    ("SDXL", "Landscape"),
    ("FLUX", "Square"),
    ("FLUX", "Portrait"),
    ("FLUX", "Cinematic"),
    ("FLUX", "Classic"),
    ("FLUX", "Photography"),
    ("Ultra-Wide", "Gaming"),
    ("Ultra-Wide", "Cinematic"),
    ("Ultra-Wide", "Panoramic"),
    ("Ultra-Wide", "Mobile"),
    ("Ultra-Wide", "Vertical"),
    ("Ultra-Wide", "Banner"),
    ("Qwen", "Square"),
    ("Qwen", "Portrait"),
    ("Qwen", "Landscape"),
];

/// 全部预设
pub const PRESETS: &[PresetMetadata] = &[
    // SDXL
    PresetMetadata {
        name: "1024×1024",
        width: 1024,
        height: 1024,
        aspect_ratio: "1:1",
        aspect_decimal: 1.0,
        megapixels: 1.05,
        model_group: "SDXL",
        category: "Square",
        description: "SDXL base resolution - perfect square",
    },
    PresetMetadata {
        name: "896×1152",
        width: 896,
        height: 1152,
        aspect_ratio: "7:9",
        aspect_decimal: 0.778,
        megapixels: 1.03,
        model_group: "SDXL",
        category: "Portrait",
        description: "SDXL portrait 7:9 - moderate portrait",
    },
    PresetMetadata {
        name: "832×1216",
        width: 832,
        height: 1216,
        aspect_ratio: "13:19",
        aspect_decimal: 0.684,
        megapixels: 1.01,
        model_group: "SDXL",
        category: "Portrait",
        description: "SDXL portrait 13:19 - standard portrait",
    },
    PresetMetadata {
        name: "768×1344",
        width: 768,
        height: 1344,
        aspect_ratio: "4:7",
        aspect_decimal: 0.571,
        megapixels: 1.03,
        model_group: "SDXL",
        category: "Portrait",
        description: "SDXL portrait 4:7 - tall portrait",
    },
    PresetMetadata {
        name: "640×1536",
        width: 640,
        height: 1536,
        aspect_ratio: "5:12",
        aspect_decimal: 0.417,
        megapixels: 0.98,
        model_group: "SDXL",
        category: "Portrait",
        description: "SDXL portrait 5:12 - very tall portrait",
    },
    PresetMetadata {
        name: "704×1408",
        width: 704,
        height: 1408,
        aspect_ratio: "1:2",
        aspect_decimal: 0.5,
        megapixels: 0.99,
        model_group: "SDXL",
        category: "Portrait",
        description: "SDXL portrait 1:2 - extreme tall portrait",
    },
    PresetMetadata {
        name: "960×1024",
        width: 960,
        height: 1024,
        aspect_ratio: "15:16",
        aspect_decimal: 0.938,
        megapixels: 0.98,
        model_group: "SDXL",
        category: "Portrait",
        description: "SDXL near-square portrait - subtle portrait",
    },
    PresetMetadata {
        name: "720×1280",
        width: 720,
        height: 1280,
        aspect_ratio: "9:16",
        aspect_decimal: 0.5625,
        megapixels: 0.92,
        model_group: "SDXL",
        category: "Portrait",
        description: "SDXL portrait 9:16 - vertical video/mobile",
    },
    PresetMetadata {
        name: "1024×960",
        width: 1024,
        height: 960,
        aspect_ratio: "16:15",
        aspect_decimal: 1.067,
        megapixels: 0.98,
        model_group: "SDXL",
        category: "Landscape",
        description: "SDXL near-square landscape - subtle landscape",
    },
    PresetMetadata {
        name: "1152×896",
        width: 1152,
        height: 896,
        aspect_ratio: "9:7",
        aspect_decimal: 1.286,
        megapixels: 1.03,
        model_group: "SDXL",
        category: "Landscape",
        description: "SDXL landscape 9:7 - moderate landscape",
    },
    PresetMetadata {
        name: "1216×832",
        width: 1216,
        height: 832,
        aspect_ratio: "19:13",
        aspect_decimal: 1.462,
        megapixels: 1.01,
        model_group: "SDXL",
        category: "Landscape",
        description: "SDXL landscape 19:13 - standard landscape",
    },
    PresetMetadata {
        name: "1344×768",
        width: 1344,
        height: 768,
        aspect_ratio: "7:4",
        aspect_decimal: 1.75,
        megapixels: 1.03,
        model_group: "SDXL",
        category: "Landscape",
        description: "SDXL landscape 7:4 - wide landscape",
    },
    PresetMetadata {
        name: "1536×640",
        width: 1536,
        height: 640,
        aspect_ratio: "12:5",
        aspect_decimal: 2.4,
        megapixels: 0.98,
        model_group: "SDXL",
        category: "Landscape",
        description: "SDXL landscape 12:5 - very wide landscape",
    },
    PresetMetadata {
        name: "1728×576",
        width: 1728,
        height: 576,
        aspect_ratio: "3:1",
        aspect_decimal: 3.0,
        megapixels: 1.0,
        model_group: "SDXL",
        category: "Landscape",
        description: "SDXL landscape 3:1 - extreme wide panoramic",
    },
    PresetMetadata {
        name: "1280×720",
        width: 1280,
        height: 720,
        aspect_ratio: "16:9",
        aspect_decimal: 1.778,
        megapixels: 0.92,
        model_group: "SDXL",
        category: "Landscape",
        description: "SDXL landscape 16:9 - HD widescreen video",
    },
    // FLUX
    PresetMetadata {
        name: "1920×1080",
        width: 1920,
        height: 1080,
        aspect_ratio: "16:9",
        aspect_decimal: 1.778,
        megapixels: 2.07,
        model_group: "FLUX",
        category: "Cinematic",
        description: "FLUX Full HD 16:9 - best quality/speed balance",
    },
    PresetMetadata {
        name: "1536×1536",
        width: 1536,
        height: 1536,
        aspect_ratio: "1:1",
        aspect_decimal: 1.0,
        megapixels: 2.36,
        model_group: "FLUX",
        category: "Square",
        description: "FLUX high-res square - premium quality",
    },
    PresetMetadata {
        name: "1280×768",
        width: 1280,
        height: 768,
        aspect_ratio: "5:3",
        aspect_decimal: 1.667,
        megapixels: 0.98,
        model_group: "FLUX",
        category: "Cinematic",
        description: "FLUX 5:3 landscape - cinematic wide",
    },
    PresetMetadata {
        name: "768×1280",
        width: 768,
        height: 1280,
        aspect_ratio: "3:5",
        aspect_decimal: 0.6,
        megapixels: 0.98,
        model_group: "FLUX",
        category: "Portrait",
        description: "FLUX 3:5 portrait - mobile optimized",
    },
    PresetMetadata {
        name: "1440×1080",
        width: 1440,
        height: 1080,
        aspect_ratio: "4:3",
        aspect_decimal: 1.333,
        megapixels: 1.56,
        model_group: "FLUX",
        category: "Classic",
        description: "FLUX 4:3 classic - traditional aspect ratio",
    },
    PresetMetadata {
        name: "1080×1440",
        width: 1080,
        height: 1440,
        aspect_ratio: "3:4",
        aspect_decimal: 0.75,
        megapixels: 1.56,
        model_group: "FLUX",
        category: "Portrait",
        description: "FLUX 3:4 portrait - classic portrait",
    },
    PresetMetadata {
        name: "1728×1152",
        width: 1728,
        height: 1152,
        aspect_ratio: "3:2",
        aspect_decimal: 1.5,
        megapixels: 1.99,
        model_group: "FLUX",
        category: "Photography",
        description: "FLUX 3:2 photo - photography standard",
    },
    PresetMetadata {
        name: "1152×1728",
        width: 1152,
        height: 1728,
        aspect_ratio: "2:3",
        aspect_decimal: 0.667,
        megapixels: 1.99,
        model_group: "FLUX",
        category: "Portrait",
        description: "FLUX 2:3 portrait - portrait photography",
    },
    // Ultra-Wide
    PresetMetadata {
        name: "2560×1080",
        width: 2560,
        height: 1080,
        aspect_ratio: "64:27",
        aspect_decimal: 2.37,
        megapixels: 2.76,
        model_group: "Ultra-Wide",
        category: "Gaming",
        description: "Ultra-wide 64:27 - gaming/panoramic",
    },
    PresetMetadata {
        name: "2048×768",
        width: 2048,
        height: 768,
        aspect_ratio: "8:3",
        aspect_decimal: 2.667,
        megapixels: 1.57,
        model_group: "Ultra-Wide",
        category: "Cinematic",
        description: "Wide cinematic 8:3 - movie aspect",
    },
    PresetMetadata {
        name: "1792×768",
        width: 1792,
        height: 768,
        aspect_ratio: "7:3",
        aspect_decimal: 2.333,
        megapixels: 1.38,
        model_group: "Ultra-Wide",
        category: "Panoramic",
        description: "Panoramic 7:3 - landscape vista",
    },
    PresetMetadata {
        name: "2304×768",
        width: 2304,
        height: 768,
        aspect_ratio: "3:1",
        aspect_decimal: 3.0,
        megapixels: 1.77,
        model_group: "Ultra-Wide",
        category: "Banner",
        description: "Banner 3:1 - extreme wide banner",
    },
    PresetMetadata {
        name: "1080×2560",
        width: 1080,
        height: 2560,
        aspect_ratio: "27:64",
        aspect_decimal: 0.422,
        megapixels: 2.76,
        model_group: "Ultra-Wide",
        category: "Mobile",
        description: "Mobile ultra-tall 27:64 - modern phones",
    },
    PresetMetadata {
        name: "768×2048",
        width: 768,
        height: 2048,
        aspect_ratio: "3:8",
        aspect_decimal: 0.375,
        megapixels: 1.57,
        model_group: "Ultra-Wide",
        category: "Vertical",
        description: "Vertical cinematic 3:8 - portrait video",
    },
    PresetMetadata {
        name: "768×1792",
        width: 768,
        height: 1792,
        aspect_ratio: "3:7",
        aspect_decimal: 0.429,
        megapixels: 1.38,
        model_group: "Ultra-Wide",
        category: "Vertical",
        description: "Vertical panoramic 3:7 - tall vista",
    },
    PresetMetadata {
        name: "768×2304",
        width: 768,
        height: 2304,
        aspect_ratio: "1:3",
        aspect_decimal: 0.333,
        megapixels: 1.77,
        model_group: "Ultra-Wide",
        category: "Banner",
        description: "Vertical banner 1:3 - extreme tall banner",
    },
    // Qwen
    PresetMetadata {
        name: "1328×1328",
        width: 1328,
        height: 1328,
        aspect_ratio: "1:1",
        aspect_decimal: 1.0,
        megapixels: 1.76,
        model_group: "Qwen",
        category: "Square",
        description: "Qwen square 1:1 - optimized square",
    },
    PresetMetadata {
        name: "1664×928",
        width: 1664,
        height: 928,
        aspect_ratio: "16:9",
        aspect_decimal: 1.793,
        megapixels: 1.54,
        model_group: "Qwen",
        category: "Landscape",
        description: "Qwen landscape 16:9 - widescreen format",
    },
    PresetMetadata {
        name: "928×1664",
        width: 928,
        height: 1664,
        aspect_ratio: "9:16",
        aspect_decimal: 0.558,
        megapixels: 1.54,
        model_group: "Qwen",
        category: "Portrait",
        description: "Qwen portrait 9:16 - vertical format",
    },
    PresetMetadata {
        name: "1472×1104",
        width: 1472,
        height: 1104,
        aspect_ratio: "4:3",
        aspect_decimal: 1.333,
        megapixels: 1.62,
        model_group: "Qwen",
        category: "Landscape",
        description: "Qwen landscape 4:3 - classic landscape",
    },
    PresetMetadata {
        name: "1104×1472",
        width: 1104,
        height: 1472,
        aspect_ratio: "3:4",
        aspect_decimal: 0.75,
        megapixels: 1.62,
        model_group: "Qwen",
        category: "Portrait",
        description: "Qwen portrait 3:4 - classic portrait",
    },
    PresetMetadata {
        name: "1584×1056",
        width: 1584,
        height: 1056,
        aspect_ratio: "3:2",
        aspect_decimal: 1.5,
        megapixels: 1.67,
        model_group: "Qwen",
        category: "Landscape",
        description: "Qwen landscape 3:2 - photography standard",
    },
    PresetMetadata {
        name: "1056×1584",
        width: 1056,
        height: 1584,
        aspect_ratio: "2:3",
        aspect_decimal: 0.667,
        megapixels: 1.67,
        model_group: "Qwen",
        category: "Portrait",
        description: "Qwen portrait 2:3 - portrait photography",
    },
    PresetMetadata {
        name: "2080×688",
        width: 2080,
        height: 688,
        aspect_ratio: "3:1",
        aspect_decimal: 3.023,
        megapixels: 1.43,
        model_group: "Qwen",
        category: "Landscape",
        description: "Qwen experimental landscape 3:1 - ultra-wide",
    },
    PresetMetadata {
        name: "688×2080",
        width: 688,
        height: 2080,
        aspect_ratio: "1:3",
        aspect_decimal: 0.331,
        megapixels: 1.43,
        model_group: "Qwen",
        category: "Portrait",
        description: "Qwen experimental portrait 1:3 - ultra-tall",
    },
];

lazy_static! {
    /// 分组名称 -> 预设名称列表
    static ref PRESET_CATEGORIES: Vec<(String, Vec<&'static str>)> = {
        let mut categories = vec![("Custom".to_string(), vec![PRESET_CUSTOM])];
        for (group, category) in CATEGORY_GROUPS {
            let names = PRESETS
                .iter()
                .filter(|p| p.model_group == group && p.category == category)
                .map(|p| p.name)
                .collect();
            categories.push((format!("{group} {category}"), names));
        }
        categories
    };
}

/// 下拉列表选项: custom + 全部预设
pub fn preset_names() -> Vec<&'static str> {
    std::iter::once(PRESET_CUSTOM)
        .chain(PRESETS.iter().map(|p| p.name))
        .collect()
}

/// 获取预设
pub fn find_preset(name: &str) -> Option<&'static PresetMetadata> {
    PRESETS.iter().find(|p| p.name == name)
}

/// 预设对应的宽高, custom 为 (0, 0)
pub fn preset_options(name: &str) -> Option<(u32, u32)> {
    if name == PRESET_CUSTOM {
        return Some((0, 0));
    }
    find_preset(name).map(|p| (p.width, p.height))
}

/// 获取预设元数据, 未知预设返回自定义元数据
pub fn preset_metadata(name: &str) -> PresetMetadata {
    find_preset(name).copied().unwrap_or(CUSTOM_METADATA)
}

pub fn presets_by_model_group(model_group: &str) -> Vec<&'static PresetMetadata> {
    PRESETS
        .iter()
        .filter(|p| p.model_group == model_group)
        .collect()
}

pub fn presets_by_aspect_ratio(aspect_ratio: &str) -> Vec<&'static PresetMetadata> {
    PRESETS
        .iter()
        .filter(|p| p.aspect_ratio == aspect_ratio)
        .collect()
}

pub fn presets_by_category(category: &str) -> Vec<&'static PresetMetadata> {
    PRESETS.iter().filter(|p| p.category == category).collect()
}

/// 分组后的预设
pub fn preset_categories() -> &'static [(String, Vec<&'static str>)] {
    &PRESET_CATEGORIES
}

/// 获取预设的分类
pub fn preset_category(name: &str) -> String {
    if let Some(preset) = find_preset(name) {
        return preset.category.to_string();
    }
    preset_categories()
        .iter()
        .find(|(_, names)| names.iter().any(|n| *n == name))
        .map(|(category, _)| category.clone())
        .unwrap_or_else(|| "Unknown".to_string())
}

/// 模型推荐说明
pub fn model_recommendation(name: &str) -> String {
    match find_preset(name) {
        Some(preset) => format!("Optimized for {}", preset.model_group),
        None => "Custom dimensions".to_string(),
    }
}

/// 计算宽高比, 返回 ("w:h", 小数)
pub fn calculate_aspect_ratio(width: u32, height: u32) -> (String, f64) {
    if width == 0 || height == 0 {
        return ("0:0".to_string(), 0.0);
    }
    let divisor = gcd(width, height);
    (
        format!("{}:{}", width / divisor, height / divisor),
        width as f64 / height as f64,
    )
}

fn gcd(a: u32, b: u32) -> u32 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

/// 检查预设尺寸: 8 的倍数且在边界内
pub fn validate_preset_dimensions() -> Result<(), String> {
    let bounds = PRESET_MIN_DIMENSION..=PRESET_MAX_DIMENSION;
    for preset in PRESETS {
        if preset.width % 8 != 0 || preset.height % 8 != 0 {
            return Err(format!(
                "{} dimensions not divisible by 8: {}×{}",
                preset.name, preset.width, preset.height
            ));
        }
        if !bounds.contains(&preset.width) || !bounds.contains(&preset.height) {
            return Err(format!(
                "{} dimensions out of bounds: {}×{}",
                preset.name, preset.width, preset.height
            ));
        }
    }
    Ok(())
}

/// 检查元数据与宽高是否一致
pub fn validate_metadata_consistency() -> Result<(), String> {
    for preset in PRESETS {
        let (_, expected_decimal) = calculate_aspect_ratio(preset.width, preset.height);
        if (preset.aspect_decimal - expected_decimal).abs() > 0.001 {
            return Err(format!(
                "{} aspect ratio mismatch: expected {expected_decimal:.3}, got {}",
                preset.name, preset.aspect_decimal
            ));
        }

        let expected_mp = (preset.width as f64 * preset.height as f64) / 1_000_000.0;
        if (preset.megapixels - expected_mp).abs() > 0.1 {
            return Err(format!(
                "{} megapixel mismatch: expected {expected_mp:.2}, got {}",
                preset.name, preset.megapixels
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        assert_eq!(validate_preset_dimensions(), Ok(()));
        assert_eq!(validate_metadata_consistency(), Ok(()));
    }

    #[test]
    fn test_preset_names_are_unique_and_match_dimensions() {
        let names = preset_names();
        assert_eq!(names[0], PRESET_CUSTOM);
        assert_eq!(names.len(), PRESETS.len() + 1);

        for preset in PRESETS {
            assert_eq!(preset.name, format!("{}×{}", preset.width, preset.height));
            assert_eq!(names.iter().filter(|n| **n == preset.name).count(), 1);
        }
    }

    #[test]
    fn test_preset_lookup() {
        assert_eq!(preset_options("1024×1024"), Some((1024, 1024)));
        assert_eq!(preset_options(PRESET_CUSTOM), Some((0, 0)));
        assert_eq!(preset_options("1×1"), None);

        let meta = preset_metadata("1920×1080");
        assert_eq!(meta.model_group, "FLUX");
        assert_eq!(meta.category, "Cinematic");

        let meta = preset_metadata("unknown");
        assert_eq!(meta, CUSTOM_METADATA);
    }

    #[test]
    fn test_filters() {
        assert_eq!(presets_by_model_group("SDXL").len(), 15);
        assert_eq!(presets_by_model_group("Qwen").len(), 9);
        assert!(presets_by_aspect_ratio("16:9")
            .iter()
            .any(|p| p.name == "1280×720"));
        assert!(presets_by_category("Banner")
            .iter()
            .all(|p| p.model_group == "Ultra-Wide"));
    }

    #[test]
    fn test_categories() {
        let categories = preset_categories();
        assert_eq!(categories[0].0, "Custom");
        assert_eq!(categories[0].1, vec![PRESET_CUSTOM]);

        let total: usize = categories.iter().skip(1).map(|(_, v)| v.len()).sum();
        assert_eq!(total, PRESETS.len());

        assert_eq!(preset_category("704×1408"), "Portrait");
        assert_eq!(preset_category(PRESET_CUSTOM), "Custom");
        assert_eq!(preset_category("nope"), "Unknown");
    }

    #[test]
    fn test_model_recommendation() {
        assert_eq!(model_recommendation("1328×1328"), "Optimized for Qwen");
        assert_eq!(model_recommendation(PRESET_CUSTOM), "Custom dimensions");
    }

    #[test]
    fn test_calculate_aspect_ratio() {
        let (ratio, decimal) = calculate_aspect_ratio(1920, 1080);
        assert_eq!(ratio, "16:9");
        assert!((decimal - 1.7777).abs() < 0.001);

        assert_eq!(calculate_aspect_ratio(832, 1216).0, "13:19");
        assert_eq!(calculate_aspect_ratio(0, 10).0, "0:0");
    }
}
