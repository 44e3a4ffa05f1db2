//! 采样器与调度器
//!
//! 采样器/调度器列表优先读取宿主的 `comfy.samplers.KSampler`, 不可用时使用内置列表。

use pyo3::{types::PyAnyMethods, PyResult, Python};
use serde::Serialize;

/// 内置采样器列表
pub const BUILTIN_SAMPLERS: &[&str] = &[
    "euler",
    "euler_cfg_pp",
    "euler_ancestral",
    "euler_ancestral_cfg_pp",
    "heun",
    "heunpp2",
    "dpm_2",
    "dpm_2_ancestral",
    "lms",
    "dpm_fast",
    "dpm_adaptive",
    "dpmpp_2s_ancestral",
    "dpmpp_2s_ancestral_cfg_pp",
    "dpmpp_sde",
    "dpmpp_sde_gpu",
    "dpmpp_2m",
    "dpmpp_2m_cfg_pp",
    "dpmpp_2m_sde",
    "dpmpp_2m_sde_gpu",
    "dpmpp_3m_sde",
    "dpmpp_3m_sde_gpu",
    "ddpm",
    "lcm",
    "ipndm",
    "ipndm_v",
    "deis",
    "res_multistep",
    "res_multistep_cfg_pp",
    "res_multistep_ancestral",
    "res_multistep_ancestral_cfg_pp",
    "gradient_estimation",
    "er_sde",
    "seeds_2",
    "seeds_3",
    "ddim",
    "uni_pc",
    "uni_pc_bh2",
];

/// 内置调度器列表
pub const BUILTIN_SCHEDULERS: &[&str] = &[
    "simple",
    "sgm_uniform",
    "karras",
    "exponential",
    "ddim_uniform",
    "beta",
    "normal",
    "linear_quadratic",
    "kl_optimal",
];

pub const STEPS_MIN: i64 = 1;
pub const STEPS_MAX: i64 = 1000;
pub const CFG_MIN: f64 = 0.0;
pub const CFG_MAX: f64 = 30.0;

pub const DEFAULT_SAMPLER: &str = "euler";
pub const DEFAULT_SCHEDULER: &str = "normal";
pub const DEFAULT_STEPS: i64 = 20;
pub const DEFAULT_CFG: f64 = 7.0;

/// 采样器设置
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SamplerSettings {
    pub sampler: String,
    pub scheduler: String,
    pub steps: i64,
    pub cfg: f64,
}

impl SamplerSettings {
    pub fn new(sampler: &str, scheduler: &str, steps: i64, cfg: f64) -> Self {
        Self {
            sampler: sampler.to_string(),
            scheduler: scheduler.to_string(),
            steps,
            cfg,
        }
    }

    pub fn into_tuple(self) -> (String, String, i64, f64) {
        (self.sampler, self.scheduler, self.steps, self.cfg)
    }
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLER, DEFAULT_SCHEDULER, DEFAULT_STEPS, DEFAULT_CFG)
    }
}

/// 采样器推荐参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerProfile {
    pub schedulers: &'static [&'static str],
    /// (min, max, default)
    pub steps: (i64, i64, i64),
    /// (min, max, default)
    pub cfg: (f64, f64, f64),
}

const DEFAULT_PROFILE: SamplerProfile = SamplerProfile {
    schedulers: &["normal", "karras", "exponential", "simple"],
    steps: (10, 50, 20),
    cfg: (1.0, 20.0, 7.0),
};

/// 获取采样器的推荐参数
pub fn sampler_profile(sampler: &str) -> SamplerProfile {
    match sampler {
        "euler" | "euler_cfg_pp" => SamplerProfile {
            schedulers: &["normal", "karras", "simple", "exponential"],
            steps: (15, 40, 20),
            cfg: (5.0, 10.0, 7.0),
        },
        "euler_ancestral" | "euler_ancestral_cfg_pp" => SamplerProfile {
            schedulers: &["normal", "karras", "exponential", "simple"],
            steps: (20, 50, 30),
            cfg: (5.0, 12.0, 7.0),
        },
        "heun" | "heunpp2" => SamplerProfile {
            schedulers: &["normal", "karras", "simple"],
            steps: (10, 30, 15),
            cfg: (5.0, 10.0, 7.0),
        },
        "dpm_2" | "dpm_2_ancestral" | "lms" | "dpm_fast" | "dpm_adaptive" => SamplerProfile {
            schedulers: &["karras", "normal", "exponential"],
            steps: (20, 50, 25),
            cfg: (5.0, 12.0, 7.0),
        },
        "dpmpp_2m" | "dpmpp_2m_cfg_pp" | "dpmpp_2s_ancestral" | "dpmpp_2s_ancestral_cfg_pp" => {
            SamplerProfile {
                schedulers: &["karras", "exponential", "normal", "beta"],
                steps: (15, 30, 20),
                cfg: (5.0, 10.0, 7.0),
            }
        }
        "dpmpp_sde" | "dpmpp_sde_gpu" | "dpmpp_2m_sde" | "dpmpp_2m_sde_gpu" | "dpmpp_3m_sde"
        | "dpmpp_3m_sde_gpu" => SamplerProfile {
            schedulers: &["karras", "exponential", "normal"],
            steps: (15, 40, 25),
            cfg: (4.0, 10.0, 6.5),
        },
        "ddim" => SamplerProfile {
            schedulers: &["ddim_uniform", "normal", "simple"],
            steps: (20, 50, 30),
            cfg: (5.0, 12.0, 7.5),
        },
        "lcm" => SamplerProfile {
            schedulers: &["sgm_uniform", "simple"],
            steps: (4, 8, 6),
            cfg: (1.0, 2.0, 1.5),
        },
        "uni_pc" | "uni_pc_bh2" => SamplerProfile {
            schedulers: &["normal", "karras", "simple"],
            steps: (10, 30, 20),
            cfg: (5.0, 10.0, 7.0),
        },
        _ => DEFAULT_PROFILE,
    }
}

/// 采样器/调度器目录
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SamplerCatalog {
    pub samplers: Vec<String>,
    pub schedulers: Vec<String>,
}

impl Default for SamplerCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl SamplerCatalog {
    /// 内置目录
    pub fn builtin() -> Self {
        Self {
            samplers: BUILTIN_SAMPLERS.iter().map(|v| v.to_string()).collect(),
            schedulers: BUILTIN_SCHEDULERS.iter().map(|v| v.to_string()).collect(),
        }
    }

    /// 读取宿主的采样器目录, 失败时使用内置目录
    pub fn from_host(py: Python<'_>) -> Self {
        Self::load_host(py).unwrap_or_else(|_| Self::builtin())
    }

    fn load_host(py: Python<'_>) -> PyResult<Self> {
        let ksampler = py.import("comfy.samplers")?.getattr("KSampler")?;
        Ok(Self {
            samplers: ksampler.getattr("SAMPLERS")?.extract()?,
            schedulers: ksampler.getattr("SCHEDULERS")?.extract()?,
        })
    }

    pub fn has_sampler(&self, sampler: &str) -> bool {
        self.samplers.iter().any(|v| v == sampler)
    }

    pub fn has_scheduler(&self, scheduler: &str) -> bool {
        self.schedulers.iter().any(|v| v == scheduler)
    }

    /// 检查设置是否有效
    pub fn validate(&self, sampler: &str, scheduler: &str, steps: i64, cfg: f64) -> bool {
        self.has_sampler(sampler)
            && self.has_scheduler(scheduler)
            && (STEPS_MIN..=STEPS_MAX).contains(&steps)
            && (CFG_MIN..=CFG_MAX).contains(&cfg)
    }

    /// 获取清理后的采样器设置
    ///
    /// 未知采样器或调度器返回默认设置; 步数与 CFG 限制在有效范围内
    pub fn sampler_combo(&self, sampler: &str, scheduler: &str, steps: i64, cfg: f64) -> SamplerSettings {
        if !self.has_sampler(sampler) || !self.has_scheduler(scheduler) {
            return SamplerSettings::default();
        }

        let cfg = if cfg.is_nan() {
            DEFAULT_CFG
        } else {
            cfg.clamp(CFG_MIN, CFG_MAX)
        };
        SamplerSettings::new(sampler, scheduler, steps.clamp(STEPS_MIN, STEPS_MAX), cfg)
    }

    /// 推荐调度器, 只保留目录中存在的调度器
    pub fn scheduler_suggestions(&self, sampler: &str) -> Vec<String> {
        sampler_profile(sampler)
            .schedulers
            .iter()
            .filter(|v| self.has_scheduler(v))
            .map(|v| v.to_string())
            .collect()
    }

    pub fn info(&self) -> SamplerInfo {
        SamplerInfo {
            samplers: self.samplers.clone(),
            schedulers: self.schedulers.clone(),
            sampler_count: self.samplers.len(),
            scheduler_count: self.schedulers.len(),
        }
    }

    /// 分析设置组合
    pub fn combo_analysis(&self, sampler: &str, scheduler: &str, steps: i64, cfg: f64) -> ComboAnalysis {
        let profile = sampler_profile(sampler);
        let suggestions = self.scheduler_suggestions(sampler);
        let (steps_min, steps_max, _) = profile.steps;
        let (cfg_min, cfg_max, _) = profile.cfg;

        ComboAnalysis {
            sampler: sampler.to_string(),
            scheduler: scheduler.to_string(),
            steps,
            cfg,
            valid: self.validate(sampler, scheduler, steps, cfg),
            scheduler_compatible: suggestions.iter().any(|v| v == scheduler),
            scheduler_suggestions: suggestions,
            steps_optimal: (steps_min..=steps_max).contains(&steps),
            cfg_optimal: (cfg_min..=cfg_max).contains(&cfg),
        }
    }
}

/// 推荐步数 (min, max, default)
pub fn recommended_steps_range(sampler: &str) -> (i64, i64, i64) {
    sampler_profile(sampler).steps
}

/// 推荐 CFG (min, max, default)
pub fn recommended_cfg_range(sampler: &str) -> (f64, f64, f64) {
    sampler_profile(sampler).cfg
}

/// 推荐参数报告
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation<T> {
    pub min: T,
    pub max: T,
    pub default: T,
    pub recommendation: String,
}

pub fn steps_recommendation(sampler: &str) -> Recommendation<i64> {
    let (min, max, default) = recommended_steps_range(sampler);
    Recommendation {
        min,
        max,
        default,
        recommendation: format!("{sampler}: {min}-{max} steps, {default} recommended"),
    }
}

pub fn cfg_recommendation(sampler: &str) -> Recommendation<f64> {
    let (min, max, default) = recommended_cfg_range(sampler);
    Recommendation {
        min,
        max,
        default,
        recommendation: format!("{sampler}: CFG {min:.1}-{max:.1}, {default:.1} recommended"),
    }
}

/// 目录信息
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SamplerInfo {
    pub samplers: Vec<String>,
    pub schedulers: Vec<String>,
    pub sampler_count: usize,
    pub scheduler_count: usize,
}

/// 设置组合分析
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComboAnalysis {
    pub sampler: String,
    pub scheduler: String,
    pub steps: i64,
    pub cfg: f64,
    pub valid: bool,
    pub scheduler_suggestions: Vec<String>,
    pub scheduler_compatible: bool,
    pub steps_optimal: bool,
    pub cfg_optimal: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_sampler_settings() {
        let catalog = SamplerCatalog::builtin();
        assert!(catalog.validate("euler", "normal", 20, 7.0));
        assert!(catalog.validate("dpmpp_2m", "karras", 15, 8.5));
        assert!(catalog.validate("ddim", "ddim_uniform", 30, 6.0));

        assert!(!catalog.validate("invalid_sampler", "normal", 20, 7.0));
        assert!(!catalog.validate("euler", "invalid_scheduler", 20, 7.0));
        assert!(!catalog.validate("euler", "normal", 0, 7.0));
        assert!(!catalog.validate("euler", "normal", 1001, 7.0));
        assert!(!catalog.validate("euler", "normal", -5, 7.0));
        assert!(!catalog.validate("euler", "normal", 20, -1.0));
        assert!(!catalog.validate("euler", "normal", 20, 31.0));
    }

    #[test]
    fn test_sampler_combo() {
        let catalog = SamplerCatalog::builtin();
        assert_eq!(
            catalog.sampler_combo("dpmpp_2m", "karras", 25, 8.5).into_tuple(),
            ("dpmpp_2m".to_string(), "karras".to_string(), 25, 8.5)
        );
        assert_eq!(
            catalog.sampler_combo("invalid", "normal", 20, 7.0),
            SamplerSettings::default()
        );
        assert_eq!(
            catalog.sampler_combo("euler", "invalid", 20, 7.0),
            SamplerSettings::default()
        );
    }

    #[test]
    fn test_sampler_combo_clamps_values() {
        let catalog = SamplerCatalog::builtin();
        assert_eq!(catalog.sampler_combo("euler", "normal", 0, 7.0).steps, 1);
        assert_eq!(catalog.sampler_combo("euler", "normal", 1500, 7.0).steps, 1000);
        assert_eq!(catalog.sampler_combo("euler", "normal", 20, -5.0).cfg, 0.0);
        assert_eq!(catalog.sampler_combo("euler", "normal", 20, 50.0).cfg, 30.0);
        assert_eq!(catalog.sampler_combo("euler", "normal", 20, f64::NAN).cfg, 7.0);
    }

    #[test]
    fn test_scheduler_suggestions() {
        let catalog = SamplerCatalog::builtin();
        assert!(catalog.scheduler_suggestions("euler").contains(&"normal".to_string()));
        assert!(catalog
            .scheduler_suggestions("ddim")
            .contains(&"ddim_uniform".to_string()));

        let unknown = catalog.scheduler_suggestions("unknown_sampler");
        assert!(unknown.contains(&"normal".to_string()));
        assert!(unknown.contains(&"karras".to_string()));
    }

    #[test]
    fn test_suggestions_follow_catalog() {
        let catalog = SamplerCatalog {
            samplers: vec!["euler".to_string()],
            schedulers: vec!["simple".to_string()],
        };
        assert_eq!(catalog.scheduler_suggestions("euler"), vec!["simple".to_string()]);
    }

    #[test]
    fn test_recommended_ranges() {
        for sampler in BUILTIN_SAMPLERS {
            let (min, max, default) = recommended_steps_range(sampler);
            assert!(min > 0 && min <= default && default <= max, "{sampler}");

            let (min, max, default) = recommended_cfg_range(sampler);
            assert!(min >= 0.0 && min <= default && default <= max, "{sampler}");
        }

        assert_eq!(recommended_steps_range("unknown"), (10, 50, 20));
        assert_eq!(recommended_cfg_range("unknown"), (1.0, 20.0, 7.0));
    }

    #[test]
    fn test_recommendations_are_accepted() {
        let catalog = SamplerCatalog::builtin();
        for sampler in BUILTIN_SAMPLERS.iter().take(5) {
            let steps = steps_recommendation(sampler);
            let cfg = cfg_recommendation(sampler);
            for scheduler in catalog.scheduler_suggestions(sampler).iter().take(2) {
                let combo = catalog.sampler_combo(sampler, scheduler, steps.default, cfg.default);
                assert_eq!(
                    combo,
                    SamplerSettings::new(sampler, scheduler, steps.default, cfg.default)
                );
            }
        }
    }

    #[test]
    fn test_info_and_analysis() {
        let catalog = SamplerCatalog::builtin();
        let info = catalog.info();
        assert_eq!(info.sampler_count, BUILTIN_SAMPLERS.len());
        assert_eq!(info.scheduler_count, BUILTIN_SCHEDULERS.len());

        let analysis = catalog.combo_analysis("euler", "normal", 20, 7.0);
        assert!(analysis.valid);
        assert!(analysis.scheduler_compatible);
        assert!(analysis.steps_optimal);
        assert!(analysis.cfg_optimal);

        let analysis = catalog.combo_analysis("lcm", "karras", 30, 7.0);
        assert!(analysis.valid);
        assert!(!analysis.scheduler_compatible);
        assert!(!analysis.steps_optimal);
        assert!(!analysis.cfg_optimal);
    }
}
