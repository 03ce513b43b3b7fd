use serde::{Deserialize, Serialize};

use crate::{RasterizeError, Result};

fn default_pixels_per_unit() -> f64 {
    2.
}

fn default_width() -> u32 {
    1
}

/// 渲染参数
///
/// 所有字段都有默认值，JSON中可以只给出需要修改的部分：
///
/// ```rust
/// # fn main() -> map_raster::Result<()> {
/// use map_raster::RenderConfig;
///
/// let config = RenderConfig::from_json(r#"{"pixels_per_unit": 4.0}"#)?;
/// assert_eq!(config.pixels_per_unit, 4.);
/// assert_eq!(config.line_width, 1);
/// # Ok(())}
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenderConfig {
    /// 每单位长度的像素数
    #[serde(default = "default_pixels_per_unit")]
    pub pixels_per_unit: f64,
    /// 线状要素的线宽（像素）
    #[serde(default = "default_width")]
    pub line_width: u32,
    /// 建筑物轮廓的线宽（像素）
    #[serde(default = "default_width")]
    pub outline_width: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            pixels_per_unit: default_pixels_per_unit(),
            line_width: default_width(),
            outline_width: default_width(),
        }
    }
}

impl RenderConfig {
    /// 从JSON解析并校验
    pub fn from_json(json: &str) -> Result<Self> {
        let config: RenderConfig =
            serde_json::from_str(json).map_err(|e| RasterizeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.pixels_per_unit.is_finite() || self.pixels_per_unit <= 0. {
            return Err(RasterizeError::InvalidScale(self.pixels_per_unit));
        }
        if self.line_width == 0 || self.outline_width == 0 {
            return Err(RasterizeError::Config("线宽至少为1".into()));
        }
        Ok(())
    }
}
