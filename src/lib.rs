#![doc = include_str!("../README.md")]
use geo::{Line, LineString};
use ndarray::{s, Array2, ArrayViewMut2};
use thiserror::Error;

mod bbox;
pub use bbox::{planar, BoundaryBox, Normalized, Pixel, PixelPoint, Planar, PlanarPoint, UnitPoint};
mod canvas;
pub use canvas::{Canvas, GeoToPix, PixToGeo};
mod compose;
pub use compose::{mask_to_idx, render_raster_map};
mod config;
pub use config::RenderConfig;
mod entity;
pub use entity::{EntityId, EntityKind, MapArea, MapData, MapLine, MapNode};
mod groups;
pub use groups::{Family, GroupRegistry, BUILDING, BUILDING_OUTLINE};
mod line;
use line::burn_segment;
mod pipeline;
pub use pipeline::{render_map, render_tiles, RasterMap};
mod poly;
use poly::burn_rings;
mod render;
pub use render::{render_raster_masks, GroupMasks};
#[cfg(test)]
mod proptests;

/// 掩码中前景像素的取值；背景为0
pub const MASK_FOREGROUND: u8 = 255;

/// 本库的错误类型
#[derive(Error, Clone, Debug, PartialEq)]
pub enum RasterizeError {
    /// 几何图形或包围盒中至少有一个坐标是NaN或无限的
    #[error("提供的几何图形中至少有一个坐标是NaN或无限的")]
    NonFiniteCoordinate,

    /// 包围盒在某个方向上的尺寸不为正
    #[error("包围盒尺寸必须为正，实际为 {width} x {height}")]
    DegenerateRegion { width: f64, height: f64 },

    /// 缩放比例（每单位像素数）不是有限正数
    #[error("缩放比例必须是有限正数，实际为 {0}")]
    InvalidScale(f64),

    /// 类别名在类别注册表中重复出现
    #[error("类别 `{0}` 在类别注册表中重复出现")]
    DuplicateGroup(String),

    /// 缺少必需的类别
    #[error("缺少类别 `{0}`")]
    MissingGroup(String),

    /// 实体的类别不在类别注册表中
    #[error("{kind} {id} 的类别 `{group}` 不在类别注册表中")]
    UnknownGroup {
        kind: EntityKind,
        id: EntityId,
        group: String,
    },

    /// 类别数量超出了索引图整数类型的表示范围
    #[error("{groups} 个类别超出了索引类型的表示范围")]
    IndexOverflow { groups: usize },

    /// 配置无法解析或取值非法
    #[error("配置错误: {0}")]
    Config(String),
}

/// 本库使用的结果类型，使用[RasterizeError]作为错误类型。
pub type Result<T> = std::result::Result<T, RasterizeError>;

/// 把形状烧录进一个目标缓冲区。
///
/// 缓冲区由调用方以可变借用的方式传入，绘制结束即归还，
/// 因此同一个[Canvas]可以依次向任意多个掩码绘制。
/// 像素只会被置为前景，从不清除。
pub(crate) struct Burner<'a> {
    /// 目标缓冲区，形状为 (height, width)
    pixels: ArrayViewMut2<'a, u8>,
    /// 前景值
    foreground: u8,
    /// 画笔半径（像素），0表示单像素
    brush: usize,
}

impl<'a> Burner<'a> {
    pub(crate) fn new(pixels: &'a mut Array2<u8>, brush: usize) -> Self {
        Burner {
            pixels: pixels.view_mut(),
            foreground: MASK_FOREGROUND,
            brush,
        }
    }

    fn width(&self) -> usize {
        self.pixels.shape()[1]
    }

    fn height(&self) -> usize {
        self.pixels.shape()[0]
    }

    /// 以画笔点亮像素`(ix, iy)`；画笔超出缓冲区的部分被丢弃
    fn fill_pixel(&mut self, ix: usize, iy: usize) {
        debug_assert!(ix < self.width());
        debug_assert!(iy < self.height());
        if self.brush == 0 {
            self.pixels[[iy, ix]] = self.foreground;
            return;
        }

        let radius = self.brush as isize;
        let (width, height) = (self.width() as isize, self.height() as isize);
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                let (x, y) = (ix as isize + dx, iy as isize + dy);
                if dx * dx + dy * dy <= radius * radius
                    && (0..width).contains(&x)
                    && (0..height).contains(&y)
                {
                    self.pixels[[y as usize, x as usize]] = self.foreground;
                }
            }
        }
    }

    /// 填充一行中 `[x_start, x_end)` 的像素，不使用画笔
    ///
    /// 扫描线填充对写入顺序很敏感，按行写入时相邻像素在内存中也相邻。
    fn fill_horizontal_line(&mut self, x_start: usize, x_end: usize, y: usize) {
        self.pixels
            .slice_mut(s![y, x_start..x_end])
            .fill(self.foreground);
    }

    /// 以画笔填充一行中 `[x_start, x_end]` 的像素
    fn fill_span(&mut self, x_start: usize, x_end: usize, y: usize) {
        for x in x_start..=x_end {
            self.fill_pixel(x, y);
        }
    }

    /// 以画笔填充一列中 `[y_start, y_end]` 的像素
    fn fill_column(&mut self, x: usize, y_start: usize, y_end: usize) {
        for y in y_start..=y_end {
            self.fill_pixel(x, y);
        }
    }
}

/// 可以被烧录进[Burner]的形状，坐标必须已经位于像素角点坐标系中
pub(crate) trait Rasterize {
    fn rasterize(&self, burner: &mut Burner<'_>);
}

impl Rasterize for Line<f64> {
    fn rasterize(&self, burner: &mut Burner<'_>) {
        burn_segment(self, burner);
    }
}

/// 线串按开放折线描边，即使首尾相接也不填充
impl Rasterize for LineString<f64> {
    fn rasterize(&self, burner: &mut Burner<'_>) {
        self.lines().for_each(|line| line.rasterize(burner));
    }
}

/// 一组闭合环按奇偶规则一起填充
impl Rasterize for [LineString<f64>] {
    fn rasterize(&self, burner: &mut Burner<'_>) {
        burn_rings(self, burner);
    }
}
