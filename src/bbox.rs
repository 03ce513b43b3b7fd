use euclid::{Box2D, Point2D, Size2D};
use geo::Coord;

use crate::{RasterizeError, Result};

/// 局部平面坐标系（与包围盒使用相同的线性单位）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Planar {}

/// 归一化坐标系，包围盒映射到 `[0,1]×[0,1]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalized {}

/// 像素坐标系，第 0 行位于图像顶部，整数坐标位于像素中心
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pixel {}

/// 平面坐标系中的点
pub type PlanarPoint = Point2D<f64, Planar>;
/// 归一化坐标系中的点
pub type UnitPoint = Point2D<f64, Normalized>;
/// 像素坐标系中的点（连续值，尚未取整）
pub type PixelPoint = Point2D<f64, Pixel>;

/// 将geo坐标视为平面坐标系中的点
pub fn planar(coord: Coord<f64>) -> PlanarPoint {
    PlanarPoint::new(coord.x, coord.y)
}

/// 平面坐标系中的轴对齐包围盒，描述栅格图像所覆盖的区域。
///
/// 构造时即保证 `min.x < max.x` 且 `min.y < max.y`，之后不可变。
/// 多个画布渲染同一区域时可以共享同一个包围盒（它是 `Copy` 的）。
///
/// # 示例
///
/// ```rust
/// # fn main() -> map_raster::Result<()> {
/// use map_raster::{BoundaryBox, PlanarPoint};
///
/// let bbox = BoundaryBox::new(PlanarPoint::new(0., 0.), PlanarPoint::new(10., 20.))?;
/// let uv = bbox.normalize(PlanarPoint::new(5., 5.));
/// assert_eq!((uv.x, uv.y), (0.5, 0.25));
/// assert!(bbox.contains(PlanarPoint::new(10., 20.)));
/// # Ok(())}
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryBox {
    /// 左下角
    min: PlanarPoint,
    /// 右上角
    max: PlanarPoint,
}

impl BoundaryBox {
    /// 由两个角点创建包围盒
    ///
    /// # 错误
    /// * 任一坐标为NaN或无限时返回[RasterizeError::NonFiniteCoordinate]
    /// * 任一方向上的尺寸不为正时返回[RasterizeError::DegenerateRegion]
    pub fn new(min: PlanarPoint, max: PlanarPoint) -> Result<Self> {
        let all_finite = [min.x, min.y, max.x, max.y]
            .iter()
            .all(|value| value.is_finite());
        if !all_finite {
            return Err(RasterizeError::NonFiniteCoordinate);
        }

        let size = max - min;
        if size.x <= 0. || size.y <= 0. {
            return Err(RasterizeError::DegenerateRegion {
                width: size.x,
                height: size.y,
            });
        }
        Ok(BoundaryBox { min, max })
    }

    /// 左下角
    pub fn min(&self) -> PlanarPoint {
        self.min
    }

    /// 右上角
    pub fn max(&self) -> PlanarPoint {
        self.max
    }

    /// 包围盒尺寸，即 `max - min`
    pub fn size(&self) -> Size2D<f64, Planar> {
        (self.max - self.min).to_size()
    }

    /// 以euclid的`Box2D`形式返回
    pub fn to_box2d(&self) -> Box2D<f64, Planar> {
        Box2D::new(self.min, self.max)
    }

    /// 将平面坐标映射到 `[0,1]×[0,1]`，即 `(xy - min) / size`。
    ///
    /// 不做截断：区域外的点会落在 `[0,1]` 之外。
    pub fn normalize(&self, xy: PlanarPoint) -> UnitPoint {
        let size = self.size();
        UnitPoint::new(
            (xy.x - self.min.x) / size.width,
            (xy.y - self.min.y) / size.height,
        )
    }

    /// [BoundaryBox::normalize]的逆变换
    pub fn unnormalize(&self, uv: UnitPoint) -> PlanarPoint {
        let size = self.size();
        PlanarPoint::new(
            uv.x * size.width + self.min.x,
            uv.y * size.height + self.min.y,
        )
    }

    /// 点是否位于 `[min, max]` 内（两个方向均为闭区间）
    pub fn contains(&self, xy: PlanarPoint) -> bool {
        xy.x >= self.min.x && xy.x <= self.max.x && xy.y >= self.min.y && xy.y <= self.max.y
    }

    /// 将包围盒切分为边长为 `tile_size` 的网格子区域。
    ///
    /// 按行优先顺序返回：先沿x方向，再沿y方向（从`min.y`开始）。
    /// 最后一行/列的子区域会被裁剪到`max`，因此可能小于`tile_size`。
    ///
    /// # 错误
    /// `tile_size`不是有限正数，或子区域数量大到无法分配时返回[RasterizeError::InvalidScale]
    pub fn tiles(&self, tile_size: f64) -> Result<Vec<BoundaryBox>> {
        if !tile_size.is_finite() || tile_size <= 0. {
            return Err(RasterizeError::InvalidScale(tile_size));
        }
        let size = self.size();
        let count = |extent: f64| {
            let count = (extent / tile_size).ceil();
            // 超出usize的数量在转换时会饱和，必须先排除
            (count < usize::MAX as f64).then_some(count as usize)
        };
        let (Some(columns), Some(rows)) = (count(size.width), count(size.height)) else {
            return Err(RasterizeError::InvalidScale(tile_size));
        };
        let total = columns
            .checked_mul(rows)
            .ok_or(RasterizeError::InvalidScale(tile_size))?;

        let mut tiles = Vec::new();
        tiles
            .try_reserve_exact(total)
            .map_err(|_| RasterizeError::InvalidScale(tile_size))?;
        for row in 0..rows {
            let y0 = self.min.y + row as f64 * tile_size;
            let y1 = (y0 + tile_size).min(self.max.y);
            for column in 0..columns {
                let x0 = self.min.x + column as f64 * tile_size;
                let x1 = (x0 + tile_size).min(self.max.x);
                // 浮点误差可能产生零宽度的尾部子区域
                if x0 < x1 && y0 < y1 {
                    tiles.push(BoundaryBox::new(
                        PlanarPoint::new(x0, y0),
                        PlanarPoint::new(x1, y1),
                    )?);
                }
            }
        }
        Ok(tiles)
    }
}
