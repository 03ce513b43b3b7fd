use euclid::{Size2D, Transform2D};
use geo::{Coord, LineString};
use ndarray::Array2;

use crate::{
    bbox::{planar, BoundaryBox, Pixel, PixelPoint, Planar, PlanarPoint, UnitPoint},
    Burner, Rasterize, RasterizeError, Result,
};

/// 平面坐标到像素坐标的仿射变换
pub type GeoToPix = Transform2D<f64, Planar, Pixel>;
/// 像素坐标到平面坐标的仿射变换
pub type PixToGeo = Transform2D<f64, Pixel, Planar>;

/// 画布：把一个包围盒按给定分辨率映射到像素网格，并提供绘制图元。
///
/// 画布本身不持有像素缓冲区，每次绘制都把目标缓冲区显式传入，
/// 所以同一个画布可以依次绘制到任意多个掩码中。
///
/// # 坐标约定
///
/// 平面坐标系的y轴向上，而像素第0行位于图像顶部，所以映射时要翻转y轴：
///
/// ```text
/// uv = normalize(xy)
/// v  = 1 - uv.y
/// uv = uv * (size * pixels_per_unit) - 0.5
/// ```
///
/// 减去0.5使整数像素坐标落在像素中心。[Canvas::to_planar]是它的精确逆变换，
/// 需要把栅格坐标投影回平面坐标的使用者必须使用相同的约定。
///
/// # 示例
///
/// ```rust
/// # fn main() -> map_raster::Result<()> {
/// use map_raster::{BoundaryBox, Canvas, PlanarPoint};
///
/// let bbox = BoundaryBox::new(PlanarPoint::new(0., 0.), PlanarPoint::new(10., 10.))?;
/// let canvas = Canvas::new(bbox, 1.)?;
/// assert_eq!(canvas.shape(), (10, 10));
///
/// let uv = canvas.to_pixel(PlanarPoint::new(5.5, 4.5));
/// assert!((uv.x - 5.).abs() < 1e-9 && (uv.y - 5.).abs() < 1e-9);
///
/// let mut raster = canvas.blank();
/// canvas.draw_cell(&mut raster, (5.5, 4.5).into())?;
/// assert_eq!(raster[[5, 5]], 255);
/// # Ok(())}
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    bbox: BoundaryBox,
    /// 每单位长度的像素数
    ppm: f64,
    /// 连续的画布尺寸 `size * ppm`
    scaling: Size2D<f64, Pixel>,
    width: usize,
    height: usize,
}

impl Canvas {
    /// 创建画布，像素网格尺寸为 `ceil(size * pixels_per_unit)`
    ///
    /// # 错误
    /// `pixels_per_unit`不是有限正数、得到的网格为空，或网格像素数超出可寻址范围时返回错误
    pub fn new(bbox: BoundaryBox, pixels_per_unit: f64) -> Result<Self> {
        if !pixels_per_unit.is_finite() || pixels_per_unit <= 0. {
            return Err(RasterizeError::InvalidScale(pixels_per_unit));
        }

        let size = bbox.size();
        let scaling = Size2D::new(size.width * pixels_per_unit, size.height * pixels_per_unit);
        if !scaling.width.is_finite() || !scaling.height.is_finite() {
            return Err(RasterizeError::InvalidScale(pixels_per_unit));
        }

        let width = scaling.width.ceil() as usize;
        let height = scaling.height.ceil() as usize;
        if width == 0 || height == 0 {
            return Err(RasterizeError::DegenerateRegion {
                width: scaling.width,
                height: scaling.height,
            });
        }
        // ndarray要求元素总数不超过isize::MAX；转换饱和时乘积也必然越界
        match width.checked_mul(height) {
            Some(pixels) if pixels <= isize::MAX as usize => {}
            _ => return Err(RasterizeError::InvalidScale(pixels_per_unit)),
        }

        Ok(Canvas {
            bbox,
            ppm: pixels_per_unit,
            scaling,
            width,
            height,
        })
    }

    pub fn bbox(&self) -> &BoundaryBox {
        &self.bbox
    }

    pub fn pixels_per_unit(&self) -> f64 {
        self.ppm
    }

    /// 像素宽度
    pub fn width(&self) -> usize {
        self.width
    }

    /// 像素高度
    pub fn height(&self) -> usize {
        self.height
    }

    /// 缓冲区形状 `(height, width)`
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    /// 分配一个与画布同形状的空白缓冲区
    pub fn blank(&self) -> Array2<u8> {
        Array2::zeros(self.shape())
    }

    /// 把缓冲区清空；形状不符时重新分配
    pub fn clear(&self, raster: &mut Array2<u8>) {
        if raster.dim() == self.shape() {
            raster.fill(0);
        } else {
            *raster = self.blank();
        }
    }

    /// 平面坐标到连续像素坐标
    pub fn to_pixel(&self, xy: PlanarPoint) -> PixelPoint {
        let uv = self.bbox.normalize(xy);
        PixelPoint::new(
            uv.x * self.scaling.width - 0.5,
            (1. - uv.y) * self.scaling.height - 0.5,
        )
    }

    /// 连续像素坐标到平面坐标，[Canvas::to_pixel]的逆变换
    pub fn to_planar(&self, uv: PixelPoint) -> PlanarPoint {
        let unit = UnitPoint::new(
            (uv.x + 0.5) / self.scaling.width,
            1. - (uv.y + 0.5) / self.scaling.height,
        );
        self.bbox.unnormalize(unit)
    }

    /// 以仿射矩阵表示的[Canvas::to_pixel]
    pub fn geo_to_pix(&self) -> GeoToPix {
        let (sx, sy) = self.axis_scales();
        let (min, max) = (self.bbox.min(), self.bbox.max());
        Transform2D::new(sx, 0., 0., -sy, -min.x * sx - 0.5, max.y * sy - 0.5)
    }

    /// 以仿射矩阵表示的[Canvas::to_planar]
    pub fn pix_to_geo(&self) -> PixToGeo {
        let (sx, sy) = self.axis_scales();
        let (min, max) = (self.bbox.min(), self.bbox.max());
        Transform2D::new(
            1. / sx,
            0.,
            0.,
            -1. / sy,
            0.5 / sx + min.x,
            max.y - 0.5 / sy,
        )
    }

    fn axis_scales(&self) -> (f64, f64) {
        let size = self.bbox.size();
        (
            self.scaling.width / size.width,
            self.scaling.height / size.height,
        )
    }

    /// 把线串映射到像素网格：取整到最近的像素中心（平局取偶），
    /// 再平移0.5转换到扫描核使用的像素角点坐标系
    fn to_grid(&self, line_string: &LineString<f64>) -> Result<LineString<f64>> {
        line_string
            .coords()
            .map(|coord| {
                if !coord.x.is_finite() || !coord.y.is_finite() {
                    return Err(RasterizeError::NonFiniteCoordinate);
                }
                let uv = self.to_pixel(planar(*coord));
                Ok(Coord {
                    x: uv.x.round_ties_even() + 0.5,
                    y: uv.y.round_ties_even() + 0.5,
                })
            })
            .collect::<Result<Vec<_>>>()
            .map(LineString::new)
    }

    /// 填充单个闭合环
    pub fn draw_polygon(&self, raster: &mut Array2<u8>, ring: &LineString<f64>) -> Result<()> {
        self.draw_multipolygon(raster, std::iter::once(ring))
    }

    /// 一次性填充多个环。
    ///
    /// 同一面状要素的外环和内环一起传入，按奇偶规则填充，内环因此成为孔洞。
    /// 未闭合的环会被自动闭合；超出缓冲区的部分被裁剪。
    pub fn draw_multipolygon<'a>(
        &self,
        raster: &mut Array2<u8>,
        rings: impl IntoIterator<Item = &'a LineString<f64>>,
    ) -> Result<()> {
        debug_assert_eq!(raster.dim(), self.shape());
        let mut grid = rings
            .into_iter()
            .map(|ring| self.to_grid(ring))
            .collect::<Result<Vec<_>>>()?;
        grid.retain(|ring| !ring.0.is_empty());
        grid.iter_mut().for_each(LineString::close);

        grid[..].rasterize(&mut Burner::new(raster, 0));
        Ok(())
    }

    /// 描绘开放折线，不闭合也不填充。`width`为线宽（像素）。
    pub fn draw_line(
        &self,
        raster: &mut Array2<u8>,
        line: &LineString<f64>,
        width: u32,
    ) -> Result<()> {
        debug_assert_eq!(raster.dim(), self.shape());
        let grid = self.to_grid(line)?;
        grid.rasterize(&mut Burner::new(raster, width as usize / 2));
        Ok(())
    }

    /// 点亮离平面点最近的一个像素。
    ///
    /// 点位于包围盒之外时静默跳过；这是唯一在变换前做越界检查的图元。
    pub fn draw_cell(&self, raster: &mut Array2<u8>, xy: Coord<f64>) -> Result<()> {
        debug_assert_eq!(raster.dim(), self.shape());
        if !xy.x.is_finite() || !xy.y.is_finite() {
            return Err(RasterizeError::NonFiniteCoordinate);
        }
        let xy = planar(xy);
        if !self.bbox.contains(xy) {
            return Ok(());
        }

        let uv = self.to_pixel(xy);
        // 恰好落在包围盒边缘的点可能取整到网格外一格
        let column = (uv.x.round_ties_even().max(0.) as usize).min(self.width - 1);
        let row = (uv.y.round_ties_even().max(0.) as usize).min(self.height - 1);
        let (rows, columns) = raster.dim();
        if row < rows && column < columns {
            Burner::new(raster, 0).fill_pixel(column, row);
        }
        Ok(())
    }
}
