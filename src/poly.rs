use geo::{winding_order::Winding, LineString, Point};
use itertools::Itertools;

use crate::{Burner, Rasterize};

/// 所有环的顶点所在的行
fn y_coordinates<'a>(rings: &'a [LineString<f64>]) -> impl Iterator<Item = isize> + 'a {
    rings
        .iter()
        .flat_map(|ring| ring.points().map(|point| point.y().floor() as isize))
}

/// 多边形的一条边
type PointPair = (Point<f64>, Point<f64>);

/// 把所有环统一为顺时针方向后拆成边
fn into_pointpairs(rings: &[LineString<f64>]) -> Vec<PointPair> {
    let num_pairs = rings.iter().map(|ring| ring.0.len().saturating_sub(1)).sum();
    let mut result = Vec::with_capacity(num_pairs);

    for ring in rings {
        if ring.is_cw() {
            result.extend(ring.points().tuple_windows::<PointPair>());
        } else {
            result.extend(ring.points().rev().tuple_windows::<PointPair>());
        }
    }

    result
}

/// 以奇偶规则一次性填充若干闭合环。
///
/// 所有环（外环和内环）参与同一次扫描：扫描线与各边的交点排序后两两配对填充，
/// 因此位于外环内部的内环会形成孔洞，与环的绕向无关。
/// 扫描线取在每行像素中心 `y + 0.5` 处，随后再沿每个环描一遍边界，
/// 使顶点和边所在的像素一定被点亮。
///
/// 做法沿用GDAL的GDALdllImageFilledPolygon。
pub(crate) fn burn_rings(rings: &[LineString<f64>], burner: &mut Burner<'_>) {
    debug_assert!(rings.iter().all(|ring| ring.is_closed()));

    let total_points: usize = rings.iter().map(|ring| ring.0.len()).sum();
    let (Some(min_y), Some(max_y)) = (y_coordinates(rings).min(), y_coordinates(rings).max())
    else {
        return;
    };

    let mut xs: Vec<isize> = Vec::with_capacity(total_points);

    let min_y = min_y.max(0);
    let max_y = max_y.min(burner.height() as isize - 1);
    let min_x = 0isize;
    let max_x = burner.width() as isize - 1;

    let cw_points = into_pointpairs(rings);

    for y in min_y..=max_y {
        let dy = 0.5 + (y as f64);

        for (ind1, ind2) in cw_points.iter() {
            let mut dy1 = ind1.y();
            let mut dy2 = ind2.y();

            if (dy1 < dy && dy2 < dy) || (dy1 > dy && dy2 > dy) {
                continue;
            }

            let (dx1, dx2) = if dy1 < dy2 {
                (ind1.x(), ind2.x())
            } else if dy1 > dy2 {
                std::mem::swap(&mut dy1, &mut dy2);
                (ind2.x(), ind1.x())
            } else {
                // 水平边
                if ind1.x() > ind2.x() {
                    let horizontal_x1 = ((ind2.x() + 0.5).floor() as isize).max(min_x);
                    let horizontal_x2 = ((ind1.x() + 0.5).floor() as isize).min(max_x + 1);
                    if horizontal_x1 < horizontal_x2 {
                        burner.fill_horizontal_line(
                            horizontal_x1 as usize,
                            horizontal_x2 as usize,
                            y as usize,
                        );
                    }
                }
                continue;
            };

            // 半开区间，顶点只计一次
            if dy < dy2 && dy >= dy1 {
                let intersect = (dy - dy1) * (dx2 - dx1) / (dy2 - dy1) + dx1;
                xs.push((intersect + 0.5).floor() as isize);
            }
        }

        xs.sort_unstable();
        for pair in xs.chunks_exact(2) {
            let x_start = pair[0].max(min_x);
            let x_end = pair[1].min(max_x + 1);
            if x_start < x_end {
                burner.fill_horizontal_line(x_start as usize, x_end as usize, y as usize);
            }
        }
        xs.clear();
    }

    rings.iter().for_each(|ring| ring.rasterize(burner));
}
