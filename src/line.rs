use geo::Line;

use crate::Burner;

/// 沿线段逐像素行走，点亮线段经过的每个像素。
///
/// 坐标位于以像素角点为原点的连续坐标系中（像素`(i, j)`覆盖`[i, i+1)×[j, j+1)`）。
/// 超出缓冲区的部分被裁剪掉。
pub(crate) fn burn_segment(line: &Line<f64>, burner: &mut Burner<'_>) {
    let width = burner.width() as f64;
    let height = burner.height() as f64;

    // 整条线段都在缓冲区外
    if (line.start.y < 0. && line.end.y < 0.)
        || (line.start.y >= height && line.end.y >= height)
        || (line.start.x < 0. && line.end.x < 0.)
        || (line.start.x >= width && line.end.x >= width)
    {
        return;
    }

    // 统一从左向右处理
    let line = if line.start.x > line.end.x {
        Line::new(line.end, line.start)
    } else {
        *line
    };

    const THRESHOLD: f64 = 0.01;
    let is_vertical = (line.start.x.floor() == line.end.x.floor()) || line.dx().abs() < THRESHOLD;
    let is_horizontal = (line.start.y.floor() == line.end.y.floor()) || line.dy().abs() < THRESHOLD;

    if is_vertical {
        let (y_start, y_end) = if line.start.y > line.end.y {
            (line.end.y, line.start.y)
        } else {
            (line.start.y, line.end.y)
        };

        let ix = line.end.x.floor() as isize;
        if ix < 0 || ix >= (burner.width() as isize) {
            return;
        }

        // 负数转换为usize时饱和到0
        let last_row = burner.height() - 1;
        let y_start = (y_start.floor() as usize).min(last_row);
        let y_end = (y_end.floor() as usize).min(last_row);
        burner.fill_column(ix as usize, y_start, y_end);
    } else if is_horizontal {
        let iy = line.start.y.floor() as isize;
        if iy < 0 || iy >= (burner.height() as isize) {
            return;
        }

        let last_column = burner.width() - 1;
        let x_start = (line.start.x.floor() as usize).min(last_column);
        let x_end = (line.end.x.floor() as usize).min(last_column);
        burner.fill_span(x_start, x_end, iy as usize);
    } else {
        let slope = line.slope();
        let (mut x_start, mut y_start) = line.start.x_y();
        let (mut x_end, mut y_end) = line.end.x_y();

        // 在x方向裁剪
        if x_end > width {
            y_end -= (x_end - width) * slope;
            x_end = width;
        }
        if x_start < 0. {
            y_start += (0. - x_start) * slope;
            x_start = 0.;
        }

        // 在y方向裁剪
        if y_end > y_start {
            if y_start < 0. {
                x_start += -y_start / slope;
                y_start = 0.;
            }
            if y_end >= height {
                x_end -= (y_end - height) / slope;
            }
        } else {
            if y_start >= height {
                x_start += (height - y_start) / slope;
                y_start = height;
            }
            if y_end < 0. {
                x_end -= y_end / slope;
            }
        }

        while (x_start >= 0.) && (x_start < x_end) {
            let ix = x_start.floor() as isize;
            let iy = y_start.floor() as isize;

            if iy >= 0 && (iy as usize) < burner.height() && (ix as usize) < burner.width() {
                burner.fill_pixel(ix as usize, iy as usize);
            }

            // 先尝试走到下一列的左边界
            let mut x_step = (x_start + 1.).floor() - x_start;
            let mut y_step = x_step * slope;

            // 若会跨过当前行，则改为只走到行边界
            if ((y_start + y_step).floor() as isize) == iy {
                // 仍在当前行内
            } else if slope < 0. {
                const STEP_THRESHOLD: f64 = -0.000000001;
                y_step = ((iy as f64) - y_start).min(STEP_THRESHOLD);
                x_step = y_step / slope;
            } else {
                const STEP_THRESHOLD: f64 = 0.000000001;
                y_step = (((iy + 1) as f64) - y_start).max(STEP_THRESHOLD);
                x_step = y_step / slope;
            }

            x_start += x_step;
            y_start += y_step;
        }
    }
}
