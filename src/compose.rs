use ndarray::{Array2, Array3, Axis, Zip};
use num_traits::{NumCast, PrimInt};
use tracing::debug;

use crate::{groups::Family, render::GroupMasks, RasterizeError, Result};

/// 把一个类别族的若干二值掩码合成为一张索引图。
///
/// 某个像素上`groups`中没有任何掩码为前景时取值0（背景）；否则取值为
/// `1 + k`，`k`是按`groups`顺序第一个在该像素为前景的类别的位置。
/// 即多个类别重叠时排在前面的类别胜出，与实体的绘制顺序无关。
///
/// # 错误
/// * `groups`中的类别没有对应掩码时返回[RasterizeError::MissingGroup]
/// * `groups.len()`超出`I`的表示范围时返回[RasterizeError::IndexOverflow]
///
/// # 示例
///
/// ```rust
/// # fn main() -> map_raster::Result<()> {
/// use map_raster::{mask_to_idx, GroupMasks, GroupRegistry};
///
/// let registry = GroupRegistry::osm();
/// let mut masks = GroupMasks::new(registry, (1, 3));
/// masks.get_mut("path").unwrap()[[0, 1]] = 255;
/// masks.get_mut("path").unwrap()[[0, 2]] = 255;
/// masks.get_mut("road").unwrap()[[0, 2]] = 255;
///
/// let idx = mask_to_idx::<u8, _>(&masks, &["road", "path"])?;
/// assert_eq!(idx.into_raw_vec_and_offset().0, vec![0, 2, 1]);
/// # Ok(())}
/// ```
pub fn mask_to_idx<I, S>(masks: &GroupMasks<'_>, groups: &[S]) -> Result<Array2<I>>
where
    I: PrimInt,
    S: AsRef<str>,
{
    let planes = groups
        .iter()
        .map(|group| {
            let group = group.as_ref();
            masks
                .get(group)
                .ok_or_else(|| RasterizeError::MissingGroup(group.to_string()))
        })
        .collect::<Result<Vec<_>>>()?;

    let labels = (1..=groups.len())
        .map(|label| {
            <I as NumCast>::from(label).ok_or(RasterizeError::IndexOverflow {
                groups: groups.len(),
            })
        })
        .collect::<Result<Vec<I>>>()?;

    let mut idx = Array2::from_elem(masks.shape(), I::zero());
    Zip::indexed(&mut idx).for_each(|pixel, value| {
        if let Some(first) = planes.iter().position(|plane| plane[pixel] > 0) {
            *value = labels[first];
        }
    });
    Ok(idx)
}

/// 把三个类别族各自的索引图按 (areas, ways, nodes) 的固定顺序叠成三通道栅格。
///
/// `building_outline`属于ways族，所以会参与线状通道的合成。
/// 返回数组形状为 `(3, height, width)`。
pub fn render_raster_map<I: PrimInt>(masks: &GroupMasks<'_>) -> Result<Array3<I>> {
    let registry = masks.registry();
    let (height, width) = masks.shape();
    let mut raster = Array3::from_elem((Family::ALL.len(), height, width), I::zero());
    for (channel, family) in Family::ALL.into_iter().enumerate() {
        let groups = registry.groups(family);
        let idx = mask_to_idx::<I, _>(masks, groups)?;
        debug!(%family, channel, groups = groups.len(), "类别族合成完成");
        raster.index_axis_mut(Axis(0), channel).assign(&idx);
    }
    Ok(raster)
}
