use ndarray::{Array2, ArrayViewMut2};
use tracing::{debug, warn};

use crate::{
    canvas::Canvas,
    config::RenderConfig,
    entity::{EntityId, EntityKind, MapArea, MapLine, MapNode},
    groups::{GroupRegistry, BUILDING, BUILDING_OUTLINE},
    RasterizeError, Result,
};

/// 每个类别一个二值掩码（前景为非零像素），与画布形状相同。
///
/// 掩码按注册表中 `areas ++ ways ++ nodes` 的顺序存放，按类别名查找。
#[derive(Debug, Clone)]
pub struct GroupMasks<'r> {
    registry: &'r GroupRegistry,
    masks: Vec<Array2<u8>>,
    shape: (usize, usize),
}

impl<'r> GroupMasks<'r> {
    /// 为注册表中的每个类别分配一个空白掩码
    pub fn new(registry: &'r GroupRegistry, shape: (usize, usize)) -> Self {
        let masks = registry.all().map(|_| Array2::zeros(shape)).collect();
        GroupMasks {
            registry,
            masks,
            shape,
        }
    }

    pub fn registry(&self) -> &'r GroupRegistry {
        self.registry
    }

    /// 掩码形状 `(height, width)`
    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    pub fn get(&self, group: &str) -> Option<&Array2<u8>> {
        self.registry.slot(group).map(|slot| &self.masks[slot])
    }

    /// 某个类别掩码的可变视图；视图只能改写像素，不能改变掩码形状
    ///
    /// ```compile_fail
    /// use map_raster::{GroupMasks, GroupRegistry};
    ///
    /// let mut masks = GroupMasks::new(GroupRegistry::osm(), (4, 4));
    /// *masks.get_mut("road").unwrap() = ndarray::Array2::zeros((2, 2));
    /// ```
    pub fn get_mut(&mut self, group: &str) -> Option<ArrayViewMut2<'_, u8>> {
        self.registry
            .slot(group)
            .map(|slot| self.masks[slot].view_mut())
    }

    /// 按注册表顺序遍历 `(类别名, 掩码)`
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Array2<u8>)> {
        self.registry.all().zip(&self.masks)
    }
}

fn resolve(
    registry: &GroupRegistry,
    kind: EntityKind,
    id: EntityId,
    group: &str,
) -> Result<usize> {
    registry
        .slot(group)
        .ok_or_else(|| RasterizeError::UnknownGroup {
            kind,
            id,
            group: group.to_string(),
        })
}

fn skip(kind: EntityKind, id: EntityId, group: &str, reason: &str) {
    warn!(%kind, id, group, reason, "跳过几何退化的实体");
}

/// 把实体渲染为每个类别一个二值掩码。
///
/// 1. 先为所有实体解析类别；任何实体的类别不在注册表中都立即返回
///    [RasterizeError::UnknownGroup]，此时还没有绘制任何东西。
/// 2. 面状要素的外环和内环作为一个多多边形填充到其类别的掩码中。
///    类别为`building`时，还把每个环按开放折线描到`building_outline`掩码中。
/// 3. 线状要素按开放折线描到其类别的掩码中。
/// 4. 点状要素点亮其类别掩码中的一个像素，包围盒外的点被忽略。
///
/// 几何退化（点数不足、坐标非有限）的实体会被跳过并记录警告，不影响其余实体。
/// 每个类别有独立的掩码且绘制只会置位，所以实体的处理顺序不影响结果。
///
/// 画布的分辨率来自`canvas`本身，`config`只提供线宽。
#[tracing::instrument(
    skip_all,
    fields(
        width = canvas.width(),
        height = canvas.height(),
        nodes = nodes.len(),
        lines = lines.len(),
        areas = areas.len()
    )
)]
pub fn render_raster_masks<'r>(
    nodes: &[MapNode],
    lines: &[MapLine],
    areas: &[MapArea],
    canvas: &Canvas,
    registry: &'r GroupRegistry,
    config: &RenderConfig,
) -> Result<GroupMasks<'r>> {
    let area_slots = areas
        .iter()
        .map(|area| resolve(registry, EntityKind::Area, area.id, &area.group))
        .collect::<Result<Vec<_>>>()?;
    let line_slots = lines
        .iter()
        .map(|line| resolve(registry, EntityKind::Line, line.id, &line.group))
        .collect::<Result<Vec<_>>>()?;
    let node_slots = nodes
        .iter()
        .map(|node| resolve(registry, EntityKind::Node, node.id, &node.group))
        .collect::<Result<Vec<_>>>()?;
    let outline_slot = registry.slot(BUILDING_OUTLINE);

    let mut masks = GroupMasks::new(registry, canvas.shape());
    let mut skipped = 0usize;

    for (area, slot) in areas.iter().zip(area_slots) {
        if let Some(reason) = area.defect() {
            skip(EntityKind::Area, area.id, &area.group, reason);
            skipped += 1;
            continue;
        }
        canvas.draw_multipolygon(&mut masks.masks[slot], area.rings())?;
        if area.group == BUILDING {
            if let Some(outline_slot) = outline_slot {
                for ring in area.rings() {
                    canvas.draw_line(&mut masks.masks[outline_slot], ring, config.outline_width)?;
                }
            }
        }
    }

    for (line, slot) in lines.iter().zip(line_slots) {
        if let Some(reason) = line.defect() {
            skip(EntityKind::Line, line.id, &line.group, reason);
            skipped += 1;
            continue;
        }
        canvas.draw_line(&mut masks.masks[slot], &line.xy, config.line_width)?;
    }

    for (node, slot) in nodes.iter().zip(node_slots) {
        if let Some(reason) = node.defect() {
            skip(EntityKind::Node, node.id, &node.group, reason);
            skipped += 1;
            continue;
        }
        canvas.draw_cell(&mut masks.masks[slot], node.xy.0)?;
    }

    debug!(skipped, "类别掩码渲染完成");
    Ok(masks)
}
