use ndarray::Array3;
use rayon::prelude::*;
use tracing::debug;

use crate::{
    bbox::BoundaryBox,
    canvas::Canvas,
    compose::render_raster_map,
    config::RenderConfig,
    entity::MapData,
    groups::GroupRegistry,
    render::render_raster_masks,
    Result,
};

/// 一次渲染任务的结果
#[derive(Debug, Clone, PartialEq)]
pub struct RasterMap {
    /// 栅格覆盖的区域
    pub bbox: BoundaryBox,
    pub pixels_per_unit: f64,
    /// 形状为 `(3, height, width)`，通道依次为 areas、ways、nodes
    pub raster: Array3<u8>,
}

/// 渲染一个区域：建画布、渲染掩码、合成三通道栅格。
///
/// # 示例
///
/// ```rust
/// # fn main() -> map_raster::Result<()> {
/// use map_raster::{render_map, BoundaryBox, GroupRegistry, MapData, MapNode, PlanarPoint, RenderConfig};
///
/// let registry = GroupRegistry::osm();
/// let mut data = MapData::default();
/// data.nodes.push(MapNode::new(1, "tree", (5.5, 4.5)));
///
/// let bbox = BoundaryBox::new(PlanarPoint::new(0., 0.), PlanarPoint::new(10., 10.))?;
/// let config = RenderConfig { pixels_per_unit: 1., ..Default::default() };
/// let map = render_map(&data, bbox, &config, registry)?;
///
/// let tree = registry.index_of("tree").unwrap() as u8 + 1;
/// assert_eq!(map.raster[[2, 5, 5]], tree);
/// # Ok(())}
/// ```
#[tracing::instrument(skip(data, registry), fields(entities = data.len()))]
pub fn render_map(
    data: &MapData,
    bbox: BoundaryBox,
    config: &RenderConfig,
    registry: &GroupRegistry,
) -> Result<RasterMap> {
    config.validate()?;
    let canvas = Canvas::new(bbox, config.pixels_per_unit)?;
    let masks = render_raster_masks(
        &data.nodes,
        &data.lines,
        &data.areas,
        &canvas,
        registry,
        config,
    )?;
    let raster = render_raster_map(&masks)?;
    debug!(height = canvas.height(), width = canvas.width(), "栅格地图渲染完成");
    Ok(RasterMap {
        bbox,
        pixels_per_unit: config.pixels_per_unit,
        raster,
    })
}

/// 把同一份实体按多个区域并行渲染。
///
/// 每个区域是一个独立任务，各自拥有画布和掩码，只共享只读的实体和注册表。
/// 结果与`tiles`一一对应；任一任务失败则返回其中一个错误。
#[tracing::instrument(skip(data, tiles, registry), fields(tiles = tiles.len()))]
pub fn render_tiles(
    data: &MapData,
    tiles: &[BoundaryBox],
    config: &RenderConfig,
    registry: &GroupRegistry,
) -> Result<Vec<RasterMap>> {
    tiles
        .par_iter()
        .map(|bbox| render_map(data, *bbox, config, registry))
        .collect()
}
