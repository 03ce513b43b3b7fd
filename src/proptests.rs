use geo::LineString;
use proptest::prelude::*;

use crate::*;

fn unit_config() -> RenderConfig {
    RenderConfig {
        pixels_per_unit: 1.,
        ..Default::default()
    }
}

fn canvas(width: f64, height: f64, ppm: f64) -> Canvas {
    let bbox = BoundaryBox::new(PlanarPoint::new(0., 0.), PlanarPoint::new(width, height)).unwrap();
    Canvas::new(bbox, ppm).unwrap()
}

proptest! {
    #[test]
    fn pixel_round_trip(
        x0 in -1e4f64..1e4,
        y0 in -1e4f64..1e4,
        width in 1f64..500.,
        height in 1f64..500.,
        ppm in 0.1f64..8.,
        fx in 0f64..=1.,
        fy in 0f64..=1.,
    ) {
        let bbox = BoundaryBox::new(
            PlanarPoint::new(x0, y0),
            PlanarPoint::new(x0 + width, y0 + height),
        ).unwrap();
        let canvas = Canvas::new(bbox, ppm).unwrap();
        let xy = PlanarPoint::new(x0 + fx * width, y0 + fy * height);
        prop_assert!(bbox.contains(xy));

        let uv = canvas.to_pixel(xy);
        let back = canvas.to_planar(uv);
        let tolerance = 1e-9 * (1. + x0.abs().max(y0.abs()) + width.max(height));
        prop_assert!((back.x - xy.x).abs() <= tolerance, "{:?} != {:?}", back, xy);
        prop_assert!((back.y - xy.y).abs() <= tolerance, "{:?} != {:?}", back, xy);

        // 区域内的点映射到网格内（允许半个像素的边缘）
        prop_assert!(uv.x >= -0.5 - 1e-9 && uv.x <= canvas.width() as f64 - 0.5 + 1e-9);
        prop_assert!(uv.y >= -0.5 - 1e-9 && uv.y <= canvas.height() as f64 - 0.5 + 1e-9);
    }

    #[test]
    fn index_is_first_foreground_group(
        bits in prop::collection::vec(any::<bool>(), 3 * 4 * 5),
    ) {
        let registry = GroupRegistry::new(vec!["a", "b", "c"], vec![], vec![]).unwrap();
        let mut masks = GroupMasks::new(&registry, (4, 5));
        for (k, group) in ["a", "b", "c"].into_iter().enumerate() {
            let mut mask = masks.get_mut(group).unwrap();
            for ((row, col), value) in mask.indexed_iter_mut() {
                if bits[k * 20 + row * 5 + col] {
                    *value = MASK_FOREGROUND;
                }
            }
        }

        let idx = mask_to_idx::<u8, _>(&masks, registry.areas()).unwrap();
        for ((row, col), value) in idx.indexed_iter() {
            let expected = (0..3)
                .find(|k| bits[k * 20 + row * 5 + col])
                .map(|k| k as u8 + 1)
                .unwrap_or(0);
            prop_assert_eq!(*value, expected);
        }
    }

    #[test]
    fn way_channel_ignores_drawing_order(
        segments in prop::collection::vec(
            ((0f64..20., 0f64..20.), (0f64..20., 0f64..20.), any::<bool>()),
            1..12,
        ),
    ) {
        let registry = GroupRegistry::osm();
        let canvas = canvas(20., 20., 1.);
        let mut lines: Vec<MapLine> = segments
            .iter()
            .enumerate()
            .map(|(id, (start, end, is_road))| {
                let group = if *is_road { "road" } else { "path" };
                MapLine::new(id as i64, group, vec![*start, *end])
            })
            .collect();

        let forward = render_raster_masks(&[], &lines, &[], &canvas, registry, &unit_config()).unwrap();
        let forward = render_raster_map::<u8>(&forward).unwrap();
        lines.reverse();
        let backward = render_raster_masks(&[], &lines, &[], &canvas, registry, &unit_config()).unwrap();
        let backward = render_raster_map::<u8>(&backward).unwrap();
        prop_assert_eq!(&forward, &backward);

        // 背景像素上没有任何线状掩码为前景
        let masks = render_raster_masks(&[], &lines, &[], &canvas, registry, &unit_config()).unwrap();
        for ((row, col), value) in forward.index_axis(ndarray::Axis(0), 1).indexed_iter() {
            let covered = registry
                .ways()
                .iter()
                .any(|group| masks.get(group).unwrap()[[row, col]] > 0);
            prop_assert_eq!(*value == 0, !covered);
        }
    }

    #[test]
    fn polygon_drawing_is_idempotent(
        points in prop::collection::vec((-5f64..25., -5f64..25.), 3..8),
    ) {
        let canvas = canvas(20., 20., 1.);
        let ring = LineString::from(points);
        let mut once = canvas.blank();
        canvas.draw_polygon(&mut once, &ring).unwrap();
        let mut twice = once.clone();
        canvas.draw_polygon(&mut twice, &ring).unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn nodes_outside_region_are_ignored(
        x in prop_oneof![-100f64..-0.001, 10.001f64..100.],
        y in -100f64..100.,
    ) {
        let registry = GroupRegistry::osm();
        let canvas = canvas(10., 10., 1.);
        let nodes = [MapNode::new(1, "tree", (x, y)), MapNode::new(2, "bench", (y, x))];
        let masks = render_raster_masks(&nodes, &[], &[], &canvas, registry, &unit_config()).unwrap();
        let raster = render_raster_map::<u8>(&masks).unwrap();
        prop_assert!(raster.iter().all(|value| *value == 0));
    }
}
