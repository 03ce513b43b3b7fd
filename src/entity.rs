use std::fmt;

use geo::{coords_iter::CoordsIter, LineString, Point};
use serde::{Deserialize, Serialize};

/// 上游数据中的实体标识，对渲染本身不透明，只用于日志和错误信息
pub type EntityId = i64;

/// 实体种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Node,
    Line,
    Area,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Node => "node",
            EntityKind::Line => "line",
            EntityKind::Area => "area",
        };
        f.write_str(name)
    }
}

/// 点状要素，例如路灯、树木
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapNode {
    pub id: EntityId,
    pub group: String,
    pub xy: Point<f64>,
}

/// 线状要素（开放折线），例如道路、围栏
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapLine {
    pub id: EntityId,
    pub group: String,
    pub xy: LineString<f64>,
}

/// 面状要素，由若干外环和若干内环（孔洞）组成
///
/// 外环和内环会作为同一个多多边形一起填充，孔洞由奇偶填充规则实现。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapArea {
    pub id: EntityId,
    pub group: String,
    pub outers: Vec<LineString<f64>>,
    #[serde(default)]
    pub inners: Vec<LineString<f64>>,
}

/// 一次渲染任务的全部输入实体
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapData {
    #[serde(default)]
    pub nodes: Vec<MapNode>,
    #[serde(default)]
    pub lines: Vec<MapLine>,
    #[serde(default)]
    pub areas: Vec<MapArea>,
}

impl MapNode {
    pub fn new(id: EntityId, group: impl Into<String>, xy: impl Into<Point<f64>>) -> Self {
        MapNode {
            id,
            group: group.into(),
            xy: xy.into(),
        }
    }

    /// 几何是否可渲染；不可渲染时返回原因
    pub(crate) fn defect(&self) -> Option<&'static str> {
        if self.xy.x().is_finite() && self.xy.y().is_finite() {
            None
        } else {
            Some("坐标不是有限值")
        }
    }
}

impl MapLine {
    pub fn new(id: EntityId, group: impl Into<String>, xy: impl Into<LineString<f64>>) -> Self {
        MapLine {
            id,
            group: group.into(),
            xy: xy.into(),
        }
    }

    pub(crate) fn defect(&self) -> Option<&'static str> {
        if self.xy.coords_count() < 2 {
            Some("线串少于2个点")
        } else if !all_finite(&self.xy) {
            Some("坐标不是有限值")
        } else {
            None
        }
    }
}

impl MapArea {
    pub fn new(
        id: EntityId,
        group: impl Into<String>,
        outers: Vec<LineString<f64>>,
        inners: Vec<LineString<f64>>,
    ) -> Self {
        MapArea {
            id,
            group: group.into(),
            outers,
            inners,
        }
    }

    /// 依次返回所有外环和内环
    pub fn rings(&self) -> impl Iterator<Item = &LineString<f64>> {
        self.outers.iter().chain(&self.inners)
    }

    pub(crate) fn defect(&self) -> Option<&'static str> {
        if self.outers.is_empty() {
            Some("面状要素没有外环")
        } else if self.rings().any(|ring| ring.coords_count() < 3) {
            Some("环少于3个点")
        } else if !self.rings().all(all_finite) {
            Some("坐标不是有限值")
        } else {
            None
        }
    }
}

impl MapData {
    /// 从JSON解析实体列表
    pub fn from_json(json: &str) -> crate::Result<Self> {
        serde_json::from_str(json).map_err(|e| crate::RasterizeError::Config(e.to_string()))
    }

    pub fn len(&self) -> usize {
        self.nodes.len() + self.lines.len() + self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn all_finite(line_string: &LineString<f64>) -> bool {
    line_string
        .coords()
        .all(|coord| coord.x.is_finite() && coord.y.is_finite())
}
