use std::{
    collections::{HashMap, HashSet},
    fmt,
    sync::OnceLock,
};

use serde::{Deserialize, Serialize};

use crate::{RasterizeError, Result};

/// 建筑物所在的面状类别
pub const BUILDING: &str = "building";
/// 由建筑物面状要素派生出的轮廓线类别，属于线状类别族
pub const BUILDING_OUTLINE: &str = "building_outline";

const AREA_GROUPS: &[&str] = &[
    "building",
    "parking",
    "playground",
    "grass",
    "park",
    "forest",
    "water",
];

const WAY_GROUPS: &[&str] = &[
    "fence",
    "wall",
    "hedge",
    "kerb",
    "building_outline",
    "cycleway",
    "road",
    "path",
    "busway",
    "tree_row",
];

const NODE_GROUPS: &[&str] = &[
    "parking_entrance",
    "street_lamp",
    "junction",
    "traffic_signal",
    "stop_sign",
    "give_way_sign",
    "bus_stop",
    "stop_area",
    "crossing",
    "gate",
    "bollard",
    "gas_station",
    "bicycle_parking",
    "charging_station",
    "shop",
    "restaurant",
    "bar",
    "vending_machine",
    "pharmacy",
    "tree",
    "stone",
    "atm",
    "toilets",
    "water_fountain",
    "bench",
    "waste_basket",
    "post_box",
    "artwork",
    "recycling_station",
    "clock",
    "fountain",
];

/// 类别族：每个类别恰好属于其中一个
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    Areas,
    Ways,
    Nodes,
}

impl Family {
    /// 最终栅格中各通道的固定顺序
    pub const ALL: [Family; 3] = [Family::Areas, Family::Ways, Family::Nodes];
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Family::Areas => "areas",
            Family::Ways => "ways",
            Family::Nodes => "nodes",
        };
        f.write_str(name)
    }
}

/// JSON中的类别表
#[derive(Debug, Clone, Deserialize, Serialize)]
struct GroupTable {
    areas: Vec<String>,
    ways: Vec<String>,
    nodes: Vec<String>,
}

/// 类别注册表：所有类别名到三个互不相交的有序类别族的划分。
///
/// 顺序有语义：合成索引图时，同一像素上多个类别同时存在，排在前面的类别胜出。
/// 注册表在渲染期间只读，可以在多个并发任务间共享。
#[derive(Debug, Clone, PartialEq)]
pub struct GroupRegistry {
    areas: Vec<String>,
    ways: Vec<String>,
    nodes: Vec<String>,
    /// 类别名 -> (类别族, 族内位置)
    lookup: HashMap<String, (Family, usize)>,
}

impl GroupRegistry {
    /// 由三个有序类别列表创建注册表
    ///
    /// # 错误
    /// * 类别名在族内或跨族重复时返回[RasterizeError::DuplicateGroup]
    /// * 面状类别包含`building`而线状类别不含`building_outline`时返回[RasterizeError::MissingGroup]
    pub fn new<S: Into<String>>(
        areas: impl IntoIterator<Item = S>,
        ways: impl IntoIterator<Item = S>,
        nodes: impl IntoIterator<Item = S>,
    ) -> Result<Self> {
        let registry = Self::build(
            areas.into_iter().map(Into::into).collect(),
            ways.into_iter().map(Into::into).collect(),
            nodes.into_iter().map(Into::into).collect(),
        );

        let total = registry.areas.len() + registry.ways.len() + registry.nodes.len();
        if registry.lookup.len() != total {
            let mut seen = HashSet::with_capacity(total);
            let duplicate = registry
                .all()
                .find(|group| !seen.insert(*group))
                .unwrap_or_default();
            return Err(RasterizeError::DuplicateGroup(duplicate.to_string()));
        }

        if registry.family_of(BUILDING) == Some(Family::Areas)
            && registry.family_of(BUILDING_OUTLINE) != Some(Family::Ways)
        {
            return Err(RasterizeError::MissingGroup(BUILDING_OUTLINE.to_string()));
        }
        Ok(registry)
    }

    /// 不做校验地构建，查找表中重复的名字只保留第一次出现的位置
    fn build(areas: Vec<String>, ways: Vec<String>, nodes: Vec<String>) -> Self {
        let mut lookup = HashMap::new();
        for (family, groups) in [
            (Family::Areas, &areas),
            (Family::Ways, &ways),
            (Family::Nodes, &nodes),
        ] {
            for (index, group) in groups.iter().enumerate() {
                lookup.entry(group.clone()).or_insert((family, index));
            }
        }
        GroupRegistry {
            areas,
            ways,
            nodes,
            lookup,
        }
    }

    /// 内置的OpenStreetMap类别表，进程内只初始化一次
    pub fn osm() -> &'static GroupRegistry {
        static OSM: OnceLock<GroupRegistry> = OnceLock::new();
        OSM.get_or_init(|| {
            let owned = |groups: &[&str]| -> Vec<String> {
                groups.iter().map(|g| g.to_string()).collect()
            };
            Self::build(owned(AREA_GROUPS), owned(WAY_GROUPS), owned(NODE_GROUPS))
        })
    }

    /// 从JSON解析类别表，格式为 `{"areas": [...], "ways": [...], "nodes": [...]}`
    pub fn from_json(json: &str) -> Result<Self> {
        let table: GroupTable =
            serde_json::from_str(json).map_err(|e| RasterizeError::Config(e.to_string()))?;
        Self::new(table.areas, table.ways, table.nodes)
    }

    /// 某个类别族的有序类别列表
    pub fn groups(&self, family: Family) -> &[String] {
        match family {
            Family::Areas => &self.areas,
            Family::Ways => &self.ways,
            Family::Nodes => &self.nodes,
        }
    }

    pub fn areas(&self) -> &[String] {
        &self.areas
    }

    pub fn ways(&self) -> &[String] {
        &self.ways
    }

    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    /// 类别所属的类别族
    pub fn family_of(&self, group: &str) -> Option<Family> {
        self.lookup.get(group).map(|(family, _)| *family)
    }

    /// 类别在其所属类别族中的位置
    pub fn index_of(&self, group: &str) -> Option<usize> {
        self.lookup.get(group).map(|(_, index)| *index)
    }

    /// 类别在 `areas ++ ways ++ nodes` 中的全局位置
    pub(crate) fn slot(&self, group: &str) -> Option<usize> {
        self.lookup.get(group).map(|(family, index)| match family {
            Family::Areas => *index,
            Family::Ways => self.areas.len() + index,
            Family::Nodes => self.areas.len() + self.ways.len() + index,
        })
    }

    /// 按 `areas ++ ways ++ nodes` 的顺序遍历所有类别
    pub fn all(&self) -> impl Iterator<Item = &str> {
        self.areas
            .iter()
            .chain(&self.ways)
            .chain(&self.nodes)
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lookup.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lookup.is_empty()
    }
}

impl Default for GroupRegistry {
    fn default() -> Self {
        GroupRegistry::osm().clone()
    }
}
