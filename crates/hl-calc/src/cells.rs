//! Major cell registry: named figures cross-checked against the reference
//! worksheet by hand.
//!
//! A registry is a versioned list of cell definitions. Each definition picks
//! an entity (a room, a system, the unassigned group or the project), a
//! metric, and how the value is displayed. Definitions are validated when the
//! registry is built; resolving a cell never fails, it yields `None` when the
//! entity is absent from the project at hand.

use core::fmt;
use std::collections::HashSet;

use hl_core::{LoadField, LoadVector, Real, round_half_up};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ConfigError;
use crate::room::RoomLoadSummary;
use crate::system::SystemLoadSummary;
use crate::totals::{FinalTotals, TotalsMetric};

pub const STANDARD_REGISTRY_VERSION: &str = "mlit-load-summary/v1";

/// Number of system rows in the standard table.
const STANDARD_SYSTEM_ROWS: usize = 5;

/// Which entity a cell reads from. Positions are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CellTarget {
    Project,
    /// n-th room of the project's room list.
    Room { index: usize },
    /// Last room of the project's room list.
    LastRoom,
    RoomId { id: String },
    /// n-th declared system; the unassigned group is not counted.
    System { index: usize },
    SystemId { id: String },
    /// The `__unassigned__` pseudo-system.
    Unassigned,
}

impl CellTarget {
    fn scope(&self) -> Scope {
        match self {
            CellTarget::Project => Scope::Project,
            CellTarget::Room { .. } | CellTarget::LastRoom | CellTarget::RoomId { .. } => {
                Scope::Room
            }
            CellTarget::System { .. } | CellTarget::SystemId { .. } | CellTarget::Unassigned => {
                Scope::System
            }
        }
    }
}

impl fmt::Display for CellTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellTarget::Project => write!(f, "project"),
            CellTarget::Room { index } => write!(f, "room #{index}"),
            CellTarget::LastRoom => write!(f, "last room"),
            CellTarget::RoomId { id } => write!(f, "room '{id}'"),
            CellTarget::System { index } => write!(f, "system #{index}"),
            CellTarget::SystemId { id } => write!(f, "system '{id}'"),
            CellTarget::Unassigned => write!(f, "unassigned rooms"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Room,
    System,
    Project,
}

/// Display rounding of a cell value. Engine vectors are never rounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellRounding {
    /// Exact engine value.
    #[default]
    None,
    /// Half-up to an integer.
    Result,
    /// Round each post-correction slot half-up first, derive the figure from
    /// the rounded slots, then round the result. This is how the worksheet's
    /// hour-total and per-area rows are built.
    Components,
}

/// A cell as written in a registry file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellDef {
    pub name: String,
    pub target: CellTarget,
    /// `cooling_sensible`, `post_correction.cool_12`, `per_area.cool_9_total`, ...
    pub metric: String,
    #[serde(default)]
    pub round: CellRounding,
    /// Show an exact zero as an empty cell. Per-area cells test the figure
    /// before it is divided by the floor area.
    #[serde(default)]
    pub blank_zero: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryDef {
    pub version: String,
    pub cells: Vec<CellDef>,
}

/// Load vector stage a `Load` metric reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStage {
    Envelope,
    Internal,
    Ventilation,
    PreCorrection,
    PostCorrection,
}

impl LoadStage {
    pub const ALL: [LoadStage; 5] = [
        LoadStage::Envelope,
        LoadStage::Internal,
        LoadStage::Ventilation,
        LoadStage::PreCorrection,
        LoadStage::PostCorrection,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            LoadStage::Envelope => "envelope",
            LoadStage::Internal => "internal",
            LoadStage::Ventilation => "ventilation",
            LoadStage::PreCorrection => "pre_correction",
            LoadStage::PostCorrection => "post_correction",
        }
    }
}

/// Parsed form of [`CellDef::metric`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellMetric {
    Total(TotalsMetric),
    Load(LoadStage, LoadField),
    PerArea(TotalsMetric),
}

impl CellMetric {
    pub fn parse(s: &str) -> Option<Self> {
        if let Ok(total) = s.parse::<TotalsMetric>() {
            return Some(CellMetric::Total(total));
        }
        let (head, tail) = s.split_once('.')?;
        if head == "per_area" {
            return tail.parse().ok().map(CellMetric::PerArea);
        }
        let stage = LoadStage::ALL.into_iter().find(|st| st.name() == head)?;
        let field = tail.parse::<LoadField>().ok()?;
        Some(CellMetric::Load(stage, field))
    }

    fn applicable(self, scope: Scope) -> bool {
        match (self, scope) {
            (CellMetric::Total(_), _) => true,
            (CellMetric::Load(_, _), Scope::Room) => true,
            (CellMetric::Load(stage, _), Scope::System) => stage == LoadStage::PostCorrection,
            (CellMetric::Load(_, _), Scope::Project) => false,
            (CellMetric::PerArea(_), scope) => scope == Scope::Room,
        }
    }
}

impl fmt::Display for CellMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellMetric::Total(m) => write!(f, "{m}"),
            CellMetric::Load(stage, field) => write!(f, "{}.{field}", stage.name()),
            CellMetric::PerArea(m) => write!(f, "per_area.{m}"),
        }
    }
}

#[derive(Debug, Clone)]
struct CompiledCell {
    metric: CellMetric,
}

/// Borrowed view of the figures cells are resolved against.
#[derive(Debug, Clone, Copy)]
pub struct CellSource<'a> {
    pub rooms: &'a [RoomLoadSummary],
    pub systems: &'a [SystemLoadSummary],
    pub totals: &'a FinalTotals,
}

enum Entity<'a> {
    Room(&'a RoomLoadSummary),
    System(&'a SystemLoadSummary),
    Project(&'a FinalTotals),
}

impl<'a> CellSource<'a> {
    fn entity(&self, target: &CellTarget) -> Option<Entity<'a>> {
        match target {
            CellTarget::Project => Some(Entity::Project(self.totals)),
            CellTarget::Room { index } => index
                .checked_sub(1)
                .and_then(|i| self.rooms.get(i))
                .map(Entity::Room),
            CellTarget::LastRoom => self.rooms.last().map(Entity::Room),
            CellTarget::RoomId { id } => self
                .rooms
                .iter()
                .find(|r| &r.room_id == id)
                .map(Entity::Room),
            CellTarget::System { index } => index
                .checked_sub(1)
                .and_then(|i| self.systems.iter().filter(|s| !s.is_unassigned()).nth(i))
                .map(Entity::System),
            CellTarget::SystemId { id } => self
                .systems
                .iter()
                .find(|s| &s.system_id == id)
                .map(Entity::System),
            CellTarget::Unassigned => self
                .systems
                .iter()
                .find(|s| s.is_unassigned())
                .map(Entity::System),
        }
    }
}

/// Versioned table of major cells.
#[derive(Debug, Clone)]
pub struct MajorCellRegistry {
    def: RegistryDef,
    compiled: Vec<CompiledCell>,
}

impl MajorCellRegistry {
    /// Validate and compile a registry definition.
    pub fn from_def(def: RegistryDef) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        let mut compiled = Vec::with_capacity(def.cells.len());
        for cell in &def.cells {
            if cell.name.trim().is_empty() {
                return Err(ConfigError::InvalidCellTarget {
                    cell: cell.name.clone(),
                    reason: "cell name is empty".to_string(),
                });
            }
            if !seen.insert(cell.name.as_str()) {
                return Err(ConfigError::DuplicateCell {
                    cell: cell.name.clone(),
                });
            }
            check_target(cell)?;
            let metric =
                CellMetric::parse(&cell.metric).ok_or_else(|| ConfigError::UnknownCellMetric {
                    cell: cell.name.clone(),
                    metric: cell.metric.clone(),
                })?;
            let scope = cell.target.scope();
            if !metric.applicable(scope) {
                return Err(ConfigError::MetricNotApplicable {
                    cell: cell.name.clone(),
                    metric: cell.metric.clone(),
                    target: cell.target.to_string(),
                });
            }
            if cell.round == CellRounding::Components && scope == Scope::Project {
                return Err(ConfigError::MetricNotApplicable {
                    cell: cell.name.clone(),
                    metric: format!("{} (round: components)", cell.metric),
                    target: cell.target.to_string(),
                });
            }
            compiled.push(CompiledCell { metric });
        }
        Ok(Self { def, compiled })
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let def: RegistryDef =
            serde_yaml::from_str(content).map_err(|e| ConfigError::RegistryParse {
                message: e.to_string(),
            })?;
        Self::from_def(def)
    }

    /// The built-in table mirroring the worksheet's summary blocks.
    ///
    /// Room block (last room of the list, as the worksheet is filled room by
    /// room and keeps the final one): rows 48 envelope, 50 internal, 52 outdoor air,
    /// 54 sum, 55 corrected, 56 sensible+latent per hour, 57 per floor area,
    /// in columns N (latent), R/X/AB/AF (9, 12, 14, 16 o'clock), AJ (heating
    /// latent; heating total on rows 56-57) and AL (heating sensible).
    /// System block: rows 12.. for systems 1-5, then the unassigned group and
    /// the project, columns B-E.
    pub fn standard() -> Self {
        let mut cells: Vec<(CellDef, CellMetric)> = Vec::new();
        let room = CellTarget::LastRoom;

        let columns = [
            ("N", LoadField::CoolLatent, true),
            ("R", LoadField::Cool9, false),
            ("X", LoadField::Cool12, false),
            ("AB", LoadField::Cool14, false),
            ("AF", LoadField::Cool16, false),
            ("AJ", LoadField::HeatLatent, true),
            ("AL", LoadField::HeatSensible, true),
        ];
        let stage_rows = [
            (48, LoadStage::Envelope, CellRounding::None),
            (50, LoadStage::Internal, CellRounding::None),
            (52, LoadStage::Ventilation, CellRounding::None),
            (54, LoadStage::PreCorrection, CellRounding::None),
            (55, LoadStage::PostCorrection, CellRounding::Result),
        ];
        for (row, stage, round) in stage_rows {
            for (col, field, blank_zero) in columns {
                let metric = CellMetric::Load(stage, field);
                cells.push((cell(col, row, &room, metric, round, blank_zero), metric));
            }
        }

        let hour_totals = [
            ("R", TotalsMetric::Cool9Total, false),
            ("X", TotalsMetric::Cool12Total, false),
            ("AB", TotalsMetric::Cool14Total, false),
            ("AF", TotalsMetric::Cool16Total, false),
            ("AJ", TotalsMetric::HeatingTotal, true),
        ];
        for (col, total, blank_zero) in hour_totals {
            let metric = CellMetric::Total(total);
            cells.push((
                cell(col, 56, &room, metric, CellRounding::Components, blank_zero),
                metric,
            ));
        }
        for (col, total, blank_zero) in hour_totals {
            let metric = CellMetric::PerArea(total);
            cells.push((
                cell(col, 57, &room, metric, CellRounding::Components, blank_zero),
                metric,
            ));
        }

        let mut summary_rows: Vec<CellTarget> = (1..=STANDARD_SYSTEM_ROWS)
            .map(|index| CellTarget::System { index })
            .collect();
        summary_rows.push(CellTarget::Unassigned);
        summary_rows.push(CellTarget::Project);
        let summary_columns = [
            ("B", TotalsMetric::CoolingSensible),
            ("C", TotalsMetric::CoolingLatent),
            ("D", TotalsMetric::CoolingTotal),
            ("E", TotalsMetric::HeatingTotal),
        ];
        for (offset, target) in summary_rows.iter().enumerate() {
            for (col, total) in summary_columns {
                let metric = CellMetric::Total(total);
                cells.push((
                    cell(col, 12 + offset, target, metric, CellRounding::Result, false),
                    metric,
                ));
            }
        }

        let (defs, compiled): (Vec<CellDef>, Vec<CompiledCell>) = cells
            .into_iter()
            .map(|(def, metric)| (def, CompiledCell { metric }))
            .unzip();
        Self {
            def: RegistryDef {
                version: STANDARD_REGISTRY_VERSION.to_string(),
                cells: defs,
            },
            compiled,
        }
    }

    pub fn version(&self) -> &str {
        &self.def.version
    }

    pub fn to_def(&self) -> RegistryDef {
        self.def.clone()
    }

    pub fn len(&self) -> usize {
        self.def.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.def.cells.is_empty()
    }

    /// Cell names in table order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.def.cells.iter().map(|c| c.name.as_str())
    }

    pub fn definition(&self, name: &str) -> Option<&CellDef> {
        self.def.cells.iter().find(|c| c.name == name)
    }

    /// Value of one cell, or `None` when the cell is unknown, its entity is
    /// absent from this project, or the value is blanked.
    pub fn resolve(&self, name: &str, source: CellSource<'_>) -> Option<Real> {
        let index = self.def.cells.iter().position(|c| c.name == name)?;
        self.resolve_at(index, source)
    }

    pub fn resolve_all(&self, source: CellSource<'_>) -> MajorCells {
        MajorCells(
            self.def
                .cells
                .iter()
                .enumerate()
                .map(|(i, c)| (c.name.clone(), self.resolve_at(i, source)))
                .collect(),
        )
    }

    fn resolve_at(&self, index: usize, source: CellSource<'_>) -> Option<Real> {
        let def = &self.def.cells[index];
        let metric = self.compiled[index].metric;
        let entity = source.entity(&def.target)?;
        let components = def.round == CellRounding::Components;

        let value = match (metric, entity) {
            (CellMetric::Total(m), Entity::Project(totals)) => totals.get(m),
            (CellMetric::Total(m), Entity::Room(room)) => {
                derived_totals(&room.post_correction, &room.final_totals, components).get(m)
            }
            (CellMetric::Total(m), Entity::System(system)) => {
                derived_totals(&system.post_correction, &system.totals, components).get(m)
            }
            (CellMetric::Load(stage, field), Entity::Room(room)) => {
                stage_vector(room, stage).get(field)
            }
            (CellMetric::Load(_, field), Entity::System(system)) => {
                system.post_correction.get(field)
            }
            (CellMetric::PerArea(m), Entity::Room(room)) => {
                if room.area_m2 <= 0.0 {
                    return None;
                }
                let figure =
                    derived_totals(&room.post_correction, &room.final_totals, components).get(m);
                if def.blank_zero && figure == 0.0 {
                    return None;
                }
                figure / room.area_m2
            }
            // Rejected when the registry was built.
            _ => return None,
        };

        let value = match def.round {
            CellRounding::None => value,
            CellRounding::Result | CellRounding::Components => round_half_up(value, 0),
        };
        if def.blank_zero && value == 0.0 && !matches!(metric, CellMetric::PerArea(_)) {
            return None;
        }
        Some(value)
    }
}

impl Default for MajorCellRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

fn cell(
    column: &str,
    row: usize,
    target: &CellTarget,
    metric: CellMetric,
    round: CellRounding,
    blank_zero: bool,
) -> CellDef {
    CellDef {
        name: format!("{column}{row}"),
        target: target.clone(),
        metric: metric.to_string(),
        round,
        blank_zero,
    }
}

fn check_target(cell: &CellDef) -> Result<(), ConfigError> {
    let reason = match &cell.target {
        CellTarget::Room { index: 0 } | CellTarget::System { index: 0 } => {
            "positions start at 1"
        }
        CellTarget::RoomId { id } | CellTarget::SystemId { id } if id.trim().is_empty() => {
            "id is empty"
        }
        _ => return Ok(()),
    };
    Err(ConfigError::InvalidCellTarget {
        cell: cell.name.clone(),
        reason: reason.to_string(),
    })
}

fn stage_vector(room: &RoomLoadSummary, stage: LoadStage) -> &LoadVector {
    match stage {
        LoadStage::Envelope => &room.envelope_loads,
        LoadStage::Internal => &room.internal_loads,
        LoadStage::Ventilation => &room.ventilation_loads,
        LoadStage::PreCorrection => &room.pre_correction,
        LoadStage::PostCorrection => &room.post_correction,
    }
}

fn derived_totals(post: &LoadVector, exact: &FinalTotals, components: bool) -> FinalTotals {
    if components {
        let rounded = LoadVector::from_fn(|f| round_half_up(post.get(f), 0));
        FinalTotals::from_post_correction(&rounded).1
    } else {
        *exact
    }
}

/// Resolved major cells in registry order. Serializes as a JSON object.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MajorCells(pub Vec<(String, Option<Real>)>);

impl MajorCells {
    pub fn get(&self, name: &str) -> Option<Real> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| *v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|(n, _)| n == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<Real>)> + '_ {
        self.0.iter().map(|(n, v)| (n.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for MajorCells {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for MajorCells {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CellsVisitor;

        impl<'de> Visitor<'de> for CellsVisitor {
            type Value = MajorCells;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of cell name to number or null")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<MajorCells, A::Error> {
                let mut cells = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, value)) = access.next_entry::<String, Option<Real>>()? {
                    cells.push((name, value));
                }
                Ok(MajorCells(cells))
            }
        }

        deserializer.deserialize_map(CellsVisitor)
    }
}
