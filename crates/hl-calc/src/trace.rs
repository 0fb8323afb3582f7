//! Audit trail: one immutable record per formula application.
//!
//! Work that may run on several threads records into a [`TraceBuffer`]
//! owned by one entity. Buffers carry the entity's position in its input
//! list, and [`TraceRecorder::absorb`] appends them in that order, so the
//! final sequence does not depend on which worker finished first.

use core::fmt;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Room,
    System,
    Project,
}

impl EntityType {
    pub const fn as_str(self) -> &'static str {
        match self {
            EntityType::Room => "room",
            EntityType::System => "system",
            EntityType::Project => "project",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type TraceMap = BTreeMap<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    /// Stable name of the computation, e.g. `room.post_correction`.
    pub formula_id: String,
    pub entity_type: EntityType,
    pub entity_id: String,
    /// Position among the records of the same entity.
    pub seq: u32,
    pub inputs: TraceMap,
    /// Ids of master data consulted.
    pub references: TraceMap,
    pub intermediates: TraceMap,
    pub output: Value,
}

/// Collects the named parts of a trace before it is recorded.
#[derive(Debug, Clone)]
pub struct TraceBuilder {
    formula_id: &'static str,
    inputs: TraceMap,
    references: TraceMap,
    intermediates: TraceMap,
}

impl TraceBuilder {
    pub fn new(formula_id: &'static str) -> Self {
        Self {
            formula_id,
            inputs: TraceMap::new(),
            references: TraceMap::new(),
            intermediates: TraceMap::new(),
        }
    }

    pub fn input(mut self, key: &str, value: impl Serialize) -> Self {
        self.inputs.insert(key.to_string(), to_value(value));
        self
    }

    pub fn reference(mut self, key: &str, value: impl Serialize) -> Self {
        self.references.insert(key.to_string(), to_value(value));
        self
    }

    pub fn intermediate(mut self, key: &str, value: impl Serialize) -> Self {
        self.intermediates.insert(key.to_string(), to_value(value));
        self
    }
}

fn to_value(value: impl Serialize) -> Value {
    // Only maps with non-string keys fail to convert; none are traced.
    serde_json::to_value(value).unwrap_or(Value::Null)
}

/// Per-entity trace buffer.
#[derive(Debug, Clone)]
pub struct TraceBuffer {
    entity_type: EntityType,
    entity_index: usize,
    entity_id: String,
    traces: Vec<Trace>,
}

impl TraceBuffer {
    pub fn new(entity_type: EntityType, entity_index: usize, entity_id: impl Into<String>) -> Self {
        Self {
            entity_type,
            entity_index,
            entity_id: entity_id.into(),
            traces: Vec::new(),
        }
    }

    /// Seal `builder` with its output and append it.
    pub fn record(&mut self, builder: TraceBuilder, output: impl Serialize) {
        let seq = self.traces.len() as u32;
        self.traces.push(Trace {
            formula_id: builder.formula_id.to_string(),
            entity_type: self.entity_type,
            entity_id: self.entity_id.clone(),
            seq,
            inputs: builder.inputs,
            references: builder.references,
            intermediates: builder.intermediates,
            output: to_value(output),
        });
    }

    pub fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    pub fn entity_index(&self) -> usize {
        self.entity_index
    }

    pub fn traces(&self) -> &[Trace] {
        &self.traces
    }
}

/// Append-only, ordered trace sequence for one run.
#[derive(Debug, Clone, Default)]
pub struct TraceRecorder {
    traces: Vec<Trace>,
}

impl TraceRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, trace: Trace) {
        self.traces.push(trace);
    }

    /// Append whole buffers in canonical order: entity type (rooms, systems,
    /// project), then position in the input list. Records keep their
    /// in-buffer order.
    pub fn absorb(&mut self, buffers: impl IntoIterator<Item = TraceBuffer>) {
        let mut buffers: Vec<TraceBuffer> = buffers.into_iter().collect();
        buffers.sort_by_key(|b| (b.entity_type, b.entity_index));
        for buffer in buffers {
            self.traces.extend(buffer.traces);
        }
    }

    pub fn all(&self) -> &[Trace] {
        &self.traces
    }

    pub fn len(&self) -> usize {
        self.traces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }

    pub fn into_traces(self) -> Vec<Trace> {
        self.traces
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(entity_type: EntityType, index: usize, id: &str, formulas: &[&'static str]) -> TraceBuffer {
        let mut buf = TraceBuffer::new(entity_type, index, id);
        for formula in formulas {
            buf.record(TraceBuilder::new(formula).input("x", index), index);
        }
        buf
    }

    #[test]
    fn buffer_numbers_records_in_order() {
        let buf = buffer(EntityType::Room, 0, "r1", &["a", "b", "c"]);
        let seqs: Vec<u32> = buf.traces().iter().map(|t| t.seq).collect();
        assert_eq!(seqs, vec![0, 1, 2]);
        assert!(buf.traces().iter().all(|t| t.entity_id == "r1"));
    }

    #[test]
    fn absorb_restores_canonical_order() {
        let shuffled = vec![
            buffer(EntityType::Project, 0, "p", &["project.totals"]),
            buffer(EntityType::Room, 2, "r3", &["room.a"]),
            buffer(EntityType::System, 0, "s1", &["system.a"]),
            buffer(EntityType::Room, 0, "r1", &["room.a", "room.b"]),
            buffer(EntityType::Room, 1, "r2", &["room.a"]),
        ];
        let mut recorder = TraceRecorder::new();
        recorder.absorb(shuffled);

        let order: Vec<(&str, &str)> = recorder
            .all()
            .iter()
            .map(|t| (t.entity_id.as_str(), t.formula_id.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("r1", "room.a"),
                ("r1", "room.b"),
                ("r2", "room.a"),
                ("r3", "room.a"),
                ("s1", "system.a"),
                ("p", "project.totals"),
            ]
        );
    }

    #[test]
    fn record_appends_after_absorbed_buffers() {
        let mut recorder = TraceRecorder::new();
        recorder.absorb([buffer(EntityType::Room, 0, "r1", &["room.a"])]);
        let extra = buffer(EntityType::Project, 0, "p", &["project.totals"]);
        recorder.record(extra.traces()[0].clone());
        assert_eq!(recorder.len(), 2);
        assert_eq!(recorder.all()[1].formula_id, "project.totals");
    }

    #[test]
    fn entity_type_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&EntityType::System).unwrap(),
            "\"system\""
        );
    }
}
