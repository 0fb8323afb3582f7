//! Project-wide totals.

use std::collections::BTreeMap;

use crate::error::EngineResult;
use crate::system::SystemLoadSummary;
use crate::totals::FinalTotals;
use crate::trace::{EntityType, TraceBuffer, TraceBuilder};

/// Sum the systems' final figures, metric by metric.
///
/// No correction is applied here; rooms are already corrected. Because the
/// inputs are already peak-selected per system, `cooling_sensible` is the sum
/// of system design loads, not the peak of a project-wide hourly sum.
pub fn aggregate_project(
    project_id: &str,
    systems: &[SystemLoadSummary],
) -> EngineResult<(FinalTotals, TraceBuffer)> {
    let totals: FinalTotals = systems.iter().map(|s| &s.totals).sum();
    totals.ensure_finite(EntityType::Project, project_id)?;

    let by_system: BTreeMap<&str, &FinalTotals> = systems
        .iter()
        .map(|s| (s.system_id.as_str(), &s.totals))
        .collect();
    let mut traces = TraceBuffer::new(EntityType::Project, 0, project_id);
    traces.record(
        TraceBuilder::new("project.totals")
            .input("system_totals", by_system)
            .reference(
                "system_ids",
                systems.iter().map(|s| s.system_id.as_str()).collect::<Vec<_>>(),
            ),
        totals,
    );
    Ok((totals, traces))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hl_core::LoadVector;

    fn system(id: &str, post: LoadVector) -> SystemLoadSummary {
        let (peak_hour, totals) = FinalTotals::from_post_correction(&post);
        SystemLoadSummary {
            system_id: id.to_string(),
            system_name: id.to_string(),
            room_ids: Vec::new(),
            post_correction: post,
            peak_hour,
            totals,
        }
    }

    #[test]
    fn sums_final_figures_not_vectors() {
        let s1 = system(
            "S1",
            LoadVector {
                cool_12: 100.0,
                cool_latent: 10.0,
                heat_sensible: 50.0,
                ..LoadVector::ZERO
            },
        );
        let s2 = system(
            "S2",
            LoadVector {
                cool_16: 80.0,
                cool_latent: 5.0,
                heat_sensible: 40.0,
                ..LoadVector::ZERO
            },
        );
        let (totals, traces) = aggregate_project("p1", &[s1, s2]).unwrap();
        assert_eq!(totals.cooling_sensible, 180.0);
        assert_eq!(totals.cooling_latent, 15.0);
        assert_eq!(totals.cooling_total, 195.0);
        assert_eq!(totals.heating_total, 90.0);

        let trace = &traces.traces()[0];
        assert_eq!(trace.formula_id, "project.totals");
        assert_eq!(trace.entity_type, EntityType::Project);
        assert_eq!(trace.entity_id, "p1");
    }

    #[test]
    fn empty_project_is_all_zero() {
        let (totals, traces) = aggregate_project("p1", &[]).unwrap();
        assert_eq!(totals, FinalTotals::default());
        assert_eq!(traces.traces().len(), 1);
    }
}
