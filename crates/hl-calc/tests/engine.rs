use hl_calc::{
    CalcError, CalcOptions, ConfigError, EntityType, MajorCellRegistry, UNASSIGNED_SYSTEM_ID,
    WarningCode, run_calculation,
};
use hl_core::{CoolingHour, LoadField, LoadVector};
use hl_project::{CorrectionFactorsDef, Project, RawRoomLoads, Room, System};

fn room(id: &str, area_m2: f64) -> Room {
    Room {
        id: id.to_string(),
        name: format!("Room {id}"),
        floor: Some("2F".to_string()),
        area_m2,
        ceiling_height_m: Some(2.6),
        design_condition_id: None,
        system_id: None,
    }
}

fn loads(id: &str, envelope: LoadVector, internal: LoadVector, ventilation: LoadVector) -> RawRoomLoads {
    RawRoomLoads {
        room_id: id.to_string(),
        envelope_loads: envelope,
        internal_loads: internal,
        ventilation_loads: ventilation,
        ..RawRoomLoads::default()
    }
}

fn hours(h9: f64, h12: f64, h14: f64, h16: f64, latent: f64) -> LoadVector {
    LoadVector {
        cool_9: h9,
        cool_12: h12,
        cool_14: h14,
        cool_16: h16,
        cool_latent: latent,
        heat_sensible: 0.0,
        heat_latent: 0.0,
    }
}

/// Two rooms in one system, one unassigned room.
fn office_floor() -> Project {
    let mut project = Project::new("Office floor");
    project.id = "p-office".to_string();
    project.rooms = vec![room("A", 40.0), room("B", 25.0), room("C", 12.0)];
    project.systems = vec![System {
        id: "S1".to_string(),
        name: "AHU-1".to_string(),
        room_ids: vec!["A".to_string(), "B".to_string()],
    }];
    project.room_loads = vec![
        loads(
            "A",
            hours(500.0, 1200.0, 900.0, 400.0, 150.0),
            hours(200.0, 200.0, 200.0, 200.0, 80.0),
            LoadVector {
                heat_sensible: 300.0,
                heat_latent: 40.0,
                ..hours(100.0, 100.0, 100.0, 100.0, 60.0)
            },
        ),
        loads(
            "B",
            hours(300.0, 600.0, 1100.0, 700.0, 50.0),
            hours(100.0, 100.0, 100.0, 100.0, 30.0),
            LoadVector {
                heat_sensible: 150.0,
                ..LoadVector::ZERO
            },
        ),
        loads(
            "C",
            hours(50.0, 80.0, 90.0, 60.0, 10.0),
            LoadVector::ZERO,
            LoadVector::ZERO,
        ),
    ];
    project
}

fn run(project: &Project) -> hl_calc::CalcReport {
    run_calculation(project, &MajorCellRegistry::standard(), &CalcOptions::default()).unwrap()
}

#[test]
fn room_stages_are_exact() {
    let report = run(&office_floor());
    let a = report.result.room("A").unwrap();
    assert_eq!(a.pre_correction.cool_12, 1200.0 + 200.0 + 100.0);
    assert_eq!(a.pre_correction.heat_sensible, 300.0);
    assert_eq!(a.post_correction, a.pre_correction);
    assert_eq!(a.peak_hour, CoolingHour::H12);
    assert_eq!(a.final_totals.cooling_sensible, 1500.0);
    assert_eq!(a.final_totals.cooling_latent, 290.0);
    assert_eq!(a.final_totals.heating_total, 340.0);
}

#[test]
fn system_sums_before_selecting_peak() {
    let report = run(&office_floor());
    let a = report.result.room("A").unwrap();
    let b = report.result.room("B").unwrap();
    let s1 = report.result.system("S1").unwrap();

    // A peaks at 12:00 (1500), B at 14:00 (1200).
    assert_eq!(a.peak_hour, CoolingHour::H12);
    assert_eq!(b.peak_hour, CoolingHour::H14);
    let naive = a.final_totals.cooling_sensible + b.final_totals.cooling_sensible;
    assert_eq!(naive, 2700.0);

    // Hour sums: 9=1200, 12=2200, 14=2400, 16=1500.
    assert_eq!(s1.peak_hour, CoolingHour::H14);
    assert_eq!(s1.totals.cooling_sensible, 2400.0);
    assert!(naive > s1.totals.cooling_sensible);
    assert_eq!(s1.room_ids, vec!["A".to_string(), "B".to_string()]);
}

#[test]
fn unassigned_room_gets_pseudo_system() {
    let report = run(&office_floor());
    let systems = &report.result.system_results;
    assert_eq!(systems.len(), 2);
    assert_eq!(systems[1].system_id, UNASSIGNED_SYSTEM_ID);
    assert_eq!(systems[1].system_name, UNASSIGNED_SYSTEM_ID);
    assert_eq!(systems[1].room_ids, vec!["C".to_string()]);
    let c = report.result.room("C").unwrap();
    assert_eq!(systems[1].totals, c.final_totals);
}

#[test]
fn project_totals_sum_system_figures() {
    let report = run(&office_floor());
    let expected: f64 = report
        .result
        .system_results
        .iter()
        .map(|s| s.totals.cooling_total)
        .sum();
    assert_eq!(report.result.totals.cooling_total, expected);
    assert_eq!(report.result.totals.heating_total, 340.0 + 150.0);
}

#[test]
fn correction_factors_scale_by_field() {
    let mut project = office_floor();
    project.metadata.correction_factors = CorrectionFactorsDef {
        cool_14: Some(1.1),
        heat_sensible: Some(1.15),
        ..CorrectionFactorsDef::default()
    };
    let report = run(&project);
    for room in &report.result.room_results {
        for field in LoadField::ALL {
            let factor = match field {
                LoadField::Cool14 => 1.1,
                LoadField::HeatSensible => 1.15,
                _ => 1.0,
            };
            assert_eq!(
                room.post_correction.get(field),
                room.pre_correction.get(field) * factor
            );
        }
    }
}

#[test]
fn partial_correction_table_aborts_run() {
    let mut project = office_floor();
    project.metadata.correction_factors = CorrectionFactorsDef {
        cool_12: None,
        ..CorrectionFactorsDef::default()
    };
    let err = run_calculation(&project, &MajorCellRegistry::standard(), &CalcOptions::default())
        .unwrap_err();
    match err {
        CalcError::Config(ConfigError::MissingCorrectionFactor { field }) => {
            assert_eq!(field, LoadField::Cool12)
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn non_finite_load_aborts_run() {
    let mut project = office_floor();
    project.room_loads[1].internal_loads.cool_9 = f64::INFINITY;
    let err = run_calculation(&project, &MajorCellRegistry::standard(), &CalcOptions::default())
        .unwrap_err();
    assert!(matches!(err, CalcError::NonFiniteLoad { ref room_id, .. } if room_id == "B"));
}

#[test]
fn repeated_runs_are_identical_in_both_modes() {
    let project = office_floor();
    let registry = MajorCellRegistry::standard();
    let parallel = run_calculation(&project, &registry, &CalcOptions { parallel: true }).unwrap();
    let again = run_calculation(&project, &registry, &CalcOptions { parallel: true }).unwrap();
    let sequential = run_calculation(&project, &registry, &CalcOptions { parallel: false }).unwrap();

    let bytes = |r: &hl_calc::CalcReport| serde_json::to_vec(&r.result).unwrap();
    assert_eq!(bytes(&parallel), bytes(&again));
    assert_eq!(bytes(&parallel), bytes(&sequential));
}

#[test]
fn traces_cover_every_stage() {
    let report = run(&office_floor());
    let a: Vec<&str> = report
        .result
        .traces_for(EntityType::Room, "A")
        .map(|t| t.formula_id.as_str())
        .collect();
    assert_eq!(
        a,
        vec!["room.pre_correction", "room.post_correction", "room.final_totals"]
    );
    let s1: Vec<&str> = report
        .result
        .traces_for(EntityType::System, "S1")
        .map(|t| t.formula_id.as_str())
        .collect();
    assert_eq!(s1, vec!["system.sum_post_correction", "system.final_totals"]);
    let last = report.result.traces.last().unwrap();
    assert_eq!(last.formula_id, "project.totals");
    assert_eq!(last.entity_id, "p-office");
}

#[test]
fn absent_system_cells_are_null() {
    let report = run(&office_floor());
    let cells = &report.result.major_cells;
    assert_eq!(cells.get("B12"), Some(2400.0));
    // Systems 2..5 do not exist in this project.
    for name in ["B13", "C14", "D15", "E16"] {
        assert!(cells.contains(name));
        assert_eq!(cells.get(name), None);
    }
    assert_eq!(cells.get("B17"), Some(90.0));

    let json = serde_json::to_value(&report.result).unwrap();
    assert!(json["major_cells"]["B16"].is_null());
}

#[test]
fn room_block_reads_last_room() {
    let report = run(&office_floor());
    // C is last in the room list.
    assert_eq!(report.result.major_cells.get("X48"), Some(80.0));
    assert_eq!(report.result.major_cells.get("AJ56"), None);

    let mut project = office_floor();
    project.rooms.rotate_left(1);
    assert_eq!(project.rooms[2].id, "A");
    let report = run(&project);
    let cells = &report.result.major_cells;
    assert_eq!(cells.get("X48"), Some(1200.0));
    assert_eq!(cells.get("X50"), Some(200.0));
    assert_eq!(cells.get("X52"), Some(100.0));
    assert_eq!(cells.get("X54"), Some(1500.0));
    assert_eq!(cells.get("X55"), Some(1500.0));
    assert_eq!(cells.get("N55"), Some(290.0));
    assert_eq!(cells.get("X56"), Some(1790.0));
    assert_eq!(cells.get("AL55"), Some(300.0));
    assert_eq!(cells.get("AJ56"), Some(340.0));
    // Envelope has no winter latent: shown blank.
    assert_eq!(cells.get("AJ48"), None);
}

#[test]
fn inconsistent_membership_is_reported_not_fatal() {
    let mut project = office_floor();
    project.systems.push(System {
        id: "S2".to_string(),
        name: "AHU-2".to_string(),
        room_ids: vec!["A".to_string(), "ghost".to_string()],
    });
    project.rooms[1].system_id = Some("S9".to_string());
    let report = run(&project);

    let codes: Vec<(WarningCode, &str)> = report
        .warnings
        .iter()
        .map(|w| (w.code, w.entity_id.as_str()))
        .collect();
    assert!(codes.contains(&(WarningCode::SystemRoomNotFound, "S2")));
    assert!(codes.contains(&(WarningCode::RoomInMultipleSystems, "A")));
    assert!(codes.contains(&(WarningCode::RoomSystemNotFound, "B")));

    // A is counted in both systems.
    let s2 = report.result.system("S2").unwrap();
    assert_eq!(s2.post_correction, report.result.room("A").unwrap().post_correction);
}

#[test]
fn custom_registry_with_unknown_metric_is_rejected() {
    let yaml = r#"
version: broken/1
cells:
  - name: Q1
    target: { kind: system, index: 1 }
    metric: cooling_max
"#;
    let err = MajorCellRegistry::from_yaml_str(yaml).unwrap_err();
    assert!(err.to_string().contains("Q1"));
    assert!(err.to_string().contains("cooling_max"));
}

#[test]
fn empty_project_yields_zero_totals_and_warning() {
    let project = Project::new("Nothing yet");
    let report = run(&project);
    assert!(report.result.room_results.is_empty());
    assert!(report.result.system_results.is_empty());
    assert_eq!(report.result.totals.cooling_total, 0.0);
    assert_eq!(report.warnings[0].code, WarningCode::EmptyProject);
    assert_eq!(report.result.traces.len(), 1);
}

#[test]
fn overflowing_totals_abort_run() {
    let big = f64::MAX * 0.75;

    // Finite slots whose sensible + latent sum overflows.
    let mut project = office_floor();
    project.room_loads[2].envelope_loads = hours(big, big, big, big, big);
    let err = run_calculation(&project, &MajorCellRegistry::standard(), &CalcOptions::default())
        .unwrap_err();
    assert!(matches!(
        err,
        CalcError::NonFiniteTotal { entity_type: EntityType::Room, ref entity_id, .. }
            if entity_id == "C"
    ));

    // Each room is finite; their system sum is not.
    let mut project = office_floor();
    project.room_loads[0].envelope_loads = hours(big, 0.0, 0.0, 0.0, 0.0);
    project.room_loads[1].envelope_loads = hours(big, 0.0, 0.0, 0.0, 0.0);
    let err = run_calculation(&project, &MajorCellRegistry::standard(), &CalcOptions::default())
        .unwrap_err();
    assert!(matches!(
        err,
        CalcError::NonFiniteTotal { entity_type: EntityType::System, ref entity_id, .. }
            if entity_id == "S1"
    ));

    // Each system is finite; the project heating sum is not.
    let mut project = office_floor();
    project.room_loads[0].ventilation_loads.heat_sensible = big;
    project.room_loads[2].ventilation_loads.heat_sensible = big;
    let err = run_calculation(&project, &MajorCellRegistry::standard(), &CalcOptions::default())
        .unwrap_err();
    match err {
        CalcError::NonFiniteTotal {
            entity_type,
            entity_id,
            metric,
            value,
        } => {
            assert_eq!(entity_type, EntityType::Project);
            assert_eq!(entity_id, "p-office");
            assert_eq!(metric, hl_calc::TotalsMetric::HeatingSensible);
            assert!(value.is_infinite());
        }
        other => panic!("unexpected error: {other}"),
    }
}
