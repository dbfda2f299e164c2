//! 막 엘리먼트 물질수지 및 단/용기 집계 회귀 테스트.

use ro_design_toolbox::membrane::{
    element::{evaluate_element, PERMEATE_PRESSURE_PSI},
    train::{RecoveryHistory, ResolvedTrain, INTERSTAGE_LOSS_PSI},
    ElementFeed, ElementPosition, MembraneCatalog, MembraneClass, MembraneData,
    OperatingContext, Stage, Topology, Vessel,
};
use ro_design_toolbox::water::osmotic_pressure_from_tds;
use ro_design_toolbox::RoError;

fn assert_close(label: &str, actual: f64, expected: f64, rel_tol: f64) {
    let denom = expected.abs().max(1e-12);
    let rel = (actual - expected).abs() / denom;
    assert!(
        rel <= rel_tol,
        "{label}: actual={actual}, expected={expected}, rel_err={rel}, tol={rel_tol}"
    );
}

fn context(tds: f64) -> OperatingContext {
    OperatingContext {
        feed_osmotic_pressure_psi: osmotic_pressure_from_tds(tds, 25.0).expect("pi"),
        feed_tds_mg_l: tds,
        tcf: 1.0,
        fouling_factor: 1.0,
        flow_factor: 1.0,
    }
}

fn feed(flow: f64, tds: f64, pressure: f64) -> ElementFeed {
    ElementFeed {
        flow_m3h: flow,
        tds_mg_l: tds,
        pressure_psi: pressure,
    }
}

#[test]
fn element_conserves_water_and_salt_direction() {
    let catalog = MembraneCatalog::builtin();
    let membrane = catalog.lookup("SW30XLE-400i").expect("model");
    let state = evaluate_element(
        ElementPosition::default(),
        membrane,
        feed(10.0, 35_000.0, 800.0),
        &context(35_000.0),
        0.1,
    );
    assert_close(
        "유량 수지",
        state.permeate_flow_m3h + state.concentrate_flow_m3h,
        state.feed_flow_m3h,
        1e-12,
    );
    assert!(state.flux_lmh > 0.0);
    assert!(state.permeate_tds_mg_l >= 10.0);
    assert!(state.permeate_tds_mg_l <= 0.8 * 35_000.0);
    assert!(state.concentrate_tds_mg_l > 35_000.0);
    assert!(state.outlet_pressure_psi < state.feed_pressure_psi);
}

#[test]
fn element_recovery_capped_by_class() {
    let catalog = MembraneCatalog::builtin();
    for (model, cap) in [("SW30XLE-400i", 0.12), ("BW30-400", 0.15)] {
        let membrane = catalog.lookup(model).expect("model");
        assert_close("등급 상한", membrane.class.max_element_recovery(), cap, 1e-12);
        let state = evaluate_element(
            ElementPosition::default(),
            membrane,
            feed(1.0, 2000.0, 1400.0),
            &context(2000.0),
            0.1,
        );
        assert_close("회수율 클램프", state.recovery, cap, 1e-12);
        assert_close("투과 유량 재계산", state.permeate_flow_m3h, cap, 1e-12);
        let area = membrane.area_m2;
        assert_close("플럭스 재계산", state.flux_lmh, cap * 1000.0 / area, 1e-9);
    }
    assert_eq!(MembraneClass::SeaWater.max_element_recovery(), 0.12);
}

#[test]
fn pressure_below_osmotic_gives_no_flux() {
    let catalog = MembraneCatalog::builtin();
    let membrane = catalog.lookup("SW30XLE-400i").expect("model");
    let ctx = context(35_000.0);
    let state = evaluate_element(
        ElementPosition::default(),
        membrane,
        feed(10.0, 35_000.0, ctx.feed_osmotic_pressure_psi - 50.0),
        &ctx,
        0.0,
    );
    assert_eq!(state.ndp_psi, 0.0);
    assert_eq!(state.flux_lmh, 0.0);
    assert_eq!(state.permeate_flow_m3h, 0.0);
    assert_eq!(state.permeate_tds_mg_l, 0.0);
    assert_close("농축수 TDS 불변", state.concentrate_tds_mg_l, 35_000.0, 1e-12);
}

#[test]
fn zero_feed_flow_yields_idle_element() {
    let catalog = MembraneCatalog::builtin();
    let membrane = catalog.lookup("BW30-400").expect("model");
    let state = evaluate_element(
        ElementPosition::default(),
        membrane,
        feed(0.0, 2000.0, 200.0),
        &context(2000.0),
        0.1,
    );
    assert_eq!(state.permeate_flow_m3h, 0.0);
    assert_eq!(state.recovery, 0.0);
    assert!(state.permeate_tds_mg_l.is_finite());
    assert!(state.concentrate_tds_mg_l.is_finite());
}

#[test]
fn ndp_accounts_for_permeate_back_pressure() {
    let catalog = MembraneCatalog::builtin();
    let membrane = catalog.lookup("BW30-400").expect("model");
    let ctx = context(2000.0);
    let state = evaluate_element(
        ElementPosition::default(),
        membrane,
        feed(10.0, 2000.0, 150.0),
        &ctx,
        0.0,
    );
    let pi = ctx.feed_osmotic_pressure_psi;
    let expected = 150.0 - pi - PERMEATE_PRESSURE_PSI - pi * (1.0 - membrane.rejection);
    assert_close("NDP", state.ndp_psi, expected, 1e-9);
}

#[test]
fn permeate_rises_strictly_below_element_caps() {
    let catalog = MembraneCatalog::builtin();
    let topology = Topology::uniform(&[(2, 6), (1, 6)], "BW30-400");
    let train = ResolvedTrain::resolve(&topology, &catalog).expect("train");
    let ctx = context(2000.0);
    let mut prev = 0.0;
    for pressure in [60.0, 80.0, 100.0, 120.0, 140.0] {
        let mut history = RecoveryHistory::seeded(train.element_count(), 0.1);
        let pass = train.run_pass(feed(20.0, 2000.0, pressure), &ctx, &mut history);
        assert!(
            pass.elements.iter().all(|e| e.recovery < 0.15),
            "{pressure} psi: an element reached its cap"
        );
        assert!(
            pass.permeate_flow_m3h > prev,
            "{pressure} psi: {} <= {prev}",
            pass.permeate_flow_m3h
        );
        prev = pass.permeate_flow_m3h;
    }
}

#[test]
fn permeate_rises_monotonically_with_pressure() {
    let catalog = MembraneCatalog::builtin();
    let topology = Topology::uniform(&[(2, 6), (1, 6)], "BW30-400");
    let train = ResolvedTrain::resolve(&topology, &catalog).expect("train");
    let ctx = context(2000.0);
    let mut prev = 0.0;
    for pressure in [100.0, 150.0, 200.0, 250.0, 300.0] {
        let mut history = RecoveryHistory::seeded(train.element_count(), 0.1);
        let pass = train.run_pass(feed(20.0, 2000.0, pressure), &ctx, &mut history);
        assert!(
            pass.permeate_flow_m3h >= prev,
            "{pressure} psi: {} < {prev}",
            pass.permeate_flow_m3h
        );
        assert_close(
            "계열 유량 수지",
            pass.permeate_flow_m3h + pass.concentrate_flow_m3h,
            20.0,
            1e-9,
        );
        prev = pass.permeate_flow_m3h;
    }
    assert!(prev > 0.0);
}

#[test]
fn stages_split_flow_and_lose_interstage_pressure() {
    let catalog = MembraneCatalog::builtin();
    let topology = Topology::uniform(&[(2, 3), (1, 3)], "BW30-400");
    let train = ResolvedTrain::resolve(&topology, &catalog).expect("train");
    let mut history = RecoveryHistory::seeded(train.element_count(), 0.1);
    let pass = train.run_pass(feed(20.0, 2000.0, 200.0), &context(2000.0), &mut history);

    assert_eq!(pass.stages.len(), 2);
    let first = &pass.elements[0];
    assert_close("용기 균등 분배", first.feed_flow_m3h, 10.0, 1e-12);
    assert_close(
        "2단 유입 유량",
        pass.stages[1].feed_flow_m3h,
        pass.stages[0].concentrate_flow_m3h,
        1e-12,
    );
    assert_close(
        "단간 손실",
        pass.stages[1].feed_pressure_psi,
        pass.stages[0].min_outlet_pressure_psi - INTERSTAGE_LOSS_PSI,
        1e-9,
    );
}

#[test]
fn booster_adds_pressure_before_stage() {
    let catalog = MembraneCatalog::builtin();
    let mut topology = Topology::uniform(&[(2, 3), (1, 3)], "BW30-400");
    topology.stages[1].boost_psi = 40.0;
    let train = ResolvedTrain::resolve(&topology, &catalog).expect("train");
    let mut history = RecoveryHistory::seeded(train.element_count(), 0.1);
    let pass = train.run_pass(feed(20.0, 2000.0, 200.0), &context(2000.0), &mut history);
    assert_close(
        "승압",
        pass.stages[1].feed_pressure_psi,
        pass.stages[0].min_outlet_pressure_psi - INTERSTAGE_LOSS_PSI + 40.0,
        1e-9,
    );
}

#[test]
fn empty_vessels_are_skipped() {
    let catalog = MembraneCatalog::builtin();
    let topology = Topology {
        stages: vec![
            Stage {
                vessels: vec![Vessel::of("BW30-400", 4), Vessel { elements: vec![] }],
                boost_psi: 0.0,
            },
            Stage {
                vessels: vec![],
                boost_psi: 0.0,
            },
        ],
    };
    let train = ResolvedTrain::resolve(&topology, &catalog).expect("train");
    assert_eq!(train.element_count(), 4);
    let mut history = RecoveryHistory::seeded(4, 0.1);
    let pass = train.run_pass(feed(8.0, 2000.0, 200.0), &context(2000.0), &mut history);
    assert_eq!(pass.stages.len(), 1);
    assert_eq!(pass.stages[0].active_vessels, 1);
    assert_close("빈 용기 제외", pass.elements[0].feed_flow_m3h, 8.0, 1e-12);
}

#[test]
fn unknown_model_and_empty_topology_are_configuration_errors() {
    let catalog = MembraneCatalog::builtin();
    let unknown = Topology::uniform(&[(1, 1)], "NO-SUCH-MODEL");
    assert!(matches!(
        ResolvedTrain::resolve(&unknown, &catalog),
        Err(RoError::Configuration(_))
    ));
    let empty = Topology { stages: vec![] };
    assert!(matches!(
        ResolvedTrain::resolve(&empty, &catalog),
        Err(RoError::Configuration(_))
    ));
}

fn custom_membrane(edit: impl FnOnce(&mut MembraneData)) -> MembraneCatalog {
    let mut data = MembraneCatalog::builtin()
        .find("BW30-400")
        .cloned()
        .expect("builtin");
    data.model = "CUSTOM".into();
    edit(&mut data);
    MembraneCatalog::builtin().with_entry(data)
}

#[test]
fn invalid_membrane_data_is_configuration_error() {
    let topology = Topology::uniform(&[(1, 6)], "CUSTOM");
    let cases: [fn(&mut MembraneData); 6] = [
        |m| m.area_m2 = -37.2,
        |m| m.area_m2 = f64::NAN,
        |m| m.water_permeability_lmh_psi = 0.0,
        |m| m.salt_permeability_lmh = f64::INFINITY,
        |m| m.rejection = 1.5,
        |m| m.rejection = 0.0,
    ];
    for edit in cases {
        let catalog = custom_membrane(edit);
        assert!(matches!(
            ResolvedTrain::resolve(&topology, &catalog),
            Err(RoError::Configuration(_))
        ));
    }
    let valid = custom_membrane(|_| {});
    assert!(ResolvedTrain::resolve(&topology, &valid).is_ok());
}

#[test]
fn element_recovery_never_negative() {
    let catalog = MembraneCatalog::builtin();
    let mut membrane = catalog.lookup("BW30-400").expect("model").clone();
    membrane.area_m2 = -37.2;
    let state = evaluate_element(
        ElementPosition::default(),
        &membrane,
        feed(10.0, 2000.0, 200.0),
        &context(2000.0),
        0.1,
    );
    assert_eq!(state.recovery, 0.0);
    assert_eq!(state.permeate_flow_m3h, 0.0);
    assert_close("농축수 = 급수", state.concentrate_flow_m3h, 10.0, 1e-12);
}
