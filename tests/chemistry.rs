//! 수질 기본 물성(전도도, TCF, 삼투압, 이온강도, 포화도) 회귀 테스트.

use approx::assert_relative_eq;
use ro_design_toolbox::{
    water::{
        conductivity_to_tds, ionic_strength, langelier_index, osmotic_pressure,
        osmotic_pressure_from_tds, saturation_ratios, tcf_table::tcf_from_table,
        temperature_correction_factor, IonConcentrations, ScaleCompound,
    },
    RoError,
};

fn assert_close(label: &str, actual: f64, expected: f64, rel_tol: f64) {
    let denom = expected.abs().max(1e-12);
    let rel = (actual - expected).abs() / denom;
    assert!(
        rel <= rel_tol,
        "{label}: actual={actual}, expected={expected}, rel_err={rel}, tol={rel_tol}"
    );
}

fn ions(pairs: &[(&str, f64)]) -> IonConcentrations {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

#[test]
fn conductivity_branches_meet_at_breakpoint() {
    let below = conductivity_to_tds(7629.999).expect("low branch");
    let above = conductivity_to_tds(7630.001).expect("high branch");
    assert_close("EC 7630 연속성", above, below, 1e-3);
    assert_close("EC 7630 TDS", below, 3918.0, 2e-3);
}

#[test]
fn conductivity_increases_monotonically() {
    let mut prev = 0.0;
    for ec in [100.0, 1000.0, 5000.0, 7630.0, 10_000.0, 50_000.0] {
        let tds = conductivity_to_tds(ec).expect("tds");
        assert!(tds > prev, "EC {ec}: {tds} <= {prev}");
        prev = tds;
    }
}

#[test]
fn negative_conductivity_rejected() {
    assert!(matches!(
        conductivity_to_tds(-1.0),
        Err(RoError::InvalidInput(_))
    ));
}

#[test]
fn exponential_tcf_is_unity_at_reference() {
    let tcf = temperature_correction_factor(25.0).expect("tcf");
    assert_relative_eq!(tcf, 1.0, epsilon = 1e-12);
    assert!(temperature_correction_factor(15.0).expect("cold") < 1.0);
    assert!(temperature_correction_factor(35.0).expect("warm") > 1.0);
}

#[test]
fn exponential_tcf_rejects_absolute_zero() {
    assert!(matches!(
        temperature_correction_factor(-273.15),
        Err(RoError::InvalidInput(_))
    ));
    assert!(matches!(
        temperature_correction_factor(-300.0),
        Err(RoError::InvalidInput(_))
    ));
}

#[test]
fn table_tcf_differs_from_exponential_but_agrees_at_reference() {
    let table = tcf_from_table(25.0);
    assert_relative_eq!(table.factor, 1.0, epsilon = 1e-12);
    assert!(!table.clamped);
    let clamped = tcf_from_table(60.0);
    assert!(clamped.clamped);
}

#[test]
fn seawater_osmotic_pressure_from_tds() {
    let pi = osmotic_pressure_from_tds(35_000.0, 25.0).expect("pi");
    assert_close("35 g/L NaCl 삼투압", pi, 399.6, 5e-3);
}

#[test]
fn osmotic_pressure_ignores_unknown_species() {
    let known = ions(&[("Na", 1000.0), ("Cl", 1500.0)]);
    let mut with_unknown = known.clone();
    with_unknown.insert("Unobtainium".into(), 5000.0);
    let a = osmotic_pressure(&known, 25.0).expect("known");
    let b = osmotic_pressure(&with_unknown, 25.0).expect("unknown");
    assert_relative_eq!(a, b, epsilon = 1e-12);
    assert!(a > 0.0);
}

#[test]
fn osmotic_pressure_scales_with_temperature() {
    let feed = ions(&[("Na", 1000.0), ("Cl", 1500.0)]);
    let cold = osmotic_pressure(&feed, 5.0).expect("cold");
    let warm = osmotic_pressure(&feed, 35.0).expect("warm");
    assert_close("van't Hoff 비", warm / cold, 308.0 / 278.0, 1e-9);
}

#[test]
fn ionic_strength_of_divalent_ion() {
    let calcium = ions(&[("Ca", 40.078)]);
    assert_close("Ca 1 mmol/L", ionic_strength(&calcium), 0.002, 1e-9);
    let silica = ions(&[("SiO2", 100.0)]);
    assert_eq!(ionic_strength(&silica), 0.0);
}

#[test]
fn calcium_carbonate_supersaturates_at_high_recovery() {
    let feed = ions(&[("Ca", 400.0), ("HCO3", 150.0), ("Na", 500.0), ("Cl", 800.0)]);
    let sats = saturation_ratios(&feed, 0.9, 25.0, 8.0).expect("saturation");
    let caco3 = sats
        .iter()
        .find(|s| s.compound == ScaleCompound::CaCO3)
        .expect("CaCO3");
    assert!(caco3.is_supersaturated(), "CaCO3 ratio {}", caco3.ratio);
    assert!(caco3.ratio > 10.0);
}

#[test]
fn saturation_rejects_invalid_ph_and_recovery() {
    let feed = ions(&[("Ca", 100.0)]);
    assert!(matches!(
        saturation_ratios(&feed, 0.5, 25.0, 15.0),
        Err(RoError::InvalidInput(_))
    ));
    assert!(matches!(
        saturation_ratios(&feed, 1.0, 25.0, 7.0),
        Err(RoError::InvalidInput(_))
    ));
}

#[test]
fn lsi_undefined_without_alkalinity() {
    let feed = ions(&[("Ca", 100.0), ("Cl", 200.0)]);
    assert_eq!(langelier_index(&feed, 7.5, 25.0).expect("lsi"), None);
    let hard = ions(&[("Ca", 400.0), ("HCO3", 150.0)]);
    let lsi = langelier_index(&hard, 8.0, 25.0).expect("lsi").expect("defined");
    assert!(lsi > 0.0, "lsi={lsi}");
}
