//! 해석 결과의 텍스트 보고서 출력.

use crate::config::DisplayUnits;
use crate::membrane::{MembraneCatalog, StageSummary, SystemResult, TrainPass};
use crate::treatment::{ChemicalCatalog, DosingResult, ScalingAnalysis};
use crate::units::{convert_flow, from_celsius, from_psi, FlowUnit};
use crate::water::FeedWater;
use crate::water::tcf_table::TcfValue;

/// 압력/유량 표기를 선택된 단위로 맞춘다.
struct Fmt {
    units: DisplayUnits,
}

impl Fmt {
    fn p(&self, psi: f64) -> String {
        format!("{:.2} {}", from_psi(psi, self.units.pressure), self.units.pressure.symbol())
    }

    fn t(&self, celsius: f64) -> String {
        format!("{:.1} {}", from_celsius(celsius, self.units.temperature), self.units.temperature.symbol())
    }

    fn q(&self, m3h: f64) -> String {
        let v = convert_flow(m3h, FlowUnit::CubicMeterPerHour, self.units.flow);
        format!("{:.3} {}", v, self.units.flow.symbol())
    }
}

/// 솔버 결과 전체를 출력한다.
pub fn print_result(
    feed: &FeedWater,
    result: &SystemResult,
    units: DisplayUnits,
    show_elements: bool,
    show_trace: bool,
) {
    let f = Fmt { units };
    println!("\n=== RO 계열 설계 결과 ===");
    println!("급수: {}, pH {:.2}, {}", f.t(feed.temperature_c), feed.ph, f.q(feed.flow_m3h));
    println!("상태: {:?} ({})", result.status, result.status_message);
    println!(
        "반복: {}회 (최적 {}회차)",
        result.iterations, result.best_iteration
    );
    println!("급수 압력: {}", f.p(result.feed_pressure_psi));
    println!(
        "회수율: {:.2}% (목표 {:.2}%, 차이 {:+.3}%p)",
        result.recovery * 100.0,
        result.target_recovery * 100.0,
        result.recovery_gap_percent
    );
    println!("한계 회수율: {:.1}%", result.limiting_recovery * 100.0);
    println!(
        "급수 유량: {} (재순환 포함 {})",
        f.q(result.feed_flow_m3h),
        f.q(result.effective_feed_flow_m3h)
    );
    println!(
        "투과수: {}, TDS {:.1} mg/L",
        f.q(result.permeate_flow_m3h),
        result.permeate_tds_mg_l
    );
    println!(
        "농축수: {}, TDS {:.0} mg/L, 삼투압 {}",
        f.q(result.concentrate_flow_m3h),
        result.concentrate_tds_mg_l,
        f.p(result.concentrate_osmotic_pressure_psi)
    );
    println!("급수 삼투압: {}", f.p(result.feed_osmotic_pressure_psi));
    println!(
        "평균 플럭스 {:.2} LMH, 평균 NDP {}, 평균 엘리먼트 회수율 {:.2}%, 농도분극 {:.3}, TCF {:.3}",
        result.average_flux_lmh,
        f.p(result.average_ndp_psi),
        result.average_element_recovery * 100.0,
        result.concentration_polarization,
        result.tcf
    );

    print_stages(&result.stages, &f);
    if show_elements {
        print_elements(result, &f);
    }
    if show_trace {
        println!("\n-- 반복 이력 --");
        for rec in &result.trace {
            println!(
                "{:>4}  {:>12}  r={:.4}  Δ={:+.4}",
                rec.iteration,
                f.p(rec.pressure_psi),
                rec.recovery,
                rec.difference
            );
        }
    }
    if !result.design_warnings.is_empty() {
        println!("\n-- 설계 경고 --");
        for w in &result.design_warnings {
            println!("- {w}");
        }
    }
    print_scaling(&result.scaling);
    print_dosing(&result.dosing);
}

fn print_stages(stages: &[StageSummary], f: &Fmt) {
    println!("\n-- 단별 요약 --");
    for s in stages {
        println!(
            "{}단: 용기 {}개, 급수 {} @ {}, 투과 {} ({:.1} mg/L), 농축 {} ({:.0} mg/L), 압력손실 {}",
            s.stage + 1,
            s.active_vessels,
            f.q(s.feed_flow_m3h),
            f.p(s.feed_pressure_psi),
            f.q(s.permeate_flow_m3h),
            s.permeate_tds_mg_l,
            f.q(s.concentrate_flow_m3h),
            s.concentrate_tds_mg_l,
            f.p(s.pressure_drop_psi)
        );
    }
}

fn print_elements(result: &SystemResult, f: &Fmt) {
    println!("\n-- 엘리먼트 --");
    println!("단-용기-번호  모델            급수압력       NDP        플럭스   회수율   투과TDS");
    for e in &result.elements {
        println!(
            "{}-{}-{:<8} {:<15} {:>12} {:>12} {:>7.2} {:>7.2}% {:>8.1}",
            e.position.stage + 1,
            e.position.vessel + 1,
            e.position.element + 1,
            e.model,
            f.p(e.feed_pressure_psi),
            f.p(e.ndp_psi),
            e.flux_lmh,
            e.recovery * 100.0,
            e.permeate_tds_mg_l
        );
    }
}

fn print_scaling(scaling: &ScalingAnalysis) {
    println!("\n-- 농축수 스케일 (회수율 {:.1}%) --", scaling.recovery * 100.0);
    for s in &scaling.saturation {
        println!("{:<6} 포화도 {:.3}", s.compound.formula(), s.ratio);
    }
    match scaling.lsi {
        Some(lsi) => println!("LSI {lsi:+.2}"),
        None => println!("LSI 계산 불가 (칼슘/알칼리도 정보 없음)"),
    }
    for w in &scaling.warnings {
        println!("! {w}");
    }
}

fn print_dosing(dosing: &DosingResult) {
    if dosing.doses.is_empty() && dosing.recommendations.is_empty() {
        return;
    }
    println!("\n-- 약품 주입 --");
    for d in &dosing.doses {
        println!(
            "{:<12} {:>7.2} mg/L  {:>8.2} kg/day  {:>8.2} /day",
            d.chemical, d.dose_mg_l, d.consumption_kg_per_day, d.cost_per_day
        );
    }
    if !dosing.doses.is_empty() {
        println!("합계 비용: {:.2} /day", dosing.total_cost_per_day);
    }
    for r in &dosing.recommendations {
        println!("* {r}");
    }
}

/// 고정 압력 1회 통과 결과를 출력한다.
pub fn print_pass(pass: &TrainPass, feed_flow_m3h: f64, pressure_psi: f64, units: DisplayUnits) {
    let f = Fmt { units };
    println!("\n=== 고정 압력 운전점 ===");
    println!("급수 압력: {}", f.p(pressure_psi));
    let recovery = if feed_flow_m3h > 0.0 {
        pass.permeate_flow_m3h / feed_flow_m3h
    } else {
        0.0
    };
    println!(
        "투과수: {} ({:.1} mg/L), 계열 회수율 {:.2}%",
        f.q(pass.permeate_flow_m3h),
        pass.permeate_tds_mg_l,
        recovery * 100.0
    );
    println!(
        "농축수: {} ({:.0} mg/L) @ {}",
        f.q(pass.concentrate_flow_m3h),
        pass.concentrate_tds_mg_l,
        f.p(pass.concentrate_pressure_psi)
    );
    print_stages(&pass.stages, &f);
}

/// 막/약품 카탈로그를 출력한다.
pub fn print_catalog(membranes: &MembraneCatalog, chemicals: &ChemicalCatalog) {
    println!("\n=== 막 카탈로그 ===");
    println!("모델            구분       면적(m2)  A(LMH/psi)  제거율");
    for m in membranes.entries() {
        println!(
            "{:<15} {:<10} {:>8.1} {:>11.3} {:>7.2}%",
            m.model,
            format!("{:?}", m.class),
            m.area_m2,
            m.water_permeability_lmh_psi,
            m.rejection * 100.0
        );
    }
    println!("\n=== 약품 카탈로그 ===");
    for c in chemicals.entries() {
        println!(
            "{:<12} {:<14} 순도 {:>5.1}%  단가 {:.2}/kg",
            c.name,
            format!("{:?}", c.kind),
            c.purity * 100.0,
            c.price_per_kg
        );
    }
}

/// 온도 보정계수 두 가지(지수식, 표 보간)를 비교 출력한다.
pub fn print_tcf(temperature_c: f64, exponential: f64, table: TcfValue) {
    println!("\n=== 온도 보정계수 @ {temperature_c:.1} °C ===");
    println!("지수식(솔버 사용): {exponential:.4}");
    if table.clamped {
        println!(
            "표 보간: {:.4} (표 범위 밖, {:.1} °C 값으로 제한)",
            table.factor, table.source_temp_c
        );
    } else {
        println!("표 보간: {:.4}", table.factor);
    }
}
