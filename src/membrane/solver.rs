//! 목표 회수율을 만족하는 급수 압력을 찾는 외부 반복 솔버.
//!
//! 상태: Initializing → Iterating → (Converged | Exhausted | Failed)
//!
//! 매 반복마다 현재 압력으로 계열을 1회 통과 계산하고, 달성 회수율이 목표보다 낮으면
//! 압력을 올리고 높으면 내린다. 압력 보폭은 매 반복 1.2로 나누되 처음 10회 동안은
//! 5 psi 아래로 내려가지 않는다. 압력은 [1.1·π, 1500 psi] 로 제한한다.
//! 결과는 수렴 여부와 관계없이 목표와의 차이가 가장 작았던 반복을 쓴다.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use super::catalog::{MembraneCatalog, MembraneClass};
use super::element::{ElementFeed, ElementState, OperatingContext};
use super::train::{RecoveryHistory, ResolvedTrain, StageSummary, Topology, TrainPass};
use crate::error::{Result, RoError};
use crate::treatment::{post_process, ChemicalCatalog, DosingOptions, DosingResult, ScalingAnalysis};
use crate::water::{temperature_correction_factor, FeedWater};

/// 급수 압력 상한 [psi]
pub const MAX_FEED_PRESSURE_PSI: f64 = 1500.0;
/// 급수 압력 하한 = 이 배수 × 급수 삼투압
pub const MIN_PRESSURE_OSMOTIC_RATIO: f64 = 1.1;
/// 우연한 초기 수렴을 막기 위한 최소 반복 횟수
pub const MIN_ITERATIONS: usize = 5;
const STEP_SHRINK: f64 = 1.2;
const MIN_EARLY_STEP_PSI: f64 = 5.0;
const EARLY_ITERATIONS: usize = 10;

/// 솔버 설정.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverOptions {
    pub max_iterations: usize,
    /// 수렴 허용오차 [%p]
    pub tolerance_percent: f64,
    /// 투과수 재순환 비율 [%]
    pub recycle_percent: f64,
    pub flow_factor: f64,
    pub fouling_factor: f64,
    /// 벽시계 제한 [ms]. 초과 시 반복 예산 소진과 같이 처리한다.
    pub time_limit_ms: Option<u64>,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance_percent: 0.1,
            recycle_percent: 0.0,
            flow_factor: 1.0,
            fouling_factor: 1.0,
            time_limit_ms: None,
        }
    }
}

/// 해석 입력 전체.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignInput {
    pub feed: FeedWater,
    pub topology: Topology,
    /// 목표 계통 회수율(0~1)
    pub target_recovery: f64,
    #[serde(default)]
    pub options: SolverOptions,
    #[serde(default)]
    pub dosing: DosingOptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolverState {
    Initializing,
    Iterating,
    Converged,
    Exhausted,
    Failed,
}

/// 해석 종료 상태. 미수렴도 정상 결과이다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveStatus {
    Converged,
    Exhausted,
}

/// 반복 1회 기록.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IterationRecord {
    pub iteration: usize,
    pub pressure_psi: f64,
    pub recovery: f64,
    /// |달성 − 목표| (분율)
    pub difference: f64,
}

#[derive(Debug, Clone)]
struct Snapshot {
    iteration: usize,
    pressure_psi: f64,
    recovery: f64,
    difference: f64,
    pass: TrainPass,
}

/// 급수 압력 탐색기. `step`을 반복 호출하거나 `run`으로 끝까지 진행한다.
pub struct PressureSearch<'a> {
    train: ResolvedTrain<'a>,
    ctx: OperatingContext,
    state: SolverState,
    feed_flow_m3h: f64,
    effective_feed_flow_m3h: f64,
    recycle_fraction: f64,
    target: f64,
    tolerance: f64,
    budget: usize,
    min_pressure_psi: f64,
    pressure_psi: f64,
    step_psi: f64,
    iteration: usize,
    history: RecoveryHistory,
    last_stable: Option<(f64, f64)>,
    best: Option<Snapshot>,
    trace: Vec<IterationRecord>,
    started: Instant,
    time_limit: Option<Duration>,
}

/// 탐색 종료 시점의 결과.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub status: SolveStatus,
    pub iterations: usize,
    pub best_iteration: usize,
    pub pressure_psi: f64,
    pub recovery: f64,
    pub pass: TrainPass,
    pub trace: Vec<IterationRecord>,
}

impl<'a> PressureSearch<'a> {
    /// 입력과 구성을 검증한다. 여기서 실패하면 반복은 시작되지 않는다.
    pub fn new(input: &DesignInput, catalog: &'a MembraneCatalog) -> Result<Self> {
        input.feed.validate()?;
        let opts = &input.options;
        if !(input.target_recovery > 0.0 && input.target_recovery < 1.0) {
            return Err(RoError::InvalidInput(format!(
                "목표 회수율은 0과 1 사이여야 합니다: {}",
                input.target_recovery
            )));
        }
        for (label, value) in [
            ("허용오차", opts.tolerance_percent),
            ("유량계수", opts.flow_factor),
            ("파울링계수", opts.fouling_factor),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(RoError::InvalidInput(format!(
                    "{label}는 0보다 커야 합니다: {value}"
                )));
            }
        }
        if !opts.recycle_percent.is_finite() || opts.recycle_percent < 0.0 {
            return Err(RoError::InvalidInput(format!(
                "재순환 비율은 0 이상이어야 합니다: {}",
                opts.recycle_percent
            )));
        }

        let train = ResolvedTrain::resolve(&input.topology, catalog)?;
        let feed_tds = input.feed.resolved_tds()?;
        let osmotic = input.feed.osmotic_pressure_psi()?;
        let min_pressure = MIN_PRESSURE_OSMOTIC_RATIO * osmotic;
        if min_pressure >= MAX_FEED_PRESSURE_PSI {
            return Err(RoError::InvalidInput(format!(
                "급수 삼투압 {osmotic:.1} psi 가 너무 높아 허용 압력 범위가 없습니다."
            )));
        }
        let ctx = OperatingContext {
            feed_osmotic_pressure_psi: osmotic,
            feed_tds_mg_l: feed_tds,
            tcf: temperature_correction_factor(input.feed.temperature_c)?,
            fouling_factor: opts.fouling_factor,
            flow_factor: opts.flow_factor,
        };

        let recycle_fraction = opts.recycle_percent / 100.0;
        let estimated_permeate = input.feed.flow_m3h * input.target_recovery;
        let effective_feed_flow = input.feed.flow_m3h + recycle_fraction * estimated_permeate;

        // 첫 반복의 농도분극은 직렬 엘리먼트 평균 회수율 추정치로 시작한다.
        let series = train.elements_in_series().max(1) as f64;
        let seed = (1.0 - (1.0 - input.target_recovery).powf(1.0 / series))
            .min(train.class().max_element_recovery());
        let history = RecoveryHistory::seeded(train.element_count(), seed);

        Ok(Self {
            ctx,
            state: SolverState::Initializing,
            feed_flow_m3h: input.feed.flow_m3h,
            effective_feed_flow_m3h: effective_feed_flow,
            recycle_fraction,
            target: input.target_recovery,
            tolerance: opts.tolerance_percent / 100.0,
            budget: opts.max_iterations.max(MIN_ITERATIONS),
            min_pressure_psi: min_pressure,
            pressure_psi: 0.0,
            step_psi: 0.0,
            iteration: 0,
            history,
            last_stable: None,
            best: None,
            trace: Vec::new(),
            started: Instant::now(),
            time_limit: opts.time_limit_ms.map(Duration::from_millis),
            train,
        })
    }

    pub fn state(&self) -> SolverState {
        self.state
    }

    pub fn context(&self) -> &OperatingContext {
        &self.ctx
    }

    pub fn train(&self) -> &ResolvedTrain<'a> {
        &self.train
    }

    pub fn effective_feed_flow_m3h(&self) -> f64 {
        self.effective_feed_flow_m3h
    }

    pub fn pressure_psi(&self) -> f64 {
        self.pressure_psi
    }

    pub fn trace(&self) -> &[IterationRecord] {
        &self.trace
    }

    fn clamp_pressure(&self, pressure: f64) -> f64 {
        pressure.clamp(self.min_pressure_psi, MAX_FEED_PRESSURE_PSI)
    }

    /// 막 등급별 경험식으로 초기 압력을 추정한다.
    fn initial_guess(&self) -> f64 {
        let osmotic = self.ctx.feed_osmotic_pressure_psi;
        let guess = match self.train.class() {
            MembraneClass::SeaWater => 1.5 * osmotic + 200.0,
            MembraneClass::Brackish => 2.0 * osmotic + 100.0,
        };
        self.clamp_pressure(guess)
    }

    /// 마지막 안정 반복으로 솔버 오류를 만든다. 안정 반복이 없으면 시도한 압력을 보고한다.
    fn failure(&self) -> RoError {
        let (pressure_psi, recovery) = match self.last_stable {
            Some((p, r)) => (p, Some(r)),
            None => (self.pressure_psi, None),
        };
        RoError::Solver {
            iteration: self.iteration,
            pressure_psi,
            recovery,
        }
    }

    /// 상태 기계를 한 단계 진행한다.
    pub fn step(&mut self) -> Result<SolverState> {
        match self.state {
            SolverState::Initializing => {
                self.pressure_psi = self.initial_guess();
                self.step_psi = self.pressure_psi / 4.0;
                self.started = Instant::now();
                log::debug!(
                    "초기 압력 {:.1} psi, 보폭 {:.1} psi (삼투압 {:.1} psi)",
                    self.pressure_psi,
                    self.step_psi,
                    self.ctx.feed_osmotic_pressure_psi
                );
                self.state = SolverState::Iterating;
            }
            SolverState::Iterating => self.iterate()?,
            SolverState::Converged | SolverState::Exhausted | SolverState::Failed => {}
        }
        Ok(self.state)
    }

    fn iterate(&mut self) -> Result<()> {
        self.iteration += 1;
        let feed = ElementFeed {
            flow_m3h: self.effective_feed_flow_m3h,
            tds_mg_l: self.ctx.feed_tds_mg_l,
            pressure_psi: self.pressure_psi,
        };
        let pass = self.train.run_pass(feed, &self.ctx, &mut self.history);
        let recovery = pass.permeate_flow_m3h / self.feed_flow_m3h / (1.0 + self.recycle_fraction);

        if !recovery.is_finite() || !pass.elements.iter().all(ElementState::is_finite) {
            self.state = SolverState::Failed;
            log::error!("{}회차에서 비유한 값 발생, 해석 중단", self.iteration);
            return Err(self.failure());
        }
        self.last_stable = Some((self.pressure_psi, recovery));

        let difference = (recovery - self.target).abs();
        log::debug!(
            "반복 {:>3}: P={:.2} psi, 회수율={:.4}, 차이={:.5}",
            self.iteration,
            self.pressure_psi,
            recovery,
            difference
        );
        self.trace.push(IterationRecord {
            iteration: self.iteration,
            pressure_psi: self.pressure_psi,
            recovery,
            difference,
        });
        if self.best.as_ref().map_or(true, |b| difference < b.difference) {
            self.best = Some(Snapshot {
                iteration: self.iteration,
                pressure_psi: self.pressure_psi,
                recovery,
                difference,
                pass,
            });
        }

        if difference < self.tolerance && self.iteration >= MIN_ITERATIONS {
            self.state = SolverState::Converged;
            log::info!(
                "{}회 반복 후 수렴: P={:.1} psi, 회수율 {:.2}%",
                self.iteration,
                self.pressure_psi,
                recovery * 100.0
            );
            return Ok(());
        }
        let timed_out = self
            .time_limit
            .is_some_and(|limit| self.started.elapsed() >= limit);
        if self.iteration >= self.budget || timed_out {
            self.state = SolverState::Exhausted;
            log::warn!(
                "{}회 반복 내 미수렴{}: 최선 차이 {:.3}%p",
                self.iteration,
                if timed_out { "(시간 제한)" } else { "" },
                self.best.as_ref().map_or(difference, |b| b.difference) * 100.0
            );
            return Ok(());
        }

        if recovery < self.target {
            self.pressure_psi += self.step_psi;
        } else {
            self.pressure_psi -= self.step_psi;
        }
        self.pressure_psi = self.clamp_pressure(self.pressure_psi);
        self.step_psi /= STEP_SHRINK;
        if self.iteration < EARLY_ITERATIONS {
            self.step_psi = self.step_psi.max(MIN_EARLY_STEP_PSI);
        }
        Ok(())
    }

    /// 종료 상태까지 진행하고 최선의 반복을 반환한다.
    pub fn run(mut self) -> Result<SearchOutcome> {
        loop {
            match self.step()? {
                SolverState::Converged | SolverState::Exhausted => break,
                SolverState::Initializing | SolverState::Iterating => {}
                SolverState::Failed => return Err(self.failure()),
            }
        }
        let status = if self.state == SolverState::Converged {
            SolveStatus::Converged
        } else {
            SolveStatus::Exhausted
        };
        let Some(best) = self.best.take() else {
            return Err(self.failure());
        };
        Ok(SearchOutcome {
            status,
            iterations: self.iteration,
            best_iteration: best.iteration,
            pressure_psi: best.pressure_psi,
            recovery: best.recovery,
            pass: best.pass,
            trace: self.trace,
        })
    }
}

/// 해석 결과. 해석 1회당 하나이며 목표에 가장 가까웠던 반복을 나타낸다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemResult {
    pub status: SolveStatus,
    pub status_message: String,
    /// 급수 압력 [psi]
    pub feed_pressure_psi: f64,
    /// 달성 계통 회수율(재순환 보정 후, 분율)
    pub recovery: f64,
    pub target_recovery: f64,
    /// 달성 − 목표 [%p]
    pub recovery_gap_percent: f64,
    /// 스케일/수리학적 한계 회수율(분율)
    pub limiting_recovery: f64,
    pub average_flux_lmh: f64,
    pub permeate_flow_m3h: f64,
    pub permeate_tds_mg_l: f64,
    pub concentrate_flow_m3h: f64,
    pub concentrate_tds_mg_l: f64,
    pub average_element_recovery: f64,
    /// 엘리먼트 평균 농도분극계수
    pub concentration_polarization: f64,
    pub concentrate_osmotic_pressure_psi: f64,
    pub stage_pressure_drops_psi: Vec<f64>,
    pub feed_osmotic_pressure_psi: f64,
    pub average_ndp_psi: f64,
    pub tcf: f64,
    pub feed_flow_m3h: f64,
    /// 재순환을 포함해 계열에 실제 유입된 유량
    pub effective_feed_flow_m3h: f64,
    pub iterations: usize,
    pub best_iteration: usize,
    pub trace: Vec<IterationRecord>,
    pub stages: Vec<StageSummary>,
    pub elements: Vec<ElementState>,
    /// 엘리먼트 운전 한계 초과 경고
    pub design_warnings: Vec<String>,
    pub scaling: ScalingAnalysis,
    pub dosing: DosingResult,
}

impl SystemResult {
    pub fn is_converged(&self) -> bool {
        self.status == SolveStatus::Converged
    }
}

/// 주어진 급수 압력으로 계열을 1회 통과 계산한다. 압력 탐색 없이 운전점을 평가할 때 쓴다.
pub fn run_at_pressure(
    input: &DesignInput,
    catalog: &MembraneCatalog,
    pressure_psi: f64,
) -> Result<TrainPass> {
    let mut search = PressureSearch::new(input, catalog)?;
    let feed = ElementFeed {
        flow_m3h: search.effective_feed_flow_m3h,
        tds_mg_l: search.ctx.feed_tds_mg_l,
        pressure_psi: pressure_psi.max(0.0),
    };
    Ok(search.train.run_pass(feed, &search.ctx, &mut search.history))
}

/// 목표 회수율에 맞는 급수 압력을 찾고 전체 운전 결과를 만든다.
pub fn solve(
    input: &DesignInput,
    membranes: &MembraneCatalog,
    chemicals: &ChemicalCatalog,
) -> Result<SystemResult> {
    let search = PressureSearch::new(input, membranes)?;
    input.dosing.validate(chemicals)?;
    let ctx = *search.context();
    let effective_feed_flow = search.effective_feed_flow_m3h();
    let total_area = search.train().total_area_m2();
    let hydraulic_limit = search.train().hydraulic_recovery_limit();
    let outcome = search.run()?;

    let report = post_process(
        &input.feed,
        outcome.recovery.clamp(0.0, 0.999),
        hydraulic_limit,
        &input.dosing,
        chemicals,
    )?;

    let pass = outcome.pass;
    let active: Vec<&ElementState> = pass.elements.iter().filter(|e| e.feed_flow_m3h > 0.0).collect();
    let mean = |f: fn(&ElementState) -> f64| -> f64 {
        if active.is_empty() {
            0.0
        } else {
            active.iter().map(|e| f(e)).sum::<f64>() / active.len() as f64
        }
    };
    let average_element_recovery = mean(|e| e.recovery);
    let concentration_polarization = mean(|e| e.polarization_factor);
    let average_ndp = mean(|e| e.ndp_psi);
    let warnings = design_warnings(&pass.elements, membranes);
    let gap = (outcome.recovery - input.target_recovery) * 100.0;
    let status_message = match outcome.status {
        SolveStatus::Converged => format!(
            "수렴 ({}회): 회수율 {:.2}% (목표 {:.2}%)",
            outcome.iterations,
            outcome.recovery * 100.0,
            input.target_recovery * 100.0
        ),
        SolveStatus::Exhausted => format!(
            "미수렴 ({}회): 달성 {:.2}% / 목표 {:.2}% (차이 {:+.2}%p)",
            outcome.iterations,
            outcome.recovery * 100.0,
            input.target_recovery * 100.0,
            gap
        ),
    };
    let concentrate_osmotic = if ctx.feed_tds_mg_l > 0.0 {
        ctx.feed_osmotic_pressure_psi * pass.concentrate_tds_mg_l / ctx.feed_tds_mg_l
    } else {
        0.0
    };
    let average_flux = if total_area > 0.0 {
        pass.permeate_flow_m3h * 1000.0 / (total_area * ctx.flow_factor)
    } else {
        0.0
    };

    Ok(SystemResult {
        status: outcome.status,
        status_message,
        feed_pressure_psi: outcome.pressure_psi,
        recovery: outcome.recovery,
        target_recovery: input.target_recovery,
        recovery_gap_percent: gap,
        limiting_recovery: report.limiting_recovery,
        average_flux_lmh: average_flux,
        permeate_flow_m3h: pass.permeate_flow_m3h,
        permeate_tds_mg_l: pass.permeate_tds_mg_l,
        concentrate_flow_m3h: pass.concentrate_flow_m3h,
        concentrate_tds_mg_l: pass.concentrate_tds_mg_l,
        average_element_recovery,
        concentration_polarization,
        concentrate_osmotic_pressure_psi: concentrate_osmotic,
        stage_pressure_drops_psi: pass.stages.iter().map(|s| s.pressure_drop_psi).collect(),
        feed_osmotic_pressure_psi: ctx.feed_osmotic_pressure_psi,
        average_ndp_psi: average_ndp,
        tcf: ctx.tcf,
        feed_flow_m3h: input.feed.flow_m3h,
        effective_feed_flow_m3h: effective_feed_flow,
        iterations: outcome.iterations,
        best_iteration: outcome.best_iteration,
        trace: outcome.trace,
        design_warnings: warnings,
        stages: pass.stages,
        elements: pass.elements,
        scaling: report.scaling,
        dosing: report.dosing,
    })
}

/// 엘리먼트별 운전 한계(플럭스, 유량, 압력강하, 최고 압력) 초과를 모은다.
fn design_warnings(elements: &[ElementState], catalog: &MembraneCatalog) -> Vec<String> {
    let mut warnings = Vec::new();
    for e in elements {
        let Some(m) = catalog.find(&e.model) else {
            continue;
        };
        let tag = format!(
            "{}-{}-{} ({})",
            e.position.stage + 1,
            e.position.vessel + 1,
            e.position.element + 1,
            e.model
        );
        if e.flux_lmh > m.max_flux_lmh {
            warnings.push(format!(
                "{tag}: 플럭스 {:.1} LMH > 한계 {:.1} LMH",
                e.flux_lmh, m.max_flux_lmh
            ));
        }
        if e.feed_flow_m3h > m.max_feed_flow_m3h {
            warnings.push(format!(
                "{tag}: 급수 유량 {:.2} m3/h > 한계 {:.2} m3/h",
                e.feed_flow_m3h, m.max_feed_flow_m3h
            ));
        }
        if e.pressure_drop_psi > m.max_pressure_drop_psi {
            warnings.push(format!(
                "{tag}: 압력강하 {:.1} psi > 한계 {:.1} psi",
                e.pressure_drop_psi, m.max_pressure_drop_psi
            ));
        }
        if e.feed_pressure_psi > m.max_pressure_psi {
            warnings.push(format!(
                "{tag}: 유입 압력 {:.0} psi > 한계 {:.0} psi",
                e.feed_pressure_psi, m.max_pressure_psi
            ));
        }
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seawater_input() -> DesignInput {
        DesignInput {
            feed: FeedWater::from_tds(10.0, 35_000.0, 25.0, 7.0),
            topology: Topology::uniform(&[(1, 1)], "SW30XLE-400i"),
            target_recovery: 0.1,
            options: SolverOptions::default(),
            dosing: DosingOptions::default(),
        }
    }

    #[test]
    fn non_finite_first_pass_fails_with_attempted_pressure() {
        let catalog = MembraneCatalog::builtin();
        let input = seawater_input();
        let mut search = PressureSearch::new(&input, &catalog).expect("search");
        search.step().expect("init");
        search.ctx.feed_osmotic_pressure_psi = f64::NAN;
        let attempted = search.pressure_psi();
        let err = search.step().expect_err("nan pass");
        assert_eq!(search.state(), SolverState::Failed);
        assert_eq!(
            err,
            RoError::Solver {
                iteration: 1,
                pressure_psi: attempted,
                recovery: None,
            }
        );
        // 종료 상태에서는 더 진행하지 않는다.
        assert_eq!(search.step().expect("terminal"), SolverState::Failed);
    }

    #[test]
    fn failure_reports_last_stable_iteration() {
        let catalog = MembraneCatalog::builtin();
        let input = seawater_input();
        let mut search = PressureSearch::new(&input, &catalog).expect("search");
        search.step().expect("init");
        search.step().expect("first iteration");
        let stable = search.trace()[0];
        search.ctx.feed_osmotic_pressure_psi = f64::NAN;
        match search.run() {
            Err(RoError::Solver {
                iteration,
                pressure_psi,
                recovery,
            }) => {
                assert_eq!(iteration, 2);
                assert_eq!(pressure_psi, stable.pressure_psi);
                assert_eq!(recovery, Some(stable.recovery));
            }
            other => panic!("expected solver error, got {other:?}"),
        }
    }
}
