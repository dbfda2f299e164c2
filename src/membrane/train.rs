//! RO 계열의 배열 구성(단 → 압력용기 → 엘리먼트)과 1회 통과 계산.
//!
//! 용기 안의 엘리먼트는 직렬로, 한 단의 용기는 병렬로 계산한다. 단의 농축수를 합쳐
//! 다음 단의 급수로 넘기며, 단 사이에서 5 psi 를 뺀다(0 하한).

use serde::{Deserialize, Serialize};

use super::catalog::{MembraneCatalog, MembraneClass, MembraneData};
use super::element::{evaluate_element, ElementFeed, ElementPosition, ElementState, OperatingContext};
use crate::error::{Result, RoError};

/// 단간 배관 압력손실 [psi]
pub const INTERSTAGE_LOSS_PSI: f64 = 5.0;

/// 압력용기. 엘리먼트 모델명을 유입 순서대로 가진다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vessel {
    pub elements: Vec<String>,
}

impl Vessel {
    pub fn of(model: &str, count: usize) -> Self {
        Self {
            elements: vec![model.to_string(); count],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub vessels: Vec<Vessel>,
    /// 단 유입 전 승압 펌프 [psi]
    #[serde(default)]
    pub boost_psi: f64,
}

/// 계열 전체 배열. 해석 동안 변경되지 않는다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topology {
    pub stages: Vec<Stage>,
}

impl Topology {
    /// `(용기 수, 용기당 엘리먼트 수)` 목록으로 단일 모델 배열을 만든다.
    pub fn uniform(layout: &[(usize, usize)], model: &str) -> Self {
        Self {
            stages: layout
                .iter()
                .map(|&(vessels, elements)| Stage {
                    vessels: vec![Vessel::of(model, elements); vessels],
                    boost_psi: 0.0,
                })
                .collect(),
        }
    }

    pub fn element_count(&self) -> usize {
        self.stages
            .iter()
            .flat_map(|s| &s.vessels)
            .map(|v| v.elements.len())
            .sum()
    }
}

/// 단별 집계 결과.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageSummary {
    /// 0부터 시작하는 단 번호
    pub stage: usize,
    pub active_vessels: usize,
    pub feed_flow_m3h: f64,
    pub feed_pressure_psi: f64,
    pub feed_tds_mg_l: f64,
    pub permeate_flow_m3h: f64,
    pub permeate_tds_mg_l: f64,
    pub concentrate_flow_m3h: f64,
    pub concentrate_tds_mg_l: f64,
    /// 용기 출구 압력 중 최솟값
    pub min_outlet_pressure_psi: f64,
    pub pressure_drop_psi: f64,
}

/// 엘리먼트별 직전 회수율. 한 번의 해석 안에서만 유지된다.
#[derive(Debug, Clone, PartialEq)]
pub struct RecoveryHistory {
    recoveries: Vec<f64>,
}

impl RecoveryHistory {
    /// 모든 엘리먼트를 같은 추정치로 초기화한다.
    pub fn seeded(element_count: usize, estimate: f64) -> Self {
        Self {
            recoveries: vec![estimate; element_count],
        }
    }

    pub fn get(&self, index: usize) -> f64 {
        self.recoveries.get(index).copied().unwrap_or(0.0)
    }

    fn record(&mut self, index: usize, recovery: f64) {
        if let Some(slot) = self.recoveries.get_mut(index) {
            *slot = recovery;
        }
    }
}

/// 계열 1회 통과 결과.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainPass {
    pub elements: Vec<ElementState>,
    pub stages: Vec<StageSummary>,
    pub permeate_flow_m3h: f64,
    pub permeate_tds_mg_l: f64,
    pub concentrate_flow_m3h: f64,
    pub concentrate_tds_mg_l: f64,
    pub concentrate_pressure_psi: f64,
}

struct ResolvedStage<'a> {
    index: usize,
    boost_psi: f64,
    vessels: Vec<Vec<&'a MembraneData>>,
}

/// 카탈로그와 대조해 모델명을 물성으로 바꾼 배열.
pub struct ResolvedTrain<'a> {
    stages: Vec<ResolvedStage<'a>>,
    element_count: usize,
}

impl<'a> ResolvedTrain<'a> {
    /// 모든 모델명을 조회하고 물성을 검사한다. 빈 용기/빈 단은 제외하고, 엘리먼트가 하나도 없으면 구성 오류.
    pub fn resolve(topology: &Topology, catalog: &'a MembraneCatalog) -> Result<Self> {
        let mut stages = Vec::new();
        let mut element_count = 0;
        for (index, stage) in topology.stages.iter().enumerate() {
            if !stage.boost_psi.is_finite() || stage.boost_psi < 0.0 {
                return Err(RoError::Configuration(format!(
                    "{}단 승압 값이 잘못되었습니다: {}",
                    index + 1,
                    stage.boost_psi
                )));
            }
            let mut vessels = Vec::new();
            for vessel in stage.vessels.iter().filter(|v| !v.elements.is_empty()) {
                let elements = vessel
                    .elements
                    .iter()
                    .map(|m| {
                        let data = catalog.lookup(m)?;
                        data.validate()?;
                        Ok(data)
                    })
                    .collect::<Result<Vec<_>>>()?;
                element_count += elements.len();
                vessels.push(elements);
            }
            if vessels.is_empty() {
                log::debug!("{}단에 사용 중인 용기가 없어 건너뜁니다.", index + 1);
                continue;
            }
            stages.push(ResolvedStage {
                index,
                boost_psi: stage.boost_psi,
                vessels,
            });
        }
        if element_count == 0 {
            return Err(RoError::Configuration(
                "배열에 막 엘리먼트가 하나도 없습니다.".into(),
            ));
        }
        Ok(Self {
            stages,
            element_count,
        })
    }

    pub fn element_count(&self) -> usize {
        self.element_count
    }

    /// 급수가 통과하는 최대 직렬 엘리먼트 수.
    pub fn elements_in_series(&self) -> usize {
        self.stages
            .iter()
            .map(|s| s.vessels.iter().map(Vec::len).max().unwrap_or(0))
            .sum()
    }

    /// 해수용 엘리먼트가 하나라도 있으면 해수용으로 본다.
    pub fn class(&self) -> MembraneClass {
        let any_sea_water = self.membranes().any(|m| m.class == MembraneClass::SeaWater);
        if any_sea_water {
            MembraneClass::SeaWater
        } else {
            MembraneClass::Brackish
        }
    }

    pub fn total_area_m2(&self) -> f64 {
        self.membranes().map(|m| m.area_m2).sum()
    }

    /// 엘리먼트 회수율 상한만으로 도달 가능한 계통 회수율.
    pub fn hydraulic_recovery_limit(&self) -> f64 {
        let cap = self.class().max_element_recovery();
        1.0 - (1.0 - cap).powi(self.elements_in_series() as i32)
    }

    fn membranes(&self) -> impl Iterator<Item = &'a MembraneData> + '_ {
        self.stages
            .iter()
            .flat_map(|s| s.vessels.iter().flatten().copied())
    }

    /// 주어진 급수 상태로 계열을 1회 통과 계산한다.
    pub fn run_pass(
        &self,
        feed: ElementFeed,
        ctx: &OperatingContext,
        history: &mut RecoveryHistory,
    ) -> TrainPass {
        let mut elements = Vec::with_capacity(self.element_count);
        let mut summaries = Vec::with_capacity(self.stages.len());
        let mut stage_feed = feed;
        let mut flat_index = 0;

        for (order, stage) in self.stages.iter().enumerate() {
            if order > 0 {
                stage_feed.pressure_psi = (stage_feed.pressure_psi - INTERSTAGE_LOSS_PSI).max(0.0);
            }
            stage_feed.pressure_psi += stage.boost_psi;

            let vessel_count = stage.vessels.len();
            let vessel_feed = ElementFeed {
                flow_m3h: stage_feed.flow_m3h / vessel_count as f64,
                ..stage_feed
            };

            let mut permeate_flow = 0.0;
            let mut permeate_salt = 0.0;
            let mut concentrate_flow = 0.0;
            let mut concentrate_salt = 0.0;
            let mut min_outlet = f64::INFINITY;

            for (v, vessel) in stage.vessels.iter().enumerate() {
                let mut current = vessel_feed;
                for (e, membrane) in vessel.iter().enumerate() {
                    let position = ElementPosition {
                        stage: stage.index,
                        vessel: v,
                        element: e,
                    };
                    let state = evaluate_element(position, membrane, current, ctx, history.get(flat_index));
                    history.record(flat_index, state.recovery);
                    flat_index += 1;
                    permeate_flow += state.permeate_flow_m3h;
                    permeate_salt += state.permeate_flow_m3h * state.permeate_tds_mg_l;
                    current = state.concentrate();
                    elements.push(state);
                }
                concentrate_flow += current.flow_m3h;
                concentrate_salt += current.flow_m3h * current.tds_mg_l;
                min_outlet = min_outlet.min(current.pressure_psi);
            }

            let concentrate_tds = weighted(concentrate_salt, concentrate_flow, stage_feed.tds_mg_l);
            summaries.push(StageSummary {
                stage: stage.index,
                active_vessels: vessel_count,
                feed_flow_m3h: stage_feed.flow_m3h,
                feed_pressure_psi: stage_feed.pressure_psi,
                feed_tds_mg_l: stage_feed.tds_mg_l,
                permeate_flow_m3h: permeate_flow,
                permeate_tds_mg_l: weighted(permeate_salt, permeate_flow, 0.0),
                concentrate_flow_m3h: concentrate_flow,
                concentrate_tds_mg_l: concentrate_tds,
                min_outlet_pressure_psi: min_outlet,
                pressure_drop_psi: stage_feed.pressure_psi - min_outlet,
            });

            stage_feed = ElementFeed {
                flow_m3h: concentrate_flow,
                tds_mg_l: concentrate_tds,
                pressure_psi: min_outlet,
            };
        }

        let permeate_flow: f64 = summaries.iter().map(|s| s.permeate_flow_m3h).sum();
        let permeate_salt: f64 = summaries
            .iter()
            .map(|s| s.permeate_flow_m3h * s.permeate_tds_mg_l)
            .sum();
        TrainPass {
            elements,
            stages: summaries,
            permeate_flow_m3h: permeate_flow,
            permeate_tds_mg_l: weighted(permeate_salt, permeate_flow, 0.0),
            concentrate_flow_m3h: stage_feed.flow_m3h,
            concentrate_tds_mg_l: stage_feed.tds_mg_l,
            concentrate_pressure_psi: stage_feed.pressure_psi,
        }
    }
}

/// 유량 가중 평균 농도. 유량이 0이면 `fallback`.
fn weighted(salt: f64, flow: f64, fallback: f64) -> f64 {
    if flow > 0.0 {
        salt / flow
    } else {
        fallback
    }
}
