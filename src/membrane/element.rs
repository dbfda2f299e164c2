//! 막 엘리먼트 1개의 물질전달/물질수지 모델.
//!
//! 상류 급수 상태(유량, TDS, 압력)를 받아 순구동압(NDP), 투과 플럭스, 투과수/농축수
//! 유량과 농도, 엘리먼트 압력강하를 계산한다. 계산 순서:
//! 1. 국부 삼투압 = 계통 급수 삼투압 × (국부 TDS / 급수 TDS)
//! 2. 농도분극계수 CP = exp(0.7 · r_prev)
//! 3. 투과측 삼투압 = 국부 삼투압 × (1 − 제거율)
//! 4. NDP = max(0, P − CP·π − P_perm − π_perm)
//! 5. 플럭스 = A · NDP · TCF · 파울링계수
//! 6. 투과 유량 = 플럭스 · 면적 · 유량계수
//! 7. 회수율은 [0, 막 등급별 상한] 으로 클램프
//! 8~10. 농축수 유량/TDS, 투과수 TDS
//! 11. 압력강하 = 0.01 · Q[gpm]^1.7

use serde::{Deserialize, Serialize};

use super::catalog::MembraneData;
use crate::error::{Result, RoError};
use crate::units::m3h_to_gpm;

/// 투과측 압력(대기압) [psi]
pub const PERMEATE_PRESSURE_PSI: f64 = 14.7;
const POLARIZATION_EXPONENT: f64 = 0.7;
const MIN_PERMEATE_TDS_MG_L: f64 = 10.0;
const MAX_PERMEATE_TDS_FRACTION: f64 = 0.8;
const PRESSURE_DROP_COEFF: f64 = 0.01;
const PRESSURE_DROP_EXPONENT: f64 = 1.7;

/// 엘리먼트 유입 상태.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElementFeed {
    pub flow_m3h: f64,
    pub tds_mg_l: f64,
    pub pressure_psi: f64,
}

/// 한 번의 해석 동안 모든 엘리먼트가 공유하는 운전 조건.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OperatingContext {
    /// 계통 급수 삼투압 [psi]
    pub feed_osmotic_pressure_psi: f64,
    /// 계통 급수 TDS [mg/L]
    pub feed_tds_mg_l: f64,
    pub tcf: f64,
    pub fouling_factor: f64,
    pub flow_factor: f64,
}

/// 단/용기/엘리먼트 위치(0부터 시작).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ElementPosition {
    pub stage: usize,
    pub vessel: usize,
    pub element: usize,
}

/// 엘리먼트 계산 결과.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementState {
    pub position: ElementPosition,
    pub model: String,
    pub feed_flow_m3h: f64,
    pub feed_pressure_psi: f64,
    pub feed_tds_mg_l: f64,
    /// 국부 급수 삼투압 [psi]
    pub osmotic_pressure_psi: f64,
    pub polarization_factor: f64,
    /// 순구동압 [psi]
    pub ndp_psi: f64,
    /// 투과 플럭스 [LMH]
    pub flux_lmh: f64,
    pub permeate_flow_m3h: f64,
    pub permeate_tds_mg_l: f64,
    pub concentrate_flow_m3h: f64,
    pub concentrate_tds_mg_l: f64,
    pub recovery: f64,
    pub pressure_drop_psi: f64,
    pub outlet_pressure_psi: f64,
}

impl ElementState {
    /// 다음 엘리먼트로 넘길 농축수 상태.
    pub fn concentrate(&self) -> ElementFeed {
        ElementFeed {
            flow_m3h: self.concentrate_flow_m3h,
            tds_mg_l: self.concentrate_tds_mg_l,
            pressure_psi: self.outlet_pressure_psi,
        }
    }

    /// 유입 유량이 없는 엘리먼트. 생산량 0, 상태는 그대로 통과시킨다.
    fn idle(position: ElementPosition, model: &str, feed: ElementFeed) -> Self {
        Self {
            position,
            model: model.to_string(),
            feed_flow_m3h: feed.flow_m3h,
            feed_pressure_psi: feed.pressure_psi,
            feed_tds_mg_l: feed.tds_mg_l,
            osmotic_pressure_psi: 0.0,
            polarization_factor: 1.0,
            ndp_psi: 0.0,
            flux_lmh: 0.0,
            permeate_flow_m3h: 0.0,
            permeate_tds_mg_l: 0.0,
            concentrate_flow_m3h: feed.flow_m3h.max(0.0),
            concentrate_tds_mg_l: feed.tds_mg_l,
            recovery: 0.0,
            pressure_drop_psi: 0.0,
            outlet_pressure_psi: feed.pressure_psi.max(0.0),
        }
    }

    /// 모든 수치가 유한한지 확인한다.
    pub fn is_finite(&self) -> bool {
        [
            self.feed_flow_m3h,
            self.feed_pressure_psi,
            self.feed_tds_mg_l,
            self.osmotic_pressure_psi,
            self.polarization_factor,
            self.ndp_psi,
            self.flux_lmh,
            self.permeate_flow_m3h,
            self.permeate_tds_mg_l,
            self.concentrate_flow_m3h,
            self.concentrate_tds_mg_l,
            self.outlet_pressure_psi,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

/// 유입 유량이 양수인지 확인한다.
pub fn check_operating_point(feed: &ElementFeed) -> Result<()> {
    if feed.flow_m3h > 0.0 {
        Ok(())
    } else {
        Err(RoError::InvalidOperatingPoint(format!(
            "엘리먼트 유입 유량이 0 이하입니다: {} m3/h",
            feed.flow_m3h
        )))
    }
}

/// 농도분극계수 CP = exp(0.7 · r).
pub fn polarization_factor(element_recovery: f64) -> f64 {
    (POLARIZATION_EXPONENT * element_recovery.max(0.0)).exp()
}

/// 엘리먼트 압력강하 [psi]. 급수 유량(gpm)에 대한 경험식.
pub fn element_pressure_drop_psi(feed_flow_m3h: f64) -> f64 {
    PRESSURE_DROP_COEFF * m3h_to_gpm(feed_flow_m3h.max(0.0)).powf(PRESSURE_DROP_EXPONENT)
}

/// 엘리먼트 1개를 계산한다.
///
/// `previous_recovery`는 같은 해석의 직전 반복에서 이 엘리먼트가 낸 회수율이며,
/// 첫 반복에서는 계통 평균 추정치를 넘긴다.
pub fn evaluate_element(
    position: ElementPosition,
    membrane: &MembraneData,
    feed: ElementFeed,
    ctx: &OperatingContext,
    previous_recovery: f64,
) -> ElementState {
    if let Err(e) = check_operating_point(&feed) {
        log::debug!("{e} (단 {}, 용기 {}, 엘리먼트 {})", position.stage + 1, position.vessel + 1, position.element + 1);
        return ElementState::idle(position, &membrane.model, feed);
    }

    let local_osmotic = if ctx.feed_tds_mg_l > 0.0 {
        ctx.feed_osmotic_pressure_psi * feed.tds_mg_l / ctx.feed_tds_mg_l
    } else {
        ctx.feed_osmotic_pressure_psi
    };
    let cp = polarization_factor(previous_recovery);
    let permeate_osmotic = local_osmotic * (1.0 - membrane.rejection);
    let ndp = (feed.pressure_psi - cp * local_osmotic - PERMEATE_PRESSURE_PSI - permeate_osmotic).max(0.0);

    let mut flux = (membrane.water_permeability_lmh_psi * ndp * ctx.tcf * ctx.fouling_factor).max(0.0);
    let effective_area = membrane.area_m2 * ctx.flow_factor;
    let mut permeate_flow = flux * effective_area / 1000.0;

    let max_recovery = membrane.class.max_element_recovery();
    let mut recovery = permeate_flow / feed.flow_m3h;
    if recovery < 0.0 {
        recovery = 0.0;
        permeate_flow = 0.0;
        flux = 0.0;
    } else if recovery > max_recovery {
        recovery = max_recovery;
        permeate_flow = recovery * feed.flow_m3h;
        flux = if effective_area > 0.0 {
            permeate_flow * 1000.0 / effective_area
        } else {
            0.0
        };
    }
    let concentrate_flow = feed.flow_m3h - permeate_flow;
    let concentrate_tds = feed.tds_mg_l / (1.0 - recovery);

    let permeate_tds = if permeate_flow > 0.0 {
        (concentrate_tds * cp * (1.0 - membrane.rejection))
            .max(MIN_PERMEATE_TDS_MG_L)
            .min(MAX_PERMEATE_TDS_FRACTION * feed.tds_mg_l)
    } else {
        0.0
    };

    let drop = element_pressure_drop_psi(feed.flow_m3h);
    ElementState {
        position,
        model: membrane.model.clone(),
        feed_flow_m3h: feed.flow_m3h,
        feed_pressure_psi: feed.pressure_psi,
        feed_tds_mg_l: feed.tds_mg_l,
        osmotic_pressure_psi: local_osmotic,
        polarization_factor: cp,
        ndp_psi: ndp,
        flux_lmh: flux,
        permeate_flow_m3h: permeate_flow,
        permeate_tds_mg_l: permeate_tds,
        concentrate_flow_m3h: concentrate_flow,
        concentrate_tds_mg_l: concentrate_tds,
        recovery,
        pressure_drop_psi: drop,
        outlet_pressure_psi: (feed.pressure_psi - drop).max(0.0),
    }
}
