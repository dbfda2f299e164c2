//! 수렴 후 처리: 달성 회수율 기준 스케일 분석과 약품 주입 계산.
//! 솔버 반복과 독립적인 순수 함수이며 재시도하지 않는다.

use serde::{Deserialize, Serialize};

use super::chemicals::{ChemicalCatalog, ChemicalKind};
use super::dosing::{compute_dosing, DosingInput, DosingOptions, DosingResult};
use crate::error::Result;
use crate::water::ions::{nacl_equivalent, total_mg_l, IonConcentrations};
use crate::water::scaling::{concentrate_langelier_index, saturation_ratios, SaturationRatio, ScaleCompound};
use crate::water::FeedWater;

const ANTISCALANT_ADVISORY: &str =
    "과포화 화합물이 있습니다. 스케일 방지제 사용과 회수율 재검토를 권장합니다.";
const RECOVERY_SCAN_STEP: f64 = 0.005;
const MAX_SCAN_RECOVERY: f64 = 0.99;

/// 농축수 스케일 분석 결과.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingAnalysis {
    /// 분석 기준 회수율(달성값)
    pub recovery: f64,
    pub saturation: Vec<SaturationRatio>,
    /// 농축수 LSI. 칼슘/알칼리도 정보가 없으면 `None`.
    pub lsi: Option<f64>,
    pub supersaturated: Vec<ScaleCompound>,
    /// 화합물별 경고, 경고가 있으면 마지막에 스케일 방지제 권고를 덧붙인다.
    pub warnings: Vec<String>,
}

impl ScalingAnalysis {
    pub fn ratio_of(&self, compound: ScaleCompound) -> Option<f64> {
        self.saturation
            .iter()
            .find(|s| s.compound == compound)
            .map(|s| s.ratio)
    }
}

/// 후처리 전체 결과.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreatmentReport {
    pub scaling: ScalingAnalysis,
    pub dosing: DosingResult,
    /// 모든 포화도가 1 이하로 유지되는 최대 계통 회수율
    pub limiting_recovery: f64,
}

/// 스케일 분석용 조성. 이온 분석값이 없으면 NaCl 당량을 쓴다.
fn analysis_ions(feed: &FeedWater) -> Result<IonConcentrations> {
    if total_mg_l(&feed.ions) > 0.0 {
        Ok(feed.ions.clone())
    } else {
        Ok(nacl_equivalent(feed.resolved_tds()?))
    }
}

/// 회수율 r 에서의 포화도와 LSI, 경고 목록을 만든다.
pub fn scaling_analysis(feed: &FeedWater, recovery: f64) -> Result<ScalingAnalysis> {
    let ions = analysis_ions(feed)?;
    let saturation = saturation_ratios(&ions, recovery, feed.temperature_c, feed.ph)?;
    let lsi = concentrate_langelier_index(&ions, recovery, feed.ph, feed.temperature_c)?;

    let supersaturated: Vec<ScaleCompound> = saturation
        .iter()
        .filter(|s| s.is_supersaturated())
        .map(|s| s.compound)
        .collect();
    let mut warnings: Vec<String> = saturation
        .iter()
        .filter(|s| s.is_supersaturated())
        .map(|s| {
            format!(
                "{} 포화도 {:.2} (>1.0): 회수율 {:.1}% 농축수에서 과포화",
                s.compound.formula(),
                s.ratio,
                recovery * 100.0
            )
        })
        .collect();
    if !warnings.is_empty() {
        warnings.push(ANTISCALANT_ADVISORY.to_string());
    }

    Ok(ScalingAnalysis {
        recovery,
        saturation,
        lsi,
        supersaturated,
        warnings,
    })
}

/// 포화도가 1을 넘지 않는 최대 회수율을 찾는다. `cap`(수리학적 한계)을 넘지 않는다.
pub fn limiting_recovery(feed: &FeedWater, cap: f64) -> Result<f64> {
    let ions = analysis_ions(feed)?;
    let cap = cap.clamp(0.0, MAX_SCAN_RECOVERY);
    let exceeds = |r: f64| -> Result<bool> {
        Ok(saturation_ratios(&ions, r, feed.temperature_c, feed.ph)?
            .iter()
            .any(SaturationRatio::is_supersaturated))
    };

    if exceeds(0.0)? {
        return Ok(0.0);
    }
    let mut lo = 0.0;
    let mut hi = None;
    let mut r = RECOVERY_SCAN_STEP;
    while r <= cap {
        if exceeds(r)? {
            hi = Some(r);
            break;
        }
        lo = r;
        r += RECOVERY_SCAN_STEP;
    }
    let Some(mut hi) = hi else {
        return Ok(cap);
    };
    for _ in 0..30 {
        let mid = 0.5 * (lo + hi);
        if exceeds(mid)? {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    Ok(lo)
}

/// 달성 회수율 기준으로 스케일 분석, 한계 회수율, 약품 주입을 계산한다.
pub fn post_process(
    feed: &FeedWater,
    recovery: f64,
    hydraulic_limit: f64,
    options: &DosingOptions,
    chemicals: &ChemicalCatalog,
) -> Result<TreatmentReport> {
    let scaling = scaling_analysis(feed, recovery)?;
    let limiting = limiting_recovery(feed, hydraulic_limit)?;
    let mut dosing = compute_dosing(
        DosingInput {
            feed_flow_m3h: feed.flow_m3h,
            feed_ph: feed.ph,
            free_chlorine_mg_l: feed.free_chlorine_mg_l,
            options,
        },
        chemicals,
    )?;

    let has = |kind: ChemicalKind| dosing.doses.iter().any(|d| d.kind == kind);
    let mut advice = Vec::new();
    if !scaling.supersaturated.is_empty() && !has(ChemicalKind::Antiscalant) {
        advice.push("스케일 방지제 주입 설정이 없습니다. 주입을 권장합니다.".to_string());
    }
    if let Some(lsi) = scaling.lsi.filter(|lsi| *lsi > 0.0) {
        if !has(ChemicalKind::Acid) {
            advice.push(format!(
                "농축수 LSI {lsi:.2} > 0: 산 주입으로 급수 pH 를 낮추는 것을 권장합니다."
            ));
        }
    }
    if recovery > limiting + 1e-9 {
        advice.push(format!(
            "달성 회수율 {:.1}%가 스케일 한계 회수율 {:.1}%를 넘습니다.",
            recovery * 100.0,
            limiting * 100.0
        ));
    }
    dosing.recommendations.extend(advice);

    Ok(TreatmentReport {
        scaling,
        dosing,
        limiting_recovery: limiting,
    })
}
