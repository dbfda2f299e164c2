use serde::{Deserialize, Serialize};

use super::chemicals::{ChemicalCatalog, ChemicalData, ChemicalKind};
use crate::error::{Result, RoError};

/// 산 주입량 경험 계수 [mg/L 유효성분 / pH 단위]
pub const ACID_MG_L_PER_PH_UNIT: f64 = 30.0;
/// 염기 주입량 경험 계수 [mg/L 유효성분 / pH 단위]
pub const CAUSTIC_MG_L_PER_PH_UNIT: f64 = 10.0;
/// 잔류염소 1 mg/L 당 SBS 주입량 [mg/L]
pub const SBS_PER_CHLORINE: f64 = 1.8;

/// 약품 주입 설정. 기본값은 모두 미사용.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DosingOptions {
    /// 스케일 방지제 주입 농도 [mg/L]. 0이면 미사용.
    pub antiscalant_dose_mg_l: f64,
    pub antiscalant: Option<String>,
    /// 산 주입 목표 pH
    pub acid_target_ph: Option<f64>,
    pub acid: Option<String>,
    /// 염기 주입 목표 pH
    pub caustic_target_ph: Option<f64>,
    pub caustic: Option<String>,
    /// 잔류염소가 있을 때 SBS 탈염소 적용
    pub dechlorination: bool,
    pub dechlorinator: Option<String>,
}

impl DosingOptions {
    /// 활성화된 주입 항목의 설정값과 약품 선택을 해석 전에 검사한다.
    pub fn validate(&self, catalog: &ChemicalCatalog) -> Result<()> {
        if !self.antiscalant_dose_mg_l.is_finite() || self.antiscalant_dose_mg_l < 0.0 {
            return Err(RoError::InvalidInput(format!(
                "스케일 방지제 주입 농도가 음수입니다: {}",
                self.antiscalant_dose_mg_l
            )));
        }
        if self.antiscalant_dose_mg_l > 0.0 {
            catalog.select(ChemicalKind::Antiscalant, self.antiscalant.as_deref())?;
        }
        if let Some(target) = self.acid_target_ph {
            check_target_ph(target)?;
            catalog.select(ChemicalKind::Acid, self.acid.as_deref())?;
        }
        if let Some(target) = self.caustic_target_ph {
            check_target_ph(target)?;
            catalog.select(ChemicalKind::Caustic, self.caustic.as_deref())?;
        }
        if self.dechlorination {
            catalog.select(ChemicalKind::Dechlorinator, self.dechlorinator.as_deref())?;
        }
        Ok(())
    }
}

/// 약품 1종의 주입 결과.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChemicalDose {
    pub chemical: String,
    pub kind: ChemicalKind,
    /// 유효성분 기준 주입 농도 [mg/L]
    pub dose_mg_l: f64,
    /// 제품 기준 사용량 [kg/day]
    pub consumption_kg_per_day: f64,
    /// 일일 비용 [통화/day]
    pub cost_per_day: f64,
}

/// 약품 주입 계산 결과.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DosingResult {
    pub doses: Vec<ChemicalDose>,
    pub total_cost_per_day: f64,
    pub recommendations: Vec<String>,
}

/// 약품 주입 계산 입력.
#[derive(Debug, Clone)]
pub struct DosingInput<'a> {
    /// 급수 유량 [m³/h]
    pub feed_flow_m3h: f64,
    pub feed_ph: f64,
    pub free_chlorine_mg_l: f64,
    pub options: &'a DosingOptions,
}

/// 주입 농도와 급수 유량으로 제품 사용량과 비용을 계산한다.
pub fn chemical_dose(chemical: &ChemicalData, dose_mg_l: f64, feed_flow_m3h: f64) -> ChemicalDose {
    // mg/L × m³/h = g/h
    let active_kg_per_day = dose_mg_l.max(0.0) * feed_flow_m3h.max(0.0) * 24.0 / 1000.0;
    let consumption = if chemical.purity > 0.0 {
        active_kg_per_day / chemical.purity
    } else {
        0.0
    };
    ChemicalDose {
        chemical: chemical.name.clone(),
        kind: chemical.kind,
        dose_mg_l,
        consumption_kg_per_day: consumption,
        cost_per_day: consumption * chemical.price_per_kg,
    }
}

/// 설정된 약품 주입량과 일일 비용을 계산한다. 주입 설정이 없으면 빈 결과를 낸다.
pub fn compute_dosing(input: DosingInput<'_>, catalog: &ChemicalCatalog) -> Result<DosingResult> {
    let opts = input.options;
    let mut result = DosingResult::default();

    if opts.antiscalant_dose_mg_l < 0.0 {
        return Err(RoError::InvalidInput(format!(
            "스케일 방지제 주입 농도가 음수입니다: {}",
            opts.antiscalant_dose_mg_l
        )));
    }
    if opts.antiscalant_dose_mg_l > 0.0 {
        let chem = catalog.select(ChemicalKind::Antiscalant, opts.antiscalant.as_deref())?;
        result.doses.push(chemical_dose(chem, opts.antiscalant_dose_mg_l, input.feed_flow_m3h));
    }

    if let Some(target) = opts.acid_target_ph {
        check_target_ph(target)?;
        let deficit = input.feed_ph - target;
        if deficit > 0.0 {
            let chem = catalog.select(ChemicalKind::Acid, opts.acid.as_deref())?;
            let dose = deficit * ACID_MG_L_PER_PH_UNIT;
            result.doses.push(chemical_dose(chem, dose, input.feed_flow_m3h));
        } else {
            result.recommendations.push(format!(
                "급수 pH {:.2}가 목표 {:.2} 이하이므로 산 주입이 필요 없습니다.",
                input.feed_ph, target
            ));
        }
    }

    if let Some(target) = opts.caustic_target_ph {
        check_target_ph(target)?;
        let rise = target - input.feed_ph;
        if rise > 0.0 {
            let chem = catalog.select(ChemicalKind::Caustic, opts.caustic.as_deref())?;
            result
                .doses
                .push(chemical_dose(chem, rise * CAUSTIC_MG_L_PER_PH_UNIT, input.feed_flow_m3h));
        }
    }

    if opts.dechlorination && input.free_chlorine_mg_l > 0.0 {
        let chem = catalog.select(ChemicalKind::Dechlorinator, opts.dechlorinator.as_deref())?;
        let dose = input.free_chlorine_mg_l * SBS_PER_CHLORINE;
        result.doses.push(chemical_dose(chem, dose, input.feed_flow_m3h));
    } else if input.free_chlorine_mg_l > 0.0 {
        result.recommendations.push(format!(
            "잔류염소 {:.2} mg/L: 폴리아마이드 막 산화 손상 방지를 위해 SBS 탈염소가 필요합니다.",
            input.free_chlorine_mg_l
        ));
    }

    result.total_cost_per_day = result.doses.iter().map(|d| d.cost_per_day).sum();
    Ok(result)
}

fn check_target_ph(ph: f64) -> Result<()> {
    if !(0.0..=14.0).contains(&ph) {
        return Err(RoError::InvalidInput(format!("목표 pH 는 0~14 범위여야 합니다: {ph}")));
    }
    Ok(())
}
