use serde::{Deserialize, Serialize};

use super::chemistry::{conductivity_to_tds, kelvin, osmotic_pressure, osmotic_pressure_from_tds};
use super::ions::{total_mg_l, IonConcentrations};
use crate::error::{Result, RoError};

/// 원수(급수) 조건.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedWater {
    /// 수온(°C)
    pub temperature_c: f64,
    /// 급수 유량(m³/h)
    pub flow_m3h: f64,
    pub ph: f64,
    /// 총용존고형물(mg/L). `None`이면 이온 합계 또는 전도도로부터 구한다.
    #[serde(default)]
    pub tds_mg_l: Option<f64>,
    /// 전도도(µS/cm)
    #[serde(default)]
    pub conductivity_us_cm: Option<f64>,
    /// 이온 분석값(mg/L)
    #[serde(default)]
    pub ions: IonConcentrations,
    /// 유리잔류염소(mg/L). SBS 주입량 계산에 사용한다.
    #[serde(default)]
    pub free_chlorine_mg_l: f64,
}

impl FeedWater {
    /// TDS 만으로 정의한 급수.
    pub fn from_tds(flow_m3h: f64, tds_mg_l: f64, temperature_c: f64, ph: f64) -> Self {
        Self {
            temperature_c,
            flow_m3h,
            ph,
            tds_mg_l: Some(tds_mg_l),
            conductivity_us_cm: None,
            ions: IonConcentrations::new(),
            free_chlorine_mg_l: 0.0,
        }
    }

    /// 물리적으로 허용되지 않는 입력을 거부한다.
    pub fn validate(&self) -> Result<()> {
        kelvin(self.temperature_c)?;
        if !(0.0..=14.0).contains(&self.ph) {
            return Err(RoError::InvalidInput(format!(
                "pH 는 0~14 범위여야 합니다: {}",
                self.ph
            )));
        }
        if !self.flow_m3h.is_finite() || self.flow_m3h <= 0.0 {
            return Err(RoError::InvalidInput(format!(
                "급수 유량은 0보다 커야 합니다: {}",
                self.flow_m3h
            )));
        }
        if let Some((name, c)) = self.ions.iter().find(|(_, c)| !c.is_finite() || **c < 0.0) {
            return Err(RoError::InvalidInput(format!(
                "{name} 농도가 음수이거나 유효하지 않습니다: {c}"
            )));
        }
        for (label, value) in [
            ("TDS", self.tds_mg_l),
            ("전도도", self.conductivity_us_cm),
            ("잔류염소", Some(self.free_chlorine_mg_l)),
        ] {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    return Err(RoError::InvalidInput(format!("{label} 값이 음수입니다: {v}")));
                }
            }
        }
        Ok(())
    }

    /// TDS 결정 순서: 명시값 → 이온 합계 → 전도도 환산.
    pub fn resolved_tds(&self) -> Result<f64> {
        if let Some(tds) = self.tds_mg_l {
            return Ok(tds);
        }
        let ion_sum = total_mg_l(&self.ions);
        if ion_sum > 0.0 {
            return Ok(ion_sum);
        }
        match self.conductivity_us_cm {
            Some(ec) => conductivity_to_tds(ec),
            None => Err(RoError::InvalidInput(
                "TDS, 이온 분석값, 전도도 중 하나는 주어져야 합니다.".into(),
            )),
        }
    }

    /// 급수 삼투압(psi). 이온 분석값이 있으면 이를, 없으면 NaCl 당량을 쓴다.
    pub fn osmotic_pressure_psi(&self) -> Result<f64> {
        if total_mg_l(&self.ions) > 0.0 {
            osmotic_pressure(&self.ions, self.temperature_c)
        } else {
            osmotic_pressure_from_tds(self.resolved_tds()?, self.temperature_c)
        }
    }
}
