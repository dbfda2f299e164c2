//! 수질 기본 물성 함수: 전도도→TDS, 온도보정계수(TCF), 이온강도, 삼투압.

use super::ions::{molar_concentrations, nacl_equivalent, IonConcentrations};
use crate::error::{Result, RoError};
use crate::units::ABSOLUTE_ZERO_C;

/// 전도도 상관식 분기점 [µS/cm]
pub const CONDUCTIVITY_BRANCH_US_CM: f64 = 7630.0;

// TDS = a · EC · exp(b · EC), 두 구간 모두 분기점에서 같은 값을 내도록 맞춘 계수
const LOW_EC_COEFF: f64 = 0.5;
const LOW_EC_EXP: f64 = 3.5e-6;
const HIGH_EC_COEFF: f64 = 0.4908;
const HIGH_EC_EXP: f64 = 5.93e-6;

/// 25°C 이상 구간의 TCF 상수
pub const TCF_K_ABOVE_25C: f64 = 2640.0;
/// 25°C 미만 구간의 TCF 상수
pub const TCF_K_BELOW_25C: f64 = 3020.0;

/// van't Hoff 계수 [psi / (K · mol/kg)]
const VANT_HOFF_PSI: f64 = 1.12;

/// 전도도(µS/cm)로부터 TDS(mg/L)를 추정한다.
pub fn conductivity_to_tds(conductivity_us_cm: f64) -> Result<f64> {
    if !conductivity_us_cm.is_finite() || conductivity_us_cm < 0.0 {
        return Err(RoError::InvalidInput(format!(
            "전도도는 0 이상이어야 합니다: {conductivity_us_cm}"
        )));
    }
    let ec = conductivity_us_cm;
    let tds = if ec > CONDUCTIVITY_BRANCH_US_CM {
        HIGH_EC_COEFF * ec * (HIGH_EC_EXP * ec).exp()
    } else {
        LOW_EC_COEFF * ec * (LOW_EC_EXP * ec).exp()
    };
    Ok(tds)
}

/// 막 투과계수 온도보정계수. 25°C 에서 1.0.
///
/// TCF = exp(k · (1/298.15 − 1/(T + 273.15))), k 는 25°C 기준 상하로 다르다.
pub fn temperature_correction_factor(temp_c: f64) -> Result<f64> {
    let temp_k = kelvin(temp_c)?;
    let k = if temp_c >= 25.0 {
        TCF_K_ABOVE_25C
    } else {
        TCF_K_BELOW_25C
    };
    Ok((k * (1.0 / 298.15 - 1.0 / temp_k)).exp())
}

/// 이온 조성으로부터 삼투압(psi)을 계산한다. 알 수 없는 화학종은 무시한다.
pub fn osmotic_pressure(ions: &IonConcentrations, temp_c: f64) -> Result<f64> {
    kelvin(temp_c)?;
    let molality: f64 = molar_concentrations(ions).iter().map(|(_, m)| m).sum();
    Ok(VANT_HOFF_PSI * (273.0 + temp_c) * molality)
}

/// 이온 분석값이 없을 때 NaCl 당량으로 삼투압을 추정한다.
pub fn osmotic_pressure_from_tds(tds_mg_l: f64, temp_c: f64) -> Result<f64> {
    osmotic_pressure(&nacl_equivalent(tds_mg_l), temp_c)
}

/// 이온강도 I = ½ Σ cᵢ zᵢ² [mol/L]. 중성종은 기여하지 않는다.
pub fn ionic_strength(ions: &IonConcentrations) -> f64 {
    0.5 * molar_concentrations(ions)
        .iter()
        .map(|(d, m)| m * d.valence.z_squared())
        .sum::<f64>()
}

/// 섭씨를 켈빈으로 바꾸고 절대영도 이하를 거부한다.
pub(crate) fn kelvin(temp_c: f64) -> Result<f64> {
    if !temp_c.is_finite() || temp_c <= ABSOLUTE_ZERO_C {
        return Err(RoError::InvalidInput(format!(
            "온도가 절대영도 이하이거나 유효하지 않습니다: {temp_c} °C"
        )));
    }
    Ok(temp_c - ABSOLUTE_ZERO_C)
}
