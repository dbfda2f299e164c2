//! 난용성 염 포화도와 Langelier 포화지수(LSI).
//!
//! 포화도는 농축수 기준으로 계산한다. 각 이온을 1/(1−r) 배 농축하고, Davies 식
//! 활동도계수를 곱한 이온활동도곱을 온도보정된 용해도곱(Ksp)으로 나눈다.
//! 1.0 을 넘으면 과포화이다.

use serde::{Deserialize, Serialize};

use super::chemistry::{ionic_strength, kelvin};
use super::ions::{concentrate, concentration_factor, concentration_of, find_ion, total_mg_l, IonConcentrations};
use crate::error::{Result, RoError};

/// 탄산 2차 해리상수 pK₂ (25°C)
const CARBONATE_PK2: f64 = 10.33;
/// 기체상수 [kJ/(mol·K)]
const GAS_CONSTANT_KJ: f64 = 8.314e-3;
/// CaCO₃ 당량 환산계수
const CA_AS_CACO3: f64 = 100.09 / 40.078;
const HCO3_AS_CACO3: f64 = 50.04 / 61.017;
const CO3_AS_CACO3: f64 = 50.04 / 30.005;

/// 스케일 형성 화합물.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ScaleCompound {
    CaCO3,
    CaSO4,
    BaSO4,
    CaF2,
}

impl ScaleCompound {
    pub const ALL: [ScaleCompound; 4] = [
        ScaleCompound::CaCO3,
        ScaleCompound::CaSO4,
        ScaleCompound::BaSO4,
        ScaleCompound::CaF2,
    ];

    pub fn formula(self) -> &'static str {
        match self {
            ScaleCompound::CaCO3 => "CaCO3",
            ScaleCompound::CaSO4 => "CaSO4",
            ScaleCompound::BaSO4 => "BaSO4",
            ScaleCompound::CaF2 => "CaF2",
        }
    }

    /// 25°C 용해도곱과 용해 엔탈피(kJ/mol).
    fn ksp_data(self) -> (f64, f64) {
        match self {
            ScaleCompound::CaCO3 => (3.36e-9, -12.5),
            ScaleCompound::CaSO4 => (2.63e-5, -1.1),
            ScaleCompound::BaSO4 => (1.08e-10, 26.3),
            ScaleCompound::CaF2 => (3.45e-11, 11.7),
        }
    }

    /// van't Hoff 식으로 온도보정한 용해도곱.
    pub fn solubility_product(self, temp_c: f64) -> Result<f64> {
        let temp_k = kelvin(temp_c)?;
        let (ksp_25, dh) = self.ksp_data();
        Ok(ksp_25 * (-dh / GAS_CONSTANT_KJ * (1.0 / temp_k - 1.0 / 298.15)).exp())
    }
}

/// 화합물별 포화도.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SaturationRatio {
    pub compound: ScaleCompound,
    /// 이온활동도곱 / Ksp
    pub ratio: f64,
}

impl SaturationRatio {
    pub fn is_supersaturated(&self) -> bool {
        self.ratio > 1.0
    }
}

/// Davies 식 활동도계수. A 는 온도에 대해 선형 근사한다.
pub fn davies_activity_coefficient(charge: f64, ionic_strength: f64, temp_c: f64) -> f64 {
    let a = 0.4883 + 8.074e-4 * temp_c;
    let sqrt_i = ionic_strength.max(0.0).sqrt();
    let log_gamma = -a * charge * charge * (sqrt_i / (1.0 + sqrt_i) - 0.3 * ionic_strength);
    10f64.powf(log_gamma)
}

/// 회수율 r 에서의 농축수 포화도를 계산한다.
pub fn saturation_ratios(
    ions: &IonConcentrations,
    recovery: f64,
    temp_c: f64,
    ph: f64,
) -> Result<Vec<SaturationRatio>> {
    check_ph(ph)?;
    if !(0.0..1.0).contains(&recovery) {
        return Err(RoError::InvalidInput(format!(
            "회수율은 0 이상 1 미만이어야 합니다: {recovery}"
        )));
    }
    let cf = concentration_factor(recovery);
    let strength = ionic_strength(ions) * cf;
    let g1 = davies_activity_coefficient(1.0, strength, temp_c);
    let g2 = davies_activity_coefficient(2.0, strength, temp_c);

    let molar = |code: &str| -> f64 {
        let mw = find_ion(code).map(|d| d.molar_mass).unwrap_or(1.0);
        concentration_of(ions, code) * cf / 1000.0 / mw
    };
    let ca = molar("Ca");
    let so4 = molar("SO4");
    let ba = molar("Ba");
    let f = molar("F");
    let co3 = molar("CO3") + molar("HCO3") * 10f64.powf(ph - CARBONATE_PK2);

    ScaleCompound::ALL
        .iter()
        .map(|&compound| {
            let iap = match compound {
                ScaleCompound::CaCO3 => g2 * ca * g2 * co3,
                ScaleCompound::CaSO4 => g2 * ca * g2 * so4,
                ScaleCompound::BaSO4 => g2 * ba * g2 * so4,
                ScaleCompound::CaF2 => g2 * ca * (g1 * f).powi(2),
            };
            let ksp = compound.solubility_product(temp_c)?;
            Ok(SaturationRatio {
                compound,
                ratio: iap / ksp,
            })
        })
        .collect()
}

/// Langelier 포화지수 LSI = pH − pHs.
///
/// pHs = (9.3 + A + B) − (C + D)
/// - A = (log₁₀ TDS − 1) / 10
/// - B = −13.12 · log₁₀(T + 273) + 34.55
/// - C = log₁₀(Ca as CaCO₃) − 0.4
/// - D = log₁₀(알칼리도 as CaCO₃)
///
/// 칼슘 또는 알칼리도가 없으면 정의되지 않으므로 `None`.
pub fn langelier_index(ions: &IonConcentrations, ph: f64, temp_c: f64) -> Result<Option<f64>> {
    check_ph(ph)?;
    kelvin(temp_c)?;
    let tds = total_mg_l(ions);
    let ca = concentration_of(ions, "Ca") * CA_AS_CACO3;
    let alk = concentration_of(ions, "HCO3") * HCO3_AS_CACO3 + concentration_of(ions, "CO3") * CO3_AS_CACO3;
    if tds <= 0.0 || ca <= 0.0 || alk <= 0.0 {
        return Ok(None);
    }
    let a = (tds.log10() - 1.0) / 10.0;
    let b = -13.12 * (temp_c + 273.0).log10() + 34.55;
    let c = ca.log10() - 0.4;
    let d = alk.log10();
    let phs = 9.3 + a + b - (c + d);
    Ok(Some(ph - phs))
}

/// 회수율 r 에서 농축수의 LSI.
pub fn concentrate_langelier_index(
    ions: &IonConcentrations,
    recovery: f64,
    ph: f64,
    temp_c: f64,
) -> Result<Option<f64>> {
    langelier_index(&concentrate(ions, recovery), ph, temp_c)
}

fn check_ph(ph: f64) -> Result<()> {
    if !(0.0..=14.0).contains(&ph) {
        return Err(RoError::InvalidInput(format!("pH 는 0~14 범위여야 합니다: {ph}")));
    }
    Ok(())
}
