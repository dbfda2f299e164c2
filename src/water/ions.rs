//! 용존 화학종(양이온/음이온/중성종) 기준 데이터와 농도 맵 보조 함수.
//! 분자량은 g/mol, 농도는 mg/L 로 다룬다.

use std::collections::BTreeMap;

/// 이온 이름 → 농도(mg/L) 맵.
pub type IonConcentrations = BTreeMap<String, f64>;

/// 전하에 따른 화학종 분류.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Valence {
    Monovalent,
    Divalent,
    Neutral,
}

impl Valence {
    /// 이온강도 계산용 z².
    pub fn z_squared(self) -> f64 {
        match self {
            Valence::Monovalent => 1.0,
            Valence::Divalent => 4.0,
            Valence::Neutral => 0.0,
        }
    }
}

#[derive(Debug)]
pub struct IonData {
    pub code: &'static str,
    pub name: &'static str,
    pub molar_mass: f64,
    pub valence: Valence,
}

const fn ion(code: &'static str, name: &'static str, molar_mass: f64, valence: Valence) -> IonData {
    IonData {
        code,
        name,
        molar_mass,
        valence,
    }
}

const IONS: &[IonData] = &[
    // 양이온
    ion("Ca", "Calcium", 40.078, Valence::Divalent),
    ion("Mg", "Magnesium", 24.305, Valence::Divalent),
    ion("Na", "Sodium", 22.990, Valence::Monovalent),
    ion("K", "Potassium", 39.098, Valence::Monovalent),
    ion("NH4", "Ammonium", 18.038, Valence::Monovalent),
    ion("Ba", "Barium", 137.327, Valence::Divalent),
    ion("Sr", "Strontium", 87.62, Valence::Divalent),
    ion("Fe", "Iron", 55.845, Valence::Divalent),
    ion("Mn", "Manganese", 54.938, Valence::Divalent),
    // 음이온
    ion("Cl", "Chloride", 35.453, Valence::Monovalent),
    ion("SO4", "Sulfate", 96.06, Valence::Divalent),
    ion("HCO3", "Bicarbonate", 61.017, Valence::Monovalent),
    ion("CO3", "Carbonate", 60.009, Valence::Divalent),
    ion("NO3", "Nitrate", 62.004, Valence::Monovalent),
    ion("F", "Fluoride", 18.998, Valence::Monovalent),
    ion("Br", "Bromide", 79.904, Valence::Monovalent),
    // 중성종
    ion("SiO2", "Silica", 60.084, Valence::Neutral),
    ion("B", "Boron", 10.81, Valence::Neutral),
    ion("CO2", "Carbon dioxide", 44.01, Valence::Neutral),
];

/// NaCl 질량 분율 (Na / Cl).
const NACL_SODIUM_FRACTION: f64 = 22.990 / (22.990 + 35.453);

pub fn ions() -> &'static [IonData] {
    IONS
}

/// 기호 또는 이름으로 화학종을 찾는다. 대소문자는 구분하지 않는다.
pub fn find_ion(code: &str) -> Option<&'static IonData> {
    let code = code.trim();
    IONS.iter()
        .find(|i| i.code.eq_ignore_ascii_case(code) || i.name.eq_ignore_ascii_case(code))
}

/// 맵에서 주어진 화학종의 농도(mg/L)를 찾는다. 표기가 달라도 같은 화학종이면 합산한다.
pub fn concentration_of(ions: &IonConcentrations, code: &str) -> f64 {
    ions.iter()
        .filter(|(name, _)| find_ion(name).is_some_and(|d| d.code == code))
        .map(|(_, c)| *c)
        .sum()
}

/// 각 화학종의 몰농도(mol/L)를 구한다. 알 수 없는 이름은 건너뛴다.
pub fn molar_concentrations(ions: &IonConcentrations) -> Vec<(&'static IonData, f64)> {
    ions.iter()
        .filter(|(_, c)| **c > 0.0)
        .filter_map(|(name, c)| find_ion(name).map(|d| (d, c / 1000.0 / d.molar_mass)))
        .collect()
}

/// 화학종 농도 총합(mg/L).
pub fn total_mg_l(ions: &IonConcentrations) -> f64 {
    ions.values().filter(|c| **c > 0.0).sum()
}

/// 회수율에 따른 농축수 조성. 모든 화학종을 1/(1-r) 배로 농축한다.
pub fn concentrate(ions: &IonConcentrations, recovery: f64) -> IonConcentrations {
    let factor = concentration_factor(recovery);
    ions.iter().map(|(k, v)| (k.clone(), v * factor)).collect()
}

/// 농축 배수 1/(1-r). r 은 [0, 0.999] 로 제한한다.
pub fn concentration_factor(recovery: f64) -> f64 {
    1.0 / (1.0 - recovery.clamp(0.0, 0.999))
}

/// 이온 분석값이 없을 때 TDS 를 NaCl 당량 조성으로 가정한다.
pub fn nacl_equivalent(tds_mg_l: f64) -> IonConcentrations {
    let tds = tds_mg_l.max(0.0);
    let mut map = IonConcentrations::new();
    map.insert("Na".into(), tds * NACL_SODIUM_FRACTION);
    map.insert("Cl".into(), tds * (1.0 - NACL_SODIUM_FRACTION));
    map
}
