use serde::{Deserialize, Serialize};

/// 압력 단위. 내부 기준은 psi(게이지)이다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PressureUnit {
    Psi,
    Bar,
    KiloPascal,
    MegaPascal,
}

const PSI_PER_BAR: f64 = 14.503_77;

/// 주어진 압력을 psi 로 변환한다.
pub fn to_psi(value: f64, unit: PressureUnit) -> f64 {
    match unit {
        PressureUnit::Psi => value,
        PressureUnit::Bar => value * PSI_PER_BAR,
        PressureUnit::KiloPascal => value / 100.0 * PSI_PER_BAR,
        PressureUnit::MegaPascal => value * 10.0 * PSI_PER_BAR,
    }
}

/// psi 값을 원하는 단위로 변환한다.
pub fn from_psi(value_psi: f64, unit: PressureUnit) -> f64 {
    match unit {
        PressureUnit::Psi => value_psi,
        PressureUnit::Bar => value_psi / PSI_PER_BAR,
        PressureUnit::KiloPascal => value_psi / PSI_PER_BAR * 100.0,
        PressureUnit::MegaPascal => value_psi / PSI_PER_BAR / 10.0,
    }
}

/// 압력을 원하는 단위로 변환한다.
pub fn convert_pressure(value: f64, from: PressureUnit, to: PressureUnit) -> f64 {
    from_psi(to_psi(value, from), to)
}

impl PressureUnit {
    /// 보고서 표기용 기호.
    pub fn symbol(self) -> &'static str {
        match self {
            PressureUnit::Psi => "psi",
            PressureUnit::Bar => "bar",
            PressureUnit::KiloPascal => "kPa",
            PressureUnit::MegaPascal => "MPa",
        }
    }
}
