use serde::{Deserialize, Serialize};

/// 체적 유량 단위. 내부 기준은 m³/h이다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowUnit {
    CubicMeterPerHour,
    CubicMeterPerDay,
    /// US gallon per minute
    Gpm,
    /// US gallon per day
    Gpd,
}

const GPM_PER_M3H: f64 = 4.402_868;

fn to_base(value: f64, unit: FlowUnit) -> f64 {
    match unit {
        FlowUnit::CubicMeterPerHour => value,
        FlowUnit::CubicMeterPerDay => value / 24.0,
        FlowUnit::Gpm => value / GPM_PER_M3H,
        FlowUnit::Gpd => value / (GPM_PER_M3H * 1440.0),
    }
}

fn from_base(value: f64, unit: FlowUnit) -> f64 {
    match unit {
        FlowUnit::CubicMeterPerHour => value,
        FlowUnit::CubicMeterPerDay => value * 24.0,
        FlowUnit::Gpm => value * GPM_PER_M3H,
        FlowUnit::Gpd => value * GPM_PER_M3H * 1440.0,
    }
}

/// 유량을 변환한다.
pub fn convert_flow(value: f64, from: FlowUnit, to: FlowUnit) -> f64 {
    from_base(to_base(value, from), to)
}

/// m³/h 를 gpm 으로 환산한다. 엘리먼트 압력강하 상관식 입력용.
pub fn m3h_to_gpm(value_m3h: f64) -> f64 {
    value_m3h * GPM_PER_M3H
}

impl FlowUnit {
    /// 보고서 표기용 기호.
    pub fn symbol(self) -> &'static str {
        match self {
            FlowUnit::CubicMeterPerHour => "m3/h",
            FlowUnit::CubicMeterPerDay => "m3/d",
            FlowUnit::Gpm => "gpm",
            FlowUnit::Gpd => "gpd",
        }
    }
}
