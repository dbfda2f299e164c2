//! 보고서 표기용 단위 정의 및 변환 모듈 모음.
//! 계산 내부 기준은 psi(게이지), m³/h, °C 이다.

pub mod flow;
pub mod pressure;
pub mod temperature;

pub use flow::{convert_flow, m3h_to_gpm, FlowUnit};
pub use pressure::{convert_pressure, from_psi, to_psi, PressureUnit};
pub use temperature::{convert_temperature, from_celsius, to_celsius, TemperatureUnit, ABSOLUTE_ZERO_C};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_to_psi() {
        let psi = convert_pressure(1.0, PressureUnit::Bar, PressureUnit::Psi);
        assert!((psi - 14.50377).abs() < 1e-4);
    }

    #[test]
    fn m3h_to_gpm_reference() {
        let gpm = convert_flow(10.0, FlowUnit::CubicMeterPerHour, FlowUnit::Gpm);
        assert!((gpm - 44.02868).abs() < 1e-4);
        assert!((m3h_to_gpm(10.0) - gpm).abs() < 1e-12);
    }

    #[test]
    fn m3d_is_24_times_m3h() {
        let m3d = convert_flow(2.5, FlowUnit::CubicMeterPerHour, FlowUnit::CubicMeterPerDay);
        assert!((m3d - 60.0).abs() < 1e-12);
    }
}
