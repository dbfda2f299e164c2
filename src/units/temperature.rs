use serde::{Deserialize, Serialize};

/// 온도 단위를 정의한다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemperatureUnit {
    Celsius,
    Fahrenheit,
    Kelvin,
}

/// 절대영도(°C).
pub const ABSOLUTE_ZERO_C: f64 = -273.15;

/// 주어진 값을 섭씨로 변환한다.
pub fn to_celsius(value: f64, unit: TemperatureUnit) -> f64 {
    match unit {
        TemperatureUnit::Celsius => value,
        TemperatureUnit::Fahrenheit => (value - 32.0) * 5.0 / 9.0,
        TemperatureUnit::Kelvin => value + ABSOLUTE_ZERO_C,
    }
}

/// 섭씨 값을 원하는 단위로 변환한다.
pub fn from_celsius(value_c: f64, unit: TemperatureUnit) -> f64 {
    match unit {
        TemperatureUnit::Celsius => value_c,
        TemperatureUnit::Fahrenheit => value_c * 9.0 / 5.0 + 32.0,
        TemperatureUnit::Kelvin => value_c - ABSOLUTE_ZERO_C,
    }
}

/// 온도를 서로 다른 단위로 변환한다.
pub fn convert_temperature(value: f64, from: TemperatureUnit, to: TemperatureUnit) -> f64 {
    from_celsius(to_celsius(value, from), to)
}

impl TemperatureUnit {
    pub fn symbol(self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
            TemperatureUnit::Kelvin => "K",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fahrenheit_reference_points() {
        assert!((to_celsius(212.0, TemperatureUnit::Fahrenheit) - 100.0).abs() < 1e-9);
        assert!((from_celsius(25.0, TemperatureUnit::Fahrenheit) - 77.0).abs() < 1e-9);
    }

    #[test]
    fn kelvin_offset() {
        let k = convert_temperature(25.0, TemperatureUnit::Celsius, TemperatureUnit::Kelvin);
        assert!((k - 298.15).abs() < 1e-9);
    }
}
