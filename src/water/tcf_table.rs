/// 운전 데이터 정규화에서 쓰는 표 기반 온도보정계수와 선형 보간을 제공한다.
/// 설계 솔버는 `chemistry::temperature_correction_factor`(지수식)를 쓰며 이 표는 쓰지 않는다.

#[derive(Debug, Clone, Copy)]
pub struct TcfPoint {
    pub temp_c: f64,
    pub factor: f64,
}

impl TcfPoint {
    pub const fn new(temp_c: f64, factor: f64) -> Self {
        Self { temp_c, factor }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TcfValue {
    pub factor: f64,
    pub source_temp_c: f64,
    /// true면 표 범위 밖이라 가장자리 값으로 클램프됨을 의미한다.
    pub clamped: bool,
}

const fn tp(temp_c: f64, factor: f64) -> TcfPoint {
    TcfPoint::new(temp_c, factor)
}

const TCF_TABLE: &[TcfPoint] = &[
    tp(5.0, 0.52),
    tp(10.0, 0.62),
    tp(15.0, 0.73),
    tp(20.0, 0.86),
    tp(25.0, 1.00),
    tp(30.0, 1.16),
    tp(35.0, 1.33),
    tp(40.0, 1.51),
    tp(45.0, 1.70),
];

pub fn tcf_table() -> &'static [TcfPoint] {
    TCF_TABLE
}

/// 표 기반 TCF. 범위 밖 온도는 가장자리 값으로 클램프한다.
pub fn tcf_from_table(temp_c: f64) -> TcfValue {
    interpolate(TCF_TABLE, temp_c)
}

fn interpolate(points: &[TcfPoint], temp_c: f64) -> TcfValue {
    let first = points[0];
    let last = points[points.len() - 1];
    if temp_c <= first.temp_c {
        return TcfValue {
            factor: first.factor,
            source_temp_c: first.temp_c,
            clamped: temp_c < first.temp_c,
        };
    }
    if temp_c >= last.temp_c {
        return TcfValue {
            factor: last.factor,
            source_temp_c: last.temp_c,
            clamped: temp_c > last.temp_c,
        };
    }
    for win in points.windows(2) {
        let (a, b) = (win[0], win[1]);
        if temp_c >= a.temp_c && temp_c <= b.temp_c {
            let frac = (temp_c - a.temp_c) / (b.temp_c - a.temp_c);
            return TcfValue {
                factor: a.factor + frac * (b.factor - a.factor),
                source_temp_c: temp_c,
                clamped: false,
            };
        }
    }
    // NaN 입력
    TcfValue {
        factor: f64::NAN,
        source_temp_c: temp_c,
        clamped: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_temperature_is_unity() {
        let v = tcf_from_table(25.0);
        assert!((v.factor - 1.0).abs() < 1e-12);
        assert!(!v.clamped);
    }

    #[test]
    fn midpoint_is_linear() {
        let v = tcf_from_table(27.5);
        assert!((v.factor - 1.08).abs() < 1e-9);
    }

    #[test]
    fn out_of_range_clamps() {
        let cold = tcf_from_table(1.0);
        assert!(cold.clamped);
        assert_eq!(cold.factor, 0.52);
        let hot = tcf_from_table(60.0);
        assert!(hot.clamped);
        assert_eq!(hot.source_temp_c, 45.0);
    }
}
