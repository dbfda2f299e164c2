use thiserror::Error;

/// 설계 계산 중 발생 가능한 오류.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RoError {
    /// 물리적으로 허용되지 않는 입력(음수 농도, pH 범위 밖, 절대영도 등)
    #[error("입력 오류: {0}")]
    InvalidInput(String),

    /// 알 수 없는 막 모델, 비어 있는 배열 구성 등
    #[error("구성 오류: {0}")]
    Configuration(String),

    /// 엘리먼트 유입 유량이 0 이하인 운전점. 엘리먼트 계산에서 지역적으로 처리한다.
    #[error("운전점 오류: {0}")]
    InvalidOperatingPoint(String),

    /// 반복 계산 중 NaN/∞가 발생하여 해석을 중단함.
    /// `recovery`가 `None`이면 안정 반복이 없었고 `pressure_psi`는 시도한 압력이다.
    #[error("솔버 오류: {iteration}회차에서 수치 붕괴 ({})", last_state(.pressure_psi, .recovery))]
    Solver {
        iteration: usize,
        pressure_psi: f64,
        recovery: Option<f64>,
    },
}

fn last_state(pressure_psi: &f64, recovery: &Option<f64>) -> String {
    match recovery {
        Some(r) => format!("마지막 안정 압력 {pressure_psi:.1} psi, 회수율 {r:.4}"),
        None => format!("안정 반복 없음, 시도 압력 {pressure_psi:.1} psi"),
    }
}

pub type Result<T> = std::result::Result<T, RoError>;
