/// 8인치 막 엘리먼트의 물성 및 운전 한계 데이터베이스.
/// 값은 제조사 공개 사양을 바탕으로 한 참고용 근사치이며 실제 설계 시 최신 자료로 검증해야 한다.
use serde::{Deserialize, Serialize};

use crate::error::{Result, RoError};

/// 막 등급. 해수용과 기수용은 단일 엘리먼트 회수율 상한과 초기 압력 추정식이 다르다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MembraneClass {
    SeaWater,
    Brackish,
}

impl MembraneClass {
    /// 엘리먼트 1개의 물리적 회수율 상한.
    pub fn max_element_recovery(self) -> f64 {
        match self {
            MembraneClass::SeaWater => 0.12,
            MembraneClass::Brackish => 0.15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MembraneData {
    pub model: String,
    pub class: MembraneClass,
    /// 유효 막면적 [m²]
    pub area_m2: f64,
    /// 순수 투과계수 A [LMH/psi]
    pub water_permeability_lmh_psi: f64,
    /// 염 투과계수 B [LMH]
    pub salt_permeability_lmh: f64,
    /// 공칭 염 제거율(0~1)
    pub rejection: f64,
    pub max_flux_lmh: f64,
    pub max_feed_flow_m3h: f64,
    pub max_pressure_drop_psi: f64,
    pub max_pressure_psi: f64,
}

struct Datasheet {
    model: &'static str,
    class: MembraneClass,
    area_m2: f64,
    a: f64,
    b: f64,
    rejection: f64,
}

const fn sw(model: &'static str, area_m2: f64, a: f64, b: f64, rejection: f64) -> Datasheet {
    Datasheet {
        model,
        class: MembraneClass::SeaWater,
        area_m2,
        a,
        b,
        rejection,
    }
}

const fn bw(model: &'static str, area_m2: f64, a: f64, b: f64, rejection: f64) -> Datasheet {
    Datasheet {
        model,
        class: MembraneClass::Brackish,
        area_m2,
        a,
        b,
        rejection,
    }
}

const BUILTIN: &[Datasheet] = &[
    sw("SW30HRLE-440i", 40.9, 0.075, 0.040, 0.9985),
    sw("SW30XLE-400i", 37.2, 0.085, 0.055, 0.997),
    sw("SW30HR-380", 35.3, 0.065, 0.035, 0.997),
    sw("SWC5-LD", 37.2, 0.080, 0.045, 0.998),
    bw("BW30-400", 37.2, 0.21, 0.10, 0.995),
    bw("BW30LE-440", 40.9, 0.28, 0.12, 0.993),
    bw("ESPA2-LD", 37.2, 0.30, 0.09, 0.996),
    bw("XLE-440", 40.9, 0.36, 0.20, 0.990),
    bw("NF90-400", 37.2, 0.45, 0.60, 0.970),
];

impl From<&Datasheet> for MembraneData {
    fn from(s: &Datasheet) -> Self {
        let (max_flux_lmh, max_feed_flow_m3h, max_pressure_psi) = match s.class {
            MembraneClass::SeaWater => (35.0, 16.0, 1200.0),
            MembraneClass::Brackish => (40.0, 17.0, 600.0),
        };
        MembraneData {
            model: s.model.to_string(),
            class: s.class,
            area_m2: s.area_m2,
            water_permeability_lmh_psi: s.a,
            salt_permeability_lmh: s.b,
            rejection: s.rejection,
            max_flux_lmh,
            max_feed_flow_m3h,
            max_pressure_drop_psi: 15.0,
            max_pressure_psi,
        }
    }
}

impl MembraneData {
    /// 면적, 투과계수는 유한한 양수, 제거율은 (0, 1) 이어야 한다.
    pub fn validate(&self) -> Result<()> {
        for (label, value) in [
            ("면적", self.area_m2),
            ("순수 투과계수 A", self.water_permeability_lmh_psi),
            ("염 투과계수 B", self.salt_permeability_lmh),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(RoError::Configuration(format!(
                    "막 모델 {}: {label}는 유한한 양수여야 합니다: {value}",
                    self.model
                )));
            }
        }
        if !(self.rejection > 0.0 && self.rejection < 1.0) {
            return Err(RoError::Configuration(format!(
                "막 모델 {}: 제거율은 0과 1 사이여야 합니다: {}",
                self.model, self.rejection
            )));
        }
        Ok(())
    }
}

/// 막 물성 카탈로그. 해석 호출 시 값으로 주입한다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MembraneCatalog {
    entries: Vec<MembraneData>,
}

impl Default for MembraneCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl MembraneCatalog {
    /// 내장 데이터만으로 구성한 카탈로그.
    pub fn builtin() -> Self {
        Self {
            entries: BUILTIN.iter().map(MembraneData::from).collect(),
        }
    }

    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// 항목을 추가한다. 같은 모델명이 있으면 교체한다.
    pub fn with_entry(mut self, data: MembraneData) -> Self {
        self.entries.retain(|m| !m.model.eq_ignore_ascii_case(&data.model));
        self.entries.push(data);
        self
    }

    pub fn entries(&self) -> &[MembraneData] {
        &self.entries
    }

    pub fn find(&self, model: &str) -> Option<&MembraneData> {
        self.entries
            .iter()
            .find(|m| m.model.eq_ignore_ascii_case(model.trim()))
    }

    /// 모델명을 조회하고, 없으면 구성 오류를 반환한다.
    pub fn lookup(&self, model: &str) -> Result<&MembraneData> {
        self.find(model)
            .ok_or_else(|| RoError::Configuration(format!("알 수 없는 막 모델: {model}")))
    }
}
