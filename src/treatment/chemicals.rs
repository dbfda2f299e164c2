/// 전처리 약품 데이터베이스. 순도는 상용 제품 기준, 단가는 참고용이다.
use serde::{Deserialize, Serialize};

use crate::error::{Result, RoError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChemicalKind {
    /// 스케일 방지제
    Antiscalant,
    /// pH 하향용 산
    Acid,
    /// pH 상향용 염기
    Caustic,
    /// 잔류염소 제거제
    Dechlorinator,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChemicalData {
    pub name: String,
    pub kind: ChemicalKind,
    /// 제품 중 유효성분 질량 분율(0~1)
    pub purity: f64,
    /// 제품 단가 [통화/kg]
    pub price_per_kg: f64,
}

const BUILTIN: &[(&str, ChemicalKind, f64, f64)] = &[
    ("Antiscalant", ChemicalKind::Antiscalant, 1.0, 4.5),
    ("H2SO4 98%", ChemicalKind::Acid, 0.98, 0.25),
    ("HCl 33%", ChemicalKind::Acid, 0.33, 0.20),
    ("NaOH 50%", ChemicalKind::Caustic, 0.50, 0.45),
    ("SBS 38%", ChemicalKind::Dechlorinator, 0.38, 0.60),
];

/// 약품 카탈로그. 막 카탈로그와 마찬가지로 해석 시 값으로 주입한다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChemicalCatalog {
    entries: Vec<ChemicalData>,
}

impl Default for ChemicalCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ChemicalCatalog {
    pub fn builtin() -> Self {
        Self {
            entries: BUILTIN
                .iter()
                .map(|&(name, kind, purity, price_per_kg)| ChemicalData {
                    name: name.to_string(),
                    kind,
                    purity,
                    price_per_kg,
                })
                .collect(),
        }
    }

    /// 항목을 추가한다. 같은 이름이 있으면 교체한다.
    pub fn with_entry(mut self, data: ChemicalData) -> Self {
        self.entries.retain(|c| !c.name.eq_ignore_ascii_case(&data.name));
        self.entries.push(data);
        self
    }

    pub fn entries(&self) -> &[ChemicalData] {
        &self.entries
    }

    pub fn find(&self, name: &str) -> Option<&ChemicalData> {
        self.entries
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name.trim()))
    }

    /// 이름이 주어지면 그 약품을, 없으면 해당 종류의 첫 항목을 고른다.
    pub fn select(&self, kind: ChemicalKind, name: Option<&str>) -> Result<&ChemicalData> {
        let found = match name {
            Some(n) => self.find(n).filter(|c| c.kind == kind),
            None => self.entries.iter().find(|c| c.kind == kind),
        };
        found.ok_or_else(|| {
            RoError::Configuration(format!(
                "약품을 찾을 수 없습니다: {} ({kind:?})",
                name.unwrap_or("-")
            ))
        })
    }
}
