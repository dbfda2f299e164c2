use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::membrane::{MembraneCatalog, MembraneData, SolverOptions};
use crate::treatment::{ChemicalCatalog, ChemicalData};
use crate::units::{FlowUnit, PressureUnit, TemperatureUnit};

/// 기본 설정 파일 경로.
pub const CONFIG_FILE: &str = "config.toml";

/// 보고서 표기용 단위 시스템 프리셋.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum UnitSystem {
    /// bar, m³/h, °C
    SI,
    /// psi, gpm, °F
    US,
}

/// 물리량별 표기 단위.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayUnits {
    pub pressure: PressureUnit,
    pub flow: FlowUnit,
    pub temperature: TemperatureUnit,
}

impl UnitSystem {
    pub fn display_units(self) -> DisplayUnits {
        match self {
            UnitSystem::SI => DisplayUnits {
                pressure: PressureUnit::Bar,
                flow: FlowUnit::CubicMeterPerHour,
                temperature: TemperatureUnit::Celsius,
            },
            UnitSystem::US => DisplayUnits {
                pressure: PressureUnit::Psi,
                flow: FlowUnit::Gpm,
                temperature: TemperatureUnit::Fahrenheit,
            },
        }
    }
}

/// 애플리케이션 설정을 표현한다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub unit_system: UnitSystem,
    /// env_logger 필터 수준(error/warn/info/debug/trace)
    pub log_level: String,
    /// 케이스 파일에 [options] 가 없을 때 쓰는 솔버 기본값
    pub solver: SolverOptions,
    /// 내장 카탈로그에 추가/교체할 막 모델
    pub membranes: Vec<MembraneData>,
    /// 내장 카탈로그에 추가/교체할 약품
    pub chemicals: Vec<ChemicalData>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            unit_system: UnitSystem::SI,
            log_level: "info".to_string(),
            solver: SolverOptions::default(),
            membranes: Vec::new(),
            chemicals: Vec::new(),
        }
    }
}

/// 설정 로드/저장 시 발생 가능한 오류를 표현한다.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("파일 입출력 오류: {0}")]
    Io(#[from] std::io::Error),
    #[error("설정 파싱 오류: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("설정 직렬화 오류: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// 설정 파일을 로드하거나 없으면 기본 설정을 생성한다.
pub fn load_or_default(path: &Path) -> Result<Config, ConfigError> {
    if path.exists() {
        let content = fs::read_to_string(path)?;
        let cfg: Config = toml::from_str(&content)?;
        Ok(cfg)
    } else {
        let cfg = Config::default();
        cfg.save(path)?;
        Ok(cfg)
    }
}

impl Config {
    /// 설정을 파일에 저장한다.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// 내장 막 카탈로그에 설정의 추가 항목을 반영한다.
    pub fn membrane_catalog(&self) -> MembraneCatalog {
        self.membranes
            .iter()
            .cloned()
            .fold(MembraneCatalog::builtin(), MembraneCatalog::with_entry)
    }

    /// 내장 약품 카탈로그에 설정의 추가 항목을 반영한다.
    pub fn chemical_catalog(&self) -> ChemicalCatalog {
        self.chemicals
            .iter()
            .cloned()
            .fold(ChemicalCatalog::builtin(), ChemicalCatalog::with_entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrips_through_toml() {
        let cfg = Config::default();
        let text = toml::to_string_pretty(&cfg).expect("serialize");
        let back: Config = toml::from_str(&text).expect("parse");
        assert_eq!(back, cfg);
    }

    #[test]
    fn extra_membrane_overrides_builtin() {
        let mut m = MembraneCatalog::builtin()
            .find("BW30-400")
            .cloned()
            .expect("builtin");
        m.water_permeability_lmh_psi = 0.5;
        let cfg = Config {
            membranes: vec![m],
            ..Config::default()
        };
        let catalog = cfg.membrane_catalog();
        let found = catalog.find("bw30-400").expect("lookup");
        assert_eq!(found.water_permeability_lmh_psi, 0.5);
        assert_eq!(catalog.entries().len(), MembraneCatalog::builtin().entries().len());
    }
}
