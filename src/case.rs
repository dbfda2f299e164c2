//! TOML 설계 케이스 파일.
//!
//! 배열은 `[[topology.stages]]` 로 엘리먼트 단위까지 직접 적거나,
//! `[[layout]]` 에 단별 압력용기 수/용기당 엘리먼트 수/모델만 적어 균일 배열로 만들 수 있다.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::membrane::{DesignInput, SolverOptions, Stage, Topology, Vessel};
use crate::treatment::DosingOptions;
use crate::water::FeedWater;

/// 균일 단 배열 한 줄.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageLayout {
    pub vessels: usize,
    pub elements: usize,
    pub model: String,
    #[serde(default)]
    pub boost_psi: f64,
}

/// 케이스 파일 내용.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseFile {
    #[serde(default)]
    pub name: Option<String>,
    pub feed: FeedWater,
    pub target_recovery: f64,
    #[serde(default)]
    pub topology: Option<Topology>,
    #[serde(default)]
    pub layout: Vec<StageLayout>,
    /// 없으면 설정 파일의 솔버 기본값을 쓴다.
    #[serde(default)]
    pub options: Option<SolverOptions>,
    #[serde(default)]
    pub dosing: DosingOptions,
}

#[derive(Debug, Error)]
pub enum CaseError {
    #[error("케이스 파일 입출력 오류: {0}")]
    Io(#[from] std::io::Error),
    #[error("케이스 파싱 오류: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("케이스 구성 오류: {0}")]
    Invalid(String),
}

impl CaseFile {
    /// 명시 배열이 있으면 그대로, 없으면 `layout` 으로 배열을 만든다.
    pub fn topology(&self) -> Result<Topology, CaseError> {
        match (&self.topology, self.layout.is_empty()) {
            (Some(_), false) => Err(CaseError::Invalid(
                "topology 와 layout 을 동시에 지정할 수 없습니다".into(),
            )),
            (Some(t), true) => Ok(t.clone()),
            (None, _) => Ok(Topology {
                stages: self
                    .layout
                    .iter()
                    .map(|row| Stage {
                        vessels: (0..row.vessels)
                            .map(|_| Vessel::of(&row.model, row.elements))
                            .collect(),
                        boost_psi: row.boost_psi,
                    })
                    .collect(),
            }),
        }
    }

    /// 솔버 입력으로 변환한다.
    pub fn into_input(self, defaults: &SolverOptions) -> Result<DesignInput, CaseError> {
        let topology = self.topology()?;
        Ok(DesignInput {
            feed: self.feed,
            topology,
            target_recovery: self.target_recovery,
            options: self.options.unwrap_or_else(|| defaults.clone()),
            dosing: self.dosing,
        })
    }
}

pub fn parse_case(text: &str) -> Result<CaseFile, CaseError> {
    Ok(toml::from_str(text)?)
}

/// 케이스 파일을 읽는다.
pub fn load_case(path: &Path) -> Result<CaseFile, CaseError> {
    let content = fs::read_to_string(path)?;
    let case = parse_case(&content)?;
    log::debug!("케이스 로드: {} ({:?})", path.display(), case.name);
    Ok(case)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LAYOUT_CASE: &str = r#"
name = "brackish two stage"
target_recovery = 0.75

[feed]
temperature_c = 20.0
flow_m3h = 50.0
ph = 7.5
tds_mg_l = 2000.0

[[layout]]
vessels = 4
elements = 6
model = "BW30-400"

[[layout]]
vessels = 2
elements = 6
model = "BW30-400"
boost_psi = 30.0
"#;

    #[test]
    fn layout_expands_to_uniform_topology() {
        let case = parse_case(LAYOUT_CASE).expect("parse");
        let topology = case.topology().expect("topology");
        assert_eq!(topology.stages.len(), 2);
        assert_eq!(topology.stages[0].vessels.len(), 4);
        assert_eq!(topology.stages[1].boost_psi, 30.0);
        assert_eq!(topology.element_count(), 36);
    }

    #[test]
    fn missing_options_fall_back_to_defaults() {
        let defaults = SolverOptions {
            max_iterations: 42,
            ..SolverOptions::default()
        };
        let input = parse_case(LAYOUT_CASE)
            .expect("parse")
            .into_input(&defaults)
            .expect("input");
        assert_eq!(input.options.max_iterations, 42);
        assert_eq!(input.target_recovery, 0.75);
    }

    #[test]
    fn explicit_topology_parses() {
        let text = r#"
target_recovery = 0.1

[feed]
temperature_c = 25.0
flow_m3h = 10.0
ph = 7.0
tds_mg_l = 35000.0

[[topology.stages]]
[[topology.stages.vessels]]
elements = ["SW30XLE-400i"]
"#;
        let case = parse_case(text).expect("parse");
        assert_eq!(case.topology().expect("topology").element_count(), 1);
    }
}
