//! 후처리 모듈 모음: 스케일 분석, 약품 데이터베이스, 약품 주입량/비용 계산.

pub mod analysis;
pub mod chemicals;
pub mod dosing;

pub use analysis::{post_process, ScalingAnalysis, TreatmentReport};
pub use chemicals::{ChemicalCatalog, ChemicalData, ChemicalKind};
pub use dosing::{DosingOptions, DosingResult};
