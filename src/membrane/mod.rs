//! 막 계열 계산 모듈 모음.
//! 막 카탈로그, 엘리먼트 물질전달 모델, 단/용기 집계, 급수 압력 탐색 솔버로 구성한다.

pub mod catalog;
pub mod element;
pub mod solver;
pub mod train;

pub use catalog::{MembraneCatalog, MembraneClass, MembraneData};
pub use element::{ElementFeed, ElementPosition, ElementState, OperatingContext};
pub use solver::{
    run_at_pressure, solve, DesignInput, IterationRecord, PressureSearch, SolveStatus,
    SolverOptions, SolverState, SystemResult,
};
pub use train::{Stage, StageSummary, Topology, TrainPass, Vessel};
