//! 다단 역삼투(RO) 막 계열 설계 계산 라이브러리.
//! 핵심 계산을 라이브러리로 분리하여 CLI 외의 화면/저장 계층에서도 그대로 쓸 수 있게 한다.

pub mod app;
pub mod case;
pub mod config;
pub mod error;
pub mod membrane;
pub mod treatment;
pub mod ui_cli;
pub mod units;
pub mod water;

pub use error::{Result, RoError};
