use std::path::PathBuf;

use clap::{Parser, Subcommand};
use thiserror::Error;

use crate::case::{load_case, CaseError};
use crate::config::{Config, ConfigError, UnitSystem, CONFIG_FILE};
use crate::error::RoError;
use crate::membrane::{run_at_pressure, solve};
use crate::ui_cli;
use crate::units::{to_psi, PressureUnit};
use crate::water::{tcf_table::tcf_from_table, temperature_correction_factor};

/// 애플리케이션 실행 중 발생 가능한 오류를 표현한다.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("입출력 오류: {0}")]
    Io(#[from] std::io::Error),
    #[error("설정 오류: {0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Case(#[from] CaseError),
    #[error("설계 계산 오류: {0}")]
    Design(#[from] RoError),
    #[error("JSON 출력 오류: {0}")]
    Json(#[from] serde_json::Error),
}

/// 명령행 인자.
#[derive(Debug, Parser)]
#[command(name = "ro_design_toolbox", version, about = "다단 역삼투(RO) 막 계열 설계 계산기")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
    /// 설정 파일 경로(없으면 기본값으로 생성)
    #[arg(long, global = true, default_value = CONFIG_FILE)]
    pub config: PathBuf,
    /// 로그 수준. 지정하지 않으면 설정 파일 값을 쓴다.
    #[arg(long, global = true)]
    pub log_level: Option<String>,
    /// 보고서 단위계. 지정하지 않으면 설정 파일 값을 쓴다.
    #[arg(long, global = true, value_enum)]
    pub units: Option<UnitSystem>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// 설계 케이스의 목표 회수율을 만족하는 급수 압력을 찾는다
    Solve {
        case: PathBuf,
        /// 결과를 JSON 으로 출력
        #[arg(long)]
        json: bool,
        /// 엘리먼트별 결과 출력
        #[arg(long)]
        elements: bool,
        /// 반복 이력 출력
        #[arg(long)]
        trace: bool,
    },
    /// 지정한 급수 압력에서 계열을 1회 계산한다
    Rate {
        case: PathBuf,
        /// 급수 압력(단위는 --pressure-unit)
        #[arg(long)]
        pressure: f64,
        #[arg(long, value_enum, default_value = "bar")]
        pressure_unit: PressureArg,
    },
    /// 막/약품 카탈로그를 출력한다
    Catalog,
    /// 수온에 따른 온도 보정계수를 비교한다
    Tcf { temperature_c: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum PressureArg {
    Psi,
    Bar,
    Kpa,
}

impl From<PressureArg> for PressureUnit {
    fn from(value: PressureArg) -> Self {
        match value {
            PressureArg::Psi => PressureUnit::Psi,
            PressureArg::Bar => PressureUnit::Bar,
            PressureArg::Kpa => PressureUnit::KiloPascal,
        }
    }
}

/// 애플리케이션 메인 루틴.
pub fn run(cli: &Cli, cfg: &Config) -> Result<(), AppError> {
    let units = cli.units.unwrap_or(cfg.unit_system).display_units();
    let membranes = cfg.membrane_catalog();
    let chemicals = cfg.chemical_catalog();

    match &cli.command {
        Command::Solve {
            case,
            json,
            elements,
            trace,
        } => {
            let input = load_case(case)?.into_input(&cfg.solver)?;
            let result = solve(&input, &membranes, &chemicals)?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                ui_cli::print_result(&input.feed, &result, units, *elements, *trace);
            }
        }
        Command::Rate {
            case,
            pressure,
            pressure_unit,
        } => {
            let input = load_case(case)?.into_input(&cfg.solver)?;
            let pressure_psi = to_psi(*pressure, (*pressure_unit).into());
            let pass = run_at_pressure(&input, &membranes, pressure_psi)?;
            ui_cli::print_pass(&pass, input.feed.flow_m3h, pressure_psi, units);
        }
        Command::Catalog => ui_cli::print_catalog(&membranes, &chemicals),
        Command::Tcf { temperature_c } => {
            let exponential = temperature_correction_factor(*temperature_c)?;
            ui_cli::print_tcf(*temperature_c, exponential, tcf_from_table(*temperature_c));
        }
    }
    Ok(())
}
