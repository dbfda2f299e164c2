use clap::Parser;
use ro_design_toolbox::{app, config};

/// 프로그램의 엔트리 포인트. 설정을 로드하고 로거를 초기화한 뒤 명령을 실행한다.
fn main() {
    if let Err(err) = try_run() {
        eprintln!("오류: {err}");
        std::process::exit(1);
    }
}

fn try_run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = app::Cli::parse();
    let cfg = config::load_or_default(&cli.config)?;
    let level = cli.log_level.as_deref().unwrap_or(&cfg.log_level);
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
    app::run(&cli, &cfg)?;
    Ok(())
}
