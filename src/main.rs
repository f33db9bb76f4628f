//! allude_rv32 命令行入口
//!
//! 加载 RV32I ELF，在周期预算内运行，以客户程序的退出码退出。

mod cli;

use clap::Parser;
use tracing::error;

use allude_rv32::cpu::AlignmentPolicy;
use allude_rv32::sim_env::{SimConfig, SimEnv};

/// 日志写到 stderr，客户程序的 stdout 保持干净
fn setup_tracing(trace: bool) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::{EnvFilter, fmt};

    let default = if trace { "info,allude_rv32::trace=trace" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or(EnvFilter::new(default));
    let fmt_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .init();
}

fn main() {
    let cfg = cli::Config::parse();
    setup_tracing(cfg.trace);

    let mut config = SimConfig::new()
        .with_elf_path(cfg.elf.display().to_string())
        .with_args(cfg.args)
        .with_max_cycles(cfg.max_cycles)
        .with_trace(cfg.trace);
    if let Some(top) = cfg.stack_top {
        config = config.with_stack_top(top);
    }
    if cfg.trap_misaligned {
        config = config.with_alignment(AlignmentPolicy::Strict);
    }

    let mut env = match SimEnv::from_config(config) {
        Ok(env) => env,
        Err(err) => {
            error!("{err}");
            std::process::exit(1);
        }
    };

    let outcome = env.run();
    std::process::exit(outcome.exit_code());
}
