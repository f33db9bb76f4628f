use std::num::ParseIntError;
use std::path::PathBuf;

use clap::Parser;

use allude_rv32::sim_env::DEFAULT_MAX_CYCLES;

/// allude_rv32: RV32I user-mode emulator
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Maximum number of instructions to execute
    #[arg(long, default_value_t = DEFAULT_MAX_CYCLES)]
    pub max_cycles: u64,
    /// Initial stack top, aligned down to 16 bytes
    ///
    /// Accepts decimal or `0x`-prefixed hex. Defaults to 1 MiB above the image, at least 16 MiB.
    #[arg(long, value_parser = parse_addr)]
    pub stack_top: Option<u32>,
    /// Whether misaligned fetches, loads and stores trap
    #[arg(long, default_value_t = false)]
    pub trap_misaligned: bool,
    /// Whether to log every executed instruction at trace level
    #[arg(long, default_value_t = false)]
    pub trace: bool,
    /// Path to the RV32I ELF executable
    pub elf: PathBuf,
    /// Arguments passed to the guest after argv[0]
    ///
    /// argv[0] is always the ELF path, so `allude_rv32 prog.elf foo` boots with argc = 2.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

fn parse_addr(s: &str) -> Result<u32, ParseIntError> {
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(&hex.replace('_', ""), 16),
        None => s.replace('_', "").parse(),
    }
}
