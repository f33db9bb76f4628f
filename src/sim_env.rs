//! 仿真环境
//!
//! 本模块负责：
//! - 汇总运行配置（ELF 路径、客户参数、栈顶、周期预算、对齐策略、跟踪）
//! - 构建解释器并加载 ELF
//! - 在周期预算内运行并把结果映射为进程退出码
//!
//! # 示例
//!
//! ```no_run
//! use allude_rv32::sim_env::{SimConfig, SimEnv};
//!
//! let config = SimConfig::new()
//!     .with_elf_path("hello.elf")
//!     .with_args(vec!["hello".to_string(), "world".to_string()])
//!     .with_max_cycles(10_000);
//!
//! let mut env = SimEnv::from_config(config).expect("Failed to create sim env");
//! let outcome = env.run();
//! std::process::exit(outcome.exit_code());
//! ```

use thiserror::Error;
use tracing::{info, warn};

use crate::cpu::{AlignmentPolicy, ExecStatus, Interpreter, InterpreterBuilder, RegistryError};
use crate::loader::{self, LoadError, ProcessLayout};
use crate::syscall::HostIo;
use crate::trace::{NullSink, TraceSink, TracingSink};

/// 默认周期预算
pub const DEFAULT_MAX_CYCLES: u64 = 1_000_000;

/// 仿真环境错误
#[derive(Debug, Error)]
pub enum SimError {
    #[error("config error: {0}")]
    Config(String),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// 仿真配置
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// ELF 文件路径
    pub elf_path: Option<String>,
    /// ELF 路径之后的客户参数；argv[0] 恒为 ELF 路径
    pub args: Vec<String>,
    /// 栈顶提示，向下按 16 对齐
    pub stack_top: Option<u32>,
    /// 最大执行周期数
    pub max_cycles: u64,
    pub alignment: AlignmentPolicy,
    /// 逐条指令输出 `trace` 事件
    pub trace: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            elf_path: None,
            args: Vec::new(),
            stack_top: None,
            max_cycles: DEFAULT_MAX_CYCLES,
            alignment: AlignmentPolicy::Permissive,
            trace: false,
        }
    }
}

impl SimConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_elf_path(mut self, path: impl Into<String>) -> Self {
        self.elf_path = Some(path.into());
        self
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_stack_top(mut self, stack_top: u32) -> Self {
        self.stack_top = Some(stack_top);
        self
    }

    pub fn with_max_cycles(mut self, max: u64) -> Self {
        self.max_cycles = max;
        self
    }

    pub fn with_alignment(mut self, policy: AlignmentPolicy) -> Self {
        self.alignment = policy;
        self
    }

    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }
}

/// 一次运行的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// 客户程序调用 exit
    Exited(i32),
    /// 因 trap 停止，`cycles` 含触发 trap 的那条指令
    Trapped { status: ExecStatus, cycles: u64 },
    /// 周期预算耗尽
    BudgetExhausted { cycles: u64 },
}

impl RunOutcome {
    /// 宿主进程退出码
    pub fn exit_code(&self) -> i32 {
        match *self {
            RunOutcome::Exited(code) => code,
            RunOutcome::Trapped { .. } => 1,
            RunOutcome::BudgetExhausted { .. } => 0,
        }
    }
}

/// 仿真环境
///
/// 封装解释器、加载结果与配置
pub struct SimEnv {
    cpu: Interpreter,
    layout: ProcessLayout,
    config: SimConfig,
}

impl SimEnv {
    /// 从配置创建仿真环境，客户 I/O 接宿主 stdio
    pub fn from_config(config: SimConfig) -> Result<Self, SimError> {
        Self::from_config_with_io(config, HostIo::stdio())
    }

    /// 从配置创建仿真环境，使用给定的客户 I/O
    pub fn from_config_with_io(config: SimConfig, io: HostIo) -> Result<Self, SimError> {
        let path = config
            .elf_path
            .clone()
            .ok_or_else(|| SimError::Config("no ELF path given".into()))?;

        let mut cpu = InterpreterBuilder::new()
            .alignment(config.alignment)
            .io(io)
            .build()?;
        let argv: Vec<String> = std::iter::once(path.clone())
            .chain(config.args.iter().cloned())
            .collect();
        let layout = loader::load_elf(cpu.machine_mut(), &path, &argv, config.stack_top)?;

        info!(
            "loaded {path}: entry 0x{:08x}, sp 0x{:08x}, argc {}",
            layout.entry, layout.stack_pointer, layout.argc
        );

        Ok(SimEnv { cpu, layout, config })
    }

    pub fn cpu(&self) -> &Interpreter {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Interpreter {
        &mut self.cpu
    }

    pub fn layout(&self) -> &ProcessLayout {
        &self.layout
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// 在周期预算内运行
    pub fn run(&mut self) -> RunOutcome {
        if self.config.trace {
            let mut sink = TracingSink::new();
            let outcome = self.run_with(&mut sink);
            sink.dump_regs(self.cpu.machine());
            outcome
        } else {
            self.run_with(&mut NullSink)
        }
    }

    fn run_with(&mut self, sink: &mut dyn TraceSink) -> RunOutcome {
        let max = self.config.max_cycles;
        match self.cpu.run_traced(max, sink) {
            Err(exit) => {
                info!("program exited with code {}", exit.code);
                RunOutcome::Exited(exit.code)
            }
            Ok((cycles, status @ ExecStatus::Trap { .. })) => RunOutcome::Trapped { status, cycles },
            Ok((cycles, _)) => {
                warn!("cycle budget of {max} exhausted at pc 0x{:08x}", self.cpu.pc());
                RunOutcome::BudgetExhausted { cycles }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::cpu::TrapCause;
    use crate::isa::asm::{self, reg};
    use crate::memory::Memory;
    use crate::syscall::{SYS_EXIT, SYS_WRITE};
    use crate::testing::{ElfWriter, SharedBuf};

    /// 把 ELF 写到临时文件，文件名带进程号与用例名
    fn write_elf(name: &str, elf: &[u8]) -> PathBuf {
        let path = std::env::temp_dir().join(format!("allude_rv32_{}_{name}.elf", std::process::id()));
        std::fs::write(&path, elf).unwrap();
        path
    }

    fn env_for(name: &str, words: &[u32], config: SimConfig) -> (SimEnv, SharedBuf) {
        let elf = ElfWriter::new(0x1000).code(0x1000, words).build();
        let path = write_elf(name, &elf);
        let out = SharedBuf::default();
        let config = config.with_elf_path(path.display().to_string());
        let env = SimEnv::from_config_with_io(config, HostIo::new(std::io::empty(), out.clone()));
        let _ = std::fs::remove_file(&path);
        (env.unwrap(), out)
    }

    fn read_cstr(mem: &dyn Memory, mut addr: u32) -> String {
        let mut bytes = Vec::new();
        while mem.load8(addr) != 0 {
            bytes.push(mem.load8(addr));
            addr += 1;
        }
        String::from_utf8(bytes).unwrap()
    }

    fn exit_with(code: i32) -> [u32; 3] {
        [
            asm::addi(reg::A0, 0, code),
            asm::addi(reg::A7, 0, SYS_EXIT as i32),
            asm::ecall(),
        ]
    }

    #[test]
    fn test_sim_config_builder() {
        let config = SimConfig::new();
        assert_eq!(config.max_cycles, DEFAULT_MAX_CYCLES);
        assert_eq!(config.alignment, AlignmentPolicy::Permissive);
        assert!(!config.trace);

        let config = config
            .with_elf_path("a.elf")
            .with_args(vec!["a".into()])
            .with_stack_top(0x0080_0000)
            .with_max_cycles(10)
            .with_alignment(AlignmentPolicy::Strict)
            .with_trace(true);
        assert_eq!(config.elf_path.as_deref(), Some("a.elf"));
        assert_eq!(config.args, vec!["a".to_string()]);
        assert_eq!(config.stack_top, Some(0x0080_0000));
        assert_eq!(config.max_cycles, 10);
        assert_eq!(config.alignment, AlignmentPolicy::Strict);
        assert!(config.trace);
    }

    #[test]
    fn test_missing_elf_path() {
        let result = SimEnv::from_config_with_io(SimConfig::new(), HostIo::null());
        assert!(matches!(result, Err(SimError::Config(_))));
    }

    #[test]
    fn test_load_error_propagates() {
        let config = SimConfig::new().with_elf_path("/nonexistent/allude_rv32.elf");
        let result = SimEnv::from_config_with_io(config, HostIo::null());
        assert!(matches!(result, Err(SimError::Load(LoadError::Io(_)))));
    }

    #[test]
    fn test_exit_code() {
        let (mut env, _) = env_for("exit", &exit_with(7), SimConfig::new());
        assert_eq!(env.layout().entry, 0x1000);
        let outcome = env.run();
        assert_eq!(outcome, RunOutcome::Exited(7));
        assert_eq!(outcome.exit_code(), 7);
    }

    #[test]
    fn test_hello_world() {
        // "hi\n" 放在代码后的 0x1100
        let mut words = vec![
            asm::addi(reg::A7, 0, SYS_WRITE as i32),
            asm::addi(reg::A0, 0, 1),
            asm::lui(reg::A1, 0x1000),
            asm::addi(reg::A1, reg::A1, 0x100),
            asm::addi(reg::A2, 0, 3),
            asm::ecall(),
        ];
        words.extend(exit_with(0));
        let elf = ElfWriter::new(0x1000)
            .code(0x1000, &words)
            .load(0x1100, b"hi\n", 3)
            .build();
        let path = write_elf("hello", &elf);
        let out = SharedBuf::default();
        let config = SimConfig::new().with_elf_path(path.display().to_string());
        let env = SimEnv::from_config_with_io(config, HostIo::new(std::io::empty(), out.clone()));
        let _ = std::fs::remove_file(&path);

        let outcome = env.unwrap().run();
        assert_eq!(outcome, RunOutcome::Exited(0));
        assert_eq!(out.contents(), b"hi\n");
    }

    #[test]
    fn test_argc_from_stack() {
        let words = [
            asm::lw(reg::A0, 0, reg::SP),
            asm::addi(reg::A7, 0, SYS_EXIT as i32),
            asm::ecall(),
        ];
        let config = SimConfig::new().with_args(vec!["-x".into(), "y".into()]);
        let (mut env, _) = env_for("argc", &words, config);
        assert_eq!(env.layout().argc, 3);
        assert_eq!(env.run(), RunOutcome::Exited(3));
    }

    #[test]
    fn test_elf_path_is_argv0() {
        let words = [
            asm::lw(reg::A0, 0, reg::SP),
            asm::addi(reg::A7, 0, SYS_EXIT as i32),
            asm::ecall(),
        ];
        let config = SimConfig::new().with_args(vec!["foo".into()]);
        let (mut env, _) = env_for("argv0", &words, config);
        let elf_path = env.config().elf_path.clone().unwrap();

        let sp = env.layout().stack_pointer;
        let mem = env.cpu().machine().memory();
        let argv0 = mem.load32(sp + 4);
        let argv1 = mem.load32(sp + 8);
        assert_eq!(read_cstr(mem, argv0), elf_path);
        assert_eq!(read_cstr(mem, argv1), "foo");
        assert_eq!(mem.load32(sp + 12), 0);

        assert_eq!(env.run(), RunOutcome::Exited(2));
    }

    #[test]
    fn test_no_args_gives_argc_one() {
        let words = [
            asm::lw(reg::A0, 0, reg::SP),
            asm::addi(reg::A7, 0, SYS_EXIT as i32),
            asm::ecall(),
        ];
        let (mut env, _) = env_for("argc_one", &words, SimConfig::new());
        assert_eq!(env.run(), RunOutcome::Exited(1));
    }

    #[test]
    fn test_illegal_instruction_traps() {
        let (mut env, _) = env_for("illegal", &[asm::addi(1, 0, 1), 0], SimConfig::new());
        let outcome = env.run();
        assert_eq!(
            outcome,
            RunOutcome::Trapped {
                status: ExecStatus::trap(TrapCause::IllegalInstruction, 0x1004, 0),
                cycles: 2,
            }
        );
        assert_eq!(outcome.exit_code(), 1);
    }

    #[test]
    fn test_strict_alignment_traps() {
        let words = [asm::lw(reg::A0, 2, reg::ZERO), asm::ecall()];
        let config = SimConfig::new().with_alignment(AlignmentPolicy::Strict);
        let (mut env, _) = env_for("strict", &words, config);
        assert_eq!(
            env.run(),
            RunOutcome::Trapped {
                status: ExecStatus::trap(TrapCause::LoadAddressMisaligned, 0x1000, 2),
                cycles: 1,
            }
        );
    }

    #[test]
    fn test_budget_exhausted() {
        // jal x0, 0：原地自旋
        let config = SimConfig::new().with_max_cycles(100);
        let (mut env, _) = env_for("spin", &[asm::jal(reg::ZERO, 0)], config);
        let outcome = env.run();
        assert_eq!(outcome, RunOutcome::BudgetExhausted { cycles: 100 });
        assert_eq!(outcome.exit_code(), 0);
        assert_eq!(env.cpu().pc(), 0x1000);
    }

    #[test]
    fn test_trace_enabled_run() {
        let config = SimConfig::new().with_trace(true);
        let (mut env, _) = env_for("trace", &exit_with(5), config);
        assert_eq!(env.run(), RunOutcome::Exited(5));
    }

    #[test]
    fn test_stack_top_hint() {
        let config = SimConfig::new().with_stack_top(0x0040_0008);
        let (env, _) = env_for("hint", &exit_with(0), config);
        assert_eq!(env.layout().stack_top, 0x0040_0000);
        assert_eq!(env.cpu().read_reg(reg::SP), env.layout().stack_pointer);
    }
}
