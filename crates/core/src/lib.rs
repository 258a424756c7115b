// HartLab - RISC-V Conformance Simulator
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Instruction-level RV32I simulation core.
//!
//! A [`Machine`] couples one [`Rv32Hart`] with a flat [`AddressSpace`] and
//! steps it until the program signals completion through the riscv-tests
//! protocol, a fault aborts the run, or a step budget expires. The crate is
//! deterministic: the same image and budget always produce the same outcome
//! and step count.

use thiserror::Error;
use tracing::{debug, trace};

use hartlab_config::MachineConfig;

pub mod bits;
pub mod cpu;
pub mod decoder;
pub mod image;
pub mod mem;
pub mod regs;

pub use cpu::Rv32Hart;
pub use image::{ProgramImage, Segment};
pub use mem::AddressSpace;
pub use regs::RegisterFile;

/// Faults that abort simulation. Anything else the simulated program does is
/// an ordinary outcome, not an error.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationError {
    #[error("Memory access out of bounds at {addr:#010x}")]
    OutOfBounds { addr: u32 },
    #[error("Illegal instruction {word:#010x} at {pc:#010x}")]
    IllegalInstruction { pc: u32, word: u32 },
}

pub type SimResult<T> = Result<T, SimulationError>;

/// What a finished conformance test reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestOutcome {
    Pass,
    /// The raw `gp` status word, which encodes the failing test number.
    Fail { code: u32 },
}

/// One retired instruction's effect on the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Running,
    Halted(TestOutcome),
}

/// How a bounded run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Pass,
    Fail { code: u32 },
    /// The step budget expired before the program signalled completion.
    MaxSteps,
}

impl From<TestOutcome> for RunOutcome {
    fn from(outcome: TestOutcome) -> Self {
        match outcome {
            TestOutcome::Pass => RunOutcome::Pass,
            TestOutcome::Fail { code } => RunOutcome::Fail { code },
        }
    }
}

/// Outcome plus the number of instructions retired to reach it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub outcome: RunOutcome,
    pub steps: u64,
}

/// A single-hart machine. Once halted it stays halted; further steps return
/// the recorded outcome without executing anything.
#[derive(Debug, Clone)]
pub struct Machine {
    pub hart: Rv32Hart,
    pub mem: AddressSpace,
    halted: Option<TestOutcome>,
    steps: u64,
}

impl Machine {
    /// A machine whose hart resets to the base of `mem`.
    pub fn new(mem: AddressSpace) -> Self {
        let hart = Rv32Hart::new(mem.base());
        Self {
            hart,
            mem,
            halted: None,
            steps: 0,
        }
    }

    /// Build the machine a manifest describes.
    pub fn from_config(config: &MachineConfig) -> anyhow::Result<Self> {
        let mem = AddressSpace::from_config(&config.memory)?;
        Ok(Self::new(mem))
    }

    /// Place an image in memory and point the hart at its entry.
    pub fn load_image(&mut self, image: &ProgramImage) -> SimResult<()> {
        self.mem.load_image(image)?;
        self.hart.regs.set_pc(image.entry_point);
        debug!(
            "Image loaded: {} segments, entry {:#010x}",
            image.segments.len(),
            image.entry_point
        );
        Ok(())
    }

    /// Instructions retired so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// The completion outcome, once halted.
    pub fn outcome(&self) -> Option<TestOutcome> {
        self.halted
    }

    /// Retire one instruction, or report the existing outcome when already
    /// halted. The halting instruction itself counts as a step.
    pub fn step(&mut self) -> SimResult<StepOutcome> {
        if let Some(outcome) = self.halted {
            return Ok(StepOutcome::Halted(outcome));
        }
        let result = self.hart.step(&mut self.mem)?;
        self.steps += 1;
        if let StepOutcome::Halted(outcome) = result {
            self.halted = Some(outcome);
            debug!("Halted after {} steps: {:?}", self.steps, outcome);
            trace!("Register file:\n{}", self.hart.regs);
        }
        Ok(result)
    }

    /// Step until completion or until `max_steps` instructions have retired.
    pub fn run(&mut self, max_steps: u64) -> SimResult<RunSummary> {
        for _ in 0..max_steps {
            if let StepOutcome::Halted(outcome) = self.step()? {
                return Ok(RunSummary {
                    outcome: outcome.into(),
                    steps: self.steps,
                });
            }
        }
        Ok(RunSummary {
            outcome: RunOutcome::MaxSteps,
            steps: self.steps,
        })
    }
}
