use crate::control::ControlSignals;
use crate::error::ExecError;
use crate::execute::{execute, Effect};
use crate::instruction::{Instruction, INSTRUCTION_WIDTH};
use crate::machine::Machine;

pub const DEFAULT_MAX_STEPS: usize = 10_000;

/// Run options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimConfig {
    pub max_steps: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig { max_steps: DEFAULT_MAX_STEPS }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimState {
    Running,
    Halted,
}

/// What one step did, for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepReport {
    pub pc: u32,
    pub instruction: Instruction,
    pub signals: ControlSignals,
    pub effect: Effect,
}

/// Outcome of `Simulator::run`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub steps: usize,
    pub state: SimState,
}

/// Drives a decoded program against a machine, one instruction per step.
pub struct Simulator {
    program: Vec<Instruction>,
    pub machine: Machine,
}

impl Simulator {
    pub fn new(program: Vec<Instruction>) -> Simulator {
        Simulator { program, machine: Machine::new() }
    }

    pub fn state(&self) -> SimState {
        if self.current().is_some() {
            SimState::Running
        } else {
            SimState::Halted
        }
    }

    /// Instruction at `pc / 4`, if `pc` is still inside the program.
    pub fn current(&self) -> Option<&Instruction> {
        self.program.get((self.machine.pc / INSTRUCTION_WIDTH) as usize)
    }

    /// Instructions from the one at `pc` to the end of the program.
    fn remaining_from(&self, pc: u32) -> &[Instruction] {
        let next = (pc / INSTRUCTION_WIDTH) as usize;
        self.program.get(next..).unwrap_or(&[])
    }

    /// Executes the instruction at `pc` and advances `pc` by one instruction.
    /// Returns `None` once the program has run off its end.
    pub fn step(&mut self) -> Result<Option<StepReport>, ExecError> {
        let pc = self.machine.pc;
        let instruction = match self.current() {
            Some(instruction) => *instruction,
            None => return Ok(None),
        };
        let signals = ControlSignals::for_instruction(&instruction);
        log::debug!("pc {}: {}", pc, instruction);

        let effect = execute(&instruction, &mut self.machine)?;
        self.machine.pc = self.machine.pc.wrapping_add(INSTRUCTION_WIDTH);
        Ok(Some(StepReport { pc, instruction, signals, effect }))
    }

    /// Steps until the program halts or `config.max_steps` is reached.
    /// `on_step` gets each report together with the instructions that were
    /// still pending when that step began, the executed one first.
    pub fn run<F>(&mut self, config: &SimConfig, mut on_step: F) -> Result<RunSummary, ExecError>
    where
        F: FnMut(&StepReport, &[Instruction]),
    {
        let mut executed_steps = 0;
        while executed_steps < config.max_steps {
            match self.step()? {
                Some(report) => {
                    executed_steps += 1;
                    on_step(&report, self.remaining_from(report.pc));
                }
                None => break,
            }
        }

        let state = self.state();
        if state == SimState::Running {
            log::warn!("stopped after {} steps with pc = {}", executed_steps, self.machine.pc);
        }
        log::info!("executed {} steps", executed_steps);
        Ok(RunSummary { steps: executed_steps, state })
    }
}
