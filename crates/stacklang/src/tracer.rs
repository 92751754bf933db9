//! VM execution tracing infrastructure.
//!
//! Provides a trait-based tracing system for the bytecode VM with zero-cost abstraction.
//! When using [`NoopTracer`], all trace methods compile away entirely via monomorphization.
//!
//! | Tracer | Purpose |
//! |--------|---------|
//! | [`NoopTracer`] | Zero-cost no-op (production default) |
//! | [`StderrTracer`] | Human-readable execution log to stderr |
//! | [`ProfilingTracer`] | Opcode frequency counters, jumps and stack depth |
//!
//! # Usage
//!
//! ```ignore
//! // Production (zero overhead):
//! let mut vm = VM::new(&program, &mut print, &mut input);
//!
//! // Debugging:
//! let mut vm = VM::with_tracer(&program, &mut print, &mut input, StderrTracer::new());
//!
//! // Profiling:
//! let mut vm = VM::with_tracer(&program, &mut print, &mut input, ProfilingTracer::new());
//! vm.run()?;
//! let report = vm.into_tracer().report();
//! ```

use std::fmt;

use ahash::AHashMap;

use crate::bytecode::Opcode;

/// Trait for VM execution tracing.
///
/// All methods have default no-op implementations, so implementations only
/// override the hooks they care about.
pub trait VmTracer: fmt::Debug {
    /// Called before each instruction is executed.
    ///
    /// This is the hottest hook, called for every single instruction.
    ///
    /// # Arguments
    /// * `pc` - Index of the instruction in the program
    /// * `opcode` - The opcode about to be executed
    /// * `stack_depth` - Number of values on the operand stack
    #[inline(always)]
    fn on_instruction(&mut self, _pc: usize, _opcode: Opcode, _stack_depth: usize) {}

    /// Called when `jmp` or a failing `fjmp` transfers control.
    ///
    /// `to` is the index of the target `label` instruction.
    #[inline(always)]
    fn on_jump(&mut self, _from: usize, _to: usize) {}

    /// Called when `print` is about to write `count` values.
    #[inline(always)]
    fn on_print(&mut self, _count: usize) {}
}

/// A tracer that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTracer;

impl VmTracer for NoopTracer {}

/// Tracer that prints a human-readable execution log to stderr.
///
/// Output format:
/// ```text
/// [    0] push      stack=0
/// [    1] fjmp      stack=1
///   --> jump 1 -> 4
/// ```
#[derive(Debug, Default)]
pub struct StderrTracer {
    /// Maximum number of instructions to trace, `None` for unlimited.
    limit: Option<usize>,
    count: usize,
    stopped: bool,
}

impl StderrTracer {
    /// Creates a new stderr tracer with no instruction limit.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a stderr tracer that goes quiet after `limit` instructions.
    ///
    /// Keeps the log of a long-running loop readable.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }
}

impl VmTracer for StderrTracer {
    #[inline]
    fn on_instruction(&mut self, pc: usize, opcode: Opcode, stack_depth: usize) {
        if self.stopped {
            return;
        }
        eprintln!("[{pc:>5}] {opcode:<8}  stack={stack_depth}");
        self.count += 1;
        if let Some(limit) = self.limit
            && self.count >= limit
        {
            eprintln!("--- trace limit reached ({limit} instructions) ---");
            self.stopped = true;
        }
    }

    fn on_jump(&mut self, from: usize, to: usize) {
        if !self.stopped {
            eprintln!("  --> jump {from} -> {to}");
        }
    }

    fn on_print(&mut self, count: usize) {
        if !self.stopped {
            eprintln!("  <<< print {count}");
        }
    }
}

/// Tracer that collects execution statistics for profiling.
///
/// Retrieve results via [`ProfilingTracer::report`] after execution.
#[derive(Debug, Default)]
pub struct ProfilingTracer {
    opcode_counts: AHashMap<Opcode, u64>,
    total_instructions: u64,
    total_jumps: u64,
    total_prints: u64,
    max_stack_depth: usize,
}

/// Summary report from a profiling trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfilingReport {
    /// Per-opcode execution counts, sorted by frequency (highest first).
    pub opcode_counts: Vec<(Opcode, u64)>,
    pub total_instructions: u64,
    /// Number of taken jumps, conditional or not.
    pub total_jumps: u64,
    /// Number of `print` instructions executed.
    pub total_prints: u64,
    /// Deepest operand stack observed before an instruction.
    pub max_stack_depth: usize,
}

impl ProfilingTracer {
    /// Creates a new profiling tracer with zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Generates a profiling report from the collected data.
    ///
    /// Opcode counts are sorted by frequency, ties by mnemonic.
    #[must_use]
    pub fn report(&self) -> ProfilingReport {
        let mut opcode_counts: Vec<_> = self.opcode_counts.iter().map(|(&k, &v)| (k, v)).collect();
        opcode_counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.name().cmp(b.0.name())));
        ProfilingReport {
            opcode_counts,
            total_instructions: self.total_instructions,
            total_jumps: self.total_jumps,
            total_prints: self.total_prints,
            max_stack_depth: self.max_stack_depth,
        }
    }
}

impl VmTracer for ProfilingTracer {
    #[inline]
    fn on_instruction(&mut self, _pc: usize, opcode: Opcode, stack_depth: usize) {
        *self.opcode_counts.entry(opcode).or_insert(0) += 1;
        self.total_instructions += 1;
        self.max_stack_depth = self.max_stack_depth.max(stack_depth);
    }

    fn on_jump(&mut self, _from: usize, _to: usize) {
        self.total_jumps += 1;
    }

    fn on_print(&mut self, _count: usize) {
        self.total_prints += 1;
    }
}

impl fmt::Display for ProfilingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== VM Profiling Report ===")?;
        writeln!(f, "Total instructions: {}", self.total_instructions)?;
        writeln!(f, "Jumps taken:        {}", self.total_jumps)?;
        writeln!(f, "Prints:             {}", self.total_prints)?;
        writeln!(f, "Max stack depth:    {}", self.max_stack_depth)?;
        writeln!(f)?;
        writeln!(f, "Opcode frequency:")?;
        for (opcode, count) in &self.opcode_counts {
            writeln!(f, "  {:<8} {count:>10}", opcode.name())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn profiling_report_sorts_by_frequency() {
        let mut tracer = ProfilingTracer::new();
        tracer.on_instruction(0, Opcode::Push, 0);
        tracer.on_instruction(1, Opcode::Push, 1);
        tracer.on_instruction(2, Opcode::Add, 2);
        tracer.on_jump(2, 0);
        let report = tracer.report();
        assert_eq!(report.opcode_counts, vec![(Opcode::Push, 2), (Opcode::Add, 1)]);
        assert_eq!(report.total_jumps, 1);
        assert_eq!(report.max_stack_depth, 2);
        assert!(report.to_string().contains("Total instructions: 3"));
    }

    #[test]
    fn stderr_tracer_stops_at_limit() {
        let mut tracer = StderrTracer::with_limit(1);
        tracer.on_instruction(0, Opcode::Pop, 1);
        assert!(tracer.stopped);
    }
}
