//! Recursive evaluator for compiled pattern programs
//!
//! Decoding and execution are fused: `dispatch` reads the tag at `pc` and runs the
//! matching handler, which recurses into `evaluate` for every embedded sub-pattern.
//! Repetition is greedy and never gives input back.

use tracing::debug;

use crate::{
    error::{MatchError, Result},
    groups::GroupSet,
    opcodes::{Opcode, UNBOUNDED},
    Capture, ExecLimits,
};

/// Result of evaluating one instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    /// Program position just past the evaluated instruction
    pub pc: usize,
    /// Input position after the instruction
    pub sp: usize,
    /// Whether the instruction matched
    pub matched: bool,
    /// Capture slots written while evaluating it
    pub groups: GroupSet,
}

impl Outcome {
    fn new(pc: usize, sp: usize, matched: bool) -> Self {
        Self {
            pc,
            sp,
            matched,
            groups: GroupSet::empty(),
        }
    }
}

/// Execution state for one match attempt
struct Matcher<'a> {
    /// Compiled program
    program: &'a [u8],
    /// Input being matched
    input: &'a [u8],
    /// Caller's capture slots, never rolled back
    captures: &'a mut [Capture],
    /// Execution limits
    limits: ExecLimits,
    /// Instructions evaluated so far
    ticks: usize,
    /// Current recursion depth
    depth: usize,
}

impl<'a> Matcher<'a> {
    fn new(
        program: &'a [u8],
        input: &'a [u8],
        captures: &'a mut [Capture],
        limits: ExecLimits,
    ) -> Self {
        Self {
            program,
            input,
            captures,
            limits,
            ticks: 0,
            depth: 0,
        }
    }

    /// Program byte at `pc`, if the program is long enough
    fn byte(&self, pc: usize) -> Option<u8> {
        self.program.get(pc).copied()
    }

    /// Failed outcome for a program that ends mid-instruction.
    /// Pointing at the program end lets every enclosing loop stop.
    fn truncated(&self, sp: usize) -> Outcome {
        Outcome::new(self.program.len(), sp, false)
    }

    fn descend(&mut self) -> Result<()> {
        if self.depth >= self.limits.max_depth {
            debug!(limit = self.limits.max_depth, "program nesting exceeds depth limit");
            return Err(MatchError::DepthExceeded {
                limit: self.limits.max_depth,
            });
        }
        self.depth += 1;
        Ok(())
    }

    fn tick(&mut self) -> Result<()> {
        self.ticks += 1;

        if let Some(max_ticks) = self.limits.max_ticks {
            if self.ticks > max_ticks {
                debug!(ticks = self.ticks, "match exceeded tick limit");
                return Err(MatchError::Timeout);
            }
        }

        Ok(())
    }

    /// Evaluate the instruction at `pc` against the input at `sp`
    fn evaluate(&mut self, pc: usize, sp: usize) -> Result<Outcome> {
        self.tick()?;
        self.descend()?;
        let outcome = self.dispatch(pc, sp);
        self.depth -= 1;
        outcome
    }

    fn dispatch(&mut self, pc: usize, sp: usize) -> Result<Outcome> {
        let Some(tag) = self.byte(pc) else {
            return Ok(self.truncated(sp));
        };

        match Opcode::from_byte(tag) {
            Opcode::Sequence => self.sequence(pc, sp),
            Opcode::CharClass => Ok(self.char_class(pc, sp, false)),
            Opcode::CharClassInv => Ok(self.char_class(pc, sp, true)),
            Opcode::Quantifier => self.quantifier(pc, sp),
            Opcode::Alternation => self.alternation(pc, sp),
            Opcode::AnchorStart => Ok(Outcome::new(pc + 1, sp, sp == 0)),
            Opcode::AnchorEnd => Ok(Outcome::new(pc + 1, sp, sp == self.input.len())),
            Opcode::AnchorWord => Ok(Outcome::new(pc + 1, sp, self.at_word_boundary(sp))),
            Opcode::Dot => Ok(self.consume_if(pc, sp, |_| true)),
            Opcode::PositiveLookahead => {
                // Input is never consumed, but captures made inside stay visible
                let inner = self.evaluate(pc + 1, sp)?;
                Ok(Outcome { sp, ..inner })
            }
            Opcode::CapturingGroup => self.capturing_group(pc, sp),
            Opcode::Literal(expected) => Ok(self.consume_if(pc, sp, |byte| byte == expected)),
        }
    }

    /// Single-byte instruction: consume one input byte if `accept` allows it
    fn consume_if(&self, pc: usize, sp: usize, accept: impl Fn(u8) -> bool) -> Outcome {
        match self.input.get(sp) {
            Some(&byte) if accept(byte) => Outcome::new(pc + 1, sp + 1, true),
            _ => Outcome::new(pc + 1, sp, false),
        }
    }

    fn sequence(&mut self, pc: usize, sp: usize) -> Result<Outcome> {
        let Some(len) = self.byte(pc + 1) else {
            return Ok(self.truncated(sp));
        };
        let end = pc + 1 + len as usize;
        if end > self.program.len() {
            return Ok(self.truncated(sp));
        }

        let mut pc = pc + 2;
        let mut sp = sp;
        let mut groups = GroupSet::empty();

        while pc < end {
            let child = self.evaluate(pc, sp)?;
            pc = child.pc;
            sp = child.sp;
            if !child.matched {
                return Ok(Outcome::new(end, sp, false));
            }
            groups |= child.groups;
        }

        Ok(Outcome {
            pc: end,
            sp,
            matched: true,
            groups,
        })
    }

    fn char_class(&self, pc: usize, sp: usize, inverted: bool) -> Outcome {
        let Some(len) = self.byte(pc + 1) else {
            return self.truncated(sp);
        };
        let end = pc + 1 + len as usize;
        if end > self.program.len() {
            return self.truncated(sp);
        }

        let Some(&byte) = self.input.get(sp) else {
            return Outcome::new(end, sp, false);
        };

        // A dangling odd byte is not a range
        let ranges = &self.program[(pc + 2).min(end)..end];
        let contained = ranges
            .chunks_exact(2)
            .any(|range| range[0] <= byte && byte <= range[1]);

        if contained != inverted {
            Outcome::new(end, sp + 1, true)
        } else {
            Outcome::new(end, sp, false)
        }
    }

    fn quantifier(&mut self, pc: usize, sp: usize) -> Result<Outcome> {
        let (Some(min), Some(max)) = (self.byte(pc + 1), self.byte(pc + 2)) else {
            return Ok(self.truncated(sp));
        };
        let body = pc + 3;

        // Measured up front so it is known even when min is 0 and nothing matches
        let Some(end) = self.extent(body)? else {
            return Ok(self.truncated(sp));
        };

        let start = sp;
        let mut sp = sp;
        let mut count = 0usize;
        let mut groups = GroupSet::empty();

        while count < min as usize {
            let iteration = self.iterate(pc, body, end, sp)?;
            if !iteration.matched {
                return Ok(Outcome::new(end, start, false));
            }
            sp = iteration.sp;
            count += 1;
            groups |= iteration.groups;
        }

        while max == UNBOUNDED || count < max as usize {
            let iteration = self.iterate(pc, body, end, sp)?;
            if !iteration.matched {
                break;
            }
            groups |= iteration.groups;
            count += 1;

            // Repeating a zero-width body cannot change anything
            if iteration.sp == sp {
                break;
            }
            sp = iteration.sp;
        }

        Ok(Outcome {
            pc: end,
            sp,
            matched: true,
            groups,
        })
    }

    /// Run one repetition of a quantifier body, checking it ends where it was measured to
    fn iterate(&mut self, pc: usize, body: usize, end: usize, sp: usize) -> Result<Outcome> {
        let iteration = self.evaluate(body, sp)?;
        if iteration.pc != end {
            return Err(MatchError::InconsistentExtent {
                pc,
                expected: end,
                found: iteration.pc,
            });
        }
        Ok(iteration)
    }

    fn alternation(&mut self, pc: usize, sp: usize) -> Result<Outcome> {
        let left = self.evaluate(pc + 1, sp)?;

        if left.matched {
            let Some(skip) = self.byte(left.pc) else {
                return Ok(self.truncated(sp));
            };
            let end = left.pc + skip as usize;
            if end > self.program.len() {
                return Ok(self.truncated(sp));
            }
            return Ok(Outcome { pc: end, ..left });
        }

        // Right branch is last, so its end is the alternation's end
        self.evaluate(left.pc + 1, sp)
    }

    fn capturing_group(&mut self, pc: usize, sp: usize) -> Result<Outcome> {
        let Some(index) = self.byte(pc + 1) else {
            return Ok(self.truncated(sp));
        };
        let index = index as usize;

        let inner = self.evaluate(pc + 2, sp)?;
        if !inner.matched {
            return Ok(inner);
        }

        let mut groups = inner.groups;
        if let Some(slot) = self.captures.get_mut(index) {
            *slot = Capture {
                start: sp,
                end: inner.sp,
            };
            groups |= GroupSet::for_group(index);
        }

        Ok(Outcome { groups, ..inner })
    }

    fn at_word_boundary(&self, sp: usize) -> bool {
        if sp == 0 || sp == self.input.len() {
            return true;
        }

        match (self.input.get(sp - 1), self.input.get(sp)) {
            (Some(&before), Some(&at)) => is_word_byte(before) != is_word_byte(at),
            _ => false,
        }
    }

    /// Find where the instruction at `pc` ends without evaluating it.
    ///
    /// Returns `None` when the instruction runs past the end of the program.
    fn extent(&mut self, pc: usize) -> Result<Option<usize>> {
        self.descend()?;
        let end = self.measure(pc);
        self.depth -= 1;
        end
    }

    fn measure(&mut self, pc: usize) -> Result<Option<usize>> {
        let Some(tag) = self.byte(pc) else {
            return Ok(None);
        };

        let end = match Opcode::from_byte(tag) {
            Opcode::Sequence | Opcode::CharClass | Opcode::CharClassInv => {
                self.byte(pc + 1).map(|len| pc + 1 + len as usize)
            }
            Opcode::Quantifier => match self.byte(pc + 2) {
                Some(_) => self.extent(pc + 3)?,
                None => None,
            },
            Opcode::Alternation => match self.extent(pc + 1)? {
                Some(left_end) => self.byte(left_end).map(|skip| left_end + skip as usize),
                None => None,
            },
            Opcode::PositiveLookahead => self.extent(pc + 1)?,
            Opcode::CapturingGroup => match self.byte(pc + 1) {
                Some(_) => self.extent(pc + 2)?,
                None => None,
            },
            Opcode::AnchorStart
            | Opcode::AnchorEnd
            | Opcode::AnchorWord
            | Opcode::Dot
            | Opcode::Literal(_) => Some(pc + 1),
        };

        Ok(end.filter(|&end| end <= self.program.len()))
    }
}

/// ASCII letters, digits and underscore
pub fn is_word_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}

/// Evaluate the instruction at `pc` against `input` starting at `sp`.
///
/// Slots in `captures` are overwritten as groups match and are never cleared, so a
/// buffer reused across calls can still hold spans from an earlier attempt.
pub fn evaluate(
    program: &[u8],
    input: &[u8],
    pc: usize,
    sp: usize,
    captures: &mut [Capture],
) -> Result<Outcome> {
    evaluate_with_limits(program, input, pc, sp, captures, ExecLimits::default())
}

/// Evaluate with explicit execution limits
pub fn evaluate_with_limits(
    program: &[u8],
    input: &[u8],
    pc: usize,
    sp: usize,
    captures: &mut [Capture],
    limits: ExecLimits,
) -> Result<Outcome> {
    let mut matcher = Matcher::new(program, input, captures, limits);
    matcher.evaluate(pc, sp)
}
