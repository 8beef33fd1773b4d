use std::collections::{BTreeSet, HashMap};
use std::fmt;

use crate::ruleset::RuleSet;
use crate::tape::{Move, Symbol, Tape};

/// Number of tapes: input, working value, accumulator.
pub const TAPES: usize = 3;

/// The pending carry of the bit-serial adder, encoded in the state itself.
///
/// The machine has no registers; a carry bit survives between steps only by
/// selecting between two otherwise identical adder states.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Carry {
    Clear,
    Set,
}

/// One leg of the five-step accumulator-to-working transfer protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TransferStep {
    /// Scan the accumulator left to the blank bordering its data.
    HomeAcc,
    /// Scan the working tape left to the blank bordering its data.
    HomeWork,
    /// Walk the working tape rightward, blanking every cell until blank.
    Clear,
    /// Walk the working tape back left to a blank cell.
    Rehome,
    /// Walk both tapes right, moving each accumulator bit onto the working
    /// tape and erasing it behind.
    CopyBack,
}

/// A control state of the multiplication machine.
///
/// Every state is a pure label; all data lives on the tapes. The variants
/// follow the phases of shift-and-add: copy the lead factor, locate the
/// next factor's least significant bit, dispatch on that bit, add with
/// ripple carry, shift, advance, and finally transfer the accumulated
/// product back onto the working tape. The derived `Ord` fixes the state
/// ordering used by the unary machine encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum State {
    /// Copying the first factor from the input tape to the working tape.
    Copy,
    /// Skipping separators rightward, looking for the next factor.
    SeekFactor,
    /// Scanning rightward through the factor to find its last digit.
    SeekEnd,
    /// Dispatching on the current input bit: add, shift, or transfer.
    Select,
    /// Moving the working and accumulator heads to their own last digits.
    Align,
    /// The bit-serial full adder, parameterized by the pending carry.
    Add(Carry),
    /// Scanning the accumulator left to the edge of its data after a sum.
    Normalize,
    /// Stepping both operand heads back right before the next shift.
    Resume,
    /// Appending a zero digit to the working value (doubling it).
    Shift,
    /// Checking whether the current factor has more bits to the left.
    NextBit,
    /// Walking rightward past a finished factor.
    SkipFactor,
    /// Peeking one cell past the separator for another factor.
    CheckMore,
    /// The transfer protocol; `last` selects the final variant, which
    /// proceeds to `Accept` instead of looping back to `SeekFactor`.
    Transfer { step: TransferStep, last: bool },
    /// The accepting state. No rules leave it.
    Accept,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            State::Copy => "copy",
            State::SeekFactor => "seek_factor",
            State::SeekEnd => "seek_end",
            State::Select => "select",
            State::Align => "add_align",
            State::Add(Carry::Clear) => "add_c0",
            State::Add(Carry::Set) => "add_c1",
            State::Normalize => "add_norm",
            State::Resume => "add_resume",
            State::Shift => "shift",
            State::NextBit => "next_bit",
            State::SkipFactor => "skip_factor",
            State::CheckMore => "check_more",
            State::Transfer { step, last } => {
                let prefix = if *last { "final" } else { "xfer" };
                let leg = match step {
                    TransferStep::HomeAcc => "home_acc",
                    TransferStep::HomeWork => "home_work",
                    TransferStep::Clear => "clear",
                    TransferStep::Rehome => "rehome",
                    TransferStep::CopyBack => "copy_back",
                };
                return write!(f, "{prefix}_{leg}");
            }
            State::Accept => "accept",
        };
        write!(f, "{name}")
    }
}

/// The right-hand side of a transition: successor state, one write per
/// tape, one head move per tape.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rule {
    pub next: State,
    pub writes: [Symbol; TAPES],
    pub moves: [Move; TAPES],
}

/// How a bounded run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The machine reached a state in the accept set.
    Accepted,
    /// No rule matched the current configuration. Whether this is success
    /// or a stuck machine is for the caller to judge against the accept
    /// set and tape contents.
    Halted,
    /// The step ceiling was reached before the machine settled.
    StepLimit,
}

/// An immutable machine definition: the transition table plus start and
/// accept states.
///
/// A program owns no run state and is never mutated after construction, so
/// one program can back any number of concurrent runs by shared reference.
#[derive(Clone, Debug)]
pub struct Program {
    rules: HashMap<(State, [Symbol; TAPES]), Rule>,
    start: State,
    accept: BTreeSet<State>,
}

impl Program {
    pub fn new(rules: RuleSet, start: State, accept: impl IntoIterator<Item = State>) -> Self {
        Program {
            rules: rules.into_rules(),
            start,
            accept: accept.into_iter().collect(),
        }
    }

    pub fn start(&self) -> State {
        self.start
    }

    pub fn accepts(&self, state: State) -> bool {
        self.accept.contains(&state)
    }

    pub fn accept_states(&self) -> impl Iterator<Item = State> + '_ {
        self.accept.iter().copied()
    }

    pub fn rule(&self, state: State, reads: [Symbol; TAPES]) -> Option<&Rule> {
        self.rules.get(&(state, reads))
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Every state mentioned anywhere in the program, in `Ord` order.
    /// This ordering assigns the indices used by the unary encoding.
    pub fn states(&self) -> Vec<State> {
        let mut states: BTreeSet<State> = self.accept.iter().copied().collect();
        states.insert(self.start);
        for ((s, _), rule) in &self.rules {
            states.insert(*s);
            states.insert(rule.next);
        }
        states.into_iter().collect()
    }

    /// All transitions in deterministic (state, symbols) order.
    pub fn transitions_sorted(&self) -> Vec<(&(State, [Symbol; TAPES]), &Rule)> {
        let mut entries: Vec<_> = self.rules.iter().collect();
        entries.sort_by_key(|(key, _)| **key);
        entries
    }
}

/// A single mutable run of a program: current state, the tapes, and a step
/// counter. Created fresh per input; stepped in place until it settles.
pub struct Machine<'p> {
    program: &'p Program,
    state: State,
    tapes: [Tape; TAPES],
    steps: usize,
}

impl<'p> Machine<'p> {
    /// A run with all tapes blank.
    pub fn new(program: &'p Program) -> Self {
        Machine {
            program,
            state: program.start(),
            tapes: std::array::from_fn(|_| Tape::new()),
            steps: 0,
        }
    }

    /// A run with `input` laid out on tape 1 from position 0.
    pub fn with_input(program: &'p Program, input: &[Symbol]) -> Self {
        let mut machine = Machine::new(program);
        machine.tapes[0] = Tape::with_content(input);
        machine
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn tape(&self, index: usize) -> &Tape {
        &self.tapes[index]
    }

    /// Mutable tape access, for preloading operands and placing heads in
    /// phase-level tests.
    pub fn tape_mut(&mut self, index: usize) -> &mut Tape {
        &mut self.tapes[index]
    }

    /// Force the control state, leaving tapes and counter alone. Test
    /// setup only: lets one run drive a phase family several times.
    pub fn set_state(&mut self, state: State) {
        self.state = state;
    }

    pub fn accepted(&self) -> bool {
        self.program.accepts(self.state)
    }

    /// The symbols under the heads — the tuple the next lookup will use.
    pub fn reads(&self) -> [Symbol; TAPES] {
        std::array::from_fn(|i| self.tapes[i].read())
    }

    /// The rule the next `step()` would fire, if any.
    pub fn pending(&self) -> Option<&'p Rule> {
        self.program.rule(self.state, self.reads())
    }

    /// Execute one transition.
    ///
    /// Returns `false` — leaving state, tapes, and the step counter
    /// untouched — when no rule matches the current configuration. That is
    /// the machine's only halting mechanism, not an error.
    pub fn step(&mut self) -> bool {
        let Some(&Rule { next, writes, moves }) = self.program.rule(self.state, self.reads())
        else {
            return false;
        };
        for i in 0..TAPES {
            self.tapes[i].write(writes[i]);
            self.tapes[i].move_head(moves[i]);
        }
        self.state = next;
        self.steps += 1;
        true
    }

    /// Step until acceptance, a missing rule, or the step ceiling.
    ///
    /// Acceptance is checked before each step, so a run already sitting in
    /// an accept state returns immediately. The ceiling is the caller's
    /// guard: the engine itself never decides that a program loops.
    pub fn run(&mut self, max_steps: usize) -> Outcome {
        loop {
            if self.accepted() {
                return Outcome::Accepted;
            }
            if self.steps >= max_steps {
                return Outcome::StepLimit;
            }
            if !self.step() {
                return Outcome::Halted;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tape::parse_input;

    /// A two-rule program: skip one bit right, then accept on blank.
    fn tiny_program() -> Program {
        let mut rules = RuleSet::new();
        for bit in Symbol::BITS {
            rules
                .insert(
                    State::SeekFactor,
                    [bit, Symbol::Blank, Symbol::Blank],
                    Rule {
                        next: State::SeekFactor,
                        writes: [bit, Symbol::Blank, Symbol::Blank],
                        moves: [Move::Right, Move::Stay, Move::Stay],
                    },
                )
                .unwrap();
        }
        rules
            .insert(
                State::SeekFactor,
                [Symbol::Blank, Symbol::Blank, Symbol::Blank],
                Rule {
                    next: State::Accept,
                    writes: [Symbol::Blank; TAPES],
                    moves: [Move::Stay; TAPES],
                },
            )
            .unwrap();
        Program::new(rules, State::SeekFactor, [State::Accept])
    }

    #[test]
    fn test_run_to_acceptance() {
        let program = tiny_program();
        let mut m = Machine::with_input(&program, &parse_input("101").unwrap());
        assert_eq!(m.run(100), Outcome::Accepted);
        assert_eq!(m.steps(), 4); // three bits plus the accepting transition
        assert_eq!(m.tape(0).head(), 3);
    }

    #[test]
    fn test_step_ceiling() {
        let program = tiny_program();
        let mut m = Machine::with_input(&program, &parse_input("10101").unwrap());
        assert_eq!(m.run(2), Outcome::StepLimit);
        assert_eq!(m.steps(), 2);
        // The run can be resumed with a higher ceiling.
        assert_eq!(m.run(100), Outcome::Accepted);
    }

    #[test]
    fn test_missing_rule_halts_without_mutation() {
        let program = tiny_program();
        let mut m = Machine::with_input(&program, &parse_input("11").unwrap());
        // Put the accumulator head on a bit: (bit, blank, bit) has no rule.
        m.tape_mut(2).write(Symbol::One);
        let state_before = m.state();
        let heads_before = [m.tape(0).head(), m.tape(1).head(), m.tape(2).head()];

        assert!(!m.step());
        assert_eq!(m.state(), state_before);
        assert_eq!(m.steps(), 0);
        assert_eq!(
            [m.tape(0).head(), m.tape(1).head(), m.tape(2).head()],
            heads_before
        );
        assert_eq!(m.run(100), Outcome::Halted);
        assert!(!m.accepted());
    }

    #[test]
    fn test_pending_reflects_next_step() {
        let program = tiny_program();
        let m = Machine::with_input(&program, &parse_input("1").unwrap());
        let rule = m.pending().expect("rule for (seek_factor, 1, #, #)");
        assert_eq!(rule.next, State::SeekFactor);
        assert_eq!(rule.moves[0], Move::Right);
    }

    #[test]
    fn test_accept_checked_before_stepping() {
        let program = tiny_program();
        let mut m = Machine::new(&program);
        assert_eq!(m.run(0), Outcome::StepLimit); // ceiling of zero, not yet accepted
        assert_eq!(m.run(1), Outcome::Accepted);
        let steps = m.steps();
        assert_eq!(m.run(100), Outcome::Accepted);
        assert_eq!(m.steps(), steps); // no further stepping once accepted
    }

    #[test]
    fn test_program_shared_across_runs() {
        let program = tiny_program();
        let mut a = Machine::with_input(&program, &parse_input("1").unwrap());
        let mut b = Machine::with_input(&program, &parse_input("111").unwrap());
        assert_eq!(a.run(100), Outcome::Accepted);
        assert_eq!(b.run(100), Outcome::Accepted);
        assert_eq!(a.steps(), 2);
        assert_eq!(b.steps(), 4);
    }

    #[test]
    fn test_states_are_sorted_and_complete() {
        let program = tiny_program();
        let states = program.states();
        assert_eq!(states, vec![State::SeekFactor, State::Accept]);
    }

    #[test]
    fn test_state_display_names() {
        assert_eq!(State::Add(Carry::Clear).to_string(), "add_c0");
        assert_eq!(State::Add(Carry::Set).to_string(), "add_c1");
        assert_eq!(
            State::Transfer {
                step: TransferStep::Clear,
                last: false
            }
            .to_string(),
            "xfer_clear"
        );
        assert_eq!(
            State::Transfer {
                step: TransferStep::CopyBack,
                last: true
            }
            .to_string(),
            "final_copy_back"
        );
    }
}
