use crate::machine::{Carry, State};
use crate::ruleset::{Act, Pat, RuleSet, Template};
use crate::tape::{Move, Symbol};

/// Rules for one ripple-carry addition: accumulator := accumulator + working.
///
/// The two operands live on different tapes with no shared coordinate
/// system, and may differ in length. The phase runs in three legs:
///
/// 1. *Align*: each operand head walks right on its own while it still
///    reads a digit. The step where both heads read blank at once is the
///    alignment point; both retreat one cell, landing on their own least
///    significant digits.
/// 2. *Add*: a bit-serial full adder walking leftward. The pending carry is
///    held in the state (`Add(Clear)` vs `Add(Set)`). A blank operand digit
///    counts as zero, except that both-blank ends the sum; under a pending
///    carry the terminal case writes one final overflow digit. Overflow
///    digits land at negative positions — this is the only way a value
///    grows in width.
/// 3. *Normalize*: the accumulator head scans left to the blank bordering
///    its data, then both operand heads step right twice. Without this the
///    accumulator head would drift further left on every round and break
///    the next alignment.
///
/// Control then passes to `done`. The input tape is never read, written,
/// or moved here.
pub fn add_rules(done: State) -> RuleSet {
    use Move::{Left, Right, Stay};

    let keep = [Act::Keep, Act::Keep, Act::Keep];
    let mut templates = vec![
        // Leg 1: home each operand head independently.
        Template {
            state: State::Align,
            reads: [Pat::Any, Pat::Bit, Pat::Bit],
            next: State::Align,
            writes: keep,
            moves: [Stay, Right, Right],
        },
        Template {
            state: State::Align,
            reads: [Pat::Any, Pat::Bit, Pat::Is(Symbol::Blank)],
            next: State::Align,
            writes: keep,
            moves: [Stay, Right, Stay],
        },
        Template {
            state: State::Align,
            reads: [Pat::Any, Pat::Is(Symbol::Blank), Pat::Bit],
            next: State::Align,
            writes: keep,
            moves: [Stay, Stay, Right],
        },
        // Both heads on blank at once: step back onto the LSBs and add.
        Template {
            state: State::Align,
            reads: [Pat::Any, Pat::Is(Symbol::Blank), Pat::Is(Symbol::Blank)],
            next: State::Add(Carry::Clear),
            writes: keep,
            moves: [Stay, Left, Left],
        },
        // Leg 3: scan the accumulator back to the left edge of its data.
        Template {
            state: State::Normalize,
            reads: [Pat::Any, Pat::Any, Pat::Bit],
            next: State::Normalize,
            writes: keep,
            moves: [Stay, Stay, Left],
        },
        Template {
            state: State::Normalize,
            reads: [Pat::Any, Pat::Any, Pat::Is(Symbol::Blank)],
            next: State::Resume,
            writes: keep,
            moves: [Stay, Right, Right],
        },
        Template {
            state: State::Resume,
            reads: [Pat::Any, Pat::Any, Pat::Any],
            next: done,
            writes: keep,
            moves: [Stay, Right, Right],
        },
    ];

    // Leg 2: the full adder, one rule per (carry, working, accumulator).
    for carry in [Carry::Clear, Carry::Set] {
        for working in Symbol::ALL {
            for acc in Symbol::ALL {
                let (write, next) = adder_entry(carry, working, acc);
                templates.push(Template {
                    state: State::Add(carry),
                    reads: [Pat::Any, Pat::Is(working), Pat::Is(acc)],
                    next,
                    writes: [Act::Keep, Act::Keep, write],
                    moves: [Stay, Left, Left],
                });
            }
        }
    }

    RuleSet::from_templates(&templates).expect("adder rule family must be collision-free")
}

/// The full-adder table: what the accumulator cell becomes and which state
/// follows, given the pending carry and the two operand digits.
fn adder_entry(carry: Carry, working: Symbol, acc: Symbol) -> (Act, State) {
    use Carry::{Clear, Set};
    use Symbol::{Blank, One, Zero};
    match (carry, working, acc) {
        // No carry pending: sum of the two digits, blank counting as zero.
        (Clear, Zero, Zero) => (Act::Put(Zero), State::Add(Clear)),
        (Clear, Zero, One) => (Act::Put(One), State::Add(Clear)),
        (Clear, One, Zero) => (Act::Put(One), State::Add(Clear)),
        (Clear, One, One) => (Act::Put(Zero), State::Add(Set)),
        (Clear, Blank, Zero) => (Act::Put(Zero), State::Add(Clear)),
        (Clear, Blank, One) => (Act::Put(One), State::Add(Clear)),
        (Clear, Zero, Blank) => (Act::Put(Zero), State::Add(Clear)),
        (Clear, One, Blank) => (Act::Put(One), State::Add(Clear)),
        // Both operands exhausted with nothing to carry: done.
        (Clear, Blank, Blank) => (Act::Keep, State::Normalize),
        // Carry pending: sum of the two digits plus one.
        (Set, Zero, Zero) => (Act::Put(One), State::Add(Clear)),
        (Set, Zero, One) => (Act::Put(Zero), State::Add(Set)),
        (Set, One, Zero) => (Act::Put(Zero), State::Add(Set)),
        (Set, One, One) => (Act::Put(One), State::Add(Set)),
        (Set, Blank, Zero) => (Act::Put(One), State::Add(Clear)),
        (Set, Blank, One) => (Act::Put(Zero), State::Add(Set)),
        (Set, Zero, Blank) => (Act::Put(One), State::Add(Clear)),
        (Set, One, Blank) => (Act::Put(Zero), State::Add(Set)),
        // Exhausted with a carry: write the final overflow digit.
        (Set, Blank, Blank) => (Act::Put(One), State::Normalize),
    }
}
