use crate::adder::add_rules;
use crate::machine::{Program, State, TransferStep};
use crate::ruleset::{Act, Pat, RuleSet, Template};
use crate::tape::{Move, Symbol};
use crate::transfer::transfer_rules;

/// Rules for copying the first factor from the input tape to the working
/// tape, digit for digit, both heads advancing together. On the separator
/// the input head steps onto the next factor and the working head retreats
/// onto the digit it just wrote — the factor's least significant one.
pub fn copy_rules(done: State) -> RuleSet {
    use Move::{Left, Right, Stay};
    let templates = [
        Template {
            state: State::Copy,
            reads: [Pat::Bit, Pat::Any, Pat::Any],
            next: State::Copy,
            writes: [Act::Keep, Act::From(0), Act::Keep],
            moves: [Right, Right, Stay],
        },
        Template {
            state: State::Copy,
            reads: [Pat::Is(Symbol::Blank), Pat::Any, Pat::Any],
            next: done,
            writes: [Act::Keep, Act::Keep, Act::Keep],
            moves: [Right, Left, Stay],
        },
    ];
    RuleSet::from_templates(&templates).expect("copy rule family must be collision-free")
}

/// Rules for locating the next factor's least significant digit: skip
/// separators rightward, then run to the factor's right end and step back
/// one cell. Factors are stored most significant digit first, so the scan
/// lands on the LSB; all later processing walks leftward toward the MSB.
pub fn seek_rules(found: State) -> RuleSet {
    use Move::{Left, Right, Stay};
    let keep = [Act::Keep, Act::Keep, Act::Keep];
    let templates = [
        Template {
            state: State::SeekFactor,
            reads: [Pat::Is(Symbol::Blank), Pat::Any, Pat::Any],
            next: State::SeekFactor,
            writes: keep,
            moves: [Right, Stay, Stay],
        },
        Template {
            state: State::SeekFactor,
            reads: [Pat::Bit, Pat::Any, Pat::Any],
            next: State::SeekEnd,
            writes: keep,
            moves: [Stay, Stay, Stay],
        },
        Template {
            state: State::SeekEnd,
            reads: [Pat::Bit, Pat::Any, Pat::Any],
            next: State::SeekEnd,
            writes: keep,
            moves: [Right, Stay, Stay],
        },
        // Overshot by one; the last digit is the factor's LSB.
        Template {
            state: State::SeekEnd,
            reads: [Pat::Is(Symbol::Blank), Pat::Any, Pat::Any],
            next: found,
            writes: keep,
            moves: [Left, Stay, Stay],
        },
    ];
    RuleSet::from_templates(&templates).expect("seek rule family must be collision-free")
}

/// The shift-and-add dispatch: a `1` under the input head enters addition,
/// a `0` goes straight to the shift, the separator means the factor is
/// exhausted and the product moves on. All three rules are pure branches:
/// nothing is written and no head moves.
pub fn select_rules(add: State, shift: State, done: State) -> RuleSet {
    let keep = [Act::Keep, Act::Keep, Act::Keep];
    let stay = [Move::Stay; 3];
    let templates = [
        Template {
            state: State::Select,
            reads: [Pat::Is(Symbol::One), Pat::Any, Pat::Any],
            next: add,
            writes: keep,
            moves: stay,
        },
        Template {
            state: State::Select,
            reads: [Pat::Is(Symbol::Zero), Pat::Any, Pat::Any],
            next: shift,
            writes: keep,
            moves: stay,
        },
        Template {
            state: State::Select,
            reads: [Pat::Is(Symbol::Blank), Pat::Any, Pat::Any],
            next: done,
            writes: keep,
            moves: stay,
        },
    ];
    RuleSet::from_templates(&templates).expect("select rule family must be collision-free")
}

/// Rules for doubling the working value: scan right to the first blank
/// past its digits and append a `0` there. In the same exit step the input
/// head retreats one cell, onto the next more significant factor digit.
pub fn shift_rules(next: State) -> RuleSet {
    use Move::{Left, Right, Stay};
    let templates = [
        Template {
            state: State::Shift,
            reads: [Pat::Any, Pat::Bit, Pat::Any],
            next: State::Shift,
            writes: [Act::Keep, Act::Keep, Act::Keep],
            moves: [Stay, Right, Stay],
        },
        Template {
            state: State::Shift,
            reads: [Pat::Any, Pat::Is(Symbol::Blank), Pat::Any],
            next,
            writes: [Act::Keep, Act::Put(Symbol::Zero), Act::Keep],
            moves: [Left, Stay, Stay],
        },
    ];
    RuleSet::from_templates(&templates).expect("shift rule family must be collision-free")
}

/// Rules for moving between factor digits and detecting factor exhaustion.
///
/// After a shift the input head sits on the next candidate digit: a bit
/// loops back to `select`. The separator means the factor is spent; the
/// head then walks right past the whole factor it just processed, steps
/// over the following separator, and peeks: a digit there means another
/// factor awaits (`more`), blank means the input is exhausted (`done`).
pub fn advance_rules(select: State, more: State, done: State) -> RuleSet {
    use Move::{Right, Stay};
    let keep = [Act::Keep, Act::Keep, Act::Keep];
    let templates = [
        Template {
            state: State::NextBit,
            reads: [Pat::Bit, Pat::Any, Pat::Any],
            next: select,
            writes: keep,
            moves: [Stay, Stay, Stay],
        },
        Template {
            state: State::NextBit,
            reads: [Pat::Is(Symbol::Blank), Pat::Any, Pat::Any],
            next: State::SkipFactor,
            writes: keep,
            moves: [Right, Stay, Stay],
        },
        Template {
            state: State::SkipFactor,
            reads: [Pat::Bit, Pat::Any, Pat::Any],
            next: State::SkipFactor,
            writes: keep,
            moves: [Right, Stay, Stay],
        },
        Template {
            state: State::SkipFactor,
            reads: [Pat::Is(Symbol::Blank), Pat::Any, Pat::Any],
            next: State::CheckMore,
            writes: keep,
            moves: [Right, Stay, Stay],
        },
        Template {
            state: State::CheckMore,
            reads: [Pat::Bit, Pat::Any, Pat::Any],
            next: more,
            writes: keep,
            moves: [Stay, Stay, Stay],
        },
        Template {
            state: State::CheckMore,
            reads: [Pat::Is(Symbol::Blank), Pat::Any, Pat::Any],
            next: done,
            writes: keep,
            moves: [Stay, Stay, Stay],
        },
    ];
    RuleSet::from_templates(&templates).expect("advance rule family must be collision-free")
}

/// The complete n-ary multiplication machine.
///
/// Tape 1 carries the input factors, tape 2 the working value, tape 3 the
/// accumulator. The lead factor is copied to tape 2; then for every
/// further factor, each of its bits from least to most significant either
/// adds the working value into the accumulator (bit 1) or not (bit 0),
/// followed by a doubling shift. A finished factor triggers the transfer
/// of the accumulator back onto tape 2, looping for the next factor or
/// accepting after the last. The product ends on tape 2.
///
/// The families are merged with collision checking, so a state reused by
/// two phases fails construction instead of silently overwriting rules.
pub fn multiplication_program() -> Program {
    let enter_transfer = State::Transfer {
        step: TransferStep::HomeAcc,
        last: false,
    };
    let enter_final = State::Transfer {
        step: TransferStep::HomeAcc,
        last: true,
    };

    let mut rules = copy_rules(State::SeekFactor);
    let families = [
        seek_rules(State::Select),
        select_rules(State::Align, State::Shift, enter_transfer),
        add_rules(State::Shift),
        shift_rules(State::NextBit),
        advance_rules(State::Select, enter_transfer, enter_final),
        transfer_rules(false, State::SeekFactor),
        transfer_rules(true, State::Accept),
    ];
    for family in families {
        rules
            .merge(family)
            .expect("phase rule families must be pairwise disjoint");
    }
    Program::new(rules, State::Copy, [State::Accept])
}

/// Interpret tape contents as a binary numeral, MSB first. An empty tape
/// denotes zero. `None` only on a value too wide for `u128`.
pub fn numeral_value(digits: &str) -> Option<u128> {
    if digits.is_empty() {
        return Some(0);
    }
    u128::from_str_radix(digits, 2).ok()
}
