use crate::machine::{State, TransferStep};
use crate::ruleset::{Act, Pat, RuleSet, Template};
use crate::tape::{Move, Symbol};

/// Rules for moving the accumulated product onto the working tape.
///
/// The protocol is destructive on both sides and runs in five legs:
/// home the accumulator, home the working tape, clear the working tape,
/// re-home it, then copy the accumulator across while erasing it. The
/// clear leg is the load-bearing one: it overwrites every working cell up
/// to the first blank, so a new value that is shorter than the old one
/// cannot inherit stale high-order digits. A bounded overwrite would.
///
/// The copy leg walks both tapes right in lockstep, writing each
/// accumulator digit onto the working tape and blanking it behind; it
/// stops at the accumulator's first blank and steps the working head back
/// left onto the value's last digit.
///
/// `last` selects the distinct state family used for the final transfer;
/// the rules are otherwise identical, differing only in `dest` (loop back
/// to factor seeking, or accept).
pub fn transfer_rules(last: bool, dest: State) -> RuleSet {
    use Move::{Left, Right, Stay};
    use TransferStep::{Clear, CopyBack, HomeAcc, HomeWork, Rehome};

    let at = |step: TransferStep| State::Transfer { step, last };
    let keep = [Act::Keep, Act::Keep, Act::Keep];
    let blank = Pat::Is(Symbol::Blank);

    let templates = [
        // Leg 1: accumulator head left, to the blank bordering its data.
        Template {
            state: at(HomeAcc),
            reads: [Pat::Any, Pat::Any, Pat::Bit],
            next: at(HomeAcc),
            writes: keep,
            moves: [Stay, Stay, Left],
        },
        Template {
            state: at(HomeAcc),
            reads: [Pat::Any, Pat::Any, blank],
            next: at(HomeWork),
            writes: keep,
            moves: [Stay, Left, Stay],
        },
        // Leg 2: working head left to its own bordering blank. The
        // accumulator head rests on blank for the remainder of the homing.
        Template {
            state: at(HomeWork),
            reads: [Pat::Any, Pat::Bit, blank],
            next: at(HomeWork),
            writes: keep,
            moves: [Stay, Left, Stay],
        },
        Template {
            state: at(HomeWork),
            reads: [Pat::Any, blank, blank],
            next: at(Clear),
            writes: keep,
            moves: [Stay, Right, Stay],
        },
        // Leg 3: blank out the working value, digit by digit, until the
        // scan runs off its right end.
        Template {
            state: at(Clear),
            reads: [Pat::Any, Pat::Bit, Pat::Any],
            next: at(Clear),
            writes: [Act::Keep, Act::Put(Symbol::Blank), Act::Keep],
            moves: [Stay, Right, Stay],
        },
        Template {
            state: at(Clear),
            reads: [Pat::Any, blank, Pat::Any],
            next: at(Rehome),
            writes: keep,
            moves: [Stay, Left, Stay],
        },
        // Leg 4: step back left over the now-blank span. The scan stops at
        // the first blank it reads, which after a full clear is immediate.
        Template {
            state: at(Rehome),
            reads: [Pat::Any, Pat::Bit, Pat::Any],
            next: at(Rehome),
            writes: keep,
            moves: [Stay, Left, Stay],
        },
        Template {
            state: at(Rehome),
            reads: [Pat::Any, blank, Pat::Any],
            next: at(CopyBack),
            writes: keep,
            moves: [Stay, Right, Right],
        },
        // Leg 5: move the value across, erasing the accumulator behind.
        Template {
            state: at(CopyBack),
            reads: [Pat::Any, Pat::Any, Pat::Bit],
            next: at(CopyBack),
            writes: [Act::Keep, Act::From(2), Act::Put(Symbol::Blank)],
            moves: [Stay, Right, Right],
        },
        Template {
            state: at(CopyBack),
            reads: [Pat::Any, Pat::Any, blank],
            next: dest,
            writes: keep,
            moves: [Stay, Left, Stay],
        },
    ];

    RuleSet::from_templates(&templates).expect("transfer rule family must be collision-free")
}
