use std::collections::HashMap;

use thiserror::Error;

use crate::machine::{Rule, State, TAPES};
use crate::tape::{Move, Symbol};

/// What a template matches on one tape: anything, any binary digit, or one
/// exact symbol.
#[derive(Clone, Copy, Debug)]
pub enum Pat {
    Any,
    Bit,
    Is(Symbol),
}

impl Pat {
    fn candidates(self) -> Vec<Symbol> {
        match self {
            Pat::Any => Symbol::ALL.to_vec(),
            Pat::Bit => Symbol::BITS.to_vec(),
            Pat::Is(s) => vec![s],
        }
    }
}

/// What a template writes on one tape: the symbol just read (a no-op
/// write), a literal, or the symbol read on another tape in the same step.
#[derive(Clone, Copy, Debug)]
pub enum Act {
    Keep,
    Put(Symbol),
    From(usize),
}

impl Act {
    fn resolve(self, reads: &[Symbol; TAPES], tape: usize) -> Symbol {
        match self {
            Act::Keep => reads[tape],
            Act::Put(s) => s,
            Act::From(other) => reads[other],
        }
    }
}

/// One declarative transition family: a symbol pattern per tape on the
/// left, and a successor state, write action, and head move per tape on
/// the right.
///
/// A template stands for every concrete rule obtained by substituting the
/// patterns with matching symbols. Expansion happens once, when a rule
/// family is built; the engine only ever sees the expanded table.
#[derive(Clone, Copy, Debug)]
pub struct Template {
    pub state: State,
    pub reads: [Pat; TAPES],
    pub next: State,
    pub writes: [Act; TAPES],
    pub moves: [Move; TAPES],
}

/// Two rules claimed the same (state, symbols) key.
///
/// The transition table is a partial function; a collision means two
/// phases disagree about the same configuration, which would silently
/// favor whichever was merged last. Construction fails instead.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("conflicting rules for state `{state}` reading ({reads})")]
pub struct RuleConflict {
    pub state: State,
    pub reads: String,
}

impl RuleConflict {
    fn new(state: State, reads: [Symbol; TAPES]) -> Self {
        let reads = reads.map(|s| s.to_string()).join(",");
        RuleConflict { state, reads }
    }
}

/// An immutable family of transition rules, built by expanding templates
/// and composed with other families by collision-checked merge.
#[derive(Clone, Debug, Default)]
pub struct RuleSet {
    rules: HashMap<(State, [Symbol; TAPES]), Rule>,
}

impl RuleSet {
    pub fn new() -> Self {
        RuleSet::default()
    }

    /// Add one concrete rule; rejects a key that is already claimed.
    pub fn insert(
        &mut self,
        state: State,
        reads: [Symbol; TAPES],
        rule: Rule,
    ) -> Result<(), RuleConflict> {
        if self.rules.insert((state, reads), rule).is_some() {
            return Err(RuleConflict::new(state, reads));
        }
        Ok(())
    }

    /// Expand templates into their concrete rules.
    pub fn from_templates(templates: &[Template]) -> Result<Self, RuleConflict> {
        let mut set = RuleSet::new();
        for t in templates {
            for s0 in t.reads[0].candidates() {
                for s1 in t.reads[1].candidates() {
                    for s2 in t.reads[2].candidates() {
                        let reads = [s0, s1, s2];
                        let rule = Rule {
                            next: t.next,
                            writes: std::array::from_fn(|i| t.writes[i].resolve(&reads, i)),
                            moves: t.moves,
                        };
                        set.insert(t.state, reads, rule)?;
                    }
                }
            }
        }
        Ok(set)
    }

    /// Fold another family into this one, rejecting any shared key.
    pub fn merge(&mut self, other: RuleSet) -> Result<(), RuleConflict> {
        for ((state, reads), rule) in other.rules {
            self.insert(state, reads, rule)?;
        }
        Ok(())
    }

    pub fn get(&self, state: State, reads: [Symbol; TAPES]) -> Option<&Rule> {
        self.rules.get(&(state, reads))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn into_rules(self) -> HashMap<(State, [Symbol; TAPES]), Rule> {
        self.rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Symbol::{Blank, One, Zero};

    fn keep_all() -> [Act; TAPES] {
        [Act::Keep, Act::Keep, Act::Keep]
    }

    fn stay_all() -> [Move; TAPES] {
        [Move::Stay, Move::Stay, Move::Stay]
    }

    #[test]
    fn test_wildcard_expansion_counts() {
        let set = RuleSet::from_templates(&[Template {
            state: State::Select,
            reads: [Pat::Is(One), Pat::Any, Pat::Any],
            next: State::Shift,
            writes: keep_all(),
            moves: stay_all(),
        }])
        .unwrap();
        // 1 * 3 * 3 concrete rules.
        assert_eq!(set.len(), 9);
        assert!(set.get(State::Select, [One, Blank, Zero]).is_some());
        assert!(set.get(State::Select, [Zero, Blank, Zero]).is_none());
    }

    #[test]
    fn test_bit_class_excludes_blank() {
        let set = RuleSet::from_templates(&[Template {
            state: State::Shift,
            reads: [Pat::Any, Pat::Bit, Pat::Any],
            next: State::Shift,
            writes: keep_all(),
            moves: stay_all(),
        }])
        .unwrap();
        assert_eq!(set.len(), 18);
        assert!(set.get(State::Shift, [Blank, Blank, Blank]).is_none());
    }

    #[test]
    fn test_keep_writes_back_what_was_read() {
        let set = RuleSet::from_templates(&[Template {
            state: State::Select,
            reads: [Pat::Bit, Pat::Any, Pat::Any],
            next: State::Select,
            writes: keep_all(),
            moves: stay_all(),
        }])
        .unwrap();
        let rule = set.get(State::Select, [One, Zero, Blank]).unwrap();
        assert_eq!(rule.writes, [One, Zero, Blank]);
    }

    #[test]
    fn test_cross_tape_copy() {
        // The copy phase writes tape 1's bit onto tape 2.
        let set = RuleSet::from_templates(&[Template {
            state: State::Copy,
            reads: [Pat::Bit, Pat::Any, Pat::Any],
            next: State::Copy,
            writes: [Act::Keep, Act::From(0), Act::Keep],
            moves: stay_all(),
        }])
        .unwrap();
        let rule = set.get(State::Copy, [One, Blank, Blank]).unwrap();
        assert_eq!(rule.writes[1], One);
        let rule = set.get(State::Copy, [Zero, One, Blank]).unwrap();
        assert_eq!(rule.writes[1], Zero);
    }

    #[test]
    fn test_overlapping_templates_rejected() {
        let err = RuleSet::from_templates(&[
            Template {
                state: State::Select,
                reads: [Pat::Any, Pat::Any, Pat::Any],
                next: State::Shift,
                writes: keep_all(),
                moves: stay_all(),
            },
            Template {
                state: State::Select,
                reads: [Pat::Is(Blank), Pat::Any, Pat::Any],
                next: State::Accept,
                writes: keep_all(),
                moves: stay_all(),
            },
        ])
        .unwrap_err();
        assert_eq!(err.state, State::Select);
    }

    #[test]
    fn test_merge_disjoint_families() {
        let mut a = RuleSet::from_templates(&[Template {
            state: State::Select,
            reads: [Pat::Any, Pat::Any, Pat::Any],
            next: State::Shift,
            writes: keep_all(),
            moves: stay_all(),
        }])
        .unwrap();
        let b = RuleSet::from_templates(&[Template {
            state: State::Shift,
            reads: [Pat::Any, Pat::Any, Pat::Any],
            next: State::Select,
            writes: keep_all(),
            moves: stay_all(),
        }])
        .unwrap();
        a.merge(b).unwrap();
        assert_eq!(a.len(), 54);
    }

    #[test]
    fn test_merge_collision_is_loud() {
        let template = Template {
            state: State::Select,
            reads: [Pat::Is(One), Pat::Is(Blank), Pat::Is(Blank)],
            next: State::Shift,
            writes: keep_all(),
            moves: stay_all(),
        };
        let mut a = RuleSet::from_templates(&[template]).unwrap();
        let b = RuleSet::from_templates(&[template]).unwrap();
        let err = a.merge(b).unwrap_err();
        assert_eq!(err.reads, "1,#,#");
    }
}
