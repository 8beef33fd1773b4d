use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::machine::{Program, State, TAPES};
use crate::tape::{Move, Symbol};

/// Unary machine encoding.
///
/// Everything is spelled with two characters: `0` is the unary marker, `1`
/// the separator. States take their index from the program's sorted state
/// list, symbols from the fixed alphabet order; index *i* is written as
/// *i*+1 markers so that index zero is visible. Moves are written as one,
/// two, or three markers for left, right, stay.
///
/// Layout, outermost first:
///
/// ```text
/// tapes 111 start 111 blank 111 accepts 111 transitions
/// ```
///
/// The tape count is written as a plain count. Accept-state indices are
/// joined by a single separator. Each transition spells
/// `state, reads.., state', writes.., moves..` with single separators and
/// transitions are joined by double separators. Transitions are emitted in
/// sorted key order, so the encoding of a program is deterministic.
pub fn encode_unary(program: &Program) -> String {
    let states = program.states();
    let state_index: HashMap<State, usize> =
        states.iter().enumerate().map(|(i, &s)| (s, i)).collect();

    let unary = |n: usize| "0".repeat(n);
    let index = |i: usize| unary(i + 1);
    let symbol = |s: Symbol| {
        index(
            Symbol::ALL
                .iter()
                .position(|&a| a == s)
                .expect("symbol is in the alphabet"),
        )
    };
    let movement = |m: Move| match m {
        Move::Left => unary(1),
        Move::Right => unary(2),
        Move::Stay => unary(3),
    };

    let accepts: Vec<String> = program
        .accept_states()
        .map(|s| index(state_index[&s]))
        .collect();

    let transitions: Vec<String> = program
        .transitions_sorted()
        .into_iter()
        .map(|(&(state, reads), rule)| {
            let mut fields = vec![index(state_index[&state])];
            fields.extend(reads.iter().map(|&s| symbol(s)));
            fields.push(index(state_index[&rule.next]));
            fields.extend(rule.writes.iter().map(|&s| symbol(s)));
            fields.extend(rule.moves.iter().map(|&m| movement(m)));
            fields.join("1")
        })
        .collect();

    [
        unary(TAPES),
        index(state_index[&program.start()]),
        symbol(Symbol::Blank),
        accepts.join("1"),
        transitions.join("11"),
    ]
    .join("111")
}

/// The encoding held fewer than the five `111`-separated header sections.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("expected 5 sections separated by a triple marker, found {0}")]
pub struct DecodeError(pub usize);

/// One transition recovered from a unary encoding. States and symbols are
/// bare indices; mapping them back to names needs the matching dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedTransition {
    pub current_state: usize,
    pub read_symbols: Vec<usize>,
    pub next_state: usize,
    pub write_symbols: Vec<usize>,
    pub moves: Vec<Move>,
}

/// A machine definition recovered from a unary encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedMachine {
    pub tapes: usize,
    pub start_state: usize,
    pub blank_symbol: usize,
    pub accept_states: Vec<usize>,
    pub transitions: Vec<DecodedTransition>,
}

fn marker_count(run: &str) -> usize {
    run.chars().filter(|&c| c == '0').count()
}

/// Invert [`encode_unary`].
///
/// A missing header section is fatal — nothing sensible can be recovered.
/// A transition record with fewer fields than `2 + 3 * tapes`, or with a
/// move run longer than three markers, is dropped; records are delimited
/// independently, so the rest of the table still decodes.
pub fn decode_unary(code: &str) -> Result<DecodedMachine, DecodeError> {
    let parts: Vec<&str> = code.trim().split("111").collect();
    if parts.len() < 5 {
        return Err(DecodeError(parts.len()));
    }

    let tapes = marker_count(parts[0]);
    let start_state = marker_count(parts[1]).saturating_sub(1);
    let blank_symbol = marker_count(parts[2]).saturating_sub(1);
    let accept_states = parts[3]
        .split('1')
        .filter(|run| !run.is_empty())
        .map(|run| marker_count(run) - 1)
        .collect();
    let transitions = decode_transitions(parts[4], tapes);

    Ok(DecodedMachine {
        tapes,
        start_state,
        blank_symbol,
        accept_states,
        transitions,
    })
}

fn decode_transitions(section: &str, tapes: usize) -> Vec<DecodedTransition> {
    let mut out = Vec::new();
    for record in section.split("11") {
        if record.is_empty() {
            continue;
        }
        let fields: Vec<usize> = record
            .split('1')
            .filter(|run| !run.is_empty())
            .map(marker_count)
            .collect();
        if fields.len() < 2 + 3 * tapes {
            continue; // malformed record; later ones are delimited independently
        }

        let moves: Option<Vec<Move>> = fields[2 + 2 * tapes..2 + 3 * tapes]
            .iter()
            .map(|&n| match n {
                1 => Some(Move::Left),
                2 => Some(Move::Right),
                3 => Some(Move::Stay),
                _ => None,
            })
            .collect();
        let Some(moves) = moves else {
            continue;
        };

        out.push(DecodedTransition {
            current_state: fields[0] - 1,
            read_symbols: fields[1..1 + tapes].iter().map(|n| n - 1).collect(),
            next_state: fields[1 + tapes] - 1,
            write_symbols: fields[2 + tapes..2 + 2 * tapes]
                .iter()
                .map(|n| n - 1)
                .collect(),
            moves,
        });
    }
    out
}

/// One transition of the structured dump, all names spelled out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub current_state: String,
    pub read_symbols: Vec<String>,
    pub next_state: String,
    pub write_symbols: Vec<String>,
    pub moves: Vec<String>,
}

/// A complete, human-readable machine definition for persistence and
/// debugging. Serializes to JSON via serde.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineDump {
    pub states: Vec<String>,
    pub alphabet: Vec<String>,
    pub start_state: String,
    pub accept_states: Vec<String>,
    pub blank: String,
    pub num_tapes: usize,
    pub transitions: Vec<TransitionRecord>,
}

/// Dump a program as discrete named records, in the same deterministic
/// order as the unary encoding.
pub fn dump(program: &Program) -> MachineDump {
    MachineDump {
        states: program.states().iter().map(|s| s.to_string()).collect(),
        alphabet: Symbol::ALL.iter().map(|s| s.to_string()).collect(),
        start_state: program.start().to_string(),
        accept_states: program.accept_states().map(|s| s.to_string()).collect(),
        blank: Symbol::Blank.to_string(),
        num_tapes: TAPES,
        transitions: program
            .transitions_sorted()
            .into_iter()
            .map(|(&(state, reads), rule)| TransitionRecord {
                current_state: state.to_string(),
                read_symbols: reads.iter().map(|s| s.to_string()).collect(),
                next_state: rule.next.to_string(),
                write_symbols: rule.writes.iter().map(|s| s.to_string()).collect(),
                moves: rule.moves.iter().map(|m| m.to_string()).collect(),
            })
            .collect(),
    }
}
