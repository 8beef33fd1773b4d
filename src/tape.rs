use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

/// A cell symbol. The alphabet is fixed: the two binary digits plus a blank.
///
/// `Blank` pulls double duty: it is the default value of every unwritten
/// cell, and on the input tape it is the separator between factors. The
/// declaration order (`Blank`, `Zero`, `One`) is the canonical alphabet
/// order used by the machine encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Symbol {
    Blank,
    Zero,
    One,
}

impl Symbol {
    /// The full alphabet in canonical order.
    pub const ALL: [Symbol; 3] = [Symbol::Blank, Symbol::Zero, Symbol::One];

    /// The two binary digits.
    pub const BITS: [Symbol; 2] = [Symbol::Zero, Symbol::One];

    pub fn is_bit(self) -> bool {
        matches!(self, Symbol::Zero | Symbol::One)
    }

    pub fn as_char(self) -> char {
        match self {
            Symbol::Blank => '#',
            Symbol::Zero => '0',
            Symbol::One => '1',
        }
    }

    pub fn from_char(c: char) -> Option<Symbol> {
        match c {
            '#' => Some(Symbol::Blank),
            '0' => Some(Symbol::Zero),
            '1' => Some(Symbol::One),
            _ => None,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// A head movement: one cell left, one cell right, or none.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Move {
    Left,
    Right,
    Stay,
}

impl Move {
    /// Head displacement in cells.
    pub fn offset(self) -> i64 {
        match self {
            Move::Left => -1,
            Move::Right => 1,
            Move::Stay => 0,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Move::Left => 'L',
            Move::Right => 'R',
            Move::Stay => 'S',
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// A character in the input string that is not `0`, `1`, or `#`.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("input position {position}: `{found}` is not 0, 1, or #")]
pub struct InputError {
    pub position: usize,
    pub found: char,
}

/// Parse an input string such as `"101#10#11#"` into symbols.
pub fn parse_input(s: &str) -> Result<Vec<Symbol>, InputError> {
    s.chars()
        .enumerate()
        .map(|(position, c)| Symbol::from_char(c).ok_or(InputError { position, found: c }))
        .collect()
}

/// An infinite bidirectional tape with a single read/write head.
///
/// Storage is sparse: only non-blank cells are kept, so the tape can grow
/// in either direction without bound. Positions are signed; initial content
/// is laid down from position 0 rightward, and the head starts at 0.
/// Reading never materializes a cell — a position absent from the map reads
/// as blank. Writing blank erases the cell, keeping the map equal to the
/// set of non-blank positions.
#[derive(Clone, Debug, Default)]
pub struct Tape {
    cells: HashMap<i64, Symbol>,
    head: i64,
}

impl Tape {
    /// An empty tape, head at position 0.
    pub fn new() -> Self {
        Tape::default()
    }

    /// A tape holding `content` starting at position 0, head at 0.
    pub fn with_content(content: &[Symbol]) -> Self {
        let cells = content
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_bit())
            .map(|(i, &s)| (i as i64, s))
            .collect();
        Tape { cells, head: 0 }
    }

    /// The symbol under the head. Never mutates the tape.
    pub fn read(&self) -> Symbol {
        self.at(self.head)
    }

    /// The symbol at an arbitrary position. Used by visualization only.
    pub fn at(&self, position: i64) -> Symbol {
        self.cells.get(&position).copied().unwrap_or(Symbol::Blank)
    }

    /// Write `symbol` at the head. Writing blank erases the cell.
    pub fn write(&mut self, symbol: Symbol) {
        if symbol.is_bit() {
            self.cells.insert(self.head, symbol);
        } else {
            self.cells.remove(&self.head);
        }
    }

    /// Move the head one cell, or not at all.
    pub fn move_head(&mut self, m: Move) {
        self.head += m.offset();
    }

    pub fn head(&self) -> i64 {
        self.head
    }

    /// Place the head at an absolute position. Test setup only.
    pub fn set_head(&mut self, position: i64) {
        self.head = position;
    }

    /// The span covering all non-blank cells and the head itself.
    ///
    /// For visualization; the execution engine never consults it. A fully
    /// blank tape spans just the head position.
    pub fn data_bounds(&self) -> (i64, i64) {
        let mut min = self.head;
        let mut max = self.head;
        for &p in self.cells.keys() {
            min = min.min(p);
            max = max.max(p);
        }
        (min, max)
    }

    /// Non-blank cells in increasing position order, as a string.
    ///
    /// This is the machine's output convention: most significant digit
    /// first. An empty string denotes the number zero.
    pub fn contents(&self) -> String {
        let mut positions: Vec<i64> = self.cells.keys().copied().collect();
        positions.sort_unstable();
        positions.iter().map(|p| self.cells[p].as_char()).collect()
    }
}
