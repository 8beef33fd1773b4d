use std::io::{self, Write};

use crate::machine::{Machine, TAPES};

/// Render all tapes in a dynamic window with head markers.
///
/// The window is the union of every tape's data bounds plus padding, with
/// a small floor so fresh tapes and the negative carry region stay
/// visible. Only the window is printed; the infinite blank fringe is not.
///
/// ```text
/// step 12 (add_c0)
/// T1 [   4]: ##101#10###
///                 ^
/// ...
/// ```
pub fn write_tapes<W: Write>(machine: &Machine, out: &mut W) -> io::Result<()> {
    writeln!(out, "step {} ({})", machine.steps(), machine.state())?;

    let mut lo = -2i64;
    let mut hi = 6i64;
    for i in 0..TAPES {
        let (min, max) = machine.tape(i).data_bounds();
        lo = lo.min(min - 1);
        hi = hi.max(max + 2);
    }

    for i in 0..TAPES {
        let tape = machine.tape(i);
        let row: String = (lo..=hi).map(|p| tape.at(p).as_char()).collect();
        writeln!(out, "T{} [{:>4}]: {}", i + 1, tape.head(), row)?;
        // The prefix `Tn [xxxx]: ` is 11 columns; data bounds always
        // include the head, so it sits inside the window.
        let pad = 11 + (tape.head() - lo) as usize;
        writeln!(out, "{}^", " ".repeat(pad))?;
    }
    writeln!(out, "{}", "-".repeat(40))
}

/// Log the transition the next `step()` would take, or the halt that it
/// would report. Written before stepping, so a trace reads as a list of
/// decisions.
pub fn write_step<W: Write>(machine: &Machine, out: &mut W) -> io::Result<()> {
    let reads: Vec<String> = machine.reads().iter().map(|s| s.to_string()).collect();
    let reads = reads.join(",");
    match machine.pending() {
        Some(rule) => {
            let writes: Vec<String> = rule.writes.iter().map(|s| s.to_string()).collect();
            let moves: Vec<String> = rule.moves.iter().map(|m| m.to_string()).collect();
            writeln!(
                out,
                "step {} ({}): read ({reads}) -> write ({}), move ({}), next {}",
                machine.steps(),
                machine.state(),
                writes.join(","),
                moves.join(","),
                rule.next,
            )
        }
        None => writeln!(
            out,
            "step {} ({}): read ({reads}) -> halt (no rule)",
            machine.steps(),
            machine.state(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::{Outcome, Program, State};
    use crate::multiply::multiplication_program;
    use crate::ruleset::RuleSet;
    use crate::tape::parse_input;

    fn render_tapes(machine: &Machine) -> String {
        let mut buf = Vec::new();
        write_tapes(machine, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn render_step(machine: &Machine) -> String {
        let mut buf = Vec::new();
        write_step(machine, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_initial_tapes_snapshot() {
        let program = multiplication_program();
        let m = Machine::with_input(&program, &parse_input("10#11#").unwrap());
        let text = render_tapes(&m);
        assert!(text.starts_with("step 0 (copy)\n"));
        assert!(text.contains("10#11#"));
        // One tape row and one marker row per tape.
        assert_eq!(text.matches('^').count(), 3);
        assert_eq!(text.lines().count(), 1 + 2 * TAPES + 1);
    }

    #[test]
    fn test_marker_points_at_head() {
        // Fresh run, all heads at 0. The window floor puts position 0 two
        // cells in, so every marker sits at column 11 + 2.
        let program = multiplication_program();
        let m = Machine::with_input(&program, &parse_input("11#1#").unwrap());
        let text = render_tapes(&m);
        for line in text.lines().filter(|l| l.contains('^')) {
            assert_eq!(line.find('^').unwrap(), 13);
        }
    }

    #[test]
    fn test_pending_transition_line() {
        let program = multiplication_program();
        let m = Machine::with_input(&program, &parse_input("1#1#").unwrap());
        let line = render_step(&m);
        assert_eq!(
            line,
            "step 0 (copy): read (1,#,#) -> write (1,1,#), move (R,R,S), next copy\n"
        );
    }

    #[test]
    fn test_halt_line_for_stuck_machine() {
        // An empty program halts immediately; the trace says so.
        let program = Program::new(RuleSet::new(), State::Select, [State::Accept]);
        let mut m = Machine::with_input(&program, &parse_input("1").unwrap());
        let line = render_step(&m);
        assert_eq!(line, "step 0 (select): read (1,#,#) -> halt (no rule)\n");
        assert_eq!(m.run(10), Outcome::Halted);
    }

    #[test]
    fn test_negative_positions_enter_window() {
        let program = multiplication_program();
        let mut m = Machine::with_input(&program, &parse_input("1#1#").unwrap());
        assert_eq!(m.run(100_000), Outcome::Accepted);
        // The accumulator worked at negative positions during the run; a
        // final snapshot still renders without panicking and shows all
        // three heads.
        let text = render_tapes(&m);
        assert_eq!(text.matches('^').count(), 3);
    }
}
