use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rayon::prelude::*;

use tapemul::encoding;
use tapemul::machine::{Machine, Outcome, Program};
use tapemul::multiply::{multiplication_program, numeral_value};
use tapemul::stats;
use tapemul::tape::parse_input;
use tapemul::trace;

#[derive(Parser)]
#[command(
    name = "tapemul",
    about = "n-ary binary multiplication on a three-tape Turing machine"
)]
struct Cli {
    /// Input string: binary factors separated by '#', with a trailing '#'
    /// (e.g. 101#10#11#).
    input: Option<String>,

    /// Step ceiling for each run.
    #[arg(long, default_value_t = 1_000_000)]
    max_steps: usize,

    /// Write a per-step execution trace to this file.
    #[arg(long)]
    trace: Option<PathBuf>,

    /// Write the unary machine encoding to this file.
    #[arg(long)]
    export: Option<PathBuf>,

    /// Write the machine definition as JSON to this file.
    #[arg(long)]
    dump: Option<PathBuf>,

    /// Print transition-table statistics and the encoding's compression ratio.
    #[arg(long)]
    stats: bool,

    /// Exhaustively check a*b for all a, b below 2^BITS, in parallel.
    #[arg(long, value_name = "BITS")]
    verify: Option<u32>,

    /// Check this many random products of 2 to 4 factors.
    #[arg(long, default_value_t = 0)]
    samples: usize,

    /// Random seed for --samples.
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let program = multiplication_program();

    if let Some(path) = &cli.export {
        if let Err(e) = write_file(path, &encoding::encode_unary(&program)) {
            eprintln!("cannot write {}: {e}", path.display());
            return ExitCode::FAILURE;
        }
    }
    if let Some(path) = &cli.dump {
        let json = match serde_json::to_string_pretty(&encoding::dump(&program)) {
            Ok(json) => json,
            Err(e) => {
                eprintln!("cannot serialize machine: {e}");
                return ExitCode::FAILURE;
            }
        };
        if let Err(e) = write_file(path, &json) {
            eprintln!("cannot write {}: {e}", path.display());
            return ExitCode::FAILURE;
        }
    }
    if cli.stats {
        print_stats(&program);
    }

    if let Some(bits) = cli.verify {
        return verify_pairs(&program, bits, cli.max_steps);
    }
    if cli.samples > 0 {
        return verify_samples(&program, cli.samples, cli.seed, cli.max_steps);
    }
    if let Some(input) = &cli.input {
        return run_input(&program, input, cli.max_steps, cli.trace.as_deref());
    }

    if cli.export.is_none() && cli.dump.is_none() && !cli.stats {
        eprintln!(
            "nothing to do: pass an input string or one of --verify, --samples, --export, --dump, --stats"
        );
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn write_file(path: &Path, contents: &str) -> io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    out.write_all(contents.as_bytes())?;
    out.write_all(b"\n")?;
    out.flush()
}

fn print_stats(program: &Program) {
    let code = encoding::encode_unary(program);
    println!("states:       {}", program.states().len());
    println!("transitions:  {}", program.rule_count());
    println!("encoding:     {} chars", code.len());
    println!("compression:  {:.4}", stats::encoding_entropy(&code));
    println!("rules per state:");
    for (state, count) in stats::rules_per_state(program) {
        println!("  {state:<16} {count}");
    }
}

fn run_input(
    program: &Program,
    input: &str,
    max_steps: usize,
    trace_path: Option<&Path>,
) -> ExitCode {
    let symbols = match parse_input(input) {
        Ok(symbols) => symbols,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let mut machine = Machine::with_input(program, &symbols);
    let outcome = match trace_path {
        Some(path) => match traced_run(&mut machine, path, max_steps) {
            Ok(outcome) => outcome,
            Err(e) => {
                eprintln!("cannot write trace {}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None => machine.run(max_steps),
    };

    match outcome {
        Outcome::Accepted => {
            let digits = machine.tape(1).contents();
            let shown = if digits.is_empty() { "0" } else { digits.as_str() };
            println!("result:  {shown}");
            if let Some(value) = numeral_value(&digits) {
                println!("decimal: {value}");
            }
            println!("steps:   {}", machine.steps());
            ExitCode::SUCCESS
        }
        Outcome::Halted => {
            let reads: String = machine.reads().iter().map(|s| s.as_char()).collect();
            let heads = [
                machine.tape(0).head(),
                machine.tape(1).head(),
                machine.tape(2).head(),
            ];
            eprintln!(
                "halted without accepting: state {}, step {}, reading ({reads}), heads {heads:?}",
                machine.state(),
                machine.steps(),
            );
            ExitCode::FAILURE
        }
        Outcome::StepLimit => {
            eprintln!(
                "step ceiling of {max_steps} reached in state {}",
                machine.state()
            );
            ExitCode::FAILURE
        }
    }
}

/// Run to completion while logging every decision and tape snapshot.
fn traced_run(machine: &mut Machine, path: &Path, max_steps: usize) -> io::Result<Outcome> {
    let mut out = BufWriter::new(File::create(path)?);
    trace::write_tapes(machine, &mut out)?;
    let outcome = loop {
        if machine.accepted() {
            break Outcome::Accepted;
        }
        if machine.steps() >= max_steps {
            break Outcome::StepLimit;
        }
        trace::write_step(machine, &mut out)?;
        if !machine.step() {
            break Outcome::Halted;
        }
        trace::write_tapes(machine, &mut out)?;
    };
    out.flush()?;
    Ok(outcome)
}

/// Run one product through the machine and compare with native arithmetic.
fn check_product(program: &Program, factors: &[u64], max_steps: usize) -> Result<(), String> {
    let input: String = factors.iter().map(|f| format!("{f:b}#")).collect();
    let symbols = parse_input(&input).expect("generated inputs are well-formed");
    let mut machine = Machine::with_input(program, &symbols);
    match machine.run(max_steps) {
        Outcome::Accepted => {}
        outcome => {
            return Err(format!(
                "{input}: {outcome:?} in state {} after {} steps",
                machine.state(),
                machine.steps()
            ));
        }
    }
    let digits = machine.tape(1).contents();
    let got = numeral_value(&digits).ok_or_else(|| format!("{input}: unreadable result"))?;
    let want: u128 = factors.iter().map(|&f| f as u128).product();
    if got != want {
        return Err(format!("{input}: tape reads {got}, product is {want}"));
    }
    Ok(())
}

/// Exhaustive pair sweep. One immutable program is shared by every worker;
/// each run owns only its tapes.
fn verify_pairs(program: &Program, bits: u32, max_steps: usize) -> ExitCode {
    let limit = 1u64 << bits;
    let failures: Vec<String> = (0..limit * limit)
        .into_par_iter()
        .filter_map(|i| check_product(program, &[i / limit, i % limit], max_steps).err())
        .collect();

    println!(
        "checked {} products of {bits}-bit factors, {} failures",
        limit * limit,
        failures.len()
    );
    for failure in failures.iter().take(10) {
        eprintln!("FAIL {failure}");
    }
    if failures.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Reproducible random spot checks with 2 to 4 factors of varied widths.
fn verify_samples(program: &Program, samples: usize, seed: u64, max_steps: usize) -> ExitCode {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut failures = 0usize;
    for _ in 0..samples {
        let count = rng.gen_range(2..=4);
        let factors: Vec<u64> = (0..count)
            .map(|_| {
                // Shift a full random word down by a random amount so
                // factor widths spread from 1 to 12 bits.
                rng.r#gen::<u64>() >> rng.gen_range(52..=63)
            })
            .collect();
        if let Err(e) = check_product(program, &factors, max_steps) {
            eprintln!("FAIL {e}");
            failures += 1;
        }
    }
    println!("{samples} samples checked, {failures} failures");
    if failures == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
