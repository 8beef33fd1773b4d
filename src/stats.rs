use std::collections::BTreeMap;

use crate::machine::{Program, State};

/// Compressed/raw ratio of a machine encoding, using brotli at quality 2.
///
/// The unary encoding spells every index in stride-one runs, so a
/// transition table full of near-duplicate rules compresses very well;
/// the ratio approximates the normalized description complexity of the
/// machine. Values near 1.0 would mean an incompressible (structureless)
/// table.
pub fn encoding_entropy(code: &str) -> f64 {
    if code.is_empty() {
        return 0.0;
    }

    let raw = code.as_bytes();
    let mut compressed = Vec::new();
    let params = brotli::enc::BrotliEncoderParams {
        quality: 2,
        ..Default::default()
    };
    brotli::BrotliCompress(&mut &raw[..], &mut compressed, &params)
        .expect("brotli compression should not fail on valid input");

    compressed.len() as f64 / raw.len() as f64
}

/// How many concrete rules each state carries. Useful for eyeballing
/// which phases dominate the table.
pub fn rules_per_state(program: &Program) -> BTreeMap<State, usize> {
    let mut counts = BTreeMap::new();
    for (&(state, _), _) in program.transitions_sorted() {
        *counts.entry(state).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::encode_unary;
    use crate::multiply::multiplication_program;

    #[test]
    fn test_unary_encoding_is_highly_compressible() {
        let code = encode_unary(&multiplication_program());
        let entropy = encoding_entropy(&code);
        assert!(entropy > 0.0);
        assert!(
            entropy < 0.25,
            "a two-character unary encoding should compress far below 1.0, got {entropy}"
        );
    }

    #[test]
    fn test_entropy_of_empty_string() {
        assert_eq!(encoding_entropy(""), 0.0);
    }

    #[test]
    fn test_rule_counts_sum_to_table_size() {
        let program = multiplication_program();
        let counts = rules_per_state(&program);
        let total: usize = counts.values().sum();
        assert_eq!(total, program.rule_count());
        // The accepting state carries no rules at all.
        assert!(!counts.contains_key(&State::Accept));
    }

    #[test]
    fn test_adder_states_carry_nine_rules_each() {
        use crate::machine::Carry;
        let program = multiplication_program();
        let counts = rules_per_state(&program);
        // 9 digit pairs, expanded over the 3 untouched input symbols.
        assert_eq!(counts[&State::Add(Carry::Clear)], 27);
        assert_eq!(counts[&State::Add(Carry::Set)], 27);
    }
}
