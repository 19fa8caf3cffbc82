//! Task bodies
//!
//! Pure payload transformations, one per [`TaskKind`]. Characters are Unicode
//! scalar values, not bytes.

use thiserror::Error;

use crate::domain::TaskKind;

/// Errors from running a task body
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransformError {
    #[error("result would be {len} characters, limit is {limit}")]
    ResultTooLarge { len: usize, limit: usize },
}

/// Apply the transformation selected by `kind`, refusing results longer than `limit` characters
pub fn apply(kind: TaskKind, input: &str, limit: usize) -> Result<String, TransformError> {
    let len = result_len(kind, input);
    if len > limit {
        return Err(TransformError::ResultTooLarge { len, limit });
    }
    Ok(match kind {
        TaskKind::Reverse => reverse(input),
        TaskKind::InterleaveSwap => interleave_swap(input),
        TaskKind::RunLengthExpand => run_length_expand(input),
    })
}

/// Length of the result in characters, computed without building it
pub fn result_len(kind: TaskKind, input: &str) -> usize {
    let n = input.chars().count();
    match kind {
        TaskKind::Reverse | TaskKind::InterleaveSwap => n,
        TaskKind::RunLengthExpand => n.saturating_mul(n.saturating_add(1)) / 2,
    }
}

/// `abcd` -> `dcba`
pub fn reverse(input: &str) -> String {
    input.chars().rev().collect()
}

/// `abcdef` -> `badcfe`, `abcde` -> `badce`
pub fn interleave_swap(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    for pair in chars.chunks(2) {
        match pair {
            [a, b] => {
                out.push(*b);
                out.push(*a);
            }
            [last] => out.push(*last),
            _ => {}
        }
    }
    out
}

/// `xyz` -> `xyyzzz`
pub fn run_length_expand(input: &str) -> String {
    input
        .chars()
        .enumerate()
        .flat_map(|(i, c)| std::iter::repeat_n(c, i + 1))
        .collect()
}
