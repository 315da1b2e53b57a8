use crate::shape::{PatternShape, SlotShape};
use crate::stats::StatsTable;
use crate::ReorderError;
use rdf_weave_model::NamedNode;
use tracing::debug;

/// Parses the line-oriented statistics format. See the [module documentation](crate::stats).
pub(super) fn parse_stats(input: &str) -> Result<StatsTable, ReorderError> {
    let mut table = StatsTable::new();
    for (index, text) in input.lines().enumerate() {
        let line = index + 1;
        let tokens = tokenize(text);
        match tokens.as_slice() {
            [] => {}
            ["count", count] => {
                let count = count.parse::<u64>().map_err(|_| ReorderError::Parse {
                    line,
                    message: format!("Invalid count `{count}`"),
                })?;
                table.set_count(count);
            }
            ["other", weight] => table.set_other(parse_weight(line, weight)?),
            [predicate, weight] => {
                let shape = PatternShape::triple(
                    SlotShape::Unbound,
                    SlotShape::Named(parse_iri(line, predicate)?),
                    SlotShape::Unbound,
                );
                insert(&mut table, line, shape, parse_weight(line, weight)?);
            }
            [subject, predicate, object, weight] => {
                let shape = PatternShape::triple(
                    parse_slot(line, subject)?,
                    parse_slot(line, predicate)?,
                    parse_slot(line, object)?,
                );
                insert(&mut table, line, shape, parse_weight(line, weight)?);
            }
            [graph, subject, predicate, object, weight] => {
                let shape = PatternShape::quad(
                    parse_slot(line, graph)?,
                    parse_slot(line, subject)?,
                    parse_slot(line, predicate)?,
                    parse_slot(line, object)?,
                );
                insert(&mut table, line, shape, parse_weight(line, weight)?);
            }
            tokens => {
                return Err(ReorderError::Parse {
                    line,
                    message: format!("Expected 2, 4 or 5 fields but found {}", tokens.len()),
                });
            }
        }
    }
    Ok(table)
}

/// Splits a line into whitespace separated tokens, dropping everything after a `#` that starts a
/// token. IRIs may contain `#`, but never start with it.
fn tokenize(line: &str) -> Vec<&str> {
    line.split_whitespace()
        .take_while(|token| !token.starts_with('#'))
        .collect()
}

fn insert(table: &mut StatsTable, line: usize, shape: PatternShape, weight: f64) {
    if let Some(previous) = table.insert(shape, weight) {
        debug!(line, previous, weight, "Statistics entry overrides an earlier one");
    }
}

fn parse_slot(line: usize, token: &str) -> Result<SlotShape, ReorderError> {
    match token {
        "VAR" | "ANY" => Ok(SlotShape::Unbound),
        "TERM" => Ok(SlotShape::Bound),
        _ if token.starts_with('<') => Ok(SlotShape::Named(parse_iri(line, token)?)),
        _ => Err(ReorderError::Parse {
            line,
            message: format!("Unknown slot `{token}`, expected VAR, ANY, TERM or an IRI"),
        }),
    }
}

fn parse_iri(line: usize, token: &str) -> Result<NamedNode, ReorderError> {
    let iri = token
        .strip_prefix('<')
        .and_then(|token| token.strip_suffix('>'))
        .ok_or_else(|| ReorderError::Parse {
            line,
            message: format!("Expected an IRI in angle brackets but found `{token}`"),
        })?;
    NamedNode::new(iri).map_err(|error| ReorderError::Parse {
        line,
        message: format!("Invalid IRI `{iri}`: {error}"),
    })
}

fn parse_weight(line: usize, token: &str) -> Result<f64, ReorderError> {
    match token.parse::<f64>() {
        Ok(weight) if weight.is_finite() && weight >= 0.0 => Ok(weight),
        _ => Err(ReorderError::Parse {
            line,
            message: format!("Invalid weight `{token}`, expected a non-negative number"),
        }),
    }
}
