use nodeflow_workflow::Branch;

/// Outcome of a Decision node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
  pub branch: Branch,
  /// Human-readable verdict shown as the node's result.
  pub summary: String,
}

/// Case-insensitive substring test of `condition` against `input`.
pub fn evaluate(condition: &str, input: &str) -> Evaluation {
  let condition = condition.to_lowercase();
  let matched = input.to_lowercase().contains(&condition);

  let verb = if matched { "contains" } else { "does not contain" };

  Evaluation {
    branch: Branch::from(matched),
    summary: format!("Input text {} \"{}\".", verb, condition),
  }
}
