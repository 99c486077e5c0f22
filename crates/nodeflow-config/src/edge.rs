use std::fmt;

use serde::{Deserialize, Serialize};

/// Outcome label carried by an edge leaving a decision node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Branch {
  True,
  False,
}

impl From<bool> for Branch {
  fn from(outcome: bool) -> Self {
    if outcome { Branch::True } else { Branch::False }
  }
}

impl fmt::Display for Branch {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Branch::True => f.write_str("true"),
      Branch::False => f.write_str("false"),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
  pub from: String,
  pub to: String,
  /// Only meaningful when `from` is a decision node. Unlabelled edges are unconditional.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub branch: Option<Branch>,
}

impl Edge {
  /// Unconditional edge.
  pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
    Self {
      from: from.into(),
      to: to.into(),
      branch: None,
    }
  }

  /// Edge taken only when the decision at `from` resolves to `branch`.
  pub fn branch(from: impl Into<String>, to: impl Into<String>, branch: Branch) -> Self {
    Self {
      from: from.into(),
      to: to.into(),
      branch: Some(branch),
    }
  }
}
