//! User code execution.
//!
//! Code nodes run a Lua 5.4 chunk. The chunk sees its input as the global
//! `input` (a string) and whatever it returns becomes the node's output.
//!
//! This is a trust boundary, not a sandbox: only the `string`, `table`,
//! `math` and `utf8` libraries are loaded (no `io`, `os`, `package` or
//! `debug`), an optional memory cap applies, and a deadline or cancellation
//! aborts runaway loops, but the interpreter still runs in-process.

use std::time::{Duration, Instant};

use mlua::{HookTriggers, Lua, LuaOptions, LuaSerdeExt, StdLib, VmState};
use tokio_util::sync::CancellationToken;

use crate::error::NodeError;

/// Instructions between deadline and cancellation checks.
const INTERRUPT_CHECK_INTERVAL: u32 = 10_000;

/// Runs Code node bodies in a fresh interpreter per call.
#[derive(Debug, Clone, Copy, Default)]
pub struct CodeRunner {
  memory_limit: Option<usize>,
}

impl CodeRunner {
  pub fn new(memory_limit: Option<usize>) -> Self {
    Self { memory_limit }
  }

  /// Run `code` against `input`.
  ///
  /// Returns `None` when the chunk returns nothing (or `nil`). Blocking; call
  /// from a blocking context. The chunk is interrupted once `timeout` elapses
  /// or `cancel` fires.
  pub fn run(
    &self,
    code: &str,
    input: &str,
    timeout: Option<Duration>,
    cancel: &CancellationToken,
  ) -> Result<Option<serde_json::Value>, NodeError> {
    let lua = Lua::new_with(
      StdLib::STRING | StdLib::TABLE | StdLib::MATH | StdLib::UTF8,
      LuaOptions::default(),
    )
    .map_err(|e| NodeError::user_code(format!("failed to create interpreter: {}", e)))?;

    if let Some(limit) = self.memory_limit {
      lua.set_memory_limit(limit).map_err(lua_error)?;
    }

    let deadline = timeout.map(|t| Instant::now() + t);
    let interrupt = cancel.clone();
    lua.set_hook(
      HookTriggers::new().every_nth_instruction(INTERRUPT_CHECK_INTERVAL),
      move |_lua, _debug| {
        if interrupt.is_cancelled() {
          Err(mlua::Error::runtime("execution cancelled"))
        } else if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
          Err(mlua::Error::runtime("deadline exceeded"))
        } else {
          Ok(VmState::Continue)
        }
      },
    );

    let result = self.eval(&lua, code, input);

    match (result, deadline, timeout) {
      (Err(_), _, _) if cancel.is_cancelled() => Err(NodeError::Cancelled),
      (Err(_), Some(deadline), Some(timeout)) if Instant::now() >= deadline => {
        Err(NodeError::Timeout {
          timeout_ms: timeout.as_millis() as u64,
        })
      }
      (result, _, _) => result,
    }
  }

  fn eval(
    &self,
    lua: &Lua,
    code: &str,
    input: &str,
  ) -> Result<Option<serde_json::Value>, NodeError> {
    lua.globals().set("input", input).map_err(lua_error)?;

    let value: mlua::Value = lua.load(code).set_name("=code").call(()).map_err(lua_error)?;

    if value.is_nil() {
      return Ok(None);
    }

    let output: serde_json::Value = lua.from_value(value).map_err(|e| {
      NodeError::user_code(format!("code returned an unsupported value: {}", first_line(&e.to_string())))
    })?;

    Ok(Some(output))
  }
}

fn lua_error(err: mlua::Error) -> NodeError {
  let message = match &err {
    mlua::Error::RuntimeError(message) => message.clone(),
    mlua::Error::SyntaxError { message, .. } => message.clone(),
    other => other.to_string(),
  };
  NodeError::user_code(first_line(&message))
}

// Lua errors carry a stack traceback after the first line.
fn first_line(message: &str) -> String {
  message.lines().next().unwrap_or_default().to_string()
}
