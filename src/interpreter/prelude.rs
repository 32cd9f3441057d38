//! Library functions written in the hosted language
//!
//! The prelude runs as its own source unit before the user's program, and its
//! public functions are copied into the builtin namespace. Calls into them
//! therefore create library frames, which the tracer skips.

use crate::interpreter::constants::PRELUDE_NAME;
use crate::interpreter::engine::Interpreter;
use crate::parser::parse::{ParseError, Parser};
use thiserror::Error;
use tracing::debug;

pub const PRELUDE: &str = r#"
def map(function, iterable):
    return [function(item) for item in iterable]


def filter(function, iterable):
    if function is None:
        return [item for item in iterable if item]
    return [item for item in iterable if function(item)]


_missing = object()


def reduce(function, iterable, initial=_missing):
    items = list(iterable)
    if initial is _missing:
        if not items:
            raise TypeError("reduce() of empty iterable with no initial value")
        result = items[0]
        items = items[1:]
    else:
        result = initial
    for item in items:
        result = function(result, item)
    return result


def any(iterable):
    for item in iterable:
        if item:
            return True
    return False


def all(iterable):
    for item in iterable:
        if not item:
            return False
    return True
"#;

#[derive(Debug, Error)]
pub enum PreludeError {
    #[error("prelude does not parse: {0}")]
    Syntax(#[from] ParseError),
    #[error("prelude failed to run: {0}")]
    Runtime(String),
}

impl Interpreter {
    /// Run the prelude and publish its public names as builtins
    pub fn load_prelude(&mut self) -> Result<(), PreludeError> {
        let program = Parser::new(PRELUDE)?.parse_program()?;
        let source_id = self.add_source(PRELUDE_NAME, PRELUDE);
        let globals = self
            .run_module(source_id, &program, "prelude")
            .map_err(|err| PreludeError::Runtime(err.to_string()))?;

        let mut builtins = self.builtins.borrow_mut();
        let mut published = 0;
        for (name, value) in globals.borrow().iter() {
            if !name.starts_with('_') {
                builtins.insert(name.clone(), value.clone());
                published += 1;
            }
        }
        debug!(published, "prelude loaded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prelude_publishes_public_names() {
        let mut interp = Interpreter::new();
        interp.load_prelude().unwrap();
        let builtins = interp.builtins.borrow();
        for name in ["map", "filter", "reduce", "any", "all"] {
            assert!(builtins.contains_key(name), "missing {}", name);
        }
        assert!(!builtins.contains_key("_missing"));
    }

    #[test]
    fn test_prelude_produces_no_output() {
        let mut interp = Interpreter::new();
        interp.load_prelude().unwrap();
        assert_eq!(interp.console().stdout(), "");
    }
}
