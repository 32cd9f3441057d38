//! Run driver: parse a program, execute it under the tracer and report
//!
//! Every run produces exactly one [`RunReport`]. Failures of the traced
//! program keep the events recorded up to that point; failures before the
//! program starts (unreadable file, syntax error) produce a report with no
//! events.

use crate::config::TraceConfig;
use crate::interpreter::engine::Interpreter;
use crate::interpreter::prelude::PreludeError;
use crate::parser::ast::Program;
use crate::parser::parse::Parser;
use crate::trace::{TraceEvent, TraceSession, Tracer};
use serde::Serialize;
use std::any::Any;
use std::cell::RefCell;
use std::fs;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::rc::Rc;
use std::thread;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Stack size of the execution thread. Deep hosted recursion nests the
/// evaluator several native frames per hosted call.
const WORKER_STACK_SIZE: usize = 512 * 1024 * 1024;

/// Why a program could not be started
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("{source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("{message} ({file}, line {line})")]
    Syntax {
        message: String,
        file: String,
        line: usize,
        column: usize,
        /// Offending source line, when it exists
        text: Option<String>,
    },
    #[error(transparent)]
    Prelude(#[from] PreludeError),
    #[error("execution thread failed: {0}")]
    Worker(String),
}

impl SetupError {
    /// Exception-style name of the failure
    pub fn kind(&self) -> &'static str {
        match self {
            SetupError::Io { source, .. } => match source.kind() {
                io::ErrorKind::NotFound => "FileNotFoundError",
                io::ErrorKind::PermissionDenied => "PermissionError",
                io::ErrorKind::InvalidData => "UnicodeDecodeError",
                _ => "OSError",
            },
            SetupError::Syntax { .. } => "SyntaxError",
            SetupError::Prelude(_) | SetupError::Worker(_) => "RuntimeError",
        }
    }

    /// Textual report in the same layout as a hosted traceback
    pub fn traceback(&self) -> String {
        let mut out = String::from("Traceback (most recent call last):\n");
        match self {
            SetupError::Syntax {
                message,
                file,
                line,
                column,
                text,
            } => {
                out.push_str(&format!("  File \"{}\", line {}\n", file, line));
                if let Some(text) = text {
                    let stripped = text.trim_start();
                    let indent = text.chars().count() - stripped.chars().count();
                    let caret = column.saturating_sub(1).saturating_sub(indent);
                    out.push_str(&format!("    {}\n", stripped.trim_end()));
                    out.push_str(&format!("    {}^\n", " ".repeat(caret)));
                }
                out.push_str(&format!("SyntaxError: {}\n", message));
            }
            SetupError::Io { source, path } => {
                out.push_str(&format!("{}: {} '{}'\n", self.kind(), source, path));
            }
            other => out.push_str(&format!("{}: {}\n", other.kind(), other)),
        }
        out
    }
}

/// Uncaught failure of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub message: String,
    pub traceback: String,
}

/// Outcome of one traced run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub success: bool,
    pub events: Vec<TraceEvent>,
    pub stdout: String,
    pub stderr: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorReport>,
}

impl RunReport {
    fn setup_failure(err: &SetupError) -> Self {
        RunReport {
            success: false,
            events: Vec::new(),
            stdout: String::new(),
            stderr: String::new(),
            error: Some(ErrorReport {
                message: err.to_string(),
                traceback: err.traceback(),
            }),
        }
    }

    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }
}

/// Read and trace the program at `path`
pub fn run_file(path: &Path, config: &TraceConfig) -> RunReport {
    let name = path.display().to_string();
    match fs::read_to_string(path) {
        Ok(text) => run_source(&name, &text, config),
        Err(source) => {
            let err = SetupError::Io {
                path: name,
                source,
            };
            warn!(error = %err, "could not read program");
            RunReport::setup_failure(&err)
        }
    }
}

/// Trace `text`, reporting it under the file name `name`
pub fn run_source(name: &str, text: &str, config: &TraceConfig) -> RunReport {
    info!(file = name, bytes = text.len(), "tracing program");
    let owned_name = name.to_string();
    let owned_text = text.to_string();
    let config = *config;
    let worker = thread::Builder::new()
        .name("heapscope-run".to_string())
        .stack_size(WORKER_STACK_SIZE)
        .spawn(move || execute(&owned_name, &owned_text, config));

    let outcome = match worker {
        Ok(handle) => handle
            .join()
            .unwrap_or_else(|_| Err(SetupError::Worker("execution thread panicked".to_string()))),
        Err(err) => Err(SetupError::Worker(err.to_string())),
    };
    let report = match outcome {
        Ok(report) => report,
        Err(err) => {
            warn!(error = %err, "program did not start");
            RunReport::setup_failure(&err)
        }
    };
    info!(success = report.success, events = report.events.len(), "run finished");
    report
}

fn parse(name: &str, text: &str) -> Result<Program, SetupError> {
    Parser::new(text)
        .and_then(|mut parser| parser.parse_program())
        .map_err(|err| SetupError::Syntax {
            message: err.message,
            file: name.to_string(),
            line: err.location.line,
            column: err.location.column,
            text: text
                .lines()
                .nth(err.location.line.saturating_sub(1))
                .map(str::to_string),
        })
}

fn execute(name: &str, text: &str, config: TraceConfig) -> Result<RunReport, SetupError> {
    let program = parse(name, text)?;
    let mut interpreter = Interpreter::new();
    interpreter.load_prelude()?;
    let source_id = interpreter.add_source(name, text);
    let tracer = Rc::new(RefCell::new(Tracer::new(source_id, config)));

    let outcome = {
        let mut session = TraceSession::new(&mut interpreter, tracer.clone());
        let host = session.host();
        panic::catch_unwind(AssertUnwindSafe(|| host.run_module(source_id, &program, "__main__")))
    };
    let events = tracer.borrow_mut().take_events();
    debug!(events = events.len(), allocations = interpreter.heap.allocations(), "program finished");

    let error = match outcome {
        Ok(Ok(_)) => None,
        Ok(Err(err)) => Some(ErrorReport {
            message: err.message(),
            traceback: interpreter.format_traceback(&err),
        }),
        Err(payload) => {
            let message = format!("internal error: {}", panic_message(payload.as_ref()));
            warn!(%message, events = events.len(), "interpreter aborted");
            Some(ErrorReport {
                traceback: format!("Traceback (most recent call last):\nSystemError: {}\n", message),
                message,
            })
        }
    };
    let console = interpreter.console();
    Ok(RunReport {
        success: error.is_none(),
        events,
        stdout: console.stdout().to_string(),
        stderr: console.stderr().to_string(),
        error,
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        text.to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_error_report() {
        let report = run_source("prog.py", "x = 1\ny = = 2\n", &TraceConfig::default());
        assert!(!report.success);
        assert!(report.events.is_empty());
        let error = report.error.unwrap();
        assert!(error.message.ends_with("(prog.py, line 2)"), "{}", error.message);
        assert!(error.traceback.contains("  File \"prog.py\", line 2\n    y = = 2\n"));
        assert!(error.traceback.contains("SyntaxError: "));
    }

    #[test]
    fn test_missing_file_report() {
        let report = run_file(Path::new("/nonexistent/prog.py"), &TraceConfig::default());
        assert!(!report.success);
        let error = report.error.unwrap();
        assert!(error.traceback.contains("FileNotFoundError"));
    }

    #[test]
    fn test_success_report_omits_error() {
        let report = run_source("prog.py", "print('hi')\n", &TraceConfig::default());
        assert!(report.success);
        assert_eq!(report.stdout, "hi\n");
        let json = report.to_json(false).unwrap();
        assert!(json.starts_with("{\"success\":true,\"events\":["));
        assert!(!json.contains("\"error\""));
    }

    #[test]
    fn test_caret_position() {
        let err = SetupError::Syntax {
            message: "invalid syntax".to_string(),
            file: "prog.py".to_string(),
            line: 1,
            column: 7,
            text: Some("    x = = 1".to_string()),
        };
        assert_eq!(
            err.traceback(),
            "Traceback (most recent call last):\n  File \"prog.py\", line 1\n    x = = 1\n      ^\nSyntaxError: invalid syntax\n"
        );
    }

    #[test]
    fn test_panic_message() {
        let payload = panic::catch_unwind(|| panic!("index {} out of range", 3)).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "index 3 out of range");
        let payload = panic::catch_unwind(|| std::panic::panic_any(7u8)).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }
}
