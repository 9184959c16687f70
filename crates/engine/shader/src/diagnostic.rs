//! Driver diagnostics attached to compile and link steps

use crate::source::ShaderStage;
use std::fmt;

/// Which step produced a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Compile(ShaderStage),
    Link,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Compile(stage) => write!(f, "{} shader compile", stage),
            Step::Link => f.write_str("program link"),
        }
    }
}

/// Status and info log of exactly one compile or link step.
///
/// The log is stored as the driver reported it. Drivers may succeed with
/// remarks in the log, or fail with no log at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    step: Step,
    success: bool,
    log: String,
}

impl Diagnostic {
    pub fn new(step: Step, success: bool, log: impl Into<String>) -> Self {
        let mut log = log.into();
        // Some drivers count the terminator in INFO_LOG_LENGTH
        while log.ends_with('\0') {
            log.pop();
        }
        Self { step, success, log }
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn log(&self) -> &str {
        &self.log
    }

    pub fn has_log(&self) -> bool {
        !self.log.is_empty()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.success { "succeeded" } else { "failed" };
        if self.log.is_empty() {
            write!(f, "{} {} (driver provided no log)", self.step, status)
        } else {
            write!(f, "{} {}:\n{}", self.step, status, self.log)
        }
    }
}
