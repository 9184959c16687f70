//! Error types for shader building and program queries

use crate::diagnostic::Diagnostic;
use crate::source::ShaderStage;
use std::fmt;
use thiserror::Error;

/// Result type for shader operations
pub type Result<T> = std::result::Result<T, ShaderError>;

/// Kind of name looked up in a linked program
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    Attribute,
    Uniform,
    UniformBlock,
    BlockMember,
}

impl fmt::Display for NameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NameKind::Attribute => "vertex attribute",
            NameKind::Uniform => "uniform",
            NameKind::UniformBlock => "uniform block",
            NameKind::BlockMember => "uniform block member",
        })
    }
}

/// Errors that can occur while building or querying a program
#[derive(Error, Debug)]
pub enum ShaderError {
    /// Source text was empty; the driver was not called
    #[error("{0} shader source is empty")]
    EmptySource(ShaderStage),

    /// A stage failed to compile
    #[error("{diagnostic}")]
    Compile {
        stage: ShaderStage,
        diagnostic: Diagnostic,
    },

    /// The program failed to link
    #[error("{diagnostic}")]
    Link { diagnostic: Diagnostic },

    /// `link` was called without any stages
    #[error("cannot link a program without shader stages")]
    NoStages,

    /// Two handles for the same stage were passed to `link`
    #[error("more than one {0} shader passed to link")]
    DuplicateStage(ShaderStage),

    /// A stage required by the classic pipeline is absent
    #[error("program is missing a {0} shader")]
    MissingStage(ShaderStage),

    /// A compute stage was passed to `link` together with a graphics stage
    #[error("a compute shader cannot be linked with a {0} shader")]
    MixedPipeline(ShaderStage),

    /// The driver refused to create a shader or program object
    #[error("failed to create {object}: {reason}")]
    ObjectCreation { object: &'static str, reason: String },

    /// A post-link name lookup found nothing
    #[error("{kind} '{name}' not found in program")]
    NameResolution { kind: NameKind, name: String },

    /// A uniform block write did not fit the block layout
    #[error("uniform block member '{name}': {reason}")]
    BlockMember { name: String, reason: String },
}

impl ShaderError {
    /// The driver diagnostic, for compile and link failures
    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            ShaderError::Compile { diagnostic, .. } | ShaderError::Link { diagnostic } => {
                Some(diagnostic)
            }
            _ => None,
        }
    }

    /// Compile and link failures stem from shader text and can be fixed by
    /// editing it; everything else is a usage error.
    pub fn is_driver_failure(&self) -> bool {
        self.diagnostic().is_some()
    }

    pub(crate) fn not_found(kind: NameKind, name: &str) -> Self {
        ShaderError::NameResolution {
            kind,
            name: name.to_string(),
        }
    }
}
