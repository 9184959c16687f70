//! Shader program building for OpenGL
//!
//! Compiles shader stages from source text, links them into a program and
//! surfaces the driver's compile/link logs, on top of `glow`.
//!
//! # Modules
//!
//! - [`builder`]: [`ShaderProgramBuilder`] with `compile_stage`, `link` and `build`
//! - [`backend`]: the [`GlBackend`] driver seam and its glow implementation
//! - [`query`]: attribute/uniform lookups on linked programs
//! - [`uniform_block`]: std140 layouts and uniform block packing
//! - [`debug`]: driver debug output, captured by callback and drained on demand
//! - [`context_info`]: vendor/version/extension report
//!
//! ```no_run
//! use shader::{GlowBackend, ShaderProgramBuilder, ShaderSource};
//!
//! # fn run(gl: &glow::Context) -> shader::Result<()> {
//! // SAFETY: the caller made `gl` current on this thread
//! let backend = unsafe { GlowBackend::new(gl) };
//! let builder = ShaderProgramBuilder::new(&backend);
//! let program = builder.build(&[
//!     ShaderSource::vertex("#version 400\nvoid main(){gl_Position=vec4(0.0);}"),
//!     ShaderSource::fragment("#version 400\nout vec4 c;\nvoid main(){c=vec4(1.0);}"),
//! ])?;
//! program.bind(&backend);
//! program.release(&backend);
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod builder;
pub mod config;
pub mod context_info;
pub mod debug;
pub mod diagnostic;
pub mod error;
pub mod handle;
pub mod query;
pub mod source;
pub mod uniform_block;

pub use backend::{AttributeDesc, GlBackend, GlowBackend};
pub use builder::ShaderProgramBuilder;
pub use config::{BuilderConfig, DebugConfig, FailurePolicy};
pub use context_info::ContextInfo;
pub use debug::{DebugMessage, DebugQueue, DebugSeverity, drain_debug_log, enable_debug_output};
pub use diagnostic::{Diagnostic, Step};
pub use error::{NameKind, Result, ShaderError};
pub use handle::{ProgramGuard, ProgramHandle, ShaderHandle};
pub use query::{ActiveAttribute, AttributeBindings, VertexRole};
pub use source::{ShaderSource, ShaderStage};
pub use uniform_block::{
    BlockLayout, BlockWriter, Std140Layout, UniformBlock, UniformType, UniformValue,
};
