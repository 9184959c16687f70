//! Compile shader stages and link them into programs

use crate::backend::GlBackend;
use crate::config::{BuilderConfig, FailurePolicy};
use crate::diagnostic::{Diagnostic, Step};
use crate::error::{Result, ShaderError};
use crate::handle::{ProgramHandle, ShaderHandle};
use crate::source::{ShaderSource, ShaderStage};

/// Turns [`ShaderSource`]s into a linked [`ProgramHandle`].
///
/// Failures are never retried; they come back synchronously with the
/// driver's log attached and are logged verbatim.
pub struct ShaderProgramBuilder<'b, B: GlBackend> {
    backend: &'b B,
    config: BuilderConfig,
}

impl<'b, B: GlBackend> ShaderProgramBuilder<'b, B> {
    pub fn new(backend: &'b B) -> Self {
        Self::with_config(backend, BuilderConfig::default())
    }

    pub fn with_config(backend: &'b B, config: BuilderConfig) -> Self {
        Self { backend, config }
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    pub fn backend(&self) -> &'b B {
        self.backend
    }

    /// Compile one stage
    pub fn compile_stage(&self, source: &ShaderSource) -> Result<ShaderHandle<B::Shader>> {
        let stage = source.stage();
        if source.is_empty() {
            return Err(ShaderError::EmptySource(stage));
        }

        let gl = self.backend;
        let shader = gl
            .create_shader(stage)
            .map_err(|reason| ShaderError::ObjectCreation {
                object: "shader",
                reason,
            })?;

        gl.shader_source(shader, source.text());
        gl.compile_shader(shader);

        let success = gl.shader_compile_status(shader);
        let diagnostic = Diagnostic::new(Step::Compile(stage), success, gl.shader_info_log(shader));

        if !success {
            gl.delete_shader(shader);
            tracing::error!("{}", diagnostic);
            return Err(ShaderError::Compile { stage, diagnostic });
        }

        self.report_remarks(&diagnostic);
        tracing::debug!(%stage, ?shader, "compiled shader");
        Ok(ShaderHandle::new(shader, stage, diagnostic))
    }

    /// Link compiled stages into a program.
    ///
    /// The stage objects are deleted whatever the outcome: they are consumed
    /// by this one link attempt.
    pub fn link(&self, stages: Vec<ShaderHandle<B::Shader>>) -> Result<ProgramHandle<B::Program>> {
        if stages.is_empty() {
            return Err(ShaderError::NoStages);
        }
        if let Err(err) = self.check_stage_set(&stages) {
            self.discard(stages);
            return Err(err);
        }

        let gl = self.backend;
        let program = match gl.create_program() {
            Ok(program) => program,
            Err(reason) => {
                self.discard(stages);
                return Err(ShaderError::ObjectCreation {
                    object: "program",
                    reason,
                });
            }
        };

        for stage in &stages {
            gl.attach_shader(program, stage.raw());
        }
        gl.link_program(program);

        for stage in &stages {
            gl.detach_shader(program, stage.raw());
        }
        let kinds: Vec<ShaderStage> = stages.iter().map(|s| s.stage()).collect();
        self.discard(stages);

        let success = gl.program_link_status(program);
        let diagnostic = Diagnostic::new(Step::Link, success, gl.program_info_log(program));

        if !success {
            gl.delete_program(program);
            tracing::error!("{}", diagnostic);
            return Err(ShaderError::Link { diagnostic });
        }

        self.report_remarks(&diagnostic);
        tracing::debug!(?program, stages = ?kinds, "linked program");
        Ok(ProgramHandle::new(program, kinds, diagnostic))
    }

    /// Compile every source in order, then link.
    ///
    /// The first compile failure aborts the build; stages compiled before it
    /// are deleted and no link is attempted.
    pub fn build(&self, sources: &[ShaderSource]) -> Result<ProgramHandle<B::Program>> {
        let mut compiled = Vec::with_capacity(sources.len());
        for source in sources {
            match self.compile_stage(source) {
                Ok(handle) => compiled.push(handle),
                Err(err) => {
                    self.discard(compiled);
                    return Err(err);
                }
            }
        }
        self.link(compiled)
    }

    /// [`build`](Self::build), applying the configured [`FailurePolicy`] to
    /// compile and link failures.
    ///
    /// With `WarnAndSkip` those failures are logged and `Ok(None)` comes back
    /// so the caller can skip whatever the program would have drawn. Usage
    /// errors (empty source, bad stage set) are returned under either policy.
    pub fn build_with_policy(
        &self,
        sources: &[ShaderSource],
    ) -> Result<Option<ProgramHandle<B::Program>>> {
        match self.build(sources) {
            Ok(program) => Ok(Some(program)),
            Err(err)
                if err.is_driver_failure()
                    && self.config.failure_policy == FailurePolicy::WarnAndSkip =>
            {
                tracing::warn!("skipping program: {}", err);
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Convenience for the common vertex + fragment pair
    pub fn build_pair(&self, vertex: &str, fragment: &str) -> Result<ProgramHandle<B::Program>> {
        self.build(&[ShaderSource::vertex(vertex), ShaderSource::fragment(fragment)])
    }

    fn check_stage_set(&self, stages: &[ShaderHandle<B::Shader>]) -> Result<()> {
        let mut seen: Vec<ShaderStage> = Vec::with_capacity(stages.len());
        for handle in stages {
            if seen.contains(&handle.stage()) {
                return Err(ShaderError::DuplicateStage(handle.stage()));
            }
            seen.push(handle.stage());
        }

        if seen.contains(&ShaderStage::Compute) {
            // compute programs hold exactly one stage
            if let Some(&other) = seen.iter().find(|&&s| s != ShaderStage::Compute) {
                return Err(ShaderError::MixedPipeline(other));
            }
            return Ok(());
        }

        if self.config.require_classic_pipeline {
            for required in [ShaderStage::Vertex, ShaderStage::Fragment] {
                if !seen.contains(&required) {
                    return Err(ShaderError::MissingStage(required));
                }
            }
        }
        Ok(())
    }

    fn discard(&self, stages: Vec<ShaderHandle<B::Shader>>) {
        for stage in stages {
            stage.release(self.backend);
        }
    }

    fn report_remarks(&self, diagnostic: &Diagnostic) {
        if !diagnostic.has_log() {
            return;
        }
        if self.config.log_remarks {
            tracing::info!("{}", diagnostic);
        } else {
            tracing::debug!("{}", diagnostic);
        }
    }
}
