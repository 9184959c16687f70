//! Owned shader and program handles

use crate::backend::GlBackend;
use crate::diagnostic::Diagnostic;
use crate::source::ShaderStage;
use std::ops::Deref;

/// A compiled shader stage.
///
/// Only the builder creates these. Pass it to `link`, which deletes the
/// stage object after its one link attempt, or give it back with
/// [`ShaderHandle::release`]. Dropping it otherwise leaks the object and is
/// logged like an unreleased [`ProgramHandle`].
#[derive(Debug)]
#[must_use = "a compiled stage must be linked or released"]
pub struct ShaderHandle<S> {
    raw: S,
    stage: ShaderStage,
    diagnostic: Diagnostic,
    live: bool,
}

impl<S: Copy + std::fmt::Debug> ShaderHandle<S> {
    pub(crate) fn new(raw: S, stage: ShaderStage, diagnostic: Diagnostic) -> Self {
        Self {
            raw,
            stage,
            diagnostic,
            live: true,
        }
    }

    pub fn raw(&self) -> S {
        self.raw
    }

    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    /// Compile diagnostic; its log holds driver remarks, if any
    pub fn diagnostic(&self) -> &Diagnostic {
        &self.diagnostic
    }

    /// Delete the stage object without linking it
    pub fn release<B: GlBackend<Shader = S>>(mut self, backend: &B) {
        tracing::debug!(shader = ?self.raw, stage = %self.stage, "releasing shader");
        backend.delete_shader(self.raw);
        self.live = false;
    }
}

impl<S> Drop for ShaderHandle<S> {
    fn drop(&mut self) {
        if self.live {
            tracing::warn!(
                stage = %self.stage,
                "shader handle dropped without link or release; GPU shader leaked"
            );
        }
    }
}

/// A linked, executable program.
///
/// Must be released with [`ProgramHandle::release`] (or wrapped in a
/// [`ProgramGuard`]). A handle dropped without release leaks the GPU object;
/// there is no context reference to delete it from `Drop`, so it is logged.
#[derive(Debug)]
#[must_use = "a linked program must be released"]
pub struct ProgramHandle<P> {
    raw: P,
    stages: Vec<ShaderStage>,
    diagnostic: Diagnostic,
    live: bool,
}

impl<P: Copy + std::fmt::Debug> ProgramHandle<P> {
    pub(crate) fn new(raw: P, stages: Vec<ShaderStage>, diagnostic: Diagnostic) -> Self {
        Self {
            raw,
            stages,
            diagnostic,
            live: true,
        }
    }

    pub fn raw(&self) -> P {
        self.raw
    }

    /// Stages the program was linked from, in link order
    pub fn stages(&self) -> &[ShaderStage] {
        &self.stages
    }

    /// Link diagnostic; its log holds driver remarks, if any
    pub fn diagnostic(&self) -> &Diagnostic {
        &self.diagnostic
    }

    /// Make this the current program
    pub fn bind<B: GlBackend<Program = P>>(&self, backend: &B) {
        backend.use_program(Some(self.raw));
    }

    pub fn unbind<B: GlBackend<Program = P>>(&self, backend: &B) {
        backend.use_program(None);
    }

    /// Delete the program object. Consumes the handle, so a handle can only
    /// be released once.
    pub fn release<B: GlBackend<Program = P>>(mut self, backend: &B) {
        tracing::debug!(program = ?self.raw, "releasing program");
        backend.delete_program(self.raw);
        self.live = false;
    }

    /// Give up ownership without deleting the object
    pub fn into_raw(mut self) -> P {
        self.live = false;
        self.raw
    }
}

impl<P> Drop for ProgramHandle<P> {
    fn drop(&mut self) {
        if self.live {
            tracing::warn!(
                stages = self.stages.len(),
                "program handle dropped without release; GPU program leaked"
            );
        }
    }
}

/// Releases its program when it goes out of scope, including on early
/// returns and unwinding.
pub struct ProgramGuard<'b, B: GlBackend> {
    backend: &'b B,
    program: Option<ProgramHandle<B::Program>>,
}

impl<'b, B: GlBackend> ProgramGuard<'b, B> {
    pub fn new(backend: &'b B, program: ProgramHandle<B::Program>) -> Self {
        Self {
            backend,
            program: Some(program),
        }
    }

    /// Take the program back; the guard no longer releases it
    pub fn into_inner(mut self) -> Option<ProgramHandle<B::Program>> {
        self.program.take()
    }

    pub fn bind(&self) {
        if let Some(program) = &self.program {
            program.bind(self.backend);
        }
    }
}

impl<B: GlBackend> Deref for ProgramGuard<'_, B> {
    type Target = ProgramHandle<B::Program>;

    fn deref(&self) -> &Self::Target {
        // Only `into_inner` empties the slot and it consumes the guard
        match &self.program {
            Some(program) => program,
            None => unreachable!("program guard emptied before drop"),
        }
    }
}

impl<B: GlBackend> Drop for ProgramGuard<'_, B> {
    fn drop(&mut self) {
        if let Some(program) = self.program.take() {
            program.release(self.backend);
        }
    }
}
