//! Driver seam between the builder and an OpenGL implementation
//!
//! [`GlBackend`] lists exactly the driver calls this crate issues. The
//! production implementation is [`GlowBackend`], a thin wrapper over a
//! `glow::Context`. Every call is synchronous and runs to completion before
//! returning.

use crate::debug::{DebugMessage, DebugQueue};
use crate::source::ShaderStage;
use glow::HasContext;
use std::fmt;

/// Active vertex attribute as reported by the driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDesc {
    pub name: String,
    pub size: i32,
    pub gl_type: u32,
}

/// OpenGL calls used by the shader pipeline.
///
/// Implementations assume the context they wrap is current on the calling
/// thread for as long as the backend value lives.
pub trait GlBackend {
    type Shader: Copy + fmt::Debug + PartialEq;
    type Program: Copy + fmt::Debug + PartialEq;
    type UniformLocation: Clone + fmt::Debug;

    fn create_shader(&self, stage: ShaderStage) -> Result<Self::Shader, String>;
    fn shader_source(&self, shader: Self::Shader, source: &str);
    fn compile_shader(&self, shader: Self::Shader);
    fn shader_compile_status(&self, shader: Self::Shader) -> bool;
    /// Must query `INFO_LOG_LENGTH` first and return an empty string without
    /// fetching when the length is zero.
    fn shader_info_log(&self, shader: Self::Shader) -> String;
    fn delete_shader(&self, shader: Self::Shader);

    fn create_program(&self) -> Result<Self::Program, String>;
    fn attach_shader(&self, program: Self::Program, shader: Self::Shader);
    fn detach_shader(&self, program: Self::Program, shader: Self::Shader);
    fn link_program(&self, program: Self::Program);
    fn program_link_status(&self, program: Self::Program) -> bool;
    /// Same length-first contract as [`GlBackend::shader_info_log`].
    fn program_info_log(&self, program: Self::Program) -> String;
    fn delete_program(&self, program: Self::Program);
    fn use_program(&self, program: Option<Self::Program>);

    fn attrib_location(&self, program: Self::Program, name: &str) -> Option<u32>;
    fn uniform_location(&self, program: Self::Program, name: &str)
    -> Option<Self::UniformLocation>;
    fn active_attribute_count(&self, program: Self::Program) -> u32;
    fn active_attribute(&self, program: Self::Program, index: u32) -> Option<AttributeDesc>;

    fn uniform_block_index(&self, program: Self::Program, name: &str) -> Option<u32>;
    fn uniform_block_data_size(&self, program: Self::Program, block: u32) -> i32;
    fn uniform_indices(&self, program: Self::Program, names: &[&str]) -> Vec<Option<u32>>;
    fn uniform_offsets(&self, program: Self::Program, indices: &[u32]) -> Vec<i32>;
    /// Owning block of each uniform; -1 for default-block uniforms
    fn uniform_owning_blocks(&self, program: Self::Program, indices: &[u32]) -> Vec<i32>;
    fn uniform_block_binding(&self, program: Self::Program, block: u32, binding: u32);

    fn get_string(&self, parameter: u32) -> String;
    fn get_integer(&self, parameter: u32) -> i32;
    fn get_indexed_string(&self, parameter: u32, index: u32) -> String;

    fn supports_debug(&self) -> bool;
    fn set_capability(&self, capability: u32, enabled: bool);
    /// Pops up to `count` debug messages delivered since the last call
    fn debug_message_log(&self, count: u32) -> Vec<DebugMessage>;
}

/// [`GlBackend`] over a `glow::Context`
pub struct GlowBackend<'gl> {
    gl: &'gl glow::Context,
    debug_queue: Option<DebugQueue>,
}

impl<'gl> GlowBackend<'gl> {
    /// Wrap a glow context.
    ///
    /// # Safety
    /// Requires an active OpenGL context that stays current on this thread
    /// while the backend is in use. Nothing downstream re-validates this.
    pub unsafe fn new(gl: &'gl glow::Context) -> Self {
        Self {
            gl,
            debug_queue: None,
        }
    }

    /// Wrap a glow context and install a debug message callback that feeds
    /// [`GlBackend::debug_message_log`]. Without debug support this is the
    /// same as [`GlowBackend::new`].
    ///
    /// # Safety
    /// Same contract as [`GlowBackend::new`].
    pub unsafe fn with_debug_capture(gl: &'gl mut glow::Context) -> Self {
        if !gl.supports_debug() {
            return unsafe { Self::new(gl) };
        }
        let queue = DebugQueue::default();
        let sink = queue.clone();
        unsafe {
            gl.debug_message_callback(move |source, kind, id, severity, text| {
                sink.push(DebugMessage::from_raw(source, kind, id, severity, text.to_string()));
            });
        }
        let gl: &'gl glow::Context = gl;
        Self {
            gl,
            debug_queue: Some(queue),
        }
    }

    pub fn context(&self) -> &'gl glow::Context {
        self.gl
    }
}

// SAFETY (all methods below): `GlowBackend::new` requires a current context.
impl GlBackend for GlowBackend<'_> {
    type Shader = glow::Shader;
    type Program = glow::Program;
    type UniformLocation = glow::UniformLocation;

    fn create_shader(&self, stage: ShaderStage) -> Result<glow::Shader, String> {
        unsafe { self.gl.create_shader(stage.gl_enum()) }
    }

    fn shader_source(&self, shader: glow::Shader, source: &str) {
        unsafe { self.gl.shader_source(shader, source) }
    }

    fn compile_shader(&self, shader: glow::Shader) {
        unsafe { self.gl.compile_shader(shader) }
    }

    fn shader_compile_status(&self, shader: glow::Shader) -> bool {
        unsafe { self.gl.get_shader_compile_status(shader) }
    }

    fn shader_info_log(&self, shader: glow::Shader) -> String {
        // glow queries INFO_LOG_LENGTH and skips the fetch when it is zero
        unsafe { self.gl.get_shader_info_log(shader) }
    }

    fn delete_shader(&self, shader: glow::Shader) {
        unsafe { self.gl.delete_shader(shader) }
    }

    fn create_program(&self) -> Result<glow::Program, String> {
        unsafe { self.gl.create_program() }
    }

    fn attach_shader(&self, program: glow::Program, shader: glow::Shader) {
        unsafe { self.gl.attach_shader(program, shader) }
    }

    fn detach_shader(&self, program: glow::Program, shader: glow::Shader) {
        unsafe { self.gl.detach_shader(program, shader) }
    }

    fn link_program(&self, program: glow::Program) {
        unsafe { self.gl.link_program(program) }
    }

    fn program_link_status(&self, program: glow::Program) -> bool {
        unsafe { self.gl.get_program_link_status(program) }
    }

    fn program_info_log(&self, program: glow::Program) -> String {
        unsafe { self.gl.get_program_info_log(program) }
    }

    fn delete_program(&self, program: glow::Program) {
        unsafe { self.gl.delete_program(program) }
    }

    fn use_program(&self, program: Option<glow::Program>) {
        unsafe { self.gl.use_program(program) }
    }

    fn attrib_location(&self, program: glow::Program, name: &str) -> Option<u32> {
        unsafe { self.gl.get_attrib_location(program, name) }
    }

    fn uniform_location(
        &self,
        program: glow::Program,
        name: &str,
    ) -> Option<glow::UniformLocation> {
        unsafe { self.gl.get_uniform_location(program, name) }
    }

    fn active_attribute_count(&self, program: glow::Program) -> u32 {
        unsafe { self.gl.get_active_attributes(program) }
    }

    fn active_attribute(&self, program: glow::Program, index: u32) -> Option<AttributeDesc> {
        unsafe { self.gl.get_active_attribute(program, index) }.map(|attr| AttributeDesc {
            name: attr.name,
            size: attr.size,
            gl_type: attr.atype,
        })
    }

    fn uniform_block_index(&self, program: glow::Program, name: &str) -> Option<u32> {
        unsafe { self.gl.get_uniform_block_index(program, name) }
    }

    fn uniform_block_data_size(&self, program: glow::Program, block: u32) -> i32 {
        unsafe {
            self.gl.get_active_uniform_block_parameter_i32(
                program,
                block,
                glow::UNIFORM_BLOCK_DATA_SIZE,
            )
        }
    }

    fn uniform_indices(&self, program: glow::Program, names: &[&str]) -> Vec<Option<u32>> {
        unsafe { self.gl.get_uniform_indices(program, names) }
    }

    fn uniform_offsets(&self, program: glow::Program, indices: &[u32]) -> Vec<i32> {
        unsafe {
            self.gl
                .get_active_uniforms_parameter(program, indices, glow::UNIFORM_OFFSET)
        }
    }

    fn uniform_owning_blocks(&self, program: glow::Program, indices: &[u32]) -> Vec<i32> {
        unsafe {
            self.gl
                .get_active_uniforms_parameter(program, indices, glow::UNIFORM_BLOCK_INDEX)
        }
    }

    fn uniform_block_binding(&self, program: glow::Program, block: u32, binding: u32) {
        unsafe { self.gl.uniform_block_binding(program, block, binding) }
    }

    fn get_string(&self, parameter: u32) -> String {
        unsafe { self.gl.get_parameter_string(parameter) }
    }

    fn get_integer(&self, parameter: u32) -> i32 {
        unsafe { self.gl.get_parameter_i32(parameter) }
    }

    fn get_indexed_string(&self, parameter: u32, index: u32) -> String {
        unsafe { self.gl.get_parameter_indexed_string(parameter, index) }
    }

    fn supports_debug(&self) -> bool {
        self.gl.supports_debug()
    }

    fn set_capability(&self, capability: u32, enabled: bool) {
        unsafe {
            if enabled {
                self.gl.enable(capability);
            } else {
                self.gl.disable(capability);
            }
        }
    }

    fn debug_message_log(&self, count: u32) -> Vec<DebugMessage> {
        self.debug_queue
            .as_ref()
            .map_or_else(Vec::new, |queue| queue.drain(count as usize))
    }
}
