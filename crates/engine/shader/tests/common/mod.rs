//! Recording fake of the GL driver for builder tests
//!
//! Shaders and programs are plain integer ids. The fake "compiler" rejects a
//! statement that is not terminated by `;` before a closing brace, which is
//! enough to exercise the success and failure paths deterministically.

#![allow(dead_code)]

use shader::{AttributeDesc, DebugMessage, DebugQueue, GlBackend, ShaderStage};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex};

pub const VALID_VERTEX: &str = "#version 400\nvoid main(){gl_Position=vec4(0.0);}";
pub const VALID_FRAGMENT: &str =
    "#version 400\nlayout(location = 0) out vec4 FragColor;\nvoid main(){FragColor=vec4(1.0);}";
pub const MISSING_SEMICOLON_VERTEX: &str = "#version 400\nvoid main(){gl_Position=vec4(0.0)}";

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateShader(ShaderStage),
    ShaderSource(u32),
    CompileShader(u32),
    ShaderInfoLog(u32),
    DeleteShader(u32),
    CreateProgram,
    AttachShader(u32, u32),
    DetachShader(u32, u32),
    LinkProgram(u32),
    ProgramInfoLog(u32),
    DeleteProgram(u32),
    UseProgram(Option<u32>),
    UniformBlockBinding(u32, u32, u32),
    SetCapability(u32, bool),
}

#[derive(Debug, Default)]
struct FakeShader {
    stage: Option<ShaderStage>,
    source: String,
    status: bool,
    log: String,
}

#[derive(Debug, Default)]
struct FakeProgram {
    attached: Vec<u32>,
    linked: bool,
    log: String,
}

#[derive(Debug, Clone)]
pub struct FakeBlock {
    pub index: u32,
    pub size: i32,
    pub members: Vec<(String, i32)>,
}

#[derive(Default)]
pub struct FakeBackend {
    next_id: Cell<u32>,
    calls: RefCell<Vec<Call>>,
    shaders: RefCell<HashMap<u32, FakeShader>>,
    programs: RefCell<HashMap<u32, FakeProgram>>,
    deleted_shaders: RefCell<Vec<u32>>,
    deleted_programs: RefCell<Vec<u32>>,

    /// Link fails with this log
    pub link_failure: RefCell<Option<String>>,
    /// Successful compiles report this log
    pub compile_remark: RefCell<Option<String>>,
    /// Failed compiles report no log at all
    pub silent_failures: Cell<bool>,
    pub refuse_objects: Cell<bool>,
    pub debug_supported: Cell<bool>,

    pub attributes: RefCell<Vec<(String, u32, u32)>>,
    pub uniforms: RefCell<HashMap<String, u32>>,
    pub blocks: RefCell<HashMap<String, FakeBlock>>,
    pub strings: RefCell<HashMap<u32, String>>,
    pub integers: RefCell<HashMap<u32, i32>>,
    pub extensions: RefCell<Vec<String>>,
    /// Stands in for the queue the driver callback fills
    pub debug_log: DebugQueue,
}

impl FakeBackend {
    pub fn new() -> Self {
        let backend = Self::default();
        backend.next_id.set(1);
        backend
    }

    pub fn with_attribute(self, name: &str, location: u32, gl_type: u32) -> Self {
        self.attributes
            .borrow_mut()
            .push((name.to_string(), location, gl_type));
        self
    }

    pub fn with_uniform(self, name: &str, location: u32) -> Self {
        self.uniforms.borrow_mut().insert(name.to_string(), location);
        self
    }

    pub fn with_block(self, name: &str, block: FakeBlock) -> Self {
        self.blocks.borrow_mut().insert(name.to_string(), block);
        self
    }

    /// `(name, offset, owning block)` for every block member, sorted by name
    fn flat_members(&self) -> Vec<(String, i32, u32)> {
        let blocks = self.blocks.borrow();
        let mut flat: Vec<(String, i32, u32)> = blocks
            .values()
            .flat_map(|b| {
                b.members
                    .iter()
                    .map(|(name, offset)| (name.clone(), *offset, b.index))
            })
            .collect();
        flat.sort_by(|a, b| a.0.cmp(&b.0));
        flat
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.borrow().iter().filter(|c| pred(c)).count()
    }

    pub fn linked(&self) -> bool {
        self.count(|c| matches!(c, Call::LinkProgram(_))) > 0
    }

    pub fn deleted_shaders(&self) -> Vec<u32> {
        self.deleted_shaders.borrow().clone()
    }

    pub fn deleted_programs(&self) -> Vec<u32> {
        self.deleted_programs.borrow().clone()
    }

    /// Shader objects created and never deleted
    pub fn live_shaders(&self) -> usize {
        let deleted = self.deleted_shaders.borrow();
        self.shaders
            .borrow()
            .keys()
            .filter(|id| !deleted.contains(id))
            .count()
    }

    pub fn live_programs(&self) -> usize {
        let deleted = self.deleted_programs.borrow();
        self.programs
            .borrow()
            .keys()
            .filter(|id| !deleted.contains(id))
            .count()
    }

    pub fn shader_source_of(&self, id: u32) -> Option<String> {
        self.shaders.borrow().get(&id).map(|s| s.source.clone())
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn alloc(&self) -> u32 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }
}

/// Line/column of the first `}` not preceded by `;`, `{` or `}`
fn find_syntax_error(source: &str) -> Option<(usize, usize)> {
    let mut last = None;
    for (line_no, line) in source.lines().enumerate() {
        if line.trim_start().starts_with('#') {
            continue;
        }
        for (col, ch) in line.chars().enumerate() {
            if ch == '}' && !matches!(last, Some(';') | Some('{') | Some('}')) {
                return Some((line_no + 1, col + 1));
            }
            if !ch.is_whitespace() {
                last = Some(ch);
            }
        }
    }
    None
}

impl GlBackend for FakeBackend {
    type Shader = u32;
    type Program = u32;
    type UniformLocation = u32;

    fn create_shader(&self, stage: ShaderStage) -> Result<u32, String> {
        self.record(Call::CreateShader(stage));
        if self.refuse_objects.get() {
            return Err("out of shader objects".to_string());
        }
        let id = self.alloc();
        self.shaders.borrow_mut().insert(
            id,
            FakeShader {
                stage: Some(stage),
                ..Default::default()
            },
        );
        Ok(id)
    }

    fn shader_source(&self, shader: u32, source: &str) {
        self.record(Call::ShaderSource(shader));
        if let Some(s) = self.shaders.borrow_mut().get_mut(&shader) {
            s.source = source.to_string();
        }
    }

    fn compile_shader(&self, shader: u32) {
        self.record(Call::CompileShader(shader));
        let mut shaders = self.shaders.borrow_mut();
        let Some(s) = shaders.get_mut(&shader) else {
            return;
        };
        match find_syntax_error(&s.source) {
            Some((line, col)) => {
                s.status = false;
                s.log = if self.silent_failures.get() {
                    String::new()
                } else {
                    format!("0:{line}({col}): error: syntax error, unexpected '}}', expecting ';'\n\0")
                };
            }
            None => {
                s.status = true;
                s.log = self.compile_remark.borrow().clone().unwrap_or_default();
            }
        }
    }

    fn shader_compile_status(&self, shader: u32) -> bool {
        self.shaders.borrow().get(&shader).is_some_and(|s| s.status)
    }

    fn shader_info_log(&self, shader: u32) -> String {
        self.record(Call::ShaderInfoLog(shader));
        self.shaders
            .borrow()
            .get(&shader)
            .map(|s| s.log.clone())
            .unwrap_or_default()
    }

    fn delete_shader(&self, shader: u32) {
        self.record(Call::DeleteShader(shader));
        let mut deleted = self.deleted_shaders.borrow_mut();
        debug_assert!(!deleted.contains(&shader), "shader {shader} deleted twice");
        deleted.push(shader);
    }

    fn create_program(&self) -> Result<u32, String> {
        self.record(Call::CreateProgram);
        if self.refuse_objects.get() {
            return Err("out of program objects".to_string());
        }
        let id = self.alloc();
        self.programs.borrow_mut().insert(id, FakeProgram::default());
        Ok(id)
    }

    fn attach_shader(&self, program: u32, shader: u32) {
        self.record(Call::AttachShader(program, shader));
        if let Some(p) = self.programs.borrow_mut().get_mut(&program) {
            p.attached.push(shader);
        }
    }

    fn detach_shader(&self, program: u32, shader: u32) {
        self.record(Call::DetachShader(program, shader));
        if let Some(p) = self.programs.borrow_mut().get_mut(&program) {
            p.attached.retain(|s| *s != shader);
        }
    }

    fn link_program(&self, program: u32) {
        self.record(Call::LinkProgram(program));
        let shaders = self.shaders.borrow();
        let mut programs = self.programs.borrow_mut();
        let Some(p) = programs.get_mut(&program) else {
            return;
        };
        let all_compiled = p
            .attached
            .iter()
            .all(|id| shaders.get(id).is_some_and(|s| s.status));
        if let Some(log) = self.link_failure.borrow().clone() {
            p.linked = false;
            p.log = log;
        } else if !all_compiled {
            p.linked = false;
            p.log = "error: attached shader not compiled\n".to_string();
        } else {
            p.linked = true;
            p.log = String::new();
        }
    }

    fn program_link_status(&self, program: u32) -> bool {
        self.programs.borrow().get(&program).is_some_and(|p| p.linked)
    }

    fn program_info_log(&self, program: u32) -> String {
        self.record(Call::ProgramInfoLog(program));
        self.programs
            .borrow()
            .get(&program)
            .map(|p| p.log.clone())
            .unwrap_or_default()
    }

    fn delete_program(&self, program: u32) {
        self.record(Call::DeleteProgram(program));
        let mut deleted = self.deleted_programs.borrow_mut();
        debug_assert!(!deleted.contains(&program), "program {program} deleted twice");
        deleted.push(program);
    }

    fn use_program(&self, program: Option<u32>) {
        self.record(Call::UseProgram(program));
    }

    fn attrib_location(&self, _program: u32, name: &str) -> Option<u32> {
        self.attributes
            .borrow()
            .iter()
            .find(|(n, _, _)| n == name)
            .map(|(_, location, _)| *location)
    }

    fn uniform_location(&self, _program: u32, name: &str) -> Option<u32> {
        self.uniforms.borrow().get(name).copied()
    }

    fn active_attribute_count(&self, _program: u32) -> u32 {
        self.attributes.borrow().len() as u32
    }

    fn active_attribute(&self, _program: u32, index: u32) -> Option<AttributeDesc> {
        self.attributes
            .borrow()
            .get(index as usize)
            .map(|(name, _, gl_type)| AttributeDesc {
                name: name.clone(),
                size: 1,
                gl_type: *gl_type,
            })
    }

    fn uniform_block_index(&self, _program: u32, name: &str) -> Option<u32> {
        self.blocks.borrow().get(name).map(|b| b.index)
    }

    fn uniform_block_data_size(&self, _program: u32, block: u32) -> i32 {
        self.blocks
            .borrow()
            .values()
            .find(|b| b.index == block)
            .map_or(0, |b| b.size)
    }

    fn uniform_indices(&self, _program: u32, names: &[&str]) -> Vec<Option<u32>> {
        // member index = position in the flattened member list of all blocks
        let flat = self.flat_members();
        names
            .iter()
            .map(|name| flat.iter().position(|(n, ..)| n == name).map(|i| i as u32))
            .collect()
    }

    fn uniform_offsets(&self, _program: u32, indices: &[u32]) -> Vec<i32> {
        let flat = self.flat_members();
        indices
            .iter()
            .map(|&i| flat.get(i as usize).map_or(-1, |(_, offset, _)| *offset))
            .collect()
    }

    fn uniform_owning_blocks(&self, _program: u32, indices: &[u32]) -> Vec<i32> {
        let flat = self.flat_members();
        indices
            .iter()
            .map(|&i| flat.get(i as usize).map_or(-1, |(.., block)| *block as i32))
            .collect()
    }

    fn uniform_block_binding(&self, program: u32, block: u32, binding: u32) {
        self.record(Call::UniformBlockBinding(program, block, binding));
    }

    fn get_string(&self, parameter: u32) -> String {
        self.strings.borrow().get(&parameter).cloned().unwrap_or_default()
    }

    fn get_integer(&self, parameter: u32) -> i32 {
        if parameter == glow::NUM_EXTENSIONS {
            return self.extensions.borrow().len() as i32;
        }
        self.integers.borrow().get(&parameter).copied().unwrap_or(0)
    }

    fn get_indexed_string(&self, _parameter: u32, index: u32) -> String {
        self.extensions
            .borrow()
            .get(index as usize)
            .cloned()
            .unwrap_or_default()
    }

    fn supports_debug(&self) -> bool {
        self.debug_supported.get()
    }

    fn set_capability(&self, capability: u32, enabled: bool) {
        self.record(Call::SetCapability(capability, enabled));
    }

    fn debug_message_log(&self, count: u32) -> Vec<DebugMessage> {
        self.debug_log.drain(count as usize)
    }
}

/// Route tracing output through the test harness
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Run `f` under a scoped subscriber and return the warnings it logged
pub fn capture_warnings(f: impl FnOnce()) -> String {
    let buffer = Arc::new(Mutex::new(Vec::new()));
    let sink = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || LogSink(sink.clone()))
        .with_ansi(false)
        .with_max_level(tracing::Level::WARN)
        .finish();
    tracing::subscriber::with_default(subscriber, f);
    let bytes = buffer.lock().unwrap().clone();
    String::from_utf8_lossy(&bytes).into_owned()
}

struct LogSink(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
