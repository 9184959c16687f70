//! Uniform block layouts and std140 packing
//!
//! A [`BlockLayout`] comes either from the std140 rules ([`Std140Layout`]) or
//! from the driver ([`UniformBlock::query`]). [`BlockWriter`] packs values
//! into a byte buffer at the offsets of a layout, ready for a uniform buffer.

use crate::backend::GlBackend;
use crate::error::{NameKind, Result, ShaderError};
use crate::handle::ProgramHandle;
use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};

/// GLSL types that can appear in a uniform block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformType {
    Float,
    Int,
    UInt,
    Bool,
    Vec2,
    Vec3,
    Vec4,
    Mat3,
    Mat4,
}

impl UniformType {
    /// Bytes occupied under std140
    pub fn std140_size(self) -> usize {
        match self {
            UniformType::Float | UniformType::Int | UniformType::UInt | UniformType::Bool => 4,
            UniformType::Vec2 => 8,
            UniformType::Vec3 => 12,
            UniformType::Vec4 => 16,
            // columns are padded to vec4
            UniformType::Mat3 => 48,
            UniformType::Mat4 => 64,
        }
    }

    /// Base alignment under std140
    pub fn std140_align(self) -> usize {
        match self {
            UniformType::Float | UniformType::Int | UniformType::UInt | UniformType::Bool => 4,
            UniformType::Vec2 => 8,
            UniformType::Vec3 | UniformType::Vec4 | UniformType::Mat3 | UniformType::Mat4 => 16,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberLayout {
    pub name: String,
    pub offset: usize,
    /// Known for computed layouts; driver queries only report offsets
    pub ty: Option<UniformType>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockLayout {
    members: Vec<MemberLayout>,
    size: usize,
}

impl BlockLayout {
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn members(&self) -> &[MemberLayout] {
        &self.members
    }

    pub fn member(&self, name: &str) -> Option<&MemberLayout> {
        self.members.iter().find(|m| m.name == name)
    }

    pub fn offset_of(&self, name: &str) -> Option<usize> {
        self.member(name).map(|m| m.offset)
    }
}

/// Computes a std140 layout from members in declaration order
#[derive(Debug, Default)]
pub struct Std140Layout {
    members: Vec<MemberLayout>,
    cursor: usize,
}

impl Std140Layout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn member(mut self, name: impl Into<String>, ty: UniformType) -> Self {
        let offset = align_up(self.cursor, ty.std140_align());
        self.members.push(MemberLayout {
            name: name.into(),
            offset,
            ty: Some(ty),
        });
        self.cursor = offset + ty.std140_size();
        self
    }

    pub fn finish(self) -> BlockLayout {
        BlockLayout {
            size: align_up(self.cursor, 16),
            members: self.members,
        }
    }
}

fn align_up(value: usize, align: usize) -> usize {
    value.div_ceil(align) * align
}

/// A uniform block of a linked program, with the driver-reported layout
#[derive(Debug, Clone)]
pub struct UniformBlock {
    name: String,
    index: u32,
    layout: BlockLayout,
}

impl UniformBlock {
    /// Ask the driver for the block's index, data size and member offsets
    pub fn query<B: GlBackend>(
        backend: &B,
        program: &ProgramHandle<B::Program>,
        block_name: &str,
        member_names: &[&str],
    ) -> Result<Self> {
        let raw = program.raw();
        let index = backend
            .uniform_block_index(raw, block_name)
            .ok_or_else(|| ShaderError::not_found(NameKind::UniformBlock, block_name))?;
        let size = backend.uniform_block_data_size(raw, index).max(0) as usize;

        let indices = backend
            .uniform_indices(raw, member_names)
            .into_iter()
            .zip(member_names)
            .map(|(found, name)| {
                found.ok_or_else(|| ShaderError::not_found(NameKind::BlockMember, name))
            })
            .collect::<Result<Vec<u32>>>()?;
        let owners = backend.uniform_owning_blocks(raw, &indices);
        let offsets = backend.uniform_offsets(raw, &indices);

        let members = member_names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let owner = owners.get(i).copied().unwrap_or(-1);
                let offset = offsets.get(i).copied().unwrap_or(-1);
                // a name from another block or the default block has no place here
                if u32::try_from(owner).ok() != Some(index) || offset < 0 {
                    return Err(ShaderError::not_found(NameKind::BlockMember, name));
                }
                Ok(MemberLayout {
                    name: name.to_string(),
                    offset: offset as usize,
                    ty: None,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(block = block_name, index, size, "queried uniform block");
        Ok(Self {
            name: block_name.to_string(),
            index,
            layout: BlockLayout { members, size },
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn layout(&self) -> &BlockLayout {
        &self.layout
    }

    /// Attach the block to a uniform buffer binding point
    pub fn bind<B: GlBackend>(
        &self,
        backend: &B,
        program: &ProgramHandle<B::Program>,
        binding: u32,
    ) {
        backend.uniform_block_binding(program.raw(), self.index, binding);
    }

    pub fn writer(&self) -> BlockWriter<'_> {
        BlockWriter::new(&self.layout)
    }
}

/// A value that can be written into a uniform block
pub trait UniformValue {
    const TYPE: UniformType;

    /// Write the std140 representation; `out` is exactly `TYPE.std140_size()` bytes
    fn write_std140(&self, out: &mut [u8]);
}

macro_rules! scalar_value {
    ($ty:ty, $kind:expr) => {
        impl UniformValue for $ty {
            const TYPE: UniformType = $kind;

            fn write_std140(&self, out: &mut [u8]) {
                out.copy_from_slice(bytemuck::bytes_of(self));
            }
        }
    };
}

scalar_value!(f32, UniformType::Float);
scalar_value!(i32, UniformType::Int);
scalar_value!(u32, UniformType::UInt);

impl UniformValue for bool {
    const TYPE: UniformType = UniformType::Bool;

    fn write_std140(&self, out: &mut [u8]) {
        out.copy_from_slice(bytemuck::bytes_of(&(*self as u32)));
    }
}

impl UniformValue for Vec2 {
    const TYPE: UniformType = UniformType::Vec2;

    fn write_std140(&self, out: &mut [u8]) {
        out.copy_from_slice(bytemuck::cast_slice::<f32, u8>(&self.to_array()));
    }
}

impl UniformValue for Vec3 {
    const TYPE: UniformType = UniformType::Vec3;

    fn write_std140(&self, out: &mut [u8]) {
        out.copy_from_slice(bytemuck::cast_slice::<f32, u8>(&self.to_array()));
    }
}

impl UniformValue for Vec4 {
    const TYPE: UniformType = UniformType::Vec4;

    fn write_std140(&self, out: &mut [u8]) {
        out.copy_from_slice(bytemuck::cast_slice::<f32, u8>(&self.to_array()));
    }
}

impl UniformValue for Mat3 {
    const TYPE: UniformType = UniformType::Mat3;

    fn write_std140(&self, out: &mut [u8]) {
        for (column, chunk) in self.to_cols_array_2d().iter().zip(out.chunks_exact_mut(16)) {
            chunk[..12].copy_from_slice(bytemuck::cast_slice::<f32, u8>(column.as_slice()));
            chunk[12..].fill(0);
        }
    }
}

impl UniformValue for Mat4 {
    const TYPE: UniformType = UniformType::Mat4;

    fn write_std140(&self, out: &mut [u8]) {
        out.copy_from_slice(bytemuck::cast_slice::<f32, u8>(&self.to_cols_array()));
    }
}

/// Packs member values into a zeroed buffer the size of the block
pub struct BlockWriter<'l> {
    layout: &'l BlockLayout,
    data: Vec<u8>,
}

impl<'l> BlockWriter<'l> {
    pub fn new(layout: &'l BlockLayout) -> Self {
        Self {
            layout,
            data: vec![0; layout.size()],
        }
    }

    pub fn write<V: UniformValue>(&mut self, name: &str, value: V) -> Result<&mut Self> {
        let member = self
            .layout
            .member(name)
            .ok_or_else(|| ShaderError::not_found(NameKind::BlockMember, name))?;

        if let Some(expected) = member.ty {
            if expected != V::TYPE {
                return Err(ShaderError::BlockMember {
                    name: name.to_string(),
                    reason: format!("declared as {:?}, written as {:?}", expected, V::TYPE),
                });
            }
        }

        let end = member.offset + V::TYPE.std140_size();
        if end > self.data.len() {
            return Err(ShaderError::BlockMember {
                name: name.to_string(),
                reason: format!(
                    "{:?} at offset {} overruns the {}-byte block",
                    V::TYPE,
                    member.offset,
                    self.data.len()
                ),
            });
        }

        value.write_std140(&mut self.data[member.offset..end]);
        Ok(self)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn finish(self) -> Vec<u8> {
        self.data
    }
}
