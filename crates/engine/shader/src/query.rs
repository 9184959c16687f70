//! Post-link lookups against a program
//!
//! An unknown attribute or uniform name is a caller configuration error, not
//! a build failure: the program itself stays valid.

use crate::backend::GlBackend;
use crate::error::{NameKind, Result, ShaderError};
use crate::handle::ProgramHandle;
use std::fmt;

/// Active vertex attribute with its bound location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveAttribute {
    pub name: String,
    pub location: Option<u32>,
    pub size: i32,
    pub gl_type: u32,
}

impl<P: Copy + fmt::Debug> ProgramHandle<P> {
    pub fn attribute_location<B: GlBackend<Program = P>>(
        &self,
        backend: &B,
        name: &str,
    ) -> Result<u32> {
        backend
            .attrib_location(self.raw(), name)
            .ok_or_else(|| ShaderError::not_found(NameKind::Attribute, name))
    }

    pub fn uniform_location<B: GlBackend<Program = P>>(
        &self,
        backend: &B,
        name: &str,
    ) -> Result<B::UniformLocation> {
        backend
            .uniform_location(self.raw(), name)
            .ok_or_else(|| ShaderError::not_found(NameKind::Uniform, name))
    }

    /// Active attributes sorted by location, unbound ones last
    pub fn active_attributes<B: GlBackend<Program = P>>(
        &self,
        backend: &B,
    ) -> Vec<ActiveAttribute> {
        let program = self.raw();
        let count = backend.active_attribute_count(program);
        let mut attributes: Vec<ActiveAttribute> = (0..count)
            .filter_map(|index| backend.active_attribute(program, index))
            .map(|desc| ActiveAttribute {
                location: backend.attrib_location(program, &desc.name),
                name: desc.name,
                size: desc.size,
                gl_type: desc.gl_type,
            })
            .collect();
        attributes.sort_by_key(|attr| (attr.location.is_none(), attr.location));

        for attr in &attributes {
            let location = attr
                .location
                .map_or_else(|| "-".to_string(), |l| l.to_string());
            tracing::debug!("{:<5} | {}", location, attr.name);
        }
        attributes
    }
}

/// Semantic role of a vertex attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexRole {
    Position,
    Color,
    TexCoord,
    Normal,
}

/// Attribute locations keyed by role rather than by array index
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeBindings {
    position: Option<u32>,
    color: Option<u32>,
    tex_coord: Option<u32>,
    normal: Option<u32>,
}

impl AttributeBindings {
    /// Resolve every `(role, attribute name)` pair; the first unknown name fails
    pub fn resolve<B: GlBackend>(
        backend: &B,
        program: &ProgramHandle<B::Program>,
        roles: &[(VertexRole, &str)],
    ) -> Result<Self> {
        let mut bindings = Self::default();
        for &(role, name) in roles {
            let location = program.attribute_location(backend, name)?;
            *bindings.slot(role) = Some(location);
        }
        Ok(bindings)
    }

    pub fn get(&self, role: VertexRole) -> Option<u32> {
        match role {
            VertexRole::Position => self.position,
            VertexRole::Color => self.color,
            VertexRole::TexCoord => self.tex_coord,
            VertexRole::Normal => self.normal,
        }
    }

    fn slot(&mut self, role: VertexRole) -> &mut Option<u32> {
        match role {
            VertexRole::Position => &mut self.position,
            VertexRole::Color => &mut self.color,
            VertexRole::TexCoord => &mut self.tex_coord,
            VertexRole::Normal => &mut self.normal,
        }
    }
}
