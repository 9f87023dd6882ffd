use anyhow::{bail, Result};

/// Vertex attribute semantics. The discriminant is the shader location the
/// attribute binds to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Attrib {
    Position = 0,
    Normal = 1,
    Tangent = 2,
    Bitangent = 3,
    Color0 = 4,
    Color1 = 5,
    Color2 = 6,
    Color3 = 7,
    Indices = 8,
    Weight = 9,
    TexCoord0 = 10,
    TexCoord1 = 11,
    TexCoord2 = 12,
    TexCoord3 = 13,
}

impl Attrib {
    pub const fn location(self) -> u32 {
        self as u32
    }
}

/// Component type of a vertex attribute.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum AttribType {
    Uint8,
    Int16,
    Half,
    Float,
}

fn vertex_format(ty: AttribType, num: u8, normalized: bool) -> Option<wgpu::VertexFormat> {
    use wgpu::VertexFormat as F;

    let format = match (ty, num, normalized) {
        (AttribType::Uint8, 1, false) => F::Uint8,
        (AttribType::Uint8, 2, false) => F::Uint8x2,
        (AttribType::Uint8, 4, false) => F::Uint8x4,
        (AttribType::Uint8, 1, true) => F::Unorm8,
        (AttribType::Uint8, 2, true) => F::Unorm8x2,
        (AttribType::Uint8, 4, true) => F::Unorm8x4,

        (AttribType::Int16, 1, false) => F::Sint16,
        (AttribType::Int16, 2, false) => F::Sint16x2,
        (AttribType::Int16, 4, false) => F::Sint16x4,
        (AttribType::Int16, 1, true) => F::Snorm16,
        (AttribType::Int16, 2, true) => F::Snorm16x2,
        (AttribType::Int16, 4, true) => F::Snorm16x4,

        (AttribType::Half, 1, _) => F::Float16,
        (AttribType::Half, 2, _) => F::Float16x2,
        (AttribType::Half, 4, _) => F::Float16x4,

        (AttribType::Float, 1, _) => F::Float32,
        (AttribType::Float, 2, _) => F::Float32x2,
        (AttribType::Float, 3, _) => F::Float32x3,
        (AttribType::Float, 4, _) => F::Float32x4,

        _ => return None,
    };
    Some(format)
}

/// Interleaved vertex stream declaration.
///
/// ```rust,ignore
/// let layout = VertexLayout::begin()
///     .add(Attrib::Position, 3, AttribType::Float, false)
///     .add(Attrib::Color0, 4, AttribType::Uint8, true)
///     .end()?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VertexLayout {
    stride: u64,
    attributes: Vec<wgpu::VertexAttribute>,
}

impl VertexLayout {
    pub fn begin() -> VertexLayoutBuilder {
        VertexLayoutBuilder::default()
    }

    /// Size of one vertex in bytes.
    pub fn stride(&self) -> u64 {
        self.stride
    }

    pub fn attributes(&self) -> &[wgpu::VertexAttribute] {
        &self.attributes
    }

    pub fn has(&self, attrib: Attrib) -> bool {
        self.offset(attrib).is_some()
    }

    /// Byte offset of `attrib` within a vertex.
    pub fn offset(&self, attrib: Attrib) -> Option<u64> {
        self.attributes
            .iter()
            .find(|a| a.shader_location == attrib.location())
            .map(|a| a.offset)
    }

    pub fn buffer_layout(&self) -> wgpu::VertexBufferLayout<'_> {
        wgpu::VertexBufferLayout {
            array_stride: self.stride,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &self.attributes,
        }
    }
}

/// Builder returned by [`VertexLayout::begin`]. Errors are collected and
/// reported by [`VertexLayoutBuilder::end`].
#[derive(Debug, Default)]
pub struct VertexLayoutBuilder {
    offset: u64,
    attributes: Vec<wgpu::VertexAttribute>,
    errors: Vec<String>,
}

impl VertexLayoutBuilder {
    /// Appends an attribute of `num` components of `ty`.
    ///
    /// `normalized` maps integer components to `[0, 1]` (or `[-1, 1]`).
    pub fn add(mut self, attrib: Attrib, num: u8, ty: AttribType, normalized: bool) -> Self {
        if self
            .attributes
            .iter()
            .any(|a| a.shader_location == attrib.location())
        {
            self.errors.push(format!("{attrib:?} declared twice"));
            return self;
        }

        match vertex_format(ty, num, normalized) {
            Some(format) => {
                self.attributes.push(wgpu::VertexAttribute {
                    format,
                    offset: self.offset,
                    shader_location: attrib.location(),
                });
                self.offset += format.size();
            }
            None => self.errors.push(format!(
                "{attrib:?}: {num} x {ty:?} (normalized: {normalized}) has no vertex format"
            )),
        }
        self
    }

    /// Skips `bytes` of padding.
    pub fn skip(mut self, bytes: u64) -> Self {
        self.offset += bytes;
        self
    }

    pub fn end(self) -> Result<VertexLayout> {
        if !self.errors.is_empty() {
            bail!("invalid vertex layout: {}", self.errors.join("; "));
        }
        if self.attributes.is_empty() {
            bail!("vertex layout has no attributes");
        }

        Ok(VertexLayout {
            stride: self.offset,
            attributes: self.attributes,
        })
    }
}
