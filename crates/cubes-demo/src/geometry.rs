//! Static cube geometry: eight colored corners and one index table per
//! primitive topology.

use anyhow::Result;
use bytemuck::{Pod, Zeroable};
use cubes_engine::gfx::{Attrib, AttribType, RenderState, VertexLayout};

// ── vertex ────────────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct PosColorVertex {
    pub pos: [f32; 3],
    /// Packed `0xAABBGGRR`, so the bytes in memory read R, G, B, A.
    pub abgr: u32,
}

impl PosColorVertex {
    pub const fn new(x: f32, y: f32, z: f32, abgr: u32) -> Self {
        Self {
            pos: [x, y, z],
            abgr,
        }
    }

    pub fn layout() -> Result<VertexLayout> {
        VertexLayout::begin()
            .add(Attrib::Position, 3, AttribType::Float, false)
            .add(Attrib::Color0, 4, AttribType::Uint8, true)
            .end()
    }
}

pub const CUBE_VERTICES: [PosColorVertex; 8] = [
    PosColorVertex::new(-1.0, 1.0, 1.0, 0xff00_0000),
    PosColorVertex::new(1.0, 1.0, 1.0, 0xff00_00ff),
    PosColorVertex::new(-1.0, -1.0, 1.0, 0xff00_ff00),
    PosColorVertex::new(1.0, -1.0, 1.0, 0xff00_ffff),
    PosColorVertex::new(-1.0, 1.0, -1.0, 0xffff_0000),
    PosColorVertex::new(1.0, 1.0, -1.0, 0xffff_00ff),
    PosColorVertex::new(-1.0, -1.0, -1.0, 0xffff_ff00),
    PosColorVertex::new(1.0, -1.0, -1.0, 0xffff_ffff),
];

// ── index tables ──────────────────────────────────────────────────────────

#[rustfmt::skip]
pub const CUBE_TRI_LIST: [u16; 36] = [
    0, 1, 2,
    1, 3, 2,
    4, 6, 5,
    5, 6, 7,
    0, 2, 4,
    4, 2, 6,
    1, 5, 3,
    5, 7, 3,
    0, 4, 1,
    4, 5, 1,
    2, 3, 6,
    6, 3, 7,
];

pub const CUBE_TRI_STRIP: [u16; 14] = [0, 1, 2, 3, 7, 1, 5, 0, 4, 2, 6, 7, 4, 5];

#[rustfmt::skip]
pub const CUBE_LINE_LIST: [u16; 24] = [
    0, 1,
    0, 2,
    0, 4,
    1, 3,
    1, 5,
    2, 3,
    2, 6,
    3, 7,
    4, 5,
    4, 6,
    5, 7,
    6, 7,
];

#[rustfmt::skip]
pub const CUBE_LINE_STRIP: [u16; 17] = [
    0, 2, 3, 1, 5, 7, 6, 4,
    0, 2, 6, 4, 5, 7, 3, 1,
    0,
];

pub const CUBE_POINTS: [u16; 8] = [0, 1, 2, 3, 4, 5, 6, 7];

// ── topology ──────────────────────────────────────────────────────────────

/// Primitive topology used to interpret the cube's index buffer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum Topology {
    #[default]
    TriangleList,
    TriangleStrip,
    Lines,
    LineStrip,
    Points,
}

impl Topology {
    pub const ALL: [Topology; 5] = [
        Topology::TriangleList,
        Topology::TriangleStrip,
        Topology::Lines,
        Topology::LineStrip,
        Topology::Points,
    ];

    /// Position in the topology tables.
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        TOPOLOGY_NAMES[self.index()]
    }

    /// Topology bits of the render state; empty for triangle lists.
    pub const fn state(self) -> RenderState {
        TOPOLOGY_STATES[self.index()]
    }

    pub const fn indices(self) -> &'static [u16] {
        match self {
            Topology::TriangleList => &CUBE_TRI_LIST,
            Topology::TriangleStrip => &CUBE_TRI_STRIP,
            Topology::Lines => &CUBE_LINE_LIST,
            Topology::LineStrip => &CUBE_LINE_STRIP,
            Topology::Points => &CUBE_POINTS,
        }
    }
}

pub const TOPOLOGY_NAMES: [&str; 5] = [
    "Triangle List",
    "Triangle Strip",
    "Lines",
    "Line Strip",
    "Points",
];

pub const TOPOLOGY_STATES: [RenderState; TOPOLOGY_NAMES.len()] = [
    RenderState::empty(),
    RenderState::PT_TRISTRIP,
    RenderState::PT_LINES,
    RenderState::PT_LINESTRIP,
    RenderState::PT_POINTS,
];
