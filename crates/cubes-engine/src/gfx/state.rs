use bitflags::bitflags;

use crate::device::DEPTH_FORMAT;

bitflags! {
    /// Fixed-function state for one draw call.
    ///
    /// Topology bits are mutually exclusive; no topology bit means triangle
    /// list. Depth-test bits are too; none means the test always passes.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct RenderState: u64 {
        const WRITE_R = 1 << 0;
        const WRITE_G = 1 << 1;
        const WRITE_B = 1 << 2;
        const WRITE_A = 1 << 3;
        const WRITE_Z = 1 << 4;
        const WRITE_RGB = Self::WRITE_R.bits() | Self::WRITE_G.bits() | Self::WRITE_B.bits();

        const DEPTH_TEST_LESS = 1 << 8;
        const DEPTH_TEST_LEQUAL = 1 << 9;
        const DEPTH_TEST_EQUAL = 1 << 10;

        /// Cull clockwise-wound triangles.
        const CULL_CW = 1 << 12;
        /// Cull counter-clockwise-wound triangles.
        const CULL_CCW = 1 << 13;

        const PT_TRISTRIP = 1 << 16;
        const PT_LINES = 1 << 17;
        const PT_LINESTRIP = 1 << 18;
        const PT_POINTS = 1 << 19;
        const PT_MASK = Self::PT_TRISTRIP.bits()
            | Self::PT_LINES.bits()
            | Self::PT_LINESTRIP.bits()
            | Self::PT_POINTS.bits();

        const MSAA = 1 << 24;

        const DEFAULT = Self::WRITE_RGB.bits()
            | Self::WRITE_A.bits()
            | Self::WRITE_Z.bits()
            | Self::DEPTH_TEST_LESS.bits()
            | Self::CULL_CW.bits()
            | Self::MSAA.bits();
    }
}

bitflags! {
    /// Which attachments a view clears before its first draw.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
    pub struct ClearFlags: u8 {
        const COLOR = 1 << 0;
        const DEPTH = 1 << 1;
        const STENCIL = 1 << 2;
    }
}

impl Default for RenderState {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl RenderState {
    pub fn topology(self) -> wgpu::PrimitiveTopology {
        if self.contains(Self::PT_POINTS) {
            wgpu::PrimitiveTopology::PointList
        } else if self.contains(Self::PT_LINESTRIP) {
            wgpu::PrimitiveTopology::LineStrip
        } else if self.contains(Self::PT_LINES) {
            wgpu::PrimitiveTopology::LineList
        } else if self.contains(Self::PT_TRISTRIP) {
            wgpu::PrimitiveTopology::TriangleStrip
        } else {
            wgpu::PrimitiveTopology::TriangleList
        }
    }

    pub fn color_writes(self) -> wgpu::ColorWrites {
        let mut writes = wgpu::ColorWrites::empty();
        writes.set(wgpu::ColorWrites::RED, self.contains(Self::WRITE_R));
        writes.set(wgpu::ColorWrites::GREEN, self.contains(Self::WRITE_G));
        writes.set(wgpu::ColorWrites::BLUE, self.contains(Self::WRITE_B));
        writes.set(wgpu::ColorWrites::ALPHA, self.contains(Self::WRITE_A));
        writes
    }

    pub fn depth_compare(self) -> wgpu::CompareFunction {
        if self.contains(Self::DEPTH_TEST_LESS) {
            wgpu::CompareFunction::Less
        } else if self.contains(Self::DEPTH_TEST_LEQUAL) {
            wgpu::CompareFunction::LessEqual
        } else if self.contains(Self::DEPTH_TEST_EQUAL) {
            wgpu::CompareFunction::Equal
        } else {
            wgpu::CompareFunction::Always
        }
    }

    /// Primitive assembly for 16-bit indexed draws. Front faces are
    /// counter-clockwise, so `CULL_CCW` culls the front.
    pub fn primitive(self) -> wgpu::PrimitiveState {
        let topology = self.topology();
        let cull_mode = if self.contains(Self::CULL_CCW) {
            Some(wgpu::Face::Front)
        } else if self.contains(Self::CULL_CW) {
            Some(wgpu::Face::Back)
        } else {
            None
        };

        wgpu::PrimitiveState {
            topology,
            strip_index_format: topology
                .is_strip()
                .then_some(wgpu::IndexFormat::Uint16),
            front_face: wgpu::FrontFace::Ccw,
            cull_mode,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        }
    }

    /// Depth state against the shared depth attachment. Always present, since
    /// every pass binds one.
    pub fn depth_stencil(self) -> wgpu::DepthStencilState {
        wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: self.contains(Self::WRITE_Z),
            depth_compare: self.depth_compare(),
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }
    }

    /// Multisample state for a backbuffer with `samples` samples.
    ///
    /// The pipeline sample count must match the attachment; without `MSAA`
    /// only the first sample is covered, which renders aliased.
    pub fn multisample(self, samples: u32) -> wgpu::MultisampleState {
        let mask = if samples <= 1 || self.contains(Self::MSAA) {
            !0
        } else {
            1
        };

        wgpu::MultisampleState {
            count: samples.max(1),
            mask,
            alpha_to_coverage_enabled: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── topology ──────────────────────────────────────────────────────────

    #[test]
    fn no_topology_bits_is_triangle_list() {
        assert_eq!(RenderState::DEFAULT.topology(), wgpu::PrimitiveTopology::TriangleList);
        assert_eq!(RenderState::empty().topology(), wgpu::PrimitiveTopology::TriangleList);
    }

    #[test]
    fn topology_bits_map_to_wgpu() {
        let cases = [
            (RenderState::PT_TRISTRIP, wgpu::PrimitiveTopology::TriangleStrip),
            (RenderState::PT_LINES, wgpu::PrimitiveTopology::LineList),
            (RenderState::PT_LINESTRIP, wgpu::PrimitiveTopology::LineStrip),
            (RenderState::PT_POINTS, wgpu::PrimitiveTopology::PointList),
        ];
        for (bits, expected) in cases {
            assert_eq!((RenderState::DEFAULT | bits).topology(), expected);
        }
    }

    #[test]
    fn strips_get_an_index_format_lists_do_not() {
        let strip = (RenderState::DEFAULT | RenderState::PT_LINESTRIP).primitive();
        assert_eq!(strip.strip_index_format, Some(wgpu::IndexFormat::Uint16));

        let list = RenderState::DEFAULT.primitive();
        assert_eq!(list.strip_index_format, None);
    }

    // ── color / depth ─────────────────────────────────────────────────────

    #[test]
    fn color_writes_follow_channel_bits() {
        let state = RenderState::WRITE_R | RenderState::WRITE_A;
        assert_eq!(state.color_writes(), wgpu::ColorWrites::RED | wgpu::ColorWrites::ALPHA);
        assert_eq!(RenderState::DEFAULT.color_writes(), wgpu::ColorWrites::ALL);
    }

    #[test]
    fn depth_state() {
        let ds = RenderState::DEFAULT.depth_stencil();
        assert!(ds.depth_write_enabled);
        assert_eq!(ds.depth_compare, wgpu::CompareFunction::Less);

        let no_test = RenderState::WRITE_RGB.depth_stencil();
        assert!(!no_test.depth_write_enabled);
        assert_eq!(no_test.depth_compare, wgpu::CompareFunction::Always);
    }

    // ── culling ───────────────────────────────────────────────────────────

    #[test]
    fn cull_bits_select_face() {
        let ccw = (RenderState::WRITE_RGB | RenderState::CULL_CCW).primitive();
        assert_eq!(ccw.front_face, wgpu::FrontFace::Ccw);
        assert_eq!(ccw.cull_mode, Some(wgpu::Face::Front));

        let cw = (RenderState::WRITE_RGB | RenderState::CULL_CW).primitive();
        assert_eq!(cw.cull_mode, Some(wgpu::Face::Back));

        assert_eq!(RenderState::WRITE_RGB.primitive().cull_mode, None);
    }

    // ── multisample ───────────────────────────────────────────────────────

    #[test]
    fn multisample_count_matches_backbuffer() {
        let ms = RenderState::DEFAULT.multisample(4);
        assert_eq!(ms.count, 4);
        assert_eq!(ms.mask, !0);

        let aliased = RenderState::WRITE_RGB.multisample(4);
        assert_eq!(aliased.count, 4);
        assert_eq!(aliased.mask, 1);

        assert_eq!(RenderState::WRITE_RGB.multisample(1).mask, !0);
    }
}
