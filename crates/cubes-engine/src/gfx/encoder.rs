use std::collections::{BTreeMap, BTreeSet};

use glam::Mat4;

use super::handle::{IndexBufferHandle, ProgramHandle, VertexBufferHandle};
use super::state::{ClearFlags, RenderState};

/// View identifier. Views execute in ascending id order.
pub type ViewId = u16;

/// Clear parameters of a view.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ViewClear {
    pub flags: ClearFlags,
    /// Packed `0xRRGGBBAA`.
    pub rgba: u32,
    pub depth: f32,
    pub stencil: u8,
}

impl ViewClear {
    pub fn color(&self) -> wgpu::Color {
        let [r, g, b, a] = self.rgba.to_be_bytes();
        let unit = |c: u8| f64::from(c) / 255.0;
        wgpu::Color {
            r: unit(r),
            g: unit(g),
            b: unit(b),
            a: unit(a),
        }
    }
}

impl Default for ViewClear {
    fn default() -> Self {
        Self {
            flags: ClearFlags::empty(),
            rgba: 0x0000_00ff,
            depth: 1.0,
            stencil: 0,
        }
    }
}

/// Viewport rectangle in backbuffer pixels.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ViewRect {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

/// Persistent per-view settings.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct View {
    pub clear: ViewClear,
    /// `None` covers the whole backbuffer.
    pub rect: Option<ViewRect>,
    pub view: Mat4,
    pub proj: Mat4,
}

impl Default for View {
    fn default() -> Self {
        Self {
            clear: ViewClear::default(),
            rect: None,
            view: Mat4::IDENTITY,
            proj: Mat4::IDENTITY,
        }
    }
}

impl View {
    pub fn view_proj(&self) -> Mat4 {
        self.proj * self.view
    }
}

/// One submitted draw.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DrawCall {
    pub view: ViewId,
    pub program: ProgramHandle,
    pub vertex_buffer: VertexBufferHandle,
    /// `INVALID` draws the vertex buffer non-indexed.
    pub index_buffer: IndexBufferHandle,
    pub transform: Mat4,
    pub state: RenderState,
}

#[derive(Debug, Copy, Clone)]
struct PendingDraw {
    transform: Mat4,
    vertex_buffer: VertexBufferHandle,
    index_buffer: IndexBufferHandle,
    state: RenderState,
}

impl Default for PendingDraw {
    fn default() -> Self {
        Self {
            transform: Mat4::IDENTITY,
            vertex_buffer: VertexBufferHandle::INVALID,
            index_buffer: IndexBufferHandle::INVALID,
            state: RenderState::DEFAULT,
        }
    }
}

/// Everything recorded for one frame, in execution order.
#[derive(Debug, Default)]
pub struct FrameCommands {
    /// Views that were touched or drawn to, ascending by id.
    pub views: Vec<(ViewId, View)>,
    /// Draws, stably sorted by view.
    pub draws: Vec<DrawCall>,
}

impl FrameCommands {
    pub fn draws_for(&self, view: ViewId) -> impl Iterator<Item = (usize, &DrawCall)> {
        self.draws
            .iter()
            .enumerate()
            .filter(move |(_, d)| d.view == view)
    }
}

/// Records draw submissions for the current frame.
///
/// View settings persist across frames. Draw state set with the `set_*`
/// calls is sticky until the next [`Encoder::submit`], which consumes it and
/// resets it to defaults.
#[derive(Debug, Default)]
pub struct Encoder {
    views: BTreeMap<ViewId, View>,
    touched: BTreeSet<ViewId>,
    draws: Vec<DrawCall>,
    pending: PendingDraw,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_view_clear(
        &mut self,
        id: ViewId,
        flags: ClearFlags,
        rgba: u32,
        depth: f32,
        stencil: u8,
    ) {
        self.views.entry(id).or_default().clear = ViewClear {
            flags,
            rgba,
            depth,
            stencil,
        };
    }

    pub fn set_view_rect(&mut self, id: ViewId, x: u16, y: u16, width: u16, height: u16) {
        self.views.entry(id).or_default().rect = Some(ViewRect {
            x,
            y,
            width,
            height,
        });
    }

    pub fn set_view_transform(&mut self, id: ViewId, view: Mat4, proj: Mat4) {
        let v = self.views.entry(id).or_default();
        v.view = view;
        v.proj = proj;
    }

    pub fn view(&self, id: ViewId) -> Option<&View> {
        self.views.get(&id)
    }

    /// Marks `id` as used this frame so it is cleared even without draws.
    pub fn touch(&mut self, id: ViewId) {
        self.touched.insert(id);
    }

    pub fn set_transform(&mut self, mtx: Mat4) {
        self.pending.transform = mtx;
    }

    pub fn set_vertex_buffer(&mut self, handle: VertexBufferHandle) {
        self.pending.vertex_buffer = handle;
    }

    pub fn set_index_buffer(&mut self, handle: IndexBufferHandle) {
        self.pending.index_buffer = handle;
    }

    pub fn set_state(&mut self, state: RenderState) {
        self.pending.state = state;
    }

    /// Records a draw of the pending state with `program` into view `id`.
    pub fn submit(&mut self, id: ViewId, program: ProgramHandle) {
        let pending = std::mem::take(&mut self.pending);
        self.touched.insert(id);
        self.draws.push(DrawCall {
            view: id,
            program,
            vertex_buffer: pending.vertex_buffer,
            index_buffer: pending.index_buffer,
            transform: pending.transform,
            state: pending.state,
        });
    }

    /// Draws recorded so far this frame.
    pub fn draws(&self) -> &[DrawCall] {
        &self.draws
    }

    pub fn is_touched(&self, id: ViewId) -> bool {
        self.touched.contains(&id)
    }

    /// Ends the frame: returns what was recorded and resets per-frame state.
    pub fn take_frame(&mut self) -> FrameCommands {
        let touched = std::mem::take(&mut self.touched);
        let mut draws = std::mem::take(&mut self.draws);
        self.pending = PendingDraw::default();

        draws.sort_by_key(|d| d.view);

        let views = touched
            .into_iter()
            .map(|id| (id, self.views.get(&id).copied().unwrap_or_default()))
            .collect();

        FrameCommands { views, draws }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vb(i: u16) -> VertexBufferHandle {
        VertexBufferHandle::from_raw(i)
    }

    fn ib(i: u16) -> IndexBufferHandle {
        IndexBufferHandle::from_raw(i)
    }

    fn prog(i: u16) -> ProgramHandle {
        ProgramHandle::from_raw(i)
    }

    // ── views ─────────────────────────────────────────────────────────────

    #[test]
    fn clear_color_unpacks_rgba() {
        let clear = ViewClear {
            flags: ClearFlags::COLOR,
            rgba: 0x3030_30ff,
            depth: 1.0,
            stencil: 0,
        };
        let c = clear.color();
        assert!((c.r - 48.0 / 255.0).abs() < 1e-9);
        assert!((c.g - 48.0 / 255.0).abs() < 1e-9);
        assert!((c.b - 48.0 / 255.0).abs() < 1e-9);
        assert_eq!(c.a, 1.0);
    }

    #[test]
    fn view_settings_persist_across_frames() {
        let mut enc = Encoder::new();
        enc.set_view_clear(0, ClearFlags::COLOR | ClearFlags::DEPTH, 0x3030_30ff, 1.0, 0);
        enc.set_view_rect(0, 0, 0, 1280, 720);
        enc.touch(0);

        let first = enc.take_frame();
        assert_eq!(first.views.len(), 1);

        enc.touch(0);
        let second = enc.take_frame();
        let (_, view) = second.views[0];
        assert_eq!(view.clear.rgba, 0x3030_30ff);
        assert_eq!(view.rect.map(|r| r.width), Some(1280));
    }

    #[test]
    fn untouched_views_are_not_executed() {
        let mut enc = Encoder::new();
        enc.set_view_clear(3, ClearFlags::COLOR, 0, 1.0, 0);
        assert!(enc.take_frame().views.is_empty());
    }

    #[test]
    fn views_execute_in_ascending_order() {
        let mut enc = Encoder::new();
        enc.touch(5);
        enc.touch(1);
        enc.touch(3);
        let ids: Vec<_> = enc.take_frame().views.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![1, 3, 5]);
    }

    // ── draws ─────────────────────────────────────────────────────────────

    #[test]
    fn submit_captures_pending_state() {
        let mut enc = Encoder::new();
        let mtx = Mat4::from_translation(glam::vec3(1.0, 2.0, 3.0));

        enc.set_transform(mtx);
        enc.set_vertex_buffer(vb(0));
        enc.set_index_buffer(ib(2));
        enc.set_state(RenderState::WRITE_RGB | RenderState::PT_LINES);
        enc.submit(0, prog(1));

        let draw = enc.draws()[0];
        assert_eq!(draw.vertex_buffer, vb(0));
        assert_eq!(draw.index_buffer, ib(2));
        assert_eq!(draw.program, prog(1));
        assert_eq!(draw.transform, mtx);
        assert_eq!(draw.state, RenderState::WRITE_RGB | RenderState::PT_LINES);
        assert!(enc.is_touched(0));
    }

    #[test]
    fn submit_resets_sticky_state() {
        let mut enc = Encoder::new();
        enc.set_vertex_buffer(vb(0));
        enc.set_index_buffer(ib(0));
        enc.set_state(RenderState::WRITE_Z);
        enc.submit(0, prog(0));

        enc.submit(0, prog(0));
        let second = enc.draws()[1];
        assert!(!second.vertex_buffer.is_valid());
        assert!(!second.index_buffer.is_valid());
        assert_eq!(second.state, RenderState::DEFAULT);
        assert_eq!(second.transform, Mat4::IDENTITY);
    }

    #[test]
    fn take_frame_groups_draws_by_view() {
        let mut enc = Encoder::new();
        enc.submit(2, prog(0));
        enc.submit(0, prog(1));
        enc.submit(2, prog(2));

        let frame = enc.take_frame();
        let order: Vec<_> = frame.draws.iter().map(|d| (d.view, d.program.raw())).collect();
        assert_eq!(order, vec![(0, 1), (2, 0), (2, 2)]);

        let in_view_2: Vec<_> = frame.draws_for(2).map(|(i, _)| i).collect();
        assert_eq!(in_view_2, vec![1, 2]);

        assert!(enc.draws().is_empty());
        assert!(!enc.is_touched(2));
    }
}
