//! The cubes sample: an 11x11 grid of spinning cubes in view 0.

use std::time::Instant;

use anyhow::{bail, Result};
use glam::{Mat4, Vec3};

use cubes_engine::core::{App, AppControl, FrameCtx, InitCtx};
use cubes_engine::gfx::{
    ClearFlags, Encoder, Gfx, IndexBufferHandle, ProgramHandle, RenderState, VertexBufferHandle,
    ViewId,
};

use crate::config::CubesConfig;
use crate::geometry::{PosColorVertex, Topology, CUBE_VERTICES};
use crate::shaders;

/// Cubes per grid row and column.
pub const GRID: u32 = 11;

const VIEW: ViewId = 0;

// ── render state ──────────────────────────────────────────────────────────

/// Which color channels draws write.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ColorMask {
    pub r: bool,
    pub g: bool,
    pub b: bool,
    pub a: bool,
}

impl Default for ColorMask {
    fn default() -> Self {
        Self {
            r: true,
            g: true,
            b: true,
            a: true,
        }
    }
}

/// Draw state for every cube: depth-tested, back faces (counter-clockwise
/// after the view flip) culled, multisampled, plus the topology bits.
pub fn render_state(topology: Topology, mask: ColorMask) -> RenderState {
    let mut state = RenderState::WRITE_Z
        | RenderState::DEPTH_TEST_LESS
        | RenderState::CULL_CCW
        | RenderState::MSAA
        | topology.state();

    state.set(RenderState::WRITE_R, mask.r);
    state.set(RenderState::WRITE_G, mask.g);
    state.set(RenderState::WRITE_B, mask.b);
    state.set(RenderState::WRITE_A, mask.a);
    state
}

// ── transforms ────────────────────────────────────────────────────────────

/// Camera 35 units out, looking back at the grid.
pub fn view_matrix() -> Mat4 {
    Mat4::from_rotation_y(180f32.to_radians()) * Mat4::from_translation(Vec3::new(0.0, 0.0, 35.0))
}

/// 60° vertical field of view. `homogeneous_depth` selects `[-1, 1]` clip
/// depth instead of `[0, 1]`.
pub fn projection(width: u32, height: u32, homogeneous_depth: bool) -> Mat4 {
    let aspect = width.max(1) as f32 / height.max(1) as f32;
    let fov = 60f32.to_radians();
    if homogeneous_depth {
        Mat4::perspective_rh_gl(fov, aspect, 0.1, 100.0)
    } else {
        Mat4::perspective_rh(fov, aspect, 0.1, 100.0)
    }
}

/// Model matrix of grid cell (`xx`, `yy`) at `time` seconds.
pub fn cube_transform(xx: u32, yy: u32, time: f32) -> Mat4 {
    let translate = Mat4::from_translation(Vec3::new(
        -15.0 + xx as f32 * 3.0,
        -15.0 + yy as f32 * 3.0,
        0.0,
    ));
    let spin_y = Mat4::from_axis_angle(Vec3::NEG_Y, time + yy as f32 * 0.37);
    let spin_x = Mat4::from_axis_angle(Vec3::NEG_X, time + xx as f32 * 0.21);
    translate * spin_y * spin_x
}

// ── scene ─────────────────────────────────────────────────────────────────

/// Per-frame inputs of [`CubesScene::record`].
#[derive(Debug, Copy, Clone)]
pub struct FrameParams {
    /// Seconds since init.
    pub time: f32,
    pub width: u32,
    pub height: u32,
    pub homogeneous_depth: bool,
    pub topology: Topology,
    pub mask: ColorMask,
}

/// Handles created at init and used every frame.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CubesScene {
    pub vertex_buffer: VertexBufferHandle,
    /// One per topology, in [`Topology::ALL`] order.
    pub index_buffers: [IndexBufferHandle; Topology::ALL.len()],
    pub program: ProgramHandle,
}

impl CubesScene {
    /// Records one frame into `encoder`: view 0 setup, a touch so it clears,
    /// then one draw per grid cell.
    pub fn record(&self, encoder: &mut Encoder, params: &FrameParams) {
        encoder.set_view_transform(
            VIEW,
            view_matrix(),
            projection(params.width, params.height, params.homogeneous_depth),
        );
        encoder.set_view_rect(VIEW, 0, 0, clamp_u16(params.width), clamp_u16(params.height));
        encoder.touch(VIEW);

        let index_buffer = self.index_buffers[params.topology.index()];
        let state = render_state(params.topology, params.mask);

        for yy in 0..GRID {
            for xx in 0..GRID {
                encoder.set_transform(cube_transform(xx, yy, params.time));
                encoder.set_vertex_buffer(self.vertex_buffer);
                encoder.set_index_buffer(index_buffer);
                encoder.set_state(state);
                encoder.submit(VIEW, self.program);
            }
        }
    }

    fn destroy(self, gfx: &mut Gfx) {
        for ib in self.index_buffers {
            gfx.destroy_index_buffer(ib);
        }
        gfx.destroy_vertex_buffer(self.vertex_buffer);
        gfx.destroy_program(self.program);
    }
}

fn clamp_u16(v: u32) -> u16 {
    v.min(u32::from(u16::MAX)) as u16
}

// ── application ───────────────────────────────────────────────────────────

/// Lifecycle of [`CubesApp`]. Moves forward only.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Running,
    Shutdown,
}

enum State {
    Uninitialized,
    Running { scene: CubesScene, origin: Instant },
    Shutdown,
}

pub struct CubesApp {
    config: CubesConfig,
    state: State,
}

impl CubesApp {
    pub fn new(config: CubesConfig) -> Self {
        Self {
            config,
            state: State::Uninitialized,
        }
    }

    pub fn phase(&self) -> Phase {
        match self.state {
            State::Uninitialized => Phase::Uninitialized,
            State::Running { .. } => Phase::Running,
            State::Shutdown => Phase::Shutdown,
        }
    }

    fn create_scene(&self, gfx: &mut Gfx) -> Result<CubesScene> {
        gfx.encoder().set_view_clear(
            VIEW,
            ClearFlags::COLOR | ClearFlags::DEPTH,
            self.config.clear_rgba,
            1.0,
            0,
        );

        let layout = PosColorVertex::layout()?;
        let vertex_buffer =
            gfx.create_vertex_buffer(bytemuck::cast_slice(&CUBE_VERTICES), &layout);
        let index_buffers = Topology::ALL.map(|t| gfx.create_index_buffer(t.indices()));

        let program = shaders::load_program(
            gfx,
            &self.config.shaders,
            "vs_cubes",
            Some("fs_cubes"),
            true,
        );
        if !program.is_valid() {
            // Draws with it are rejected by the context; keep running.
            log::error!("cubes program unavailable; nothing will be drawn");
        }

        Ok(CubesScene {
            vertex_buffer,
            index_buffers,
            program,
        })
    }
}

impl App for CubesApp {
    fn on_init(&mut self, ctx: &mut InitCtx<'_, '_>) -> Result<()> {
        if self.phase() != Phase::Uninitialized {
            bail!("cubes initialized in phase {:?}", self.phase());
        }

        let scene = self.create_scene(ctx.gfx)?;
        log::info!(
            "cubes: {}x{} grid, {} on {}",
            GRID,
            GRID,
            self.config.topology.name(),
            ctx.gfx.renderer_type()
        );

        self.state = State::Running {
            scene,
            origin: Instant::now(),
        };
        Ok(())
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let State::Running { scene, origin } = &self.state else {
            return AppControl::Exit;
        };

        let size = ctx.window.size();
        let params = FrameParams {
            time: ctx.time.now.saturating_duration_since(*origin).as_secs_f32(),
            width: size.width,
            height: size.height,
            homogeneous_depth: ctx.gfx.caps().homogeneous_depth,
            topology: self.config.topology,
            mask: self.config.color_mask,
        };

        scene.record(ctx.gfx.encoder(), &params);
        ctx.frame()
    }

    fn on_shutdown(&mut self, gfx: &mut Gfx) {
        match std::mem::replace(&mut self.state, State::Shutdown) {
            State::Running { scene, .. } => {
                scene.destroy(gfx);
                log::info!("cubes resources released");
            }
            State::Uninitialized => {}
            State::Shutdown => log::warn!("cubes shut down twice"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene() -> CubesScene {
        CubesScene {
            vertex_buffer: VertexBufferHandle::from_raw(0),
            index_buffers: [0, 1, 2, 3, 4].map(IndexBufferHandle::from_raw),
            program: ProgramHandle::from_raw(0),
        }
    }

    fn params(topology: Topology) -> FrameParams {
        FrameParams {
            time: 1.5,
            width: 1280,
            height: 720,
            homogeneous_depth: false,
            topology,
            mask: ColorMask::default(),
        }
    }

    // ── render state ──────────────────────────────────────────────────────

    #[test]
    fn triangle_list_with_all_channels() {
        let expected = RenderState::WRITE_R
            | RenderState::WRITE_G
            | RenderState::WRITE_B
            | RenderState::WRITE_A
            | RenderState::WRITE_Z
            | RenderState::DEPTH_TEST_LESS
            | RenderState::CULL_CCW
            | RenderState::MSAA;
        assert_eq!(
            render_state(Topology::TriangleList, ColorMask::default()),
            expected
        );
    }

    #[test]
    fn topology_adds_only_its_bit() {
        let base = render_state(Topology::TriangleList, ColorMask::default());
        for topology in Topology::ALL {
            let state = render_state(topology, ColorMask::default());
            assert_eq!(state - base, topology.state(), "{}", topology.name());
            assert_eq!(state & RenderState::PT_MASK, topology.state());
        }
    }

    #[test]
    fn color_mask_clears_channels() {
        let mask = ColorMask {
            r: false,
            a: false,
            ..ColorMask::default()
        };
        let state = render_state(Topology::Lines, mask);
        assert!(!state.contains(RenderState::WRITE_R));
        assert!(!state.contains(RenderState::WRITE_A));
        assert!(state.contains(RenderState::WRITE_G | RenderState::WRITE_B | RenderState::WRITE_Z));
    }

    // ── transforms ────────────────────────────────────────────────────────

    #[test]
    fn camera_sits_35_units_back() {
        let eye = view_matrix().inverse().transform_point3(Vec3::ZERO);
        assert!((eye - Vec3::new(0.0, 0.0, -35.0)).length() < 1e-4);
    }

    #[test]
    fn grid_is_centered_on_cell_5() {
        let center = cube_transform(5, 5, 0.0).transform_point3(Vec3::ZERO);
        assert!(center.length() < 1e-5);

        let corner = cube_transform(0, 10, 3.0).transform_point3(Vec3::ZERO);
        assert!((corner - Vec3::new(-15.0, 15.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn grid_center_is_visible() {
        let mvp = projection(1280, 720, false) * view_matrix();
        let clip = mvp * glam::Vec4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(clip.w > 0.0);
        assert!((0.0..=1.0).contains(&ndc.z));
    }

    // ── recording ─────────────────────────────────────────────────────────

    #[test]
    fn frame_records_one_draw_per_cube() {
        let scene = scene();
        let mut encoder = Encoder::new();
        scene.record(&mut encoder, &params(Topology::TriangleList));

        let draws = encoder.draws();
        assert_eq!(draws.len(), (GRID * GRID) as usize);
        assert!(encoder.is_touched(VIEW));
        for draw in draws {
            assert_eq!(draw.view, VIEW);
            assert_eq!(draw.program, scene.program);
            assert_eq!(draw.vertex_buffer, scene.vertex_buffer);
            assert_eq!(draw.index_buffer, scene.index_buffers[0]);
        }
        assert_eq!(draws[12].transform, cube_transform(1, 1, 1.5));

        let view = encoder.view(VIEW).unwrap();
        assert_eq!(view.rect.map(|r| (r.width, r.height)), Some((1280, 720)));
    }

    #[test]
    fn topology_selects_index_buffer() {
        let scene = scene();
        let mut encoder = Encoder::new();
        scene.record(&mut encoder, &params(Topology::LineStrip));

        let draw = encoder.draws()[0];
        assert_eq!(draw.index_buffer, scene.index_buffers[3]);
        assert!(draw.state.contains(RenderState::PT_LINESTRIP));
    }

    #[test]
    fn frames_leave_handles_unchanged() {
        let scene = scene();
        let before = scene;
        let mut encoder = Encoder::new();

        for _ in 0..2 {
            scene.record(&mut encoder, &params(Topology::TriangleList));
            let frame = encoder.take_frame();
            assert_eq!(frame.views.len(), 1);
            assert_eq!(frame.draws.len(), (GRID * GRID) as usize);
        }
        assert_eq!(scene, before);
    }

    // ── lifecycle ─────────────────────────────────────────────────────────

    #[test]
    fn app_starts_uninitialized() {
        let app = CubesApp::new(CubesConfig::default());
        assert_eq!(app.phase(), Phase::Uninitialized);
    }
}
