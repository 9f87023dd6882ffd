//! Shader blob supply and program loading.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use cubes_engine::gfx::{Gfx, ProgramHandle, ShaderHandle};

/// Shader directory per backend, relative to the shader root.
///
/// wgpu compiles WGSL for every backend, so they all share one set of blobs.
/// A SPIR-V blob dropped into the same directory is accepted as well.
const SHADER_DIRS: [(wgpu::Backend, &str); 6] = [
    (wgpu::Backend::Noop, "wgsl"),
    (wgpu::Backend::Vulkan, "wgsl"),
    (wgpu::Backend::Metal, "wgsl"),
    (wgpu::Backend::Dx12, "wgsl"),
    (wgpu::Backend::Gl, "wgsl"),
    (wgpu::Backend::BrowserWebGpu, "wgsl"),
];

/// Directory holding the blobs for `backend`.
///
/// # Panics
///
/// If `backend` has no entry in the table; that is a build error, not a
/// runtime condition.
pub fn shader_dir(backend: wgpu::Backend) -> &'static str {
    match SHADER_DIRS.iter().find(|(b, _)| *b == backend) {
        Some((_, dir)) => *dir,
        None => panic!("no shader directory for backend {backend:?}"),
    }
}

mod embedded {
    pub const VS_CUBES: &[u8] = include_bytes!("../runtime/shaders/wgsl/vs_cubes.bin");
    pub const FS_CUBES: &[u8] = include_bytes!("../runtime/shaders/wgsl/fs_cubes.bin");
}

/// Where shader bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShaderSupply {
    /// Blobs compiled into the binary, looked up by name.
    Embedded,
    /// `<root>/<backend dir>/<name>.bin` on disk.
    Files { root: PathBuf },
}

/// The bundled shader tree, or the embedded copies when that tree is not
/// on disk (binary run away from its source checkout).
impl Default for ShaderSupply {
    fn default() -> Self {
        let files = Self::bundled_files();
        match &files {
            Self::Files { root } if !root.is_dir() => {
                log::warn!("{} not found; using embedded shaders", root.display());
                Self::Embedded
            }
            _ => files,
        }
    }
}

impl ShaderSupply {
    /// Shader root shipped next to the crate sources.
    pub fn bundled_files() -> Self {
        Self::Files {
            root: Path::new(env!("CARGO_MANIFEST_DIR")).join("runtime/shaders"),
        }
    }

    /// Bytes of shader `name` for `backend`, or `None` (logged) if there are
    /// none.
    pub fn bytes(&self, backend: wgpu::Backend, name: &str) -> Option<Cow<'static, [u8]>> {
        match self {
            ShaderSupply::Embedded => {
                let bytes = match name {
                    "vs_cubes" => embedded::VS_CUBES,
                    "fs_cubes" => embedded::FS_CUBES,
                    _ => {
                        log::warn!("no embedded shader named \"{name}\"");
                        return None;
                    }
                };
                Some(Cow::Borrowed(bytes))
            }
            ShaderSupply::Files { root } => {
                let path = root.join(shader_dir(backend)).join(format!("{name}.bin"));
                match std::fs::read(&path) {
                    Ok(bytes) => Some(Cow::Owned(bytes)),
                    Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                        log::warn!("{} not found", path.display());
                        None
                    }
                    Err(err) => {
                        log::warn!("failed to read {}: {err}", path.display());
                        None
                    }
                }
            }
        }
    }
}

/// Creates shader `name` from `supply`. Returns [`ShaderHandle::INVALID`]
/// when the bytes are missing or do not compile.
pub fn load_shader(gfx: &mut Gfx, supply: &ShaderSupply, name: &str) -> ShaderHandle {
    match supply.bytes(gfx.renderer_type(), name) {
        Some(bytes) => gfx.create_shader(name, &bytes),
        None => ShaderHandle::INVALID,
    }
}

/// Loads and links a program. With `destroy_shaders` the shaders go away
/// together with the program.
pub fn load_program(
    gfx: &mut Gfx,
    supply: &ShaderSupply,
    vs_name: &str,
    fs_name: Option<&str>,
    destroy_shaders: bool,
) -> ProgramHandle {
    let vs = load_shader(gfx, supply, vs_name);
    let fs = fs_name.map(|name| load_shader(gfx, supply, name));

    let program = gfx.create_program(vs, fs, destroy_shaders);
    if !program.is_valid() && destroy_shaders {
        gfx.destroy_shader(vs);
        if let Some(fs) = fs {
            gfx.destroy_shader(fs);
        }
    }
    program
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── directory table ───────────────────────────────────────────────────

    #[test]
    fn every_backend_has_a_directory() {
        for backend in wgpu::Backend::ALL {
            assert!(!shader_dir(backend).is_empty());
        }
        assert_eq!(shader_dir(wgpu::Backend::Vulkan), "wgsl");
        assert_eq!(shader_dir(wgpu::Backend::Metal), "wgsl");
    }

    // ── embedded ──────────────────────────────────────────────────────────

    #[test]
    fn embedded_blobs_are_wgsl() {
        let supply = ShaderSupply::Embedded;
        for name in ["vs_cubes", "fs_cubes"] {
            let bytes = supply.bytes(wgpu::Backend::Gl, name).unwrap();
            let text = std::str::from_utf8(&bytes).unwrap();
            assert!(text.contains("fn main"), "{name}");
        }
    }

    #[test]
    fn unknown_embedded_name_is_none() {
        assert!(ShaderSupply::Embedded
            .bytes(wgpu::Backend::Gl, "vs_missing")
            .is_none());
    }

    // ── files ─────────────────────────────────────────────────────────────

    #[test]
    fn file_is_read_from_backend_directory() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("wgsl")).unwrap();
        std::fs::write(root.path().join("wgsl/vs_test.bin"), b"\x03\x02\x23\x07").unwrap();

        let supply = ShaderSupply::Files {
            root: root.path().to_path_buf(),
        };
        let bytes = supply.bytes(wgpu::Backend::Vulkan, "vs_test").unwrap();
        assert_eq!(&*bytes, b"\x03\x02\x23\x07");

        // Blobs outside the backend directory are not picked up.
        std::fs::write(root.path().join("vs_stray.bin"), b"x").unwrap();
        assert!(supply.bytes(wgpu::Backend::Vulkan, "vs_stray").is_none());
    }

    #[test]
    fn missing_file_is_none() {
        let root = tempfile::tempdir().unwrap();
        let supply = ShaderSupply::Files {
            root: root.path().to_path_buf(),
        };
        assert!(supply.bytes(wgpu::Backend::Gl, "vs_cubes").is_none());
    }

    #[test]
    fn default_supply_reads_bundled_files() {
        assert_eq!(ShaderSupply::default(), ShaderSupply::bundled_files());
    }

    #[test]
    fn bundled_files_exist_for_every_backend() {
        let files = ShaderSupply::bundled_files();
        for backend in wgpu::Backend::ALL {
            for name in ["vs_cubes", "fs_cubes"] {
                let on_disk = files
                    .bytes(backend, name)
                    .unwrap_or_else(|| panic!("{name} missing for {backend:?}"));
                let embedded = ShaderSupply::Embedded.bytes(backend, name).unwrap();
                assert_eq!(on_disk, embedded, "{name} on {backend:?}");
            }
        }
    }
}
