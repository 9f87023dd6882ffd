use std::borrow::Cow;

use anyhow::{bail, Context, Result};

const SPIRV_MAGIC: u32 = 0x0723_0203;

/// Interprets a shader blob: SPIR-V (either endianness) or WGSL text.
///
/// Trailing NUL bytes are ignored so blobs written by loaders that append a
/// terminator are accepted.
pub(crate) fn decode_blob(bytes: &[u8]) -> Result<wgpu::ShaderSource<'_>> {
    if bytes.len() >= 4 {
        let word = [bytes[0], bytes[1], bytes[2], bytes[3]];
        if u32::from_le_bytes(word) == SPIRV_MAGIC || u32::from_be_bytes(word) == SPIRV_MAGIC {
            if bytes.len() % 4 != 0 {
                bail!("SPIR-V blob length {} is not a multiple of 4", bytes.len());
            }
            return Ok(wgpu::util::make_spirv(bytes));
        }
    }

    let end = bytes
        .iter()
        .rposition(|&b| b != 0)
        .map_or(0, |last| last + 1);
    let text = std::str::from_utf8(&bytes[..end]).context("shader blob is neither SPIR-V nor UTF-8")?;

    if text.trim().is_empty() {
        bail!("shader blob is empty");
    }

    Ok(wgpu::ShaderSource::Wgsl(Cow::Borrowed(text)))
}
