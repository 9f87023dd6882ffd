/// What the frame loop should do after a surface error.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface was reconfigured; rendering may resume next frame.
    Reconfigured,
    /// Transient error; skip the current frame.
    SkipFrame,
    /// Out of memory; shut down.
    Fatal,
}

impl SurfaceErrorAction {
    pub(crate) fn for_error(err: &wgpu::SurfaceError) -> Self {
        match err {
            wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => Self::Reconfigured,
            wgpu::SurfaceError::OutOfMemory => Self::Fatal,
            wgpu::SurfaceError::Timeout | wgpu::SurfaceError::Other => Self::SkipFrame,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lost_and_outdated_reconfigure() {
        assert_eq!(
            SurfaceErrorAction::for_error(&wgpu::SurfaceError::Lost),
            SurfaceErrorAction::Reconfigured
        );
        assert_eq!(
            SurfaceErrorAction::for_error(&wgpu::SurfaceError::Outdated),
            SurfaceErrorAction::Reconfigured
        );
    }

    #[test]
    fn out_of_memory_is_fatal() {
        assert_eq!(
            SurfaceErrorAction::for_error(&wgpu::SurfaceError::OutOfMemory),
            SurfaceErrorAction::Fatal
        );
    }

    #[test]
    fn timeouts_skip_the_frame() {
        assert_eq!(
            SurfaceErrorAction::for_error(&wgpu::SurfaceError::Timeout),
            SurfaceErrorAction::SkipFrame
        );
        assert_eq!(
            SurfaceErrorAction::for_error(&wgpu::SurfaceError::Other),
            SurfaceErrorAction::SkipFrame
        );
    }
}
