use gs_engine::SAMPLE_RATE;

/// Offline render settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderConfig {
    pub subtune: usize,
    /// Hard cap on the rendered length
    pub max_seconds: u32,
    /// Stop after the song has ended this many times
    pub loops: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            subtune: 0,
            max_seconds: 300,
            loops: 1,
        }
    }
}

impl RenderConfig {
    pub fn max_samples(&self) -> u64 {
        self.max_seconds as u64 * SAMPLE_RATE as u64
    }
}
