/// Controls engine behavior.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Embedding dimension (e.g. 512 for the default face model).
    pub dim: usize,

    /// Minimum images that must yield embeddings per enrollment.
    /// Default: 3.
    pub min_images: usize,

    /// Maximum images accepted per enrollment. Default: 10.
    pub max_images: usize,

    /// Minimum cosine similarity for a positive identification.
    /// Lower = more lenient (more false matches), higher = stricter.
    /// Default: 0.6.
    pub match_threshold: f32,

    /// Minimum capture quality score for enrollment images.
    /// Default: 0.3.
    pub quality_threshold: f32,

    /// Two distinct identities scoring within this margin make a query
    /// ambiguous and it resolves as no-match. 0 disables the guard.
    /// Default: 0.05.
    pub ambiguity_margin: f32,

    /// Nearest templates fetched per search. More than 1 enables
    /// ambiguity detection. Default: 3.
    pub search_k: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dim: 512,
            min_images: 3,
            max_images: 10,
            match_threshold: 0.6,
            quality_threshold: 0.3,
            ambiguity_margin: 0.05,
            search_k: 3,
        }
    }
}

impl EngineConfig {
    /// Load configuration from `ROLLCALL_*` environment variables,
    /// falling back to the defaults.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            dim: env_usize("ROLLCALL_DIM", d.dim),
            min_images: env_usize("ROLLCALL_MIN_IMAGES", d.min_images),
            max_images: env_usize("ROLLCALL_MAX_IMAGES", d.max_images),
            match_threshold: env_f32("ROLLCALL_MATCH_THRESHOLD", d.match_threshold),
            quality_threshold: env_f32("ROLLCALL_QUALITY_THRESHOLD", d.quality_threshold),
            ambiguity_margin: env_f32("ROLLCALL_AMBIGUITY_MARGIN", d.ambiguity_margin),
            search_k: env_usize("ROLLCALL_SEARCH_K", d.search_k),
        }
    }

    pub(crate) fn with_defaults(mut self) -> Self {
        let d = Self::default();
        if self.min_images == 0 {
            self.min_images = d.min_images;
        }
        if self.max_images == 0 {
            self.max_images = d.max_images;
        }
        if self.match_threshold == 0.0 {
            self.match_threshold = d.match_threshold;
        }
        if self.quality_threshold == 0.0 {
            self.quality_threshold = d.quality_threshold;
        }
        if self.search_k == 0 {
            self.search_k = d.search_k;
        }
        self
    }
}

fn env_f32(key: &str, default: f32) -> f32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.dim, 512);
        assert_eq!(cfg.min_images, 3);
        assert_eq!(cfg.max_images, 10);
        assert_eq!(cfg.match_threshold, 0.6);
        assert_eq!(cfg.quality_threshold, 0.3);
        assert_eq!(cfg.ambiguity_margin, 0.05);
        assert_eq!(cfg.search_k, 3);
    }

    #[test]
    fn test_with_defaults_fills_zeros() {
        let cfg = EngineConfig {
            dim: 4,
            min_images: 0,
            max_images: 0,
            match_threshold: 0.0,
            quality_threshold: 0.0,
            ambiguity_margin: 0.0,
            search_k: 0,
        }
        .with_defaults();
        assert_eq!(cfg.dim, 4);
        assert_eq!(cfg.min_images, 3);
        assert_eq!(cfg.max_images, 10);
        assert_eq!(cfg.match_threshold, 0.6);
        assert_eq!(cfg.quality_threshold, 0.3);
        // Zero margin means the ambiguity guard is off, not defaulted.
        assert_eq!(cfg.ambiguity_margin, 0.0);
        assert_eq!(cfg.search_k, 3);
    }

    #[test]
    fn test_env_helpers_fall_back() {
        assert_eq!(env_f32("ROLLCALL_TEST_UNSET_F32", 0.25), 0.25);
        assert_eq!(env_usize("ROLLCALL_TEST_UNSET_USIZE", 7), 7);
    }
}
