/// Environment variable selecting the adapter power preference (`low`, `high`, `none`).
pub const POWER_PREFERENCE_ENV: &str = "EMBER_POWER_PREFERENCE";

/// Configuration for the wgpu layer.
///
/// Read once when the GPU instance is created. Keep this structure stable and
/// minimal; add flags only when a concrete platform or backend requirement exists.
#[derive(Debug, Clone)]
pub struct ContextConfig {
    /// Backends the instance may use.
    pub backends: wgpu::Backends,

    /// Adapter selection preference.
    pub power_preference: wgpu::PowerPreference,

    /// Force a software/fallback adapter.
    pub force_fallback_adapter: bool,

    /// Prefer an sRGB surface format when available.
    pub prefer_srgb: bool,

    /// Present mode (swap behavior).
    ///
    /// Falls back to FIFO when the surface does not support the requested mode.
    pub present_mode: wgpu::PresentMode,

    /// Optional alpha mode preference for the surface.
    ///
    /// If provided but unsupported on the current surface, a supported mode is selected.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,

    /// Required wgpu features.
    pub required_features: wgpu::Features,

    /// Limits requested from the adapter/device.
    pub required_limits: wgpu::Limits,

    /// Desired maximum frame latency for the surface.
    ///
    /// This value is a hint; support depends on platform/backend.
    pub desired_maximum_frame_latency: u32,

    /// Debug label attached to the logical device.
    pub device_label: String,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            backends: wgpu::Backends::all(),
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            prefer_srgb: true,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: None,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            desired_maximum_frame_latency: 2,
            device_label: "ember device".to_string(),
        }
    }
}

impl ContextConfig {
    /// Applies process-wide overrides from the environment.
    ///
    /// - `WGPU_BACKEND` restricts the backend set (comma list, e.g. `vulkan,metal`)
    /// - `EMBER_POWER_PREFERENCE` selects `low`, `high` or `none`
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(backends) = wgpu::Backends::from_env() {
            log::debug!("backends overridden from environment: {backends:?}");
            self.backends = backends;
        }

        if let Ok(value) = std::env::var(POWER_PREFERENCE_ENV) {
            match parse_power_preference(&value) {
                Some(pref) => self.power_preference = pref,
                None => log::warn!("ignoring unknown {POWER_PREFERENCE_ENV} value {value:?}"),
            }
        }

        self
    }
}

pub(crate) fn parse_power_preference(value: &str) -> Option<wgpu::PowerPreference> {
    match value.trim().to_ascii_lowercase().as_str() {
        "low" | "low-power" | "lowpower" => Some(wgpu::PowerPreference::LowPower),
        "high" | "high-performance" | "highperformance" => {
            Some(wgpu::PowerPreference::HighPerformance)
        }
        "none" => Some(wgpu::PowerPreference::None),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_targets_every_backend() {
        let config = ContextConfig::default();
        assert_eq!(config.backends, wgpu::Backends::all());
        assert_eq!(config.present_mode, wgpu::PresentMode::Fifo);
        assert!(config.prefer_srgb);
    }

    #[test]
    fn power_preference_accepts_aliases() {
        assert_eq!(parse_power_preference("low"), Some(wgpu::PowerPreference::LowPower));
        assert_eq!(
            parse_power_preference(" High-Performance "),
            Some(wgpu::PowerPreference::HighPerformance)
        );
        assert_eq!(parse_power_preference("NONE"), Some(wgpu::PowerPreference::None));
    }

    #[test]
    fn power_preference_rejects_garbage() {
        assert_eq!(parse_power_preference("turbo"), None);
        assert_eq!(parse_power_preference(""), None);
    }
}
