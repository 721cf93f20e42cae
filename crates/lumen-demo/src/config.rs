//! Application configuration for the demo.

use std::time::Duration;

/// Default width of the composed original|processed display.
const DEFAULT_DISPLAY_WIDTH: u32 = 1000;
/// Default height of the composed display.
const DEFAULT_DISPLAY_HEIGHT: u32 = 400;
/// Default pause between render iterations.
const DEFAULT_FRAME_DELAY_MS: u64 = 1;

/// Runtime configuration for the Lumen demo application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Width of the composed display in pixels.
    pub display_width: u32,
    /// Height of the composed display in pixels.
    pub display_height: u32,
    /// Pause between render iterations.
    pub frame_delay: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            display_width: env_or("LUMEN_DISPLAY_WIDTH", DEFAULT_DISPLAY_WIDTH),
            display_height: env_or("LUMEN_DISPLAY_HEIGHT", DEFAULT_DISPLAY_HEIGHT),
            frame_delay: Duration::from_millis(env_or(
                "LUMEN_FRAME_DELAY_MS",
                DEFAULT_FRAME_DELAY_MS,
            )),
        }
    }
}

impl AppConfig {
    /// Apply command-line overrides on top of the environment defaults.
    pub fn with_overrides(mut self, width: Option<u32>, height: Option<u32>) -> Self {
        if let Some(width) = width {
            self.display_width = width;
        }
        if let Some(height) = height {
            self.display_height = height;
        }
        self
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_replace_only_given_fields() {
        let base = AppConfig {
            display_width: 1000,
            display_height: 400,
            frame_delay: Duration::from_millis(1),
        };
        let config = base.clone().with_overrides(Some(640), None);
        assert_eq!(config.display_width, 640);
        assert_eq!(config.display_height, 400);
        assert_eq!(config.frame_delay, base.frame_delay);
    }

    #[test]
    fn test_env_or_falls_back_on_missing_key() {
        assert_eq!(env_or("LUMEN_TEST_SURELY_UNSET_KEY", 7u32), 7);
    }
}
