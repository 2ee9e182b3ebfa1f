//! Immutable key to color table handed to the rendering sink

use baitscope_config::PaletteConfig;
use std::collections::BTreeMap;

const NEUTRAL: &str = "#7f7f7f";

/// Colors for chart series, built once from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: BTreeMap<String, String>,
    fallback: Vec<String>,
}

impl Palette {
    /// Palette with the configured fixed colors and fallback cycle.
    pub fn from_config(config: &PaletteConfig) -> Self {
        Self {
            colors: config.colors.clone(),
            fallback: config.fallback.clone(),
        }
    }

    /// Fixed color of `key`, if configured.
    pub fn fixed(&self, key: &str) -> Option<&str> {
        self.colors.get(key).map(String::as_str)
    }

    /// Colors for `keys`: configured ones first, the rest cycle through the fallback list
    /// in the order given.
    pub fn assign<'a, I>(&self, keys: I) -> BTreeMap<String, String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut assigned = BTreeMap::new();
        let mut next_fallback = 0;

        for key in keys {
            if assigned.contains_key(key) {
                continue;
            }
            let color = match self.fixed(key) {
                Some(color) => color.to_string(),
                None => {
                    let color = if self.fallback.is_empty() {
                        NEUTRAL.to_string()
                    } else {
                        self.fallback[next_fallback % self.fallback.len()].clone()
                    };
                    next_fallback += 1;
                    color
                }
            };
            assigned.insert(key.to_string(), color);
        }

        assigned
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::from_config(&PaletteConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_and_fallback_colors() {
        let mut config = PaletteConfig::default();
        config.colors.insert("Apple Daily".to_string(), "#000001".to_string());
        config.fallback = vec!["#111111".to_string(), "#222222".to_string()];
        let palette = Palette::from_config(&config);

        let colors = palette.assign(["Apple Daily", "UDN", "ETtoday", "CTS", "UDN"]);
        assert_eq!(colors.len(), 4);
        assert_eq!(colors["Apple Daily"], "#000001");
        assert_eq!(colors["UDN"], "#111111");
        assert_eq!(colors["ETtoday"], "#222222");
        assert_eq!(colors["CTS"], "#111111");
    }

    #[test]
    fn test_default_palette_knows_clickbait() {
        assert_eq!(Palette::default().fixed("clickbait"), Some("#d62728"));
    }
}
