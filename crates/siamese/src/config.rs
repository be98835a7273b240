use serde::{Deserialize, Serialize};
use siamese_loss::DEFAULT_MARGIN;
use siamese_nn::INPUT_CHANNELS;

use crate::error::{SiameseError, SiameseResult};
use crate::input::InputSpec;

/// Runtime options of a [`SiameseNetwork`](crate::SiameseNetwork).
///
/// The layer stack and its seeds are fixed; only the input size and the loss margin vary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiameseConfig {
    pub input: InputSpec,
    #[serde(default = "default_margin")]
    pub margin: f64,
}

fn default_margin() -> f64 {
    DEFAULT_MARGIN
}

impl SiameseConfig {
    pub fn new(height: usize, width: usize) -> Self {
        SiameseConfig {
            input: InputSpec::new(height, width),
            margin: DEFAULT_MARGIN,
        }
    }

    pub fn with_margin(mut self, margin: f64) -> Self {
        self.margin = margin;
        self
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> SiameseResult<Self> {
        let config: SiameseConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> SiameseResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> SiameseResult<()> {
        if self.input.height == 0 || self.input.width == 0 {
            return Err(SiameseError::InvalidConfig(format!(
                "input must be at least 1x1, got {}x{}",
                self.input.height, self.input.width
            )));
        }
        if self.input.channels != INPUT_CHANNELS {
            return Err(SiameseError::InvalidConfig(format!(
                "input must have {} channels, got {}",
                INPUT_CHANNELS, self.input.channels
            )));
        }
        if !self.margin.is_finite() || self.margin <= 0.0 {
            return Err(SiameseError::InvalidConfig(format!(
                "margin must be a positive finite number, got {}",
                self.margin
            )));
        }
        Ok(())
    }
}

impl Default for SiameseConfig {
    fn default() -> Self {
        SiameseConfig {
            input: InputSpec::default(),
            margin: DEFAULT_MARGIN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_defaults() {
        let config = SiameseConfig::from_json(r#"{ "input": { "height": 32, "width": 24 } }"#).unwrap();
        assert_eq!(config.input, InputSpec::new(32, 24));
        assert_eq!(config.margin, 1.0);
    }

    #[test]
    fn test_json_roundtrip() {
        let config = SiameseConfig::new(16, 16).with_margin(2.0);
        let parsed = SiameseConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_rejects_non_rgb() {
        let err = SiameseConfig::from_json(r#"{ "input": { "height": 4, "width": 4, "channels": 1 } }"#)
            .unwrap_err();
        assert!(matches!(err, SiameseError::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_bad_margin_and_size() {
        assert!(SiameseConfig::new(4, 4).with_margin(0.0).validate().is_err());
        assert!(SiameseConfig::new(4, 4).with_margin(f64::NAN).validate().is_err());
        assert!(SiameseConfig::new(0, 4).validate().is_err());
        assert!(SiameseConfig::default().validate().is_ok());
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            SiameseConfig::from_json("{ input: 3 }"),
            Err(SiameseError::ConfigParse(_))
        ));
    }
}
