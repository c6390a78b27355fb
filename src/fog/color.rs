use crate::foundation::error::{UmbraError, UmbraResult};

/// Trailing fog fill (`#00000088`) used when the setting is missing or invalid.
const DEFAULT_RGB: &str = "#000000";
const DEFAULT_ALPHA: u8 = 0x88;

/// Opacity used when the setting carries no alpha byte.
const DEFAULT_OPACITY: f64 = 0.5;

/// Fill of the trailing fog overlay.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FogColor {
    /// `#rrggbb`.
    pub color: String,
    /// 0..1.
    pub opacity: f64,
}

impl FogColor {
    /// Parse `#RRGGBBAA` (alpha becomes opacity) or `#RRGGBB` (opacity 0.5).
    pub fn parse(s: &str) -> UmbraResult<Self> {
        let s = s.trim();
        let hex = s.strip_prefix('#').unwrap_or(s);

        fn hex_byte(pair: &str) -> UmbraResult<u8> {
            u8::from_str_radix(pair, 16)
                .map_err(|_| UmbraError::validation(format!("invalid hex byte \"{pair}\"")))
        }

        if !hex.is_ascii() {
            return Err(UmbraError::validation("fog color must be ASCII hex"));
        }
        let (rgb, opacity) = match hex.len() {
            6 => (&hex[0..6], DEFAULT_OPACITY),
            8 => (&hex[0..6], f64::from(hex_byte(&hex[6..8])?) / 255.0),
            _ => {
                return Err(UmbraError::validation(
                    "fog color must be #RRGGBB or #RRGGBBAA (case-insensitive)",
                ));
            }
        };
        for i in (0..6).step_by(2) {
            hex_byte(&rgb[i..i + 2])?;
        }
        Ok(Self {
            color: format!("#{}", rgb.to_ascii_lowercase()),
            opacity,
        })
    }

    /// Color from the scene setting, falling back to the default on absence or error.
    pub fn from_setting(setting: Option<&str>) -> Self {
        match setting.map(Self::parse) {
            Some(Ok(c)) => c,
            Some(Err(e)) => {
                tracing::warn!(error = %e, "unusable fog color setting, using default");
                Self::default()
            }
            None => Self::default(),
        }
    }
}

impl Default for FogColor {
    fn default() -> Self {
        Self {
            color: DEFAULT_RGB.to_string(),
            opacity: f64::from(DEFAULT_ALPHA) / 255.0,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/fog/color.rs"]
mod tests;
