use serde::{Deserialize, Serialize};

/// Handle to a drawable object owned by the render backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DrawableId(pub u32);

/// Handle to a texture uploaded to the render backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextureId(pub u32);

/// Packed 0xRRGGBB colour, the format colour pickers hand us.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(pub u32);

impl Color {
    pub const WHITE: Color = Color(0xffffff);
    pub const BLACK: Color = Color(0x000000);

    /// Linear 0..1 channels.
    pub fn rgb(self) -> [f32; 3] {
        [
            ((self.0 >> 16) & 0xff) as f32 / 255.0,
            ((self.0 >> 8) & 0xff) as f32 / 255.0,
            (self.0 & 0xff) as f32 / 255.0,
        ]
    }

    /// Parse `#rrggbb` or `rrggbb`.
    pub fn from_hex(s: &str) -> Option<Self> {
        let digits = s.trim().trim_start_matches('#');
        if digits.len() != 6 {
            return None;
        }
        u32::from_str_radix(digits, 16).ok().map(Color)
    }

    pub fn to_hex(self) -> String {
        format!("#{:06x}", self.0 & 0xffffff)
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::WHITE
    }
}

/// How the render backend clears behind the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Background {
    Black,
    Transparent,
    Color { color: Color },
    /// Image supplied by the host, referenced by URL or data-URI.
    Custom { source: String },
    Starfield,
}

impl Default for Background {
    fn default() -> Self {
        Background::Black
    }
}

/// Which side of the distance threshold the sun light is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LightingMode {
    /// Light rides with the camera, so the visible face is always lit.
    Near,
    /// Light is fixed in world space; the day/night terminator is visible.
    Far,
}

/// Notifications for the host UI. Drained once per frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GlobeEvent {
    LightingModeChanged { mode: LightingMode },
    GifCaptureFinished { frames: usize },
    TextureApplied { target: String },
    MoonAdded { id: String },
    MoonRemoved { id: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_channels() {
        let c = Color(0xff8000);
        let [r, g, b] = c.rgb();
        assert!((r - 1.0).abs() < 1e-6);
        assert!((g - 128.0 / 255.0).abs() < 1e-6);
        assert_eq!(b, 0.0);
    }

    #[test]
    fn color_hex_parse() {
        assert_eq!(Color::from_hex("#ffcc00"), Some(Color(0xffcc00)));
        assert_eq!(Color::from_hex("ccffcc"), Some(Color(0xccffcc)));
        assert_eq!(Color::from_hex("#fff"), None);
        assert_eq!(Color(0xcc).to_hex(), "#0000cc");
    }

    #[test]
    fn background_json_tagged() {
        let bg: Background = serde_json::from_str(r#"{"type":"color","color":255}"#).unwrap();
        assert_eq!(bg, Background::Color { color: Color(255) });
        let json = serde_json::to_string(&Background::Starfield).unwrap();
        assert_eq!(json, r#"{"type":"starfield"}"#);
    }
}
