use serde::{Deserialize, Serialize};

// Colours and glyphs used to draw balls, tiles and labels
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    // One entry per ball kind: seven colours, then joker, bomb, brush and boom
    pub ball_colors: Vec<String>,
    pub ball_glyph: String,
    pub small_glyph: String,
    pub squashed_glyph: String,
    pub tile_color: String,
    pub text_color: String,
    pub accent_color: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            ball_colors: [
                "red",
                "green",
                "blue",
                "yellow",
                "magenta",
                "cyan",
                "#ff8800", // orange
                "white",   // joker
                "lightred", // bomb
                "lightmagenta", // brush
                "lightyellow", // boom
            ]
            .iter()
            .map(ToString::to_string)
            .collect(),
            ball_glyph: "██".to_string(),
            small_glyph: "▪".to_string(),
            squashed_glyph: "▄▄▄".to_string(),
            tile_color: "darkgray".to_string(),
            text_color: "white".to_string(),
            accent_color: "yellow".to_string(),
        }
    }
}
