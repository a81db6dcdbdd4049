use eframe::egui::Color32;

pub trait ColorExt {
    fn from_hex(hex: &str) -> Option<Self>
    where
        Self: Sized;

    /// Hex parse with a neutral gray fallback, for server-supplied or
    /// table-driven status colors.
    fn from_hex_or_gray(hex: &str) -> Self;
}

impl ColorExt for Color32 {
    fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if hex.len() != 6 {
            return None;
        }

        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

        Some(Color32::from_rgb(r, g, b))
    }

    fn from_hex_or_gray(hex: &str) -> Self {
        Self::from_hex(hex).unwrap_or(Color32::from_rgb(108, 117, 125))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_status_badge_colors() {
        assert_eq!(
            Color32::from_hex("#28a745"),
            Some(Color32::from_rgb(40, 167, 69))
        );
        assert_eq!(Color32::from_hex("28a745"), Some(Color32::from_rgb(40, 167, 69)));
        assert_eq!(Color32::from_hex("#zzz"), None);
        assert_eq!(
            Color32::from_hex_or_gray("bogus"),
            Color32::from_rgb(108, 117, 125)
        );
    }
}
