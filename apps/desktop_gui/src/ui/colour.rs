//! CSS colour strings to egui colours.

use egui::Color32;

/// Accepts any CSS colour value: named colours, hex, `rgb()`/`rgba()`,
/// `hsl()`/`hsla()` and `hwb()`.
pub fn parse_css_colour(raw: &str) -> Option<Color32> {
    match csscolorparser::parse(raw) {
        Ok(colour) => {
            let [r, g, b, a] = colour.to_rgba8();
            Some(Color32::from_rgba_unmultiplied(r, g, b, a))
        }
        Err(err) => {
            tracing::debug!(raw, "not a css colour: {err}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_named_colours_case_insensitively() {
        assert_eq!(parse_css_colour("green"), Some(Color32::from_rgb(0, 128, 0)));
        assert_eq!(parse_css_colour(" Orange "), Some(Color32::from_rgb(255, 165, 0)));
        assert_eq!(parse_css_colour("grey"), parse_css_colour("gray"));
    }

    #[test]
    fn parses_the_full_named_colour_set() {
        assert_eq!(parse_css_colour("salmon"), Some(Color32::from_rgb(250, 128, 114)));
        assert_eq!(parse_css_colour("lightblue"), Some(Color32::from_rgb(173, 216, 230)));
        assert_eq!(
            parse_css_colour("darkolivegreen"),
            Some(Color32::from_rgb(85, 107, 47))
        );
        assert_eq!(parse_css_colour("tomato"), Some(Color32::from_rgb(255, 99, 71)));
    }

    #[test]
    fn parses_hex_forms() {
        assert_eq!(parse_css_colour("#f00"), Some(Color32::from_rgb(255, 0, 0)));
        assert_eq!(parse_css_colour("#00ff7f"), Some(Color32::from_rgb(0, 255, 127)));
        assert_eq!(
            parse_css_colour("#ffffff80"),
            Some(Color32::from_rgba_unmultiplied(255, 255, 255, 128))
        );
    }

    #[test]
    fn parses_functional_forms() {
        assert_eq!(
            parse_css_colour("rgb(10, 20, 30)"),
            Some(Color32::from_rgb(10, 20, 30))
        );
        assert_eq!(
            parse_css_colour("rgba(0,0,0,1)"),
            Some(Color32::from_rgba_unmultiplied(0, 0, 0, 255))
        );
        assert_eq!(
            parse_css_colour("hsl(0, 100%, 50%)"),
            Some(Color32::from_rgb(255, 0, 0))
        );
        assert!(parse_css_colour("hsl(120, 100%, 25%)").is_some());
    }

    #[test]
    fn rejects_unknown_values() {
        assert_eq!(parse_css_colour("undefined"), None);
        assert_eq!(parse_css_colour("#12"), None);
        assert_eq!(parse_css_colour("#zzzzzz"), None);
        assert_eq!(parse_css_colour("rgb(1,2)"), None);
        assert_eq!(parse_css_colour(""), None);
    }
}
