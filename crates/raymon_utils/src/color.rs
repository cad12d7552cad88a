use colored::*;

pub struct LogColors {}

impl LogColors {
    /// Ray's dashboard blue, #2D7FF9
    pub fn blue(text: &str) -> String {
        let blue = Color::TrueColor {
            r: 45,
            g: 127,
            b: 249,
        };

        text.color(blue).to_string()
    }

    pub fn green(text: &str) -> String {
        // #04cd9b
        let green = Color::TrueColor {
            r: 4,
            g: 205,
            b: 155,
        };

        text.color(green).to_string()
    }

    pub fn alert(text: &str) -> String {
        let red = Color::TrueColor { r: 255, g: 0, b: 0 };

        text.color(red).to_string()
    }
}
