pub const STYLE_CSS: &str = include_str!("../../static/style.css");
