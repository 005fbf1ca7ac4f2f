use regex::Regex;

/// Default separator class: whitespace, period, comma and semicolon.
pub const DEFAULT_SEPARATOR_CLASS: &str = r"[.,;\s]";

/// Character class marking valid match boundaries.
#[derive(Debug, Clone)]
pub struct Separator {
    class: Regex,
}

impl Separator {
    /// Build from a regex describing a single character, e.g. `[.,;\s]`.
    pub fn new(class: &str) -> Result<Self, regex::Error> {
        let class = Regex::new(&format!("^(?:{class})$"))?;
        Ok(Self { class })
    }

    pub fn is_separator(&self, c: char) -> bool {
        let mut buf = [0u8; 4];
        self.class.is_match(c.encode_utf8(&mut buf))
    }

    /// Empty text does not start with a separator.
    pub fn starts_with(&self, text: &str) -> bool {
        text.chars().next().is_some_and(|c| self.is_separator(c))
    }

    /// Empty text does not end with a separator.
    pub fn ends_with(&self, text: &str) -> bool {
        text.chars().next_back().is_some_and(|c| self.is_separator(c))
    }
}

impl Default for Separator {
    fn default() -> Self {
        Self::new(DEFAULT_SEPARATOR_CLASS).expect("Invalid default separator class")
    }
}
