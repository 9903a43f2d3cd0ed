/// Key identity as seen by the controller. Modifiers are not represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// A printable key, lowercased.
    Char(char),
    Other,
}

impl Key {
    /// Builds a key from the text a key press produced. Anything other than exactly
    /// one character (named keys, dead keys, IME compositions) becomes [`Key::Other`].
    pub fn from_text(text: &str) -> Self {
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Key::from(c),
            _ => Key::Other,
        }
    }

    pub fn is_char(&self, c: char) -> bool {
        *self == Key::from(c)
    }
}

impl From<char> for Key {
    fn from(c: char) -> Self {
        let mut lower = c.to_lowercase();
        match (lower.next(), lower.next()) {
            (Some(l), None) => Key::Char(l),
            _ => Key::Char(c),
        }
    }
}
