//! Types for the entity lump and its key/value text grammar.
//!
//! The entities lump is plain text made of blocks:
//!
//! ```text
//! {
//! "classname" "light"
//! "origin" "128 64 24"
//! }
//! ```
//!
//! Everything outside `{ ... }` is ignored, including stray closing braces.
//! Inside a block, quoted strings pair up as key/value properties. Quotes have
//! no escape sequences; the string content is copied literally. A malformed or
//! unterminated token inside a block finalizes the current entity with the
//! properties parsed so far and resumes scanning after it, so one corrupt
//! entity does not discard the rest of the lump.
//!
//! Entity order and property order are preserved exactly as encountered;
//! downstream consumers match entities by position. Duplicate keys within an
//! entity are kept, and key lookup returns the first match.

/// A single key/value pair of an entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    /// Property key, e.g. `classname`
    pub key: String,
    /// Property value, copied literally from the lump text
    pub value: String,
}

/// One entity block from the entities lump.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entity {
    properties: Vec<Property>,
}

impl Entity {
    /// Number of properties on this entity.
    pub fn property_count(&self) -> usize {
        self.properties.len()
    }

    /// All properties in file order.
    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    /// Property at the given position, if it exists.
    pub fn property(&self, index: usize) -> Option<&Property> {
        self.properties.get(index)
    }

    /// Value of the first property with the given key, if any.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|property| property.key == key)
            .map(|property| property.value.as_str())
    }
}

// isspace() set of the C locale.
fn is_space(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | b'\r' | 0x0B | 0x0C)
}

struct Scanner<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn peek(&self) -> Option<u8> {
        self.buf.get(self.pos).copied()
    }

    fn bump(&mut self) {
        self.pos += 1;
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(is_space) {
            self.bump();
        }
    }

    /// Parse one quoted string. Returns `None` when the next non-whitespace
    /// byte is not a quote, or when the closing quote is missing; in the
    /// latter case the scanner is left at the end of the buffer.
    fn parse_quoted(&mut self) -> Option<String> {
        self.skip_whitespace();
        if self.peek() != Some(b'"') {
            return None;
        }
        self.bump();
        let start = self.pos;
        while self.peek().is_some_and(|byte| byte != b'"') {
            self.bump();
        }
        self.peek()?;
        let content = String::from_utf8_lossy(&self.buf[start..self.pos]).into_owned();
        self.bump();
        Some(content)
    }

    /// Parse the inside of a block, the opening `{` already consumed.
    fn parse_block(&mut self) -> Entity {
        let mut properties = Vec::with_capacity(8);
        loop {
            self.skip_whitespace();
            match self.peek() {
                None | Some(b'}') => break,
                Some(_) => {}
            }
            let Some(key) = self.parse_quoted() else {
                break;
            };
            let Some(value) = self.parse_quoted() else {
                break;
            };
            properties.push(Property { key, value });
        }
        if self.peek() == Some(b'}') {
            self.bump();
        }
        Entity { properties }
    }
}

/// Parse the raw bytes of the entities lump into entity records.
pub(crate) fn parse_entities(text: &[u8]) -> Vec<Entity> {
    let mut scanner = Scanner { buf: text, pos: 0 };
    let mut entities = Vec::with_capacity(16);

    while let Some(byte) = scanner.peek() {
        if byte == b'{' {
            scanner.bump();
            entities.push(scanner.parse_block());
        } else {
            scanner.bump();
        }
    }

    entities
}
