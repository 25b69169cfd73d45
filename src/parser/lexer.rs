//! Pull tokenizer for content streams.
//!
//! The executor drives this lexer one token at a time: operand objects are
//! accumulated, an operator token triggers dispatch. Inline images
//! (`BI ... ID ... EI`) are folded into a single token because their data
//! bytes are not tokenizable.

use bytes::Bytes;

use crate::error::{EngineError, Result};
use crate::model::objects::{Dict, Object};

/// A lexical unit of a content stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// An operand: number, string, name, array, dictionary, boolean, null.
    Object(Object),
    /// An operator keyword such as `q`, `cm`, `Tj`.
    Operator(String),
    /// An inline image with its expanded parameter dictionary and raw data.
    InlineImage { dict: Dict, data: Bytes },
}

/// Outcome of reading one raw token, before inline-image folding.
enum Raw {
    Object(Object),
    Operator(String),
}

/// Tokenizer over the concatenated segments of a content stream.
pub struct ContentLexer {
    data: Vec<u8>,
    pos: usize,
}

impl ContentLexer {
    /// Creates a lexer over one or more stream segments, treated as a single
    /// concatenated stream.
    pub fn new(segments: Vec<Bytes>) -> Self {
        let total = segments.iter().map(Bytes::len).sum();
        let mut data = Vec::with_capacity(total);
        for segment in &segments {
            data.extend_from_slice(segment);
        }
        Self { data, pos: 0 }
    }

    pub fn from_slice(data: &[u8]) -> Self {
        Self {
            data: data.to_vec(),
            pos: 0,
        }
    }

    /// Returns the next token, or `None` at end of stream.
    pub fn next_token(&mut self) -> Result<Option<Token>> {
        self.skip_whitespace();
        if self.at_end() {
            return Ok(None);
        }
        match self.read_raw()? {
            Raw::Object(obj) => Ok(Some(Token::Object(obj))),
            Raw::Operator(name) => {
                if name == "BI" {
                    self.read_inline_image().map(Some)
                } else {
                    Ok(Some(Token::Operator(name)))
                }
            }
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.data.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    fn err(&self, msg: impl Into<String>) -> EngineError {
        EngineError::Lexer {
            pos: self.pos,
            msg: msg.into(),
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            if is_whitespace(b) {
                self.pos += 1;
            } else if b == b'%' {
                while let Some(b) = self.bump() {
                    if b == b'\r' || b == b'\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    fn read_raw(&mut self) -> Result<Raw> {
        let b = self.peek().ok_or_else(|| self.err("unexpected end"))?;
        match b {
            b'/' => self.parse_name().map(|n| Raw::Object(Object::Name(n))),
            b'(' => self
                .parse_literal_string()
                .map(|s| Raw::Object(Object::String(s))),
            b'<' => {
                if self.peek_at(1) == Some(b'<') {
                    self.pos += 2;
                    self.parse_dict().map(|d| Raw::Object(Object::Dict(d)))
                } else {
                    self.parse_hex_string()
                        .map(|s| Raw::Object(Object::String(s)))
                }
            }
            b'[' => self.parse_array().map(|a| Raw::Object(Object::Array(a))),
            b'+' | b'-' | b'.' | b'0'..=b'9' => self.parse_number().map(Raw::Object),
            b')' | b'>' | b']' | b'{' | b'}' => {
                Err(self.err(format!("unexpected delimiter {:?}", b as char)))
            }
            _ => Ok(self.parse_keyword()),
        }
    }

    fn parse_name(&mut self) -> Result<String> {
        self.pos += 1; // '/'
        let mut name = Vec::with_capacity(16);
        while let Some(b) = self.peek() {
            if is_whitespace(b) || is_delimiter(b) {
                break;
            }
            if b == b'#' {
                let high = self.peek_at(1).and_then(hex_value);
                let low = self.peek_at(2).and_then(hex_value);
                if let (Some(h), Some(l)) = (high, low) {
                    self.pos += 3;
                    name.push((h << 4) | l);
                    continue;
                }
            }
            name.push(b);
            self.pos += 1;
        }
        Ok(String::from_utf8_lossy(&name).into_owned())
    }

    fn parse_number(&mut self) -> Result<Object> {
        let start = self.pos;
        let mut negative = false;
        match self.peek() {
            Some(b'-') => {
                negative = true;
                self.pos += 1;
            }
            Some(b'+') => self.pos += 1,
            _ => {}
        }

        let mut int_part: i64 = 0;
        let mut digits = 0u32;
        while let Some(b @ b'0'..=b'9') = self.peek() {
            int_part = int_part
                .saturating_mul(10)
                .saturating_add(i64::from(b - b'0'));
            digits += 1;
            self.pos += 1;
        }

        if self.peek() != Some(b'.') {
            if digits == 0 {
                return Err(EngineError::Lexer {
                    pos: start,
                    msg: "invalid number".to_string(),
                });
            }
            return Ok(Object::Int(if negative { -int_part } else { int_part }));
        }

        self.pos += 1; // '.'
        let mut frac: f64 = 0.0;
        let mut scale = 0.1;
        let mut frac_digits = 0u32;
        while let Some(b @ b'0'..=b'9') = self.peek() {
            frac += f64::from(b - b'0') * scale;
            scale *= 0.1;
            frac_digits += 1;
            self.pos += 1;
        }
        if digits == 0 && frac_digits == 0 {
            return Err(EngineError::Lexer {
                pos: start,
                msg: "invalid number".to_string(),
            });
        }
        let mut value = int_part as f64 + frac;
        if negative {
            value = -value;
        }
        Ok(Object::Real(value))
    }

    fn parse_literal_string(&mut self) -> Result<Vec<u8>> {
        self.pos += 1; // '('
        let mut result = Vec::with_capacity(32);
        let mut depth = 1;
        loop {
            match self.bump() {
                Some(b'(') => {
                    depth += 1;
                    result.push(b'(');
                }
                Some(b')') => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(result);
                    }
                    result.push(b')');
                }
                Some(b'\\') => match self.bump() {
                    Some(b'n') => result.push(b'\n'),
                    Some(b'r') => result.push(b'\r'),
                    Some(b't') => result.push(b'\t'),
                    Some(b'b') => result.push(0x08),
                    Some(b'f') => result.push(0x0c),
                    Some(b'\r') => {
                        // line continuation; \r\n counts as one EOL
                        if self.peek() == Some(b'\n') {
                            self.pos += 1;
                        }
                    }
                    Some(b'\n') => {}
                    Some(c @ b'0'..=b'7') => {
                        let mut octal = u32::from(c - b'0');
                        for _ in 0..2 {
                            match self.peek() {
                                Some(d @ b'0'..=b'7') => {
                                    octal = octal * 8 + u32::from(d - b'0');
                                    self.pos += 1;
                                }
                                _ => break,
                            }
                        }
                        result.push((octal & 0xff) as u8);
                    }
                    Some(c) => result.push(c),
                    None => return Err(self.err("unterminated string")),
                },
                Some(c) => result.push(c),
                None => return Err(self.err("unterminated string")),
            }
        }
    }

    fn parse_hex_string(&mut self) -> Result<Vec<u8>> {
        self.pos += 1; // '<'
        let mut result = Vec::new();
        let mut pending: Option<u8> = None;
        loop {
            match self.bump() {
                Some(b'>') => break,
                Some(c) if is_whitespace(c) => {}
                Some(c) => match hex_value(c) {
                    Some(nibble) => {
                        if let Some(high) = pending.take() {
                            result.push((high << 4) | nibble);
                        } else {
                            pending = Some(nibble);
                        }
                    }
                    None => return Err(self.err("invalid hex digit")),
                },
                None => return Err(self.err("unterminated hex string")),
            }
        }
        // an odd final digit is the high nibble of a trailing byte
        if let Some(high) = pending {
            result.push(high << 4);
        }
        Ok(result)
    }

    fn parse_array(&mut self) -> Result<Vec<Object>> {
        self.pos += 1; // '['
        let mut items = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => return Err(self.err("unterminated array")),
                Some(b']') => {
                    self.pos += 1;
                    return Ok(items);
                }
                _ => match self.read_raw()? {
                    Raw::Object(obj) => items.push(obj),
                    Raw::Operator(op) => {
                        return Err(self.err(format!("operator {op} inside array")))
                    }
                },
            }
        }
    }

    fn parse_dict(&mut self) -> Result<Dict> {
        let mut dict = Dict::new();
        loop {
            self.skip_whitespace();
            if self.at_end() {
                return Err(self.err("unterminated dictionary"));
            }
            if self.peek() == Some(b'>') && self.peek_at(1) == Some(b'>') {
                self.pos += 2;
                return Ok(dict);
            }
            let key = match self.read_raw()? {
                Raw::Object(Object::Name(name)) => name,
                _ => return Err(self.err("dictionary key is not a name")),
            };
            self.skip_whitespace();
            let value = match self.read_raw()? {
                Raw::Object(obj) => obj,
                Raw::Operator(op) => {
                    return Err(self.err(format!("operator {op} as dictionary value")))
                }
            };
            dict.insert(key, value);
        }
    }

    fn parse_keyword(&mut self) -> Raw {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if is_whitespace(b) || is_delimiter(b) {
                break;
            }
            self.pos += 1;
        }
        let bytes = &self.data[start..self.pos];
        match bytes {
            b"true" => Raw::Object(Object::Bool(true)),
            b"false" => Raw::Object(Object::Bool(false)),
            b"null" => Raw::Object(Object::Null),
            _ => Raw::Operator(String::from_utf8_lossy(bytes).into_owned()),
        }
    }

    /// Reads the dictionary and data of an inline image; `BI` has already
    /// been consumed.
    fn read_inline_image(&mut self) -> Result<Token> {
        let mut dict = Dict::new();
        loop {
            self.skip_whitespace();
            if self.at_end() {
                return Err(self.err("unterminated inline image"));
            }
            match self.read_raw()? {
                Raw::Operator(op) if op == "ID" => break,
                Raw::Object(Object::Name(key)) => {
                    self.skip_whitespace();
                    let value = match self.read_raw()? {
                        Raw::Object(obj) => obj,
                        Raw::Operator(op) => {
                            return Err(self.err(format!("operator {op} in image dictionary")))
                        }
                    };
                    dict.insert(key, value);
                }
                _ => return Err(self.err("malformed inline image dictionary")),
            }
        }

        // a single whitespace byte separates ID from the data
        if matches!(self.peek(), Some(b) if is_whitespace(b)) {
            self.pos += 1;
        }

        let ascii85 = has_ascii85_filter(&dict);
        let marker: &[u8] = if ascii85 { b"~>" } else { b"EI" };
        let data = self.read_to_marker(marker)?;
        if ascii85 {
            // consume the EI that closes the image after the ~> terminator
            self.skip_whitespace();
            if self.data[self.pos..].starts_with(b"EI") {
                self.pos += 2;
            }
        }
        Ok(Token::InlineImage { dict, data })
    }

    fn read_to_marker(&mut self, marker: &[u8]) -> Result<Bytes> {
        let start = self.pos;
        let mut i = self.pos;
        while i + marker.len() <= self.data.len() {
            if &self.data[i..i + marker.len()] == marker {
                let after = self.data.get(i + marker.len()).copied();
                if after.map_or(true, |b| is_whitespace(b) || is_delimiter(b)) {
                    let mut end = i;
                    while end > start && is_whitespace(self.data[end - 1]) {
                        end -= 1;
                    }
                    self.pos = i + marker.len();
                    return Ok(Bytes::copy_from_slice(&self.data[start..end]));
                }
            }
            i += 1;
        }
        Err(self.err("inline image data missing end marker"))
    }
}

const fn is_whitespace(b: u8) -> bool {
    matches!(b, b'\x00' | b'\t' | b'\n' | b'\x0c' | b'\r' | b' ')
}

const fn is_delimiter(b: u8) -> bool {
    matches!(
        b,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

const fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

fn has_ascii85_filter(dict: &Dict) -> bool {
    let filter = dict.get("F").or_else(|| dict.get("Filter"));
    let is_a85 = |name: &str| name == "A85" || name == "ASCII85Decode";
    match filter {
        Some(Object::Name(name)) => is_a85(name),
        Some(Object::Array(items)) => matches!(items.first(), Some(Object::Name(name)) if is_a85(name)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(data: &[u8]) -> Vec<Token> {
        let mut lexer = ContentLexer::from_slice(data);
        let mut tokens = Vec::new();
        while let Some(token) = lexer.next_token().expect("tokenize") {
            tokens.push(token);
        }
        tokens
    }

    #[test]
    fn test_basic_tokens() {
        let tokens = collect(b"BT /F1 12 Tf (Hi) Tj ET");
        assert_eq!(
            tokens,
            vec![
                Token::Operator("BT".to_string()),
                Token::Object(Object::Name("F1".to_string())),
                Token::Object(Object::Int(12)),
                Token::Operator("Tf".to_string()),
                Token::Object(Object::String(b"Hi".to_vec())),
                Token::Operator("Tj".to_string()),
                Token::Operator("ET".to_string()),
            ]
        );
    }

    #[test]
    fn test_negative_reals_and_star_operators() {
        let tokens = collect(b"-1.5 .25 W* f*");
        assert_eq!(
            tokens,
            vec![
                Token::Object(Object::Real(-1.5)),
                Token::Object(Object::Real(0.25)),
                Token::Operator("W*".to_string()),
                Token::Operator("f*".to_string()),
            ]
        );
    }

    #[test]
    fn test_hex_string_pads_odd_digit() {
        let tokens = collect(b"<48 65 6C 6C 6F> <4F3> Tj");
        assert_eq!(
            tokens,
            vec![
                Token::Object(Object::String(b"Hello".to_vec())),
                Token::Object(Object::String(vec![0x4f, 0x30])),
                Token::Operator("Tj".to_string()),
            ]
        );
    }

    #[test]
    fn test_nested_array_with_mixed_elements() {
        let tokens = collect(b"[ (A) -120 (B) [1 2] ] TJ");
        assert_eq!(
            tokens,
            vec![
                Token::Object(Object::Array(vec![
                    Object::String(b"A".to_vec()),
                    Object::Int(-120),
                    Object::String(b"B".to_vec()),
                    Object::Array(vec![Object::Int(1), Object::Int(2)]),
                ])),
                Token::Operator("TJ".to_string()),
            ]
        );
    }

    #[test]
    fn test_comment_skipped_to_eol() {
        let tokens = collect(b"q % save state\nQ");
        assert_eq!(
            tokens,
            vec![
                Token::Operator("q".to_string()),
                Token::Operator("Q".to_string()),
            ]
        );
    }

    #[test]
    fn test_inline_image_folds_to_single_token() {
        let tokens = collect(b"BI /W 2 /H 2 /BPC 8 ID \x00\x01\x02\x03 EI Q");
        assert_eq!(tokens.len(), 2);
        match &tokens[0] {
            Token::InlineImage { dict, data } => {
                assert_eq!(dict.get("W"), Some(&Object::Int(2)));
                assert_eq!(data.as_ref(), b"\x00\x01\x02\x03");
            }
            other => panic!("expected inline image, got {other:?}"),
        }
        assert_eq!(tokens[1], Token::Operator("Q".to_string()));
    }
}
