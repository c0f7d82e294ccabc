//! Lightning text codec
//!
//! ## Format
//! ```text
//! # comments and blank lines are skipped
//! name = dotkv
//! padded = "  kept  "
//! server {
//!     port = 8080
//!     hosts [
//!         - alpha
//!         - beta
//!     ]
//!     tags []
//! }
//! ```
//!
//! Unquoted scalars are inferred (`true`/`false`, integer, float, string).
//! The writer quotes any string that would otherwise read back as a
//! different type or lose whitespace. Comments are not round-tripped: the
//! store rewrites the whole file on every change.

use std::io::{Read, Write};

use crate::config::FormatSettings;
use crate::data::DataMap;
use crate::error::{Result, StoreError};
use crate::value::Value;

use super::Codec;

/// Characters that can never appear in a key
const RESERVED_KEY_CHARS: [char; 9] = ['.', '=', '{', '}', '[', ']', '"', '\n', '\r'];

/// Indented text codec
#[derive(Debug, Clone, Copy, Default)]
pub struct LightningCodec;

impl Codec for LightningCodec {
    fn name(&self) -> &'static str {
        "lightning"
    }

    fn read(&self, reader: &mut dyn Read, _settings: &FormatSettings) -> Result<DataMap> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        parse(&text)
    }

    fn write(
        &self,
        writer: &mut dyn Write,
        data: &DataMap,
        settings: &FormatSettings,
    ) -> Result<()> {
        let mut out = String::new();
        write_layer(&mut out, data, 0, settings.indent)?;
        writer.write_all(out.as_bytes())?;
        Ok(())
    }
}

// =============================================================================
// Parsing
// =============================================================================

/// An open `{` or `[` block
enum Frame {
    Section { key: String, map: DataMap, line: usize },
    List { key: String, items: Vec<Value>, line: usize },
}

fn parse_error(line: usize, message: impl Into<String>) -> StoreError {
    StoreError::Parse {
        line,
        message: message.into(),
    }
}

fn parse(text: &str) -> Result<DataMap> {
    let mut root = DataMap::new();
    let mut stack: Vec<Frame> = Vec::new();

    for (idx, raw_line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if matches!(stack.last(), Some(Frame::List { .. })) {
            if line == "]" {
                if let Some(Frame::List { key, items, .. }) = stack.pop() {
                    attach(&mut root, &mut stack, key, Value::List(items), line_no)?;
                }
            } else if let Some(rest) = line.strip_prefix('-') {
                let item = parse_scalar(rest.trim_start(), line_no)?;
                if let Some(Frame::List { items, .. }) = stack.last_mut() {
                    items.push(item);
                }
            } else {
                return Err(parse_error(line_no, "expected '- item' or ']' inside a list"));
            }
            continue;
        }

        if line == "}" {
            match stack.pop() {
                Some(Frame::Section { key, map, .. }) => {
                    attach(&mut root, &mut stack, key, Value::Map(map), line_no)?
                }
                _ => return Err(parse_error(line_no, "unexpected '}'")),
            }
        } else if let Some((key, raw)) = line.split_once('=') {
            let key = parse_key(key.trim(), line_no)?;
            let value = parse_scalar(raw.trim(), line_no)?;
            attach(&mut root, &mut stack, key, value, line_no)?;
        } else if let Some(key) = line.strip_suffix("[]") {
            let key = parse_key(key.trim(), line_no)?;
            attach(&mut root, &mut stack, key, Value::List(Vec::new()), line_no)?;
        } else if let Some(key) = line.strip_suffix('[') {
            stack.push(Frame::List {
                key: parse_key(key.trim(), line_no)?,
                items: Vec::new(),
                line: line_no,
            });
        } else if let Some(key) = line.strip_suffix('{') {
            stack.push(Frame::Section {
                key: parse_key(key.trim(), line_no)?,
                map: DataMap::new(),
                line: line_no,
            });
        } else {
            return Err(parse_error(
                line_no,
                "expected 'key = value', 'key {' or 'key ['",
            ));
        }
    }

    match stack.last() {
        Some(Frame::Section { key, line, .. }) => Err(parse_error(
            *line,
            format!("section '{}' is never closed", key),
        )),
        Some(Frame::List { key, line, .. }) => Err(parse_error(
            *line,
            format!("list '{}' is never closed", key),
        )),
        None => Ok(root),
    }
}

/// Insert a finished entry into the innermost open section (or the root)
fn attach(
    root: &mut DataMap,
    stack: &mut [Frame],
    key: String,
    value: Value,
    line: usize,
) -> Result<()> {
    let target = match stack.last_mut() {
        Some(Frame::Section { map, .. }) => map,
        Some(Frame::List { .. }) => {
            return Err(parse_error(line, "containers are not allowed inside a list"))
        }
        None => root,
    };

    if target.contains_key(&key) {
        return Err(parse_error(line, format!("duplicate key '{}'", key)));
    }
    target.insert(key, value);
    Ok(())
}

fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key.trim() == key
        && !key.starts_with('#')
        && !key.chars().any(|c| RESERVED_KEY_CHARS.contains(&c))
}

fn parse_key(key: &str, line: usize) -> Result<String> {
    if is_valid_key(key) {
        Ok(key.to_string())
    } else {
        Err(parse_error(line, format!("invalid key '{}'", key)))
    }
}

fn parse_scalar(raw: &str, line: usize) -> Result<Value> {
    if !raw.starts_with('"') {
        return Ok(Value::infer(raw));
    }
    if raw.len() < 2 || !raw.ends_with('"') {
        return Err(parse_error(line, "unterminated string"));
    }
    unescape(&raw[1..raw.len() - 1], line).map(Value::Str)
}

fn unescape(inner: &str, line: usize) -> Result<String> {
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some(other) => {
                return Err(parse_error(line, format!("unknown escape '\\{}'", other)))
            }
            None => return Err(parse_error(line, "dangling '\\' at end of string")),
        }
    }

    Ok(out)
}

// =============================================================================
// Writing
// =============================================================================

fn write_layer(out: &mut String, layer: &DataMap, depth: usize, indent: usize) -> Result<()> {
    let pad = " ".repeat(depth * indent);

    for (key, value) in layer.iter() {
        if !is_valid_key(key) {
            return Err(StoreError::Serialization(format!(
                "key '{}' cannot be written in lightning format",
                key
            )));
        }

        match value {
            Value::Map(child) => {
                out.push_str(&format!("{}{} {{\n", pad, key));
                write_layer(out, child, depth + 1, indent)?;
                out.push_str(&format!("{}}}\n", pad));
            }
            Value::List(items) if items.is_empty() => {
                out.push_str(&format!("{}{} []\n", pad, key));
            }
            Value::List(items) => {
                let item_pad = " ".repeat((depth + 1) * indent);
                out.push_str(&format!("{}{} [\n", pad, key));
                for item in items {
                    out.push_str(&format!("{}- {}\n", item_pad, format_scalar(key, item)?));
                }
                out.push_str(&format!("{}]\n", pad));
            }
            scalar => {
                out.push_str(&format!("{}{} = {}\n", pad, key, format_scalar(key, scalar)?));
            }
        }
    }

    Ok(())
}

fn format_scalar(key: &str, value: &Value) -> Result<String> {
    match value {
        Value::Bool(_) | Value::Int(_) | Value::Float(_) => Ok(value.to_string()),
        Value::Str(s) if needs_quotes(s) => Ok(quote(s)),
        Value::Str(s) => Ok(s.clone()),
        Value::List(_) | Value::Map(_) => Err(StoreError::Serialization(format!(
            "list '{}' contains a {}; only scalars are allowed in lists",
            key,
            value.type_name()
        ))),
    }
}

/// Whether a bare string would read back differently
fn needs_quotes(s: &str) -> bool {
    s.is_empty()
        || s.trim() != s
        || s.starts_with('"')
        || s.contains(['\n', '\r'])
        || !matches!(Value::infer(s), Value::Str(_))
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}
