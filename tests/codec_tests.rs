//! Tests for codecs
//!
//! These tests verify:
//! - Lightning text parsing (sections, lists, quoting, comments)
//! - Lightning writing and re-reading preserves types
//! - Malformed text is reported with a line number
//! - Binary framing validation (magic, version, length, CRC)

use dotkv::codec::{self, BinaryCodec, Codec, LightningCodec, HEADER_SIZE};
use dotkv::{DataMap, FormatSettings, StoreError, Value};

// =============================================================================
// Helper Functions
// =============================================================================

fn read_text(text: &str) -> dotkv::Result<DataMap> {
    LightningCodec.read(&mut text.as_bytes(), &FormatSettings::default())
}

fn write_text(data: &DataMap, settings: &FormatSettings) -> dotkv::Result<String> {
    let mut out = Vec::new();
    LightningCodec.write(&mut out, data, settings)?;
    Ok(String::from_utf8(out).unwrap())
}

fn nested(map: &DataMap, key: &str) -> DataMap {
    map.get(key).and_then(Value::as_map).cloned().unwrap()
}

// =============================================================================
// Lightning Read Tests
// =============================================================================

#[test]
fn test_read_empty_input() {
    assert!(read_text("").unwrap().is_empty());
    assert!(read_text("\n\n   \n# only a comment\n").unwrap().is_empty());
}

#[test]
fn test_read_scalars_infers_types() {
    let map = read_text(
        "name = dotkv\n\
         enabled = true\n\
         retries = 3\n\
         ratio = 0.75\n\
         greeting = hello world\n",
    )
    .unwrap();

    assert_eq!(map.get("name"), Some(&Value::from("dotkv")));
    assert_eq!(map.get("enabled"), Some(&Value::Bool(true)));
    assert_eq!(map.get("retries"), Some(&Value::Int(3)));
    assert_eq!(map.get("ratio"), Some(&Value::Float(0.75)));
    assert_eq!(map.get("greeting"), Some(&Value::from("hello world")));
}

#[test]
fn test_read_quoted_strings_stay_strings() {
    let map = read_text(
        "port = \"8080\"\n\
         padded = \"  spaced  \"\n\
         escaped = \"line\\nbreak \\\"quoted\\\"\"\n\
         empty = \"\"\n",
    )
    .unwrap();

    assert_eq!(map.get("port"), Some(&Value::from("8080")));
    assert_eq!(map.get("padded"), Some(&Value::from("  spaced  ")));
    assert_eq!(map.get("escaped"), Some(&Value::from("line\nbreak \"quoted\"")));
    assert_eq!(map.get("empty"), Some(&Value::from("")));
}

#[test]
fn test_read_sections_and_lists() {
    let text = "\
# server settings
server {
    host = localhost
    ports [
        - 80
        - 443
    ]
    tags []
    tls {
        enabled = false
    }
}
after = 1
";
    let map = read_text(text).unwrap();

    let server = nested(&map, "server");
    assert_eq!(server.get("host"), Some(&Value::from("localhost")));
    assert_eq!(server.get("ports"), Some(&Value::from(vec![80, 443])));
    assert_eq!(server.get("tags"), Some(&Value::List(Vec::new())));
    assert_eq!(
        nested(&server, "tls").get("enabled"),
        Some(&Value::Bool(false))
    );
    assert_eq!(map.get("after"), Some(&Value::Int(1)));
    assert_eq!(map.keys().collect::<Vec<_>>(), vec!["server", "after"]);
}

#[test]
fn test_read_value_containing_equals_sign() {
    let map = read_text("url = http://x?a=b\n").unwrap();
    assert_eq!(map.get("url"), Some(&Value::from("http://x?a=b")));
}

// =============================================================================
// Lightning Error Tests
// =============================================================================

fn parse_error_line(text: &str) -> usize {
    match read_text(text) {
        Err(StoreError::Parse { line, .. }) => line,
        other => panic!("expected parse error, got {:?}", other),
    }
}

#[test]
fn test_read_unclosed_section() {
    assert_eq!(parse_error_line("a = 1\nsection {\n  b = 2\n"), 2);
}

#[test]
fn test_read_unclosed_list() {
    assert_eq!(parse_error_line("items [\n  - 1\n"), 1);
}

#[test]
fn test_read_unexpected_closing_brace() {
    assert_eq!(parse_error_line("a = 1\n}\n"), 2);
}

#[test]
fn test_read_garbage_line() {
    assert_eq!(parse_error_line("a = 1\njust some words\n"), 2);
}

#[test]
fn test_read_bad_list_item() {
    assert_eq!(parse_error_line("items [\n  - 1\n  oops\n]\n"), 3);
}

#[test]
fn test_read_duplicate_key() {
    assert_eq!(parse_error_line("a = 1\nb = 2\na = 3\n"), 3);
}

#[test]
fn test_read_unterminated_quote() {
    assert_eq!(parse_error_line("a = \"open\n"), 1);
}

#[test]
fn test_read_invalid_key() {
    assert_eq!(parse_error_line("a.b = 1\n"), 1);
}

// =============================================================================
// Lightning Write Tests
// =============================================================================

#[test]
fn test_write_layout() {
    let mut server = DataMap::new();
    server.insert("host", "localhost");
    server.insert("ports", vec![80, 443]);
    server.insert("tags", Vec::<Value>::new());
    let mut root = DataMap::new();
    root.insert("name", "dotkv");
    root.insert("server", server);

    let text = write_text(&root, &FormatSettings { indent: 2, sync_on_write: false }).unwrap();

    assert_eq!(
        text,
        "name = dotkv\n\
         server {\n\
         \x20 host = localhost\n\
         \x20 ports [\n\
         \x20   - 80\n\
         \x20   - 443\n\
         \x20 ]\n\
         \x20 tags []\n\
         }\n"
    );
}

#[test]
fn test_write_then_read_preserves_types() {
    let mut root = DataMap::new();
    root.insert("int", 42);
    root.insert("negative", -7);
    root.insert("float", 1.0);
    root.insert("bool", true);
    root.insert("text", "hello world");
    root.insert("numeric_text", "42");
    root.insert("bool_text", "false");
    root.insert("padded", "  x  ");
    root.insert("empty", "");
    root.insert("multiline", "a\nb");
    root.insert("quote_start", "\"quoted");
    root.insert("mixed", vec![Value::from("1"), Value::Int(1), Value::Bool(true)]);

    let text = write_text(&root, &FormatSettings::default()).unwrap();
    let back = read_text(&text).unwrap();

    assert_eq!(back, root);
    assert_eq!(back.get("float"), Some(&Value::Float(1.0)));
    assert_eq!(back.get("numeric_text"), Some(&Value::from("42")));
}

#[test]
fn test_write_rejects_container_inside_list() {
    let mut root = DataMap::new();
    root.insert("bad", Value::List(vec![Value::Map(DataMap::new())]));

    let err = write_text(&root, &FormatSettings::default()).unwrap_err();
    assert!(matches!(err, StoreError::Serialization(_)));
}

#[test]
fn test_write_rejects_unwritable_key() {
    let mut root = DataMap::new();
    root.insert("has = sign", 1);

    let err = write_text(&root, &FormatSettings::default()).unwrap_err();
    assert!(matches!(err, StoreError::Serialization(_)));
}

// =============================================================================
// Binary Codec Tests
// =============================================================================

fn sample_map() -> DataMap {
    let mut inner = DataMap::new();
    inner.insert("port", 8080);
    inner.insert("hosts", vec!["a", "b"]);
    let mut root = DataMap::new();
    root.insert("name", "dotkv");
    root.insert("ratio", 0.5);
    root.insert("server", inner);
    root
}

#[test]
fn test_binary_write_then_read() {
    let map = sample_map();

    let mut bytes = Vec::new();
    BinaryCodec
        .write(&mut bytes, &map, &FormatSettings::default())
        .unwrap();
    let back = BinaryCodec
        .read(&mut bytes.as_slice(), &FormatSettings::default())
        .unwrap();

    assert_eq!(back, map);
    assert_eq!(back.keys().collect::<Vec<_>>(), vec!["name", "ratio", "server"]);
}

#[test]
fn test_binary_empty_input_is_empty_map() {
    let back = BinaryCodec
        .read(&mut (&[] as &[u8]), &FormatSettings::default())
        .unwrap();
    assert!(back.is_empty());
}

#[test]
fn test_binary_header_layout() {
    let bytes = codec::encode(&sample_map()).unwrap();

    assert_eq!(&bytes[0..4], &codec::MAGIC);
    assert_eq!(u16::from_be_bytes([bytes[4], bytes[5]]), codec::VERSION);
    let len = u32::from_be_bytes([bytes[6], bytes[7], bytes[8], bytes[9]]) as usize;
    assert_eq!(bytes.len(), HEADER_SIZE + len);
}

#[test]
fn test_binary_detects_flipped_payload_bit() {
    let mut bytes = codec::encode(&sample_map()).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0x01;

    let err = codec::decode(&bytes).unwrap_err();
    assert!(matches!(err, StoreError::Corruption(ref msg) if msg.contains("CRC")));
}

#[test]
fn test_binary_detects_bad_magic() {
    let mut bytes = codec::encode(&sample_map()).unwrap();
    bytes[0] = b'X';

    assert!(matches!(codec::decode(&bytes), Err(StoreError::Corruption(_))));
}

#[test]
fn test_binary_detects_truncation() {
    let bytes = codec::encode(&sample_map()).unwrap();

    assert!(matches!(
        codec::decode(&bytes[..bytes.len() - 3]),
        Err(StoreError::Corruption(_))
    ));
    assert!(matches!(
        codec::decode(&bytes[..5]),
        Err(StoreError::Corruption(_))
    ));
}

#[test]
fn test_binary_rejects_text_file() {
    let err = BinaryCodec
        .read(&mut "name = dotkv\n".as_bytes(), &FormatSettings::default())
        .unwrap_err();
    assert!(matches!(err, StoreError::Corruption(_)));
}
