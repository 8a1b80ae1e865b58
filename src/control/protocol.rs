//! Wire protocol for the external controller.
//!
//! Inbound messages are JSON objects with a `type` discriminator.
//! Decoding is total by design: anything malformed — not JSON, not an
//! object, missing/unknown `type`, missing payload field — becomes
//! [`Command::Unknown`], which applies as a no-op. The protocol never
//! errors on garbage input; it just does nothing observable.

use serde_json::Value;

/// Upper bound on a single inbound line.
pub const MAX_LINE_BYTES: usize = 64 * 1024;

/// A decoded controller command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Recolor the bag body.
    SetColor {
        /// CSS-style hex color string.
        color: String,
    },
    /// Replace the title text.
    SetTitle {
        /// New title, may be empty.
        title: String,
    },
    /// Replace the flavor text.
    SetFlavor {
        /// New flavor line, may be empty.
        flavor: String,
    },
    /// Switch the font family for every text channel.
    SetFont {
        /// Font family name.
        font: String,
    },
    /// Clear all text and restore the default color.
    Reset,
    /// Capture the current frame and reply with SCREENSHOT_RESULT.
    GetScreenshot,
    /// Anything unrecognized or malformed; ignored.
    Unknown,
}

/// Decode one inbound line. Total: never fails.
pub fn decode_command(line: &str) -> Command {
    match serde_json::from_str::<Value>(line) {
        Ok(value) => decode_value(&value),
        Err(_) => Command::Unknown,
    }
}

/// Decode an already-parsed JSON value. Total: never fails.
pub fn decode_value(value: &Value) -> Command {
    let Some(obj) = value.as_object() else {
        return Command::Unknown;
    };
    let Some(kind) = obj.get("type").and_then(|v| v.as_str()) else {
        return Command::Unknown;
    };

    let text_field = |key: &str| obj.get(key).and_then(|v| v.as_str()).map(str::to_string);

    match kind {
        "SET_COLOR" => match text_field("color") {
            Some(color) => Command::SetColor { color },
            None => Command::Unknown,
        },
        "SET_TITLE" => match text_field("title") {
            Some(title) => Command::SetTitle { title },
            None => Command::Unknown,
        },
        "SET_FLAVOR" => match text_field("flavor") {
            Some(flavor) => Command::SetFlavor { flavor },
            None => Command::Unknown,
        },
        "SET_FONT" => match text_field("font") {
            Some(font) => Command::SetFont { font },
            None => Command::Unknown,
        },
        "RESET" => Command::Reset,
        "GET_SCREENSHOT" => Command::GetScreenshot,
        _ => Command::Unknown,
    }
}

/// Build the outbound capture event.
pub fn event_screenshot_result(image: String) -> Value {
    let mut obj = serde_json::Map::new();
    obj.insert(
        "type".to_string(),
        Value::String("SCREENSHOT_RESULT".to_string()),
    );
    obj.insert("image".to_string(), Value::String(image));
    Value::Object(obj)
}
