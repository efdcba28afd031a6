//! JSON body formatting helper.

use tracing::debug;

use crate::sink::LogSink;

/// Line appended to the sink when the JSON body does not parse.
pub const INVALID_JSON_MESSAGE: &str = "Invalid JSON on Input Sample";

/// Pretty-print a JSON body.
///
/// Returns the indented form when `input` parses. Blank input becomes `null`
/// without a log line. Anything else that fails to parse appends
/// [`INVALID_JSON_MESSAGE`] to `sink` and is returned unchanged. Key order is
/// kept as written.
pub fn pretty_print_json(input: &str, sink: &dyn LogSink) -> String {
    if input.trim().is_empty() {
        return serde_json::Value::Null.to_string();
    }

    let formatted = serde_json::from_str::<serde_json::Value>(input)
        .and_then(|value| serde_json::to_string_pretty(&value));

    match formatted {
        Ok(pretty) => pretty,
        Err(e) => {
            debug!(error = %e, "JSON body did not parse");
            sink.append(INVALID_JSON_MESSAGE.to_string());
            input.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;

    #[test]
    fn test_valid_json_is_indented() {
        let sink = MemorySink::new();
        let pretty = pretty_print_json(r#"{"a":1}"#, &sink);

        assert_eq!(pretty, "{\n  \"a\": 1\n}");
        assert!(sink.lines().is_empty());
    }

    #[test]
    fn test_key_order_is_preserved() {
        let sink = MemorySink::new();
        let pretty = pretty_print_json(r#"{"z":1,"a":{"y":[1,2],"b":null}}"#, &sink);

        let z = pretty.find("\"z\"").unwrap();
        let a = pretty.find("\"a\"").unwrap();
        let y = pretty.find("\"y\"").unwrap();
        let b = pretty.find("\"b\"").unwrap();
        assert!(z < a && y < b);
        assert!(pretty.lines().count() > 1);
    }

    #[test]
    fn test_invalid_json_is_left_unchanged() {
        let sink = MemorySink::new();
        let output = pretty_print_json("{a:", &sink);

        assert_eq!(output, "{a:");
        assert_eq!(sink.lines(), vec!["Invalid JSON on Input Sample"]);
    }

    #[test]
    fn test_blank_input_becomes_null_silently() {
        let sink = MemorySink::new();
        assert_eq!(pretty_print_json("", &sink), "null");
        assert_eq!(pretty_print_json("  \n\t", &sink), "null");
        assert!(sink.lines().is_empty());
    }
}
