//! Line framing: one compact JSON object per line.

use crate::event::BridgeEvent;

/// Serializes an event to one compact JSON line, including the trailing `\n`.
///
/// Compact serialization never contains a raw newline (newlines inside strings are
/// escaped), so one event is always exactly one line.
pub fn to_line(event: &BridgeEvent) -> Result<String, serde_json::Error> {
    let mut line = serde_json::to_string(event)?;
    line.push('\n');
    Ok(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{BridgeEvent, TokenUsage};

    #[test]
    fn end_line_matches_wire_order() {
        let event = BridgeEvent::End {
            success: true,
            content: "hello".to_string(),
            tool_calls: None,
            finish_reason: "stop".to_string(),
            token_usage: TokenUsage::new(2, 1, 3),
        };

        let line = to_line(&event).unwrap();

        assert_eq!(
            line,
            "{\"type\":\"end\",\"success\":true,\"content\":\"hello\",\"tool_calls\":null,\
             \"finish_reason\":\"stop\",\"token_usage\":{\"input_tokens\":2,\
             \"output_tokens\":1,\"total_tokens\":3}}\n"
        );
    }

    #[test]
    fn embedded_newlines_stay_on_one_line() {
        let event = BridgeEvent::Error {
            message: "line one\nline two".to_string(),
            traceback: "a\nb".to_string(),
            error_code: None,
        };

        let line = to_line(&event).unwrap();

        assert_eq!(line.matches('\n').count(), 1);
        assert!(line.ends_with('\n'));
    }

    #[test]
    fn ready_line_carries_message() {
        let line = to_line(&BridgeEvent::Ready {
            message: "OpenAI bridge ready".to_string(),
        })
        .unwrap();

        assert_eq!(
            line,
            "{\"type\":\"ready\",\"message\":\"OpenAI bridge ready\"}\n"
        );
    }
}
