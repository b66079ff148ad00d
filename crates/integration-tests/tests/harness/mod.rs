//! Shared fixtures for end-to-end tests
#![allow(dead_code)]

pub mod config;
pub mod mock_backend;
pub mod server;

/// Split a raw event-stream body into its frames
pub fn frames(body: &str) -> Vec<&str> {
    body.split_terminator("\n\n").collect()
}

/// Event type of a frame, or the raw frame for the terminator
pub fn event_type(frame: &str) -> &str {
    frame
        .strip_prefix("event: ")
        .and_then(|rest| rest.lines().next())
        .unwrap_or(frame)
}

/// Decoded `data:` payload of a frame
pub fn event_data(frame: &str) -> serde_json::Value {
    let line = frame
        .lines()
        .find_map(|line| line.strip_prefix("data: "))
        .expect("frame has a data line");
    serde_json::from_str(line).expect("data line is JSON")
}

/// Body text received before the stream ended, and whether it ended with a
/// transport error instead of a clean close
pub async fn drain_body(resp: reqwest::Response) -> (String, bool) {
    use futures_util::StreamExt;

    let mut received = String::new();
    let mut body = resp.bytes_stream();
    while let Some(chunk) = body.next().await {
        match chunk {
            Ok(bytes) => received.push_str(&String::from_utf8_lossy(&bytes)),
            Err(_) => return (received, true),
        }
    }
    (received, false)
}
