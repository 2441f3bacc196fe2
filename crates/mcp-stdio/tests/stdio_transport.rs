//! Integration tests for the stdio transport using in-memory pipes.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mcp_stdio::{CallToolResult, ErrorData, Handler, Implementation, Tool};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

struct TestHandler;

#[async_trait]
impl Handler for TestHandler {
    async fn list_tools(&self) -> Result<Vec<Tool>, ErrorData> {
        Ok(vec![Tool::new("slow", "Never finishes"), Tool::new("add", "Add numbers")])
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<CallToolResult, ErrorData> {
        match name {
            "slow" => {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(CallToolResult::text("too late"))
            }
            "nap" => {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok(CallToolResult::text("rested"))
            }
            "add" => {
                let a = arguments["a"].as_i64().unwrap_or(0);
                let b = arguments["b"].as_i64().unwrap_or(0);
                Ok(CallToolResult::text((a + b).to_string()))
            }
            _ => Err(ErrorData::invalid_params(format!("Unknown tool: {}", name))),
        }
    }

    fn server_info(&self) -> Implementation {
        Implementation::new("test-server", "0.0.1")
    }
}

/// Feed `input` lines to a server, close input, and collect every output line.
async fn run_session(input: &[&str]) -> Vec<Value> {
    let raw: Vec<&[u8]> = input.iter().map(|l| l.as_bytes()).collect();
    run_raw_session(&raw).await
}

async fn run_raw_session(input: &[&[u8]]) -> Vec<Value> {
    let (client, server) = tokio::io::duplex(64 * 1024);
    let (server_read, server_write) = tokio::io::split(server);
    let (mut client_read, mut client_write) = tokio::io::split(client);

    let server_task = tokio::spawn(mcp_stdio::serve(
        Arc::new(TestHandler),
        server_read,
        server_write,
    ));

    for line in input {
        client_write.write_all(line).await.unwrap();
        client_write.write_all(b"\n").await.unwrap();
    }
    client_write.shutdown().await.unwrap();

    tokio::time::timeout(Duration::from_secs(5), server_task)
        .await
        .expect("server did not stop after EOF")
        .unwrap()
        .unwrap();

    let mut output = String::new();
    client_read.read_to_string(&mut output).await.unwrap();

    output
        .lines()
        .map(|l| serde_json::from_str(l).expect("output line is JSON"))
        .collect()
}

fn by_id(responses: &[Value], id: i64) -> Option<&Value> {
    responses.iter().find(|r| r["id"] == id)
}

#[tokio::test]
async fn test_handshake_and_tool_call() {
    let responses = run_session(&[
        r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2024-11-05","capabilities":{},"clientInfo":{"name":"test","version":"1.0"}}}"#,
        r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
        r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
        r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"add","arguments":{"a":2,"b":40}}}"#,
    ])
    .await;

    // The notification gets no answer.
    assert_eq!(responses.len(), 3);

    let init = by_id(&responses, 1).unwrap();
    assert_eq!(init["result"]["protocolVersion"], "2024-11-05");
    assert_eq!(init["result"]["serverInfo"]["name"], "test-server");

    let list = by_id(&responses, 2).unwrap();
    assert_eq!(list["result"]["tools"].as_array().unwrap().len(), 2);

    let call = by_id(&responses, 3).unwrap();
    assert_eq!(call["result"]["content"][0]["text"], "42");
}

#[tokio::test]
async fn test_parse_error_has_null_id() {
    let responses = run_session(&["{not json", ""]).await;

    assert_eq!(responses.len(), 1);
    assert!(responses[0]["id"].is_null());
    assert_eq!(responses[0]["error"]["code"], -32700);
}

#[tokio::test]
async fn test_invalid_request_and_unknown_method() {
    let responses = run_session(&[
        r#"{"jsonrpc":"2.0","id":7}"#,
        r#"{"jsonrpc":"1.0","id":8,"method":"ping"}"#,
        r#"{"jsonrpc":"2.0","id":9,"method":"prompts/list"}"#,
    ])
    .await;

    assert_eq!(by_id(&responses, 7).unwrap()["error"]["code"], -32600);
    assert_eq!(by_id(&responses, 8).unwrap()["error"]["code"], -32600);
    assert_eq!(by_id(&responses, 9).unwrap()["error"]["code"], -32601);
}

#[tokio::test]
async fn test_client_responses_are_ignored() {
    let responses = run_session(&[
        r#"{"jsonrpc":"2.0","id":"srv-1","result":{}}"#,
        r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#,
    ])
    .await;

    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0]["id"], 1);
}

#[tokio::test]
async fn test_cancelled_request_gets_no_response() {
    let responses = run_session(&[
        r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"slow"}}"#,
        r#"{"jsonrpc":"2.0","method":"notifications/cancelled","params":{"requestId":1,"reason":"user abort"}}"#,
        r#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#,
    ])
    .await;

    assert!(by_id(&responses, 1).is_none());
    assert_eq!(by_id(&responses, 2).unwrap()["result"], json!({}));
}

#[tokio::test]
async fn test_non_utf8_line_gets_parse_error_and_reading_continues() {
    let lines: [&[u8]; 3] = [
        br#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"nap"}}"#,
        &[0xff, 0xfe, b'{'],
        br#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#,
    ];
    let responses = run_raw_session(&lines).await;

    assert_eq!(responses.len(), 3);
    let parse_error = responses.iter().find(|r| r["id"].is_null()).unwrap();
    assert_eq!(parse_error["error"]["code"], -32700);
    assert_eq!(by_id(&responses, 1).unwrap()["result"]["content"][0]["text"], "rested");
    assert_eq!(by_id(&responses, 2).unwrap()["result"], json!({}));
}

#[tokio::test]
async fn test_in_flight_request_answered_after_input_closes() {
    // Input closes right after the request; the handler is still sleeping.
    let responses = run_session(&[
        r#"{"jsonrpc":"2.0","id":"late","method":"tools/call","params":{"name":"nap"}}"#,
    ])
    .await;

    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0]["id"], "late");
    assert_eq!(responses[0]["result"]["content"][0]["text"], "rested");
}

#[tokio::test]
async fn test_final_line_without_newline_is_handled() {
    let (client, server) = tokio::io::duplex(4096);
    let (server_read, server_write) = tokio::io::split(server);
    let (mut client_read, mut client_write) = tokio::io::split(client);
    let server_task = tokio::spawn(mcp_stdio::serve(
        Arc::new(TestHandler),
        server_read,
        server_write,
    ));

    client_write
        .write_all(br#"{"jsonrpc":"2.0","id":5,"method":"ping"}"#)
        .await
        .unwrap();
    client_write.shutdown().await.unwrap();
    server_task.await.unwrap().unwrap();

    let mut output = String::new();
    client_read.read_to_string(&mut output).await.unwrap();
    let response: Value = serde_json::from_str(output.trim()).unwrap();
    assert_eq!(response["id"], 5);
}

#[tokio::test]
async fn test_duplicate_in_flight_id_is_rejected() {
    let responses = run_session(&[
        r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"slow"}}"#,
        r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"add","arguments":{"a":1,"b":1}}}"#,
        r#"{"jsonrpc":"2.0","method":"notifications/cancelled","params":{"requestId":1}}"#,
    ])
    .await;

    // Only the rejection is written; the cancel still reaches the slow call.
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0]["id"], 1);
    assert_eq!(responses[0]["error"]["code"], -32600);
}
