//! Integration tests for the chat widget against a local HTTP endpoint.
//!
//! Each test binds a `TcpListener` on 127.0.0.1, serves one canned HTTP
//! response and hands back the raw request it received.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;
    use tokio_util::sync::CancellationToken;

    use sarthi::chat::{
        ChatConfig, ChatWidget, ConfigCompletionClient, FALLBACK_REPLY, RecordingRenderer,
        SubmitOutcome,
    };
    use sarthi::{
        ChatCompletionRequest, ChatMessageParam, Completions, ImageDataUri, ImageMediaType,
        Sender,
    };

    const API_KEY: &str = "integration-key";

    /// The request the endpoint saw.
    struct Captured {
        head: String,
        body: serde_json::Value,
    }

    async fn read_request(stream: &mut TcpStream) -> Captured {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        let header_end = loop {
            let n = stream.read(&mut chunk).await.unwrap();
            assert!(n > 0, "client closed before sending headers");
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };
        let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
        let content_length = head
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
            .map(|(_, value)| value.trim().parse::<usize>().unwrap())
            .unwrap_or(0);
        while buf.len() < header_end + content_length {
            let n = stream.read(&mut chunk).await.unwrap();
            assert!(n > 0, "client closed before sending the body");
            buf.extend_from_slice(&chunk[..n]);
        }
        let body = serde_json::from_slice(&buf[header_end..header_end + content_length]).unwrap();
        Captured { head, body }
    }

    /// Serve one response with `status` and `body`, returning the base URL.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<Captured>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}/v1/", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let captured = read_request(&mut stream).await;
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.ok();
            captured
        });
        (base_url, handle)
    }

    /// Accept one request and never answer it.
    async fn serve_silence() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}/v1/", listener.local_addr().unwrap());
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let _captured = read_request(&mut stream).await;
            tokio::time::sleep(Duration::from_secs(30)).await;
        });
        base_url
    }

    fn widget_for(base_url: &str, timeout: Duration) -> ChatWidget<ConfigCompletionClient> {
        let config = ChatConfig::new()
            .with_base_url(base_url)
            .with_timeout(timeout)
            .without_color();
        let client = ConfigCompletionClient::from_config(Some(API_KEY.to_string()), config)
            .expect("client should build");
        ChatWidget::new(client)
    }

    async fn ask(
        widget: &mut ChatWidget<ConfigCompletionClient>,
        text: &str,
    ) -> (SubmitOutcome, RecordingRenderer) {
        let mut renderer = RecordingRenderer::new();
        widget.open(&mut renderer);
        widget.input_mut().set_text(text);
        let outcome = widget
            .submit(&mut renderer, &CancellationToken::new())
            .await
            .expect("submission should not error");
        (outcome, renderer)
    }

    #[tokio::test]
    async fn reply_content_is_appended_verbatim() {
        let (base_url, server) = serve_once(
            "200 OK",
            r#"{"choices":[{"message":{"content":"Take two aspirins."}}]}"#,
        )
        .await;
        let mut widget = widget_for(&base_url, Duration::from_secs(10));

        let (outcome, renderer) = ask(&mut widget, "I have a headache").await;
        assert!(matches!(outcome, SubmitOutcome::Replied { .. }));

        let messages = widget.store().messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].sender, Sender::User);
        assert_eq!(messages[1].text, "I have a headache");
        assert_eq!(messages[2].sender, Sender::Assistant);
        assert_eq!(messages[2].text, "Take two aspirins.");
        assert!(!renderer.is_typing());

        let captured = server.await.unwrap();
        assert!(captured.head.starts_with("POST /v1/chat/completions "));
        let auth = format!("authorization: bearer {API_KEY}");
        assert!(captured.head.to_lowercase().contains(&auth));
        assert_eq!(captured.body["model"], "gpt-4o-mini");
        assert_eq!(captured.body["max_tokens"], 500);
        assert_eq!(captured.body["messages"][0]["role"], "system");
        assert_eq!(captured.body["messages"][1]["role"], "user");
        assert_eq!(captured.body["messages"][1]["content"], "I have a headache");
    }

    #[tokio::test]
    async fn server_error_yields_one_fallback() {
        let (base_url, server) = serve_once(
            "500 Internal Server Error",
            r#"{"error":{"type":"server_error","message":"boom"}}"#,
        )
        .await;
        let mut widget = widget_for(&base_url, Duration::from_secs(10));

        ask(&mut widget, "hello?").await;
        server.await.unwrap();

        let messages = widget.store().messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[2].text, FALLBACK_REPLY);
        assert!(!widget.is_awaiting_response());
    }

    #[tokio::test]
    async fn malformed_body_yields_fallback() {
        let (base_url, _server) = serve_once("200 OK", "this is not json").await;
        let mut widget = widget_for(&base_url, Duration::from_secs(10));
        ask(&mut widget, "hello?").await;
        assert_eq!(widget.store().last().unwrap().text, FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn missing_content_yields_fallback() {
        let (base_url, _server) = serve_once("200 OK", r#"{"choices":[]}"#).await;
        let mut widget = widget_for(&base_url, Duration::from_secs(10));
        ask(&mut widget, "hello?").await;
        assert_eq!(widget.store().len(), 3);
        assert_eq!(widget.store().last().unwrap().text, FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn unresponsive_endpoint_times_out_to_fallback() {
        let base_url = serve_silence().await;
        let mut widget = widget_for(&base_url, Duration::from_millis(300));
        let (outcome, _) = ask(&mut widget, "anyone there?").await;
        assert!(matches!(outcome, SubmitOutcome::Replied { .. }));
        assert_eq!(widget.store().last().unwrap().text, FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn image_is_sent_as_content_parts() {
        let (base_url, server) = serve_once(
            "200 OK",
            r#"{"choices":[{"message":{"content":"Looks like a mild rash."}}]}"#,
        )
        .await;
        let mut widget = widget_for(&base_url, Duration::from_secs(10));
        let image = ImageDataUri::from_bytes(b"\x89PNG", ImageMediaType::Png);
        widget.input_mut().attach_image(image.clone());

        let (outcome, _) = ask(&mut widget, "What is this?").await;
        assert!(matches!(outcome, SubmitOutcome::Replied { .. }));
        assert_eq!(widget.store().messages()[1].image.as_ref(), Some(&image));

        let captured = server.await.unwrap();
        let content = &captured.body["messages"][1]["content"];
        assert_eq!(content[0]["type"], "text");
        assert_eq!(content[0]["text"], "What is this?");
        assert_eq!(content[1]["type"], "image_url");
        assert_eq!(content[1]["image_url"]["url"], image.as_str());
    }

    #[tokio::test]
    async fn low_level_client_maps_unauthorized() {
        let (base_url, _server) = serve_once(
            "401 Unauthorized",
            r#"{"error":{"type":"invalid_request_error","message":"Incorrect API key"}}"#,
        )
        .await;
        let client = Completions::with_options(
            Some(API_KEY.to_string()),
            Some(base_url),
            Some(Duration::from_secs(10)),
        )
        .unwrap();
        let request = ChatCompletionRequest::new(
            "gpt-4o-mini",
            vec![ChatMessageParam::user("hi", None)],
            16,
        );
        let err = client.send(&request).await.unwrap_err();
        assert!(err.is_authentication());
        assert_eq!(err.status_code(), Some(401));
        assert!(!format!("{client:?}").contains(API_KEY));
    }
}
