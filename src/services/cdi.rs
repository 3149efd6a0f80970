// src/services/cdi.rs
use std::time::Duration;

use log::{error, info};
use reqwest::Client;
use serde_json::Value;

use crate::error::{CalcError, Result};
use crate::models::FetchedRate;
use crate::services::parsing::leading_float;

/// Banco Central SGS series 1178: latest annualised CDI/Selic value.
pub const DEFAULT_CDI_URL: &str =
    "https://api.bcb.gov.br/dados/serie/bcdata.sgs.1178/dados/ultimos/1?formato=json";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(7);

/// Fetch the latest CDI from `url`.
///
/// The timeout covers the whole exchange, body included, so a source that
/// starts answering and then stalls is still abandoned.
pub async fn fetch_cdi(client: &Client, url: &str, timeout: Duration) -> Result<FetchedRate> {
    info!("Fetching CDI from URL: {}", url);

    let payload = match tokio::time::timeout(timeout, request_payload(client, url)).await {
        Ok(result) => result?,
        Err(_) => {
            error!("CDI request timed out after {:?}", timeout);
            return Err(CalcError::fetch(format!("timed out after {}s", timeout.as_secs_f64())));
        }
    };

    let rate = parse_payload(&payload)?;
    info!("Latest CDI: {}% on {:?}", rate.value, rate.observed_at);
    Ok(rate)
}

async fn request_payload(client: &Client, url: &str) -> Result<String> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| CalcError::fetch(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        error!("CDI source answered {}: {}", status, text);
        return Err(CalcError::Fetch {
            status: Some(status.as_u16()),
            message: format!("HTTP {} {}", status, text).trim_end().to_string(),
        });
    }

    response
        .text()
        .await
        .map_err(|e| CalcError::fetch(e.to_string()))
}

/// Read the first `{valor, data}` element of the SGS JSON array.
pub fn parse_payload(payload: &str) -> Result<FetchedRate> {
    let data: Value = serde_json::from_str(payload)
        .map_err(|e| CalcError::Format(format!("invalid JSON: {}", e)))?;

    let first = data
        .as_array()
        .and_then(|items| items.first())
        .ok_or_else(|| CalcError::Format("expected a non-empty array".to_string()))?;

    let value = match first.get("valor") {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => leading_float(&s.replacen(',', ".", 1)),
        _ => None,
    }
    .filter(|v| v.is_finite())
    .ok_or_else(|| CalcError::Format(format!("CDI value is not a number: {}", first)))?;

    let observed_at = match first.get("data") {
        Some(Value::String(s)) => Some(s.clone()),
        _ => None,
    };

    Ok(FetchedRate { value, observed_at })
}

#[cfg(test)]
mod tests {
    use super::*;
    use warp::filters::BoxedFilter;
    use warp::reply::Response;
    use warp::{Filter, Reply};

    /// Stand-in rate source on an ephemeral local port.
    fn serve(filter: BoxedFilter<(Response,)>) -> String {
        let (addr, server) = warp::serve(filter).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);
        format!("http://{}/cdi", addr)
    }

    #[test]
    fn test_parse_string_value_with_comma() {
        let rate = parse_payload(r#"[{"data":"17/10/2026","valor":"13,65"}]"#).unwrap();
        assert_eq!(rate.value, 13.65);
        assert_eq!(rate.observed_at.as_deref(), Some("17/10/2026"));
    }

    #[test]
    fn test_parse_string_value_reads_leading_number() {
        for (raw, expected) in [("13,65 ", 13.65), (" 14.9", 14.9), ("13,65% a.a.", 13.65)] {
            let payload = serde_json::json!([{ "valor": raw }]).to_string();
            assert_eq!(parse_payload(&payload).unwrap().value, expected, "{:?}", raw);
        }
    }

    #[test]
    fn test_parse_numeric_value_and_extra_items() {
        let rate = parse_payload(r#"[{"valor": 14.9}, {"valor": 1.0}]"#).unwrap();
        assert_eq!(rate.value, 14.9);
        assert_eq!(rate.observed_at, None);
    }

    #[test]
    fn test_parse_rejects_malformed_payloads() {
        for payload in [
            "[]",
            "{}",
            "not json",
            r#"[{"data": "17/10/2026"}]"#,
            r#"[{"valor": "n/a"}]"#,
            r#"[{"valor": null}]"#,
        ] {
            assert!(
                matches!(parse_payload(payload), Err(CalcError::Format(_))),
                "accepted {}",
                payload
            );
        }
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let url = serve(
            warp::path("cdi")
                .map(|| {
                    warp::reply::json(&serde_json::json!([{ "data": "17/10/2026", "valor": "13,65" }]))
                        .into_response()
                })
                .boxed(),
        );
        let rate = fetch_cdi(&Client::new(), &url, DEFAULT_TIMEOUT).await.unwrap();
        assert_eq!(rate.value, 13.65);
    }

    #[tokio::test]
    async fn test_fetch_http_error_carries_status() {
        let url = serve(
            warp::path("cdi")
                .map(|| {
                    warp::reply::with_status("maintenance", warp::http::StatusCode::SERVICE_UNAVAILABLE)
                        .into_response()
                })
                .boxed(),
        );
        match fetch_cdi(&Client::new(), &url, DEFAULT_TIMEOUT).await {
            Err(CalcError::Fetch { status, message }) => {
                assert_eq!(status, Some(503));
                assert!(message.contains("maintenance"), "{}", message);
            }
            other => panic!("expected fetch error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_empty_array_is_format_error() {
        let url = serve(
            warp::path("cdi")
                .map(|| warp::reply::json(&serde_json::json!([])).into_response())
                .boxed(),
        );
        assert!(matches!(
            fetch_cdi(&Client::new(), &url, DEFAULT_TIMEOUT).await,
            Err(CalcError::Format(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_times_out() {
        let url = serve(
            warp::path("cdi")
                .and_then(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Ok::<_, warp::Rejection>(
                        warp::reply::json(&serde_json::json!([{ "valor": 1.0 }])).into_response(),
                    )
                })
                .boxed(),
        );
        let result = fetch_cdi(&Client::new(), &url, Duration::from_millis(200)).await;
        assert!(matches!(result, Err(CalcError::Fetch { status: None, .. })));
    }

    #[tokio::test]
    async fn test_fetch_times_out_mid_body() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;
            socket
                .write_all(
                    b"HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 100\r\n\r\n[{\"valor\":",
                )
                .await
                .unwrap();
            socket.flush().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let url = format!("http://{}/cdi", addr);
        let result = fetch_cdi(&Client::new(), &url, Duration::from_millis(300)).await;
        assert!(
            matches!(result, Err(CalcError::Fetch { status: None, .. })),
            "{:?}",
            result
        );
    }

    #[tokio::test]
    async fn test_fetch_unreachable_source() {
        let result = fetch_cdi(&Client::new(), "http://127.0.0.1:9/cdi", DEFAULT_TIMEOUT).await;
        assert!(matches!(result, Err(CalcError::Fetch { .. })));
    }
}
