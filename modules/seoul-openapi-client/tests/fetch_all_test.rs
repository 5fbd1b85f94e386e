//! Paging behaviour against a local canned HTTP server.

use seoul_openapi_client::SeoulOpenApiClient;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const SERVICE: &str = "LOCALDATA_072405_YD";

/// Serves `/{key}/json/{service}/{start}/{end}/`. The listing reports 2500
/// rows; the 1001..2000 range always fails with a 500.
async fn spawn_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            tokio::spawn(async move {
                let mut buf = vec![0u8; 4096];
                let mut len = 0;
                while !buf[..len].windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf[len..]).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => len += n,
                    }
                }
                let request = String::from_utf8_lossy(&buf[..len]);
                let path = request.split_whitespace().nth(1).unwrap_or("/").to_string();
                let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
                let start = parts.get(3).copied().unwrap_or("0");

                let (status, body) = if start == "1001" {
                    ("500 Internal Server Error", "upstream failure".to_string())
                } else {
                    let body = format!(
                        r#"{{"{SERVICE}":{{"list_total_count":2500,"RESULT":{{"CODE":"INFO-000","MESSAGE":"OK"}},"row":[{{"MGTNO":"row-{start}","UPTAENM":"편의점"}}]}}}}"#
                    );
                    ("200 OK", body)
                };
                let response = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    format!("http://{addr}")
}

#[tokio::test]
async fn failed_range_is_counted_and_the_rest_returned() {
    let base_url = spawn_server().await;
    let client = SeoulOpenApiClient::with_base_url("test-key", &base_url).unwrap();

    let fetched = client.fetch_all(SERVICE).await.unwrap();

    let ids: Vec<_> = fetched.rows.iter().filter_map(|r| r.mgtno.clone()).collect();
    assert_eq!(ids, vec!["row-1", "row-2001"]);
    assert_eq!(fetched.failed_ranges, 1);
}
