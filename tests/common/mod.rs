//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use api_gateway::config::{ApiDefinition, GatewayConfig};
use api_gateway::event::{ApiEvent, EventBus};
use api_gateway::handler::ProxyHandlerFactory;
use api_gateway::report::TracingReporter;
use api_gateway::{GatewayServer, Reactor, Shutdown};

/// Start a simple mock upstream that returns a fixed response body.
/// Returns the address it listens on.
pub async fn start_mock_backend(response: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        // Drain the request head before answering.
                        let mut buf = [0u8; 4096];
                        let _ = socket.read(&mut buf).await;
                        let response_str = format!(
                            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            response.len(),
                            response
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// A running gateway wired to a reactor and an event bus.
pub struct TestGateway {
    pub addr: SocketAddr,
    pub bus: EventBus,
    pub reactor: Arc<Reactor>,
}

/// Boot a full gateway on an ephemeral port and deploy the given APIs.
pub async fn start_gateway(apis: Vec<ApiDefinition>) -> TestGateway {
    let reactor = Arc::new(Reactor::new(
        Arc::new(ProxyHandlerFactory::new()),
        Arc::new(TracingReporter),
    ));

    let bus = EventBus::new(32);
    reactor.start(bus.subscribe());
    for api in apis {
        bus.publish(ApiEvent::Deploy(api));
    }

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = GatewayServer::new(&GatewayConfig::default(), Arc::clone(&reactor), Shutdown::new());
    tokio::spawn(async move {
        let _ = server.run(listener).await;
    });

    // Let the event loop apply the startup deployments.
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    TestGateway { addr, bus, reactor }
}

/// Minimal HTTP/1.1 client: one GET, returns (status, body).
pub async fn http_get(addr: SocketAddr, path: &str, host: Option<&str>) -> (u16, String) {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let host = host.map(str::to_string).unwrap_or_else(|| addr.to_string());
    let request = format!("GET {path} HTTP/1.1\r\nHost: {host}\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();
    let text = String::from_utf8_lossy(&raw).to_string();

    let status = text
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);
    let body = text
        .split_once("\r\n\r\n")
        .map(|(_, body)| body.to_string())
        .unwrap_or_default();

    (status, body)
}

/// An API definition pointing at the given upstream.
pub fn api(id: &str, context_path: &str, upstream: &str) -> ApiDefinition {
    ApiDefinition {
        id: id.into(),
        name: id.into(),
        enabled: true,
        context_path: context_path.into(),
        virtual_host: None,
        upstream: upstream.into(),
    }
}
