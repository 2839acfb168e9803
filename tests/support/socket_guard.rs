//! Starts wiremock servers only where the sandbox allows local sockets.

use wiremock::MockServer;

/// Starts a mock server, or returns `None` (and the test should return
/// early) when binding a loopback socket is not permitted.
pub async fn start_mock_server_or_skip() -> Option<MockServer> {
    if let Err(error) = std::net::TcpListener::bind("127.0.0.1:0") {
        eprintln!("skipping: cannot bind loopback socket: {error}");
        return None;
    }
    Some(MockServer::start().await)
}
