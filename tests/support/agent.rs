// ABOUTME: In-process SSH agent listening on a Unix socket.
// ABOUTME: Preloaded with identities so agent-backed authentication can be exercised.

use russh::keys::PrivateKey;
use russh::keys::agent::client::AgentClient;
use std::path::{Path, PathBuf};
use tokio::net::UnixListener;
use tokio::task::JoinHandle;

/// A running agent holding the given keys.
pub struct TestAgent {
    pub socket: PathBuf,
    task: JoinHandle<()>,
}

impl TestAgent {
    pub async fn start(dir: &Path, keys: &[PrivateKey]) -> Self {
        let socket = dir.join("agent.sock");
        let listener = UnixListener::bind(&socket).expect("bind agent socket");

        let connections = Box::pin(futures::stream::unfold(listener, |listener| async move {
            let accepted = listener.accept().await.map(|(stream, _)| stream);
            Some((accepted, listener))
        }));
        let task = tokio::spawn(async move {
            let _ = russh::keys::agent::server::serve(connections, ()).await;
        });

        let mut client = AgentClient::connect_uds(&socket)
            .await
            .expect("connect to test agent");
        for key in keys {
            client.add_identity(key, &[]).await.expect("add identity");
        }

        Self { socket, task }
    }
}

impl Drop for TestAgent {
    fn drop(&mut self) {
        self.task.abort();
    }
}
