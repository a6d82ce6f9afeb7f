// ABOUTME: In-process SSH server speaking the account command protocol.
// ABOUTME: Keeps linked keys in memory and records every command line it receives.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use parking_lot::Mutex;
use russh::keys::{Algorithm, PrivateKey, PublicKey};
use russh::server::{Auth, Msg, Server as _, Session};
use russh::{Channel, ChannelId, CryptoVec};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;

pub const ACCOUNT_ID: &str = "b1a2c3d4-0000-4000-8000-1234567890ab";

/// Shared server state, inspectable from tests.
#[derive(Default)]
pub struct State {
    /// Keys allowed to authenticate. Empty accepts any key.
    pub allowed: Mutex<Vec<PublicKey>>,
    /// Linked keys as `type base64`.
    pub linked: Mutex<Vec<String>>,
    /// Every command line received, in arrival order.
    pub commands: Mutex<Vec<String>>,
    /// Stdin payloads received for key commands.
    pub payloads: Mutex<Vec<String>>,
    pub jwt_calls: AtomicUsize,
    /// Make `id` exit 1 with a message on stderr.
    pub fail_id: AtomicBool,
    /// Write a warning on stderr alongside every successful reply.
    pub warn_on_success: AtomicBool,
    /// Answer every command only after the client closes stdin.
    pub read_stdin_to_eof: AtomicBool,
}

impl State {
    fn accepts(&self, key: &PublicKey) -> bool {
        let allowed = self.allowed.lock();
        allowed.is_empty() || allowed.iter().any(|k| k.key_data() == key.key_data())
    }

    fn respond(&self, line: &str, stdin: &[u8]) -> Reply {
        let mut reply = self.reply_for(line, stdin);
        if reply.code == 0 && self.warn_on_success.load(Ordering::SeqCst) {
            reply.stderr.extend_from_slice(b"warning: deprecated client\n");
        }
        reply
    }

    fn reply_for(&self, line: &str, stdin: &[u8]) -> Reply {
        self.commands.lock().push(line.to_string());
        let (name, rest) = line.split_once(' ').unwrap_or((line, ""));

        match name {
            "id" if self.fail_id.load(Ordering::SeqCst) => Reply::failure(1, "boom"),
            "id" => Reply::ok(ACCOUNT_ID),
            "jwt" => {
                self.jwt_calls.fetch_add(1, Ordering::SeqCst);
                let audience: Vec<&str> = rest.split_whitespace().collect();
                Reply::ok(&make_jwt(&audience, chrono::Utc::now().timestamp() + 3600))
            }
            "keys" => {
                let linked = self.linked.lock();
                let mut text = String::new();
                for key in linked.iter() {
                    text.push_str(key);
                    text.push('\n');
                }
                Reply::ok(&text)
            }
            "api-keys" => {
                let linked = self.linked.lock();
                let keys: Vec<_> = linked
                    .iter()
                    .enumerate()
                    .map(|(i, key)| {
                        serde_json::json!({
                            "id": i + 1,
                            "key": key,
                            "created_at": "2021-03-04T12:00:00Z",
                        })
                    })
                    .collect();
                let body = serde_json::json!({ "active_key": 1, "keys": keys });
                Reply::ok(&body.to_string())
            }
            "api-add-key" | "api-unlink" => {
                let payload = String::from_utf8_lossy(stdin).to_string();
                self.payloads.lock().push(payload.clone());
                let Some(key) = key_from_json(&payload).or_else(|| key_from_json(rest)) else {
                    return Reply::ok("invalid payload");
                };

                let mut linked = self.linked.lock();
                let position = linked.iter().position(|k| *k == key);
                match (name, position) {
                    ("api-add-key", Some(_)) => Reply::ok("key already linked"),
                    ("api-add-key", None) => {
                        linked.push(key);
                        Reply::ok("")
                    }
                    (_, Some(i)) => {
                        linked.remove(i);
                        Reply::ok("")
                    }
                    (_, None) => Reply::ok("key not found"),
                }
            }
            _ => Reply::failure(127, "unknown command"),
        }
    }
}

fn key_from_json(text: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(text.trim()).ok()?;
    value["key"].as_str().map(str::to_string)
}

/// Build an unsigned JWT carrying `aud` and `exp` claims.
pub fn make_jwt(audience: &[&str], exp: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"EdDSA","typ":"JWT"}"#);
    let claims = serde_json::json!({ "sub": ACCOUNT_ID, "aud": audience, "exp": exp });
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{}.{}.sig", header, payload)
}

struct Reply {
    code: u32,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

impl Reply {
    fn ok(stdout: &str) -> Self {
        Self {
            code: 0,
            stdout: stdout.as_bytes().to_vec(),
            stderr: Vec::new(),
        }
    }

    fn failure(code: u32, message: &str) -> Self {
        Self {
            code,
            stdout: Vec::new(),
            stderr: message.as_bytes().to_vec(),
        }
    }

    fn send(self, channel: ChannelId, session: &mut Session) {
        if !self.stdout.is_empty() {
            let _ = session.data(channel, CryptoVec::from_slice(&self.stdout));
        }
        if !self.stderr.is_empty() {
            let _ = session.extended_data(channel, 1, CryptoVec::from_slice(&self.stderr));
        }
        let _ = session.exit_status_request(channel, self.code);
        let _ = session.eof(channel);
        let _ = session.close(channel);
    }
}

/// A pending key command waiting for stdin to close.
struct Pending {
    line: String,
    stdin: Vec<u8>,
}

#[derive(Clone)]
struct AccountService {
    state: Arc<State>,
}

impl russh::server::Server for AccountService {
    type Handler = Connection;

    fn new_client(&mut self, _: Option<std::net::SocketAddr>) -> Self::Handler {
        Connection {
            state: Arc::clone(&self.state),
            pending: HashMap::new(),
        }
    }
}

struct Connection {
    state: Arc<State>,
    pending: HashMap<ChannelId, Pending>,
}

impl russh::server::Handler for Connection {
    type Error = russh::Error;

    async fn auth_publickey(&mut self, _user: &str, key: &PublicKey) -> Result<Auth, Self::Error> {
        if self.state.accepts(key) {
            Ok(Auth::Accept)
        } else {
            Ok(Auth::reject())
        }
    }

    async fn channel_open_session(
        &mut self,
        _channel: Channel<Msg>,
        _session: &mut Session,
    ) -> Result<bool, Self::Error> {
        Ok(true)
    }

    async fn exec_request(
        &mut self,
        channel: ChannelId,
        data: &[u8],
        session: &mut Session,
    ) -> Result<(), Self::Error> {
        let line = String::from_utf8_lossy(data).to_string();
        let _ = session.channel_success(channel);

        // Key commands read stdin, so they answer once the client closes it.
        let reads_stdin = line.starts_with("api-add-key")
            || line.starts_with("api-unlink")
            || self.state.read_stdin_to_eof.load(Ordering::SeqCst);
        if reads_stdin {
            self.pending.insert(
                channel,
                Pending {
                    line,
                    stdin: Vec::new(),
                },
            );
        } else {
            self.state.respond(&line, b"").send(channel, session);
        }
        Ok(())
    }

    async fn data(
        &mut self,
        channel: ChannelId,
        data: &[u8],
        _session: &mut Session,
    ) -> Result<(), Self::Error> {
        if let Some(pending) = self.pending.get_mut(&channel) {
            pending.stdin.extend_from_slice(data);
        }
        Ok(())
    }

    async fn channel_eof(
        &mut self,
        channel: ChannelId,
        session: &mut Session,
    ) -> Result<(), Self::Error> {
        if let Some(pending) = self.pending.remove(&channel) {
            self.state
                .respond(&pending.line, &pending.stdin)
                .send(channel, session);
        }
        Ok(())
    }
}

/// A running account server bound to a random local port.
pub struct AccountServer {
    pub port: u16,
    pub state: Arc<State>,
    task: JoinHandle<()>,
}

impl AccountServer {
    /// Start a server that accepts any client key.
    pub async fn start() -> Self {
        Self::start_with(Vec::new()).await
    }

    /// Start a server that only accepts the given client keys.
    pub async fn start_with(allowed: Vec<PublicKey>) -> Self {
        let state = Arc::new(State::default());
        *state.allowed.lock() = allowed;

        let mut rng = russh::keys::ssh_key::rand_core::OsRng;
        let host_key = PrivateKey::random(&mut rng, Algorithm::Ed25519).expect("host key");

        let config = Arc::new(russh::server::Config {
            auth_rejection_time: Duration::from_millis(0),
            auth_rejection_time_initial: Some(Duration::from_millis(0)),
            inactivity_timeout: Some(Duration::from_secs(10)),
            keys: vec![host_key],
            ..Default::default()
        });

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0))
            .await
            .expect("bind test server");
        let port = listener.local_addr().expect("local addr").port();

        let mut service = AccountService {
            state: Arc::clone(&state),
        };
        let task = tokio::spawn(async move {
            let _ = service.run_on_socket(config, &listener).await;
        });

        Self { port, state, task }
    }

    pub fn commands(&self) -> Vec<String> {
        self.state.commands.lock().clone()
    }

    pub fn jwt_calls(&self) -> usize {
        self.state.jwt_calls.load(Ordering::SeqCst)
    }
}

impl Drop for AccountServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}
