//! `QuizServer` builder and server loop.
//!
//! This is the entry point for running a Quizcast server. It ties the
//! layers together: transport → protocol → rooms.

use std::sync::Arc;
use std::time::Duration;

use quizcast_bank::QuestionBank;
use quizcast_protocol::{Codec, JsonCodec};
use quizcast_room::{QuizConfig, RoomRegistry};
use quizcast_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::handler::handle_connection;
use crate::ServerError;

/// How often the idle-room sweep runs.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. The
/// registry lock is only held to look up or create a room handle; all
/// game state lives inside the room tasks themselves.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) registry: Mutex<RoomRegistry>,
    pub(crate) codec: C,
}

/// Builder for configuring and starting a Quizcast server.
///
/// # Example
///
/// ```rust,ignore
/// let server = QuizServer::builder()
///     .bind("0.0.0.0:3310")
///     .build(bank)
///     .await?;
/// server.run().await
/// ```
pub struct QuizServerBuilder {
    bind_addr: String,
    config: QuizConfig,
}

impl QuizServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:3310".to_string(),
            config: QuizConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the quiz timing configuration.
    pub fn config(mut self, config: QuizConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the server around a shared question bank.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`, which is what the
    /// browser clients speak.
    pub async fn build(
        self,
        bank: Arc<QuestionBank>,
    ) -> Result<QuizServer<JsonCodec>, ServerError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            registry: Mutex::new(RoomRegistry::new(bank, self.config)),
            codec: JsonCodec,
        });

        Ok(QuizServer { transport, state })
    }
}

impl Default for QuizServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Quizcast server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct QuizServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl QuizServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> QuizServerBuilder {
        QuizServerBuilder::new()
    }
}

impl<C> QuizServer<C>
where
    C: Codec + Clone + Send + Sync + 'static,
{
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the server accept loop.
    ///
    /// Spawns a handler task per connection and a background sweep that
    /// evicts rooms left empty past the idle timeout. Runs until the
    /// process is terminated.
    pub async fn run(mut self) -> Result<(), ServerError> {
        tracing::info!("Quizcast server running");

        let sweep_state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(SWEEP_INTERVAL);
            interval.tick().await; // first tick resolves immediately
            loop {
                interval.tick().await;
                let evicted =
                    sweep_state.registry.lock().await.sweep_idle().await;
                if evicted > 0 {
                    tracing::info!(evicted, "idle rooms evicted");
                }
            }
        });

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
