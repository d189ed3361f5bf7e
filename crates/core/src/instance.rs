//! The running service: registry state, the one-shot data pack load and the
//! HTTP listener.

use crate::config::{ConfigError, ServerConfig};
use crate::handler::ChunkHandler;
use crate::overrides::{apply_overrides, ApplyReport};
use crate::sampler::RegionSampler;
use anyhow::{anyhow, Context};
use datapack::{DataPack, OverrideTable};
use parking_lot::Mutex;
use proto::response::{self, JsonResponse};
use std::future::Future;
use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tiny_http::{Request, Server};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use worldgen::{keys, NoiseEngine, NoiseGeneratorSettings, RegistryStore, TerrainEngine};

/// Outcome of one [`Instance::load_datapack`] run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadSummary {
    /// Documents read across all categories that loaded.
    pub documents: usize,
    /// Categories without a directory in the pack.
    pub missing_categories: Vec<String>,
    /// Categories dropped because a document failed to read or parse.
    pub failed_categories: Vec<String>,
    pub report: ApplyReport,
}

pub struct Instance {
    config: ServerConfig,
    registries: Arc<RegistryStore>,
    ready: Arc<AtomicBool>,
    handler: Arc<ChunkHandler>,
    last_load: Mutex<Option<LoadSummary>>,
}

impl Instance {
    /// Create an instance backed by the built-in noise engine.
    pub fn new(config: ServerConfig) -> Result<Self, ConfigError> {
        let registries = Arc::new(RegistryStore::with_builtin());
        let engine = Arc::new(NoiseEngine::new(Arc::clone(&registries)));
        Self::with_engine(config, registries, engine)
    }

    /// Create an instance that samples with `engine`.
    ///
    /// `registries` is the store the data pack load writes into, and should
    /// be the one `engine` reads from.
    pub fn with_engine(
        config: ServerConfig,
        registries: Arc<RegistryStore>,
        engine: Arc<dyn TerrainEngine>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let generation = &config.generation;
        let sampler = RegionSampler::new(engine, config.settings_id()?, generation.seed, generation.region_span)
            .with_parallelism(generation.parallel);

        let ready = Arc::new(AtomicBool::new(false));
        let handler = Arc::new(ChunkHandler::new(sampler, Arc::clone(&ready)));

        Ok(Self {
            config,
            registries,
            ready,
            handler,
            last_load: Mutex::new(None),
        })
    }

    #[inline]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    #[inline]
    pub fn registries(&self) -> &Arc<RegistryStore> {
        &self.registries
    }

    #[inline]
    pub fn handler(&self) -> &Arc<ChunkHandler> {
        &self.handler
    }

    /// Whether the data pack load has finished at least once.
    #[inline]
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Summary of the most recent load, if any.
    pub fn last_load(&self) -> Option<LoadSummary> {
        self.last_load.lock().clone()
    }

    /// Scan the data pack and replace the dynamic registries with it.
    ///
    /// Blocking. Failures are logged and summarized, never returned: the
    /// service is marked ready once the load has run, whatever its outcome.
    /// Calling this again performs a full reload.
    pub fn load_datapack(&self) -> LoadSummary {
        let config = &self.config.datapack;
        info!("Loading data pack from {}", config.path.display());

        let pack = DataPack::new(config.path.clone()).with_namespace(config.namespace.clone());
        let table = OverrideTable::build(&pack, &config.categories);

        let documents = table.document_count();
        let missing_categories = table.missing().iter().map(|m| m.category.clone()).collect();
        let failed_categories = table.failures().iter().map(|f| f.category.clone()).collect();

        let report = apply_overrides(&self.registries, table, &config.dynamic_registries);
        info!(
            "Data pack loaded: {documents} documents, {} entries applied, {} rejected",
            report.applied(),
            report.failed()
        );

        if let Ok(settings) = self.config.settings_id() {
            let registered = self
                .registries
                .get::<NoiseGeneratorSettings>(&keys::noise_settings())
                .is_some_and(|registry| registry.contains(&settings));
            if !registered {
                warn!("Generation settings {settings} are not registered, chunk requests will fail");
            }
        }

        let summary = LoadSummary {
            documents,
            missing_categories,
            failed_categories,
            report,
        };

        *self.last_load.lock() = Some(summary.clone());
        self.ready.store(true, Ordering::Release);
        summary
    }

    /// Bind the configured listen address.
    pub fn bind(&self) -> anyhow::Result<Server> {
        let network = &self.config.network;
        Server::http((network.host.as_str(), network.port))
            .map_err(|e| anyhow!("Failed to bind {}:{}: {e}", network.host, network.port))
    }

    /// Answer requests from `server` until `shutdown` resolves.
    ///
    /// A dedicated thread receives requests and hands them to the runtime;
    /// each one is handled on the blocking pool.
    pub async fn serve<F>(&self, server: Arc<Server>, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()>,
    {
        let (tx, mut rx) = mpsc::channel::<Request>(REQUEST_QUEUE);
        let receiver = Arc::clone(&server);
        std::thread::Builder::new()
            .name("http-recv".to_owned())
            .spawn(move || {
                for request in receiver.incoming_requests() {
                    if tx.blocking_send(request).is_err() {
                        break;
                    }
                }
            })
            .context("Failed to spawn the request receiver")?;

        let max_body = self.config.network.max_body_bytes;
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                request = rx.recv() => {
                    let Some(request) = request else {
                        break;
                    };
                    let handler = Arc::clone(&self.handler);
                    tokio::task::spawn_blocking(move || respond(&handler, request, max_body));
                }
            }
        }

        info!("Shutting down listener");
        server.unblock();
        Ok(())
    }

    /// Bind, start the background data pack load and serve until Ctrl-C.
    ///
    /// The listener accepts connections before the load finishes; chunk
    /// requests are answered with 503 until it has.
    pub async fn run(self: Arc<Self>) -> anyhow::Result<()> {
        let server = Arc::new(self.bind()?);
        match server.server_addr().to_ip() {
            Some(addr) => info!("Listening on {addr}"),
            None => info!("Listening on {}:{}", self.config.network.host, self.config.network.port),
        }

        let loader = Arc::clone(&self);
        tokio::task::spawn_blocking(move || {
            loader.load_datapack();
        });

        self.serve(server, shutdown_signal()).await
    }
}

/// Requests received but not yet dispatched.
const REQUEST_QUEUE: usize = 64;

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl-C, running until killed");
        std::future::pending::<()>().await;
    }
}

fn respond(handler: &ChunkHandler, mut request: Request, max_body: usize) {
    let response = match read_body(&mut request, max_body) {
        Ok(body) => handler.handle(request.method(), request.url(), &body),
        Err(response) => response,
    };

    debug!(
        method = %request.method(),
        url = request.url(),
        status = response.status.0,
        "Answered request"
    );
    if let Err(e) = request.respond(response.into_http()) {
        debug!("Failed to write response: {e}");
    }
}

/// Read the request body, refusing anything larger than `max_body` bytes.
fn read_body(request: &mut Request, max_body: usize) -> Result<Vec<u8>, JsonResponse> {
    let too_large = || {
        JsonResponse::error(
            response::PAYLOAD_TOO_LARGE,
            format!("Request body exceeds {max_body} bytes"),
        )
    };

    if request.body_length().is_some_and(|length| length > max_body) {
        return Err(too_large());
    }

    let mut body = Vec::new();
    request
        .as_reader()
        .take(max_body as u64 + 1)
        .read_to_end(&mut body)
        .map_err(|e| JsonResponse::error(response::BAD_REQUEST, format!("Failed to read request body: {e}")))?;

    if body.len() > max_body {
        return Err(too_large());
    }
    Ok(body)
}
