use std::cell::RefCell;
use std::net::{SocketAddr, TcpListener as StdListener};
use std::rc::Rc;
use std::thread::JoinHandle;

use routex_core::{RouteRegistry, ServerBuilder, ServerConfig};
use socket2::{Domain, Protocol, Socket, Type};
use tokio::sync::watch;

use crate::connection::serve_connection;
use crate::error::TransportError;
use crate::handler::Handler;

/// Thread-per-core HTTP/1.1 server.
///
/// ## Thread-per-core
/// Every worker owns a listener bound with `SO_REUSEPORT`, a current-thread
/// runtime and a dispatcher replayed from the shared route table. Nothing
/// routing-related crosses threads after startup.
pub struct RoutexServer {
    addr: SocketAddr,
    config: ServerConfig,
    registry: RouteRegistry<Handler>,
}

impl RoutexServer {
    pub fn listen(addr: &str) -> Result<Self, TransportError> {
        let addr = addr
            .parse()
            .map_err(|_| TransportError::Address(addr.to_string()))?;
        Ok(Self {
            addr,
            config: ServerConfig::default(),
            registry: RouteRegistry::new(),
        })
    }

    pub fn from_builder(builder: ServerBuilder<Handler>) -> Result<Self, TransportError> {
        let addr = builder.config.bind_addr();
        Ok(Self::listen(&addr)?
            .with_config(builder.config)
            .with_routes(builder.registry))
    }

    pub fn with_routes(mut self, registry: RouteRegistry<Handler>) -> Self {
        self.registry = registry;
        self
    }

    /// Overrides the configuration. The listen address is kept.
    pub fn with_config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Binds every worker's listener and starts the workers.
    ///
    /// The route table is built once on the calling thread first, so a bad
    /// table fails here rather than inside a worker.
    pub fn start(self) -> Result<ServerHandle, TransportError> {
        self.registry.build(&self.config.router)?;

        let threads = match self.config.threads {
            0 => num_cpus::get(),
            n => n,
        };

        // The first bind resolves port 0; the rest share the resolved port.
        let first = bind_reuseport(self.addr)?;
        let local_addr = first.local_addr()?;
        let mut listeners = vec![first];
        for _ in 1..threads {
            listeners.push(bind_reuseport(local_addr)?);
        }
        tracing::info!("RoutexServer: {} workers listening on {}", threads, local_addr);

        let cores = if self.config.pin_cores {
            core_affinity::get_core_ids().unwrap_or_default()
        } else {
            Vec::new()
        };

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut workers = Vec::with_capacity(threads);
        for (id, listener) in listeners.into_iter().enumerate() {
            let registry = self.registry.clone();
            let config = self.config.clone();
            let shutdown = shutdown_rx.clone();
            let core = (!cores.is_empty()).then(|| cores[id % cores.len()]);

            let worker = std::thread::Builder::new()
                .name(format!("routex-worker-{}", id))
                .spawn(move || {
                    if let Some(core) = core {
                        if !core_affinity::set_for_current(core) {
                            tracing::warn!("Worker {}: failed to pin to core {}", id, core.id);
                        }
                    }
                    if let Err(e) = run_worker(id, listener, registry, config, shutdown) {
                        tracing::error!("Worker {} stopped: {}", id, e);
                    }
                })?;
            workers.push(worker);
        }

        Ok(ServerHandle {
            local_addr,
            shutdown: shutdown_tx,
            workers,
        })
    }
}

/// A running server. Dropping the handle also stops the workers.
#[derive(Debug)]
pub struct ServerHandle {
    local_addr: SocketAddr,
    shutdown: watch::Sender<bool>,
    workers: Vec<JoinHandle<()>>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Stops accepting, then blocks until every worker has exited.
    ///
    /// Connections already being served are dropped with their worker.
    pub fn shutdown(self) -> Result<(), TransportError> {
        let _ = self.shutdown.send(true);
        for (id, worker) in self.workers.into_iter().enumerate() {
            worker.join().map_err(|_| TransportError::WorkerPanicked(id))?;
        }
        tracing::info!("RoutexServer: shut down");
        Ok(())
    }
}

fn run_worker(
    id: usize,
    listener: StdListener,
    registry: RouteRegistry<Handler>,
    config: ServerConfig,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), TransportError> {
    let rt = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    let router = Rc::new(RefCell::new(registry.build(&config.router)?));
    let max_head = config.max_request_line;
    let local = tokio::task::LocalSet::new();

    local.block_on(&rt, async move {
        let listener = tokio::net::TcpListener::from_std(listener)?;
        tracing::debug!("Worker {}: serving {} routes", id, router.borrow().route_count());
        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                accepted = listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(conn) => conn,
                        Err(e) => {
                            tracing::warn!("Worker {}: accept failed: {}", id, e);
                            continue;
                        }
                    };
                    if let Err(e) = stream.set_nodelay(true) {
                        tracing::debug!("Worker {}: TCP_NODELAY on {} failed: {}", id, peer, e);
                    }
                    let router = Rc::clone(&router);
                    tokio::task::spawn_local(async move {
                        if let Err(e) = serve_connection(stream, router, max_head).await {
                            tracing::debug!("Connection from {} ended: {}", peer, e);
                        }
                    });
                }
            }
        }
        Ok::<(), TransportError>(())
    })
}

fn bind_reuseport(addr: SocketAddr) -> Result<StdListener, TransportError> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    socket.set_reuse_port(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(1024)?;
    Ok(socket.into())
}
