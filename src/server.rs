//! Accept loop with connection-level timeouts.
//!
//! `axum::serve` has no knobs for header read or idle keep-alive timeouts, so
//! connections are driven through `hyper-util` directly.

use std::{
    future::Future,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use axum::{Router, extract::Request};
use hyper::body::Incoming;
use hyper_util::{
    rt::{TokioExecutor, TokioIo, TokioTimer},
    server::conn::auto,
    service::TowerToHyperService,
};
use tokio::{
    net::{TcpListener, TcpStream},
    sync::watch,
    task::JoinSet,
    time::{self, Instant},
};
use tower::ServiceExt;

use crate::config::Config;

/// Serves `app` until `signal` resolves, then lets open connections finish
/// their in-flight requests.
pub async fn serve(
    listener: TcpListener,
    app: Router,
    config: Config,
    signal: impl Future<Output = ()>,
) {
    let builder = connection_builder(&config);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut connections = JoinSet::new();
    tokio::pin!(signal);

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    tracing::trace!(%peer, "Accepted connection");
                    connections.spawn(serve_connection(
                        stream,
                        app.clone(),
                        builder.clone(),
                        config.idle_timeout,
                        shutdown_rx.clone(),
                    ));
                }
                Err(err) => {
                    tracing::warn!(error = %err, "Failed to accept connection");
                    time::sleep(Duration::from_secs(1)).await;
                }
            },
            () = &mut signal => break,
        }
        while connections.try_join_next().is_some() {}
    }

    shutdown_tx.send_replace(true);
    while connections.join_next().await.is_some() {}
}

fn connection_builder(config: &Config) -> auto::Builder<TokioExecutor> {
    let mut builder = auto::Builder::new(TokioExecutor::new());
    builder
        .http1()
        .timer(TokioTimer::new())
        .header_read_timeout(config.request_timeout)
        .keep_alive(true);
    builder.http2().timer(TokioTimer::new());
    builder
}

async fn serve_connection(
    stream: TcpStream,
    app: Router,
    builder: auto::Builder<TokioExecutor>,
    idle_timeout: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let activity = Activity::default();
    let service = {
        let activity = activity.clone();
        tower::service_fn(move |request: Request<Incoming>| {
            let app = app.clone();
            let guard = activity.begin();
            async move {
                let response = app.oneshot(request).await;
                drop(guard);
                response
            }
        })
    };

    let conn = builder
        .serve_connection_with_upgrades(TokioIo::new(stream), TowerToHyperService::new(service));
    tokio::pin!(conn);

    let mut closing = false;
    loop {
        tokio::select! {
            result = conn.as_mut() => {
                if let Err(err) = result {
                    tracing::debug!(error = %err, "Connection closed with error");
                }
                break;
            }
            () = time::sleep_until(activity.next_check(idle_timeout)), if !closing => {
                if activity.is_idle(idle_timeout) {
                    tracing::debug!("Closing idle connection");
                    conn.as_mut().graceful_shutdown();
                    closing = true;
                }
            }
            _ = shutdown.changed(), if !closing => {
                conn.as_mut().graceful_shutdown();
                closing = true;
            }
        }
    }
}

/// Tracks requests in flight on one connection and when it last did work.
#[derive(Clone)]
struct Activity(Arc<ActivityInner>);

struct ActivityInner {
    in_flight: AtomicUsize,
    last_seen: Mutex<Instant>,
}

impl Default for Activity {
    fn default() -> Self {
        Self(Arc::new(ActivityInner {
            in_flight: AtomicUsize::new(0),
            last_seen: Mutex::new(Instant::now()),
        }))
    }
}

impl Activity {
    fn begin(&self) -> ActivityGuard {
        self.0.in_flight.fetch_add(1, Ordering::SeqCst);
        self.touch();
        ActivityGuard(self.clone())
    }

    fn touch(&self) {
        *self.last_seen() = Instant::now();
    }

    fn last_seen(&self) -> std::sync::MutexGuard<'_, Instant> {
        self.0.last_seen.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// When the idle deadline falls; a busy connection is checked again a
    /// full timeout from now.
    fn next_check(&self, idle_timeout: Duration) -> Instant {
        let due = *self.last_seen() + idle_timeout;
        let now = Instant::now();
        if due > now { due } else { now + idle_timeout }
    }

    fn is_idle(&self, idle_timeout: Duration) -> bool {
        self.0.in_flight.load(Ordering::SeqCst) == 0 && self.last_seen().elapsed() >= idle_timeout
    }
}

struct ActivityGuard(Activity);

impl Drop for ActivityGuard {
    fn drop(&mut self) {
        self.0.touch();
        self.0.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}
