//! Local HTTP server for the rendered map.
//!
//! Runs actix-web on a dedicated thread so the caller can keep going (wait,
//! print the URL, launch a viewer) while the page is being served.

use std::net::SocketAddr;
use std::process::Command;
use std::thread::JoinHandle;
use std::time::Duration;

use actix_web::dev::ServerHandle;
use actix_web::{web, App, HttpResponse, HttpServer};
use anyhow::{anyhow, Context, Result};
use tokio::sync::oneshot;

use crate::render::{RenderedMap, GEOJSON_FILE, HTML_FILE};

#[derive(Clone, Debug, PartialEq)]
pub struct ServeConfig {
    pub host: String,
    pub port: u16,
    /// Pause between starting the server and announcing the URL.
    pub open_delay: Duration,
    pub open_browser: bool,
    /// Serve for a fixed period, or until interrupted when `None`.
    pub serve_for: Option<Duration>,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8000,
            open_delay: Duration::from_secs(1),
            open_browser: false,
            serve_for: None,
        }
    }
}

/// Handle for the map server thread.
pub struct MapServer {
    addr: SocketAddr,
    handle: ServerHandle,
    thread: Option<JoinHandle<()>>,
}

impl MapServer {
    pub fn url(&self) -> String {
        format!("http://{}/{}", self.addr, HTML_FILE)
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Signal a graceful stop and block until the thread exits.
    pub fn stop(mut self) {
        actix_web::rt::System::new().block_on(self.handle.stop(true));
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }

    /// Block until the server exits on its own (Ctrl-C).
    pub fn wait(mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(html_route))
        .route(&format!("/{HTML_FILE}"), web::get().to(html_route))
        .route(&format!("/{GEOJSON_FILE}"), web::get().to(geojson_route));
}

/// Spawn the server thread and wait until it is bound.
pub fn spawn_map_server(map: RenderedMap, config: &ServeConfig) -> Result<MapServer> {
    let data = web::Data::new(map);
    let bind_to = (config.host.clone(), config.port);
    let (ready_tx, ready_rx) = oneshot::channel::<std::io::Result<(ServerHandle, SocketAddr)>>();

    let thread = std::thread::Builder::new()
        .name("map-server".into())
        .spawn(move || {
            let result = actix_web::rt::System::new().block_on(async move {
                let bound = HttpServer::new(move || App::new().app_data(data.clone()).configure(routes))
                    .workers(1)
                    .bind(bind_to);
                let bound = match bound {
                    Ok(bound) => bound,
                    Err(err) => {
                        let _ = ready_tx.send(Err(err));
                        return Ok(());
                    }
                };
                let addr = bound.addrs()[0];
                let server = bound.run();
                let _ = ready_tx.send(Ok((server.handle(), addr)));
                server.await
            });
            if let Err(err) = result {
                log::error!("HTTP server error: {err}");
            }
        })
        .context("Failed to spawn map server thread")?;

    let (handle, addr) = ready_rx
        .blocking_recv()
        .map_err(|_| anyhow!("map server thread exited before binding"))?
        .with_context(|| format!("binding {}:{}", config.host, config.port))?;

    log::info!("Serving map on {addr}");
    Ok(MapServer {
        addr,
        handle,
        thread: Some(thread),
    })
}

/// Hand `url` to the platform's default opener.
pub fn open_in_browser(url: &str) -> Result<()> {
    let mut cmd = if cfg!(target_os = "macos") {
        Command::new("open")
    } else if cfg!(target_os = "windows") {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", "start", ""]);
        cmd
    } else {
        Command::new("xdg-open")
    };
    cmd.arg(url)
        .spawn()
        .with_context(|| format!("launching a browser for {url}"))?;
    Ok(())
}

async fn html_route(map: web::Data<RenderedMap>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(map.html.clone())
}

async fn geojson_route(map: web::Data<RenderedMap>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("application/geo+json")
        .body(map.geojson.clone())
}
