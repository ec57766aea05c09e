use clap::Parser;
use robert_ai_locator::{
    AiPage, ChromeDriver, FileCacheStore, GeminiClient, ResolveOptions, SelectorResolver,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use warp::Filter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value_t = 9670)]
    port: u16,

    /// Selector cache file
    #[arg(long, default_value = robert_ai_locator::config::DEFAULT_CACHE_PATH)]
    cache_path: PathBuf,
}

#[derive(Debug, serde::Deserialize)]
struct LocateRequest {
    url: String,
    description: String,
    max_retries: Option<u32>,
    #[serde(default)]
    highlight: bool,
}

#[derive(Debug, serde::Serialize)]
struct LocateResponse {
    status: String,
    message: String,
    selector: Option<String>,
    matches: Option<usize>,
}

impl LocateResponse {
    fn error(message: String) -> Self {
        Self {
            status: "error".to_string(),
            message,
            selector: None,
            matches: None,
        }
    }
}

// Shared state
struct AppState {
    driver: Mutex<Option<ChromeDriver>>,
    resolver: Arc<SelectorResolver>,
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let args = Args::parse();

    let model = match GeminiClient::from_env() {
        Ok(client) => client,
        Err(e) => {
            log::error!("Failed to configure Gemini client: {}", e);
            std::process::exit(1);
        }
    };

    log::info!(
        "Starting locator service on port {} (model {}, cache {})",
        args.port,
        model.config().model,
        args.cache_path.display()
    );

    let state = Arc::new(AppState {
        driver: Mutex::new(None),
        resolver: Arc::new(SelectorResolver::new(
            Arc::new(FileCacheStore::new(args.cache_path)),
            Arc::new(model),
        )),
    });

    let health =
        warp::path("health").map(|| warp::reply::json(&serde_json::json!({ "status": "ok" })));

    let state_filter = warp::any().map(move || state.clone());

    let locate = warp::path("locate")
        .and(warp::post())
        .and(warp::body::json())
        .and(state_filter)
        .and_then(handle_locate);

    let routes = health.or(locate);

    // Bind manually to handle "port in use" error gracefully
    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));

    match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => {
            log::info!("Listening on http://{}", addr);
            warp::serve(routes)
                .run_incoming(tokio_stream::wrappers::TcpListenerStream::new(listener))
                .await;
        }
        Err(e) => {
            log::error!("Failed to bind to port {}: {}", args.port, e);
            eprintln!(
                "Error: Port {} is already in use or unavailable.",
                args.port
            );
            std::process::exit(1);
        }
    }
}

async fn handle_locate(
    req: LocateRequest,
    state: Arc<AppState>,
) -> Result<impl warp::Reply, warp::Rejection> {
    log::info!("Locate request: \"{}\" on {}", req.description, req.url);

    let mut driver_guard = state.driver.lock().await;

    if let Some(driver) = driver_guard.as_ref() {
        if !driver.is_alive().await {
            log::warn!("Chrome session DEAD, restarting...");
            *driver_guard = None;
        }
    }

    if driver_guard.is_none() {
        log::info!("Launching new Chrome session...");
        match ChromeDriver::launch_auto().await {
            Ok(d) => *driver_guard = Some(d),
            Err(e) => {
                log::error!("Failed to launch Chrome: {}", e);
                return Ok(warp::reply::json(&LocateResponse::error(format!(
                    "Failed to launch Chrome: {}",
                    e
                ))));
            }
        }
    }

    let Some(driver) = driver_guard.as_ref() else {
        return Ok(warp::reply::json(&LocateResponse::error(
            "No Chrome session".to_string(),
        )));
    };

    if let Err(e) = driver.navigate(&req.url).await {
        return Ok(warp::reply::json(&LocateResponse::error(e.to_string())));
    }

    let page = match driver.page_handle().await {
        Ok(p) => AiPage::new(p, state.resolver.clone()),
        Err(e) => {
            return Ok(warp::reply::json(&LocateResponse::error(format!(
                "Failed to get current page: {}",
                e
            ))));
        }
    };

    let mut options = ResolveOptions::default();
    if let Some(max_retries) = req.max_retries {
        options = options.with_max_retries(max_retries);
    }

    let selector = match page.resolve(&req.description, &options).await {
        Ok(selector) => selector,
        Err(e) => {
            log::error!("Resolution failed: {}", e);
            return Ok(warp::reply::json(&LocateResponse::error(e.to_string())));
        }
    };

    // Resolution is cached by now, so these reuse the same selector
    let matches = page
        .locator_all(&req.description, &options)
        .await
        .map(|all| all.len())
        .ok();

    if req.highlight {
        if let Err(e) = page.highlight(&req.description, &options).await {
            log::warn!("Highlight failed: {}", e);
        }
    }

    Ok(warp::reply::json(&LocateResponse {
        status: "success".to_string(),
        message: format!("Resolved \"{}\"", req.description),
        selector: Some(selector),
        matches,
    }))
}
