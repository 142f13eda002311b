//! HTTP server for the admin listing, the save action, and public pages.
//!
//! ## Routes
//!
//! | Method | Path                | Response                                   |
//! |--------|---------------------|--------------------------------------------|
//! | GET    | `/admin/seo`        | Listing HTML (`?q=` filters by label/slug) |
//! | GET    | `/admin/seo.json`   | Listing rows as JSON                       |
//! | POST   | `/admin/seo`        | Save action, JSON in and out               |
//! | POST   | `/admin/revalidate` | Invalidate every page                      |
//! | GET    | page path           | Page skeleton with resolved `<head>`       |
//!
//! Rendered pages and the unfiltered admin listing go through the
//! [`PageCache`], which is the cache the save action revalidates. Cached
//! responses carry an `ETag`; a matching `If-None-Match` gets a 304.
//! Request bodies over [`MAX_BODY_BYTES`] get a 413.
//!
//! ## Threading
//!
//! `tiny_http` accepts on the calling thread. Each request is handed to a
//! rayon pool worker, which drives the async handler to completion on the
//! shared tokio runtime with `Handle::block_on`. Handlers are plain
//! functions of (state, request parts) → [`Reply`], so they are tested
//! without sockets.

use crate::admin::{AdminActions, SaveError, SaveRequest, SaveResponse};
use crate::cache::PageCache;
use crate::config::{LimitsConfig, ServeConfig, SiteConfig};
use crate::head::{MetadataOverrides, page_metadata_with_status};
use crate::pages::{self, ADMIN_SEO_PATH, PAGES};
use crate::render::{ListingView, render_admin_page, render_public_page};
use crate::resolve::SeoResolver;
use crate::revalidate::RevalidationDispatcher;
use crate::session::SeoAdminSession;
use crate::store::SeoStore;
use crate::types::SeoPageConfig;
use percent_encoding::percent_decode_str;
use serde::Serialize;
use std::future::Future;
use std::io::Read;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

pub const ADMIN_SEO_JSON_PATH: &str = "/admin/seo.json";
pub const ADMIN_REVALIDATE_PATH: &str = "/admin/revalidate";

const HTML: &str = "text/html; charset=utf-8";
const JSON: &str = "application/json";
const PLAIN: &str = "text/plain; charset=utf-8";

/// Largest request body accepted. Save requests are a few hundred bytes.
pub const MAX_BODY_BYTES: u64 = 64 * 1024;

#[derive(Error, Debug)]
pub enum ServeError {
    #[error("failed to bind {addr}: {reason}")]
    Bind { addr: SocketAddr, reason: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("invalid header {0}")]
    Header(String),
}

/// Everything a request handler needs, shared across workers.
#[derive(Debug)]
pub struct AppState<S> {
    resolver: SeoResolver<S>,
    actions: AdminActions<S, PageCache>,
    cache: Arc<PageCache>,
    limits: LimitsConfig,
}

impl<S: SeoStore> AppState<S> {
    pub fn new(store: Arc<S>, config: &SiteConfig) -> Self {
        Self::with_pages(store, config, PAGES)
    }

    pub fn with_pages(store: Arc<S>, config: &SiteConfig, pages: &'static [SeoPageConfig]) -> Self {
        let cache = Arc::new(PageCache::new());
        let dispatcher = RevalidationDispatcher::new(Arc::clone(&cache)).with_pages(pages);
        Self {
            resolver: SeoResolver::new(Arc::clone(&store), config).with_pages(pages),
            actions: AdminActions::new(store, dispatcher),
            cache,
            limits: config.limits,
        }
    }

    pub fn cache(&self) -> &PageCache {
        &self.cache
    }

    pub fn resolver(&self) -> &SeoResolver<S> {
        &self.resolver
    }
}

// ============================================================================
// Routing
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    AdminListing { query: String },
    AdminJson,
    Save,
    RevalidateAll,
    Page(&'static SeoPageConfig),
    MethodNotAllowed,
    NotFound,
}

/// Split `url` into a decoded path and the decoded `q` query parameter.
fn split_url(url: &str) -> (String, String) {
    let (path, query) = url.split_once('?').unwrap_or((url, ""));
    let path = percent_decode_str(path).decode_utf8_lossy().into_owned();
    let search = query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == "q")
        .map(|(_, value)| {
            percent_decode_str(&value.replace('+', " "))
                .decode_utf8_lossy()
                .into_owned()
        })
        .unwrap_or_default();
    (path, search)
}

pub fn route(method: &Method, url: &str, pages: &'static [SeoPageConfig]) -> Route {
    let (path, query) = split_url(url);
    let path = path.trim_end_matches('/');

    match (method, path) {
        (Method::Get, ADMIN_SEO_PATH) => Route::AdminListing { query },
        (Method::Post, ADMIN_SEO_PATH) => Route::Save,
        (Method::Get, ADMIN_SEO_JSON_PATH) => Route::AdminJson,
        (Method::Post, ADMIN_REVALIDATE_PATH) => Route::RevalidateAll,
        (_, ADMIN_SEO_PATH | ADMIN_SEO_JSON_PATH | ADMIN_REVALIDATE_PATH) => {
            Route::MethodNotAllowed
        }
        (method, path) => match pages::find_by_path(pages, path) {
            Some(page) if *method == Method::Get => Route::Page(page),
            Some(_) => Route::MethodNotAllowed,
            None => Route::NotFound,
        },
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// A response, independent of the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
    pub etag: Option<String>,
}

impl Reply {
    fn new(status: u16, content_type: &'static str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            content_type,
            body: body.into(),
            etag: None,
        }
    }

    fn json<T: Serialize>(status: u16, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self::new(status, JSON, body),
            Err(e) => Self::new(500, PLAIN, format!("500 {e}")),
        }
    }

    fn not_modified(etag: String) -> Self {
        Self {
            etag: Some(etag),
            ..Self::new(304, HTML, Vec::new())
        }
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[derive(Debug, Serialize)]
struct RevalidateResponse {
    success: bool,
    count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Handle one request. Never fails: errors become error replies.
pub async fn handle<S: SeoStore>(
    state: &AppState<S>,
    method: &Method,
    url: &str,
    body: &str,
    if_none_match: Option<&str>,
) -> Reply {
    match route(method, url, state.resolver.pages()) {
        Route::AdminListing { query } => admin_listing(state, &query, if_none_match).await,
        Route::AdminJson => admin_json(state).await,
        Route::Save => save(state, body).await,
        Route::RevalidateAll => revalidate_all(state).await,
        Route::Page(page) => public_page(state, page, if_none_match).await,
        Route::MethodNotAllowed => Reply::new(405, PLAIN, "405 Method Not Allowed"),
        Route::NotFound => Reply::new(404, PLAIN, "404 Not Found"),
    }
}

/// Serve `path` from the cache, rendering and caching it on a miss.
///
/// `render` yields the HTML and whether it may be cached. It is only polled
/// on a miss. A render that an invalidation overtook is served once but not
/// cached.
async fn cached_html(
    cache: &PageCache,
    path: &str,
    if_none_match: Option<&str>,
    render: impl Future<Output = (String, bool)>,
) -> Reply {
    let page = match cache.get(path).await {
        Some(page) => page,
        None => {
            let generation = cache.generation(path).await;
            let (html, cacheable) = render.await;
            if !cacheable {
                return Reply::new(200, HTML, html);
            }
            match cache.insert_if_generation(path, generation, html.as_str()).await {
                Some(page) => page,
                None => return Reply::new(200, HTML, html),
            }
        }
    };

    if if_none_match == Some(page.etag.as_str()) {
        return Reply::not_modified(page.etag);
    }
    Reply {
        etag: Some(page.etag),
        ..Reply::new(200, HTML, page.html.as_bytes())
    }
}

/// Listing HTML, and whether it reflects the store (safe to cache).
async fn render_listing<S: SeoStore>(state: &AppState<S>, query: &str) -> (String, bool) {
    let session = SeoAdminSession::load(&state.resolver, state.limits).await;
    let view = ListingView::from_session(&session, state.resolver.base_url(), query);
    (
        render_admin_page(&view).into_string(),
        session.load_error().is_none(),
    )
}

async fn admin_listing<S: SeoStore>(
    state: &AppState<S>,
    query: &str,
    if_none_match: Option<&str>,
) -> Reply {
    if !query.trim().is_empty() {
        let (html, _) = render_listing(state, query).await;
        return Reply::new(200, HTML, html);
    }
    cached_html(
        &state.cache,
        ADMIN_SEO_PATH,
        if_none_match,
        render_listing(state, ""),
    )
    .await
}

async fn admin_json<S: SeoStore>(state: &AppState<S>) -> Reply {
    match state.resolver.list_all().await {
        Ok(rows) => Reply::json(200, &rows),
        Err(e) => {
            warn!(error = %e, "admin listing unavailable");
            Reply::json(503, &SaveResponse::failed(e))
        }
    }
}

async fn save<S: SeoStore>(state: &AppState<S>, body: &str) -> Reply {
    let request: SaveRequest = match serde_json::from_str(body) {
        Ok(request) => request,
        Err(e) => return Reply::json(400, &SaveResponse::failed(format!("invalid request: {e}"))),
    };

    match state.actions.upsert(&request).await {
        Ok(_) => Reply::json(200, &SaveResponse::ok()),
        Err(e @ SaveError::InFlight(_)) => Reply::json(409, &SaveResponse::failed(e)),
        Err(e @ SaveError::Store(_)) => Reply::json(500, &SaveResponse::failed(e)),
    }
}

async fn revalidate_all<S: SeoStore>(state: &AppState<S>) -> Reply {
    match state.actions.dispatcher().revalidate_all().await {
        Ok(count) => Reply::json(
            200,
            &RevalidateResponse {
                success: true,
                count,
                error: None,
            },
        ),
        Err(e) => Reply::json(
            500,
            &RevalidateResponse {
                success: false,
                count: 0,
                error: Some(e.to_string()),
            },
        ),
    }
}

async fn public_page<S: SeoStore>(
    state: &AppState<S>,
    page: &'static SeoPageConfig,
    if_none_match: Option<&str>,
) -> Reply {
    let render = async {
        let (meta, degraded) =
            page_metadata_with_status(&state.resolver, page.slug, &MetadataOverrides::default())
                .await;
        (render_public_page(&meta, page.label).into_string(), !degraded)
    };
    cached_html(&state.cache, page.path, if_none_match, render).await
}

// ============================================================================
// Transport
// ============================================================================

fn header(key: &str, value: &str) -> Result<Header, ServeError> {
    Header::from_bytes(key.as_bytes(), value.as_bytes())
        .map_err(|()| ServeError::Header(format!("{key}: {value}")))
}

fn request_header(request: &Request, name: &str) -> Option<String> {
    request
        .headers()
        .iter()
        .find(|h| h.field.as_str().as_str().eq_ignore_ascii_case(name))
        .map(|h| h.value.to_string())
}

/// Read at most `limit` bytes of body. `None` if the body is longer.
fn read_body(reader: impl Read, limit: u64) -> std::io::Result<Option<String>> {
    let mut bytes = Vec::new();
    reader.take(limit + 1).read_to_end(&mut bytes)?;
    if bytes.len() as u64 > limit {
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
}

fn serve_request<S: SeoStore>(
    mut request: Request,
    state: &AppState<S>,
    runtime: &Handle,
) -> Result<(), ServeError> {
    let method = request.method().clone();
    let url = request.url().to_string();
    let if_none_match = request_header(&request, "If-None-Match");

    let reply = match read_body(request.as_reader(), MAX_BODY_BYTES)? {
        Some(body) => runtime.block_on(handle(
            state,
            &method,
            &url,
            &body,
            if_none_match.as_deref(),
        )),
        None => {
            warn!(url = %url, limit = MAX_BODY_BYTES, "request body too large");
            Reply::json(413, &SaveResponse::failed("request body too large"))
        }
    };
    debug!(?method, url = %url, status = reply.status, "request");

    let mut response = Response::from_data(reply.body)
        .with_status_code(StatusCode(reply.status))
        .with_header(header("Content-Type", reply.content_type)?);
    if let Some(etag) = &reply.etag {
        response = response.with_header(header("ETag", etag)?);
    }
    request.respond(response)?;
    Ok(())
}

/// Bind and serve until the process is stopped.
pub fn run<S: SeoStore + 'static>(
    state: Arc<AppState<S>>,
    config: &ServeConfig,
    runtime: Handle,
) -> Result<(), ServeError> {
    let addr = SocketAddr::new(config.interface, config.port);
    let server = Server::http(addr).map_err(|e| ServeError::Bind {
        addr,
        reason: e.to_string(),
    })?;
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads)
        .build()?;
    info!(%addr, threads = config.threads, "serving");

    for request in server.incoming_requests() {
        let state = Arc::clone(&state);
        let runtime = runtime.clone();
        pool.spawn(move || {
            if let Err(e) = serve_request(request, &state, &runtime) {
                warn!(error = %e, "request error");
            }
        });
    }
    Ok(())
}
