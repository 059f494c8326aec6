//! `ducksearch serve`: a minimal HTTP surface over the execution pipeline
//! (spec §6). `GET /health` for liveness, `GET /report?report=<relative
//! path>` (with the request's query parameters folded into the report's
//! payload) for everything else. Kept deliberately small — `tiny_http`
//! gives us just enough to avoid hand-rolling HTTP framing, the same
//! tradeoff the teacher workspace makes for its own callback listener.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use ducksearch_core::{DucksearchError, Envelope};
use duckdb::Connection;
use serde_json::Value;
use tiny_http::{Method, Response, Server};

use crate::config::DucksearchConfig;

pub struct ServeOptions {
    pub host: String,
    pub port: u16,
    pub workers: usize,
    pub dev: bool,
}

/// Run the HTTP server until the process is killed.
///
/// # Errors
///
/// Returns an error if the listener can't bind `host:port`.
pub fn run(
    root: PathBuf,
    config: DucksearchConfig,
    options: ServeOptions,
) -> anyhow::Result<()> {
    let address = format!("{}:{}", options.host, options.port);
    let server = Arc::new(
        Server::http(&address).map_err(|e| anyhow::anyhow!("failed to bind {address}: {e}"))?,
    );
    tracing::info!(%address, workers = options.workers, dev = options.dev, "ducksearch serve listening");

    let mut handles = Vec::with_capacity(options.workers);
    for worker_id in 0..options.workers.max(1) {
        let server = Arc::clone(&server);
        let root = root.clone();
        let config = config.clone();
        let dev = options.dev;
        handles.push(std::thread::spawn(move || worker_loop(worker_id, &server, &root, &config, dev)));
    }
    for handle in handles {
        let _ = handle.join();
    }
    Ok(())
}

fn worker_loop(worker_id: usize, server: &Server, root: &PathBuf, config: &DucksearchConfig, dev: bool) {
    for request in server.incoming_requests() {
        tracing::debug!(worker_id, method = %request.method(), url = %request.url(), "request");
        handle_request(request, root, config, dev);
    }
}

fn handle_request(request: tiny_http::Request, root: &PathBuf, config: &DucksearchConfig, dev: bool) {
    let url = request.url().to_string();
    let method = request.method().clone();

    let (body, status): (String, u16) = match (method, url.split('?').next().unwrap_or("")) {
        (Method::Get, "/health") => (r#"{"ok":true}"#.to_string(), 200),
        (Method::Get, "/report") => {
            let body = handle_report_request(&url, root, config, dev);
            let status = if body.contains("\"ok\":true") { 200 } else { 400 };
            (body, status)
        }
        _ => (
            r#"{"ok":false,"error":{"code":"NotFound","message":"unknown route"}}"#.to_string(),
            404,
        ),
    };
    let response = Response::from_string(body).with_status_code(status);

    let _ = request.respond(response);
}

fn handle_report_request(url: &str, root: &PathBuf, config: &DucksearchConfig, dev: bool) -> String {
    let query = url.split_once('?').map_or("", |(_, q)| q);
    let params = parse_query(query);

    let Some(report_relative) = params.get("report") else {
        let error = DucksearchError::PathMissing("missing required query parameter: report".into());
        return serde_json::to_string(&Envelope::failure(&error)).unwrap_or_default();
    };

    let payload: BTreeMap<String, Value> = params
        .iter()
        .filter(|(k, _)| *k != "report")
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();

    let envelope = match run_report(root, report_relative, &payload, config, dev) {
        Ok(result) => Envelope::success(&result, root),
        Err(err) => {
            let error: DucksearchError = err.into();
            Envelope::failure(&error)
        }
    };

    serde_json::to_string(&envelope).unwrap_or_default()
}

fn run_report(
    root: &PathBuf,
    report_relative: &str,
    payload: &BTreeMap<String, Value>,
    config: &DucksearchConfig,
    dev: bool,
) -> Result<ducksearch_core::ExecutionResult, ducksearch_exec::ExecError> {
    let layout = ducksearch_parser::validate_root(root)?;
    let conn = if dev {
        Connection::open_in_memory()?
    } else {
        Connection::open(layout.cache_dir.join("ducksearch.db"))?
    };
    ducksearch_exec::execute_report(
        &layout,
        &conn,
        std::path::Path::new(report_relative),
        payload,
        &config.values,
        None,
    )
}

fn parse_query(query: &str) -> BTreeMap<String, String> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            Some((urldecode(key), urldecode(value)))
        })
        .collect()
}

fn urldecode(s: &str) -> String {
    let with_spaces = s.replace('+', " ");
    let bytes = with_spaces.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
            if let Some(byte) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}
