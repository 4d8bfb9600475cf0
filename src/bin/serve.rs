//! Page server for termfolio
//!
//! Serves the terminal page with full form round-trips, so it works with
//! JavaScript turned off, plus the static files and their inventory.
//!
//! Usage: serve [PORT] [--static DIR] [--kv DIR] [--production]

use futures::executor::block_on;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use termfolio::console_log;
use termfolio::controller::{ActionOutcome, Controller, Form};
use termfolio::fetch::{is_hidden, relative_path, DirFetch};
use termfolio::inventory::StaticFiles;
use termfolio::session::{select_backend, CookieJar, FileKv};
use termfolio::{Interpreter, TerminalConfig};
use tiny_http::{Header, Method, Request, Response, Server};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_STATIC_DIR: &str = "static";

type HttpResponse = Response<Cursor<Vec<u8>>>;

/// Server settings from the command line, then the environment
#[derive(Debug, Clone, PartialEq, Eq)]
struct ServeConfig {
    port: u16,
    static_dir: PathBuf,
    /// File-backed KV store; cookies hold the history when unset
    kv_dir: Option<PathBuf>,
    /// Marks cookies `Secure`
    production: bool,
}

impl ServeConfig {
    fn parse(
        args: impl IntoIterator<Item = String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, String> {
        let mut port: Option<u16> = None;
        let mut static_dir: Option<PathBuf> = None;
        let mut kv_dir: Option<PathBuf> = None;
        let mut production = false;

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--static" => {
                    static_dir = Some(args.next().ok_or("--static needs a directory")?.into())
                }
                "--kv" => kv_dir = Some(args.next().ok_or("--kv needs a directory")?.into()),
                "--production" => production = true,
                other => {
                    let p = other
                        .parse()
                        .map_err(|_| format!("unexpected argument: {}", other))?;
                    port = Some(p);
                }
            }
        }

        Ok(Self {
            port: port.unwrap_or(DEFAULT_PORT),
            static_dir: static_dir
                .or_else(|| env("TERMFOLIO_STATIC").map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR)),
            kv_dir: kv_dir.or_else(|| env("TERMFOLIO_KV").map(PathBuf::from)),
            production: production || env("TERMFOLIO_ENV").as_deref() == Some("production"),
        })
    }
}

struct App {
    controller: Controller,
    fetch: DirFetch,
    static_dir: PathBuf,
}

fn main() {
    let config = ServeConfig::parse(std::env::args().skip(1), |key| std::env::var(key).ok())
        .unwrap_or_else(|e| {
            eprintln!("serve: {}", e);
            eprintln!("usage: serve [PORT] [--static DIR] [--kv DIR] [--production]");
            std::process::exit(2);
        });

    let files = StaticFiles::scan(&config.static_dir).unwrap_or_else(|e| {
        console_log!(
            "[serve] Can't read {}: {}, using the built-in file list",
            config.static_dir.display(),
            e
        );
        StaticFiles::build_time()
    });

    let kv = config.kv_dir.as_ref().and_then(|dir| match FileKv::open(dir) {
        Ok(kv) => Some(kv),
        Err(e) => {
            console_log!("[serve] KV store at {} unavailable: {}", dir.display(), e);
            None
        }
    });
    let store = select_backend(kv);

    let table = TerminalConfig::embedded().expect("Invalid command table");
    let app = App {
        controller: Controller::new(Interpreter::new(table, files), store, config.production),
        fetch: DirFetch::new(&config.static_dir),
        static_dir: config.static_dir.clone(),
    };

    let addr = format!("0.0.0.0:{}", config.port);
    let server = Server::http(&addr).expect("Failed to start server");

    println!("┌─────────────────────────────────────┐");
    println!("│  termfolio                          │");
    println!("├─────────────────────────────────────┤");
    println!("│  http://localhost:{}              │", config.port);
    println!("└─────────────────────────────────────┘");
    console_log!("[serve] History backend: {}", app.controller.store().name());

    for mut request in server.incoming_requests() {
        let response = handle(&app, &mut request);
        let _ = request.respond(response);
    }
}

fn header(name: &str, value: &str) -> Option<Header> {
    Header::from_bytes(name, value).ok()
}

fn request_header(request: &Request, name: &'static str) -> Option<String> {
    request
        .headers()
        .iter()
        .find(|h| h.field.equiv(name))
        .map(|h| h.value.as_str().to_string())
}

fn with_cookies(mut response: HttpResponse, jar: &CookieJar) -> HttpResponse {
    for value in jar.set_cookie_headers() {
        if let Some(h) = header("Set-Cookie", &value) {
            response.add_header(h);
        }
    }
    response
}

fn not_found() -> HttpResponse {
    let mut response = Response::from_string("404 Not Found").with_status_code(404);
    if let Some(h) = header("Content-Type", "text/plain") {
        response.add_header(h);
    }
    response
}

fn handle(app: &App, request: &mut Request) -> HttpResponse {
    let url = request.url().to_string();
    let (path, query) = match url.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (url.as_str(), None),
    };

    let method = request.method().clone();
    match (&method, path, query) {
        (Method::Get, "/", _) => page(app, request),
        (Method::Post, "/", Some("/execute")) => action(app, request, Action::Execute),
        (Method::Post, "/", Some("/persist")) => action(app, request, Action::Persist),
        (Method::Get, "/api/files", _) => {
            json(app.controller.interpreter().files().to_json())
        }
        (Method::Get, _, _) => serve_file(&app.static_dir, path),
        _ => not_found(),
    }
}

fn page(app: &App, request: &Request) -> HttpResponse {
    let mut jar = CookieJar::from_header(request_header(request, "Cookie").as_deref());
    let data = app.controller.load(&mut jar);
    let mut response = Response::from_string(termfolio::view::render_page(&data));
    if let Some(h) = header("Content-Type", "text/html; charset=utf-8") {
        response.add_header(h);
    }
    with_cookies(response, &jar)
}

#[derive(Clone, Copy)]
enum Action {
    Execute,
    Persist,
}

fn action(app: &App, request: &mut Request, action: Action) -> HttpResponse {
    let mut jar = CookieJar::from_header(request_header(request, "Cookie").as_deref());
    let wants_json = request_header(request, "Accept")
        .map(|accept| accept.contains("application/json"))
        .unwrap_or(false);

    let mut body = Vec::new();
    let outcome = match request.as_reader().read_to_end(&mut body) {
        Ok(_) => {
            let form = Form::parse(&body);
            match action {
                Action::Execute => block_on(app.controller.execute(&form, &mut jar, &app.fetch)),
                Action::Persist => block_on(app.controller.persist(&form, &mut jar, &app.fetch)),
            }
        }
        Err(e) => {
            console_log!("[serve] Error reading request body: {}", e);
            ActionOutcome::failure()
        }
    };

    let response = if wants_json {
        json(serde_json::to_string(&outcome).unwrap_or_else(|_| "{}".to_string()))
    } else {
        // Post/redirect/get: the page reloads with the new history
        let mut response = Response::from_data(Vec::new()).with_status_code(303);
        if let Some(h) = header("Location", "/") {
            response.add_header(h);
        }
        response
    };
    with_cookies(response, &jar)
}

fn json(body: String) -> HttpResponse {
    let mut response = Response::from_string(body);
    if let Some(h) = header("Content-Type", "application/json") {
        response.add_header(h);
    }
    response
}

fn serve_file(root: &Path, url_path: &str) -> HttpResponse {
    let Ok(relative) = relative_path(url_path) else {
        return not_found();
    };
    if is_hidden(&relative) {
        return not_found();
    }

    let path = root.join(relative);
    match std::fs::read(&path) {
        Ok(contents) => {
            let mut response = Response::from_data(contents);
            if let Some(h) = header("Content-Type", mime_type(&path)) {
                response.add_header(h);
            }
            response
        }
        Err(_) => not_found(),
    }
}

fn mime_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html") => "text/html; charset=utf-8",
        Some("md") => "text/markdown; charset=utf-8",
        Some("txt") | Some("asc") => "text/plain; charset=utf-8",
        Some("xml") => "application/xml",
        Some("js") => "application/javascript",
        Some("wasm") => "application/wasm",
        Some("css") => "text/css",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        _ => "application/octet-stream",
    }
}
