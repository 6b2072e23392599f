use std::io;
use std::path::Path;

use anyhow::{Context, bail};
use tokio::fs::{self, File};
use tracing::{debug, error};
use url::Url;

use crate::config::StaticFilesConfig;
use crate::http::body::BodyReader;
use crate::http::response::{Response, ResponseBuilder, StatusCode};
use crate::router::listing::{ListingEntry, render_listing};

/// Maximum number of path components to prevent deeply nested lookups
const MAX_PATH_COMPONENTS: usize = 32;

/// Serves files and directory listings from a root directory.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    config: StaticFilesConfig,
}

impl StaticFiles {
    pub fn new(config: StaticFilesConfig) -> Self {
        Self { config }
    }

    /// URI prefix this service answers under, e.g. `/files/`.
    pub fn mount(&self) -> &str {
        &self.config.mount
    }

    /// Answers a request for `target`, the URI with the mount stripped.
    ///
    /// Anything that cannot be resolved or opened is a 404.
    pub async fn serve(&self, target: &str) -> Response {
        let components = match sanitize(target) {
            Ok(c) => c,
            Err(e) => {
                debug!(target, error = %e, "rejected static path");
                return Response::not_found();
            }
        };

        let path = components.iter().fold(self.config.root.clone(), |p, c| p.join(c));
        match self.open(&path, &components).await {
            Ok(response) => response,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "static lookup failed");
                Response::not_found()
            }
        }
    }

    async fn open(&self, path: &Path, components: &[String]) -> io::Result<Response> {
        if fs::metadata(path).await?.is_file() {
            return file_response(path).await;
        }

        let index = path.join(&self.config.index_file);
        if fs::metadata(&index).await.is_ok_and(|m| m.is_file()) {
            return file_response(&index).await;
        }

        let title = format!("{}{}", self.config.mount, components.join("/"));
        let entries = read_entries(path).await?;
        let html = match render_listing(&title, &entries) {
            Ok(html) => html,
            Err(e) => {
                error!(path = %path.display(), error = %e, "listing template failed");
                return Ok(Response::status_only(StatusCode::InternalServerError));
            }
        };

        Ok(ResponseBuilder::new(StatusCode::Ok)
            .header("Content-Type", "text/html; charset=utf-8")
            .body(BodyReader::from_memory(html))
            .build())
    }
}

async fn file_response(path: &Path) -> io::Result<Response> {
    let file = File::open(path).await?;
    let size = file.metadata().await?.len();
    let mime = mime_guess::from_path(path).first_or_octet_stream();

    Ok(ResponseBuilder::new(StatusCode::Ok)
        .header("Content-Type", mime.essence_str())
        .body(BodyReader::from_file(file, size))
        .build())
}

async fn read_entries(dir: &Path) -> io::Result<Vec<ListingEntry>> {
    let mut entries = Vec::new();
    let mut read_dir = fs::read_dir(dir).await?;

    while let Some(entry) = read_dir.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        let meta = entry.metadata().await?;
        entries.push(ListingEntry {
            name,
            is_dir: meta.is_dir(),
            size: meta.len(),
        });
    }

    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

/// Turns a request target into safe, decoded path components.
///
/// Query strings and fragments are dropped. Traversal (`..`, `.`, also
/// percent-encoded), hidden names, and separator or NUL bytes smuggled in
/// through percent-encoding are rejected.
pub fn sanitize(target: &str) -> anyhow::Result<Vec<String>> {
    // `url` would resolve dot segments away, so they are refused up front.
    let raw_path = target.split(['?', '#']).next().unwrap_or_default();
    for raw in raw_path.split(['/', '\\']) {
        let segment = urlencoding::decode(raw).context("invalid URL encoding")?;
        if segment == ".." || segment == "." {
            bail!("path traversal attempt detected");
        }
    }

    // Always relative to the root, even for `//host` or `scheme:` look-alikes.
    let url = Url::parse(&format!("http://localhost/{target}")).context("invalid request target")?;

    let mut components = Vec::new();
    for raw in url.path().split('/').filter(|s| !s.is_empty()) {
        let component = urlencoding::decode(raw).context("invalid URL encoding")?;

        if component.starts_with('.') {
            bail!("access to hidden files denied");
        }
        if component.contains(['/', '\\', '\0']) {
            bail!("invalid characters in path component");
        }
        components.push(component.into_owned());
    }

    if components.len() > MAX_PATH_COMPONENTS {
        bail!("too many path components");
    }
    Ok(components)
}
