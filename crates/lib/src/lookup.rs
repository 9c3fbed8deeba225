//! Best-effort lookups of sections in INI documents.
//!
//! Base configuration is optional: a document that cannot be fetched or
//! parsed, or that lacks the section, yields [`Lookup::Unavailable`] rather
//! than an error. Callers decide whether that matters.

use std::fmt::Display;

use camino::Utf8PathBuf;

use crate::ini::{IniDocument, ParseError, Section};

/// Where a document comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Fetched over HTTP(S).
    Url(String),
    /// Read from the local filesystem.
    Path(Utf8PathBuf),
}

impl ConfigSource {
    /// Interpret `s` as a URL if it has an HTTP(S) scheme, otherwise as a path.
    /// A `file://` prefix is accepted for paths.
    pub fn parse(s: &str) -> Self {
        if s.starts_with("http://") || s.starts_with("https://") {
            Self::Url(s.to_string())
        } else {
            Self::Path(s.strip_prefix("file://").unwrap_or(s).into())
        }
    }
}

impl Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Url(u) => f.write_str(u),
            ConfigSource::Path(p) => write!(f, "{p}"),
        }
    }
}

/// Why a lookup came back empty.
#[derive(Debug, thiserror::Error)]
pub enum LookupFailure {
    /// The HTTP request failed.
    #[error("fetching {url}: {source}")]
    Fetch {
        /// The requested URL.
        url: String,
        /// The underlying error.
        source: reqwest::Error,
    },
    /// The server answered with a non-success status.
    #[error("fetching {url}: HTTP {status}")]
    HttpStatus {
        /// The requested URL.
        url: String,
        /// The response status.
        status: reqwest::StatusCode,
    },
    /// The local file could not be read.
    #[error("reading {path}: {source}")]
    Read {
        /// The file path.
        path: Utf8PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },
    /// The document is not valid INI.
    #[error("parsing {origin}: {source}")]
    Parse {
        /// Where the document came from.
        origin: String,
        /// The underlying error.
        source: ParseError,
    },
    /// The document has no such section.
    #[error("no section [{section}] in {origin}")]
    MissingSection {
        /// The requested section.
        section: String,
        /// Where the document came from.
        origin: String,
    },
}

/// The outcome of [`read_section`].
#[derive(Debug)]
#[must_use]
pub enum Lookup {
    /// The section's entries.
    Found(Section),
    /// The section could not be obtained.
    Unavailable(LookupFailure),
}

impl Lookup {
    /// The section, if found.
    pub fn found(self) -> Option<Section> {
        match self {
            Lookup::Found(s) => Some(s),
            Lookup::Unavailable(e) => {
                tracing::debug!("Lookup failed: {e}");
                None
            }
        }
    }

    /// The section, or an empty one if it could not be obtained.
    pub fn or_default(self) -> Section {
        self.found().unwrap_or_default()
    }
}

/// Read the section `name` from the document at `source`.
pub fn read_section(source: &ConfigSource, name: &str) -> Lookup {
    let origin = source.to_string();
    let doc = fetch(source).and_then(|text| {
        IniDocument::parse(&text).map_err(|source| LookupFailure::Parse {
            origin: origin.clone(),
            source,
        })
    });
    match doc {
        Ok(doc) => match doc.section(name) {
            Some(s) => Lookup::Found(s.clone()),
            None => Lookup::Unavailable(LookupFailure::MissingSection {
                section: name.to_string(),
                origin,
            }),
        },
        Err(e) => Lookup::Unavailable(e),
    }
}

fn fetch(source: &ConfigSource) -> Result<String, LookupFailure> {
    match source {
        ConfigSource::Url(url) => {
            tracing::debug!("Fetching {url}");
            let fetch_err = |source: reqwest::Error| LookupFailure::Fetch {
                url: url.clone(),
                source,
            };
            let resp = reqwest::blocking::get(url.as_str()).map_err(fetch_err)?;
            let status = resp.status();
            if !status.is_success() {
                return Err(LookupFailure::HttpStatus {
                    url: url.clone(),
                    status,
                });
            }
            resp.text().map_err(fetch_err)
        }
        ConfigSource::Path(path) => {
            std::fs::read_to_string(path).map_err(|source| LookupFailure::Read {
                path: path.clone(),
                source,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread::JoinHandle;

    use indoc::indoc;

    use super::*;

    /// Answer a single HTTP request on a loopback port with `status` and
    /// `body`, returning the URL of `/index` on it.
    fn serve_once(status: &str, body: &str) -> (String, JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/index", listener.local_addr().unwrap());
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let handle = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut line = String::new();
            loop {
                line.clear();
                if reader.read_line(&mut line).unwrap() == 0 || line == "\r\n" {
                    break;
                }
            }
            stream.write_all(response.as_bytes()).unwrap();
        });
        (url, handle)
    }

    fn source_with(td: &tempfile::TempDir, contents: &str) -> ConfigSource {
        let path = Utf8PathBuf::try_from(td.path().join("index")).unwrap();
        std::fs::write(&path, contents).unwrap();
        ConfigSource::Path(path)
    }

    #[test]
    fn test_source_parse() {
        assert_eq!(
            ConfigSource::parse("https://builder.libguestfs.org/index"),
            ConfigSource::Url("https://builder.libguestfs.org/index".into())
        );
        assert_eq!(
            ConfigSource::parse("file:///var/lib/vb/index"),
            ConfigSource::Path("/var/lib/vb/index".into())
        );
        assert_eq!(
            ConfigSource::parse("/var/lib/vb/index"),
            ConfigSource::Path("/var/lib/vb/index".into())
        );
    }

    #[test]
    fn test_found() {
        let td = tempfile::tempdir().unwrap();
        let src = source_with(
            &td,
            indoc! {"
                [fedora-40]
                expand=/dev/sda4
            "},
        );
        let s = read_section(&src, "fedora-40").found().unwrap();
        assert_eq!(s.get("expand").unwrap(), "/dev/sda4");
    }

    #[test]
    fn test_missing_section() {
        let td = tempfile::tempdir().unwrap();
        let src = source_with(&td, "[fedora-40]\nexpand=/dev/sda4\n");
        let r = read_section(&src, "centos-9");
        assert!(matches!(
            r,
            Lookup::Unavailable(LookupFailure::MissingSection { ref section, .. }) if section == "centos-9"
        ));
        assert!(r.or_default().is_empty());
    }

    #[test]
    fn test_malformed() {
        let td = tempfile::tempdir().unwrap();
        let src = source_with(&td, "expand=/dev/sda4\n");
        let r = read_section(&src, "fedora-40");
        assert!(matches!(
            r,
            Lookup::Unavailable(LookupFailure::Parse {
                source: ParseError::NoSection { line: 1 },
                ..
            })
        ));
    }

    #[test]
    fn test_missing_file() {
        let src = ConfigSource::Path("/nonexistent/vbrepo/index".into());
        let r = read_section(&src, "fedora-40");
        assert!(matches!(r, Lookup::Unavailable(LookupFailure::Read { .. })));
        assert!(r.found().is_none());
    }

    #[test]
    fn test_unreachable_url() {
        // Nothing listens on the discard port locally
        let src = ConfigSource::Url("http://127.0.0.1:9/index".into());
        let r = read_section(&src, "fedora-40");
        assert!(matches!(r, Lookup::Unavailable(_)), "{r:?}");
        assert!(r.or_default().is_empty());
    }

    #[test]
    fn test_url_found() {
        let (url, server) = serve_once(
            "200 OK",
            indoc! {"
                [fedora-40]
                name=Fedora 40
                expand=/dev/sda4
            "},
        );
        let r = read_section(&ConfigSource::parse(&url), "fedora-40");
        let s = r.found().unwrap();
        assert_eq!(s.get("expand").unwrap(), "/dev/sda4");
        assert_eq!(s.get("name").unwrap(), "Fedora 40");
        server.join().unwrap();
    }

    #[test]
    fn test_url_not_found() {
        let (url, server) = serve_once("404 Not Found", "missing\n");
        let r = read_section(&ConfigSource::Url(url.clone()), "fedora-40");
        assert!(
            matches!(
                r,
                Lookup::Unavailable(LookupFailure::HttpStatus { url: ref u, status })
                    if *u == url && status == reqwest::StatusCode::NOT_FOUND
            ),
            "{r:?}"
        );
        assert!(r.or_default().is_empty());
        server.join().unwrap();
    }
}
