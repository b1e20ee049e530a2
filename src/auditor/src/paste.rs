//! Paste link resolution
//!
//! Builds are usually shared as a link to a paste site rather than as the
//! raw code. Known hosts have a raw-content URL for each paste; resolution
//! maps the link to that URL and fetches the code with a single GET.

use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;

/// Default timeout for fetching a paste
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// A paste host and the template of its raw-content URL
#[derive(Debug, Clone, PartialEq)]
pub struct PasteHost {
    pub domain: &'static str,
    /// `{id}` is replaced with the paste id
    pub raw_template: &'static str,
}

/// Known paste hosts
pub const PASTE_HOSTS: &[PasteHost] = &[
    PasteHost {
        domain: "pobb.in",
        raw_template: "https://pobb.in/{id}/raw",
    },
    PasteHost {
        domain: "pastebin.com",
        raw_template: "https://pastebin.com/raw/{id}",
    },
];

static PASTE_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:https?://)?(?:www\.)?(?P<host>\w+\.\w+)/(?P<id>\w+)").expect("PASTE_LINK regex")
});

/// Errors resolving a paste link
#[derive(Debug, thiserror::Error)]
pub enum PasteError {
    #[error("No build code or link given")]
    Empty,

    #[error("Unsupported paste host: {0}")]
    UnknownHost(String),

    #[error("{url} returned HTTP {code}")]
    Status { url: String, code: u16 },

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Failed to read response body: {0}")]
    Body(#[from] std::io::Error),
}

/// How user input was interpreted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasteInput<'a> {
    /// A `host/id` link
    Link { host: &'a str, id: &'a str },
    /// A URL that is not a `host/id` link
    OtherUrl(&'a str),
    /// Anything else is taken as a build code
    Code(&'a str),
}

/// Interpret user input as a paste link, some other URL, or a build code
pub fn classify_input(input: &str) -> PasteInput<'_> {
    let input = input.trim();

    if let Some(caps) = PASTE_LINK.captures(input) {
        if let (Some(host), Some(id)) = (caps.name("host"), caps.name("id")) {
            return PasteInput::Link {
                host: host.as_str(),
                id: id.as_str(),
            };
        }
    }

    match url::Url::parse(input) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => PasteInput::OtherUrl(input),
        _ => PasteInput::Code(input),
    }
}

/// Raw-content URL of a paste, if the host is known
pub fn raw_url(host: &str, id: &str) -> Option<String> {
    PASTE_HOSTS
        .iter()
        .find(|h| h.domain.eq_ignore_ascii_case(host))
        .map(|h| h.raw_template.replace("{id}", id))
}

/// Fetches the body of a URL
pub trait PasteFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<String, PasteError>;
}

/// Blocking HTTP fetcher
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl PasteFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String, PasteError> {
        match self.agent.get(url).call() {
            Ok(resp) => check_status(url, resp.status())
                .and_then(|()| resp.into_string().map_err(PasteError::from)),
            Err(ureq::Error::Status(code, _)) => Err(PasteError::Status {
                url: url.to_string(),
                code,
            }),
            Err(e) => Err(PasteError::Transport(e.to_string())),
        }
    }
}

/// Only a plain 200 carries a paste body
fn check_status(url: &str, code: u16) -> Result<(), PasteError> {
    if code == 200 {
        Ok(())
    } else {
        Err(PasteError::Status {
            url: url.to_string(),
            code,
        })
    }
}

/// Turn a link or code into a build code, reporting why it failed
pub fn try_resolve(input: &str, fetcher: &dyn PasteFetcher) -> Result<String, PasteError> {
    match classify_input(input) {
        PasteInput::Code("") => Err(PasteError::Empty),
        PasteInput::Code(code) => Ok(code.to_string()),
        PasteInput::OtherUrl(url) => Err(PasteError::UnknownHost(url.to_string())),
        PasteInput::Link { host, id } => {
            let url = raw_url(host, id).ok_or_else(|| PasteError::UnknownHost(host.to_string()))?;
            tracing::debug!("Fetching build from {}", url);
            fetcher.fetch(&url)
        }
    }
}

/// Turn a link or code into a build code with the given fetcher
pub fn resolve_with(input: &str, fetcher: &dyn PasteFetcher) -> Option<String> {
    match try_resolve(input, fetcher) {
        Ok(code) => Some(code),
        Err(e) => {
            tracing::debug!("Could not resolve build input: {}", e);
            None
        }
    }
}

/// Turn a link or code into a build code, fetching over HTTP when needed
pub fn resolve(input: &str) -> Option<String> {
    resolve_with(input, &HttpFetcher::default())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Serves a fixed response and records requested URLs
    pub(crate) struct CannedFetcher {
        pub(crate) response: Result<String, u16>,
        pub(crate) requested: Mutex<Vec<String>>,
    }

    impl CannedFetcher {
        pub(crate) fn ok(body: &str) -> Self {
            Self {
                response: Ok(body.to_string()),
                requested: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn status(code: u16) -> Self {
            Self {
                response: Err(code),
                requested: Mutex::new(Vec::new()),
            }
        }
    }

    impl PasteFetcher for CannedFetcher {
        fn fetch(&self, url: &str) -> Result<String, PasteError> {
            self.requested.lock().unwrap().push(url.to_string());
            match &self.response {
                Ok(body) => Ok(body.clone()),
                Err(code) => Err(PasteError::Status {
                    url: url.to_string(),
                    code: *code,
                }),
            }
        }
    }

    #[test]
    fn test_classify_input() {
        assert_eq!(
            classify_input("https://pobb.in/BL70qYjBEzI8"),
            PasteInput::Link {
                host: "pobb.in",
                id: "BL70qYjBEzI8"
            }
        );
        assert_eq!(
            classify_input("  www.pastebin.com/FEG9g37F "),
            PasteInput::Link {
                host: "pastebin.com",
                id: "FEG9g37F"
            }
        );
        assert_eq!(
            classify_input("https://localhost/"),
            PasteInput::OtherUrl("https://localhost/")
        );
        assert_eq!(classify_input("eNrtPWt34"), PasteInput::Code("eNrtPWt34"));
    }

    #[test]
    fn test_raw_url() {
        assert_eq!(
            raw_url("pobb.in", "abc123").as_deref(),
            Some("https://pobb.in/abc123/raw")
        );
        assert_eq!(
            raw_url("pastebin.com", "FEG9g37F").as_deref(),
            Some("https://pastebin.com/raw/FEG9g37F")
        );
        assert_eq!(raw_url("example.com", "abc"), None);
    }

    #[test]
    fn test_resolve_link() {
        let fetcher = CannedFetcher::ok("eNrtPWt34");
        assert_eq!(
            resolve_with("https://pobb.in/BL70qYjBEzI8", &fetcher).as_deref(),
            Some("eNrtPWt34")
        );
        assert_eq!(
            *fetcher.requested.lock().unwrap(),
            vec!["https://pobb.in/BL70qYjBEzI8/raw".to_string()]
        );
    }

    #[test]
    fn test_unknown_host_makes_no_request() {
        let fetcher = CannedFetcher::ok("unused");
        assert!(resolve_with("https://example.com/abc", &fetcher).is_none());
        assert!(resolve_with("https://localhost/", &fetcher).is_none());
        assert!(fetcher.requested.lock().unwrap().is_empty());
    }

    #[test]
    fn test_http_failure_is_none() {
        let fetcher = CannedFetcher::status(404);
        assert!(matches!(
            try_resolve("https://pastebin.com/FEG9g37F", &fetcher),
            Err(PasteError::Status { code: 404, .. })
        ));
        assert!(resolve_with("https://pastebin.com/FEG9g37F", &fetcher).is_none());
    }

    #[test]
    fn test_only_200_accepted() {
        assert!(check_status("https://pobb.in/abc/raw", 200).is_ok());
        for code in [201, 204, 206] {
            assert!(matches!(
                check_status("https://pobb.in/abc/raw", code),
                Err(PasteError::Status { code: c, .. }) if c == code
            ));
        }
    }

    #[test]
    fn test_code_passes_through() {
        let fetcher = CannedFetcher::ok("unused");
        assert_eq!(
            resolve_with("  eNrtPWt34_-abc== \n", &fetcher).as_deref(),
            Some("eNrtPWt34_-abc==")
        );
        assert!(fetcher.requested.lock().unwrap().is_empty());
        assert!(matches!(try_resolve("   ", &fetcher), Err(PasteError::Empty)));
    }
}
