//! Offline asset-caching worker: registration plumbing and the script the web
//! host serves at the worker path.

use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("offline workers are disabled for this host")]
    Unsupported,
    #[error("worker script path must be a root-relative URL path: {0:?}")]
    InvalidPath(String),
}

/// A host able to install the offline worker.
pub trait WorkerRegistrar {
    fn register(&mut self, script_path: &str) -> Result<(), RegistrationError>;
}

/// Registers the worker at `script_path` when the host supports it.
///
/// Outcomes are logged and reported as a flag; they never reach the user.
pub fn register_offline_worker(
    registrar: Option<&mut dyn WorkerRegistrar>,
    script_path: &str,
) -> bool {
    let Some(registrar) = registrar else {
        debug!("host has no offline worker support");
        return false;
    };
    match validate_script_path(script_path).and_then(|()| registrar.register(script_path)) {
        Ok(()) => {
            debug!(script = script_path, "Offline worker registered");
            true
        }
        Err(err) => {
            warn!(script = script_path, error = %err, "Offline worker registration failed");
            false
        }
    }
}

/// Accepts `/`-prefixed paths made of URL-safe characters only, so the path
/// can be embedded in a script block verbatim.
pub fn validate_script_path(path: &str) -> Result<(), RegistrationError> {
    let valid = path.starts_with('/')
        && !path.starts_with("//")
        && path
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '.' | '-' | '_'));
    if valid {
        Ok(())
    } else {
        Err(RegistrationError::InvalidPath(path.to_string()))
    }
}

/// Cache-first worker that pre-caches the page shell.
pub fn service_worker_script() -> String {
    format!(
        r#"const CACHE_NAME = 'proofreader-v{version}';
const PRECACHE = ['/'];

self.addEventListener('install', (event) => {{
  event.waitUntil(caches.open(CACHE_NAME).then((cache) => cache.addAll(PRECACHE)));
}});

self.addEventListener('activate', (event) => {{
  event.waitUntil(
    caches.keys().then((keys) =>
      Promise.all(keys.filter((key) => key !== CACHE_NAME).map((key) => caches.delete(key)))
    )
  );
}});

self.addEventListener('fetch', (event) => {{
  if (event.request.method !== 'GET') {{
    return;
  }}
  event.respondWith(
    caches.match(event.request).then((cached) => cached || fetch(event.request))
  );
}});
"#,
        version = env!("CARGO_PKG_VERSION"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Recorder {
        supported: bool,
        registered: Vec<String>,
    }

    impl WorkerRegistrar for Recorder {
        fn register(&mut self, script_path: &str) -> Result<(), RegistrationError> {
            if !self.supported {
                return Err(RegistrationError::Unsupported);
            }
            self.registered.push(script_path.to_string());
            Ok(())
        }
    }

    #[test]
    fn missing_registrar_is_skipped() {
        assert!(!register_offline_worker(None, "/sw.js"));
    }

    #[test]
    fn registrar_receives_script_path() {
        let mut recorder = Recorder {
            supported: true,
            registered: Vec::new(),
        };
        assert!(register_offline_worker(Some(&mut recorder), "/sw.js"));
        assert_eq!(recorder.registered, vec!["/sw.js".to_string()]);
    }

    #[test]
    fn registrar_failure_is_reported_not_raised() {
        let mut recorder = Recorder {
            supported: false,
            registered: Vec::new(),
        };
        assert!(!register_offline_worker(Some(&mut recorder), "/sw.js"));
    }

    #[test]
    fn unsafe_paths_never_reach_the_registrar() {
        let mut recorder = Recorder {
            supported: true,
            registered: Vec::new(),
        };
        for path in ["sw.js", "//evil.example/sw.js", "/sw.js');alert(1);//"] {
            assert!(!register_offline_worker(Some(&mut recorder), path));
        }
        assert!(recorder.registered.is_empty());
    }

    #[test]
    fn script_is_versioned_and_cache_first() {
        let script = service_worker_script();
        assert!(script.contains(&format!("proofreader-v{}", env!("CARGO_PKG_VERSION"))));
        assert!(script.contains("caches.match(event.request)"));
    }
}
