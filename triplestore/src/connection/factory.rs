//! Connections and the factory that hands them out.
//!
//! A connection URI has the form `scheme:name`. The scheme selects a
//! session constructor from a static table; the name is scheme-specific
//! (for `local`, the database name in the factory's registry).
//!
//! # Invariants
//!
//! - The cache never returns a closed connection: a closed entry found on
//!   lookup is purged and replaced.
//! - Evicting a connection from the cache does not close it.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use lru::LruCache;

use crate::config::EngineConfig;
use crate::connection::{Command, DatabaseRegistry, LocalSession, Session, SessionError};
use crate::content::ContentHandlerManager;
use crate::store::StoreError;

type SessionConstructor = fn(&ConnectionFactory, &str) -> Result<Arc<dyn Session>, SessionError>;

/// Registered schemes and their session constructors.
static SCHEMES: &[(&str, SessionConstructor)] = &[("local", local_session as SessionConstructor)];

#[allow(clippy::disallowed_methods)] // Arc::clone is required for shared ownership
fn local_session(
    factory: &ConnectionFactory,
    name: &str,
) -> Result<Arc<dyn Session>, SessionError> {
    let database = factory.registry.get_or_create(name)?;
    Ok(Arc::new(LocalSession::new(database, Arc::clone(&factory.content))))
}

/// A handle on one session, identified by the URI it was opened with.
#[derive(Debug)]
pub struct Connection {
    uri: String,
    session: Arc<dyn Session>,
}

impl Connection {
    #[must_use]
    pub fn new(uri: impl Into<String>, session: Arc<dyn Session>) -> Self {
        Self {
            uri: uri.into(),
            session,
        }
    }

    /// Execute `command` against this connection's session.
    ///
    /// # Errors
    /// [`SessionError::Closed`] once the connection is closed, otherwise
    /// whatever the command fails with.
    pub fn execute<C: Command>(&self, command: &C) -> Result<C::Output, SessionError> {
        if self.session.is_closed() {
            return Err(SessionError::Closed);
        }
        command.execute(self.session.as_ref())
    }

    #[must_use]
    pub fn session(&self) -> &dyn Session {
        self.session.as_ref()
    }

    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn close(&self) {
        self.session.close();
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.session.is_closed()
    }
}

/// Opens connections by URI and caches them.
#[derive(Debug)]
pub struct ConnectionFactory {
    cache: Mutex<LruCache<String, Arc<Connection>>>,
    registry: DatabaseRegistry,
    content: Arc<ContentHandlerManager>,
}

impl ConnectionFactory {
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        let capacity =
            NonZeroUsize::new(config.connection_cache_capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
            registry: DatabaseRegistry::new(config.clone()),
            content: Arc::new(ContentHandlerManager::new()),
        }
    }

    /// Return a connection for `uri`, reusing a cached open one.
    ///
    /// # Errors
    /// - [`SessionError::InvalidUri`] if `uri` is not `scheme:name`
    /// - [`SessionError::UnknownScheme`] if no constructor is registered
    ///   for the scheme
    #[allow(clippy::disallowed_methods)] // Arc::clone is required for shared ownership
    #[allow(clippy::significant_drop_tightening)]
    pub fn connect(&self, uri: &str) -> Result<Arc<Connection>, SessionError> {
        let (scheme, name) = uri
            .split_once(':')
            .filter(|(scheme, name)| !scheme.is_empty() && !name.is_empty())
            .ok_or_else(|| SessionError::InvalidUri(uri.to_string()))?;
        let constructor = SCHEMES
            .iter()
            .find(|(registered, _)| *registered == scheme)
            .map(|(_, constructor)| *constructor)
            .ok_or_else(|| SessionError::UnknownScheme(scheme.to_string()))?;

        let mut cache = self.cache.lock().map_err(|_| StoreError::LockPoisoned)?;
        if let Some(cached) = cache.get(uri) {
            if !cached.is_closed() {
                return Ok(Arc::clone(cached));
            }
            tracing::info!("Purging closed connection {uri} from cache");
            cache.pop(uri);
        }

        let connection = Arc::new(Connection::new(uri, constructor(self, name)?));
        if let Some((evicted, _)) = cache.push(uri.to_string(), Arc::clone(&connection)) {
            tracing::debug!("Evicted connection {evicted} from cache");
        }
        tracing::debug!("Opened connection {uri}");
        Ok(connection)
    }

    /// Close every cached connection and empty the cache.
    pub fn close_all(&self) -> Result<(), SessionError> {
        let mut cache = self.cache.lock().map_err(|_| StoreError::LockPoisoned)?;
        for (_, connection) in cache.iter() {
            connection.close();
        }
        cache.clear();
        Ok(())
    }

    /// Number of cached connections, open or not.
    pub fn cached_len(&self) -> Result<usize, SessionError> {
        Ok(self.cache.lock().map_err(|_| StoreError::LockPoisoned)?.len())
    }
}
