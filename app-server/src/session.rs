//! Anonymous browser sessions.
//!
//! Each session owns one [`Transcript`] behind its own mutex. The lock is
//! held for the whole of a question, so one session answers one question
//! at a time while other sessions proceed independently.
//!
//! Sessions idle for longer than the store's TTL are dropped: an expired
//! id is treated like an unknown one, and expired entries are swept out
//! whenever a new session is started.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::HeaderMap;
use axum::http::header::COOKIE;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;
use uuid::Uuid;

use lexsen_answer::Transcript;

/// Cookie carrying the session id.
pub const SESSION_COOKIE: &str = "lexsen_session";

/// Idle time after which a session is forgotten.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(60 * 60);

pub type SharedTranscript = Arc<Mutex<Transcript>>;

/// A session resolved for one request.
pub struct Session {
    pub id: Uuid,
    pub transcript: SharedTranscript,
    /// The id was minted for this request and must be sent back.
    pub is_new: bool,
}

impl Session {
    /// `Set-Cookie` value to send when the session is new.
    pub fn set_cookie(&self) -> Option<String> {
        self.is_new.then(|| session_cookie(self.id))
    }
}

struct SessionEntry {
    transcript: SharedTranscript,
    last_seen: Instant,
}

/// In-memory registry of transcripts, keyed by session id.
///
/// Nothing is persisted: all sessions are lost when the process exits.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, SessionEntry>>>,
    ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_ttl(DEFAULT_SESSION_TTL)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that forgets sessions idle for `ttl`.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: Arc::default(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Look up a live session and mark it as used.
    pub async fn get(&self, id: Uuid) -> Option<SharedTranscript> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(&id)?;
        if entry.last_seen.elapsed() >= self.ttl {
            sessions.remove(&id);
            debug!("Session {id} expired");
            return None;
        }
        entry.last_seen = Instant::now();
        Some(entry.transcript.clone())
    }

    /// Resolve the session named by `id`, or start a new one.
    ///
    /// Unknown and expired ids are not adopted; a fresh id is issued
    /// instead.
    pub async fn get_or_create(&self, id: Option<Uuid>) -> Session {
        if let Some(id) = id {
            if let Some(transcript) = self.get(id).await {
                return Session {
                    id,
                    transcript,
                    is_new: false,
                };
            }
        }

        let id = Uuid::new_v4();
        let transcript = SharedTranscript::default();
        {
            let mut sessions = self.sessions.write().await;
            let before = sessions.len();
            sessions.retain(|_, entry| entry.last_seen.elapsed() < self.ttl);
            let evicted = before - sessions.len();
            if evicted > 0 {
                debug!("Evicted {evicted} idle sessions");
            }
            sessions.insert(
                id,
                SessionEntry {
                    transcript: transcript.clone(),
                    last_seen: Instant::now(),
                },
            );
        }
        debug!("Started session {id}");

        Session {
            id,
            transcript,
            is_new: true,
        }
    }

    /// Number of sessions held, including idle ones not yet swept.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

/// Extract the session id from the request's `Cookie` headers.
pub fn session_id(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

/// `Set-Cookie` header value for `id`.
pub fn session_cookie(id: Uuid) -> String {
    format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use lexsen_answer::Role;
    use pretty_assertions::assert_eq;

    fn headers(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(cookie).unwrap());
        headers
    }

    #[test]
    fn test_session_id_from_cookie() {
        let id = Uuid::new_v4();
        assert_eq!(
            session_id(&headers(&format!("theme=light; {SESSION_COOKIE}={id}"))),
            Some(id)
        );
    }

    #[test]
    fn test_session_id_missing_or_malformed() {
        assert_eq!(session_id(&HeaderMap::new()), None);
        assert_eq!(session_id(&headers("theme=light")), None);
        assert_eq!(session_id(&headers(&format!("{SESSION_COOKIE}=not-a-uuid"))), None);
    }

    #[test]
    fn test_cookie_round_trips() {
        let id = Uuid::new_v4();
        let cookie = session_cookie(id);
        assert!(cookie.contains("HttpOnly"));

        let value = cookie.split(';').next().unwrap();
        assert_eq!(session_id(&headers(value)), Some(id));
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = SessionStore::new();
        let first = store.get_or_create(None).await;
        let second = store.get_or_create(None).await;
        assert_ne!(first.id, second.id);

        first
            .transcript
            .lock()
            .await
            .append_turn(Role::User, "Bonjour");

        assert_eq!(first.transcript.lock().await.len(), 1);
        assert!(second.transcript.lock().await.is_empty());
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_existing_session_is_reused() {
        let store = SessionStore::new();
        let created = store.get_or_create(None).await;
        assert!(created.is_new);
        assert!(created.set_cookie().is_some());

        let again = store.get_or_create(Some(created.id)).await;
        assert_eq!(again.id, created.id);
        assert!(!again.is_new);
        assert!(again.set_cookie().is_none());
        assert!(Arc::ptr_eq(&again.transcript, &created.transcript));
    }

    #[tokio::test]
    async fn test_idle_session_expires() {
        let store = SessionStore::with_ttl(Duration::from_millis(50));
        let created = store.get_or_create(None).await;

        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(store.get(created.id).await.is_none());
        let again = store.get_or_create(Some(created.id)).await;
        assert_ne!(again.id, created.id);
        assert!(again.is_new);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_new_session_sweeps_idle_ones() {
        let store = SessionStore::with_ttl(Duration::from_millis(50));
        for _ in 0..3 {
            store.get_or_create(None).await;
        }
        assert_eq!(store.len().await, 3);

        tokio::time::sleep(Duration::from_millis(100)).await;
        let fresh = store.get_or_create(None).await;

        assert_eq!(store.len().await, 1);
        assert!(store.get(fresh.id).await.is_some());
    }

    #[test]
    fn test_default_ttl() {
        assert_eq!(SessionStore::new().ttl(), DEFAULT_SESSION_TTL);
    }

    #[tokio::test]
    async fn test_unknown_id_gets_fresh_session() {
        let store = SessionStore::new();
        let stale = Uuid::new_v4();

        let session = store.get_or_create(Some(stale)).await;

        assert_ne!(session.id, stale);
        assert!(session.is_new);
        assert!(session.transcript.lock().await.is_empty());
    }
}
