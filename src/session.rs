/// Session token slots
///
/// Mirrors the last token issued to a browser session, keyed by the
/// `session_id` cookie. Nothing authenticates through these slots; bearer
/// tokens are always verified by signature and expiry.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::IssuedToken;

pub const SESSION_COOKIE: &str = "session_id";

#[derive(Clone)]
struct SessionSlot {
    token: String,
    expires_at: DateTime<Utc>,
}

#[derive(Clone, Default)]
pub struct SessionTokens {
    slots: Arc<RwLock<HashMap<Uuid, SessionSlot>>>,
}

impl SessionTokens {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a new session slot for a freshly issued token and returns its id
    ///
    /// The id is always minted here, never taken from the client, so a
    /// planted cookie cannot be used to read someone else's token. The
    /// caller's previous slot, if any, is dropped along with every expired one.
    pub fn start(&self, previous: Option<&str>, issued: &IssuedToken) -> Uuid {
        self.start_at(previous, issued, Utc::now())
    }

    fn start_at(&self, previous: Option<&str>, issued: &IssuedToken, now: DateTime<Utc>) -> Uuid {
        let session_id = Uuid::new_v4();
        let previous = previous.and_then(|value| Uuid::parse_str(value).ok());

        let mut slots = self.slots.write();
        if let Some(previous) = previous {
            slots.remove(&previous);
        }
        slots.retain(|_, slot| now < slot.expires_at);
        slots.insert(
            session_id,
            SessionSlot {
                token: issued.token.clone(),
                expires_at: issued.expires_at,
            },
        );

        session_id
    }

    /// Token stored for this session, if it has not expired
    pub fn get(&self, session_id: Uuid) -> Option<String> {
        self.get_at(session_id, Utc::now())
    }

    fn get_at(&self, session_id: Uuid, now: DateTime<Utc>) -> Option<String> {
        {
            let slots = self.slots.read();
            match slots.get(&session_id) {
                None => return None,
                Some(slot) if now < slot.expires_at => return Some(slot.token.clone()),
                Some(_) => {}
            }
        }

        self.slots.write().remove(&session_id);
        None
    }
}
