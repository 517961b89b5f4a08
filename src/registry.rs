//! In-memory registry of open configuration sessions for the HTTP host.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::{ConfigurationSession, ConfigurationState};
use crate::error::{Error, Result};
use crate::format::{self, ModelFormat};
use crate::models::{FeatureTree, ModelEdit};

/// Input for opening a new session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionInput {
    /// The feature model document.
    pub model: String,
    /// Model format. Detected from the document when omitted.
    #[serde(default)]
    pub format: Option<ModelFormat>,
    /// A persisted configuration to start from. Starts fresh when omitted.
    #[serde(default)]
    pub configuration: Option<String>,
}

/// Input for toggling a feature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleInput {
    pub feature: String,
    pub selected: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub id: Uuid,
    pub root: String,
    pub created_at: DateTime<Utc>,
    pub state: ConfigurationState,
}

struct Entry {
    session: ConfigurationSession,
    created_at: DateTime<Utc>,
}

impl Entry {
    fn response(&self, id: Uuid) -> Result<SessionResponse> {
        let tree = self.session.tree();
        Ok(SessionResponse {
            id,
            root: tree.name(tree.root()).to_string(),
            created_at: self.created_at,
            state: self.session.current_state()?,
        })
    }

    /// Response after a change that has already been applied to the session.
    fn applied_response(&self, id: Uuid) -> Result<SessionResponse> {
        self.response(id).map_err(|e| match e {
            Error::Count(e) => Error::AppliedUncounted(e),
            e => e,
        })
    }
}

#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<Mutex<HashMap<Uuid, Entry>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_session(&self, input: CreateSessionInput) -> Result<SessionResponse> {
        let root = format::parse_model(&input.model, input.format)?;
        let tree = FeatureTree::build(&root)?;
        let session = match input.configuration.as_deref() {
            Some(document) => ConfigurationSession::from_document(tree, document)?,
            None => ConfigurationSession::fresh(tree),
        };

        let id = Uuid::new_v4();
        let entry = Entry {
            session,
            created_at: Utc::now(),
        };
        let response = entry.response(id)?;

        let mut sessions = self.sessions.lock().expect("registry lock poisoned");
        sessions.insert(id, entry);
        tracing::info!("Opened configuration session {} for {}", id, response.root);
        Ok(response)
    }

    pub fn list_sessions(&self) -> Result<Vec<SessionResponse>> {
        let sessions = self.sessions.lock().expect("registry lock poisoned");
        let mut responses = sessions
            .iter()
            .map(|(id, entry)| entry.response(*id))
            .collect::<Result<Vec<_>>>()?;
        responses.sort_by_key(|r| r.created_at);
        Ok(responses)
    }

    pub fn get_session(&self, id: Uuid) -> Result<SessionResponse> {
        let sessions = self.sessions.lock().expect("registry lock poisoned");
        sessions
            .get(&id)
            .ok_or(Error::SessionNotFound(id))?
            .response(id)
    }

    pub fn toggle(&self, id: Uuid, input: ToggleInput) -> Result<SessionResponse> {
        let mut sessions = self.sessions.lock().expect("registry lock poisoned");
        let entry = sessions.get_mut(&id).ok_or(Error::SessionNotFound(id))?;
        entry.session.toggle(&input.feature, input.selected)?;
        entry.applied_response(id)
    }

    pub fn edit_model(&self, id: Uuid, edit: ModelEdit) -> Result<SessionResponse> {
        let mut sessions = self.sessions.lock().expect("registry lock poisoned");
        let entry = sessions.get_mut(&id).ok_or(Error::SessionNotFound(id))?;
        entry.session.edit_model(&edit)?;
        entry.applied_response(id)
    }

    /// The session's current model as a feature model document.
    pub fn export_model(&self, id: Uuid) -> Result<String> {
        let sessions = self.sessions.lock().expect("registry lock poisoned");
        let entry = sessions.get(&id).ok_or(Error::SessionNotFound(id))?;
        Ok(format::write_model_xml(&entry.session.model())?)
    }

    pub fn export_configuration(&self, id: Uuid) -> Result<String> {
        let sessions = self.sessions.lock().expect("registry lock poisoned");
        let entry = sessions.get(&id).ok_or(Error::SessionNotFound(id))?;
        Ok(entry.session.export_selection()?)
    }

    pub fn export_feature_list(&self, id: Uuid) -> Result<String> {
        let sessions = self.sessions.lock().expect("registry lock poisoned");
        let entry = sessions.get(&id).ok_or(Error::SessionNotFound(id))?;
        Ok(entry.session.export_feature_list())
    }

    pub fn render(&self, id: Uuid) -> Result<String> {
        let sessions = self.sessions.lock().expect("registry lock poisoned");
        let entry = sessions.get(&id).ok_or(Error::SessionNotFound(id))?;
        Ok(entry.session.render())
    }

    pub fn close_session(&self, id: Uuid) -> bool {
        let mut sessions = self.sessions.lock().expect("registry lock poisoned");
        sessions.remove(&id).is_some()
    }
}
