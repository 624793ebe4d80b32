//! File-backed session and folder store.
//!
//! The whole store is one JSON document, loaded into memory and written
//! back atomically after every mutation. Reads reload from disk first so a
//! concurrent external writer is eventually observed; the deployment
//! assumption is a single logical writer per store file, last writer wins.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::errors::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub folder_id: Option<String>,
    #[serde(default)]
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Folder {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreRoot {
    pub sessions: BTreeMap<String, Session>,
    pub folders: BTreeMap<String, Folder>,
}

pub struct SessionStore {
    path: PathBuf,
    root: Mutex<StoreRoot>,
}

impl SessionStore {
    /// Open the store at `path`, loading whatever state is there. A
    /// missing file starts empty; an unreadable or unrecognized one is
    /// reset to empty with a warning, never an error.
    pub fn open(path: PathBuf) -> Self {
        let root = load_root(&path);
        Self {
            path,
            root: Mutex::new(root),
        }
    }

    pub fn create_session(
        &self,
        title: &str,
        folder_id: Option<String>,
    ) -> Result<Session, ApiError> {
        self.mutate(|root| {
            let session = Session {
                id: Uuid::new_v4().to_string(),
                title: title.to_string(),
                folder_id,
                messages: Vec::new(),
                created_at: Utc::now(),
            };
            root.sessions.insert(session.id.clone(), session.clone());
            Ok(session)
        })
    }

    pub fn get_session(&self, id: &str) -> Result<Session, ApiError> {
        self.reload_and_read(|root| root.sessions.get(id).map(|s| normalized(s, root)))?
            .ok_or_else(|| ApiError::NotFound("Session not found".to_string()))
    }

    /// Replace the full message list of a session. No merge semantics.
    pub fn replace_messages(&self, id: &str, messages: Vec<Message>) -> Result<(), ApiError> {
        self.mutate(|root| {
            let session = root
                .sessions
                .get_mut(id)
                .ok_or_else(|| ApiError::NotFound("Session not found".to_string()))?;
            session.messages = messages;
            Ok(())
        })
    }

    pub fn rename_session(&self, id: &str, title: &str) -> Result<(), ApiError> {
        self.mutate(|root| {
            let session = root
                .sessions
                .get_mut(id)
                .ok_or_else(|| ApiError::NotFound("Session not found".to_string()))?;
            session.title = title.to_string();
            Ok(())
        })
    }

    /// Move a session into a folder, or out of any folder with `None`.
    /// The folder is not required to exist; dangling references are
    /// normalized away on read.
    pub fn move_session(&self, id: &str, folder_id: Option<String>) -> Result<(), ApiError> {
        self.mutate(|root| {
            let session = root
                .sessions
                .get_mut(id)
                .ok_or_else(|| ApiError::NotFound("Session not found".to_string()))?;
            session.folder_id = folder_id;
            Ok(())
        })
    }

    /// Idempotent: deleting an absent session is a no-op.
    pub fn delete_session(&self, id: &str) -> Result<(), ApiError> {
        self.mutate(|root| {
            root.sessions.remove(id);
            Ok(())
        })
    }

    pub fn create_folder(&self, name: &str) -> Result<Folder, ApiError> {
        self.mutate(|root| {
            let folder = Folder {
                id: Uuid::new_v4().to_string(),
                name: name.to_string(),
                created_at: Utc::now(),
            };
            root.folders.insert(folder.id.clone(), folder.clone());
            Ok(folder)
        })
    }

    /// Sessions in the folder become uncategorized; the folder itself is
    /// then removed. Idempotent.
    pub fn delete_folder(&self, id: &str) -> Result<(), ApiError> {
        self.mutate(|root| {
            for session in root.sessions.values_mut() {
                if session.folder_id.as_deref() == Some(id) {
                    session.folder_id = None;
                }
            }
            root.folders.remove(id);
            Ok(())
        })
    }

    /// All sessions, newest first.
    pub fn list_sessions(&self) -> Result<Vec<Session>, ApiError> {
        self.reload_and_read(|root| {
            let mut sessions: Vec<Session> =
                root.sessions.values().map(|s| normalized(s, root)).collect();
            sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            sessions
        })
    }

    /// All folders, oldest first.
    pub fn list_folders(&self) -> Result<Vec<Folder>, ApiError> {
        self.reload_and_read(|root| {
            let mut folders: Vec<Folder> = root.folders.values().cloned().collect();
            folders.sort_by(|a, b| a.created_at.cmp(&b.created_at));
            folders
        })
    }

    fn mutate<T>(
        &self,
        op: impl FnOnce(&mut StoreRoot) -> Result<T, ApiError>,
    ) -> Result<T, ApiError> {
        let mut root = self.lock()?;
        let out = op(&mut root)?;
        persist(&self.path, &root)?;
        Ok(out)
    }

    fn reload_and_read<T>(&self, op: impl FnOnce(&StoreRoot) -> T) -> Result<T, ApiError> {
        let mut root = self.lock()?;
        *root = load_root(&self.path);
        Ok(op(&root))
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, StoreRoot>, ApiError> {
        self.root
            .lock()
            .map_err(|_| ApiError::Internal("session store lock poisoned".to_string()))
    }
}

/// A session whose folder no longer exists reads as uncategorized.
fn normalized(session: &Session, root: &StoreRoot) -> Session {
    let mut session = session.clone();
    if let Some(folder_id) = &session.folder_id {
        if !root.folders.contains_key(folder_id) {
            session.folder_id = None;
        }
    }
    session
}

fn load_root(path: &Path) -> StoreRoot {
    if !path.exists() {
        return StoreRoot::default();
    }

    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) => {
            let err = ApiError::StoreCorrupt(err.to_string());
            tracing::warn!("{} at {}; starting empty", err, path.display());
            return StoreRoot::default();
        }
    };

    match serde_json::from_str::<StoreRoot>(&contents) {
        Ok(root) => root,
        Err(err) => {
            let err = ApiError::StoreCorrupt(err.to_string());
            tracing::warn!("{} at {}; resetting to empty", err, path.display());
            StoreRoot::default()
        }
    }
}

// Write-then-rename keeps the store file whole even if the process dies
// mid-save.
fn persist(path: &Path, root: &StoreRoot) -> Result<(), ApiError> {
    let payload = serde_json::to_string_pretty(root).map_err(ApiError::internal)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(ApiError::internal)?;
    }

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, payload).map_err(ApiError::internal)?;
    fs::rename(&tmp, path).map_err(ApiError::internal)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> SessionStore {
        SessionStore::open(dir.path().join("sessions.json"))
    }

    #[test]
    fn create_then_get_round_trips() {
        let dir = TempDir::new().expect("tempdir");
        let store = store_in(&dir);

        let created = store.create_session("My chat", None).expect("create");
        let fetched = store.get_session(&created.id).expect("get");

        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.title, "My chat");
        assert!(fetched.messages.is_empty());
        assert!(fetched.folder_id.is_none());
    }

    #[test]
    fn state_survives_reopening_the_store() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("sessions.json");

        let created = SessionStore::open(path.clone())
            .create_session("Persisted", None)
            .expect("create");

        let reopened = SessionStore::open(path);
        let fetched = reopened.get_session(&created.id).expect("get");
        assert_eq!(fetched.title, "Persisted");
    }

    #[test]
    fn replace_messages_overwrites_the_full_list() {
        let dir = TempDir::new().expect("tempdir");
        let store = store_in(&dir);
        let session = store.create_session("Chat", None).expect("create");

        let first = vec![Message {
            role: Role::User,
            content: "hello".to_string(),
        }];
        store.replace_messages(&session.id, first).expect("replace");

        let second = vec![
            Message {
                role: Role::User,
                content: "hi".to_string(),
            },
            Message {
                role: Role::Assistant,
                content: "hello there".to_string(),
            },
        ];
        store
            .replace_messages(&session.id, second.clone())
            .expect("replace");

        let fetched = store.get_session(&session.id).expect("get");
        assert_eq!(fetched.messages, second);
    }

    #[test]
    fn replace_messages_on_missing_session_is_not_found() {
        let dir = TempDir::new().expect("tempdir");
        let store = store_in(&dir);
        assert!(matches!(
            store.replace_messages("nope", Vec::new()),
            Err(ApiError::NotFound(_))
        ));
    }

    #[test]
    fn delete_session_is_idempotent() {
        let dir = TempDir::new().expect("tempdir");
        let store = store_in(&dir);
        let session = store.create_session("Chat", None).expect("create");

        store.delete_session(&session.id).expect("first delete");
        store.delete_session(&session.id).expect("second delete");

        assert!(matches!(
            store.get_session(&session.id),
            Err(ApiError::NotFound(_))
        ));
    }

    #[test]
    fn delete_folder_uncategorizes_member_sessions() {
        let dir = TempDir::new().expect("tempdir");
        let store = store_in(&dir);

        let folder = store.create_folder("Research").expect("create folder");
        let inside = store
            .create_session("In folder", Some(folder.id.clone()))
            .expect("create");
        let outside = store.create_session("Loose", None).expect("create");

        store.delete_folder(&folder.id).expect("delete folder");

        let sessions = store.list_sessions().expect("list");
        assert!(sessions.iter().all(|s| s.folder_id.is_none()));
        assert!(sessions.iter().any(|s| s.id == inside.id));
        assert!(sessions.iter().any(|s| s.id == outside.id));
        assert!(store.list_folders().expect("list folders").is_empty());
    }

    #[test]
    fn dangling_folder_reference_reads_as_uncategorized() {
        let dir = TempDir::new().expect("tempdir");
        let store = store_in(&dir);

        let session = store
            .create_session("Orphan", Some("no-such-folder".to_string()))
            .expect("create");

        let fetched = store.get_session(&session.id).expect("get");
        assert!(fetched.folder_id.is_none());
    }

    #[test]
    fn sessions_list_newest_first_folders_oldest_first() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("sessions.json");
        fs::write(
            &path,
            r#"{
                "sessions": {
                    "a": {"id": "a", "title": "old", "created_at": "2024-01-01T00:00:00Z"},
                    "b": {"id": "b", "title": "new", "created_at": "2024-06-01T00:00:00Z"}
                },
                "folders": {
                    "f1": {"id": "f1", "name": "first", "created_at": "2024-01-01T00:00:00Z"},
                    "f2": {"id": "f2", "name": "second", "created_at": "2024-06-01T00:00:00Z"}
                }
            }"#,
        )
        .expect("seed file");

        let store = SessionStore::open(path);

        let sessions = store.list_sessions().expect("list sessions");
        let session_ids: Vec<&str> = sessions.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(session_ids, vec!["b", "a"]);

        let folders = store.list_folders().expect("list folders");
        let folder_ids: Vec<&str> = folders.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(folder_ids, vec!["f1", "f2"]);
    }

    #[test]
    fn unparseable_file_resets_to_empty() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("sessions.json");
        fs::write(&path, "not json at all {{{").expect("seed file");

        let store = SessionStore::open(path);
        assert!(store.list_sessions().expect("list").is_empty());
    }

    #[test]
    fn legacy_bare_list_resets_to_empty() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("sessions.json");
        fs::write(
            &path,
            r#"[{"role": "user", "content": "old history format"}]"#,
        )
        .expect("seed file");

        let store = SessionStore::open(path.clone());
        assert!(store.list_sessions().expect("list").is_empty());

        // The reset shape is persisted by the next mutation.
        store.create_session("Fresh", None).expect("create");
        let contents = fs::read_to_string(&path).expect("read back");
        assert!(contents.contains("\"sessions\""));
    }

    #[test]
    fn reads_observe_external_writes() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("sessions.json");
        let store = SessionStore::open(path.clone());
        assert!(store.list_sessions().expect("list").is_empty());

        fs::write(
            &path,
            r#"{"sessions": {"x": {"id": "x", "title": "external", "created_at": "2024-01-01T00:00:00Z"}}, "folders": {}}"#,
        )
        .expect("external write");

        let sessions = store.list_sessions().expect("list");
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].title, "external");
    }
}
