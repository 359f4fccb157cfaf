// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Demonstration procedures: an in-memory notes service.
//!
//! | Procedure | Method | Kind |
//! |-----------|--------|------|
//! | `utils.sayHello` | GET | unary |
//! | `notes.createNote` | POST | unary |
//! | `notes.getNote` | GET | unary |
//! | `notes.listNotes` | GET | unary |
//! | `notes.updateNote` | POST | unary |
//! | `notes.deleteNote` | DELETE | unary |
//! | `notes.watchNotes` | POST | event stream |

use chrono::{DateTime, Utc};
use parley::{
    App, Field, HttpMethod, Model, Optional, RegistrationError, RpcError, RpcOptions, RpcRequest,
    StreamController,
};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

const EVENT_CAPACITY: usize = 256;
const DEFAULT_PAGE: u32 = 50;

/// Per-request context.
#[derive(Clone)]
pub struct ServerContext {
    pub store: Arc<NoteStore>,
    /// Value of the `x-caller` header, if any.
    pub caller: Option<String>,
    pub authorized: bool,
}

/// A stored note.
#[derive(Model, Debug, Clone, PartialEq)]
pub struct Note {
    pub id: String,
    pub title: String,
    pub body: Option<String>,
    /// Free-form labels.
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Incremented on every update.
    pub revision: u64,
}

/// Change notification emitted by `notes.watchNotes`.
#[derive(Model, Debug, Clone, PartialEq)]
#[model(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NoteEvent {
    /// Current contents, sent once when the stream opens.
    Snapshot { notes: Vec<Note> },
    Created { note: Note },
    Updated { note: Note },
    Deleted { id: String },
}

#[derive(Model)]
pub struct SayHelloParams {
    pub name: String,
}

#[derive(Model)]
pub struct SayHelloResponse {
    pub message: String,
}

#[derive(Model)]
pub struct CreateNoteParams {
    pub title: String,
    pub body: Optional<String>,
    pub tags: Optional<Vec<String>>,
}

#[derive(Model)]
pub struct NoteParams {
    pub id: String,
}

#[derive(Model)]
pub struct ListNotesParams {
    pub tag: Optional<String>,
    pub offset: Optional<u32>,
    pub limit: Optional<u32>,
}

#[derive(Model)]
pub struct NoteList {
    pub items: Vec<Note>,
    pub total: u32,
}

/// Absent fields are left untouched; `body: null` clears the body.
#[derive(Model)]
pub struct UpdateNoteParams {
    pub id: String,
    pub title: Optional<String>,
    pub body: Field<String>,
    pub tags: Optional<Vec<String>>,
}

#[derive(Model)]
pub struct WatchNotesParams {
    /// Only forward changes to notes carrying this tag.
    pub tag: Optional<String>,
}

/// In-memory notes with a change feed.
pub struct NoteStore {
    notes: RwLock<BTreeMap<String, Note>>,
    next_id: AtomicU64,
    events: broadcast::Sender<NoteEvent>,
}

impl Default for NoteStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NoteStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            notes: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NoteEvent> {
        self.events.subscribe()
    }

    fn publish(&self, event: NoteEvent) {
        // No subscribers is not an error.
        let _ = self.events.send(event);
    }

    pub async fn create(&self, title: String, body: Option<String>, tags: Vec<String>) -> Note {
        let id = format!("n{}", self.next_id.fetch_add(1, Ordering::Relaxed));
        let now = Utc::now();
        let note = Note {
            id: id.clone(),
            title,
            body,
            tags,
            created_at: now,
            updated_at: now,
            revision: 1,
        };
        self.notes.write().await.insert(id, note.clone());
        debug!("NoteStore: created '{}'", note.id);
        self.publish(NoteEvent::Created { note: note.clone() });
        note
    }

    pub async fn get(&self, id: &str) -> Option<Note> {
        self.notes.read().await.get(id).cloned()
    }

    pub async fn list(&self) -> Vec<Note> {
        self.notes.read().await.values().cloned().collect()
    }

    pub async fn update(&self, params: UpdateNoteParams) -> Option<Note> {
        let mut notes = self.notes.write().await;
        let note = notes.get_mut(&params.id)?;
        if let Optional::Present(title) = params.title {
            note.title = title;
        }
        match params.body {
            Field::Absent => {}
            Field::Null => note.body = None,
            Field::Present(body) => note.body = Some(body),
        }
        if let Optional::Present(tags) = params.tags {
            note.tags = tags;
        }
        note.updated_at = Utc::now();
        note.revision += 1;
        let note = note.clone();
        drop(notes);
        self.publish(NoteEvent::Updated { note: note.clone() });
        Some(note)
    }

    pub async fn delete(&self, id: &str) -> bool {
        let removed = self.notes.write().await.remove(id).is_some();
        if removed {
            debug!("NoteStore: deleted '{}'", id);
            self.publish(NoteEvent::Deleted { id: id.to_string() });
        }
        removed
    }
}

fn note_not_found(id: &str) -> RpcError {
    RpcError::new(404, format!("Note '{}' not found", id)).with_data(serde_json::json!({ "id": id }))
}

fn require_auth(ctx: &ServerContext) -> Result<(), RpcError> {
    if ctx.authorized {
        Ok(())
    } else {
        Err(RpcError::unauthorized("Missing or invalid bearer token"))
    }
}

/// Build the context for one request.
pub fn context_factory(
    store: Arc<NoteStore>,
    auth_token: Option<String>,
) -> impl Fn(&RpcRequest) -> Result<ServerContext, RpcError> + Send + Sync + 'static {
    move |request| {
        let authorized = match auth_token.as_deref() {
            None => true,
            Some(token) => request
                .header("authorization")
                .and_then(|value| value.strip_prefix("Bearer "))
                .is_some_and(|presented| presented == token),
        };
        Ok(ServerContext {
            store: Arc::clone(&store),
            caller: request.header("x-caller").map(str::to_string),
            authorized,
        })
    }
}

/// Install logging hooks and the auth middleware.
pub fn install_hooks(app: &mut App<ServerContext>) {
    app.hooks_mut()
        .middleware(|_request, ctx, procedure| {
            if procedure.starts_with("notes.") {
                require_auth(ctx)?;
            }
            Ok(())
        })
        .on_after_response(|request, ctx, _body| {
            debug!(
                "Request: '{}' served for {}",
                request.procedure().unwrap_or("-"),
                ctx.caller.as_deref().unwrap_or("anonymous")
            );
        })
        .on_error(|request, _ctx, err| {
            if err.code >= 500 {
                warn!("Request: {} {} failed: {}", request.method(), request.path(), err);
            } else {
                debug!("Request: {} {} rejected: {}", request.method(), request.path(), err);
            }
        });
}

/// Register every demonstration procedure.
pub fn register(app: &mut App<ServerContext>) -> Result<(), RegistrationError> {
    app.procedure(
        "utils.sayHello",
        RpcOptions::new()
            .method(HttpMethod::Get)
            .description("Greet someone by name"),
        |params: SayHelloParams, _ctx: ServerContext| async move {
            Ok(SayHelloResponse {
                message: format!("Hello {}", params.name),
            })
        },
    )?;

    app.procedure(
        "notes.createNote",
        RpcOptions::new().method(HttpMethod::Post),
        |params: CreateNoteParams, ctx: ServerContext| async move {
            if params.title.trim().is_empty() {
                return Err(RpcError::bad_request("Title must not be empty")
                    .with_data(serde_json::json!({ "path": "/title" })));
            }
            let tags = params.tags.into_option().unwrap_or_default();
            Ok(ctx
                .store
                .create(params.title, params.body.into_option(), tags)
                .await)
        },
    )?;

    app.procedure(
        "notes.getNote",
        RpcOptions::new().method(HttpMethod::Get),
        |params: NoteParams, ctx: ServerContext| async move {
            ctx.store
                .get(&params.id)
                .await
                .ok_or_else(|| note_not_found(&params.id))
        },
    )?;

    app.procedure(
        "notes.listNotes",
        RpcOptions::new()
            .method(HttpMethod::Get)
            .description("Page through notes, optionally filtered by tag"),
        |params: ListNotesParams, ctx: ServerContext| async move {
            let tag = params.tag.into_option();
            let notes: Vec<Note> = ctx
                .store
                .list()
                .await
                .into_iter()
                .filter(|note| tag.as_ref().map_or(true, |t| note.tags.contains(t)))
                .collect();
            let total = u32::try_from(notes.len()).unwrap_or(u32::MAX);
            let offset = params.offset.into_option().unwrap_or(0) as usize;
            let limit = params.limit.into_option().unwrap_or(DEFAULT_PAGE) as usize;
            let items = notes.into_iter().skip(offset).take(limit).collect();
            Ok(NoteList { items, total })
        },
    )?;

    app.procedure(
        "notes.updateNote",
        RpcOptions::new(),
        |params: UpdateNoteParams, ctx: ServerContext| async move {
            let id = params.id.clone();
            ctx.store
                .update(params)
                .await
                .ok_or_else(|| note_not_found(&id))
        },
    )?;

    app.procedure(
        "notes.deleteNote",
        RpcOptions::new().method(HttpMethod::Delete),
        |params: NoteParams, ctx: ServerContext| async move {
            if ctx.store.delete(&params.id).await {
                Ok(())
            } else {
                Err(note_not_found(&params.id))
            }
        },
    )?;

    app.event_stream(
        "notes.watchNotes",
        RpcOptions::new().description("Snapshot followed by live changes"),
        watch_notes,
    )?;

    info!("Notes: {} procedures registered", app.registry().len());
    Ok(())
}

async fn watch_notes(
    params: WatchNotesParams,
    stream: StreamController<NoteEvent>,
    ctx: ServerContext,
) -> Result<(), RpcError> {
    let tag = params.tag.into_option();
    let matches = |note: &Note| tag.as_ref().map_or(true, |t| note.tags.contains(t));

    // Subscribe before the snapshot so no change falls in between.
    let mut changes = ctx.store.subscribe();
    let notes = ctx.store.list().await.into_iter().filter(matches).collect();
    stream.push(&NoteEvent::Snapshot { notes }).await?;

    loop {
        tokio::select! {
            _ = stream.done() => break,
            change = changes.recv() => match change {
                Ok(event) => {
                    let forward = match &event {
                        NoteEvent::Created { note } | NoteEvent::Updated { note } => matches(note),
                        NoteEvent::Deleted { .. } => true,
                        NoteEvent::Snapshot { .. } => false,
                    };
                    if forward {
                        stream.push(&event).await?;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Notes: watcher lagged, {} changes skipped", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    stream.close(true).await;
                    break;
                }
            },
        }
    }
    debug!(
        "Notes: watcher for {} finished",
        ctx.caller.as_deref().unwrap_or("anonymous")
    );
    Ok(())
}
