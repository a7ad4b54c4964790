use crate::errors::{HandoffError, StoreError};
use crate::handlers::store::TokenStore;
use crate::models::all_models::{Branch, BranchAdmin, Customer, Employee, PaymentMethod, Profile};
use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::marker::PhantomData;
use strum_macros::{Display, EnumString};
use uuid::Uuid;

/// Entity kinds that hand a record from a list view to its form view.
#[derive(Debug, Display, EnumString, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Branch,
    BranchAdmin,
    PaymentMethod,
    Customer,
    Employee,
    Profile,
}

/// Raw budget for all edit handles together, measured the way the cookie
/// store encodes them. Keeps the session cookie well under 4 KiB.
pub const HANDOFF_BUDGET_BYTES: usize = 1536;

impl EntityKind {
    pub const ALL: [EntityKind; 6] = [
        EntityKind::Branch,
        EntityKind::BranchAdmin,
        EntityKind::PaymentMethod,
        EntityKind::Customer,
        EntityKind::Employee,
        EntityKind::Profile,
    ];

    pub fn data_key(self) -> String {
        format!("edit{}Data", self)
    }

    pub fn mode_key(self) -> String {
        format!("isEdit{}Operation", self)
    }

    pub fn timestamp_key(self) -> String {
        format!("edit{}Timestamp", self)
    }

    pub fn session_id_key(self) -> String {
        format!("edit{}SessionId", self)
    }

    pub fn keys(self) -> [String; 4] {
        [
            self.data_key(),
            self.mode_key(),
            self.timestamp_key(),
            self.session_id_key(),
        ]
    }

    pub fn list_route(self) -> &'static str {
        match self {
            EntityKind::Branch => "/branches",
            EntityKind::BranchAdmin => "/branch-admins",
            EntityKind::PaymentMethod => "/payment-methods",
            EntityKind::Customer => "/customers",
            EntityKind::Employee => "/employees",
            EntityKind::Profile => "/profile",
        }
    }

    pub fn form_route(self) -> String {
        format!("{}/form", self.list_route())
    }

    /// Collection path on the backend API.
    pub fn api_path(self) -> &'static str {
        match self {
            EntityKind::Branch => "/api/Branch",
            EntityKind::BranchAdmin => "/api/BranchAdmin",
            EntityKind::PaymentMethod => "/api/PaymentMethod",
            EntityKind::Customer => "/api/Customer",
            EntityKind::Employee => "/api/Employee",
            EntityKind::Profile => "/api/Customer/profile",
        }
    }
}

pub trait EditableEntity: Serialize + DeserializeOwned + Default + Clone {
    const KIND: EntityKind;

    /// Backend id; zero for a record not yet created.
    fn id(&self) -> i64;
}

macro_rules! editable {
    ($($ty:ident),*) => {
        $(
            impl EditableEntity for $ty {
                const KIND: EntityKind = EntityKind::$ty;

                fn id(&self) -> i64 {
                    self.id
                }
            }
        )*
    };
}

editable!(Branch, BranchAdmin, PaymentMethod, Customer, Employee, Profile);

/// What sits under the data key: the full entity plus handoff metadata.
#[derive(Debug, Serialize, Deserialize)]
struct EditSnapshot<T> {
    #[serde(flatten)]
    entity: T,
    timestamp: i64,
    #[serde(rename = "sessionId")]
    session_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum FormMode<T> {
    Create {
        initial: T,
    },
    Update {
        id: i64,
        #[serde(rename = "sessionId")]
        session_id: Uuid,
        initial: T,
    },
}

impl<T> FormMode<T> {
    pub fn is_update(&self) -> bool {
        matches!(self, FormMode::Update { .. })
    }
}

/// Edit handoff for one entity kind over a store.
pub struct EditSession<'a, S: TokenStore + ?Sized, T: EditableEntity> {
    store: &'a S,
    _entity: PhantomData<T>,
}

impl<'a, S: TokenStore + ?Sized, T: EditableEntity> EditSession<'a, S, T> {
    pub fn new(store: &'a S) -> Self {
        EditSession {
            store,
            _entity: PhantomData,
        }
    }

    pub fn clear(&self) {
        for key in T::KIND.keys() {
            self.store.remove(&key);
        }
    }

    pub fn begin_edit(&self, entity: &T) -> Result<String, HandoffError> {
        self.begin_edit_at(entity, Utc::now())
    }

    /// Replaces any previous handle of this kind with a snapshot of `entity`
    /// and returns the form route to navigate to. Handles of other kinds are
    /// evicted oldest first when the new one would overrun the budget.
    pub fn begin_edit_at(&self, entity: &T, now: DateTime<Utc>) -> Result<String, HandoffError> {
        let kind = T::KIND;
        self.clear();

        let snapshot = EditSnapshot {
            entity: entity.clone(),
            timestamp: now.timestamp_millis(),
            session_id: Uuid::new_v4(),
        };
        let data = serde_json::to_string(&snapshot).map_err(|e| StoreError(e.to_string()))?;
        let timestamp = snapshot.timestamp.to_string();
        let session_id = snapshot.session_id.to_string();
        let entries = [
            (kind.data_key(), data.as_str()),
            (kind.timestamp_key(), timestamp.as_str()),
            (kind.session_id_key(), session_id.as_str()),
            (kind.mode_key(), "true"),
        ];

        let bytes: usize = entries.iter().map(|(k, v)| encoded_len(k, v)).sum();
        if bytes > HANDOFF_BUDGET_BYTES {
            warn!("Refusing {} edit of id {}: {} bytes", kind, entity.id(), bytes);
            return Err(HandoffError::TooLarge {
                bytes,
                budget: HANDOFF_BUDGET_BYTES,
            });
        }
        evict_until_fits(self.store, HANDOFF_BUDGET_BYTES - bytes);

        let written = entries
            .iter()
            .try_for_each(|(key, value)| self.store.set(key, value));
        if let Err(e) = written {
            self.clear();
            return Err(e.into());
        }

        debug!(
            "Began {} edit of id {} (session {})",
            kind,
            entity.id(),
            snapshot.session_id
        );
        Ok(format!("{}?edit=true", kind.form_route()))
    }

    /// Drops any pending edit of this kind and returns the blank form route.
    pub fn begin_create(&self) -> String {
        self.clear();
        debug!("Began {} create", T::KIND);
        format!("{}?new=true", T::KIND.form_route())
    }

    /// Read by the form view on load. Only a complete handle whose snapshot
    /// carries the currently stored session id yields update mode.
    pub fn consume(&self) -> FormMode<T> {
        let kind = T::KIND;
        let data = match self.store.get(&kind.data_key()) {
            Some(data) => data,
            None => return FormMode::Create { initial: T::default() },
        };
        if self.store.get(&kind.mode_key()).as_deref() != Some("true") {
            return FormMode::Create { initial: T::default() };
        }

        let snapshot = match serde_json::from_str::<EditSnapshot<T>>(&data) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Discarding unreadable {} edit snapshot: {}", kind, e);
                self.clear();
                return FormMode::Create { initial: T::default() };
            }
        };

        let current_session = self.store.get(&kind.session_id_key());
        if current_session.as_deref() != Some(snapshot.session_id.to_string().as_str()) {
            warn!(
                "Discarding stale {} edit snapshot (session {} no longer current)",
                kind, snapshot.session_id
            );
            self.clear();
            return FormMode::Create { initial: T::default() };
        }

        FormMode::Update {
            id: snapshot.entity.id(),
            session_id: snapshot.session_id,
            initial: snapshot.entity,
        }
    }

    /// Mode a submit runs in. A form loaded blank (`loaded` is `None`)
    /// always creates; a form loaded for update only proceeds while its
    /// handle is still the stored one. A replaced handle belongs to another
    /// view and is left alone.
    pub fn resolve_submit(&self, loaded: Option<Uuid>) -> Result<FormMode<T>, HandoffError> {
        let loaded = match loaded {
            Some(loaded) => loaded,
            None => return Ok(FormMode::Create { initial: T::default() }),
        };

        let current = self.consume();
        let still_current =
            matches!(&current, FormMode::Update { session_id, .. } if *session_id == loaded);
        if still_current {
            Ok(current)
        } else {
            warn!("Rejecting {} submit from replaced edit session {}", T::KIND, loaded);
            Err(HandoffError::Stale)
        }
    }

    /// Run after a successful submit.
    pub fn complete(&self) {
        self.clear();
    }
}

/// Size of one entry once the cookie store has JSON-encoded the value on
/// insert and the whole state again on save.
fn encoded_len(key: &str, value: &str) -> usize {
    let once = serde_json::to_string(value).unwrap_or_default();
    let twice = serde_json::to_string(&once).unwrap_or_default();
    key.len() + twice.len() + 4
}

/// Bytes currently held by edit handles of every kind.
pub fn handoff_len<S: TokenStore + ?Sized>(store: &S) -> usize {
    EntityKind::ALL
        .iter()
        .flat_map(|kind| kind.keys())
        .filter_map(|key| store.get(&key).map(|value| encoded_len(&key, &value)))
        .sum()
}

fn evict_until_fits<S: TokenStore + ?Sized>(store: &S, room: usize) {
    let mut held: Vec<(i64, EntityKind)> = EntityKind::ALL
        .iter()
        .filter(|kind| store.get(&kind.data_key()).is_some())
        .map(|kind| {
            let stamp = store
                .get(&kind.timestamp_key())
                .and_then(|t| t.parse().ok())
                .unwrap_or(0);
            (stamp, *kind)
        })
        .collect();
    held.sort_by_key(|(stamp, _)| *stamp);

    for (_, kind) in held {
        if handoff_len(store) <= room {
            break;
        }
        debug!("Evicting {} edit handle to make room", kind);
        for key in kind.keys() {
            store.remove(&key);
        }
    }
}
