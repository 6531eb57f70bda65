use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use cabinet_core::{AppError, Entity, Page};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::repository::{require_id, EntityRepository, ListFilter};

struct Record<E> {
    seq: u64,
    entity: E,
}

impl<E: Clone> Clone for Record<E> {
    fn clone(&self) -> Self {
        Self {
            seq: self.seq,
            entity: self.entity.clone(),
        }
    }
}

struct State<E> {
    next_seq: u64,
    records: HashMap<Uuid, Record<E>>,
}

/// Process-local repository with the same uniqueness rules as the
/// PostgreSQL one. Contents are lost on restart.
pub struct InMemoryRepository<E> {
    state: Arc<RwLock<State<E>>>,
}

impl<E> Clone for InMemoryRepository<E> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<E: Entity> Default for InMemoryRepository<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> InMemoryRepository<E> {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(State {
                next_seq: 0,
                records: HashMap::new(),
            })),
        }
    }
}

fn code_taken<E: Entity>(records: &HashMap<Uuid, Record<E>>, entity: &E, id: Uuid) -> bool {
    let Some(code) = entity.business_code() else {
        return false;
    };
    records.iter().any(|(other_id, record)| {
        *other_id != id
            && record.entity.business_code() == Some(code)
            && record.entity.owner() == entity.owner()
    })
}

fn insert_into<E: Entity>(state: &mut State<E>, entity: &E) -> Result<E, AppError> {
    let id = require_id(entity)?;
    if state.records.contains_key(&id) {
        return Err(AppError::Conflict(format!("{} {} already exists", E::KIND, id)));
    }
    if code_taken(&state.records, entity, id) {
        return Err(AppError::Conflict(format!(
            "{} code already in use",
            E::KIND
        )));
    }
    let seq = state.next_seq;
    state.next_seq += 1;
    state.records.insert(
        id,
        Record {
            seq,
            entity: entity.clone(),
        },
    );
    Ok(entity.clone())
}

fn update_into<E: Entity>(state: &mut State<E>, entity: &E) -> Result<E, AppError> {
    let id = require_id(entity)?;
    if code_taken(&state.records, entity, id) {
        return Err(AppError::Conflict(format!(
            "{} code already in use",
            E::KIND
        )));
    }
    match state.records.get_mut(&id) {
        Some(record) => {
            record.entity = entity.clone();
            Ok(entity.clone())
        }
        None => Err(AppError::NotFound(format!("{} {} not found", E::KIND, id))),
    }
}

fn sorted<E: Entity>(state: &State<E>, filter: &ListFilter) -> Vec<(u64, E)> {
    let mut matching: Vec<(u64, E)> = state
        .records
        .values()
        .filter(|r| filter.matches(r.entity.owner(), r.entity.canceled()))
        .map(|r| (r.seq, r.entity.clone()))
        .collect();
    matching.sort_by_key(|(seq, _)| *seq);
    matching
}

#[async_trait]
impl<E: Entity> EntityRepository<E> for InMemoryRepository<E> {
    async fn insert(&self, entity: &E) -> Result<E, AppError> {
        let mut state = self.state.write().await;
        insert_into(&mut state, entity)
    }

    async fn insert_many(&self, entities: &[E]) -> Result<Vec<E>, AppError> {
        let mut state = self.state.write().await;
        let mut staged = State {
            next_seq: state.next_seq,
            records: state.records.clone(),
        };
        let saved = entities
            .iter()
            .map(|e| insert_into(&mut staged, e))
            .collect::<Result<Vec<_>, _>>()?;
        *state = staged;
        Ok(saved)
    }

    async fn update(&self, entity: &E) -> Result<E, AppError> {
        let mut state = self.state.write().await;
        update_into(&mut state, entity)
    }

    async fn update_many(&self, entities: &[E]) -> Result<Vec<E>, AppError> {
        let mut state = self.state.write().await;
        let mut staged = State {
            next_seq: state.next_seq,
            records: state.records.clone(),
        };
        let saved = entities
            .iter()
            .map(|e| update_into(&mut staged, e))
            .collect::<Result<Vec<_>, _>>()?;
        *state = staged;
        Ok(saved)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.state.write().await.records.remove(&id).is_some())
    }

    async fn delete_many(&self, ids: &[Uuid]) -> Result<u64, AppError> {
        let mut state = self.state.write().await;
        Ok(ids
            .iter()
            .filter(|id| state.records.remove(*id).is_some())
            .count() as u64)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<E>, AppError> {
        let state = self.state.read().await;
        Ok(state.records.get(&id).map(|r| r.entity.clone()))
    }

    async fn find_by_code(&self, code: &str) -> Result<Vec<E>, AppError> {
        let state = self.state.read().await;
        let all = ListFilter {
            include_canceled: true,
            ..ListFilter::default()
        };
        Ok(sorted(&state, &all)
            .into_iter()
            .map(|(_, e)| e)
            .filter(|e| e.business_code() == Some(code))
            .collect())
    }

    async fn find_all(&self, filter: &ListFilter, page: Page) -> Result<Vec<E>, AppError> {
        let page = page.clamped();
        let state = self.state.read().await;
        Ok(sorted(&state, filter)
            .into_iter()
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .map(|(_, e)| e)
            .collect())
    }

    async fn count(&self, filter: &ListFilter) -> Result<i64, AppError> {
        let state = self.state.read().await;
        Ok(state
            .records
            .values()
            .filter(|r| filter.matches(r.entity.owner(), r.entity.canceled()))
            .count() as i64)
    }
}
