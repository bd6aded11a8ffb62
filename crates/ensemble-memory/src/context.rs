//! Bounded per-agent context store with optional persistence.

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::Mutex;

use serde_json::Value;

use ensemble_core::AgentId;
use ensemble_core::error::MemoryError;

use crate::backend::{FileBackend, PersistedState, PersistenceBackend};
#[cfg(feature = "sqlite")]
use crate::backend::SqliteBackend;
use crate::history::{PromptHistory, PromptRecord};
use crate::merge::{self, MergeStrategy};

/// Where context memory persists its per-agent mapping, if anywhere.
#[derive(Debug, Clone, Default)]
pub enum PersistenceMode {
    /// In-memory only; state is lost when the process exits.
    #[default]
    Ephemeral,
    /// Single JSON document at the given path.
    File(PathBuf),
    /// `(agent_id, key, value)` rows in a single SQLite table.
    #[cfg(feature = "sqlite")]
    Sqlite(PathBuf),
}

#[derive(Debug, Clone)]
pub struct ContextMemoryConfig {
    /// Maximum context entries held per agent; inserting beyond this
    /// evicts the oldest-inserted key.
    pub max_entries_per_agent: usize,
    /// Capacity of the rolling prompt-history buffer.
    pub prompt_history_capacity: usize,
    pub persistence: PersistenceMode,
}

impl Default for ContextMemoryConfig {
    fn default() -> Self {
        Self {
            max_entries_per_agent: 100,
            prompt_history_capacity: 5,
            persistence: PersistenceMode::Ephemeral,
        }
    }
}

/// Per-agent entries plus their insertion order. Updating an existing key
/// keeps its original position; eviction is FIFO by insertion, not LRU.
#[derive(Debug, Default)]
struct AgentContext {
    entries: HashMap<String, Value>,
    order: VecDeque<String>,
}

impl AgentContext {
    /// Upsert, evicting the single oldest key if the bound is exceeded.
    /// Returns the evicted key, if any.
    fn insert(&mut self, key: String, value: Value, max_entries: usize) -> Option<String> {
        let is_new = !self.entries.contains_key(&key);
        self.entries.insert(key.clone(), value);
        if is_new {
            self.order.push_back(key);
            if self.entries.len() > max_entries
                && let Some(oldest) = self.order.pop_front()
            {
                self.entries.remove(&oldest);
                return Some(oldest);
            }
        }
        None
    }

    fn remove(&mut self, key: &str) -> bool {
        if self.entries.remove(key).is_some() {
            self.order.retain(|k| k != key);
            true
        } else {
            false
        }
    }
}

#[derive(Debug)]
struct MemoryState {
    agents: HashMap<String, AgentContext>,
    history: PromptHistory,
}

/// Durable-ish scratch space the orchestrator uses to remember what
/// happened last per agent, plus a short rolling history of sanitized
/// prompts.
///
/// All mutating operations are critical sections: the whole state sits
/// behind one mutex, so there are no torn reads during eviction or merge.
/// `ContextMemory` is a plainly constructed service object — build one at
/// startup and hand out references (no process-wide globals), so each test
/// can construct a fresh instance.
///
/// Persistence is optional and never authoritative: [`load`](Self::load)
/// replaces in-memory agent state wholesale, [`flush`](Self::flush) writes
/// a whole snapshot, and failures in either are logged and swallowed —
/// in-memory operation continues to work regardless of persistence
/// outcome.
pub struct ContextMemory {
    max_entries_per_agent: usize,
    backend: Option<Box<dyn PersistenceBackend>>,
    state: Mutex<MemoryState>,
}

impl ContextMemory {
    pub fn new(config: ContextMemoryConfig) -> Result<Self, MemoryError> {
        let backend: Option<Box<dyn PersistenceBackend>> = match config.persistence {
            PersistenceMode::Ephemeral => None,
            PersistenceMode::File(path) => Some(Box::new(FileBackend::new(path))),
            #[cfg(feature = "sqlite")]
            PersistenceMode::Sqlite(path) => Some(Box::new(SqliteBackend::new(&path)?)),
        };
        Ok(Self {
            max_entries_per_agent: config.max_entries_per_agent,
            backend,
            state: Mutex::new(MemoryState {
                agents: HashMap::new(),
                history: PromptHistory::new(config.prompt_history_capacity),
            }),
        })
    }

    /// Ephemeral store with default bounds.
    pub fn in_memory() -> Self {
        Self::new(ContextMemoryConfig::default())
            .unwrap_or_else(|_| unreachable!("ephemeral construction cannot fail"))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        // A poisoned lock means another thread panicked mid-operation;
        // the state itself is still structurally sound, so keep serving.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn validate(agent_id: &str, key: &str) -> Result<AgentId, MemoryError> {
        let id = AgentId::new(agent_id)?;
        if key.trim().is_empty() {
            return Err(MemoryError::EmptyKey);
        }
        Ok(id)
    }

    /// Upsert one context entry for an agent. If the agent's entry count
    /// would exceed the configured maximum, the single oldest-inserted key
    /// is evicted first.
    pub fn save(&self, agent_id: &str, key: &str, value: Value) -> Result<(), MemoryError> {
        let id = Self::validate(agent_id, key)?;
        let mut state = self.lock();
        let evicted = state
            .agents
            .entry(id.as_str().to_string())
            .or_default()
            .insert(key.to_string(), value, self.max_entries_per_agent);
        if let Some(evicted) = evicted {
            tracing::debug!(agent = %id, key = %evicted, "evicted oldest context entry");
        }
        tracing::trace!(agent = %id, key, "saved context entry");
        Ok(())
    }

    /// Pure lookup; never fails. Unknown agents and keys are `None`.
    pub fn get(&self, agent_id: &str, key: &str) -> Option<Value> {
        let state = self.lock();
        state
            .agents
            .get(agent_id.trim())
            .and_then(|ctx| ctx.entries.get(key).cloned())
    }

    /// Snapshot copy of everything stored for an agent. Mutating the
    /// returned map does not affect internal state.
    pub fn get_all(&self, agent_id: &str) -> HashMap<String, Value> {
        let state = self.lock();
        state
            .agents
            .get(agent_id.trim())
            .map(|ctx| ctx.entries.clone())
            .unwrap_or_default()
    }

    /// Merge a JSON-object patch into the stored value under `key`,
    /// creating the entry if absent. See [`MergeStrategy`] for the two
    /// combination policies. Newly created entries share the same FIFO
    /// bound as [`save`](Self::save).
    pub fn merge(
        &self,
        agent_id: &str,
        key: &str,
        patch: &Value,
        strategy: MergeStrategy,
    ) -> Result<(), MemoryError> {
        let id = Self::validate(agent_id, key)?;
        if !patch.is_object() {
            return Err(MemoryError::NotMergeable {
                key: key.to_string(),
                found: merge::type_name(patch),
            });
        }

        let mut state = self.lock();
        let ctx = state.agents.entry(id.as_str().to_string()).or_default();
        let existing = ctx
            .entries
            .get(key)
            .cloned()
            .unwrap_or_else(|| Value::Object(serde_json::Map::new()));
        let merged = merge::apply(&existing, patch, strategy);
        ctx.insert(key.to_string(), merged, self.max_entries_per_agent);
        tracing::trace!(agent = %id, key, ?strategy, "merged context entry");
        Ok(())
    }

    /// Remove one entry. Returns whether the key existed.
    pub fn delete(&self, agent_id: &str, key: &str) -> bool {
        let mut state = self.lock();
        state
            .agents
            .get_mut(agent_id.trim())
            .map(|ctx| ctx.remove(key))
            .unwrap_or(false)
    }

    /// Drop everything stored for one agent.
    pub fn clear_agent(&self, agent_id: &str) {
        let mut state = self.lock();
        if state.agents.remove(agent_id.trim()).is_some() {
            tracing::debug!(agent = agent_id, "cleared agent context");
        }
    }

    /// Drop all per-agent context. Prompt history is untouched.
    pub fn clear_all(&self) {
        let mut state = self.lock();
        state.agents.clear();
        tracing::debug!("cleared all agent context");
    }

    /// Number of entries currently held for an agent.
    pub fn len(&self, agent_id: &str) -> usize {
        let state = self.lock();
        state
            .agents
            .get(agent_id.trim())
            .map(|ctx| ctx.entries.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self, agent_id: &str) -> bool {
        self.len(agent_id) == 0
    }

    pub fn contains(&self, agent_id: &str, key: &str) -> bool {
        let state = self.lock();
        state
            .agents
            .get(agent_id.trim())
            .is_some_and(|ctx| ctx.entries.contains_key(key))
    }

    /// Identities of all agents with stored context.
    pub fn agent_ids(&self) -> Vec<String> {
        let state = self.lock();
        state.agents.keys().cloned().collect()
    }

    /// Append a prompt to the rolling history, evicting the oldest entry
    /// once the buffer is full.
    pub fn record_prompt(&self, prompt: &str) {
        let mut state = self.lock();
        state.history.record(prompt);
    }

    /// Defensive copy of the prompt history, most-recent-last.
    pub fn history(&self) -> Vec<PromptRecord> {
        let state = self.lock();
        state.history.snapshot()
    }

    /// Load persisted state, replacing in-memory per-agent context
    /// wholesale. Failures are logged and swallowed; without a configured
    /// backend this is a no-op.
    pub fn load(&self) {
        if let Err(e) = self.try_load() {
            tracing::error!(error = %e, "failed to load persisted context, keeping in-memory state");
        }
    }

    /// Persist a full snapshot of the per-agent context. Failures are
    /// logged and swallowed; without a configured backend this is a no-op.
    pub fn flush(&self) {
        if let Err(e) = self.try_flush() {
            tracing::error!(error = %e, "failed to persist context, in-memory state remains authoritative");
        }
    }

    /// Fallible variant of [`load`](Self::load).
    pub fn try_load(&self) -> Result<(), MemoryError> {
        let Some(backend) = &self.backend else {
            return Ok(());
        };
        let persisted = backend.load()?;

        let mut state = self.lock();
        state.agents.clear();
        for (agent_id, entries) in persisted {
            let mut ctx = AgentContext::default();
            for (key, value) in entries {
                ctx.insert(key, value, self.max_entries_per_agent);
            }
            state.agents.insert(agent_id, ctx);
        }
        tracing::debug!(backend = %backend.kind(), agents = state.agents.len(), "loaded persisted context");
        Ok(())
    }

    /// Fallible variant of [`flush`](Self::flush).
    pub fn try_flush(&self) -> Result<(), MemoryError> {
        let Some(backend) = &self.backend else {
            return Ok(());
        };
        let snapshot: PersistedState = {
            let state = self.lock();
            state
                .agents
                .iter()
                .map(|(agent_id, ctx)| (agent_id.clone(), ctx.entries.clone()))
                .collect()
        };
        backend.persist(&snapshot)
    }
}
