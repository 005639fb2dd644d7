//! Lore Registry
//!
//! Loads the conversation graph from JSON or TOML files and checks it for
//! dangling references. Once loaded the graph is never mutated.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use super::definition::{RawState, State};
use crate::error::{ChatError, Result};

/// Problems found by `Lore::validate`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoreIssue {
    #[error("initial state '{state}' is not defined")]
    MissingInitialState { state: String },

    #[error("option '{option_id}' in state '{state}' leads to undefined state '{target}'")]
    DanglingGoto {
        state: String,
        option_id: String,
        target: String,
    },

    #[error("state '{state}' defines option '{option_id}' more than once")]
    DuplicateOptionId { state: String, option_id: String },

    #[error("state '{state}' is unreachable from the initial state")]
    Unreachable { state: String },
}

/// Registry of all conversation states, keyed by state id
#[derive(Debug, Clone, Default)]
pub struct Lore {
    states: HashMap<String, State>,
}

impl Lore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a raw table of states
    pub fn from_raw(raw: HashMap<String, RawState>) -> Self {
        let states = raw
            .iter()
            .map(|(id, state)| (id.clone(), State::from_raw(id, state)))
            .collect();
        Self { states }
    }

    pub fn from_states(states: impl IntoIterator<Item = State>) -> Self {
        Self {
            states: states.into_iter().map(|s| (s.id.clone(), s)).collect(),
        }
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let raw: HashMap<String, RawState> = serde_json::from_str(content)?;
        Ok(Self::from_raw(raw))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let raw: HashMap<String, RawState> = toml::from_str(content)?;
        Ok(Self::from_raw(raw))
    }

    /// Load a single lore file, or every lore file under a directory
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut lore = Self::new();

        if path.is_dir() {
            let mut paths = Vec::new();
            collect_lore_files(path, &mut paths)?;
            paths.sort();

            for file in paths {
                lore.load_file(&file)?;
            }
        } else {
            lore.load_file(path)?;
        }

        info!("Loaded {} chat states from {:?}", lore.len(), path);
        Ok(lore)
    }

    /// Merge one file's states into the registry
    fn load_file(&mut self, path: &Path) -> Result<()> {
        let content = std::fs::read_to_string(path).map_err(|source| ChatError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let raw: HashMap<String, RawState> = match extension(path) {
            Some("json") => serde_json::from_str(&content).map_err(|e| ChatError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?,
            Some("toml") => toml::from_str(&content).map_err(|e| ChatError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?,
            _ => {
                return Err(ChatError::UnsupportedFormat {
                    path: path.to_path_buf(),
                });
            }
        };

        for (id, state) in raw {
            if self.states.contains_key(&id) {
                warn!("Duplicate chat state '{}' in {:?}, overwriting", id, path);
            }
            self.states.insert(id.clone(), State::from_raw(&id, &state));
        }

        Ok(())
    }

    /// Get a state by ID
    pub fn get(&self, state_id: &str) -> Option<&State> {
        self.states.get(state_id)
    }

    pub fn contains(&self, state_id: &str) -> bool {
        self.states.contains_key(state_id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &String> {
        self.states.keys()
    }

    pub fn all(&self) -> impl Iterator<Item = &State> {
        self.states.values()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Check references and reachability. Results are sorted for stable output.
    pub fn validate(&self, initial_state: &str) -> Vec<LoreIssue> {
        let mut issues = Vec::new();

        if !self.contains(initial_state) {
            issues.push(LoreIssue::MissingInitialState {
                state: initial_state.to_string(),
            });
        }

        let mut state_ids: Vec<&String> = self.states.keys().collect();
        state_ids.sort();

        for id in &state_ids {
            let state = &self.states[id.as_str()];
            let mut seen = HashSet::new();

            for option in &state.options {
                if !seen.insert(option.id.as_str()) {
                    issues.push(LoreIssue::DuplicateOptionId {
                        state: state.id.clone(),
                        option_id: option.id.clone(),
                    });
                }
                if !self.contains(&option.goto) {
                    issues.push(LoreIssue::DanglingGoto {
                        state: state.id.clone(),
                        option_id: option.id.clone(),
                        target: option.goto.clone(),
                    });
                }
            }
        }

        if self.contains(initial_state) {
            let reachable = self.reachable_from(initial_state);
            for id in state_ids {
                if !reachable.contains(id.as_str()) {
                    issues.push(LoreIssue::Unreachable { state: id.clone() });
                }
            }
        }

        issues
    }

    /// Run `validate` and log every issue
    pub fn log_issues(&self, initial_state: &str) -> usize {
        let issues = self.validate(initial_state);
        for issue in &issues {
            warn!("Lore issue: {}", issue);
        }
        issues.len()
    }

    fn reachable_from<'a>(&'a self, start: &'a str) -> HashSet<&'a str> {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([start]);

        while let Some(id) = queue.pop_front() {
            if !visited.insert(id) {
                continue;
            }
            if let Some(state) = self.states.get(id) {
                for option in &state.options {
                    if self.contains(&option.goto) && !visited.contains(option.goto.as_str()) {
                        queue.push_back(option.goto.as_str());
                    }
                }
            }
        }

        visited
    }
}

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|e| e.to_str())
}

/// Recursively collect `.json` and `.toml` files
fn collect_lore_files(dir: &Path, paths: &mut Vec<PathBuf>) -> Result<()> {
    let entries = std::fs::read_dir(dir).map_err(|source| ChatError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    for entry in entries {
        let entry = entry.map_err(|source| ChatError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();

        if path.is_dir() {
            collect_lore_files(&path, paths)?;
        } else if matches!(extension(&path), Some("json") | Some("toml")) {
            paths.push(path);
        }
    }

    Ok(())
}
