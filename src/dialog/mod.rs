//! NPC conversations
//!
//! Dialog files are JSON maps of dialog id to tree:
//! `{ "<id>": { "npc_name", "npc_title", "dialogs": [ { "id", "text", "choices", "clue", "flag" } ] } }`.
//! A conversation always opens at the node named `initial`.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data::LoadError;
use crate::quests::loader::json_files;

/// Node every conversation starts from
pub const INITIAL_NODE: &str = "initial";
/// `next` value that ends a conversation
pub const EXIT_NODE: &str = "exit";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogChoice {
    pub text: String,
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogNode {
    pub id: String,
    #[serde(default)]
    pub text: Vec<String>,
    #[serde(default)]
    pub choices: Vec<DialogChoice>,
    /// Journal entry recorded when the node is shown
    #[serde(default)]
    pub clue: Option<String>,
    /// `key=value` story flag set when the node is shown
    #[serde(default)]
    pub flag: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogTree {
    #[serde(default = "default_npc_name")]
    pub npc_name: String,
    #[serde(default)]
    pub npc_title: String,
    #[serde(rename = "dialogs")]
    pub nodes: Vec<DialogNode>,
}

fn default_npc_name() -> String {
    "NPC".to_string()
}

impl DialogTree {
    pub fn node(&self, id: &str) -> Option<&DialogNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

/// All dialog trees by id
#[derive(Debug, Clone, Default)]
pub struct DialogLibrary {
    trees: BTreeMap<String, DialogTree>,
}

impl DialogLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, tree: DialogTree) {
        self.trees.insert(id.into(), tree);
    }

    pub fn get(&self, id: &str) -> Option<&DialogTree> {
        self.trees.get(id)
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    /// Merge in every tree from one file's contents
    pub fn parse(&mut self, json: &str) -> Result<usize, serde_json::Error> {
        let trees: BTreeMap<String, DialogTree> = serde_json::from_str(json)?;
        let count = trees.len();
        self.trees.extend(trees);
        Ok(count)
    }

    pub fn load_file(&mut self, path: &Path) -> Result<usize, LoadError> {
        let text = fs::read_to_string(path).map_err(|e| LoadError::io(path, e))?;
        self.parse(&text).map_err(|e| LoadError::parse(path, e))
    }

    /// Load every `*.json` in a directory; unreadable files are skipped
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize, LoadError> {
        let mut total = 0;
        for path in json_files(dir)? {
            match self.load_file(&path) {
                Ok(count) => total += count,
                Err(err) => log::warn!("{}", err),
            }
        }
        log::info!("Loaded {} dialogs from {}", total, dir.display());
        Ok(total)
    }
}

/// Side effects of showing a node
#[derive(Debug, Clone, PartialEq)]
pub enum DialogEffect {
    Clue(String),
    Flag(String),
}

/// Outcome of advancing a conversation
#[derive(Debug, Clone, PartialEq)]
pub enum DialogStep {
    /// Moved to a new node
    Continue(Vec<DialogEffect>),
    /// The conversation is over
    Finished { last_node: String },
    /// The input did not apply (bad choice index, already finished)
    Ignored,
}

/// A conversation in progress
#[derive(Debug, Clone)]
pub struct DialogSession {
    dialog_id: String,
    npc_id: Option<String>,
    tree: DialogTree,
    current: String,
    finished: bool,
}

impl DialogSession {
    /// Open a conversation at its initial node. Also returns the effects of
    /// that node. `None` if the tree has no initial node.
    pub fn start(dialog_id: impl Into<String>, tree: DialogTree) -> Option<(Self, Vec<DialogEffect>)> {
        let dialog_id = dialog_id.into();
        let Some(node) = tree.node(INITIAL_NODE) else {
            log::warn!("Dialog '{}' has no '{}' node", dialog_id, INITIAL_NODE);
            return None;
        };
        let effects = effects_of(node);
        let session = Self { dialog_id, npc_id: None, tree, current: INITIAL_NODE.to_string(), finished: false };
        Some((session, effects))
    }

    pub fn with_npc(mut self, npc_id: impl Into<String>) -> Self {
        self.npc_id = Some(npc_id.into());
        self
    }

    pub fn dialog_id(&self) -> &str {
        &self.dialog_id
    }

    pub fn npc_id(&self) -> Option<&str> {
        self.npc_id.as_deref()
    }

    pub fn npc_name(&self) -> &str {
        &self.tree.npc_name
    }

    pub fn npc_title(&self) -> &str {
        &self.tree.npc_title
    }

    pub fn current_node_id(&self) -> &str {
        &self.current
    }

    pub fn current_node(&self) -> Option<&DialogNode> {
        self.tree.node(&self.current)
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Pick a choice on the current node
    pub fn choose(&mut self, index: usize) -> DialogStep {
        if self.finished {
            return DialogStep::Ignored;
        }
        let Some(choice) = self.current_node().and_then(|n| n.choices.get(index)) else {
            return DialogStep::Ignored;
        };
        match choice.next.clone() {
            Some(next) if next != EXIT_NODE => self.enter(next),
            _ => self.finish(),
        }
    }

    /// Continue past a node that offers no choices
    pub fn advance(&mut self) -> DialogStep {
        if self.finished {
            return DialogStep::Ignored;
        }
        match self.current_node() {
            Some(node) if !node.choices.is_empty() => DialogStep::Ignored,
            _ => self.finish(),
        }
    }

    fn enter(&mut self, next: String) -> DialogStep {
        let Some(node) = self.tree.node(&next) else {
            log::warn!("Dialog '{}' points at missing node '{}'", self.dialog_id, next);
            return self.finish();
        };
        let effects = effects_of(node);
        self.current = next;
        DialogStep::Continue(effects)
    }

    fn finish(&mut self) -> DialogStep {
        self.finished = true;
        DialogStep::Finished { last_node: self.current.clone() }
    }
}

fn effects_of(node: &DialogNode) -> Vec<DialogEffect> {
    let mut effects = Vec::new();
    if let Some(clue) = &node.clue {
        effects.push(DialogEffect::Clue(clue.clone()));
    }
    if let Some(flag) = &node.flag {
        effects.push(DialogEffect::Flag(flag.clone()));
    }
    effects
}
