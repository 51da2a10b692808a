use std::path::PathBuf;

use serde::Deserialize;

use crate::analysis::Analyzer;
use crate::roster::Roster;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub roster: Option<Roster>,
    pub analyzer: Box<dyn Analyzer>,
}

impl AppState {
    pub fn new(analyzer: Box<dyn Analyzer>) -> Self {
        AppState {
            workspace: None,
            roster: None,
            analyzer,
        }
    }
}
