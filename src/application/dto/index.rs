use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneData {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    pub pointers: Vec<String>,
    pub runtime_version: Option<String>,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorldData {
    pub name: String,
    pub scenes: Vec<SceneData>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorldsIndex {
    pub index: Vec<WorldData>,
    pub timestamp: DateTime<Utc>,
}
