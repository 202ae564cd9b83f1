use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Body of `POST /v1/objects`.
#[derive(Debug, Clone, Serialize)]
pub struct NewObject {
    pub class: String,
    pub properties: serde_json::Value,
    /// Client-chosen object id. Omitted to let the server assign one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
}

impl NewObject {
    pub fn new(class: impl Into<String>, properties: serde_json::Value) -> Self {
        Self {
            class: class.into(),
            properties,
            id: None,
        }
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }
}

/// Object as echoed back by the server after a write.
#[derive(Debug, Clone, Deserialize)]
pub struct StoredObject {
    pub id: Uuid,
    pub class: String,
    #[serde(rename = "creationTimeUnix")]
    pub creation_time_unix: Option<i64>,
}
