use raymon_types::EntityState;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
pub struct EntityQuery {
    pub entry_id: Option<String>,
    pub hostname: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EntityListResponse {
    pub entities: Vec<EntityState>,
}
