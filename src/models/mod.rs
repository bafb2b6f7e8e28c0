use serde::{Deserialize, Deserializer, Serialize};

// ─── Lenient field decoding ─────────────────────────────────────────────────

/// `null` decodes like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Ids arrive as strings, numbers or `null` depending on the task source.
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

// ─── Assignments ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<String>,
    /// `None` for tasks outside any module section.
    #[serde(default, deserialize_with = "lenient_id")]
    pub module_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub module_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Date-like string as sent by the backend (ISO date or datetime).
    /// Tasks without a due date send `null`.
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub completed: Option<bool>,
    #[serde(default)]
    pub priority: Option<u8>,
    #[serde(default)]
    pub labels: Option<Vec<String>>,
}

impl Assignment {
    /// The description, if the backend sent a non-empty one.
    pub fn description_text(&self) -> Option<&str> {
        self.description.as_deref().filter(|d| !d.is_empty())
    }

    /// The raw due date, empty when the task has none.
    pub fn due(&self) -> &str {
        self.due_date.as_deref().unwrap_or_default()
    }
}

// ─── Modules ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Module {
    /// `None` groups the tasks that belong to no section.
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub completed: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub upcoming: u32,
}

// ─── Wire envelopes ─────────────────────────────────────────────────────────

/// Body of `GET /api/assignments` and `GET /api/assignments/week`.
#[derive(Debug, Clone, Deserialize)]
pub struct AssignmentsResponse {
    pub success: bool,
    pub assignments: Option<Vec<Assignment>>,
    pub modules: Option<Vec<Module>>,
    pub last_sync: Option<String>,
    pub error: Option<String>,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub service: Option<String>,
    pub timestamp: Option<String>,
}

/// Body of `POST /api/sync`.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncResponse {
    pub success: bool,
    pub assignments_count: Option<u64>,
    pub modules_count: Option<u64>,
    pub last_sync: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyncSummary {
    pub assignments_count: u64,
    pub modules_count: u64,
    pub last_sync: Option<String>,
}

// ─── Snapshot ───────────────────────────────────────────────────────────────

/// The collections returned by one successful fetch. Replaces the previous
/// snapshot wholesale, never merged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub assignments: Vec<Assignment>,
    pub modules: Vec<Module>,
    pub last_sync: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_week_response() {
        let body = r#"{
            "success": true,
            "assignments": [{
                "id": "123",
                "module_id": "sec-1",
                "module_name": "Analysis I",
                "title": "Blatt 3",
                "description": "",
                "due_date": "2024-05-02T23:59:00",
                "completed": false,
                "priority": 4,
                "labels": ["abgabe"]
            }],
            "count": 1,
            "last_sync": "2024-05-01T08:00:00"
        }"#;
        let resp: AssignmentsResponse = serde_json::from_str(body).unwrap();
        assert!(resp.success);
        assert!(resp.modules.is_none());
        let assignments = resp.assignments.unwrap();
        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments[0].module_id.as_deref(), Some("sec-1"));
        assert_eq!(assignments[0].description_text(), None);
    }

    #[test]
    fn test_decode_failure_response() {
        let body = r#"{"success": false, "error": "boom"}"#;
        let resp: AssignmentsResponse = serde_json::from_str(body).unwrap();
        assert!(!resp.success);
        assert_eq!(resp.error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_decode_task_without_due_date_or_section() {
        let body = r#"{"success": true, "assignments": [{"id": "9", "title": "Lesen",
            "description": "", "due_date": null, "module_id": null, "module_name": "Unbekannt"}]}"#;
        let resp: AssignmentsResponse = serde_json::from_str(body).unwrap();
        let assignment = &resp.assignments.unwrap()[0];
        assert_eq!(assignment.due_date, None);
        assert_eq!(assignment.due(), "");
        assert_eq!(assignment.module_id, None);
        assert_eq!(assignment.title, "Lesen");
    }

    #[test]
    fn test_decode_module_without_id() {
        let body = r#"{"success": true, "modules": [
            {"id": null, "name": "Unbekannt", "total": 2, "completed": 1, "upcoming": 1},
            {"id": 7, "name": null, "total": 1, "completed": 0, "upcoming": 1}]}"#;
        let resp: AssignmentsResponse = serde_json::from_str(body).unwrap();
        let modules = resp.modules.unwrap();
        assert_eq!(modules[0].id, None);
        assert_eq!(modules[0].completed, 1);
        assert_eq!(modules[1].id.as_deref(), Some("7"));
        assert_eq!(modules[1].name, "");
    }
}
