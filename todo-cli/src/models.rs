//! Records as the API sends them.
use serde::{Deserialize, Serialize};

/// A to-do item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Todo {
    #[serde(rename = "_id")]
    pub id: String,
    /// Subject of the user that created the item.
    #[serde(rename = "creatorID")]
    pub creator_id: String,
    pub content: String,
    #[serde(rename = "isDone")]
    pub is_done: bool,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    #[serde(rename = "categoryID", default)]
    pub category_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

/// `{"error": {"code", "message"}}` on 400 / 500.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn todo_uses_wire_field_names() {
        let todo: Todo = serde_json::from_value(json!({
            "_id": "86Rf07xd4z",
            "creatorID": "user_1",
            "content": "Buy milk",
            "isDone": false,
            "createdAt": "2024-05-01T12:00:00.000Z",
            "categoryID": null
        }))
        .unwrap();

        assert_eq!(todo.id, "86Rf07xd4z");
        assert_eq!(todo.category_id, None);

        let back = serde_json::to_value(&todo).unwrap();
        assert_eq!(back["isDone"], false);
        assert_eq!(back["creatorID"], "user_1");
    }

    #[test]
    fn missing_category_is_none() {
        let todo: Todo = serde_json::from_value(json!({
            "_id": "a",
            "creatorID": "u",
            "content": "c",
            "isDone": true,
            "createdAt": "2024-05-01T12:00:00.000Z"
        }))
        .unwrap();
        assert_eq!(todo.category_id, None);
    }
}
