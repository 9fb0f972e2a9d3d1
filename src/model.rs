//! Payload types carried by the generation stream.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Summary of a post whose generation job is in progress.
///
/// Only `id` is guaranteed; everything the server adds beyond the known
/// fields is kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Job status as reported by the server (e.g. "generating", "done")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Artifact produced by a finished job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    pub id: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Payload of a `post` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostEvent {
    pub post: Post,
}

/// Payload of a `result` event. `version` is null when the job produced no
/// artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEvent {
    pub post: Post,
    #[serde(default)]
    pub version: Option<Version>,
}

/// Payload of a `title` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleEvent {
    pub post_id: String,
    pub title: String,
}

/// A decoded event with a routed name.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationEvent {
    Post(PostEvent),
    Result(ResultEvent),
    Title(TitleEvent),
}

impl GenerationEvent {
    pub const POST: &'static str = "post";
    pub const RESULT: &'static str = "result";
    pub const TITLE: &'static str = "title";

    /// Decode a parsed payload for the given event name.
    ///
    /// Returns `Ok(None)` for names with no route; those payloads are dropped.
    pub fn from_value(event: &str, value: Value) -> Result<Option<Self>, serde_json::Error> {
        let decoded = match event {
            Self::POST => Self::Post(serde_json::from_value(value)?),
            Self::RESULT => Self::Result(serde_json::from_value(value)?),
            Self::TITLE => Self::Title(serde_json::from_value(value)?),
            _ => return Ok(None),
        };
        Ok(Some(decoded))
    }

    /// Name of the event this payload was routed from.
    pub fn name(&self) -> &'static str {
        match self {
            GenerationEvent::Post(_) => Self::POST,
            GenerationEvent::Result(_) => Self::RESULT,
            GenerationEvent::Title(_) => Self::TITLE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_post_event_keeps_unknown_fields() {
        let value = json!({"post": {"id": "a", "status": "generating", "progress": 0.5}});
        let event = GenerationEvent::from_value("post", value).unwrap().unwrap();

        match event {
            GenerationEvent::Post(PostEvent { post }) => {
                assert_eq!(post.id, "a");
                assert_eq!(post.status.as_deref(), Some("generating"));
                assert_eq!(post.title, None);
                assert_eq!(post.extra.get("progress"), Some(&json!(0.5)));
            }
            other => panic!("Expected Post event, got {:?}", other),
        }
    }

    #[test]
    fn test_result_event_with_null_version() {
        let value = json!({"post": {"id": "a"}, "version": null});
        let event = GenerationEvent::from_value("result", value).unwrap();
        assert!(matches!(
            event,
            Some(GenerationEvent::Result(ResultEvent { version: None, .. }))
        ));
    }

    #[test]
    fn test_result_event_with_version() {
        let value = json!({"post": {"id": "a"}, "version": {"id": "v1", "body": "text"}});
        let event = GenerationEvent::from_value("result", value).unwrap().unwrap();

        let GenerationEvent::Result(result) = event else {
            panic!("Expected Result event");
        };
        let version = result.version.unwrap();
        assert_eq!(version.id, "v1");
        assert_eq!(version.extra.get("body"), Some(&json!("text")));
    }

    #[test]
    fn test_title_event_uses_camel_case() {
        let value = json!({"postId": "a", "title": "Hi"});
        let event = GenerationEvent::from_value("title", value).unwrap().unwrap();
        assert_eq!(
            event,
            GenerationEvent::Title(TitleEvent {
                post_id: "a".to_string(),
                title: "Hi".to_string(),
            })
        );
        assert_eq!(event.name(), "title");
    }

    #[test]
    fn test_unrouted_name() {
        let value = json!({"anything": true});
        assert!(GenerationEvent::from_value("message", value.clone()).unwrap().is_none());
        assert!(GenerationEvent::from_value("progress", value).unwrap().is_none());
    }

    #[test]
    fn test_shape_mismatch_is_error() {
        assert!(GenerationEvent::from_value("title", json!({"title": "no id"})).is_err());
        assert!(GenerationEvent::from_value("post", json!([1, 2])).is_err());
    }
}
