use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::mutation::{
    alias, apply_batch, capture_snapshot, BatchError, BatchResult, Diagnostic, DiagnosticLog,
    HistoryStep, MutationContext, UndoHistory,
};
use crate::reflect::MemberInfo;
use crate::scene::{LookupError, ObjectId, ObjectSummary, SceneStore};
use crate::values::TypedValue;

use super::operation::{
    decode_request, GetPropertiesParams, Operation, RequestError, SetPropertiesParams,
    TargetParams,
};

pub const DEFAULT_HISTORY_LIMIT: usize = 256;
pub const DEFAULT_DIAGNOSTIC_LIMIT: usize = 64;

#[derive(Debug, Error)]
pub enum RouterError {
    #[error(transparent)]
    Request(#[from] RequestError),
    #[error(transparent)]
    Batch(#[from] BatchError),
}

impl From<LookupError> for RouterError {
    fn from(error: LookupError) -> Self {
        RouterError::Batch(BatchError::Lookup(error))
    }
}

impl RouterError {
    pub fn code(&self) -> &'static str {
        match self {
            RouterError::Request(_) => "InvalidRequest",
            RouterError::Batch(error) => error.code(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertiesReport {
    pub target: ObjectId,
    pub kind: String,
    pub values: BTreeMap<String, TypedValue>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MembersReport {
    pub target: ObjectId,
    pub kind: String,
    pub members: Vec<MemberInfo>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub children: BTreeMap<String, Vec<MemberInfo>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryReport {
    pub applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<HistoryStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Batch(BatchResult),
    Properties(PropertiesReport),
    Members(MembersReport),
    Objects { objects: Vec<ObjectSummary> },
    History(HistoryReport),
    Pong { pong: bool, version: &'static str },
    Error { error: ErrorBody },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub ok: bool,
    #[serde(flatten)]
    pub body: ResponseBody,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<Diagnostic>,
}

impl Response {
    pub fn to_line(&self) -> String {
        match serde_json::to_string(self) {
            Ok(line) => line,
            Err(err) => {
                warn!(error = %err, "response_encode_failed");
                r#"{"ok":false,"error":{"code":"Internal","message":"response encoding failed"}}"#
                    .to_string()
            }
        }
    }
}

/// Owns the scene and the per-process collaborators, and answers one
/// request at a time.
#[derive(Debug)]
pub struct CommandRouter<S: SceneStore> {
    scene: S,
    history: UndoHistory,
    diagnostics: DiagnosticLog,
}

impl<S: SceneStore> CommandRouter<S> {
    pub fn new(scene: S) -> Self {
        Self::with_limits(scene, DEFAULT_HISTORY_LIMIT, DEFAULT_DIAGNOSTIC_LIMIT)
    }

    pub fn with_limits(scene: S, history_limit: usize, diagnostic_limit: usize) -> Self {
        Self {
            scene,
            history: UndoHistory::with_limit(history_limit),
            diagnostics: DiagnosticLog::with_capacity(diagnostic_limit),
        }
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn history(&self) -> &UndoHistory {
        &self.history
    }

    pub fn handle_line(&mut self, line: &str) -> String {
        self.handle(line).to_line()
    }

    pub fn handle(&mut self, raw: &str) -> Response {
        let result = decode_request(raw)
            .map_err(RouterError::from)
            .and_then(|operation| self.dispatch(operation));
        let warnings = self.diagnostics.drain();
        match result {
            Ok(body) => Response {
                ok: true,
                body,
                warnings,
            },
            Err(err) => {
                warn!(code = err.code(), error = %err, "request_rejected");
                Response {
                    ok: false,
                    body: ResponseBody::Error {
                        error: ErrorBody {
                            code: err.code(),
                            message: err.to_string(),
                        },
                    },
                    warnings,
                }
            }
        }
    }

    pub fn dispatch(&mut self, operation: Operation) -> Result<ResponseBody, RouterError> {
        debug!(operation = ?operation.kind(), "operation_dispatch");
        match operation {
            Operation::SetProperties(params) => self.set_properties(&params),
            Operation::GetProperties(params) => self.get_properties(&params),
            Operation::ListMembers(params) => self.list_members(&params),
            Operation::ListObjects => Ok(ResponseBody::Objects {
                objects: self.scene.objects(),
            }),
            Operation::Undo => {
                let step = self.history.undo(&mut self.scene)?;
                Ok(history_body(step))
            }
            Operation::Redo => {
                let step = self.history.redo(&mut self.scene)?;
                Ok(history_body(step))
            }
            Operation::Ping => Ok(ResponseBody::Pong {
                pong: true,
                version: env!("CARGO_PKG_VERSION"),
            }),
        }
    }

    fn set_properties(
        &mut self,
        params: &SetPropertiesParams,
    ) -> Result<ResponseBody, RouterError> {
        let mut target = self.scene.resolve(&params.target, &params.target_kind)?;
        let fields = params.field_requests();
        let mut ctx =
            MutationContext::new(&mut self.diagnostics).with_history(&mut self.history);
        let result = apply_batch(&mut target, &fields, &mut ctx)?;
        info!(
            object = %target.id,
            kind = %target.kind,
            fields = fields.len(),
            applied = result.applied_count(),
            "set_properties_applied"
        );
        Ok(ResponseBody::Batch(result))
    }

    fn get_properties(&self, params: &GetPropertiesParams) -> Result<ResponseBody, RouterError> {
        let view = self.scene.resolve_ref(&params.target, &params.target_kind)?;
        let snapshot = capture_snapshot(view.object);
        let Some(names) = &params.names else {
            return Ok(ResponseBody::Properties(PropertiesReport {
                target: view.id,
                kind: view.kind,
                values: snapshot,
                missing: Vec::new(),
            }));
        };

        let members = view.object.members();
        let mut values = BTreeMap::new();
        let mut missing = Vec::new();
        for name in names {
            let key = if snapshot.contains_key(name) {
                name.clone()
            } else {
                alias::resolve(&view.kind, name, &members)
            };
            match snapshot.get(&key) {
                Some(value) => {
                    values.insert(name.clone(), value.clone());
                }
                None => missing.push(name.clone()),
            }
        }
        Ok(ResponseBody::Properties(PropertiesReport {
            target: view.id,
            kind: view.kind,
            values,
            missing,
        }))
    }

    fn list_members(&self, params: &TargetParams) -> Result<ResponseBody, RouterError> {
        let view = self.scene.resolve_ref(&params.target, &params.target_kind)?;
        let children = view
            .object
            .child_names()
            .into_iter()
            .filter_map(|name| {
                view.object
                    .child(name)
                    .map(|child| (name.to_string(), child.members()))
            })
            .collect();
        Ok(ResponseBody::Members(MembersReport {
            target: view.id,
            kind: view.kind.clone(),
            members: view.object.members(),
            children,
        }))
    }
}

fn history_body(step: Option<HistoryStep>) -> ResponseBody {
    ResponseBody::History(HistoryReport {
        applied: step.is_some(),
        step,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;
    use crate::scene::components::{Light, Material, MeshRenderer, Transform};
    use crate::scene::InMemoryScene;

    fn router() -> CommandRouter<InMemoryScene> {
        let mut scene = InMemoryScene::default();
        let crate_id = scene.spawn("Crate");
        scene.attach(crate_id, Transform::default());
        scene.attach(crate_id, MeshRenderer::with_material(Material::named("Wood")));
        let lamp = scene.spawn("Lamp");
        scene.attach(lamp, Light::default());
        CommandRouter::with_limits(scene, 16, 8)
    }

    fn send(router: &mut CommandRouter<InMemoryScene>, request: Value) -> Value {
        let line = router.handle_line(&request.to_string());
        serde_json::from_str(&line).expect("response json")
    }

    #[test]
    fn ping_answers_ok() {
        let mut router = router();
        let response = send(&mut router, json!({"operation": "ping"}));
        assert_eq!(response["ok"], true);
        assert_eq!(response["pong"], true);
    }

    #[test]
    fn missing_target_is_a_structured_error() {
        let mut router = router();
        let response = send(
            &mut router,
            json!({
                "operation": "set_properties",
                "target": "Ghost",
                "targetKind": "Transform",
                "fields": {"x": "1"}
            }),
        );
        assert_eq!(response["ok"], false);
        assert_eq!(response["error"]["code"], "TargetNotFound");
    }

    #[test]
    fn empty_field_set_is_rejected() {
        let mut router = router();
        let response = send(
            &mut router,
            json!({
                "operation": "set_properties",
                "target": "Crate",
                "targetKind": "Transform",
                "fields": {}
            }),
        );
        assert_eq!(response["error"]["code"], "NoFields");
    }

    #[test]
    fn malformed_requests_report_invalid_request() {
        let mut router = router();
        let line = router.handle_line("not json");
        let response: Value = serde_json::from_str(&line).expect("json");
        assert_eq!(response["ok"], false);
        assert_eq!(response["error"]["code"], "InvalidRequest");
    }

    #[test]
    fn fallbacks_surface_as_warnings() {
        let mut router = router();
        let response = send(
            &mut router,
            json!({
                "operation": "set_properties",
                "target": "Crate",
                "targetKind": "Transform",
                "fields": {"position": "NaN,0,0"}
            }),
        );
        assert_eq!(response["ok"], true);
        assert_eq!(response["fullSuccess"], true);
        assert_eq!(response["outcomes"][0]["code"], "MalformedValue");
        assert_eq!(response["warnings"][0]["severity"], "warning");

        let next = send(&mut router, json!({"operation": "ping"}));
        assert!(next.get("warnings").is_none());
    }

    #[test]
    fn warnings_past_the_log_limit_are_counted() {
        let mut scene = InMemoryScene::default();
        let id = scene.spawn("Crate");
        scene.attach(id, Transform::default());
        let mut router = CommandRouter::with_limits(scene, 16, 1);
        let response = send(
            &mut router,
            json!({
                "operation": "set_properties",
                "target": "Crate",
                "targetKind": "Transform",
                "fields": {"position": "NaN,0,0", "localScale": "bad"}
            }),
        );
        let warnings = response["warnings"].as_array().expect("warnings");
        assert_eq!(warnings.len(), 2);
        assert_eq!(warnings[0]["field"], "localScale");
        assert_eq!(warnings[1]["message"], "1 earlier diagnostics dropped");
    }

    #[test]
    fn get_properties_resolves_aliases_and_child_members() {
        let mut router = router();
        let response = send(
            &mut router,
            json!({
                "operation": "get_properties",
                "target": "Crate",
                "targetKind": "MeshRenderer",
                "names": ["material.color", "enabled", "nope"]
            }),
        );
        assert_eq!(response["values"]["material.color"]["r"], 1.0);
        assert_eq!(response["values"]["enabled"], true);
        assert_eq!(response["missing"], json!(["nope"]));
    }

    #[test]
    fn list_members_includes_children() {
        let mut router = router();
        let response = send(
            &mut router,
            json!({"operation": "list_members", "target": 0, "targetKind": "MeshRenderer"}),
        );
        assert_eq!(response["kind"], "MeshRenderer");
        assert_eq!(response["children"]["material"][1]["name"], "color");
        assert_eq!(response["members"][1]["writable"], false);
    }

    #[test]
    fn undo_without_history_reports_not_applied() {
        let mut router = router();
        let response = send(&mut router, json!({"operation": "undo"}));
        assert_eq!(response["ok"], true);
        assert_eq!(response["applied"], false);
    }

    #[test]
    fn list_objects_names_every_object() {
        let mut router = router();
        let response = send(&mut router, json!({"operation": "list_objects"}));
        assert_eq!(response["objects"][1]["name"], "Lamp");
        assert_eq!(response["objects"][1]["kinds"], json!(["GameObject", "Light"]));
    }
}
