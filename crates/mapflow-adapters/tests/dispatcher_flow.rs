use mapflow_adapters::{ActionOutcome, CannedTransport, FunctionRegistry, RecordedCall, RequestError, StepDispatcher, StepError,
                       StepPlan, StepView, UserAction};
use mapflow_core::{ServiceDefinition, Transition, WorkflowInstance};
use serde_json::{json, Value};
use std::sync::Arc;

fn service(workflow: Value) -> Arc<ServiceDefinition> {
    Arc::new(serde_json::from_value(json!({"name": "test", "workflow": workflow})).expect("service"))
}

fn instance(workflow: Value) -> WorkflowInstance {
    WorkflowInstance::start(0, service(workflow)).unwrap()
}

#[tokio::test]
async fn choice_option_jumps_to_its_target() {
    let mut wf = instance(json!([
        {"type": "choice", "name": "what", "next_step": 1, "options": [
            {"name": "a", "next_step": 1}, {"name": "b", "next_step": 2}
        ]},
        {"type": "text", "name": "a"},
        {"type": "text", "name": "b"}
    ]));
    let d = StepDispatcher::default();
    let t = CannedTransport::new();
    match d.drive(&wf, &t).await {
        StepView::Choice { options, .. } => assert_eq!(options.len(), 2),
        other => panic!("unexpected {other:?}"),
    }
    let out = d.act(&mut wf, UserAction::Choose(1), &t).await.unwrap();
    assert_eq!(out, ActionOutcome::Moved(Transition::Advanced { from: Some(0), to: 2 }));
    let err = d.act(&mut wf, UserAction::Choose(0), &t).await.unwrap_err();
    assert!(matches!(err, StepError::NotApplicable { .. }));
}

fn form_workflow() -> Value {
    json!([
        {"type": "form", "name": "building", "next_step": 1, "fields": [
            {"name": "floors", "type": "integer", "required": true},
            {"name": "label", "type": "text"},
            {"name": "heated", "type": "boolean", "default": false}
        ]},
        {"type": "text", "name": "done", "previous_step": 0}
    ])
}

#[tokio::test]
async fn form_requires_fields_and_writes_nothing_on_error() {
    let mut wf = instance(form_workflow());
    let d = StepDispatcher::default();
    let t = CannedTransport::new();
    let err = d.act(&mut wf, UserAction::SubmitForm(vec![("label".into(), json!("B1"))]), &t)
               .await
               .unwrap_err();
    assert!(matches!(err, StepError::Validation(_)));
    assert!(wf.state().is_empty());
    assert_eq!(wf.current_index(), Some(0));

    let bad = d.act(&mut wf, UserAction::SubmitForm(vec![("floors".into(), json!("many"))]), &t).await;
    assert!(matches!(bad, Err(StepError::Validation(_))));
    assert!(wf.state().is_empty());
}

#[tokio::test]
async fn form_resubmission_after_back_is_idempotent() {
    let mut wf = instance(form_workflow());
    let d = StepDispatcher::default();
    let t = CannedTransport::new();
    let input = vec![("floors".to_string(), json!("4")), ("label".to_string(), json!("B1"))];

    let out = d.act(&mut wf, UserAction::SubmitForm(input.clone()), &t).await.unwrap();
    assert_eq!(out.written_keys().len(), 3);
    let first = wf.state().clone();
    assert_eq!(first.get("floors"), Some(&json!(4)));
    assert_eq!(first.get("heated"), Some(&json!(false)));

    d.act(&mut wf, UserAction::Previous, &t).await.unwrap();
    d.act(&mut wf, UserAction::SubmitForm(input), &t).await.unwrap();
    assert_eq!(wf.state(), &first);
    assert_eq!(wf.current_index(), Some(1));
}

#[tokio::test]
async fn multiple_form_collects_repeated_names() {
    let mut wf = instance(json!([
        {"type": "form", "name": "carriers", "multiple": true, "fields": [{"name": "carrier"}]}
    ]));
    let d = StepDispatcher::default();
    let pairs = vec![("carrier".into(), json!("gas")), ("carrier".into(), json!("heat"))];
    d.act(&mut wf, UserAction::SubmitForm(pairs.clone()), &CannedTransport::new()).await.unwrap();
    d.act(&mut wf, UserAction::SubmitForm(pairs), &CannedTransport::new()).await.unwrap();
    assert_eq!(wf.state().get("carrier"), Some(&json!(["gas", "heat"])));
}

fn query_workflow() -> Value {
    json!([
        {"type": "select-query", "name": "project", "next_step": 1, "target_variable": "project_id",
         "value_attr": "id",
         "source": {"url": "/api/projects", "request_params": {"owner": "user.id"}, "choices_attr": "items"}},
        {"type": "text", "name": "next"}
    ])
}

#[tokio::test]
async fn select_query_fetches_with_state_params_and_writes_selection() {
    let mut wf = instance(query_workflow());
    wf.state_mut().set_key("user", json!({"id": 42}));
    let t = CannedTransport::new().route("/api/projects", json!({"items": [{"id": 1, "name": "Noord"}, {"id": 2, "name": "Zuid"}]}));
    let d = StepDispatcher::default();

    match d.drive(&wf, &t).await {
        StepView::Select { items, multiple, .. } => {
            assert!(!multiple);
            assert_eq!(items[1].label, "Zuid");
            assert_eq!(items[1].value, json!(2));
        }
        other => panic!("unexpected {other:?}"),
    }
    let query = match &t.calls()[0] {
        RecordedCall::Fetch { query, .. } => Value::Object(query.clone()),
        other => panic!("unexpected {other:?}"),
    };
    assert_eq!(query, json!({"owner": 42}));

    let out = d.act(&mut wf, UserAction::Select(vec![json!(2)]), &t).await.unwrap();
    assert_eq!(out, ActionOutcome::Updated { keys: vec!["project_id".into()] });
    assert_eq!(wf.state().get("project_id"), Some(&json!(2)));
    assert_eq!(wf.current_index(), Some(0));

    let two = d.act(&mut wf, UserAction::Select(vec![json!(1), json!(2)]), &t).await;
    assert!(matches!(two, Err(StepError::Validation(_))));
}

#[tokio::test]
async fn late_response_for_a_step_left_behind_is_dropped() {
    let mut wf = instance(query_workflow());
    let d = StepDispatcher::default();
    let pending = match d.enter(&wf) {
        StepPlan::Fetch(p) => p,
        other => panic!("unexpected {other:?}"),
    };
    wf.do_next(None).unwrap();
    let view = d.complete(&wf, &pending, Ok(Some(json!({"items": []}))));
    assert_eq!(view, StepView::Stale);

    let mut closed = instance(query_workflow());
    let pending = match d.enter(&closed) {
        StepPlan::Fetch(p) => p,
        other => panic!("unexpected {other:?}"),
    };
    closed.close();
    assert_eq!(d.complete(&closed, &pending, Ok(None)), StepView::Stale);
}

#[tokio::test]
async fn request_failures_become_step_local_views() {
    let wf = instance(query_workflow());
    let d = StepDispatcher::default();

    let t = CannedTransport::new().route_reply("/api/projects", Err(RequestError::from_status(401, "Unauthorized")));
    assert_eq!(d.drive(&wf, &t).await, StepView::AuthRequired);

    let t = CannedTransport::new().route_reply("/api/projects", Err(RequestError::from_status(500, "Internal Server Error")));
    assert!(matches!(d.drive(&wf, &t).await, StepView::Error { status: Some(500), .. }));

    let t = CannedTransport::new();
    t.expire_session();
    assert_eq!(d.drive(&wf, &t).await, StepView::AuthRequired);
    assert!(t.calls().is_empty());
    assert_eq!(wf.current_index(), Some(0));
}

#[tokio::test]
async fn table_query_takes_columns_from_first_row() {
    let wf = instance(json!([
        {"type": "table-query", "name": "assets", "source": {"url": "/api/assets"}}
    ]));
    let t = CannedTransport::new().route("/api/assets", json!([{"id": "a1", "kind": "pipe"}, {"id": "a2", "kind": "pump"}]));
    match StepDispatcher::default().drive(&wf, &t).await {
        StepView::Table { columns, rows, .. } => {
            assert_eq!(columns, vec!["id", "kind"]);
            assert_eq!(rows.len(), 2);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn get_data_renders_a_tree() {
    let wf = instance(json!([
        {"type": "get_data", "name": "kpis", "fields": ["value"], "source": {"url": "/api/kpi"}}
    ]));
    let t = CannedTransport::new().route("/api/kpi", json!({"kpis": [{"value": 3, "hidden": 1}]}));
    match StepDispatcher::default().drive(&wf, &t).await {
        StepView::DataTree { root, .. } => {
            let kpi = &root.children[0].children[0];
            assert_eq!(kpi.children.len(), 1);
            assert_eq!(kpi.children[0].value.as_deref(), Some("3"));
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(wf.state().is_empty());
}

#[tokio::test]
async fn download_then_next_without_next_step_clears() {
    let mut wf = instance(json!([
        {"type": "download_file", "name": "export", "url": "/api/export", "file_name": "export.esdl",
         "request_params": {"scenario": "scenario"}}
    ]));
    wf.state_mut().set_key("scenario", json!("2030"));
    let t = CannedTransport::new().route("/api/export", json!({"file": "PGVzZGwvPg=="}));
    let d = StepDispatcher::default();
    let out = d.act(&mut wf, UserAction::Download, &t).await.unwrap();
    assert_eq!(out, ActionOutcome::FileReady { name: "export.esdl".into(),
                                               bytes: b"<esdl/>".to_vec() });
    assert_eq!(t.calls()[0], RecordedCall::Post { url: "/api/export".into(),
                                                  payload: json!({"scenario": "2030"}) });
    assert_eq!(d.act(&mut wf, UserAction::Next, &t).await.unwrap(), ActionOutcome::Cleared);
}

#[tokio::test]
async fn upload_encodes_and_stores_response() {
    let mut wf = instance(json!([
        {"type": "upload_file", "name": "profile", "url": "/api/upload", "target_variable": "upload", "next_step": 1},
        {"type": "text", "name": "thanks"}
    ]));
    let t = CannedTransport::new().route("/api/upload", json!({"id": "f-9"}));
    let d = StepDispatcher::default();
    let out = d.act(&mut wf, UserAction::UploadFile { name: "p.csv".into(),
                                                      bytes: b"a,b".to_vec() },
                    &t)
               .await
               .unwrap();
    assert_eq!(out, ActionOutcome::Uploaded(Some(json!({"id": "f-9"}))));
    assert_eq!(wf.state().get("upload"), Some(&json!({"id": "f-9"})));
    match &t.calls()[0] {
        RecordedCall::Post { payload, .. } => {
            assert_eq!(payload["file"], json!("YSxi"));
            assert_eq!(payload["file_name"], json!("p.csv"));
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(wf.current_index(), Some(0));
    assert!(matches!(d.act(&mut wf, UserAction::Next, &t).await.unwrap(), ActionOutcome::Moved(_)));
}

#[tokio::test]
async fn http_post_with_expired_session_changes_nothing() {
    let mut wf = instance(json!([
        {"type": "http_post", "name": "simulate", "url": "/api/simulate", "target_variable": "job"}
    ]));
    let t = CannedTransport::new().route("/api/simulate", json!({"job": 1}));
    t.expire_session();
    let err = StepDispatcher::default().act(&mut wf, UserAction::Post, &t).await.unwrap_err();
    assert_eq!(err, StepError::AuthExpired);
    assert_eq!(err.to_view(), StepView::AuthRequired);
    assert!(wf.state().is_empty());
}

#[tokio::test]
async fn call_function_reads_dotted_parameters() {
    let mut wf = instance(json!([
        {"type": "call_js_function", "name": "zoom", "js_function": "zoomTo",
         "parameters": ["area.bbox", "missing"], "target_variable": "zoomed"},
        {"type": "call_js_function", "name": "nothing", "js_function": "notThere"}
    ]));
    wf.state_mut().set_key("area", json!({"bbox": [1, 2, 3, 4]}));
    let mut reg = FunctionRegistry::new();
    reg.register("zoomTo", |args| Ok(Some(json!({"args": args}))));
    let d = StepDispatcher::new(reg);
    let t = CannedTransport::new();

    let out = d.act(&mut wf, UserAction::Call, &t).await.unwrap();
    let expected = json!({"args": [[1, 2, 3, 4], null]});
    assert_eq!(out, ActionOutcome::Called(Some(expected.clone())));
    assert_eq!(wf.state().get("zoomed"), Some(&expected));

    wf.do_next(Some(1)).unwrap();
    let err = d.act(&mut wf, UserAction::Call, &t).await.unwrap_err();
    assert_eq!(err, StepError::UnknownFunction("notThere".into()));
}

#[tokio::test]
async fn unknown_step_type_is_a_placeholder_that_blocks() {
    let mut wf = instance(json!([
        {"type": "hologram", "name": "?", "next_step": 1},
        {"type": "text", "name": "after"}
    ]));
    let d = StepDispatcher::default();
    let t = CannedTransport::new();
    assert_eq!(d.drive(&wf, &t).await, StepView::Unknown { type_name: "hologram".into() });
    assert_eq!(d.act(&mut wf, UserAction::Next, &t).await.unwrap(), ActionOutcome::Blocked);
    assert_eq!(wf.current_index(), Some(0));
}

#[tokio::test]
async fn service_step_passes_declared_state_subset() {
    let mut wf = instance(json!([
        {"type": "service", "name": "nested", "service": {"id": "ess-check"},
         "request_params": {"energysystem": "es_id"}}
    ]));
    wf.state_mut().set_key("es_id", json!("es-1"));
    wf.state_mut().set_key("secret", json!("x"));
    match StepDispatcher::default().drive(&wf, &CannedTransport::new()).await {
        StepView::Service { service, params, .. } => {
            assert_eq!(service, json!({"id": "ess-check"}));
            assert_eq!(Value::Object(params), json!({"energysystem": "es-1"}));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn previous_is_blocked_where_the_step_forbids_it() {
    let mut wf = instance(json!([
        {"type": "text", "name": "a", "next_step": 1},
        {"type": "text", "name": "b", "previous_step": -1, "next_step": 2},
        {"type": "text", "name": "c"}
    ]));
    let d = StepDispatcher::default();
    let t = CannedTransport::new();
    d.act(&mut wf, UserAction::Next, &t).await.unwrap();
    assert!(!wf.can_go_back());

    assert_eq!(d.act(&mut wf, UserAction::Previous, &t).await.unwrap(), ActionOutcome::Blocked);
    assert_eq!(wf.current_index(), Some(1));
    assert_eq!(wf.previous_steps().len(), 1);

    // a step without previous_step is as final as a negative one
    d.act(&mut wf, UserAction::Next, &t).await.unwrap();
    assert_eq!(d.act(&mut wf, UserAction::Previous, &t).await.unwrap(), ActionOutcome::Blocked);
    assert_eq!(wf.current_index(), Some(2));
}
