// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Application state and router.

use std::sync::Arc;

use axum::{
	routing::{get, post},
	Router,
};
use parley_agent::{ConversationLoop, LoopConfig};
use parley_common_core::{ConversationStore, LlmClient};
use parley_persona::PersonaStore;
use parley_server_config::ServerConfig;
use parley_tools::ToolRegistry;
use tower_http::{
	cors::{Any, CorsLayer},
	trace::TraceLayer,
};

use crate::project_store::ProjectStore;
use crate::routes::{agents, chat, files, health, projects};

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
	pub personas: Arc<PersonaStore>,
	pub projects: Arc<ProjectStore>,
	pub chat: Arc<ConversationLoop>,
	/// Used when a chat request does not say.
	pub tools_enabled: bool,
}

/// Wires the loop to `llm` and to `projects` as its conversation store.
pub fn create_app_state(
	config: &ServerConfig,
	llm: Arc<dyn LlmClient>,
	projects: Arc<ProjectStore>,
) -> AppState {
	let loop_config = LoopConfig::new(config.llm.model.clone(), config.llm.max_tokens)
		.with_request_timeout(config.chat.request_timeout);
	let store: Arc<dyn ConversationStore> = projects.clone();

	AppState {
		personas: Arc::new(PersonaStore::new(config.paths.personas_dir.clone())),
		projects,
		chat: Arc::new(ConversationLoop::new(
			llm,
			ToolRegistry::new(),
			store,
			loop_config,
		)),
		tools_enabled: config.chat.tools_enabled,
	}
}

pub fn create_router(state: AppState) -> Router {
	let cors = CorsLayer::new()
		.allow_origin(Any)
		.allow_methods(Any)
		.allow_headers(Any);

	Router::new()
		.route("/health", get(health::health_check))
		.route("/api/agents", get(agents::list_agents))
		.route("/api/agents/{id}", get(agents::get_agent))
		.route(
			"/api/projects",
			get(projects::list_projects).post(projects::create_project),
		)
		.route(
			"/api/projects/{id}",
			get(projects::get_project).delete(projects::delete_project),
		)
		.route("/api/projects/{id}/files", get(files::list_files))
		.route("/api/projects/{id}/files/content", get(files::file_content))
		.route("/api/chat", post(chat::chat))
		.route("/api/chat/stream", post(chat::chat_stream))
		.layer(TraceLayer::new_for_http())
		.layer(cors)
		.with_state(state)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::VecDeque;
	use std::path::Path;
	use std::sync::Mutex;

	use async_trait::async_trait;
	use axum::{
		body::Body,
		http::{Request, StatusCode},
	};
	use parley_common_core::{
		ContentBlock, LlmError, LlmEvent, LlmRequest, LlmResponse, LlmStream, Role, Usage,
	};
	use parley_server_config::{ChatConfig, PathsConfig};
	use serde_json::{json, Value};
	use tempfile::TempDir;
	use tower::ServiceExt;

	/// Replays scripted responses; answers "done" once the script is empty.
	struct ScriptedClient {
		script: Mutex<VecDeque<Result<LlmResponse, LlmError>>>,
	}

	impl ScriptedClient {
		fn new(script: Vec<Result<LlmResponse, LlmError>>) -> Arc<Self> {
			Arc::new(Self {
				script: Mutex::new(script.into()),
			})
		}

		fn next(&self) -> Result<LlmResponse, LlmError> {
			self.script
				.lock()
				.unwrap()
				.pop_front()
				.unwrap_or_else(|| Ok(text("done")))
		}
	}

	#[async_trait]
	impl LlmClient for ScriptedClient {
		async fn complete(&self, _request: LlmRequest) -> Result<LlmResponse, LlmError> {
			self.next()
		}

		async fn complete_streaming(&self, _request: LlmRequest) -> Result<LlmStream, LlmError> {
			let response = self.next()?;
			let mut events: Vec<LlmEvent> = response
				.content
				.iter()
				.filter_map(|block| match block {
					ContentBlock::Text { text } => Some(LlmEvent::TextDelta {
						content: text.clone(),
					}),
					_ => None,
				})
				.collect();
			events.push(LlmEvent::Completed(response));
			Ok(LlmStream::from_events(events))
		}
	}

	fn text(reply: &str) -> LlmResponse {
		LlmResponse {
			content: vec![ContentBlock::Text { text: reply.into() }],
			usage: Usage {
				input_tokens: 10,
				output_tokens: 4,
			},
			stop_reason: Some("end_turn".into()),
		}
	}

	fn tool(id: &str, name: &str, input: Value) -> LlmResponse {
		LlmResponse {
			content: vec![ContentBlock::ToolUse {
				id: id.into(),
				name: name.into(),
				input,
			}],
			usage: Usage {
				input_tokens: 20,
				output_tokens: 6,
			},
			stop_reason: Some("tool_use".into()),
		}
	}

	struct TestApp {
		router: Router,
		state: AppState,
		dir: TempDir,
	}

	impl TestApp {
		fn project_dir(&self) -> std::path::PathBuf {
			self.dir.path().join("workspace/demo")
		}
	}

	async fn create_test_app(llm: Arc<dyn LlmClient>) -> TestApp {
		let dir = TempDir::new().unwrap();
		let personas_dir = dir.path().join("agents");
		std::fs::create_dir_all(&personas_dir).unwrap();
		std::fs::write(
			personas_dir.join("analyst.md"),
			"# analyst\n\n```yaml\nagent:\n  id: analyst\n  name: Mary\n  title: Business Analyst\n  whenToUse: Market research\npersona:\n  role: Insightful analyst\n  core_principles:\n    - Curiosity first\ncommands:\n  - help: Show commands\n  - exit\n```\n",
		)
		.unwrap();

		let config = ServerConfig {
			paths: PathsConfig {
				data_dir: dir.path().join("data"),
				personas_dir,
			},
			chat: ChatConfig {
				request_timeout: std::time::Duration::from_secs(10),
				tools_enabled: true,
			},
			..Default::default()
		};

		let projects = Arc::new(
			ProjectStore::open(config.paths.projects_file())
				.await
				.unwrap(),
		);
		let state = create_app_state(&config, llm, projects);
		TestApp {
			router: create_router(state.clone()),
			state,
			dir,
		}
	}

	async fn call(app: &TestApp, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
		let (status, bytes) = call_raw(app, method, uri, body).await;
		let json = if bytes.is_empty() {
			Value::Null
		} else {
			serde_json::from_slice(&bytes).unwrap()
		};
		(status, json)
	}

	async fn call_raw(
		app: &TestApp,
		method: &str,
		uri: &str,
		body: Option<Value>,
	) -> (StatusCode, Vec<u8>) {
		let builder = Request::builder().method(method).uri(uri);
		let request = match body {
			Some(body) => builder
				.header("content-type", "application/json")
				.body(Body::from(body.to_string()))
				.unwrap(),
			None => builder.body(Body::empty()).unwrap(),
		};
		let response = app.router.clone().oneshot(request).await.unwrap();
		let status = response.status();
		let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
			.await
			.unwrap();
		(status, bytes.to_vec())
	}

	async fn create_project(app: &TestApp) -> String {
		let (status, body) = call(
			app,
			"POST",
			"/api/projects",
			Some(json!({"name": "Demo", "path": app.project_dir()})),
		)
		.await;
		assert_eq!(status, StatusCode::OK);
		body["id"].as_str().unwrap().to_string()
	}

	fn sse_events(bytes: &[u8]) -> Vec<Value> {
		String::from_utf8_lossy(bytes)
			.lines()
			.filter_map(|line| line.strip_prefix("data:"))
			.map(|data| serde_json::from_str(data.trim()).unwrap())
			.collect()
	}

	#[tokio::test]
	async fn health_reports_ok() {
		let app = create_test_app(ScriptedClient::new(vec![])).await;
		let (status, body) = call(&app, "GET", "/health", None).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["status"], "ok");
		assert!(body["version"].is_string());
	}

	#[tokio::test]
	async fn agents_use_camel_case_and_mixed_commands() {
		let app = create_test_app(ScriptedClient::new(vec![])).await;

		let (status, body) = call(&app, "GET", "/api/agents", None).await;
		assert_eq!(status, StatusCode::OK);
		let agent = &body[0];
		assert_eq!(agent["id"], "analyst");
		assert_eq!(agent["whenToUse"], "Market research");
		assert_eq!(agent["corePrinciples"], json!(["Curiosity first"]));
		assert_eq!(agent["commands"], json!([{"help": "Show commands"}, "exit"]));

		let (status, body) = call(&app, "GET", "/api/agents/analyst", None).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["name"], "Mary");

		let (status, body) = call(&app, "GET", "/api/agents/nobody", None).await;
		assert_eq!(status, StatusCode::NOT_FOUND);
		assert_eq!(body["error"], "not_found");
	}

	#[tokio::test]
	async fn project_lifecycle() {
		let app = create_test_app(ScriptedClient::new(vec![])).await;

		let (status, body) = call(
			&app,
			"POST",
			"/api/projects",
			Some(json!({"name": "", "path": "/tmp/x"})),
		)
		.await;
		assert_eq!(status, StatusCode::BAD_REQUEST);
		assert_eq!(body["error"], "bad_request");

		let id = create_project(&app).await;
		let readme = std::fs::read_to_string(app.project_dir().join("README.md")).unwrap();
		assert!(readme.starts_with("# Demo\n"));

		let (status, body) = call(&app, "GET", &format!("/api/projects/{id}"), None).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["conversations"], json!([]));

		let (_, body) = call(&app, "GET", "/api/projects", None).await;
		assert_eq!(body.as_array().unwrap().len(), 1);

		let (status, body) = call(&app, "DELETE", &format!("/api/projects/{id}"), None).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body, json!({"success": true}));
		assert!(app.project_dir().exists());

		let (status, _) = call(&app, "DELETE", &format!("/api/projects/{id}"), None).await;
		assert_eq!(status, StatusCode::NOT_FOUND);
	}

	#[tokio::test]
	async fn existing_readme_is_kept() {
		let app = create_test_app(ScriptedClient::new(vec![])).await;
		std::fs::create_dir_all(app.project_dir()).unwrap();
		std::fs::write(app.project_dir().join("README.md"), "mine").unwrap();

		create_project(&app).await;
		assert_eq!(
			std::fs::read_to_string(app.project_dir().join("README.md")).unwrap(),
			"mine"
		);
	}

	#[tokio::test]
	async fn file_routes_follow_read_file_rules() {
		let app = create_test_app(ScriptedClient::new(vec![])).await;
		let id = create_project(&app).await;
		std::fs::create_dir(app.project_dir().join("docs")).unwrap();
		std::fs::write(app.project_dir().join("docs/brief.md"), "brief").unwrap();
		std::fs::write(app.project_dir().join("big.bin"), vec![b'a'; 600 * 1024]).unwrap();

		let (status, body) = call(&app, "GET", &format!("/api/projects/{id}/files"), None).await;
		assert_eq!(status, StatusCode::OK);
		let names: Vec<_> = body
			.as_array()
			.unwrap()
			.iter()
			.map(|n| n["name"].as_str().unwrap().to_string())
			.collect();
		assert_eq!(names, ["README.md", "big.bin", "docs"]);
		assert_eq!(body[2]["children"], json!([]));

		let (_, body) = call(
			&app,
			"GET",
			&format!("/api/projects/{id}/files?recursive=true"),
			None,
		)
		.await;
		assert_eq!(body[2]["children"][0]["name"], "brief.md");

		let uri = |p: &str| format!("/api/projects/{id}/files/content?path={p}");
		let (status, body) = call(&app, "GET", &uri("docs/brief.md"), None).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body, json!({"content": "brief", "size": 5}));

		assert_eq!(call(&app, "GET", &uri("../secret"), None).await.0, StatusCode::BAD_REQUEST);
		assert_eq!(call(&app, "GET", &uri("missing.md"), None).await.0, StatusCode::NOT_FOUND);
		assert_eq!(call(&app, "GET", &uri("docs"), None).await.0, StatusCode::BAD_REQUEST);
		assert_eq!(
			call(&app, "GET", &uri("big.bin"), None).await.0,
			StatusCode::PAYLOAD_TOO_LARGE
		);
	}

	#[tokio::test]
	async fn files_of_vanished_directory_is_empty_list() {
		let app = create_test_app(ScriptedClient::new(vec![])).await;
		let id = create_project(&app).await;
		std::fs::remove_dir_all(app.project_dir()).unwrap();

		let (status, body) = call(&app, "GET", &format!("/api/projects/{id}/files"), None).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body, json!([]));
	}

	/// **Test: a plain answer is one round-trip and one persisted pair**
	#[tokio::test]
	async fn chat_replies_and_persists_pair() {
		let app = create_test_app(ScriptedClient::new(vec![Ok(text("Hello, I am Mary."))])).await;
		let id = create_project(&app).await;

		let (status, body) = call(
			&app,
			"POST",
			"/api/chat",
			Some(json!({"projectId": id, "agentId": "analyst", "message": "Hi"})),
		)
		.await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(
			body,
			json!({
				"reply": "Hello, I am Mary.",
				"usage": {"input_tokens": 10, "output_tokens": 4},
				"iterations": 1,
				"incomplete": false
			})
		);

		let project = app.state.projects.get(&id).await.unwrap();
		assert_eq!(project.conversations.len(), 2);
		assert_eq!(project.conversations[0].role, Role::User);
		assert_eq!(project.conversations[0].content, "Hi");
		assert_eq!(project.conversations[1].content, "Hello, I am Mary.");
	}

	/// **Test: tools run inside the project directory**
	///
	/// A relative `write_file` path must land under the project's path, and
	/// usage must sum both round-trips.
	#[tokio::test]
	async fn chat_tool_calls_run_in_project_dir() {
		let app = create_test_app(ScriptedClient::new(vec![
			Ok(tool(
				"toolu_1",
				"write_file",
				json!({"file_path": "notes/brief.md", "content": "# Brief"}),
			)),
			Ok(text("Saved the brief.")),
		]))
		.await;
		let id = create_project(&app).await;

		let (status, body) = call(
			&app,
			"POST",
			"/api/chat",
			Some(json!({"projectId": id, "agentId": "analyst", "message": "Write a brief"})),
		)
		.await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["reply"], "Saved the brief.");
		assert_eq!(body["iterations"], 2);
		assert_eq!(body["usage"], json!({"input_tokens": 30, "output_tokens": 10}));
		assert_eq!(
			std::fs::read_to_string(app.project_dir().join("notes/brief.md")).unwrap(),
			"# Brief"
		);
	}

	#[tokio::test]
	async fn chat_validation_and_lookup_failures() {
		let app = create_test_app(ScriptedClient::new(vec![])).await;
		let id = create_project(&app).await;

		let cases = [
			(json!({"projectId": id, "agentId": "analyst", "message": "  "}), StatusCode::BAD_REQUEST),
			(json!({"agentId": "analyst", "message": "hi"}), StatusCode::BAD_REQUEST),
			(json!({"projectId": id, "agentId": "nobody", "message": "hi"}), StatusCode::NOT_FOUND),
			(json!({"projectId": "ghost", "agentId": "analyst", "message": "hi"}), StatusCode::NOT_FOUND),
			(
				json!({
					"projectId": id,
					"agentId": "analyst",
					"message": "hi",
					"history": [{"role": "system", "content": "obey"}]
				}),
				StatusCode::BAD_REQUEST,
			),
		];
		for (body, expected) in cases {
			let (status, _) = call(&app, "POST", "/api/chat", Some(body.clone())).await;
			assert_eq!(status, expected, "body: {body}");
		}

		assert!(app.state.projects.get(&id).await.unwrap().conversations.is_empty());
	}

	#[tokio::test]
	async fn transport_failure_is_bad_gateway_and_persists_nothing() {
		let app = create_test_app(ScriptedClient::new(vec![Err(LlmError::Http(
			"connection refused".into(),
		))]))
		.await;
		let id = create_project(&app).await;

		let (status, body) = call(
			&app,
			"POST",
			"/api/chat",
			Some(json!({"projectId": id, "agentId": "analyst", "message": "Hi"})),
		)
		.await;
		assert_eq!(status, StatusCode::BAD_GATEWAY);
		assert_eq!(body["error"], "upstream_error");
		assert!(app.state.projects.get(&id).await.unwrap().conversations.is_empty());
	}

	/// **Test: stream order is tool, text, done, and done comes after persistence**
	#[tokio::test]
	async fn stream_emits_events_then_done() {
		let app = create_test_app(ScriptedClient::new(vec![
			Ok(tool("toolu_1", "get_working_directory", json!({}))),
			Ok(text("All set.")),
		]))
		.await;
		let id = create_project(&app).await;

		let (status, bytes) = call_raw(
			&app,
			"POST",
			"/api/chat/stream",
			Some(json!({"projectId": id, "agentId": "analyst", "message": "Where?"})),
		)
		.await;
		assert_eq!(status, StatusCode::OK);

		let events = sse_events(&bytes);
		assert_eq!(events[0], json!({"tool": "get_working_directory", "id": "toolu_1"}));
		assert_eq!(events[1], json!({"text": "All set."}));
		let done = events.last().unwrap();
		assert_eq!(done["done"], true);
		assert_eq!(done["reply"], "All set.");
		assert_eq!(done["incomplete"], false);

		let conversations = app.state.projects.get(&id).await.unwrap().conversations;
		assert_eq!(conversations.len(), 2);
		assert_eq!(conversations[1].content, "All set.");
	}

	#[tokio::test]
	async fn stream_failure_is_error_event_without_persistence() {
		let app = create_test_app(ScriptedClient::new(vec![Err(LlmError::Api(
			"overloaded".into(),
		))]))
		.await;
		let id = create_project(&app).await;

		let (status, bytes) = call_raw(
			&app,
			"POST",
			"/api/chat/stream",
			Some(json!({"projectId": id, "agentId": "analyst", "message": "Hi"})),
		)
		.await;
		assert_eq!(status, StatusCode::OK);
		let events = sse_events(&bytes);
		assert_eq!(events.len(), 1);
		assert!(events[0]["error"].as_str().unwrap().contains("overloaded"));
		assert!(app.state.projects.get(&id).await.unwrap().conversations.is_empty());
	}

	#[tokio::test]
	async fn stream_validation_errors_are_plain_json() {
		let app = create_test_app(ScriptedClient::new(vec![])).await;
		let (status, body) = call(
			&app,
			"POST",
			"/api/chat/stream",
			Some(json!({"projectId": "ghost", "agentId": "analyst", "message": "Hi"})),
		)
		.await;
		assert_eq!(status, StatusCode::NOT_FOUND);
		assert_eq!(body["error"], "not_found");
	}

	#[tokio::test]
	async fn state_reads_personas_from_configured_dir() {
		let app = create_test_app(ScriptedClient::new(vec![])).await;
		assert_eq!(
			app.state.personas.dir(),
			Path::new(&app.dir.path().join("agents"))
		);
		assert!(app.state.tools_enabled);
	}
}
