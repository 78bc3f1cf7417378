//! A small notes API showing the full contract-first flow: declared
//! inputs, a status union, a declared failure, and the generated
//! OpenAPI document.
//!
//! Run with `cargo run --example notes`, then:
//!
//! ```text
//! curl http://127.0.0.1:8080/notes
//! curl -X POST http://127.0.0.1:8080/notes -d '{"title": "milk"}'
//! curl http://127.0.0.1:8080/notes/missing
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use gatehouse::prelude::*;
use http::{Method, StatusCode};
use serde_json::json;

type Store = Arc<Mutex<HashMap<String, String>>>;

fn contract() -> Contract {
    let note = || {
        value::object(vec![
            ("id", value::string().required()),
            ("title", value::string().required()),
        ])
    };

    Contract::builder("notes")
        .version("1.0.0")
        .route(
            "/notes",
            Method::GET,
            RouteDefinition::builder(ResponseSchema::new(value::array(note())))
                .description("Lists all notes")
                .build(),
        )
        .route(
            "/notes",
            Method::POST,
            RouteDefinition::builder(ResponseDescriptor::union(vec![
                ResponseSchema::new(note()).with_status(StatusCode::CREATED),
                ResponseSchema::new(note()),
            ]))
            .description("Creates a note, or returns the existing one with the same title")
            .body(value::object(vec![("title", value::string().required())]))
            .build(),
        )
        .route(
            "/notes/{noteId}",
            Method::GET,
            RouteDefinition::builder(ResponseSchema::new(note()))
                .description("Fetches one note")
                .path_param("noteId", value::string())
                .failure(
                    ResponseSchema::new(value::tagged(
                        "NoteNotFound",
                        vec![("id", value::string().required())],
                    ))
                    .with_status(StatusCode::NOT_FOUND),
                )
                .build(),
        )
        .build()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,gatehouse=debug".into()),
        )
        .init();

    let contract = contract();

    let document = OpenApiGenerator::new()
        .description("A tiny notes service")
        .server("http://127.0.0.1:8080", None)
        .generate(&contract);
    println!("{}", serde_json::to_string_pretty(&document)?);

    let store: Store = Arc::new(Mutex::new(HashMap::new()));

    let list_store = Arc::clone(&store);
    let create_store = Arc::clone(&store);
    let fetch_store = Arc::clone(&store);

    let service = Arc::new(
        ContractService::builder(contract)
            .value_handler("/notes", Method::GET, move |_ctx| {
                let store = Arc::clone(&list_store);
                async move {
                    let notes: Vec<_> = store
                        .lock()
                        .expect("store lock")
                        .iter()
                        .map(|(id, title)| json!({"id": id, "title": title}))
                        .collect();
                    Ok(json!(notes))
                }
            })
            .handler("/notes", Method::POST, move |ctx: RequestContext| {
                let store = Arc::clone(&create_store);
                async move {
                    let title = ctx.body().expect("validated body")["title"]
                        .as_str()
                        .expect("title is a string")
                        .to_string();
                    let mut notes = store.lock().expect("store lock");
                    if let Some((id, _)) = notes.iter().find(|(_, t)| **t == title) {
                        return Ok(ctx
                            .respond(json!({"id": id, "title": title}))
                            .with_status(StatusCode::OK));
                    }
                    let id = format!("n{}", notes.len() + 1);
                    notes.insert(id.clone(), title.clone());
                    Ok(ctx
                        .respond(json!({"id": id, "title": title}))
                        .with_status(StatusCode::CREATED))
                }
            })
            .handler("/notes/{noteId}", Method::GET, move |ctx: RequestContext| {
                let store = Arc::clone(&fetch_store);
                async move {
                    let id = ctx.path_param("noteId").expect("declared param").as_str()
                        .expect("string param")
                        .to_string();
                    match store.lock().expect("store lock").get(&id) {
                        Some(title) => Ok(ctx.respond(json!({"id": id, "title": title}))),
                        None => Err(HandlerFailure::declared("NoteNotFound", json!({"id": id}))),
                    }
                }
            })
            .build()?,
    );

    serve(service, ServerConfig::default()).await?;
    Ok(())
}
