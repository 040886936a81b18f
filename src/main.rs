//! Livemark — a live-syncing personal bookmark manager client.
//!
//! Entry point: with the `gui` feature, opens the single-page webview shell
//! against the configured hosted backend. When built without `gui`, runs an
//! interactive console demo against the in-process backend.

fn init_tracing(default_filter: &str) {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter.to_string()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[cfg(feature = "gui")]
fn main() {
    init_tracing("livemark=info");
    livemark::ui::webview_app::run();
}

#[cfg(not(feature = "gui"))]
#[tokio::main(flavor = "current_thread")]
async fn main() {
    init_tracing("livemark=warn");

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║               Livemark v{} — Demo Mode                    ║", env!("CARGO_PKG_VERSION"));
    println!("║       Live-syncing bookmarks against a demo backend        ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    demo_settings();
    demo_reconcile();
    demo_session_and_snapshot().await;
    demo_live_updates().await;
    demo_mutations().await;
    demo_identity_switch().await;
    demo_sign_out().await;

    println!();
    println!("═══════════════════════════════════════════════════════════════");
    println!("  ✅ All components demonstrated successfully!");
    println!("═══════════════════════════════════════════════════════════════");
}

#[cfg(not(feature = "gui"))]
fn section(name: &str) {
    println!("───────────────────────────────────────────────────────────────");
    println!("  📦 {}", name);
    println!("───────────────────────────────────────────────────────────────");
}

#[cfg(not(feature = "gui"))]
fn demo_settings() {
    use livemark::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
    section("Settings Engine");

    let mut engine = SettingsEngine::new(Some("demo_settings.json".to_string()));
    let settings = engine.load().expect("defaults should load");
    println!("  Backend URL: {}", settings.backend.project_url);
    println!("  OAuth provider: {}", settings.backend.oauth_provider);
    println!("  Request timeout: {}s", settings.backend.request_timeout_secs);
    println!("  Log filter: {}", settings.general.log_filter);

    engine.save().expect("save should succeed");
    println!("  Saved to: {}", engine.get_config_path());
    let _ = std::fs::remove_file("demo_settings.json");
    println!("  ✓ SettingsEngine OK");
    println!();
}

#[cfg(not(feature = "gui"))]
fn demo_reconcile() {
    use livemark::managers::collection_manager::reconcile;
    use livemark::types::bookmark::Bookmark;
    use livemark::types::event::ChangeEvent;
    section("Reconciler (pure)");

    let record = |id: &str, title: &str| Bookmark {
        id: id.to_string(),
        owner_id: "u1".to_string(),
        url: format!("https://{}.example.com", id),
        title: title.to_string(),
        created_at: 0,
    };

    let collection = reconcile(Vec::new(), ChangeEvent::insert(record("r1", "First")));
    let collection = reconcile(collection, ChangeEvent::insert(record("r2", "Second")));
    println!("  Two inserts -> [{}, {}]", collection[0].title, collection[1].title);

    let dup = reconcile(collection.clone(), ChangeEvent::insert(record("r2", "Second")));
    println!("  Duplicate insert is a no-op: len = {}", dup.len());

    let updated = reconcile(dup, ChangeEvent::update(record("r1", "First, renamed")));
    println!("  Update in place: {}", updated[1].title);

    let removed = reconcile(updated, ChangeEvent::delete(record("r2", "Second")));
    println!("  Delete: {} record(s) remain", removed.len());
    println!("  ✓ Reconciler OK");
    println!();
}

#[cfg(not(feature = "gui"))]
async fn demo_session_and_snapshot() {
    use std::sync::Arc;
    use livemark::app::App;
    use livemark::backend::memory::MemoryBackend;
    section("Session + Snapshot");

    let backend = Arc::new(MemoryBackend::new());
    backend.register_user("u1", "ada@example.com");
    backend.seed_bookmark("u1", "https://docs.rs", "Docs.rs");
    backend.seed_bookmark("u1", "https://crates.io", "Crates.io");
    backend.sign_in_as("u1").expect("demo user exists");

    let mut app = App::new(backend);
    app.initialize().await;
    println!("  Restored session: {}", app.identity().map(|i| i.email.as_str()).unwrap_or("-"));
    println!("  Loading: {}", app.is_loading());

    app.process_next().await; // snapshot
    println!("  Snapshot applied: {} bookmark(s), newest first:", app.bookmarks().len());
    for b in app.bookmarks() {
        println!("    {} — {}", b.title, b.url);
    }
    app.shutdown();
    println!("  ✓ Session + Snapshot OK");
    println!();
}

#[cfg(not(feature = "gui"))]
async fn demo_live_updates() {
    use std::sync::Arc;
    use livemark::app::App;
    use livemark::backend::memory::MemoryBackend;
    section("Live Change Feed");

    let backend = Arc::new(MemoryBackend::new());
    backend.register_user("u1", "ada@example.com");
    backend.sign_in_as("u1").expect("demo user exists");

    let mut app = App::new(backend.clone());
    app.initialize().await;
    app.process_next().await; // empty snapshot
    println!("  Empty snapshot: {} bookmark(s)", app.bookmarks().len());

    let inserted = backend.remote_insert("u1", "https://blog.rust-lang.org", "Rust Blog");
    app.process_next().await;
    println!("  Insert from another session -> {} bookmark(s)", app.bookmarks().len());

    backend.remote_update(&inserted.id, "https://blog.rust-lang.org", "Rust Blog (updated)");
    app.process_next().await;
    println!("  Update event -> title: {}", app.bookmarks()[0].title);

    backend.remote_delete(&inserted.id);
    app.process_next().await;
    println!("  Delete event -> {} bookmark(s)", app.bookmarks().len());
    app.shutdown();
    println!("  ✓ Live feed OK");
    println!();
}

#[cfg(not(feature = "gui"))]
async fn demo_mutations() {
    use std::sync::Arc;
    use livemark::app::App;
    use livemark::backend::memory::MemoryBackend;
    section("Mutations");

    let backend = Arc::new(MemoryBackend::new());
    backend.register_user("u1", "ada@example.com");
    backend.sign_in_as("u1").expect("demo user exists");

    let mut app = App::new(backend);
    app.initialize().await;
    app.process_next().await; // snapshot

    app.set_form_url("  example.com  ");
    app.create_bookmark().await;
    app.process_next().await; // insert event
    println!("  Created with blank title -> title defaults to URL: {}", app.bookmarks()[0].title);
    println!("  Form cleared: url='{}' title='{}'", app.form().url, app.form().title);

    app.create_bookmark().await;
    println!("  Empty URL rejected locally: {:?}", app.error());

    let id = app.bookmarks()[0].id.clone();
    app.delete_bookmark(&id).await;
    app.process_next().await; // delete event
    println!("  Deleted -> {} bookmark(s)", app.bookmarks().len());
    app.shutdown();
    println!("  ✓ Mutations OK");
    println!();
}

#[cfg(not(feature = "gui"))]
async fn demo_identity_switch() {
    use std::sync::Arc;
    use livemark::app::App;
    use livemark::backend::memory::MemoryBackend;
    section("Identity Switch");

    let backend = Arc::new(MemoryBackend::new());
    backend.register_user("u1", "ada@example.com");
    backend.register_user("u2", "grace@example.com");
    backend.seed_bookmark("u1", "https://docs.rs", "Docs.rs");
    backend.sign_in_as("u1").expect("demo user exists");

    let mut app = App::new(backend.clone());
    app.initialize().await;
    app.process_next().await; // u1 snapshot
    println!("  u1 sees {} bookmark(s)", app.bookmarks().len());

    backend.sign_in_as("u2").expect("demo user exists");
    app.process_next().await; // auth switch: collection cleared, resync
    println!("  Switched to {} — collection starts empty: {}",
        app.identity().map(|i| i.email.as_str()).unwrap_or("-"), app.bookmarks().is_empty());

    app.process_next().await; // u2 snapshot
    println!("  u2 snapshot: {} bookmark(s)", app.bookmarks().len());
    app.shutdown();
    println!("  ✓ Identity switch OK");
    println!();
}

#[cfg(not(feature = "gui"))]
async fn demo_sign_out() {
    use std::sync::Arc;
    use livemark::app::App;
    use livemark::backend::memory::MemoryBackend;
    use livemark::ui::view;
    section("Sign-out + View");

    let backend = Arc::new(MemoryBackend::new());
    backend.register_user("u1", "ada@example.com");
    backend.seed_bookmark("u1", "https://docs.rs", "Docs.rs");
    backend.sign_in_as("u1").expect("demo user exists");

    let mut app = App::new(backend);
    app.initialize().await;
    app.process_next().await;
    println!("  Signed in with {} bookmark(s)", app.bookmarks().len());

    app.sign_out().await;
    app.process_next().await; // signed-out transition
    println!("  After sign-out: signed_in={} bookmarks={}",
        app.identity().is_some(), app.bookmarks().len());

    let html = view::render_main(&app.view());
    println!("  Rendered signed-out page: {} bytes", html.len());
    app.shutdown();
    println!("  ✓ Sign-out OK");
}
