//! WebView shell using `wry` + `tao`.
//!
//! Architecture:
//! - The single page is served over the `lm://` custom protocol, rendered by
//!   `ui::view` from the current app state.
//! - IPC from JS → Rust via `window.ipc.postMessage()`; each command runs on
//!   the tokio runtime, then the page fragment is re-rendered.
//! - A pump task applies app-loop events (auth transitions, snapshots, live
//!   changes) as they arrive and repaints through the event-loop proxy.

use std::sync::{Arc, Mutex};

use tao::event::{Event, WindowEvent};
use tao::event_loop::{ControlFlow, EventLoop, EventLoopBuilder};
use tao::window::WindowBuilder;
use tracing::warn;
use wry::WebViewBuilder;

use crate::app::App;
use crate::backend::http::HttpBackend;
use crate::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use crate::ui::view;

#[derive(Debug)]
enum UserEvent {
    /// Re-render the page fragment from current app state.
    Render,
}

/// Dispatch one IPC message. Returns true when the page should repaint.
fn handle_ipc(app: &Mutex<App>, runtime: &tokio::runtime::Handle, message: &str) -> bool {
    let Ok(msg) = serde_json::from_str::<serde_json::Value>(message) else {
        return false;
    };
    let Some(cmd) = msg.get("cmd").and_then(|v| v.as_str()) else {
        return false;
    };
    let mut app = app.lock().unwrap();

    match cmd {
        "ui_ready" => true,

        "sign_in" => {
            runtime.block_on(app.sign_in());
            true
        }

        "sign_out" => {
            runtime.block_on(app.sign_out());
            true
        }

        "set_url" => {
            if let Some(value) = msg.get("value").and_then(|v| v.as_str()) {
                app.set_form_url(value);
            }
            // Keystrokes update state only; no repaint, or the input would
            // lose focus mid-typing.
            false
        }

        "set_title" => {
            if let Some(value) = msg.get("value").and_then(|v| v.as_str()) {
                app.set_form_title(value);
            }
            false
        }

        "create" => {
            runtime.block_on(app.create_bookmark());
            true
        }

        "delete" => {
            if let Some(id) = msg.get("id").and_then(|v| v.as_str()) {
                let id = id.to_string();
                runtime.block_on(app.delete_bookmark(&id));
            }
            true
        }

        _ => false,
    }
}

// ─── Main entry point ───

pub fn run() {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to start tokio runtime");

    let mut settings_engine = SettingsEngine::new(None);
    let settings = match settings_engine.load() {
        Ok(settings) => settings,
        Err(e) => {
            warn!(error = %e, "falling back to default settings");
            Default::default()
        }
    };

    let backend = Arc::new(HttpBackend::new(&settings.backend));
    let mut app = App::new(backend);
    let events = runtime.block_on(async {
        app.initialize().await;
        app.take_events()
    });
    let state = Arc::new(Mutex::new(app));

    let event_loop: EventLoop<UserEvent> = EventLoopBuilder::with_user_event().build();
    let proxy = event_loop.create_proxy();

    // Pump: apply app-loop events as they arrive, then repaint.
    if let Some(mut events) = events {
        let pump_state = state.clone();
        let pump_proxy = proxy.clone();
        runtime.spawn(async move {
            while let Some(event) = events.recv().await {
                pump_state.lock().unwrap().handle_event(event);
                let _ = pump_proxy.send_event(UserEvent::Render);
            }
        });
    }

    let window = WindowBuilder::new()
        .with_title("Livemark")
        .with_inner_size(tao::dpi::LogicalSize::new(720.0, 800.0))
        .build(&event_loop)
        .expect("Failed to create window");

    let page_state = state.clone();
    let ipc_state = state.clone();
    let ipc_proxy = proxy.clone();
    let ipc_runtime = runtime.handle().clone();

    let builder = WebViewBuilder::new()
        .with_custom_protocol("lm".into(), move |_wv_id, _request| {
            let html = {
                let app = page_state.lock().unwrap();
                view::render_page(&app.view())
            };
            wry::http::Response::builder()
                .header("Content-Type", "text/html; charset=utf-8")
                .body(html.into_bytes().into())
                .unwrap()
        })
        .with_url("lm://localhost/")
        .with_ipc_handler(move |msg: wry::http::Request<String>| {
            if handle_ipc(&ipc_state, &ipc_runtime, msg.body().as_str()) {
                let _ = ipc_proxy.send_event(UserEvent::Render);
            }
        })
        .with_devtools(cfg!(debug_assertions));

    #[cfg(target_os = "linux")]
    let webview = {
        use tao::platform::unix::WindowExtUnix;
        use wry::WebViewBuilderExtUnix;
        let vbox = window.default_vbox().expect("Failed to get GTK vbox");
        builder.build_gtk(vbox).expect("Failed to create WebView")
    };

    #[cfg(not(target_os = "linux"))]
    let webview = builder.build(&window).expect("Failed to create WebView");

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Wait;

        match event {
            Event::WindowEvent {
                event: WindowEvent::CloseRequested,
                ..
            } => {
                state.lock().unwrap().shutdown();
                *control_flow = ControlFlow::Exit;
            }

            Event::UserEvent(UserEvent::Render) => {
                let html = {
                    let app = state.lock().unwrap();
                    view::render_main(&app.view())
                };
                let payload = serde_json::to_string(&html).unwrap_or_default();
                let js = format!("if(typeof lmApply==='function')lmApply({})", payload);
                let _ = webview.evaluate_script(&js);
            }

            _ => {}
        }
    });
}
