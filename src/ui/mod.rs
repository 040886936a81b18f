//! Livemark UI layer.
//!
//! `view` renders the single page as a pure function of app state and is
//! always available; `webview_app` is the windowed shell behind the `gui`
//! feature, using `wry` for cross-platform WebView rendering with IPC
//! between the JS page and the Rust core.

pub mod view;

#[cfg(feature = "gui")]
pub mod webview_app;
