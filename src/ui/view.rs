//! Single-page view rendering.
//!
//! The page is a pure function of [`AppView`]: identity state, the bookmark
//! collection, loading/error indicators, and the add-bookmark form. No
//! synchronization logic lives here — the view issues commands over IPC and
//! re-renders whenever the app state changes.

use crate::types::bookmark::Bookmark;
use crate::types::identity::Identity;

/// Everything the presentation layer renders, captured from the app state.
#[derive(Debug, Clone, PartialEq)]
pub struct AppView {
    pub identity: Option<Identity>,
    pub loading: bool,
    pub error: Option<String>,
    pub bookmarks: Vec<Bookmark>,
    pub form_url: String,
    pub form_title: String,
    pub submitting: bool,
}

/// Escapes user-supplied text for embedding in HTML.
pub fn html_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn render_header(view: &AppView, html: &mut String) {
    html.push_str("<header class=\"topbar\"><span class=\"brand\">Livemark</span>");
    match &view.identity {
        Some(identity) => {
            html.push_str("<span class=\"who\">");
            html.push_str(&html_escape(&identity.email));
            html.push_str("</span><button data-cmd=\"sign_out\">Sign out</button>");
        }
        None => {
            html.push_str("<button data-cmd=\"sign_in\">Sign in</button>");
        }
    }
    html.push_str("</header>");
}

fn render_form(view: &AppView, html: &mut String) {
    html.push_str("<div class=\"add-form\">");
    html.push_str(&format!(
        "<input id=\"url-input\" data-input=\"set_url\" placeholder=\"URL\" value=\"{}\" />",
        html_escape(&view.form_url)
    ));
    html.push_str(&format!(
        "<input id=\"title-input\" data-input=\"set_title\" placeholder=\"Title (optional)\" value=\"{}\" />",
        html_escape(&view.form_title)
    ));
    if view.submitting {
        html.push_str("<button data-cmd=\"create\" disabled>Adding…</button>");
    } else {
        html.push_str("<button data-cmd=\"create\">Add</button>");
    }
    html.push_str("</div>");
}

fn render_list(view: &AppView, html: &mut String) {
    if view.loading {
        html.push_str("<p class=\"status\">Loading bookmarks…</p>");
        return;
    }
    if view.bookmarks.is_empty() {
        html.push_str("<p class=\"status\">No bookmarks yet</p>");
        return;
    }
    html.push_str("<ul class=\"bookmarks\">");
    for record in &view.bookmarks {
        html.push_str("<li><a href=\"");
        html.push_str(&html_escape(&record.url));
        html.push_str("\" target=\"_blank\">");
        html.push_str(&html_escape(&record.title));
        html.push_str("</a><span class=\"url\">");
        html.push_str(&html_escape(&record.url));
        html.push_str("</span><button class=\"delete\" data-cmd=\"delete\" data-id=\"");
        html.push_str(&html_escape(&record.id));
        html.push_str("\">×</button></li>");
    }
    html.push_str("</ul>");
}

/// Renders the page body fragment for the current state. The shell swaps
/// this into `#app` on every state change.
pub fn render_main(view: &AppView) -> String {
    let mut html = String::with_capacity(2048);
    render_header(view, &mut html);
    if let Some(error) = &view.error {
        html.push_str("<div class=\"error\">");
        html.push_str(&html_escape(error));
        html.push_str("</div>");
    }
    match &view.identity {
        Some(_) => {
            render_form(view, &mut html);
            render_list(view, &mut html);
        }
        None => {
            html.push_str(
                "<p class=\"status\">Sign in to see your bookmarks on every device.</p>",
            );
        }
    }
    html
}

const PAGE_CSS: &str = "\
:root{--bg:#0d1117;--panel:#161b22;--fg:#e6edf3;--muted:#7d8590;--border:#30363d;\
--accent:#2ea44f;--danger:#f85149;--font:-apple-system,BlinkMacSystemFont,'Segoe UI',Helvetica,Arial,sans-serif}\
*{margin:0;padding:0;box-sizing:border-box}\
body{font-family:var(--font);background:var(--bg);color:var(--fg);min-height:100vh}\
#app{max-width:640px;margin:0 auto;padding:24px}\
.topbar{display:flex;align-items:center;gap:12px;padding-bottom:16px;border-bottom:1px solid var(--border)}\
.brand{font-size:20px;font-weight:600;flex:1}\
.who{color:var(--muted);font-size:13px}\
button{background:var(--panel);color:var(--fg);border:1px solid var(--border);border-radius:6px;padding:6px 12px;cursor:pointer}\
button:disabled{opacity:.5;cursor:default}\
.error{margin:16px 0;padding:10px 12px;border:1px solid var(--danger);border-radius:6px;color:var(--danger)}\
.add-form{display:flex;gap:8px;margin:16px 0}\
.add-form input{flex:1;background:var(--panel);color:var(--fg);border:1px solid var(--border);border-radius:6px;padding:6px 10px}\
.add-form button{background:var(--accent);border-color:var(--accent)}\
.status{margin:24px 0;color:var(--muted);text-align:center}\
.bookmarks{list-style:none}\
.bookmarks li{display:flex;align-items:baseline;gap:10px;padding:10px 4px;border-bottom:1px solid var(--border)}\
.bookmarks a{color:var(--fg);text-decoration:none;font-weight:500}\
.bookmarks .url{flex:1;color:var(--muted);font-size:12px;overflow:hidden;text-overflow:ellipsis;white-space:nowrap}\
.bookmarks .delete{border:none;background:none;color:var(--muted);font-size:16px}\
.bookmarks .delete:hover{color:var(--danger)}";

const PAGE_JS: &str = "\
function lmSend(cmd,extra){var msg=Object.assign({cmd:cmd},extra||{});\
if(window.ipc&&window.ipc.postMessage)window.ipc.postMessage(JSON.stringify(msg));}\
function lmApply(html){document.getElementById('app').innerHTML=html;}\
document.addEventListener('click',function(e){\
var el=e.target.closest('[data-cmd]');if(!el||el.disabled)return;\
var extra={};if(el.dataset.id)extra.id=el.dataset.id;lmSend(el.dataset.cmd,extra);});\
document.addEventListener('input',function(e){\
var el=e.target;if(el.dataset&&el.dataset.input)lmSend(el.dataset.input,{value:el.value});});\
lmSend('ui_ready',{});";

/// Renders the complete single-page document: the current `#app` fragment
/// plus the styles and the IPC bridge script. Command handlers are bound by
/// delegation so they survive fragment swaps.
pub fn render_page(view: &AppView) -> String {
    let main = render_main(view);
    let mut html = String::with_capacity(main.len() + PAGE_CSS.len() + PAGE_JS.len() + 256);
    html.push_str("<!DOCTYPE html><html><head><meta charset=\"UTF-8\"><title>Livemark</title><style>");
    html.push_str(PAGE_CSS);
    html.push_str("</style></head><body><div id=\"app\">");
    html.push_str(&main);
    html.push_str("</div><script>");
    html.push_str(PAGE_JS);
    html.push_str("</script></body></html>");
    html
}
