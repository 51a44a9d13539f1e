//! Live-reload channel between the watch loop and connected browsers.
//!
//! The watch loop publishes [`ReloadMessage`]s on a broadcast channel; every
//! open `/__livereload` WebSocket forwards them as JSON:
//!
//! ```json
//! {"type":"reload"}
//! {"type":"css","path":"/style.css"}
//! {"type":"notify","message":"failed to compile …","timeout_ms":3000}
//! ```
//!
//! Served HTML pages get a `<script>` tag for the client before `</body>`.

use maud::{Markup, html};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// WebSocket endpoint.
pub const SOCKET_PATH: &str = "/__livereload";
/// Client script endpoint.
pub const SCRIPT_PATH: &str = "/__livereload.js";

/// Messages buffered per slow client before it starts skipping.
const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ReloadMessage {
    /// Reload the whole page.
    Reload,
    /// Re-fetch the stylesheet at `path` without reloading.
    Css { path: String },
    /// Show `message` on the page for `timeout_ms`.
    Notify { message: String, timeout_ms: u64 },
}

/// Sending half of the channel. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Reloader {
    tx: broadcast::Sender<ReloadMessage>,
}

impl Default for Reloader {
    fn default() -> Self {
        Self::new()
    }
}

impl Reloader {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReloadMessage> {
        self.tx.subscribe()
    }

    /// Publish to every connected browser. Returns how many received it.
    pub fn send(&self, message: ReloadMessage) -> usize {
        self.tx.send(message).unwrap_or(0)
    }
}

/// Browser side: reconnects after the server restarts.
pub const CLIENT_JS: &str = r#"(function () {
  var retry;
  function notice(text, timeout) {
    var el = document.createElement("div");
    el.textContent = text;
    el.style.cssText = "position:fixed;left:0;right:0;top:0;z-index:2147483647;" +
      "padding:8px 12px;background:#b00020;color:#fff;font:13px/1.4 monospace;white-space:pre-wrap";
    document.body.appendChild(el);
    setTimeout(function () { el.remove(); }, timeout);
  }
  function swapCss(path) {
    var links = document.querySelectorAll('link[rel="stylesheet"]');
    for (var i = 0; i < links.length; i++) {
      var url = new URL(links[i].href, location.href);
      if (url.pathname === path) {
        url.searchParams.set("livereload", Date.now());
        links[i].href = url.toString();
      }
    }
  }
  function connect() {
    var proto = location.protocol === "https:" ? "wss:" : "ws:";
    var ws = new WebSocket(proto + "//" + location.host + "/__livereload");
    ws.onmessage = function (event) {
      var msg = JSON.parse(event.data);
      if (msg.type === "reload") location.reload();
      else if (msg.type === "css") swapCss(msg.path);
      else if (msg.type === "notify") notice(msg.message, msg.timeout_ms);
    };
    ws.onclose = function () {
      clearTimeout(retry);
      retry = setTimeout(connect, 1000);
    };
  }
  connect();
})();
"#;

/// The tag that loads [`CLIENT_JS`].
pub fn snippet() -> Markup {
    html! {
        script src=(SCRIPT_PATH) defer {}
    }
}

/// Insert [`snippet`] before the last `</body>`, or append it when the page
/// has no body end tag.
pub fn inject(page: &str) -> String {
    let tag = snippet().into_string();
    let lower = page.to_ascii_lowercase();
    match lower.rfind("</body>") {
        Some(at) => {
            let mut out = String::with_capacity(page.len() + tag.len());
            out.push_str(&page[..at]);
            out.push_str(&tag);
            out.push_str(&page[at..]);
            out
        }
        None => format!("{page}{tag}"),
    }
}
