#![forbid(unsafe_code)]

//! Browser binding for the keypress forwarder.
//!
//! JS usage:
//!
//! ```js
//! import init, { install } from "./keypress_web.js";
//! await init();
//! const forwarder = install('{"style":"plain","reload":"after_settle"}', "warn");
//! // later: forwarder.detach();
//! ```
//!
//! Every `keydown` on the document issues one `GET <prefix>/<token>` through
//! `fetch` and reloads the page once. Failures are logged to the console and
//! never stop the reload. Build with `--features autostart` to install the
//! default listener as soon as the module loads.

pub mod console;
pub mod options;

#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::{FetchTransport, KeypressForwarder, LocationReloader, install};

pub use options::{DEFAULT_LOG_LEVEL, InstallOptions};
