//! Global constants used throughout the pagesmith codebase.
//!
//! Timeouts, cache lifetimes, channel capacities and other magic values that
//! are shared between modules live here so they stay discoverable.

use std::time::Duration;

/// Cache lifetime applied to a page whose `cache_ttl` cannot be parsed (one hour).
pub const DEFAULT_PAGE_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Separator placed between the layout and template names in a topic key.
///
/// A page rendered with layout `main` and template `post` subscribes to the
/// topic `main-:-post`.
pub const TOPIC_SEPARATOR: &str = "-:-";

/// Capacity of the broker's shared registration channel.
///
/// Subscribers suspend on the send once this many commands are queued.
pub const BROKER_CHANNEL_CAPACITY: usize = 64;

/// Maximum nesting depth of partials inside partials.
///
/// Guards against self-referencing partials which would otherwise recurse
/// forever at compile time.
pub const MAX_PARTIAL_DEPTH: usize = 16;

/// Name of the built-in debug partial available to every template.
pub const DEBUG_PARTIAL_NAME: &str = "pagesmith/debug";

/// Source of the built-in debug partial.
///
/// Dumps the current context as JSON inside a `<pre>` block.
pub const DEBUG_PARTIAL_SOURCE: &str =
    "<pre class=\"pagesmith-debug\">{{json this}}</pre>";

/// File extensions tried, in order, when resolving a partial from disk.
pub const PARTIAL_EXTENSIONS: &[&str] = &["", ".hbs", ".handlebars"];

/// How long a successful backend response stays cached when the backend
/// does not say otherwise (60 seconds).
pub const DEFAULT_CLIENT_CACHE_TTL: Duration = Duration::from_secs(60);

/// Maximum number of backend responses held in the client cache.
pub const CLIENT_CACHE_CAPACITY: u64 = 10_000;

/// Total timeout for a single backend request (10 seconds).
pub const DEFAULT_CLIENT_TIMEOUT: Duration = Duration::from_secs(10);

/// Number of retries after a transport failure when talking to a backend.
pub const DEFAULT_CLIENT_MAX_RETRIES: usize = 2;

/// Starting delay for exponential backoff between backend retries (10ms).
pub const STARTING_BACKOFF_DELAY_MS: u64 = 10;

/// Maximum backoff delay between backend retries (500ms).
pub const MAX_BACKOFF_DELAY_MS: u64 = 500;

/// Default address the HTTP server binds to.
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "pagesmith.toml";

/// Body served for unknown routes when no `not_found` page is configured.
pub const DEFAULT_NOT_FOUND_BODY: &str = "<!DOCTYPE html>\n<html><head><title>404 Not Found</title></head>\n<body><h1>404 Not Found</h1></body></html>\n";

/// Body served when a handler fails and no `server_error` page is configured.
pub const DEFAULT_SERVER_ERROR_BODY: &str = "<!DOCTYPE html>\n<html><head><title>500 Internal Server Error</title></head>\n<body><h1>500 Internal Server Error</h1></body></html>\n";
