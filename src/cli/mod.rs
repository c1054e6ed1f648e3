//! # CLI Module
//!
//! Command-line interface of the `pathmux` demo binary.
//!
//! ## Commands
//!
//! ### `serve`
//!
//! Register the demo routes on the default router and serve them:
//!
//! ```bash
//! pathmux serve --addr 0.0.0.0:8080
//! pathmux serve --config pathmux.yaml
//! ```
//!
//! Options:
//! - `--addr <ADDR>` - Listen address; overrides the config file and `PATHMUX_ADDR`
//! - `--config <FILE>` - YAML server configuration
//!
//! ### `routes`
//!
//! Print the demo routing table and exit.
//!
//! ## Demo routes
//!
//! | Method | Pattern | Reply |
//! |--------|---------|-------|
//! | GET | `/(.*)` | `hello <capture>` |
//!
//! Logging is configured from `PATHMUX_LOG_LEVEL` and `PATHMUX_LOG_FORMAT`.

mod commands;


pub use commands::{demo_routes, hello, run, run_cli, Cli, Commands};
