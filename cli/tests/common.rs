#![allow(unused_crate_dependencies)]
//! Test utilities for CLI crate integration tests.
#![allow(missing_docs)]

use cli::{Client, EngineOptions};
use std::path::Path;

/// Open a client over the state file at `path`.
///
/// # Panics
///
/// Panics if the engine cannot be opened.
pub async fn client_at(path: &Path, json: bool) -> Client {
    let options = EngineOptions {
        state: Some(path.to_path_buf()),
        ..EngineOptions::default()
    };
    let engine = cli::open_engine(&options).await.expect("open engine");
    Client::new(engine, json)
}
