/*! Integration tests for jsondepot.
 *
 * This test suite is organized as a single integration test binary
 * following the pattern described by matklad in
 * https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html
 *
 * The module structure mirrors the main library structure:
 * - tree: Path resolution, copy-on-write mutation and id allocation
 * - backend: The BackendImpl trait and its implementations
 * - store: The envelope write path, credentials and concurrent writers
 * - value, path: The value model and path parsing as seen by callers
 */

use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("jsondepot=info".parse().unwrap()),
        )
        .with_test_writer()
        .try_init();
}

mod backend;
mod helpers;
mod path;
mod store;
mod tree;
mod value;
