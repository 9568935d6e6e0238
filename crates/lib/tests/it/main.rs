/*! Integration tests for Palimpsest.
 *
 * This test suite is organized as a single integration test binary
 * following the pattern described by matklad in
 * https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html
 *
 * The module structure mirrors the main library structure:
 * - codec: Tests for blocks, encoded value views and the encoder
 * - overlay: Tests for slots, overlay maps and sequences, roots and delegates
 */

use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("palimpsest=info".parse().unwrap()),
        )
        .with_test_writer()
        .try_init();
}

mod codec;
mod helpers;
mod overlay;
