mod test_patch_basic;

/// Route `log` output through the test harness. Call at the top of a test
/// when debugging it with `RUST_LOG=debug`.
#[allow(dead_code)]
pub(crate) fn init_test_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
