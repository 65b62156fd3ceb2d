use alfiere::uci::run_uci_loop;

fn main() {
    // diagnostics go to stderr via RUST_LOG; stdout is protocol-only
    env_logger::init();
    alfiere::init();
    run_uci_loop();
}
