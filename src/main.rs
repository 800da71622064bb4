use scenepick::ViewerConfig;

fn main() {
    env_logger::init();

    if let Err(e) = scenepick::run_with_config(ViewerConfig::new().title("scenepick")) {
        log::error!("{e}");
        std::process::exit(1);
    }
}
