use chromesync::cli;

fn main() {
    let code = cli::process_cli();
    log::logger().flush();
    std::process::exit(code);
}
