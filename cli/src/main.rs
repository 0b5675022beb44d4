//! Flotilla CLI - Manage slots and agents through a coordinator

fn main() {
    std::process::exit(flotilla_cli::cli::run());
}
