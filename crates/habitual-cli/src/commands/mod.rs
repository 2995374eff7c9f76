pub mod breathe;
pub mod config;
pub mod tap;

/// Single-threaded runtime for commands that talk to the server.
pub fn runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
}
