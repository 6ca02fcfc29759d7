/// lacuna-nn Studio
///
/// Serves a browser page that opens a live training stream: each connection
/// to `/train/events` loads the fixed dataset, hides a seeded fraction of
/// it, and trains the imputation model while pushing one progress event per
/// epoch over SSE, ending with a done or error event.
///
/// Run with:
///   cargo run --bin studio --release
/// Then open http://127.0.0.1:7878

mod page;
mod routes;
mod sse;
mod static_files;

use log::info;
use tiny_http::Server;

fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let addr = "127.0.0.1:7878";
    let server = Server::http(addr).expect("Failed to bind HTTP server");
    info!("lacuna-nn studio listening on http://{}", addr);
    info!("training streams at http://{}/train/events", addr);

    // Each request is dispatched on its own thread: a training stream
    // occupies its thread for the whole session, and sessions share no
    // state, so page loads and parallel sessions never wait on each other.
    for request in server.incoming_requests() {
        std::thread::spawn(move || {
            routes::dispatch(request);
        });
    }
}
