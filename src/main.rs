// This binary crate is intentionally minimal.
// All imputation logic lives in the library (src/lib.rs and its modules).
// Run the streaming trainer with:
//   cargo run --bin studio --release
fn main() {
    println!("lacuna-nn: a from-scratch self-attention imputation model for time series.");
    println!("Run `cargo run --bin studio` to serve the live training studio.");
}
