use std::process;

fn main() {
    if let Err(e) = wavetide::app::run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
