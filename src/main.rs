fn main() {
    if let Err(err) = dataset_preview::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
