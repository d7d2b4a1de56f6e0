fn main() {
    if let Err(err) = menu_refine::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
