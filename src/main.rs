fn main() {
    if let Err(err) = vbrjobs::cli::run() {
        println!("{:#}", err);
        std::process::exit(2);
    }
}
