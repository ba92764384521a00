fn main() -> std::process::ExitCode {
    biblio_lib::run()
}
