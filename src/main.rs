fn main() -> std::process::ExitCode {
    sheet_ledger_lib::run()
}
