use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    taskbook_import_lib::run().await
}
