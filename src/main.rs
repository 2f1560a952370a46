mod cli;

#[tokio::main]
async fn main() {
    match cli::run() {
        cli::RunOutcome::Exit(code) => std::process::exit(code),
        cli::RunOutcome::Serve(config, addr) => {
            println!("listening on http://{addr}");
            tminus::serve(addr, config).await;
        }
    }
}
