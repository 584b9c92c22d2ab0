//! rebox: rebuild a disposable development sandbox on a Proxmox host

use clap::Parser;

use rebox_cli::cli::Cli;
use rebox_cli::commands::error_code;
use rebox_cli::output::{OutputContext, json};

fn main() {
    let cli = Cli::parse();
    let (json_mode, no_color) = (cli.json, cli.no_color);

    if let Err(e) = rebox_cli::logger::init(cli.verbose) {
        eprintln!("warning: {e:#}");
    }

    let result = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(anyhow::Error::from)
        .and_then(|rt| rt.block_on(cli.run()));

    if let Err(e) = result {
        if json_mode {
            match json::format_error(&format!("{e:#}"), error_code(&e)) {
                Ok(text) => println!("{text}"),
                Err(_) => eprintln!("Error: {e:#}"),
            }
        } else {
            let ctx = OutputContext::new(no_color, false);
            ctx.error(&e.to_string());
            for cause in e.chain().skip(1) {
                eprintln!("  {cause}");
            }
        }
        std::process::exit(1);
    }
}
