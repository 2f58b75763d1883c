mod cli;
mod objects_cmd;
mod page_range;
mod shared;
mod words_cmd;

use clap::Parser;
use cli::Cli;

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        cli::Commands::Words {
            ref file,
            ref pages,
            format,
            warnings,
            unicode_norm,
        } => words_cmd::run(
            file,
            pages.as_deref(),
            format,
            warnings,
            unicode_norm.to_unicode_norm(),
        ),
        cli::Commands::Objects { ref file, values } => objects_cmd::run(file, values),
    };

    if let Err(code) = result {
        std::process::exit(code);
    }
}
