use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use vitaboy_format::{bitmap, mesh, record};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a diagnostic summary of a character file (skeletons, suits,
    /// skills). Parses the text variant by default; pass `--binary` to
    /// parse the binary variant instead.
    Report {
        /// The character file to inspect.
        input: PathBuf,
        /// Parse as a binary character file instead of text.
        #[arg(long)]
        binary: bool,
    },
    /// Print a diagnostic summary of a mesh file.
    ReportMesh {
        /// The mesh file to inspect.
        input: PathBuf,
        /// Parse as a binary mesh file instead of text.
        #[arg(long)]
        binary: bool,
    },
    /// Decode a BMP skin texture and print its dimensions.
    InspectBitmap {
        /// The .bmp file to inspect.
        input: PathBuf,
    },
}

fn main() -> ExitCode {
    simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Warn)
        .init()
        .unwrap();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Commands::Report { input, binary } => {
            let file = if binary {
                let bytes = fs::read(&input).map_err(|e| e.to_string())?;
                record::parse_character_file_binary(&bytes).map_err(|e| e.to_string())?
            } else {
                let text = fs::read_to_string(&input).map_err(|e| e.to_string())?;
                record::parse_character_file_text(&text).map_err(|e| e.to_string())?
            };
            print!("{}", file.report());
            Ok(())
        }
        Commands::ReportMesh { input, binary } => {
            let description = if binary {
                let bytes = fs::read(&input).map_err(|e| e.to_string())?;
                mesh::parse_mesh_file_binary(&bytes).map_err(|e| e.to_string())?
            } else {
                let text = fs::read_to_string(&input).map_err(|e| e.to_string())?;
                mesh::parse_mesh_file_text(&text).map_err(|e| e.to_string())?
            };
            print!("{}", description.report());
            Ok(())
        }
        Commands::InspectBitmap { input } => {
            let bytes = fs::read(&input).map_err(|e| e.to_string())?;
            let bmp = bitmap::decode(&bytes).map_err(|e| e.to_string())?;
            println!("{}x{} RGBA bitmap ({} bytes)", bmp.width, bmp.height, bmp.pixels.len());
            Ok(())
        }
    }
}
