use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use pdfwords_core::UnicodeNorm;

/// Extract positioned words and inspect raw objects in PDF documents.
#[derive(Debug, Parser)]
#[command(name = "pdfwords", about, version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Extract words with bounding boxes and font attributes
    Words {
        /// Path to the PDF file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Page range (e.g. '1,3-5'). Default: all pages
        #[arg(long)]
        pages: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Print extraction warnings to stderr
        #[arg(long)]
        warnings: bool,

        /// Unicode normalization applied to word text
        #[arg(long, value_enum, default_value_t = UnicodeNormArg::Nfc)]
        unicode_norm: UnicodeNormArg,
    },

    /// List every object found in the file with its kind
    Objects {
        /// Path to the PDF file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Also print each object's value in PDF syntax
        #[arg(long)]
        values: bool,
    },
}

/// Output format for word listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Tab-separated lines, one word per line
    Text,
    /// A single JSON array
    Json,
}

/// Unicode normalization form accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum UnicodeNormArg {
    None,
    Nfc,
    Nfd,
    Nfkc,
    Nfkd,
}

impl UnicodeNormArg {
    pub fn to_unicode_norm(self) -> UnicodeNorm {
        match self {
            UnicodeNormArg::None => UnicodeNorm::None,
            UnicodeNormArg::Nfc => UnicodeNorm::Nfc,
            UnicodeNormArg::Nfd => UnicodeNorm::Nfd,
            UnicodeNormArg::Nfkc => UnicodeNorm::Nfkc,
            UnicodeNormArg::Nfkd => UnicodeNorm::Nfkd,
        }
    }
}
