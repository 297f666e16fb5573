use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "saham")]
#[command(about = "IDX stock dashboard backend: ownership breakdowns and cached related news")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch related news for a stock code, serving from cache when fresh
    News {
        /// IDX stock code, e.g. BBCA
        code: String,

        /// Ignore cache freshness and re-fetch
        #[arg(long)]
        refresh: bool,

        /// Cache freshness window in hours
        #[arg(long, value_name = "HOURS")]
        max_age: Option<i64>,

        /// Extra search keyword (repeatable)
        #[arg(short = 'k', long = "keyword")]
        keywords: Vec<String>,

        /// Restrict fetching to catalog sources by label (repeatable)
        #[arg(short = 's', long = "source")]
        sources: Vec<String>,

        /// Maximum number of articles to display
        #[arg(short, long)]
        limit: Option<usize>,

        /// Also download full article bodies for entries without one
        #[arg(long)]
        content: bool,

        /// Emit articles as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show cached articles for a stock code without fetching
    Cached {
        /// IDX stock code, e.g. BBCA
        code: String,

        /// Maximum number of articles to display
        #[arg(short, long, default_value_t = 30)]
        limit: usize,

        /// Emit articles as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the built-in news source catalog
    Sources {
        /// Export the catalog as OPML instead of a plain list
        #[arg(long)]
        opml: bool,

        /// Output file path (prints to stdout if not specified)
        #[arg(short, long, requires = "opml")]
        output: Option<String>,
    },

    /// Summarize KSEI local vs foreign ownership for a stock code
    Ownership {
        /// IDX stock code, e.g. BBCA
        code: String,

        /// Directory of KSEI balance-position .txt files
        #[arg(long, value_name = "DIR")]
        data_dir: Option<String>,

        /// Emit the summary as JSON
        #[arg(long)]
        json: bool,
    },
}
