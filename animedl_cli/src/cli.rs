use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "animedl", about = "Download every episode of an anime series")]
pub struct Args {
    /// Series page URL (any episode page of the series)
    #[arg(required_unless_present = "batch", conflicts_with = "batch")]
    pub url: Option<String>,

    /// First episode number to download (inclusive)
    #[arg(short, long)]
    pub start: Option<u32>,

    /// Last episode number to download (inclusive)
    #[arg(short, long)]
    pub end: Option<u32>,

    /// Read series URLs from a file, one per line
    #[arg(short, long, value_name = "FILE")]
    pub batch: Option<PathBuf>,

    /// Empty the batch file once every series has been processed
    #[arg(long, requires = "batch")]
    pub clear_batch: bool,

    /// Episodes downloaded at the same time [env: ANIMEDL_CONCURRENCY, default: 4]
    #[arg(short, long)]
    pub concurrency: Option<usize>,

    /// Root directory for series folders [env: ANIMEDL_DOWNLOAD_DIR, default: Downloads]
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// No progress bars
    #[arg(short, long)]
    pub quiet: bool,

    /// Debug logging (RUST_LOG still wins when set)
    #[arg(short, long)]
    pub verbose: bool,

    /// Write the final report as JSON to this path
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Exit with status 1 if any episode or series failed
    #[arg(long)]
    pub strict: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_series_with_range() {
        let args = Args::try_parse_from([
            "animedl",
            "https://www.animeworld.so/play/naruto.abc/XyZ",
            "--start",
            "5",
            "--end",
            "10",
        ])
        .unwrap();
        assert_eq!(args.url.as_deref(), Some("https://www.animeworld.so/play/naruto.abc/XyZ"));
        assert_eq!(args.start, Some(5));
        assert_eq!(args.end, Some(10));
        assert!(!args.strict);
    }

    #[test]
    fn batch_mode_needs_no_url() {
        let args = Args::try_parse_from(["animedl", "--batch", "URLs.txt", "--clear-batch"]).unwrap();
        assert_eq!(args.batch, Some(PathBuf::from("URLs.txt")));
        assert!(args.clear_batch);
        assert!(args.url.is_none());
    }

    #[test]
    fn url_and_batch_conflict() {
        assert!(Args::try_parse_from(["animedl", "http://x/play/a/b", "--batch", "f.txt"]).is_err());
    }

    #[test]
    fn nothing_to_download_is_rejected() {
        assert!(Args::try_parse_from(["animedl"]).is_err());
    }

    #[test]
    fn clear_batch_requires_batch() {
        assert!(Args::try_parse_from(["animedl", "http://x/play/a/b", "--clear-batch"]).is_err());
    }
}
