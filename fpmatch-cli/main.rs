use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use argh::FromArgs;
use fpmatch_cli::{CompareResult, Config, FingerprintMatcher, MatchReport};

/// Widest precision accepted for the printed percentage
const MAX_PRECISION: usize = 17;

/// Compare two fingerprint images and print the share of matching ORB keypoints.
#[derive(Debug, FromArgs)]
struct Args {
    /// reference image, the score is relative to its keypoints
    #[argh(positional)]
    image_a: PathBuf,

    /// image compared against the reference
    #[argh(positional)]
    image_b: PathBuf,

    /// detector configuration file (.toml or .json)
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,

    /// maximum number of keypoints per image
    #[argh(option)]
    n_features: Option<usize>,

    /// FAST intensity threshold
    #[argh(option)]
    fast_threshold: Option<u8>,

    /// number of pyramid levels
    #[argh(option)]
    levels: Option<usize>,

    /// scale ratio between pyramid levels
    #[argh(option)]
    scale_factor: Option<f32>,

    /// number of worker threads
    #[argh(option, short = 'j')]
    threads: Option<usize>,

    /// also print the N closest matches
    #[argh(option, short = 'n', default = "0")]
    top: usize,

    /// print the full report as JSON
    #[argh(switch)]
    json: bool,

    /// decimals of the printed percentage (0-17)
    #[argh(option, default = "2", from_str_fn(parse_precision))]
    precision: usize,
}

fn parse_precision(value: &str) -> Result<usize, String> {
    let precision: usize = value
        .parse()
        .map_err(|_| format!("invalid precision `{value}`"))?;
    if precision > MAX_PRECISION {
        return Err(format!("precision must be at most {MAX_PRECISION}, got {precision}"));
    }
    Ok(precision)
}

impl Args {
    /// Config file first, then individual flags on top of it.
    fn config(&self) -> CompareResult<Config> {
        let mut cfg = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        if let Some(n) = self.n_features {
            cfg = cfg.with_n_features(n);
        }
        if let Some(t) = self.fast_threshold {
            cfg = cfg.with_fast_threshold(t);
        }
        if let Some(l) = self.levels {
            cfg = cfg.with_n_levels(l);
        }
        if let Some(f) = self.scale_factor {
            cfg = cfg.with_scale_factor(f);
        }
        if let Some(j) = self.threads {
            cfg = cfg.with_threads(j);
        }
        Ok(cfg)
    }
}

fn run(args: &Args) -> CompareResult<MatchReport> {
    let cfg = args.config()?;
    log::info!("{}", cfg.summary());

    let matcher = FingerprintMatcher::new(cfg)?;
    matcher.compare(&args.image_a, &args.image_b)
}

fn write_report<W: Write>(out: &mut W, args: &Args, report: &MatchReport) -> io::Result<()> {
    if args.json {
        serde_json::to_writer_pretty(&mut *out, report)?;
        return writeln!(out);
    }

    writeln!(out, "Matching Percentage: {:.*} %", args.precision, report.score)?;

    for (rank, m) in report.matches.iter().take(args.top).enumerate() {
        let a = &report.keypoints_a[m.query_idx];
        let b = &report.keypoints_b[m.train_idx];
        writeln!(
            out,
            "{:>4}  distance {:>3}  A#{:<4} ({:7.1}, {:7.1})  B#{:<4} ({:7.1}, {:7.1})",
            rank + 1,
            m.distance,
            m.query_idx,
            a.x,
            a.y,
            m.train_idx,
            b.x,
            b.y
        )?;
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Args = argh::from_env();

    let report = match run(&args) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(e.exit_code());
        }
    };

    let stdout = io::stdout();
    if let Err(e) = write_report(&mut stdout.lock(), &args, &report) {
        eprintln!("Error: failed to write report. {e}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;
    use fpmatch_cli::fpmatch_core::{CoreError, Keypoint, Match};
    use fpmatch_cli::CompareError;

    fn keypoint(x: f32, y: f32) -> Keypoint {
        Keypoint {
            x,
            y,
            angle: 0.0,
            response: 1.0,
            octave: 0,
            scale: 1.0,
            size: 31.0,
        }
    }

    fn sample_report() -> MatchReport {
        MatchReport {
            keypoints_a: vec![keypoint(10.0, 20.0), keypoint(30.5, 40.0), keypoint(5.0, 5.0)],
            keypoints_b: vec![keypoint(11.0, 21.0), keypoint(31.0, 39.5)],
            matches: vec![
                Match { query_idx: 1, train_idx: 1, distance: 3 },
                Match { query_idx: 0, train_idx: 0, distance: 12 },
            ],
            score: 200.0 / 3.0,
        }
    }

    fn render(args: &Args, report: &MatchReport) -> String {
        let mut out = Vec::new();
        write_report(&mut out, args, report).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn parse(args: &[&str]) -> Args {
        Args::from_args(&["fpmatch"], args).unwrap()
    }

    #[test]
    fn test_defaults() {
        let args = parse(&["a.png", "b.png"]);
        assert_eq!(args.image_a, PathBuf::from("a.png"));
        assert_eq!(args.precision, 2);
        assert_eq!(args.top, 0);
        assert!(!args.json);
        assert_eq!(args.config().unwrap(), Config::default());
    }

    #[test]
    fn test_flags_override_defaults() {
        let args = parse(&["a.png", "b.png", "--n-features", "200", "--fast-threshold", "12", "--levels", "4", "-j", "3"]);
        let cfg = args.config().unwrap();
        assert_eq!(cfg.n_features, 200);
        assert_eq!(cfg.fast_threshold, 12);
        assert_eq!(cfg.n_levels, 4);
        assert_eq!(cfg.n_threads, 3);
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orb.toml");
        std::fs::write(&path, "n_features = 300\nfast_threshold = 30\n").unwrap();

        let path_arg = path.to_string_lossy().into_owned();
        let args = parse(&["a.png", "b.png", "--config", &path_arg, "--fast-threshold", "15"]);
        let cfg = args.config().unwrap();
        assert_eq!(cfg.n_features, 300);
        assert_eq!(cfg.fast_threshold, 15);
    }

    #[test]
    fn test_missing_positional_is_rejected() {
        assert!(Args::from_args(&["fpmatch"], &["a.png"]).is_err());
    }

    #[test]
    fn test_missing_config_file_is_an_io_error() {
        let args = parse(&["a.png", "b.png", "--config", "does_not_exist.toml"]);
        let err = args.config().unwrap_err();
        assert!(matches!(err, CompareError::Core(CoreError::ConfigIo(_))));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_unknown_config_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orb.yaml");
        std::fs::write(&path, "n_features: 300\n").unwrap();

        let path_arg = path.to_string_lossy().into_owned();
        let args = parse(&["a.png", "b.png", "--config", &path_arg]);
        let err = args.config().unwrap_err();
        assert!(matches!(err, CompareError::Core(CoreError::UnsupportedConfigFormat(ref p)) if p == &path));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_precision_is_bounded() {
        assert_eq!(parse(&["a.png", "b.png", "--precision", "17"]).precision, 17);
        assert!(Args::from_args(&["fpmatch"], &["a.png", "b.png", "--precision", "18"]).is_err());
        assert!(Args::from_args(&["fpmatch"], &["a.png", "b.png", "--precision", "100000"]).is_err());
        assert!(Args::from_args(&["fpmatch"], &["a.png", "b.png", "--precision", "-1"]).is_err());
    }

    #[test]
    fn test_percentage_line() {
        let report = sample_report();
        assert_eq!(render(&parse(&["a.png", "b.png"]), &report), "Matching Percentage: 66.67 %\n");
        assert_eq!(
            render(&parse(&["a.png", "b.png", "--precision", "0"]), &report),
            "Matching Percentage: 67 %\n"
        );
    }

    #[test]
    fn test_top_matches_follow_the_percentage() {
        let out = render(&parse(&["a.png", "b.png", "--top", "5"]), &sample_report());
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Matching Percentage: 66.67 %");
        assert_eq!(
            lines[1],
            "   1  distance   3  A#1    (   30.5,    40.0)  B#1    (   31.0,    39.5)"
        );
        assert!(lines[2].starts_with("   2  distance  12  A#0 "));
    }

    #[test]
    fn test_json_report() {
        let out = render(&parse(&["a.png", "b.png", "--json"]), &sample_report());
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json["matches"][0]["distance"], 3);
        assert_eq!(json["keypoints_a"].as_array().map(Vec::len), Some(3));
        assert!(!out.contains("Matching Percentage"));
    }
}
