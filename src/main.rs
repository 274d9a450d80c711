use clap::{ArgAction, Parser, Subcommand};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use workshop_positioning::core::DEFAULT_HISTORY_LIMIT;
use workshop_positioning::utils::{LogFormat, LogLevel};
use workshop_positioning::{
    init_logging, tag_history, DistanceIngestionService, DistanceReading, InMemoryStore,
    RangeMeasurement, RegisterDistancesRequest, RegisterDistancesResponse, ServiceConfig,
    SiteFixture, Trilateration,
};

#[derive(Parser, Debug)]
#[command(name = "workshop-positioning", version, about = "UWB tag positioning for vehicle workshops")]
struct Cli {
    /// Service configuration (JSON)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Anchors and tags of the workshop (JSON)
    #[arg(long, value_name = "FILE")]
    site: Option<PathBuf>,

    /// Overrides the configured log level
    #[arg(long = "log-level", value_name = "LEVEL", value_enum)]
    log_level: Option<LogLevel>,

    /// Log and print as JSON lines
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Register one set of three anchor readings for a tag
    Register {
        #[arg(long, value_name = "CODE")]
        tag: String,
        /// Anchor reading as NAME=DISTANCE (meters); give exactly three
        #[arg(long = "reading", value_name = "NAME=DIST", value_parser = parse_reading, num_args = 1, required = true)]
        readings: Vec<DistanceReading>,
    },
    /// Feed a JSON array of requests through the service, then print each tag's history
    Replay {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Run the solver on raw anchor coordinates and ranges
    Solve {
        /// Anchor as X,Y,DISTANCE; give exactly three
        #[arg(long = "anchor", value_name = "X,Y,D", value_parser = parse_anchor, num_args = 1, required = true)]
        anchors: Vec<RangeMeasurement>,
    },
}

fn parse_reading(raw: &str) -> Result<DistanceReading, String> {
    let (name, distance) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=DIST, got '{}'", raw))?;
    Ok(DistanceReading::new(name, distance))
}

fn parse_anchor(raw: &str) -> Result<RangeMeasurement, String> {
    let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(format!("expected X,Y,D, got '{}'", raw));
    }
    let mut values = [0.0; 3];
    for (value, part) in values.iter_mut().zip(&parts) {
        *value = part.parse().map_err(|_| format!("'{}' is not a number", part))?;
    }
    Ok(RangeMeasurement::new(values[0], values[1], values[2]))
}

fn load_config(cli: &Cli) -> Result<ServiceConfig, Box<dyn std::error::Error>> {
    let mut config = match cli.config {
        Some(ref path) => ServiceConfig::from_file(path)?,
        None => ServiceConfig::default(),
    };
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    if cli.json {
        config.logging.format = LogFormat::Json;
    }
    Ok(config)
}

fn load_store(site: Option<&Path>) -> Result<InMemoryStore, Box<dyn std::error::Error>> {
    let path = site.ok_or("a site file is required (--site FILE)")?;
    let fixture = SiteFixture::from_file(path)?;
    tracing::info!(anchors = fixture.anchors.len(), tags = fixture.tags.len(), "site loaded");
    Ok(InMemoryStore::from_fixture(fixture)?)
}

fn print_json<T: serde::Serialize>(value: &T, compact: bool) -> Result<(), serde_json::Error> {
    let text = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{}", text);
    Ok(())
}

/// Replay output: the response plus the HTTP status a routing layer would return
fn replay_line(tag: &str, response: &RegisterDistancesResponse) -> serde_json::Value {
    serde_json::json!({ "tag": tag, "status": response.status.status_code(), "response": response })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_logging(&config.logging);

    match cli.cmd {
        Commands::Register { ref tag, ref readings } => {
            let store = load_store(cli.site.as_deref())?;
            let service = DistanceIngestionService::from_config(&config);
            let request = RegisterDistancesRequest::new(tag, readings.clone());

            match service.register_distances(&store, &request) {
                Ok(response) => {
                    tracing::info!(status = response.status.status_code(), "{}", response.message);
                    print_json(&response, cli.json)?
                }
                Err(e) => {
                    tracing::error!(status = e.status_code(), "register failed: {}", e);
                    return Err(e.into());
                }
            }
        }
        Commands::Replay { ref file } => {
            let store = load_store(cli.site.as_deref())?;
            let service = DistanceIngestionService::from_config(&config);

            let content = std::fs::read_to_string(file)?;
            let requests: Vec<RegisterDistancesRequest> = serde_json::from_str(&content)?;

            let mut tags = BTreeSet::new();
            for request in &requests {
                match service.register_distances(&store, request) {
                    Ok(response) => print_json(&replay_line(&request.tag, &response), true)?,
                    Err(e) => print_json(
                        &serde_json::json!({ "tag": request.tag, "status": e.status_code(), "error": e.to_string() }),
                        true,
                    )?,
                }
                tags.insert(request.tag.trim().to_string());
            }

            for code in &tags {
                match tag_history(&store, code, DEFAULT_HISTORY_LIMIT) {
                    Ok(history) => print_json(&serde_json::json!({ "tag": code, "history": history }), true)?,
                    Err(e) => tracing::warn!(tag = %code, "no history: {}", e),
                }
            }
        }
        Commands::Solve { ref anchors } => {
            let ranges: [RangeMeasurement; 3] = anchors
                .as_slice()
                .try_into()
                .map_err(|_| format!("exactly 3 anchors are required, got {}", anchors.len()))?;

            let solution = Trilateration::with_tolerance(config.singularity_tolerance).solve(&ranges)?;
            println!(
                "Estimated position: x={:.2}, y={:.2} ({:?})",
                solution.x, solution.y, solution.method
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_reading() {
        assert_eq!(parse_reading("A1=0.50").unwrap(), DistanceReading::new("A1", "0.50"));
        assert!(parse_reading("A1").is_err());
    }

    #[test]
    fn test_parse_anchor() {
        let anchor = parse_anchor("100, 0, 50.5").unwrap();
        assert_eq!((anchor.x, anchor.y, anchor.distance), (100.0, 0.0, 50.5));
        assert!(parse_anchor("1,2").is_err());
        assert!(parse_anchor("1,2,far").is_err());
    }

    #[test]
    fn test_register_arguments() {
        let cli = Cli::try_parse_from([
            "workshop-positioning",
            "--site",
            "site.json",
            "--json",
            "register",
            "--tag",
            "T1",
            "--reading",
            "A1=0.5",
            "--reading",
            "A2=0.5",
            "--reading",
            "A3=1.118",
        ])
        .unwrap();

        assert!(cli.json);
        match cli.cmd {
            Commands::Register { tag, readings } => {
                assert_eq!(tag, "T1");
                assert_eq!(readings.len(), 3);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_replay_line_carries_status_code() {
        use workshop_positioning::core::{AnchorId, DistanceSlot, DistanceTriple, TagId, TripleId};
        use workshop_positioning::IngestionStatus;

        let triple = DistanceTriple {
            id: TripleId(1),
            tag: TagId(1),
            slots: [DistanceSlot::new(AnchorId(1), 50.0); 3],
        };
        let response = RegisterDistancesResponse::new(IngestionStatus::Created, &triple, None);
        let line = replay_line("T1", &response);

        assert_eq!(line["status"], 201);
        assert_eq!(line["response"]["status"], "created");
    }

    #[test]
    fn test_log_level_override() {
        let cli = Cli::try_parse_from(["workshop-positioning", "--log-level", "debug", "solve", "--anchor", "0,0,1"])
            .unwrap();
        let config = load_config(&cli).unwrap();
        assert_eq!(config.logging.level, LogLevel::Debug);
    }
}
