use clap::{Args, Parser, Subcommand, ValueEnum};
use stg_primitives::BlockNumber;
use stg_store::S3Settings;
use std::num::{NonZeroU32, NonZeroUsize};
use url::Url;


#[derive(ValueEnum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum Mode {
    /// Run without any limit on the rate of RPC calls
    Stage,
    /// Keep RPC calls under --rate-limit per second
    Load,
}


#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Whether the logs should be structured in JSON format
    #[arg(long, global = true)]
    pub json_log: bool,

    /// Port to use for built-in prometheus metrics server
    #[arg(long, global = true)]
    pub prom_port: Option<u16>,
}


#[derive(Subcommand, Debug)]
pub enum Command {
    /// Stage blocks, their receipts and address codes of an inclusive block range
    Run(RunArgs),
    /// Print an already staged entity
    Show(ShowArgs),
}


#[derive(Args, Debug)]
pub struct RunArgs {
    /// First block of a range to stage
    #[arg(long, value_name = "N")]
    pub first_block: BlockNumber,

    /// Last block of a range to stage (inclusive)
    #[arg(long, value_name = "N")]
    pub last_block: BlockNumber,

    /// JSON-RPC endpoint of the node
    #[arg(long, env = "RPC_ENDPOINT", value_name = "URL")]
    pub rpc_url: Url,

    /// Number of attempts for RPC requests failing with a transient error
    #[arg(long, value_name = "N", default_value_t = 3)]
    pub rpc_attempts: usize,

    #[arg(long, value_enum, default_value_t = Mode::Stage)]
    pub mode: Mode,

    /// Max number of RPC calls per second in load mode
    #[arg(long, value_name = "N", default_value = "15")]
    pub rate_limit: NonZeroU32,

    /// Max number of RPC calls admitted back to back in load mode
    #[arg(long, value_name = "N", default_value = "1")]
    pub burst: NonZeroU32,

    /// Number of blocks processed in parallel [default: number of CPUs]
    #[arg(long, value_name = "N")]
    pub workers: Option<NonZeroUsize>,

    #[command(flatten)]
    pub store: StoreArgs,
}


#[derive(Args, Debug)]
pub struct ShowArgs {
    #[command(subcommand)]
    pub entity: Entity,

    #[command(flatten)]
    pub store: StoreArgs,
}


#[derive(Subcommand, Debug)]
pub enum Entity {
    Block {
        number: BlockNumber
    },
    Receipt {
        tx_hash: String
    },
    Code {
        address: String
    },
}


#[derive(Args, Debug)]
pub struct StoreArgs {
    /// Target dir or s3://bucket/prefix location of staged data
    #[arg(short, long, env = "STAGE_DEST", value_name = "DEST")]
    pub dest: String,

    /// S3 endpoint, e.g. a MinIO server
    #[arg(long, env = "MINIO_ENDPOINT", value_name = "URL")]
    pub s3_endpoint: Option<String>,

    #[arg(long, env = "MINIO_ACCESS_KEY", hide_env_values = true)]
    pub s3_access_key: Option<String>,

    #[arg(long, env = "MINIO_SECRET_KEY", hide_env_values = true)]
    pub s3_secret_key: Option<String>,
}


impl StoreArgs {
    pub fn s3_settings(&self) -> S3Settings {
        S3Settings {
            // MinIO endpoints are often given as a bare host:port
            endpoint: self.s3_endpoint.as_ref().map(|endpoint| {
                if endpoint.contains("://") {
                    endpoint.clone()
                } else {
                    format!("http://{}", endpoint)
                }
            }),
            access_key: self.s3_access_key.clone(),
            secret_key: self.s3_secret_key.clone(),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;


    #[test]
    fn run_args() {
        let cli = Cli::try_parse_from([
            "stg-ingest",
            "run",
            "--first-block", "5",
            "--last-block", "5",
            "--rpc-url", "http://localhost:8545",
            "--mode", "load",
            "--workers", "2",
            "--dest", "/tmp/staging",
            "--s3-endpoint", "localhost:9000",
            "--prom-port", "9090",
        ]).unwrap();

        assert_eq!(cli.prom_port, Some(9090));

        let Command::Run(args) = cli.command else {
            panic!("expected run command")
        };
        assert_eq!(args.first_block, 5);
        assert_eq!(args.last_block, 5);
        assert_eq!(args.mode, Mode::Load);
        assert_eq!(args.rate_limit.get(), 15);
        assert_eq!(args.burst.get(), 1);
        assert_eq!(args.workers.map(|w| w.get()), Some(2));
        assert_eq!(args.store.s3_settings().endpoint.as_deref(), Some("http://localhost:9000"));
    }

    #[test]
    fn range_bounds_are_required() {
        let res = Cli::try_parse_from([
            "stg-ingest",
            "run",
            "--first-block", "5",
            "--rpc-url", "http://localhost:8545",
            "--dest", "/tmp/staging",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn zero_workers_are_rejected() {
        let res = Cli::try_parse_from([
            "stg-ingest",
            "run",
            "--first-block", "1",
            "--last-block", "2",
            "--workers", "0",
            "--rpc-url", "http://localhost:8545",
            "--dest", "/tmp/staging",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn show_block() {
        let cli = Cli::try_parse_from([
            "stg-ingest",
            "show",
            "--dest", "s3://staging/raw",
            "block", "42",
        ]).unwrap();

        let Command::Show(args) = cli.command else {
            panic!("expected show command")
        };
        assert!(matches!(args.entity, Entity::Block { number: 42 }));
        assert_eq!(args.store.dest, "s3://staging/raw");
    }
}
