//! Command-line interface definitions

use std::path::PathBuf;
use std::str::FromStr;

use clap::{Parser, Subcommand};
use custody_common::{ActionId, PrincipalId};

/// Threshold-authorization ledger
#[derive(Parser, Debug)]
#[command(name = "custody")]
#[command(
    author,
    version,
    about = "Threshold-authorization ledger - M-of-N approval for transfers"
)]
#[command(long_about = r#"
A fixed committee of principals jointly authorizes actions. An action runs
only after the configured number of distinct members have confirmed it.

Every command is one ledger call made on behalf of --caller. Emitted
notifications are printed to stdout as JSON lines.

Example:
  custody init --principal 0xaa.. --principal 0xbb.. --principal 0xcc.. --threshold 2
  custody submit --caller 0xaa.. --destination 0x11.. --amount 100
  custody confirm --caller 0xaa.. --id 0
  custody confirm --caller 0xbb.. --id 0
  custody execute --caller 0xaa.. --id 0
"#)]
pub struct Cli {
    /// Ledger state file (overrides configuration)
    #[arg(long, value_name = "PATH")]
    pub state: Option<PathBuf>,

    /// Configuration file (default: ./custody.toml if present)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Verbose output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a new ledger in the state file
    Init {
        /// Committee member, repeat for each principal (order is kept)
        #[arg(long = "principal", value_name = "ID", required = true)]
        principals: Vec<PrincipalId>,

        /// Confirmations required to execute
        #[arg(long)]
        threshold: u32,
    },

    /// Record value arriving at the ledger
    Deposit {
        #[arg(long)]
        sender: PrincipalId,

        #[arg(long)]
        amount: u128,
    },

    /// Propose a new action
    Submit {
        #[arg(long)]
        caller: PrincipalId,

        #[arg(long)]
        destination: PrincipalId,

        #[arg(long)]
        amount: u128,

        /// Call data as hex
        #[arg(long)]
        payload: Option<Payload>,
    },

    /// Approve an action
    Confirm {
        #[arg(long)]
        caller: PrincipalId,

        #[arg(long)]
        id: ActionId,
    },

    /// Withdraw an approval
    Revoke {
        #[arg(long)]
        caller: PrincipalId,

        #[arg(long)]
        id: ActionId,
    },

    /// Execute an action if quorum holds
    Execute {
        #[arg(long)]
        caller: PrincipalId,

        #[arg(long)]
        id: ActionId,
    },

    /// Show committee and actions
    Status {
        /// Only this action
        #[arg(long)]
        id: Option<ActionId>,
    },
}

/// Hex-encoded call data (`0x` prefix optional)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Payload(pub Vec<u8>);

impl FromStr for Payload {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        hex::decode(digits).map(Payload)
    }
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
    fn test_parse_submit() {
        let cli = Cli::try_parse_from([
            "custody",
            "submit",
            "--caller",
            "0x00000000000000000000000000000000000000aa",
            "--destination",
            "0x0000000000000000000000000000000000000011",
            "--amount",
            "100",
            "--payload",
            "0xdead",
        ])
        .unwrap();

        match cli.command {
            Command::Submit {
                amount, payload, ..
            } => {
                assert_eq!(amount, 100);
                assert_eq!(payload, Some(Payload(vec![0xde, 0xad])));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_init_keeps_principal_order() {
        let cli = Cli::try_parse_from([
            "custody",
            "init",
            "--principal",
            "0x0000000000000000000000000000000000000002",
            "--principal",
            "0x0000000000000000000000000000000000000001",
            "--threshold",
            "1",
        ])
        .unwrap();

        match cli.command {
            Command::Init {
                principals,
                threshold,
            } => {
                assert_eq!(
                    principals,
                    vec![PrincipalId::from_low_u64(2), PrincipalId::from_low_u64(1)]
                );
                assert_eq!(threshold, 1);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_rejects_malformed_principal() {
        let result = Cli::try_parse_from(["custody", "confirm", "--caller", "0x12", "--id", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_payload_parse() {
        assert_eq!("".parse::<Payload>().unwrap(), Payload::default());
        assert_eq!("00ff".parse::<Payload>().unwrap(), Payload(vec![0, 0xff]));
        assert!("0xf".parse::<Payload>().is_err());
    }
}
