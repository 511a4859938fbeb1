//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};
use uuid::Uuid;

/// Forest stand metrics: volumes, biomass, carbon, site index and plot geometry
#[derive(Parser, Debug)]
#[command(name = "forest")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug verbosity (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub debug: u8,

    /// Record store file (overrides config `store_path`)
    #[arg(long, global = true, value_hint = ValueHint::FilePath, env = "FOREST_STORE")]
    pub store: Option<PathBuf>,

    /// Lock owner recorded while the store is modified
    #[arg(long, global = true)]
    pub user: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compute all metrics for a JSON measurement request
    Compute {
        /// Input file, `-` or omitted for stdin
        #[arg(value_hint = ValueHint::FilePath)]
        input: Option<PathBuf>,
    },

    /// Site index conversions
    Site {
        #[command(subcommand)]
        command: SiteCommands,
    },

    /// Recommended and provided plot geometry
    Plot {
        /// Distance between trees in a row (m)
        #[arg(long)]
        row: f64,

        /// Distance between rows (m)
        #[arg(long)]
        between: f64,

        /// Target tree count inside the plot
        #[arg(long)]
        min_trees: Option<u32>,

        /// Measured plot area (m²)
        #[arg(long)]
        area: Option<f64>,
    },

    /// Print the formula reference as markdown
    Equations,

    /// Manage stored measurement records
    Records {
        #[command(subcommand)]
        command: RecordCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum SiteCommands {
    /// Dominant height reached at an age for a site index
    DominantHeight {
        /// Site index (dominant height at reference age, m)
        #[arg(long)]
        site_index: f64,

        /// Stand age (years)
        #[arg(long)]
        age: f64,
    },

    /// Site index implied by a dominant height at an age
    Index {
        /// Dominant height (m)
        #[arg(long)]
        dominant_height: f64,

        /// Stand age (years)
        #[arg(long)]
        age: f64,
    },
}

#[derive(Subcommand, Debug)]
pub enum RecordCommands {
    /// Create a record from a JSON measurement request
    Create {
        /// Input file, `-` for stdin
        #[arg(long, value_hint = ValueHint::FilePath)]
        input: PathBuf,

        /// Plot reference label
        #[arg(long)]
        plot: Option<String>,
    },

    /// List records, newest first
    List {
        /// Only records for this plot reference
        #[arg(long)]
        plot: Option<String>,
    },

    /// Show one record
    Show {
        /// Record id
        id: Uuid,
    },

    /// Update a record's input or plot reference
    Update {
        /// Record id
        id: Uuid,

        /// Replacement input file; metrics are recomputed
        #[arg(long, value_hint = ValueHint::FilePath)]
        input: Option<PathBuf>,

        /// Replacement plot reference
        #[arg(long)]
        plot: Option<String>,
    },

    /// Delete a record
    Delete {
        /// Record id
        id: Uuid,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_plot_command() {
        let cli = Cli::try_parse_from(["forest", "plot", "--row", "5", "--between", "4", "--min-trees", "30"]).unwrap();
        match cli.command {
            Commands::Plot { row, between, min_trees, area } => {
                assert_eq!(row, 5.0);
                assert_eq!(between, 4.0);
                assert_eq!(min_trees, Some(30));
                assert_eq!(area, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["forest", "records", "list", "--store", "/tmp/s.json", "-dd"]).unwrap();
        assert_eq!(cli.debug, 2);
        assert_eq!(cli.store, Some(PathBuf::from("/tmp/s.json")));
    }

    #[test]
    fn test_invalid_record_id_rejected() {
        assert!(Cli::try_parse_from(["forest", "records", "show", "not-a-uuid"]).is_err());
    }
}
