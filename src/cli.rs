// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// We use the "derive" API which lets us define the CLI structure using
// Rust structs and attributes (the #[...] things).
//
// Both subcommands share the same policy flags, so those live in their own
// struct (PolicyArgs) and get flattened into each subcommand.
// =============================================================================

use clap::{Args, Parser, Subcommand};
use std::net::IpAddr;
use std::path::PathBuf;

use nofollow_guard::PolicyOverrides;

#[derive(Parser, Debug)]
#[command(
    name = "nofollow-guard",
    version,
    about = "Adds rel=\"nofollow\" to external links in HTML",
    long_about = "nofollow-guard rewrites anchor tags in HTML so links pointing off-site carry \
                  rel=\"nofollow\", honouring exclusion lists, blocklists, geo exemptions and \
                  social-network rules. Non-link markup is passed through byte for byte."
)]
pub struct Cli {
    /// Print debug logs (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rewrite HTML files (or stdin) and print the result
    ///
    /// Example: nofollow-guard rewrite page.html --site-host example.com
    Rewrite {
        /// HTML files to rewrite; reads stdin when none are given
        files: Vec<PathBuf>,

        /// Overwrite the files instead of printing them
        #[arg(long)]
        in_place: bool,

        /// Print link statistics to stderr when done
        #[arg(long)]
        stats: bool,

        /// Print statistics as JSON instead of a table
        #[arg(long, requires = "stats")]
        json: bool,

        #[command(flatten)]
        policy: PolicyArgs,
    },

    /// Show how each URL would be classified
    ///
    /// Example: nofollow-guard classify https://ext.com /about --site-host example.com
    Classify {
        /// URLs (href values) to classify
        #[arg(required = true)]
        urls: Vec<String>,

        /// Output results in JSON format instead of a table
        #[arg(long)]
        json: bool,

        /// Exit with code 1 if any URL would be nofollowed
        #[arg(long)]
        fail_on_nofollow: bool,

        #[command(flatten)]
        policy: PolicyArgs,
    },
}

#[derive(Args, Debug, Clone)]
pub struct PolicyArgs {
    /// JSON settings file (policy fields plus a "geo" section)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Canonical host of the site (overrides the settings file)
    #[arg(long)]
    pub site_host: Option<String>,

    /// Never nofollow links containing this pattern (repeatable)
    #[arg(long = "exclude", value_name = "PATTERN")]
    pub exclude: Vec<String>,

    /// Always nofollow links containing this pattern (repeatable)
    #[arg(long = "block", value_name = "PATTERN")]
    pub block: Vec<String>,

    /// Force nofollow on social-network links
    #[arg(long)]
    pub social_block: bool,

    /// Leave social-network links alone
    #[arg(long, conflicts_with = "social_block")]
    pub social_exempt: bool,

    /// Leave market.yandex.ru links alone
    #[arg(long)]
    pub yandex_market_excluded: bool,

    /// Treat the visitor as geo-exempt
    #[arg(long)]
    pub geo_exempt: bool,

    /// Resolve geo exemption for this visitor IP via the geo service
    #[arg(long, conflicts_with = "geo_exempt")]
    pub client_ip: Option<IpAddr>,
}

impl PolicyArgs {
    pub fn overrides(&self) -> PolicyOverrides {
        PolicyOverrides {
            site_host: self.site_host.clone(),
            exclude: self.exclude.clone(),
            block: self.block.clone(),
            social_block: self.social_block,
            social_exempt: self.social_exempt,
            yandex_market_excluded: self.yandex_market_excluded,
            geo_exempt: self.geo_exempt.then_some(true),
        }
    }
}
