// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[
    clap(
        name = "smithery",
        version,
        author,
        about = "Generate and install widget CRDs from JSON Schemas"
    )
]
pub struct CliArgs {
    /// Configuration file (json, yaml or toml)
    #[clap(long, short, global = true, env = "SMITHERY_CONFIG")]
    pub config: Option<String>,
    /// Log at debug level, LOG_LEVEL takes precedence
    #[clap(long, global = true)]
    pub debug: bool,
    #[clap(subcommand)]
    pub cmd: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[
        clap(
            name = "serve",
            about = "Run the HTTP server"
        )
    ]
    Serve {
        /// Port to listen on, overrides server.port
        #[clap(long, short)]
        port: Option<u16>,
    },
    #[
        clap(
            name = "forge",
            about = "Print the CRD generated from a widget JSON Schema without applying it"
        )
    ]
    Forge {
        /// Widget JSON Schema file
        #[clap(long, short)]
        schema: String,
        /// API group of the generated CRD, overrides widgets.group
        #[clap(long, short)]
        group: Option<String>,
    },
}
