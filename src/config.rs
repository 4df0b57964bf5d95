use clap::{Parser, ValueEnum};

use crate::dispatch::DEFAULT_QUERY;

#[derive(Clone, Copy, Debug, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// A standalone HTML document with one tab per histogram.
    Html,
    /// Pretty-printed JSON.
    Pretty,
    /// Un-pretty-printed JSON.
    Concise,
}

/// Query a heap-profiling server and tabulate the results.
#[derive(Debug, Parser)]
#[clap(name = "heapview", version)]
pub struct ClientOpts {
    /// Base URL of the heap-profiling server.  Every request URL is resolved
    /// relative to this, so it should end in a `/`.
    #[clap(long, default_value = "http://localhost:7070/", env = "HEAPVIEW_SERVER")]
    pub server: String,

    /// The query to issue at startup.
    #[clap(long, default_value = DEFAULT_QUERY, env = "HEAPVIEW_QUERY")]
    pub query: String,

    /// Additional (relative) request URLs to chain after the initial query, in
    /// order.  May be repeated.
    #[clap(long = "then", value_name = "URL")]
    pub then: Vec<String>,

    #[clap(short, long, value_enum, ignore_case = true, default_value = "html")]
    pub output_format: OutputFormat,

    /// Write the output here instead of to stdout.
    #[clap(long, value_name = "PATH")]
    pub output: Option<String>,

    /// Print the captured log tree of the run to stderr as JSON.
    #[clap(long)]
    pub explain: bool,
}
