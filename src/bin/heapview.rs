use std::process::exit;

use clap::Parser;
use heapview::{
    config::{ClientOpts, OutputFormat},
    dispatch::Session,
    logging::{init_logging, CapturedRun},
    output::{HtmlSink, MemorySink, PresentationSink},
    transport::make_remote_server,
};
use serde_json::{to_string, to_string_pretty};
use tokio::fs::write;
use tracing::Instrument;
use url::Url;

async fn run_session<S: PresentationSink>(opts: &ClientOpts, sink: S) -> S {
    let server_url = match Url::parse(&opts.server) {
        Ok(url) => url,
        Err(err) => {
            eprintln!("Bad server URL {:?}: {}", opts.server, err);
            exit(2);
        }
    };
    let transport = match make_remote_server(server_url) {
        Ok(transport) => transport,
        Err(err) => {
            eprintln!("{}", err);
            exit(2);
        }
    };

    let mut session = Session::new(transport, sink);
    {
        let mut chain = session.query(&opts.query);
        for url in &opts.then {
            chain.then(url);
        }
    }

    // A transport failure has already been reported to the sink as a fatal
    // notice; we still want to emit whatever was rendered before it.
    if let Err(err) = session.run().await {
        eprintln!("Request chain halted: {}", err);
    }
    session.into_sink()
}

async fn emit(opts: &ClientOpts, contents: String) {
    match &opts.output {
        Some(path) => {
            if let Err(err) = write(path, contents).await {
                eprintln!("Unable to write {}: {}", path, err);
                exit(1);
            }
        }
        None => print!("{}", contents),
    }
}

#[tokio::main]
async fn main() {
    let opts = ClientOpts::parse();
    init_logging();

    let captured = CapturedRun::start("heapview");
    let span = captured.span();

    let contents = match opts.output_format {
        OutputFormat::Html => {
            let sink = run_session(&opts, HtmlSink::new()).instrument(span).await;
            let mut buf = Vec::new();
            if let Err(err) = sink.write_document(&mut buf, &opts.query) {
                eprintln!("Unable to generate HTML: {}", err);
                exit(1);
            }
            String::from_utf8_lossy(&buf).into_owned()
        }
        format => {
            let sink = run_session(&opts, MemorySink::new()).instrument(span).await;
            let json = if format == OutputFormat::Pretty {
                to_string_pretty(&sink)
            } else {
                to_string(&sink)
            };
            match json {
                Ok(json) => json + "\n",
                Err(err) => {
                    eprintln!("Unable to serialize results: {}", err);
                    exit(1);
                }
            }
        }
    };

    emit(&opts, contents).await;

    if opts.explain {
        let log_values = captured.finish_as_json().await;
        if let Ok(pretty) = to_string_pretty(&log_values) {
            eprintln!("{}", pretty);
        }
    }
}
