use anyhow::Context;
use tracing::level_filters::LevelFilter;
use tracing_chrome::{ChromeLayerBuilder, FlushGuard};
use tracing_subscriber::prelude::__tracing_subscriber_SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

/// Maps the number of `-v` flags to the most verbose level printed on stderr.
pub fn verbosity_level(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

pub fn chrome_trace_file_name() -> String {
    format!(
        "csslex-trace-{}.json",
        chrono::Local::now().naive_local().format("%Y-%m-%d__%H-%M-%S")
    )
}

/// Installs the global subscriber: human readable events on stderr and, with
/// `chrome_trace`, every span and event in a Chrome trace file in the working
/// directory.
///
/// The trace file is only complete once the returned guard is dropped.
pub fn tracing_init(verbose: u8, chrome_trace: bool) -> anyhow::Result<Option<FlushGuard>> {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(verbosity_level(verbose));

    let (chrome_layer, guard) = if chrome_trace {
        let file_name = chrome_trace_file_name();
        let chrome_trace_file = std::fs::File::create(&file_name)
            .with_context(|| format!("could not make csslex trace file {file_name}"))?;
        let (layer, guard) = ChromeLayerBuilder::new()
            .trace_style(tracing_chrome::TraceStyle::Threaded)
            .include_args(true)
            .writer(chrome_trace_file)
            .build();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(chrome_layer)
        .try_init()
        .context("a global tracing subscriber was already installed")?;

    Ok(guard)
}
