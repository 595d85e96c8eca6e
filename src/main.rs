use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use meshgraph::{export, logging, range, FileSource, Settings};
use meshgraph_engine::{Engine, GraphRequest, Projector, Request, SampleSource};
use meshgraph_types::{FilterType, MetricKind, Scope, TimeRange};

#[derive(Parser, Debug)]
#[command(name = "meshgraph")]
#[command(about = "Build service-mesh topology graphs from Istio telemetry")]
struct Cli {
    /// Settings file (TOML, YAML or JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level or filter directive (overridden by RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a traffic graph for a namespace, application or workload
    Graph(GraphArgs),

    /// Run a raw JSON query model
    Query {
        /// Query model file, or "-" for stdin
        #[arg(short, long)]
        model: String,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// List namespaces with mesh traffic
    Namespaces {
        #[command(flatten)]
        common: CommonArgs,
    },

    /// List applications in a namespace
    Applications {
        #[arg(short, long)]
        namespace: String,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// List workloads in a namespace
    Workloads {
        #[arg(short, long)]
        namespace: String,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// List peer workloads usable as graph filters
    Filters {
        #[arg(short, long)]
        namespace: String,

        /// Peers sending into the scope, or peers the scope sends to
        #[arg(long = "type", value_enum)]
        filter: FilterArg,

        #[command(flatten)]
        selector: SelectorArgs,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Check the sample source is reachable
    Health {
        /// Read samples from a JSON dump instead of Prometheus
        #[arg(long)]
        samples: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct GraphArgs {
    #[arg(short, long)]
    namespace: String,

    #[command(flatten)]
    selector: SelectorArgs,

    /// Metric kinds to fetch (default: all)
    #[arg(short, long = "metric")]
    metrics: Vec<MetricKind>,

    /// Keep edges with zero traffic in the window
    #[arg(long)]
    idle_edges: bool,

    /// Drop samples from these sources ("namespace/workload")
    #[arg(long = "source-filter")]
    source_filters: Vec<String>,

    /// Drop samples to these destinations ("namespace/workload")
    #[arg(long = "destination-filter")]
    destination_filters: Vec<String>,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Args, Debug)]
struct SelectorArgs {
    /// Scope to an application
    #[arg(short, long, conflicts_with = "workload")]
    application: Option<String>,

    /// Scope to a single workload
    #[arg(short, long)]
    workload: Option<String>,
}

impl SelectorArgs {
    fn scope(&self) -> Result<Scope> {
        match Scope::from_selectors(self.application.as_deref(), self.workload.as_deref()) {
            Some(scope) => Ok(scope),
            None => bail!("--application and --workload are mutually exclusive"),
        }
    }
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Window length ending now (e.g., "15m", "1h")
    #[arg(short, long, default_value = "15m")]
    range: String,

    /// Window start, epoch milliseconds (overrides --range)
    #[arg(long)]
    from: Option<u64>,

    /// Window end, epoch milliseconds (default: now)
    #[arg(long)]
    to: Option<u64>,

    /// Read samples from a JSON dump instead of Prometheus
    #[arg(long)]
    samples: Option<PathBuf>,

    /// Write JSON to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl CommonArgs {
    fn time_range(&self) -> Result<TimeRange> {
        range::resolve(&self.range, self.from, self.to, range::now_ms()?)
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FilterArg {
    Source,
    Destination,
}

impl From<FilterArg> for FilterType {
    fn from(arg: FilterArg) -> Self {
        match arg {
            FilterArg::Source => FilterType::Source,
            FilterArg::Destination => FilterType::Destination,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load(cli.config.as_deref())?;
    let level = cli.log_level.as_deref().unwrap_or(&settings.log_level);
    logging::init(level)?;

    match cli.command {
        Command::Graph(args) => {
            let request = Request::Graph(graph_request(&args)?);
            run(&settings, &request, &args.common).await
        }
        Command::Query { model, common } => {
            let json = read_model(&model)?;
            let request = Request::parse(&json, common.time_range()?)?;
            run(&settings, &request, &common).await
        }
        Command::Namespaces { common } => {
            let request = Request::Namespaces {
                time_range: common.time_range()?,
            };
            run(&settings, &request, &common).await
        }
        Command::Applications { namespace, common } => {
            let request = Request::Applications {
                namespace,
                time_range: common.time_range()?,
            };
            run(&settings, &request, &common).await
        }
        Command::Workloads { namespace, common } => {
            let request = Request::Workloads {
                namespace,
                time_range: common.time_range()?,
            };
            run(&settings, &request, &common).await
        }
        Command::Filters {
            namespace,
            filter,
            selector,
            common,
        } => {
            let request = Request::Filters {
                namespace,
                scope: selector.scope()?,
                filter: filter.into(),
                time_range: common.time_range()?,
            };
            run(&settings, &request, &common).await
        }
        Command::Health { samples } => health(&settings, samples.as_deref()).await,
    }
}

fn graph_request(args: &GraphArgs) -> Result<GraphRequest> {
    let mut request = GraphRequest::new(
        args.namespace.clone(),
        args.selector.scope()?,
        args.common.time_range()?,
    )
    .with_idle_edges(args.idle_edges)
    .with_source_filters(args.source_filters.iter().cloned())
    .with_destination_filters(args.destination_filters.iter().cloned());

    if !args.metrics.is_empty() {
        request = request.with_metrics(args.metrics.iter().copied());
    }
    Ok(request)
}

fn read_model(model: &str) -> Result<String> {
    if model == "-" {
        let mut json = String::new();
        std::io::stdin()
            .read_to_string(&mut json)
            .context("Failed to read query model from stdin")?;
        return Ok(json);
    }
    std::fs::read_to_string(model).with_context(|| format!("Failed to read query model {model}"))
}

fn sample_source(settings: &Settings, samples: Option<&Path>) -> Result<Arc<dyn SampleSource>> {
    let source: Arc<dyn SampleSource> = match samples {
        Some(path) => Arc::new(FileSource::open(path)?),
        None => Arc::new(settings.prometheus.source()),
    };
    tracing::debug!(source = source.description(), "Using sample source");
    Ok(source)
}

fn engine(settings: &Settings, samples: Option<&Path>) -> Result<Engine> {
    Ok(Engine::new(sample_source(settings, samples)?)
        .with_projector(Projector::new(settings.projector_config()))
        .with_links(settings.dashboards.clone())
        .with_duration_merge(settings.duration_merge))
}

async fn run(settings: &Settings, request: &Request, common: &CommonArgs) -> Result<()> {
    let engine = engine(settings, common.samples.as_deref())?;
    let response = engine.handle(request).await?;
    export::write(&response, &settings.palette, common.output.as_deref())
}

async fn health(settings: &Settings, samples: Option<&Path>) -> Result<()> {
    let engine = engine(settings, samples)?;
    let description = engine.assembler().source().description().to_string();
    engine
        .check_health()
        .await
        .with_context(|| format!("{description} is not healthy"))?;
    println!("{description}: ok");
    Ok(())
}
